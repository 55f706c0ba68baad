//! Edge cache configuration.

use crate::output::Output;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OriginProtocolPolicy {
    HttpOnly,
    HttpsOnly,
    MatchViewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewerProtocolPolicy {
    AllowAll,
    HttpsOnly,
    RedirectToHttps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Options,
    Put,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Read-only methods that never change origin state
    pub const SAFE: [HttpMethod; 3] = [HttpMethod::Get, HttpMethod::Head, HttpMethod::Options];

    pub fn is_safe(self) -> bool {
        Self::SAFE.contains(&self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomOriginConfig {
    pub origin_protocol_policy: OriginProtocolPolicy,
    pub http_port: u16,
    pub https_port: u16,
    pub origin_ssl_protocols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Origin {
    pub origin_id: Output,
    pub domain_name: Output,
    pub custom_origin_config: CustomOriginConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieForwarding {
    pub forward: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardedValues {
    pub query_string: bool,
    pub cookies: CookieForwarding,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheBehavior {
    pub target_origin_id: Output,
    pub viewer_protocol_policy: ViewerProtocolPolicy,
    pub allowed_methods: Vec<HttpMethod>,
    pub cached_methods: Vec<HttpMethod>,
    pub default_ttl: u64,
    pub min_ttl: u64,
    pub max_ttl: u64,
    pub forwarded_values: ForwardedValues,
}

impl CacheBehavior {
    /// Fixed-TTL behavior: every object lives `ttl` seconds at the edge
    pub fn fixed_ttl(target_origin_id: Output, ttl: u64) -> Self {
        Self {
            target_origin_id,
            viewer_protocol_policy: ViewerProtocolPolicy::RedirectToHttps,
            allowed_methods: HttpMethod::SAFE.to_vec(),
            cached_methods: HttpMethod::SAFE.to_vec(),
            default_ttl: ttl,
            min_ttl: ttl,
            max_ttl: ttl,
            forwarded_values: ForwardedValues {
                query_string: true,
                cookies: CookieForwarding {
                    forward: "all".to_string(),
                },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomErrorResponse {
    pub error_code: u16,
    pub response_code: u16,
    #[serde(with = "crate::output::literal")]
    pub response_page_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoRestriction {
    pub restriction_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restrictions {
    pub geo_restriction: GeoRestriction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerCertificate {
    pub cloudfront_default_certificate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionArgs {
    pub enabled: bool,
    pub origins: Vec<Origin>,
    pub default_cache_behavior: CacheBehavior,
    pub price_class: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_error_responses: Vec<CustomErrorResponse>,
    pub restrictions: Restrictions,
    pub viewer_certificate: ViewerCertificate,
}

impl DistributionArgs {
    pub fn error_response(&self, error_code: u16) -> Option<&CustomErrorResponse> {
        self.custom_error_responses
            .iter()
            .find(|r| r.error_code == error_code)
    }

    /// Viewers always reach the distribution over HTTPS
    pub fn enforces_https(&self) -> bool {
        matches!(
            self.default_cache_behavior.viewer_protocol_policy,
            ViewerProtocolPolicy::RedirectToHttps | ViewerProtocolPolicy::HttpsOnly
        ) && self.viewer_certificate.cloudfront_default_certificate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_ttl_behavior_only_forwards_safe_methods() {
        let behavior = CacheBehavior::fixed_ttl(Output::attribute("bucket", "arn"), 600);
        assert_eq!(behavior.default_ttl, 600);
        assert_eq!(behavior.min_ttl, 600);
        assert_eq!(behavior.max_ttl, 600);
        assert!(behavior.allowed_methods.iter().all(|m| m.is_safe()));
        assert_eq!(behavior.allowed_methods, behavior.cached_methods);
    }

    #[test]
    fn test_methods_render_uppercase() {
        let rendered = serde_json::to_value(HttpMethod::SAFE).unwrap();
        assert_eq!(rendered, serde_json::json!(["GET", "HEAD", "OPTIONS"]));
    }
}
