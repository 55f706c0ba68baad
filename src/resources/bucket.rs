use crate::output::Output;
use serde::{Deserialize, Serialize};

/// Canned ACL applied to a bucket or its objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CannedAcl {
    Private,
    PublicRead,
    LogDeliveryWrite,
}

impl CannedAcl {
    pub fn is_public(self) -> bool {
        matches!(self, CannedAcl::PublicRead)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SseAlgorithm {
    #[serde(rename = "AES256")]
    Aes256,
    #[serde(rename = "aws:kms")]
    AwsKms,
}

/// Default server-side encryption for new objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSideEncryption {
    pub sse_algorithm: SseAlgorithm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_master_key_id: Option<Output>,
}

impl ServerSideEncryption {
    pub fn kms(key_arn: Output) -> Self {
        Self {
            sse_algorithm: SseAlgorithm::AwsKms,
            kms_master_key_id: Some(key_arn),
        }
    }

    pub fn aes256() -> Self {
        Self {
            sse_algorithm: SseAlgorithm::Aes256,
            kms_master_key_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketLogging {
    pub target_bucket: Output,
    #[serde(with = "crate::output::literal")]
    pub target_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketWebsite {
    #[serde(with = "crate::output::literal")]
    pub index_document: String,
    #[serde(with = "crate::output::literal")]
    pub error_document: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketArgs {
    pub acl: CannedAcl,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_side_encryption_configuration: Option<ServerSideEncryption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loggings: Vec<BucketLogging>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<BucketWebsite>,
}

impl BucketArgs {
    pub fn new(acl: CannedAcl) -> Self {
        Self {
            acl,
            server_side_encryption_configuration: None,
            loggings: Vec::new(),
            website: None,
        }
    }

    pub fn encryption(mut self, encryption: ServerSideEncryption) -> Self {
        self.server_side_encryption_configuration = Some(encryption);
        self
    }

    pub fn logging(mut self, target_bucket: Output, target_prefix: impl Into<String>) -> Self {
        self.loggings.push(BucketLogging {
            target_bucket,
            target_prefix: target_prefix.into(),
        });
        self
    }

    pub fn website(mut self, index_document: &str, error_document: &str) -> Self {
        self.website = Some(BucketWebsite {
            index_document: index_document.to_string(),
            error_document: error_document.to_string(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bucket_args_render_provider_names() {
        let args = BucketArgs::new(CannedAcl::PublicRead)
            .encryption(ServerSideEncryption::kms(Output::attribute("s3key", "arn")))
            .logging(Output::attribute("logs", "id"), "log/")
            .website("index.html", "error.html");

        assert_eq!(
            serde_json::to_value(&args).unwrap(),
            json!({
                "acl": "public-read",
                "serverSideEncryptionConfiguration": {
                    "sseAlgorithm": "aws:kms",
                    "kmsMasterKeyId": "${s3key.arn}",
                },
                "loggings": [{"targetBucket": "${logs.id}", "targetPrefix": "log/"}],
                "website": {"indexDocument": "index.html", "errorDocument": "error.html"},
            })
        );
    }

    #[test]
    fn test_log_bucket_omits_unset_sections() {
        let args = BucketArgs::new(CannedAcl::LogDeliveryWrite);
        assert_eq!(
            serde_json::to_value(&args).unwrap(),
            json!({"acl": "log-delivery-write"})
        );
    }
}
