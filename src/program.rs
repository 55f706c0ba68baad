//! The static website stack.
//!
//! Used by both the CLI and the integration tests so that previews, local
//! applies and assertions all see the same declarations.

use crate::config::{Config, Variant};
use crate::output::Output;
use crate::policy::{PolicyDocument, Principal, Statement};
use crate::resources::{
    BucketArgs, BucketNotificationArgs, BucketPolicyArgs, CacheBehavior, CannedAcl,
    CustomErrorResponse, CustomOriginConfig, DeliveryPolicy, DistributionArgs, GeoRestriction,
    KmsKeyArgs, Origin, OriginProtocolPolicy, PublicAccessBlockArgs, Resource, ResourceRef,
    Restrictions, S3Event, ServerSideEncryption, SubscriptionProtocol, SyncedFolderArgs,
    TopicArgs, TopicNotification, TopicPolicyArgs, TopicSubscriptionArgs, ViewerCertificate,
};
use crate::stack::Stack;
use crate::types::StackError;

// Logical names; these identify resources in remote state
pub const KMS_KEY: &str = "s3key";
pub const LOG_BUCKET: &str = "AccesslogBucket";
pub const LOG_BUCKET_ACCESS_BLOCK: &str = "AccesslogBucketPublicAccessBlock";
pub const CONTENT_BUCKET: &str = "static-website-bucket";
pub const BUCKET_POLICY: &str = "AllowStaticWebsiteAccess";
pub const BUCKET_FOLDER: &str = "bucket-folder";
pub const CDN: &str = "cdn";
pub const TOPIC: &str = "sns_user_updates";
pub const TOPIC_POLICY: &str = "default";
pub const TOPIC_SUBSCRIPTION: &str = "user-updates-subscribe";
pub const BUCKET_NOTIFICATION: &str = "bucketNotification";

/// Edge cache lifetime; default, min and max TTL are all pinned to it
pub const CACHE_TTL_SECONDS: u64 = 600;
pub const KEY_DELETION_WINDOW_DAYS: u32 = 10;
pub const LOG_PREFIX: &str = "log/";
pub const PRICE_CLASS: &str = "PriceClass_100";

/// Declare every resource and output of the static website
pub fn static_website(config: &Config) -> Result<Stack, StackError> {
    tracing::info!(
        "Declaring static website stack '{}' ({:?} variant)",
        config.stack,
        config.variant
    );

    let mut stack = Stack::new(config.project.as_str(), config.stack.as_str());

    let encryption = match config.variant {
        Variant::Kms => {
            let key = stack.declare(Resource::new(
                KMS_KEY,
                KmsKeyArgs {
                    description: "This key is used to encrypt bucket objects".to_string(),
                    deletion_window_in_days: KEY_DELETION_WINDOW_DAYS,
                },
            ))?;
            ServerSideEncryption::kms(key.arn())
        }
        Variant::LockedDown => ServerSideEncryption::aes256(),
    };

    let log_bucket = stack.declare(Resource::new(
        LOG_BUCKET,
        BucketArgs::new(CannedAcl::LogDeliveryWrite),
    ))?;
    if config.variant == Variant::LockedDown {
        stack.declare(Resource::new(
            LOG_BUCKET_ACCESS_BLOCK,
            PublicAccessBlockArgs::all_blocked(log_bucket.id()),
        ))?;
    }

    let bucket = stack.declare(Resource::new(
        CONTENT_BUCKET,
        BucketArgs::new(CannedAcl::PublicRead)
            .encryption(encryption)
            .logging(log_bucket.id(), LOG_PREFIX)
            .website(&config.index_document, &config.error_document),
    ))?;

    stack.declare(Resource::new(
        BUCKET_POLICY,
        BucketPolicyArgs {
            bucket: bucket.id(),
            policy: public_read_policy(&bucket, config.variant),
        },
    ))?;

    stack.declare(Resource::new(
        BUCKET_FOLDER,
        SyncedFolderArgs {
            path: config.path.clone(),
            bucket_name: bucket.attr("bucket"),
            acl: CannedAcl::PublicRead,
        },
    ))?;

    let cdn = stack.declare(Resource::new(CDN, distribution(&bucket, config)))?;

    let topic = stack.declare(Resource::new(
        TOPIC,
        TopicArgs {
            delivery_policy: DeliveryPolicy::default(),
        },
    ))?;

    let topic_policy = stack.declare(Resource::new(
        TOPIC_POLICY,
        TopicPolicyArgs {
            arn: topic.arn(),
            policy: publish_from_bucket_policy(&topic, &bucket),
        },
    ))?;

    match &config.notification_email {
        Some(email) => {
            stack.declare(Resource::new(
                TOPIC_SUBSCRIPTION,
                TopicSubscriptionArgs {
                    topic: topic.arn(),
                    protocol: SubscriptionProtocol::Email,
                    endpoint: email.clone(),
                },
            ))?;
        }
        None => tracing::warn!("No notificationEmail configured; skipping topic subscription"),
    }

    // The provider validates the destination when the binding is created, so
    // the topic policy must already authorize the bucket.
    stack.declare(
        Resource::new(
            BUCKET_NOTIFICATION,
            BucketNotificationArgs {
                bucket: bucket.id(),
                topics: vec![TopicNotification {
                    topic_arn: topic.arn(),
                    events: vec![
                        S3Event::ObjectCreated,
                        S3Event::ObjectRemoved,
                        S3Event::ObjectAclPut,
                    ],
                }],
            },
        )
        .depends_on([topic.name(), topic_policy.name()]),
    )?;

    let website_endpoint = bucket.attr("websiteEndpoint");
    let cdn_domain = cdn.attr("domainName");
    stack.export("originURL", website_endpoint.with_prefix("http://"));
    stack.export("originHostname", website_endpoint);
    stack.export("cdnURL", cdn_domain.with_prefix("https://"));
    stack.export("cdnHostname", cdn_domain);

    Ok(stack)
}

/// Public `s3:GetObject` on the bucket's objects, derived from its live ARN
fn public_read_policy(bucket: &ResourceRef, variant: Variant) -> PolicyDocument {
    let arn = bucket.arn();
    let resources = match variant {
        Variant::Kms => vec![arn.clone(), arn.with_suffix("/*")],
        Variant::LockedDown => vec![arn.with_suffix("/*")],
    };

    PolicyDocument::new(vec![
        Statement::allow(Principal::Any)
            .actions(["s3:GetObject"])
            .resources(resources),
    ])
}

/// Lets the bucket, and only the bucket, publish to the topic
fn publish_from_bucket_policy(topic: &ResourceRef, bucket: &ResourceRef) -> PolicyDocument {
    PolicyDocument::new(vec![
        Statement::allow(Principal::Any)
            .sid("__default_statement_ID")
            .actions(["sns:Publish"])
            .resources([topic.arn()])
            .condition("ArnLike", "AWS:SourceArn", [bucket.arn()]),
    ])
    .with_id("__default_policy_ID")
}

fn distribution(bucket: &ResourceRef, config: &Config) -> DistributionArgs {
    let origin_id: Output = bucket.arn();

    DistributionArgs {
        enabled: true,
        origins: vec![Origin {
            origin_id: origin_id.clone(),
            domain_name: bucket.attr("websiteEndpoint"),
            // Website endpoints only speak plain HTTP
            custom_origin_config: CustomOriginConfig {
                origin_protocol_policy: OriginProtocolPolicy::HttpOnly,
                http_port: 80,
                https_port: 443,
                origin_ssl_protocols: vec!["TLSv1.2".to_string()],
            },
        }],
        default_cache_behavior: CacheBehavior::fixed_ttl(origin_id, CACHE_TTL_SECONDS),
        price_class: PRICE_CLASS.to_string(),
        custom_error_responses: vec![CustomErrorResponse {
            error_code: 404,
            response_code: 404,
            response_page_path: format!("/{}", config.error_document),
        }],
        restrictions: Restrictions {
            geo_restriction: GeoRestriction {
                restriction_type: "none".to_string(),
                locations: Vec::new(),
            },
        },
        viewer_certificate: ViewerCertificate {
            cloudfront_default_certificate: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kms_variant_declares_key_and_no_access_block() {
        let stack = static_website(&Config::default()).unwrap();
        assert!(stack.resource(KMS_KEY).is_some());
        assert!(stack.resource(LOG_BUCKET_ACCESS_BLOCK).is_none());
        assert!(stack.resource(TOPIC_SUBSCRIPTION).is_none());
    }

    #[test]
    fn test_locked_down_variant_has_no_key() {
        let mut config = Config::default();
        config.variant = Variant::LockedDown;
        let stack = static_website(&config).unwrap();
        assert!(stack.resource(KMS_KEY).is_none());
        assert!(stack.resource(LOG_BUCKET_ACCESS_BLOCK).is_some());
    }

    #[test]
    fn test_stack_renders_in_dependency_order() {
        let mut config = Config::default();
        config.notification_email = Some("ops@example.com".to_string());
        let state = static_website(&config).unwrap().render().unwrap();

        let position = |name: &str| {
            state
                .resources
                .iter()
                .position(|r| r.name == name)
                .unwrap()
        };
        assert!(position(KMS_KEY) < position(CONTENT_BUCKET));
        assert!(position(LOG_BUCKET) < position(CONTENT_BUCKET));
        assert!(position(CONTENT_BUCKET) < position(CDN));
        assert!(position(TOPIC_POLICY) < position(BUCKET_NOTIFICATION));
        assert_eq!(state.resources.len(), 10);
    }
}
