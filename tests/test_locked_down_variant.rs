#[macro_use]
mod helpers;

use helpers::config_for;
use static_site_stack::output::Output;
use static_site_stack::program::{
    BUCKET_POLICY, CONTENT_BUCKET, KMS_KEY, LOG_BUCKET, LOG_BUCKET_ACCESS_BLOCK,
};
use static_site_stack::resources::{CannedAcl, SseAlgorithm};
use static_site_stack::{Variant, static_website};

#[test]
fn test_log_bucket_blocks_all_public_access() {
    let stack = static_website(&config_for(Variant::LockedDown)).unwrap();

    let log_bucket = args_of!(stack, LOG_BUCKET, Bucket);
    assert_eq!(log_bucket.acl, CannedAcl::LogDeliveryWrite);

    let block = args_of!(stack, LOG_BUCKET_ACCESS_BLOCK, PublicAccessBlock);
    assert_eq!(block.bucket, Output::attribute(LOG_BUCKET, "id"));
    assert!(block.block_public_acls);
    assert!(block.block_public_policy);
    assert!(block.ignore_public_acls);
    assert!(block.restrict_public_buckets);
}

#[test]
fn test_content_bucket_stays_public() {
    let stack = static_website(&config_for(Variant::LockedDown)).unwrap();
    let bucket = args_of!(stack, CONTENT_BUCKET, Bucket);
    assert_eq!(bucket.acl, CannedAcl::PublicRead);
    assert!(args_of!(stack, BUCKET_POLICY, BucketPolicy).policy.is_public());
}

#[test]
fn test_default_encryption_without_key() {
    let stack = static_website(&config_for(Variant::LockedDown)).unwrap();
    assert!(stack.resource(KMS_KEY).is_none());

    let bucket = args_of!(stack, CONTENT_BUCKET, Bucket);
    let encryption = bucket.server_side_encryption_configuration.as_ref().unwrap();
    assert_eq!(encryption.sse_algorithm, SseAlgorithm::Aes256);
    assert!(encryption.kms_master_key_id.is_none());
}

#[test]
fn test_policy_covers_objects_only() {
    let stack = static_website(&config_for(Variant::LockedDown)).unwrap();
    let policy = args_of!(stack, BUCKET_POLICY, BucketPolicy);
    assert_eq!(
        policy.policy.statement[0].resource,
        vec![Output::attribute(CONTENT_BUCKET, "arn").with_suffix("/*")]
    );
}

#[test]
fn test_variants_are_not_merged() {
    let kms = static_website(&config_for(Variant::Kms)).unwrap();
    let locked = static_website(&config_for(Variant::LockedDown)).unwrap();

    assert!(kms.resource(LOG_BUCKET_ACCESS_BLOCK).is_none());
    assert!(locked.resource(KMS_KEY).is_none());
    assert_eq!(kms.resources().len(), locked.resources().len());
}
