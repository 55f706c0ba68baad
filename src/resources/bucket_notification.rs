use crate::output::Output;
use serde::{Deserialize, Serialize};

/// Object lifecycle events a bucket can publish
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum S3Event {
    #[serde(rename = "s3:ObjectCreated:*")]
    ObjectCreated,
    #[serde(rename = "s3:ObjectRemoved:*")]
    ObjectRemoved,
    #[serde(rename = "s3:ObjectAcl:Put")]
    ObjectAclPut,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicNotification {
    pub topic_arn: Output,
    pub events: Vec<S3Event>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketNotificationArgs {
    pub bucket: Output,
    pub topics: Vec<TopicNotification>,
}
