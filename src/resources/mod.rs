//! Resource declarations.
//!
//! A [`Resource`] pairs a logical name with typed inputs. Inputs reference
//! other resources only through [`Output`] attributes, so every edge in the
//! declaration graph is discoverable from the rendered inputs.

mod bucket;
mod bucket_notification;
mod bucket_policy;
mod distribution;
mod kms_key;
mod public_access_block;
mod synced_folder;
mod topic;
mod topic_policy;
mod topic_subscription;

pub use bucket::{
    BucketArgs, BucketLogging, BucketWebsite, CannedAcl, ServerSideEncryption, SseAlgorithm,
};
pub use bucket_notification::{BucketNotificationArgs, S3Event, TopicNotification};
pub use bucket_policy::BucketPolicyArgs;
pub use distribution::{
    CacheBehavior, CookieForwarding, CustomErrorResponse, CustomOriginConfig, DistributionArgs,
    ForwardedValues, GeoRestriction, HttpMethod, Origin, OriginProtocolPolicy, Restrictions,
    ViewerCertificate, ViewerProtocolPolicy,
};
pub use kms_key::KmsKeyArgs;
pub use public_access_block::PublicAccessBlockArgs;
pub use synced_folder::SyncedFolderArgs;
pub use topic::{DeliveryPolicy, TopicArgs};
pub use topic_policy::TopicPolicyArgs;
pub use topic_subscription::{SubscriptionProtocol, TopicSubscriptionArgs};

use crate::output::{AttrRef, AttributeLookup, Output, interpolate, references_in};
use crate::types::StackError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Typed inputs, tagged with the provider's resource type token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "inputs")]
pub enum ResourceKind {
    #[serde(rename = "aws:kms/key:Key")]
    KmsKey(KmsKeyArgs),
    #[serde(rename = "aws:s3/bucket:Bucket")]
    Bucket(BucketArgs),
    #[serde(rename = "aws:s3/bucketPublicAccessBlock:BucketPublicAccessBlock")]
    PublicAccessBlock(PublicAccessBlockArgs),
    #[serde(rename = "aws:s3/bucketPolicy:BucketPolicy")]
    BucketPolicy(BucketPolicyArgs),
    #[serde(rename = "synced-folder:index:S3BucketFolder")]
    SyncedFolder(SyncedFolderArgs),
    #[serde(rename = "aws:cloudfront/distribution:Distribution")]
    Distribution(Box<DistributionArgs>),
    #[serde(rename = "aws:sns/topic:Topic")]
    Topic(TopicArgs),
    #[serde(rename = "aws:sns/topicPolicy:TopicPolicy")]
    TopicPolicy(TopicPolicyArgs),
    #[serde(rename = "aws:sns/topicSubscription:TopicSubscription")]
    TopicSubscription(TopicSubscriptionArgs),
    #[serde(rename = "aws:s3/bucketNotification:BucketNotification")]
    BucketNotification(BucketNotificationArgs),
}

impl ResourceKind {
    pub fn type_token(&self) -> &'static str {
        match self {
            ResourceKind::KmsKey(_) => "aws:kms/key:Key",
            ResourceKind::Bucket(_) => "aws:s3/bucket:Bucket",
            ResourceKind::PublicAccessBlock(_) => {
                "aws:s3/bucketPublicAccessBlock:BucketPublicAccessBlock"
            }
            ResourceKind::BucketPolicy(_) => "aws:s3/bucketPolicy:BucketPolicy",
            ResourceKind::SyncedFolder(_) => "synced-folder:index:S3BucketFolder",
            ResourceKind::Distribution(_) => "aws:cloudfront/distribution:Distribution",
            ResourceKind::Topic(_) => "aws:sns/topic:Topic",
            ResourceKind::TopicPolicy(_) => "aws:sns/topicPolicy:TopicPolicy",
            ResourceKind::TopicSubscription(_) => "aws:sns/topicSubscription:TopicSubscription",
            ResourceKind::BucketNotification(_) => "aws:s3/bucketNotification:BucketNotification",
        }
    }
}

macro_rules! impl_from_args {
    ($($args:ty => $variant:ident),* $(,)?) => {
        $(impl From<$args> for ResourceKind {
            fn from(args: $args) -> Self {
                ResourceKind::$variant(args.into())
            }
        })*
    };
}

impl_from_args! {
    KmsKeyArgs => KmsKey,
    BucketArgs => Bucket,
    PublicAccessBlockArgs => PublicAccessBlock,
    BucketPolicyArgs => BucketPolicy,
    SyncedFolderArgs => SyncedFolder,
    DistributionArgs => Distribution,
    TopicArgs => Topic,
    TopicPolicyArgs => TopicPolicy,
    TopicSubscriptionArgs => TopicSubscription,
    BucketNotificationArgs => BucketNotification,
}

/// A declared resource
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub name: String,
    pub kind: ResourceKind,
    /// Explicit ordering dependencies, on top of those implied by inputs
    pub depends_on: Vec<String>,
}

impl Resource {
    pub fn new(name: impl Into<String>, kind: impl Into<ResourceKind>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            depends_on: Vec::new(),
        }
    }

    pub fn depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn type_token(&self) -> &'static str {
        self.kind.type_token()
    }

    /// Inputs as they appear in the desired-state document
    pub fn inputs(&self) -> Result<Value, StackError> {
        let mut tagged = serde_json::to_value(&self.kind)?;
        Ok(tagged
            .get_mut("inputs")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    /// Attribute references implied by the inputs
    pub fn references(&self) -> Result<BTreeSet<AttrRef>, StackError> {
        references_in(&self.inputs()?)
    }

    /// Inputs with every output resolved against `lookup`
    pub fn resolve<L>(&self, lookup: &L) -> Result<ResourceKind, StackError>
    where
        L: AttributeLookup + ?Sized,
    {
        let tagged = serde_json::to_value(&self.kind)?;
        Ok(serde_json::from_value(interpolate(tagged, lookup)?)?)
    }
}

/// Handle to a declared resource, used to reference its attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    name: String,
}

impl ResourceRef {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, attribute: &str) -> Output {
        Output::attribute(self.name.as_str(), attribute)
    }

    pub fn id(&self) -> Output {
        self.attr("id")
    }

    pub fn arn(&self) -> Output {
        self.attr("arn")
    }
}
