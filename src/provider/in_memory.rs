use super::backend::Provider;
use crate::content::{ContentFile, ContentManifest};
use crate::policy::PolicyDocument;
use crate::resources::{
    BucketArgs, BucketNotificationArgs, BucketPolicyArgs, CannedAcl, DistributionArgs, KmsKeyArgs,
    PublicAccessBlockArgs, ResourceKind, SyncedFolderArgs, TopicArgs, TopicNotification,
    TopicPolicyArgs, TopicSubscriptionArgs,
};
use crate::types::{Attributes, StackError};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const DEFAULT_ACCOUNT_ID: &str = "123456789012";

/// In-memory provider for local runs and testing.
///
/// Assigns physical names and ARNs the way AWS does and rejects the
/// requests AWS would reject for this stack's resource types.
#[derive(Clone)]
pub struct InMemoryProvider {
    region: String,
    account_id: String,
    state: Arc<RwLock<ProviderState>>,
}

#[derive(Default)]
struct ProviderState {
    created: HashSet<String>,
    keys: HashSet<String>,
    buckets: HashMap<String, StoredBucket>,
    topics: HashMap<String, StoredTopic>,
    distributions: HashMap<String, DistributionArgs>,
}

struct StoredBucket {
    arn: String,
    acl: CannedAcl,
    access_block: Option<PublicAccessBlockArgs>,
    policy: Option<PolicyDocument>,
    objects: BTreeMap<String, ContentFile>,
    notifications: Vec<TopicNotification>,
}

#[derive(Default)]
struct StoredTopic {
    policy: Option<PolicyDocument>,
    subscriptions: Vec<String>,
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_REGION)
    }
}

impl InMemoryProvider {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            account_id: DEFAULT_ACCOUNT_ID.to_string(),
            state: Arc::new(RwLock::new(ProviderState::default())),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Whether a resource with this logical name exists or is being created
    pub async fn contains(&self, name: &str) -> bool {
        self.state.read().await.created.contains(name)
    }

    /// Keys of the objects uploaded into `bucket`
    pub async fn bucket_objects(&self, bucket: &str) -> Vec<String> {
        self.state
            .read()
            .await
            .buckets
            .get(bucket)
            .map(|b| b.objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn bucket_notifications(&self, bucket: &str) -> Vec<TopicNotification> {
        self.state
            .read()
            .await
            .buckets
            .get(bucket)
            .map(|b| b.notifications.clone())
            .unwrap_or_default()
    }

    pub async fn bucket_policy(&self, bucket: &str) -> Option<PolicyDocument> {
        self.state
            .read()
            .await
            .buckets
            .get(bucket)
            .and_then(|b| b.policy.clone())
    }

    pub async fn distribution(&self, id: &str) -> Option<DistributionArgs> {
        self.state.read().await.distributions.get(id).cloned()
    }

    pub async fn topic_subscriptions(&self, topic_arn: &str) -> Vec<String> {
        self.state
            .read()
            .await
            .topics
            .get(topic_arn)
            .map(|t| t.subscriptions.clone())
            .unwrap_or_default()
    }

    /// `{logical}-{7 hex}`, as auto-naming does
    fn physical_name(name: &str) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}-{}", name, &suffix[..7])
    }

    async fn create_key(&self, name: &str, args: &KmsKeyArgs) -> Result<Attributes, StackError> {
        if !(7..=30).contains(&args.deletion_window_in_days) {
            return Err(StackError::provider(
                name,
                format!(
                    "ValidationException: deletion window must be between 7 and 30 days, got {}",
                    args.deletion_window_in_days
                ),
            ));
        }

        let key_id = Uuid::new_v4().to_string();
        let arn = format!(
            "arn:aws:kms:{}:{}:key/{}",
            self.region, self.account_id, key_id
        );
        self.state.write().await.keys.insert(arn.clone());

        Ok(Attributes::from([
            ("id".to_string(), key_id.clone()),
            ("keyId".to_string(), key_id),
            ("arn".to_string(), arn),
        ]))
    }

    async fn create_bucket(&self, name: &str, args: &BucketArgs) -> Result<Attributes, StackError> {
        let mut state = self.state.write().await;

        if let Some(encryption) = &args.server_side_encryption_configuration
            && let Some(key) = &encryption.kms_master_key_id
        {
            let key = key.known_value()?;
            if !state.keys.contains(key) {
                return Err(StackError::provider(
                    name,
                    format!("KMS.NotFoundException: key '{key}' does not exist"),
                ));
            }
        }

        for logging in &args.loggings {
            let target = logging.target_bucket.known_value()?;
            match state.buckets.get(target) {
                None => {
                    return Err(StackError::provider(
                        name,
                        format!("InvalidTargetBucketForLogging: bucket '{target}' does not exist"),
                    ));
                }
                Some(target_bucket) if target_bucket.acl != CannedAcl::LogDeliveryWrite => {
                    return Err(StackError::provider(
                        name,
                        format!(
                            "InvalidTargetBucketForLogging: bucket '{target}' does not grant log delivery"
                        ),
                    ));
                }
                Some(_) => {}
            }
        }

        let bucket = Self::physical_name(name).to_lowercase().replace('_', "-");
        let arn = format!("arn:aws:s3:::{bucket}");

        let mut attributes = Attributes::from([
            ("id".to_string(), bucket.clone()),
            ("bucket".to_string(), bucket.clone()),
            ("arn".to_string(), arn.clone()),
            (
                "bucketDomainName".to_string(),
                format!("{bucket}.s3.amazonaws.com"),
            ),
        ]);
        if args.website.is_some() {
            attributes.insert(
                "websiteEndpoint".to_string(),
                format!("{bucket}.s3-website-{}.amazonaws.com", self.region),
            );
        }

        state.buckets.insert(
            bucket,
            StoredBucket {
                arn,
                acl: args.acl,
                access_block: None,
                policy: None,
                objects: BTreeMap::new(),
                notifications: Vec::new(),
            },
        );
        Ok(attributes)
    }

    async fn create_access_block(
        &self,
        name: &str,
        args: &PublicAccessBlockArgs,
    ) -> Result<Attributes, StackError> {
        let bucket_name = args.bucket.known_value()?;
        let mut state = self.state.write().await;
        let bucket = state
            .buckets
            .get_mut(bucket_name)
            .ok_or_else(|| no_such_bucket(name, bucket_name))?;

        bucket.access_block = Some(args.clone());
        Ok(Attributes::from([("id".to_string(), bucket_name.to_string())]))
    }

    async fn create_bucket_policy(
        &self,
        name: &str,
        args: &BucketPolicyArgs,
    ) -> Result<Attributes, StackError> {
        let bucket_name = args.bucket.known_value()?;
        let mut state = self.state.write().await;
        let bucket = state
            .buckets
            .get_mut(bucket_name)
            .ok_or_else(|| no_such_bucket(name, bucket_name))?;

        for statement in &args.policy.statement {
            for resource in &statement.resource {
                let resource = resource.known_value()?;
                if resource != bucket.arn && !resource.starts_with(&format!("{}/", bucket.arn)) {
                    return Err(StackError::provider(
                        name,
                        format!("MalformedPolicy: policy has invalid resource '{resource}'"),
                    ));
                }
            }
        }

        let blocks_public_policy = bucket
            .access_block
            .as_ref()
            .is_some_and(|b| b.block_public_policy);
        if args.policy.is_public() && blocks_public_policy {
            return Err(StackError::provider(
                name,
                "AccessDenied: public policies are blocked by the BlockPublicPolicy setting",
            ));
        }

        bucket.policy = Some(args.policy.clone());
        Ok(Attributes::from([("id".to_string(), bucket_name.to_string())]))
    }

    async fn sync_folder(
        &self,
        name: &str,
        args: &SyncedFolderArgs,
    ) -> Result<Attributes, StackError> {
        let bucket_name = args.bucket_name.known_value()?;

        let path = args.path.clone();
        let manifest = tokio::task::spawn_blocking(move || ContentManifest::scan(path))
            .await
            .map_err(|e| StackError::provider(name, format!("content scan aborted: {e}")))?
            .map_err(|e| StackError::provider(name, e.to_string()))?;

        let mut state = self.state.write().await;
        let bucket = state
            .buckets
            .get_mut(bucket_name)
            .ok_or_else(|| no_such_bucket(name, bucket_name))?;

        let blocks_public_acls = bucket
            .access_block
            .as_ref()
            .is_some_and(|b| b.block_public_acls);
        if args.acl.is_public() && blocks_public_acls {
            return Err(StackError::provider(
                name,
                "AccessDenied: public object ACLs are blocked by the BlockPublicAcls setting",
            ));
        }

        tracing::debug!(
            "Uploading {} objects from {} into {}",
            manifest.files.len(),
            args.path,
            bucket_name
        );
        for file in &manifest.files {
            bucket.objects.insert(file.key.clone(), file.clone());
        }

        Ok(Attributes::from([
            ("id".to_string(), Self::physical_name(name)),
            ("fileCount".to_string(), manifest.files.len().to_string()),
            ("contentHash".to_string(), manifest.digest()),
        ]))
    }

    async fn create_distribution(
        &self,
        name: &str,
        args: &DistributionArgs,
    ) -> Result<Attributes, StackError> {
        let target = args.default_cache_behavior.target_origin_id.known_value()?;
        let mut has_target = false;
        for origin in &args.origins {
            has_target |= origin.origin_id.known_value()? == target;
        }
        if !has_target {
            return Err(StackError::provider(
                name,
                format!("InvalidArgument: no origin with id '{target}'"),
            ));
        }
        if let Some(response) = args
            .custom_error_responses
            .iter()
            .find(|r| !r.response_page_path.starts_with('/'))
        {
            return Err(StackError::provider(
                name,
                format!(
                    "InvalidArgument: response page path '{}' must begin with '/'",
                    response.response_page_path
                ),
            ));
        }

        let id = format!(
            "E{}",
            Uuid::new_v4().simple().to_string()[..13].to_uppercase()
        );
        let domain = format!(
            "d{}.cloudfront.net",
            &Uuid::new_v4().simple().to_string()[..14]
        );
        let arn = format!("arn:aws:cloudfront::{}:distribution/{}", self.account_id, id);

        self.state
            .write()
            .await
            .distributions
            .insert(id.clone(), args.clone());

        Ok(Attributes::from([
            ("id".to_string(), id),
            ("arn".to_string(), arn),
            ("domainName".to_string(), domain),
            ("hostedZoneId".to_string(), "Z2FDTNDATAQYW2".to_string()),
        ]))
    }

    async fn create_topic(&self, name: &str, _args: &TopicArgs) -> Result<Attributes, StackError> {
        let topic = Self::physical_name(name);
        let arn = format!("arn:aws:sns:{}:{}:{}", self.region, self.account_id, topic);
        self.state
            .write()
            .await
            .topics
            .insert(arn.clone(), StoredTopic::default());

        Ok(Attributes::from([
            ("id".to_string(), arn.clone()),
            ("name".to_string(), topic),
            ("arn".to_string(), arn),
        ]))
    }

    async fn create_topic_policy(
        &self,
        name: &str,
        args: &TopicPolicyArgs,
    ) -> Result<Attributes, StackError> {
        let arn = args.arn.known_value()?;
        let mut state = self.state.write().await;
        let topic = state
            .topics
            .get_mut(arn)
            .ok_or_else(|| no_such_topic(name, arn))?;

        topic.policy = Some(args.policy.clone());
        Ok(Attributes::from([("id".to_string(), arn.to_string())]))
    }

    async fn create_subscription(
        &self,
        name: &str,
        args: &TopicSubscriptionArgs,
    ) -> Result<Attributes, StackError> {
        let arn = args.topic.known_value()?;
        let mut state = self.state.write().await;
        let topic = state
            .topics
            .get_mut(arn)
            .ok_or_else(|| no_such_topic(name, arn))?;

        topic.subscriptions.push(args.endpoint.clone());
        let subscription_arn = format!("{arn}:{}", Uuid::new_v4());
        Ok(Attributes::from([
            ("id".to_string(), subscription_arn.clone()),
            ("arn".to_string(), subscription_arn),
            (
                "pendingConfirmation".to_string(),
                args.protocol.requires_confirmation().to_string(),
            ),
        ]))
    }

    async fn create_notification(
        &self,
        name: &str,
        args: &BucketNotificationArgs,
    ) -> Result<Attributes, StackError> {
        let bucket_name = args.bucket.known_value()?;
        let mut state = self.state.write().await;
        let bucket_arn = state
            .buckets
            .get(bucket_name)
            .map(|b| b.arn.clone())
            .ok_or_else(|| no_such_bucket(name, bucket_name))?;

        for config in &args.topics {
            let topic_arn = config.topic_arn.known_value()?;
            let authorized = state
                .topics
                .get(topic_arn)
                .and_then(|t| t.policy.as_ref())
                .is_some_and(|policy| authorizes_publish(policy, topic_arn, &bucket_arn));
            if !authorized {
                return Err(StackError::provider(
                    name,
                    format!(
                        "InvalidArgument: Unable to validate the following destination configurations: {topic_arn}"
                    ),
                ));
            }
        }

        if let Some(bucket) = state.buckets.get_mut(bucket_name) {
            bucket.notifications = args.topics.clone();
        }
        Ok(Attributes::from([("id".to_string(), bucket_name.to_string())]))
    }
}

/// Whether `policy` lets the bucket publish to the topic
fn authorizes_publish(policy: &PolicyDocument, topic_arn: &str, bucket_arn: &str) -> bool {
    policy.grants("sns:Publish", topic_arn).any(|statement| {
        let sources = statement.condition_values("ArnLike", "AWS:SourceArn");
        sources.is_empty() || sources.iter().any(|s| s.as_known() == Some(bucket_arn))
    })
}

fn no_such_bucket(resource: &str, bucket: &str) -> StackError {
    StackError::provider(
        resource,
        format!("NoSuchBucket: the specified bucket '{bucket}' does not exist"),
    )
}

fn no_such_topic(resource: &str, topic_arn: &str) -> StackError {
    StackError::provider(
        resource,
        format!("NotFound: topic '{topic_arn}' does not exist"),
    )
}

#[async_trait::async_trait]
impl Provider for InMemoryProvider {
    async fn create(&self, name: &str, resource: &ResourceKind) -> Result<Attributes, StackError> {
        // Reserved up front, released again if creation fails
        if !self.state.write().await.created.insert(name.to_string()) {
            return Err(StackError::provider(
                name,
                "AlreadyExists: a resource with this name was already created",
            ));
        }

        let result = match resource {
            ResourceKind::KmsKey(args) => self.create_key(name, args).await,
            ResourceKind::Bucket(args) => self.create_bucket(name, args).await,
            ResourceKind::PublicAccessBlock(args) => self.create_access_block(name, args).await,
            ResourceKind::BucketPolicy(args) => self.create_bucket_policy(name, args).await,
            ResourceKind::SyncedFolder(args) => self.sync_folder(name, args).await,
            ResourceKind::Distribution(args) => self.create_distribution(name, args).await,
            ResourceKind::Topic(args) => self.create_topic(name, args).await,
            ResourceKind::TopicPolicy(args) => self.create_topic_policy(name, args).await,
            ResourceKind::TopicSubscription(args) => self.create_subscription(name, args).await,
            ResourceKind::BucketNotification(args) => self.create_notification(name, args).await,
        };

        match result {
            Ok(attributes) => {
                tracing::info!("Created {} '{}'", resource.type_token(), name);
                Ok(attributes)
            }
            Err(e) => {
                self.state.write().await.created.remove(name);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Output;
    use crate::policy::{Principal, Statement};
    use crate::resources::S3Event;

    async fn create_bucket(provider: &InMemoryProvider, name: &str, acl: CannedAcl) -> Attributes {
        provider
            .create(name, &BucketArgs::new(acl).website("index.html", "error.html").into())
            .await
            .unwrap()
    }

    async fn create_topic(provider: &InMemoryProvider) -> String {
        let attrs = provider
            .create(
                "topic",
                &TopicArgs {
                    delivery_policy: Default::default(),
                }
                .into(),
            )
            .await
            .unwrap();
        attrs["arn"].clone()
    }

    #[tokio::test]
    async fn test_bucket_attributes() {
        let provider = InMemoryProvider::new("eu-west-1");
        let attrs = create_bucket(&provider, "static-website-bucket", CannedAcl::PublicRead).await;

        let bucket = &attrs["bucket"];
        assert!(bucket.starts_with("static-website-bucket-"));
        assert_eq!(bucket.len(), "static-website-bucket-".len() + 7);
        assert_eq!(attrs["arn"], format!("arn:aws:s3:::{bucket}"));
        assert_eq!(
            attrs["websiteEndpoint"],
            format!("{bucket}.s3-website-eu-west-1.amazonaws.com")
        );
    }

    #[tokio::test]
    async fn test_duplicate_logical_name_rejected() {
        let provider = InMemoryProvider::default();
        create_bucket(&provider, "logs", CannedAcl::LogDeliveryWrite).await;
        let result = provider
            .create("logs", &BucketArgs::new(CannedAcl::Private).into())
            .await;
        assert!(matches!(result, Err(StackError::Provider { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_creates_with_same_name_yield_one_resource() {
        let provider = InMemoryProvider::default();
        let args: ResourceKind = BucketArgs::new(CannedAcl::Private).into();

        let (first, second) = tokio::join!(
            provider.create("logs", &args),
            provider.create("logs", &args)
        );
        assert_eq!([first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert_eq!(provider.state.read().await.buckets.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_create_releases_name() {
        let provider = InMemoryProvider::default();
        let missing_key = BucketArgs::new(CannedAcl::Private)
            .encryption(crate::resources::ServerSideEncryption::kms(Output::known(
                "arn:aws:kms:us-east-1:123456789012:key/missing",
            )));
        assert!(provider.create("site", &missing_key.into()).await.is_err());
        assert!(!provider.contains("site").await);

        create_bucket(&provider, "site", CannedAcl::PublicRead).await;
        assert!(provider.contains("site").await);
    }

    #[tokio::test]
    async fn test_logging_requires_log_delivery_target() {
        let provider = InMemoryProvider::default();
        let plain = create_bucket(&provider, "plain", CannedAcl::Private).await;

        let args = BucketArgs::new(CannedAcl::PublicRead).logging(Output::known(&plain["id"]), "log/");
        let result = provider.create("site", &args.into()).await;
        assert!(matches!(
            result,
            Err(StackError::Provider { message, .. }) if message.starts_with("InvalidTargetBucketForLogging")
        ));
    }

    #[tokio::test]
    async fn test_public_policy_rejected_when_blocked() {
        let provider = InMemoryProvider::default();
        let attrs = create_bucket(&provider, "logs", CannedAcl::LogDeliveryWrite).await;
        provider
            .create(
                "block",
                &PublicAccessBlockArgs::all_blocked(Output::known(&attrs["id"])).into(),
            )
            .await
            .unwrap();

        let policy = PolicyDocument::new(vec![
            Statement::allow(Principal::Any)
                .actions(["s3:GetObject"])
                .resources([Output::known(format!("{}/*", attrs["arn"]))]),
        ]);
        let result = provider
            .create(
                "policy",
                &BucketPolicyArgs {
                    bucket: Output::known(&attrs["id"]),
                    policy,
                }
                .into(),
            )
            .await;
        assert!(matches!(
            result,
            Err(StackError::Provider { message, .. }) if message.starts_with("AccessDenied")
        ));
    }

    #[tokio::test]
    async fn test_notification_rejected_before_topic_policy() {
        let provider = InMemoryProvider::default();
        let bucket = create_bucket(&provider, "site", CannedAcl::PublicRead).await;
        let topic_arn = create_topic(&provider).await;

        let notification: ResourceKind = BucketNotificationArgs {
            bucket: Output::known(&bucket["id"]),
            topics: vec![TopicNotification {
                topic_arn: Output::known(&topic_arn),
                events: vec![S3Event::ObjectCreated],
            }],
        }
        .into();

        let rejected = provider.create("notification", &notification).await;
        assert!(matches!(
            rejected,
            Err(StackError::Provider { message, .. }) if message.contains("destination configurations")
        ));

        let policy = PolicyDocument::new(vec![
            Statement::allow(Principal::Any)
                .actions(["sns:Publish"])
                .resources([Output::known(&topic_arn)])
                .condition("ArnLike", "AWS:SourceArn", [Output::known(&bucket["arn"])]),
        ]);
        provider
            .create(
                "topic-policy",
                &TopicPolicyArgs {
                    arn: Output::known(&topic_arn),
                    policy,
                }
                .into(),
            )
            .await
            .unwrap();

        provider.create("notification", &notification).await.unwrap();
        assert_eq!(provider.bucket_notifications(&bucket["id"]).await.len(), 1);
    }

    #[tokio::test]
    async fn test_unresolved_input_rejected() {
        let provider = InMemoryProvider::default();
        let result = provider
            .create(
                "block",
                &PublicAccessBlockArgs::all_blocked(Output::attribute("logs", "id")).into(),
            )
            .await;
        assert!(matches!(result, Err(StackError::UnresolvedReference { .. })));
    }
}
