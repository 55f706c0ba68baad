use crate::output::Output;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubscriptionProtocol {
    Email,
    EmailJson,
    Http,
    Https,
    Sqs,
}

impl SubscriptionProtocol {
    /// Whether the endpoint owner has to confirm the subscription
    pub fn requires_confirmation(self) -> bool {
        matches!(
            self,
            SubscriptionProtocol::Email
                | SubscriptionProtocol::EmailJson
                | SubscriptionProtocol::Http
                | SubscriptionProtocol::Https
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSubscriptionArgs {
    pub topic: Output,
    pub protocol: SubscriptionProtocol,
    #[serde(with = "crate::output::literal")]
    pub endpoint: String,
}
