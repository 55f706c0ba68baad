use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicArgs {
    pub delivery_policy: DeliveryPolicy,
}

/// SNS delivery policy; only the HTTP section is used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPolicy {
    pub http: HttpDeliveryPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpDeliveryPolicy {
    pub default_healthy_retry_policy: RetryPolicy,
    pub disable_subscription_overrides: bool,
    pub default_throttle_policy: ThrottlePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    pub min_delay_target: u32,
    pub max_delay_target: u32,
    pub num_retries: u32,
    pub num_max_delay_retries: u32,
    pub num_no_delay_retries: u32,
    pub num_min_delay_retries: u32,
    pub backoff_function: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThrottlePolicy {
    pub max_receives_per_second: u32,
}

impl Default for DeliveryPolicy {
    /// Three linear retries 20s apart, at most one delivery per second
    fn default() -> Self {
        Self {
            http: HttpDeliveryPolicy {
                default_healthy_retry_policy: RetryPolicy {
                    min_delay_target: 20,
                    max_delay_target: 20,
                    num_retries: 3,
                    num_max_delay_retries: 0,
                    num_no_delay_retries: 0,
                    num_min_delay_retries: 0,
                    backoff_function: "linear".to_string(),
                },
                disable_subscription_overrides: false,
                default_throttle_policy: ThrottlePolicy {
                    max_receives_per_second: 1,
                },
            },
        }
    }
}
