use crate::output::Output;
use crate::policy::PolicyDocument;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicPolicyArgs {
    pub arn: Output,
    pub policy: PolicyDocument,
}
