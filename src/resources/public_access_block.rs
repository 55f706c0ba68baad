use crate::output::Output;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAccessBlockArgs {
    pub bucket: Output,
    pub block_public_acls: bool,
    pub block_public_policy: bool,
    pub ignore_public_acls: bool,
    pub restrict_public_buckets: bool,
}

impl PublicAccessBlockArgs {
    /// Block every form of public access to `bucket`
    pub fn all_blocked(bucket: Output) -> Self {
        Self {
            bucket,
            block_public_acls: true,
            block_public_policy: true,
            ignore_public_acls: true,
            restrict_public_buckets: true,
        }
    }

    pub fn is_fully_blocked(&self) -> bool {
        self.block_public_acls
            && self.block_public_policy
            && self.ignore_public_acls
            && self.restrict_public_buckets
    }
}
