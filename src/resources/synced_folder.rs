use super::bucket::CannedAcl;
use crate::output::Output;
use serde::{Deserialize, Serialize};

/// Mirror a local directory into a bucket. The sync itself is carried out by
/// the provider; this only names the source, the target and the object ACL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedFolderArgs {
    #[serde(with = "crate::output::literal")]
    pub path: String,
    pub bucket_name: Output,
    pub acl: CannedAcl,
}
