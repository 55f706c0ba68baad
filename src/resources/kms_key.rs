use serde::{Deserialize, Serialize};

/// Customer-managed encryption key for bucket objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KmsKeyArgs {
    #[serde(with = "crate::output::literal")]
    pub description: String,
    pub deletion_window_in_days: u32,
}
