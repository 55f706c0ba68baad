use crate::output::Output;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attributes reported by a provider once a resource has been created
pub type Attributes = BTreeMap<String, String>;

/// Desired-state document handed to a reconciliation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredState {
    pub project: String,
    pub stack: String,
    /// Resources in dependency order, leaves first
    pub resources: Vec<DesiredResource>,
    pub outputs: BTreeMap<String, Output>,
}

impl DesiredState {
    pub fn resource(&self, name: &str) -> Option<&DesiredResource> {
        self.resources.iter().find(|r| r.name == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredResource {
    pub name: String,
    #[serde(rename = "type")]
    pub type_token: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    pub inputs: serde_json::Value,
}

/// Result of a successful apply
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResult {
    pub resources: BTreeMap<String, Attributes>,
    pub outputs: BTreeMap<String, String>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}
