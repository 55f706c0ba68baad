use super::models::Attributes;
use std::collections::BTreeMap;

/// Errors raised while declaring, rendering or applying a stack
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("resource '{0}' is declared more than once")]
    DuplicateResource(String),

    #[error("resource '{resource}' references undeclared resource '{target}'")]
    UnknownResource { resource: String, target: String },

    #[error("dependency cycle between resources: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    #[error("attribute '{attribute}' of resource '{resource}' is not known")]
    UnresolvedReference { resource: String, attribute: String },

    #[error("invalid interpolation template '{0}'")]
    InvalidTemplate(String),

    #[error("provider rejected '{resource}': {message}")]
    Provider { resource: String, message: String },
}

impl StackError {
    pub fn provider(resource: impl Into<String>, message: impl Into<String>) -> Self {
        StackError::Provider {
            resource: resource.into(),
            message: message.into(),
        }
    }
}

/// A failed apply. Resources listed in `created` exist remotely and are left
/// for the next run to reconcile.
#[derive(Debug, thiserror::Error)]
#[error("apply failed after creating {} resource(s): {source}", .created.len())]
pub struct ApplyError {
    pub created: BTreeMap<String, Attributes>,
    #[source]
    pub source: StackError,
}

impl From<StackError> for ApplyError {
    fn from(source: StackError) -> Self {
        Self {
            created: BTreeMap::new(),
            source,
        }
    }
}
