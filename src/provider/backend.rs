use crate::resources::ResourceKind;
use crate::types::{Attributes, StackError};

/// Provider trait - the seam to whatever enacts the declarations.
///
/// `resource` arrives fully resolved: every output it carries is known.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    async fn create(&self, name: &str, resource: &ResourceKind) -> Result<Attributes, StackError>;
}
