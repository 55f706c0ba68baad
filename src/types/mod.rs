pub mod error;
pub mod models;

pub use error::{ApplyError, StackError};
pub use models::{ApplyResult, Attributes, DesiredResource, DesiredState};
