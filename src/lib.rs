// Library exports for the CLI and integration tests
pub mod config;
pub mod content;
pub mod deploy;
pub mod graph;
pub mod output;
pub mod policy;
pub mod program;
pub mod provider;
pub mod resources;
pub mod stack;
pub mod types;

// Re-export commonly used types
pub use config::{Config, Variant};
pub use deploy::apply;
pub use output::Output;
pub use provider::{InMemoryProvider, Provider};
pub use stack::Stack;
pub use types::{ApplyError, ApplyResult, Attributes, DesiredState, StackError};

// Re-export the stack program
pub use program::static_website;
