mod backend;
mod in_memory;

pub use backend::Provider;
pub use in_memory::InMemoryProvider;
