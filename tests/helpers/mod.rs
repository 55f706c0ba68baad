#![allow(dead_code, unused_imports, unused_macros)]

mod test_site;

pub use test_site::{TEST_EMAIL, TestSite, config_for};

/// Borrow the typed inputs of a declared resource, panicking on a kind mismatch
macro_rules! args_of {
    ($stack:expr, $name:expr, $variant:ident) => {
        match &$stack
            .resource($name)
            .unwrap_or_else(|| panic!("resource '{}' is not declared", $name))
            .kind
        {
            static_site_stack::resources::ResourceKind::$variant(args) => args,
            other => panic!("resource '{}' has unexpected kind {:?}", $name, other),
        }
    };
}
