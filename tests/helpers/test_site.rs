use static_site_stack::{ApplyError, ApplyResult, Config, InMemoryProvider, Variant, apply, static_website};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_EMAIL: &str = "webmaster@example.com";

/// Configuration with a notification email and the given variant
pub fn config_for(variant: Variant) -> Config {
    let mut config = Config::default();
    config.variant = variant;
    config.notification_email = Some(TEST_EMAIL.to_string());
    config
}

/// A content directory plus an in-memory provider to apply against
///
/// The directory is removed when the site is dropped.
pub struct TestSite {
    pub dir: TempDir,
    pub provider: Arc<InMemoryProvider>,
    pub config: Config,
}

impl TestSite {
    pub fn new(variant: Variant) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>Hello</h1>").unwrap();
        fs::write(dir.path().join("error.html"), "<h1>Not found</h1>").unwrap();
        fs::create_dir(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("css").join("site.css"), "h1 { color: red }").unwrap();

        let mut config = config_for(variant);
        config.path = dir.path().to_string_lossy().into_owned();

        TestSite {
            dir,
            provider: Arc::new(InMemoryProvider::new(config.region.as_str())),
            config,
        }
    }

    pub async fn up(&self) -> Result<ApplyResult, ApplyError> {
        let stack = static_website(&self.config).unwrap();
        apply(&stack, self.provider.clone()).await
    }
}
