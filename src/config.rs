use crate::types::StackError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_PROJECT: &str = "static-website";
pub const DEFAULT_STACK: &str = "dev";
pub const DEFAULT_PATH: &str = "./www";
pub const DEFAULT_INDEX_DOCUMENT: &str = "index.html";
pub const DEFAULT_ERROR_DOCUMENT: &str = "error.html";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Which of the two declared infrastructure layouts to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// KMS-encrypted content bucket; policy covers the bucket and its objects
    #[default]
    Kms,
    /// AES256 default encryption, log bucket behind a public access block,
    /// policy covers objects only
    LockedDown,
}

impl FromStr for Variant {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kms" => Ok(Variant::Kms),
            "locked-down" => Ok(Variant::LockedDown),
            other => Err(StackError::Config(format!(
                "unknown variant '{other}' (expected 'kms' or 'locked-down')"
            ))),
        }
    }
}

/// Resolved program configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub project: String,
    pub stack: String,
    /// Local directory mirrored into the content bucket
    pub path: String,
    pub index_document: String,
    pub error_document: String,
    pub variant: Variant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_email: Option<String>,
    pub region: String,
}

/// Stack settings file, e.g. `Pulumi.dev.yaml`:
///
/// ```yaml
/// config:
///   aws:region: us-east-1
///   static-website:indexDocument: home.html
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackSettings {
    #[serde(default)]
    pub config: BTreeMap<String, serde_yml::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_PROJECT, DEFAULT_STACK)
    }
}

impl Config {
    pub fn new(project: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            stack: stack.into(),
            path: DEFAULT_PATH.to_string(),
            index_document: DEFAULT_INDEX_DOCUMENT.to_string(),
            error_document: DEFAULT_ERROR_DOCUMENT.to_string(),
            variant: Variant::default(),
            notification_email: None,
            region: DEFAULT_REGION.to_string(),
        }
    }

    /// Load settings from a YAML file, or JSON when the extension is `.json`
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        project: &str,
        stack: &str,
    ) -> Result<Self, StackError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let settings: StackSettings = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yml::from_str(&content)?,
        };

        let mut config = Self::new(project, stack);
        for (key, value) in &settings.config {
            config.set(key, &scalar_to_string(key, value)?)?;
        }
        Ok(config)
    }

    /// Set one configuration key. Keys may be namespaced with the project
    /// name (`static-website:path`); `aws:region` selects the region.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), StackError> {
        if key == "aws:region" {
            self.region = value.to_string();
            return Ok(());
        }

        let bare = match key.split_once(':') {
            Some((namespace, bare)) if namespace == self.project => bare,
            Some(_) => {
                tracing::warn!("Ignoring configuration key '{}' from another namespace", key);
                return Ok(());
            }
            None => key,
        };

        match bare {
            "path" => self.path = value.to_string(),
            "indexDocument" => self.index_document = value.to_string(),
            "errorDocument" => self.error_document = value.to_string(),
            "variant" => self.variant = value.parse()?,
            "notificationEmail" => self.notification_email = Some(value.to_string()),
            _ => tracing::warn!("Ignoring unknown configuration key '{}'", key),
        }
        Ok(())
    }

    /// Apply a `key=value` override from the command line
    pub fn set_pair(&mut self, pair: &str) -> Result<(), StackError> {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| StackError::Config(format!("expected key=value, got '{pair}'")))?;
        self.set(key.trim(), value.trim())
    }
}

fn scalar_to_string(key: &str, value: &serde_yml::Value) -> Result<String, StackError> {
    match value {
        serde_yml::Value::String(s) => Ok(s.clone()),
        serde_yml::Value::Bool(b) => Ok(b.to_string()),
        serde_yml::Value::Number(n) => Ok(n.to_string()),
        _ => Err(StackError::Config(format!(
            "value of '{key}' must be a string, number or boolean"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.path, "./www");
        assert_eq!(config.index_document, "index.html");
        assert_eq!(config.error_document, "error.html");
        assert_eq!(config.variant, Variant::Kms);
        assert_eq!(config.region, "us-east-1");
        assert!(config.notification_email.is_none());
    }

    #[test]
    fn test_namespaced_and_bare_keys() {
        let mut config = Config::default();
        config.set("static-website:indexDocument", "home.html").unwrap();
        config.set("errorDocument", "404.html").unwrap();
        config.set("other-project:path", "./elsewhere").unwrap();
        assert_eq!(config.index_document, "home.html");
        assert_eq!(config.error_document, "404.html");
        assert_eq!(config.path, "./www");
    }

    #[test]
    fn test_set_pair_rejects_missing_equals() {
        let mut config = Config::default();
        assert!(matches!(
            config.set_pair("path"),
            Err(StackError::Config(_))
        ));
        config.set_pair("variant = locked-down").unwrap();
        assert_eq!(config.variant, Variant::LockedDown);
    }

    #[test]
    fn test_unknown_variant_rejected() {
        assert!("public".parse::<Variant>().is_err());
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "config:\n  aws:region: eu-west-1\n  static-website:path: ./public\n  static-website:variant: locked-down"
        )
        .unwrap();

        let config = Config::from_file(file.path(), DEFAULT_PROJECT, "prod").unwrap();
        assert_eq!(config.stack, "prod");
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.path, "./public");
        assert_eq!(config.variant, Variant::LockedDown);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"config": {{"static-website:notificationEmail": "ops@example.com"}}}}"#
        )
        .unwrap();

        let config = Config::from_file(file.path(), DEFAULT_PROJECT, DEFAULT_STACK).unwrap();
        assert_eq!(config.notification_email.as_deref(), Some("ops@example.com"));
    }
}
