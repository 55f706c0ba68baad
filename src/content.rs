//! Local content directory scanning for folder sync.

use crate::types::StackError;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFile {
    /// Object key, relative to the folder root with `/` separators
    pub key: String,
    pub size: u64,
    pub sha256: String,
    pub content_type: String,
}

/// Files found under a content directory, sorted by key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentManifest {
    pub files: Vec<ContentFile>,
}

impl ContentManifest {
    pub fn scan<P: AsRef<Path>>(root: P) -> Result<Self, StackError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(StackError::Config(format!(
                "content path '{}' is not a directory",
                root.display()
            )));
        }

        let mut files = Vec::new();
        scan_dir(root, "", &mut files)?;
        files.sort_by(|a, b| a.key.cmp(&b.key));

        tracing::debug!("Scanned {} files under {}", files.len(), root.display());
        Ok(Self { files })
    }

    pub fn get(&self, key: &str) -> Option<&ContentFile> {
        self.files.iter().find(|f| f.key == key)
    }

    /// Digest over every key and file digest; changes whenever content does
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for file in &self.files {
            hasher.update(file.key.as_bytes());
            hasher.update([0]);
            hasher.update(file.sha256.as_bytes());
            hasher.update([b'\n']);
        }
        hex::encode(hasher.finalize())
    }
}

fn scan_dir(dir: &Path, prefix: &str, files: &mut Vec<ContentFile>) -> Result<(), StackError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let key = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };

        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            scan_dir(&entry.path(), &key, files)?;
        } else if file_type.is_file() {
            let data = fs::read(entry.path())?;
            files.push(ContentFile {
                content_type: content_type_for(&key).to_string(),
                size: data.len() as u64,
                sha256: hex::encode(Sha256::digest(&data)),
                key,
            });
        }
    }
    Ok(())
}

pub fn content_type_for(key: &str) -> &'static str {
    let extension = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "json" => "application/json",
        "txt" => "text/plain",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "pdf" => "application/pdf",
        _ => "binary/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>hi</h1>").unwrap();
        fs::create_dir(dir.path().join("css")).unwrap();
        fs::write(dir.path().join("css").join("site.css"), "body {}").unwrap();

        let manifest = ContentManifest::scan(dir.path()).unwrap();
        let keys: Vec<&str> = manifest.files.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["css/site.css", "index.html"]);

        let index = manifest.get("index.html").unwrap();
        assert_eq!(index.size, 11);
        assert_eq!(index.content_type, "text/html");
        assert_eq!(index.sha256.len(), 64);
    }

    #[test]
    fn test_digest_tracks_content() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "v1").unwrap();
        let before = ContentManifest::scan(dir.path()).unwrap().digest();

        fs::write(dir.path().join("index.html"), "v2").unwrap();
        let after = ContentManifest::scan(dir.path()).unwrap().digest();
        assert_ne!(before, after);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ContentManifest::scan(dir.path().join("absent")).is_err());
    }

    #[test]
    fn test_content_type_fallback() {
        assert_eq!(content_type_for("logo.PNG"), "image/png");
        assert_eq!(content_type_for("LICENSE"), "binary/octet-stream");
    }
}
