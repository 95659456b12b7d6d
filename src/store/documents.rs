use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;

use super::StoreError;
use super::DocumentStore;

/// Documents stored as JSON files under a root directory.
///
/// A reference such as `/content/site/en/electric-suv` resolves to
/// `{root}/content/site/en/electric-suv.json`.
#[derive(Debug, Clone)]
pub struct JsonDocumentStore {
    root: PathBuf,
}

impl JsonDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path for `reference`. References may not leave the root.
    pub fn path_for(&self, reference: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(reference.trim_start_matches('/'));

        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if reference.trim().is_empty() || escapes {
            return Err(StoreError::InvalidReference(reference.to_string()));
        }

        let mut path = self.root.join(relative);
        if path.extension().is_none_or(|ext| ext != "json") {
            path.as_mut_os_string().push(".json");
        }
        Ok(path)
    }
}

impl DocumentStore for JsonDocumentStore {
    fn fetch(&self, reference: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(reference)?;

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "document file not found");
                return Ok(None);
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| StoreError::Json { path, source })
    }
}

/// Last path segment of a reference, without a `.json` suffix.
pub fn document_name(reference: &str) -> &str {
    let name = reference
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(reference);
    name.strip_suffix(".json").unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with(reference: &str, contents: &str) -> (TempDir, JsonDocumentStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonDocumentStore::new(dir.path());
        let path = store.path_for(reference).unwrap();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
        (dir, store)
    }

    #[test]
    fn fetch_reads_document_by_reference() {
        let (_dir, store) = store_with("/content/site/en/suv", r#"{"jcr:title": "SUV"}"#);

        let doc = store.fetch("/content/site/en/suv").unwrap().unwrap();
        assert_eq!(doc["jcr:title"], "SUV");
    }

    #[test]
    fn missing_document_is_none() {
        let dir = TempDir::new().unwrap();
        let store = JsonDocumentStore::new(dir.path());

        assert!(store.fetch("/content/missing").unwrap().is_none());
    }

    #[test]
    fn invalid_json_is_an_error() {
        let (_dir, store) = store_with("broken", "{not json");
        assert!(matches!(store.fetch("broken"), Err(StoreError::Json { .. })));
    }

    #[test]
    fn references_cannot_escape_the_root() {
        let store = JsonDocumentStore::new("/srv/docs");

        assert!(matches!(
            store.path_for("/content/../../etc/passwd"),
            Err(StoreError::InvalidReference(_))
        ));
        assert!(store.path_for("").is_err());
        assert_eq!(
            store.path_for("/content/page.json").unwrap(),
            PathBuf::from("/srv/docs/content/page.json")
        );
    }

    #[test]
    fn document_name_is_last_segment() {
        assert_eq!(document_name("/content/site/en/electric-suv"), "electric-suv");
        assert_eq!(document_name("/content/site/en/electric-suv/"), "electric-suv");
        assert_eq!(document_name("page.json"), "page");
    }
}
