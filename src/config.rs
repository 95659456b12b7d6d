//! Tagging rules: which keys to drop, which keys carry text, how deep to walk,
//! and the concept table used by the fallback mapper.
//!
//! Rules are injected into the pipeline rather than hard-coded, so each
//! deployment can ship its own JSON file. Missing fields fall back to the
//! built-in defaults.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extract::DEFAULT_MAX_DEPTH;
use crate::resolver::ConceptTable;

/// System and replication metadata that says nothing about a document's subject.
pub const DEFAULT_EXCLUDED_KEYS: [&str; 18] = [
    "jcr:created",
    "jcr:createdBy",
    "jcr:lastModified",
    "jcr:lastModifiedBy",
    "cq:lastModified",
    "cq:lastModifiedBy",
    "cq:lastReplicated",
    "cq:lastReplicatedBy",
    "cq:lastReplicationAction",
    "cq:lastRolledout",
    "cq:lastRolledoutBy",
    "jcr:uuid",
    "jcr:baseVersion",
    "jcr:predecessors",
    "jcr:versionHistory",
    "jcr:isCheckedOut",
    "cq:lastPublished",
    "cq:lastPublishedBy",
];

/// Keys whose string values are human-readable text.
pub const DEFAULT_TEXT_KEYS: [&str; 13] = [
    "text",
    "jcr:title",
    "title",
    "jcr:description",
    "description",
    "alt",
    "heading",
    "subtitle",
    "caption",
    "label",
    "value",
    "content",
    "name",
];

/// Child that holds page-level properties in the default document layout.
pub const DEFAULT_CONTENT_CHILD: &str = "jcr:content";

/// Concept → label table used when the model answers with free-form concepts.
pub const DEFAULT_CONCEPT_TABLE: [(&str, &str); 19] = [
    ("article", "myaemproject:content-type/article"),
    ("product-launch", "myaemproject:content-type/product-launch"),
    ("blog-post", "myaemproject:content-type/blog-post"),
    ("tutorial", "myaemproject:content-type/tutorial"),
    ("automotive", "myaemproject:topic/automotive"),
    ("electric-vehicles", "myaemproject:topic/automotive/electric-vehicles"),
    ("suv", "myaemproject:topic/automotive/suv"),
    ("sustainability", "myaemproject:topic/sustainability"),
    ("clean-energy", "myaemproject:topic/sustainability/clean-energy"),
    ("eco-friendly", "myaemproject:topic/sustainability/eco-friendly"),
    ("families", "myaemproject:audience/families"),
    ("tech-enthusiasts", "myaemproject:audience/tech-enthusiasts"),
    ("professionals", "myaemproject:audience/professionals"),
    ("autopilot", "myaemproject:feature/autopilot"),
    ("long-range", "myaemproject:feature/long-range-battery"),
    ("fast-charging", "myaemproject:feature/fast-charging"),
    ("education", "myaemproject:intent/education"),
    ("conversion", "myaemproject:intent/conversion"),
    ("awareness", "myaemproject:intent/brand-awareness"),
];

/// Errors raised while loading tagging rules.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine the user configuration directory")]
    NoConfigDir,
}

/// Rules applied while extracting and resolving a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct TaggingConfig {
    /// Property keys dropped from the document tree.
    pub excluded_keys: HashSet<String>,
    /// Property keys whose text is sent for classification.
    pub text_keys: HashSet<String>,
    /// Deepest level (root = 0) the extractor visits.
    pub max_depth: usize,
    pub concept_table: ConceptTable,
    /// Child consulted for the document title and description.
    pub content_child: Option<String>,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            excluded_keys: DEFAULT_EXCLUDED_KEYS.iter().map(|k| k.to_string()).collect(),
            text_keys: DEFAULT_TEXT_KEYS.iter().map(|k| k.to_string()).collect(),
            max_depth: DEFAULT_MAX_DEPTH,
            concept_table: DEFAULT_CONCEPT_TABLE.into_iter().collect(),
            content_child: Some(DEFAULT_CONTENT_CHILD.to_string()),
        }
    }
}

impl TaggingConfig {
    /// Loads rules from a JSON file. Fields absent from the file keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if given, else the user config file if it exists, else defaults.
    pub fn from_file_or_default(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.or_else(|| Self::default_config_path().ok().filter(|p| p.exists()));

        match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading tagging config");
                Self::load(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// `{config_dir}/labelsmith/config.json`.
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("labelsmith").join("config.json"))
    }

    /// Checks that the rules can produce any text at all.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.text_keys.is_empty() {
            return Err(ConfigError::Invalid("textKeys must not be empty".to_string()));
        }
        if let Some(key) = self.text_keys.intersection(&self.excluded_keys).next() {
            return Err(ConfigError::Invalid(format!(
                "key {key} is both a text key and an excluded key"
            )));
        }
        Ok(())
    }

    /// Renders the rules as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
