pub mod config;
pub mod extract;
pub mod llm;
pub mod models;
pub mod prompt;
pub mod resolver;
pub mod service;
pub mod store;
pub mod tagger;

pub use config::{ConfigError, TaggingConfig};
pub use models::{ContentNode, LabelCatalog, LabelId, ResolvedLabels};
pub use service::{ServiceError, SuggestionMode, TaggingReport, TaggingService};
pub use store::{JsonDocumentStore, LabelStore};
pub use tagger::{FailureKind, LabelSuggester, LabelSuggesterBuilder, TaggingError};
