//! Label suggestion pipeline.
//!
//! Ties extraction, prompting, the model call and response resolution
//! together for one document at a time.

mod error;
mod suggester;

pub use error::{FailureKind, TaggingError};
pub(crate) use suggester::log_failure;
pub use suggester::{LabelSuggester, LabelSuggesterBuilder, PreparedDocument};
