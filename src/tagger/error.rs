use std::fmt;

use thiserror::Error;

use crate::llm::LlmError;

/// Coarse category of a tagging failure, for callers that only need to know
/// *why* nothing was tagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No document at the given reference.
    InputAbsent,
    /// The document has no text to classify.
    EmptyContent,
    /// The catalog offered no labels to choose from.
    EmptyCatalog,
    /// The model could not be reached or answered with an error status.
    TransportFailure,
    /// The model's answer could not be understood.
    MalformedResponse,
    /// The model answered, but none of its labels exist in the catalog.
    NoValidLabels,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InputAbsent => "input-absent",
            Self::EmptyContent => "empty-content",
            Self::EmptyCatalog => "empty-catalog",
            Self::TransportFailure => "transport-failure",
            Self::MalformedResponse => "malformed-response",
            Self::NoValidLabels => "no-valid-labels",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a document produced no labels.
///
/// None of these are fatal to the host; callers decide whether an empty
/// suggestion is itself an error.
#[derive(Debug, Error)]
pub enum TaggingError {
    #[error("Document not found: {0}")]
    InputAbsent(String),

    #[error("No text content extracted from document: {0}")]
    EmptyContent(String),

    #[error("No labels available in the catalog")]
    EmptyCatalog,

    #[error("Model call failed: {0}")]
    Transport(#[from] LlmError),

    #[error("Could not interpret model response: {0}")]
    MalformedResponse(String),

    #[error("Model returned no valid labels (response: {raw_response:?})")]
    NoValidLabels { raw_response: String },
}

impl TaggingError {
    /// The failure category.
    ///
    /// Transport errors that come from an undecodable or empty payload count
    /// as malformed responses rather than transport failures.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InputAbsent(_) => FailureKind::InputAbsent,
            Self::EmptyContent(_) => FailureKind::EmptyContent,
            Self::EmptyCatalog => FailureKind::EmptyCatalog,
            Self::Transport(LlmError::Serialization(_) | LlmError::Api { .. }) => {
                FailureKind::MalformedResponse
            }
            Self::Transport(_) => FailureKind::TransportFailure,
            Self::MalformedResponse(_) => FailureKind::MalformedResponse,
            Self::NoValidLabels { .. } => FailureKind::NoValidLabels,
        }
    }

    /// Human-readable detail for reports and logs.
    pub fn detail(&self) -> String {
        self.to_string()
    }
}
