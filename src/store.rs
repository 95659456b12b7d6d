//! Host collaborators: where documents come from, where the label catalog
//! comes from, and where applied labels go.
//!
//! The pipeline only depends on the three traits; [`JsonDocumentStore`] and
//! [`LabelStore`] are the implementations used by the command-line tool.

mod documents;
mod error;
mod labels;
mod schema;

use serde_json::Value;

use crate::models::{LabelCatalog, LabelId};

pub use documents::{JsonDocumentStore, document_name};
pub use error::StoreError;
pub use labels::{LabelAssignment, LabelStore};

/// Source of hierarchical documents.
pub trait DocumentStore {
    /// Fetches the document at `reference`, or `None` if there is none.
    fn fetch(&self, reference: &str) -> Result<Option<Value>, StoreError>;
}

/// Source of the valid label catalog.
pub trait CatalogSource {
    /// Every label currently available, in the source's order.
    fn all_available_labels(&self) -> Result<LabelCatalog, StoreError>;
}

/// Destination for applied labels.
pub trait LabelSink {
    /// Applies `labels` to `document`, returning how many were applied.
    ///
    /// An empty list is a logged no-op.
    fn apply_labels(&self, document: &str, labels: &[LabelId]) -> Result<usize, StoreError>;
}

/// A fixed catalog snapshot.
impl CatalogSource for LabelCatalog {
    fn all_available_labels(&self) -> Result<LabelCatalog, StoreError> {
        Ok(self.clone())
    }
}
