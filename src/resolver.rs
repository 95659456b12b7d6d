//! Turning raw model answers into label IDs.
//!
//! [`resolve_labels`] validates catalog-constrained answers; the
//! [`ConceptMapper`] handles the older free-text concept answers.

mod concepts;
mod labels;

pub use concepts::{ConceptMapper, ConceptTable};
pub use labels::{parse_concepts, parse_content_type, resolve_labels};
