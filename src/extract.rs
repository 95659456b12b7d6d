//! Document tree extraction and text flattening.
//!
//! The extractor copies a host document tree into a [`ContentNode`](crate::models::ContentNode)
//! without metadata keys; the flattener then turns the clean tree into the plain
//! text that is sent for classification.

mod flatten;
mod header;
mod tree;

pub use flatten::flatten_text;
pub use header::DocumentHeader;
pub use tree::{DEFAULT_MAX_DEPTH, JsonResource, ResourceNode, extract_tree};
