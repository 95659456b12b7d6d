mod catalog;
mod content_node;
mod content_type;
mod label_id;
mod resolved_labels;

pub use catalog::{CategorizedCatalog, Category, LabelCatalog};
pub use content_node::{ContentNode, NodeEntry, PropertyValue};
pub use content_type::{ContentType, UnknownContentType};
pub use label_id::{LabelId, NAMESPACE_DELIMITER, OTHER_CATEGORY, looks_like_label_id};
pub use resolved_labels::ResolvedLabels;
