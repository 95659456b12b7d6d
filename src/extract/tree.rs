//! Tree extraction: copies a document tree while dropping metadata keys.

use std::collections::HashSet;

use serde_json::Value;

use crate::models::{ContentNode, PropertyValue};

/// Default bound on how deep the extractor descends below the root.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Read-only view of one node of a host document tree.
///
/// Implementations expose a node's own properties and its ordered, named
/// children. The extractor never needs anything else from the host store.
pub trait ResourceNode: Sized {
    /// Name of this node under its parent.
    fn name(&self) -> &str;

    /// The node's own properties, in store order.
    fn properties(&self) -> Vec<(String, PropertyValue)>;

    /// The node's children, in store order.
    fn children(&self) -> Vec<Self>;
}

/// [`ResourceNode`] over a parsed JSON document.
///
/// Object members become children; every other member is a property.
#[derive(Debug, Clone, Copy)]
pub struct JsonResource<'a> {
    name: &'a str,
    value: &'a Value,
}

impl<'a> JsonResource<'a> {
    pub fn new(name: &'a str, value: &'a Value) -> Self {
        Self { name, value }
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }
}

impl ResourceNode for JsonResource<'_> {
    fn name(&self) -> &str {
        self.name
    }

    fn properties(&self) -> Vec<(String, PropertyValue)> {
        let Some(object) = self.value.as_object() else {
            return Vec::new();
        };

        object
            .iter()
            .filter_map(|(key, value)| PropertyValue::from_json(value).map(|v| (key.clone(), v)))
            .collect()
    }

    fn children(&self) -> Vec<Self> {
        let Some(object) = self.value.as_object() else {
            return Vec::new();
        };

        object
            .iter()
            .filter(|(_, value)| value.is_object())
            .map(|(key, value)| JsonResource::new(key, value))
            .collect()
    }
}

/// Builds a clean copy of `node` without any key in `excluded_keys`.
///
/// Children whose cleaned copy is empty are left out entirely, and nothing
/// deeper than `max_depth` levels below the root is visited. A missing node
/// yields an empty tree.
///
/// # Examples
///
/// ```
/// use std::collections::HashSet;
/// use labelsmith::extract::{JsonResource, extract_tree};
///
/// let doc = serde_json::json!({
///     "jcr:uuid": "1234",
///     "jcr:title": "Electric SUVs",
///     "meta": {"jcr:created": "2024-01-01"}
/// });
/// let excluded: HashSet<String> = ["jcr:uuid", "jcr:created"].map(String::from).into();
///
/// let tree = extract_tree(Some(&JsonResource::new("page", &doc)), &excluded, 10);
/// assert_eq!(tree.text("jcr:title"), Some("Electric SUVs"));
/// assert!(!tree.contains_key("jcr:uuid"));
/// assert!(!tree.contains_key("meta"));
/// ```
pub fn extract_tree<N: ResourceNode>(
    node: Option<&N>,
    excluded_keys: &HashSet<String>,
    max_depth: usize,
) -> ContentNode {
    match node {
        Some(node) => walk(node, excluded_keys, max_depth, 0),
        None => ContentNode::new(),
    }
}

fn walk<N: ResourceNode>(
    node: &N,
    excluded_keys: &HashSet<String>,
    max_depth: usize,
    depth: usize,
) -> ContentNode {
    let mut clean = ContentNode::new();

    if depth > max_depth {
        tracing::debug!(node = node.name(), depth, "depth bound reached, skipping subtree");
        return clean;
    }

    for (key, value) in node.properties() {
        if !excluded_keys.contains(&key) {
            clean.insert_property(key, value);
        }
    }

    for child in node.children() {
        if excluded_keys.contains(child.name()) {
            continue;
        }
        let child_node = walk(&child, excluded_keys, max_depth, depth + 1);
        if !child_node.is_empty() {
            clean.insert_child(child.name(), child_node);
        }
    }

    clean
}
