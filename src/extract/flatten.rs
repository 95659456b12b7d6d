use std::collections::HashSet;

use crate::models::{ContentNode, NodeEntry};

/// Collects every non-blank text value stored under one of `text_keys`.
///
/// Walks depth-first in the tree's own order, descending into every child
/// regardless of its key. Values are trimmed and joined with single spaces.
/// An empty result means there is nothing to classify.
///
/// # Examples
///
/// ```
/// use std::collections::HashSet;
/// use labelsmith::models::ContentNode;
/// use labelsmith::extract::flatten_text;
///
/// let mut node = ContentNode::new();
/// node.insert_property("title", "Hello");
/// let keys: HashSet<String> = ["title".to_string()].into();
///
/// assert_eq!(flatten_text(&node, &keys), "Hello");
/// ```
pub fn flatten_text(node: &ContentNode, text_keys: &HashSet<String>) -> String {
    let mut text = String::new();
    collect_text(node, text_keys, &mut text);
    text.trim().to_string()
}

fn collect_text(node: &ContentNode, text_keys: &HashSet<String>, text: &mut String) {
    for (key, entry) in node.iter() {
        match entry {
            NodeEntry::Property(value) => {
                if !text_keys.contains(key) {
                    continue;
                }
                let Some(value) = value.as_text().map(str::trim) else {
                    continue;
                };
                if !value.is_empty() {
                    text.push_str(value);
                    text.push(' ');
                }
            }
            NodeEntry::Child(child) => collect_text(child, text_keys, text),
        }
    }
}
