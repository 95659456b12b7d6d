use std::fmt::Write;

use crate::models::ContentNode;

const TITLE_KEYS: [&str; 2] = ["jcr:title", "title"];
const DESCRIPTION_KEYS: [&str; 2] = ["jcr:description", "description"];

/// Title, name and description of a document, shown ahead of its flattened text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentHeader {
    pub title: Option<String>,
    pub name: String,
    pub description: Option<String>,
}

impl DocumentHeader {
    /// Reads the header from a cleaned tree.
    ///
    /// Looks at the root first, then at `content_child` (e.g. `jcr:content`),
    /// where page-level properties usually live.
    pub fn from_tree(name: impl Into<String>, tree: &ContentNode, content_child: Option<&str>) -> Self {
        let content = content_child.and_then(|key| tree.child(key));
        let lookup = |keys: &[&str]| {
            first_text(tree, keys).or_else(|| content.and_then(|node| first_text(node, keys)))
        };

        Self {
            title: lookup(&TITLE_KEYS),
            name: name.into(),
            description: lookup(&DESCRIPTION_KEYS),
        }
    }

    /// Renders the header followed by the document's flattened text.
    ///
    /// ```
    /// use labelsmith::extract::DocumentHeader;
    ///
    /// let header = DocumentHeader {
    ///     title: Some("Electric SUVs".to_string()),
    ///     name: "electric-suvs".to_string(),
    ///     description: None,
    /// };
    /// assert_eq!(
    ///     header.compose("Range and charging"),
    ///     "Page Title: Electric SUVs\nPage Name: electric-suvs\n\nPage Content:\nRange and charging"
    /// );
    /// ```
    pub fn compose(&self, text: &str) -> String {
        let mut content = String::new();
        let _ = writeln!(content, "Page Title: {}", self.title.as_deref().unwrap_or_default());
        let _ = writeln!(content, "Page Name: {}", self.name);
        if let Some(description) = self.description.as_deref().filter(|d| !d.is_empty()) {
            let _ = writeln!(content, "Description: {description}");
        }
        let _ = write!(content, "\nPage Content:\n{text}");
        content
    }
}

fn first_text(node: &ContentNode, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| node.text(key))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(String::from)
}
