use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Separator between a label's namespace and its path (`ns:category/value`).
pub const NAMESPACE_DELIMITER: char = ':';

/// Category assigned to labels that carry no namespace.
pub const OTHER_CATEGORY: &str = "other";

/// Namespace-qualified label identifier, e.g. `myaemproject:topic/automotive`.
///
/// Wraps the raw identifier string so label IDs are not mixed up with titles
/// or free-form concepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelId(String);

impl LabelId {
    /// Creates a new label ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the ID and returns the underlying string.
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns the namespace portion before the delimiter, if any.
    ///
    /// ```
    /// use labelsmith::models::LabelId;
    ///
    /// assert_eq!(LabelId::new("ns:topic/x").namespace(), Some("ns"));
    /// assert_eq!(LabelId::new("plain").namespace(), None);
    /// ```
    pub fn namespace(&self) -> Option<&str> {
        self.0
            .split_once(NAMESPACE_DELIMITER)
            .map(|(namespace, _)| namespace)
    }

    /// Returns the category: the first path segment after the namespace.
    ///
    /// Labels without a namespace fall into [`OTHER_CATEGORY`]. When the path
    /// has no `/` (or starts with one), the whole remainder is the category.
    ///
    /// ```
    /// use labelsmith::models::LabelId;
    ///
    /// assert_eq!(LabelId::new("ns:content-type/article").category(), "content-type");
    /// assert_eq!(LabelId::new("ns:topic").category(), "topic");
    /// assert_eq!(LabelId::new("untagged").category(), "other");
    /// ```
    pub fn category(&self) -> &str {
        let Some((_, path)) = self.0.split_once(NAMESPACE_DELIMITER) else {
            return OTHER_CATEGORY;
        };

        match path.find('/') {
            Some(slash) if slash > 0 => &path[..slash],
            _ => path,
        }
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for LabelId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LabelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for LabelId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Returns `true` when the string already has the shape of a label ID.
pub fn looks_like_label_id(candidate: &str) -> bool {
    candidate.contains(NAMESPACE_DELIMITER)
}
