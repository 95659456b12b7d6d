use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Scalar (or multi-valued) property read from a document node.
///
/// Keeps the original value type so the cleaned tree is a faithful copy of
/// the source minus excluded keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Array(Vec<PropertyValue>),
}

impl PropertyValue {
    /// Returns the string content if this is a text property.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Converts a non-object JSON value. Objects are children, not properties.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;

        let converted = match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Boolean(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(items) => Self::Array(items.iter().filter_map(Self::from_json).collect()),
            Value::Object(_) => return None,
        };
        Some(converted)
    }
}

impl From<&str> for PropertyValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

/// A value stored under a key of a [`ContentNode`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeEntry {
    Property(PropertyValue),
    Child(ContentNode),
}

/// One level of a cleaned document tree.
///
/// Keys keep the order they were inserted in: a node's own properties first,
/// then its non-empty children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentNode {
    entries: Vec<(String, NodeEntry)>,
}

impl ContentNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, replacing (in place) any existing entry with the same key.
    pub fn insert(&mut self, key: impl Into<String>, entry: NodeEntry) {
        let key = key.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = entry,
            None => self.entries.push((key, entry)),
        }
    }

    pub fn insert_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.insert(key, NodeEntry::Property(value.into()));
    }

    pub fn insert_child(&mut self, key: impl Into<String>, child: ContentNode) {
        self.insert(key, NodeEntry::Child(child));
    }

    pub fn get(&self, key: &str) -> Option<&NodeEntry> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, entry)| entry)
    }

    /// Returns the nested node stored under `key`, if that entry is a child.
    pub fn child(&self, key: &str) -> Option<&ContentNode> {
        match self.get(key) {
            Some(NodeEntry::Child(child)) => Some(child),
            _ => None,
        }
    }

    /// Returns the text property stored under `key`, if any.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(NodeEntry::Property(value)) => value.as_text(),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    /// Nesting depth of the tree; a node without children has depth 0.
    pub fn depth(&self) -> usize {
        self.entries
            .iter()
            .filter_map(|(_, entry)| match entry {
                NodeEntry::Child(child) => Some(child.depth() + 1),
                NodeEntry::Property(_) => None,
            })
            .max()
            .unwrap_or(0)
    }
}

impl Serialize for ContentNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}
