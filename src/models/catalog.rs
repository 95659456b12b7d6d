use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::LabelId;

/// The full set of valid labels for one request: label ID → display title.
///
/// Iteration follows insertion order, which is the order the catalog source
/// produced. Prompt rendering depends on that order being stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelCatalog {
    entries: Vec<(LabelId, String)>,
    index: HashMap<LabelId, usize>,
}

impl LabelCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a label, returning `false` if the ID was already present.
    ///
    /// Re-inserting an existing ID updates its title but keeps its position.
    pub fn insert(&mut self, id: impl Into<LabelId>, title: impl Into<String>) -> bool {
        let id = id.into();
        let title = title.into();

        if let Some(&position) = self.index.get(&id) {
            self.entries[position].1 = title;
            return false;
        }

        self.index.insert(id.clone(), self.entries.len());
        self.entries.push((id, title));
        true
    }

    /// Returns `true` if `id` is an exact key of the catalog.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Returns the display title for `id`.
    pub fn title(&self, id: &str) -> Option<&str> {
        self.index
            .get(id)
            .map(|&position| self.entries[position].1.as_str())
    }

    /// Returns the catalog's own `LabelId` for `id`, if present.
    pub fn get_id(&self, id: &str) -> Option<&LabelId> {
        self.index
            .get(id)
            .map(|&position| &self.entries[position].0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(id, title)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&LabelId, &str)> {
        self.entries.iter().map(|(id, title)| (id, title.as_str()))
    }

    /// Iterates label IDs in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &LabelId> {
        self.entries.iter().map(|(id, _)| id)
    }
}

impl<I, T> FromIterator<(I, T)> for LabelCatalog
where
    I: Into<LabelId>,
    T: Into<String>,
{
    fn from_iter<It: IntoIterator<Item = (I, T)>>(iter: It) -> Self {
        let mut catalog = Self::new();
        for (id, title) in iter {
            catalog.insert(id, title);
        }
        catalog
    }
}

impl Serialize for LabelCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, title) in &self.entries {
            map.serialize_entry(id.as_str(), title)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for LabelCatalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CatalogVisitor;

        impl<'de> Visitor<'de> for CatalogVisitor {
            type Value = LabelCatalog;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of label IDs to display titles")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut catalog = LabelCatalog::new();
                while let Some((id, title)) = access.next_entry::<String, String>()? {
                    catalog.insert(id, title);
                }
                Ok(catalog)
            }
        }

        deserializer.deserialize_map(CatalogVisitor)
    }
}

/// One category of a [`CategorizedCatalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub labels: Vec<(LabelId, String)>,
}

impl Category {
    /// Heading used when rendering the category in a prompt (`content-type` → `CONTENT TYPE`).
    pub fn heading(&self) -> String {
        self.name.to_uppercase().replace('-', " ")
    }
}

/// Labels grouped by category, categories in first-seen order.
///
/// Derived from a [`LabelCatalog`] for a single request and never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizedCatalog {
    categories: Vec<Category>,
}

impl CategorizedCatalog {
    pub(crate) fn from_categories(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Returns the category with the given name.
    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.name == name)
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Total number of labels across all categories.
    pub fn label_count(&self) -> usize {
        self.categories.iter().map(|c| c.labels.len()).sum()
    }
}
