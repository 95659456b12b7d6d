use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::{LabelId, ResolvedLabels, looks_like_label_id};

/// Ordered concept → label-ID table used by [`ConceptMapper`].
///
/// Order matters: fuzzy matching accepts the first entry that matches.
/// Keys are stored lower-cased and trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConceptTable {
    entries: Vec<(String, LabelId)>,
}

impl ConceptTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mapping. A concept that is already present keeps its position
    /// and takes the new label.
    pub fn insert(&mut self, concept: &str, label: impl Into<LabelId>) {
        let concept = normalize_concept(concept);
        let label = label.into();

        match self.entries.iter_mut().find(|(existing, _)| *existing == concept) {
            Some((_, slot)) => *slot = label,
            None => self.entries.push((concept, label)),
        }
    }

    pub fn get(&self, concept: &str) -> Option<&LabelId> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == concept)
            .map(|(_, label)| label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LabelId)> {
        self.entries.iter().map(|(concept, label)| (concept.as_str(), label))
    }
}

impl<C: AsRef<str>, L: Into<LabelId>> FromIterator<(C, L)> for ConceptTable {
    fn from_iter<I: IntoIterator<Item = (C, L)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (concept, label) in iter {
            table.insert(concept.as_ref(), label);
        }
        table
    }
}

impl Serialize for ConceptTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (concept, label) in &self.entries {
            map.serialize_entry(concept, label)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ConceptTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = ConceptTable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of concepts to label IDs")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut table = ConceptTable::new();
                while let Some((concept, label)) = access.next_entry::<String, String>()? {
                    table.insert(&concept, label);
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}

/// Resolves free-form concepts to label IDs through a [`ConceptTable`].
///
/// For each concept, in order:
///
/// 1. Anything that already looks like a label ID passes through as-is
/// 2. An exact (case-insensitive) table key wins
/// 3. Otherwise the first table entry whose key contains the concept, or is
///    contained in it, is taken
///
/// Unmatched concepts are logged and dropped.
///
/// # Examples
///
/// ```
/// use labelsmith::resolver::{ConceptMapper, ConceptTable};
///
/// let table: ConceptTable = [("automotive", "ns:topic/automotive")].into_iter().collect();
/// let mapper = ConceptMapper::new(table);
///
/// assert_eq!(mapper.map_concepts(&["Automotive"]).to_strings(), vec!["ns:topic/automotive"]);
/// assert_eq!(mapper.map_concepts(&["automotive-news"]).to_strings(), vec!["ns:topic/automotive"]);
/// assert!(mapper.map_concepts(&["gardening"]).is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConceptMapper {
    table: ConceptTable,
}

impl ConceptMapper {
    pub fn new(table: ConceptTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ConceptTable {
        &self.table
    }

    /// Maps every concept, de-duplicating while keeping first-occurrence order.
    pub fn map_concepts<S: AsRef<str>>(&self, concepts: &[S]) -> ResolvedLabels {
        concepts
            .iter()
            .filter_map(|concept| self.map_concept(concept.as_ref()))
            .collect()
    }

    /// Maps a single concept, or returns `None` if nothing matches.
    pub fn map_concept(&self, concept: &str) -> Option<LabelId> {
        let normalized = normalize_concept(concept);

        if normalized.is_empty() {
            return None;
        }

        if looks_like_label_id(&normalized) {
            return Some(LabelId::new(concept.trim()));
        }

        if let Some(label) = self.table.get(&normalized) {
            return Some(label.clone());
        }

        let fuzzy = self
            .table
            .iter()
            .find(|(key, _)| normalized.contains(key) || key.contains(normalized.as_str()))
            .map(|(_, label)| label.clone());

        if fuzzy.is_none() {
            tracing::debug!(concept, "could not map concept to a label");
        }

        fuzzy
    }
}

fn normalize_concept(concept: &str) -> String {
    concept.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ConceptTable {
        [
            ("electric-vehicles", "ns:topic/automotive/electric-vehicles"),
            ("automotive", "ns:topic/automotive"),
            ("suv", "ns:topic/automotive/suv"),
            ("families", "ns:audience/families"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn exact_match_is_case_insensitive_and_trimmed() {
        let mapper = ConceptMapper::new(table());
        assert_eq!(
            mapper.map_concepts(&["  AUTOMOTIVE "]).to_strings(),
            vec!["ns:topic/automotive"]
        );
    }

    #[test]
    fn concept_containing_a_key_matches_fuzzily() {
        let mapper = ConceptMapper::new(table());
        assert_eq!(
            mapper.map_concepts(&["automotive-news"]).to_strings(),
            vec!["ns:topic/automotive"]
        );
    }

    #[test]
    fn key_containing_the_concept_matches_fuzzily() {
        let mapper = ConceptMapper::new(table());
        assert_eq!(
            mapper.map_concepts(&["electric"]).to_strings(),
            vec!["ns:topic/automotive/electric-vehicles"]
        );
    }

    #[test]
    fn fuzzy_match_takes_first_table_entry_not_best() {
        // "suv" is a closer match, but "automotive" comes first in the table.
        let mapper = ConceptMapper::new(table());
        assert_eq!(
            mapper.map_concepts(&["automotive suv reviews"]).to_strings(),
            vec!["ns:topic/automotive"]
        );
    }

    #[test]
    fn exact_match_beats_earlier_fuzzy_candidate() {
        let table: ConceptTable = [("suv-family", "ns:a/first"), ("suv", "ns:a/second")]
            .into_iter()
            .collect();
        let mapper = ConceptMapper::new(table);
        assert_eq!(mapper.map_concepts(&["suv"]).to_strings(), vec!["ns:a/second"]);
    }

    #[test]
    fn label_like_concepts_pass_through_unchanged() {
        let mapper = ConceptMapper::new(table());
        assert_eq!(
            mapper.map_concepts(&[" ns:Custom/Label "]).to_strings(),
            vec!["ns:Custom/Label"]
        );
    }

    #[test]
    fn unmatched_and_blank_concepts_are_dropped() {
        let mapper = ConceptMapper::new(table());
        let labels = mapper.map_concepts(&["gardening", "", "   ", "suv"]);
        assert_eq!(labels.to_strings(), vec!["ns:topic/automotive/suv"]);
    }

    #[test]
    fn results_are_deduplicated_in_first_occurrence_order() {
        let mapper = ConceptMapper::new(table());
        let labels = mapper.map_concepts(&["suv", "automotive", "SUV", "automotive-news"]);
        assert_eq!(
            labels.to_strings(),
            vec!["ns:topic/automotive/suv", "ns:topic/automotive"]
        );
    }

    #[test]
    fn table_deserializes_in_document_order_with_normalized_keys() {
        let json = r#"{"Zeta": "ns:z/z", "alpha": "ns:a/a"}"#;
        let table: ConceptTable = serde_json::from_str(json).unwrap();

        let keys: Vec<&str> = table.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }
}
