use serde::Serialize;

use super::LabelId;

/// Ordered, duplicate-free list of label IDs produced by one request.
///
/// Order is first occurrence in the model response (or concept list).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedLabels(Vec<LabelId>);

impl ResolvedLabels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `id` unless it is already present. Returns whether it was added.
    pub fn push(&mut self, id: LabelId) -> bool {
        if self.0.contains(&id) {
            return false;
        }
        self.0.push(id);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|existing| existing.as_str() == id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[LabelId] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabelId> {
        self.0.iter()
    }

    /// Keeps only the labels for which `keep` returns `true`.
    pub fn retain(&mut self, keep: impl FnMut(&LabelId) -> bool) {
        self.0.retain(keep);
    }

    pub fn into_vec(self) -> Vec<LabelId> {
        self.0
    }

    /// Label IDs as plain strings, e.g. for logging or CLI output.
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|id| id.as_str().to_string()).collect()
    }
}

impl FromIterator<LabelId> for ResolvedLabels {
    fn from_iter<I: IntoIterator<Item = LabelId>>(iter: I) -> Self {
        let mut labels = Self::new();
        for id in iter {
            labels.push(id);
        }
        labels
    }
}

impl IntoIterator for ResolvedLabels {
    type Item = LabelId;
    type IntoIter = std::vec::IntoIter<LabelId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResolvedLabels {
    type Item = &'a LabelId;
    type IntoIter = std::slice::Iter<'a, LabelId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_ignores_duplicates_and_keeps_first_occurrence() {
        let labels: ResolvedLabels = ["a:x", "b:y", "a:x", "c:z", "b:y"]
            .into_iter()
            .map(LabelId::from)
            .collect();

        assert_eq!(labels.to_strings(), vec!["a:x", "b:y", "c:z"]);
    }

    #[test]
    fn serializes_as_plain_array() {
        let labels: ResolvedLabels = ["a:x", "b:y"].into_iter().map(LabelId::from).collect();
        assert_eq!(serde_json::to_string(&labels).unwrap(), r#"["a:x","b:y"]"#);
    }
}
