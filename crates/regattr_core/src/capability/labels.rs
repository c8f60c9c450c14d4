//! Label lookup implementations.

use super::LabelLookup;
use indexmap::IndexMap;

/// Returns the caller's fallback unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct HumanizedLabels;

impl LabelLookup for HumanizedLabels {
    fn human_attribute_name(&self, _model: &str, _attribute: &str, fallback: &str) -> String {
        fallback.to_string()
    }
}

/// Translation table keyed by `"<Model>.<attribute>"` or bare `"<attribute>"`.
///
/// Model-scoped entries win over bare ones; misses use the fallback.
#[derive(Debug, Clone, Default)]
pub struct LabelCatalog {
    entries: IndexMap<String, String>,
}

impl LabelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.insert(key, label);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, label: impl Into<String>) {
        self.entries.insert(key.into(), label.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LabelLookup for LabelCatalog {
    fn human_attribute_name(&self, model: &str, attribute: &str, fallback: &str) -> String {
        self.entries
            .get(format!("{model}.{attribute}").as_str())
            .or_else(|| self.entries.get(attribute))
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{HumanizedLabels, LabelCatalog};
    use crate::capability::LabelLookup;

    #[test]
    fn humanized_labels_return_fallback() {
        assert_eq!(
            HumanizedLabels.human_attribute_name("Work", "title", "Title"),
            "Title"
        );
    }

    #[test]
    fn catalog_prefers_model_scoped_entries() {
        let catalog = LabelCatalog::new()
            .with("title", "Name")
            .with("Work.title", "Work name");

        assert_eq!(catalog.human_attribute_name("Work", "title", "Title"), "Work name");
        assert_eq!(catalog.human_attribute_name("Image", "title", "Title"), "Name");
        assert_eq!(
            catalog.human_attribute_name("Image", "creator", "Creator"),
            "Creator"
        );
        assert_eq!(catalog.len(), 2);
    }
}
