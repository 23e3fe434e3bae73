//! Multi-field free-text search request.

use std::collections::{BTreeMap, BTreeSet};

/// Search terms and the fields (per entity) they are matched against.
///
/// The generated clause is the disjunction of every (field, term) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFields {
    terms: Vec<String>,
    fields: BTreeMap<String, BTreeSet<String>>,
}

impl SearchFields {
    /// Create a search over `terms` with no fields yet.
    pub fn new<T: Into<String>>(terms: impl IntoIterator<Item = T>) -> Self {
        Self {
            terms: terms.into_iter().map(Into::into).collect(),
            fields: BTreeMap::new(),
        }
    }

    /// Split a user-typed string on whitespace into terms.
    pub fn from_text(text: &str) -> Self {
        Self::new(text.split_whitespace())
    }

    /// Add searchable fields of one entity.
    pub fn with_fields<F: Into<String>>(
        mut self,
        entity: impl Into<String>,
        fields: impl IntoIterator<Item = F>,
    ) -> Self {
        self.fields
            .entry(entity.into())
            .or_default()
            .extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Fields keyed by entity name.
    pub fn fields(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.fields
    }

    /// No terms or no fields: nothing to search.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() || self.fields.values().all(BTreeSet::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_text_splits_terms() {
        let s = SearchFields::from_text("  hello   world ");
        assert_eq!(s.terms(), &["hello".to_string(), "world".to_string()]);
    }

    #[test]
    fn fields_merge_per_entity() {
        let s = SearchFields::new(["x"])
            .with_fields("SUser", ["userName"])
            .with_fields("SUser", ["firstName", "userName"]);
        assert_eq!(s.fields()["SUser"].len(), 2);
    }

    #[test]
    fn empty_without_terms_or_fields() {
        assert!(SearchFields::new(["x"]).is_empty());
        assert!(SearchFields::new(Vec::<String>::new()).with_fields("SUser", ["a"]).is_empty());
        assert!(!SearchFields::new(["x"]).with_fields("SUser", ["a"]).is_empty());
    }
}
