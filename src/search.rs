use crate::data::CatalogEntry;

/// A free-text filter over catalog entries.
///
/// The source-language name matches case-insensitively; the localized name
/// matches as an exact substring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    raw: String,
    folded: String,
}

impl Query {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let folded = raw.to_uppercase();
        Self { raw, folded }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// An empty query is inactive and matches everything.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        self.is_empty()
            || entry.name.to_uppercase().contains(&self.folded)
            || entry.localized_name.contains(&self.raw)
    }

    /// Indices of the entries that satisfy the query, in input order.
    pub fn select(&self, entries: &[CatalogEntry]) -> Vec<usize> {
        entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| self.matches(entry))
            .map(|(idx, _)| idx)
            .collect()
    }
}
