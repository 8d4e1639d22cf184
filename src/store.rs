use crate::data::{CatalogEntry, EntryId};
use crate::search::Query;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Added,
    Duplicate,
}

/// Append-only canonical set of entries plus the filtered view derived from
/// the active query.
///
/// All mutation goes through `&mut self`, so whoever owns the store is its
/// single writer and the membership check and append cannot interleave with
/// another insert.
#[derive(Debug, Default)]
pub struct CatalogStore {
    entries: Vec<CatalogEntry>,
    index: HashMap<EntryId, usize>,
    filtered: Vec<usize>,
    query: Query,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// First writer wins: an entry whose id is already present is dropped.
    pub fn insert(&mut self, entry: CatalogEntry) -> InsertOutcome {
        let idx = self.entries.len();
        match self.index.entry(entry.id) {
            Entry::Occupied(_) => return InsertOutcome::Duplicate,
            Entry::Vacant(slot) => {
                slot.insert(idx);
            }
        }
        self.entries.push(entry);
        if self.query.is_empty() {
            self.filtered.push(idx);
        }
        InsertOutcome::Added
    }

    /// Replaces the active query and recomputes the filtered view from the
    /// whole canonical set.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = Query::new(query);
        self.filtered = if self.query.is_empty() {
            (0..self.entries.len()).collect()
        } else {
            self.query.select(&self.entries)
        };
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// The filtered view ordered by id.
    pub fn view(&self) -> Vec<&CatalogEntry> {
        let mut rows: Vec<&CatalogEntry> =
            self.filtered.iter().map(|&idx| &self.entries[idx]).collect();
        rows.sort_by_key(|entry| entry.id);
        rows
    }

    pub fn view_len(&self) -> usize {
        self.filtered.len()
    }

    /// Canonical entries in insertion order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: EntryId) -> Option<&CatalogEntry> {
        self.index.get(&id).map(|&idx| &self.entries[idx])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
