use std::collections::HashMap;

use crate::gene::{GeneRecord, SourceIds};

/// Cached result for one identifier. `Ambiguous` holds every gene the
/// identifier matched.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntry {
    Single(GeneRecord),
    Ambiguous(Vec<GeneRecord>),
}

impl CacheEntry {
    pub fn records(&self) -> &[GeneRecord] {
        match self {
            CacheEntry::Single(record) => std::slice::from_ref(record),
            CacheEntry::Ambiguous(records) => records,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, CacheEntry::Ambiguous(_))
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    fn push(&mut self, record: GeneRecord) {
        match self {
            CacheEntry::Single(existing) => {
                let first = existing.clone();
                *self = CacheEntry::Ambiguous(vec![first, record]);
            }
            CacheEntry::Ambiguous(records) => records.push(record),
        }
    }

    /// Copy of the entry with every record attributed to `source_id`.
    pub fn relabeled(&self, source_id: &str) -> CacheEntry {
        let relabel = |record: &GeneRecord| {
            let mut record = record.clone();
            record.source_id = SourceIds::single(source_id);
            record
        };
        match self {
            CacheEntry::Single(record) => CacheEntry::Single(relabel(record)),
            CacheEntry::Ambiguous(records) => {
                CacheEntry::Ambiguous(records.iter().map(relabel).collect())
            }
        }
    }
}

/// Identifier-to-gene cache for one resolution session. Keys are single
/// identifier values, never fallback tuples. Not synchronized: concurrent
/// sessions each need their own instance.
#[derive(Debug, Clone, Default)]
pub struct QueryCache {
    entries: HashMap<String, CacheEntry>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Adds a hit under `key`; a second hit for the same key turns the entry
    /// ambiguous.
    pub fn add_hit(&mut self, key: &str, record: GeneRecord) {
        match self.entries.get_mut(key) {
            Some(entry) => entry.push(record),
            None => {
                self.entries
                    .insert(key.to_string(), CacheEntry::Single(record));
            }
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: CacheEntry) {
        self.entries.insert(key.into(), entry);
    }

    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CacheEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }
}
