//! Turns cached lookups into the gene-set result document.
//!
//! Reads the cache only. The same cache can be assembled repeatedly for
//! different identifier subsets, which is how importers build many gene sets
//! out of one bulk lookup.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::cache::QueryCache;
use crate::error::KiraError;
use crate::gene::GeneRecord;
use crate::identifier::{Identifier, uniform_width};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateEntry {
    pub id: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub ids: Vec<DuplicateEntry>,
    pub count: usize,
}

impl DuplicateReport {
    fn from_entries(ids: Vec<DuplicateEntry>) -> Self {
        let count = ids.len();
        Self { ids, count }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotFoundReport {
    pub ids: Vec<String>,
    pub count: usize,
}

impl NotFoundReport {
    fn from_ids(ids: Vec<String>) -> Self {
        let count = ids.len();
        Self { ids, count }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub genes: Vec<GeneRecord>,
    pub count: usize,
    #[serde(default, skip_serializing_if = "DuplicateReport::is_empty")]
    pub duplicates: DuplicateReport,
    #[serde(default, skip_serializing_if = "NotFoundReport::is_empty")]
    pub not_found: NotFoundReport,
}

impl ResolutionResult {
    pub fn mygene_ids(&self) -> Vec<&str> {
        self.genes.iter().map(|gene| gene.mygene_id.as_str()).collect()
    }
}

/// Builds the result for `ids` from `cache`.
///
/// Each identifier is matched by its first cached column and its genes are
/// attributed to its first column, as are identifiers with no cached column
/// at all. Records sharing a canonical id are merged, keeping source ids in
/// first-seen order.
pub fn assemble(cache: &QueryCache, ids: &[Identifier]) -> Result<ResolutionResult, KiraError> {
    uniform_width(ids)?;

    let mut genes = Vec::new();
    let mut duplicates = Vec::new();
    let mut not_found = Vec::new();

    for id in ids {
        let Some(primary) = id.primary() else {
            return Err(KiraError::InvalidIdentifiers(format!(
                "identifier '{id}' has no columns"
            )));
        };
        let hit = id
            .columns()
            .iter()
            .enumerate()
            .find_map(|(index, column)| cache.get(column).map(|entry| (index, column, entry)));
        match hit {
            Some((0, _, entry)) => {
                genes.extend(entry.records().iter().cloned());
                if entry.is_ambiguous() {
                    duplicates.push(DuplicateEntry {
                        id: primary.to_string(),
                        count: entry.len(),
                    });
                }
            }
            // fallback hits are credited to the primary identifier
            Some((_, column, entry)) => {
                genes.extend(entry.relabeled(primary).records().iter().cloned());
                if entry.is_ambiguous() {
                    duplicates.push(DuplicateEntry {
                        id: column.clone(),
                        count: entry.len(),
                    });
                }
            }
            None => not_found.push(primary.to_string()),
        }
    }

    let genes = merge_by_canonical_id(genes);
    Ok(ResolutionResult {
        count: genes.len(),
        genes,
        duplicates: DuplicateReport::from_entries(duplicates),
        not_found: NotFoundReport::from_ids(not_found),
    })
}

/// Collapses records with the same `mygene_id` into the first one seen,
/// unioning their source ids.
pub fn merge_by_canonical_id(genes: Vec<GeneRecord>) -> Vec<GeneRecord> {
    let mut unique: IndexMap<String, GeneRecord> = IndexMap::new();
    for gene in genes {
        match unique.get_mut(&gene.mygene_id) {
            Some(existing) => existing.source_id.merge(&gene.source_id),
            None => {
                unique.insert(gene.mygene_id.clone(), gene);
            }
        }
    }
    unique.into_values().collect()
}
