//! Helpers for user gene sets created or updated through the API.

use indexmap::IndexMap;
use rand::Rng;

use crate::cache::QueryCache;
use crate::error::KiraError;
use crate::gene::{FieldSet, GeneRecord, OneOrMany, TAXID_FIELD};
use crate::homology::CANONICAL_ID_SCOPE;
use crate::identifier::{Identifier, Scopes};
use crate::lookup::resolve_into;
use crate::mygene::GeneProvider;
use crate::species::Species;

const GENESET_ID_PREFIX: &str = "mygst:";
const GENESET_ID_LEN: usize = 6;
const BASE62: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Resolves canonical gene ids across all species. Records come back in
/// input order; ids the provider does not know are left out.
pub fn fetch_by_canonical_ids<P: GeneProvider + ?Sized>(
    provider: &P,
    ids: &[String],
) -> Result<Vec<GeneRecord>, KiraError> {
    let identifiers = ids
        .iter()
        .map(|id| Identifier::simple(id.as_str()))
        .collect::<Vec<_>>();
    let mut cache = QueryCache::new();
    resolve_into(
        provider,
        &mut cache,
        &identifiers,
        &Scopes::single(CANONICAL_ID_SCOPE),
        &Species::All,
        &FieldSet::defaults().with(TAXID_FIELD),
    )?;

    let mut genes: IndexMap<&str, GeneRecord> = IndexMap::new();
    for entry in ids.iter().filter_map(|id| cache.get(id)) {
        for record in entry.records() {
            genes
                .entry(record.mygene_id.as_str())
                .or_insert_with(|| record.clone());
        }
    }
    Ok(genes.into_values().collect())
}

/// Top-level taxid of a gene set: scalar for one species, first-seen list
/// for several, `None` when no gene carries a taxid.
pub fn geneset_taxid(genes: &[GeneRecord]) -> Option<OneOrMany<u32>> {
    let mut taxids: Vec<u32> = Vec::new();
    for taxid in genes.iter().filter_map(|gene| gene.taxid) {
        if !taxids.contains(&taxid) {
            taxids.push(taxid);
        }
    }
    OneOrMany::from_vec(taxids)
}

/// Short random gene-set id, `mygst:` followed by six base-62 characters.
pub fn generate_geneset_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..GENESET_ID_LEN)
        .map(|_| BASE62[rng.gen_range(0..BASE62.len())] as char)
        .collect();
    format!("{GENESET_ID_PREFIX}{suffix}")
}
