//! Cross-species conversion through the provider's homology graph.
//!
//! Conversion runs in two phases. The submitted identifiers are resolved in
//! the source species with `taxid` and `homologene` added to the fields, and
//! each resolved gene is mapped to its ortholog in the target species. The
//! ortholog ids are then resolved by canonical id in the target species. The
//! session cache is replaced by a fresh one keyed by the original
//! identifiers, so [`GeneLookup::results`] works with the ids the caller
//! submitted.

use indexmap::IndexSet;
use serde_json::Value;
use tracing::info;

use crate::assemble::assemble;
use crate::cache::{CacheEntry, QueryCache};
use crate::error::KiraError;
use crate::gene::{GeneRecord, HOMOLOGY_FIELD, SourceIds, TAXID_FIELD, taxid_value};
use crate::identifier::{Identifier, Scopes, validate_batch};
use crate::lookup::{GeneLookup, fields_for, resolve_into};
use crate::mygene::GeneProvider;
use crate::species::Species;

/// Scope for lookups by canonical provider id.
pub const CANONICAL_ID_SCOPE: &str = "_id";

/// Original identifier(s) of one source gene and the target-species gene
/// they convert to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomologyMapping {
    pub original: SourceIds,
    pub homolog_gene_id: String,
}

impl<P: GeneProvider> GeneLookup<P> {
    /// Converts `ids` from `source` species to their orthologs in `target`.
    ///
    /// `target` must name exactly one species. Identifiers without an
    /// ortholog in `target` end up in the result's `not_found`.
    pub fn convert(
        &mut self,
        ids: &[Identifier],
        scopes: &Scopes,
        target: &Species,
        source: &Species,
    ) -> Result<Vec<HomologyMapping>, KiraError> {
        let Some(target_taxid) = target.taxid() else {
            return Err(KiraError::InvalidTargetSpecies(format!(
                "cannot convert to '{target}', a single taxid is required"
            )));
        };
        validate_batch(ids, scopes)?;

        let source_fields = self.fields().clone().with(TAXID_FIELD).with(HOMOLOGY_FIELD);
        let mut source_cache = QueryCache::new();
        resolve_into(
            self.provider(),
            &mut source_cache,
            ids,
            scopes,
            source,
            &source_fields,
        )?;
        let source_results = assemble(&source_cache, ids)?;

        let mappings = source_results
            .genes
            .iter()
            .filter_map(|gene| map_to_target(gene, target_taxid))
            .collect::<Vec<_>>();
        if !source_results.not_found.is_empty() {
            info!("Could not find {} genes.", source_results.not_found.count);
        }
        if !source_results.duplicates.is_empty() {
            info!("Found {} duplicate genes.", source_results.duplicates.count);
        }

        let homolog_ids: Vec<Identifier> = mappings
            .iter()
            .map(|mapping| mapping.homolog_gene_id.as_str())
            .collect::<IndexSet<_>>()
            .into_iter()
            .map(Identifier::simple)
            .collect();

        let mut target_cache = QueryCache::new();
        if homolog_ids.is_empty() {
            info!("No ids to query.");
        } else {
            let target_fields = fields_for(self.fields(), target);
            resolve_into(
                self.provider(),
                &mut target_cache,
                &homolog_ids,
                &Scopes::single(CANONICAL_ID_SCOPE),
                target,
                &target_fields,
            )?;
        }

        self.replace_cache(rekey_by_original(&target_cache, &mappings));
        Ok(mappings)
    }
}

fn map_to_target(gene: &GeneRecord, target_taxid: &str) -> Option<HomologyMapping> {
    let original = gene.source_id.clone();
    if gene
        .taxid
        .is_some_and(|taxid| taxid.to_string() == target_taxid)
    {
        info!(
            "{} already belongs to {target_taxid}, no conversion needed.",
            original.first()
        );
        return Some(HomologyMapping {
            original,
            homolog_gene_id: gene.mygene_id.clone(),
        });
    }

    let Some(graph) = gene.extra_field(HOMOLOGY_FIELD) else {
        info!("No homologene field found for {}.", original.first());
        return None;
    };
    match find_homolog(graph, target_taxid) {
        Some(homolog_gene_id) => {
            info!("{} converted to {homolog_gene_id}.", original.first());
            Some(HomologyMapping {
                original,
                homolog_gene_id,
            })
        }
        None => {
            info!("Could not find a homolog match for {}.", original.first());
            None
        }
    }
}

/// First `[taxid, gene_id]` pair of the graph's `genes` list whose taxid is
/// the target. A bare pair is read as a one-entry list.
///
/// When the graph lists several orthologs in the target species only the
/// first is used; later entries for that taxid are ignored rather than
/// overriding it.
pub fn find_homolog(graph: &Value, target_taxid: &str) -> Option<String> {
    let genes = graph.get("genes")?.as_array()?;
    let pairs: Vec<&Value> = if genes.first().is_some_and(Value::is_array) {
        genes.iter().collect()
    } else {
        vec![graph.get("genes")?]
    };
    pairs.into_iter().find_map(|pair| {
        let pair = pair.as_array()?;
        let taxid = taxid_value(pair.first()?)?;
        if taxid.to_string() != target_taxid {
            return None;
        }
        match pair.get(1)? {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    })
}

/// Fresh cache with each homolog's records copied under every original
/// identifier and attributed to it.
fn rekey_by_original(target_cache: &QueryCache, mappings: &[HomologyMapping]) -> QueryCache {
    let mut rekeyed = QueryCache::new();
    for mapping in mappings {
        let Some(entry) = target_cache.get(&mapping.homolog_gene_id) else {
            continue;
        };
        for original in mapping.original.iter() {
            let relabeled = entry.relabeled(original);
            for record in relabeled.records() {
                let known = rekeyed.get(original).is_some_and(|existing: &CacheEntry| {
                    existing
                        .records()
                        .iter()
                        .any(|r| r.mygene_id == record.mygene_id)
                });
                if !known {
                    rekeyed.add_hit(original, record.clone());
                }
            }
        }
    }
    rekeyed
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn homolog_found_in_pair_list() {
        let graph = json!({"id": 20060, "genes": [[10090, 98660], [9606, 477]]});
        assert_eq!(find_homolog(&graph, "9606"), Some("477".to_string()));
        assert_eq!(find_homolog(&graph, "10116"), None);
    }

    #[test]
    fn first_of_several_target_orthologs_wins() {
        let graph = json!({"id": 4, "genes": [[10090, 11], [9606, 100], [9606, 200]]});
        assert_eq!(find_homolog(&graph, "9606"), Some("100".to_string()));
    }

    #[test]
    fn bare_pair_is_a_single_entry() {
        let graph = json!({"id": 1, "genes": [7955, 691975]});
        assert_eq!(find_homolog(&graph, "7955"), Some("691975".to_string()));
        assert_eq!(find_homolog(&graph, "9606"), None);
    }

    #[test]
    fn self_taxid_maps_to_itself() {
        let mut gene = GeneRecord::new("147968", "147968");
        gene.taxid = Some(9606);
        let mapping = map_to_target(&gene, "9606").unwrap();
        assert_eq!(mapping.homolog_gene_id, "147968");
    }

    #[test]
    fn synonyms_are_rekeyed_individually() {
        let mut target = QueryCache::new();
        target.add_hit("16334", GeneRecord::new("16334", "16334"));
        let mut original = SourceIds::single("3630");
        original.push("P01308");
        let mappings = vec![HomologyMapping {
            original,
            homolog_gene_id: "16334".to_string(),
        }];
        let rekeyed = rekey_by_original(&target, &mappings);
        assert_eq!(rekeyed.len(), 2);
        assert_eq!(rekeyed.get("P01308").unwrap().records()[0].source_id.first(), "P01308");
        assert!(rekeyed.get("16334").is_none());
    }
}
