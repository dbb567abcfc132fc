use std::collections::HashSet;

use indexmap::IndexSet;
use tracing::{debug, info, warn};

use crate::assemble::{ResolutionResult, assemble};
use crate::cache::QueryCache;
use crate::error::KiraError;
use crate::gene::{FieldSet, GeneRecord, TAXID_FIELD};
use crate::identifier::{Identifier, Scopes, validate_batch};
use crate::mygene::{GeneProvider, QueryRequest, QueryTerms};
use crate::species::Species;

/// One resolution session against the gene provider.
///
/// The session owns its [`QueryCache`]. Pass a cache in with
/// [`GeneLookup::with_cache`] and take it back with
/// [`GeneLookup::into_cache`] to share lookups between sessions of the same
/// species.
pub struct GeneLookup<P: GeneProvider> {
    provider: P,
    species: Species,
    fields: FieldSet,
    cache: QueryCache,
}

impl<P: GeneProvider> GeneLookup<P> {
    pub fn new(provider: P, species: Species) -> Self {
        Self::with_cache(provider, species, QueryCache::new())
    }

    pub fn with_cache(provider: P, species: Species, cache: QueryCache) -> Self {
        Self {
            provider,
            species,
            fields: FieldSet::defaults(),
            cache,
        }
    }

    /// Replaces the base field set. Changing fields mid-session leaves
    /// earlier cache entries with the old shape.
    pub fn with_fields(mut self, fields: FieldSet) -> Self {
        self.fields = fields;
        self
    }

    pub fn species(&self) -> &Species {
        &self.species
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn into_cache(self) -> QueryCache {
        self.cache
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub(crate) fn provider(&self) -> &P {
        &self.provider
    }

    pub(crate) fn replace_cache(&mut self, cache: QueryCache) {
        self.cache = cache;
    }

    /// Fields sent for this session's species; `taxid` is added whenever
    /// hits may span several organisms.
    pub fn effective_fields(&self) -> FieldSet {
        fields_for(&self.fields, &self.species)
    }

    /// Resolves `ids` into the session cache.
    pub fn resolve(&mut self, ids: &[Identifier], scopes: &Scopes) -> Result<(), KiraError> {
        let fields = self.effective_fields();
        resolve_into(
            &self.provider,
            &mut self.cache,
            ids,
            scopes,
            &self.species,
            &fields,
        )
    }

    /// Result document for `ids`, read from the session cache.
    pub fn results(&self, ids: &[Identifier]) -> Result<ResolutionResult, KiraError> {
        assemble(&self.cache, ids)
    }
}

pub(crate) fn fields_for(base: &FieldSet, species: &Species) -> FieldSet {
    if species.spans_multiple() {
        base.clone().with(TAXID_FIELD)
    } else {
        base.clone()
    }
}

/// Batch lookup with per-column scope fallback.
///
/// Column `n` of every identifier is queried with scope `n`. Only the
/// identifiers the provider reports missing move on to the next column. A
/// 400 for a one-term round skips straight to the next column; every other
/// provider error is returned.
pub(crate) fn resolve_into<P: GeneProvider + ?Sized>(
    provider: &P,
    cache: &mut QueryCache,
    ids: &[Identifier],
    scopes: &Scopes,
    species: &Species,
    fields: &FieldSet,
) -> Result<(), KiraError> {
    validate_batch(ids, scopes)?;
    if ids.is_empty() {
        return Ok(());
    }

    let species_param = species.query_param();
    let fields_param = fields.query_param();
    let mut pending: Vec<&Identifier> = ids.iter().collect();

    for (column, scope) in scopes.columns().iter().enumerate() {
        let before = pending.len();
        pending.retain(|id| id.column(column).is_some_and(|key| !cache.contains(key)));
        let cached = before - pending.len();
        if cached > 0 {
            info!("Found {cached} genes in query cache.");
        }
        if pending.is_empty() {
            return Ok(());
        }

        let terms: IndexSet<&str> = pending.iter().filter_map(|id| id.column(column)).collect();
        info!("Searching for {} genes with scope '{scope}'...", terms.len());

        let request = QueryRequest {
            terms: QueryTerms::from_vec(terms.into_iter().map(str::to_string).collect()),
            scopes: scope.clone(),
            fields: fields_param.clone(),
            species: species_param.clone(),
        };
        let response = match provider.query_many(&request) {
            Ok(response) => response,
            Err(err) if err.is_single_element_rejection() && request.terms.len() == 1 => {
                warn!("provider rejected query with scope '{scope}': {err}; moving on");
                continue;
            }
            Err(err) => return Err(err),
        };

        for hit in &response.out {
            if let Some(record) = GeneRecord::from_hit(hit, fields) {
                cache.add_hit(&hit.query, record);
            }
        }
        if !response.dup.is_empty() {
            debug!("{} queries matched more than one gene", response.dup.len());
        }

        if response.missing.is_empty() {
            info!("No ids to retry.");
            return Ok(());
        }
        if column + 1 < scopes.columns().len() {
            let missing: HashSet<&str> = response.missing.iter().map(String::as_str).collect();
            pending.retain(|id| id.column(column).is_some_and(|key| missing.contains(key)));
            info!("Retrying {} genes.", pending.len());
        } else {
            info!("Could not find {} genes.", response.missing.len());
        }
    }
    Ok(())
}
