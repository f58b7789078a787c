//src/aggregate.rs

use ahash::{AHashMap, AHashSet};

use crate::lineage_store::LineageStore;
use crate::types::{HomologyHit, RankedLineage, TaxId};

/// The resolved hit lineages of one gene.
#[derive(Debug, Clone)]
pub struct GeneLineages<'s> {
    pub gene_id: String,
    /// Distinct, in first-hit order.
    pub lineages: Vec<&'s RankedLineage>,
    /// Hit ids with no row in the store, distinct, in first-hit order.
    pub unresolved: Vec<TaxId>,
}

impl GeneLineages<'_> {
    pub fn is_resolved(&self) -> bool {
        !self.lineages.is_empty()
    }
}

/// Resolves hit taxonomy ids per gene through a `LineageStore`.
pub struct LineageAggregator<'s> {
    store: &'s LineageStore,
}

impl<'s> LineageAggregator<'s> {
    pub fn new(store: &'s LineageStore) -> Self {
        Self { store }
    }

    /// Groups hits by gene in order of first appearance. Unresolvable ids are
    /// dropped from `lineages` with a warning and kept in `unresolved`.
    pub fn aggregate(&self, hits: &[HomologyHit]) -> Vec<GeneLineages<'s>> {
        let mut groups: Vec<GeneLineages<'s>> = Vec::new();
        let mut slot_of: AHashMap<&str, usize> = AHashMap::new();
        let mut seen: Vec<AHashSet<TaxId>> = Vec::new();

        for hit in hits {
            let slot = *slot_of.entry(hit.gene_id.as_str()).or_insert_with(|| {
                groups.push(GeneLineages {
                    gene_id: hit.gene_id.clone(),
                    lineages: Vec::new(),
                    unresolved: Vec::new(),
                });
                seen.push(AHashSet::new());
                groups.len() - 1
            });

            if !seen[slot].insert(hit.target_tax_id) {
                continue;
            }

            let group = &mut groups[slot];
            match self.store.lookup(hit.target_tax_id) {
                Some(lineage) => group.lineages.push(lineage),
                None => {
                    log::warn!(
                        "Gene {}: hit taxonomy id {} not in reference, dropping hit",
                        hit.gene_id,
                        hit.target_tax_id
                    );
                    group.unresolved.push(hit.target_tax_id);
                }
            }
        }

        let unresolved: usize = groups.iter().map(|g| g.unresolved.len()).sum();
        log::info!(
            "Aggregated {} hits into {} genes ({} unresolved taxonomy ids)",
            hits.len(),
            groups.len(),
            unresolved
        );
        groups
    }
}

/// The run-scoped id set: every distinct hit taxonomy id plus the organism's own.
pub fn run_taxids(hits: &[HomologyHit], organism: TaxId) -> AHashSet<TaxId> {
    let mut ids: AHashSet<TaxId> = hits.iter().map(|h| h.target_tax_id).collect();
    ids.insert(organism);
    ids
}

/// Keeps hits with `percent_identity >= threshold`.
pub fn filter_by_identity(hits: &[HomologyHit], threshold: f64) -> Vec<HomologyHit> {
    let kept: Vec<HomologyHit> = hits
        .iter()
        .filter(|h| h.percent_identity >= threshold)
        .cloned()
        .collect();
    log::info!(
        "Identity filter {:.1}% kept {} of {} hits",
        threshold,
        kept.len(),
        hits.len()
    );
    kept
}
