use ahash::AHashSet;

use super::{Classifier, GeneOutcome};
use crate::aggregate::GeneLineages;
use crate::types::{Rank, RankedLineage, TaxId};

/// Rank-by-rank divergence scan of one gene's hit lineages.
///
/// `ranks` must run from most general to most specific. At each rank the
/// distinct (known) hit ancestors are collected:
/// - one id equal to the organism's ancestor: consistent, keep going;
/// - more than one id: divergence, overwrite the candidate label and keep going;
/// - one id different from the organism's, or no known ids: no change.
///
/// The last divergence seen, i.e. the most specific one, is the result.
pub fn scan_gene(
    gene_id: &str,
    hit_lineages: &[&RankedLineage],
    input: &RankedLineage,
    ranks: &[Rank],
) -> GeneOutcome {
    if hit_lineages.is_empty() {
        return GeneOutcome::InsufficientData;
    }

    let mut candidate = None;
    let mut common: AHashSet<TaxId> = AHashSet::with_capacity(hit_lineages.len());

    for &rank in ranks {
        common.clear();
        common.extend(hit_lineages.iter().filter_map(|l| l.ancestor(rank)));

        match common.len() {
            0 => {
                log::debug!("{gene_id}: no hit ancestors known at {rank}");
            }
            1 => {
                let only = common.iter().next().copied();
                if only != input.ancestor(rank) {
                    log::debug!(
                        "{gene_id}: lone hit ancestor {:?} at {rank} differs from organism's {:?}",
                        only,
                        input.ancestor(rank)
                    );
                }
            }
            n => {
                let label = rank.divergence_label();
                log::debug!("{gene_id}: {n} distinct ancestors at {rank} => {label}");
                candidate = Some(label);
            }
        }
    }

    candidate.map_or(GeneOutcome::NoDivergence, GeneOutcome::Restricted)
}

impl Classifier<'_> {
    /// Classifies a single gene. Never fails: missing data maps to an outcome.
    pub fn classify_gene(&self, gene: &GeneLineages<'_>) -> GeneOutcome {
        if !gene.is_resolved() {
            log::warn!(
                "Gene {}: none of {} hit taxonomy ids resolved, insufficient data",
                gene.gene_id,
                gene.unresolved.len()
            );
            return GeneOutcome::InsufficientData;
        }
        (self.scan)(&gene.gene_id, &gene.lineages, self.input, &self.ranks)
    }
}
