use ahash::{AHashMap, AHashSet};
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};

use super::{ClassificationReport, Classifier, GeneOutcome};
use crate::aggregate::GeneLineages;
use crate::types::Gene;

impl Classifier<'_> {
    fn classify_guarded(&self, gene: &GeneLineages<'_>) -> GeneOutcome {
        guarded(&gene.gene_id, || self.classify_gene(gene))
    }

    /// Sequential classification, in input order.
    pub fn classify(&self, genes: &[GeneLineages<'_>]) -> ClassificationReport {
        let outcomes = genes
            .iter()
            .map(|g| (g.gene_id.clone(), self.classify_guarded(g)))
            .collect();
        finish(outcomes)
    }

    /// Same result as `classify`, scanned on the rayon pool.
    pub fn classify_parallel(&self, genes: &[GeneLineages<'_>]) -> ClassificationReport {
        let outcomes = genes
            .par_iter()
            .map(|g| (g.gene_id.clone(), self.classify_guarded(g)))
            .collect();
        finish(outcomes)
    }

    /// Gives every listed gene an outcome, in gene-list order. Listed genes
    /// without hits are `NoHomologs`; hit groups for unlisted genes follow.
    pub fn classify_listed(
        &self,
        listed: &[Gene],
        groups: &[GeneLineages<'_>],
        parallel: bool,
    ) -> ClassificationReport {
        let classified = if parallel {
            self.classify_parallel(groups)
        } else {
            self.classify(groups)
        };

        let mut by_gene: AHashMap<&str, GeneOutcome> = classified
            .outcomes
            .iter()
            .map(|(g, o)| (g.as_str(), *o))
            .collect();

        let organism = self.input.tax_id;
        let mut outcomes = Vec::with_capacity(listed.len().max(groups.len()));
        let mut placed: AHashSet<&str> = AHashSet::with_capacity(listed.len());
        for gene in listed {
            if !placed.insert(gene.gene_id.as_str()) {
                continue;
            }
            if gene.tax_id != organism {
                log::warn!(
                    "Gene {} is tagged with taxonomy id {}, but the run's organism is {}",
                    gene.gene_id,
                    gene.tax_id,
                    organism
                );
            }
            let outcome = by_gene
                .remove(gene.gene_id.as_str())
                .unwrap_or(GeneOutcome::NoHomologs);
            outcomes.push((gene.gene_id.clone(), outcome));
        }

        let mut unlisted = 0usize;
        for (gene_id, outcome) in &classified.outcomes {
            if !placed.contains(gene_id.as_str()) {
                unlisted += 1;
                outcomes.push((gene_id.clone(), *outcome));
            }
        }
        if unlisted > 0 {
            log::warn!("{unlisted} genes with hits were not in the gene list");
        }

        ClassificationReport { outcomes }
    }
}

/// Contains a fault in one gene's scan to that gene.
fn guarded<F: FnOnce() -> GeneOutcome>(gene_id: &str, scan: F) -> GeneOutcome {
    match panic::catch_unwind(AssertUnwindSafe(scan)) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown fault".to_string());
            log::error!("Gene {gene_id}: classification failed: {reason}");
            GeneOutcome::Failed
        }
    }
}

fn finish(outcomes: Vec<(String, GeneOutcome)>) -> ClassificationReport {
    let report = ClassificationReport { outcomes };
    log::info!(
        "Classified {} genes: {} restricted, {} insufficient data, {} failed",
        report.len(),
        report.label_map().len(),
        report.insufficient_data().len(),
        report.failed().len()
    );
    report
}
