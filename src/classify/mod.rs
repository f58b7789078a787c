pub mod classify_gene;
pub mod classify_genes;

use ahash::AHashMap;
use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;

use crate::config::ClassifierConfig;
use crate::error::Result;
use crate::lineage_store::LineageStore;
use crate::types::{ClassificationLabel, Rank, RankedLineage};

pub use classify_gene::scan_gene;

/// What the classifier concluded for one gene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneOutcome {
    /// Homologs diverge at some rank; the most specific divergence wins.
    Restricted(ClassificationLabel),
    /// Every scanned rank was consistent with the organism. Not a label.
    NoDivergence,
    /// The gene had hits but none of their taxonomy ids resolved.
    InsufficientData,
    /// The gene is known but has no hits reaching this stage.
    NoHomologs,
    /// The per-gene scan faulted; the gene carries no label.
    Failed,
}

impl GeneOutcome {
    pub fn label(self) -> Option<ClassificationLabel> {
        match self {
            GeneOutcome::Restricted(label) => Some(label),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GeneOutcome::Restricted(label) => label.as_str(),
            GeneOutcome::NoDivergence => "NO_DIVERGENCE",
            GeneOutcome::InsufficientData => "INSUFFICIENT_DATA",
            GeneOutcome::NoHomologs => "NO_HOMOLOGS",
            GeneOutcome::Failed => "FAILED",
        }
    }
}

/// Per-gene outcomes in deterministic input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationReport {
    pub outcomes: Vec<(String, GeneOutcome)>,
}

impl ClassificationReport {
    /// gene id -> label, for restricted genes only.
    pub fn label_map(&self) -> BTreeMap<String, ClassificationLabel> {
        self.outcomes
            .iter()
            .filter_map(|(gene, outcome)| outcome.label().map(|l| (gene.clone(), l)))
            .collect()
    }

    pub fn outcome(&self, gene_id: &str) -> Option<GeneOutcome> {
        self.outcomes
            .iter()
            .find(|(gene, _)| gene == gene_id)
            .map(|(_, outcome)| *outcome)
    }

    pub fn label_counts(&self) -> BTreeMap<ClassificationLabel, usize> {
        let mut counts = BTreeMap::new();
        for label in self.outcomes.iter().filter_map(|(_, o)| o.label()) {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }

    fn genes_with(&self, wanted: GeneOutcome) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == wanted)
            .map(|(gene, _)| gene.as_str())
            .collect()
    }

    pub fn insufficient_data(&self) -> Vec<&str> {
        self.genes_with(GeneOutcome::InsufficientData)
    }

    pub fn failed(&self) -> Vec<&str> {
        self.genes_with(GeneOutcome::Failed)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// `gene_id\toutcome` per line, in report order.
    pub fn to_tsv(&self) -> String {
        let mut output = String::new();
        for (gene, outcome) in &self.outcomes {
            writeln!(output, "{}\t{}", gene, outcome.as_str()).unwrap();
        }
        output
    }

    /// Human-readable summary, one label per line, skipping empty labels.
    pub fn summary(&self) -> String {
        let counts = self.label_counts();
        let mut by_kind: AHashMap<&'static str, usize> = AHashMap::new();
        for (_, outcome) in &self.outcomes {
            if outcome.label().is_none() {
                *by_kind.entry(outcome.as_str()).or_insert(0) += 1;
            }
        }

        let mut output = String::new();
        for label in ClassificationLabel::ALL {
            if let Some(n) = counts.get(&label) {
                writeln!(output, "{:<20}{}", label.as_str(), n).unwrap();
            }
        }
        for kind in ["NO_DIVERGENCE", "INSUFFICIENT_DATA", "NO_HOMOLOGS", "FAILED"] {
            if let Some(n) = by_kind.get(kind) {
                writeln!(output, "{:<20}{}", kind, n).unwrap();
            }
        }
        output
    }
}

/// Per-gene scan: gene id, hit lineages, organism lineage, ranks to examine.
pub type ScanFn = fn(&str, &[&RankedLineage], &RankedLineage, &[Rank]) -> GeneOutcome;

/// Scans genes against the organism's own lineage.
pub struct Classifier<'s> {
    input: &'s RankedLineage,
    /// Most general first.
    ranks: Vec<Rank>,
    scan: ScanFn,
}

impl<'s> Classifier<'s> {
    /// Fails with `UnresolvedOrganism` if the store lacks the organism's lineage.
    pub fn new(store: &'s LineageStore, config: &ClassifierConfig) -> Result<Self> {
        let input = store.input_lineage()?;
        Ok(Self {
            input,
            ranks: scan_order(config.include_species_rank),
            scan: scan_gene,
        })
    }

    /// Replaces the per-gene scan, keeping the batch drivers around it.
    pub fn with_scan(mut self, scan: ScanFn) -> Self {
        self.scan = scan;
        self
    }

    pub fn input_lineage(&self) -> &RankedLineage {
        self.input
    }

    pub fn ranks(&self) -> &[Rank] {
        &self.ranks
    }
}

/// Domain down to genus, or down to species when `include_species`.
pub fn scan_order(include_species: bool) -> Vec<Rank> {
    Rank::ALL
        .iter()
        .rev()
        .copied()
        .filter(|&r| include_species || r != Rank::Species)
        .collect()
}
