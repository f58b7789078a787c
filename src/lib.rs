// src/lib.rs
pub mod types;
pub mod error;
pub mod config;
pub mod lineage_store;
pub mod aggregate;
pub mod classify;

use std::borrow::Cow;
use std::path::Path;

use crate::aggregate::{filter_by_identity, run_taxids, LineageAggregator};
use crate::classify::{ClassificationReport, Classifier};
use crate::config::ClassifierConfig;
use crate::error::Result;
use crate::lineage_store::LineageStore;
use crate::types::{Gene, HomologyHit, TaxId};

pub use crate::classify::GeneOutcome;
pub use crate::error::OrfanError;
pub use crate::types::{ClassificationLabel, Rank, RankedLineage};

/// Everything one classification run produced. The lineage store itself is
/// dropped at the end of the run; only its statistics are kept.
#[derive(Debug, Clone)]
pub struct ClassificationRun {
    pub report: ClassificationReport,
    /// Hits surviving the identity filter.
    pub hits_used: usize,
    pub rows_scanned: usize,
    pub lineages_retained: usize,
    pub skipped_rows: usize,
}

impl ClassificationRun {
    /// Generate the `gene_id\toutcome` table on demand
    pub fn get_classification_output(&self) -> String {
        self.report.to_tsv()
    }

    /// Generate the per-label summary on demand
    pub fn get_summary(&self) -> String {
        self.report.summary()
    }
}

/// Classifies every gene in `hits` against `organism`.
///
/// The lineage store is built for exactly this run's ids (organism plus the
/// distinct hit ids). When `genes` is given, each listed gene gets an outcome
/// in list order and genes without hits are reported as `NoHomologs`.
pub fn classify_hits<P: AsRef<Path>>(
    reference_path: P,
    organism: TaxId,
    hits: &[HomologyHit],
    genes: Option<&[Gene]>,
    config: &ClassifierConfig,
) -> Result<ClassificationRun> {
    config.validate()?;

    // 1. Identity filter, if the caller has not applied one upstream
    let hits: Cow<'_, [HomologyHit]> = match config.identity_threshold {
        Some(threshold) => Cow::Owned(filter_by_identity(hits, threshold)),
        None => Cow::Borrowed(hits),
    };

    // 2. Run-scoped lineage index
    let wanted = run_taxids(&hits, organism);
    let store = LineageStore::build_with_policy(
        reference_path,
        &wanted,
        organism,
        config.malformed_rows,
    )?;

    // 3. Baseline lineage; fatal if missing
    let classifier = Classifier::new(&store, config)?;

    // 4. Resolve hits per gene
    let groups = LineageAggregator::new(&store).aggregate(&hits);

    // 5. Scan
    let report = match genes {
        Some(listed) => classifier.classify_listed(listed, &groups, config.parallel),
        None if config.parallel => classifier.classify_parallel(&groups),
        None => classifier.classify(&groups),
    };

    Ok(ClassificationRun {
        report,
        hits_used: hits.len(),
        rows_scanned: store.rows_scanned(),
        lineages_retained: store.len(),
        skipped_rows: store.skipped_rows(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MalformedRowPolicy;
    use std::fs;
    use std::path::PathBuf;

    const REFERENCE: &str = "\
10\t|\tQuery organism\t|\t10\t|\t100\t|\t200\t|\t300\t|\t400\t|\t500\t|\t600\t|\t900\t|
20\t|\tCongener\t|\t20\t|\t150\t|\t200\t|\t300\t|\t400\t|\t500\t|\t600\t|\t900\t|
21\t|\tSister species\t|\t21\t|\t100\t|\t200\t|\t300\t|\t400\t|\t500\t|\t600\t|\t900\t|
30\t|\tBacterium\t|\t30\t|\t100\t|\t200\t|\t300\t|\t400\t|\t500\t|\t600\t|\t901\t|
31\t|\tArchaeon\t|\t31\t|\t100\t|\t200\t|\t300\t|\t400\t|\t500\t|\t600\t|\t902\t|
";

    fn hit(gene: &str, taxid: TaxId, pident: f64) -> HomologyHit {
        HomologyHit {
            gene_id: gene.to_string(),
            target_tax_id: taxid,
            percent_identity: pident,
        }
    }

    fn write_reference(dir: &tempfile::TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("rankedlineage.dmp");
        fs::write(&path, text).expect("Could not write reference");
        path
    }

    #[test]
    fn test_classify_hits_api() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write_reference(&dir, REFERENCE);
        let hits = vec![
            hit("resolves", 20, 90.0),
            hit("orphan_hit", 5555, 90.0),
            hit("multi", 30, 80.0),
            hit("multi", 31, 80.0),
            hit("genus", 20, 70.0),
            hit("genus", 21, 70.0),
        ];

        let run = classify_hits(&reference, 10, &hits, None, &ClassifierConfig::default())
            .expect("Classification failed");

        assert_eq!(run.hits_used, 6);
        assert_eq!(run.rows_scanned, 5);
        // organism + 20, 21, 30, 31; 5555 is absent from the reference
        assert_eq!(run.lineages_retained, 5);

        let report = &run.report;
        assert_eq!(report.outcome("resolves"), Some(GeneOutcome::NoDivergence));
        assert_eq!(report.outcome("orphan_hit"), Some(GeneOutcome::InsufficientData));
        assert_eq!(
            report.outcome("multi"),
            Some(GeneOutcome::Restricted(ClassificationLabel::MultiDomain))
        );
        assert_eq!(
            report.outcome("genus"),
            Some(GeneOutcome::Restricted(ClassificationLabel::FamilyRestricted))
        );

        let output = run.get_classification_output();
        assert!(output.contains("multi\tMULTI_DOMAIN\n"));
        assert!(output.contains("orphan_hit\tINSUFFICIENT_DATA\n"));
        assert!(run.get_summary().contains("MULTI_DOMAIN"));
    }

    #[test]
    fn identity_threshold_drops_weak_hits_before_indexing() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write_reference(&dir, REFERENCE);
        let hits = vec![hit("multi", 30, 95.0), hit("multi", 31, 20.0)];
        let config = ClassifierConfig::new().identity_threshold(50.0);

        let run = classify_hits(&reference, 10, &hits, None, &config).unwrap();
        assert_eq!(run.hits_used, 1);
        assert_eq!(run.lineages_retained, 2);
        assert_eq!(run.report.outcome("multi"), Some(GeneOutcome::NoDivergence));
    }

    #[test]
    fn unknown_organism_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write_reference(&dir, REFERENCE);
        let hits = [hit("g", 20, 99.0)];
        let err = classify_hits(&reference, 4, &hits, None, &ClassifierConfig::default())
            .unwrap_err();
        assert!(matches!(err, OrfanError::UnresolvedOrganism(4)));
    }

    #[test]
    fn malformed_reference_respects_policy() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write_reference(&dir, &format!("{REFERENCE}bad row\n"));
        let hits = vec![hit("g", 20, 99.0)];

        let strict = classify_hits(&reference, 10, &hits, None, &ClassifierConfig::default());
        assert!(matches!(strict, Err(OrfanError::DataFormat { line: 6, .. })));

        let lenient = ClassifierConfig::new().malformed_rows(MalformedRowPolicy::SkipAndWarn);
        let run = classify_hits(&reference, 10, &hits, None, &lenient).unwrap();
        assert_eq!(run.skipped_rows, 1);
    }

    #[test]
    fn gene_list_and_parallel_runs_agree() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write_reference(&dir, REFERENCE);
        let hits = vec![hit("multi", 30, 80.0), hit("multi", 31, 80.0)];
        let genes = vec![
            Gene { gene_id: "quiet".into(), tax_id: 10 },
            Gene { gene_id: "multi".into(), tax_id: 10 },
        ];

        let seq = classify_hits(
            &reference,
            10,
            &hits,
            Some(genes.as_slice()),
            &ClassifierConfig::default(),
        )
        .unwrap();
        let par = classify_hits(
            &reference,
            10,
            &hits,
            Some(genes.as_slice()),
            &ClassifierConfig::new().parallel(true),
        )
        .unwrap();

        assert_eq!(seq.report, par.report);
        assert_eq!(seq.report.outcome("quiet"), Some(GeneOutcome::NoHomologs));
        assert_eq!(seq.get_classification_output(), "quiet\tNO_HOMOLOGS\nmulti\tMULTI_DOMAIN\n");
    }
}
