//src/lineage_store.rs

use ahash::{AHashMap, AHashSet};
use flate2::read::MultiGzDecoder;
use std::collections::hash_map::Entry;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::config::MalformedRowPolicy;
use crate::error::{OrfanError, Result};
use crate::types::{RankedLineage, TaxId, RANK_COUNT};

/// Field separator of NCBI `.dmp` files.
const NCBI_DELIMITER: &str = "\t|\t";

/// taxid, name, then one ancestor per rank.
pub const LINEAGE_COLUMNS: usize = 2 + RANK_COUNT;

/// Run-scoped lineage index. Holds only the rows a single run asked for and
/// is never mutated after `build`.
#[derive(Debug)]
pub struct LineageStore {
    lineages: AHashMap<TaxId, RankedLineage>,
    input_organism: TaxId,
    rows_scanned: usize,
    skipped_rows: usize,
    duplicate_rows: usize,
}

impl LineageStore {
    /// Streams a reference lineage file in the format:
    /// ```text
    /// <taxid>\t|\t<name>\t|\t<species>\t|\t<genus>\t|\t...\t|\t<domain>\t|
    /// ```
    /// Plain tab-separated rows are accepted too, and `.gz` files are decompressed.
    /// Only rows whose id is in `interesting_ids` or equals `input_organism` are kept.
    pub fn build<P: AsRef<Path>>(
        path: P,
        interesting_ids: &AHashSet<TaxId>,
        input_organism: TaxId,
    ) -> Result<Self> {
        Self::build_with_policy(path, interesting_ids, input_organism, MalformedRowPolicy::Fail)
    }

    pub fn build_with_policy<P: AsRef<Path>>(
        path: P,
        interesting_ids: &AHashSet<TaxId>,
        input_organism: TaxId,
        policy: MalformedRowPolicy,
    ) -> Result<Self> {
        let path = path.as_ref();
        let io_err = |source| OrfanError::Io {
            path: path.to_path_buf(),
            source,
        };
        let f = File::open(path).map_err(io_err)?;

        let is_gz = path
            .extension()
            .map(|ext| ext == "gz")
            .unwrap_or(false);

        let reader: Box<dyn BufRead> = if is_gz {
            Box::new(BufReader::new(MultiGzDecoder::new(f)))
        } else {
            Box::new(BufReader::new(f))
        };

        Self::build_from_reader(reader, interesting_ids, input_organism, policy).map_err(|e| {
            match e {
                // Attach the path to read failures surfacing from the reader.
                OrfanError::Io { source, .. } => io_err(source),
                other => other,
            }
        })
    }

    pub fn build_from_reader<R: BufRead>(
        reader: R,
        interesting_ids: &AHashSet<TaxId>,
        input_organism: TaxId,
        policy: MalformedRowPolicy,
    ) -> Result<Self> {
        let mut lineages = AHashMap::with_capacity(interesting_ids.len() + 1);
        let mut rows_scanned = 0usize;
        let mut skipped_rows = 0usize;
        let mut duplicate_rows = 0usize;

        for (idx, line_result) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line_result.map_err(|source| OrfanError::Io {
                path: Default::default(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            rows_scanned += 1;

            match parse_row(&line, line_no, |id| {
                id == input_organism || interesting_ids.contains(&id)
            }) {
                Ok(Some(lineage)) => match lineages.entry(lineage.tax_id) {
                    Entry::Vacant(slot) => {
                        slot.insert(lineage);
                    }
                    Entry::Occupied(_) => {
                        log::warn!(
                            "Duplicate row for taxid {} at line {}, keeping the first",
                            lineage.tax_id,
                            line_no
                        );
                        duplicate_rows += 1;
                    }
                },
                Ok(None) => {}
                Err(e) => match policy {
                    MalformedRowPolicy::Fail => return Err(e),
                    MalformedRowPolicy::SkipAndWarn => {
                        log::warn!("Skipping reference row: {e}");
                        skipped_rows += 1;
                    }
                },
            }
        }

        log::info!(
            "Scanned {} lineage rows, retained {} of {} ids ({} skipped, {} duplicate)",
            rows_scanned,
            lineages.len(),
            interesting_ids.len() + usize::from(!interesting_ids.contains(&input_organism)),
            skipped_rows,
            duplicate_rows
        );

        Ok(Self {
            lineages,
            input_organism,
            rows_scanned,
            skipped_rows,
            duplicate_rows,
        })
    }

    /// `None` is routine: hits often reference retired or merged ids.
    pub fn lookup(&self, tax_id: TaxId) -> Option<&RankedLineage> {
        self.lineages.get(&tax_id)
    }

    pub fn input_lineage(&self) -> Result<&RankedLineage> {
        self.lineages
            .get(&self.input_organism)
            .ok_or(OrfanError::UnresolvedOrganism(self.input_organism))
    }

    pub fn input_organism(&self) -> TaxId {
        self.input_organism
    }

    pub fn len(&self) -> usize {
        self.lineages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lineages.is_empty()
    }

    pub fn rows_scanned(&self) -> usize {
        self.rows_scanned
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// Retained ids that appeared again later in the file; the first row wins.
    pub fn duplicate_rows(&self) -> usize {
        self.duplicate_rows
    }
}

/// Splits on the NCBI `\t|\t` delimiter when present, otherwise on tabs.
fn split_fields(line: &str) -> Vec<&str> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.contains(NCBI_DELIMITER) {
        let body = line.strip_suffix("\t|").unwrap_or(line);
        body.split(NCBI_DELIMITER).map(str::trim).collect()
    } else {
        line.split('\t').map(str::trim).collect()
    }
}

/// Validates a row and returns its lineage when `wanted` selects its id.
/// Ancestor columns of unwanted rows are not parsed.
fn parse_row(
    line: &str,
    line_no: usize,
    wanted: impl Fn(TaxId) -> bool,
) -> Result<Option<RankedLineage>> {
    let parts = split_fields(line);
    if parts.len() != LINEAGE_COLUMNS {
        return Err(OrfanError::DataFormat {
            line: line_no,
            reason: format!("expected {} columns, found {}", LINEAGE_COLUMNS, parts.len()),
        });
    }

    let tax_id: TaxId = parts[0].parse().map_err(|_| OrfanError::DataFormat {
        line: line_no,
        reason: format!("invalid taxonomy id '{}'", parts[0]),
    })?;

    if !wanted(tax_id) {
        return Ok(None);
    }

    let mut ancestors = [None; RANK_COUNT];
    for (slot, field) in ancestors.iter_mut().zip(&parts[2..]) {
        if field.is_empty() {
            continue;
        }
        let id: TaxId = field.parse().map_err(|_| OrfanError::DataFormat {
            line: line_no,
            reason: format!("invalid ancestor id '{field}'"),
        })?;
        *slot = Some(id);
    }

    Ok(Some(RankedLineage {
        tax_id,
        name: parts[1].to_string(),
        ancestors,
    }))
}
