use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::error::Error;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use orfan_rs::classify_hits;
use orfan_rs::config::{ClassifierConfig, MalformedRowPolicy};
use orfan_rs::types::{Gene, HomologyHit, TaxId};

/// Assign restriction levels to genes from pre-parsed homology hits.
#[derive(Parser, Debug)]
#[command(name = "orfan-rs", version)]
struct Args {
    /// Ranked lineage file (taxid, name, species..domain ids); `.gz` accepted
    #[arg(short, long)]
    reference: PathBuf,

    /// Hits table: gene_id <TAB> target taxid <TAB> percent identity
    #[arg(long)]
    hits: PathBuf,

    /// Taxonomy id of the query organism
    #[arg(short = 't', long)]
    taxid: TaxId,

    /// Optional list of gene ids, one per line
    #[arg(long)]
    genes: Option<PathBuf>,

    /// Minimum percent identity for a hit to count
    #[arg(long)]
    identity: Option<f64>,

    /// Skip malformed reference rows instead of aborting
    #[arg(long)]
    skip_malformed: bool,

    /// Also scan the species rank
    #[arg(long)]
    include_species: bool,

    /// Classify genes in parallel
    #[arg(long)]
    parallel: bool,

    /// Output table
    #[arg(short, long, default_value = "classification.tsv")]
    output: PathBuf,
}

fn spinner(color: &str, msg: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&[
                "⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏",
            ])
            .template(&format!("{{spinner:.{color}}} {{msg}}"))
            .expect("Invalid spinner template"),
    );
    spinner.set_message(msg);
    spinner
}

fn read_hits(path: &PathBuf) -> Result<Vec<HomologyHit>, Box<dyn Error>> {
    let reader = BufReader::new(File::open(path)?);
    let mut hits = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 3 {
            return Err(format!("{}:{}: expected 3 columns", path.display(), idx + 1).into());
        }
        hits.push(HomologyHit {
            gene_id: parts[0].trim().to_string(),
            target_tax_id: parts[1].trim().parse()?,
            percent_identity: parts[2].trim().parse()?,
        });
    }
    Ok(hits)
}

fn read_genes(path: &PathBuf, tax_id: TaxId) -> Result<Vec<Gene>, Box<dyn Error>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|id| Gene {
            gene_id: id.trim_start_matches('>').to_string(),
            tax_id,
        })
        .collect())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut config = ClassifierConfig::new()
        .include_species_rank(args.include_species)
        .parallel(args.parallel);
    if let Some(identity) = args.identity {
        config = config.identity_threshold(identity);
    }
    if args.skip_malformed {
        config = config.malformed_rows(MalformedRowPolicy::SkipAndWarn);
    }

    // 1. Inputs
    let spin = spinner("blue", "Reading hits...");
    let hits = read_hits(&args.hits)?;
    let genes = args
        .genes
        .as_ref()
        .map(|p| read_genes(p, args.taxid))
        .transpose()?;
    spin.finish_with_message(format!("Read {} hits.", hits.len()));

    // 2. Classify
    let spin = spinner("green", "Indexing lineages and classifying genes...");
    let run = classify_hits(&args.reference, args.taxid, &hits, genes.as_deref(), &config)?;
    spin.finish_with_message(format!(
        "Classified {} genes ({} lineages from {} reference rows).",
        run.report.len(),
        run.lineages_retained,
        run.rows_scanned
    ));

    // 3. Output
    let spin = spinner("yellow", "Writing output...");
    fs::write(&args.output, run.get_classification_output())?;
    spin.finish_with_message(format!("Wrote {}.", args.output.display()));

    print!("{}", run.get_summary());
    Ok(())
}
