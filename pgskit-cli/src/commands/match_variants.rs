//! Match scoring-file variants against a target variant table.
//!
//! pgskit match-variants --dataset cineca --scorefile combined.txt --target cohort.bim --format bim

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use pgskit_core::matching::{self, writer, MatchOptions};
use pgskit_geno::{read_scorefile, read_target, TargetFormat, VariantList};

#[derive(Args)]
pub struct MatchVariantsArgs {
    /// Label for the target genomic dataset
    #[arg(long)]
    dataset: String,

    /// Combined scoring file (tab-separated, one row per variant and accession)
    #[arg(long)]
    scorefile: PathBuf,

    /// Target variant table (.bim or .pvar)
    #[arg(long)]
    target: PathBuf,

    /// Target table format: bim or pvar
    #[arg(long, default_value = "bim")]
    format: String,

    /// Write one scorefile per chromosome
    #[arg(long)]
    split: bool,

    /// Minimum fraction of scoring-file variants that must match
    #[arg(long, default_value = "0.75")]
    min_overlap: f64,

    /// Keep strand-ambiguous matches, labelled, instead of dropping them
    #[arg(long)]
    keep_ambiguous: bool,

    /// Output directory for scorefiles
    #[arg(long, default_value = ".")]
    outdir: PathBuf,

    /// Also write matched target IDs as an inclusion list for `pgskit extract`
    #[arg(long)]
    extract_list: Option<PathBuf>,
}

pub fn run(args: MatchVariantsArgs) -> Result<()> {
    let format = match args.format.to_lowercase().as_str() {
        "bim" => TargetFormat::Bim,
        "pvar" => TargetFormat::Pvar,
        other => anyhow::bail!("Unknown target format: {}", other),
    };

    info!("=== Matching scoring file against target [{}] ===", args.dataset);

    let target = read_target(&args.target, format)?;
    info!("Loaded {} target variants from {}", target.len(), args.target.display());

    let scorefile = read_scorefile(&args.scorefile)?;
    info!("Loaded {} scoring-file rows from {}", scorefile.len(), args.scorefile.display());

    let opts = MatchOptions {
        min_overlap: args.min_overlap,
        keep_ambiguous: args.keep_ambiguous,
    };
    let report = matching::match_variants(&scorefile, &target, &opts)?;
    info!(
        "{} matches ({} ambiguous), overlap {:.1}%",
        report.matches.len(),
        report.n_ambiguous,
        report.overlap * 100.0
    );

    let written = writer::write_scorefiles(&report.matches, &args.outdir, args.split)?;
    for path in &written {
        info!("Wrote {}", path.display());
    }

    if let Some(path) = &args.extract_list {
        let list = VariantList::new(report.target_ids());
        list.write(path)?;
        info!("Wrote {} matched target IDs to {}", list.len(), path.display());
    }
    Ok(())
}
