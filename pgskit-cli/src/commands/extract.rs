//! Extract a variant subset from a PLINK bed/bim/fam fileset.
//!
//! pgskit extract --bfile cohort --extract keep.txt --sampleset cineca --outdir results

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use tracing::info;

use pgskit_core::config::StageConfig;
use pgskit_core::environment::ContainerEngine;
use pgskit_core::exec;
use pgskit_core::extract::{ExtractStage, SampleMeta};
use pgskit_core::publish::PublishMode;
use pgskit_geno::BedFileset;

#[derive(Args)]
pub struct ExtractArgs {
    /// PLINK fileset prefix (bed/bim/fam share this stem)
    #[arg(long, conflicts_with_all = ["bed", "bim", "fam"])]
    bfile: Option<PathBuf>,

    /// Explicit .bed path (use with --bim and --fam)
    #[arg(long)]
    bed: Option<PathBuf>,

    /// Explicit .bim path
    #[arg(long)]
    bim: Option<PathBuf>,

    /// Explicit .fam path
    #[arg(long)]
    fam: Option<PathBuf>,

    /// Variant inclusion list (one ID per line)
    #[arg(long)]
    extract: PathBuf,

    /// Sampleset identifier; keys output prefixes and the publish directory
    #[arg(long)]
    sampleset: String,

    /// Suffix appended to the sampleset id in output prefixes
    #[arg(long)]
    suffix: Option<String>,

    /// JSON stage configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root of the published output tree
    #[arg(long)]
    outdir: Option<PathBuf>,

    /// Publish mode: copy, symlink, hardlink, or move
    #[arg(long)]
    publish_mode: Option<String>,

    /// Execution engine: native, docker, singularity, or conda
    #[arg(long)]
    engine: Option<String>,

    /// Under singularity, pull the registry image instead of the prebuilt one
    #[arg(long)]
    singularity_pull_docker_container: bool,

    /// Extra arguments passed through to plink2, whitespace-separated
    #[arg(long, allow_hyphen_values = true)]
    extra_args: Option<String>,

    /// Working directory for intermediate outputs
    #[arg(long, default_value = ".")]
    workdir: PathBuf,

    /// Render the wrapped command without running it
    #[arg(long)]
    dry_run: bool,
}

pub fn run(args: ExtractArgs, threads: Option<usize>) -> Result<()> {
    let mut cfg = match &args.config {
        Some(path) => StageConfig::from_json_file(path)?,
        None => StageConfig::default(),
    };
    if let Some(outdir) = args.outdir {
        cfg.outdir = outdir;
    }
    if let Some(mode) = &args.publish_mode {
        cfg.publish_mode = PublishMode::parse(mode)?;
    }
    if let Some(engine) = &args.engine {
        cfg.engine = ContainerEngine::parse(engine)?;
    }
    if args.singularity_pull_docker_container {
        cfg.singularity_pull_docker_container = true;
    }
    if let Some(threads) = threads {
        cfg.threads = threads;
    }
    if args.suffix.is_some() {
        cfg.suffix = args.suffix;
    }
    if let Some(extra) = &args.extra_args {
        cfg.extra_args = extra.split_whitespace().map(String::from).collect();
    }

    let fileset = match (&args.bfile, &args.bed, &args.bim, &args.fam) {
        (Some(stem), None, None, None) => BedFileset::from_prefix(stem)?,
        (None, Some(bed), Some(bim), Some(fam)) => BedFileset::from_parts(bed, bim, fam)?,
        _ => bail!("Specify either --bfile or all of --bed, --bim, --fam"),
    };

    let stage = ExtractStage {
        meta: SampleMeta::new(args.sampleset),
        fileset,
        variant_list: args.extract,
    };

    if args.dry_run {
        let (_, argv) = stage.wrapped_command(&cfg, &args.workdir);
        println!("{}", exec::display(&argv));
        return Ok(());
    }

    let outputs = stage.run(&cfg, &args.workdir)?;
    info!(
        "Extraction complete: {}, {}",
        outputs.bed.display(),
        outputs.bim.display()
    );
    Ok(())
}
