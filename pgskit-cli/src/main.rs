//! pgskit: target-genome preparation stages for polygenic scoring.
//!
//! CLI entry point using clap for argument parsing.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pgskit",
    version,
    about = "Prepare target genotype data for polygenic score calculation",
    long_about = "Stages for polygenic-scoring pipelines: extract a variant \
                   subset from PLINK bed/bim/fam filesets with plink2, and \
                   match scoring-file variants against target variants."
)]
struct Cli {
    /// Number of threads for the local pool and the external tool
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a variant subset from a PLINK fileset with plink2
    Extract(commands::extract::ExtractArgs),

    /// Match scoring-file variants against target variants
    MatchVariants(commands::match_variants::MatchVariantsArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    // Set up thread pool
    let threads = cli.threads.unwrap_or(1);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();

    tracing::info!("pgskit v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Using {} threads", threads);

    match cli.command {
        Commands::Extract(args) => commands::extract::run(args, cli.threads),
        Commands::MatchVariants(args) => commands::match_variants::run(args),
    }
}
