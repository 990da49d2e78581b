mod args;
mod commands;
pub mod defaults;
mod printing;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use args::{CommonArgs, StratifiedArgs};
use commands::{info, run};

/// tsprep: post-processing for simulated genealogies
///
/// Completes the ancestry of a forward-simulated .trees file, draws a
/// reproducible subsample of diploid individuals, overlays new mutations and
/// writes .trees and VCF output.
#[derive(Parser, Debug)]
#[command(name = "tsprep")]
#[command(author, version, about = "Recapitate, subsample, mutate and export genealogies", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Treat every individual as one group.
    Global(CommonArgs),

    /// Subsample and export two named populations separately.
    ///
    /// Requires population metadata naming the groups (p1 and p2 by default).
    Stratified(Box<StratifiedArgs>),

    /// Show populations, table sizes and the next free mutation identifier.
    Info {
        /// Input .trees file
        #[arg(long)]
        source: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| defaults::LOG_FILTER.into()),
        )
        .with_writer(std::io::stdout)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Global(args) => {
            run::run_global(&args)?;
        }
        Commands::Stratified(args) => {
            run::run_stratified(&args)?;
        }
        Commands::Info { source } => {
            info::show_info(&source)?;
        }
    }

    Ok(())
}
