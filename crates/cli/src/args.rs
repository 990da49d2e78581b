use clap::Args;
use std::path::PathBuf;

use crate::defaults;

/// Flags shared by the `global` and `stratified` commands.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Input .trees file
    #[arg(long)]
    pub source: PathBuf,

    /// Prefix for output files (`<prefix>.vcf`, `<prefix>.trees`, ...)
    #[arg(long = "dest_prefix")]
    pub dest_prefix: PathBuf,

    /// Mutation rate per base per generation
    #[arg(long)]
    pub mu: f64,

    /// Sample a random subset of diploid individuals
    #[arg(long)]
    pub random: bool,

    /// Number of genome copies to draw (two per individual; required with --random)
    #[arg(long = "sample_size")]
    pub sample_size: Option<usize>,

    /// Seed for the subsample draw
    ///
    /// In stratified mode it seeds the first group; later groups without their
    /// own seed derive theirs from it.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write VCF output
    #[arg(long)]
    pub vcf: bool,

    /// Write .trees output
    #[arg(long)]
    pub tree: bool,

    /// Recombination rate per base per generation
    #[arg(long, default_value_t = defaults::RECOMB_RATE)]
    pub recomb: f64,

    /// Ancestral effective population size
    #[arg(long, default_value_t = defaults::ANCESTRAL_NE)]
    pub ne: f64,

    /// Seed for recapitation
    #[arg(long = "recap_seed")]
    pub recap_seed: Option<u64>,

    /// Seed for the mutation overlay
    #[arg(long = "mut_seed")]
    pub mut_seed: Option<u64>,

    /// Seed for nucleotide generation at VCF export
    #[arg(long = "nuc_seed")]
    pub nuc_seed: Option<u64>,

    /// Write a JSON record of the run (config, seeds, selected nodes)
    #[arg(long = "run_log")]
    pub run_log: Option<PathBuf>,
}

/// Extra flags of the two-population command.
#[derive(Args, Debug, Clone)]
pub struct StratifiedArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Number of genome copies to draw from the second group
    #[arg(long = "sample_size_p2")]
    pub sample_size_p2: Option<usize>,

    /// Seed for the second group's subsample draw
    #[arg(long = "seed_p2")]
    pub seed_p2: Option<u64>,

    /// Do not recapitate before the mutation overlay
    #[arg(long)]
    pub norecap: bool,

    /// Population names of the two groups
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = [defaults::GROUP_P1.to_string(), defaults::GROUP_P2.to_string()]
    )]
    pub groups: Vec<String>,
}
