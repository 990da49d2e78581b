use anyhow::{Context, Result};
use std::path::Path;
use tsprep_sim::engine::NativeEngine;
use tsprep_sim::evolution::RecapitationParams;
use tsprep_sim::pipeline::{
    self, GroupPlan, OutputConfig, PipelineConfig, PopulationMode, RecapitationConfig, SeedLedger,
    GLOBAL_GROUP,
};
use tsprep_sim::{PipelineError, Seed};

use crate::args::{CommonArgs, StratifiedArgs};
use crate::printing::{print_parameters, print_summary};

fn seed(value: Option<u64>) -> Result<Option<Seed>, PipelineError> {
    value.map(Seed::new).transpose()
}

fn build_config(
    args: &CommonArgs,
    mode: PopulationMode,
    recapitate: bool,
) -> Result<PipelineConfig, PipelineError> {
    Ok(PipelineConfig {
        source: args.source.clone(),
        mode,
        random: args.random,
        mutation_rate: args.mu,
        recapitation: RecapitationConfig {
            enabled: recapitate,
            params: RecapitationParams {
                recombination_rate: args.recomb,
                ancestral_ne: args.ne,
            },
            seed: seed(args.recap_seed)?,
        },
        output: OutputConfig {
            dest_prefix: args.dest_prefix.clone(),
            vcf: args.vcf,
            trees: args.tree,
        },
        mutation_seed: seed(args.mut_seed)?,
        nucleotide_seed: seed(args.nuc_seed)?,
    })
}

pub fn run_global(args: &CommonArgs) -> Result<()> {
    let group = GroupPlan::new(GLOBAL_GROUP)
        .with_sample_size(args.sample_size)
        .with_seed(seed(args.seed)?);
    let config = build_config(args, PopulationMode::Global { group }, true)?;
    execute(&config, args.run_log.as_deref())
}

pub fn run_stratified(args: &StratifiedArgs) -> Result<()> {
    let common = &args.common;
    let [first, second] = args.groups.as_slice() else {
        return Err(PipelineError::Configuration(format!(
            "--groups takes exactly two population names, got {}",
            args.groups.len()
        ))
        .into());
    };
    let groups = vec![
        GroupPlan::new(first)
            .with_sample_size(common.sample_size)
            .with_seed(seed(common.seed)?),
        GroupPlan::new(second)
            .with_sample_size(args.sample_size_p2)
            .with_seed(seed(args.seed_p2)?),
    ];
    let config = build_config(common, PopulationMode::Stratified { groups }, !args.norecap)?;
    execute(&config, common.run_log.as_deref())
}

fn execute(config: &PipelineConfig, run_log: Option<&Path>) -> Result<()> {
    println!("🧬 tsprep - Processing Genealogy");
    println!("============================================\n");

    config.validate().context("Invalid arguments")?;
    print_parameters(config);
    println!();

    let mut ledger = SeedLedger::from_entropy();
    let record = pipeline::run(config, &NativeEngine, &mut ledger).context("Pipeline run failed")?;

    if let Some(path) = run_log {
        record
            .save(path)
            .with_context(|| format!("Failed to write run log {}", path.display()))?;
    }

    print_summary(&record, run_log);
    Ok(())
}
