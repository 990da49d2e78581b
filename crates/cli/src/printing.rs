use std::path::Path;
use tsprep_sim::pipeline::{PipelineConfig, PopulationMode, RunRecord};

fn pinned_or_random<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "Random".to_string(), |v| v.to_string())
}

pub fn print_parameters(config: &PipelineConfig) {
    println!("📋 Run Configuration");
    println!("  • Source: {} [--source]", config.source.display());
    println!(
        "  • Output prefix: {} [--dest_prefix]",
        config.output.dest_prefix.display()
    );
    println!("  • Mutation rate: {:.2e} [--mu]", config.mutation_rate);
    println!(
        "  • Outputs: VCF {} [--vcf], .trees {} [--tree]",
        if config.output.vcf { "yes" } else { "no" },
        if config.output.trees { "yes" } else { "no" }
    );

    println!("\n🌳 Recapitation");
    if config.recapitation.enabled {
        let params = &config.recapitation.params;
        println!(
            "  • Recombination rate: {:.2e} [--recomb]",
            params.recombination_rate
        );
        println!("  • Ancestral Ne: {} [--ne]", params.ancestral_ne);
        println!(
            "  • Seed: {} [--recap_seed]",
            pinned_or_random(config.recapitation.seed)
        );
    } else {
        println!("  • Skipped [--norecap]");
    }

    let mode = match &config.mode {
        PopulationMode::Global { .. } => "global",
        PopulationMode::Stratified { .. } => "stratified",
    };
    println!("\n🎲 Sampling ({mode})");
    if !config.random {
        println!("  • All individuals kept [--random not set]");
    }
    for (index, group) in config.mode.groups().iter().enumerate() {
        if config.random {
            println!(
                "  • {}: {} genome copies, seed {}",
                group.name,
                pinned_or_random(group.sample_size),
                pinned_or_random(config.mode.group_seed(index))
            );
        } else {
            println!("  • {}", group.name);
        }
    }
}

pub fn print_summary(record: &RunRecord, run_log: Option<&Path>) {
    println!("\n✓ Run complete!");
    println!("  Next mutation identifier was: {}", record.next_mutation_id);

    println!("\n🔑 Seeds");
    for s in &record.seeds {
        let origin = if s.pinned { "pinned" } else { "generated" };
        println!("  • {}: {} ({origin})", s.stage, s.seed);
    }

    println!("\n🧍 Selected nodes");
    for (group, set) in &record.samples {
        println!("  • {group}: {} nodes", set.len());
    }
    for group in &record.skipped_groups {
        println!("  • {group}: skipped (no samples)");
    }

    println!("\n📁 Outputs");
    if record.outputs.is_empty() {
        println!("  • none (use --vcf and/or --tree)");
    }
    for path in &record.outputs {
        println!("  • {}", path.display());
    }
    if let Some(path) = run_log {
        println!("  • {} (run log)", path.display());
    }
}
