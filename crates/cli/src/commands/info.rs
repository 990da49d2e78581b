use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;
use tsprep_sim::base::IndividualId;
use tsprep_sim::pipeline::next_mutation_id;
use tsprep_sim::pipeline::partition::individual_population;
use tsprep_sim::storage::trees;

pub fn show_info(source: &Path) -> Result<()> {
    let graph = trees::load(source)
        .with_context(|| format!("Failed to load graph from {}", source.display()))?;

    let mut counts: BTreeMap<Option<usize>, usize> = BTreeMap::new();
    for i in 0..graph.num_individuals() {
        let pop = individual_population(&graph, IndividualId(i)).map(|p| p.index());
        *counts.entry(pop).or_default() += 1;
    }

    println!("\n📊 Graph Information");
    println!("{}", "=".repeat(50));
    println!("Sequence length: {}", graph.sequence_length());
    println!("Nodes: {}", graph.num_nodes());
    println!("Samples: {}", graph.samples().len());
    println!("Edges: {}", graph.edges().len());
    println!("Individuals: {}", graph.num_individuals());
    println!("Sites: {}", graph.sites().len());
    println!("Mutations: {}", graph.num_mutations());

    println!("\n🌍 Populations");
    for (id, population) in graph.populations().iter().enumerate() {
        let name = population.metadata.name.as_deref().unwrap_or("-");
        let count = counts.get(&Some(id)).copied().unwrap_or(0);
        println!("  • {name} (ID: {id}): {count} individuals");
    }
    if let Some(&unassigned) = counts.get(&None) {
        println!("  • (no population): {unassigned} individuals");
    }

    let next_id = next_mutation_id(&graph).context("Failed to read mutation identifiers")?;
    println!("\nNext free mutation identifier: {next_id}");

    Ok(())
}
