//! One end-to-end run: load, complete ancestry, subsample, reduce, overlay
//! mutations, export.

use super::config::PipelineConfig;
use super::export::{export, ExportRequest};
use super::ledger::{SeedLedger, SeedRecord, Stage};
use super::mutation_ids::next_mutation_id;
use super::partition::{all_individuals, partition};
use super::reduce::reduce;
use super::subsample::{group_nodes, subsample};
use super::SampleSet;
use crate::base::{IndividualId, MutationId};
use crate::engine::Engine;
use crate::errors::{PipelineError, Result};
use crate::evolution::SlimMutationModel;
use crate::graph::Graph;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Mutation type stamped on overlaid mutations.
const OVERLAY_MUTATION_TYPE: u32 = 0;

/// What a run did, for logging and replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub config: PipelineConfig,
    /// Every seed handed out, in draw order.
    pub seeds: Vec<SeedRecord>,
    /// Selected nodes of the source graph, per group.
    pub samples: BTreeMap<String, SampleSet>,
    /// First identifier handed to the mutation overlay.
    pub next_mutation_id: MutationId,
    pub outputs: Vec<PathBuf>,
    pub skipped_groups: Vec<String>,
}

impl RunRecord {
    /// Write the record as pretty JSON to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| PipelineError::io(path, e.into()))?;
        writer
            .write_all(b"\n")
            .and_then(|()| writer.flush())
            .map_err(|e| PipelineError::io(path, e))
    }
}

/// Run the pipeline described by `config`.
///
/// Seeds are drawn from `ledger` in a fixed order: ancestry completion (if
/// enabled), one subsample draw per non-empty group (if subsampling), the
/// mutation overlay, and nucleotide generation (if a variant matrix is
/// written).
pub fn run<E: Engine + ?Sized, R: RngCore>(
    config: &PipelineConfig,
    engine: &E,
    ledger: &mut SeedLedger<R>,
) -> Result<RunRecord> {
    config.validate()?;

    info!("Loading graph from {}", config.source.display());
    let mut graph = engine.load(&config.source)?;
    info!(
        nodes = graph.num_nodes(),
        individuals = graph.num_individuals(),
        mutations = graph.num_mutations(),
        "Graph loaded"
    );

    if config.recapitation.enabled {
        let seed = ledger.next_seed(Stage::Recapitation, config.recapitation.seed);
        graph = engine.recapitate(&graph, &config.recapitation.params, seed)?;
        info!("Recapitation completed.");
    } else {
        info!("Skipping recapitation.");
    }

    let (graph, samples) = select(config, engine, ledger, graph)?;

    let next_id = next_mutation_id(&graph)?;
    let seed = ledger.next_seed(Stage::MutationOverlay, config.mutation_seed);
    let model = SlimMutationModel::new(OVERLAY_MUTATION_TYPE, next_id);
    info!("Overlaying mutations starting at identifier {next_id}");
    let graph = engine.sim_mutations(&graph, config.mutation_rate, &model, true, seed)?;

    let nucleotide_seed = config
        .output
        .vcf
        .then(|| ledger.next_seed(Stage::Nucleotides, config.nucleotide_seed));
    let group_names: Vec<String> = if config.mode.is_stratified() {
        config.mode.groups().iter().map(|g| g.name.clone()).collect()
    } else {
        Vec::new()
    };
    let request = ExportRequest {
        prefix: &config.output.dest_prefix,
        trees: config.output.trees,
        vcf: config.output.vcf,
        groups: &group_names,
    };
    let outcome = export(engine, &graph, &request, nucleotide_seed)?;

    Ok(RunRecord {
        config: config.clone(),
        seeds: ledger.records().to_vec(),
        samples,
        next_mutation_id: next_id,
        outputs: outcome.written,
        skipped_groups: outcome.skipped_groups,
    })
}

/// Pick the nodes to keep for each group and reduce the graph to them.
fn select<E: Engine + ?Sized, R: RngCore>(
    config: &PipelineConfig,
    engine: &E,
    ledger: &mut SeedLedger<R>,
    graph: Graph,
) -> Result<(Graph, BTreeMap<String, SampleSet>)> {
    let groups = config.mode.groups();
    let candidates: BTreeMap<String, BTreeSet<IndividualId>> = if config.mode.is_stratified() {
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        partition(&graph, &names)
    } else {
        groups
            .iter()
            .map(|g| (g.name.clone(), all_individuals(&graph)))
            .collect()
    };

    let mut samples = BTreeMap::new();
    for (index, plan) in groups.iter().enumerate() {
        let members = candidates.get(&plan.name).cloned().unwrap_or_default();
        if members.is_empty() {
            warn!("No individuals found for population {}, skipping.", plan.name);
            continue;
        }
        let set = if config.random {
            let stage = Stage::Subsample {
                group: plan.name.clone(),
            };
            let seed = ledger.next_seed(stage, config.mode.group_seed(index));
            subsample(&graph, &plan.name, &members, plan.sample_size, seed)?
        } else {
            group_nodes(&graph, &members)?
        };
        info!(
            "Selected {} nodes from {} individuals of {}",
            set.len(),
            members.len(),
            plan.name
        );
        samples.insert(plan.name.clone(), set);
    }

    if config.mode.is_stratified() {
        let union = SampleSet::union(samples.values());
        if union.is_empty() {
            return Err(PipelineError::State(
                "no population group has any individuals to keep".to_string(),
            ));
        }
        // Kept unary nodes serve the per-group reductions at export.
        let reduced = reduce(engine, &graph, &union, true)?;
        Ok((reduced, samples))
    } else if config.random {
        let set = samples.values().next().cloned().unwrap_or_default();
        if set.is_empty() {
            return Err(PipelineError::State(
                "the subsample selected no individuals".to_string(),
            ));
        }
        let reduced = reduce(engine, &graph, &set, false)?;
        Ok((reduced, samples))
    } else {
        Ok((graph, samples))
    }
}
