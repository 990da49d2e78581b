//! Export routing: which files get written, in which order, with which
//! sample names.
//!
//! Output order for a prefix `out` is `out.vcf`, `out.trees`, then one
//! `out_<group>.vcf` per group when groups are given. Variant matrices always
//! clamp positions to 1 and write isolated samples as present.

use super::partition::individual_population;
use crate::base::{NodeId, PopulationId, Seed};
use crate::engine::Engine;
use crate::errors::{PipelineError, Result};
use crate::graph::Graph;
use crate::storage::{AlleleTable, VcfLayout, VcfOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What to write for one run.
#[derive(Debug, Clone)]
pub struct ExportRequest<'a> {
    pub prefix: &'a Path,
    pub trees: bool,
    pub vcf: bool,
    /// Population groups that get a variant matrix of their own.
    pub groups: &'a [String],
}

/// Files written by `export` and groups it skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportOutcome {
    pub written: Vec<PathBuf>,
    pub skipped_groups: Vec<String>,
}

/// `prefix` with `suffix` appended to its final component.
pub fn output_path(prefix: &Path, suffix: &str) -> PathBuf {
    let mut path = prefix.as_os_str().to_owned();
    path.push(suffix);
    PathBuf::from(path)
}

/// Column names for the combined matrix: `tsk_<k>indv`.
fn combined_names(layout: &VcfLayout) -> Vec<String> {
    (0..layout.len()).map(|k| format!("tsk_{k}indv")).collect()
}

/// Column names for one group's matrix: `<group>_ind<k>`.
fn group_names(group: &str, layout: &VcfLayout) -> Vec<String> {
    (0..layout.len()).map(|k| format!("{group}_ind{k}")).collect()
}

fn node_population(graph: &Graph, node: NodeId) -> Option<PopulationId> {
    let record = graph.node(node)?;
    record
        .individual
        .and_then(|ind| individual_population(graph, ind))
        .or(record.population)
}

/// Sample nodes of `graph` whose population is named `group`, ascending.
pub fn group_samples(graph: &Graph, group: &str) -> Vec<NodeId> {
    graph
        .samples()
        .into_iter()
        .filter(|&n| {
            node_population(graph, n).and_then(|p| graph.population_name(p)) == Some(group)
        })
        .collect()
}

fn write_matrix<E: Engine + ?Sized>(
    engine: &E,
    graph: &Graph,
    alleles: &AlleleTable,
    names: impl FnOnce(&VcfLayout) -> Vec<String>,
    path: &Path,
) -> Result<()> {
    let layout = VcfLayout::new(graph);
    let names = names(&layout);
    let layout = layout.with_names(names)?;
    info!("Writing VCF file: {}", path.display());
    engine.write_vcf(graph, alleles, &layout, &VcfOptions::export(), path)?;
    info!("VCF file written: {}", path.display());
    Ok(())
}

/// Write the requested outputs of `graph`.
///
/// `nucleotide_seed` drives allele generation and must be given whenever a
/// variant matrix is requested. Alleles are generated once from the full
/// graph, so every matrix of a run agrees on its bases.
pub fn export<E: Engine + ?Sized>(
    engine: &E,
    graph: &Graph,
    request: &ExportRequest<'_>,
    nucleotide_seed: Option<Seed>,
) -> Result<ExportOutcome> {
    let mut outcome = ExportOutcome::default();

    let alleles = if request.vcf {
        let seed = nucleotide_seed.ok_or_else(|| {
            PipelineError::Configuration(
                "a nucleotide seed is required to write variant matrices".to_string(),
            )
        })?;
        Some(engine.generate_alleles(graph, seed))
    } else {
        None
    };

    if let Some(alleles) = &alleles {
        let path = output_path(request.prefix, ".vcf");
        write_matrix(engine, graph, alleles, combined_names, &path)?;
        outcome.written.push(path);
    }

    if request.trees {
        let path = output_path(request.prefix, ".trees");
        info!("Writing .trees file: {}", path.display());
        engine.dump(graph, &path)?;
        info!(".trees file written: {}", path.display());
        outcome.written.push(path);
    }

    if let Some(alleles) = &alleles {
        for group in request.groups {
            let nodes = group_samples(graph, group);
            if nodes.is_empty() {
                warn!("No samples found for population {group}, skipping.");
                outcome.skipped_groups.push(group.clone());
                continue;
            }
            let sub = engine.simplify(graph, &nodes, false)?;
            let path = output_path(request.prefix, &format!("_{group}.vcf"));
            write_matrix(
                engine,
                &sub,
                alleles,
                |layout| group_names(group, layout),
                &path,
            )?;
            outcome.written.push(path);
        }
    }

    Ok(outcome)
}
