//! Uniform subsampling of diploid individuals.
//!
//! A target is counted in genome copies. Each drawn individual contributes
//! both of its nodes, so `target / 2` individuals are drawn and an odd target
//! is rounded down.

use super::SampleSet;
use crate::base::{IndividualId, NodeId, Seed};
use crate::errors::{PipelineError, Result};
use crate::graph::Graph;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Both nodes of `id`, or a `State` error if it is not diploid.
fn diploid_nodes(graph: &Graph, id: IndividualId) -> Result<[NodeId; 2]> {
    let ind = graph
        .individual(id)
        .ok_or_else(|| PipelineError::State(format!("individual {id} does not exist")))?;
    match ind.nodes.as_slice() {
        &[a, b] => Ok([a, b]),
        nodes => Err(PipelineError::State(format!(
            "individual {id} owns {} nodes, expected 2",
            nodes.len()
        ))),
    }
}

/// Draw `target / 2` individuals of `candidates` without replacement and
/// expand them to their nodes.
///
/// The draw indexes the candidates in ascending order, so a fixed seed over
/// the same candidates always selects the same individuals.
pub fn subsample(
    graph: &Graph,
    group: &str,
    candidates: &BTreeSet<IndividualId>,
    target: Option<usize>,
    seed: Seed,
) -> Result<SampleSet> {
    let target = target.ok_or_else(|| {
        PipelineError::Configuration(format!(
            "a sample size is required to subsample group '{group}'"
        ))
    })?;
    if target % 2 == 1 {
        warn!(
            "Sample size {target} for group '{group}' is odd; drawing {} individuals ({} nodes)",
            target / 2,
            target - 1
        );
    }
    let draw = target / 2;
    if draw > candidates.len() {
        return Err(PipelineError::InsufficientSamples {
            group: group.to_string(),
            requested: draw,
            available: candidates.len(),
        });
    }

    let pool: Vec<IndividualId> = candidates.iter().copied().collect();
    let mut rng = seed.rng();
    let picked = rand::seq::index::sample(&mut rng, pool.len(), draw);

    let mut nodes = Vec::with_capacity(2 * draw);
    for i in picked.iter() {
        nodes.extend(diploid_nodes(graph, pool[i])?);
    }
    debug!(group, individuals = draw, "Drew subsample");
    Ok(SampleSet::from_nodes(nodes))
}

/// Every node of every individual in `members`.
pub fn group_nodes(graph: &Graph, members: &BTreeSet<IndividualId>) -> Result<SampleSet> {
    let mut nodes = Vec::with_capacity(2 * members.len());
    for &id in members {
        let ind = graph
            .individual(id)
            .ok_or_else(|| PipelineError::State(format!("individual {id} does not exist")))?;
        nodes.extend_from_slice(&ind.nodes);
    }
    Ok(SampleSet::from_nodes(nodes))
}
