//! Mutation overlay under the stacked-identifier model.
//!
//! New mutations are scattered over the branches of the graph: every edge
//! receives a Poisson number of events with mean `rate * span * branch
//! length`, each at an integer position inside the edge and a uniform time
//! along the branch. Each new mutation gets the next versioned identifier and
//! its derived state is the identifier stack it inherits at that position
//! with its own identifier pushed on top (`"3"` then `"3,17"`).

use crate::base::{MutationId, NodeId, Seed, SiteId};
use crate::errors::PipelineError;
use crate::graph::{Graph, MutationRecord, ParentIndex, SiteRecord};
use rand::Rng;
use rand_distr::{Distribution, Poisson};
use std::collections::HashMap;
use tracing::debug;

/// Allele encoding for new mutations: the mutation type stamped on every new
/// row and the first identifier to hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlimMutationModel {
    pub mutation_type: u32,
    pub next_id: MutationId,
}

impl SlimMutationModel {
    pub fn new(mutation_type: u32, next_id: MutationId) -> Self {
        Self {
            mutation_type,
            next_id,
        }
    }
}

#[derive(Debug, Clone)]
struct Pending {
    position: f64,
    node: NodeId,
    time: f64,
}

/// Identifier stack inherited by `node` at `position` just before `time`.
fn inherited_state<'a>(
    node: NodeId,
    time: f64,
    position: f64,
    placed: &'a [(NodeId, f64, String)],
    ancestral_state: &'a str,
    parents: &ParentIndex,
) -> &'a str {
    let mut current = node;
    loop {
        let youngest = placed
            .iter()
            .filter(|(n, t, _)| *n == current && *t > time)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((_, _, state)) = youngest {
            return state;
        }
        match parents.parent_of(current, position) {
            Some(p) => current = p,
            None => return ancestral_state,
        }
    }
}

/// Overlay new mutations on `graph` at `rate` per base per generation.
///
/// With `keep` every existing site and mutation is retained unchanged;
/// otherwise they are discarded first. New identifiers are allocated from
/// `model.next_id` in (position, oldest first, node) order.
pub fn sim_mutations(
    graph: &Graph,
    rate: f64,
    model: &SlimMutationModel,
    keep: bool,
    seed: Seed,
) -> Result<Graph, PipelineError> {
    if !(rate.is_finite() && rate >= 0.0) {
        return Err(PipelineError::Configuration(format!(
            "mutation rate must be a non-negative number, got {rate}"
        )));
    }
    let mut rng = seed.rng();
    let length = graph.sequence_length();
    let nodes = graph.nodes();

    let mut pending = Vec::new();
    for edge in graph.edges() {
        let branch = nodes[edge.parent.index()].time - nodes[edge.child.index()].time;
        let lambda = rate * (edge.right - edge.left) * branch;
        if lambda <= 0.0 {
            continue;
        }
        let first = edge.left.ceil() as u64;
        let end = edge.right.ceil().min(length.ceil()) as u64;
        if first >= end {
            continue;
        }
        let poisson = Poisson::new(lambda).map_err(|e| {
            PipelineError::State(format!("invalid mutation intensity {lambda}: {e}"))
        })?;
        let count = poisson.sample(&mut rng) as u64;
        let child_time = nodes[edge.child.index()].time;
        let parent_time = nodes[edge.parent.index()].time;
        for _ in 0..count {
            pending.push(Pending {
                position: rng.random_range(first..end) as f64,
                node: edge.child,
                time: rng.random_range(child_time..parent_time),
            });
        }
    }
    pending.sort_by(|a, b| {
        a.position
            .total_cmp(&b.position)
            .then(b.time.total_cmp(&a.time))
            .then(a.node.cmp(&b.node))
    });

    let (mut sites, mut mutations) = if keep {
        (graph.sites().to_vec(), graph.mutations().to_vec())
    } else {
        (Vec::new(), Vec::new())
    };
    let mut site_at: HashMap<u64, SiteId> = sites
        .iter()
        .enumerate()
        .map(|(i, s)| (s.position.to_bits(), SiteId(i)))
        .collect();
    let mut placed: HashMap<u64, Vec<(NodeId, f64, String)>> = HashMap::new();
    for m in &mutations {
        placed
            .entry(sites[m.site.index()].position.to_bits())
            .or_default()
            .push((m.node, m.time, m.derived_state.clone()));
    }

    let parents = graph.parent_index();
    let mut next = model.next_id;
    let added = pending.len();
    for p in pending {
        let key = p.position.to_bits();
        let site = *site_at.entry(key).or_insert_with(|| {
            sites.push(SiteRecord {
                position: p.position,
                ancestral_state: String::new(),
            });
            SiteId(sites.len() - 1)
        });
        let at_site = placed.entry(key).or_default();
        let inherited = inherited_state(
            p.node,
            p.time,
            p.position,
            at_site.as_slice(),
            &sites[site.index()].ancestral_state,
            &parents,
        );
        let derived_state = if inherited.is_empty() {
            next.to_string()
        } else {
            format!("{inherited},{next}")
        };
        at_site.push((p.node, p.time, derived_state.clone()));
        mutations.push(MutationRecord {
            site,
            node: p.node,
            time: p.time,
            derived_state,
            mutation_type: model.mutation_type,
        });
        next = next.checked_next().ok_or_else(|| {
            PipelineError::State(format!("mutation identifier overflow after {next}"))
        })?;
    }

    debug!(
        added,
        first_id = model.next_id.0,
        kept = keep,
        "Mutation overlay finished"
    );
    let mut out = graph.clone();
    out.set_sites_and_mutations(sites, mutations);
    Ok(out)
}
