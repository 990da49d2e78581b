//! Reduction of a graph to the ancestry of a chosen sample set.
//!
//! Ancestral segments are propagated from the samples towards the roots,
//! visiting parents youngest first. At each parent the children's segments
//! are intersected with the parent's edges and swept left to right: where two
//! or more segments overlap the parent is a coalescence and is kept; where a
//! single segment passes through, the parent is kept only with `keep_unary`.
//! A segment that already subtends every sample has reached its most recent
//! common ancestor and goes no further.

use super::{EdgeRecord, Graph, IndividualRecord, MutationRecord, NodeRecord, SiteRecord};
use crate::base::{IndividualId, NodeId, SiteId};
use crate::errors::PipelineError;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct Segment {
    left: f64,
    right: f64,
    /// Output node carrying this stretch of ancestry.
    node: NodeId,
    /// Samples below `node` on this stretch.
    samples: usize,
}

fn push_segment(segments: &mut Vec<Segment>, seg: Segment) {
    if let Some(last) = segments.last_mut() {
        if last.node == seg.node && last.samples == seg.samples && last.right == seg.left {
            last.right = seg.right;
            return;
        }
    }
    segments.push(seg);
}

/// Reduce `graph` to the ancestry of `samples`.
///
/// `samples` must be strictly ascending. Samples become output nodes
/// `0..samples.len()` in the given order; retained ancestors follow in the
/// order they are created. Individuals referenced by retained nodes are kept
/// in their original order, the population table is kept unchanged, and
/// mutations are moved onto the retained node that carries their ancestry
/// (or dropped, along with sites left without mutations).
pub fn simplify(
    graph: &Graph,
    samples: &[NodeId],
    keep_unary: bool,
) -> Result<Graph, PipelineError> {
    let n = graph.num_nodes();
    if let Some(w) = samples.windows(2).find(|w| w[0] >= w[1]) {
        return Err(PipelineError::State(format!(
            "sample set must be strictly ascending, found {} before {}",
            w[0], w[1]
        )));
    }
    if let Some(bad) = samples.iter().find(|s| s.index() >= n) {
        return Err(PipelineError::State(format!(
            "sample node {bad} does not exist (graph has {n} nodes)"
        )));
    }

    let input_nodes = graph.nodes();
    let length = graph.sequence_length();

    let mut is_sample = vec![false; n];
    let mut node_map: Vec<Option<NodeId>> = vec![None; n];
    let mut ancestry: Vec<Vec<Segment>> = vec![Vec::new(); n];
    let mut origin: Vec<usize> = Vec::with_capacity(samples.len());

    for &s in samples {
        let out = NodeId(origin.len());
        origin.push(s.index());
        is_sample[s.index()] = true;
        node_map[s.index()] = Some(out);
        ancestry[s.index()].push(Segment {
            left: 0.0,
            right: length,
            node: out,
            samples: 1,
        });
    }
    let total = samples.len();

    let mut edges_by_parent: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, e) in graph.edges().iter().enumerate() {
        edges_by_parent[e.parent.index()].push(i);
    }
    let mut parents: Vec<usize> = (0..n).filter(|&u| !edges_by_parent[u].is_empty()).collect();
    parents.sort_by(|&a, &b| {
        input_nodes[a]
            .time
            .total_cmp(&input_nodes[b].time)
            .then(a.cmp(&b))
    });

    let mut out_edges: Vec<EdgeRecord> = Vec::new();

    for u in parents {
        let mut overlaps: Vec<Segment> = Vec::new();
        for &e in &edges_by_parent[u] {
            let edge = &graph.edges()[e];
            for seg in ancestry[edge.child.index()].iter().filter(|s| s.samples < total) {
                let left = seg.left.max(edge.left);
                let right = seg.right.min(edge.right);
                if left < right {
                    overlaps.push(Segment { left, right, ..*seg });
                }
            }
        }
        if overlaps.is_empty() {
            continue;
        }

        let mut points: Vec<f64> = overlaps.iter().flat_map(|s| [s.left, s.right]).collect();
        points.sort_by(f64::total_cmp);
        points.dedup();

        let mut parent_ancestry: Vec<Segment> = Vec::new();
        for w in points.windows(2) {
            let (left, right) = (w[0], w[1]);
            let covering: Vec<&Segment> = overlaps
                .iter()
                .filter(|s| s.left <= left && s.right >= right)
                .collect();
            if covering.is_empty() {
                continue;
            }
            let below: usize = covering.iter().map(|s| s.samples).sum();
            if covering.len() == 1 && !is_sample[u] && !keep_unary {
                let node = covering[0].node;
                let seg = Segment {
                    left,
                    right,
                    node,
                    samples: below,
                };
                push_segment(&mut parent_ancestry, seg);
                continue;
            }
            let v = match node_map[u] {
                Some(v) => v,
                None => {
                    let v = NodeId(origin.len());
                    origin.push(u);
                    node_map[u] = Some(v);
                    v
                }
            };
            for child in covering {
                out_edges.push(EdgeRecord {
                    left,
                    right,
                    parent: v,
                    child: child.node,
                });
            }
            if !is_sample[u] {
                let seg = Segment {
                    left,
                    right,
                    node: v,
                    samples: below,
                };
                push_segment(&mut parent_ancestry, seg);
            }
        }
        if !is_sample[u] {
            ancestry[u] = parent_ancestry;
        }
    }

    // Individuals referenced by retained nodes, in original order.
    let mut individual_map: Vec<Option<IndividualId>> = vec![None; graph.num_individuals()];
    let mut referenced: Vec<usize> = origin
        .iter()
        .filter_map(|&u| input_nodes[u].individual.map(|i| i.index()))
        .collect();
    referenced.sort_unstable();
    referenced.dedup();
    let mut out_individuals: Vec<IndividualRecord> = Vec::with_capacity(referenced.len());
    for old in referenced {
        individual_map[old] = Some(IndividualId(out_individuals.len()));
        out_individuals.push(IndividualRecord {
            nodes: Vec::new(),
            population: graph.individuals()[old].population,
        });
    }

    let out_nodes: Vec<NodeRecord> = origin
        .iter()
        .enumerate()
        .map(|(new, &u)| {
            let input = &input_nodes[u];
            let individual = input.individual.and_then(|i| individual_map[i.index()]);
            if let Some(ind) = individual {
                out_individuals[ind.index()].nodes.push(NodeId(new));
            }
            NodeRecord {
                time: input.time,
                is_sample: is_sample[u],
                population: input.population,
                individual,
            }
        })
        .collect();

    // Squash edges that are contiguous along the genome.
    out_edges.sort_by(|a, b| {
        a.parent
            .cmp(&b.parent)
            .then(a.child.cmp(&b.child))
            .then(a.left.total_cmp(&b.left))
    });
    let mut squashed: Vec<EdgeRecord> = Vec::with_capacity(out_edges.len());
    for e in out_edges {
        match squashed.last_mut() {
            Some(last)
                if last.parent == e.parent && last.child == e.child && last.right == e.left =>
            {
                last.right = e.right;
            }
            _ => squashed.push(e),
        }
    }

    // Mutations follow the ancestry of the node they sit on.
    let mut site_map: Vec<Option<SiteId>> = vec![None; graph.sites().len()];
    let mut out_sites: Vec<SiteRecord> = Vec::new();
    let mut out_mutations: Vec<MutationRecord> = Vec::new();
    for m in graph.mutations() {
        let position = graph.sites()[m.site.index()].position;
        let Some(seg) = ancestry[m.node.index()]
            .iter()
            .find(|s| s.left <= position && position < s.right)
        else {
            continue;
        };
        let site = match site_map[m.site.index()] {
            Some(s) => s,
            None => {
                let s = SiteId(out_sites.len());
                out_sites.push(graph.sites()[m.site.index()].clone());
                site_map[m.site.index()] = Some(s);
                s
            }
        };
        out_mutations.push(MutationRecord {
            site,
            node: seg.node,
            ..m.clone()
        });
    }

    debug!(
        samples = samples.len(),
        nodes_in = n,
        nodes_out = out_nodes.len(),
        edges_out = squashed.len(),
        keep_unary,
        "Simplified graph"
    );

    let mut out = Graph::from_tables(
        length,
        out_nodes,
        squashed,
        out_individuals,
        graph.populations().to_vec(),
        Vec::new(),
        Vec::new(),
    );
    out.sort_edges();
    out.set_sites_and_mutations(out_sites, out_mutations);
    Ok(out)
}
