//! Ancestry completion ("recapitation").
//!
//! A forward simulation usually stops before every position of the genome has
//! found a single common ancestor, leaving several roots. Recapitation runs a
//! backwards-in-time coalescent with recombination over those root lineages:
//!
//! - with `k` lineages, pairs coalesce at total rate `k(k-1)/2 / (2 Ne)`;
//! - each lineage recombines at rate `r` per integer breakpoint strictly inside
//!   the extent of the material it still carries.
//!
//! A stretch of genome leaves the simulation as soon as a single lineage
//! carries it, so the run ends once every position has one ancestor. Waiting
//! times are exponential. Every coalescence creates a new node; the original
//! tables are never modified.

use crate::base::{NodeId, Seed};
use crate::errors::PipelineError;
use crate::graph::Graph;
use rand::Rng;
use rand_distr::{Distribution, Exp};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Parameters of the ancestral population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecapitationParams {
    /// Recombination rate per base per generation.
    pub recombination_rate: f64,
    /// Diploid effective size of the ancestral population.
    pub ancestral_ne: f64,
}

impl RecapitationParams {
    pub fn new(recombination_rate: f64, ancestral_ne: f64) -> Result<Self, PipelineError> {
        if !(recombination_rate.is_finite() && recombination_rate >= 0.0) {
            return Err(PipelineError::Configuration(format!(
                "recombination rate must be a non-negative number, got {recombination_rate}"
            )));
        }
        if !(ancestral_ne.is_finite() && ancestral_ne > 0.0) {
            return Err(PipelineError::Configuration(format!(
                "ancestral Ne must be positive, got {ancestral_ne}"
            )));
        }
        Ok(Self {
            recombination_rate,
            ancestral_ne,
        })
    }
}

#[derive(Debug, Clone)]
struct Lineage {
    node: NodeId,
    /// Disjoint, sorted intervals of ancestral material still in play.
    intervals: Vec<(f64, f64)>,
}

impl Lineage {
    /// Integer breakpoints strictly inside the lineage's extent.
    fn links(&self) -> u64 {
        match (self.intervals.first(), self.intervals.last()) {
            (Some(first), Some(last)) => {
                let lo = first.0.floor() as i64 + 1;
                let hi = last.1.ceil() as i64 - 1;
                (hi - lo + 1).max(0) as u64
            }
            _ => 0,
        }
    }

    fn first_link(&self) -> i64 {
        self.intervals
            .first()
            .map_or(0, |first| first.0.floor() as i64 + 1)
    }
}

/// Number of lineages carrying each stretch of the genome.
#[derive(Debug)]
struct Coverage {
    /// Contiguous pieces `(left, right, count)` spanning the whole genome.
    pieces: Vec<(f64, f64, usize)>,
}

impl Coverage {
    fn new(length: f64, lineages: &[Lineage]) -> Self {
        let mut coverage = Self {
            pieces: vec![(0.0, length, 0)],
        };
        for lineage in lineages {
            for &(l, r) in &lineage.intervals {
                for piece in coverage.range_mut(l, r) {
                    piece.2 += 1;
                }
            }
        }
        coverage.compact();
        coverage
    }

    fn split(&mut self, x: f64) {
        if let Some(i) = self.pieces.iter().position(|p| p.0 < x && x < p.1) {
            let (l, r, c) = self.pieces[i];
            self.pieces[i] = (l, x, c);
            self.pieces.insert(i + 1, (x, r, c));
        }
    }

    fn range_mut(
        &mut self,
        left: f64,
        right: f64,
    ) -> impl Iterator<Item = &mut (f64, f64, usize)> {
        self.split(left);
        self.split(right);
        self.pieces
            .iter_mut()
            .filter(move |p| p.0 >= left && p.1 <= right)
    }

    fn compact(&mut self) {
        self.pieces.dedup_by(|next, prev| {
            if prev.2 == next.2 && prev.1 == next.0 {
                prev.1 = next.1;
                true
            } else {
                false
            }
        });
    }

    /// Retire every stretch carried by a single lineage.
    fn retire_singletons(&mut self) -> Vec<(f64, f64)> {
        let mut retired = Vec::new();
        for piece in self.pieces.iter_mut().filter(|p| p.2 == 1) {
            piece.2 = 0;
            retired.push((piece.0, piece.1));
        }
        self.compact();
        merge_intervals(retired)
    }

    /// Record one coalescence over `[left, right)`.
    fn coalesce(&mut self, left: f64, right: f64) {
        for piece in self.range_mut(left, right) {
            piece.2 = piece.2.saturating_sub(1);
        }
    }
}

fn merge_intervals(mut intervals: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    intervals.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut merged: Vec<(f64, f64)> = Vec::with_capacity(intervals.len());
    for (l, r) in intervals {
        match merged.last_mut() {
            Some(last) if l <= last.1 => last.1 = last.1.max(r),
            _ => merged.push((l, r)),
        }
    }
    merged
}

/// `covered` subtracted from `material`; both sorted and disjoint.
fn subtract(material: &[(f64, f64)], covered: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut out = Vec::new();
    for &(l, r) in material {
        let mut start = l;
        for &(cl, cr) in covered {
            if cr <= start || cl >= r {
                continue;
            }
            if cl > start {
                out.push((start, cl));
            }
            start = start.max(cr);
            if start >= r {
                break;
            }
        }
        if start < r {
            out.push((start, r));
        }
    }
    out
}

/// Overlap of two sorted, disjoint interval lists.
fn intersect(a: &[(f64, f64)], b: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let left = a[i].0.max(b[j].0);
        let right = a[i].1.min(b[j].1);
        if left < right {
            out.push((left, right));
        }
        if a[i].1 < b[j].1 {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}

/// Root lineages of `graph`: for every sample or internal node, the part of
/// its ancestral material not covered by a parent edge.
fn root_lineages(graph: &Graph) -> Vec<Lineage> {
    let n = graph.num_nodes();
    let mut as_child: Vec<Vec<(f64, f64)>> = vec![Vec::new(); n];
    let mut as_parent: Vec<Vec<(f64, f64)>> = vec![Vec::new(); n];
    for e in graph.edges() {
        as_child[e.child.index()].push((e.left, e.right));
        as_parent[e.parent.index()].push((e.left, e.right));
    }

    let length = graph.sequence_length();
    let mut lineages = Vec::new();
    for (u, node) in graph.nodes().iter().enumerate() {
        let material = if node.is_sample {
            vec![(0.0, length)]
        } else {
            merge_intervals(std::mem::take(&mut as_parent[u]))
        };
        if material.is_empty() {
            continue;
        }
        let covered = merge_intervals(std::mem::take(&mut as_child[u]));
        let intervals = subtract(&material, &covered);
        if !intervals.is_empty() {
            lineages.push(Lineage {
                node: NodeId(u),
                intervals,
            });
        }
    }
    lineages
}

/// Drop retired material from every lineage, and lineages left with none.
fn retire(lineages: &mut Vec<Lineage>, retired: &[(f64, f64)]) {
    if retired.is_empty() {
        return;
    }
    for lineage in lineages.iter_mut() {
        lineage.intervals = subtract(&lineage.intervals, retired);
    }
    lineages.retain(|l| !l.intervals.is_empty());
}

/// Complete the ancestry of `graph` so every position has a single root.
pub fn recapitate(
    graph: &Graph,
    params: &RecapitationParams,
    seed: Seed,
) -> Result<Graph, PipelineError> {
    let mut lineages = root_lineages(graph);
    let mut coverage = Coverage::new(graph.sequence_length(), &lineages);
    retire(&mut lineages, &coverage.retire_singletons());
    if lineages.is_empty() {
        debug!("Graph already has a single root, nothing to recapitate");
        return Ok(graph.clone());
    }

    let mut rng = seed.rng();
    let mut out = graph.clone();
    let two_ne = 2.0 * params.ancestral_ne;
    let mut time = lineages
        .iter()
        .filter_map(|l| out.node(l.node).map(|n| n.time))
        .fold(f64::NEG_INFINITY, f64::max);
    let mut coalescences = 0usize;
    let mut recombinations = 0usize;

    // Every position still in play has at least two carriers.
    while lineages.len() > 1 {
        let k = lineages.len() as f64;
        let coal_rate = k * (k - 1.0) / 2.0 / two_ne;
        let total_links: u64 = lineages.iter().map(Lineage::links).sum();
        let rec_rate = params.recombination_rate * total_links as f64;
        let total_rate = coal_rate + rec_rate;

        let exp = Exp::new(total_rate).map_err(|e| {
            PipelineError::State(format!("invalid event rate {total_rate}: {e}"))
        })?;
        let wait: f64 = exp.sample(&mut rng);
        time += wait.max(f64::EPSILON * time.abs().max(1.0));

        if rng.random::<f64>() * total_rate < coal_rate {
            let picked = rand::seq::index::sample(&mut rng, lineages.len(), 2);
            let (i, j) = (picked.index(0), picked.index(1));
            let (hi, lo) = if i > j { (i, j) } else { (j, i) };
            let b = lineages.swap_remove(hi);
            let a = lineages.swap_remove(lo);

            let parent = out.add_node(time, false, None, None);
            for child in [&a, &b] {
                for &(l, r) in &child.intervals {
                    out.add_edge(l, r, parent, child.node);
                }
            }
            for (l, r) in intersect(&a.intervals, &b.intervals) {
                coverage.coalesce(l, r);
            }
            let mut intervals = a.intervals;
            intervals.extend(b.intervals);
            let merged = Lineage {
                node: parent,
                intervals: merge_intervals(intervals),
            };
            lineages.push(merged);
            retire(&mut lineages, &coverage.retire_singletons());
            coalescences += 1;
        } else {
            // Pick a breakpoint uniformly among all links.
            let mut target = rng.random_range(0..total_links);
            let mut chosen = lineages.len() - 1;
            for (idx, l) in lineages.iter().enumerate() {
                if target < l.links() {
                    chosen = idx;
                    break;
                }
                target -= l.links();
            }
            let lineage = &lineages[chosen];
            let x = (lineage.first_link() + target as i64) as f64;
            let mut left = Vec::new();
            let mut right = Vec::new();
            for &(l, r) in &lineage.intervals {
                if r <= x {
                    left.push((l, r));
                } else if l >= x {
                    right.push((l, r));
                } else {
                    left.push((l, x));
                    right.push((x, r));
                }
            }
            let node = lineage.node;
            lineages[chosen].intervals = left;
            lineages.push(Lineage {
                node,
                intervals: right,
            });
            recombinations += 1;
        }
    }

    debug!(
        coalescences,
        recombinations,
        root_time = time,
        "Recapitation finished"
    );
    out.sort_edges();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two separate trees over the whole genome: (0,1)->4 and (2,3)->5.
    fn forest() -> Graph {
        let mut g = Graph::new(1000.0).unwrap();
        let pop = g.add_population("p1");
        g.add_diploid(0.0, true, Some(pop));
        g.add_diploid(0.0, true, Some(pop));
        let a = g.add_node(5.0, false, Some(pop), None);
        let b = g.add_node(5.0, false, Some(pop), None);
        g.add_edge(0.0, 1000.0, a, NodeId(0));
        g.add_edge(0.0, 1000.0, a, NodeId(1));
        g.add_edge(0.0, 1000.0, b, NodeId(2));
        g.add_edge(0.0, 1000.0, b, NodeId(3));
        g
    }

    fn root_of(g: &Graph, sample: NodeId, x: f64) -> NodeId {
        let idx = g.parent_index();
        let mut node = sample;
        while let Some(p) = idx.parent_of(node, x) {
            node = p;
        }
        node
    }

    #[test]
    fn test_subtract_intervals() {
        assert_eq!(
            subtract(&[(0.0, 10.0)], &[(2.0, 4.0), (6.0, 7.0)]),
            vec![(0.0, 2.0), (4.0, 6.0), (7.0, 10.0)]
        );
        assert!(subtract(&[(0.0, 10.0)], &[(0.0, 10.0)]).is_empty());
    }

    #[test]
    fn test_forest_gets_single_root_everywhere() {
        let g = forest();
        let params = RecapitationParams::new(1e-4, 100.0).unwrap();
        let out = recapitate(&g, &params, Seed::new(7).unwrap()).unwrap();
        assert!(out.validate().is_ok());
        for x in [0.0, 123.0, 500.0, 999.0] {
            let roots: Vec<NodeId> = (0..4).map(|s| root_of(&out, NodeId(s), x)).collect();
            assert!(roots.iter().all(|&r| r == roots[0]), "several roots at {x}");
        }
    }

    #[test]
    fn test_original_tables_are_kept() {
        let g = forest();
        let params = RecapitationParams::new(0.0, 50.0).unwrap();
        let out = recapitate(&g, &params, Seed::new(1).unwrap()).unwrap();
        assert_eq!(&out.nodes()[..g.num_nodes()], g.nodes());
        assert!(out.num_nodes() > g.num_nodes());
        // New ancestors are older than the old roots.
        assert!(out.nodes()[g.num_nodes()..].iter().all(|n| n.time > 5.0));
    }

    #[test]
    fn test_same_seed_same_result() {
        let g = forest();
        let params = RecapitationParams::new(1e-3, 100.0).unwrap();
        let a = recapitate(&g, &params, Seed::new(99).unwrap()).unwrap();
        let b = recapitate(&g, &params, Seed::new(99).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_intersect_intervals() {
        assert_eq!(
            intersect(&[(0.0, 4.0), (6.0, 9.0)], &[(2.0, 7.0), (8.0, 10.0)]),
            vec![(2.0, 4.0), (6.0, 7.0), (8.0, 9.0)]
        );
        assert!(intersect(&[(0.0, 1.0)], &[(1.0, 2.0)]).is_empty());
    }

    #[test]
    fn test_long_genome_with_default_rates_finishes() {
        let length = 1_000_000.0;
        let mut g = Graph::new(length).unwrap();
        let pop = g.add_population("p1");
        for _ in 0..2 {
            g.add_diploid(0.0, true, Some(pop));
        }
        let params = RecapitationParams::new(1e-8, 1e4).unwrap();
        let out = recapitate(&g, &params, Seed::new(11).unwrap()).unwrap();
        assert!(out.validate().is_ok());
        for x in [0.0, 250_000.0, 500_000.0, 999_999.0] {
            let roots: Vec<NodeId> = (0..4).map(|s| root_of(&out, NodeId(s), x)).collect();
            assert!(roots.iter().all(|&r| r == roots[0]), "several roots at {x}");
        }
    }

    #[test]
    fn test_resolved_stretch_gets_no_new_edges() {
        // (0,1) and (2,3) already share a root on [0, 400).
        let mut g = forest();
        let top = g.add_node(9.0, false, None, None);
        g.add_edge(0.0, 400.0, top, NodeId(4));
        g.add_edge(0.0, 400.0, top, NodeId(5));
        let params = RecapitationParams::new(1e-3, 100.0).unwrap();
        let out = recapitate(&g, &params, Seed::new(5).unwrap()).unwrap();
        assert!(out.validate().is_ok());
        assert!(out
            .edges()
            .iter()
            .filter(|e| e.parent.index() >= g.num_nodes())
            .all(|e| e.left >= 400.0));
        for x in [10.0, 399.0, 400.0, 999.0] {
            let roots: Vec<NodeId> = (0..4).map(|s| root_of(&out, NodeId(s), x)).collect();
            assert!(roots.iter().all(|&r| r == roots[0]), "several roots at {x}");
        }
    }

    #[test]
    fn test_single_root_is_unchanged() {
        let mut g = forest();
        let top = g.add_node(9.0, false, None, None);
        g.add_edge(0.0, 1000.0, top, NodeId(4));
        g.add_edge(0.0, 1000.0, top, NodeId(5));
        let params = RecapitationParams::new(1e-8, 1e4).unwrap();
        let out = recapitate(&g, &params, Seed::new(3).unwrap()).unwrap();
        assert_eq!(out, g);
    }

    #[test]
    fn test_params_validation() {
        assert!(RecapitationParams::new(-1.0, 1e4).is_err());
        assert!(RecapitationParams::new(1e-8, 0.0).is_err());
        assert!(RecapitationParams::new(f64::NAN, 1e4).is_err());
    }
}
