use super::SampleSet;
use crate::engine::Engine;
use crate::errors::Result;
use crate::graph::Graph;
use tracing::debug;

/// Reduce `graph` to the ancestry of `samples`.
///
/// `keep_unary` must be set whenever the result will be reduced again: a
/// first pass that collapses unary nodes can lose structure the second pass
/// still needs.
pub fn reduce<E: Engine + ?Sized>(
    engine: &E,
    graph: &Graph,
    samples: &SampleSet,
    keep_unary: bool,
) -> Result<Graph> {
    debug!(
        samples = samples.len(),
        keep_unary, "Reducing graph to sample set"
    );
    engine.simplify(graph, samples.as_slice(), keep_unary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::NodeId;
    use crate::engine::NativeEngine;

    /// Sample 0 hangs below a unary node 4, which meets sample 1 at root 5.
    fn graph() -> Graph {
        let mut g = Graph::new(10.0).unwrap();
        g.add_diploid(0.0, true, None);
        g.add_diploid(0.0, true, None);
        let mid = g.add_node(1.0, false, None, None);
        let root = g.add_node(2.0, false, None, None);
        g.add_edge(0.0, 10.0, mid, NodeId(0));
        g.add_edge(0.0, 10.0, root, mid);
        g.add_edge(0.0, 10.0, root, NodeId(1));
        g.add_edge(0.0, 10.0, root, NodeId(2));
        g.add_edge(0.0, 10.0, root, NodeId(3));
        g
    }

    #[test]
    fn test_policy_controls_unary_nodes() {
        let g = graph();
        let set = SampleSet::from_nodes([NodeId(0), NodeId(1)]);
        let kept = reduce(&NativeEngine, &g, &set, true).unwrap();
        let collapsed = reduce(&NativeEngine, &g, &set, false).unwrap();
        assert_eq!(kept.num_nodes(), 4);
        assert_eq!(collapsed.num_nodes(), 3);
    }

    #[test]
    fn test_second_pass_needs_unary_nodes() {
        // Reducing first to {0, 1, 2} and then to {0, 1} should keep node 0's
        // lineage through the old unary node only when the first pass kept it.
        let g = graph();
        let first = SampleSet::from_nodes([NodeId(0), NodeId(1), NodeId(2)]);
        let kept = reduce(&NativeEngine, &g, &first, true).unwrap();
        let collapsed = reduce(&NativeEngine, &g, &first, false).unwrap();
        assert_eq!(kept.num_nodes(), 5);
        assert_eq!(collapsed.num_nodes(), 4);
        let pair = SampleSet::from_nodes([NodeId(0), NodeId(1)]);
        let again_kept = reduce(&NativeEngine, &kept, &pair, true).unwrap();
        let again_collapsed = reduce(&NativeEngine, &collapsed, &pair, true).unwrap();
        assert_eq!(again_kept.num_nodes(), 4);
        assert_eq!(again_collapsed.num_nodes(), 3);
    }
}
