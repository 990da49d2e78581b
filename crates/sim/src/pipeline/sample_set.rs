use crate::base::NodeId;
use serde::{Deserialize, Serialize};

/// Node identifiers selected for retention, strictly ascending.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleSet(Vec<NodeId>);

impl SampleSet {
    /// Sort and deduplicate `nodes`.
    pub fn from_nodes<I: IntoIterator<Item = NodeId>>(nodes: I) -> Self {
        let mut nodes: Vec<NodeId> = nodes.into_iter().collect();
        nodes.sort_unstable();
        nodes.dedup();
        Self(nodes)
    }

    /// The union of several sets.
    pub fn union<'a, I: IntoIterator<Item = &'a SampleSet>>(sets: I) -> Self {
        Self::from_nodes(sets.into_iter().flat_map(|s| s.0.iter().copied()))
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.0.iter().copied()
    }
}
