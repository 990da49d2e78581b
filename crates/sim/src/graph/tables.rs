//! Row types of the graph tables.

use crate::base::{IndividualId, NodeId, PopulationId, SiteId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A haploid genome copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Birth time in generations before the present.
    pub time: f64,
    /// Whether the node is a sample.
    #[serde(default)]
    pub is_sample: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<PopulationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub individual: Option<IndividualId>,
}

/// Inheritance of `[left, right)` by `child` from `parent`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub left: f64,
    pub right: f64,
    pub parent: NodeId,
    pub child: NodeId,
}

/// A diploid individual owning its genome copies.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndividualRecord {
    pub nodes: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<PopulationId>,
}

/// Free-form population metadata. Only `name` is interpreted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PopulationMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A named sub-population.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PopulationRecord {
    #[serde(default)]
    pub metadata: PopulationMetadata,
}

/// A variable position on the genome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub position: f64,
    #[serde(default)]
    pub ancestral_state: String,
}

/// A mutation event above `node` at `site`.
///
/// `derived_state` holds the stacked versioned identifiers of the mutation as
/// comma-separated decimals (`"12"`, `"3,12"`); it may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationRecord {
    pub site: SiteId,
    pub node: NodeId,
    pub time: f64,
    #[serde(default)]
    pub derived_state: String,
    #[serde(default)]
    pub mutation_type: u32,
}
