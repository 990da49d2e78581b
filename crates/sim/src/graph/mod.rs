//! The genealogical graph: nodes, edges, individuals, populations, sites and
//! mutations, stored as tables.
//!
//! `Graph` owns the tables and checks cross-table references on demand with
//! [`Graph::validate`]. Operations that restructure a graph (simplification,
//! recapitation, mutation overlay) always return a new `Graph`.

mod simplify;
mod tables;

pub use simplify::simplify;
pub use tables::{
    EdgeRecord, IndividualRecord, MutationRecord, NodeRecord, PopulationMetadata,
    PopulationRecord, SiteRecord,
};

use crate::base::{IndividualId, NodeId, PopulationId, SiteId};
use crate::errors::GraphError;
use serde::{Deserialize, Serialize};

/// A genealogical graph over a genome of length `sequence_length`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    sequence_length: f64,
    #[serde(default)]
    nodes: Vec<NodeRecord>,
    #[serde(default)]
    edges: Vec<EdgeRecord>,
    #[serde(default)]
    individuals: Vec<IndividualRecord>,
    #[serde(default)]
    populations: Vec<PopulationRecord>,
    #[serde(default)]
    sites: Vec<SiteRecord>,
    #[serde(default)]
    mutations: Vec<MutationRecord>,
}

impl Graph {
    /// Create an empty graph.
    pub fn new(sequence_length: f64) -> Result<Self, GraphError> {
        if !(sequence_length.is_finite() && sequence_length > 0.0) {
            return Err(GraphError::SequenceLength(sequence_length));
        }
        Ok(Self {
            sequence_length,
            nodes: Vec::new(),
            edges: Vec::new(),
            individuals: Vec::new(),
            populations: Vec::new(),
            sites: Vec::new(),
            mutations: Vec::new(),
        })
    }

    pub(crate) fn from_tables(
        sequence_length: f64,
        nodes: Vec<NodeRecord>,
        edges: Vec<EdgeRecord>,
        individuals: Vec<IndividualRecord>,
        populations: Vec<PopulationRecord>,
        sites: Vec<SiteRecord>,
        mutations: Vec<MutationRecord>,
    ) -> Self {
        Self {
            sequence_length,
            nodes,
            edges,
            individuals,
            populations,
            sites,
            mutations,
        }
    }

    #[inline]
    pub fn sequence_length(&self) -> f64 {
        self.sequence_length
    }

    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeRecord] {
        &self.edges
    }

    pub fn individuals(&self) -> &[IndividualRecord] {
        &self.individuals
    }

    pub fn populations(&self) -> &[PopulationRecord] {
        &self.populations
    }

    pub fn sites(&self) -> &[SiteRecord] {
        &self.sites
    }

    pub fn mutations(&self) -> &[MutationRecord] {
        &self.mutations
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_individuals(&self) -> usize {
        self.individuals.len()
    }

    pub fn num_mutations(&self) -> usize {
        self.mutations.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.get(id.index())
    }

    pub fn individual(&self, id: IndividualId) -> Option<&IndividualRecord> {
        self.individuals.get(id.index())
    }

    /// The metadata name of a population, if it has one.
    pub fn population_name(&self, id: PopulationId) -> Option<&str> {
        self.populations
            .get(id.index())
            .and_then(|p| p.metadata.name.as_deref())
    }

    /// Sample node identifiers in ascending order.
    pub fn samples(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_sample)
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    /// Add a population carrying `name` in its metadata.
    pub fn add_population(&mut self, name: impl Into<String>) -> PopulationId {
        self.add_population_record(PopulationRecord {
            metadata: PopulationMetadata {
                name: Some(name.into()),
                ..Default::default()
            },
        })
    }

    pub fn add_population_record(&mut self, record: PopulationRecord) -> PopulationId {
        self.populations.push(record);
        PopulationId(self.populations.len() - 1)
    }

    /// Add an individual without nodes. Nodes are attached by `add_node`.
    pub fn add_individual(&mut self, population: Option<PopulationId>) -> IndividualId {
        self.individuals.push(IndividualRecord {
            nodes: Vec::new(),
            population,
        });
        IndividualId(self.individuals.len() - 1)
    }

    /// Add a node. If `individual` exists, the node is appended to its node list.
    pub fn add_node(
        &mut self,
        time: f64,
        is_sample: bool,
        population: Option<PopulationId>,
        individual: Option<IndividualId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeRecord {
            time,
            is_sample,
            population,
            individual,
        });
        if let Some(ind) = individual.and_then(|i| self.individuals.get_mut(i.index())) {
            ind.nodes.push(id);
        }
        id
    }

    /// Add a diploid individual with two nodes at `time` in `population`.
    pub fn add_diploid(
        &mut self,
        time: f64,
        is_sample: bool,
        population: Option<PopulationId>,
    ) -> IndividualId {
        let ind = self.add_individual(population);
        self.add_node(time, is_sample, population, Some(ind));
        self.add_node(time, is_sample, population, Some(ind));
        ind
    }

    pub fn add_edge(&mut self, left: f64, right: f64, parent: NodeId, child: NodeId) {
        self.edges.push(EdgeRecord {
            left,
            right,
            parent,
            child,
        });
    }

    pub fn add_site(&mut self, position: f64, ancestral_state: impl Into<String>) -> SiteId {
        self.sites.push(SiteRecord {
            position,
            ancestral_state: ancestral_state.into(),
        });
        SiteId(self.sites.len() - 1)
    }

    pub fn add_mutation(
        &mut self,
        site: SiteId,
        node: NodeId,
        time: f64,
        derived_state: impl Into<String>,
        mutation_type: u32,
    ) {
        self.mutations.push(MutationRecord {
            site,
            node,
            time,
            derived_state: derived_state.into(),
            mutation_type,
        });
    }

    /// Replace the site and mutation tables, sorting them into canonical
    /// order: sites by position, mutations by site then oldest first.
    pub(crate) fn set_sites_and_mutations(
        &mut self,
        sites: Vec<SiteRecord>,
        mutations: Vec<MutationRecord>,
    ) {
        let mut order: Vec<usize> = (0..sites.len()).collect();
        order.sort_by(|&a, &b| sites[a].position.total_cmp(&sites[b].position).then(a.cmp(&b)));
        let mut remap = vec![SiteId(0); sites.len()];
        for (new, &old) in order.iter().enumerate() {
            remap[old] = SiteId(new);
        }
        self.sites = order.iter().map(|&i| sites[i].clone()).collect();

        let mut mutations: Vec<MutationRecord> = mutations
            .into_iter()
            .map(|mut m| {
                m.site = remap[m.site.index()];
                m
            })
            .collect();
        // Stable sort keeps the input order of mutations with equal keys.
        mutations.sort_by(|a, b| a.site.cmp(&b.site).then(b.time.total_cmp(&a.time)));
        self.mutations = mutations;
    }

    /// Sort edges by parent time, parent, child and left coordinate.
    pub(crate) fn sort_edges(&mut self) {
        let nodes = &self.nodes;
        self.edges.sort_by(|a, b| {
            nodes[a.parent.index()]
                .time
                .total_cmp(&nodes[b.parent.index()].time)
                .then(a.parent.cmp(&b.parent))
                .then(a.child.cmp(&b.child))
                .then(a.left.total_cmp(&b.left))
        });
    }

    /// Check every cross-table reference and basic interval/time invariants.
    pub fn validate(&self) -> Result<(), GraphError> {
        if !(self.sequence_length.is_finite() && self.sequence_length > 0.0) {
            return Err(GraphError::SequenceLength(self.sequence_length));
        }
        let num_nodes = self.nodes.len();
        let num_individuals = self.individuals.len();
        let num_populations = self.populations.len();

        let check_population = |table: &'static str, row: usize, p: Option<PopulationId>| {
            match p {
                Some(p) if p.index() >= num_populations => Err(GraphError::PopulationOutOfBounds {
                    table,
                    row,
                    population: p.index(),
                    num_populations,
                }),
                _ => Ok(()),
            }
        };

        for (row, node) in self.nodes.iter().enumerate() {
            check_population("node", row, node.population)?;
            if let Some(ind) = node.individual {
                if ind.index() >= num_individuals {
                    return Err(GraphError::IndividualOutOfBounds {
                        table: "node",
                        row,
                        individual: ind.index(),
                        num_individuals,
                    });
                }
            }
        }

        for (row, ind) in self.individuals.iter().enumerate() {
            check_population("individual", row, ind.population)?;
            for node in &ind.nodes {
                if node.index() >= num_nodes {
                    return Err(GraphError::NodeOutOfBounds {
                        table: "individual",
                        row,
                        node: node.index(),
                        num_nodes,
                    });
                }
            }
        }

        for (row, edge) in self.edges.iter().enumerate() {
            for node in [edge.parent, edge.child] {
                if node.index() >= num_nodes {
                    return Err(GraphError::NodeOutOfBounds {
                        table: "edge",
                        row,
                        node: node.index(),
                        num_nodes,
                    });
                }
            }
            if !(edge.left >= 0.0 && edge.left < edge.right && edge.right <= self.sequence_length)
            {
                return Err(GraphError::InvalidInterval {
                    row,
                    left: edge.left,
                    right: edge.right,
                    sequence_length: self.sequence_length,
                });
            }
            let parent_time = self.nodes[edge.parent.index()].time;
            let child_time = self.nodes[edge.child.index()].time;
            if parent_time <= child_time {
                return Err(GraphError::TimeOrder {
                    row,
                    parent: edge.parent.index(),
                    parent_time,
                    child: edge.child.index(),
                    child_time,
                });
            }
        }

        for (row, site) in self.sites.iter().enumerate() {
            if !(site.position >= 0.0 && site.position < self.sequence_length) {
                return Err(GraphError::SitePosition {
                    row,
                    position: site.position,
                    sequence_length: self.sequence_length,
                });
            }
        }

        for (row, m) in self.mutations.iter().enumerate() {
            if m.site.index() >= self.sites.len() {
                return Err(GraphError::SiteOutOfBounds {
                    row,
                    site: m.site.index(),
                    num_sites: self.sites.len(),
                });
            }
            if m.node.index() >= num_nodes {
                return Err(GraphError::NodeOutOfBounds {
                    table: "mutation",
                    row,
                    node: m.node.index(),
                    num_nodes,
                });
            }
        }

        Ok(())
    }

    /// Index of parent edges by child, for walking up the local tree.
    pub fn parent_index(&self) -> ParentIndex {
        let mut by_child: Vec<Vec<(f64, f64, NodeId)>> = vec![Vec::new(); self.nodes.len()];
        for e in &self.edges {
            by_child[e.child.index()].push((e.left, e.right, e.parent));
        }
        ParentIndex { by_child }
    }
}

/// Parent lookup by child node and genome position.
#[derive(Debug, Clone)]
pub struct ParentIndex {
    by_child: Vec<Vec<(f64, f64, NodeId)>>,
}

impl ParentIndex {
    /// The parent of `child` at `position`, if any.
    pub fn parent_of(&self, child: NodeId, position: f64) -> Option<NodeId> {
        self.by_child
            .get(child.index())?
            .iter()
            .find(|(l, r, _)| *l <= position && position < *r)
            .map(|&(_, _, p)| p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_sample_tree() -> Graph {
        let mut g = Graph::new(100.0).unwrap();
        let pop = g.add_population("p1");
        let a = g.add_node(0.0, true, Some(pop), None);
        let b = g.add_node(0.0, true, Some(pop), None);
        let root = g.add_node(10.0, false, Some(pop), None);
        g.add_edge(0.0, 100.0, root, a);
        g.add_edge(0.0, 100.0, root, b);
        g
    }

    #[test]
    fn test_new_rejects_bad_length() {
        assert!(Graph::new(0.0).is_err());
        assert!(Graph::new(f64::NAN).is_err());
        assert!(Graph::new(1.0).is_ok());
    }

    #[test]
    fn test_add_diploid_links_nodes() {
        let mut g = Graph::new(10.0).unwrap();
        let pop = g.add_population("p1");
        let ind = g.add_diploid(0.0, true, Some(pop));
        let rec = g.individual(ind).unwrap();
        assert_eq!(rec.nodes, vec![NodeId(0), NodeId(1)]);
        assert_eq!(g.node(NodeId(1)).unwrap().individual, Some(ind));
        assert_eq!(g.samples(), vec![NodeId(0), NodeId(1)]);
        assert_eq!(g.population_name(pop), Some("p1"));
    }

    #[test]
    fn test_validate_accepts_simple_tree() {
        assert!(two_sample_tree().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_time_inversion() {
        let mut g = two_sample_tree();
        g.add_edge(0.0, 100.0, NodeId(0), NodeId(2));
        assert!(matches!(g.validate(), Err(GraphError::TimeOrder { .. })));
    }

    #[test]
    fn test_validate_rejects_dangling_reference() {
        let mut g = two_sample_tree();
        g.add_edge(0.0, 50.0, NodeId(9), NodeId(0));
        assert!(matches!(
            g.validate(),
            Err(GraphError::NodeOutOfBounds { table: "edge", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_interval() {
        let mut g = two_sample_tree();
        g.add_edge(60.0, 40.0, NodeId(2), NodeId(0));
        assert!(matches!(g.validate(), Err(GraphError::InvalidInterval { .. })));
    }

    #[test]
    fn test_parent_index_lookup() {
        let g = two_sample_tree();
        let idx = g.parent_index();
        assert_eq!(idx.parent_of(NodeId(0), 5.0), Some(NodeId(2)));
        assert_eq!(idx.parent_of(NodeId(2), 5.0), None);
        assert_eq!(idx.parent_of(NodeId(1), 100.0), None);
    }

    #[test]
    fn test_set_sites_and_mutations_sorts() {
        let mut g = two_sample_tree();
        let sites = vec![
            SiteRecord {
                position: 50.0,
                ancestral_state: String::new(),
            },
            SiteRecord {
                position: 5.0,
                ancestral_state: String::new(),
            },
        ];
        let mutations = vec![
            MutationRecord {
                site: SiteId(0),
                node: NodeId(0),
                time: 1.0,
                derived_state: "1".into(),
                mutation_type: 0,
            },
            MutationRecord {
                site: SiteId(1),
                node: NodeId(1),
                time: 2.0,
                derived_state: "0".into(),
                mutation_type: 0,
            },
        ];
        g.set_sites_and_mutations(sites, mutations);
        assert_eq!(g.sites()[0].position, 5.0);
        assert_eq!(g.mutations()[0].derived_state, "0");
        assert_eq!(g.mutations()[0].site, SiteId(0));
        assert_eq!(g.mutations()[1].site, SiteId(1));
    }
}
