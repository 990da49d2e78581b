//! Classification of individuals into named population groups.

use crate::base::{IndividualId, PopulationId};
use crate::graph::Graph;
use std::collections::{BTreeMap, BTreeSet};

/// The population an individual belongs to: its own population, or that of
/// its first node when the individual row carries none.
pub fn individual_population(graph: &Graph, id: IndividualId) -> Option<PopulationId> {
    let ind = graph.individual(id)?;
    ind.population.or_else(|| {
        ind.nodes
            .first()
            .and_then(|&n| graph.node(n))
            .and_then(|n| n.population)
    })
}

/// Bucket every individual of `graph` under its population's metadata name.
///
/// Every requested name gets a bucket, possibly empty. Individuals whose
/// population has no name, or a name that was not requested, are left out.
pub fn partition<S: AsRef<str>>(
    graph: &Graph,
    group_names: &[S],
) -> BTreeMap<String, BTreeSet<IndividualId>> {
    let mut buckets: BTreeMap<String, BTreeSet<IndividualId>> = group_names
        .iter()
        .map(|name| (name.as_ref().to_string(), BTreeSet::new()))
        .collect();

    for i in 0..graph.num_individuals() {
        let id = IndividualId(i);
        let name = individual_population(graph, id).and_then(|p| graph.population_name(p));
        if let Some(bucket) = name.and_then(|n| buckets.get_mut(n)) {
            bucket.insert(id);
        }
    }
    buckets
}

/// Every individual of `graph`, for the single-group mode.
pub fn all_individuals(graph: &Graph) -> BTreeSet<IndividualId> {
    (0..graph.num_individuals()).map(IndividualId).collect()
}
