//! Nucleotide alleles for variant-matrix export.
//!
//! Mutation states are identifier stacks, not bases. Before a variant matrix
//! is written every site gets a reference base and every distinct derived
//! state at that site gets a base different from the reference. All bases
//! come from one seeded generator, visiting sites by position and states in
//! mutation-table order, so a fixed seed always yields the same alleles.

use crate::base::{Nucleotide, Seed};
use crate::graph::Graph;
use rand::Rng;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct SiteAlleles {
    ancestral_state: String,
    reference: Nucleotide,
    derived: Vec<(String, Nucleotide)>,
}

/// Reference and derived bases keyed by site position.
///
/// Keyed by position rather than site row so the table built from a full
/// graph also serves every reduction of it.
#[derive(Debug, Clone, Default)]
pub struct AlleleTable {
    sites: HashMap<u64, SiteAlleles>,
}

impl AlleleTable {
    /// Draw bases for every site and derived state in `graph`.
    pub fn generate(graph: &Graph, seed: Seed) -> Self {
        let mut rng = seed.rng();
        let mut by_site: Vec<Vec<&str>> = vec![Vec::new(); graph.sites().len()];
        for m in graph.mutations() {
            let states = &mut by_site[m.site.index()];
            if !states.contains(&m.derived_state.as_str()) {
                states.push(&m.derived_state);
            }
        }

        let mut sites = HashMap::with_capacity(graph.sites().len());
        for (site, states) in graph.sites().iter().zip(by_site) {
            let key = site.position.to_bits();
            if sites.contains_key(&key) {
                continue;
            }
            let reference = Nucleotide::ALL[rng.random_range(0..4)];
            let others = reference.others();
            let derived = states
                .into_iter()
                .filter(|s| *s != site.ancestral_state)
                .map(|s| (s.to_string(), others[rng.random_range(0..3)]))
                .collect();
            sites.insert(
                key,
                SiteAlleles {
                    ancestral_state: site.ancestral_state.clone(),
                    reference,
                    derived,
                },
            );
        }
        Self { sites }
    }

    /// Reference base at `position`, if the site is known.
    pub fn reference(&self, position: f64) -> Option<Nucleotide> {
        self.sites.get(&position.to_bits()).map(|s| s.reference)
    }

    /// Base for `state` at `position`. The site's ancestral state and unknown
    /// states map to the reference base.
    pub fn allele(&self, position: f64, state: &str) -> Option<Nucleotide> {
        let site = self.sites.get(&position.to_bits())?;
        if state == site.ancestral_state {
            return Some(site.reference);
        }
        Some(
            site.derived
                .iter()
                .find(|(s, _)| s == state)
                .map_or(site.reference, |&(_, n)| n),
        )
    }
}
