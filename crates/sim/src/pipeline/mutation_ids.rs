//! Continuation of the versioned mutation numbering.
//!
//! Every mutation's derived state is a comma-separated stack of the
//! identifiers it carries. The next free identifier is one past the largest
//! identifier found anywhere in those stacks. Gaps are legal: reductions
//! routinely remove mutations.

use crate::base::MutationId;
use crate::errors::{PipelineError, Result};
use crate::graph::Graph;
use std::collections::BTreeSet;

/// Parse one derived-state stack. Empty tokens are skipped.
pub fn parse_stack(derived_state: &str) -> Result<Vec<MutationId>> {
    derived_state
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<u64>().map(MutationId).map_err(|_| {
                PipelineError::State(format!(
                    "derived state '{derived_state}' holds a non-numeric mutation identifier '{t}'"
                ))
            })
        })
        .collect()
}

/// Every identifier present in `graph`.
pub fn mutation_ids(graph: &Graph) -> Result<BTreeSet<MutationId>> {
    let mut ids = BTreeSet::new();
    for m in graph.mutations() {
        ids.extend(parse_stack(&m.derived_state)?);
    }
    Ok(ids)
}

/// The first identifier not yet used in `graph`, or `0` if there is none.
pub fn next_mutation_id(graph: &Graph) -> Result<MutationId> {
    match mutation_ids(graph)?.last() {
        None => Ok(MutationId(0)),
        Some(max) => max.checked_next().ok_or_else(|| {
            PipelineError::State(format!(
                "mutation identifier {max} leaves no room for new mutations"
            ))
        }),
    }
}
