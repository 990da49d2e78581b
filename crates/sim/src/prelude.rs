//! Commonly used imports for convenience.
//!
//! ```
//! use tsprep_sim::prelude::*;
//!
//! let mut graph = Graph::new(100.0).unwrap();
//! let p1 = graph.add_population("p1");
//! graph.add_diploid(0.0, true, Some(p1));
//! assert_eq!(partition(&graph, &["p1"])["p1"].len(), 1);
//! ```

pub use crate::base::{IndividualId, MutationId, NodeId, PopulationId, Seed};
pub use crate::engine::{Engine, NativeEngine};
pub use crate::errors::{GraphError, PipelineError};
pub use crate::graph::Graph;
pub use crate::pipeline::{
    next_mutation_id, partition, reduce, run, subsample, GroupPlan, PipelineConfig,
    PopulationMode, RunRecord, SampleSet, SeedLedger, Stage,
};
