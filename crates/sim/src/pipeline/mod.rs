//! The post-processing pipeline.
//!
//! Stages, in run order:
//!
//! 1. [`SeedLedger`] hands every randomized stage its own logged seed.
//! 2. [`partition`] buckets individuals by population name.
//! 3. [`subsample`] draws whole diploid individuals per group.
//! 4. [`reduce`] collapses the graph to the selected nodes.
//! 5. [`next_mutation_id`] continues the mutation numbering for the overlay.
//! 6. [`export`] writes the lineage dump and the variant matrices.
//!
//! [`run`] strings them together for one [`PipelineConfig`].

pub mod config;
pub mod export;
pub mod ledger;
pub mod mutation_ids;
pub mod partition;
pub mod reduce;
mod runner;
mod sample_set;
pub mod subsample;

pub use config::{
    GroupPlan, OutputConfig, PipelineConfig, PopulationMode, RecapitationConfig, GLOBAL_GROUP,
};
pub use export::{export, output_path, ExportOutcome, ExportRequest};
pub use ledger::{SeedLedger, SeedRecord, Stage};
pub use mutation_ids::{mutation_ids, next_mutation_id};
pub use partition::partition;
pub use reduce::reduce;
pub use runner::{run, RunRecord};
pub use sample_set::SampleSet;
pub use subsample::subsample;
