//! # tsprep
//!
//! Post-processing for simulated genealogies: completes partial ancestries,
//! draws reproducible subsamples of diploid individuals per population,
//! overlays new mutations without identifier collisions, and exports the
//! result as a lineage dump and as VCF.
//!
//! The crate is organised bottom-up:
//! - `base`: identifiers, seeds and nucleotides
//! - `graph`: the genealogical tables and simplification
//! - `evolution`: recapitation and the mutation overlay
//! - `storage`: the `.trees` dump and the VCF writer
//! - `engine`: the seam the pipeline delegates graph work through
//! - `pipeline`: seed ledger, partition, subsample, reduce, export

pub mod base;
pub mod engine;
pub mod errors;
pub mod evolution;
pub mod graph;
pub mod pipeline;
pub mod prelude;
pub mod storage;

pub use base::{MutationId, NodeId, Seed};
pub use errors::{GraphError, PipelineError};
pub use graph::Graph;
