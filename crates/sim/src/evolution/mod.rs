//! Processes that add structure to a graph: ancestry completion above the
//! existing roots and the mutation overlay.

pub mod mutation;
pub mod recapitation;

pub use mutation::{sim_mutations, SlimMutationModel};
pub use recapitation::{recapitate, RecapitationParams};
