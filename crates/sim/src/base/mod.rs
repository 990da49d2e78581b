//! Base types shared by every other module.
//!
//! Table identifiers, the 31-bit `Seed`, and the `Nucleotide` alphabet used
//! when alleles are rendered for export.

mod ids;
mod nucleotide;
mod seed;

pub use ids::{IndividualId, MutationId, NodeId, PopulationId, SiteId};
pub use nucleotide::Nucleotide;
pub use seed::Seed;
