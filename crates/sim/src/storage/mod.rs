//! Interchange formats: the native lineage dump and the variant matrix.
//!
//! - `trees`: JSON encoding of the graph tables (`<prefix>.trees`).
//! - `vcf`: VCF 4.2 writer with caller-supplied names, position transform
//!   and missing-data policy.
//! - `alleles`: seeded nucleotide assignment used by the VCF writer.

mod alleles;
pub mod trees;
pub mod vcf;

pub use alleles::AlleleTable;
pub use vcf::{clamp_position, write_vcf, VcfLayout, VcfOptions};
