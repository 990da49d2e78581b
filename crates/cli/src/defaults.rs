//! Shared default values for command-line arguments.

/// Recombination rate per base per generation used by recapitation.
pub const RECOMB_RATE: f64 = 1e-8;

/// Ancestral effective population size used by recapitation.
pub const ANCESTRAL_NE: f64 = 1e4;

/// Population groups of the stratified mode.
pub const GROUP_P1: &str = "p1";
pub const GROUP_P2: &str = "p2";

/// Default log filter when `RUST_LOG` is unset.
pub const LOG_FILTER: &str = "info";
