//! Error types for graph handling and the post-processing pipeline.
//!
//! `PipelineError` is the error every public pipeline operation returns. Its
//! variants are the four failure classes a run can hit: a bad configuration,
//! too few candidates for a subsample, an inconsistent graph state, and I/O.
//! Lower-level graph problems are reported as `GraphError` and converted.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building, validating or decoding a `Graph`.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A row refers to a node that does not exist.
    #[error("{table} row {row} refers to node {node}, but the graph has {num_nodes} nodes")]
    NodeOutOfBounds {
        table: &'static str,
        row: usize,
        node: usize,
        num_nodes: usize,
    },

    /// A row refers to an individual that does not exist.
    #[error("{table} row {row} refers to individual {individual}, but the graph has {num_individuals} individuals")]
    IndividualOutOfBounds {
        table: &'static str,
        row: usize,
        individual: usize,
        num_individuals: usize,
    },

    /// A row refers to a population that does not exist.
    #[error("{table} row {row} refers to population {population}, but the graph has {num_populations} populations")]
    PopulationOutOfBounds {
        table: &'static str,
        row: usize,
        population: usize,
        num_populations: usize,
    },

    /// A mutation refers to a site that does not exist.
    #[error("mutation {row} refers to site {site}, but the graph has {num_sites} sites")]
    SiteOutOfBounds {
        row: usize,
        site: usize,
        num_sites: usize,
    },

    /// An edge interval is empty, reversed or outside the sequence.
    #[error("edge {row} has invalid interval [{left}, {right}) for sequence length {sequence_length}")]
    InvalidInterval {
        row: usize,
        left: f64,
        right: f64,
        sequence_length: f64,
    },

    /// A parent is not strictly older than its child.
    #[error("edge {row}: parent {parent} (time {parent_time}) is not older than child {child} (time {child_time})")]
    TimeOrder {
        row: usize,
        parent: usize,
        parent_time: f64,
        child: usize,
        child_time: f64,
    },

    /// A site position lies outside `[0, sequence_length)`.
    #[error("site {row} has position {position} outside [0, {sequence_length})")]
    SitePosition {
        row: usize,
        position: f64,
        sequence_length: f64,
    },

    /// The sequence length is not a positive finite number.
    #[error("invalid sequence length {0}")]
    SequenceLength(f64),

    /// The serialized graph could not be decoded.
    #[error("malformed graph encoding: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing or contradictory run parameters. Always raised before any
    /// seed is drawn or any file is touched.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A subsample asked for more individuals than a group holds.
    #[error(
        "Insufficient samples in group '{group}': requested {requested} individuals, {available} available"
    )]
    InsufficientSamples {
        group: String,
        requested: usize,
        available: usize,
    },

    /// The graph is not in a state the pipeline can work with.
    #[error("State error: {0}")]
    State(String),

    /// Reading the source or writing an output failed.
    #[error("IO error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The graph itself is invalid.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl PipelineError {
    /// Wrap an I/O error together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used across the crate.
pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
