//! Native lineage dump (`.trees`) encoding.
//!
//! The graph tables are written with `serde_json` in table order, so the
//! same graph always serializes to the same bytes.

use crate::errors::{GraphError, PipelineError};
use crate::graph::Graph;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Decode a graph from `reader` and validate it.
pub fn read_graph<R: Read>(reader: R) -> Result<Graph, GraphError> {
    let graph: Graph = serde_json::from_reader(reader)?;
    graph.validate()?;
    Ok(graph)
}

/// Encode `graph` into `writer`.
pub fn write_graph<W: Write + ?Sized>(graph: &Graph, writer: &mut W) -> std::io::Result<()> {
    serde_json::to_writer(&mut *writer, graph)?;
    writer.write_all(b"\n")
}

/// Load and validate a graph from `path`.
pub fn load(path: &Path) -> Result<Graph, PipelineError> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    Ok(read_graph(BufReader::new(file))?)
}

/// Write `graph` to `path`, replacing any existing file.
pub fn dump(graph: &Graph, path: &Path) -> Result<(), PipelineError> {
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    write_graph(graph, &mut writer).map_err(|e| PipelineError::io(path, e))?;
    writer.flush().map_err(|e| PipelineError::io(path, e))
}
