//! The engine seam: every graph operation the pipeline delegates.
//!
//! The pipeline only ever talks to an [`Engine`]. [`NativeEngine`] is the
//! in-process implementation backed by this crate's graph, evolution and
//! storage modules; tests may inject their own.

use crate::base::{NodeId, Seed};
use crate::errors::{PipelineError, Result};
use crate::evolution::{self, RecapitationParams, SlimMutationModel};
use crate::graph::{self, Graph};
use crate::storage::{self, trees, AlleleTable, VcfLayout, VcfOptions};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Graph operations consumed by the pipeline.
pub trait Engine {
    /// Read a graph from `path`.
    fn load(&self, path: &Path) -> Result<Graph>;

    /// Complete the ancestry of `graph` above its roots.
    fn recapitate(&self, graph: &Graph, params: &RecapitationParams, seed: Seed) -> Result<Graph>;

    /// Reduce `graph` to the ancestry of `samples` (strictly ascending).
    fn simplify(&self, graph: &Graph, samples: &[NodeId], keep_unary: bool) -> Result<Graph>;

    /// Overlay new mutations.
    fn sim_mutations(
        &self,
        graph: &Graph,
        rate: f64,
        model: &SlimMutationModel,
        keep: bool,
        seed: Seed,
    ) -> Result<Graph>;

    /// Nucleotide alleles for export.
    fn generate_alleles(&self, graph: &Graph, seed: Seed) -> AlleleTable;

    /// Write the native lineage dump to `path`.
    fn dump(&self, graph: &Graph, path: &Path) -> Result<()>;

    /// Write a variant matrix to `path`.
    fn write_vcf(
        &self,
        graph: &Graph,
        alleles: &AlleleTable,
        layout: &VcfLayout,
        options: &VcfOptions,
        path: &Path,
    ) -> Result<()>;
}

/// The in-process engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEngine;

impl Engine for NativeEngine {
    fn load(&self, path: &Path) -> Result<Graph> {
        trees::load(path)
    }

    fn recapitate(&self, graph: &Graph, params: &RecapitationParams, seed: Seed) -> Result<Graph> {
        evolution::recapitate(graph, params, seed)
    }

    fn simplify(&self, graph: &Graph, samples: &[NodeId], keep_unary: bool) -> Result<Graph> {
        graph::simplify(graph, samples, keep_unary)
    }

    fn sim_mutations(
        &self,
        graph: &Graph,
        rate: f64,
        model: &SlimMutationModel,
        keep: bool,
        seed: Seed,
    ) -> Result<Graph> {
        evolution::sim_mutations(graph, rate, model, keep, seed)
    }

    fn generate_alleles(&self, graph: &Graph, seed: Seed) -> AlleleTable {
        AlleleTable::generate(graph, seed)
    }

    fn dump(&self, graph: &Graph, path: &Path) -> Result<()> {
        trees::dump(graph, path)
    }

    fn write_vcf(
        &self,
        graph: &Graph,
        alleles: &AlleleTable,
        layout: &VcfLayout,
        options: &VcfOptions,
        path: &Path,
    ) -> Result<()> {
        let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        storage::write_vcf(graph, alleles, layout, options, &mut writer)
            .and_then(|()| writer.flush())
            .map_err(|e| PipelineError::io(path, e))
    }
}
