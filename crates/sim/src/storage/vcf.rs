//! Variant-call matrix (VCF 4.2) writer.
//!
//! Every sample node becomes one haplotype. Sample nodes of the same
//! individual are written together as a phased diploid column (`0|1`);
//! sample nodes without an individual get a haploid column of their own.
//! Genotypes are found by walking from each sample towards the root at every
//! site and taking the first mutation met at that site.

use crate::base::NodeId;
use crate::errors::PipelineError;
use crate::graph::{Graph, MutationRecord};
use crate::storage::AlleleTable;
use std::io::{self, Write};

/// Clamp a genome coordinate to the 1-based VCF range: anything below 1
/// is written as 1, larger positions pass through unchanged.
pub fn clamp_position(x: f64) -> f64 {
    if x.is_nan() {
        return 1.0;
    }
    x.max(1.0)
}

/// Options for `write_vcf`.
#[derive(Debug, Clone, Copy)]
pub struct VcfOptions {
    /// Write a sample as missing (`.`) when it is isolated at a site.
    pub isolated_as_missing: bool,
    /// Applied to every site position before it is rounded to an integer.
    pub position_transform: fn(f64) -> f64,
}

impl VcfOptions {
    /// The export policy: isolated samples are present, positions clamped.
    pub fn export() -> Self {
        Self {
            isolated_as_missing: false,
            position_transform: clamp_position,
        }
    }
}

/// Sample columns of a VCF body, in order of first appearance among the
/// (ascending) sample nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct VcfLayout {
    columns: Vec<(String, Vec<NodeId>)>,
}

impl VcfLayout {
    /// Build the columns of `graph` with default names `tsk_<k>`.
    pub fn new(graph: &Graph) -> Self {
        let mut columns: Vec<(String, Vec<NodeId>)> = Vec::new();
        let mut column_of_individual: Vec<Option<usize>> = vec![None; graph.num_individuals()];
        for sample in graph.samples() {
            let individual = graph.node(sample).and_then(|n| n.individual);
            match individual.and_then(|i| column_of_individual[i.index()]) {
                Some(col) => columns[col].1.push(sample),
                None => {
                    if let Some(i) = individual {
                        column_of_individual[i.index()] = Some(columns.len());
                    }
                    columns.push((format!("tsk_{}", columns.len()), vec![sample]));
                }
            }
        }
        Self { columns }
    }

    /// Number of columns (individuals plus unattached sample nodes).
    pub(crate) fn len(&self) -> usize {
        self.columns.len()
    }

    /// Replace the column names. `names` must match the column count.
    pub fn with_names(mut self, names: Vec<String>) -> Result<Self, PipelineError> {
        if names.len() != self.columns.len() {
            return Err(PipelineError::State(format!(
                "{} individual names supplied for {} sample individuals",
                names.len(),
                self.columns.len()
            )));
        }
        for ((name, _), new) in self.columns.iter_mut().zip(names) {
            *name = new;
        }
        Ok(self)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }
}

/// Write `graph` as VCF 4.2 into `out`.
pub fn write_vcf<W: Write + ?Sized>(
    graph: &Graph,
    alleles: &AlleleTable,
    layout: &VcfLayout,
    options: &VcfOptions,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "##fileformat=VCFv4.2")?;
    writeln!(out, "##source=tsprep {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "##FILTER=<ID=PASS,Description=\"All filters passed\">")?;
    writeln!(
        out,
        "##contig=<ID=1,length={}>",
        graph.sequence_length().ceil() as u64
    )?;
    writeln!(
        out,
        "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">"
    )?;
    write!(out, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT")?;
    for name in layout.names() {
        write!(out, "\t{name}")?;
    }
    writeln!(out)?;

    let parents = graph.parent_index();
    let mut has_child = vec![Vec::new(); graph.num_nodes()];
    for e in graph.edges() {
        has_child[e.parent.index()].push((e.left, e.right));
    }
    let mut mutations_at: Vec<Vec<&MutationRecord>> = vec![Vec::new(); graph.sites().len()];
    for m in graph.mutations() {
        mutations_at[m.site.index()].push(m);
    }

    for (index, site) in graph.sites().iter().enumerate() {
        let x = site.position;
        let reference = alleles
            .reference(x)
            .ok_or_else(|| io::Error::other(format!("no alleles for site at position {x}")))?;

        let mut allele_list = vec![reference];
        for m in &mutations_at[index] {
            if let Some(base) = alleles.allele(x, &m.derived_state) {
                if !allele_list.contains(&base) {
                    allele_list.push(base);
                }
            }
        }

        let position = (options.position_transform)(x).round() as u64;
        let alt = if allele_list.len() > 1 {
            allele_list[1..]
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(",")
        } else {
            ".".to_string()
        };
        write!(
            out,
            "1\t{position}\t{index}\t{reference}\t{alt}\t.\tPASS\t.\tGT"
        )?;

        for (_, nodes) in &layout.columns {
            write!(out, "\t")?;
            for (k, &sample) in nodes.iter().enumerate() {
                if k > 0 {
                    write!(out, "|")?;
                }
                let state = state_at(sample, x, &mutations_at[index], &parents);
                let isolated = parents.parent_of(sample, x).is_none()
                    && !has_child[sample.index()]
                        .iter()
                        .any(|&(l, r)| l <= x && x < r);
                match state {
                    None if options.isolated_as_missing && isolated => write!(out, ".")?,
                    None => write!(out, "0")?,
                    Some(derived) => {
                        let base = alleles.allele(x, derived).unwrap_or(reference);
                        let gt = allele_list.iter().position(|&b| b == base).unwrap_or(0);
                        write!(out, "{gt}")?;
                    }
                }
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Derived state inherited by `sample` at `position`, or `None` if no
/// mutation at this site lies on its path to the root.
fn state_at<'a>(
    sample: NodeId,
    position: f64,
    mutations: &[&'a MutationRecord],
    parents: &crate::graph::ParentIndex,
) -> Option<&'a str> {
    let mut node = sample;
    loop {
        // Most recent mutation on this node wins; later rows break ties.
        let found = mutations
            .iter()
            .rev()
            .filter(|m| m.node == node)
            .min_by(|a, b| a.time.total_cmp(&b.time));
        if let Some(&m) = found {
            return Some(m.derived_state.as_str());
        }
        node = parents.parent_of(node, position)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Seed;

    /// Two diploid individuals under one root, one mutation above node 0
    /// at position 0 and one above individual 1's first node at 42.
    fn graph() -> Graph {
        let mut g = Graph::new(100.0).unwrap();
        let pop = g.add_population("p1");
        g.add_diploid(0.0, true, Some(pop));
        g.add_diploid(0.0, true, Some(pop));
        let root = g.add_node(10.0, false, None, None);
        for c in 0..4 {
            g.add_edge(0.0, 100.0, root, NodeId(c));
        }
        let s0 = g.add_site(0.0, "");
        let s1 = g.add_site(42.0, "");
        g.add_mutation(s0, NodeId(0), 1.0, "0", 0);
        g.add_mutation(s1, NodeId(2), 1.0, "1", 0);
        g
    }

    fn render(g: &Graph, layout: &VcfLayout, options: &VcfOptions) -> String {
        let alleles = AlleleTable::generate(g, Seed::new(5).unwrap());
        let mut buf = Vec::new();
        write_vcf(g, &alleles, layout, options, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_clamp_position() {
        assert_eq!(clamp_position(0.0), 1.0);
        assert_eq!(clamp_position(-3.0), 1.0);
        assert_eq!(clamp_position(1.0), 1.0);
        assert_eq!(clamp_position(42.0), 42.0);
        assert_eq!(clamp_position(f64::NAN), 1.0);
    }

    #[test]
    fn test_layout_groups_diploids() {
        let g = graph();
        let layout = VcfLayout::new(&g);
        assert_eq!(layout.len(), 2);
        assert_eq!(layout.names().collect::<Vec<_>>(), vec!["tsk_0", "tsk_1"]);
    }

    #[test]
    fn test_with_names_checks_count() {
        let g = graph();
        assert!(VcfLayout::new(&g).with_names(vec!["a".into()]).is_err());
        let layout = VcfLayout::new(&g)
            .with_names(vec!["a".into(), "b".into()])
            .unwrap();
        assert_eq!(layout.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_body_rows_and_genotypes() {
        let g = graph();
        let text = render(&g, &VcfLayout::new(&g), &VcfOptions::export());
        let rows: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(rows.len(), 2);

        let first: Vec<&str> = rows[0].split('\t').collect();
        // Position 0 is clamped to 1.
        assert_eq!(first[1], "1");
        assert_eq!(&first[9..], &["1|0", "0|0"]);

        let second: Vec<&str> = rows[1].split('\t').collect();
        assert_eq!(second[1], "42");
        assert_eq!(&second[9..], &["0|0", "1|0"]);
        assert_ne!(second[3], second[4]);
    }

    #[test]
    fn test_isolated_samples_written_present_by_default() {
        let mut g = Graph::new(10.0).unwrap();
        g.add_diploid(0.0, true, None);
        let s = g.add_site(5.0, "");
        g.add_mutation(s, NodeId(0), 1.0, "0", 0);
        let layout = VcfLayout::new(&g);

        let present = render(&g, &layout, &VcfOptions::export());
        assert!(present.lines().last().unwrap().ends_with("\t1|0"));

        let missing = VcfOptions {
            isolated_as_missing: true,
            ..VcfOptions::export()
        };
        let text = render(&g, &layout, &missing);
        assert!(text.lines().last().unwrap().ends_with("\t1|."));
    }
}
