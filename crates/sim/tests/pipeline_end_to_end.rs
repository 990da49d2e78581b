use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{tempdir, TempDir};
use tsprep_sim::evolution::RecapitationParams;
use tsprep_sim::pipeline::{
    mutation_ids, output_path, OutputConfig, RecapitationConfig,
};
use tsprep_sim::prelude::*;
use tsprep_sim::storage::trees;

/// Ten diploid individuals, five in p1 and five in p2, left unrecapitated:
/// each population coalesces to its own root and the two roots never meet.
/// Carries three pre-existing mutations with identifiers 0..=2.
fn source_graph() -> Graph {
    let mut g = Graph::new(10_000.0).unwrap();
    let p1 = g.add_population("p1");
    let p2 = g.add_population("p2");
    for pop in [p1, p2] {
        let mut members = Vec::new();
        for _ in 0..5 {
            let ind = g.add_diploid(0.0, true, Some(pop));
            members.extend(g.individual(ind).unwrap().nodes.clone());
        }
        let root = g.add_node(100.0, false, Some(pop), None);
        for n in members {
            g.add_edge(0.0, 10_000.0, root, n);
        }
    }
    let s0 = g.add_site(0.0, "");
    let s1 = g.add_site(500.0, "");
    let s2 = g.add_site(700.0, "");
    g.add_mutation(s0, NodeId(0), 10.0, "0", 1);
    g.add_mutation(s1, NodeId(0), 20.0, "1", 1);
    g.add_mutation(s2, NodeId(12), 30.0, "2", 1);
    g
}

fn write_source(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("source.trees");
    trees::dump(&source_graph(), &path).unwrap();
    path
}

fn stratified_config(source: &Path, prefix: &Path, seed: u64) -> PipelineConfig {
    PipelineConfig {
        source: source.to_path_buf(),
        mode: PopulationMode::Stratified {
            groups: vec![
                GroupPlan::new("p1")
                    .with_sample_size(Some(4))
                    .with_seed(Seed::new(seed).ok()),
                GroupPlan::new("p2").with_sample_size(Some(4)),
            ],
        },
        random: true,
        mutation_rate: 1e-6,
        recapitation: RecapitationConfig {
            enabled: true,
            params: RecapitationParams::new(1e-8, 1e4).unwrap(),
            seed: None,
        },
        output: OutputConfig {
            dest_prefix: prefix.to_path_buf(),
            vcf: true,
            trees: true,
        },
        mutation_seed: None,
        nucleotide_seed: None,
    }
}

fn vcf_columns(path: &Path) -> Vec<String> {
    let text = fs::read_to_string(path).unwrap();
    text.lines()
        .find(|l| l.starts_with("#CHROM"))
        .map(|l| l.split('\t').skip(9).map(str::to_string).collect())
        .unwrap_or_default()
}

#[test]
fn test_two_population_scenario() {
    let dir = tempdir().unwrap();
    let source = write_source(&dir);
    let prefix = dir.path().join("run");
    let config = stratified_config(&source, &prefix, 42);

    let record = run(&config, &NativeEngine, &mut SeedLedger::from_entropy()).unwrap();

    for group in ["p1", "p2"] {
        let nodes = &record.samples[group];
        assert_eq!(nodes.len(), 4, "{group} should keep 4 nodes");
        let path = output_path(&prefix, &format!("_{group}.vcf"));
        let columns = vcf_columns(&path);
        assert_eq!(
            columns,
            vec![format!("{group}_ind0"), format!("{group}_ind1")]
        );
        // Every column is a diploid genotype.
        let text = fs::read_to_string(&path).unwrap();
        for row in text.lines().filter(|l| !l.starts_with('#')) {
            for gt in row.split('\t').skip(9) {
                assert_eq!(gt.split('|').count(), 2);
            }
        }
    }

    let combined = trees::load(&output_path(&prefix, ".trees")).unwrap();
    assert_eq!(combined.samples().len(), 8);
    assert_eq!(combined.num_individuals(), 4);
    assert_eq!(vcf_columns(&output_path(&prefix, ".vcf")).len(), 4);
}

#[test]
fn test_pinned_seed_reproduces_selection() {
    let dir = tempdir().unwrap();
    let source = write_source(&dir);

    let first = run(
        &stratified_config(&source, &dir.path().join("a"), 42),
        &NativeEngine,
        &mut SeedLedger::from_entropy(),
    )
    .unwrap();
    let second = run(
        &stratified_config(&source, &dir.path().join("b"), 42),
        &NativeEngine,
        &mut SeedLedger::from_entropy(),
    )
    .unwrap();
    assert_eq!(first.samples, second.samples);

    let other = run(
        &stratified_config(&source, &dir.path().join("c"), 7),
        &NativeEngine,
        &mut SeedLedger::from_entropy(),
    )
    .unwrap();
    assert_eq!(other.samples["p1"].len(), 4);
}

#[test]
fn test_fully_pinned_run_is_byte_identical() {
    let dir = tempdir().unwrap();
    let source = write_source(&dir);
    let pinned = |prefix: &str| {
        let mut config = stratified_config(&source, &dir.path().join(prefix), 42);
        config.recapitation.seed = Seed::new(1).ok();
        config.mutation_seed = Seed::new(2).ok();
        config.nucleotide_seed = Seed::new(3).ok();
        run(&config, &NativeEngine, &mut SeedLedger::from_entropy()).unwrap();
    };
    pinned("x");
    pinned("y");
    for suffix in [".trees", ".vcf", "_p1.vcf", "_p2.vcf"] {
        let a = fs::read(output_path(&dir.path().join("x"), suffix)).unwrap();
        let b = fs::read(output_path(&dir.path().join("y"), suffix)).unwrap();
        assert_eq!(a, b, "{suffix} differs between pinned runs");
    }
}

#[test]
fn test_overlay_continues_numbering_and_keeps_old_mutations() {
    let dir = tempdir().unwrap();
    let source = write_source(&dir);
    let prefix = dir.path().join("keep");
    let mut config = stratified_config(&source, &prefix, 42);
    config.random = false;
    config.mutation_rate = 1e-5;

    let record = run(&config, &NativeEngine, &mut SeedLedger::seeded(11)).unwrap();
    assert_eq!(record.next_mutation_id, MutationId(3));

    let out = trees::load(&output_path(&prefix, ".trees")).unwrap();
    let ids = mutation_ids(&out).unwrap();
    for old in 0..3 {
        assert!(ids.contains(&MutationId(old)), "mutation {old} was lost");
    }
    let originals: Vec<_> = out
        .mutations()
        .iter()
        .filter(|m| m.mutation_type == 1)
        .map(|m| m.derived_state.clone())
        .collect();
    assert_eq!(originals, vec!["0", "1", "2"]);
    assert!(ids.iter().any(|id| id.0 >= 3));
    assert_eq!(next_mutation_id(&out).unwrap().0, ids.last().unwrap().0 + 1);
}

#[test]
fn test_partition_covers_named_groups_once() {
    let g = source_graph();
    let parts = partition(&g, &["p1", "p2"]);
    let mut seen = BTreeSet::new();
    for members in parts.values() {
        assert_eq!(members.len(), 5);
        for id in members {
            assert!(seen.insert(*id), "individual {id} in two buckets");
        }
    }
    assert_eq!(seen.len(), g.num_individuals());
}

#[test]
fn test_subsample_properties_over_many_seeds() {
    let g = source_graph();
    let pool = partition(&g, &["p1"]).remove("p1").unwrap();
    for s in 0..100u64 {
        for target in [0usize, 1, 2, 5, 10] {
            let set = subsample(&g, "p1", &pool, Some(target), Seed::new(s).unwrap()).unwrap();
            assert_eq!(set.len(), 2 * (target / 2));
            assert!(set.as_slice().windows(2).all(|w| w[0] < w[1]));
        }
    }
}
