//! End-to-end exercises over graphs loaded from GFA text: evidence-driven
//! link cuts, pruning, and the topological passes working together.

use std::fs::File;
use std::io::Write as _;
use std::path::PathBuf;

use gfa_unfold::config::UnfoldConfig;
use gfa_unfold::conversion::{load_gfa, write_gfa};
use gfa_unfold::graph::{NodeClass, NodeId};
use gfa_unfold::merge::{merge_brothers, merge_neighbours, split_parents};
use gfa_unfold::unfold::reference::remove_conflicting_links;
use gfa_unfold::unfold::{prune, StageOptions};

fn temp_gfa(name: &str, contents: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("gfa-unfold-it-{}-{}", std::process::id(), name));
    let mut f = File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn chain_contracts_into_one_contig() {
    let path = temp_gfa(
        "chain.gfa",
        "H\tVN:Z:1.0\n\
         S\t1\tACGTAAA\tDP:f:20\n\
         S\t2\tAAACTG\tDP:f:10\n\
         L\t1\t+\t2\t+\t3M\n",
    );
    let mut g = load_gfa(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(merge_neighbours(&mut g).unwrap(), 1);
    assert_eq!(g.node_count(), 1);
    assert_eq!(g.link_count(), 0);
    let kept = g.contig(NodeId(1)).unwrap();
    assert_eq!(kept.sequence, b"ACGTAAACTG");
    // depth is the length-weighted average of the two contigs
    assert!((kept.depth - 15.38).abs() < 1e-9);
}

#[test]
fn coverage_asymmetric_diamond_resolves_to_two_chains() {
    let path = temp_gfa(
        "diamond.gfa",
        "H\tVN:Z:1.0\n\
         S\t10\tCCCAGG\tDP:f:10\n\
         S\t11\tCCCTGG\tDP:f:100\n\
         S\t1\tGGTTAA\tDP:f:50\n\
         S\t20\tAACGCA\tDP:f:12\n\
         S\t21\tAACGCC\tDP:f:95\n\
         L\t10\t+\t1\t+\t2M\n\
         L\t11\t+\t1\t+\t2M\n\
         L\t1\t+\t20\t+\t2M\n\
         L\t1\t+\t21\t+\t2M\n",
    );
    let mut g = load_gfa(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(split_parents(&mut g, 5.0, 80.0).unwrap(), 1);
    assert!(!g.has_node(NodeId(1)));
    assert!(g.has_link_between(NodeId(20), NodeId(10)));
    assert!(g.has_link_between(NodeId(21), NodeId(11)));
    assert_eq!(g.contig(NodeId(10)).unwrap().sequence, b"CCCAGGTTAA");
    assert_eq!(g.contig(NodeId(11)).unwrap().sequence, b"CCCTGGTTAA");

    // the two haplotype chains now contract independently
    assert_eq!(merge_neighbours(&mut g).unwrap(), 2);
    assert_eq!(g.node_count(), 2);
    assert_eq!(g.link_count(), 0);
    assert_eq!(g.contig(NodeId(20)).unwrap().sequence, b"CCCAGGTTAACGCA");
    assert_eq!(g.contig(NodeId(21)).unwrap().sequence, b"CCCTGGTTAACGCC");
}

#[test]
fn accession_conflict_cuts_the_link() {
    let path = temp_gfa(
        "accession.gfa",
        "S\t1\tACGTACGT\tDP:f:10\tAC:Z:NC_000913.3\tOR:A:+\tST:i:100\tEN:i:108\n\
         S\t2\tTTGCACGT\tDP:f:10\tAC:Z:NC_002695.2\tOR:A:+\tST:i:120\tEN:i:128\n\
         S\t3\tGGGGACGT\tDP:f:10\n\
         L\t1\t+\t2\t+\t4M\n\
         L\t2\t+\t3\t+\t4M\n",
    );
    let mut g = load_gfa(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let config = UnfoldConfig::default();
    assert_eq!(remove_conflicting_links(&mut g, &config), 1);
    // unplaced node 3 keeps its link
    assert!(!g.has_link_between(NodeId(1), NodeId(2)));
    assert!(g.has_link_between(NodeId(2), NodeId(3)));
}

#[test]
fn unknown_component_pruning_respects_the_keep_flag() {
    let path = temp_gfa(
        "components.gfa",
        "S\t1\tACGTACGT\tDP:f:10\tTP:Z:target\n\
         S\t2\tTTGCACGT\tDP:f:10\n\
         S\t5\tGGGGACGTACGTACGTACGTACGTACGTACGT\tDP:f:10\n\
         S\t6\tCCCCACGTACGTACGTACGTACGTACGTACGT\tDP:f:10\n\
         L\t1\t+\t2\t+\t4M\n\
         L\t5\t+\t6\t+\t4M\n",
    );
    let g0 = load_gfa(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(g0.contig(NodeId(1)).unwrap().class, NodeClass::Target);

    let config = UnfoldConfig::default();

    let mut pruned = g0.clone();
    prune(&mut pruned, &config, StageOptions::default());
    assert!(pruned.has_node(NodeId(1)));
    assert!(pruned.has_node(NodeId(2)));
    assert!(!pruned.has_node(NodeId(5)));
    assert!(!pruned.has_node(NodeId(6)));

    let mut kept = g0.clone();
    let options = StageOptions {
        keep_unknown_components: true,
        ..StageOptions::default()
    };
    prune(&mut kept, &config, options);
    assert_eq!(kept.node_count(), 4);
}

#[test]
fn unequal_length_siblings_are_not_collapsed() {
    let path = temp_gfa(
        "brothers.gfa",
        "S\t1\tACGTAAAA\tDP:f:10\n\
         S\t2\tAAAAGGGG\tDP:f:8\n\
         S\t3\tAAAAGGGGC\tDP:f:6\n\
         S\t4\tGGGGTTTT\tDP:f:10\n\
         L\t1\t+\t2\t+\t4M\n\
         L\t1\t+\t3\t+\t4M\n\
         L\t2\t+\t4\t+\t4M\n\
         L\t3\t+\t4\t+\t4M\n",
    );
    let mut g = load_gfa(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(merge_brothers(&mut g, 90.0).unwrap(), 0);
    assert_eq!(g.node_count(), 4);
}

#[test]
fn simplified_graph_survives_a_gfa_round_trip() {
    let path = temp_gfa(
        "roundtrip.gfa",
        "H\tVN:Z:1.0\n\
         S\t1\tACGTAAA\tDP:f:20\tTP:Z:target\tAC:Z:NC_000913.3\tOR:A:+\tST:i:5\tEN:i:11\n\
         S\t2\tAAACTG\tDP:f:10\n\
         L\t1\t+\t2\t+\t3M\n",
    );
    let mut g = load_gfa(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    merge_neighbours(&mut g).unwrap();

    let out = {
        let mut p = std::env::temp_dir();
        p.push(format!("gfa-unfold-it-{}-roundtrip-out.gfa", std::process::id()));
        p
    };
    write_gfa(&g, &out).unwrap();
    let reloaded = load_gfa(&out).unwrap();
    std::fs::remove_file(&out).unwrap();

    assert_eq!(reloaded.node_count(), 1);
    let contig = reloaded.contig(NodeId(1)).unwrap();
    assert_eq!(contig.sequence, b"ACGTAAACTG");
    assert_eq!(contig.class, NodeClass::Target);
    assert_eq!(contig.accession.as_deref(), Some("NC_000913.3"));
    assert_eq!(contig.ref_start, 5);
    assert_eq!(contig.ref_end, 11);
}
