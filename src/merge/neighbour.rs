//! Linear-chain contraction.
//!
//! A node with exactly one extension in a canonical direction, whose far
//! neighbour has exactly one matching return link and no competing branch,
//! absorbs that neighbour. The pass repeats from the same node until its
//! neighbourhood stops qualifying, so whole chains collapse in one sweep.

use crate::error::Result;
use crate::graph::{AssemblyGraph, LinkId, NodeId};
use crate::orient::Strand;

use super::{merge_properties, remove_redundant_links};

/// Contract every unbranched chain in the graph. Returns the number of
/// nodes absorbed.
pub fn merge_neighbours(graph: &mut AssemblyGraph) -> Result<usize> {
    remove_redundant_links(graph);
    let mut merged = 0;
    for node in graph.node_ids() {
        while graph.has_node(node) {
            if let Some(lid) = qualifying_extension(graph, node) {
                contract(graph, node, lid)?;
                merged += 1;
            } else {
                break;
            }
        }
    }
    Ok(merged)
}

/// An out-link of `node` that extends an unbranched chain, if any.
///
/// `node` must be the sole departure on its strand (no returning link on
/// the mirror strand), and the neighbour's arrival strand must likewise be
/// its only connection back with no branch leaving it.
fn qualifying_extension(graph: &AssemblyGraph, node: NodeId) -> Option<LinkId> {
    let buckets = graph.classify_links(node);

    let candidates = [
        (&buckets.plus_out, &buckets.minus_in),
        (&buckets.minus_out, &buckets.plus_in),
    ];
    for (out, mirror_in) in candidates {
        if out.len() != 1 || !mirror_in.is_empty() {
            continue;
        }
        let lid = out[0];
        let link = graph.link(lid)?;
        let far = graph.classify_links(lid.sink);
        let ok = match link.label.1 {
            Strand::Forward => far.plus_in.len() == 1 && far.minus_out.is_empty(),
            Strand::Reverse => far.minus_in.len() == 1 && far.plus_out.is_empty(),
        };
        if ok {
            return Some(lid);
        }
    }
    None
}

fn contract(graph: &mut AssemblyGraph, keep: NodeId, lid: LinkId) -> Result<()> {
    let merge = lid.sink;
    let link = match graph.link(lid) {
        Some(l) => l.clone(),
        None => return Ok(()),
    };
    merge_properties(graph, keep, merge, link.label, link.overlap)?;

    // repoint the absorbed node's remaining links onto the kept node;
    // a cross-strand connection flips the strand on the moved end
    let cross = link.label.0 != link.label.1;
    for in_lid in graph.in_links(merge).to_vec() {
        if in_lid.source == keep || in_lid.is_self_loop() {
            continue;
        }
        let Some(mut moved) = graph.link(in_lid).cloned() else { continue };
        if cross {
            moved.label = moved.label.flip_sink();
        }
        graph.add_link(in_lid.source, keep, moved);
    }
    for out_lid in graph.out_links(merge).to_vec() {
        if out_lid.sink == keep || out_lid.is_self_loop() {
            continue;
        }
        let Some(mut moved) = graph.link(out_lid).cloned() else { continue };
        if cross {
            moved.label = moved.label.flip_source();
        }
        graph.add_link(keep, out_lid.sink, moved);
    }
    graph.remove_node(merge);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Contig, Link};
    use crate::orient::EdgeLabel;
    use crate::sequence::Overlap;
    use crate::orient::Strand::{Forward as F, Reverse as R};

    fn node(g: &mut AssemblyGraph, id: u64, seq: &[u8], depth: f64) {
        let mut c = Contig::new(seq.to_vec());
        c.depth = depth;
        g.add_node(NodeId(id), c);
    }

    fn link(g: &mut AssemblyGraph, a: u64, b: u64, s1: Strand, s2: Strand, n: usize) {
        g.add_link(
            NodeId(a),
            NodeId(b),
            Link::new(EdgeLabel(s1, s2), Overlap(n)),
        );
    }

    #[test]
    fn simple_chain_contracts_into_one_node() {
        let mut g = AssemblyGraph::new();
        node(&mut g, 1, b"ACGTAAA", 10.0);
        node(&mut g, 2, b"AAACTG", 10.0);
        link(&mut g, 1, 2, F, F, 3);

        let merged = merge_neighbours(&mut g).unwrap();
        assert_eq!(merged, 1);
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.link_count(), 0);
        assert_eq!(g.contig(NodeId(1)).unwrap().sequence, b"ACGTAAACTG");
    }

    #[test]
    fn merge_is_confluent() {
        let mut g = AssemblyGraph::new();
        node(&mut g, 1, b"ACGTAAA", 10.0);
        node(&mut g, 2, b"AAACTGCC", 10.0);
        node(&mut g, 3, b"CCTTGG", 10.0);
        link(&mut g, 1, 2, F, F, 3);
        link(&mut g, 2, 3, F, F, 2);

        assert!(merge_neighbours(&mut g).unwrap() > 0);
        let after_first: Vec<_> = g.node_ids();
        let seq_first = g.contig(after_first[0]).unwrap().sequence.clone();

        assert_eq!(merge_neighbours(&mut g).unwrap(), 0);
        assert_eq!(g.node_ids(), after_first);
        assert_eq!(g.contig(after_first[0]).unwrap().sequence, seq_first);
        assert_eq!(seq_first, b"ACGTAAACTGCCTTGG");
    }

    #[test]
    fn branch_point_blocks_contraction() {
        let mut g = AssemblyGraph::new();
        node(&mut g, 1, b"ACGTAAA", 10.0);
        node(&mut g, 2, b"AAACTG", 10.0);
        node(&mut g, 3, b"TTACTG", 10.0);
        // node 2 has two arrivals on '+', so neither chain may contract
        link(&mut g, 1, 2, F, F, 3);
        link(&mut g, 3, 2, F, F, 3);

        assert_eq!(merge_neighbours(&mut g).unwrap(), 0);
        assert_eq!(g.node_count(), 3);
    }

    #[test]
    fn cross_strand_chain_reverse_complements_the_absorbed_side() {
        let mut g = AssemblyGraph::new();
        node(&mut g, 1, b"ACGTAAA", 10.0);
        node(&mut g, 2, b"CAGTTT", 10.0); // revcomp = AAACTG
        link(&mut g, 1, 2, F, R, 3);

        assert_eq!(merge_neighbours(&mut g).unwrap(), 1);
        assert_eq!(g.contig(NodeId(1)).unwrap().sequence, b"ACGTAAACTG");
    }

    #[test]
    fn repointed_links_flip_on_cross_strand_merge() {
        let mut g = AssemblyGraph::new();
        node(&mut g, 1, b"ACGTAAA", 10.0);
        node(&mut g, 2, b"CAGTTT", 10.0);
        node(&mut g, 3, b"GGGG", 10.0);
        node(&mut g, 4, b"CCCC", 10.0);
        link(&mut g, 1, 2, F, R, 3);
        // downstream continuation of node 2 on its '-' strand, plus a branch
        // into node 2 that keeps 3 and 4 from merging into it first
        link(&mut g, 2, 3, R, F, 2);
        link(&mut g, 4, 3, F, F, 2);

        merge_neighbours(&mut g).unwrap();
        assert!(!g.has_node(NodeId(2)));
        // 2 -> 3 was carried over to 1 -> 3 with its source strand flipped
        let carried: Vec<_> = g
            .out_links(NodeId(1))
            .iter()
            .filter(|l| l.sink == NodeId(3))
            .collect();
        assert_eq!(carried.len(), 1);
        let moved = g.link(*carried[0]).unwrap();
        assert_eq!(moved.label, EdgeLabel(F, F));
    }
}
