//! Diamond junction resolution.
//!
//! A junction with exactly two oriented arrivals and two oriented departures
//! sits between two pairs of candidate haplotypes. When each pair is
//! coverage-asymmetric (one deep, one shallow), the aggregate depths are
//! consistent, and each pair passes the sibling similarity test, the
//! junction is split: the shallow arrival is wired to the shallow departure,
//! the deep arrival to the deep departure, and the junction's sequence is
//! folded into both arrival-side neighbours before it is deleted.

use crate::error::{GraphError, Result};
use crate::graph::{AssemblyGraph, Link, NodeId};
use crate::orient::{EdgeLabel, OrientedLink, Strand};

use super::brother::is_brother;
use super::merge_properties;

/// Split every qualifying diamond junction. `depth_multi` is the required
/// within-side depth ratio (and the allowed aggregate spread);
/// `similarity` is the sibling identity threshold. Returns the number of
/// junctions removed.
pub fn split_parents(
    graph: &mut AssemblyGraph,
    depth_multi: f64,
    similarity: f64,
) -> Result<usize> {
    let mut split = 0;
    for node in graph.node_ids() {
        if !graph.has_node(node) {
            continue;
        }
        if try_split(graph, node, depth_multi, similarity)? {
            split += 1;
        }
    }
    Ok(split)
}

fn try_split(
    graph: &mut AssemblyGraph,
    node: NodeId,
    depth_multi: f64,
    similarity: f64,
) -> Result<bool> {
    let buckets = graph.classify_links(node);
    let arrivals = buckets.reverse_class();
    let departures = buckets.forward_class();
    if arrivals.len() != 2 || departures.len() != 2 {
        return Ok(false);
    }

    let in1 = graph.oriented(node, arrivals[0])?;
    let in2 = graph.oriented(node, arrivals[1])?;
    let out1 = graph.oriented(node, departures[0])?;
    let out2 = graph.oriented(node, departures[1])?;

    if in1.to != in2.to || out1.to != out2.to {
        return Err(GraphError::SiblingDirection { node });
    }
    if !unbranched(graph, &in1)
        || !unbranched(graph, &in2)
        || !unbranched(graph, &out1)
        || !unbranched(graph, &out2)
    {
        return Ok(false);
    }
    if !depth_consistent(graph, node, (&in1, &in2), (&out1, &out2), depth_multi)? {
        return Ok(false);
    }
    if !is_brother(graph, &in1, &in2, similarity)?
        || !is_brother(graph, &out1, &out2, similarity)?
    {
        return Ok(false);
    }

    let (in_low, in_high) = rank_by_depth(graph, in1, in2)?;
    let (out_low, out_high) = rank_by_depth(graph, out1, out2)?;

    rewire(graph, &out_low, &in_low);
    rewire(graph, &out_high, &in_high);

    for lid in graph.incident_links(node) {
        graph.remove_link(lid);
    }

    // the junction's sequence belongs to both resolved paths; fold it into
    // each arrival-side neighbour before dropping the node
    merge_properties(
        graph,
        in_low.neighbour,
        node,
        EdgeLabel(in_low.from, in_low.to),
        in_low.overlap,
    )?;
    merge_properties(
        graph,
        in_high.neighbour,
        node,
        EdgeLabel(in_high.from, in_high.to),
        in_high.overlap,
    )?;
    graph.remove_node(node);
    Ok(true)
}

/// The neighbour must continue toward the junction on exactly one oriented
/// link, with no competing branch on that strand.
fn unbranched(graph: &AssemblyGraph, side: &OrientedLink) -> bool {
    let buckets = graph.classify_links(side.neighbour);
    match side.from {
        Strand::Forward => buckets.forward_class().len() == 1,
        Strand::Reverse => buckets.reverse_class().len() == 1,
    }
}

fn depth_consistent(
    graph: &AssemblyGraph,
    node: NodeId,
    arrivals: (&OrientedLink, &OrientedLink),
    departures: (&OrientedLink, &OrientedLink),
    depth_multi: f64,
) -> Result<bool> {
    let center = graph.contig(node)?.depth;
    let in1 = graph.contig(arrivals.0.neighbour)?.depth;
    let in2 = graph.contig(arrivals.1.neighbour)?.depth;
    let out1 = graph.contig(departures.0.neighbour)?.depth;
    let out2 = graph.contig(departures.1.neighbour)?.depth;

    let ratio = |a: f64, b: f64| -> Option<f64> {
        let (hi, lo) = if a > b { (a, b) } else { (b, a) };
        (lo > 0.0).then(|| hi / lo)
    };

    // each side must be clearly coverage-asymmetric
    match (ratio(in1, in2), ratio(out1, out2)) {
        (Some(r1), Some(r2)) if r1 >= depth_multi && r2 >= depth_multi => {}
        _ => return Ok(false),
    }
    // the three aggregates must agree within the same multiplier
    match ratio(center.max(in1 + in2).max(out1 + out2), center.min(in1 + in2).min(out1 + out2)) {
        Some(r) if r <= depth_multi => Ok(true),
        _ => Ok(false),
    }
}

fn rank_by_depth(
    graph: &AssemblyGraph,
    a: OrientedLink,
    b: OrientedLink,
) -> Result<(OrientedLink, OrientedLink)> {
    let da = graph.contig(a.neighbour)?.depth;
    let db = graph.contig(b.neighbour)?.depth;
    if da > db {
        Ok((b, a))
    } else {
        Ok((a, b))
    }
}

/// Connect a departure-side neighbour directly to its matched arrival-side
/// neighbour, composing the label from the two traversal tuples.
fn rewire(graph: &mut AssemblyGraph, departure: &OrientedLink, arrival: &OrientedLink) {
    let label = if arrival.from == arrival.to {
        EdgeLabel(departure.from, departure.to)
    } else {
        EdgeLabel(departure.from, departure.to.flip())
    };
    graph.add_link(
        departure.neighbour,
        arrival.neighbour,
        Link::new(label, departure.overlap),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Contig;
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

    // A1/A2 -> C -> B1/B2, every overlap 2 bases, arrivals end in "GG",
    // C = "GGTTAA", departures begin with "AA"
    fn diamond(da1: f64, da2: f64, dc: f64, db1: f64, db2: f64) -> AssemblyGraph {
        let mut g = AssemblyGraph::new();
        node(&mut g, 10, b"CCCAGG", da1);
        node(&mut g, 11, b"CCCTGG", da2);
        node(&mut g, 1, b"GGTTAA", dc);
        node(&mut g, 20, b"AACGCA", db1);
        node(&mut g, 21, b"AACGCC", db2);
        link(&mut g, 10, 1, F, F, 2);
        link(&mut g, 11, 1, F, F, 2);
        link(&mut g, 1, 20, F, F, 2);
        link(&mut g, 1, 21, F, F, 2);
        g
    }

    #[test]
    fn coverage_asymmetric_diamond_splits_into_two_chains() {
        let mut g = diamond(10.0, 100.0, 50.0, 12.0, 95.0);
        assert_eq!(split_parents(&mut g, 5.0, 80.0).unwrap(), 1);
        assert!(!g.has_node(NodeId(1)));
        assert_eq!(g.node_count(), 4);
        // shallow with shallow, deep with deep
        assert!(g.has_link_between(NodeId(20), NodeId(10)));
        assert!(g.has_link_between(NodeId(21), NodeId(11)));
        assert!(!g.has_link_between(NodeId(20), NodeId(11)));
        // the junction sequence was folded into both arrival-side nodes
        assert_eq!(g.contig(NodeId(10)).unwrap().sequence, b"CCCAGGTTAA");
        assert_eq!(g.contig(NodeId(11)).unwrap().sequence, b"CCCTGGTTAA");
        for id in g.node_ids() {
            assert!(g.degree(id) <= 2);
        }
    }

    #[test]
    fn balanced_depths_do_not_split() {
        let mut g = diamond(50.0, 55.0, 100.0, 50.0, 52.0);
        assert_eq!(split_parents(&mut g, 5.0, 80.0).unwrap(), 0);
        assert!(g.has_node(NodeId(1)));
    }

    #[test]
    fn inconsistent_aggregate_depth_blocks_the_split() {
        // sides are asymmetric but the junction depth is far off both sums
        let mut g = diamond(10.0, 100.0, 1000.0, 12.0, 95.0);
        assert_eq!(split_parents(&mut g, 5.0, 80.0).unwrap(), 0);
    }

    #[test]
    fn dissimilar_side_pair_blocks_the_split() {
        let mut g = diamond(10.0, 100.0, 50.0, 12.0, 95.0);
        g.contig_mut(NodeId(11)).unwrap().sequence = b"TTTTTT".to_vec();
        assert_eq!(split_parents(&mut g, 5.0, 80.0).unwrap(), 0);
    }

    #[test]
    fn extra_branch_on_a_neighbour_blocks_the_split() {
        let mut g = diamond(10.0, 100.0, 50.0, 12.0, 95.0);
        node(&mut g, 30, b"AGCCCC", 10.0);
        link(&mut g, 10, 30, F, F, 2);
        assert_eq!(split_parents(&mut g, 5.0, 80.0).unwrap(), 0);
    }
}
