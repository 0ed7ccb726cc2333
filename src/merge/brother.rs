//! Sibling collapse.
//!
//! Two neighbours of a shared anchor node, reached on the same strand class,
//! are brothers when their sequences have equal length and agree above a
//! similarity threshold (one side reverse-complemented when their relative
//! orientations differ). The pair is collapsed into a per-position IUPAC
//! consensus, and every neighbour of the kept node is then re-patched so the
//! stored overlaps still match the rewritten sequence.

use fnv::FnvHashSet;

use crate::error::{GraphError, Result};
use crate::graph::{AssemblyGraph, NodeId};
use crate::orient::OrientedLink;
use crate::sequence;

/// Collapse all brother pairs in the graph. `similarity` is the minimum
/// percent identity. Returns the number of siblings absorbed.
pub fn merge_brothers(graph: &mut AssemblyGraph, similarity: f64) -> Result<usize> {
    let mut merged = 0;
    for node in graph.node_ids() {
        if !graph.has_node(node) {
            continue;
        }
        // siblings reached leaving the anchor forward, then leaving reverse
        for forward_class in [true, false] {
            merged += collapse_class(graph, node, forward_class, similarity)?;
        }
    }
    Ok(merged)
}

fn sibling_links(graph: &AssemblyGraph, anchor: NodeId, forward_class: bool) -> Vec<crate::graph::LinkId> {
    let buckets = graph.classify_links(anchor);
    if forward_class {
        buckets.forward_class()
    } else {
        buckets.reverse_class()
    }
}

fn collapse_class(
    graph: &mut AssemblyGraph,
    anchor: NodeId,
    forward_class: bool,
    similarity: f64,
) -> Result<usize> {
    let links = sibling_links(graph, anchor, forward_class);
    if links.len() < 2 {
        return Ok(0);
    }

    let mut merged = 0;
    let mut absorbed: FnvHashSet<NodeId> = Default::default();
    for i in 0..links.len() {
        let Ok(kept) = graph.oriented(anchor, links[i]) else { continue };
        if absorbed.contains(&kept.neighbour) {
            continue;
        }
        for j in (i + 1)..links.len() {
            let Ok(other) = graph.oriented(anchor, links[j]) else { continue };
            if absorbed.contains(&other.neighbour) {
                continue;
            }
            // two parallel links to the same neighbour are not a sibling pair
            if other.neighbour == kept.neighbour || other.neighbour == anchor {
                continue;
            }
            if kept.to != other.to {
                return Err(GraphError::SiblingDirection { node: anchor });
            }
            if !is_brother(graph, &kept, &other, similarity)? {
                continue;
            }
            repoint_sibling(graph, anchor, &kept, &other)?;
            fold_sibling(graph, &kept, &other)?;
            patch_neighbours(graph, kept.neighbour)?;
            absorbed.insert(other.neighbour);
            graph.remove_node(other.neighbour);
            merged += 1;
        }
    }
    Ok(merged)
}

/// Equal length and percent identity at or above the threshold, with the
/// second sequence reverse-complemented when the relative orientations
/// toward the anchor differ.
pub(crate) fn is_brother(
    graph: &AssemblyGraph,
    a: &OrientedLink,
    b: &OrientedLink,
    similarity: f64,
) -> Result<bool> {
    let ca = graph.contig(a.neighbour)?;
    let cb = graph.contig(b.neighbour)?;
    if ca.len() != cb.len() {
        return Ok(false);
    }
    let score = if a.from == b.from {
        sequence::percent_identity(&ca.sequence, &cb.sequence)?
    } else {
        let rc = sequence::reverse_complement(&cb.sequence)?;
        sequence::percent_identity(&ca.sequence, &rc)?
    };
    Ok(score >= similarity)
}

/// Move the absorbed sibling's links (other than those touching the anchor)
/// onto the kept sibling. Links that would duplicate an existing connection
/// are dropped; cross-orientation pairs flip the moved end's strand.
fn repoint_sibling(
    graph: &mut AssemblyGraph,
    anchor: NodeId,
    kept: &OrientedLink,
    other: &OrientedLink,
) -> Result<()> {
    let same_orient = kept.from == other.from;
    let keep = kept.neighbour;
    let merge = other.neighbour;

    for in_lid in graph.in_links(merge).to_vec() {
        if in_lid.source == anchor || in_lid.is_self_loop() {
            continue;
        }
        if graph.has_link_between(in_lid.source, keep) {
            continue;
        }
        let Some(mut moved) = graph.link(in_lid).cloned() else { continue };
        if !same_orient {
            moved.label = moved.label.flip_sink();
        }
        graph.add_link(in_lid.source, keep, moved);
    }
    for out_lid in graph.out_links(merge).to_vec() {
        if out_lid.sink == anchor || out_lid.is_self_loop() {
            continue;
        }
        if graph.has_link_between(keep, out_lid.sink) {
            continue;
        }
        let Some(mut moved) = graph.link(out_lid).cloned() else { continue };
        if !same_orient {
            moved.label = moved.label.flip_source();
        }
        graph.add_link(keep, out_lid.sink, moved);
    }
    Ok(())
}

/// Combine the sibling pair into a consensus on the kept node; depths and
/// k-mer counts add since the pair represents pooled reads.
fn fold_sibling(
    graph: &mut AssemblyGraph,
    kept: &OrientedLink,
    other: &OrientedLink,
) -> Result<()> {
    let absorbed = graph.contig(other.neighbour)?.clone();
    let seq2 = if kept.from == other.from {
        absorbed.sequence.clone()
    } else {
        sequence::reverse_complement(&absorbed.sequence)?
    };
    let keep = graph.contig_mut(kept.neighbour)?;
    keep.depth += absorbed.depth;
    if let (Some(kc1), Some(kc2)) = (keep.kmer_count, absorbed.kmer_count) {
        keep.kmer_count = Some(kc1 + kc2);
    }
    keep.sequence = sequence::consensus_sequence(&keep.sequence, &seq2)?;
    Ok(())
}

/// After `node`'s sequence gained degenerate bases, rewrite each direct
/// neighbour so its copy of the shared overlap matches again. The label
/// decides which ends face each other and whether either side reads
/// reverse-complemented.
fn patch_neighbours(graph: &mut AssemblyGraph, node: NodeId) -> Result<()> {
    use crate::orient::Strand::{Forward as F, Reverse as R};

    for in_lid in graph.in_links(node).to_vec() {
        if in_lid.is_self_loop() {
            continue;
        }
        let Some(link) = graph.link(in_lid).cloned() else { continue };
        let seq_u = graph.contig(in_lid.source)?.sequence.clone();
        let seq_v = graph.contig(node)?.sequence.clone();
        let patched = match (link.label.0, link.label.1) {
            (R, R) => sequence::cigar_judge_connect(&seq_v, &seq_u, link.overlap)?,
            (R, F) => {
                let rc = sequence::reverse_complement(&seq_v)?;
                sequence::cigar_judge_connect(&rc, &seq_u, link.overlap)?
            }
            (F, R) => {
                let rc_u = sequence::reverse_complement(&seq_u)?;
                let joined = sequence::cigar_judge_connect(&seq_v, &rc_u, link.overlap)?;
                sequence::reverse_complement(&joined)?
            }
            (F, F) => {
                let rc_v = sequence::reverse_complement(&seq_v)?;
                let rc_u = sequence::reverse_complement(&seq_u)?;
                let joined = sequence::cigar_judge_connect(&rc_v, &rc_u, link.overlap)?;
                sequence::reverse_complement(&joined)?
            }
        };
        graph.contig_mut(in_lid.source)?.sequence = patched;
    }

    for out_lid in graph.out_links(node).to_vec() {
        if out_lid.is_self_loop() {
            continue;
        }
        let Some(link) = graph.link(out_lid).cloned() else { continue };
        let seq_u = graph.contig(node)?.sequence.clone();
        let seq_v = graph.contig(out_lid.sink)?.sequence.clone();
        let patched = match (link.label.0, link.label.1) {
            (F, F) => sequence::cigar_judge_connect(&seq_u, &seq_v, link.overlap)?,
            (R, F) => {
                let rc = sequence::reverse_complement(&seq_u)?;
                sequence::cigar_judge_connect(&rc, &seq_v, link.overlap)?
            }
            (F, R) => {
                let rc_v = sequence::reverse_complement(&seq_v)?;
                let joined = sequence::cigar_judge_connect(&seq_u, &rc_v, link.overlap)?;
                sequence::reverse_complement(&joined)?
            }
            (R, R) => {
                let rc_u = sequence::reverse_complement(&seq_u)?;
                let rc_v = sequence::reverse_complement(&seq_v)?;
                let joined = sequence::cigar_judge_connect(&rc_u, &rc_v, link.overlap)?;
                sequence::reverse_complement(&joined)?
            }
        };
        graph.contig_mut(out_lid.sink)?.sequence = patched;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Contig, Link};
    use crate::orient::{EdgeLabel, Strand};
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

    // anchor 1 feeding two siblings 2 and 3 with identical-length sequences
    fn sibling_fan(seq2: &[u8], seq3: &[u8]) -> AssemblyGraph {
        let mut g = AssemblyGraph::new();
        node(&mut g, 1, b"ACGTAC", 10.0);
        node(&mut g, 2, seq2, 5.0);
        node(&mut g, 3, seq3, 7.0);
        link(&mut g, 1, 2, F, F, 2);
        link(&mut g, 1, 3, F, F, 2);
        g
    }

    #[test]
    fn identical_siblings_collapse_to_consensus() {
        let mut g = sibling_fan(b"ACGGGGTT", b"ACGGGGTT");
        let merged = merge_brothers(&mut g, 90.0).unwrap();
        assert_eq!(merged, 1);
        assert_eq!(g.node_count(), 2);
        let kept = g.contig(NodeId(2)).unwrap();
        assert_eq!(kept.sequence, b"ACGGGGTT");
        assert!((kept.depth - 12.0).abs() < 1e-9);
    }

    #[test]
    fn near_identical_siblings_pick_up_degenerate_bases() {
        // one mismatch in 8 positions = 87.5%, passes at 80
        let mut g = sibling_fan(b"ACGGGGTT", b"ACGGGGCT");
        assert_eq!(merge_brothers(&mut g, 80.0).unwrap(), 1);
        // consensus of T and C is Y
        assert_eq!(g.contig(NodeId(2)).unwrap().sequence, b"ACGGGGYT");
    }

    #[test]
    fn unequal_length_never_merges() {
        let mut g = sibling_fan(b"ACGGGGTT", b"ACGGGGTT");
        g.contig_mut(NodeId(3)).unwrap().sequence = b"ACGGGGTTA".to_vec();
        assert_eq!(merge_brothers(&mut g, 0.0).unwrap(), 0);
        assert_eq!(g.node_count(), 3);
    }

    #[test]
    fn dissimilar_siblings_stay_apart() {
        let mut g = sibling_fan(b"ACGGGGTT", b"ACTTTTCC");
        assert_eq!(merge_brothers(&mut g, 90.0).unwrap(), 0);
        assert_eq!(g.node_count(), 3);
    }

    #[test]
    fn opposite_orientation_sibling_is_compared_reverse_complemented() {
        // sibling 3 carries the reverse complement of sibling 2 and is
        // anchored on the opposite strand: 3 -> 1 with (+,-) puts it in the
        // anchor's forward class alongside 1 -> 2
        let mut g = AssemblyGraph::new();
        node(&mut g, 1, b"ACGTAC", 10.0);
        node(&mut g, 2, b"ACGGGGTT", 5.0);
        node(&mut g, 3, b"AACCCCGT", 7.0); // revcomp = ACGGGGTT
        link(&mut g, 1, 2, F, F, 2);
        link(&mut g, 3, 1, F, R, 2);

        assert_eq!(merge_brothers(&mut g, 90.0).unwrap(), 1);
        assert_eq!(g.node_count(), 2);
        assert!(g.has_node(NodeId(2)));
        assert!(!g.has_node(NodeId(3)));
    }

    #[test]
    fn absorbed_siblings_other_links_move_to_the_kept_one() {
        let mut g = sibling_fan(b"ACGGGGTT", b"ACGGGGTT");
        node(&mut g, 4, b"TTGGCC", 3.0);
        link(&mut g, 3, 4, F, F, 2);

        assert_eq!(merge_brothers(&mut g, 90.0).unwrap(), 1);
        assert!(g.has_link_between(NodeId(2), NodeId(4)));
        assert!(!g.has_node(NodeId(3)));
    }
}
