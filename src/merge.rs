//! Structural rewrites: chain contraction, sibling collapse, junction split.
//!
//! All three mergers share the orientation-aware property fold defined here.
//! The fold is directional: `keep` survives, `merge` is absorbed, and the
//! connecting label decides how the two sequences line up.

use fnv::FnvHashSet;

use crate::error::Result;
use crate::graph::{AssemblyGraph, LinkId, NodeId};
use crate::orient::EdgeLabel;
use crate::sequence::{self, Overlap};

pub mod brother;
pub mod neighbour;
pub mod split;

pub use brother::merge_brothers;
pub use neighbour::merge_neighbours;
pub use split::split_parents;

/// Fold `merge`'s attributes into `keep` across a link with the given label
/// and overlap. The sequences are joined with [`sequence::cigar_merge`],
/// reverse-complementing the absorbed side on cross-strand labels.
pub(crate) fn merge_properties(
    graph: &mut AssemblyGraph,
    keep: NodeId,
    merge: NodeId,
    label: EdgeLabel,
    overlap: Overlap,
) -> Result<()> {
    let absorbed = graph.contig(merge)?.clone();
    let kept = graph.contig(keep)?;
    let keep_len = kept.len();
    let merge_len = absorbed.len();

    use crate::orient::Strand::{Forward as F, Reverse as R};
    let new_seq = match (label.0, label.1) {
        (F, F) => sequence::cigar_merge(&kept.sequence, &absorbed.sequence, overlap)?,
        (R, R) => sequence::cigar_merge(&absorbed.sequence, &kept.sequence, overlap)?,
        (F, R) => {
            let rc = sequence::reverse_complement(&absorbed.sequence)?;
            sequence::cigar_merge(&kept.sequence, &rc, overlap)?
        }
        (R, F) => {
            let rc = sequence::reverse_complement(&absorbed.sequence)?;
            sequence::cigar_merge(&rc, &kept.sequence, overlap)?
        }
    };

    let kept = graph.contig_mut(keep)?;

    // depth is a length-weighted average, rounded to two decimals
    if keep_len + merge_len > 0 {
        let weighted = (kept.depth * keep_len as f64 + absorbed.depth * merge_len as f64)
            / (keep_len + merge_len) as f64;
        kept.depth = (weighted * 100.0).round() / 100.0;
    }
    if let (Some(kc1), Some(kc2)) = (kept.kmer_count, absorbed.kmer_count) {
        kept.kmer_count = Some(kc1 + kc2);
    }

    // widen the reference span; 0 means unset
    if absorbed.ref_start != 0
        && (kept.ref_start == 0 || kept.ref_start > absorbed.ref_start)
    {
        kept.ref_start = absorbed.ref_start;
    }
    if kept.ref_end < absorbed.ref_end {
        kept.ref_end = absorbed.ref_end;
    }
    if kept.accession.is_none() {
        kept.accession = absorbed.accession.clone();
    }
    if kept.class == crate::graph::NodeClass::Unknown {
        kept.class = absorbed.class;
    }
    // carry orientation over, flipping polarity on cross-strand labels
    if kept.orientation.is_none() {
        if let Some(or) = absorbed.orientation {
            kept.orientation = Some(if label.0 == label.1 { or } else { or.flip() });
        }
    }

    kept.sequence = new_seq;
    Ok(())
}

/// Drop one of each anti-parallel duplicate pair: a link `u -> v` and a link
/// `v -> u` whose label is the flip of the first describe the same physical
/// overlap twice. The lower-sorted link of the pair is kept.
pub fn remove_redundant_links(graph: &mut AssemblyGraph) {
    let mut marked: FnvHashSet<LinkId> = Default::default();
    for lid in graph.link_ids() {
        if marked.contains(&lid) {
            continue;
        }
        let Some(link) = graph.link(lid) else { continue };
        let want = link.label.flipped();
        let reverse = graph
            .out_links(lid.sink)
            .iter()
            .copied()
            .filter(|r| r.sink == lid.source && *r != lid && !marked.contains(r))
            .find(|r| graph.link(*r).map(|l| l.label == want).unwrap_or(false));
        if let Some(r) = reverse {
            marked.insert(r);
        }
    }
    for lid in marked {
        graph.remove_link(lid);
    }
}
