//! Reference unfolding: place contigs on reference accessions by alignment
//! and cut the links that contradict the placement, by accession, strand
//! parity, or distance on the reference.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::UnfoldConfig;
use crate::conversion;
use crate::evidence::apply_alignments;
use crate::graph::{AssemblyGraph, LinkId};
use crate::orient::{EdgeLabel, Strand};
use crate::tools;

use super::{finish_stage, StageIo, StageOptions};

#[derive(Debug, Clone, Default)]
pub struct ReferenceOptions {
    /// Trust the `AC`/`OR`/`ST`/`EN` annotation already in the input graph.
    pub use_gfa_annotation: bool,
    /// Precomputed aligner output; skips the aligner run.
    pub alignment: Option<PathBuf>,
    pub aligner_db: Option<PathBuf>,
}

pub fn unfold(
    graph: &mut AssemblyGraph,
    config: &UnfoldConfig,
    options: StageOptions,
    io: &StageIo,
    reference: &ReferenceOptions,
) -> Result<()> {
    info!("reference unfold");
    let dir = io.stage_dir("reference")?;

    if !reference.use_gfa_annotation {
        for id in graph.node_ids() {
            if let Some(contig) = graph.node_mut(id) {
                contig.accession = None;
                contig.orientation = None;
                contig.ref_start = 0;
                contig.ref_end = 0;
            }
        }
        let table = match &reference.alignment {
            Some(path) => path.clone(),
            None => {
                let fasta = io.stage_file(&dir, "seq_for_aligner.fa");
                conversion::write_fasta(graph, &fasta, false)?;
                let out = io.stage_file(&dir, "aligner_out.txt");
                let db = reference
                    .aligner_db
                    .as_ref()
                    .context("reference unfolding needs an aligner database")?;
                tools::run_aligner(config, &fasta, db, &out, io.threads)?;
                out
            }
        };
        let placed = apply_alignments(graph, &table, config)?;
        info!("placed {} contigs on the reference", placed);
    }

    let cut = remove_conflicting_links(graph, config);
    info!("removed {} links contradicting the reference", cut);

    finish_stage(graph, config, options, &io.stage_file(&dir, "ref_output.gfa"))
}

/// Cut every link whose endpoints disagree with the reference placement.
pub fn remove_conflicting_links(graph: &mut AssemblyGraph, config: &UnfoldConfig) -> usize {
    let mut doomed: Vec<LinkId> = Vec::new();
    for lid in graph.link_ids() {
        let (Some(a), Some(b), Some(link)) = (
            graph.node(lid.source),
            graph.node(lid.sink),
            graph.link(lid),
        ) else {
            continue;
        };
        let ok = accession_compatible(a.accession.as_deref(), b.accession.as_deref())
            && orientation_compatible(a.orientation, b.orientation, link.label)
            && position_compatible(
                (a.ref_start, a.ref_end),
                (b.ref_start, b.ref_end),
                config.position_distance,
            );
        if !ok {
            doomed.push(lid);
        }
    }
    for lid in &doomed {
        graph.remove_link(*lid);
    }
    doomed.len()
}

/// Two placed contigs may stay connected only on the same accession; an
/// unplaced side is never evidence against a link.
fn accession_compatible(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

/// The number of reverse indicators among the two node orientations and the
/// two label strands must be even for the traversal to be geometrically
/// possible on one reference strand.
fn orientation_compatible(a: Option<Strand>, b: Option<Strand>, label: EdgeLabel) -> bool {
    let (Some(a), Some(b)) = (a, b) else { return true };
    let count = [a, b, label.0, label.1]
        .iter()
        .filter(|s| s.is_reverse())
        .count();
    count % 2 == 0
}

/// Reference spans must sit within the configured distance of each other,
/// in either order; an unset span (start 0) is never evidence.
fn position_compatible(a: (u64, u64), b: (u64, u64), distance: u64) -> bool {
    let ((start1, end1), (start2, end2)) = (a, b);
    if start1 == 0 || start2 == 0 {
        return true;
    }
    end1.abs_diff(start2) <= distance || end2.abs_diff(start1) <= distance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Contig, Link, NodeId};
    use crate::sequence::Overlap;
    use crate::orient::Strand::{Forward as F, Reverse as R};

    fn placed(acc: &str, or: Strand, span: (u64, u64)) -> Contig {
        let mut c = Contig::new(b"ACGTACGT".to_vec());
        c.accession = Some(acc.into());
        c.orientation = Some(or);
        c.ref_start = span.0;
        c.ref_end = span.1;
        c
    }

    fn pair(c1: Contig, c2: Contig, label: EdgeLabel) -> AssemblyGraph {
        let mut g = AssemblyGraph::new();
        g.add_node(NodeId(1), c1);
        g.add_node(NodeId(2), c2);
        g.add_link(NodeId(1), NodeId(2), Link::new(label, Overlap(2)));
        g
    }

    #[test]
    fn conflicting_accessions_cut_the_link() {
        let mut g = pair(
            placed("NC_1", F, (100, 200)),
            placed("NC_2", F, (150, 250)),
            EdgeLabel(F, F),
        );
        assert_eq!(remove_conflicting_links(&mut g, &UnfoldConfig::default()), 1);
    }

    #[test]
    fn unplaced_side_is_not_evidence() {
        let mut g = pair(
            placed("NC_1", F, (100, 200)),
            Contig::new(b"ACGTACGT".to_vec()),
            EdgeLabel(F, F),
        );
        assert_eq!(remove_conflicting_links(&mut g, &UnfoldConfig::default()), 0);
    }

    #[test]
    fn odd_strand_parity_cuts_the_link() {
        // both contigs forward on the reference but the link crosses strands
        let mut g = pair(
            placed("NC_1", F, (100, 200)),
            placed("NC_1", F, (150, 250)),
            EdgeLabel(F, R),
        );
        assert_eq!(remove_conflicting_links(&mut g, &UnfoldConfig::default()), 1);

        // flipping one contig makes the parity even again
        let mut g = pair(
            placed("NC_1", R, (100, 200)),
            placed("NC_1", F, (150, 250)),
            EdgeLabel(F, R),
        );
        assert_eq!(remove_conflicting_links(&mut g, &UnfoldConfig::default()), 0);
    }

    #[test]
    fn distant_reference_spans_cut_the_link() {
        let mut g = pair(
            placed("NC_1", F, (100, 200)),
            placed("NC_1", F, (5000, 6000)),
            EdgeLabel(F, F),
        );
        assert_eq!(remove_conflicting_links(&mut g, &UnfoldConfig::default()), 1);

        let mut g = pair(
            placed("NC_1", F, (100, 200)),
            placed("NC_1", F, (250, 500)),
            EdgeLabel(F, F),
        );
        assert_eq!(remove_conflicting_links(&mut g, &UnfoldConfig::default()), 0);
    }
}
