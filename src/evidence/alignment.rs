//! Aligner hit table: 13 tab-separated columns
//! `query, subject, pident, length, mismatch, gapopen, qstart, qend,
//!  sstart, send, evalue, bitscore, qcovs`.
//!
//! Hits are filtered by alignment length and query coverage, then the
//! surviving hits for each node are reconciled: the full placement (strand
//! and reference span) is trusted only when no second hit comes close to
//! the best one; the strand alone is trusted when every close hit agrees
//! on it.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use fnv::FnvHashMap;

use crate::config::UnfoldConfig;
use crate::graph::{AssemblyGraph, NodeId};
use crate::orient::Strand;

#[derive(Debug, Clone)]
struct Hit {
    accession: String,
    orientation: Strand,
    start: u64,
    end: u64,
    identity: f64,
}

fn parse_hit(line: &str, config: &UnfoldConfig) -> Option<(u64, Hit)> {
    let fields: Vec<&str> = line.trim_end().split('\t').collect();
    if fields.len() < 13 {
        return None;
    }
    let node = fields[0].parse::<u64>().ok()?;
    let length = fields[3].parse::<u64>().ok()?;
    let coverage = fields[12].parse::<f64>().ok()?;
    if length < config.min_match_length || coverage < config.min_query_cover {
        return None;
    }
    let identity = fields[2].parse::<f64>().ok()?;
    let mut start = fields[8].parse::<u64>().ok()?;
    let mut end = fields[9].parse::<u64>().ok()?;
    // a descending subject interval encodes a reverse-strand hit
    let orientation = if start > end {
        std::mem::swap(&mut start, &mut end);
        Strand::Reverse
    } else {
        Strand::Forward
    };
    Some((
        node,
        Hit {
            accession: fields[1].to_string(),
            orientation,
            start,
            end,
            identity,
        },
    ))
}

/// Annotate nodes with their reference placement. Returns the number of
/// nodes that received an accession.
pub fn apply_alignments(
    graph: &mut AssemblyGraph,
    path: &Path,
    config: &UnfoldConfig,
) -> Result<usize> {
    let file = File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut hits: FnvHashMap<NodeId, Vec<Hit>> = Default::default();
    let mut order: Vec<NodeId> = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let Some((node, hit)) = parse_hit(&line, config) else { continue };
        let id = NodeId(node);
        if !graph.has_node(id) {
            continue;
        }
        let entry = hits.entry(id).or_default();
        if entry.is_empty() {
            order.push(id);
        }
        entry.push(hit);
    }

    for id in &order {
        let node_hits = &hits[id];
        let best = &node_hits[0];
        let Some(contig) = graph.node_mut(*id) else { continue };
        contig.accession = Some(best.accession.clone());

        // hits within the identity tolerance of the best compete with it
        let close: Vec<&Hit> = node_hits
            .iter()
            .filter(|h| best.identity - h.identity <= config.identity_tolerance)
            .collect();

        if close.len() == 1 {
            contig.orientation = Some(best.orientation);
            contig.ref_start = best.start;
            contig.ref_end = best.end;
        } else if close.iter().all(|h| h.orientation == best.orientation) {
            contig.orientation = Some(best.orientation);
        }
    }

    Ok(order.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Contig;
    use std::io::Write;

    fn hit_line(node: u64, acc: &str, ident: f64, sstart: u64, send: u64) -> String {
        format!(
            "{}\t{}\t{}\t500\t3\t0\t1\t500\t{}\t{}\t1e-50\t900\t99",
            node, acc, ident, sstart, send
        )
    }

    fn write_hits(name: &str, lines: &[String]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "unfold-hits-{}-{}.tsv",
            std::process::id(),
            name
        ));
        let mut f = File::create(&path).unwrap();
        for line in lines {
            writeln!(f, "{}", line).unwrap();
        }
        path
    }

    fn graph_with(ids: &[u64]) -> AssemblyGraph {
        let mut g = AssemblyGraph::new();
        for &id in ids {
            g.add_node(NodeId(id), Contig::new(b"ACGT".to_vec()));
        }
        g
    }

    #[test]
    fn single_hit_sets_full_placement() {
        let mut g = graph_with(&[1]);
        let path = write_hits("single", &[hit_line(1, "NC_1", 99.0, 200, 100)]);
        apply_alignments(&mut g, &path, &UnfoldConfig::default()).unwrap();
        std::fs::remove_file(&path).unwrap();

        let n = g.node(NodeId(1)).unwrap();
        assert_eq!(n.accession.as_deref(), Some("NC_1"));
        assert_eq!(n.orientation, Some(Strand::Reverse));
        assert_eq!((n.ref_start, n.ref_end), (100, 200));
    }

    #[test]
    fn competing_close_hit_downgrades_to_orientation_only() {
        let mut g = graph_with(&[1]);
        let path = write_hits("competing", &[
            hit_line(1, "NC_1", 99.0, 100, 200),
            hit_line(1, "NC_2", 98.5, 300, 400),
        ]);
        apply_alignments(&mut g, &path, &UnfoldConfig::default()).unwrap();
        std::fs::remove_file(&path).unwrap();

        let n = g.node(NodeId(1)).unwrap();
        assert_eq!(n.accession.as_deref(), Some("NC_1"));
        assert_eq!(n.orientation, Some(Strand::Forward));
        assert_eq!((n.ref_start, n.ref_end), (0, 0));
    }

    #[test]
    fn disagreeing_strands_leave_orientation_unset() {
        let mut g = graph_with(&[1]);
        let path = write_hits("strands", &[
            hit_line(1, "NC_1", 99.0, 100, 200),
            hit_line(1, "NC_2", 98.5, 400, 300),
        ]);
        apply_alignments(&mut g, &path, &UnfoldConfig::default()).unwrap();
        std::fs::remove_file(&path).unwrap();

        let n = g.node(NodeId(1)).unwrap();
        assert_eq!(n.accession.as_deref(), Some("NC_1"));
        assert_eq!(n.orientation, None);
    }

    #[test]
    fn distant_second_hit_does_not_compete() {
        let mut g = graph_with(&[1]);
        let path = write_hits("distant", &[
            hit_line(1, "NC_1", 99.0, 100, 200),
            hit_line(1, "NC_1", 90.0, 300, 400),
        ]);
        apply_alignments(&mut g, &path, &UnfoldConfig::default()).unwrap();
        std::fs::remove_file(&path).unwrap();

        let n = g.node(NodeId(1)).unwrap();
        assert_eq!((n.ref_start, n.ref_end), (100, 200));
    }

    #[test]
    fn short_or_low_coverage_hits_are_filtered() {
        let mut g = graph_with(&[1]);
        let short = "1\tNC_1\t99.0\t30\t0\t0\t1\t30\t1\t30\t1e-5\t50\t99".to_string();
        let low_cov = "1\tNC_1\t99.0\t500\t0\t0\t1\t500\t1\t500\t1e-50\t900\t10".to_string();
        let path = write_hits("filtered", &[short, low_cov]);
        let n = apply_alignments(&mut g, &path, &UnfoldConfig::default()).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(n, 0);
        assert_eq!(g.node(NodeId(1)).unwrap().accession, None);
    }
}
