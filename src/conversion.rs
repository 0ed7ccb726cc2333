//! GFA1 import and export.
//!
//! Segments carry the contig sequence plus assembler depth tags (`DP:f` or
//! lowercase `dp:f`, `KC:i`); annotation written by a previous run rides
//! along as `TP:Z` (class), `AC:Z` (reference accession), `OR:A` (reference
//! strand) and `ST:i`/`EN:i` (reference span). Links must carry a single
//! `<N>M` overlap; `*` overlaps are rejected up front rather than surfacing
//! as a merge failure later.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use bstr::ByteSlice;
use gfa::{
    gfa::{Orientation, GFA},
    optfields::{OptField, OptFieldVal, OptFields, OptionalFields},
    parser::GFAParser,
};

use crate::graph::{AssemblyGraph, Contig, Link, NodeClass, NodeId};
use crate::orient::{EdgeLabel, Strand};
use crate::sequence::{self, Overlap};

fn strand_of(orient: Orientation) -> Strand {
    match orient {
        Orientation::Forward => Strand::Forward,
        Orientation::Backward => Strand::Reverse,
    }
}

fn field<'a>(opts: &'a OptionalFields, tag: &[u8]) -> Option<&'a OptField> {
    opts.get_field(tag)
}

fn float_tag(opts: &OptionalFields, tag: &[u8]) -> Option<f64> {
    match field(opts, tag)?.value {
        OptFieldVal::Float(v) => Some(v as f64),
        OptFieldVal::Int(v) => Some(v as f64),
        _ => None,
    }
}

fn int_tag(opts: &OptionalFields, tag: &[u8]) -> Option<i64> {
    match field(opts, tag)?.value {
        OptFieldVal::Int(v) => Some(v),
        _ => None,
    }
}

fn str_tag(opts: &OptionalFields, tag: &[u8]) -> Option<String> {
    match &field(opts, tag)?.value {
        OptFieldVal::Z(v) => Some(v.to_str_lossy().into_owned()),
        OptFieldVal::A(v) => Some((*v as char).to_string()),
        _ => None,
    }
}

/// Parse a GFA1 file into an [`AssemblyGraph`].
pub fn load_gfa(path: &Path) -> Result<AssemblyGraph> {
    let parser: GFAParser<usize, OptionalFields> = GFAParser::new();
    let gfa: GFA<usize, OptionalFields> = parser
        .parse_file(path)
        .map_err(|e| anyhow!("failed to parse {}: {}", path.display(), e))?;
    graph_from_gfa(&gfa)
}

pub fn graph_from_gfa(gfa: &GFA<usize, OptionalFields>) -> Result<AssemblyGraph> {
    let mut graph = AssemblyGraph::new();

    for segment in gfa.segments.iter() {
        let id = NodeId(segment.name as u64);
        let sequence = if segment.sequence.as_slice() == b"*" {
            Vec::new()
        } else {
            segment.sequence.to_vec()
        };
        let mut contig = Contig::new(sequence);

        contig.kmer_count = int_tag(&segment.optional, b"KC").map(|v| v as u64);
        contig.depth = float_tag(&segment.optional, b"DP")
            .or_else(|| float_tag(&segment.optional, b"dp"))
            .or_else(|| match (contig.kmer_count, contig.len()) {
                (Some(kc), len) if len > 0 => Some(kc as f64 / len as f64),
                _ => None,
            })
            .unwrap_or(0.0);

        if let Some(tag) = str_tag(&segment.optional, b"TP") {
            contig.class = NodeClass::from_tag(&tag);
        }
        contig.accession =
            str_tag(&segment.optional, b"AC").filter(|a| a != "-" && a != "?");
        contig.orientation = str_tag(&segment.optional, b"OR")
            .and_then(|s| s.chars().next())
            .and_then(|c| Strand::from_char(c).ok());
        contig.ref_start =
            int_tag(&segment.optional, b"ST").map(|v| v.max(0) as u64).unwrap_or(0);
        contig.ref_end =
            int_tag(&segment.optional, b"EN").map(|v| v.max(0) as u64).unwrap_or(0);

        graph.add_node(id, contig);
    }

    for link in gfa.links.iter() {
        let source = NodeId(link.from_segment as u64);
        let sink = NodeId(link.to_segment as u64);
        let overlap = Overlap::parse(link.overlap.as_slice())
            .with_context(|| format!("link {} -> {}", source, sink))?;
        let label =
            EdgeLabel(strand_of(link.from_orient), strand_of(link.to_orient));
        graph.add_link(source, sink, Link::new(label, overlap));
    }

    Ok(graph)
}

/// Write the graph back out as GFA1, sorted by node and link id so the
/// output is stable across runs.
pub fn write_gfa(graph: &AssemblyGraph, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "H\tVN:Z:1.0")?;

    for id in graph.node_ids() {
        let Some(contig) = graph.node(id) else { continue };
        write!(out, "S\t{}\t", id)?;
        if contig.is_empty() {
            write!(out, "*")?;
        } else {
            out.write_all(&contig.sequence)?;
        }
        write!(out, "\tDP:f:{}", contig.depth)?;
        if let Some(kc) = contig.kmer_count {
            write!(out, "\tKC:i:{}", kc)?;
        }
        if contig.class != NodeClass::Unknown {
            write!(out, "\tTP:Z:{}", contig.class.as_tag())?;
        }
        if let Some(acc) = &contig.accession {
            write!(out, "\tAC:Z:{}", acc)?;
        }
        if let Some(orient) = contig.orientation {
            write!(out, "\tOR:A:{}", orient.as_char())?;
        }
        if contig.ref_end > 0 {
            write!(out, "\tST:i:{}\tEN:i:{}", contig.ref_start, contig.ref_end)?;
        }
        writeln!(out)?;
    }

    for lid in graph.link_ids() {
        let Some(link) = graph.link(lid) else { continue };
        writeln!(
            out,
            "L\t{}\t{}\t{}\t{}\t{}",
            lid.source,
            link.label.0.as_char(),
            lid.sink,
            link.label.1.as_char(),
            link.overlap,
        )?;
    }

    out.flush()?;
    Ok(())
}

/// Export contig sequences as FASTA. With `oriented`, contigs whose
/// reference alignment was on the reverse strand are emitted
/// reverse-complemented.
pub fn write_fasta(graph: &AssemblyGraph, path: &Path, oriented: bool) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);

    for id in graph.node_ids() {
        let Some(contig) = graph.node(id) else { continue };
        if contig.is_empty() {
            continue;
        }
        writeln!(out, ">{} depth={:.2}", id, contig.depth)?;
        if oriented && contig.orientation == Some(Strand::Reverse) {
            let rc = sequence::reverse_complement(&contig.sequence)
                .with_context(|| format!("contig {}", id))?;
            out.write_all(&rc)?;
        } else {
            out.write_all(&contig.sequence)?;
        }
        writeln!(out)?;
    }

    out.flush()?;
    Ok(())
}
