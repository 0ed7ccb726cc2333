/*!
Evidence-driven simplification of metagenomic assembly graphs.

# Overview

Assemblers emit graphs in which a target genome shares nodes and links
with contaminant genomes, sequencing artifacts, and near-identical
repeat copies. This crate loads such a graph from GFA1, gathers
per-contig evidence, cuts the links that evidence contradicts, and
contracts what remains into longer contigs.

Four sources of evidence are supported, each its own unfolding stage:

* taxonomic classification of contigs ([`unfold::taxon`])
* alignment against a reference genome ([`unfold::reference`])
* sequencing depth ([`unfold::depth`])
* GC content ([`unfold::gc`])

Between stages, three topological passes simplify the graph:

* [`merge::neighbour`] contracts unbranched chains
* [`merge::brother`] collapses near-identical sibling contigs into a
  consensus
* [`merge::split`] separates coverage-asymmetric diamond junctions

# Core types

* [`graph::AssemblyGraph`] is a `HashMap`-based bidirected graph
* [`graph::NodeId`] is a newtype used as a node identifier
* [`orient::EdgeLabel`] records the strand pair a link joins
* [`orient::OrientedLink`] is a link viewed from one of its endpoints

[`pipeline::run`] drives the whole process, alternating unfolding
stages and topological passes until the graph stops changing.
*/

pub mod cli;
pub mod config;
pub mod conversion;
pub mod error;
pub mod evidence;
pub mod graph;
pub mod merge;
pub mod orient;
pub mod pipeline;
pub mod sequence;
pub mod tools;
pub mod unfold;
