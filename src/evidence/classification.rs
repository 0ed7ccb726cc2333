//! Classifier output: tab-separated rows `status, node, taxon, ...`.
//! Unclassified rows and hits on the root / unranked pseudo-taxa carry no
//! signal and are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};

use crate::graph::{AssemblyGraph, NodeClass, NodeId};

use super::taxonomy::{TaxonId, Taxonomy};

/// Mark every classified node as target or contaminant depending on whether
/// its taxon is related to `target`. Returns the number of nodes marked.
pub fn apply_classification(
    graph: &mut AssemblyGraph,
    path: &Path,
    target: TaxonId,
    taxonomy: &Taxonomy,
) -> Result<usize> {
    let file = File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut marked = 0;
    for line in BufReader::new(file).lines() {
        let line = line?;
        let mut fields = line.trim_end().split('\t');
        let (Some(status), Some(node), Some(taxon)) =
            (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        if status == "U" || taxon == "0" || taxon == "1" {
            continue;
        }
        let Ok(id) = node.parse::<u64>() else { continue };
        let id = NodeId(id);
        if !graph.has_node(id) {
            continue;
        }
        let Ok(taxon) = taxon.parse::<TaxonId>() else { continue };
        let class = if taxonomy.related(taxon, target) {
            NodeClass::Target
        } else {
            NodeClass::Contaminant
        };
        if let Some(contig) = graph.node_mut(id) {
            contig.class = class;
            marked += 1;
        }
    }
    Ok(marked)
}
