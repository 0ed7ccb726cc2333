//! Final cleanup after the strategy loop converged: drop what the evidence
//! never supported, contract until stable, and write the final graph.

use anyhow::Result;
use tracing::info;

use crate::config::UnfoldConfig;
use crate::conversion;
use crate::graph::{AssemblyGraph, NodeId};
use crate::merge;

use super::{prune, StageIo, StageOptions};

pub fn polish(
    graph: &mut AssemblyGraph,
    config: &UnfoldConfig,
    options: StageOptions,
    io: &StageIo,
    taxon_enabled: bool,
    reference_enabled: bool,
) -> Result<()> {
    info!("polishing");

    // with reference unfolding enabled, a contig that never aligned
    // anywhere carries no support at all
    if reference_enabled {
        let doomed: Vec<NodeId> = graph
            .node_ids()
            .into_iter()
            .filter(|id| {
                graph
                    .node(*id)
                    .map(|c| c.accession.is_none())
                    .unwrap_or(false)
            })
            .collect();
        info!("dropping {} unaligned contigs", doomed.len());
        for id in &doomed {
            graph.remove_node(*id);
        }
    }

    if taxon_enabled && reference_enabled {
        prune(graph, config, options);
    }

    loop {
        let nodes = graph.node_count();
        if options.merge_neighbours {
            merge::merge_neighbours(graph)?;
        }
        if graph.node_count() == nodes {
            break;
        }
    }

    let snapshot = io.out_dir.join(format!("{}_after_unfold.gfa", io.prefix));
    conversion::write_gfa(graph, &snapshot)?;
    info!(
        "final graph has {} nodes and {} links",
        graph.node_count(),
        graph.link_count()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Contig;

    #[test]
    fn unaligned_contigs_dropped_when_reference_ran() {
        let mut g = AssemblyGraph::new();
        let mut placed = Contig::new(b"ACGT".to_vec());
        placed.accession = Some("NC_1".into());
        g.add_node(NodeId(1), placed);
        g.add_node(NodeId(2), Contig::new(b"ACGT".to_vec()));

        let io = StageIo {
            out_dir: std::env::temp_dir(),
            prefix: format!("unfold-polish-{}", std::process::id()),
            threads: 1,
        };
        let opts = StageOptions {
            keep_short_isolated_nodes: true,
            ..Default::default()
        };
        polish(&mut g, &UnfoldConfig::default(), opts, &io, false, true).unwrap();
        let snapshot = io.out_dir.join(format!("{}_after_unfold.gfa", io.prefix));
        std::fs::remove_file(&snapshot).unwrap();

        assert_eq!(g.node_ids(), vec![NodeId(1)]);
    }
}
