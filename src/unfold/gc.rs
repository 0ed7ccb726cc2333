//! GC unfolding: genomes carry a characteristic GC fraction, so a large
//! jump across a link suggests the two contigs were conflated.

use anyhow::Result;
use tracing::info;

use crate::config::UnfoldConfig;
use crate::graph::{AssemblyGraph, LinkId};

use super::{finish_stage, StageIo, StageOptions};

pub fn unfold(
    graph: &mut AssemblyGraph,
    config: &UnfoldConfig,
    mut options: StageOptions,
    io: &StageIo,
    classifying_stage_ran: bool,
) -> Result<()> {
    info!("gc unfold");
    let dir = io.stage_dir("gc")?;

    let mut doomed: Vec<LinkId> = Vec::new();
    for lid in graph.link_ids() {
        let (Some(a), Some(b)) = (graph.node(lid.source), graph.node(lid.sink)) else {
            continue;
        };
        if gc_conflict(a.gc_fraction(), b.gc_fraction(), config.gc_discrepancy) {
            doomed.push(lid);
        }
    }
    info!("removed {} links over the GC threshold", doomed.len());
    for lid in &doomed {
        graph.remove_link(*lid);
    }

    if !classifying_stage_ran {
        options.keep_unknown_components = true;
        options.remove_unknown_nodes = false;
    }
    finish_stage(graph, config, options, &io.stage_file(&dir, "gc_output.gfa"))
}

/// Symmetric in its endpoints.
pub fn gc_conflict(gc1: f64, gc2: f64, discrepancy: f64) -> bool {
    (gc1 - gc2).abs() > discrepancy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_is_symmetric() {
        for (a, b) in [(0.2, 0.6), (0.6, 0.2), (0.5, 0.5)] {
            assert_eq!(gc_conflict(a, b, 0.2), gc_conflict(b, a, 0.2));
        }
    }

    #[test]
    fn threshold_is_exclusive() {
        assert!(!gc_conflict(0.4, 0.6, 0.2));
        assert!(gc_conflict(0.4, 0.61, 0.2));
    }
}
