//! Depth unfolding: contigs whose coverage differs by more than a
//! configured multiple rarely belong to the same genome copy.

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
    info!("depth unfold");
    let dir = io.stage_dir("depth")?;

    let mut doomed: Vec<LinkId> = Vec::new();
    for lid in graph.link_ids() {
        let (Some(a), Some(b)) = (graph.node(lid.source), graph.node(lid.sink)) else {
            continue;
        };
        if depth_conflict(a.depth, b.depth, config.depth_discrepancy) {
            doomed.push(lid);
        }
    }
    info!("removed {} links over the depth threshold", doomed.len());
    for lid in &doomed {
        graph.remove_link(*lid);
    }

    // without any classifying evidence there is nothing "unknown" to prune
    if !classifying_stage_ran {
        options.keep_unknown_components = true;
        options.remove_unknown_nodes = false;
    }
    finish_stage(graph, config, options, &io.stage_file(&dir, "depth_output.gfa"))
}

/// Symmetric in its endpoints. A zero depth on one side only counts as a
/// conflict against a positive depth on the other.
pub fn depth_conflict(d1: f64, d2: f64, multiple: f64) -> bool {
    let (hi, lo) = if d1 > d2 { (d1, d2) } else { (d2, d1) };
    if lo <= 0.0 {
        return hi > 0.0;
    }
    hi / lo > multiple
}
