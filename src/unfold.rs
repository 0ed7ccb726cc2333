//! Unfolding stages. Each stage applies one evidence source, removes the
//! links that contradict it, prunes the graph, contracts chains, and writes
//! a GFA snapshot into its own subdirectory of the output tree.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::config::UnfoldConfig;
use crate::conversion;
use crate::graph::{AssemblyGraph, NodeClass, NodeId};
use crate::merge;

pub mod depth;
pub mod gc;
pub mod polish;
pub mod reference;
pub mod taxon;

/// Pruning and merging switches shared by every stage. Individual stages
/// override single fields before pruning (the depth and GC stages, for
/// example, never drop unknown nodes when no classifying stage ran).
#[derive(Debug, Clone, Copy)]
pub struct StageOptions {
    pub remove_unknown_nodes: bool,
    pub keep_unknown_components: bool,
    pub keep_short_isolated_nodes: bool,
    pub merge_neighbours: bool,
}

impl Default for StageOptions {
    fn default() -> Self {
        StageOptions {
            remove_unknown_nodes: false,
            keep_unknown_components: false,
            keep_short_isolated_nodes: false,
            merge_neighbours: true,
        }
    }
}

/// Output locations and the thread budget for external tools.
#[derive(Debug, Clone)]
pub struct StageIo {
    pub out_dir: PathBuf,
    pub prefix: String,
    pub threads: u32,
}

impl StageIo {
    /// Create (if needed) and return the subdirectory for a stage.
    pub fn stage_dir(&self, stage: &str) -> Result<PathBuf> {
        let dir = self.out_dir.join(stage);
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        Ok(dir)
    }

    pub fn stage_file(&self, dir: &Path, suffix: &str) -> PathBuf {
        dir.join(format!("{}_{}", self.prefix, suffix))
    }
}

pub fn remove_contaminated_nodes(graph: &mut AssemblyGraph) -> usize {
    let doomed: Vec<NodeId> = graph
        .node_ids()
        .into_iter()
        .filter(|id| graph.node(*id).map(|c| c.class.is_contaminant()).unwrap_or(false))
        .collect();
    for id in &doomed {
        graph.remove_node(*id);
    }
    doomed.len()
}

/// Drop every weakly-connected component that contains neither a target
/// node nor an accessioned node.
pub fn remove_unknown_components(graph: &mut AssemblyGraph) -> usize {
    let mut doomed: Vec<NodeId> = Vec::new();
    for component in graph.components() {
        let known = component.iter().any(|id| {
            graph
                .node(*id)
                .map(|c| c.class == NodeClass::Target || c.accession.is_some())
                .unwrap_or(false)
        });
        if !known {
            doomed.extend(component);
        }
    }
    for id in &doomed {
        graph.remove_node(*id);
    }
    doomed.len()
}

/// Drop individual nodes with neither a classification nor an accession.
pub fn remove_unknown_nodes(graph: &mut AssemblyGraph) -> usize {
    let doomed: Vec<NodeId> = graph
        .node_ids()
        .into_iter()
        .filter(|id| {
            graph
                .node(*id)
                .map(|c| c.class == NodeClass::Unknown && c.accession.is_none())
                .unwrap_or(false)
        })
        .collect();
    for id in &doomed {
        graph.remove_node(*id);
    }
    doomed.len()
}

pub fn remove_short_isolated_nodes(graph: &mut AssemblyGraph, cutoff: usize) -> usize {
    let doomed: Vec<NodeId> = graph
        .node_ids()
        .into_iter()
        .filter(|id| {
            graph.degree(*id) == 0
                && graph.node(*id).map(|c| c.len() < cutoff).unwrap_or(false)
        })
        .collect();
    for id in &doomed {
        graph.remove_node(*id);
    }
    doomed.len()
}

/// The common pruning sequence: contaminated nodes always go, the rest is
/// governed by the options.
pub fn prune(graph: &mut AssemblyGraph, config: &UnfoldConfig, options: StageOptions) {
    remove_contaminated_nodes(graph);
    if !options.keep_unknown_components {
        remove_unknown_components(graph);
    }
    if options.remove_unknown_nodes {
        remove_unknown_nodes(graph);
    }
    if !options.keep_short_isolated_nodes {
        remove_short_isolated_nodes(graph, config.short_isolate_cutoff);
    }
}

/// Prune, contract chains, snapshot. Every stage ends this way.
pub(crate) fn finish_stage(
    graph: &mut AssemblyGraph,
    config: &UnfoldConfig,
    options: StageOptions,
    snapshot: &Path,
) -> Result<()> {
    prune(graph, config, options);
    if options.merge_neighbours {
        merge::merge_neighbours(graph)?;
    }
    conversion::write_gfa(graph, snapshot)?;
    info!(
        "graph has {} nodes and {} links",
        graph.node_count(),
        graph.link_count()
    );
    Ok(())
}
