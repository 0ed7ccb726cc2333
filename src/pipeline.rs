//! The orchestrator: load the graph, contract it, run the enabled
//! unfolding strategies until the graph stops shrinking, polish, export.

use std::path::PathBuf;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::UnfoldConfig;
use crate::conversion;
use crate::merge;
use crate::unfold::reference::ReferenceOptions;
use crate::unfold::taxon::TaxonOptions;
use crate::unfold::{self, StageIo, StageOptions};

/// Oscillating inputs could otherwise loop forever; in practice the graph
/// stabilizes within a handful of rounds.
const MAX_ROUNDS: usize = 32;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub input: PathBuf,
    pub io: StageIo,
    pub stage: StageOptions,
    /// `None` disables the stage.
    pub taxon: Option<TaxonOptions>,
    pub reference: Option<ReferenceOptions>,
    pub depth_enabled: bool,
    pub gc_enabled: bool,
    pub merge_brother: bool,
    pub split_parent: bool,
    /// Export the final FASTA reverse-complementing reverse-placed contigs.
    pub oriented_fasta: bool,
}

pub fn run(config: &UnfoldConfig, options: &PipelineOptions) -> Result<()> {
    let mut graph = conversion::load_gfa(&options.input)?;
    info!(
        "loaded {} contigs and {} links from {}",
        graph.node_count(),
        graph.link_count(),
        options.input.display()
    );

    // contract the raw assembly before any evidence is consulted
    if options.stage.merge_neighbours {
        loop {
            let nodes = graph.node_count();
            merge::merge_neighbours(&mut graph)?;
            if graph.node_count() == nodes {
                break;
            }
            info!(
                "graph has {} nodes and {} links",
                graph.node_count(),
                graph.link_count()
            );
        }
    }

    // a precomputed evidence file describes the graph as it is right now;
    // rerunning the strategies against it would misattribute the rows
    let fast = options
        .taxon
        .as_ref()
        .map(|t| t.classification.is_some())
        .unwrap_or(false)
        || options
            .reference
            .as_ref()
            .map(|r| r.alignment.is_some())
            .unwrap_or(false);
    let classifying = options.taxon.is_some() || options.reference.is_some();

    let mut rounds = 0;
    loop {
        let before = (graph.node_count(), graph.link_count());

        if let Some(taxon) = &options.taxon {
            unfold::taxon::unfold(
                &mut graph,
                config,
                options.stage,
                &options.io,
                taxon,
                options.reference.is_some(),
            )?;
        }
        if let Some(reference) = &options.reference {
            unfold::reference::unfold(&mut graph, config, options.stage, &options.io, reference)?;
        }
        if options.depth_enabled {
            unfold::depth::unfold(&mut graph, config, options.stage, &options.io, classifying)?;
        }
        if options.gc_enabled {
            unfold::gc::unfold(&mut graph, config, options.stage, &options.io, classifying)?;
        }
        if options.merge_brother {
            let merged = merge::merge_brothers(&mut graph, config.brother_similarity)?;
            info!("merged {} brother contigs", merged);
            if options.stage.merge_neighbours {
                merge::merge_neighbours(&mut graph)?;
            }
        }
        if options.split_parent {
            let split = merge::split_parents(
                &mut graph,
                config.split_depth_multi,
                config.split_similarity,
            )?;
            info!("split {} junctions", split);
            if options.stage.merge_neighbours {
                merge::merge_neighbours(&mut graph)?;
            }
        }

        rounds += 1;
        if fast {
            info!("precomputed evidence supplied, stopping after one pass");
            break;
        }
        if (graph.node_count(), graph.link_count()) == before {
            break;
        }
        if rounds >= MAX_ROUNDS {
            warn!("graph did not stabilize after {} rounds, stopping", rounds);
            break;
        }
    }

    unfold::polish::polish(
        &mut graph,
        config,
        options.stage,
        &options.io,
        options.taxon.is_some(),
        options.reference.is_some(),
    )?;

    let fasta = options
        .io
        .out_dir
        .join(format!("{}_after_unfold.fasta", options.io.prefix));
    conversion::write_fasta(&graph, &fasta, options.oriented_fasta)?;
    info!("wrote {}", fasta.display());
    Ok(())
}
