//! Taxonomic unfolding: classify every contig, mark targets and
//! contaminants by ancestor/descendant relation to the requested taxon,
//! and prune what contradicts the classification.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::UnfoldConfig;
use crate::conversion;
use crate::evidence::{apply_classification, TaxonId, Taxonomy};
use crate::graph::{AssemblyGraph, NodeClass};
use crate::tools;

use super::{finish_stage, StageIo, StageOptions};

#[derive(Debug, Clone)]
pub enum TaxonTarget {
    Id(TaxonId),
    Name(String),
}

#[derive(Debug, Clone, Default)]
pub struct TaxonOptions {
    /// Trust the `TP` annotation already present in the input graph.
    pub use_gfa_annotation: bool,
    /// Precomputed classifier output; skips the classifier run.
    pub classification: Option<PathBuf>,
    /// Directory holding `names.dmp` and `nodes.dmp`.
    pub taxonomy_dir: Option<PathBuf>,
    pub target: Option<TaxonTarget>,
    pub classifier_db: Option<PathBuf>,
}

pub fn unfold(
    graph: &mut AssemblyGraph,
    config: &UnfoldConfig,
    mut options: StageOptions,
    io: &StageIo,
    taxon: &TaxonOptions,
    reference_enabled: bool,
) -> Result<()> {
    info!("taxon unfold");
    let dir = io.stage_dir("taxon")?;

    if !taxon.use_gfa_annotation {
        let taxonomy_dir = taxon
            .taxonomy_dir
            .as_ref()
            .context("taxon unfolding needs a taxonomy database directory")?;
        let taxonomy = Taxonomy::from_dumps(
            &taxonomy_dir.join("names.dmp"),
            &taxonomy_dir.join("nodes.dmp"),
        )?;
        let target = match taxon
            .target
            .as_ref()
            .context("taxon unfolding needs a target taxon id or name")?
        {
            TaxonTarget::Id(id) => *id,
            TaxonTarget::Name(name) => taxonomy.name_to_id(name)?,
        };

        // classification is recomputed from scratch each round
        for id in graph.node_ids() {
            if let Some(contig) = graph.node_mut(id) {
                contig.class = NodeClass::Unknown;
            }
        }

        let table = match &taxon.classification {
            Some(path) => path.clone(),
            None => {
                let fasta = io.stage_file(&dir, "seq_for_classifier.fa");
                conversion::write_fasta(graph, &fasta, false)?;
                let out = io.stage_file(&dir, "classifier_out.txt");
                let db = taxon
                    .classifier_db
                    .as_ref()
                    .context("taxon unfolding needs a classifier database")?;
                tools::run_classifier(config, &fasta, db, &out, io.threads)?;
                out
            }
        };
        let marked = apply_classification(graph, &table, target, &taxonomy)?;
        info!("classified {} contigs", marked);
    }

    // individually unknown nodes get a second chance from the reference stage
    if reference_enabled {
        options.remove_unknown_nodes = false;
    }
    finish_stage(graph, config, options, &io.stage_file(&dir, "output.gfa"))
}
