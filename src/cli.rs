//! Command-line interface. All required external inputs are validated here,
//! before the graph is loaded or mutated.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use crate::config::UnfoldConfig;
use crate::evidence::TaxonId;
use crate::pipeline::PipelineOptions;
use crate::unfold::reference::ReferenceOptions;
use crate::unfold::taxon::{TaxonOptions, TaxonTarget};
use crate::unfold::{StageIo, StageOptions};

fn default_threads() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

#[derive(Debug, Parser)]
#[command(
    name = "gfa-unfold",
    version,
    about = "Simplify a metagenomic assembly graph using taxonomy, reference, depth and GC evidence"
)]
pub struct Cli {
    /// Input assembly graph (GFA1).
    #[arg(short, long)]
    pub gfa: PathBuf,

    /// Output directory.
    #[arg(short, long, default_value = "unfold_output")]
    pub outdir: PathBuf,

    /// Prefix for output files.
    #[arg(short, long, default_value = "unfold")]
    pub prefix: String,

    /// Threads passed through to the external tools.
    #[arg(short, long, default_value_t = default_threads())]
    pub threads: u32,

    /// Overwrite an existing output directory.
    #[arg(short, long)]
    pub force: bool,

    /// Do not unfold by contig taxonomy.
    #[arg(long)]
    pub disable_taxon_unfold: bool,

    /// Trust the TP tags already present in the input GFA.
    #[arg(long)]
    pub use_gfa_taxon: bool,

    /// Precomputed classifier output, instead of running the classifier.
    #[arg(long)]
    pub classification: Option<PathBuf>,

    /// Directory containing names.dmp and nodes.dmp.
    #[arg(long)]
    pub taxon_db: Option<PathBuf>,

    /// Target taxon id.
    #[arg(long)]
    pub taxon_id: Option<TaxonId>,

    /// Target scientific name, resolved through the name dump.
    #[arg(long)]
    pub taxon_name: Option<String>,

    /// Classifier database directory.
    #[arg(long)]
    pub classifier_db: Option<PathBuf>,

    /// Do not unfold by reference alignment.
    #[arg(long)]
    pub disable_ref_unfold: bool,

    /// Trust the AC/OR/ST/EN tags already present in the input GFA.
    #[arg(long)]
    pub use_gfa_ref: bool,

    /// Precomputed aligner output, instead of running the aligner.
    #[arg(long)]
    pub alignment: Option<PathBuf>,

    /// Aligner database path.
    #[arg(long)]
    pub aligner_db: Option<PathBuf>,

    /// Cut links whose endpoints sit further apart on the reference.
    #[arg(long)]
    pub position_distance: Option<u64>,

    /// Do not unfold by sequencing depth.
    #[arg(long)]
    pub disable_depth_unfold: bool,

    /// Cut links whose endpoint depth ratio exceeds this multiple.
    #[arg(long)]
    pub depth_discrepancy: Option<f64>,

    /// Do not unfold by GC content.
    #[arg(long)]
    pub disable_gc_unfold: bool,

    /// Cut links whose endpoint GC fractions differ by more than this.
    #[arg(long)]
    pub gc_discrepancy: Option<f64>,

    /// Remove individually unclassified, unaligned nodes after each stage.
    #[arg(long)]
    pub remove_unknown_nodes: bool,

    /// Keep components with no classified or aligned node.
    #[arg(long)]
    pub keep_unknown_components: bool,

    /// Keep isolated nodes below the length cutoff.
    #[arg(long)]
    pub keep_short_isolated_nodes: bool,

    /// Do not contract unbranched chains.
    #[arg(long)]
    pub disable_merge_neighbour: bool,

    /// Collapse near-identical sibling contigs into a consensus.
    #[arg(long)]
    pub merge_brother: bool,

    /// Split coverage-asymmetric diamond junctions.
    #[arg(long)]
    pub split_parent: bool,

    /// Reverse-complement reverse-placed contigs in the final FASTA.
    #[arg(long)]
    pub oriented_fasta: bool,

    /// Verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Validate every input and turn the flags into a pipeline plan.
    pub fn into_plan(self) -> Result<(UnfoldConfig, PipelineOptions)> {
        if !self.gfa.is_file() {
            bail!("input graph {} does not exist", self.gfa.display());
        }
        if self.outdir.exists() && !self.force {
            bail!(
                "output directory {} exists; pass --force to overwrite",
                self.outdir.display()
            );
        }
        std::fs::create_dir_all(&self.outdir)
            .with_context(|| format!("failed to create {}", self.outdir.display()))?;

        let mut config = UnfoldConfig::default();
        if let Some(v) = self.position_distance {
            config.position_distance = v;
        }
        if let Some(v) = self.depth_discrepancy {
            config.depth_discrepancy = v;
        }
        if let Some(v) = self.gc_discrepancy {
            config.gc_discrepancy = v;
        }

        let taxon = if self.disable_taxon_unfold {
            None
        } else {
            let mut options = TaxonOptions {
                use_gfa_annotation: self.use_gfa_taxon,
                classification: self.classification.clone(),
                taxonomy_dir: self.taxon_db.clone(),
                classifier_db: self.classifier_db.clone(),
                target: match (self.taxon_id, &self.taxon_name) {
                    (Some(id), _) => Some(TaxonTarget::Id(id)),
                    (None, Some(name)) => Some(TaxonTarget::Name(name.clone())),
                    (None, None) => None,
                },
            };
            if !options.use_gfa_annotation {
                let db = options
                    .taxonomy_dir
                    .as_ref()
                    .context("taxon unfolding needs --taxon-db (or --use-gfa-taxon)")?;
                for dump in ["names.dmp", "nodes.dmp"] {
                    if !db.join(dump).is_file() {
                        bail!("{} is missing from {}", dump, db.display());
                    }
                }
                if options.target.is_none() {
                    bail!("taxon unfolding needs --taxon-id or --taxon-name");
                }
                match &options.classification {
                    Some(path) if !path.is_file() => {
                        bail!("classification file {} does not exist", path.display())
                    }
                    Some(_) => {}
                    None => {
                        let db = options
                            .classifier_db
                            .as_ref()
                            .context("taxon unfolding needs --classifier-db or --classification")?;
                        if !db.is_dir() {
                            bail!("classifier database {} does not exist", db.display());
                        }
                    }
                }
            } else {
                // embedded annotation needs no external inputs
                options.classification = None;
            }
            Some(options)
        };

        let reference = if self.disable_ref_unfold {
            None
        } else {
            let options = ReferenceOptions {
                use_gfa_annotation: self.use_gfa_ref,
                alignment: self.alignment.clone(),
                aligner_db: self.aligner_db.clone(),
            };
            if !options.use_gfa_annotation {
                match &options.alignment {
                    Some(path) if !path.is_file() => {
                        bail!("alignment file {} does not exist", path.display())
                    }
                    Some(_) => {}
                    None if options.aligner_db.is_none() => {
                        bail!("reference unfolding needs --aligner-db or --alignment")
                    }
                    None => {}
                }
            }
            Some(options)
        };

        let plan = PipelineOptions {
            input: self.gfa,
            io: StageIo {
                out_dir: self.outdir,
                prefix: self.prefix,
                threads: self.threads,
            },
            stage: StageOptions {
                remove_unknown_nodes: self.remove_unknown_nodes,
                keep_unknown_components: self.keep_unknown_components,
                keep_short_isolated_nodes: self.keep_short_isolated_nodes,
                merge_neighbours: !self.disable_merge_neighbour,
            },
            taxon,
            reference,
            depth_enabled: !self.disable_depth_unfold,
            gc_enabled: !self.disable_gc_unfold,
            merge_brother: self.merge_brother,
            split_parent: self.split_parent,
            oriented_fasta: self.oriented_fasta,
        };
        Ok((config, plan))
    }
}
