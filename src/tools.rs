//! Blocking invocation of the external classifier and aligner. Both tools
//! consume a FASTA export of the current graph and write a result table;
//! a non-zero exit aborts the run.

use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::config::UnfoldConfig;

fn run(mut command: Command) -> Result<()> {
    let rendered = format!(
        "{} {}",
        command.get_program().to_string_lossy(),
        command
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    );
    info!("running: {}", rendered);
    let status = command
        .status()
        .with_context(|| format!("failed to launch {}", rendered))?;
    if !status.success() {
        bail!("command failed ({}): {}", status, rendered);
    }
    Ok(())
}

/// blastn-style aligner: tabular output with query coverage appended.
pub fn run_aligner(
    config: &UnfoldConfig,
    fasta: &Path,
    db: &Path,
    out: &Path,
    threads: u32,
) -> Result<()> {
    let mut command = Command::new(&config.aligner_cmd);
    command
        .arg("-query")
        .arg(fasta)
        .arg("-db")
        .arg(db)
        .arg("-num_threads")
        .arg(threads.to_string())
        .arg("-outfmt")
        .arg("6 qaccver saccver pident length mismatch gapopen qstart qend sstart send evalue bitscore qcovs")
        .arg("-out")
        .arg(out)
        .arg("-max_target_seqs")
        .arg(config.max_target_seqs.to_string());
    run(command)
}

/// kraken2-style classifier.
pub fn run_classifier(
    config: &UnfoldConfig,
    fasta: &Path,
    db: &Path,
    out: &Path,
    threads: u32,
) -> Result<()> {
    let mut command = Command::new(&config.classifier_cmd);
    command
        .arg("--db")
        .arg(db)
        .arg("--output")
        .arg(out)
        .arg("--threads")
        .arg(threads.to_string())
        .arg("--confidence")
        .arg(config.classifier_confidence.to_string())
        .arg(fasta);
    run(command)
}
