use clap::Parser;
use tracing_subscriber::EnvFilter;

use gfa_unfold::cli::Cli;
use gfa_unfold::pipeline;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("gfa_unfold=debug,info")
    } else {
        EnvFilter::new("gfa_unfold=info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let (config, options) = cli.into_plan()?;
    pipeline::run(&config, &options)
}
