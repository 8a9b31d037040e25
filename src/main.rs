mod cli;
mod application;
mod domain;
mod data;
mod ml;
mod infra;

use anyhow::Result;
use cli::Cli;
use clap::Parser;

use domain::error::PipelineError;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fill_volume=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let result = cli.run();

    // Surface the failing stage (and class) of a pipeline error as fields.
    if let Err(err) = &result {
        if let Some(failure) = err.chain().find_map(|c| c.downcast_ref::<PipelineError>()) {
            tracing::error!(
                stage = %failure.stage(),
                class = failure.class().unwrap_or("-"),
                "Pipeline failed"
            );
        }
    }
    result
}
