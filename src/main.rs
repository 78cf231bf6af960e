//! container-dispatch - Bounded-concurrency dispatcher for batch container jobs

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use container_dispatch::{DispatchConfig, DispatcherBuilder, DockerRuntime};

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // Initialize tracing
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let entries = cli::load_jobs(&args.jobs_file)?;
    let configs: Vec<_> = entries.iter().map(|e| e.config.clone()).collect();
    let spec_builder =
        cli::TableSpecBuilder::new(entries.into_iter().map(|e| (e.config, e.spec)))?;

    let config = DispatchConfig::new(&args.image, args.max_containers)
        .with_dispatch_log_dir(args.dispatch_log_path)
        .with_job_log_dir(args.docker_log_path);

    let runtime = DockerRuntime::connect().context("failed to connect to the Docker daemon")?;

    let dispatcher = DispatcherBuilder::new()
        .config(config)
        .runtime(Arc::new(runtime))
        .spec_builder(Arc::new(spec_builder))
        .build()?;

    let summary = dispatcher.run(configs).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
