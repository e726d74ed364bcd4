mod app;
mod sinks;

use anyhow::{Context, Result};
use clap::Parser;

use app::{Cli, build_evaluator, init_sink, open_input, process_records};
use booleval::config::{FilterConfig, RuntimeConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("CLI: Failed to initialize thread pool")?;
    }

    let file_config = match &cli.config {
        Some(path) => Some(
            FilterConfig::load(path)
                .with_context(|| format!("Config: Failed to load {:?}", path))?,
        ),
        None => None,
    };

    let runtime = RuntimeConfig::resolve(
        file_config,
        cli.expr.clone(),
        cli.case_insensitive,
        cli.batch_size,
    );

    let evaluator = build_evaluator(&runtime)?;
    let reader = open_input(cli.input.as_deref())?;
    let mut sink = init_sink(cli.output.as_deref())?;

    let start = std::time::Instant::now();
    let stats = process_records(&evaluator, reader, sink.as_mut(), runtime.batch_size)?;
    sink.finish().context("Pipeline: Failed to finalize sink")?;

    let elapsed = start.elapsed();
    tracing::info!(
        "Done! Matched {} of {} records ({} skipped) in {:.2}s",
        stats.matched,
        stats.read,
        stats.skipped,
        elapsed.as_secs_f64()
    );

    Ok(())
}
