//! tasksync CLI binary.

use anyhow::Result;
use tasksync::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the tasksync CLI.
///
/// Status queries for different issues run as separate processes, so the
/// multi-threaded runtime is used.
#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so `--json` output on stdout stays parseable.
    // Example: RUST_LOG=tasksync=debug,tasksync_lazy=trace tasksync list
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tasksync=info,tasksync_lazy=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("Starting tasksync CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("tasksync CLI completed successfully");
    Ok(())
}
