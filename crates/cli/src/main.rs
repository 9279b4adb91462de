mod commands;
mod metrics;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use versekit_core::{load_config, validate_config, SanitizedConfig};

use commands::{classify, download, fetch};

/// Scripture catalog classification and resumable content acquisition.
#[derive(Parser, Debug)]
#[command(name = "versekit")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML). Defaults and environment apply without one.
    #[arg(short, long, global = true, env = "VERSEKIT_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    /// Write Prometheus metrics to this file when the command finishes.
    #[arg(long, global = true)]
    metrics_out: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh the cached catalog from the content API.
    Fetch,
    /// Classify the cached catalog into the metadata repository.
    Classify,
    /// Download audio, text and timing for one language or a batch.
    Download(download::DownloadArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to load config".to_string(),
    })?;
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = SanitizedConfig::from(&config);
    info!(
        config = %serde_json::to_string(&sanitized).unwrap_or_default(),
        "Configuration loaded"
    );

    match cli.command {
        Command::Fetch => fetch::run(&config).await?,
        Command::Classify => classify::run(&config)?,
        Command::Download(args) => download::run(&config, &args).await?,
    }

    if let Some(path) = &cli.metrics_out {
        metrics::write_metrics(path)
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
        info!(path = %path.display(), "Metrics written");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "versekit",
            "classify",
            "--json-logs",
            "--metrics-out",
            "metrics.prom",
        ])
        .unwrap();
        assert!(cli.json_logs);
        assert_eq!(cli.metrics_out, Some(PathBuf::from("metrics.prom")));
        assert!(matches!(cli.command, Command::Classify));
    }
}
