//! Main entry point for the call-log-exporter CLI

use call_log_exporter::cli::Cli;
use call_log_exporter::metrics;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("call_log_exporter=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    // .env is optional; real environment variables take precedence
    dotenv::dotenv().ok();

    init_tracing();
    metrics::describe_metrics();

    let cli = Cli::parse();

    match cli.execute().await {
        Ok(summary) => {
            if summary.is_complete() {
                info!(
                    rows = summary.records_exported,
                    path = %summary.output_path.display(),
                    "Export complete"
                );
            } else {
                warn!(
                    rows = summary.records_exported,
                    missed_windows = summary.windows_missed.len(),
                    path = %summary.output_path.display(),
                    "Export finished with missing intervals"
                );
            }
        }
        Err(e) if e.is_usage_error() => {
            eprintln!("{e}");
            std::process::exit(1);
        }
        Err(e) => {
            let e = anyhow::Error::new(e).context("Export failed");
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}
