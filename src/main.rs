//! Binary entrypoint.
//!
//! Log filtering honours `VERITAS_LOG` first, then `RUST_LOG`; errors are
//! printed through the log layer and mapped to a nonzero exit code instead
//! of a panic backtrace.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use veritas::cli::Cli;

fn init_logging() {
    let directives = std::env::var("VERITAS_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directives))
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = Cli::parse().execute().await {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}
