//! opsman - command-line client for the MongoDB Ops Manager public API
//!
//! # Configuration
//!
//! Run `opsman configure` once, or set the following environment variables
//! (or use a `.env` file):
//!
//! - `OPSMAN_BASE_URL`: Base URL of your Ops Manager instance
//! - `OPSMAN_PUBLIC_KEY`: Programmatic API public key
//! - `OPSMAN_PRIVATE_KEY`: Programmatic API private key
//!
//! # Usage
//!
//! ```bash
//! opsman projects list
//! opsman automation retrieve --project-id 5e1a4c3e79358e4e8f7b0d39
//! RUST_LOG=opsman=debug opsman hosts list --group-id 5e1a4c3e79358e4e8f7b0d39
//! ```

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use opsman::cli::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (ignore errors if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // stdout carries command output; logs go to stderr
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::debug!("Starting opsman v{}", env!("CARGO_PKG_VERSION"));

    match cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
