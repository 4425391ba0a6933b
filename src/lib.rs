//! # opsman
//!
//! A typed client and command-line tool for the MongoDB Ops Manager public API.
//!
//! ## Features
//!
//! - **URL resolution**: Relative endpoint patterns with positional values,
//!   cleaned and resolved against a base URL and an optional API prefix
//! - **Transport**: JSON verbs with uniform headers, HTTP digest
//!   authentication and status-code validation
//! - **Typed operations**: Projects, first-user registration, automation
//!   configuration and status, hosts, agents and backup configurations
//! - **Lossless documents**: Automation configurations keep unknown fields
//!   across a read-modify-write cycle
//! - **Security**: API keys are never logged and are redacted from `Debug` output
//!
//! ## Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`resolver`] - URL resolution against a base URL and prefix
//! - [`timeouts`] - Connection and request deadlines
//! - [`transport`] - HTTP transport, digest exchange and response envelope
//! - [`client`] - Typed API operations
//! - [`models`] - Data models for API requests and responses
//! - [`error`] - Unified error type
//! - [`config`] - Persisted configuration for the command-line tool
//! - [`cli`] - Command-line front end
//!
//! ## Configuration
//!
//! The `opsman` binary reads `<config dir>/opsman/config.toml`, written by
//! `opsman configure`, and these environment variables:
//!
//! - `OPSMAN_BASE_URL`: Base URL of the Ops Manager instance
//! - `OPSMAN_PUBLIC_KEY` / `OPSMAN_PRIVATE_KEY`: Programmatic API key pair
//! - `OPSMAN_API_PREFIX`: Public API prefix (default `/api/public/v1.0`)
//! - `OPSMAN_TIMEOUT`: Global request timeout in seconds
//! - `RUST_LOG`: Log filter (e.g., `opsman=debug`)
//!
//! ## Example
//!
//! ```no_run
//! use opsman::client::OpsManagerClient;
//! use opsman::resolver::{UrlResolver, PUBLIC_API_PREFIX};
//!
//! async fn example() -> Result<(), opsman::error::ClientError> {
//!     let resolver = UrlResolver::with_prefix("http://localhost:8080", PUBLIC_API_PREFIX)?;
//!     let client = OpsManagerClient::with_digest_auth(resolver, "public-key", "private-key")?;
//!
//!     let project = client.get_project_by_name("production").await?;
//!     let mut config = client.get_automation_config(&project.id).await?;
//!     if let Some(process) = config.process_mut("rs0_0") {
//!         process.disabled = Some(true);
//!     }
//!     client.update_automation_config(&project.id, &config).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod resolver;
pub mod timeouts;
pub mod transport;
