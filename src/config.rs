//! Configuration management for the `opsman` command-line tool.
//!
//! Settings are layered in priority order:
//!
//! 1. The TOML file at `<config_dir>/opsman/config.toml` (or `--config`)
//! 2. Environment variables, including those loaded from a `.env` file
//! 3. Command-line flags, applied by the caller
//!
//! # Environment Variables
//!
//! - `OPSMAN_BASE_URL`: Base URL of the Ops Manager instance
//! - `OPSMAN_PUBLIC_KEY`: Programmatic API public key
//! - `OPSMAN_PRIVATE_KEY`: Programmatic API private key
//! - `OPSMAN_API_PREFIX`: Path prefix of the public API
//! - `OPSMAN_TIMEOUT`: Global request timeout in seconds
//!
//! # Security
//!
//! The private key is redacted from `Debug` output and the config file is
//! written with owner-only permissions on Unix.

use std::env;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::resolver::{UrlResolver, PUBLIC_API_PREFIX};
use crate::timeouts::RequestTimeouts;

/// Directory under the platform config directory.
const CONFIG_DIR_NAME: &str = "opsman";

/// File name of the persisted configuration.
const CONFIG_FILE_NAME: &str = "config.toml";

const ENV_BASE_URL: &str = "OPSMAN_BASE_URL";
const ENV_PUBLIC_KEY: &str = "OPSMAN_PUBLIC_KEY";
const ENV_PRIVATE_KEY: &str = "OPSMAN_PRIVATE_KEY";
const ENV_API_PREFIX: &str = "OPSMAN_API_PREFIX";
const ENV_TIMEOUT: &str = "OPSMAN_TIMEOUT";

/// Connection settings for an Ops Manager instance.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the instance (e.g., `http://opsmanager.example.com:8080`).
    pub base_url: String,

    /// Programmatic API public key, used as the digest username.
    pub public_key: String,

    /// Programmatic API private key, used as the digest secret.
    /// This value must never be logged.
    pub private_key: String,

    /// Path prefix of the public API.
    pub api_prefix: String,

    /// Global request timeout in seconds; the transport default applies when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            public_key: String::new(),
            private_key: String::new(),
            api_prefix: PUBLIC_API_PREFIX.to_string(),
            timeout_secs: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let private_key = if self.private_key.is_empty() {
            ""
        } else {
            "[REDACTED]"
        };
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("public_key", &self.public_key)
            .field("private_key", &private_key)
            .field("api_prefix", &self.api_prefix)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    /// Returns the default config file location, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads the config file, then applies environment overrides.
    ///
    /// # Arguments
    ///
    /// * `path` - Explicit config file; falls back to [`Config::default_path`]
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the file cannot be parsed or an
    /// environment value is invalid. A missing file is not an error.
    ///
    /// # Example
    ///
    /// ```ignore
    /// dotenvy::dotenv().ok();
    /// let config = Config::load(None)?;
    /// ```
    pub fn load(path: Option<&Path>) -> Result<Self, ClientError> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);
        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| env::var(name).ok())?;
        Ok(config)
    }

    /// Reads a config file. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the file exists but cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ClientError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            ClientError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&contents).map_err(|e| {
            ClientError::config(format!("cannot parse {}: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Writes the config file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ClientError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ClientError::config(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| ClientError::config(format!("cannot encode config: {}", e)))?;
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            // Owner-only from creation.
            options.mode(0o600);
        }

        let write_error =
            |e: std::io::Error| ClientError::config(format!("cannot write {}: {}", path.display(), e));
        let mut file = options.open(path).map_err(write_error)?;

        // `mode` only applies to new files; tighten a pre-existing one too.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| {
                    ClientError::config(format!("cannot restrict {}: {}", path.display(), e))
                })?;
        }

        file.write_all(contents.as_bytes()).map_err(write_error)?;

        tracing::info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Applies overrides from a variable lookup, usually the process environment.
    ///
    /// Unset and blank variables leave the current value untouched.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if `OPSMAN_TIMEOUT` is not a whole number of seconds.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(value) = get(ENV_BASE_URL) {
            self.base_url = value;
        }
        if let Some(value) = get(ENV_PUBLIC_KEY) {
            self.public_key = value;
        }
        if let Some(value) = get(ENV_PRIVATE_KEY) {
            self.private_key = value;
        }
        if let Some(value) = get(ENV_API_PREFIX) {
            self.api_prefix = value;
        }
        if let Some(value) = get(ENV_TIMEOUT) {
            let secs = value.trim().parse::<u64>().map_err(|_| {
                ClientError::config(format!(
                    "{} must be a whole number of seconds, got: {:?}",
                    ENV_TIMEOUT, value
                ))
            })?;
            self.timeout_secs = Some(secs);
        }
        Ok(())
    }

    /// Returns true if both API keys are set.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.public_key.trim().is_empty() && !self.private_key.trim().is_empty()
    }

    /// Validates the settings needed to reach the server.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the base URL is missing or malformed,
    /// or if a key looks like a placeholder.
    pub fn validate(&self) -> Result<(), ClientError> {
        Self::validate_base_url(&self.base_url)?;
        Self::validate_key("public key", &self.public_key)?;
        Self::validate_key("private key", &self.private_key)?;
        Ok(())
    }

    /// Builds the URL resolver for this instance.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the base URL is invalid.
    pub fn resolver(&self) -> Result<UrlResolver, ClientError> {
        let base_url = Self::validate_base_url(&self.base_url)?;
        UrlResolver::with_prefix(&base_url, &self.api_prefix)
    }

    /// Returns the request timeouts, applying `timeout_secs` to the global deadline.
    pub fn timeouts(&self) -> RequestTimeouts {
        let timeouts = RequestTimeouts::default();
        match self.timeout_secs {
            Some(secs) => timeouts.with_global(Duration::from_secs(secs)),
            None => timeouts,
        }
    }

    /// Validates and normalizes the base URL.
    pub(crate) fn validate_base_url(url: &str) -> Result<String, ClientError> {
        let url = url.trim().trim_end_matches('/');

        if url.is_empty() {
            return Err(ClientError::config(format!(
                "base URL is not set; run `opsman configure` or set {}",
                ENV_BASE_URL
            )));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ClientError::config(
                "base URL must start with http:// or https://",
            ));
        }

        Ok(url.to_string())
    }

    /// Rejects template values copied from documentation.
    fn validate_key(name: &str, key: &str) -> Result<(), ClientError> {
        let key_lower = key.to_lowercase();
        let placeholder_patterns = ["your_key", "your-key", "placeholder", "changeme", "xxx"];

        if placeholder_patterns
            .iter()
            .any(|pattern| key_lower.contains(pattern))
        {
            return Err(ClientError::config(format!(
                "{} appears to be a placeholder value",
                name
            )));
        }
        Ok(())
    }
}
