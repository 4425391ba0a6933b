//! Error types for the Ops Manager client.
//!
//! This module defines `ClientError`, the unified error type returned by the
//! resolver, the transport and every typed API operation.
//!
//! # Security
//!
//! Credentials never appear in error messages. Status errors carry the
//! request URL and the server's error payload only.

use reqwest::{Method, StatusCode};
use thiserror::Error;

/// Unified error type for all client operations.
///
/// Every variant except [`ClientError::Config`] and
/// [`ClientError::InvalidBaseUrl`] describes a recoverable runtime condition
/// the caller is expected to inspect.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Configuration error - a required component is missing or a value is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The base URL handed to a resolver is not a valid absolute URL.
    #[error("invalid base URL {url:?}: {source}")]
    InvalidBaseUrl {
        /// The rejected input.
        url: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },

    /// HTTP client initialization failed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// A resolved request URL could not be parsed.
    #[error("invalid request URL {url:?}: {source}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },

    /// A request body could not be encoded as JSON. No request was sent.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The HTTP exchange failed before a response was received.
    #[error("failed to execute {method} request to {url}: {source}")]
    Http {
        /// Request verb.
        method: Method,
        /// Absolute request URL.
        url: String,
        /// Underlying network failure.
        #[source]
        source: reqwest::Error,
    },

    /// The request did not complete within the configured deadline.
    #[error("{method} request to {url} timed out - the server may be slow or unreachable")]
    Timeout {
        /// Request verb.
        method: Method,
        /// Absolute request URL.
        url: String,
        /// Underlying timeout failure.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a status code outside the accepted set.
    #[error("failed to execute {method} request to {url}: status code {status}, details: {details}")]
    Status {
        /// Request verb.
        method: Method,
        /// Absolute request URL.
        url: String,
        /// The HTTP status code returned.
        status: StatusCode,
        /// Error payload returned by the server (parsed JSON or raw text).
        details: String,
    },

    /// A response body could not be decoded into the expected type.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        /// Absolute request URL.
        url: String,
        /// Deserialization failure.
        #[source]
        source: serde_json::Error,
    },

    /// The digest authentication handshake could not be completed.
    #[error("digest authentication failed: {0}")]
    Digest(String),

    /// An operation argument was rejected before any request was sent.
    #[error("validation error: {0}")]
    Validation(String),
}

impl ClientError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        ClientError::Config(message.into())
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    /// Creates a digest authentication error.
    pub fn digest(message: impl Into<String>) -> Self {
        ClientError::Digest(message.into())
    }

    /// Classifies a reqwest failure, separating deadline expiry from other network errors.
    pub fn from_transport(method: Method, url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            ClientError::Timeout {
                method,
                url,
                source,
            }
        } else {
            ClientError::Http {
                method,
                url,
                source,
            }
        }
    }

    /// Returns the HTTP status code when the server rejected the request.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if this error is transient and the caller may retry.
    ///
    /// Retryable errors include:
    /// - Timeouts
    /// - Connection failures
    /// - HTTP 429 and 5xx responses
    ///
    /// The client itself never retries.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Timeout { .. } => true,
            ClientError::Http { source, .. } => source.is_connect() || source.is_timeout(),
            ClientError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}
