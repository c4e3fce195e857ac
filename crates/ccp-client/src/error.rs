//! Error types for the control-plane client.

use std::time::Duration;

use thiserror::Error;

/// Result alias used throughout the client.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the control plane.
#[derive(Debug, Error)]
pub enum Error {
    /// The control plane answered with a status outside the success allow-list.
    #[error("{method} {path} failed with status {status}: {body}")]
    Transport {
        /// HTTP method of the failed request.
        method: String,
        /// Request path relative to the endpoint.
        path: String,
        /// Status code returned by the control plane.
        status: u16,
        /// Raw response body (the API returns human-readable error text).
        body: String,
    },

    /// The request could not be sent or the response could not be read.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Login did not yield a usable session token.
    #[error("authentication failed: {reason}")]
    Authentication {
        /// Why no usable token is available.
        reason: String,
    },

    /// A creation request is missing a required field, or a mandatory
    /// derived value could not be computed.
    #[error("invalid request: {field} {reason}")]
    Validation {
        /// Wire name of the offending field.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A name-based lookup scanned the whole collection without a match.
    #[error("{kind} not found: {name}")]
    NotFound {
        /// Resource kind ("cluster", "provider", ...).
        kind: &'static str,
        /// Name that was looked up.
        name: String,
    },

    /// Polling exceeded the maximum wait.
    #[error("cluster {cluster} still creating after {waited:?}")]
    Timeout {
        /// Cluster being waited on.
        cluster: String,
        /// How long the caller waited.
        waited: Duration,
    },

    /// Polling was cancelled by the caller.
    #[error("wait for cluster {cluster} cancelled")]
    Cancelled {
        /// Cluster being waited on.
        cluster: String,
    },

    /// The endpoint URL is unusable.
    #[error("invalid endpoint: {reason}")]
    InvalidEndpoint {
        /// Why the endpoint was rejected.
        reason: String,
    },

    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a validation error for a field that is absent.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: "is missing".to_string(),
        }
    }

    /// Build an authentication error.
    pub fn auth(reason: impl Into<String>) -> Self {
        Self::Authentication {
            reason: reason.into(),
        }
    }

    /// Returns `true` if the control plane rejected the request with this status.
    #[must_use]
    pub fn is_status(&self, code: u16) -> bool {
        matches!(self, Self::Transport { status, .. } if *status == code)
    }
}
