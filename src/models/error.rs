//! Error types for the proxy.
//!
//! Every variant maps onto exactly one HTTP status and a JSON envelope with
//! at least an `error` field. Details that would expose deployment internals
//! (which variable is missing) are kept out of the envelope and only logged.

use reqwest::StatusCode;
use serde_json::{Value, json};
use std::fmt;

/// Failure class reported alongside a [`ProxyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller broke the endpoint contract (method, body).
    Client,
    /// Required deployment configuration is absent.
    Configuration,
    /// The upstream service answered with a non-2xx status.
    Upstream,
    /// The upstream call could not be made or its answer could not be read.
    Transport,
}

/// Custom error type for a single proxy call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// Request method is neither `OPTIONS` nor the configured one.
    MethodNotAllowed,
    /// A required field is absent from the request body.
    MissingField(&'static str),
    /// The request body is not valid JSON.
    InvalidBody(String),
    /// A required environment variable is absent. Only logged.
    Configuration(String),
    /// Upstream returned a non-2xx status.
    Upstream {
        status: StatusCode,
        description: &'static str,
        details: String,
    },
    /// Network, TLS or decoding failure while talking to upstream.
    Transport(String),
}

impl ProxyError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MethodNotAllowed | Self::MissingField(_) | Self::InvalidBody(_) => {
                ErrorKind::Client
            }
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Upstream { .. } => ErrorKind::Upstream,
            Self::Transport(_) => ErrorKind::Transport,
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::MissingField(_) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::Configuration(_) | Self::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream { status, .. } => *status,
        }
    }

    /// JSON envelope returned to the caller.
    #[must_use]
    pub fn envelope(&self) -> Value {
        match self {
            Self::MethodNotAllowed => json!({ "error": "Method Not Allowed" }),
            Self::MissingField(field) => {
                json!({ "error": format!("{field} is required in the request body.") })
            }
            Self::InvalidBody(_) => json!({ "error": "Request body must be valid JSON." }),
            Self::Configuration(_) => json!({ "error": "Server configuration error" }),
            Self::Upstream {
                description,
                details,
                ..
            } => json!({ "error": description, "details": details }),
            Self::Transport(details) => {
                json!({ "error": "Internal server error", "details": details })
            }
        }
    }
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MethodNotAllowed => write!(f, "Method not allowed"),
            Self::MissingField(field) => write!(f, "Missing required field: {field}"),
            Self::InvalidBody(msg) => write!(f, "Invalid request body: {msg}"),
            Self::Configuration(name) => write!(f, "Configuration error: {name} is not set"),
            Self::Upstream {
                status, details, ..
            } => write!(f, "Upstream error {status}: {details}"),
            Self::Transport(msg) => write!(f, "Transport error: {msg}"),
        }
    }
}

impl std::error::Error for ProxyError {}

impl From<anyhow::Error> for ProxyError {
    fn from(error: anyhow::Error) -> Self {
        Self::Transport(format!("{error:#}"))
    }
}
