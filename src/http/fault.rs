//! Request-time faults.
//!
//! Handlers return `Result<T, Fault>`. The wrapper is the only place a fault
//! is turned into a response:
//! - `Fault::Http` keeps its status and description, labelled with the
//!   status reason phrase (`404` → `"Not Found"`)
//! - `Fault::Internal` is logged in full and answered with a generic 500

use axum::http::StatusCode;
use thiserror::Error;

/// Label and message sent for every unclassified fault.
pub const INTERNAL_LABEL: &str = "Internal error";
pub const INTERNAL_MESSAGE: &str = "Server encountered an error";

/// A fault raised by a handler or an accessor.
#[derive(Debug, Error)]
pub enum Fault {
    /// A fault that maps directly onto an HTTP response.
    #[error("{status}: {description}")]
    Http {
        status: StatusCode,
        description: String,
    },

    /// Anything else. Never shown to the caller.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl Fault {
    pub fn new(status: StatusCode, description: impl Into<String>) -> Self {
        Fault::Http {
            status,
            description: description.into(),
        }
    }

    /// A fault with the stock description for `status`.
    pub fn status(status: StatusCode) -> Self {
        Self::new(status, default_description(status))
    }

    pub fn bad_request(description: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, description)
    }

    pub fn unauthorized(description: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, description)
    }

    pub fn forbidden(description: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, description)
    }

    pub fn not_found(description: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, description)
    }

    pub fn conflict(description: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, description)
    }

    /// Wrap an arbitrary error as an unclassified fault.
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Fault::Internal(err.into())
    }

    /// Status code the caller will see.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Fault::Http { status, .. } => *status,
            Fault::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for the `error` field.
    pub fn label(&self) -> &'static str {
        match self {
            Fault::Http { status, .. } => status_label(*status),
            Fault::Internal(_) => INTERNAL_LABEL,
        }
    }

    /// Human text for the `message` field.
    pub fn message(&self) -> &str {
        match self {
            Fault::Http { description, .. } => description,
            Fault::Internal(_) => INTERNAL_MESSAGE,
        }
    }
}

/// Reason phrase for a status, e.g. `"Not Found"`.
pub fn status_label(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown Error")
}

fn default_description(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "The browser (or proxy) sent a request that this server could not understand.",
        StatusCode::UNAUTHORIZED => "The server could not verify that you are authorized to access the URL requested.",
        StatusCode::FORBIDDEN => "You don't have the permission to access the requested resource.",
        StatusCode::NOT_FOUND => "The requested URL was not found on the server. If you entered the URL manually please check your spelling and try again.",
        StatusCode::METHOD_NOT_ALLOWED => "The method is not allowed for the requested URL.",
        StatusCode::REQUEST_TIMEOUT => "The server closed the network connection because the browser didn't finish the request within the specified time.",
        StatusCode::PAYLOAD_TOO_LARGE => "The data value transmitted exceeds the capacity limit.",
        _ => INTERNAL_MESSAGE,
    }
}
