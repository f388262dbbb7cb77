//! Error types for the taskhub client.
//!
//! # Design
//! `Request` and `Transport` are deliberately separate variants: the first
//! means the server answered with a non-2xx status, the second means no
//! answer was obtained at all. Callers offer different recovery advice for
//! each (fix the input or log in vs. retry later). `Validation` never reaches
//! the network.

use std::path::PathBuf;

use thiserror::Error;

use crate::http::TransportError;
use crate::validation::ValidationError;

/// Errors returned by `ApiClient` and the domain services.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The payload was rejected locally before any request was built.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The server returned a status outside the 2xx range.
    #[error("HTTP {status}: {message}")]
    Request { status: u16, message: String },

    /// No response was received.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The resource path was not server-relative.
    #[error("invalid resource path: {0}")]
    InvalidPath(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl ApiError {
    /// HTTP status of a `Request` failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// True for 401 and 403, the statuses a backend uses for a missing or
    /// rejected bearer token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

/// Errors raised by the session store when the persistent slot cannot be
/// read or written.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage at {}: {}", .path.display(), .source)]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to store an empty token")]
    EmptyToken,

    /// The token cannot travel in an `Authorization` header.
    #[error("refusing to store a token containing control characters")]
    MalformedToken,
}
