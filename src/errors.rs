//! Typed error hierarchy for the board client.
//!
//! Server-side failures are expressed as `backend::api::ApiError`, which maps
//! straight onto HTTP responses. Everything the client side can hit while
//! talking to a backend or to its local blobs is a `BoardError`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Not logged in or session expired")]
    AuthRequired,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Task {id} not found")]
    TaskNotFound { id: String },

    #[error("Failed to access {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BoardError {
    pub fn is_auth(&self) -> bool {
        matches!(self, BoardError::AuthRequired)
    }
}
