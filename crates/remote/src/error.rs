//! Error types for catalog and storage calls.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, RemoteError>;

/// Errors raised by the remote storage client.
///
/// Catalog lookups never fail; an unavailable font is reported as absent.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The service account credential could not be decoded or used.
    #[error("Invalid service account credentials: {0}")]
    Credentials(String),

    /// The OAuth token endpoint rejected the assertion.
    #[error("Token request failed: {0}")]
    Token(String),

    /// Transport failure talking to a remote endpoint.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The storage service answered with a non-success status.
    #[error("Upload of '{name}' failed with status {status}: {body}")]
    Upload {
        name: String,
        status: u16,
        body: String,
    },

    /// Failed to read the local file being uploaded.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}
