//! NCloud client errors

use thiserror::Error;

/// Errors that can occur when interacting with the NCloud API
#[derive(Debug, Error)]
pub enum NcloudError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// NCloud API returned an error
    ///
    /// `status` is the HTTP status (200 when the gateway accepted the call but
    /// the payload carried a non-zero `returnCode`).
    #[error("NCloud API error [{code}] (HTTP {status}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication failed (bad access key, signature mismatch, etc.)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request (e.g., missing required fields)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl NcloudError {
    /// Vendor return code, when the error came from the API itself
    pub fn code(&self) -> Option<&str> {
        match self {
            NcloudError::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Whether the error means the addressed resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, NcloudError::NotFound(_))
    }
}
