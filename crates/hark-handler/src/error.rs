//! Handler error types.
//!
//! Every variant here is a request-level failure except [`Config`],
//! which is fatal at startup before any request is served. Nothing is
//! retried; the hosting layer maps these onto its fault-reporting
//! convention.
//!
//! [`Config`]: HandlerError::Config

use hark_transcription::TranscriptionError;
use thiserror::Error;

/// Errors from the request-transformation core.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Startup configuration invalid (missing or non-numeric values).
    #[error("config error: {0}")]
    Config(String),

    /// RemoteReference body is not valid JSON.
    #[error("request parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// RemoteReference body is valid JSON but lacks a required field.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// `s3_location` is present but not a usable `s3://bucket/key` URI.
    #[error("invalid object location: {0}")]
    InvalidLocation(String),

    /// Object-store download failed (not found, auth, network).
    #[error("object store error: {0}")]
    Storage(String),

    /// Transcription engine failure, propagated opaquely.
    #[error("engine error: {0}")]
    Engine(#[from] TranscriptionError),

    /// Local I/O failure while staging media.
    #[error("staging io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for handler operations.
pub type Result<T> = std::result::Result<T, HandlerError>;

impl HandlerError {
    /// Whether this failure was caused by the shape of the request
    /// itself (as opposed to a collaborator or the engine).
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Parse(_) | Self::MissingField(_) | Self::InvalidLocation(_)
        )
    }
}
