//! Error handling and custom error types
//!
//! Provides unified error handling across the crate using thiserror. The
//! proxy boundary converts these into [`crate::proxy::ProxyError`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The generative service answered with an error of its own.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The generative service failed without saying why.
    #[error("Upstream request failed with status {0}")]
    UpstreamStatus(u16),

    /// The generative service answered, but without usable text.
    #[error("Upstream returned no text")]
    EmptyCompletion,

    /// Failure surfaced to the end user by the report client; the message is
    /// shown as-is.
    #[error("{0}")]
    Report(String),

    #[error("Blob storage error: {0}")]
    Storage(String),

    #[error("Patient not found: {0}")]
    NotFound(String),

    #[error("No image available to analyze")]
    NoImage,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
