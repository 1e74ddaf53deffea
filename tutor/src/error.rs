//! Error types for the tutor library.
//!
//! Extraction and model failures are kept apart: a bad upload is fixed by
//! uploading again, while a model failure leaves the session usable with the
//! question recorded as unanswered.

use std::path::PathBuf;
use thiserror::Error;

/// The PDF could not be read or parsed.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to read PDF '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed PDF: {0}")]
    Malformed(String),
}

/// The completion call failed or its answer could not be understood.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("model request timed out")]
    Timeout,

    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("unexpected response shape: {0}")]
    MalformedResponse(String),

    #[error("model returned no answer")]
    EmptyResponse,
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ModelError::Timeout
        } else if err.is_decode() {
            ModelError::MalformedResponse(err.to_string())
        } else {
            ModelError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no API key configured for provider '{provider}'")]
    MissingCredential { provider: String },

    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("chapter {chapter} is out of range (1..={max})")]
    ChapterOutOfRange { chapter: u32, max: u32 },

    #[error("PDF for chapter not found at '{path}'")]
    NotFound { path: PathBuf },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF export failed: {0}")]
    Pdf(String),

    #[error("DOCX export failed: {0}")]
    Docx(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
