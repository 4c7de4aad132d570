// Error types for the template loader.
// Covers remote API failures, item parsing, local directory access and configuration.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote error: {message}")]
    Remote {
        status: Option<u16>,
        message: String,
    },

    #[error("failed to parse {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("cannot read directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("missing {0} environment variable")]
    MissingEnv(String),
}

impl TemplateError {
    /// Build a remote error without an HTTP status (bad payload shape, decoding).
    pub fn remote(message: impl Into<String>) -> Self {
        TemplateError::Remote {
            status: None,
            message: message.into(),
        }
    }

    /// HTTP status attached to a remote error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            TemplateError::Remote { status, .. } => *status,
            TemplateError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TemplateError>;
