//! Error type for everything outside the view pipeline.
//!
//! The filter, sort and hierarchy stages never fail; they default or drop bad
//! records instead. Snapshot I/O, scoped queries and mutations report through
//! `BoardError`.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Terminal error: {0}")]
    Terminal(#[source] std::io::Error),
}

impl BoardError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        BoardError::NotFound { entity, id: id.into() }
    }
}

pub type Result<T> = std::result::Result<T, BoardError>;
