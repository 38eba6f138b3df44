//! Error types for roster-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in roster-core
///
/// Only source fetches, persistence and caller mistakes surface here. Sheet
/// contents are hand-authored, so malformed cells are tolerated and never
/// produce an error.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source table could not be retrieved
    #[error("failed to fetch {source_name}: {message}")]
    Fetch {
        source_name: String,
        message: String,
    },

    /// A source answered with a non-success HTTP status
    #[error("failed to fetch {source_name}: HTTP {status}")]
    HttpStatus { source_name: String, status: u16 },

    /// No record with the given key exists
    #[error("no hero with key '{0}'")]
    UnknownRecord(String),

    /// An edit could not be applied to a record
    #[error("invalid edit for '{key}': {message}")]
    InvalidEdit { key: String, message: String },

    /// The translation collaborator failed
    #[error("translation failed: {0}")]
    Translation(String),

    /// Configuration is missing or inconsistent
    #[error("invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),
}
