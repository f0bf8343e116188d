//! Error types for m2v-orphans
//!
//! Scan errors abort a whole scan, promotion errors abort one promotion.
//! Classification and transcoding never produce these; their failures are
//! reported as data.

use std::path::PathBuf;
use thiserror::Error;

use crate::services::file_scanner::ScanError;

/// Orphan pipeline error type
#[derive(Debug, Error)]
pub enum OrphanError {
    /// Filename does not follow the `CCCC_YYYYMMDDHHMMSS.ext` convention
    #[error("Malformed recording filename: {0}")]
    Format(String),

    /// Destructive operation refused (e.g. rescan over existing orphans)
    #[error("Refusing unsafe operation: {0}")]
    State(String),

    /// Remote entity not found (e.g. unknown channel id)
    #[error("Lookup failed: {0}")]
    Lookup(String),

    /// Catalog service unreachable or returned an unusable response
    #[error("Catalog service failure: {0}")]
    Transport(String),

    /// Catalog refused or failed to add a file
    #[error("Catalog did not register {filespec} on host {host}")]
    Registration { filespec: String, host: String },

    /// Required input field missing
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Requested operation is outside what this tool supports
    #[error("Not yet implemented: {0}")]
    Unsupported(String),

    /// Expected-unique lookup matched zero or several rows
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// (host, filename) already present in the orphan store
    #[error("Orphan {filename} on host {host} already exists")]
    Duplicate { host: String, filename: String },

    /// Recording directory could not be enumerated
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// File operation failed on a specific path
    #[error("I/O error on {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// m2v-common error
    #[error("Common error: {0}")]
    Common(#[from] m2v_common::Error),
}

impl OrphanError {
    /// Attach a path to an I/O error
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OrphanError::File {
            path: path.into(),
            source,
        }
    }
}

/// Result type for orphan operations
pub type Result<T> = std::result::Result<T, OrphanError>;
