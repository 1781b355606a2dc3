// src/error.rs

//! Error types for the cartridge importer
//!
//! Only structural failures surface as `Error`. Anything a run can recover
//! from is recorded as a [`crate::issues::MigrationIssue`] instead.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem operation failed
    #[error("I/O error: {0}")]
    IoError(String),

    /// The archive could not be opened or read
    #[error("archive error: {0}")]
    ArchiveError(String),

    /// The manifest is missing or not usable
    #[error("manifest error: {0}")]
    ManifestError(String),

    /// Malformed XML in the manifest or a resource descriptor
    #[error("XML error: {0}")]
    XmlError(String),

    /// An archive entry tried to escape the extraction root
    #[error("path traversal rejected: {0}")]
    PathTraversal(String),

    /// A path could not be normalized
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Content store failure
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// IR (de)serialization failure
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Configuration file could not be loaded
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// A required record does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The container lock could not be taken
    #[error("lock error: {0}")]
    LockError(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ArchiveError(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlError(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlError(err.to_string())
    }
}
