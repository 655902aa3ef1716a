//! Error types for custos-api

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for custos-api operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or running the server
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from custos-acl (rule or catalog validation)
    #[error("ACL error: {0}")]
    Acl(#[from] custos_acl::Error),

    /// Invalid server configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O failure on a known file
    #[error("I/O error on {path}: {source}")]
    IoWithPath {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Other I/O failure (listener, socket)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config(message.into())
    }

    /// Wraps an I/O error with the path it concerns.
    pub fn io_with_path(source: std::io::Error, path: &Path) -> Self {
        Error::IoWithPath {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether startup must abort because of a wiring defect.
    pub fn is_configuration(&self) -> bool {
        match self {
            Error::Acl(err) => err.is_configuration(),
            Error::Config(_) => true,
            _ => false,
        }
    }
}
