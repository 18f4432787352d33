//! # Bindery Core Kernel Errors
//!
//! Defines the crate-level [`Error`] that front ends (such as the `bindery`
//! binary) deal with. Each subsystem keeps its own typed error and converts
//! into this one through `#[from]`.
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::config::error::ConfigError;
use crate::extension::error::ExtensionError;

/// Top-level error for Bindery operations
#[derive(Debug, ThisError)]
pub enum Error {
    /// Specific, typed extension installation error
    #[error("Extension error: {0}")]
    Extension(#[from] ExtensionError),

    /// Specific, typed configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error during operation '{operation}' on path '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl Error {
    /// Wraps an I/O error together with the operation and path it happened on.
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        Error::Io {
            source,
            operation: operation.into(),
            path,
        }
    }
}
