//! # Bindery Extension Errors
//!
//! Defines [`ExtensionError`], the failure taxonomy of an extension install.
//! Every variant aborts the whole install; none of them is retried here.
use std::path::PathBuf;

use crate::extension::version::{LibVersion, LibVersionRange, VersionError};

/// Boxed error used for pass-through failures from collaborators
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum ExtensionError {
    /// The caller-supplied fetcher failed; its error is passed through untouched.
    #[error("Failed to fetch extension package: {0}")]
    Fetch(#[source] BoxError),

    #[error("Malformed extension package '{}': {message}", path.display())]
    MalformedPackage {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Package '{package}' is not an extension: it does not declare the '{feature}' feature")]
    NotAnExtension { package: String, feature: String },

    #[error("Package '{package}' has malformed version '{version}': {source}")]
    MalformedVersion {
        package: String,
        version: String,
        #[source]
        source: VersionError,
    },

    #[error("Lib version is {found}, while only versions {range} are allowed (package '{package}')")]
    IncompatibleVersion {
        package: String,
        found: LibVersion,
        range: LibVersionRange,
    },

    #[error("Failed to convert payload of '{}': {message}", path.display())]
    ConversionFailure {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Entry point '{class_name}' not found in '{}': {message}", path.display())]
    EntryPointNotFound {
        class_name: String,
        path: PathBuf,
        message: String,
    },

    #[error("Failed to instantiate entry point '{class_name}': {message}")]
    InstantiationFailure { class_name: String, message: String },

    #[error("Unknown source class type! {type_name} is neither a Source nor a SourceFactory")]
    UnknownEntryPointType { type_name: String },

    #[error("Internal installer error: {0}")]
    Internal(String),
}

impl ExtensionError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ExtensionError::MalformedPackage {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn conversion(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ExtensionError::ConversionFailure {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }
}
