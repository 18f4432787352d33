//! The content-source contract extensions implement.
//!
//! Only identity metadata is modelled here; the scraping side of a source is
//! driven elsewhere once a handle exists.
use std::fmt;
use std::sync::Arc;

use crate::extension::error::ExtensionError;
use crate::extension::object::ExtensionObject;

/// A content source.
pub trait Source: Send + Sync {
    /// Stable source id
    fn id(&self) -> i64;

    /// Display name
    fn name(&self) -> &str;

    /// Language code, e.g. "en"
    fn lang(&self) -> &str;
}

/// A source backed by an HTTP site. Only these are usable by the server.
pub trait HttpSource: Source {
    fn base_url(&self) -> &str;
}

/// An entry point producing several sources.
pub trait SourceFactory: Send + Sync {
    /// Candidate sources, in the order the extension declares them.
    ///
    /// Either every produced object is returned or the call fails as a whole.
    fn create_sources(&self) -> Result<Vec<Arc<dyn ExtensionObject>>, ExtensionError>;
}

/// Plain-data snapshot of a source's identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub id: i64,
    pub name: String,
    pub lang: String,
    pub base_url: String,
}

impl SourceInfo {
    pub fn of(source: &dyn HttpSource) -> Self {
        Self {
            id: source.id(),
            name: source.name().to_string(),
            lang: source.lang().to_string(),
            base_url: source.base_url().to_string(),
        }
    }
}

impl fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({}) {}", self.id, self.name, self.lang, self.base_url)
    }
}
