//! Content-rating detection for extension objects.
//!
//! Rating markers are annotations that may reach us as runtime proxies, so
//! they cannot be compared by type identity. The default probe matches the
//! marker's simple name instead. That is a workaround: swap in another
//! [`MetadataProbe`] when extensions offer something sturdier.
use std::sync::Arc;

use crate::extension::classifier::Classification;
use crate::extension::object::ExtensionObject;
use crate::extension::source::HttpSource;
use crate::kernel::constants::NSFW_MARKER;

/// Answers whether an object carries a named metadata marker.
pub trait MetadataProbe: Send + Sync {
    fn has_marker(&self, object: &dyn ExtensionObject, marker: &str) -> bool;
}

/// Matches annotation type and interface simple names against the marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationNameProbe;

impl MetadataProbe for AnnotationNameProbe {
    fn has_marker(&self, object: &dyn ExtensionObject, marker: &str) -> bool {
        object
            .annotations()
            .iter()
            .any(|annotation| annotation.simple_names().any(|name| name == marker))
    }
}

/// A source that made it through the install, with its rating.
#[derive(Clone)]
pub struct LoadedSource {
    pub source: Arc<dyn HttpSource>,
    pub is_nsfw: bool,
}

impl std::fmt::Debug for LoadedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedSource")
            .field("id", &self.source.id())
            .field("name", &self.source.name())
            .field("is_nsfw", &self.is_nsfw)
            .finish()
    }
}

/// Flags objects carrying the NSFW marker.
#[derive(Clone)]
pub struct NsfwDetector {
    probe: Arc<dyn MetadataProbe>,
    marker: String,
}

impl NsfwDetector {
    pub fn new(probe: Arc<dyn MetadataProbe>, marker: impl Into<String>) -> Self {
        Self {
            probe,
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn is_nsfw(&self, object: &dyn ExtensionObject) -> bool {
        self.probe.has_marker(object, &self.marker)
    }

    /// Rate every classified source.
    ///
    /// A factory's own marker is checked once and inherited by all of its
    /// sources; a source's own marker can only add to it.
    pub fn tag(&self, classification: Classification) -> Vec<LoadedSource> {
        let inherited = classification
            .factory
            .as_deref()
            .is_some_and(|factory| self.is_nsfw(factory));

        classification
            .candidates
            .into_iter()
            .map(|candidate| LoadedSource {
                is_nsfw: inherited || self.is_nsfw(candidate.object.as_ref()),
                source: candidate.source,
            })
            .collect()
    }
}

impl Default for NsfwDetector {
    fn default() -> Self {
        Self::new(Arc::new(AnnotationNameProbe), NSFW_MARKER)
    }
}
