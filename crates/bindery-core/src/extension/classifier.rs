//! Sorts an instantiated entry point into usable source handles.
use std::fmt;
use std::sync::Arc;

use log::{debug, warn};

use crate::extension::error::ExtensionError;
use crate::extension::object::{EntryPointInstance, ExtensionObject};
use crate::extension::source::{HttpSource, SourceFactory};

/// The recognized shapes of an entry point, resolved once per install.
pub enum EntryPointShape {
    /// The entry point is itself a source
    Source(Arc<dyn ExtensionObject>),
    /// The entry point produces sources
    SourceFactory {
        object: Arc<dyn ExtensionObject>,
        factory: Arc<dyn SourceFactory>,
    },
    /// Neither; carries the runtime type name for diagnostics
    Unknown { type_name: String },
}

impl EntryPointShape {
    /// Determine the shape of `instance`. A source takes precedence over a factory.
    pub fn of(instance: &EntryPointInstance) -> Self {
        let object = instance.object();
        if Arc::clone(object).as_source().is_some() {
            return EntryPointShape::Source(Arc::clone(object));
        }
        if let Some(factory) = Arc::clone(object).as_source_factory() {
            return EntryPointShape::SourceFactory {
                object: Arc::clone(object),
                factory,
            };
        }
        EntryPointShape::Unknown {
            type_name: object.type_name().to_string(),
        }
    }
}

impl fmt::Debug for EntryPointShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryPointShape::Source(object) => f.debug_tuple("Source").field(&object.type_name()).finish(),
            EntryPointShape::SourceFactory { object, .. } => {
                f.debug_tuple("SourceFactory").field(&object.type_name()).finish()
            }
            EntryPointShape::Unknown { type_name } => f.debug_tuple("Unknown").field(type_name).finish(),
        }
    }
}

/// A source that passed the HTTP capability check, plus the object it came from.
#[derive(Clone)]
pub struct SourceCandidate {
    pub object: Arc<dyn ExtensionObject>,
    pub source: Arc<dyn HttpSource>,
}

/// Output of [`SourceClassifier::classify`]
#[derive(Clone, Default)]
pub struct Classification {
    /// The factory object when the entry point was a factory
    pub factory: Option<Arc<dyn ExtensionObject>>,
    /// HTTP-capable sources in declaration order
    pub candidates: Vec<SourceCandidate>,
}

impl fmt::Debug for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classification")
            .field("factory", &self.factory.as_ref().map(|o| o.type_name().to_string()))
            .field(
                "candidates",
                &self.candidates.iter().map(|c| c.source.name().to_string()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Turns entry points into HTTP-capable source candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceClassifier;

impl SourceClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Keep only objects that are HTTP sources, preserving order.
    fn http_sources(objects: Vec<Arc<dyn ExtensionObject>>) -> Vec<SourceCandidate> {
        objects
            .into_iter()
            .filter_map(|object| {
                let source = Arc::clone(&object).as_http_source();
                if source.is_none() {
                    debug!("Dropping {}: not an HTTP source", object.type_name());
                }
                source.map(|source| SourceCandidate { object, source })
            })
            .collect()
    }

    /// Classify an entry point.
    ///
    /// Sources without HTTP support are dropped silently, so the result may be
    /// empty. An entry point of unknown shape is an error, and so is a factory
    /// failing to produce any one of its sources.
    pub fn classify(&self, instance: EntryPointInstance) -> Result<Classification, ExtensionError> {
        let classification = match EntryPointShape::of(&instance) {
            EntryPointShape::Source(object) => Classification {
                factory: None,
                candidates: Self::http_sources(vec![object]),
            },
            EntryPointShape::SourceFactory { object, factory } => {
                let produced = factory.create_sources()?;
                debug!("{} produced {} sources", object.type_name(), produced.len());
                Classification {
                    factory: Some(object),
                    candidates: Self::http_sources(produced),
                }
            }
            EntryPointShape::Unknown { type_name } => {
                return Err(ExtensionError::UnknownEntryPointType { type_name });
            }
        };

        if classification.candidates.is_empty() {
            warn!("Entry point {} yielded no HTTP sources", instance.type_name());
        }
        Ok(classification)
    }
}
