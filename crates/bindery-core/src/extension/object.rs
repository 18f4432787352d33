//! Runtime view of objects created from extension code.
//!
//! Extension objects are only known by what they report about themselves at
//! runtime: a type name, the annotations attached to them, and which of the
//! source shapes they can be viewed as.
use std::fmt;
use std::sync::Arc;

use crate::extension::source::{HttpSource, Source, SourceFactory};

/// An annotation entry attached to an extension object.
///
/// Annotations may be synthesized at runtime, in which case `type_name` is the
/// generated proxy type and the real annotation only shows up in `interfaces`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub type_name: String,
    pub interfaces: Vec<String>,
}

impl Annotation {
    /// An annotation reported directly under its own type name
    pub fn direct(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            interfaces: Vec::new(),
        }
    }

    /// A runtime proxy implementing the given annotation interfaces
    pub fn proxied<I, S>(proxy_type: impl Into<String>, interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            type_name: proxy_type.into(),
            interfaces: interfaces.into_iter().map(Into::into).collect(),
        }
    }

    /// Simple names of the annotation type and every interface it implements
    pub fn simple_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.type_name.as_str())
            .chain(self.interfaces.iter().map(String::as_str))
            .map(simple_name)
    }
}

/// Local name of a qualified type name: "a.b.Outer$Nsfw" -> "Nsfw".
pub fn simple_name(qualified: &str) -> &str {
    qualified
        .rsplit(|c: char| c == '.' || c == '$')
        .next()
        .unwrap_or(qualified)
}

/// An object created by extension code.
///
/// The `as_*` views default to "not supported"; implementors override the ones
/// matching their runtime shape.
pub trait ExtensionObject: Send + Sync {
    /// Concrete runtime type name, used for diagnostics
    fn type_name(&self) -> &str;

    /// Annotation entries attached to the object's type
    fn annotations(&self) -> Vec<Annotation> {
        Vec::new()
    }

    fn as_source(self: Arc<Self>) -> Option<Arc<dyn Source>> {
        None
    }

    fn as_http_source(self: Arc<Self>) -> Option<Arc<dyn HttpSource>> {
        None
    }

    fn as_source_factory(self: Arc<Self>) -> Option<Arc<dyn SourceFactory>> {
        None
    }
}

/// The freshly instantiated entry point of an extension, before classification.
#[derive(Clone)]
pub struct EntryPointInstance {
    object: Arc<dyn ExtensionObject>,
}

impl EntryPointInstance {
    pub fn new(object: Arc<dyn ExtensionObject>) -> Self {
        Self { object }
    }

    pub fn type_name(&self) -> &str {
        self.object.type_name()
    }

    pub fn object(&self) -> &Arc<dyn ExtensionObject> {
        &self.object
    }
}

impl fmt::Debug for EntryPointInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPointInstance")
            .field("type_name", &self.object.type_name())
            .finish()
    }
}
