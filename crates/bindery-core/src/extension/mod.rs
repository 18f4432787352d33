//! # Bindery Extension System
//!
//! Everything between "here is a package file" and "here are its sources":
//!
//! - [`inspector`] reads the package manifest.
//! - [`version`] parses and range-checks the extension library version.
//! - [`converter`] extracts the loadable payload.
//! - [`loader`] instantiates the entry point through [`ffi`].
//! - [`classifier`] sorts the entry point into sources or a source factory.
//! - [`nsfw`] tags each source with its content rating.
//! - [`installer`] drives all of the above for one package.
pub mod classifier;
pub mod converter;
pub mod error;
pub mod fetcher;
pub mod ffi;
pub mod inspector;
pub mod installer;
pub mod loader;
pub mod manifest;
mod native;
pub mod nsfw;
pub mod object;
pub mod source;
pub mod version;

pub use classifier::{Classification, EntryPointShape, SourceClassifier};
pub use converter::{FormatConverter, NativePayloadConverter};
pub use error::ExtensionError;
pub use fetcher::{LocalPackageFetcher, PackageFetcher};
pub use inspector::{ArchiveInspector, PackageInspector};
pub use installer::{
    ExtensionInstaller, ExtensionInstallerBuilder, InstallObserver, InstallResult, InstallSettings, InstallStage,
};
pub use loader::{DynamicLoader, NativeLoader};
pub use manifest::{ManifestBuilder, PackageManifest};
pub use nsfw::{AnnotationNameProbe, LoadedSource, MetadataProbe, NsfwDetector};
pub use object::{Annotation, EntryPointInstance, ExtensionObject};
pub use source::{HttpSource, Source, SourceFactory, SourceInfo};
pub use version::{LibVersion, LibVersionRange};
