//! Extension installation pipeline.
//!
//! An install walks through the [`InstallStage`]s in order:
//! fetch, inspect, feature and version validation, payload conversion,
//! entry-point loading, classification and NSFW tagging. Any failure is final;
//! there are no retries and no partial results.
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, trace, warn};

use crate::extension::classifier::SourceClassifier;
use crate::extension::converter::{FormatConverter, NativePayloadConverter};
use crate::extension::error::ExtensionError;
use crate::extension::fetcher::PackageFetcher;
use crate::extension::inspector::{ArchiveInspector, PackageInspector};
use crate::extension::loader::{DynamicLoader, NativeLoader};
use crate::extension::manifest::PackageManifest;
use crate::extension::nsfw::{AnnotationNameProbe, LoadedSource, MetadataProbe, NsfwDetector};
use crate::extension::version::{LibVersion, LibVersionRange};
use crate::kernel::constants::{EXTENSION_FEATURE, METADATA_NSFW, METADATA_SOURCE_CLASS, NSFW_MARKER};

/// States of a single install
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallStage {
    Fetching,
    Inspecting,
    ValidatingFeature,
    ValidatingVersion,
    Converting,
    Loading,
    Classifying,
    Tagging,
    Done,
    Failed,
}

impl InstallStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, InstallStage::Done | InstallStage::Failed)
    }
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstallStage::Fetching => "fetching",
            InstallStage::Inspecting => "inspecting",
            InstallStage::ValidatingFeature => "validating feature",
            InstallStage::ValidatingVersion => "validating version",
            InstallStage::Converting => "converting",
            InstallStage::Loading => "loading",
            InstallStage::Classifying => "classifying",
            InstallStage::Tagging => "tagging",
            InstallStage::Done => "done",
            InstallStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Receives every stage an install enters
pub trait InstallObserver: Send + Sync {
    fn on_stage(&self, stage: InstallStage);
}

/// Tracks the current stage of one install and reports transitions.
struct Progress {
    stage: InstallStage,
    observer: Option<Arc<dyn InstallObserver>>,
}

impl Progress {
    fn start(observer: Option<Arc<dyn InstallObserver>>) -> Self {
        let progress = Self {
            stage: InstallStage::Fetching,
            observer,
        };
        progress.notify();
        progress
    }

    fn enter(&mut self, stage: InstallStage) {
        debug!("Install stage: {} -> {}", self.stage, stage);
        self.stage = stage;
        self.notify();
    }

    fn notify(&self) {
        if let Some(observer) = &self.observer {
            observer.on_stage(self.stage);
        }
    }
}

/// Read-only policy an installer validates packages against
#[derive(Debug, Clone, PartialEq)]
pub struct InstallSettings {
    pub extension_feature: String,
    pub version_range: LibVersionRange,
    pub metadata_source_class: String,
    pub metadata_nsfw: String,
    pub nsfw_marker: String,
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self {
            extension_feature: EXTENSION_FEATURE.to_string(),
            version_range: LibVersionRange::default(),
            metadata_source_class: METADATA_SOURCE_CLASS.to_string(),
            metadata_nsfw: METADATA_NSFW.to_string(),
            nsfw_marker: NSFW_MARKER.to_string(),
        }
    }
}

/// Outcome of a successful install. The caller decides whether to keep it.
#[derive(Debug, Clone)]
pub struct InstallResult {
    pub package_identifier: String,
    pub version_name: String,
    pub lib_version: LibVersion,
    /// Package-level NSFW flag from the manifest metadata
    pub extension_nsfw: bool,
    pub sources: Vec<LoadedSource>,
}

/// Everything the blocking half of an install needs, owned
struct Pipeline {
    settings: InstallSettings,
    inspector: Arc<dyn PackageInspector>,
    converter: Arc<dyn FormatConverter>,
    loader: Arc<dyn DynamicLoader>,
    classifier: SourceClassifier,
    nsfw: NsfwDetector,
}

impl Pipeline {
    fn validate(&self, manifest: &PackageManifest, progress: &mut Progress) -> Result<LibVersion, ExtensionError> {
        progress.enter(InstallStage::ValidatingFeature);
        if !manifest.declares_feature(&self.settings.extension_feature) {
            return Err(ExtensionError::NotAnExtension {
                package: manifest.package_identifier.clone(),
                feature: self.settings.extension_feature.clone(),
            });
        }

        progress.enter(InstallStage::ValidatingVersion);
        let lib_version = LibVersion::from_version_name(&manifest.version_string).map_err(|source| {
            ExtensionError::MalformedVersion {
                package: manifest.package_identifier.clone(),
                version: manifest.version_string.clone(),
                source,
            }
        })?;
        if !self.settings.version_range.includes(lib_version) {
            return Err(ExtensionError::IncompatibleVersion {
                package: manifest.package_identifier.clone(),
                found: lib_version,
                range: self.settings.version_range,
            });
        }
        Ok(lib_version)
    }

    fn run(&self, package: &Path, tmp_dir: &Path, progress: &mut Progress) -> Result<InstallResult, ExtensionError> {
        progress.enter(InstallStage::Inspecting);
        let manifest = self.inspector.inspect(package)?;

        let lib_version = self.validate(&manifest, progress)?;

        let class_name = manifest
            .entry_class_name(&self.settings.metadata_source_class)
            .ok_or_else(|| {
                ExtensionError::malformed(
                    package,
                    format!("missing metadata entry '{}'", self.settings.metadata_source_class),
                )
            })?;
        trace!("Main class for extension is {}", class_name);

        progress.enter(InstallStage::Converting);
        let payload = converted_payload_path(package, tmp_dir);
        self.converter.convert(package, &payload)?;

        progress.enter(InstallStage::Loading);
        let instance = self.loader.load_entry_point(&payload, &class_name)?;

        progress.enter(InstallStage::Classifying);
        let classification = self.classifier.classify(instance)?;

        progress.enter(InstallStage::Tagging);
        let sources = self.nsfw.tag(classification);

        Ok(InstallResult {
            extension_nsfw: manifest.is_nsfw(&self.settings.metadata_nsfw),
            package_identifier: manifest.package_identifier,
            version_name: manifest.version_string,
            lib_version,
            sources,
        })
    }
}

/// Where the converted payload of `package` goes: `<tmp_dir>/<stem>.<dll ext>`
pub fn converted_payload_path(package: &Path, tmp_dir: &Path) -> PathBuf {
    let stem = package
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "extension".to_string());
    tmp_dir.join(format!("{}.{}", stem, std::env::consts::DLL_EXTENSION))
}

/// Installs extension packages.
///
/// Holds no per-install state, so one installer can serve concurrent installs
/// of different packages. Each install must get its own `tmp_dir`; cleaning it
/// up is the caller's job.
#[derive(Clone)]
pub struct ExtensionInstaller {
    pipeline: Arc<Pipeline>,
    observer: Option<Arc<dyn InstallObserver>>,
}

impl ExtensionInstaller {
    /// An installer using the archive inspector, native payload converter and
    /// native loader.
    pub fn new(settings: InstallSettings) -> Self {
        ExtensionInstallerBuilder::new(settings).build()
    }

    pub fn builder(settings: InstallSettings) -> ExtensionInstallerBuilder {
        ExtensionInstallerBuilder::new(settings)
    }

    pub fn settings(&self) -> &InstallSettings {
        &self.pipeline.settings
    }

    /// Run the feature and version checks on a manifest without loading anything.
    pub fn validate(&self, manifest: &PackageManifest) -> Result<LibVersion, ExtensionError> {
        let mut progress = Progress {
            stage: InstallStage::Inspecting,
            observer: None,
        };
        self.pipeline.validate(manifest, &mut progress)
    }

    /// Install the package produced by `fetcher`, using `tmp_dir` for the
    /// converted payload.
    ///
    /// Reinstalling into the same `tmp_dir` replaces the payload file by
    /// rename, so sources from an earlier install keep their mapped library.
    pub async fn install<F>(&self, tmp_dir: &Path, fetcher: &F) -> Result<InstallResult, ExtensionError>
    where
        F: PackageFetcher + ?Sized,
    {
        let mut progress = Progress::start(self.observer.clone());

        let package = match fetcher.fetch().await {
            Ok(package) => package,
            Err(e) => {
                warn!("Extension install failed while {}: {}", progress.stage, e);
                progress.enter(InstallStage::Failed);
                return Err(ExtensionError::Fetch(e));
            }
        };
        debug!("Fetched extension package {}", package.display());

        // Everything past the fetch is blocking file and library work
        let pipeline = Arc::clone(&self.pipeline);
        let tmp_dir = tmp_dir.to_path_buf();
        let joined = tokio::task::spawn_blocking(move || {
            let result = pipeline.run(&package, &tmp_dir, &mut progress);
            (progress, result)
        })
        .await;

        let (mut progress, result) = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Some(observer) = &self.observer {
                    observer.on_stage(InstallStage::Failed);
                }
                return Err(ExtensionError::Internal(format!("install task failed: {}", e)));
            }
        };

        match result {
            Ok(result) => {
                progress.enter(InstallStage::Done);
                info!(
                    "Installed extension {} {} with {} sources",
                    result.package_identifier,
                    result.version_name,
                    result.sources.len()
                );
                Ok(result)
            }
            Err(e) => {
                warn!("Extension install failed while {}: {}", progress.stage, e);
                progress.enter(InstallStage::Failed);
                Err(e)
            }
        }
    }
}

/// Builder for swapping out installer components
pub struct ExtensionInstallerBuilder {
    settings: InstallSettings,
    inspector: Arc<dyn PackageInspector>,
    converter: Arc<dyn FormatConverter>,
    loader: Arc<dyn DynamicLoader>,
    probe: Option<Arc<dyn MetadataProbe>>,
    observer: Option<Arc<dyn InstallObserver>>,
}

impl ExtensionInstallerBuilder {
    pub fn new(settings: InstallSettings) -> Self {
        Self {
            settings,
            inspector: Arc::new(ArchiveInspector::new()),
            converter: Arc::new(NativePayloadConverter::new()),
            loader: Arc::new(NativeLoader::new()),
            probe: None,
            observer: None,
        }
    }

    pub fn inspector(mut self, inspector: Arc<dyn PackageInspector>) -> Self {
        self.inspector = inspector;
        self
    }

    pub fn converter(mut self, converter: Arc<dyn FormatConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn loader(mut self, loader: Arc<dyn DynamicLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Replace the metadata probe used for NSFW detection
    pub fn probe(mut self, probe: Arc<dyn MetadataProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn InstallObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn build(self) -> ExtensionInstaller {
        let probe = self.probe.unwrap_or_else(|| Arc::new(AnnotationNameProbe));
        let nsfw = NsfwDetector::new(probe, self.settings.nsfw_marker.clone());
        ExtensionInstaller {
            pipeline: Arc::new(Pipeline {
                settings: self.settings,
                inspector: self.inspector,
                converter: self.converter,
                loader: self.loader,
                classifier: SourceClassifier::new(),
                nsfw,
            }),
            observer: self.observer,
        }
    }
}
