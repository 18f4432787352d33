//! In-process stand-ins for extension code and package files.
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::extension::converter::host_platform;
use crate::extension::error::ExtensionError;
use crate::extension::loader::DynamicLoader;
use crate::extension::manifest::{ManifestBuilder, PackageManifest, RawPackageManifest};
use crate::extension::object::{Annotation, EntryPointInstance, ExtensionObject};
use crate::extension::source::{HttpSource, Source, SourceFactory};
use crate::kernel::constants::{EXTENSION_FEATURE, METADATA_SOURCE_CLASS};

pub const NSFW_ANNOTATION: &str = "eu.kanade.tachiyomi.annotations.Nsfw";

/// A source implemented in the test process
pub struct TestSource {
    pub type_name: String,
    pub id: i64,
    pub name: String,
    pub http: bool,
    pub annotations: Vec<Annotation>,
}

impl TestSource {
    pub fn http(name: &str, id: i64) -> Self {
        Self {
            type_name: format!("test.sources.{}", name),
            id,
            name: name.to_string(),
            http: true,
            annotations: Vec::new(),
        }
    }

    pub fn plain(name: &str, id: i64) -> Self {
        Self {
            http: false,
            ..Self::http(name, id)
        }
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn into_object(self) -> Arc<dyn ExtensionObject> {
        Arc::new(self)
    }
}

impl ExtensionObject for TestSource {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn annotations(&self) -> Vec<Annotation> {
        self.annotations.clone()
    }

    fn as_source(self: Arc<Self>) -> Option<Arc<dyn Source>> {
        Some(self)
    }

    fn as_http_source(self: Arc<Self>) -> Option<Arc<dyn HttpSource>> {
        if self.http { Some(self) } else { None }
    }
}

impl Source for TestSource {
    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn lang(&self) -> &str {
        "en"
    }
}

impl HttpSource for TestSource {
    fn base_url(&self) -> &str {
        "https://example.org"
    }
}

type ObjectFactoryFn = Box<dyn Fn() -> Result<Vec<Arc<dyn ExtensionObject>>, ExtensionError> + Send + Sync>;

/// A source factory implemented in the test process
pub struct TestFactory {
    pub annotations: Vec<Annotation>,
    produce: ObjectFactoryFn,
}

impl TestFactory {
    pub fn new<F>(produce: F) -> Self
    where
        F: Fn() -> Vec<Arc<dyn ExtensionObject>> + Send + Sync + 'static,
    {
        Self {
            annotations: Vec::new(),
            produce: Box::new(move || Ok(produce())),
        }
    }

    /// A factory whose every `create_sources` call fails
    pub fn failing(message: &'static str) -> Self {
        Self {
            annotations: Vec::new(),
            produce: Box::new(move || {
                Err(ExtensionError::InstantiationFailure {
                    class_name: "test.sources.Factory".to_string(),
                    message: message.to_string(),
                })
            }),
        }
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn into_object(self) -> Arc<dyn ExtensionObject> {
        Arc::new(self)
    }
}

impl ExtensionObject for TestFactory {
    fn type_name(&self) -> &str {
        "test.sources.Factory"
    }

    fn annotations(&self) -> Vec<Annotation> {
        self.annotations.clone()
    }

    fn as_source_factory(self: Arc<Self>) -> Option<Arc<dyn SourceFactory>> {
        Some(self)
    }
}

impl SourceFactory for TestFactory {
    fn create_sources(&self) -> Result<Vec<Arc<dyn ExtensionObject>>, ExtensionError> {
        (self.produce)()
    }
}

/// Neither a source nor a factory
pub struct TestWidget;

impl ExtensionObject for TestWidget {
    fn type_name(&self) -> &str {
        "com.example.Widget"
    }
}

type EntryPointFn = Box<dyn Fn() -> Arc<dyn ExtensionObject> + Send + Sync>;

/// Loader handing out in-process objects and recording what it was asked for
pub struct StubLoader {
    make: EntryPointFn,
    pub requests: Mutex<Vec<(PathBuf, String)>>,
}

impl StubLoader {
    pub fn new<F>(make: F) -> Self
    where
        F: Fn() -> Arc<dyn ExtensionObject> + Send + Sync + 'static,
    {
        Self {
            make: Box::new(make),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requested_classes(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|(_, class)| class.clone()).collect()
    }
}

impl DynamicLoader for StubLoader {
    fn load_entry_point(&self, payload: &Path, class_name: &str) -> Result<EntryPointInstance, ExtensionError> {
        assert!(payload.exists(), "payload should have been converted before loading");
        self.requests
            .lock()
            .unwrap()
            .push((payload.to_path_buf(), class_name.to_string()));
        Ok(EntryPointInstance::new((self.make)()))
    }
}

/// Manifest of a well-formed extension with the given version name
pub fn extension_manifest(package: &str, version_name: &str) -> PackageManifest {
    ManifestBuilder::new(package, version_name)
        .feature(EXTENSION_FEATURE)
        .metadata(METADATA_SOURCE_CLASS, ".MainSource")
        .label("Test extension")
        .version_code(7)
        .build()
}

/// Host-platform payload entry name for a library called `name`
pub fn payload_entry(name: &str) -> String {
    format!(
        "lib/{}/{}{}{}",
        host_platform(),
        std::env::consts::DLL_PREFIX,
        name,
        std::env::consts::DLL_SUFFIX
    )
}

/// Write a zip package with `manifest` and the given extra entries
pub fn write_package(dir: &Path, file_name: &str, manifest: &PackageManifest, entries: &[(&str, &[u8])]) -> PathBuf {
    let raw = RawPackageManifest::from(manifest);
    let json = serde_json::to_vec_pretty(&raw).unwrap();
    let mut all: Vec<(&str, &[u8])> = vec![("manifest.json", json.as_slice())];
    all.extend_from_slice(entries);
    write_archive(dir, file_name, &all)
}

/// Write an arbitrary zip archive
pub fn write_archive(dir: &Path, file_name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(file_name);
    let mut zip = ZipWriter::new(File::create(&path).unwrap());
    for (name, data) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
    path
}

/// A package with a manifest and a single fake host payload
pub fn write_extension_package(dir: &Path, manifest: &PackageManifest) -> PathBuf {
    let entry = payload_entry("main");
    write_package(dir, "extension.zip", manifest, &[(entry.as_str(), &b"not really a library"[..])])
}
