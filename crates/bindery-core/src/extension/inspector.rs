//! Reads the manifest of a raw extension package.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::trace;

use crate::extension::error::ExtensionError;
use crate::extension::manifest::{PackageManifest, RawPackageManifest};
use crate::kernel::constants::PACKAGE_MANIFEST;

/// Extracts the [`PackageManifest`] from a package file.
pub trait PackageInspector: Send + Sync {
    /// Parse the manifest of the package at `package`.
    /// Fails with [`ExtensionError::MalformedPackage`] when it cannot be read.
    fn inspect(&self, package: &Path) -> Result<PackageManifest, ExtensionError>;
}

/// Inspector for zip-based packages carrying a JSON manifest.
#[derive(Debug, Clone)]
pub struct ArchiveInspector {
    manifest_entry: String,
}

impl ArchiveInspector {
    pub fn new() -> Self {
        Self {
            manifest_entry: PACKAGE_MANIFEST.to_string(),
        }
    }

    /// Use a different archive entry as the manifest
    pub fn with_manifest_entry(manifest_entry: impl Into<String>) -> Self {
        Self {
            manifest_entry: manifest_entry.into(),
        }
    }

    fn read_manifest_entry(&self, package: &Path) -> Result<String, ExtensionError> {
        let file = File::open(package).map_err(|e| ExtensionError::MalformedPackage {
            path: package.to_path_buf(),
            message: "cannot open package file".to_string(),
            source: Some(Box::new(e)),
        })?;

        let mut archive = zip::ZipArchive::new(file).map_err(|e| ExtensionError::MalformedPackage {
            path: package.to_path_buf(),
            message: "not a valid package archive".to_string(),
            source: Some(Box::new(e)),
        })?;

        let mut entry = archive.by_name(&self.manifest_entry).map_err(|e| ExtensionError::MalformedPackage {
            path: package.to_path_buf(),
            message: format!("missing '{}'", self.manifest_entry),
            source: Some(Box::new(e)),
        })?;

        let mut content = String::new();
        entry.read_to_string(&mut content).map_err(|e| ExtensionError::MalformedPackage {
            path: package.to_path_buf(),
            message: format!("cannot read '{}'", self.manifest_entry),
            source: Some(Box::new(e)),
        })?;
        Ok(content)
    }
}

impl Default for ArchiveInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageInspector for ArchiveInspector {
    fn inspect(&self, package: &Path) -> Result<PackageManifest, ExtensionError> {
        let content = self.read_manifest_entry(package)?;

        let raw: RawPackageManifest = serde_json::from_str(&content).map_err(|e| ExtensionError::MalformedPackage {
            path: package.to_path_buf(),
            message: format!("failed to parse '{}': {}", self.manifest_entry, e),
            source: Some(Box::new(e)),
        })?;

        if raw.package.trim().is_empty() {
            return Err(ExtensionError::malformed(package, "package identifier is empty"));
        }

        trace!(
            "Read manifest of {} ({} features, {} metadata entries)",
            raw.package,
            raw.uses_features.len(),
            raw.metadata.len()
        );
        Ok(PackageManifest::from(raw))
    }
}
