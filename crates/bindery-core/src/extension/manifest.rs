use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// On-disk shape of `manifest.json` inside an extension package
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RawPackageManifest {
    pub package: String,
    pub version_name: String,
    #[serde(default)]
    pub version_code: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub uses_features: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Parsed description of an extension package. Immutable once read.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageManifest {
    /// Features the package declares it requires
    pub required_features: BTreeSet<String>,

    /// Unique package identifier, e.g. "com.example.src"
    pub package_identifier: String,

    /// Declared version name, e.g. "1.5.3"
    pub version_string: String,

    /// Monotonic build number, if declared
    pub version_code: Option<u32>,

    /// Human-readable label, if declared
    pub label: Option<String>,

    /// Application metadata entries (entry-point class, NSFW flag, ...)
    pub entry_metadata: BTreeMap<String, String>,
}

impl PackageManifest {
    /// Create a new manifest with no features and no metadata
    pub fn new(package_identifier: &str, version_string: &str) -> Self {
        Self {
            required_features: BTreeSet::new(),
            package_identifier: package_identifier.to_string(),
            version_string: version_string.to_string(),
            version_code: None,
            label: None,
            entry_metadata: BTreeMap::new(),
        }
    }

    /// Check whether the package declares `feature`
    pub fn declares_feature(&self, feature: &str) -> bool {
        self.required_features.contains(feature)
    }

    /// Look up a metadata value
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.entry_metadata.get(key).map(String::as_str)
    }

    /// Resolve the fully-qualified entry-point class stored under `metadata_key`.
    ///
    /// Values starting with `.` are relative to the package identifier,
    /// anything else is taken as already fully qualified.
    pub fn entry_class_name(&self, metadata_key: &str) -> Option<String> {
        let class = self.metadata(metadata_key)?.trim();
        if class.is_empty() {
            return None;
        }
        if class.starts_with('.') {
            Some(format!("{}{}", self.package_identifier, class))
        } else {
            Some(class.to_string())
        }
    }

    /// Whether the package metadata flags the whole extension as NSFW
    pub fn is_nsfw(&self, metadata_key: &str) -> bool {
        self.metadata(metadata_key).map(str::trim) == Some("1")
    }
}

impl From<RawPackageManifest> for PackageManifest {
    fn from(raw: RawPackageManifest) -> Self {
        Self {
            required_features: raw.uses_features.into_iter().collect(),
            package_identifier: raw.package,
            version_string: raw.version_name,
            version_code: raw.version_code,
            label: raw.name,
            entry_metadata: raw.metadata,
        }
    }
}

impl From<&PackageManifest> for RawPackageManifest {
    fn from(manifest: &PackageManifest) -> Self {
        Self {
            package: manifest.package_identifier.clone(),
            version_name: manifest.version_string.clone(),
            version_code: manifest.version_code,
            name: manifest.label.clone(),
            uses_features: manifest.required_features.iter().cloned().collect(),
            metadata: manifest.entry_metadata.clone(),
        }
    }
}

/// Builder for creating package manifests
pub struct ManifestBuilder {
    manifest: PackageManifest,
}

impl ManifestBuilder {
    /// Create a new manifest builder
    pub fn new(package_identifier: &str, version_string: &str) -> Self {
        Self {
            manifest: PackageManifest::new(package_identifier, version_string),
        }
    }

    /// Declare a required feature
    pub fn feature(mut self, feature: &str) -> Self {
        self.manifest.required_features.insert(feature.to_string());
        self
    }

    /// Add a metadata entry
    pub fn metadata(mut self, key: &str, value: &str) -> Self {
        self.manifest.entry_metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// Set the human-readable label
    pub fn label(mut self, label: &str) -> Self {
        self.manifest.label = Some(label.to_string());
        self
    }

    /// Set the version code
    pub fn version_code(mut self, code: u32) -> Self {
        self.manifest.version_code = Some(code);
        self
    }

    /// Build the manifest
    pub fn build(self) -> PackageManifest {
        self.manifest
    }
}
