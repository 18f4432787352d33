//! # Bindery Installer Configuration
//!
//! Optional overrides for the installer's validation policy, read from a
//! JSON, YAML or TOML file. Any key left out keeps its compiled-in default
//! from [`crate::kernel::constants`].
pub mod error;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::extension::installer::InstallSettings;
use crate::extension::version::LibVersionRange;
use crate::kernel::constants::{
    EXTENSION_FEATURE, LIB_VERSION_MAX, LIB_VERSION_MIN, METADATA_NSFW, METADATA_SOURCE_CLASS, NSFW_MARKER,
};

pub use error::ConfigError;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from a name such as "json" or "yml"
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "json" => Some(ConfigFormat::Json),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            #[cfg(feature = "toml-config")]
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_name)
    }
}

/// Installer policy as it appears in a configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    pub extension_feature: String,
    pub lib_version_min: f64,
    pub lib_version_max: f64,
    pub metadata_source_class: String,
    pub metadata_nsfw: String,
    pub nsfw_marker: String,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            extension_feature: EXTENSION_FEATURE.to_string(),
            lib_version_min: LIB_VERSION_MIN,
            lib_version_max: LIB_VERSION_MAX,
            metadata_source_class: METADATA_SOURCE_CLASS.to_string(),
            metadata_nsfw: METADATA_NSFW.to_string(),
            nsfw_marker: NSFW_MARKER.to_string(),
        }
    }
}

impl InstallerConfig {
    /// Read a configuration file, picking the format from its extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            ConfigError::UnsupportedFormat(
                path.extension()
                    .map(|ext| ext.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
            )
        })?;
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            operation: "read_config".to_string(),
            source,
        })?;
        let config = Self::parse(&content, format)?;
        log::debug!("Loaded installer configuration from {}", path.display());
        Ok(config)
    }

    /// Deserialize from string based on format
    pub fn parse(data: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let deserialization = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::Deserialization {
            format: format.extension().to_string(),
            source,
        };
        match format {
            ConfigFormat::Json => serde_json::from_str(data).map_err(|e| deserialization(Box::new(e))),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data).map_err(|e| deserialization(Box::new(e))),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data).map_err(|e| deserialization(Box::new(e))),
        }
    }

    /// Serialize to string based on format
    pub fn to_string(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        let serialization = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::Serialization {
            format: format.extension().to_string(),
            source,
        };
        match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self).map_err(|e| serialization(Box::new(e))),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::to_string(self).map_err(|e| serialization(Box::new(e))),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::to_string_pretty(self).map_err(|e| serialization(Box::new(e))),
        }
    }

    /// Validate the values and turn them into installer settings.
    pub fn into_settings(self) -> Result<InstallSettings, ConfigError> {
        for (key, value) in [
            ("extension_feature", &self.extension_feature),
            ("metadata_source_class", &self.metadata_source_class),
            ("metadata_nsfw", &self.metadata_nsfw),
            ("nsfw_marker", &self.nsfw_marker),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::invalid(key, "must not be empty"));
            }
        }

        let version_range = LibVersionRange::from_bounds(self.lib_version_min, self.lib_version_max)
            .map_err(|e| ConfigError::invalid("lib_version_min", e.to_string()))?;

        Ok(InstallSettings {
            extension_feature: self.extension_feature,
            version_range,
            metadata_source_class: self.metadata_source_class,
            metadata_nsfw: self.metadata_nsfw,
            nsfw_marker: self.nsfw_marker,
        })
    }
}

impl From<&InstallSettings> for InstallerConfig {
    fn from(settings: &InstallSettings) -> Self {
        Self {
            extension_feature: settings.extension_feature.clone(),
            lib_version_min: settings.version_range.min().value(),
            lib_version_max: settings.version_range.max().value(),
            metadata_source_class: settings.metadata_source_class.clone(),
            metadata_nsfw: settings.metadata_nsfw.clone(),
            nsfw_marker: settings.nsfw_marker.clone(),
        }
    }
}
