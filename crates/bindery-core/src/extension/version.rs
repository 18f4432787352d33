use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::kernel::constants::{LIB_VERSION_MAX, LIB_VERSION_MIN};

/// Error type for library version parsing
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VersionError {
    #[error("Empty version string")]
    Empty,
    #[error("Version prefix '{prefix}' is not numeric")]
    NotNumeric { prefix: String },
    #[error("Invalid version range: {0}")]
    InvalidRange(String),
}

/// The extension library version an extension was built against.
///
/// Extensions encode it in their version name: everything before the last
/// `.` is the library version and the last component is the extension's own
/// revision (`"1.5.3"` is revision 3 built against library `1.5`).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct LibVersion(f64);

impl LibVersion {
    /// Creates a library version from its numeric value.
    /// Returns `None` for NaN or infinite values.
    pub fn new(value: f64) -> Option<Self> {
        value.is_finite().then_some(Self(value))
    }

    /// Extracts the library version from a package version name like "1.5.3".
    ///
    /// A version name without any `.` is parsed as a whole.
    pub fn from_version_name(version_name: &str) -> Result<Self, VersionError> {
        let trimmed = version_name.trim();
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }

        let prefix = match trimmed.rfind('.') {
            Some(idx) => &trimmed[..idx],
            None => trimmed,
        };

        prefix
            .parse::<f64>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| VersionError::NotNumeric { prefix: prefix.to_string() })
    }

    /// Returns the numeric value
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl FromStr for LibVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LibVersion::from_version_name(s)
    }
}

impl fmt::Display for LibVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keep at least one decimal so 1.0 does not print as "1"
        if self.0.fract() == 0.0 {
            write!(f, "{:.1}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Inclusive range of library versions the host can load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LibVersionRange {
    min: LibVersion,
    max: LibVersion,
}

impl LibVersionRange {
    /// Creates a new range, rejecting `min > max`.
    pub fn new(min: LibVersion, max: LibVersion) -> Result<Self, VersionError> {
        if min > max {
            return Err(VersionError::InvalidRange(format!(
                "minimum {} is greater than maximum {}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    /// Creates a range from raw bounds.
    pub fn from_bounds(min: f64, max: f64) -> Result<Self, VersionError> {
        let min = LibVersion::new(min)
            .ok_or_else(|| VersionError::InvalidRange(format!("minimum {} is not finite", min)))?;
        let max = LibVersion::new(max)
            .ok_or_else(|| VersionError::InvalidRange(format!("maximum {} is not finite", max)))?;
        Self::new(min, max)
    }

    /// Checks whether `version` lies within the range, bounds included.
    pub fn includes(&self, version: LibVersion) -> bool {
        version >= self.min && version <= self.max
    }

    pub fn min(&self) -> LibVersion {
        self.min
    }

    pub fn max(&self) -> LibVersion {
        self.max
    }
}

impl Default for LibVersionRange {
    /// The range this host build supports
    fn default() -> Self {
        Self {
            min: LibVersion(LIB_VERSION_MIN),
            max: LibVersion(LIB_VERSION_MAX),
        }
    }
}

impl fmt::Display for LibVersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.min, self.max)
    }
}
