//! Turns a package's native payload into a file the loader can open.
use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::extension::error::ExtensionError;
use crate::kernel::constants::PAYLOAD_ROOT;

/// One-shot, file-to-file transform of a package into a loadable payload.
pub trait FormatConverter: Send + Sync {
    /// Write the converted payload of `package` to `output`.
    /// The input file is left untouched.
    fn convert(&self, package: &Path, output: &Path) -> Result<(), ExtensionError>;
}

/// Platform directory name used inside packages, e.g. "linux-x86_64".
pub fn host_platform() -> String {
    format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

/// Scratch file a payload is written to before it replaces `output`
fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.file_name().map(OsString::from).unwrap_or_default();
    name.push(".partial");
    output.with_file_name(name)
}

/// Extracts the shared library built for the host platform from a zip package.
///
/// Packages ship one library per platform under `lib/<os>-<arch>/`.
#[derive(Debug, Clone)]
pub struct NativePayloadConverter {
    payload_root: String,
    platform: String,
}

impl NativePayloadConverter {
    pub fn new() -> Self {
        Self {
            payload_root: PAYLOAD_ROOT.to_string(),
            platform: host_platform(),
        }
    }

    /// Target a platform other than the host one
    pub fn for_platform(platform: impl Into<String>) -> Self {
        Self {
            payload_root: PAYLOAD_ROOT.to_string(),
            platform: platform.into(),
        }
    }

    /// Directory prefix searched inside the archive, e.g. "lib/linux-x86_64/"
    pub fn payload_dir(&self) -> String {
        format!("{}/{}/", self.payload_root, self.platform)
    }

    fn is_payload_entry(&self, name: &str) -> bool {
        let prefix = self.payload_dir();
        match name.strip_prefix(&prefix) {
            // Only direct children, never nested directories
            Some(rest) => {
                !rest.is_empty()
                    && !rest.contains('/')
                    && Path::new(rest).extension().and_then(|e| e.to_str())
                        == Some(std::env::consts::DLL_EXTENSION)
            }
            None => false,
        }
    }
}

impl Default for NativePayloadConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatConverter for NativePayloadConverter {
    fn convert(&self, package: &Path, output: &Path) -> Result<(), ExtensionError> {
        let file = File::open(package).map_err(|e| ExtensionError::ConversionFailure {
            path: package.to_path_buf(),
            message: "cannot open package file".to_string(),
            source: Some(Box::new(e)),
        })?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| ExtensionError::ConversionFailure {
            path: package.to_path_buf(),
            message: "corrupt package archive".to_string(),
            source: Some(Box::new(e)),
        })?;

        let mut candidates: Vec<String> = archive
            .file_names()
            .filter(|name| self.is_payload_entry(name))
            .map(str::to_string)
            .collect();
        candidates.sort();

        let entry_name = match candidates.as_slice() {
            [single] => single.clone(),
            [] => {
                return Err(ExtensionError::conversion(
                    package,
                    format!("no native payload for platform '{}' under '{}'", self.platform, self.payload_dir()),
                ));
            }
            many => {
                return Err(ExtensionError::conversion(
                    package,
                    format!("ambiguous native payload, found {} libraries: {}", many.len(), many.join(", ")),
                ));
            }
        };

        let mut entry = archive.by_name(&entry_name).map_err(|e| ExtensionError::ConversionFailure {
            path: package.to_path_buf(),
            message: format!("cannot read '{}'", entry_name),
            source: Some(Box::new(e)),
        })?;

        // Written beside the target and renamed into place, so a failed copy
        // never leaves a truncated payload at `output`
        let partial = partial_path(output);
        let written = File::create(&partial)
            .and_then(|mut out| io::copy(&mut entry, &mut out))
            .and_then(|written| fs::rename(&partial, output).map(|_| written))
            .map_err(|e| {
                if let Err(cleanup) = fs::remove_file(&partial) {
                    trace!("Could not remove {}: {}", partial.display(), cleanup);
                }
                ExtensionError::ConversionFailure {
                    path: output.to_path_buf(),
                    message: format!("failed to write '{}'", entry_name),
                    source: Some(Box::new(e)),
                }
            })?;

        debug!("Extracted {} ({} bytes) to {}", entry_name, written, output.display());
        Ok(())
    }
}
