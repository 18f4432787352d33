//! # Bindery Core
//!
//! Installs content-source extensions: inspects an extension package,
//! validates that it targets a compatible extension library, converts its
//! payload into something loadable, instantiates the entry point and
//! hands back the sources it provides, tagged by content rating.
pub mod config;
pub mod extension;
pub mod kernel;

pub use config::{ConfigFormat, InstallerConfig};
pub use extension::{
    ExtensionError, ExtensionInstaller, InstallResult, InstallSettings, InstallStage, LoadedSource,
    PackageFetcher,
};
pub use kernel::error::Error as KernelError;
