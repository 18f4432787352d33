//! Resolves and instantiates an extension's entry-point class.
//!
//! This is the only place where symbols are looked up dynamically; everything
//! downstream works on the [`EntryPointInstance`] it returns.
use std::path::Path;
use std::sync::Arc;

use libloading::Library;
use log::{debug, trace};

use crate::extension::error::ExtensionError;
use crate::extension::ffi::{EntryPointConstructor, ObjectVTable, STATUS_OK, entry_symbol, status_message};
use crate::extension::native;
use crate::extension::object::EntryPointInstance;

/// Loads an entry point out of a converted payload.
pub trait DynamicLoader: Send + Sync {
    /// Locate `class_name` in the payload at `payload` and instantiate it.
    ///
    /// Fails with [`ExtensionError::EntryPointNotFound`] when the class is not
    /// in the payload and [`ExtensionError::InstantiationFailure`] when it is
    /// there but cannot be constructed.
    fn load_entry_point(&self, payload: &Path, class_name: &str) -> Result<EntryPointInstance, ExtensionError>;
}

/// Loads entry points from native shared libraries with `libloading`.
#[derive(Debug, Clone, Default)]
pub struct NativeLoader;

impl NativeLoader {
    pub fn new() -> Self {
        Self
    }
}

impl DynamicLoader for NativeLoader {
    fn load_entry_point(&self, payload: &Path, class_name: &str) -> Result<EntryPointInstance, ExtensionError> {
        let library = unsafe { Library::new(payload) }.map_err(|e| ExtensionError::EntryPointNotFound {
            class_name: class_name.to_string(),
            path: payload.to_path_buf(),
            message: format!("libloading error: {}", e),
        })?;

        let symbol = entry_symbol(class_name);
        trace!("Resolving {} as symbol {}", class_name, symbol);

        let constructor: EntryPointConstructor = {
            let found = unsafe { library.get::<EntryPointConstructor>(symbol.as_bytes()) }.map_err(|e| {
                ExtensionError::EntryPointNotFound {
                    class_name: class_name.to_string(),
                    path: payload.to_path_buf(),
                    message: format!("missing symbol {}: {}", symbol, e),
                }
            })?;
            *found
        };

        let mut vtable: *mut ObjectVTable = std::ptr::null_mut();
        let status = unsafe { constructor(&mut vtable) };
        if status != STATUS_OK {
            return Err(ExtensionError::InstantiationFailure {
                class_name: class_name.to_string(),
                message: format!("constructor returned status {} ({})", status, status_message(status)),
            });
        }
        if vtable.is_null() {
            return Err(ExtensionError::InstantiationFailure {
                class_name: class_name.to_string(),
                message: "constructor returned a null object".to_string(),
            });
        }

        let object = unsafe { native::wrap(vtable, Arc::new(library)) }.map_err(|message| {
            ExtensionError::InstantiationFailure {
                class_name: class_name.to_string(),
                message,
            }
        })?;

        debug!("Instantiated {} as {}", class_name, object.type_name());
        Ok(EntryPointInstance::new(object))
    }
}
