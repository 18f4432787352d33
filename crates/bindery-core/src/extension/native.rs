//! Wrappers exposing objects from native extension libraries as
//! [`ExtensionObject`]s.
use std::ffi::c_void;
use std::sync::Arc;

use libloading::Library;
use log::warn;

use crate::extension::error::ExtensionError;
use crate::extension::ffi::{
    CAPABILITY_HTTP, FfiAnnotation, FfiError, FfiSlice, FfiSourceInfo, KIND_SOURCE, KIND_SOURCE_FACTORY,
    ObjectVTable, STATUS_OK, status_message, string_from_ptr,
};
use crate::extension::object::{Annotation, ExtensionObject};
use crate::extension::source::{HttpSource, Source, SourceFactory, SourceInfo};

/// Owns one object vtable and keeps its library loaded.
struct NativeHandle {
    vtable: *mut ObjectVTable,
    type_name: String,
    annotations: Vec<Annotation>,
    // Dropped after `destroy` has run, see Drop below
    library: Arc<Library>,
}

// The vtable is only reached through &self and extension objects are
// required to be thread-safe by the ABI.
unsafe impl Send for NativeHandle {}
unsafe impl Sync for NativeHandle {}

impl NativeHandle {
    fn vtable(&self) -> &ObjectVTable {
        unsafe { &*self.vtable }
    }

    fn instance(&self) -> *const c_void {
        self.vtable().instance as *const c_void
    }
}

impl Drop for NativeHandle {
    fn drop(&mut self) {
        if !self.vtable.is_null() {
            let destroy = self.vtable().destroy;
            destroy(self.vtable);
            self.vtable = std::ptr::null_mut();
        }
    }
}

/// Reads the annotation entries of an object.
/// # Safety
/// `slice` must come from the object's `annotations` function while it is alive.
unsafe fn read_annotations(slice: FfiSlice<FfiAnnotation>) -> Result<Vec<Annotation>, FfiError> {
    let Some(items) = (unsafe { slice.as_slice() }) else {
        return Ok(Vec::new());
    };
    items
        .iter()
        .map(|item| {
            let type_name = unsafe { string_from_ptr(item.type_name) }?;
            let interfaces = match unsafe { item.interfaces.as_slice() } {
                Some(ptrs) => ptrs
                    .iter()
                    .map(|&ptr| unsafe { string_from_ptr(ptr) })
                    .collect::<Result<Vec<_>, _>>()?,
                None => Vec::new(),
            };
            Ok(Annotation { type_name, interfaces })
        })
        .collect()
}

/// Reads the identity of a source object.
/// # Safety
/// `info` must come from the object's `source_info` function while it is alive.
unsafe fn read_source_info(info: FfiSourceInfo) -> Result<SourceInfo, FfiError> {
    Ok(SourceInfo {
        id: info.id,
        name: unsafe { string_from_ptr(info.name) }?,
        lang: unsafe { string_from_ptr(info.lang) }?,
        base_url: unsafe { string_from_ptr(info.base_url) }?,
    })
}

/// Takes ownership of `vtable` and wraps it according to its runtime kind.
///
/// On error the object is destroyed before returning.
///
/// # Safety
/// `vtable` must be null or a vtable produced by a library that `library`
/// keeps loaded, not owned by anybody else.
pub(crate) unsafe fn wrap(vtable: *mut ObjectVTable, library: Arc<Library>) -> Result<Arc<dyn ExtensionObject>, String> {
    if vtable.is_null() {
        return Err("received null object vtable".to_string());
    }

    // From here on the handle owns the object, so early returns destroy it
    let mut handle = NativeHandle {
        vtable,
        type_name: String::new(),
        annotations: Vec::new(),
        library,
    };

    let instance = handle.instance();
    let vt = handle.vtable();
    let type_name = unsafe { string_from_ptr((vt.type_name)(instance)) }
        .map_err(|e| format!("reading object type name: {}", e))?;
    let kind = (vt.kind)(instance);
    let capabilities = (vt.capabilities)(instance);
    let annotations = match unsafe { read_annotations((vt.annotations)(instance)) } {
        Ok(annotations) => annotations,
        Err(e) => {
            warn!("Ignoring unreadable annotations of {}: {}", type_name, e);
            Vec::new()
        }
    };
    let info = if kind == KIND_SOURCE {
        let info = unsafe { read_source_info((vt.source_info)(instance)) }
            .map_err(|e| format!("reading source info of {}: {}", type_name, e))?;
        Some(info)
    } else {
        None
    };

    handle.type_name = type_name;
    handle.annotations = annotations;

    let object: Arc<dyn ExtensionObject> = match (kind, info) {
        (KIND_SOURCE, Some(info)) => Arc::new(NativeSource {
            handle,
            info,
            http: capabilities & CAPABILITY_HTTP != 0,
        }),
        (KIND_SOURCE_FACTORY, _) => Arc::new(NativeFactory { handle }),
        _ => Arc::new(NativeObject { handle }),
    };
    Ok(object)
}

/// A native object of no recognized shape
struct NativeObject {
    handle: NativeHandle,
}

impl ExtensionObject for NativeObject {
    fn type_name(&self) -> &str {
        &self.handle.type_name
    }

    fn annotations(&self) -> Vec<Annotation> {
        self.handle.annotations.clone()
    }
}

/// A native single source
struct NativeSource {
    handle: NativeHandle,
    info: SourceInfo,
    http: bool,
}

impl ExtensionObject for NativeSource {
    fn type_name(&self) -> &str {
        &self.handle.type_name
    }

    fn annotations(&self) -> Vec<Annotation> {
        self.handle.annotations.clone()
    }

    fn as_source(self: Arc<Self>) -> Option<Arc<dyn Source>> {
        let source: Arc<dyn Source> = self;
        Some(source)
    }

    fn as_http_source(self: Arc<Self>) -> Option<Arc<dyn HttpSource>> {
        if !self.http {
            return None;
        }
        let source: Arc<dyn HttpSource> = self;
        Some(source)
    }
}

impl Source for NativeSource {
    fn id(&self) -> i64 {
        self.info.id
    }

    fn name(&self) -> &str {
        &self.info.name
    }

    fn lang(&self) -> &str {
        &self.info.lang
    }
}

impl HttpSource for NativeSource {
    fn base_url(&self) -> &str {
        &self.info.base_url
    }
}

/// A native source factory
struct NativeFactory {
    handle: NativeHandle,
}

impl ExtensionObject for NativeFactory {
    fn type_name(&self) -> &str {
        &self.handle.type_name
    }

    fn annotations(&self) -> Vec<Annotation> {
        self.handle.annotations.clone()
    }

    fn as_source_factory(self: Arc<Self>) -> Option<Arc<dyn SourceFactory>> {
        let factory: Arc<dyn SourceFactory> = self;
        Some(factory)
    }
}

impl SourceFactory for NativeFactory {
    fn create_sources(&self) -> Result<Vec<Arc<dyn ExtensionObject>>, ExtensionError> {
        let failure = |message: String| ExtensionError::InstantiationFailure {
            class_name: self.handle.type_name.clone(),
            message,
        };

        let vt = self.handle.vtable();
        let mut produced: FfiSlice<*mut ObjectVTable> = FfiSlice::empty();
        let status = (vt.create_sources)(self.handle.instance(), &mut produced);
        if status != STATUS_OK {
            return Err(failure(format!(
                "creating sources returned status {} ({})",
                status,
                status_message(status)
            )));
        }

        // Wrap every object first so the ones after a failure are destroyed too
        let wrapped: Vec<Result<Arc<dyn ExtensionObject>, String>> = match unsafe { produced.as_slice() } {
            Some(ptrs) => ptrs
                .iter()
                .map(|&ptr| unsafe { wrap(ptr, Arc::clone(&self.handle.library)) })
                .collect(),
            None => Vec::new(),
        };
        (vt.free_sources)(produced);

        wrapped
            .into_iter()
            .enumerate()
            .map(|(index, object)| object.map_err(|e| failure(format!("produced source #{}: {}", index, e))))
            .collect()
    }
}
