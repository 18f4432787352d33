#![allow(non_snake_case)] // Exported constructor names mirror class names
#![allow(dead_code)] // Allow unused fields of the FFI definitions

//! Sample extension library used by the loader tests.
//!
//! Package: `eu.kanade.tachiyomi.extension.sample`
//!
//! | class           | shape                                             |
//! |-----------------|---------------------------------------------------|
//! | `ExampleSource` | HTTP source                                       |
//! | `PlainSource`   | source without HTTP support                       |
//! | `ExampleFactory`| factory marked NSFW through a proxied annotation  |
//! | `SafeFactory`   | factory with one directly annotated NSFW source   |
//! | `Widget`        | neither source nor factory                        |
//! | `Broken`        | constructor returns null                          |
//! | `Panicky`       | constructor panics                                |
//! | `CorruptFactory`| factory producing a source without source info    |
//! | `PanickyFactory`| factory panicking while creating its sources      |
//!
//! Panics never leave this library: every exported function catches them
//! and reports `STATUS_PANICKED` instead.

use std::ffi::{c_char, c_void, CStr};
use std::panic::{self, AssertUnwindSafe};

// Mirrored ABI definitions
const KIND_UNKNOWN: u32 = 0;
const KIND_SOURCE: u32 = 1;
const KIND_SOURCE_FACTORY: u32 = 2;
const CAPABILITY_HTTP: u32 = 1;
const STATUS_OK: u32 = 0;
const STATUS_FAILED: u32 = 1;
const STATUS_PANICKED: u32 = 2;

#[repr(C)]
pub struct FfiSlice<T> {
    pub ptr: *const T,
    pub len: usize,
}

#[repr(C)]
pub struct FfiAnnotation {
    pub type_name: *const c_char,
    pub interfaces: FfiSlice<*const c_char>,
}

#[repr(C)]
pub struct FfiSourceInfo {
    pub id: i64,
    pub name: *const c_char,
    pub lang: *const c_char,
    pub base_url: *const c_char,
}

#[repr(C)]
pub struct ObjectVTable {
    pub instance: *mut c_void,
    pub type_name: extern "C" fn(instance: *const c_void) -> *const c_char,
    pub kind: extern "C" fn(instance: *const c_void) -> u32,
    pub capabilities: extern "C" fn(instance: *const c_void) -> u32,
    pub annotations: extern "C" fn(instance: *const c_void) -> FfiSlice<FfiAnnotation>,
    pub source_info: extern "C" fn(instance: *const c_void) -> FfiSourceInfo,
    pub create_sources: extern "C" fn(instance: *const c_void, out: *mut FfiSlice<*mut ObjectVTable>) -> u32,
    pub free_sources: extern "C" fn(sources: FfiSlice<*mut ObjectVTable>),
    pub destroy: extern "C" fn(vtable: *mut ObjectVTable),
}

// Static description of every object this library can create
struct AnnotationSpec {
    type_name: &'static CStr,
    interfaces: &'static [&'static CStr],
}

struct SourceSpec {
    id: i64,
    name: &'static CStr,
    lang: &'static CStr,
    base_url: &'static CStr,
}

struct ObjectSpec {
    type_name: &'static CStr,
    kind: u32,
    capabilities: u32,
    annotations: &'static [AnnotationSpec],
    source: Option<SourceSpec>,
    children: &'static [ObjectSpec],
    panics_on_create: bool,
}

const fn http_source(type_name: &'static CStr, id: i64, name: &'static CStr, base_url: &'static CStr) -> ObjectSpec {
    ObjectSpec {
        type_name,
        kind: KIND_SOURCE,
        capabilities: CAPABILITY_HTTP,
        annotations: &[],
        source: Some(SourceSpec {
            id,
            name,
            lang: c"en",
            base_url,
        }),
        children: &[],
        panics_on_create: false,
    }
}

static EXAMPLE_SOURCE: ObjectSpec = http_source(
    c"eu.kanade.tachiyomi.extension.sample.ExampleSource",
    101,
    c"Example",
    c"https://example.org",
);

static PLAIN_SOURCE: ObjectSpec = ObjectSpec {
    type_name: c"eu.kanade.tachiyomi.extension.sample.PlainSource",
    kind: KIND_SOURCE,
    capabilities: 0,
    annotations: &[],
    source: Some(SourceSpec {
        id: 102,
        name: c"Plain",
        lang: c"en",
        base_url: c"",
    }),
    children: &[],
    panics_on_create: false,
};

static EXAMPLE_FACTORY: ObjectSpec = ObjectSpec {
    type_name: c"eu.kanade.tachiyomi.extension.sample.ExampleFactory",
    kind: KIND_SOURCE_FACTORY,
    capabilities: 0,
    annotations: &[AnnotationSpec {
        type_name: c"$Proxy12",
        interfaces: &[c"eu.kanade.tachiyomi.annotations.Nsfw"],
    }],
    source: None,
    children: &[
        http_source(c"eu.kanade.tachiyomi.extension.sample.Alpha", 1, c"Alpha", c"https://alpha.example.org"),
        ObjectSpec {
            type_name: c"eu.kanade.tachiyomi.extension.sample.Beta",
            kind: KIND_SOURCE,
            capabilities: 0,
            annotations: &[],
            source: Some(SourceSpec {
                id: 2,
                name: c"Beta",
                lang: c"en",
                base_url: c"",
            }),
            children: &[],
            panics_on_create: false,
        },
        http_source(c"eu.kanade.tachiyomi.extension.sample.Gamma", 3, c"Gamma", c"https://gamma.example.org"),
    ],
    panics_on_create: false,
};

static SAFE_FACTORY: ObjectSpec = ObjectSpec {
    type_name: c"eu.kanade.tachiyomi.extension.sample.SafeFactory",
    kind: KIND_SOURCE_FACTORY,
    capabilities: 0,
    annotations: &[],
    source: None,
    children: &[
        ObjectSpec {
            type_name: c"eu.kanade.tachiyomi.extension.sample.Delta",
            kind: KIND_SOURCE,
            capabilities: CAPABILITY_HTTP,
            annotations: &[AnnotationSpec {
                type_name: c"eu.kanade.tachiyomi.annotations.Nsfw",
                interfaces: &[],
            }],
            source: Some(SourceSpec {
                id: 4,
                name: c"Delta",
                lang: c"ja",
                base_url: c"https://delta.example.org",
            }),
            children: &[],
            panics_on_create: false,
        },
        http_source(c"eu.kanade.tachiyomi.extension.sample.Epsilon", 5, c"Epsilon", c"https://epsilon.example.org"),
    ],
    panics_on_create: false,
};

static WIDGET: ObjectSpec = ObjectSpec {
    type_name: c"eu.kanade.tachiyomi.extension.sample.Widget",
    kind: KIND_UNKNOWN,
    capabilities: 0,
    annotations: &[],
    source: None,
    children: &[],
    panics_on_create: false,
};

static CORRUPT_FACTORY: ObjectSpec = ObjectSpec {
    type_name: c"eu.kanade.tachiyomi.extension.sample.CorruptFactory",
    kind: KIND_SOURCE_FACTORY,
    capabilities: 0,
    annotations: &[],
    source: None,
    children: &[
        http_source(c"eu.kanade.tachiyomi.extension.sample.Alpha", 1, c"Alpha", c"https://alpha.example.org"),
        // Claims to be an HTTP source but has no identity to read
        ObjectSpec {
            type_name: c"eu.kanade.tachiyomi.extension.sample.Corrupt",
            kind: KIND_SOURCE,
            capabilities: CAPABILITY_HTTP,
            annotations: &[],
            source: None,
            children: &[],
            panics_on_create: false,
        },
    ],
    panics_on_create: false,
};

static PANICKY_FACTORY: ObjectSpec = ObjectSpec {
    type_name: c"eu.kanade.tachiyomi.extension.sample.PanickyFactory",
    kind: KIND_SOURCE_FACTORY,
    capabilities: 0,
    annotations: &[],
    source: None,
    children: &[],
    panics_on_create: true,
};

// Live object behind a vtable
struct Object {
    spec: &'static ObjectSpec,
    annotations: Vec<FfiAnnotation>,
    // Backing storage for the annotation interface slices
    _interfaces: Vec<Vec<*const c_char>>,
}

fn object<'a>(instance: *const c_void) -> &'a Object {
    unsafe { &*(instance as *const Object) }
}

fn new_object(spec: &'static ObjectSpec) -> *mut ObjectVTable {
    let interfaces: Vec<Vec<*const c_char>> = spec
        .annotations
        .iter()
        .map(|a| a.interfaces.iter().map(|i| i.as_ptr()).collect())
        .collect();
    let annotations = spec
        .annotations
        .iter()
        .zip(&interfaces)
        .map(|(a, ifaces)| FfiAnnotation {
            type_name: a.type_name.as_ptr(),
            interfaces: FfiSlice {
                ptr: ifaces.as_ptr(),
                len: ifaces.len(),
            },
        })
        .collect();

    let instance = Box::into_raw(Box::new(Object {
        spec,
        annotations,
        _interfaces: interfaces,
    }));

    Box::into_raw(Box::new(ObjectVTable {
        instance: instance as *mut c_void,
        type_name: object_type_name,
        kind: object_kind,
        capabilities: object_capabilities,
        annotations: object_annotations,
        source_info: object_source_info,
        create_sources: object_create_sources,
        free_sources: object_free_sources,
        destroy: object_destroy,
    }))
}

extern "C" fn object_type_name(instance: *const c_void) -> *const c_char {
    object(instance).spec.type_name.as_ptr()
}

extern "C" fn object_kind(instance: *const c_void) -> u32 {
    object(instance).spec.kind
}

extern "C" fn object_capabilities(instance: *const c_void) -> u32 {
    object(instance).spec.capabilities
}

extern "C" fn object_annotations(instance: *const c_void) -> FfiSlice<FfiAnnotation> {
    let annotations = &object(instance).annotations;
    FfiSlice {
        ptr: annotations.as_ptr(),
        len: annotations.len(),
    }
}

extern "C" fn object_source_info(instance: *const c_void) -> FfiSourceInfo {
    match &object(instance).spec.source {
        Some(source) => FfiSourceInfo {
            id: source.id,
            name: source.name.as_ptr(),
            lang: source.lang.as_ptr(),
            base_url: source.base_url.as_ptr(),
        },
        None => FfiSourceInfo {
            id: 0,
            name: std::ptr::null(),
            lang: std::ptr::null(),
            base_url: std::ptr::null(),
        },
    }
}

fn create_children(spec: &'static ObjectSpec) -> FfiSlice<*mut ObjectVTable> {
    if spec.panics_on_create {
        panic!("{:?} failed to create its sources", spec.type_name);
    }
    let created: Box<[*mut ObjectVTable]> = spec.children.iter().map(new_object).collect();
    let len = created.len();
    FfiSlice {
        ptr: Box::into_raw(created) as *const *mut ObjectVTable,
        len,
    }
}

extern "C" fn object_create_sources(instance: *const c_void, out: *mut FfiSlice<*mut ObjectVTable>) -> u32 {
    if out.is_null() {
        return STATUS_FAILED;
    }
    let spec = object(instance).spec;
    match panic::catch_unwind(|| create_children(spec)) {
        Ok(created) => {
            unsafe { *out = created };
            STATUS_OK
        }
        Err(_) => STATUS_PANICKED,
    }
}

extern "C" fn object_free_sources(sources: FfiSlice<*mut ObjectVTable>) {
    if sources.ptr.is_null() {
        return;
    }
    // Frees the array only; the host owns the objects in it
    let slice = std::ptr::slice_from_raw_parts_mut(sources.ptr as *mut *mut ObjectVTable, sources.len);
    drop(unsafe { Box::from_raw(slice) });
}

extern "C" fn object_destroy(vtable: *mut ObjectVTable) {
    if vtable.is_null() {
        return;
    }
    let vtable = unsafe { Box::from_raw(vtable) };
    drop(unsafe { Box::from_raw(vtable.instance as *mut Object) });
}

// Entry-point constructors, one per class

/// Runs a constructor body, keeping any panic inside this library
fn construct<F>(out: *mut *mut ObjectVTable, build: F) -> u32
where
    F: FnOnce() -> *mut ObjectVTable,
{
    if out.is_null() {
        return STATUS_FAILED;
    }
    match panic::catch_unwind(AssertUnwindSafe(build)) {
        Ok(vtable) => {
            unsafe { *out = vtable };
            STATUS_OK
        }
        Err(_) => STATUS_PANICKED,
    }
}

#[no_mangle]
pub extern "C" fn bindery_new_eu_kanade_tachiyomi_extension_sample_ExampleSource(out: *mut *mut ObjectVTable) -> u32 {
    construct(out, || new_object(&EXAMPLE_SOURCE))
}

#[no_mangle]
pub extern "C" fn bindery_new_eu_kanade_tachiyomi_extension_sample_PlainSource(out: *mut *mut ObjectVTable) -> u32 {
    construct(out, || new_object(&PLAIN_SOURCE))
}

#[no_mangle]
pub extern "C" fn bindery_new_eu_kanade_tachiyomi_extension_sample_ExampleFactory(out: *mut *mut ObjectVTable) -> u32 {
    construct(out, || new_object(&EXAMPLE_FACTORY))
}

#[no_mangle]
pub extern "C" fn bindery_new_eu_kanade_tachiyomi_extension_sample_SafeFactory(out: *mut *mut ObjectVTable) -> u32 {
    construct(out, || new_object(&SAFE_FACTORY))
}

#[no_mangle]
pub extern "C" fn bindery_new_eu_kanade_tachiyomi_extension_sample_Widget(out: *mut *mut ObjectVTable) -> u32 {
    construct(out, || new_object(&WIDGET))
}

#[no_mangle]
pub extern "C" fn bindery_new_eu_kanade_tachiyomi_extension_sample_Broken(out: *mut *mut ObjectVTable) -> u32 {
    construct(out, std::ptr::null_mut)
}

#[no_mangle]
pub extern "C" fn bindery_new_eu_kanade_tachiyomi_extension_sample_Panicky(out: *mut *mut ObjectVTable) -> u32 {
    construct(out, || panic!("Panicky cannot be constructed"))
}

#[no_mangle]
pub extern "C" fn bindery_new_eu_kanade_tachiyomi_extension_sample_CorruptFactory(out: *mut *mut ObjectVTable) -> u32 {
    construct(out, || new_object(&CORRUPT_FACTORY))
}

#[no_mangle]
pub extern "C" fn bindery_new_eu_kanade_tachiyomi_extension_sample_PanickyFactory(out: *mut *mut ObjectVTable) -> u32 {
    construct(out, || new_object(&PANICKY_FACTORY))
}
