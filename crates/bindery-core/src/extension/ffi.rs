//! C ABI shared between the host and native extension libraries.
//!
//! An extension library exports one constructor per entry-point class, named
//! by [`entry_symbol`]. Each constructor writes a heap-allocated
//! [`ObjectVTable`] describing a single object to its out-pointer; the host
//! releases it with the vtable's own `destroy` function. Strings and
//! annotation slices handed out by an object stay valid for as long as that
//! object is alive.
//!
//! Nothing may unwind across this boundary. An extension links its own copy
//! of std, so it must catch its panics itself and report them as
//! [`STATUS_PANICKED`].
use std::ffi::{CStr, c_char, c_void};
use std::fmt;

use crate::kernel::constants::ENTRY_SYMBOL_PREFIX;

/// `kind` value of a single source object
pub const KIND_SOURCE: u32 = 1;
/// `kind` value of a source factory object
pub const KIND_SOURCE_FACTORY: u32 = 2;

/// Capability bit: the source can fetch content over HTTP
pub const CAPABILITY_HTTP: u32 = 1 << 0;

/// Status code: the call succeeded and its out-pointer is set
pub const STATUS_OK: u32 = 0;
/// Status code: the extension reported a failure
pub const STATUS_FAILED: u32 = 1;
/// Status code: the extension caught a panic of its own
pub const STATUS_PANICKED: u32 = 2;

/// Pointer + length pair crossing the FFI boundary
#[repr(C)]
#[derive(Debug)]
pub struct FfiSlice<T> {
    pub ptr: *const T,
    pub len: usize,
}

impl<T> Clone for FfiSlice<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FfiSlice<T> {}

impl<T> FfiSlice<T> {
    pub fn empty() -> Self {
        Self {
            ptr: std::ptr::null(),
            len: 0,
        }
    }

    /// Views the slice, `None` when the pointer is null.
    ///
    /// # Safety
    /// A non-null `ptr` must point to `len` initialized values that outlive `'a`.
    pub unsafe fn as_slice<'a>(&self) -> Option<&'a [T]> {
        if self.ptr.is_null() {
            None
        } else {
            Some(unsafe { std::slice::from_raw_parts(self.ptr, self.len) })
        }
    }
}

/// One annotation entry: its type name plus the interfaces it implements
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfiAnnotation {
    pub type_name: *const c_char,
    pub interfaces: FfiSlice<*const c_char>,
}

/// Identity of a source object
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfiSourceInfo {
    pub id: i64,
    pub name: *const c_char,
    pub lang: *const c_char,
    pub base_url: *const c_char,
}

/// Function table of one extension object
#[repr(C)]
pub struct ObjectVTable {
    pub instance: *mut c_void,
    pub type_name: extern "C" fn(instance: *const c_void) -> *const c_char,
    pub kind: extern "C" fn(instance: *const c_void) -> u32,
    pub capabilities: extern "C" fn(instance: *const c_void) -> u32,
    pub annotations: extern "C" fn(instance: *const c_void) -> FfiSlice<FfiAnnotation>,
    /// Only meaningful for `KIND_SOURCE` objects
    pub source_info: extern "C" fn(instance: *const c_void) -> FfiSourceInfo,
    /// Only meaningful for `KIND_SOURCE_FACTORY` objects. On `STATUS_OK` the
    /// host takes ownership of every vtable written to `out`, then hands the
    /// array back to `free_sources`.
    pub create_sources: extern "C" fn(instance: *const c_void, out: *mut FfiSlice<*mut ObjectVTable>) -> u32,
    pub free_sources: extern "C" fn(sources: FfiSlice<*mut ObjectVTable>),
    /// Destroys the instance and the vtable itself
    pub destroy: extern "C" fn(vtable: *mut ObjectVTable),
}

/// Exported constructor of an entry-point class.
///
/// Returns a status code and, on `STATUS_OK`, writes the new object to `out`.
pub type EntryPointConstructor = unsafe extern "C" fn(out: *mut *mut ObjectVTable) -> u32;

/// Human-readable form of a status code
pub fn status_message(status: u32) -> &'static str {
    match status {
        STATUS_OK => "ok",
        STATUS_FAILED => "extension reported a failure",
        STATUS_PANICKED => "extension panicked",
        _ => "unrecognized status code",
    }
}

/// Errors reading values handed over by an extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiError {
    NullPointer,
    Utf8Error,
}

impl fmt::Display for FfiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FfiError::NullPointer => write!(f, "null pointer"),
            FfiError::Utf8Error => write!(f, "invalid UTF-8"),
        }
    }
}

/// Exported symbol name of an entry-point class constructor.
///
/// `com.example.src.ExampleSource` -> `bindery_new_com_example_src_ExampleSource`
pub fn entry_symbol(class_name: &str) -> String {
    let mangled: String = class_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("{}{}", ENTRY_SYMBOL_PREFIX, mangled)
}

/// Safely converts an FFI C string pointer to a Rust String.
/// # Safety
/// The caller must ensure that `ptr` is either null or a valid pointer to a
/// null-terminated C string that stays valid for the duration of this call.
pub unsafe fn string_from_ptr(ptr: *const c_char) -> Result<String, FfiError> {
    if ptr.is_null() {
        return Err(FfiError::NullPointer);
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map(str::to_owned)
        .map_err(|_| FfiError::Utf8Error)
}
