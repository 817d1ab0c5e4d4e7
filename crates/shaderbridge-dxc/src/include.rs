//! Include resolution for `#include` directives in HLSL sources

use crate::ffi::{Guid, IDxcIncludeHandler, IDxcIncludeHandlerVtbl, IUnknown, IUnknownVtbl, Interface};
use crate::library::DxcUtils;
use crate::HResult;
use shaderbridge_core::{encoding, wide, NativeBuffer, OwnedBuffer, WideChar};
use std::collections::HashMap;
use std::ffi::{c_void, CString};
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::ptr;

/// Contents of an included file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeSource {
    pub data: Vec<u8>,
    pub encoding: u32,
}

impl IncludeSource {
    pub fn utf8(text: impl Into<String>) -> Self {
        Self {
            data: text.into().into_bytes(),
            encoding: encoding::UTF8,
        }
    }
}

/// Resolves include requests issued by the compiler
///
/// Called synchronously on the compiling thread. Returning `None` or empty data
/// makes the include fail.
pub trait IncludeHandler {
    fn resolve(&mut self, filename: &str) -> Option<IncludeSource>;
}

impl<F> IncludeHandler for F
where
    F: FnMut(&str) -> Option<IncludeSource>,
{
    fn resolve(&mut self, filename: &str) -> Option<IncludeSource> {
        self(filename)
    }
}

/// C include callback: receives the caller context and a UTF-8 file name, returns a
/// `malloc`-allocated buffer the adapter frees after copying (empty for "not found")
pub type IncludeDelegate =
    unsafe extern "C" fn(ctx: *mut c_void, filename: *const c_char) -> NativeBuffer;

/// Forwards include requests to a C function pointer
pub struct DelegateInclude {
    ctx: *mut c_void,
    delegate: IncludeDelegate,
}

impl DelegateInclude {
    /// # Safety
    /// `delegate` must be safe to call with `ctx` for as long as this value lives.
    pub unsafe fn new(ctx: *mut c_void, delegate: IncludeDelegate) -> Self {
        Self { ctx, delegate }
    }
}

impl IncludeHandler for DelegateInclude {
    fn resolve(&mut self, filename: &str) -> Option<IncludeSource> {
        let name = CString::new(filename).ok()?;
        let raw = unsafe { (self.delegate)(self.ctx, name.as_ptr()) };
        // Owned from here on, so the delegate's allocation is freed on every path.
        let buffer = unsafe { OwnedBuffer::from_raw(raw) };
        if buffer.is_empty() {
            return None;
        }

        Some(IncludeSource {
            data: buffer.as_bytes().to_vec(),
            encoding: buffer.encoding(),
        })
    }
}

/// Reads includes relative to a root directory
#[derive(Debug, Clone)]
pub struct FileSystemInclude {
    root: PathBuf,
}

impl FileSystemInclude {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for FileSystemInclude {
    fn default() -> Self {
        Self::new(".")
    }
}

impl IncludeHandler for FileSystemInclude {
    fn resolve(&mut self, filename: &str) -> Option<IncludeSource> {
        let path = self.root.join(filename);
        match std::fs::read(&path) {
            Ok(data) => Some(IncludeSource {
                data,
                encoding: encoding::UTF8,
            }),
            Err(err) => {
                log::debug!("Include {} not readable: {}", path.display(), err);
                None
            }
        }
    }
}

/// Serves includes from named in-memory sources
#[derive(Debug, Clone, Default)]
pub struct MemoryInclude {
    files: HashMap<String, IncludeSource>,
}

impl MemoryInclude {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, IncludeSource::utf8(text));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, source: IncludeSource) {
        self.files.insert(normalize(&name.into()), source);
    }
}

impl IncludeHandler for MemoryInclude {
    fn resolve(&mut self, filename: &str) -> Option<IncludeSource> {
        self.files.get(&normalize(filename)).cloned()
    }
}

// DXC prefixes relative includes with the directory of the including file, so
// `./a/../b.hlsli` and `b.hlsli` name the same entry.
fn normalize(name: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in name.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." if parts.last().is_some_and(|last| *last != "..") => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }
    parts.join("/")
}

/// `IDxcIncludeHandler` object; the vtable pointer must stay the first field
#[repr(C)]
struct IncludeObject {
    vtbl: *const IDxcIncludeHandlerVtbl,
    handler: Box<dyn IncludeHandler>,
    utils: DxcUtils,
}

static INCLUDE_HANDLER_VTBL: IDxcIncludeHandlerVtbl = IDxcIncludeHandlerVtbl {
    base: IUnknownVtbl {
        query_interface,
        add_ref,
        release,
    },
    load_source,
};

/// Single-owner include handler passed to the compiler for the duration of a compile
///
/// The reference count reported to the compiler is pinned at one: the object is
/// owned by this value (or a C handle) and never freed through `Release`.
pub struct IncludeBridge {
    object: Box<IncludeObject>,
}

impl IncludeBridge {
    pub fn new(utils: DxcUtils, handler: impl IncludeHandler + 'static) -> Self {
        Self::boxed(utils, Box::new(handler))
    }

    pub fn boxed(utils: DxcUtils, handler: Box<dyn IncludeHandler>) -> Self {
        Self {
            object: Box::new(IncludeObject {
                vtbl: &INCLUDE_HANDLER_VTBL,
                handler,
                utils,
            }),
        }
    }

    /// Interface pointer handed to `IDxcCompiler3::Compile`
    pub(crate) fn as_raw(&mut self) -> *mut c_void {
        &mut *self.object as *mut IncludeObject as *mut c_void
    }
}

unsafe extern "system" fn query_interface(
    this: *mut c_void,
    iid: *const Guid,
    out: *mut *mut c_void,
) -> HResult {
    if out.is_null() {
        return HResult::E_POINTER;
    }
    if !iid.is_null() && (*iid == IDxcIncludeHandler::IID || *iid == IUnknown::IID) {
        *out = this;
        return HResult::S_OK;
    }
    *out = ptr::null_mut();
    HResult::E_NOINTERFACE
}

unsafe extern "system" fn add_ref(_this: *mut c_void) -> u32 {
    1
}

unsafe extern "system" fn release(_this: *mut c_void) -> u32 {
    1
}

unsafe extern "system" fn load_source(
    this: *mut c_void,
    filename: *const WideChar,
    out: *mut *mut c_void,
) -> HResult {
    if this.is_null() || out.is_null() {
        return HResult::E_POINTER;
    }
    *out = ptr::null_mut();
    let object = &mut *(this as *mut IncludeObject);

    let (filename, source) = match resolve_request(object.handler.as_mut(), filename) {
        Ok(resolved) => resolved,
        Err(hr) => return hr,
    };

    match object.utils.create_blob(&source.data, source.encoding) {
        Ok(blob) => {
            *out = blob.into_raw();
            HResult::S_OK
        }
        Err(err) => {
            log::error!("Failed to wrap include '{}': {}", filename, err);
            err.hresult()
        }
    }
}

/// Decode the requested name and ask `handler` for it
///
/// # Safety
/// `filename` must be null or a NUL-terminated wide string.
unsafe fn resolve_request(
    handler: &mut dyn IncludeHandler,
    filename: *const WideChar,
) -> std::result::Result<(String, IncludeSource), HResult> {
    let filename = match wide::from_wide_ptr(filename) {
        Ok(filename) => filename,
        Err(err) => {
            log::error!("Include request with an unreadable file name: {}", err);
            return Err(HResult::E_FAIL);
        }
    };
    log::trace!("Resolving include '{}'", filename);

    match panic::catch_unwind(AssertUnwindSafe(|| handler.resolve(&filename))) {
        Ok(Some(source)) if !source.data.is_empty() => Ok((filename, source)),
        Ok(_) => {
            log::warn!("Include '{}' could not be resolved", filename);
            Err(HResult::NOT_FOUND)
        }
        Err(_) => {
            log::error!("Include handler panicked while resolving '{}'", filename);
            Err(HResult::E_FAIL)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_handlers() {
        let mut handler = |name: &str| {
            (name == "common.hlsli").then(|| IncludeSource::utf8("#define LIGHTS 4"))
        };
        assert_eq!(
            handler.resolve("common.hlsli").unwrap().data,
            b"#define LIGHTS 4"
        );
        assert!(handler.resolve("missing.hlsli").is_none());
    }

    #[test]
    fn memory_include_ignores_relative_prefix() {
        let mut include = MemoryInclude::new().with_file("lighting/brdf.hlsli", "float D();");
        let source = include.resolve("./lighting/brdf.hlsli").unwrap();
        assert_eq!(source.encoding, encoding::UTF8);
        assert_eq!(source.data, b"float D();");
        assert!(include.resolve("./lighting/missing.hlsli").is_none());
    }

    #[test]
    fn memory_include_folds_parent_segments() {
        let mut include = MemoryInclude::new().with_file("common/math.hlsli", "float sq(float x);");
        assert!(include.resolve("./lighting/../common/math.hlsli").is_some());
        assert!(include.resolve(".\\lighting\\..\\common\\math.hlsli").is_some());
        assert!(include.resolve("./common/./math.hlsli").is_some());
        assert!(include.resolve("../common/math.hlsli").is_none());

        assert_eq!(normalize("./a/b/../../c.hlsli"), "c.hlsli");
        assert_eq!(normalize("../../x.hlsli"), "../../x.hlsli");
    }

    #[test]
    fn file_system_include_reads_relative_to_root() {
        let dir = std::env::temp_dir().join(format!("shaderbridge-include-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("constants.hlsli"), "static const float PI = 3.14159;").unwrap();

        let mut include = FileSystemInclude::new(&dir);
        let source = include.resolve("./constants.hlsli").unwrap();
        assert_eq!(source.data, b"static const float PI = 3.14159;");
        assert!(include.resolve("nope.hlsli").is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    unsafe extern "C" fn serve_header(ctx: *mut c_void, filename: *const c_char) -> NativeBuffer {
        let calls = &mut *(ctx as *mut u32);
        *calls += 1;
        let name = std::ffi::CStr::from_ptr(filename).to_str().unwrap();
        if name == "header.hlsli" {
            OwnedBuffer::copy_from(b"#define FROM_C 1", encoding::UTF8)
                .unwrap()
                .into_raw()
        } else {
            NativeBuffer::empty()
        }
    }

    #[test]
    fn delegate_buffers_are_copied_and_released() {
        let mut calls = 0u32;
        let mut include =
            unsafe { DelegateInclude::new(&mut calls as *mut u32 as *mut c_void, serve_header) };

        let source = include.resolve("header.hlsli").unwrap();
        assert_eq!(source.data, b"#define FROM_C 1");
        assert_eq!(source.encoding, encoding::UTF8);
        assert!(include.resolve("other.hlsli").is_none());
        assert_eq!(calls, 2);
    }

    fn wide_name(name: &str) -> Vec<WideChar> {
        name.chars().map(|c| c as WideChar).chain(std::iter::once(0)).collect()
    }

    #[test]
    fn requests_are_decoded_and_resolved() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut include = MemoryInclude::new().with_file("shared.hlsli", "#define SHARED 1");

        let name = wide_name("./shared.hlsli");
        let (filename, source) = unsafe { resolve_request(&mut include, name.as_ptr()) }.unwrap();
        assert_eq!(filename, "./shared.hlsli");
        assert_eq!(source.data, b"#define SHARED 1");
    }

    #[test]
    fn unresolved_requests_are_not_found() {
        let name = wide_name("missing.hlsli");
        let mut none = |_: &str| -> Option<IncludeSource> { None };
        let mut empty = |_: &str| Some(IncludeSource::utf8(""));

        let missing = unsafe { resolve_request(&mut none, name.as_ptr()) };
        assert_eq!(missing.unwrap_err(), HResult::NOT_FOUND);
        let blank = unsafe { resolve_request(&mut empty, name.as_ptr()) };
        assert_eq!(blank.unwrap_err(), HResult::NOT_FOUND);
    }

    #[test]
    fn undecodable_names_and_panics_fail() {
        let mut calls = 0;
        let mut counting = |_: &str| {
            calls += 1;
            Some(IncludeSource::utf8("x"))
        };
        // A lone surrogate is not valid text in either wide encoding.
        let bad = [0xD800 as WideChar, 0];
        let result = unsafe { resolve_request(&mut counting, bad.as_ptr()) };
        assert_eq!(result.unwrap_err(), HResult::E_FAIL);
        let result = unsafe { resolve_request(&mut counting, ptr::null()) };
        assert_eq!(result.unwrap_err(), HResult::E_FAIL);
        assert_eq!(calls, 0);

        let name = wide_name("boom.hlsli");
        let mut panicking = |_: &str| -> Option<IncludeSource> { panic!("handler bug") };
        let result = unsafe { resolve_request(&mut panicking, name.as_ptr()) };
        assert_eq!(result.unwrap_err(), HResult::E_FAIL);
    }

    #[test]
    fn load_source_rejects_null_pointers() {
        let name = wide_name("a.hlsli");
        let mut out = ptr::null_mut();
        unsafe {
            assert_eq!(load_source(ptr::null_mut(), name.as_ptr(), &mut out), HResult::E_POINTER);
            let this = 1usize as *mut c_void;
            assert_eq!(load_source(this, name.as_ptr(), ptr::null_mut()), HResult::E_POINTER);
        }
    }

    #[test]
    fn reference_count_is_pinned() {
        let this = 1usize as *mut c_void;
        let mut out = ptr::null_mut();
        unsafe {
            assert_eq!(add_ref(this), 1);
            assert_eq!(release(this), 1);
            assert_eq!(query_interface(this, &IDxcIncludeHandler::IID, &mut out), HResult::S_OK);
            assert_eq!(out, this);
            assert_eq!(
                query_interface(this, &crate::ffi::IDxcBlob::IID, &mut out),
                HResult::E_NOINTERFACE
            );
            assert!(out.is_null());
        }
    }
}
