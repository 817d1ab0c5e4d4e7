//! Flat C surface
//!
//! Every function is `extern "C"`, tolerates null handles and never unwinds into the
//! caller. Failures are logged and reported as a null handle, zero or an HRESULT.
//!
//! Buffers returned as [`NativeBuffer`] are released with [`shaderbridge_free_buffer`];
//! strings returned as `char*` are released with [`shaderbridge_free_string`].
//!
//! # Safety
//! Pointer arguments must be null or valid for the access the function documents, and
//! handles must come from the matching `create` function and not be used after `delete`.

#![allow(clippy::missing_safety_doc)]

pub mod dxc;
pub mod glslang;
pub mod spirv;

use shaderbridge_core::{free_native, NativeBuffer};
use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use std::panic::{self, AssertUnwindSafe};

/// Run `f`, turning a panic into `fallback`
pub(crate) fn guard<R>(name: &str, fallback: R, f: impl FnOnce() -> R) -> R {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            log::error!("{} panicked", name);
            fallback
        }
    }
}

/// Route this library's diagnostics to stderr
///
/// Filtering follows `RUST_LOG`; without it only errors are printed. Returns 1 when the
/// logger was installed and 0 when the host process already has one. Call it once,
/// before [`glslang::shaderbridge_glslang_initialize_process`] or the first compiler.
#[no_mangle]
pub extern "C" fn shaderbridge_init_logging() -> c_int {
    guard("shaderbridge_init_logging", 0, || match env_logger::try_init() {
        Ok(()) => {
            log::debug!("shaderbridge logging initialised");
            1
        }
        Err(_) => 0,
    })
}

/// Release a buffer returned by this library and reset it to empty
#[no_mangle]
pub unsafe extern "C" fn shaderbridge_free_buffer(buffer: *mut NativeBuffer) {
    if let Some(buffer) = buffer.as_mut() {
        free_native(*buffer);
        *buffer = NativeBuffer::empty();
    }
}

/// Release a string returned by this library
#[no_mangle]
pub unsafe extern "C" fn shaderbridge_free_string(string: *mut c_char) {
    if !string.is_null() {
        drop(CString::from_raw(string));
    }
}

/// Hand `text` to the caller as a NUL-terminated string
pub(crate) fn into_c_string(text: String) -> *mut c_char {
    match CString::new(text) {
        Ok(text) => text.into_raw(),
        Err(err) => {
            log::error!("String with interior NUL at {} cannot cross the C boundary", err.nul_position());
            std::ptr::null_mut()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shaderbridge_core::{encoding, OwnedBuffer};
    use std::ptr;

    #[test]
    fn logging_installs_once() {
        let first = shaderbridge_init_logging();
        assert!(first == 0 || first == 1);
        assert_eq!(shaderbridge_init_logging(), 0);
        assert!(log::log_enabled!(log::Level::Error));
    }

    #[test]
    fn free_functions_accept_null() {
        unsafe {
            shaderbridge_free_buffer(ptr::null_mut());
            shaderbridge_free_string(ptr::null_mut());
        }
    }

    #[test]
    fn freeing_resets_the_buffer() {
        let mut buffer = OwnedBuffer::copy_from(b"DXBC", encoding::UNKNOWN)
            .unwrap()
            .into_raw();
        unsafe { shaderbridge_free_buffer(&mut buffer) };
        assert_eq!(buffer, NativeBuffer::empty());

        // Freeing the now-empty descriptor again is harmless.
        unsafe { shaderbridge_free_buffer(&mut buffer) };
    }

    #[test]
    fn guard_contains_panics() {
        assert_eq!(guard("test", 7, || 3), 3);
        assert_eq!(guard("test", 7, || -> i32 { panic!("boom") }), 7);
    }

    #[test]
    fn strings_round_trip_through_the_allocator() {
        let text = into_c_string("; SPIR-V".to_string());
        assert!(!text.is_null());
        unsafe { shaderbridge_free_string(text) };
        assert!(into_c_string("a\0b".to_string()).is_null());
    }
}
