//! UTF-8 <-> platform wide string conversion
//!
//! `wchar_t` is 16 bits on Windows and 32 bits elsewhere; [`WideChar`] follows the
//! platform, as DXC's interfaces do.

use crate::{BridgeError, Result};
use std::ffi::CStr;
use std::os::raw::c_char;
use widestring::{WideCStr, WideCString};

pub use widestring::WideChar;

pub fn to_wide(s: &str) -> Result<WideCString> {
    WideCString::from_str(s).map_err(|e| BridgeError::StringConversion(format!("{:?}: {}", s, e)))
}

/// Decode a NUL-terminated wide string
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated wide string.
pub unsafe fn from_wide_ptr(ptr: *const WideChar) -> Result<String> {
    if ptr.is_null() {
        return Err(BridgeError::StringConversion("null wide string".to_string()));
    }
    WideCStr::from_ptr_str(ptr)
        .to_string()
        .map_err(|e| BridgeError::StringConversion(e.to_string()))
}

/// Decode a NUL-terminated UTF-8 C string
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
pub unsafe fn from_c_ptr<'a>(ptr: *const c_char) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(BridgeError::StringConversion("null string".to_string()));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|e| BridgeError::StringConversion(e.to_string()))
}

/// Wide copies of a compiler argument vector
///
/// Owns every converted string and the pointer array handed to the compiler, so all
/// of them are released together when the value goes out of scope.
pub struct WideArgs {
    _strings: Vec<WideCString>,
    ptrs: Vec<*const WideChar>,
}

impl WideArgs {
    pub fn from_utf8<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let strings = args
            .iter()
            .map(|arg| to_wide(arg.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let ptrs = strings.iter().map(|s| s.as_ptr()).collect();
        log::trace!("Converted {} compiler arguments to wide strings", args.len());

        Ok(Self {
            _strings: strings,
            ptrs,
        })
    }

    /// Convert a C argument array
    ///
    /// # Safety
    /// `args` must be null (with `count == 0`) or point to `count` NUL-terminated strings.
    pub unsafe fn from_c_args(args: *const *const c_char, count: u32) -> Result<Self> {
        if count == 0 {
            return Self::from_utf8::<&str>(&[]);
        }
        if args.is_null() {
            return Err(BridgeError::InvalidArgument(format!(
                "null argument array with count {}",
                count
            )));
        }
        let args = std::slice::from_raw_parts(args, count as usize)
            .iter()
            .map(|&arg| from_c_ptr(arg))
            .collect::<Result<Vec<_>>>()?;
        Self::from_utf8(&args)
    }

    pub fn as_ptr(&self) -> *const *const WideChar {
        if self.ptrs.is_empty() {
            std::ptr::null()
        } else {
            self.ptrs.as_ptr()
        }
    }

    pub fn len(&self) -> u32 {
        self.ptrs.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.ptrs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn wide_round_trip() {
        let wide = to_wide("shaders/lighting.hlsl").unwrap();
        let back = unsafe { from_wide_ptr(wide.as_ptr()) }.unwrap();
        assert_eq!(back, "shaders/lighting.hlsl");
    }

    #[test]
    fn interior_nul_is_a_conversion_error() {
        assert!(matches!(
            to_wide("bad\0name"),
            Err(BridgeError::StringConversion(_))
        ));
    }

    #[test]
    fn null_wide_pointer_is_rejected() {
        assert!(unsafe { from_wide_ptr(std::ptr::null()) }.is_err());
    }

    #[test]
    fn args_keep_order_and_count() {
        let args = WideArgs::from_utf8(&["-E", "main", "-T", "ps_6_0"]).unwrap();
        assert_eq!(args.len(), 4);

        let ptrs = unsafe { std::slice::from_raw_parts(args.as_ptr(), 4) };
        let decoded: Vec<String> = ptrs
            .iter()
            .map(|&p| unsafe { from_wide_ptr(p) }.unwrap())
            .collect();
        assert_eq!(decoded, ["-E", "main", "-T", "ps_6_0"]);
    }

    #[test]
    fn c_args_with_invalid_utf8_fail() {
        let good = CString::new("-spirv").unwrap();
        let bad = CString::new(vec![0xff, 0xfe]).unwrap();
        let ptrs = [good.as_ptr(), bad.as_ptr()];
        assert!(unsafe { WideArgs::from_c_args(ptrs.as_ptr(), 2) }.is_err());
    }

    #[test]
    fn empty_c_args_are_allowed() {
        let args = unsafe { WideArgs::from_c_args(std::ptr::null(), 0) }.unwrap();
        assert!(args.is_empty());
        assert!(args.as_ptr().is_null());
    }
}
