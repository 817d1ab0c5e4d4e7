//! Caller-owned output buffers
//!
//! Every buffer the adapters hand out is described by the same `{ptr, size, encoding}`
//! triple. The memory always comes from the C allocator so a foreign caller can release
//! it through the paired free function or plain `free`.

use crate::{BridgeError, Result};
use std::ffi::c_void;
use std::ptr;

/// Text encoding identifiers (Windows code page numbers, as used by DXC)
pub mod encoding {
    /// Binary data or unknown encoding
    pub const UNKNOWN: u32 = 0;
    pub const UTF8: u32 = 65001;
    pub const UTF16: u32 = 1200;
    pub const UTF32: u32 = 12000;

    /// Encoding of the platform `wchar_t`
    #[cfg(windows)]
    pub const WIDE: u32 = UTF16;
    #[cfg(not(windows))]
    pub const WIDE: u32 = UTF32;
}

/// Flat buffer descriptor shared with C callers
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeBuffer {
    pub ptr: *mut c_void,
    pub size: usize,
    pub encoding: u32,
}

impl NativeBuffer {
    pub const fn empty() -> Self {
        Self {
            ptr: ptr::null_mut(),
            size: 0,
            encoding: encoding::UNKNOWN,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ptr.is_null() || self.size == 0
    }
}

impl Default for NativeBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

/// A C-allocated buffer released on drop
///
/// Constructed only by the adapters. Ownership leaves Rust through
/// [`OwnedBuffer::into_raw`] and comes back through [`OwnedBuffer::from_raw`].
#[derive(Debug)]
pub struct OwnedBuffer {
    raw: NativeBuffer,
}

impl OwnedBuffer {
    pub const fn empty() -> Self {
        Self {
            raw: NativeBuffer::empty(),
        }
    }

    /// Copy `bytes` into a fresh allocation
    pub fn copy_from(bytes: &[u8], encoding: u32) -> Result<Self> {
        if bytes.is_empty() {
            return Ok(Self::empty());
        }

        // SAFETY: non-zero size; the result is checked for null before use.
        let ptr = unsafe { libc::malloc(bytes.len()) };
        if ptr.is_null() {
            return Err(BridgeError::OutOfMemory(bytes.len()));
        }
        unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), ptr as *mut u8, bytes.len()) };

        Ok(Self {
            raw: NativeBuffer {
                ptr,
                size: bytes.len(),
                encoding,
            },
        })
    }

    /// Take ownership of a descriptor produced by the C allocator
    ///
    /// # Safety
    /// `raw.ptr` must be null or a live `malloc` allocation of at least `raw.size` bytes
    /// that nothing else will free.
    pub unsafe fn from_raw(raw: NativeBuffer) -> Self {
        if raw.ptr.is_null() {
            return Self::empty();
        }
        Self { raw }
    }

    /// Hand the allocation to the caller, who must release it with [`free_native`]
    pub fn into_raw(self) -> NativeBuffer {
        let raw = self.raw;
        std::mem::forget(self);
        raw
    }

    pub fn as_bytes(&self) -> &[u8] {
        if self.raw.is_empty() {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.raw.ptr as *const u8, self.raw.size) }
    }

    pub fn len(&self) -> usize {
        self.raw.size
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn encoding(&self) -> u32 {
        self.raw.encoding
    }

    /// Reinterpret the contents as 32-bit words (SPIR-V), zero padding a partial tail
    pub fn to_words(&self) -> Vec<u32> {
        bytemuck::pod_collect_to_vec(self.as_bytes())
    }

    /// Decode the contents as text according to the recorded encoding
    pub fn to_text(&self) -> Result<String> {
        let bytes = self.as_bytes();
        let text = match self.raw.encoding {
            encoding::UTF16 => {
                let units: Vec<u16> = bytemuck::pod_collect_to_vec(bytes);
                String::from_utf16(&units)
                    .map_err(|e| BridgeError::StringConversion(e.to_string()))?
            }
            encoding::UTF32 => {
                let units: Vec<u32> = bytemuck::pod_collect_to_vec(bytes);
                units
                    .into_iter()
                    .map(|u| {
                        char::from_u32(u).ok_or_else(|| {
                            BridgeError::StringConversion(format!("invalid code point {:#x}", u))
                        })
                    })
                    .collect::<Result<String>>()?
            }
            _ => std::str::from_utf8(bytes)
                .map_err(|e| BridgeError::StringConversion(e.to_string()))?
                .to_owned(),
        };

        Ok(text.trim_end_matches('\0').to_owned())
    }
}

impl Default for OwnedBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

impl Drop for OwnedBuffer {
    fn drop(&mut self) {
        if !self.raw.ptr.is_null() {
            unsafe { libc::free(self.raw.ptr) };
        }
    }
}

/// Release a descriptor previously returned through [`OwnedBuffer::into_raw`]
///
/// # Safety
/// `raw` must come from [`OwnedBuffer::into_raw`] (or `malloc`) and not be freed twice.
pub unsafe fn free_native(raw: NativeBuffer) {
    drop(OwnedBuffer::from_raw(raw));
}
