//! COM declarations for the parts of `dxcapi.h` the adapter drives
//!
//! Vtables are declared by hand in `dxcapi.h` order. Only the leading entries of
//! `IDxcUtils` are declared; the remaining ones are never called.

use crate::{DxcError, HResult, Result};
use shaderbridge_core::WideChar;
use std::ffi::c_void;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }
}

/// Win32 `BOOL`
pub type Bool = i32;

/// Source or object handed to the compiler by pointer
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DxcBuffer {
    pub ptr: *const c_void,
    pub size: usize,
    pub encoding: u32,
}

pub const CLSID_DXC_COMPILER: Guid = Guid::new(
    0x73e2_2d93,
    0xe6ce,
    0x47f3,
    [0xb5, 0xbf, 0xf0, 0x66, 0x4f, 0x39, 0xc1, 0xb0],
);

/// Same class as the older `CLSID_DxcLibrary`
pub const CLSID_DXC_UTILS: Guid = Guid::new(
    0x6245_d6af,
    0x66e0,
    0x48fd,
    [0x80, 0xb4, 0x4d, 0x27, 0x17, 0x96, 0x74, 0x8c],
);

pub type DxcCreateInstanceProc =
    unsafe extern "system" fn(clsid: *const Guid, iid: *const Guid, out: *mut *mut c_void) -> HResult;

/// A COM interface: objects of this type start with a pointer to `Vtbl`
///
/// # Safety
/// `Vtbl` must begin with [`IUnknownVtbl`] and match the interface identified by `IID`.
pub unsafe trait Interface {
    const IID: Guid;
    type Vtbl;
}

macro_rules! interfaces {
    ($(
        $(#[$meta:meta])*
        $name:ident: $vtbl:ty = $d1:literal, $d2:literal, $d3:literal, [$($d4:literal),*];
    )*) => {
        $(
            $(#[$meta])*
            pub enum $name {}

            unsafe impl Interface for $name {
                const IID: Guid = Guid::new($d1, $d2, $d3, [$($d4),*]);
                type Vtbl = $vtbl;
            }
        )*
    };
}

interfaces! {
    IUnknown: IUnknownVtbl = 0x0000_0000, 0x0000, 0x0000, [0xc0, 0, 0, 0, 0, 0, 0, 0x46];
    IDxcBlob: IDxcBlobVtbl = 0x8ba5_fb08, 0x5195, 0x40e2, [0xac, 0x58, 0x0d, 0x98, 0x9c, 0x3a, 0x01, 0x02];
    IDxcBlobEncoding: IDxcBlobEncodingVtbl = 0x7241_d424, 0x2646, 0x4191, [0x97, 0xc0, 0x98, 0xe9, 0x6e, 0x42, 0xfc, 0x68];
    /// Wide-string blob, used for output names
    IDxcBlobWide: IDxcBlobEncodingVtbl = 0xa3f8_4eab, 0x0faa, 0x497e, [0xa3, 0x9c, 0xee, 0x6e, 0xd6, 0x0b, 0x2d, 0x84];
    IDxcOperationResult: IDxcOperationResultVtbl = 0xcedb_484a, 0xd4e9, 0x445a, [0xb9, 0x91, 0xca, 0x21, 0xca, 0x15, 0x7d, 0xc2];
    IDxcResult: IDxcResultVtbl = 0x5834_6cda, 0xdde7, 0x4497, [0x94, 0x61, 0x6f, 0x87, 0xaf, 0x5e, 0x06, 0x59];
    IDxcIncludeHandler: IDxcIncludeHandlerVtbl = 0x7f61_fc7d, 0x950d, 0x467f, [0xb3, 0xe3, 0x3c, 0x02, 0xfb, 0x49, 0x18, 0x7c];
    IDxcCompiler3: IDxcCompiler3Vtbl = 0x228b_4687, 0x5a6a, 0x4730, [0x90, 0x0c, 0x97, 0x02, 0xb2, 0x20, 0x3f, 0x54];
    IDxcUtils: IDxcUtilsVtbl = 0x4605_c4cb, 0x2019, 0x492a, [0xad, 0xa4, 0x65, 0xf2, 0x0b, 0xb7, 0xd6, 0x7f];
}

#[repr(C)]
pub struct IUnknownVtbl {
    pub query_interface:
        unsafe extern "system" fn(this: *mut c_void, iid: *const Guid, out: *mut *mut c_void) -> HResult,
    pub add_ref: unsafe extern "system" fn(this: *mut c_void) -> u32,
    pub release: unsafe extern "system" fn(this: *mut c_void) -> u32,
}

#[repr(C)]
pub struct IDxcBlobVtbl {
    pub base: IUnknownVtbl,
    pub get_buffer_pointer: unsafe extern "system" fn(this: *mut c_void) -> *mut c_void,
    pub get_buffer_size: unsafe extern "system" fn(this: *mut c_void) -> usize,
}

#[repr(C)]
pub struct IDxcBlobEncodingVtbl {
    pub base: IDxcBlobVtbl,
    pub get_encoding:
        unsafe extern "system" fn(this: *mut c_void, known: *mut Bool, code_page: *mut u32) -> HResult,
}

#[repr(C)]
pub struct IDxcOperationResultVtbl {
    pub base: IUnknownVtbl,
    pub get_status: unsafe extern "system" fn(this: *mut c_void, status: *mut HResult) -> HResult,
    pub get_result: unsafe extern "system" fn(this: *mut c_void, out: *mut *mut c_void) -> HResult,
    pub get_error_buffer:
        unsafe extern "system" fn(this: *mut c_void, out: *mut *mut c_void) -> HResult,
}

#[repr(C)]
pub struct IDxcResultVtbl {
    pub base: IDxcOperationResultVtbl,
    pub has_output: unsafe extern "system" fn(this: *mut c_void, kind: u32) -> Bool,
    pub get_output: unsafe extern "system" fn(
        this: *mut c_void,
        kind: u32,
        iid: *const Guid,
        out: *mut *mut c_void,
        name: *mut *mut c_void,
    ) -> HResult,
    pub get_num_outputs: unsafe extern "system" fn(this: *mut c_void) -> u32,
    pub get_output_by_index: unsafe extern "system" fn(this: *mut c_void, index: u32) -> u32,
    pub primary_output: unsafe extern "system" fn(this: *mut c_void) -> u32,
}

#[repr(C)]
pub struct IDxcIncludeHandlerVtbl {
    pub base: IUnknownVtbl,
    pub load_source: unsafe extern "system" fn(
        this: *mut c_void,
        filename: *const WideChar,
        out: *mut *mut c_void,
    ) -> HResult,
}

#[repr(C)]
pub struct IDxcCompiler3Vtbl {
    pub base: IUnknownVtbl,
    pub compile: unsafe extern "system" fn(
        this: *mut c_void,
        source: *const DxcBuffer,
        args: *const *const WideChar,
        arg_count: u32,
        include_handler: *mut c_void,
        iid: *const Guid,
        out: *mut *mut c_void,
    ) -> HResult,
    pub disassemble: unsafe extern "system" fn(
        this: *mut c_void,
        object: *const DxcBuffer,
        iid: *const Guid,
        out: *mut *mut c_void,
    ) -> HResult,
}

#[repr(C)]
pub struct IDxcUtilsVtbl {
    pub base: IUnknownVtbl,
    pub create_blob_from_blob: unsafe extern "system" fn(
        this: *mut c_void,
        blob: *mut c_void,
        offset: u32,
        length: u32,
        out: *mut *mut c_void,
    ) -> HResult,
    pub create_blob_from_pinned: unsafe extern "system" fn(
        this: *mut c_void,
        data: *const c_void,
        size: u32,
        code_page: u32,
        out: *mut *mut c_void,
    ) -> HResult,
    pub move_to_blob: unsafe extern "system" fn(
        this: *mut c_void,
        data: *const c_void,
        malloc: *mut c_void,
        size: u32,
        code_page: u32,
        out: *mut *mut c_void,
    ) -> HResult,
    /// Copies `data` into a new blob
    pub create_blob: unsafe extern "system" fn(
        this: *mut c_void,
        data: *const c_void,
        size: u32,
        code_page: u32,
        out: *mut *mut c_void,
    ) -> HResult,
}

/// Owning interface pointer: releases on drop, adds a reference on clone
pub struct ComPtr<T: Interface> {
    ptr: NonNull<c_void>,
    _marker: PhantomData<T>,
}

impl<T: Interface> ComPtr<T> {
    /// Adopt a reference the caller already owns
    ///
    /// # Safety
    /// `ptr` must be null or a live object implementing `T`.
    pub unsafe fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self {
            ptr,
            _marker: PhantomData,
        })
    }

    /// Run a COM call that returns its object through an out pointer
    ///
    /// # Safety
    /// On success `call` must store an owned reference to a `T` into the out pointer.
    pub unsafe fn from_out(call: impl FnOnce(*mut *mut c_void) -> HResult) -> Result<Self> {
        let mut out = ptr::null_mut();
        let hr = call(&mut out);
        // Adopt before checking so a reference returned alongside a failure is released.
        let object = Self::from_raw(out);
        hr.result()?;
        object.ok_or(DxcError::Hresult(HResult::E_POINTER))
    }

    pub fn as_raw(&self) -> *mut c_void {
        self.ptr.as_ptr()
    }

    /// Give up ownership without releasing
    pub fn into_raw(self) -> *mut c_void {
        let raw = self.as_raw();
        std::mem::forget(self);
        raw
    }

    pub fn vtbl(&self) -> &T::Vtbl {
        unsafe { &**(self.as_raw() as *const *const T::Vtbl) }
    }

    fn unknown(&self) -> &IUnknownVtbl {
        unsafe { &**(self.as_raw() as *const *const IUnknownVtbl) }
    }

    pub fn query<U: Interface>(&self) -> Option<ComPtr<U>> {
        let mut out = ptr::null_mut();
        let hr = unsafe { (self.unknown().query_interface)(self.as_raw(), &U::IID, &mut out) };
        if hr.is_err() {
            return None;
        }
        unsafe { ComPtr::from_raw(out) }
    }
}

impl<T: Interface> Clone for ComPtr<T> {
    fn clone(&self) -> Self {
        unsafe { (self.unknown().add_ref)(self.as_raw()) };
        Self {
            ptr: self.ptr,
            _marker: PhantomData,
        }
    }
}

impl<T: Interface> Drop for ComPtr<T> {
    fn drop(&mut self) {
        unsafe { (self.unknown().release)(self.as_raw()) };
    }
}

impl<T: Interface> std::fmt::Debug for ComPtr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ComPtr").field(&self.ptr).finish()
    }
}
