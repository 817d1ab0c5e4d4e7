//! DXC entry points

use crate::guard;
use shaderbridge_core::{NativeBuffer, WideArgs};
use shaderbridge_dxc::{
    DelegateInclude, Dxc, DxcCompiler, DxcError, DxcResult, HResult, IncludeBridge,
    IncludeDelegate, OutKind,
};
use std::ffi::c_void;
use std::os::raw::{c_char, c_int};
use std::ptr;

/// Create a compiler instance, or null when DXC cannot be loaded
#[no_mangle]
pub extern "C" fn shaderbridge_dxc_create_compiler() -> *mut DxcCompiler {
    guard("shaderbridge_dxc_create_compiler", ptr::null_mut(), || {
        match DxcCompiler::from_shared() {
            Ok(compiler) => Box::into_raw(Box::new(compiler)),
            Err(err) => {
                log::error!("Failed to create DXC compiler: {}", err);
                ptr::null_mut()
            }
        }
    })
}

#[no_mangle]
pub unsafe extern "C" fn shaderbridge_dxc_delete_compiler(compiler: *mut DxcCompiler) {
    if !compiler.is_null() {
        guard("shaderbridge_dxc_delete_compiler", (), || drop(Box::from_raw(compiler)));
    }
}

/// Wrap a C include callback; `delegate` is invoked with `ctx` on every include
#[no_mangle]
pub unsafe extern "C" fn shaderbridge_dxc_create_include_handler(
    ctx: *mut c_void,
    delegate: Option<IncludeDelegate>,
) -> *mut IncludeBridge {
    let Some(delegate) = delegate else {
        log::error!("Include handler requested without a delegate");
        return ptr::null_mut();
    };

    guard("shaderbridge_dxc_create_include_handler", ptr::null_mut(), || {
        let include = DelegateInclude::new(ctx, delegate);
        match Dxc::shared().and_then(|dxc| dxc.create_include_bridge(include)) {
            Ok(bridge) => Box::into_raw(Box::new(bridge)),
            Err(err) => {
                log::error!("Failed to create include handler: {}", err);
                ptr::null_mut()
            }
        }
    })
}

#[no_mangle]
pub unsafe extern "C" fn shaderbridge_dxc_delete_include_handler(handler: *mut IncludeBridge) {
    if !handler.is_null() {
        guard("shaderbridge_dxc_delete_include_handler", (), || {
            drop(Box::from_raw(handler))
        });
    }
}

/// Compile `source` with `arg_count` UTF-8 arguments
///
/// On success `*result` receives a handle to release with
/// [`shaderbridge_dxc_free_result`]; the compilation outcome is its status. The return
/// value only reports whether the compile call itself ran.
#[no_mangle]
pub unsafe extern "C" fn shaderbridge_dxc_compile(
    compiler: *mut DxcCompiler,
    source: *const NativeBuffer,
    args: *const *const c_char,
    arg_count: u32,
    include: *mut IncludeBridge,
    result: *mut *mut DxcResult,
) -> HResult {
    if result.is_null() {
        return HResult::E_POINTER;
    }
    *result = ptr::null_mut();

    let (Some(compiler), Some(source)) = (compiler.as_ref(), source.as_ref()) else {
        return HResult::E_INVALIDARG;
    };
    let bytes: &[u8] = if source.size == 0 {
        &[]
    } else if source.ptr.is_null() {
        return HResult::E_INVALIDARG;
    } else {
        std::slice::from_raw_parts(source.ptr as *const u8, source.size)
    };

    guard("shaderbridge_dxc_compile", HResult::E_FAIL, || {
        let args = match WideArgs::from_c_args(args, arg_count) {
            Ok(args) => args,
            Err(err) => {
                log::error!("Invalid compiler arguments: {}", err);
                return DxcError::from(err).hresult();
            }
        };

        match compiler.compile_wide(bytes, source.encoding, &args, include.as_mut()) {
            Ok(compiled) => {
                *result = Box::into_raw(Box::new(compiled));
                HResult::S_OK
            }
            Err(err) => {
                log::error!("DXC compile call failed: {}", err);
                err.hresult()
            }
        }
    })
}

#[no_mangle]
pub unsafe extern "C" fn shaderbridge_dxc_free_result(result: *mut DxcResult) {
    if !result.is_null() {
        guard("shaderbridge_dxc_free_result", (), || drop(Box::from_raw(result)));
    }
}

/// 1 when the result carries output `kind`, 0 otherwise
#[no_mangle]
pub unsafe extern "C" fn shaderbridge_dxc_has_output(result: *mut DxcResult, kind: u32) -> c_int {
    let (Some(result), Some(kind)) = (result.as_ref(), OutKind::from_raw(kind)) else {
        return 0;
    };
    guard("shaderbridge_dxc_has_output", 0, || result.has_output(kind) as c_int)
}

/// Copy output `kind` and its name into two caller-owned buffers
///
/// Both buffers are reset to empty first. `name` may be null. An absent output is
/// `E_FAIL` and allocates nothing.
#[no_mangle]
pub unsafe extern "C" fn shaderbridge_dxc_get_result_output(
    result: *mut DxcResult,
    kind: u32,
    output: *mut NativeBuffer,
    name: *mut NativeBuffer,
) -> HResult {
    let (Some(result), Some(output)) = (result.as_ref(), output.as_mut()) else {
        return HResult::E_INVALIDARG;
    };
    *output = NativeBuffer::empty();
    let mut name = name.as_mut();
    if let Some(name) = name.as_deref_mut() {
        *name = NativeBuffer::empty();
    }

    let Some(kind) = OutKind::from_raw(kind) else {
        return HResult::E_FAIL;
    };

    guard("shaderbridge_dxc_get_result_output", HResult::E_FAIL, || {
        match result.output(kind) {
            Ok(copied) => {
                *output = copied.data.into_raw();
                if let Some(name) = name {
                    *name = copied.name.into_raw();
                }
                HResult::S_OK
            }
            Err(DxcError::OutputMissing(_)) => HResult::E_FAIL,
            Err(err) => {
                log::error!("Failed to copy {:?} output: {}", kind, err);
                err.hresult()
            }
        }
    })
}

/// Compilation status of a result
#[no_mangle]
pub unsafe extern "C" fn shaderbridge_dxc_get_status(result: *mut DxcResult) -> HResult {
    match result.as_ref() {
        Some(result) => guard("shaderbridge_dxc_get_status", HResult::E_FAIL, || result.status()),
        None => HResult::E_INVALIDARG,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_handles_are_rejected() {
        unsafe {
            shaderbridge_dxc_delete_compiler(ptr::null_mut());
            shaderbridge_dxc_delete_include_handler(ptr::null_mut());
            shaderbridge_dxc_free_result(ptr::null_mut());

            assert_eq!(shaderbridge_dxc_has_output(ptr::null_mut(), 1), 0);
            assert_eq!(shaderbridge_dxc_get_status(ptr::null_mut()), HResult::E_INVALIDARG);
            assert!(shaderbridge_dxc_create_include_handler(ptr::null_mut(), None).is_null());
        }
    }

    #[test]
    fn compile_validates_pointers_before_loading() {
        let source = NativeBuffer::empty();
        let mut result = 1usize as *mut DxcResult;
        unsafe {
            assert_eq!(
                shaderbridge_dxc_compile(
                    ptr::null_mut(),
                    &source,
                    ptr::null(),
                    0,
                    ptr::null_mut(),
                    ptr::null_mut(),
                ),
                HResult::E_POINTER
            );
            assert_eq!(
                shaderbridge_dxc_compile(
                    ptr::null_mut(),
                    &source,
                    ptr::null(),
                    0,
                    ptr::null_mut(),
                    &mut result,
                ),
                HResult::E_INVALIDARG
            );
        }
        assert!(result.is_null());
    }

    #[test]
    fn output_extraction_requires_result_and_output() {
        let mut output = NativeBuffer {
            ptr: ptr::null_mut(),
            size: 12,
            encoding: 65001,
        };
        unsafe {
            assert_eq!(
                shaderbridge_dxc_get_result_output(ptr::null_mut(), 1, &mut output, ptr::null_mut()),
                HResult::E_INVALIDARG
            );
            assert_eq!(
                shaderbridge_dxc_get_result_output(
                    ptr::null_mut(),
                    1,
                    ptr::null_mut(),
                    ptr::null_mut()
                ),
                HResult::E_INVALIDARG
            );
        }
    }
}
