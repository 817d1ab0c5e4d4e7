//! End-to-end runs of the DXC entry points against the real compiler
//!
//! Each test returns early when DXC cannot be loaded on this machine.

use shaderbridge_capi::dxc::*;
use shaderbridge_capi::shaderbridge_free_buffer;
use shaderbridge_core::{encoding, NativeBuffer, OwnedBuffer};
use shaderbridge_dxc::{DxcCompiler, DxcResult, HResult, IncludeBridge, OutKind};
use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::ptr;

const VERTEX_SHADER: &str = "float4 main(float4 position : POSITION) : SV_Position { return position; }";

fn compiler() -> Option<*mut DxcCompiler> {
    let _ = env_logger::builder().is_test(true).try_init();
    let compiler = shaderbridge_dxc_create_compiler();
    if compiler.is_null() {
        log::warn!("DXC not available, skipping");
        return None;
    }
    Some(compiler)
}

fn compile(
    compiler: *mut DxcCompiler,
    source: &str,
    args: &[&str],
    include: *mut IncludeBridge,
) -> *mut DxcResult {
    let args: Vec<CString> = args.iter().map(|a| CString::new(*a).unwrap()).collect();
    let arg_ptrs: Vec<*const c_char> = args.iter().map(|a| a.as_ptr()).collect();
    let source = NativeBuffer {
        ptr: source.as_ptr() as *mut c_void,
        size: source.len(),
        encoding: encoding::UTF8,
    };

    let mut result = ptr::null_mut();
    let hr = unsafe {
        shaderbridge_dxc_compile(
            compiler,
            &source,
            arg_ptrs.as_ptr(),
            arg_ptrs.len() as u32,
            include,
            &mut result,
        )
    };
    assert_eq!(hr, HResult::S_OK);
    assert!(!result.is_null());
    result
}

#[test]
fn compiled_object_is_copied_out() {
    let Some(compiler) = compiler() else { return };
    let result = compile(compiler, VERTEX_SHADER, &["-E", "main", "-T", "vs_6_0"], ptr::null_mut());

    unsafe {
        assert_eq!(shaderbridge_dxc_get_status(result), HResult::S_OK);
        assert_eq!(shaderbridge_dxc_has_output(result, OutKind::Object.as_raw()), 1);

        let mut object = NativeBuffer::empty();
        let mut name = NativeBuffer::empty();
        let hr = shaderbridge_dxc_get_result_output(
            result,
            OutKind::Object.as_raw(),
            &mut object,
            &mut name,
        );
        assert_eq!(hr, HResult::S_OK);
        assert!(!object.ptr.is_null());
        assert!(object.size > 4);
        assert_eq!(object.size, (*result).output_size(OutKind::Object).unwrap());
        let bytes = std::slice::from_raw_parts(object.ptr as *const u8, object.size);
        assert_eq!(&bytes[..4], b"DXBC");

        shaderbridge_free_buffer(&mut object);
        shaderbridge_free_buffer(&mut name);
        assert!(object.is_empty());

        shaderbridge_dxc_free_result(result);
        shaderbridge_dxc_delete_compiler(compiler);
    }
}

#[test]
fn missing_debug_info_is_reported_absent() {
    let Some(compiler) = compiler() else { return };
    let result = compile(compiler, VERTEX_SHADER, &["-E", "main", "-T", "vs_6_0"], ptr::null_mut());

    unsafe {
        let mut pdb = NativeBuffer {
            ptr: ptr::null_mut(),
            size: 99,
            encoding: encoding::UTF8,
        };
        let mut name = NativeBuffer::empty();
        assert_eq!(shaderbridge_dxc_has_output(result, OutKind::Pdb.as_raw()), 0);
        assert_eq!(
            shaderbridge_dxc_get_result_output(result, OutKind::Pdb.as_raw(), &mut pdb, &mut name),
            HResult::E_FAIL
        );
        assert_eq!(pdb, NativeBuffer::empty());
        assert_eq!(name, NativeBuffer::empty());

        // The documented free call is fine on the empty descriptors it left behind.
        shaderbridge_free_buffer(&mut pdb);

        shaderbridge_dxc_free_result(result);
        shaderbridge_dxc_delete_compiler(compiler);
    }
}

unsafe extern "C" fn no_includes(_ctx: *mut c_void, _filename: *const c_char) -> NativeBuffer {
    NativeBuffer::empty()
}

unsafe extern "C" fn lighting_include(ctx: *mut c_void, filename: *const c_char) -> NativeBuffer {
    let requests = &mut *(ctx as *mut Vec<String>);
    let name = CStr::from_ptr(filename).to_string_lossy().into_owned();
    let found = name.ends_with("lighting.hlsli");
    requests.push(name);

    if found {
        OwnedBuffer::copy_from(b"float3 ambient() { return 0.1; }", encoding::UTF8)
            .unwrap()
            .into_raw()
    } else {
        NativeBuffer::empty()
    }
}

#[test]
fn empty_include_fails_compilation() {
    let Some(compiler) = compiler() else { return };
    let source = "#include \"missing.hlsli\"\nfloat4 main() : SV_Target { return 1; }";

    unsafe {
        let include = shaderbridge_dxc_create_include_handler(ptr::null_mut(), Some(no_includes));
        assert!(!include.is_null());
        let result = compile(compiler, source, &["-E", "main", "-T", "ps_6_0"], include);

        assert!(shaderbridge_dxc_get_status(result).is_err());
        let mut errors = NativeBuffer::empty();
        assert_eq!(
            shaderbridge_dxc_get_result_output(
                result,
                OutKind::Errors.as_raw(),
                &mut errors,
                ptr::null_mut()
            ),
            HResult::S_OK
        );
        let text = OwnedBuffer::from_raw(errors).to_text().unwrap();
        assert!(text.contains("missing.hlsli"), "{}", text);

        shaderbridge_dxc_free_result(result);
        shaderbridge_dxc_delete_include_handler(include);
        shaderbridge_dxc_delete_compiler(compiler);
    }
}

#[test]
fn delegate_serves_includes() {
    let Some(compiler) = compiler() else { return };
    let source = "#include \"lighting.hlsli\"\nfloat4 main() : SV_Target { return float4(ambient(), 1); }";
    let mut requests: Vec<String> = Vec::new();

    unsafe {
        let include = shaderbridge_dxc_create_include_handler(
            &mut requests as *mut Vec<String> as *mut c_void,
            Some(lighting_include),
        );
        let result = compile(compiler, source, &["-E", "main", "-T", "ps_6_0"], include);
        assert_eq!(shaderbridge_dxc_get_status(result), HResult::S_OK);

        shaderbridge_dxc_free_result(result);
        shaderbridge_dxc_delete_include_handler(include);
        shaderbridge_dxc_delete_compiler(compiler);
    }
    assert_eq!(requests.len(), 1);
    assert!(requests[0].ends_with("lighting.hlsli"));
}

#[test]
fn typed_options_compile_through_the_safe_api() {
    let Some(compiler) = compiler() else { return };
    unsafe { shaderbridge_dxc_delete_compiler(compiler) };

    let compiler = DxcCompiler::from_shared().unwrap();
    let options = shaderbridge_dxc::CompilerOptions::new(
        shaderbridge_dxc::ShaderProfile::new(shaderbridge_dxc::ShaderType::Vertex, 6, 0),
    );
    let object = compiler.compile_hlsl(VERTEX_SHADER, &options, None).unwrap();
    assert_eq!(&object[..4], b"DXBC");
}
