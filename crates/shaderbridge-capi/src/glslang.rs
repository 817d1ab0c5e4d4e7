//! glslang entry points
//!
//! One-to-one forwards of `glslang_c_interface.h`. Handles are glslang's own
//! `glslang_shader_t*` / `glslang_program_t*`; a null handle is answered with the
//! fallback value without calling into glslang.

#![allow(non_snake_case)]

use crate::{guard, into_c_string};
use shaderbridge_glslang::ffi::{GlslangInput, GlslangProgramRaw, GlslangShaderRaw};
use shaderbridge_glslang::{Glslang, ResourceLimits, SpvOptions};
use std::os::raw::{c_char, c_int, c_uint};
use std::ptr;
use std::sync::Arc;

fn glslang() -> Option<Arc<Glslang>> {
    Glslang::shared()
        .map_err(|err| log::error!("glslang is unavailable: {}", err))
        .ok()
}

// Forwards whose only pointer argument is the leading handle.
macro_rules! forward {
    ($(
        $export:ident => $entry:ident($handle:ident: $handle_ty:ty $(, $arg:ident: $ty:ty)*)
            $(-> $ret:ty = $fallback:expr)?;
    )*) => {
        $(
            #[no_mangle]
            pub unsafe extern "C" fn $export($handle: $handle_ty $(, $arg: $ty)*) $(-> $ret)? {
                if $handle.is_null() {
                    log::error!("{} called with a null handle", stringify!($export));
                    return forward!(@fallback $($fallback)?);
                }
                guard(stringify!($export), forward!(@fallback $($fallback)?), || match glslang() {
                    Some(glslang) => (glslang.api().$entry)($handle $(, $arg)*),
                    None => forward!(@fallback $($fallback)?),
                })
            }
        )*
    };
    (@fallback) => { () };
    (@fallback $fallback:expr) => { $fallback };
}

forward! {
    shaderbridge_glslang_shader_create => shader_create(input: *const GlslangInput)
        -> *mut GlslangShaderRaw = ptr::null_mut();
    shaderbridge_glslang_shader_delete => shader_delete(shader: *mut GlslangShaderRaw);
    shaderbridge_glslang_shader_set_preamble =>
        shader_set_preamble(shader: *mut GlslangShaderRaw, preamble: *const c_char);
    shaderbridge_glslang_shader_shift_binding =>
        shader_shift_binding(shader: *mut GlslangShaderRaw, resource: c_int, base: c_uint);
    shaderbridge_glslang_shader_shift_binding_for_set => shader_shift_binding_for_set(
        shader: *mut GlslangShaderRaw,
        resource: c_int,
        base: c_uint,
        set: c_uint
    );
    shaderbridge_glslang_shader_set_options =>
        shader_set_options(shader: *mut GlslangShaderRaw, options: c_int);
    shaderbridge_glslang_shader_set_glsl_version =>
        shader_set_glsl_version(shader: *mut GlslangShaderRaw, version: c_int);
    shaderbridge_glslang_shader_get_preprocessed_code =>
        shader_get_preprocessed_code(shader: *mut GlslangShaderRaw) -> *const c_char = ptr::null();
    shaderbridge_glslang_shader_get_info_log =>
        shader_get_info_log(shader: *mut GlslangShaderRaw) -> *const c_char = ptr::null();
    shaderbridge_glslang_shader_get_info_debug_log =>
        shader_get_info_debug_log(shader: *mut GlslangShaderRaw) -> *const c_char = ptr::null();

    shaderbridge_glslang_program_delete => program_delete(program: *mut GlslangProgramRaw);
    shaderbridge_glslang_program_link =>
        program_link(program: *mut GlslangProgramRaw, messages: c_int) -> c_int = 0;
    shaderbridge_glslang_program_map_io =>
        program_map_io(program: *mut GlslangProgramRaw) -> c_int = 0;
    shaderbridge_glslang_program_SPIRV_generate =>
        program_SPIRV_generate(program: *mut GlslangProgramRaw, stage: c_int);
    shaderbridge_glslang_program_SPIRV_get_size =>
        program_SPIRV_get_size(program: *mut GlslangProgramRaw) -> usize = 0;
    shaderbridge_glslang_program_SPIRV_get_ptr =>
        program_SPIRV_get_ptr(program: *mut GlslangProgramRaw) -> *mut c_uint = ptr::null_mut();
    shaderbridge_glslang_program_SPIRV_get_messages =>
        program_SPIRV_get_messages(program: *mut GlslangProgramRaw) -> *const c_char = ptr::null();
    shaderbridge_glslang_program_get_info_log =>
        program_get_info_log(program: *mut GlslangProgramRaw) -> *const c_char = ptr::null();
    shaderbridge_glslang_program_get_info_debug_log =>
        program_get_info_debug_log(program: *mut GlslangProgramRaw) -> *const c_char = ptr::null();
}

/// Must succeed (return 1) before any other glslang call
///
/// Failures are only described through the log; see [`crate::shaderbridge_init_logging`].
#[no_mangle]
pub extern "C" fn shaderbridge_glslang_initialize_process() -> c_int {
    guard("shaderbridge_glslang_initialize_process", 0, || match glslang() {
        Some(glslang) => unsafe { (glslang.api().initialize_process)() },
        None => 0,
    })
}

#[no_mangle]
pub extern "C" fn shaderbridge_glslang_finalize_process() {
    guard("shaderbridge_glslang_finalize_process", (), || {
        if let Some(glslang) = glslang() {
            unsafe { (glslang.api().finalize_process)() }
        }
    })
}

#[no_mangle]
pub unsafe extern "C" fn shaderbridge_glslang_shader_preprocess(
    shader: *mut GlslangShaderRaw,
    input: *const GlslangInput,
) -> c_int {
    if shader.is_null() || input.is_null() {
        return 0;
    }
    guard("shaderbridge_glslang_shader_preprocess", 0, || match glslang() {
        Some(glslang) => (glslang.api().shader_preprocess)(shader, input),
        None => 0,
    })
}

#[no_mangle]
pub unsafe extern "C" fn shaderbridge_glslang_shader_parse(
    shader: *mut GlslangShaderRaw,
    input: *const GlslangInput,
) -> c_int {
    if shader.is_null() || input.is_null() {
        return 0;
    }
    guard("shaderbridge_glslang_shader_parse", 0, || match glslang() {
        Some(glslang) => (glslang.api().shader_parse)(shader, input),
        None => 0,
    })
}

#[no_mangle]
pub extern "C" fn shaderbridge_glslang_program_create() -> *mut GlslangProgramRaw {
    guard("shaderbridge_glslang_program_create", ptr::null_mut(), || match glslang() {
        Some(glslang) => unsafe { (glslang.api().program_create)() },
        None => ptr::null_mut(),
    })
}

#[no_mangle]
pub unsafe extern "C" fn shaderbridge_glslang_program_add_shader(
    program: *mut GlslangProgramRaw,
    shader: *mut GlslangShaderRaw,
) {
    if program.is_null() || shader.is_null() {
        return;
    }
    guard("shaderbridge_glslang_program_add_shader", (), || {
        if let Some(glslang) = glslang() {
            (glslang.api().program_add_shader)(program, shader)
        }
    })
}

#[no_mangle]
pub unsafe extern "C" fn shaderbridge_glslang_program_add_source_text(
    program: *mut GlslangProgramRaw,
    stage: c_int,
    text: *const c_char,
    len: usize,
) {
    if program.is_null() || text.is_null() {
        return;
    }
    guard("shaderbridge_glslang_program_add_source_text", (), || {
        if let Some(glslang) = glslang() {
            (glslang.api().program_add_source_text)(program, stage, text, len)
        }
    })
}

#[no_mangle]
pub unsafe extern "C" fn shaderbridge_glslang_program_set_source_file(
    program: *mut GlslangProgramRaw,
    stage: c_int,
    file: *const c_char,
) {
    if program.is_null() || file.is_null() {
        return;
    }
    guard("shaderbridge_glslang_program_set_source_file", (), || {
        if let Some(glslang) = glslang() {
            (glslang.api().program_set_source_file)(program, stage, file)
        }
    })
}

/// Null `options` generates with glslang's defaults
#[no_mangle]
pub unsafe extern "C" fn shaderbridge_glslang_program_SPIRV_generate_with_options(
    program: *mut GlslangProgramRaw,
    stage: c_int,
    options: *mut SpvOptions,
) {
    if program.is_null() {
        return;
    }
    guard("shaderbridge_glslang_program_SPIRV_generate_with_options", (), || {
        if let Some(glslang) = glslang() {
            if options.is_null() {
                (glslang.api().program_SPIRV_generate)(program, stage)
            } else {
                (glslang.api().program_SPIRV_generate_with_options)(program, stage, options)
            }
        }
    })
}

/// Copy the generated words into `out`, which must hold `program_SPIRV_get_size` words
#[no_mangle]
pub unsafe extern "C" fn shaderbridge_glslang_program_SPIRV_get(
    program: *mut GlslangProgramRaw,
    out: *mut c_uint,
) {
    if program.is_null() || out.is_null() {
        return;
    }
    guard("shaderbridge_glslang_program_SPIRV_get", (), || {
        if let Some(glslang) = glslang() {
            (glslang.api().program_SPIRV_get)(program, out)
        }
    })
}

/// glslang's default limits; static, never freed
#[no_mangle]
pub extern "C" fn shaderbridge_glslang_default_resource() -> *const ResourceLimits {
    ResourceLimits::default_ref()
}

/// Default limits in configuration text, released with `shaderbridge_free_string`
#[no_mangle]
pub extern "C" fn shaderbridge_glslang_default_resource_string() -> *mut c_char {
    guard(
        "shaderbridge_glslang_default_resource_string",
        ptr::null_mut(),
        || into_c_string(ResourceLimits::default().to_config_string()),
    )
}

/// Apply configuration text to `resources`; 1 on success, 0 on a malformed entry
#[no_mangle]
pub unsafe extern "C" fn shaderbridge_glslang_decode_resource_limits(
    resources: *mut ResourceLimits,
    config: *const c_char,
) -> c_int {
    let Some(resources) = resources.as_mut() else {
        return 0;
    };
    let config = match shaderbridge_core::wide::from_c_ptr(config) {
        Ok(config) => config,
        Err(err) => {
            log::error!("Unreadable resource configuration: {}", err);
            return 0;
        }
    };

    guard("shaderbridge_glslang_decode_resource_limits", 0, || {
        match resources.decode_into(config) {
            Ok(()) => 1,
            Err(err) => {
                log::error!("{}", err);
                0
            }
        }
    })
}
