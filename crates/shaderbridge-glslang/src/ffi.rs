//! Raw glslang C interface (`glslang_c_interface.h`)
//!
//! Enumerations cross the boundary as plain `c_int`s so values coming from C callers
//! are forwarded without being reinterpreted as Rust enums.

use crate::resource::ResourceLimits;
use shaderbridge_core::{NativeLibrary, Result};
use std::ffi::{c_void, CStr};
use std::os::raw::{c_char, c_int, c_uint};
use std::ptr;

/// Opaque `glslang_shader_t`
#[repr(C)]
pub struct GlslangShaderRaw {
    _private: [u8; 0],
}

/// Opaque `glslang_program_t`
#[repr(C)]
pub struct GlslangProgramRaw {
    _private: [u8; 0],
}

/// `glsl_include_result_t`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct IncludeResultRaw {
    /// Resolved name; empty means the include failed
    pub header_name: *const c_char,
    pub header_data: *const c_char,
    pub header_length: usize,
}

pub type IncludeFn = unsafe extern "C" fn(
    ctx: *mut c_void,
    header_name: *const c_char,
    includer_name: *const c_char,
    include_depth: usize,
) -> *mut IncludeResultRaw;

pub type FreeIncludeResultFn =
    unsafe extern "C" fn(ctx: *mut c_void, result: *mut IncludeResultRaw) -> c_int;

/// `glsl_include_callbacks_t`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeCallbacks {
    pub include_system: Option<IncludeFn>,
    pub include_local: Option<IncludeFn>,
    pub free_include_result: Option<FreeIncludeResultFn>,
}

/// `glslang_input_t`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GlslangInput {
    pub language: c_int,
    pub stage: c_int,
    pub client: c_int,
    pub client_version: c_int,
    pub target_language: c_int,
    pub target_language_version: c_int,
    pub code: *const c_char,
    pub entrypoint: *const c_char,
    pub source_entrypoint: *const c_char,
    pub invert_y: bool,
    pub default_version: c_int,
    pub default_profile: c_int,
    pub force_default_version_and_profile: c_int,
    pub forward_compatible: c_int,
    pub messages: c_int,
    pub resource: *const ResourceLimits,
    pub callbacks: IncludeCallbacks,
    pub callbacks_ctx: *mut c_void,
}

/// `glslang_spv_options_t`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpvOptions {
    pub generate_debug_info: bool,
    pub strip_debug_info: bool,
    pub disable_optimizer: bool,
    pub optimize_size: bool,
    pub disassemble: bool,
    pub validate: bool,
    pub emit_nonsemantic_shader_debug_info: bool,
    pub emit_nonsemantic_shader_debug_source: bool,
    pub compile_only: bool,
    pub optimize_allow_expanded_id_bound: bool,
}

impl SpvOptions {
    pub fn with_debug_info(mut self, enabled: bool) -> Self {
        self.generate_debug_info = enabled;
        self
    }

    pub fn with_optimizer(mut self, enabled: bool) -> Self {
        self.disable_optimizer = !enabled;
        self
    }

    pub fn with_optimize_size(mut self, enabled: bool) -> Self {
        self.optimize_size = enabled;
        self
    }

    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate = enabled;
        self
    }
}

macro_rules! glslang_api {
    ($($name:ident: fn($($arg:ident: $ty:ty),*) $(-> $ret:ty)?;)*) => {
        /// Entry points resolved from the glslang shared library
        ///
        /// Holds the library itself so the pointers stay valid for the table's lifetime.
        #[allow(non_snake_case)]
        pub struct GlslangApi {
            $(pub $name: unsafe extern "C" fn($($arg: $ty),*) $(-> $ret)?,)*
            library: NativeLibrary,
        }

        impl GlslangApi {
            /// Resolve every `glslang_*` entry point from `library`
            pub fn load(library: NativeLibrary) -> Result<Self> {
                // SAFETY: each field's type is the C prototype of the symbol it is read from.
                unsafe {
                    Ok(Self {
                        $($name: library.symbol(concat!("glslang_", stringify!($name)))?,)*
                        library,
                    })
                }
            }
        }
    };
}

glslang_api! {
    initialize_process: fn() -> c_int;
    finalize_process: fn();

    shader_create: fn(input: *const GlslangInput) -> *mut GlslangShaderRaw;
    shader_delete: fn(shader: *mut GlslangShaderRaw);
    shader_set_preamble: fn(shader: *mut GlslangShaderRaw, preamble: *const c_char);
    shader_shift_binding: fn(shader: *mut GlslangShaderRaw, res: c_int, base: c_uint);
    shader_shift_binding_for_set:
        fn(shader: *mut GlslangShaderRaw, res: c_int, base: c_uint, set: c_uint);
    shader_set_options: fn(shader: *mut GlslangShaderRaw, options: c_int);
    shader_set_glsl_version: fn(shader: *mut GlslangShaderRaw, version: c_int);
    shader_preprocess: fn(shader: *mut GlslangShaderRaw, input: *const GlslangInput) -> c_int;
    shader_parse: fn(shader: *mut GlslangShaderRaw, input: *const GlslangInput) -> c_int;
    shader_get_preprocessed_code: fn(shader: *mut GlslangShaderRaw) -> *const c_char;
    shader_get_info_log: fn(shader: *mut GlslangShaderRaw) -> *const c_char;
    shader_get_info_debug_log: fn(shader: *mut GlslangShaderRaw) -> *const c_char;

    program_create: fn() -> *mut GlslangProgramRaw;
    program_delete: fn(program: *mut GlslangProgramRaw);
    program_add_shader: fn(program: *mut GlslangProgramRaw, shader: *mut GlslangShaderRaw);
    program_link: fn(program: *mut GlslangProgramRaw, messages: c_int) -> c_int;
    program_add_source_text:
        fn(program: *mut GlslangProgramRaw, stage: c_int, text: *const c_char, len: usize);
    program_set_source_file:
        fn(program: *mut GlslangProgramRaw, stage: c_int, file: *const c_char);
    program_map_io: fn(program: *mut GlslangProgramRaw) -> c_int;
    program_SPIRV_generate: fn(program: *mut GlslangProgramRaw, stage: c_int);
    program_SPIRV_generate_with_options:
        fn(program: *mut GlslangProgramRaw, stage: c_int, options: *mut SpvOptions);
    program_SPIRV_get_size: fn(program: *mut GlslangProgramRaw) -> usize;
    program_SPIRV_get: fn(program: *mut GlslangProgramRaw, out: *mut c_uint);
    program_SPIRV_get_ptr: fn(program: *mut GlslangProgramRaw) -> *mut c_uint;
    program_SPIRV_get_messages: fn(program: *mut GlslangProgramRaw) -> *const c_char;
    program_get_info_log: fn(program: *mut GlslangProgramRaw) -> *const c_char;
    program_get_info_debug_log: fn(program: *mut GlslangProgramRaw) -> *const c_char;
}

impl GlslangApi {
    pub fn library(&self) -> &NativeLibrary {
        &self.library
    }
}

/// Copy a string owned by glslang; null reads as `None`
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
pub unsafe fn text(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
}

impl Default for GlslangInput {
    fn default() -> Self {
        Self {
            language: 0,
            stage: 0,
            client: 0,
            client_version: 0,
            target_language: 0,
            target_language_version: 0,
            code: ptr::null(),
            entrypoint: ptr::null(),
            source_entrypoint: ptr::null(),
            invert_y: false,
            default_version: 0,
            default_profile: 0,
            force_default_version_and_profile: 0,
            forward_compatible: 0,
            messages: 0,
            resource: ptr::null(),
            callbacks: IncludeCallbacks::default(),
            callbacks_ctx: ptr::null_mut(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn input_layout_matches_the_c_struct() {
        let ptr = size_of::<*const c_void>();
        assert_eq!(offset_of!(GlslangInput, code), 24);
        assert_eq!(offset_of!(GlslangInput, invert_y), 24 + 3 * ptr);
        assert_eq!(offset_of!(GlslangInput, callbacks), offset_of!(GlslangInput, resource) + ptr);
        assert_eq!(size_of::<IncludeCallbacks>(), 3 * ptr);
        assert_eq!(size_of::<IncludeResultRaw>(), 3 * ptr);
    }

    #[test]
    fn spv_options_are_packed_bools() {
        assert_eq!(size_of::<SpvOptions>(), 10);
        let options = SpvOptions::default()
            .with_debug_info(true)
            .with_optimizer(false);
        assert!(options.generate_debug_info);
        assert!(options.disable_optimizer);
        assert!(!options.validate);
    }

    #[test]
    fn null_text_is_none() {
        assert_eq!(unsafe { text(ptr::null()) }, None);
        let owned = std::ffi::CString::new("ERROR: 0:1: syntax error").unwrap();
        assert_eq!(
            unsafe { text(owned.as_ptr()) }.as_deref(),
            Some("ERROR: 0:1: syntax error")
        );
    }
}
