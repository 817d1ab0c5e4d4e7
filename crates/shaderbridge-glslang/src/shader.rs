use crate::ffi::{self, GlslangShaderRaw};
use crate::input::ShaderInput;
use crate::library::Glslang;
use crate::types::{ResourceType, ShaderOptions, Stage};
use crate::{GlslangError, Result};
use shaderbridge_core::BridgeError;
use std::ffi::CString;
use std::os::raw::c_int;
use std::ptr::NonNull;
use std::sync::Arc;

/// A `glslang_shader_t` and the input it was created from
///
/// Call [`Shader::preprocess`] before [`Shader::parse`]; parsing consumes the
/// preprocessed text.
pub struct Shader {
    raw: NonNull<GlslangShaderRaw>,
    input: ShaderInput,
    preamble: Option<CString>,
    glslang: Arc<Glslang>,
}

impl Shader {
    pub fn new(glslang: &Arc<Glslang>, input: ShaderInput) -> Result<Self> {
        let raw = unsafe { (glslang.api().shader_create)(input.as_raw()) };
        let raw = NonNull::new(raw).ok_or(GlslangError::NullHandle("shader"))?;
        log::debug!("Created glslang {:?} shader", input.stage());

        Ok(Self {
            raw,
            input,
            preamble: None,
            glslang: Arc::clone(glslang),
        })
    }

    pub fn stage(&self) -> Stage {
        self.input.stage()
    }

    pub fn input(&self) -> &ShaderInput {
        &self.input
    }

    /// Text prepended to the source, e.g. `#define` lines
    pub fn set_preamble(&mut self, preamble: &str) -> Result<()> {
        let preamble = CString::new(preamble)
            .map_err(|e| GlslangError::Bridge(BridgeError::StringConversion(e.to_string())))?;
        unsafe { (self.glslang.api().shader_set_preamble)(self.raw.as_ptr(), preamble.as_ptr()) };
        // glslang keeps the pointer.
        self.preamble = Some(preamble);
        Ok(())
    }

    pub fn shift_binding(&mut self, resource: ResourceType, base: u32) {
        unsafe {
            (self.glslang.api().shader_shift_binding)(self.raw.as_ptr(), resource as c_int, base)
        };
    }

    pub fn shift_binding_for_set(&mut self, resource: ResourceType, base: u32, set: u32) {
        unsafe {
            (self.glslang.api().shader_shift_binding_for_set)(
                self.raw.as_ptr(),
                resource as c_int,
                base,
                set,
            )
        };
    }

    pub fn set_options(&mut self, options: ShaderOptions) {
        unsafe { (self.glslang.api().shader_set_options)(self.raw.as_ptr(), options.bits()) };
    }

    pub fn set_glsl_version(&mut self, version: i32) {
        unsafe { (self.glslang.api().shader_set_glsl_version)(self.raw.as_ptr(), version) };
    }

    pub fn preprocess(&mut self) -> Result<()> {
        let ok = unsafe {
            (self.glslang.api().shader_preprocess)(self.raw.as_ptr(), self.input.as_raw())
        };
        if ok == 0 {
            return Err(GlslangError::Preprocess {
                log: self.info_log(),
            });
        }
        Ok(())
    }

    pub fn parse(&mut self) -> Result<()> {
        let ok =
            unsafe { (self.glslang.api().shader_parse)(self.raw.as_ptr(), self.input.as_raw()) };
        if ok == 0 {
            return Err(GlslangError::Parse {
                log: self.info_log(),
            });
        }
        Ok(())
    }

    pub fn preprocessed_code(&self) -> String {
        unsafe { ffi::text((self.glslang.api().shader_get_preprocessed_code)(self.raw.as_ptr())) }
            .unwrap_or_default()
    }

    pub fn info_log(&self) -> String {
        unsafe { ffi::text((self.glslang.api().shader_get_info_log)(self.raw.as_ptr())) }
            .unwrap_or_default()
    }

    pub fn info_debug_log(&self) -> String {
        unsafe { ffi::text((self.glslang.api().shader_get_info_debug_log)(self.raw.as_ptr())) }
            .unwrap_or_default()
    }

    pub(crate) fn as_raw(&self) -> *mut GlslangShaderRaw {
        self.raw.as_ptr()
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe { (self.glslang.api().shader_delete)(self.raw.as_ptr()) };
        log::debug!("Deleted glslang {:?} shader", self.input.stage());
    }
}
