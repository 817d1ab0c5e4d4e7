use crate::ffi::{self, GlslangProgramRaw, SpvOptions};
use crate::library::Glslang;
use crate::shader::Shader;
use crate::types::{Messages, Stage};
use crate::{GlslangError, Result};
use shaderbridge_core::BridgeError;
use std::ffi::CString;
use std::os::raw::c_int;
use std::ptr::NonNull;
use std::sync::Arc;

/// A `glslang_program_t`
///
/// Added shaders are owned by the program and deleted after it.
pub struct Program {
    raw: NonNull<GlslangProgramRaw>,
    shaders: Vec<Shader>,
    linked: bool,
    glslang: Arc<Glslang>,
}

impl Program {
    pub fn new(glslang: &Arc<Glslang>) -> Result<Self> {
        let raw = unsafe { (glslang.api().program_create)() };
        let raw = NonNull::new(raw).ok_or(GlslangError::NullHandle("program"))?;
        log::debug!("Created glslang program");

        Ok(Self {
            raw,
            shaders: Vec::new(),
            linked: false,
            glslang: Arc::clone(glslang),
        })
    }

    pub fn add_shader(&mut self, shader: Shader) {
        unsafe { (self.glslang.api().program_add_shader)(self.raw.as_ptr(), shader.as_raw()) };
        self.shaders.push(shader);
    }

    pub fn shaders(&self) -> &[Shader] {
        &self.shaders
    }

    pub fn link(&mut self, messages: Messages) -> Result<()> {
        let ok = unsafe { (self.glslang.api().program_link)(self.raw.as_ptr(), messages.bits()) };
        if ok == 0 {
            return Err(GlslangError::Link {
                log: self.info_log(),
            });
        }
        self.linked = true;
        Ok(())
    }

    /// Source text recorded in the SPIR-V debug information for `stage`
    pub fn add_source_text(&mut self, stage: Stage, text: &str) {
        unsafe {
            (self.glslang.api().program_add_source_text)(
                self.raw.as_ptr(),
                stage as c_int,
                text.as_ptr().cast(),
                text.len(),
            )
        };
    }

    /// Source file name recorded in the SPIR-V debug information for `stage`
    pub fn set_source_file(&mut self, stage: Stage, file: &str) -> Result<()> {
        let file = CString::new(file)
            .map_err(|e| GlslangError::Bridge(BridgeError::StringConversion(e.to_string())))?;
        unsafe {
            (self.glslang.api().program_set_source_file)(
                self.raw.as_ptr(),
                stage as c_int,
                file.as_ptr(),
            )
        };
        Ok(())
    }

    pub fn map_io(&mut self) -> Result<()> {
        let ok = unsafe { (self.glslang.api().program_map_io)(self.raw.as_ptr()) };
        if ok == 0 {
            return Err(GlslangError::MapIo {
                log: self.info_log(),
            });
        }
        Ok(())
    }

    pub fn generate_spirv(&mut self, stage: Stage) -> Result<()> {
        self.check_stage(stage)?;
        unsafe { (self.glslang.api().program_SPIRV_generate)(self.raw.as_ptr(), stage as c_int) };
        Ok(())
    }

    pub fn generate_spirv_with_options(&mut self, stage: Stage, options: &SpvOptions) -> Result<()> {
        self.check_stage(stage)?;
        let mut options = *options;
        unsafe {
            (self.glslang.api().program_SPIRV_generate_with_options)(
                self.raw.as_ptr(),
                stage as c_int,
                &mut options,
            )
        };
        Ok(())
    }

    /// Number of words generated by the last `generate_spirv*` call
    pub fn spirv_size(&self) -> usize {
        unsafe { (self.glslang.api().program_SPIRV_get_size)(self.raw.as_ptr()) }
    }

    pub fn spirv(&self) -> Vec<u32> {
        let size = self.spirv_size();
        let mut words = vec![0u32; size];
        if size > 0 {
            unsafe { (self.glslang.api().program_SPIRV_get)(self.raw.as_ptr(), words.as_mut_ptr()) };
        }
        words
    }

    pub fn spirv_messages(&self) -> Option<String> {
        unsafe { ffi::text((self.glslang.api().program_SPIRV_get_messages)(self.raw.as_ptr())) }
    }

    pub fn info_log(&self) -> String {
        unsafe { ffi::text((self.glslang.api().program_get_info_log)(self.raw.as_ptr())) }
            .unwrap_or_default()
    }

    pub fn info_debug_log(&self) -> String {
        unsafe { ffi::text((self.glslang.api().program_get_info_debug_log)(self.raw.as_ptr())) }
            .unwrap_or_default()
    }

    // glslang dereferences the stage's intermediate without checking it.
    fn check_stage(&self, stage: Stage) -> Result<()> {
        if self.linked && self.shaders.iter().any(|shader| shader.stage() == stage) {
            Ok(())
        } else {
            Err(GlslangError::MissingStage(stage))
        }
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        unsafe { (self.glslang.api().program_delete)(self.raw.as_ptr()) };
        log::debug!("Deleted glslang program");
        // `shaders` drops after this, once the program no longer references them.
    }
}
