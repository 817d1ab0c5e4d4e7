use crate::ffi::{GlslangApi, SpvOptions};
use crate::input::ShaderInput;
use crate::program::Program;
use crate::shader::Shader;
use crate::{GlslangError, Result};
use parking_lot::Mutex;
use shaderbridge_core::{BridgeConfig, NativeLibrary};
use std::path::Path;
use std::sync::Arc;

static SHARED: Mutex<Option<Arc<Glslang>>> = parking_lot::const_mutex(None);

/// The loaded glslang library
pub struct Glslang {
    api: GlslangApi,
}

impl Glslang {
    pub fn load(config: &BridgeConfig) -> Result<Self> {
        let library = NativeLibrary::open_first(&config.glslang_candidates())?;
        let api = GlslangApi::load(library)?;

        log::info!("glslang loaded from {}", api.library().path().display());
        Ok(Self { api })
    }

    /// Process-wide instance, loaded on first use from [`BridgeConfig::from_env`]
    pub fn shared() -> Result<Arc<Self>> {
        let mut shared = SHARED.lock();
        if let Some(glslang) = shared.as_ref() {
            return Ok(Arc::clone(glslang));
        }

        let glslang = Arc::new(Self::load(&BridgeConfig::from_env())?);
        *shared = Some(Arc::clone(&glslang));
        Ok(glslang)
    }

    pub fn api(&self) -> &GlslangApi {
        &self.api
    }

    pub fn library_path(&self) -> &Path {
        self.api.library().path()
    }

    /// Initialize the glslang process state until the guard is dropped
    pub fn initialize(self: &Arc<Self>) -> Result<ProcessGuard> {
        ProcessGuard::new(Arc::clone(self))
    }

    /// Compile one shader to SPIR-V words
    ///
    /// Runs preprocess, parse, link, I/O mapping and generation; the first failing step
    /// is returned with the relevant log.
    pub fn compile(
        self: &Arc<Self>,
        input: ShaderInput,
        spv_options: Option<&SpvOptions>,
    ) -> Result<Vec<u32>> {
        let _process = self.initialize()?;
        let stage = input.stage();
        let messages = input.messages();

        let mut shader = Shader::new(self, input)?;
        shader.preprocess()?;
        shader.parse()?;

        let mut program = Program::new(self)?;
        program.add_shader(shader);
        program.link(messages)?;
        program.map_io()?;

        match spv_options {
            Some(options) => program.generate_spirv_with_options(stage, options)?,
            None => program.generate_spirv(stage)?,
        }
        if let Some(messages) = program.spirv_messages().filter(|m| !m.is_empty()) {
            log::warn!("{}", messages);
        }

        Ok(program.spirv())
    }
}

/// Compile one shader with the process-wide glslang instance
pub fn compile_glsl(input: ShaderInput, spv_options: Option<&SpvOptions>) -> Result<Vec<u32>> {
    Glslang::shared()?.compile(input, spv_options)
}

/// Keeps glslang's process state initialized
///
/// glslang counts initializations, so guards may nest and overlap across threads.
pub struct ProcessGuard {
    glslang: Arc<Glslang>,
}

impl ProcessGuard {
    pub fn new(glslang: Arc<Glslang>) -> Result<Self> {
        if unsafe { (glslang.api.initialize_process)() } == 0 {
            return Err(GlslangError::Process);
        }
        log::debug!("glslang process initialized");
        Ok(Self { glslang })
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        unsafe { (self.glslang.api.finalize_process)() };
        log::debug!("glslang process finalized");
    }
}
