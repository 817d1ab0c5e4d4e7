use crate::ffi::{ComPtr, DxcBuffer, IDxcCompiler3, IDxcResult, Interface};
use crate::include::{IncludeBridge, IncludeHandler};
use crate::library::Dxc;
use crate::options::CompilerOptions;
use crate::result::DxcResult;
use crate::Result;
use shaderbridge_core::{encoding, WideArgs};
use std::ptr;
use std::sync::Arc;

/// An `IDxcCompiler3` instance
pub struct DxcCompiler {
    inner: ComPtr<IDxcCompiler3>,
    dxc: Arc<Dxc>,
}

impl DxcCompiler {
    pub(crate) fn new(inner: ComPtr<IDxcCompiler3>, dxc: Arc<Dxc>) -> Self {
        Self { inner, dxc }
    }

    /// Compiler from the process-wide DXC instance
    pub fn from_shared() -> Result<Self> {
        Dxc::shared()?.create_compiler()
    }

    pub fn dxc(&self) -> &Arc<Dxc> {
        &self.dxc
    }

    /// Include bridge for use with this compiler's library
    pub fn include_bridge(&self, handler: impl IncludeHandler + 'static) -> Result<IncludeBridge> {
        self.dxc.create_include_bridge(handler)
    }

    /// Compile `source` with UTF-8 command line arguments
    ///
    /// The returned result carries the compilation status; an error here means the
    /// call itself failed.
    pub fn compile<S: AsRef<str>>(
        &self,
        source: &[u8],
        source_encoding: u32,
        args: &[S],
        include: Option<&mut IncludeBridge>,
    ) -> Result<DxcResult> {
        let args = WideArgs::from_utf8(args)?;
        self.compile_wide(source, source_encoding, &args, include)
    }

    /// Compile with arguments already converted to wide strings
    pub fn compile_wide(
        &self,
        source: &[u8],
        source_encoding: u32,
        args: &WideArgs,
        include: Option<&mut IncludeBridge>,
    ) -> Result<DxcResult> {
        let buffer = DxcBuffer {
            ptr: source.as_ptr().cast(),
            size: source.len(),
            encoding: source_encoding,
        };
        let include = include.map_or(ptr::null_mut(), |bridge| bridge.as_raw());

        log::debug!(
            "Compiling {} bytes of HLSL with {} arguments",
            source.len(),
            args.len()
        );
        let result = unsafe {
            ComPtr::<IDxcResult>::from_out(|out| {
                (self.inner.vtbl().compile)(
                    self.inner.as_raw(),
                    &buffer,
                    args.as_ptr(),
                    args.len(),
                    include,
                    &IDxcResult::IID,
                    out,
                )
            })?
        };

        Ok(DxcResult::new(result, Arc::clone(&self.dxc)))
    }

    /// Disassemble DXIL or SPIR-V object code; the text is the `Disassembly` output
    pub fn disassemble(&self, object: &[u8]) -> Result<DxcResult> {
        let buffer = DxcBuffer {
            ptr: object.as_ptr().cast(),
            size: object.len(),
            encoding: encoding::UNKNOWN,
        };

        let result = unsafe {
            ComPtr::<IDxcResult>::from_out(|out| {
                (self.inner.vtbl().disassemble)(
                    self.inner.as_raw(),
                    &buffer,
                    &IDxcResult::IID,
                    out,
                )
            })?
        };

        Ok(DxcResult::new(result, Arc::clone(&self.dxc)))
    }

    /// Compile UTF-8 HLSL with typed options and return the object code
    pub fn compile_hlsl(
        &self,
        source: &str,
        options: &CompilerOptions,
        include: Option<&mut IncludeBridge>,
    ) -> Result<Vec<u8>> {
        options.profile.validate()?;
        let result = self.compile(source.as_bytes(), encoding::UTF8, &options.to_args(), include)?;

        let object = result.object()?;
        if let Some(warnings) = result.errors() {
            log::warn!("{}", warnings);
        }
        Ok(object)
    }
}

impl Drop for DxcCompiler {
    fn drop(&mut self) {
        log::debug!("Releasing DXC compiler instance");
    }
}
