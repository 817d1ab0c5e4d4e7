//! DXC adapter
//!
//! Loads the DirectX shader compiler at runtime and drives it through its COM
//! interfaces:
//!
//! - [`Dxc`] owns the loaded library and instantiates compiler objects
//! - [`DxcCompiler::compile`] converts a UTF-8 argument vector to wide strings and
//!   relays the [`DxcResult`]
//! - [`IncludeBridge`] answers the compiler's include requests from an [`IncludeHandler`]
//! - [`DxcResult::output`] copies an output blob and its name into [`OwnedBuffer`]s
//! - [`CompilerOptions`] renders typed options into DXC arguments
//!
//! [`OwnedBuffer`]: shaderbridge_core::OwnedBuffer

pub mod ffi;
pub mod options;

mod compiler;
mod hresult;
mod include;
mod library;
mod out_kind;
mod result;

pub use compiler::DxcCompiler;
pub use hresult::HResult;
pub use include::{
    DelegateInclude, FileSystemInclude, IncludeBridge, IncludeDelegate, IncludeHandler,
    IncludeSource, MemoryInclude,
};
pub use library::{Dxc, DxcUtils};
pub use options::{
    CompilerOptions, DebugInfo, LanguageVersion, MatrixPacking, OptimizationLevel, ShaderProfile,
    ShaderType,
};
pub use out_kind::OutKind;
pub use result::{DxcResult, ResultOutput};

use shaderbridge_core::BridgeError;

/// Result type for DXC operations
pub type Result<T> = std::result::Result<T, DxcError>;

/// Errors that can occur while driving DXC
#[derive(Debug, thiserror::Error)]
pub enum DxcError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("DXC call failed with HRESULT {0}")]
    Hresult(HResult),

    #[error("Output {0:?} was not produced")]
    OutputMissing(OutKind),

    #[error("Compilation failed ({status}): {message}")]
    Compile { status: HResult, message: String },

    #[error("Invalid shader profile: {0}")]
    InvalidProfile(String),
}

impl DxcError {
    /// The status code this error is reported as across the C boundary
    pub fn hresult(&self) -> HResult {
        match self {
            DxcError::Hresult(hr) => *hr,
            DxcError::Compile { status, .. } => *status,
            DxcError::Bridge(BridgeError::OutOfMemory(_)) => HResult::E_OUTOFMEMORY,
            DxcError::Bridge(BridgeError::InvalidArgument(_)) => HResult::E_INVALIDARG,
            DxcError::InvalidProfile(_) => HResult::E_INVALIDARG,
            _ => HResult::E_FAIL,
        }
    }
}
