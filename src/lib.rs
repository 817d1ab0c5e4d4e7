//! Shaderbridge - thin adapters over the DXC and glslang shader compilers
//!
//! Both compilers are loaded at runtime; nothing here parses or generates shader code.
//! The flat C surface lives in the `shaderbridge-capi` crate.

pub use shaderbridge_core as core;
pub use shaderbridge_dxc as dxc;
pub use shaderbridge_glslang as glslang;

pub mod prelude {
    pub use crate::core::{encoding, BridgeConfig, BridgeError, NativeBuffer, OwnedBuffer};
    pub use crate::dxc::{
        CompilerOptions, Dxc, DxcCompiler, DxcError, DxcResult, IncludeHandler, IncludeSource,
        OutKind, ShaderProfile, ShaderType,
    };
    pub use crate::glslang::{
        compile_glsl, disassemble, Glslang, GlslangError, Includer, Messages, Program,
        ResourceLimits, Shader, ShaderInput, SpvOptions, Stage,
    };
}
