//! glslang adapter
//!
//! Loads glslang's C interface at runtime and wraps it in owned handles:
//!
//! - [`Glslang`] holds the resolved [`GlslangApi`] function table
//! - [`ShaderInput`] owns every string, limit table and includer glslang keeps pointers to
//! - [`Shader`] and [`Program`] forward one-to-one to the C entry points
//! - [`compile_glsl`] runs preprocess, parse, link and SPIR-V generation in one call
//! - [`disassemble`] turns SPIR-V words back into text

pub mod ffi;
pub mod resource;
pub mod types;

mod disassemble;
mod input;
mod library;
mod program;
mod shader;

pub use disassemble::{disassemble, disassemble_bytes};
pub use ffi::{GlslangApi, SpvOptions};
pub use input::{DirectoryIncluder, IncludedSource, Includer, ShaderInput};
pub use library::{compile_glsl, Glslang, ProcessGuard};
pub use program::Program;
pub use resource::{Limits, ResourceLimits, DEFAULT_RESOURCE_LIMITS};
pub use shader::Shader;
pub use types::{
    Client, ClientVersion, IncludeKind, Messages, Profile, ResourceType, ShaderOptions,
    SourceLanguage, Stage, TargetLanguage, TargetLanguageVersion,
};

use shaderbridge_core::BridgeError;

/// Result type for glslang operations
pub type Result<T> = std::result::Result<T, GlslangError>;

/// Errors that can occur while driving glslang
#[derive(Debug, thiserror::Error)]
pub enum GlslangError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("glslang process initialization failed")]
    Process,

    #[error("glslang returned a null {0} handle")]
    NullHandle(&'static str),

    #[error("Preprocessing failed:\n{log}")]
    Preprocess { log: String },

    #[error("Parsing failed:\n{log}")]
    Parse { log: String },

    #[error("Linking failed:\n{log}")]
    Link { log: String },

    #[error("I/O mapping failed:\n{log}")]
    MapIo { log: String },

    #[error("Program has no linked {0:?} shader")]
    MissingStage(Stage),

    #[error("Invalid resource limits: {0}")]
    ResourceConfig(String),
}
