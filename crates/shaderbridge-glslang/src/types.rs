//! glslang enumerations and flag sets
//!
//! Values match `glslang_c_shader_types.h`.

use bitflags::bitflags;

/// Shader stage (`glslang_stage_t`)
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Vertex = 0,
    TessControl = 1,
    TessEvaluation = 2,
    Geometry = 3,
    Fragment = 4,
    Compute = 5,
    RayGen = 6,
    Intersect = 7,
    AnyHit = 8,
    ClosestHit = 9,
    Miss = 10,
    Callable = 11,
    Task = 12,
    Mesh = 13,
}

impl Stage {
    /// Stage implied by a conventional file extension (`.vert`, `.frag`, ...)
    pub fn from_extension(extension: &str) -> Option<Self> {
        Some(match extension {
            "vert" => Stage::Vertex,
            "tesc" => Stage::TessControl,
            "tese" => Stage::TessEvaluation,
            "geom" => Stage::Geometry,
            "frag" => Stage::Fragment,
            "comp" => Stage::Compute,
            "rgen" => Stage::RayGen,
            "rint" => Stage::Intersect,
            "rahit" => Stage::AnyHit,
            "rchit" => Stage::ClosestHit,
            "rmiss" => Stage::Miss,
            "rcall" => Stage::Callable,
            "task" => Stage::Task,
            "mesh" => Stage::Mesh,
            _ => return None,
        })
    }
}

/// Source language (`glslang_source_t`)
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceLanguage {
    None = 0,
    Glsl = 1,
    Hlsl = 2,
}

/// Client API (`glslang_client_t`)
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Client {
    None = 0,
    Vulkan = 1,
    OpenGl = 2,
}

/// Client API version (`glslang_target_client_version_t`)
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientVersion {
    Vulkan1_0 = 1 << 22,
    Vulkan1_1 = (1 << 22) | (1 << 12),
    Vulkan1_2 = (1 << 22) | (2 << 12),
    Vulkan1_3 = (1 << 22) | (3 << 12),
    Vulkan1_4 = (1 << 22) | (4 << 12),
    OpenGl450 = 450,
}

/// Target language (`glslang_target_language_t`)
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetLanguage {
    None = 0,
    Spirv = 1,
}

/// SPIR-V version (`glslang_target_language_version_t`)
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetLanguageVersion {
    Spirv1_0 = 1 << 16,
    Spirv1_1 = (1 << 16) | (1 << 8),
    Spirv1_2 = (1 << 16) | (2 << 8),
    Spirv1_3 = (1 << 16) | (3 << 8),
    Spirv1_4 = (1 << 16) | (4 << 8),
    Spirv1_5 = (1 << 16) | (5 << 8),
    Spirv1_6 = (1 << 16) | (6 << 8),
}

impl ClientVersion {
    /// Newest SPIR-V version the client version guarantees
    pub fn default_spirv_version(self) -> TargetLanguageVersion {
        match self {
            ClientVersion::Vulkan1_0 | ClientVersion::OpenGl450 => TargetLanguageVersion::Spirv1_0,
            ClientVersion::Vulkan1_1 => TargetLanguageVersion::Spirv1_3,
            ClientVersion::Vulkan1_2 => TargetLanguageVersion::Spirv1_5,
            ClientVersion::Vulkan1_3 | ClientVersion::Vulkan1_4 => TargetLanguageVersion::Spirv1_6,
        }
    }
}

/// Binding shift targets (`glslang_resource_type_t`)
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Sampler = 0,
    Texture = 1,
    Image = 2,
    Ubo = 3,
    Ssbo = 4,
    Uav = 5,
}

/// Kind of `#include` being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncludeKind {
    /// `#include <file>`
    System,
    /// `#include "file"`
    Local,
}

bitflags! {
    /// Compiler message controls (`glslang_messages_t`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Messages: i32 {
        const DEFAULT = 0;
        const RELAXED_ERRORS = 1 << 0;
        const SUPPRESS_WARNINGS = 1 << 1;
        const AST = 1 << 2;
        const SPV_RULES = 1 << 3;
        const VULKAN_RULES = 1 << 4;
        const ONLY_PREPROCESSOR = 1 << 5;
        const READ_HLSL = 1 << 6;
        const CASCADING_ERRORS = 1 << 7;
        const KEEP_UNCALLED = 1 << 8;
        const HLSL_OFFSETS = 1 << 9;
        const DEBUG_INFO = 1 << 10;
        const HLSL_ENABLE_16BIT_TYPES = 1 << 11;
        const HLSL_LEGALIZATION = 1 << 12;
        const HLSL_DX9_COMPATIBLE = 1 << 13;
        const BUILTIN_SYMBOL_TABLE = 1 << 14;
        const ENHANCED = 1 << 15;
    }
}

bitflags! {
    /// GLSL profile (`glslang_profile_t`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Profile: i32 {
        const BAD = 0;
        const NONE = 1 << 0;
        const CORE = 1 << 1;
        const COMPATIBILITY = 1 << 2;
        const ES = 1 << 3;
    }
}

bitflags! {
    /// Shader object options (`glslang_shader_options_t`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderOptions: i32 {
        const DEFAULT = 0;
        const AUTO_MAP_BINDINGS = 1 << 0;
        const AUTO_MAP_LOCATIONS = 1 << 1;
        const VULKAN_RULES_RELAXED = 1 << 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_encodings_match_the_c_header() {
        assert_eq!(ClientVersion::Vulkan1_0 as i32, 4_194_304);
        assert_eq!(ClientVersion::Vulkan1_2 as i32, 4_202_496);
        assert_eq!(TargetLanguageVersion::Spirv1_0 as i32, 0x0001_0000);
        assert_eq!(TargetLanguageVersion::Spirv1_5 as i32, 0x0001_0500);
        assert_eq!(
            ClientVersion::Vulkan1_1.default_spirv_version(),
            TargetLanguageVersion::Spirv1_3
        );
    }

    #[test]
    fn message_bits_combine() {
        let messages = Messages::SPV_RULES | Messages::VULKAN_RULES;
        assert_eq!(messages.bits(), 24);
        assert_eq!(Profile::ES.bits(), 8);
        assert_eq!(ShaderOptions::VULKAN_RULES_RELAXED.bits(), 4);
    }

    #[test]
    fn stages_follow_file_extensions() {
        assert_eq!(Stage::from_extension("frag"), Some(Stage::Fragment));
        assert_eq!(Stage::from_extension("mesh"), Some(Stage::Mesh));
        assert_eq!(Stage::Mesh as i32, 13);
        assert_eq!(Stage::from_extension("hlsl"), None);
    }
}
