//! Built-in resource limits (`glslang_resource_t`)
//!
//! Carries glslang's default limits and the text configuration format used by
//! `glslangValidator -c`: one `Name value` pair per limit, whitespace separated.

use crate::{GlslangError, Result};
use std::fmt::Write as _;

/// Language feature switches (`glslang_limits_t`)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub non_inductive_for_loops: bool,
    pub while_loops: bool,
    pub do_while_loops: bool,
    pub general_uniform_indexing: bool,
    pub general_attribute_matrix_vector_indexing: bool,
    pub general_varying_indexing: bool,
    pub general_sampler_indexing: bool,
    pub general_variable_indexing: bool,
    pub general_constant_matrix_vector_indexing: bool,
}

impl Limits {
    pub const ALL: Limits = Limits {
        non_inductive_for_loops: true,
        while_loops: true,
        do_while_loops: true,
        general_uniform_indexing: true,
        general_attribute_matrix_vector_indexing: true,
        general_varying_indexing: true,
        general_sampler_indexing: true,
        general_variable_indexing: true,
        general_constant_matrix_vector_indexing: true,
    };

    fn entries(&self) -> [(&'static str, bool); 9] {
        [
            ("nonInductiveForLoops", self.non_inductive_for_loops),
            ("whileLoops", self.while_loops),
            ("doWhileLoops", self.do_while_loops),
            ("generalUniformIndexing", self.general_uniform_indexing),
            (
                "generalAttributeMatrixVectorIndexing",
                self.general_attribute_matrix_vector_indexing,
            ),
            ("generalVaryingIndexing", self.general_varying_indexing),
            ("generalSamplerIndexing", self.general_sampler_indexing),
            ("generalVariableIndexing", self.general_variable_indexing),
            (
                "generalConstantMatrixVectorIndexing",
                self.general_constant_matrix_vector_indexing,
            ),
        ]
    }

    fn entry_mut(&mut self, key: &str) -> Option<&mut bool> {
        Some(match key {
            "nonInductiveForLoops" => &mut self.non_inductive_for_loops,
            "whileLoops" => &mut self.while_loops,
            "doWhileLoops" => &mut self.do_while_loops,
            "generalUniformIndexing" => &mut self.general_uniform_indexing,
            "generalAttributeMatrixVectorIndexing" => {
                &mut self.general_attribute_matrix_vector_indexing
            }
            "generalVaryingIndexing" => &mut self.general_varying_indexing,
            "generalSamplerIndexing" => &mut self.general_sampler_indexing,
            "generalVariableIndexing" => &mut self.general_variable_indexing,
            "generalConstantMatrixVectorIndexing" => {
                &mut self.general_constant_matrix_vector_indexing
            }
            _ => return None,
        })
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::ALL
    }
}

macro_rules! resource_limits {
    ($($field:ident: $key:literal = $default:expr,)*) => {
        /// Built-in resource limits, field for field in `glslang_resource_t` order
        #[repr(C)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct ResourceLimits {
            $(pub $field: i32,)*
            pub limits: Limits,
        }

        /// glslang's default limits
        pub const DEFAULT_RESOURCE_LIMITS: ResourceLimits = ResourceLimits {
            $($field: $default,)*
            limits: Limits::ALL,
        };

        impl ResourceLimits {
            fn entries(&self) -> Vec<(&'static str, i32)> {
                vec![$(($key, self.$field)),*]
            }

            fn entry_mut(&mut self, key: &str) -> Option<&mut i32> {
                match key {
                    $($key => Some(&mut self.$field),)*
                    _ => None,
                }
            }
        }
    };
}

resource_limits! {
    max_lights: "MaxLights" = 32,
    max_clip_planes: "MaxClipPlanes" = 6,
    max_texture_units: "MaxTextureUnits" = 32,
    max_texture_coords: "MaxTextureCoords" = 32,
    max_vertex_attribs: "MaxVertexAttribs" = 64,
    max_vertex_uniform_components: "MaxVertexUniformComponents" = 4096,
    max_varying_floats: "MaxVaryingFloats" = 64,
    max_vertex_texture_image_units: "MaxVertexTextureImageUnits" = 32,
    max_combined_texture_image_units: "MaxCombinedTextureImageUnits" = 80,
    max_texture_image_units: "MaxTextureImageUnits" = 32,
    max_fragment_uniform_components: "MaxFragmentUniformComponents" = 4096,
    max_draw_buffers: "MaxDrawBuffers" = 32,
    max_vertex_uniform_vectors: "MaxVertexUniformVectors" = 128,
    max_varying_vectors: "MaxVaryingVectors" = 8,
    max_fragment_uniform_vectors: "MaxFragmentUniformVectors" = 16,
    max_vertex_output_vectors: "MaxVertexOutputVectors" = 16,
    max_fragment_input_vectors: "MaxFragmentInputVectors" = 15,
    min_program_texel_offset: "MinProgramTexelOffset" = -8,
    max_program_texel_offset: "MaxProgramTexelOffset" = 7,
    max_clip_distances: "MaxClipDistances" = 8,
    max_compute_work_group_count_x: "MaxComputeWorkGroupCountX" = 65535,
    max_compute_work_group_count_y: "MaxComputeWorkGroupCountY" = 65535,
    max_compute_work_group_count_z: "MaxComputeWorkGroupCountZ" = 65535,
    max_compute_work_group_size_x: "MaxComputeWorkGroupSizeX" = 1024,
    max_compute_work_group_size_y: "MaxComputeWorkGroupSizeY" = 1024,
    max_compute_work_group_size_z: "MaxComputeWorkGroupSizeZ" = 64,
    max_compute_uniform_components: "MaxComputeUniformComponents" = 1024,
    max_compute_texture_image_units: "MaxComputeTextureImageUnits" = 16,
    max_compute_image_uniforms: "MaxComputeImageUniforms" = 8,
    max_compute_atomic_counters: "MaxComputeAtomicCounters" = 8,
    max_compute_atomic_counter_buffers: "MaxComputeAtomicCounterBuffers" = 1,
    max_varying_components: "MaxVaryingComponents" = 60,
    max_vertex_output_components: "MaxVertexOutputComponents" = 64,
    max_geometry_input_components: "MaxGeometryInputComponents" = 64,
    max_geometry_output_components: "MaxGeometryOutputComponents" = 128,
    max_fragment_input_components: "MaxFragmentInputComponents" = 128,
    max_image_units: "MaxImageUnits" = 8,
    max_combined_image_units_and_fragment_outputs: "MaxCombinedImageUnitsAndFragmentOutputs" = 8,
    max_combined_shader_output_resources: "MaxCombinedShaderOutputResources" = 8,
    max_image_samples: "MaxImageSamples" = 0,
    max_vertex_image_uniforms: "MaxVertexImageUniforms" = 0,
    max_tess_control_image_uniforms: "MaxTessControlImageUniforms" = 0,
    max_tess_evaluation_image_uniforms: "MaxTessEvaluationImageUniforms" = 0,
    max_geometry_image_uniforms: "MaxGeometryImageUniforms" = 0,
    max_fragment_image_uniforms: "MaxFragmentImageUniforms" = 8,
    max_combined_image_uniforms: "MaxCombinedImageUniforms" = 8,
    max_geometry_texture_image_units: "MaxGeometryTextureImageUnits" = 16,
    max_geometry_output_vertices: "MaxGeometryOutputVertices" = 256,
    max_geometry_total_output_components: "MaxGeometryTotalOutputComponents" = 1024,
    max_geometry_uniform_components: "MaxGeometryUniformComponents" = 1024,
    max_geometry_varying_components: "MaxGeometryVaryingComponents" = 64,
    max_tess_control_input_components: "MaxTessControlInputComponents" = 128,
    max_tess_control_output_components: "MaxTessControlOutputComponents" = 128,
    max_tess_control_texture_image_units: "MaxTessControlTextureImageUnits" = 16,
    max_tess_control_uniform_components: "MaxTessControlUniformComponents" = 1024,
    max_tess_control_total_output_components: "MaxTessControlTotalOutputComponents" = 4096,
    max_tess_evaluation_input_components: "MaxTessEvaluationInputComponents" = 128,
    max_tess_evaluation_output_components: "MaxTessEvaluationOutputComponents" = 128,
    max_tess_evaluation_texture_image_units: "MaxTessEvaluationTextureImageUnits" = 16,
    max_tess_evaluation_uniform_components: "MaxTessEvaluationUniformComponents" = 1024,
    max_tess_patch_components: "MaxTessPatchComponents" = 120,
    max_patch_vertices: "MaxPatchVertices" = 32,
    max_tess_gen_level: "MaxTessGenLevel" = 64,
    max_viewports: "MaxViewports" = 16,
    max_vertex_atomic_counters: "MaxVertexAtomicCounters" = 0,
    max_tess_control_atomic_counters: "MaxTessControlAtomicCounters" = 0,
    max_tess_evaluation_atomic_counters: "MaxTessEvaluationAtomicCounters" = 0,
    max_geometry_atomic_counters: "MaxGeometryAtomicCounters" = 0,
    max_fragment_atomic_counters: "MaxFragmentAtomicCounters" = 8,
    max_combined_atomic_counters: "MaxCombinedAtomicCounters" = 8,
    max_atomic_counter_bindings: "MaxAtomicCounterBindings" = 1,
    max_vertex_atomic_counter_buffers: "MaxVertexAtomicCounterBuffers" = 0,
    max_tess_control_atomic_counter_buffers: "MaxTessControlAtomicCounterBuffers" = 0,
    max_tess_evaluation_atomic_counter_buffers: "MaxTessEvaluationAtomicCounterBuffers" = 0,
    max_geometry_atomic_counter_buffers: "MaxGeometryAtomicCounterBuffers" = 0,
    max_fragment_atomic_counter_buffers: "MaxFragmentAtomicCounterBuffers" = 1,
    max_combined_atomic_counter_buffers: "MaxCombinedAtomicCounterBuffers" = 1,
    max_atomic_counter_buffer_size: "MaxAtomicCounterBufferSize" = 16384,
    max_transform_feedback_buffers: "MaxTransformFeedbackBuffers" = 4,
    max_transform_feedback_interleaved_components: "MaxTransformFeedbackInterleavedComponents" = 64,
    max_cull_distances: "MaxCullDistances" = 8,
    max_combined_clip_and_cull_distances: "MaxCombinedClipAndCullDistances" = 8,
    max_samples: "MaxSamples" = 4,
    max_mesh_output_vertices_nv: "MaxMeshOutputVerticesNV" = 256,
    max_mesh_output_primitives_nv: "MaxMeshOutputPrimitivesNV" = 512,
    max_mesh_work_group_size_x_nv: "MaxMeshWorkGroupSizeX_NV" = 32,
    max_mesh_work_group_size_y_nv: "MaxMeshWorkGroupSizeY_NV" = 1,
    max_mesh_work_group_size_z_nv: "MaxMeshWorkGroupSizeZ_NV" = 1,
    max_task_work_group_size_x_nv: "MaxTaskWorkGroupSizeX_NV" = 32,
    max_task_work_group_size_y_nv: "MaxTaskWorkGroupSizeY_NV" = 1,
    max_task_work_group_size_z_nv: "MaxTaskWorkGroupSizeZ_NV" = 1,
    max_mesh_view_count_nv: "MaxMeshViewCountNV" = 4,
    max_mesh_output_vertices_ext: "MaxMeshOutputVerticesEXT" = 256,
    max_mesh_output_primitives_ext: "MaxMeshOutputPrimitivesEXT" = 256,
    max_mesh_work_group_size_x_ext: "MaxMeshWorkGroupSizeX_EXT" = 128,
    max_mesh_work_group_size_y_ext: "MaxMeshWorkGroupSizeY_EXT" = 128,
    max_mesh_work_group_size_z_ext: "MaxMeshWorkGroupSizeZ_EXT" = 128,
    max_task_work_group_size_x_ext: "MaxTaskWorkGroupSizeX_EXT" = 128,
    max_task_work_group_size_y_ext: "MaxTaskWorkGroupSizeY_EXT" = 128,
    max_task_work_group_size_z_ext: "MaxTaskWorkGroupSizeZ_EXT" = 128,
    max_mesh_view_count_ext: "MaxMeshViewCountEXT" = 4,
    max_dual_source_draw_buffers_ext: "MaxDualSourceDrawBuffersEXT" = 1,
}

static DEFAULT_STATIC: ResourceLimits = DEFAULT_RESOURCE_LIMITS;

impl Default for ResourceLimits {
    fn default() -> Self {
        DEFAULT_RESOURCE_LIMITS
    }
}

impl ResourceLimits {
    /// Shared default with a stable address, for handing to C
    pub fn default_ref() -> &'static ResourceLimits {
        &DEFAULT_STATIC
    }

    /// Parse a configuration on top of the default limits
    pub fn decode(config: &str) -> Result<Self> {
        let mut limits = Self::default();
        limits.decode_into(config)?;
        Ok(limits)
    }

    /// Apply the `Name value` pairs in `config`
    ///
    /// Unknown names are skipped with a warning. A name without a numeric value stops
    /// decoding with an error; pairs before it stay applied.
    pub fn decode_into(&mut self, config: &str) -> Result<()> {
        let mut tokens = config.split_whitespace();

        while let Some(name) = tokens.next() {
            let value = tokens
                .next()
                .filter(|v| v.starts_with('-') || v.starts_with(|c: char| c.is_ascii_digit()))
                .ok_or_else(|| {
                    GlslangError::ResourceConfig(format!(
                        "'{}' must be followed by one number",
                        name
                    ))
                })?;
            let value = parse_leading_int(value);

            if let Some(slot) = self.entry_mut(name) {
                *slot = value;
            } else if let Some(flag) = self.limits.entry_mut(name) {
                *flag = value != 0;
            } else {
                log::warn!("Unrecognized resource limit '{}' in configuration", name);
            }
        }

        Ok(())
    }

    /// Render every limit in configuration format
    pub fn to_config_string(&self) -> String {
        let mut out = String::new();
        for (name, value) in self.entries() {
            let _ = writeln!(out, "{} {}", name, value);
        }
        for (name, value) in self.limits.entries() {
            let _ = writeln!(out, "{} {}", name, value as i32);
        }
        out
    }
}

// atoi semantics: optional sign, then digits up to the first non-digit.
fn parse_leading_int(text: &str) -> i32 {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = digits
        .chars()
        .map_while(|c| c.to_digit(10))
        .fold(0i64, |acc, d| (acc * 10 + d as i64).min(i64::from(i32::MAX) + 1));
    let value = if negative { -magnitude } else { magnitude };
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
