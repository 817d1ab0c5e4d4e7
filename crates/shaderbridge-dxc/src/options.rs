//! Typed compiler options rendered into a DXC argument vector

use crate::{DxcError, Result};
use std::fmt;
use std::str::FromStr;

/// Pipeline stage a profile targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderType {
    Vertex,
    Pixel,
    Domain,
    Hull,
    Mesh,
    Amplification,
    Library,
    Geometry,
    Compute,
}

impl ShaderType {
    pub const ALL: [ShaderType; 9] = [
        ShaderType::Vertex,
        ShaderType::Pixel,
        ShaderType::Domain,
        ShaderType::Hull,
        ShaderType::Mesh,
        ShaderType::Amplification,
        ShaderType::Library,
        ShaderType::Geometry,
        ShaderType::Compute,
    ];

    pub fn abbreviation(self) -> &'static str {
        match self {
            ShaderType::Vertex => "vs",
            ShaderType::Pixel => "ps",
            ShaderType::Domain => "ds",
            ShaderType::Hull => "hs",
            ShaderType::Mesh => "ms",
            ShaderType::Amplification => "as",
            ShaderType::Library => "lib",
            ShaderType::Geometry => "gs",
            ShaderType::Compute => "cs",
        }
    }

    /// Lowest shader model supporting this stage, as `(major, minor)`
    pub fn minimum_model(self) -> (u32, u32) {
        match self {
            ShaderType::Vertex | ShaderType::Pixel | ShaderType::Geometry | ShaderType::Compute => {
                (4, 0)
            }
            ShaderType::Domain | ShaderType::Hull => (5, 0),
            ShaderType::Library => (5, 1),
            ShaderType::Mesh | ShaderType::Amplification => (6, 0),
        }
    }
}

/// Target profile such as `ps_6_0`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderProfile {
    pub ty: ShaderType,
    pub major: u32,
    pub minor: u32,
}

impl ShaderProfile {
    pub fn new(ty: ShaderType, major: u32, minor: u32) -> Self {
        Self { ty, major, minor }
    }

    pub fn is_valid(&self) -> bool {
        let (min_major, min_minor) = self.ty.minimum_model();
        (self.major, self.minor) >= (min_major, min_minor)
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            return Ok(());
        }
        let (min_major, min_minor) = self.ty.minimum_model();
        Err(DxcError::InvalidProfile(format!(
            "{:?} shaders need shader model {}.{} or later, got {}.{}",
            self.ty, min_major, min_minor, self.major, self.minor
        )))
    }
}

impl fmt::Display for ShaderProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.ty.abbreviation(), self.major, self.minor)
    }
}

impl FromStr for ShaderProfile {
    type Err = DxcError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DxcError::InvalidProfile(format!("cannot parse profile '{}'", s));

        let mut parts = s.split('_');
        let (Some(stage), Some(major), Some(minor), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let ty = ShaderType::ALL
            .into_iter()
            .find(|ty| ty.abbreviation() == stage)
            .ok_or_else(invalid)?;
        let major = major.parse().map_err(|_| invalid())?;
        let minor = minor.parse().map_err(|_| invalid())?;
        Ok(Self::new(ty, major, minor))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationLevel {
    O0,
    O1,
    O2,
    O3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugInfo {
    /// `-Zi`
    Full,
    /// `-Zs`
    Slim,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixPacking {
    ColumnMajor,
    RowMajor,
}

/// HLSL language version (`-HV`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageVersion {
    Hlsl2016,
    Hlsl2017,
    Hlsl2018,
    Hlsl2021,
}

impl LanguageVersion {
    fn as_arg(self) -> &'static str {
        match self {
            LanguageVersion::Hlsl2016 => "2016",
            LanguageVersion::Hlsl2017 => "2017",
            LanguageVersion::Hlsl2018 => "2018",
            LanguageVersion::Hlsl2021 => "2021",
        }
    }
}

/// Options for one DXC compilation
///
/// Sources are always passed as UTF-8, so `-encoding utf8` is always emitted.
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    pub entry_point: String,
    pub profile: ShaderProfile,
    pub language_version: Option<LanguageVersion>,
    pub optimization: Option<OptimizationLevel>,
    pub disable_optimization: bool,
    pub debug_info: Option<DebugInfo>,
    pub embed_debug: bool,
    pub matrix_packing: Option<MatrixPacking>,
    pub warnings_as_errors: bool,
    pub suppress_warnings: bool,
    pub disable_validation: bool,
    pub enable_16bit_types: bool,
    pub all_resources_bound: bool,
    pub strip_debug: bool,
    pub strip_reflection: bool,
    pub strip_root_signature: bool,
    /// Emit SPIR-V instead of DXIL
    pub spirv: bool,
    /// `-fspv-target-env=`, e.g. `vulkan1.2`
    pub spirv_target_env: Option<String>,
    pub invert_y: bool,
    pub use_dx_layout: bool,
    macros: Vec<(String, Option<String>)>,
    warnings: Vec<(String, bool)>,
    extra_args: Vec<String>,
}

impl CompilerOptions {
    pub fn new(profile: ShaderProfile) -> Self {
        Self {
            entry_point: "main".to_string(),
            profile,
            language_version: None,
            optimization: None,
            disable_optimization: false,
            debug_info: None,
            embed_debug: false,
            matrix_packing: None,
            warnings_as_errors: false,
            suppress_warnings: false,
            disable_validation: false,
            enable_16bit_types: false,
            all_resources_bound: false,
            strip_debug: false,
            strip_reflection: false,
            strip_root_signature: false,
            spirv: false,
            spirv_target_env: None,
            invert_y: false,
            use_dx_layout: false,
            macros: Vec::new(),
            warnings: Vec::new(),
            extra_args: Vec::new(),
        }
    }

    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    pub fn with_language_version(mut self, version: LanguageVersion) -> Self {
        self.language_version = Some(version);
        self
    }

    pub fn with_optimization(mut self, level: OptimizationLevel) -> Self {
        self.optimization = Some(level);
        self
    }

    pub fn with_debug_info(mut self, debug_info: DebugInfo) -> Self {
        self.debug_info = Some(debug_info);
        self
    }

    pub fn with_matrix_packing(mut self, packing: MatrixPacking) -> Self {
        self.matrix_packing = Some(packing);
        self
    }

    /// Target SPIR-V, optionally for a specific environment
    pub fn with_spirv(mut self, target_env: Option<&str>) -> Self {
        self.spirv = true;
        self.spirv_target_env = target_env.map(str::to_string);
        self
    }

    /// `-D name=value`, replacing an earlier definition of `name`
    pub fn with_macro(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_macro(name.into(), Some(value.into()));
        self
    }

    /// `-D name`
    pub fn with_define(mut self, name: impl Into<String>) -> Self {
        self.set_macro(name.into(), None);
        self
    }

    pub fn remove_macro(&mut self, name: &str) {
        self.macros.retain(|(existing, _)| existing != name);
    }

    /// `-W<name>` or `-Wno-<name>`
    pub fn with_warning(mut self, name: impl Into<String>, enabled: bool) -> Self {
        let name = name.into();
        self.warnings.retain(|(existing, _)| *existing != name);
        self.warnings.push((name, enabled));
        self
    }

    /// Pass an argument through verbatim
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    fn set_macro(&mut self, name: String, value: Option<String>) {
        match self.macros.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.macros.push((name, value)),
        }
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-E".to_string(),
            self.entry_point.clone(),
            "-T".to_string(),
            self.profile.to_string(),
            "-encoding".to_string(),
            "utf8".to_string(),
        ];
        let mut flag = |enabled: bool, name: &str| {
            if enabled {
                args.push(name.to_string());
            }
        };

        flag(self.all_resources_bound, "-all-resources-bound");
        flag(self.enable_16bit_types, "-enable-16bit-types");
        flag(self.disable_optimization, "-Od");
        flag(self.embed_debug, "-Qembed_debug");
        flag(self.strip_debug, "-Qstrip_debug");
        flag(self.strip_reflection, "-Qstrip_reflect");
        flag(self.strip_root_signature, "-Qstrip_rootsignature");
        flag(self.disable_validation, "-Vd");
        flag(self.warnings_as_errors, "-WX");
        flag(self.suppress_warnings, "-no-warnings");
        flag(self.spirv, "-spirv");
        flag(self.invert_y, "-fvk-invert-y");
        flag(self.use_dx_layout, "-fvk-use-dx-layout");

        if let Some(version) = self.language_version {
            args.push("-HV".to_string());
            args.push(version.as_arg().to_string());
        }
        if let Some(level) = self.optimization {
            args.push(
                match level {
                    OptimizationLevel::O0 => "-O0",
                    OptimizationLevel::O1 => "-O1",
                    OptimizationLevel::O2 => "-O2",
                    OptimizationLevel::O3 => "-O3",
                }
                .to_string(),
            );
        }
        if let Some(debug_info) = self.debug_info {
            args.push(match debug_info {
                DebugInfo::Full => "-Zi".to_string(),
                DebugInfo::Slim => "-Zs".to_string(),
            });
        }
        if let Some(packing) = self.matrix_packing {
            args.push(match packing {
                MatrixPacking::ColumnMajor => "-Zpc".to_string(),
                MatrixPacking::RowMajor => "-Zpr".to_string(),
            });
        }
        if let Some(env) = self.spirv_target_env.as_deref() {
            args.push(format!("-fspv-target-env={}", env));
        }

        for (name, value) in &self.macros {
            args.push("-D".to_string());
            args.push(match value {
                Some(value) => format!("{}={}", name, value),
                None => name.clone(),
            });
        }
        for (name, enabled) in &self.warnings {
            let prefix = if *enabled { "-W" } else { "-Wno-" };
            args.push(format!("{}{}", prefix, name));
        }
        args.extend(self.extra_args.iter().cloned());

        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_formats_like_dxc_targets() {
        assert_eq!(ShaderProfile::new(ShaderType::Pixel, 6, 0).to_string(), "ps_6_0");
        assert_eq!(ShaderProfile::new(ShaderType::Library, 6, 3).to_string(), "lib_6_3");
        assert_eq!(
            "as_6_5".parse::<ShaderProfile>().unwrap(),
            ShaderProfile::new(ShaderType::Amplification, 6, 5)
        );
        assert!("ps_6".parse::<ShaderProfile>().is_err());
        assert!("xs_6_0".parse::<ShaderProfile>().is_err());
    }

    #[test]
    fn profiles_below_the_stage_minimum_are_rejected() {
        assert!(ShaderProfile::new(ShaderType::Vertex, 4, 0).is_valid());
        assert!(ShaderProfile::new(ShaderType::Hull, 5, 0).is_valid());
        assert!(!ShaderProfile::new(ShaderType::Hull, 4, 1).is_valid());
        assert!(!ShaderProfile::new(ShaderType::Library, 5, 0).is_valid());
        assert!(matches!(
            ShaderProfile::new(ShaderType::Mesh, 5, 1).validate(),
            Err(DxcError::InvalidProfile(_))
        ));
    }

    #[test]
    fn minimal_options_name_entry_point_and_target() {
        let options = CompilerOptions::new(ShaderProfile::new(ShaderType::Vertex, 6, 0));
        assert_eq!(
            options.to_args(),
            ["-E", "main", "-T", "vs_6_0", "-encoding", "utf8"]
        );
    }

    #[test]
    fn options_render_flags_macros_and_warnings() {
        let options = CompilerOptions::new(ShaderProfile::new(ShaderType::Compute, 6, 6))
            .with_entry_point("cs_main")
            .with_optimization(OptimizationLevel::O3)
            .with_debug_info(DebugInfo::Full)
            .with_spirv(Some("vulkan1.2"))
            .with_macro("TILE_SIZE", "16")
            .with_macro("TILE_SIZE", "32")
            .with_define("USE_LDS")
            .with_warning("unused-value", false)
            .with_arg("-fspv-reflect");
        let args = options.to_args();

        let pos = |needle: &str| args.iter().position(|a| a == needle);
        assert_eq!(&args[..4], ["-E", "cs_main", "-T", "cs_6_6"]);
        assert!(pos("-spirv").is_some());
        assert!(pos("-O3").is_some());
        assert!(pos("-Zi").is_some());
        assert!(pos("-fspv-target-env=vulkan1.2").is_some());
        assert!(pos("-Wno-unused-value").is_some());
        assert_eq!(args.last().map(String::as_str), Some("-fspv-reflect"));

        let d = pos("TILE_SIZE=32").unwrap();
        assert_eq!(args[d - 1], "-D");
        assert!(pos("TILE_SIZE=16").is_none());
        assert!(pos("USE_LDS").is_some());
    }

    #[test]
    fn removed_macros_are_not_emitted() {
        let mut options = CompilerOptions::new(ShaderProfile::new(ShaderType::Pixel, 6, 0))
            .with_macro("SHADOWS", "1");
        options.remove_macro("SHADOWS");
        assert!(!options.to_args().iter().any(|a| a.starts_with("SHADOWS")));
    }
}
