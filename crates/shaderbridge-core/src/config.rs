//! Where the wrapped compiler libraries are loaded from

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable overriding the DXC library location
pub const DXC_PATH_ENV: &str = "SHADERBRIDGE_DXC_PATH";
/// Environment variable overriding the glslang library location
pub const GLSLANG_PATH_ENV: &str = "SHADERBRIDGE_GLSLANG_PATH";

pub const DXC_LIBRARY_NAME: &str = "dxcompiler";
pub const GLSLANG_LIBRARY_NAME: &str = "glslang";

// Distribution packages often ship only the versioned soname.
#[cfg(all(unix, not(target_os = "macos")))]
const GLSLANG_VERSIONED: &[&str] = &["libglslang.so.16", "libglslang.so.15"];
#[cfg(not(all(unix, not(target_os = "macos"))))]
const GLSLANG_VERSIONED: &[&str] = &[];

/// Native library locations
///
/// A configured path may name the library itself or the directory containing it.
/// Unset paths fall back to the platform file name, resolved by the system loader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeConfig {
    pub dxc_library: Option<PathBuf>,
    pub glslang_library: Option<PathBuf>,
}

impl BridgeConfig {
    /// Read overrides from `SHADERBRIDGE_DXC_PATH` and `SHADERBRIDGE_GLSLANG_PATH`
    pub fn from_env() -> Self {
        let read = |key: &str| {
            std::env::var_os(key)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        };

        Self {
            dxc_library: read(DXC_PATH_ENV),
            glslang_library: read(GLSLANG_PATH_ENV),
        }
    }

    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::new()
    }

    /// Paths to try, in order, when loading DXC
    pub fn dxc_candidates(&self) -> Vec<PathBuf> {
        candidates(self.dxc_library.as_deref(), DXC_LIBRARY_NAME, &[])
    }

    /// Paths to try, in order, when loading glslang
    pub fn glslang_candidates(&self) -> Vec<PathBuf> {
        candidates(
            self.glslang_library.as_deref(),
            GLSLANG_LIBRARY_NAME,
            GLSLANG_VERSIONED,
        )
    }
}

fn candidates(explicit: Option<&Path>, name: &str, fallbacks: &[&str]) -> Vec<PathBuf> {
    let file_name = PathBuf::from(platform_file_name(name));

    match explicit {
        Some(path) if path.is_dir() => std::iter::once(path.join(&file_name))
            .chain(fallbacks.iter().map(|f| path.join(f)))
            .collect(),
        Some(path) => vec![path.to_path_buf()],
        None => std::iter::once(file_name)
            .chain(fallbacks.iter().map(PathBuf::from))
            .collect(),
    }
}

/// `dxcompiler` -> `libdxcompiler.so` / `dxcompiler.dll` / `libdxcompiler.dylib`
pub fn platform_file_name(name: &str) -> OsString {
    libloading::library_filename(name)
}

/// Builder for [`BridgeConfig`]
#[derive(Debug)]
pub struct BridgeConfigBuilder {
    config: BridgeConfig,
}

impl BridgeConfigBuilder {
    /// Start from the environment
    pub fn new() -> Self {
        Self {
            config: BridgeConfig::from_env(),
        }
    }

    pub fn with_dxc_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.dxc_library = Some(path.into());
        self
    }

    pub fn with_glslang_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.glslang_library = Some(path.into());
        self
    }

    pub fn build(self) -> BridgeConfig {
        self.config
    }
}

impl Default for BridgeConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
