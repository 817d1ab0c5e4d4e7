//! Shader input and `#include` resolution

use crate::ffi::{GlslangInput, IncludeCallbacks, IncludeResultRaw};
use crate::resource::ResourceLimits;
use crate::types::{
    Client, ClientVersion, IncludeKind, Messages, Profile, SourceLanguage, Stage, TargetLanguage,
    TargetLanguageVersion,
};
use crate::Result;
use shaderbridge_core::{wide, BridgeError};
use std::ffi::{c_void, CString};
use std::os::raw::{c_char, c_int};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::ptr;

/// A resolved include
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludedSource {
    /// Name glslang reports for the included file (used in `#line` and diagnostics)
    pub name: String,
    pub data: Vec<u8>,
}

/// Resolves `#include` directives during preprocessing
pub trait Includer {
    /// `includer` is the name of the file containing the directive and `depth` its
    /// nesting level. `None` fails the directive.
    fn include(
        &mut self,
        kind: IncludeKind,
        header: &str,
        includer: &str,
        depth: usize,
    ) -> Option<IncludedSource>;
}

impl<F> Includer for F
where
    F: FnMut(IncludeKind, &str, &str, usize) -> Option<IncludedSource>,
{
    fn include(
        &mut self,
        kind: IncludeKind,
        header: &str,
        includer: &str,
        depth: usize,
    ) -> Option<IncludedSource> {
        self(kind, header, includer, depth)
    }
}

/// Searches a list of directories
///
/// Local includes are tried next to the including file first.
#[derive(Debug, Clone, Default)]
pub struct DirectoryIncluder {
    dirs: Vec<PathBuf>,
}

impl DirectoryIncluder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dirs.push(dir.into());
        self
    }

    fn read(path: &Path) -> Option<IncludedSource> {
        let data = std::fs::read(path).ok()?;
        Some(IncludedSource {
            name: path.to_string_lossy().into_owned(),
            data,
        })
    }
}

impl Includer for DirectoryIncluder {
    fn include(
        &mut self,
        kind: IncludeKind,
        header: &str,
        includer: &str,
        _depth: usize,
    ) -> Option<IncludedSource> {
        if kind == IncludeKind::Local {
            let sibling = Path::new(includer)
                .parent()
                .map_or_else(|| PathBuf::from(header), |dir| dir.join(header));
            if let Some(source) = Self::read(&sibling) {
                return Some(source);
            }
        }

        self.dirs.iter().find_map(|dir| Self::read(&dir.join(header)))
    }
}

/// Everything `glslang_shader_create` and friends read from `glslang_input_t`
///
/// glslang keeps pointers into the input between preprocessing and parsing, so the
/// source text, entry point names, resource limits and includer are all owned here and
/// the shader owns the input.
pub struct ShaderInput {
    raw: GlslangInput,
    stage: Stage,
    _code: CString,
    entry_point: CString,
    source_entry_point: CString,
    resource: Box<ResourceLimits>,
    includer: Option<Box<Box<dyn Includer>>>,
}

impl ShaderInput {
    /// GLSL for Vulkan 1.0 / SPIR-V 1.0 with default limits
    pub fn new(stage: Stage, source: &str) -> Result<Self> {
        let code = c_string(source)?;
        let entry_point = c_string("main")?;
        let source_entry_point = c_string("main")?;
        let resource = Box::new(ResourceLimits::default());

        let raw = GlslangInput {
            language: SourceLanguage::Glsl as c_int,
            stage: stage as c_int,
            client: Client::Vulkan as c_int,
            client_version: ClientVersion::Vulkan1_0 as c_int,
            target_language: TargetLanguage::Spirv as c_int,
            target_language_version: TargetLanguageVersion::Spirv1_0 as c_int,
            code: code.as_ptr(),
            entrypoint: entry_point.as_ptr(),
            source_entrypoint: source_entry_point.as_ptr(),
            invert_y: false,
            default_version: 100,
            default_profile: Profile::NONE.bits(),
            force_default_version_and_profile: 0,
            forward_compatible: 0,
            messages: Messages::DEFAULT.bits(),
            resource: &*resource,
            callbacks: IncludeCallbacks::default(),
            callbacks_ctx: ptr::null_mut(),
        };

        Ok(Self {
            raw,
            stage,
            _code: code,
            entry_point,
            source_entry_point,
            resource,
            includer: None,
        })
    }

    pub fn with_language(mut self, language: SourceLanguage) -> Self {
        self.raw.language = language as c_int;
        self
    }

    /// Target client; the SPIR-V version follows the client version
    pub fn with_client(mut self, client: Client, version: ClientVersion) -> Self {
        self.raw.client = client as c_int;
        self.raw.client_version = version as c_int;
        self.raw.target_language_version = version.default_spirv_version() as c_int;
        self
    }

    pub fn with_target(mut self, language: TargetLanguage, version: TargetLanguageVersion) -> Self {
        self.raw.target_language = language as c_int;
        self.raw.target_language_version = version as c_int;
        self
    }

    pub fn with_entry_point(mut self, name: &str) -> Result<Self> {
        self.entry_point = c_string(name)?;
        self.raw.entrypoint = self.entry_point.as_ptr();
        Ok(self)
    }

    /// Name of the entry function in the source, renamed to the entry point
    pub fn with_source_entry_point(mut self, name: &str) -> Result<Self> {
        self.source_entry_point = c_string(name)?;
        self.raw.source_entrypoint = self.source_entry_point.as_ptr();
        Ok(self)
    }

    /// Version and profile assumed when the source has no `#version`
    pub fn with_default_version(mut self, version: i32, profile: Profile) -> Self {
        self.raw.default_version = version;
        self.raw.default_profile = profile.bits();
        self
    }

    pub fn with_forced_default_version(mut self, force: bool) -> Self {
        self.raw.force_default_version_and_profile = force as c_int;
        self
    }

    pub fn with_forward_compatible(mut self, forward_compatible: bool) -> Self {
        self.raw.forward_compatible = forward_compatible as c_int;
        self
    }

    pub fn with_invert_y(mut self, invert_y: bool) -> Self {
        self.raw.invert_y = invert_y;
        self
    }

    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.raw.messages = messages.bits();
        self
    }

    pub fn with_resource_limits(mut self, limits: ResourceLimits) -> Self {
        *self.resource = limits;
        self
    }

    pub fn with_includer(mut self, includer: impl Includer + 'static) -> Self {
        let mut includer: Box<Box<dyn Includer>> = Box::new(Box::new(includer));
        self.raw.callbacks = IncludeCallbacks {
            include_system: Some(include_system),
            include_local: Some(include_local),
            free_include_result: Some(free_include_result),
        };
        self.raw.callbacks_ctx = &mut *includer as *mut Box<dyn Includer> as *mut c_void;
        self.includer = Some(includer);
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn messages(&self) -> Messages {
        Messages::from_bits_retain(self.raw.messages)
    }

    pub fn resource_limits(&self) -> &ResourceLimits {
        &self.resource
    }

    pub fn has_includer(&self) -> bool {
        self.includer.is_some()
    }

    /// The `glslang_input_t` handed to glslang, valid while `self` lives
    pub fn as_raw(&self) -> *const GlslangInput {
        &self.raw
    }
}

impl std::fmt::Debug for ShaderInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderInput")
            .field("stage", &self.stage())
            .field("messages", &self.messages())
            .field("has_includer", &self.has_includer())
            .finish()
    }
}

fn c_string(text: &str) -> Result<CString> {
    CString::new(text).map_err(|e| BridgeError::StringConversion(e.to_string()).into())
}

/// Include result handed to glslang; `raw` must stay the first field
#[repr(C)]
struct IncludeAllocation {
    raw: IncludeResultRaw,
    _name: CString,
    _data: Vec<u8>,
}

fn allocate_result(source: Option<IncludedSource>) -> *mut IncludeResultRaw {
    // An empty name tells glslang the include failed.
    let (name, data) = source
        .and_then(|source| Some((CString::new(source.name).ok()?, source.data)))
        .unwrap_or_default();

    let allocation = Box::new(IncludeAllocation {
        raw: IncludeResultRaw {
            header_name: name.as_ptr(),
            header_data: data.as_ptr() as *const c_char,
            header_length: data.len(),
        },
        _name: name,
        _data: data,
    });
    Box::into_raw(allocation) as *mut IncludeResultRaw
}

unsafe fn resolve(
    ctx: *mut c_void,
    kind: IncludeKind,
    header: *const c_char,
    includer: *const c_char,
    depth: usize,
) -> *mut IncludeResultRaw {
    if ctx.is_null() {
        return allocate_result(None);
    }
    let handler = &mut *(ctx as *mut Box<dyn Includer>);
    let header = wide::from_c_ptr(header).unwrap_or_default();
    let includer = wide::from_c_ptr(includer).unwrap_or_default();
    log::trace!("Resolving {:?} include '{}' from '{}'", kind, header, includer);

    let source = panic::catch_unwind(AssertUnwindSafe(|| {
        handler.include(kind, header, includer, depth)
    }))
    .unwrap_or_else(|_| {
        log::error!("Includer panicked while resolving '{}'", header);
        None
    });
    if source.is_none() {
        log::warn!("Include '{}' could not be resolved", header);
    }

    allocate_result(source)
}

unsafe extern "C" fn include_system(
    ctx: *mut c_void,
    header: *const c_char,
    includer: *const c_char,
    depth: usize,
) -> *mut IncludeResultRaw {
    resolve(ctx, IncludeKind::System, header, includer, depth)
}

unsafe extern "C" fn include_local(
    ctx: *mut c_void,
    header: *const c_char,
    includer: *const c_char,
    depth: usize,
) -> *mut IncludeResultRaw {
    resolve(ctx, IncludeKind::Local, header, includer, depth)
}

unsafe extern "C" fn free_include_result(_ctx: *mut c_void, result: *mut IncludeResultRaw) -> c_int {
    if result.is_null() {
        return 1;
    }
    drop(Box::from_raw(result as *mut IncludeAllocation));
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    fn call(input: &ShaderInput, kind: IncludeKind, header: &str) -> (String, Vec<u8>) {
        let header = CString::new(header).unwrap();
        let includer = CString::new("main.frag").unwrap();
        let callbacks = input.raw.callbacks;
        let include = match kind {
            IncludeKind::System => callbacks.include_system.unwrap(),
            IncludeKind::Local => callbacks.include_local.unwrap(),
        };

        unsafe {
            let result = include(input.raw.callbacks_ctx, header.as_ptr(), includer.as_ptr(), 1);
            assert!(!result.is_null());
            let name = CStr::from_ptr((*result).header_name).to_str().unwrap().to_owned();
            let data = if (*result).header_length == 0 {
                Vec::new()
            } else {
                std::slice::from_raw_parts(
                    (*result).header_data as *const u8,
                    (*result).header_length,
                )
                .to_vec()
            };
            assert_eq!(callbacks.free_include_result.unwrap()(ptr::null_mut(), result), 0);
            (name, data)
        }
    }

    #[test]
    fn defaults_target_vulkan() {
        let input = ShaderInput::new(Stage::Fragment, "void main() {}").unwrap();
        assert_eq!(input.stage(), Stage::Fragment);
        assert_eq!(input.raw.client, Client::Vulkan as c_int);
        assert_eq!(input.raw.default_version, 100);
        assert_eq!(input.raw.resource, input.resource_limits() as *const _);
        assert!(input.raw.callbacks.include_local.is_none());
        assert!(input.raw.callbacks_ctx.is_null());
    }

    #[test]
    fn pointers_survive_builder_moves() {
        let input = ShaderInput::new(Stage::Compute, "void main() {}")
            .unwrap()
            .with_client(Client::Vulkan, ClientVersion::Vulkan1_2)
            .with_entry_point("cs_main")
            .unwrap()
            .with_messages(Messages::SPV_RULES | Messages::VULKAN_RULES);

        let raw = unsafe { &*input.as_raw() };
        assert_eq!(unsafe { CStr::from_ptr(raw.code) }.to_str().unwrap(), "void main() {}");
        assert_eq!(unsafe { CStr::from_ptr(raw.entrypoint) }.to_str().unwrap(), "cs_main");
        assert_eq!(raw.target_language_version, TargetLanguageVersion::Spirv1_5 as c_int);
        assert_eq!(input.messages(), Messages::SPV_RULES | Messages::VULKAN_RULES);
    }

    #[test]
    fn interior_nul_is_rejected() {
        assert!(ShaderInput::new(Stage::Vertex, "void main() {}\0").is_err());
    }

    #[test]
    fn includer_results_round_trip_through_callbacks() {
        let input = ShaderInput::new(Stage::Fragment, "#include \"common.glsl\"")
            .unwrap()
            .with_includer(|kind: IncludeKind, header: &str, _: &str, _: usize| {
                (kind == IncludeKind::Local && header == "common.glsl").then(|| IncludedSource {
                    name: "common.glsl".to_string(),
                    data: b"const float PI = 3.14159;".to_vec(),
                })
            });

        let (name, data) = call(&input, IncludeKind::Local, "common.glsl");
        assert_eq!(name, "common.glsl");
        assert_eq!(data, b"const float PI = 3.14159;");

        let (name, data) = call(&input, IncludeKind::System, "common.glsl");
        assert!(name.is_empty());
        assert!(data.is_empty());
    }

    #[test]
    fn panicking_includer_fails_the_include() {
        let input = ShaderInput::new(Stage::Fragment, "")
            .unwrap()
            .with_includer(|_: IncludeKind, _: &str, _: &str, _: usize| -> Option<IncludedSource> {
                panic!("includer failure")
            });
        let (name, _) = call(&input, IncludeKind::Local, "any.glsl");
        assert!(name.is_empty());
    }

    #[test]
    fn directory_includer_prefers_siblings_for_local_includes() {
        let root = std::env::temp_dir().join(format!("shaderbridge-glsl-{}", std::process::id()));
        let shaders = root.join("shaders");
        let shared = root.join("shared");
        std::fs::create_dir_all(&shaders).unwrap();
        std::fs::create_dir_all(&shared).unwrap();
        std::fs::write(shaders.join("light.glsl"), "// sibling").unwrap();
        std::fs::write(shared.join("light.glsl"), "// shared").unwrap();

        let mut includer = DirectoryIncluder::new().with_dir(&shared);
        let includer_file = shaders.join("main.frag");
        let includer_name = includer_file.to_str().unwrap();

        let local = includer
            .include(IncludeKind::Local, "light.glsl", includer_name, 1)
            .unwrap();
        assert_eq!(local.data, b"// sibling");
        let system = includer
            .include(IncludeKind::System, "light.glsl", includer_name, 1)
            .unwrap();
        assert_eq!(system.data, b"// shared");
        assert!(includer
            .include(IncludeKind::System, "missing.glsl", includer_name, 1)
            .is_none());

        std::fs::remove_dir_all(&root).unwrap();
    }
}
