use crate::compiler::DxcCompiler;
use crate::ffi::{
    ComPtr, DxcCreateInstanceProc, Guid, IDxcBlobEncoding, IDxcCompiler3, IDxcUtils, Interface,
    CLSID_DXC_COMPILER, CLSID_DXC_UTILS,
};
use crate::include::{IncludeBridge, IncludeHandler};
use crate::Result;
use parking_lot::Mutex;
use shaderbridge_core::{BridgeConfig, BridgeError, NativeLibrary};
use std::path::Path;
use std::sync::Arc;

static SHARED: Mutex<Option<Arc<Dxc>>> = parking_lot::const_mutex(None);

/// The loaded DXC library
///
/// Every object created from it keeps an `Arc<Dxc>` so the library stays mapped
/// until the last interface is released.
pub struct Dxc {
    create_instance: DxcCreateInstanceProc,
    library: NativeLibrary,
}

impl Dxc {
    pub fn load(config: &BridgeConfig) -> Result<Self> {
        let library = NativeLibrary::open_first(&config.dxc_candidates())?;
        let create_instance =
            unsafe { library.symbol::<DxcCreateInstanceProc>("DxcCreateInstance")? };

        log::info!("DXC loaded from {}", library.path().display());
        Ok(Self {
            create_instance,
            library,
        })
    }

    /// Process-wide instance, loaded on first use from [`BridgeConfig::from_env`]
    pub fn shared() -> Result<Arc<Self>> {
        let mut shared = SHARED.lock();
        if let Some(dxc) = shared.as_ref() {
            return Ok(Arc::clone(dxc));
        }

        let dxc = Arc::new(Self::load(&BridgeConfig::from_env())?);
        *shared = Some(Arc::clone(&dxc));
        Ok(dxc)
    }

    pub fn library_path(&self) -> &Path {
        self.library.path()
    }

    /// `DxcCreateInstance` for an arbitrary class and interface
    pub fn create_instance<T: Interface>(&self, clsid: &Guid) -> Result<ComPtr<T>> {
        unsafe { ComPtr::from_out(|out| (self.create_instance)(clsid, &T::IID, out)) }
    }

    pub fn create_compiler(self: &Arc<Self>) -> Result<DxcCompiler> {
        let inner = self.create_instance::<IDxcCompiler3>(&CLSID_DXC_COMPILER)?;
        log::debug!("Created DXC compiler instance");
        Ok(DxcCompiler::new(inner, Arc::clone(self)))
    }

    pub fn create_utils(self: &Arc<Self>) -> Result<DxcUtils> {
        let inner = self.create_instance::<IDxcUtils>(&CLSID_DXC_UTILS)?;
        Ok(DxcUtils {
            inner,
            _dxc: Arc::clone(self),
        })
    }

    /// Wrap `handler` in an object the compiler can call back into
    pub fn create_include_bridge(
        self: &Arc<Self>,
        handler: impl IncludeHandler + 'static,
    ) -> Result<IncludeBridge> {
        Ok(IncludeBridge::new(self.create_utils()?, handler))
    }
}

/// `IDxcUtils`: blob construction
pub struct DxcUtils {
    inner: ComPtr<IDxcUtils>,
    _dxc: Arc<Dxc>,
}

impl DxcUtils {
    /// Copy `data` into a new text blob tagged with `encoding`
    pub fn create_blob(&self, data: &[u8], encoding: u32) -> Result<ComPtr<IDxcBlobEncoding>> {
        let size = u32::try_from(data.len()).map_err(|_| {
            BridgeError::InvalidArgument(format!("blob of {} bytes is too large", data.len()))
        })?;

        unsafe {
            ComPtr::from_out(|out| {
                (self.inner.vtbl().create_blob)(
                    self.inner.as_raw(),
                    data.as_ptr().cast(),
                    size,
                    encoding,
                    out,
                )
            })
        }
    }
}
