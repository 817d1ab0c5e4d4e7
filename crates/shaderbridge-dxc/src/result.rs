//! Status and output extraction for compile results

use crate::ffi::{Bool, ComPtr, IDxcBlob, IDxcBlobEncoding, IDxcResult, Interface};
use crate::library::Dxc;
use crate::{DxcError, HResult, OutKind, Result};
use shaderbridge_core::{encoding, OwnedBuffer};
use std::ptr;
use std::sync::Arc;

/// One output of a compile result, copied out of DXC
#[derive(Debug, Default)]
pub struct ResultOutput {
    pub data: OwnedBuffer,
    /// Name DXC associates with the output (e.g. the PDB file name), often empty
    pub name: OwnedBuffer,
}

/// Handle to an `IDxcResult`
pub struct DxcResult {
    inner: ComPtr<IDxcResult>,
    _dxc: Arc<Dxc>,
}

impl DxcResult {
    pub(crate) fn new(inner: ComPtr<IDxcResult>, dxc: Arc<Dxc>) -> Self {
        Self { inner, _dxc: dxc }
    }

    /// Compilation status; a failure to query is reported as that failure
    pub fn status(&self) -> HResult {
        let mut status = HResult::S_OK;
        let hr = unsafe { (self.inner.vtbl().base.get_status)(self.inner.as_raw(), &mut status) };
        if hr.is_err() {
            hr
        } else {
            status
        }
    }

    pub fn has_output(&self, kind: OutKind) -> bool {
        unsafe { (self.inner.vtbl().has_output)(self.inner.as_raw(), kind.as_raw()) != 0 }
    }

    /// Copy the output of `kind` and its name into caller-owned buffers
    ///
    /// An absent kind is [`DxcError::OutputMissing`] and allocates nothing.
    pub fn output(&self, kind: OutKind) -> Result<ResultOutput> {
        let (blob, name) = self.output_blobs(kind)?;
        Ok(ResultOutput {
            data: copy_blob(blob.as_ref())?,
            name: copy_blob(name.as_ref())?,
        })
    }

    /// Size DXC reports for the output of `kind`, without copying it
    pub fn output_size(&self, kind: OutKind) -> Result<usize> {
        let (blob, _) = self.output_blobs(kind)?;
        Ok(blob.as_ref().map_or(0, blob_size))
    }

    fn output_blobs(
        &self,
        kind: OutKind,
    ) -> Result<(Option<ComPtr<IDxcBlob>>, Option<ComPtr<IDxcBlob>>)> {
        if !self.has_output(kind) {
            return Err(DxcError::OutputMissing(kind));
        }

        let mut blob = ptr::null_mut();
        let mut name = ptr::null_mut();
        let hr = unsafe {
            (self.inner.vtbl().get_output)(
                self.inner.as_raw(),
                kind.as_raw(),
                &IDxcBlob::IID,
                &mut blob,
                &mut name,
            )
        };
        // The name is an IDxcBlobWide, which starts with the IDxcBlob layout.
        let blob = unsafe { ComPtr::<IDxcBlob>::from_raw(blob) };
        let name = unsafe { ComPtr::<IDxcBlob>::from_raw(name) };
        hr.result()?;
        Ok((blob, name))
    }

    pub fn num_outputs(&self) -> u32 {
        unsafe { (self.inner.vtbl().get_num_outputs)(self.inner.as_raw()) }
    }

    /// Kind of the output at `index`, `OutKind::None` for values this crate does not know
    pub fn output_kind_at(&self, index: u32) -> OutKind {
        let raw = unsafe { (self.inner.vtbl().get_output_by_index)(self.inner.as_raw(), index) };
        OutKind::from_raw(raw).unwrap_or(OutKind::None)
    }

    pub fn primary_output(&self) -> OutKind {
        let raw = unsafe { (self.inner.vtbl().primary_output)(self.inner.as_raw()) };
        OutKind::from_raw(raw).unwrap_or(OutKind::None)
    }

    /// Warning and error text, if the compiler produced any
    pub fn errors(&self) -> Option<String> {
        let output = self.output(OutKind::Errors).ok()?;
        output.data.to_text().ok().filter(|text| !text.is_empty())
    }

    /// Object code, or the error text when compilation failed
    pub fn object(&self) -> Result<Vec<u8>> {
        let status = self.status();
        if status.is_err() {
            return Err(DxcError::Compile {
                status,
                message: self.errors().unwrap_or_default(),
            });
        }
        Ok(self.output(OutKind::Object)?.data.as_bytes().to_vec())
    }
}

fn blob_size(blob: &ComPtr<IDxcBlob>) -> usize {
    unsafe { (blob.vtbl().get_buffer_size)(blob.as_raw()) }
}

/// Copy a blob's bytes, tagged with its code page when the blob exposes one
fn copy_blob(blob: Option<&ComPtr<IDxcBlob>>) -> Result<OwnedBuffer> {
    let Some(blob) = blob else {
        return Ok(OwnedBuffer::empty());
    };

    let data = unsafe { (blob.vtbl().get_buffer_pointer)(blob.as_raw()) };
    let size = blob_size(blob);
    if data.is_null() || size == 0 {
        return Ok(OwnedBuffer::empty());
    }

    let bytes = unsafe { std::slice::from_raw_parts(data as *const u8, size) };
    Ok(OwnedBuffer::copy_from(bytes, blob_encoding(blob))?)
}

fn blob_encoding(blob: &ComPtr<IDxcBlob>) -> u32 {
    let Some(blob) = blob.query::<IDxcBlobEncoding>() else {
        return encoding::UNKNOWN;
    };

    let mut known: Bool = 0;
    let mut code_page = 0u32;
    let hr = unsafe { (blob.vtbl().get_encoding)(blob.as_raw(), &mut known, &mut code_page) };
    if hr.is_ok() && known != 0 {
        code_page
    } else {
        encoding::UNKNOWN
    }
}
