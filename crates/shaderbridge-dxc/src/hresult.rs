use crate::{DxcError, Result};
use std::fmt;

/// A COM status code
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HResult(pub i32);

impl HResult {
    pub const S_OK: Self = Self(0);
    pub const E_FAIL: Self = Self(0x8000_4005_u32 as i32);
    pub const E_NOINTERFACE: Self = Self(0x8000_4002_u32 as i32);
    pub const E_POINTER: Self = Self(0x8000_4003_u32 as i32);
    pub const E_INVALIDARG: Self = Self(0x8007_0057_u32 as i32);
    pub const E_OUTOFMEMORY: Self = Self(0x8007_000E_u32 as i32);
    /// `HRESULT_FROM_WIN32(ERROR_FILE_NOT_FOUND)`
    pub const NOT_FOUND: Self = Self(0x8007_0002_u32 as i32);

    pub fn is_ok(self) -> bool {
        self.0 >= 0
    }

    pub fn is_err(self) -> bool {
        !self.is_ok()
    }

    pub fn code(self) -> i32 {
        self.0
    }

    pub fn result(self) -> Result<()> {
        self.result_with_success(())
    }

    pub fn result_with_success<T>(self, value: T) -> Result<T> {
        if self.is_err() {
            Err(DxcError::Hresult(self))
        } else {
            Ok(value)
        }
    }
}

impl From<i32> for HResult {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

impl From<HResult> for i32 {
    fn from(hr: HResult) -> Self {
        hr.0
    }
}

impl fmt::Display for HResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0 as u32)
    }
}

impl fmt::Debug for HResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HResult({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_codes_have_the_severity_bit() {
        for hr in [
            HResult::E_FAIL,
            HResult::E_NOINTERFACE,
            HResult::E_POINTER,
            HResult::E_INVALIDARG,
            HResult::E_OUTOFMEMORY,
            HResult::NOT_FOUND,
        ] {
            assert!(hr.is_err(), "{} should be a failure", hr);
        }
        assert!(HResult::S_OK.is_ok());
        assert!(HResult(1).is_ok());
    }

    #[test]
    fn formats_as_unsigned_hex() {
        assert_eq!(HResult::E_FAIL.to_string(), "0x80004005");
        assert_eq!(HResult::NOT_FOUND.to_string(), "0x80070002");
        assert_eq!(HResult::NOT_FOUND.code(), -2_147_024_894);
    }

    #[test]
    fn result_maps_failures_to_errors() {
        assert!(HResult::S_OK.result().is_ok());
        assert!(matches!(
            HResult::E_INVALIDARG.result(),
            Err(DxcError::Hresult(HResult::E_INVALIDARG))
        ));
        assert_eq!(HResult::S_OK.result_with_success(7).unwrap(), 7);
    }
}
