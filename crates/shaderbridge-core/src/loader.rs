//! Runtime loading of the wrapped compiler libraries

use crate::{BridgeError, Result};
use libloading::Library;
use std::path::{Path, PathBuf};

/// A loaded shared library and the path it was opened from
pub struct NativeLibrary {
    library: Library,
    path: PathBuf,
}

impl NativeLibrary {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        // SAFETY: the compiler libraries run no initialisers beyond their own static setup.
        let library = unsafe { Library::new(path) }.map_err(|source| BridgeError::LibraryLoad {
            path: path.to_path_buf(),
            source,
        })?;

        log::debug!("Loaded native library {}", path.display());
        Ok(Self {
            library,
            path: path.to_path_buf(),
        })
    }

    /// Open the first candidate that loads, reporting the last failure otherwise
    pub fn open_first(candidates: &[PathBuf]) -> Result<Self> {
        let mut last_error = None;

        for candidate in candidates {
            match Self::open(candidate) {
                Ok(library) => return Ok(library),
                Err(err) => {
                    log::trace!("{}", err);
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            BridgeError::InvalidArgument("no library candidates given".to_string())
        }))
    }

    /// Resolve an exported function
    ///
    /// # Safety
    /// `F` must match the exported symbol's real signature, and the returned value must
    /// not be used after this library is dropped.
    pub unsafe fn symbol<F: Copy>(&self, name: &str) -> Result<F> {
        let symbol = self
            .library
            .get::<F>(name.as_bytes())
            .map_err(|source| BridgeError::MissingSymbol {
                name: name.to_string(),
                source,
            })?;
        Ok(*symbol)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for NativeLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeLibrary")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_reports_path() {
        let path = PathBuf::from("/nonexistent/libshaderbridge-missing.so");
        match NativeLibrary::open(&path) {
            Err(BridgeError::LibraryLoad { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("unexpected result: {:?}", other.map(|l| l.path().to_path_buf())),
        }
    }

    #[test]
    fn last_candidate_failure_is_reported() {
        let _ = env_logger::builder().is_test(true).try_init();
        let candidates = [
            PathBuf::from("/nonexistent/first.so"),
            PathBuf::from("/nonexistent/second.so"),
        ];
        match NativeLibrary::open_first(&candidates) {
            Err(BridgeError::LibraryLoad { path, .. }) => assert_eq!(path, candidates[1]),
            other => panic!("unexpected result: {:?}", other.map(|l| l.path().to_path_buf())),
        }
    }

    #[test]
    fn empty_candidate_list_is_an_error() {
        assert!(matches!(
            NativeLibrary::open_first(&[]),
            Err(BridgeError::InvalidArgument(_))
        ));
    }
}
