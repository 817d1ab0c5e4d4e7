use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Failed to load native library {path:?}: {source}")]
    LibraryLoad {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("Missing symbol `{name}`: {source}")]
    MissingSymbol {
        name: String,
        #[source]
        source: libloading::Error,
    },

    #[error("String conversion failed: {0}")]
    StringConversion(String),

    #[error("Out of memory: failed to allocate {0} bytes")]
    OutOfMemory(usize),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
