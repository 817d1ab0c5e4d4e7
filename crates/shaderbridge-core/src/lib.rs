//! Shared plumbing for the shaderbridge compiler adapters
//!
//! Everything that crosses the C boundary in more than one adapter lives here:
//!
//! - [`NativeBuffer`] / [`OwnedBuffer`]: the `{ptr, size, encoding}` descriptor and its
//!   scoped, C-allocated owner
//! - [`wide`]: UTF-8 <-> platform wide string conversion
//! - [`NativeLibrary`] and [`BridgeConfig`]: runtime loading of the wrapped compilers

pub mod buffer;
pub mod config;
pub mod error;
pub mod loader;
pub mod wide;

pub use buffer::{encoding, free_native, NativeBuffer, OwnedBuffer};
pub use config::{BridgeConfig, BridgeConfigBuilder};
pub use error::{BridgeError, Result};
pub use loader::NativeLibrary;
pub use wide::{WideArgs, WideChar};
