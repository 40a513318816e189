//! Imports of the `env` module of an Emscripten build.
//!
//! The functions take the host and the guest memory explicitly, so an
//! embedder wires them into its runtime's import object without any
//! runtime-specific glue in this crate.

pub mod layout;
mod runtime;
mod syscalls;
mod time;

pub use runtime::*;
pub use syscalls::*;
pub use time::*;
