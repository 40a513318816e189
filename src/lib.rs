//! Host side of a SQLite engine compiled to WebAssembly with Emscripten.
//!
//! The guest reaches the host file system through two import modules: the
//! Emscripten `env` syscalls in [`emscripten`] and the WASI preview1
//! functions in [`wasi`]. Both decode guest memory, run one typed operation
//! through the [`vfs_core::FileSystem`] owned by an [`EmbedderHost`], and
//! report failures as errno values.
//!
//! ```no_run
//! use wasm_sqlite_host::{EmbedderHost, HostConfig, LinearMemory, emscripten, wasi};
//!
//! let config = HostConfig::from_path("host.toml")?;
//! let host = EmbedderHost::from_config(config)?;
//! let memory = LinearMemory::with_pages(16);
//! let fd = emscripten::syscall_openat(&host, &memory, -100, 1024, 0x42, 0o644);
//! let errno = wasi::fd_sync(&host, fd);
//! wasi::fd_close(&host, fd);
//! # Ok::<(), wasm_sqlite_host::ConfigError>(())
//! ```

#[macro_use]
mod macros;

pub mod config;
pub mod emscripten;
pub mod host;
pub mod memory;
pub mod wasi;

pub use config::{BackendKind, ConfigError, HostConfig, LoggingConfig};
pub use host::{
    Clock, EmbedderHost, EmbedderHostBuilder, EntropyError, EntropySource, EnvironmentProvider,
    InstantClock, LocalTimeFormatter, MonotonicClock, OsEntropy, StaticEnvironment, StructTm,
    SystemClock, TimeZoneInfo, TimeZoneInfoProvider, UtcTimeZone,
};
pub use memory::{GuestMemory, Iovec, LinearMemory, MemoryError, WASM_PAGE_SIZE};
pub use vfs_core;
