//! Typed filesystem operations for a sandboxed SQLite guest.
//!
//! A request is a value of one of the [`op`] input types. [`FileSystem`]
//! routes it through the configured interceptors to a
//! [`FileSystemBackend`], which performs the host call and reports failures
//! through the closed error enum of that operation. Every error variant maps
//! to one [`Errno`], so syscall adapters can hand the guest a negative errno
//! without any knowledge of the backend.

pub mod backend;
pub mod dispatch;
pub mod errno;
pub mod error;
pub mod fd_table;
pub mod flags;
pub mod ids;
pub mod lock;
pub mod logging;
pub mod op;
pub mod path;
pub mod stat;

pub use backend::{FileSystemBackend, not_implemented};
pub use dispatch::{FileSystem, FileSystemBuilder, FileSystemInterceptor, InterceptedCall};
pub use errno::Errno;
pub use error::{
    DescriptorNotOpen, NoFreeDescriptor, OperationError, ResolveError, map_errno, unmapped_errno,
};
pub use fd_table::{FdTableConfig, FileDescriptorTable, OpenHandle};
pub use flags::{
    AccessMode, FileAccessibilityCheck, FileMode, FileType, OpenFileFlags, ReadWriteStrategy,
    Whence,
};
pub use ids::Fd;
pub use lock::{AdvisoryLockKind, AdvisoryLockTable, Advisorylock, LockRange};
pub use logging::{LogLevel, LogVerbosity, Logger, LoggingEvents, LoggingInterceptor, TracingLogger};
pub use op::{FileSystemOperation, OperationKind, PathTarget};
pub use path::{
    AT_FDCWD, BaseDirectory, ResolvedBase, join_relative, normalize_lexically, preflight,
};
pub use stat::{StructStat, Timespec};
