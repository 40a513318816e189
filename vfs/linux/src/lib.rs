//! File system backend that talks to the Linux kernel directly.
//!
//! Every guest descriptor owns a host descriptor, and relative paths are
//! resolved by the kernel through `*at` calls against the base directory's
//! host descriptor. Unlike the portable backend, a renamed base directory is
//! followed.

#![cfg(target_os = "linux")]

mod backend;
mod handle;
mod sys;

pub use backend::NativeFileSystem;
pub use handle::NativeHandle;

use std::io;
use vfs_core::{Errno, OperationError};

/// Convert a failed syscall into the typed error of an operation.
///
/// Errors raised before reaching the kernel, like a NUL byte inside a path,
/// carry no OS code and become `EINVAL`.
#[track_caller]
pub(crate) fn map_os_error<E: OperationError>(context: &'static str, err: io::Error) -> E {
    let errno = match vfs_unix::io_error_to_errno(&err) {
        Some(errno) => errno,
        None if err.raw_os_error().is_none() => Errno::Inval,
        None => panic!("{context}: unexpected host error: {err}"),
    };
    match E::from_errno(errno, format!("{context}: {err}")) {
        Some(err) => err,
        None => vfs_core::unmapped_errno(context, errno),
    }
}

pub(crate) fn os_result<T, E: OperationError>(
    context: &'static str,
    result: io::Result<T>,
) -> Result<T, E> {
    result.map_err(|err| map_os_error(context, err))
}
