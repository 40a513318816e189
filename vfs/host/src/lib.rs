mod backend;
mod handle;
mod platform;

pub use backend::HostFileSystem;
pub use handle::HostHandle;

use std::io;
use vfs_core::{Errno, OperationError};

/// Errno of a failed `std` call. Panics when neither the OS code nor the
/// error kind has an entry.
#[track_caller]
pub(crate) fn io_errno(context: &'static str, err: &io::Error) -> Errno {
    match host_errno(err).or_else(|| error_kind_errno(err.kind())) {
        Some(errno) => errno,
        None => panic!("{context}: unexpected host error: {err}"),
    }
}

/// Convert a failed `std` call into the typed error of an operation.
#[track_caller]
pub(crate) fn map_io_error<E: OperationError>(context: &'static str, err: io::Error) -> E {
    let errno = io_errno(context, &err);
    match E::from_errno(errno, format!("{context}: {err}")) {
        Some(err) => err,
        None => vfs_core::unmapped_errno(context, errno),
    }
}

pub(crate) fn io_result<T, E: OperationError>(
    context: &'static str,
    result: io::Result<T>,
) -> Result<T, E> {
    result.map_err(|err| map_io_error(context, err))
}

#[cfg(unix)]
fn host_errno(err: &io::Error) -> Option<Errno> {
    vfs_unix::io_error_to_errno(err)
}

#[cfg(not(unix))]
fn host_errno(_err: &io::Error) -> Option<Errno> {
    None
}

/// Errors raised by `std` itself, without an OS code.
fn error_kind_errno(kind: io::ErrorKind) -> Option<Errno> {
    let errno = match kind {
        io::ErrorKind::NotFound => Errno::Noent,
        io::ErrorKind::PermissionDenied => Errno::Access,
        io::ErrorKind::AlreadyExists => Errno::Exist,
        io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => Errno::Inval,
        io::ErrorKind::Unsupported => Errno::Notsup,
        io::ErrorKind::WouldBlock => Errno::Again,
        io::ErrorKind::Interrupted => Errno::Intr,
        io::ErrorKind::OutOfMemory => Errno::Nomem,
        io::ErrorKind::UnexpectedEof | io::ErrorKind::WriteZero => Errno::Io,
        _ => return None,
    };
    Some(errno)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfs_core::op::StatError;

    #[test]
    fn std_errors_without_os_code() {
        let err = io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL");
        let mapped: StatError = map_io_error("stat", err);
        assert_eq!(mapped.errno(), Errno::Inval);
        assert!(mapped.message().starts_with("stat: "));
    }

    #[cfg(unix)]
    #[test]
    fn os_code_takes_precedence() {
        let err = io::Error::from_raw_os_error(libc::ENAMETOOLONG);
        assert_eq!(io_errno("open", &err), Errno::Nametoolong);
    }

    #[test]
    #[should_panic(expected = "unexpected host error")]
    fn unknown_kind_is_fatal() {
        let err = io::Error::new(io::ErrorKind::Other, "mystery");
        let _ = io_errno("open", &err);
    }
}
