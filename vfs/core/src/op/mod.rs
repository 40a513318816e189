//! The closed set of filesystem operations.
//!
//! Every operation is a plain input struct implementing
//! [`FileSystemOperation`]. The trait fixes the result and error types and the
//! [`OperationKind`] used as dispatch key, so
//! `file_system.execute(Open { .. })` is statically typed end to end.

mod access;
mod attr;
mod dir;
mod io;
mod lock;
mod open;
mod stat;

pub use access::{CheckAccess, CheckAccessError};
pub use attr::{
    Chmod, ChmodError, ChmodFd, Chown, ChownError, ChownFd, SetTimestamp, SetTimestampError,
    SetTimestampFd,
};
pub use dir::{
    GetCurrentWorkingDirectory, GetCwdError, Mkdir, MkdirError, ReadLink, ReadLinkError,
    UnlinkDirectory, UnlinkError, UnlinkFile,
};
pub use io::{
    ReadError, ReadFd, SeekError, SeekFd, SyncError, SyncFd, TruncateError, TruncateFd,
    WriteError, WriteFd,
};
pub use lock::{AddAdvisoryLockFd, AdvisoryLockError, RemoveAdvisoryLockFd};
pub use open::{Close, CloseError, Open, OpenError};
pub use stat::{Stat, StatError, StatFd};

use crate::backend::FileSystemBackend;
use crate::error::OperationError;
use crate::path::BaseDirectory;
use enumset::EnumSetType;
use std::fmt;
use std::path::PathBuf;

/// Dispatch key of an operation.
#[derive(Debug, Hash, EnumSetType)]
pub enum OperationKind {
    Open,
    Close,
    ReadFd,
    WriteFd,
    SeekFd,
    Stat,
    StatFd,
    Chmod,
    ChmodFd,
    Chown,
    ChownFd,
    Mkdir,
    UnlinkFile,
    UnlinkDirectory,
    ReadLink,
    SetTimestamp,
    SetTimestampFd,
    SyncFd,
    TruncateFd,
    CheckAccess,
    AddAdvisoryLockFd,
    RemoveAdvisoryLockFd,
    GetCurrentWorkingDirectory,
}

impl OperationKind {
    /// Stable name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            OperationKind::Open => "open",
            OperationKind::Close => "close",
            OperationKind::ReadFd => "read_fd",
            OperationKind::WriteFd => "write_fd",
            OperationKind::SeekFd => "seek_fd",
            OperationKind::Stat => "stat",
            OperationKind::StatFd => "stat_fd",
            OperationKind::Chmod => "chmod",
            OperationKind::ChmodFd => "chmod_fd",
            OperationKind::Chown => "chown",
            OperationKind::ChownFd => "chown_fd",
            OperationKind::Mkdir => "mkdir",
            OperationKind::UnlinkFile => "unlink_file",
            OperationKind::UnlinkDirectory => "unlink_directory",
            OperationKind::ReadLink => "read_link",
            OperationKind::SetTimestamp => "set_timestamp",
            OperationKind::SetTimestampFd => "set_timestamp_fd",
            OperationKind::SyncFd => "sync_fd",
            OperationKind::TruncateFd => "truncate_fd",
            OperationKind::CheckAccess => "check_access",
            OperationKind::AddAdvisoryLockFd => "add_advisory_lock_fd",
            OperationKind::RemoveAdvisoryLockFd => "remove_advisory_lock_fd",
            OperationKind::GetCurrentWorkingDirectory => "get_current_working_directory",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The path argument of a path-based operation, borrowed mutably so an
/// interceptor can inspect or rewrite it before the backend resolves it.
#[derive(Debug)]
pub struct PathTarget<'a> {
    pub path: &'a mut PathBuf,
    pub base_directory: &'a mut BaseDirectory,
}

/// A typed filesystem request.
pub trait FileSystemOperation: fmt::Debug {
    type Output: fmt::Debug;
    type Error: OperationError;

    const KIND: OperationKind;

    /// Invoke the matching handler of `backend`.
    fn dispatch(&mut self, backend: &dyn FileSystemBackend) -> Result<Self::Output, Self::Error>;

    /// `None` for operations that only take a descriptor.
    fn target_mut(&mut self) -> Option<PathTarget<'_>> {
        None
    }
}

/// Implement [`FileSystemOperation`] for an input type that the backend takes
/// by shared reference. The `path` form also exposes the `path` and
/// `base_directory` fields as the [`PathTarget`].
macro_rules! operation {
    ($input:ident => $method:ident, $output:ty, $error:ty, path) => {
        impl $crate::op::FileSystemOperation for $input {
            type Output = $output;
            type Error = $error;

            const KIND: $crate::op::OperationKind = $crate::op::OperationKind::$input;

            fn dispatch(
                &mut self,
                backend: &dyn $crate::backend::FileSystemBackend,
            ) -> Result<$output, $error> {
                backend.$method(self)
            }

            fn target_mut(&mut self) -> Option<$crate::op::PathTarget<'_>> {
                Some($crate::op::PathTarget {
                    path: &mut self.path,
                    base_directory: &mut self.base_directory,
                })
            }
        }
    };
    ($input:ident => $method:ident, $output:ty, $error:ty) => {
        impl $crate::op::FileSystemOperation for $input {
            type Output = $output;
            type Error = $error;

            const KIND: $crate::op::OperationKind = $crate::op::OperationKind::$input;

            fn dispatch(
                &mut self,
                backend: &dyn $crate::backend::FileSystemBackend,
            ) -> Result<$output, $error> {
                backend.$method(self)
            }
        }
    };
}
pub(crate) use operation;

#[cfg(test)]
mod tests {
    use super::*;
    use enumset::EnumSet;

    #[test]
    fn path_operations_expose_their_target() {
        let mut mkdir = Mkdir {
            path: PathBuf::from("a"),
            base_directory: BaseDirectory::CurrentWorkingDirectory,
            mode: crate::FileMode::from_raw(0o755),
        };
        let target = mkdir.target_mut().unwrap();
        *target.path = PathBuf::from("/jail/a");
        *target.base_directory = BaseDirectory::Absolute;
        assert_eq!(mkdir.path, PathBuf::from("/jail/a"));
        assert_eq!(mkdir.base_directory, BaseDirectory::Absolute);

        let mut close = Close { fd: crate::Fd(3) };
        assert!(close.target_mut().is_none());
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = EnumSet::<OperationKind>::all()
            .iter()
            .map(OperationKind::name)
            .collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
        assert_eq!(total, 23);
    }
}
