use super::operation;
use crate::flags::FileMode;
use crate::ids::Fd;
use crate::operation_error;
use crate::path::BaseDirectory;
use crate::stat::Timespec;
use std::path::PathBuf;

/// `fchmodat(2)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chmod {
    pub path: PathBuf,
    pub base_directory: BaseDirectory,
    pub mode: FileMode,
    pub follow_symlinks: bool,
}

/// `fchmod(2)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChmodFd {
    pub fd: Fd,
    pub mode: FileMode,
}

operation_error! {
    /// Failures of [`Chmod`] and [`ChmodFd`].
    pub enum ChmodError: resolve, descriptor {
        AccessDenied => Access,
        BadFileDescriptor => Badf,
        Interrupted => Intr,
        InvalidArgument => Inval,
        IoError => Io,
        NameTooLong => Nametoolong,
        NoEntry => Noent,
        NoMemory => Nomem,
        NotDirectory => Notdir,
        NotSupported => Notsup,
        PermissionDenied => Perm,
        ReadOnlyFileSystem => Rofs,
        TooManySymbolicLinks => Loop,
    }
}

operation!(Chmod => chmod, (), ChmodError, path);
operation!(ChmodFd => chmod_fd, (), ChmodError);

/// `fchownat(2)`. `None` leaves the id unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chown {
    pub path: PathBuf,
    pub base_directory: BaseDirectory,
    pub owner: Option<u32>,
    pub group: Option<u32>,
    pub follow_symlinks: bool,
}

/// `fchown(2)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChownFd {
    pub fd: Fd,
    pub owner: Option<u32>,
    pub group: Option<u32>,
}

operation_error! {
    /// Failures of [`Chown`] and [`ChownFd`].
    pub enum ChownError: resolve, descriptor {
        AccessDenied => Access,
        BadFileDescriptor => Badf,
        Interrupted => Intr,
        InvalidArgument => Inval,
        IoError => Io,
        NameTooLong => Nametoolong,
        NoEntry => Noent,
        NoMemory => Nomem,
        NotDirectory => Notdir,
        NotSupported => Notsup,
        PermissionDenied => Perm,
        ReadOnlyFileSystem => Rofs,
        TooManySymbolicLinks => Loop,
    }
}

operation!(Chown => chown, (), ChownError, path);
operation!(ChownFd => chown_fd, (), ChownError);

/// `utimensat(2)`. `None` leaves the timestamp unchanged (`UTIME_OMIT`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetTimestamp {
    pub path: PathBuf,
    pub base_directory: BaseDirectory,
    pub atime: Option<Timespec>,
    pub mtime: Option<Timespec>,
    pub follow_symlinks: bool,
}

/// `futimens(3)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetTimestampFd {
    pub fd: Fd,
    pub atime: Option<Timespec>,
    pub mtime: Option<Timespec>,
}

operation_error! {
    /// Failures of [`SetTimestamp`] and [`SetTimestampFd`].
    pub enum SetTimestampError: resolve, descriptor {
        AccessDenied => Access,
        BadFileDescriptor => Badf,
        InvalidArgument => Inval,
        IoError => Io,
        NameTooLong => Nametoolong,
        NoEntry => Noent,
        NotDirectory => Notdir,
        NotSupported => Notsup,
        PermissionDenied => Perm,
        ReadOnlyFileSystem => Rofs,
        TooManySymbolicLinks => Loop,
    }
}

operation!(SetTimestamp => set_timestamp, (), SetTimestampError, path);
operation!(SetTimestampFd => set_timestamp_fd, (), SetTimestampError);
