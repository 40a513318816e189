use super::operation;
use crate::flags::FileMode;
use crate::operation_error;
use crate::path::BaseDirectory;
use std::path::PathBuf;

/// `mkdirat(2)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mkdir {
    pub path: PathBuf,
    pub base_directory: BaseDirectory,
    pub mode: FileMode,
}

operation_error! {
    /// Failures of [`Mkdir`].
    pub enum MkdirError: resolve {
        AccessDenied => Access,
        BadFileDescriptor => Badf,
        DiskQuota => Dquot,
        Exists => Exist,
        InvalidArgument => Inval,
        IoError => Io,
        Mlink => Mlink,
        NameTooLong => Nametoolong,
        NoEntry => Noent,
        NoMemory => Nomem,
        NoSpace => Nospc,
        NotDirectory => Notdir,
        PermissionDenied => Perm,
        ReadOnlyFileSystem => Rofs,
        TooManySymbolicLinks => Loop,
    }
}

operation!(Mkdir => mkdir, (), MkdirError, path);

/// `unlinkat(2)` without `AT_REMOVEDIR`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnlinkFile {
    pub path: PathBuf,
    pub base_directory: BaseDirectory,
}

/// `unlinkat(2)` with `AT_REMOVEDIR`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnlinkDirectory {
    pub path: PathBuf,
    pub base_directory: BaseDirectory,
}

operation_error! {
    /// Failures of [`UnlinkFile`] and [`UnlinkDirectory`].
    pub enum UnlinkError: resolve {
        AccessDenied => Access,
        BadFileDescriptor => Badf,
        Busy => Busy,
        DirectoryNotEmpty => Notempty,
        InvalidArgument => Inval,
        IoError => Io,
        NameTooLong => Nametoolong,
        NoEntry => Noent,
        NoMemory => Nomem,
        NoSpace => Nospc,
        NotDirectory => Notdir,
        PathIsDirectory => Isdir,
        PermissionDenied => Perm,
        ReadOnlyFileSystem => Rofs,
        TooManySymbolicLinks => Loop,
    }
}

operation!(UnlinkFile => unlink_file, (), UnlinkError, path);
operation!(UnlinkDirectory => unlink_directory, (), UnlinkError, path);

/// `readlinkat(2)`. Returns the raw link target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadLink {
    pub path: PathBuf,
    pub base_directory: BaseDirectory,
}

operation_error! {
    /// Failures of [`ReadLink`].
    pub enum ReadLinkError: resolve {
        AccessDenied => Access,
        BadFileDescriptor => Badf,
        InvalidArgument => Inval,
        IoError => Io,
        NameTooLong => Nametoolong,
        NoEntry => Noent,
        NoMemory => Nomem,
        NotDirectory => Notdir,
        TooManySymbolicLinks => Loop,
    }
}

operation!(ReadLink => read_link, PathBuf, ReadLinkError, path);

/// `getcwd(3)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GetCurrentWorkingDirectory;

operation_error! {
    /// Failures of [`GetCurrentWorkingDirectory`].
    pub enum GetCwdError {
        AccessDenied => Access,
        InvalidArgument => Inval,
        IoError => Io,
        NameTooLong => Nametoolong,
        NoEntry => Noent,
        NoMemory => Nomem,
        Range => Range,
    }
}

operation!(GetCurrentWorkingDirectory => get_current_working_directory, PathBuf, GetCwdError);
