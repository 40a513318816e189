use super::operation;
use crate::flags::{FileMode, OpenFileFlags};
use crate::ids::Fd;
use crate::path::BaseDirectory;
use crate::operation_error;
use std::path::PathBuf;

/// `openat(2)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Open {
    pub path: PathBuf,
    pub base_directory: BaseDirectory,
    pub flags: OpenFileFlags,
    /// Permission bits for a newly created file.
    pub mode: FileMode,
}

operation_error! {
    /// Failures of [`Open`].
    pub enum OpenError: resolve {
        AccessDenied => Access,
        BadFileDescriptor => Badf,
        DiskQuota => Dquot,
        Exists => Exist,
        FileBusy => Txtbsy,
        FileTooBig => Fbig,
        Interrupted => Intr,
        InvalidArgument => Inval,
        IoError => Io,
        Mfile => Mfile,
        Mlink => Mlink,
        Nfile => Nfile,
        NameTooLong => Nametoolong,
        NoEntry => Noent,
        NoMemory => Nomem,
        NoSpace => Nospc,
        NotCapable => Notcapable,
        NotDirectory => Notdir,
        NotSupported => Notsup,
        Nxio => Nxio,
        Overflow => Overflow,
        PathIsDirectory => Isdir,
        PermissionDenied => Perm,
        ReadOnlyFileSystem => Rofs,
        TooManySymbolicLinks => Loop,
        WouldBlock => Again,
    }
}

impl From<crate::NoFreeDescriptor> for OpenError {
    fn from(err: crate::NoFreeDescriptor) -> Self {
        OpenError::Nfile(err.to_string())
    }
}

operation!(Open => open, Fd, OpenError, path);

/// `close(2)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Close {
    pub fd: Fd,
}

operation_error! {
    /// Failures of [`Close`].
    pub enum CloseError: descriptor {
        BadFileDescriptor => Badf,
        DiskQuota => Dquot,
        Interrupted => Intr,
        IoError => Io,
        NoSpace => Nospc,
    }
}

operation!(Close => close, (), CloseError);
