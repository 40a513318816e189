use super::operation;
use crate::ids::Fd;
use crate::operation_error;
use crate::path::BaseDirectory;
use crate::stat::StructStat;
use std::path::PathBuf;

/// `fstatat(2)`; `follow_symlinks == false` is `lstat`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stat {
    pub path: PathBuf,
    pub base_directory: BaseDirectory,
    pub follow_symlinks: bool,
}

operation_error! {
    /// Failures of [`Stat`] and [`StatFd`].
    pub enum StatError: resolve, descriptor {
        AccessDenied => Access,
        BadFileDescriptor => Badf,
        InvalidArgument => Inval,
        IoError => Io,
        NameTooLong => Nametoolong,
        NoEntry => Noent,
        NoMemory => Nomem,
        NotDirectory => Notdir,
        Overflow => Overflow,
        TooManySymbolicLinks => Loop,
    }
}

operation!(Stat => stat, StructStat, StatError, path);

/// `fstat(2)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatFd {
    pub fd: Fd,
}

operation!(StatFd => stat_fd, StructStat, StatError);
