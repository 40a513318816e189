use super::operation;
use crate::flags::FileAccessibilityCheck;
use crate::operation_error;
use crate::path::BaseDirectory;
use std::path::PathBuf;

/// `faccessat2(2)`. An empty `mode` only checks for existence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckAccess {
    pub path: PathBuf,
    pub base_directory: BaseDirectory,
    pub mode: FileAccessibilityCheck,
    /// `AT_EACCESS`
    pub use_effective_user_id: bool,
    /// `AT_EMPTY_PATH`
    pub allow_empty_path: bool,
    pub follow_symlinks: bool,
}

operation_error! {
    /// Failures of [`CheckAccess`].
    pub enum CheckAccessError: resolve {
        AccessDenied => Access,
        BadFileDescriptor => Badf,
        InvalidArgument => Inval,
        IoError => Io,
        NameTooLong => Nametoolong,
        NoEntry => Noent,
        NoMemory => Nomem,
        NotCapable => Notcapable,
        NotDirectory => Notdir,
        PermissionDenied => Perm,
        ReadOnlyFileSystem => Rofs,
        TextFileBusy => Txtbsy,
        TooManySymbolicLinks => Loop,
    }
}

operation!(CheckAccess => check_access, (), CheckAccessError, path);
