use super::{FileSystemOperation, OperationKind, operation};
use crate::backend::FileSystemBackend;
use crate::flags::{ReadWriteStrategy, Whence};
use crate::ids::Fd;
use crate::operation_error;
use std::fmt;

/// `readv(2)` / `preadv(2)`.
///
/// Buffers are filled in order. The returned count is the total over all
/// buffers; reading stops early, without error, after a buffer that was only
/// partially filled.
pub struct ReadFd<'a> {
    pub fd: Fd,
    pub iovecs: Vec<&'a mut [u8]>,
    pub strategy: ReadWriteStrategy,
}

impl fmt::Debug for ReadFd<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lengths: Vec<usize> = self.iovecs.iter().map(|buf| buf.len()).collect();
        f.debug_struct("ReadFd")
            .field("fd", &self.fd)
            .field("iovecs", &lengths)
            .field("strategy", &self.strategy)
            .finish()
    }
}

operation_error! {
    /// Failures of [`ReadFd`].
    pub enum ReadError: descriptor {
        Again => Again,
        BadFileDescriptor => Badf,
        Interrupted => Intr,
        InvalidArgument => Inval,
        IoError => Io,
        NotSeekable => Spipe,
        Nxio => Nxio,
        Overflow => Overflow,
        PathIsDirectory => Isdir,
    }
}

impl FileSystemOperation for ReadFd<'_> {
    type Output = u64;
    type Error = ReadError;

    const KIND: OperationKind = OperationKind::ReadFd;

    fn dispatch(&mut self, backend: &dyn FileSystemBackend) -> Result<u64, ReadError> {
        backend.read_fd(self)
    }
}

/// `writev(2)` / `pwritev(2)`.
pub struct WriteFd<'a> {
    pub fd: Fd,
    pub cvecs: Vec<&'a [u8]>,
    pub strategy: ReadWriteStrategy,
}

impl fmt::Debug for WriteFd<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lengths: Vec<usize> = self.cvecs.iter().map(|buf| buf.len()).collect();
        f.debug_struct("WriteFd")
            .field("fd", &self.fd)
            .field("cvecs", &lengths)
            .field("strategy", &self.strategy)
            .finish()
    }
}

operation_error! {
    /// Failures of [`WriteFd`].
    pub enum WriteError: descriptor {
        Again => Again,
        BadFileDescriptor => Badf,
        DiskQuota => Dquot,
        FileTooBig => Fbig,
        Interrupted => Intr,
        InvalidArgument => Inval,
        IoError => Io,
        NoSpace => Nospc,
        NotSeekable => Spipe,
        Nxio => Nxio,
        Overflow => Overflow,
        PermissionDenied => Perm,
        Pipe => Pipe,
    }
}

impl FileSystemOperation for WriteFd<'_> {
    type Output = u64;
    type Error = WriteError;

    const KIND: OperationKind = OperationKind::WriteFd;

    fn dispatch(&mut self, backend: &dyn FileSystemBackend) -> Result<u64, WriteError> {
        backend.write_fd(self)
    }
}

/// `lseek(2)`. Returns the new offset from the start of the file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeekFd {
    pub fd: Fd,
    pub offset: i64,
    pub whence: Whence,
}

operation_error! {
    /// Failures of [`SeekFd`].
    pub enum SeekError: descriptor {
        BadFileDescriptor => Badf,
        InvalidArgument => Inval,
        NotSeekable => Spipe,
        Nxio => Nxio,
        Overflow => Overflow,
    }
}

operation!(SeekFd => seek_fd, u64, SeekError);

/// `fsync(2)` when `sync_metadata` is set, `fdatasync(2)` otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncFd {
    pub fd: Fd,
    pub sync_metadata: bool,
}

operation_error! {
    /// Failures of [`SyncFd`].
    pub enum SyncError: descriptor {
        BadFileDescriptor => Badf,
        DiskQuota => Dquot,
        Interrupted => Intr,
        InvalidArgument => Inval,
        IoError => Io,
        NoSpace => Nospc,
        ReadOnlyFileSystem => Rofs,
    }
}

operation!(SyncFd => sync_fd, (), SyncError);

/// `ftruncate(2)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TruncateFd {
    pub fd: Fd,
    pub length: u64,
}

operation_error! {
    /// Failures of [`TruncateFd`].
    pub enum TruncateError: descriptor {
        AccessDenied => Access,
        BadFileDescriptor => Badf,
        DiskQuota => Dquot,
        FileTooBig => Fbig,
        Interrupted => Intr,
        InvalidArgument => Inval,
        IoError => Io,
        NoSpace => Nospc,
        PathIsDirectory => Isdir,
        PermissionDenied => Perm,
        ReadOnlyFileSystem => Rofs,
        TextFileBusy => Txtbsy,
    }
}

operation!(TruncateFd => truncate_fd, (), TruncateError);
