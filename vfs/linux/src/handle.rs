use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, MutexGuard};
use vfs_core::op::{AdvisoryLockError, CloseError, ReadError, SeekError, WriteError};
use vfs_core::{
    AdvisoryLockKind, AdvisoryLockTable, Advisorylock, Errno, LockRange, OpenHandle,
    ReadWriteStrategy, Whence, map_errno,
};

use crate::{map_os_error, os_result, sys};

/// `IOV_MAX` on Linux.
const IOV_MAX: usize = 1024;

/// A host descriptor owned by one guest descriptor.
#[derive(Debug)]
pub struct NativeHandle {
    fd: OwnedFd,
    path: PathBuf,
    directory: bool,
    locks: Mutex<AdvisoryLockTable>,
    io_lock: Mutex<()>,
}

impl OpenHandle for NativeHandle {
    fn path(&self) -> &Path {
        &self.path
    }

    fn is_directory(&self) -> bool {
        self.directory
    }
}

impl AsRawFd for NativeHandle {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl NativeHandle {
    pub fn new(fd: OwnedFd, path: PathBuf, directory: bool) -> Self {
        Self {
            fd,
            path,
            directory,
            locks: Mutex::new(AdvisoryLockTable::new()),
            io_lock: Mutex::new(()),
        }
    }

    pub fn lock_records(&self) -> Vec<(LockRange, AdvisoryLockKind)> {
        self.locks.lock().records().collect()
    }

    /// `preadv`/`pwritev` never touch the shared offset; everything else
    /// is serialized so a split vectored call stays contiguous.
    fn position_guard(&self, strategy: ReadWriteStrategy) -> Option<MutexGuard<'_, ()>> {
        match strategy {
            ReadWriteStrategy::DoNotChangePosition(_) => None,
            ReadWriteStrategy::ChangePosition => Some(self.io_lock.lock()),
        }
    }

    pub(crate) fn read(
        &self,
        iovecs: &mut [&mut [u8]],
        strategy: ReadWriteStrategy,
    ) -> Result<u64, ReadError> {
        let _guard = self.position_guard(strategy);
        let mut total = 0u64;
        for chunk in iovecs.chunks_mut(IOV_MAX) {
            let wanted: usize = chunk.iter().map(|buf| buf.len()).sum();
            let offset = match strategy {
                ReadWriteStrategy::ChangePosition => None,
                ReadWriteStrategy::DoNotChangePosition(offset) => Some(
                    offset
                        .checked_add(total)
                        .ok_or_else(|| map_errno::<ReadError>("native.preadv", Errno::Overflow))?,
                ),
            };
            let read = os_result::<_, ReadError>("native.readv", sys::readv(self.as_raw_fd(), chunk, offset))?;
            total += read as u64;
            if read < wanted {
                break;
            }
        }
        Ok(total)
    }

    pub(crate) fn write(
        &self,
        cvecs: &[&[u8]],
        strategy: ReadWriteStrategy,
    ) -> Result<u64, WriteError> {
        let _guard = self.position_guard(strategy);
        let mut total = 0u64;
        for chunk in cvecs.chunks(IOV_MAX) {
            let wanted: usize = chunk.iter().map(|buf| buf.len()).sum();
            let offset = match strategy {
                ReadWriteStrategy::ChangePosition => None,
                ReadWriteStrategy::DoNotChangePosition(offset) => Some(
                    offset
                        .checked_add(total)
                        .ok_or_else(|| map_errno::<WriteError>("native.pwritev", Errno::Overflow))?,
                ),
            };
            let written = os_result::<_, WriteError>("native.writev", sys::writev(self.as_raw_fd(), chunk, offset))?;
            total += written as u64;
            if written < wanted {
                break;
            }
        }
        Ok(total)
    }

    pub(crate) fn seek(&self, offset: i64, whence: Whence) -> Result<u64, SeekError> {
        let whence = match whence {
            Whence::Set => libc::SEEK_SET,
            Whence::Cur => libc::SEEK_CUR,
            Whence::End => libc::SEEK_END,
        };
        let _guard = self.io_lock.lock();
        os_result("native.lseek", sys::lseek(self.as_raw_fd(), offset, whence))
    }

    fn lock_range(&self, lock: &Advisorylock) -> Result<LockRange, AdvisoryLockError> {
        let (current, size) = match lock.whence {
            Whence::Set => (0, 0),
            Whence::Cur => {
                let _guard = self.io_lock.lock();
                let current = sys::lseek(self.as_raw_fd(), 0, libc::SEEK_CUR)
                    .map_err(|err| lock_error("native.lock.position", err))?;
                (current, 0)
            }
            Whence::End => {
                let stat = sys::fstat(self.as_raw_fd())
                    .map_err(|err| lock_error("native.lock.size", err))?;
                (0, stat.st_size as u64)
            }
        };
        LockRange::resolve(lock, current, size).ok_or_else(|| {
            AdvisoryLockError::InvalidArgument(format!(
                "native.lock: range {}+{} is out of bounds",
                lock.start, lock.length
            ))
        })
    }

    /// Same ordering as the portable backend: the kernel lock is taken
    /// before the table changes, and replaced records give up only the
    /// bytes the new lock does not cover.
    pub(crate) fn add_lock(&self, lock: &Advisorylock) -> Result<(), AdvisoryLockError> {
        let range = self.lock_range(lock)?;
        let mut locks = self.locks.lock();
        vfs_unix::set_advisory_lock(self.as_raw_fd(), Some(lock.kind), range)
            .map_err(|err| lock_error("native.lock", err))?;
        for (replaced, _) in locks.commit_add(range, lock.kind) {
            for piece in replaced.subtract(&range) {
                if let Err(err) = vfs_unix::set_advisory_lock(self.as_raw_fd(), None, piece) {
                    tracing::warn!(
                        path = %self.path.display(),
                        ?piece,
                        error = %err,
                        "failed to release the uncovered part of a replaced lock"
                    );
                }
            }
        }
        Ok(())
    }

    pub(crate) fn remove_lock(&self, lock: &Advisorylock) -> Result<(), AdvisoryLockError> {
        let range = self.lock_range(lock)?;
        let mut locks = self.locks.lock();
        vfs_unix::set_advisory_lock(self.as_raw_fd(), None, range)
            .map_err(|err| lock_error("native.unlock", err))?;
        locks.commit_remove(range);
        Ok(())
    }

    /// Close the host descriptor and report what `close(2)` says.
    pub(crate) fn close(self) -> Result<(), CloseError> {
        os_result("native.close", sys::close(self.fd))
    }
}

fn lock_error(context: &'static str, err: std::io::Error) -> AdvisoryLockError {
    match err.raw_os_error() {
        Some(libc::EACCES) => map_errno(context, Errno::Again),
        _ => map_os_error(context, err),
    }
}
