use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, MutexGuard};
use vfs_core::op::{AdvisoryLockError, ReadError, SeekError, WriteError};
use vfs_core::{
    AccessMode, AdvisoryLockKind, AdvisoryLockTable, Advisorylock, Errno, LockRange, OpenHandle,
    ReadWriteStrategy, Whence, map_errno,
};

use crate::{io_errno, io_result, platform};

/// An open `std::fs::File` plus the state the guest attaches to it.
#[derive(Debug)]
pub struct HostHandle {
    file: File,
    path: PathBuf,
    directory: bool,
    access: AccessMode,
    locks: Mutex<AdvisoryLockTable>,
    /// Serializes calls that use or move the shared file offset.
    io_lock: Mutex<()>,
}

impl OpenHandle for HostHandle {
    fn path(&self) -> &Path {
        &self.path
    }

    fn is_directory(&self) -> bool {
        self.directory
    }
}

impl HostHandle {
    pub fn new(file: File, path: PathBuf, directory: bool, access: AccessMode) -> Self {
        Self {
            file,
            path,
            directory,
            access,
            locks: Mutex::new(AdvisoryLockTable::new()),
            io_lock: Mutex::new(()),
        }
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    /// Advisory locks currently held through this handle.
    pub fn lock_records(&self) -> Vec<(LockRange, AdvisoryLockKind)> {
        self.locks.lock().records().collect()
    }

    /// Positioned I/O needs no lock where the host has `pread`/`pwrite`.
    fn position_guard(&self, strategy: ReadWriteStrategy) -> Option<MutexGuard<'_, ()>> {
        match strategy {
            ReadWriteStrategy::DoNotChangePosition(_) if platform::NATIVE_POSITIONED_IO => None,
            _ => Some(self.io_lock.lock()),
        }
    }

    pub(crate) fn read(
        &self,
        iovecs: &mut [&mut [u8]],
        strategy: ReadWriteStrategy,
    ) -> Result<u64, ReadError> {
        if self.access == AccessMode::WriteOnly {
            return Err(ReadError::BadFileDescriptor(format!(
                "host.read: `{}` is not open for reading",
                self.path.display()
            )));
        }
        let _guard = self.position_guard(strategy);
        let mut total = 0u64;
        for buf in iovecs.iter_mut() {
            let read = match strategy {
                ReadWriteStrategy::ChangePosition => {
                    io_result::<_, ReadError>("host.read", (&self.file).read(buf))?
                }
                ReadWriteStrategy::DoNotChangePosition(offset) => {
                    let offset = offset
                        .checked_add(total)
                        .ok_or_else(|| map_errno::<ReadError>("host.pread", Errno::Overflow))?;
                    io_result::<_, ReadError>("host.pread", platform::read_at(&self.file, buf, offset))?
                }
            };
            total += read as u64;
            if read < buf.len() {
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
        if self.access == AccessMode::ReadOnly {
            return Err(WriteError::BadFileDescriptor(format!(
                "host.write: `{}` is not open for writing",
                self.path.display()
            )));
        }
        let _guard = self.position_guard(strategy);
        let mut total = 0u64;
        for buf in cvecs {
            let written = match strategy {
                ReadWriteStrategy::ChangePosition => {
                    io_result::<_, WriteError>("host.write", (&self.file).write(buf))?
                }
                ReadWriteStrategy::DoNotChangePosition(offset) => {
                    let offset = offset
                        .checked_add(total)
                        .ok_or_else(|| map_errno::<WriteError>("host.pwrite", Errno::Overflow))?;
                    io_result::<_, WriteError>("host.pwrite", platform::write_at(&self.file, buf, offset))?
                }
            };
            total += written as u64;
            if written < buf.len() {
                break;
            }
        }
        Ok(total)
    }

    /// `End` is relative to the current size, as with `lseek`.
    pub(crate) fn seek(&self, offset: i64, whence: Whence) -> Result<u64, SeekError> {
        let position = match whence {
            Whence::Set => match u64::try_from(offset) {
                Ok(offset) => SeekFrom::Start(offset),
                Err(_) => {
                    return Err(SeekError::InvalidArgument(format!(
                        "host.seek: negative offset {offset}"
                    )));
                }
            },
            Whence::Cur => SeekFrom::Current(offset),
            Whence::End => SeekFrom::End(offset),
        };
        let _guard = self.io_lock.lock();
        io_result("host.seek", (&self.file).seek(position))
    }

    fn lock_range(&self, lock: &Advisorylock) -> Result<LockRange, AdvisoryLockError> {
        let (current, size) = match lock.whence {
            Whence::Set => (0, 0),
            Whence::Cur => {
                let _guard = self.io_lock.lock();
                let current = (&self.file)
                    .stream_position()
                    .map_err(|err| lock_error("host.lock.position", err))?;
                (current, 0)
            }
            Whence::End => {
                let size = self
                    .file
                    .metadata()
                    .map_err(|err| lock_error("host.lock.size", err))?
                    .len();
                (0, size)
            }
        };
        LockRange::resolve(lock, current, size).ok_or_else(|| {
            AdvisoryLockError::InvalidArgument(format!(
                "host.lock: range {}+{} is out of bounds",
                lock.start, lock.length
            ))
        })
    }

    /// Acquire first, then drop whatever the replaced records held outside of
    /// the new range. A failed acquisition leaves the table untouched.
    pub(crate) fn add_lock(&self, lock: &Advisorylock) -> Result<(), AdvisoryLockError> {
        let range = self.lock_range(lock)?;
        let mut locks = self.locks.lock();
        platform::set_advisory_lock(&self.file, Some(lock.kind), range)
            .map_err(|err| lock_error("host.lock", err))?;
        for (replaced, _) in locks.commit_add(range, lock.kind) {
            for piece in replaced.subtract(&range) {
                if let Err(err) = platform::set_advisory_lock(&self.file, None, piece) {
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
        platform::set_advisory_lock(&self.file, None, range)
            .map_err(|err| lock_error("host.unlock", err))?;
        locks.commit_remove(range);
        Ok(())
    }
}

/// A conflicting lock is `EAGAIN` on some hosts and `EACCES` on others.
fn lock_error(context: &'static str, err: std::io::Error) -> AdvisoryLockError {
    let errno = match io_errno(context, &err) {
        Errno::Access => Errno::Again,
        errno => errno,
    };
    map_errno(context, errno)
}
