use std::os::fd::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use enumset::EnumSet;
use vfs_core::op::*;
use vfs_core::{
    AdvisoryLockKind, BaseDirectory, DescriptorNotOpen, Fd, FdTableConfig, FileAccessibilityCheck,
    FileDescriptorTable, FileMode, FileSystemBackend, FileType, LockRange, OpenHandle,
    ResolveError, ResolvedBase, StructStat, Timespec, join_relative, preflight,
};

use crate::handle::NativeHandle;
use crate::{os_result, sys};

/// Backend issuing Linux syscalls on host descriptors.
pub struct NativeFileSystem {
    table: FileDescriptorTable<NativeHandle>,
}

impl Default for NativeFileSystem {
    fn default() -> Self {
        Self::new(FdTableConfig::default())
    }
}

impl NativeFileSystem {
    pub fn new(config: FdTableConfig) -> Self {
        Self {
            table: FileDescriptorTable::new(config),
        }
    }

    pub fn lock_records(
        &self,
        fd: Fd,
    ) -> Result<Vec<(LockRange, AdvisoryLockKind)>, DescriptorNotOpen> {
        self.table.with_handle(fd, NativeHandle::lock_records)
    }

    /// Run `f` with the host directory descriptor and path the kernel should
    /// resolve. The base handle stays alive until `f` returns.
    fn at<T, E>(
        &self,
        path: &Path,
        base: BaseDirectory,
        allow_empty_path: bool,
        f: impl FnOnce(RawFd, &Path) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<ResolveError>,
    {
        let here = Path::new(".");
        match preflight(path, base, allow_empty_path)? {
            ResolvedBase::Absolute(path) => f(libc::AT_FDCWD, path),
            ResolvedBase::CurrentWorkingDirectory(path) => {
                f(libc::AT_FDCWD, if path.as_os_str().is_empty() { here } else { path })
            }
            ResolvedBase::DirectoryFd(fd, path) => {
                let path = if path.as_os_str().is_empty() { here } else { path };
                self.table
                    .with_directory(fd, |directory| f(directory.as_raw_fd(), path))?
            }
        }
    }

    /// Path recorded on a new handle, for diagnostics only.
    fn handle_path(&self, path: &Path, base: BaseDirectory) -> PathBuf {
        match base {
            BaseDirectory::DirectoryFd(fd) if path.is_relative() => self
                .table
                .with_handle(fd, |directory| join_relative(directory.path(), path))
                .unwrap_or_else(|_| path.to_path_buf()),
            _ => path.to_path_buf(),
        }
    }

    fn with_fd<T, E>(&self, fd: Fd, f: impl FnOnce(&NativeHandle) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DescriptorNotOpen>,
    {
        self.table.with_handle(fd, f)?
    }
}

fn no_follow(follow_symlinks: bool) -> libc::c_int {
    if follow_symlinks {
        0
    } else {
        libc::AT_SYMLINK_NOFOLLOW
    }
}

fn timespec(seconds: i64, nanoseconds: i64) -> Timespec {
    Timespec::new(seconds, nanoseconds as u32)
}

fn stat_from_libc(st: &libc::stat) -> StructStat {
    let mode = st.st_mode as u32;
    StructStat {
        dev: st.st_dev as u64,
        ino: st.st_ino as u64,
        file_type: FileType::from_mode(mode),
        mode: FileMode::from_raw(mode),
        nlink: st.st_nlink as u64,
        uid: st.st_uid,
        gid: st.st_gid,
        rdev: st.st_rdev as u64,
        size: st.st_size as u64,
        blksize: st.st_blksize as u64,
        blocks: st.st_blocks as u64,
        atime: timespec(st.st_atime as i64, st.st_atime_nsec as i64),
        mtime: timespec(st.st_mtime as i64, st.st_mtime_nsec as i64),
        ctime: timespec(st.st_ctime as i64, st.st_ctime_nsec as i64),
    }
}

fn access_mode(check: FileAccessibilityCheck) -> libc::c_int {
    if check.is_empty() {
        return libc::F_OK;
    }
    let mut mode = 0;
    if check.contains(FileAccessibilityCheck::READABLE) {
        mode |= libc::R_OK;
    }
    if check.contains(FileAccessibilityCheck::WRITABLE) {
        mode |= libc::W_OK;
    }
    if check.contains(FileAccessibilityCheck::EXECUTABLE) {
        mode |= libc::X_OK;
    }
    mode
}

impl FileSystemBackend for NativeFileSystem {
    fn name(&self) -> &'static str {
        "native"
    }

    fn supported_operations(&self) -> EnumSet<OperationKind> {
        EnumSet::all()
    }

    fn live_descriptors(&self) -> Vec<Fd> {
        self.table.live_descriptors()
    }

    fn close_all(&self) -> usize {
        let handles = self.table.drain();
        for (fd, handle) in &handles {
            tracing::trace!(%fd, path = %handle.path().display(), "force-closing descriptor");
        }
        handles.len()
    }

    fn open(&self, input: &Open) -> Result<Fd, OpenError> {
        let flags = vfs_unix::open_flags_to_host(input.flags).map_err(|rejected| {
            OpenError::InvalidArgument(format!("native.open: unsupported flags {rejected:?}"))
        })?;
        let mode = vfs_unix::mode_to_host(input.mode);
        let fd = self.at(&input.path, input.base_directory, false, |dirfd, path| {
            os_result::<_, OpenError>("native.openat", sys::openat(dirfd, path, flags, mode))
        })?;
        let path = self.handle_path(&input.path, input.base_directory);
        let stat = os_result::<_, OpenError>("native.open.fstat", sys::fstat(fd.as_raw_fd()))?;
        let directory = FileType::from_mode(stat.st_mode as u32) == FileType::Directory;
        let fd = self.table.add(NativeHandle::new(fd, path, directory))?;
        tracing::debug!(%fd, path = %input.path.display(), "opened");
        Ok(fd)
    }

    fn close(&self, input: &Close) -> Result<(), CloseError> {
        let handle = self.table.remove(input.fd)?;
        match Arc::try_unwrap(handle) {
            Ok(handle) => handle.close(),
            // Another thread is inside a call on this handle; the host
            // descriptor closes when that call returns.
            Err(_in_use) => Ok(()),
        }
    }

    fn read_fd(&self, input: &mut ReadFd<'_>) -> Result<u64, ReadError> {
        let strategy = input.strategy;
        let iovecs = &mut input.iovecs;
        self.with_fd(input.fd, |handle| handle.read(iovecs, strategy))
    }

    fn write_fd(&self, input: &WriteFd<'_>) -> Result<u64, WriteError> {
        self.with_fd(input.fd, |handle| handle.write(&input.cvecs, input.strategy))
    }

    fn seek_fd(&self, input: &SeekFd) -> Result<u64, SeekError> {
        self.with_fd(input.fd, |handle| handle.seek(input.offset, input.whence))
    }

    fn stat(&self, input: &Stat) -> Result<StructStat, StatError> {
        let flags = no_follow(input.follow_symlinks);
        self.at(&input.path, input.base_directory, false, |dirfd, path| -> Result<_, StatError> {
            let st = os_result::<_, StatError>("native.fstatat", sys::fstatat(dirfd, path, flags))?;
            Ok(stat_from_libc(&st))
        })
    }

    fn stat_fd(&self, input: &StatFd) -> Result<StructStat, StatError> {
        self.with_fd(input.fd, |handle| -> Result<_, StatError> {
            let st = os_result::<_, StatError>("native.fstat", sys::fstat(handle.as_raw_fd()))?;
            Ok(stat_from_libc(&st))
        })
    }

    /// Linux cannot change the mode of a symbolic link itself.
    fn chmod(&self, input: &Chmod) -> Result<(), ChmodError> {
        let mode = vfs_unix::mode_to_host(input.mode);
        self.at(&input.path, input.base_directory, false, |dirfd, path| -> Result<(), ChmodError> {
            if !input.follow_symlinks {
                let st = os_result::<_, ChmodError>(
                    "native.chmod.fstatat",
                    sys::fstatat(dirfd, path, libc::AT_SYMLINK_NOFOLLOW),
                )?;
                if FileType::from_mode(st.st_mode as u32) == FileType::SymbolicLink {
                    return Err(ChmodError::NotSupported(format!(
                        "native.fchmodat: `{}` is a symbolic link",
                        path.display()
                    )));
                }
            }
            os_result("native.fchmodat", sys::fchmodat(dirfd, path, mode))
        })
    }

    fn chmod_fd(&self, input: &ChmodFd) -> Result<(), ChmodError> {
        let mode = vfs_unix::mode_to_host(input.mode);
        self.with_fd(input.fd, |handle| {
            os_result("native.fchmod", sys::fchmod(handle.as_raw_fd(), mode))
        })
    }

    fn chown(&self, input: &Chown) -> Result<(), ChownError> {
        let flags = no_follow(input.follow_symlinks);
        self.at(&input.path, input.base_directory, false, |dirfd, path| {
            os_result(
                "native.fchownat",
                sys::fchownat(dirfd, path, input.owner, input.group, flags),
            )
        })
    }

    fn chown_fd(&self, input: &ChownFd) -> Result<(), ChownError> {
        self.with_fd(input.fd, |handle| {
            os_result(
                "native.fchown",
                sys::fchown(handle.as_raw_fd(), input.owner, input.group),
            )
        })
    }

    fn set_timestamp(&self, input: &SetTimestamp) -> Result<(), SetTimestampError> {
        let flags = no_follow(input.follow_symlinks);
        self.at(&input.path, input.base_directory, false, |dirfd, path| {
            os_result(
                "native.utimensat",
                sys::utimensat(dirfd, path, input.atime, input.mtime, flags),
            )
        })
    }

    fn set_timestamp_fd(&self, input: &SetTimestampFd) -> Result<(), SetTimestampError> {
        self.with_fd(input.fd, |handle| {
            os_result(
                "native.futimens",
                sys::futimens(handle.as_raw_fd(), input.atime, input.mtime),
            )
        })
    }

    fn sync_fd(&self, input: &SyncFd) -> Result<(), SyncError> {
        self.with_fd(input.fd, |handle| {
            os_result(
                "native.fsync",
                sys::fsync(handle.as_raw_fd(), input.sync_metadata),
            )
        })
    }

    fn truncate_fd(&self, input: &TruncateFd) -> Result<(), TruncateError> {
        if i64::try_from(input.length).is_err() {
            return Err(TruncateError::FileTooBig(format!(
                "native.ftruncate: length {} does not fit an off_t",
                input.length
            )));
        }
        self.with_fd(input.fd, |handle| {
            os_result(
                "native.ftruncate",
                sys::ftruncate(handle.as_raw_fd(), input.length),
            )
        })
    }

    fn mkdir(&self, input: &Mkdir) -> Result<(), MkdirError> {
        let mode = vfs_unix::mode_to_host(input.mode);
        self.at(&input.path, input.base_directory, false, |dirfd, path| {
            os_result("native.mkdirat", sys::mkdirat(dirfd, path, mode))
        })
    }

    fn unlink_file(&self, input: &UnlinkFile) -> Result<(), UnlinkError> {
        self.at(&input.path, input.base_directory, false, |dirfd, path| {
            os_result("native.unlinkat", sys::unlinkat(dirfd, path, 0))
        })
    }

    fn unlink_directory(&self, input: &UnlinkDirectory) -> Result<(), UnlinkError> {
        self.at(&input.path, input.base_directory, false, |dirfd, path| {
            os_result(
                "native.unlinkat",
                sys::unlinkat(dirfd, path, libc::AT_REMOVEDIR),
            )
        })
    }

    fn read_link(&self, input: &ReadLink) -> Result<PathBuf, ReadLinkError> {
        self.at(&input.path, input.base_directory, false, |dirfd, path| {
            os_result("native.readlinkat", sys::readlinkat(dirfd, path))
        })
    }

    fn check_access(&self, input: &CheckAccess) -> Result<(), CheckAccessError> {
        let mode = access_mode(input.mode);
        let mut flags = no_follow(input.follow_symlinks);
        if input.use_effective_user_id {
            flags |= libc::AT_EACCESS;
        }
        self.at(
            &input.path,
            input.base_directory,
            input.allow_empty_path,
            |dirfd, path| os_result("native.faccessat", sys::faccessat(dirfd, path, mode, flags)),
        )
    }

    fn add_advisory_lock_fd(&self, input: &AddAdvisoryLockFd) -> Result<(), AdvisoryLockError> {
        self.with_fd(input.fd, |handle| handle.add_lock(&input.lock))
    }

    fn remove_advisory_lock_fd(
        &self,
        input: &RemoveAdvisoryLockFd,
    ) -> Result<(), AdvisoryLockError> {
        self.with_fd(input.fd, |handle| handle.remove_lock(&input.lock))
    }

    fn get_current_working_directory(
        &self,
        _input: &GetCurrentWorkingDirectory,
    ) -> Result<PathBuf, GetCwdError> {
        os_result("native.getcwd", sys::getcwd())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vfs_core::{Errno, OpenFileFlags, OperationError};

    #[test]
    fn access_mode_bits() {
        assert_eq!(access_mode(FileAccessibilityCheck::empty()), libc::F_OK);
        assert_eq!(
            access_mode(FileAccessibilityCheck::READABLE | FileAccessibilityCheck::WRITABLE),
            libc::R_OK | libc::W_OK
        );
        assert_eq!(access_mode(FileAccessibilityCheck::EXECUTABLE), libc::X_OK);
    }

    #[test]
    fn unsupported_flags_are_invalid() {
        let fs = NativeFileSystem::default();
        for flag in [
            OpenFileFlags::DIRECT,
            OpenFileFlags::PATH,
            OpenFileFlags::TMPFILE,
            OpenFileFlags::NOATIME,
        ] {
            let err = fs
                .open(&Open {
                    path: PathBuf::from("/nonexistent/x"),
                    base_directory: BaseDirectory::Absolute,
                    flags: OpenFileFlags::RDWR | flag,
                    mode: FileMode::empty(),
                })
                .unwrap_err();
            assert_eq!(err.errno(), Errno::Inval, "{flag:?}");
        }
    }

    #[test]
    fn closed_base_directory() {
        let fs = NativeFileSystem::default();
        let err = fs
            .stat(&Stat {
                path: PathBuf::from("x"),
                base_directory: BaseDirectory::DirectoryFd(Fd(7)),
                follow_symlinks: true,
            })
            .unwrap_err();
        assert!(matches!(err, StatError::BadFileDescriptor(_)));
    }

    #[test]
    fn truncate_rejects_lengths_beyond_off_t() {
        let fs = NativeFileSystem::default();
        let err = fs
            .truncate_fd(&TruncateFd {
                fd: Fd(3),
                length: u64::MAX,
            })
            .unwrap_err();
        assert!(matches!(err, TruncateError::FileTooBig(_)));
    }
}
