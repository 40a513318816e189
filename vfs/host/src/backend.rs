use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use enumset::EnumSet;
use filetime::FileTime;
use vfs_core::op::*;
use vfs_core::{
    AccessMode, AdvisoryLockKind, BaseDirectory, DescriptorNotOpen, Fd, FdTableConfig,
    FileDescriptorTable, FileSystemBackend, LockRange, OpenFileFlags, OpenHandle, ResolveError,
    ResolvedBase, StructStat, Timespec, join_relative, preflight,
};

use crate::handle::HostHandle;
use crate::{io_result, platform};

/// Backend built on the portable `std::fs` API.
///
/// Relative paths are joined to the path a directory descriptor was opened
/// with, so renaming that directory on the host is not tracked. An absolute
/// path ignores the base directory.
pub struct HostFileSystem {
    table: FileDescriptorTable<HostHandle>,
}

impl Default for HostFileSystem {
    fn default() -> Self {
        Self::new(FdTableConfig::default())
    }
}

impl HostFileSystem {
    pub fn new(config: FdTableConfig) -> Self {
        Self {
            table: FileDescriptorTable::new(config),
        }
    }

    /// Advisory locks held through `fd`.
    pub fn lock_records(
        &self,
        fd: Fd,
    ) -> Result<Vec<(LockRange, AdvisoryLockKind)>, DescriptorNotOpen> {
        self.table.with_handle(fd, HostHandle::lock_records)
    }

    fn resolve(
        &self,
        path: &Path,
        base: BaseDirectory,
        allow_empty_path: bool,
    ) -> Result<PathBuf, ResolveError> {
        match preflight(path, base, allow_empty_path)? {
            ResolvedBase::Absolute(path) => Ok(path.to_path_buf()),
            ResolvedBase::CurrentWorkingDirectory(path) => Ok(join_relative(Path::new("."), path)),
            ResolvedBase::DirectoryFd(fd, path) => self
                .table
                .with_directory(fd, |directory| join_relative(directory.path(), path)),
        }
    }

    fn open_file(path: &Path, input: &Open, access: AccessMode) -> Result<File, OpenError> {
        let flags = input.flags;
        let read_only = access == AccessMode::ReadOnly;
        if flags.has(OpenFileFlags::CREAT) && read_only {
            // `std` refuses to create without write access. A missing file is
            // created write-only and reopened read-only; an existing one is
            // opened as is.
            let exclusive = flags.has(OpenFileFlags::EXCL);
            let missing = matches!(
                fs::metadata(path),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound
            );
            if exclusive || missing {
                let mut create = OpenOptions::new();
                create.write(true);
                if exclusive {
                    create.create_new(true);
                } else {
                    create.create(true);
                }
                platform::apply_open_flags(&mut create, flags, input.mode);
                drop(io_result::<_, OpenError>("host.open.create", create.open(path))?);
            }
        }

        // `append` implies write access in `std`, so it is left off a
        // read-only open; the handle refuses writes either way.
        let mut options = OpenOptions::new();
        options
            .read(access != AccessMode::WriteOnly)
            .write(!read_only)
            .append(flags.has(OpenFileFlags::APPEND) && !read_only)
            .truncate(flags.has(OpenFileFlags::TRUNC));
        if flags.has(OpenFileFlags::CREAT) && !read_only {
            if flags.has(OpenFileFlags::EXCL) {
                options.create_new(true);
            } else {
                options.create(true);
            }
        }
        platform::apply_open_flags(&mut options, flags, input.mode);
        io_result("host.open", options.open(path))
    }

    fn open_directory(path: &Path, input: &Open, access: AccessMode) -> Result<File, OpenError> {
        if input.flags.has(OpenFileFlags::CREAT) {
            return Err(OpenError::InvalidArgument(
                "host.open: O_CREAT with O_DIRECTORY".to_string(),
            ));
        }
        if access != AccessMode::ReadOnly {
            return Err(OpenError::PathIsDirectory(format!(
                "host.open: `{}` cannot be opened for writing",
                path.display()
            )));
        }
        let meta = io_result::<_, OpenError>(
            "host.open.directory",
            if input.flags.has(OpenFileFlags::NOFOLLOW) {
                fs::symlink_metadata(path)
            } else {
                fs::metadata(path)
            },
        )?;
        if !meta.is_dir() {
            return Err(OpenError::NotDirectory(format!(
                "host.open: `{}` is not a directory",
                path.display()
            )));
        }
        io_result("host.open.directory", File::open(path))
    }

    /// Missing timestamps keep their current value.
    fn file_times(
        meta: impl FnOnce() -> std::io::Result<fs::Metadata>,
        atime: Option<Timespec>,
        mtime: Option<Timespec>,
    ) -> std::io::Result<(FileTime, FileTime)> {
        let to_file_time = |time: Timespec| FileTime::from_unix_time(time.seconds, time.nanoseconds);
        match (atime, mtime) {
            (Some(atime), Some(mtime)) => Ok((to_file_time(atime), to_file_time(mtime))),
            (atime, mtime) => {
                let meta = meta()?;
                Ok((
                    atime.map_or_else(|| FileTime::from_last_access_time(&meta), to_file_time),
                    mtime.map_or_else(
                        || FileTime::from_last_modification_time(&meta),
                        to_file_time,
                    ),
                ))
            }
        }
    }
}

impl FileSystemBackend for HostFileSystem {
    fn name(&self) -> &'static str {
        "host"
    }

    fn supported_operations(&self) -> EnumSet<OperationKind> {
        let mut supported = EnumSet::all();
        if !platform::SUPPORTS_ADVISORY_LOCKS {
            supported.remove(OperationKind::AddAdvisoryLockFd);
            supported.remove(OperationKind::RemoveAdvisoryLockFd);
        }
        supported
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
        let flags = input.flags;
        let rejected =
            flags.unsupported() | (flags & (OpenFileFlags::NONBLOCK | OpenFileFlags::ASYNC));
        if !rejected.is_empty() {
            return Err(OpenError::InvalidArgument(format!(
                "host.open: unsupported flags {rejected:?}"
            )));
        }
        let access = flags.access_mode().ok_or_else(|| {
            OpenError::InvalidArgument(format!("host.open: invalid access mode in {flags:?}"))
        })?;
        let path = self.resolve(&input.path, input.base_directory, false)?;

        let directory = flags.has(OpenFileFlags::DIRECTORY);
        let file = if directory {
            Self::open_directory(&path, input, access)?
        } else {
            Self::open_file(&path, input, access)?
        };
        let directory = directory
            || io_result::<_, OpenError>("host.open.metadata", file.metadata())?.is_dir();
        let fd = self.table.add(HostHandle::new(file, path, directory, access))?;
        tracing::debug!(%fd, path = %input.path.display(), "opened");
        Ok(fd)
    }

    fn close(&self, input: &Close) -> Result<(), CloseError> {
        let handle = self.table.remove(input.fd)?;
        // In-flight calls on other threads keep the file open until they
        // return; the descriptor is already gone for everybody else.
        drop(handle);
        Ok(())
    }

    fn read_fd(&self, input: &mut ReadFd<'_>) -> Result<u64, ReadError> {
        let fd = input.fd;
        let strategy = input.strategy;
        let iovecs = &mut input.iovecs;
        self.table
            .with_handle(fd, |handle| handle.read(iovecs, strategy))?
    }

    fn write_fd(&self, input: &WriteFd<'_>) -> Result<u64, WriteError> {
        self.table
            .with_handle(input.fd, |handle| handle.write(&input.cvecs, input.strategy))?
    }

    fn seek_fd(&self, input: &SeekFd) -> Result<u64, SeekError> {
        self.table
            .with_handle(input.fd, |handle| handle.seek(input.offset, input.whence))?
    }

    fn stat(&self, input: &Stat) -> Result<StructStat, StatError> {
        let path = self.resolve(&input.path, input.base_directory, false)?;
        let meta = if input.follow_symlinks {
            fs::metadata(&path)
        } else {
            fs::symlink_metadata(&path)
        };
        let meta = io_result::<_, StatError>("host.stat", meta)?;
        Ok(platform::stat_from_metadata(&meta, &path))
    }

    fn stat_fd(&self, input: &StatFd) -> Result<StructStat, StatError> {
        self.table.with_handle(input.fd, |handle| -> Result<_, StatError> {
            let meta = io_result::<_, StatError>("host.fstat", handle.file().metadata())?;
            Ok(platform::stat_from_metadata(&meta, handle.path()))
        })?
    }

    fn chmod(&self, input: &Chmod) -> Result<(), ChmodError> {
        let path = self.resolve(&input.path, input.base_directory, false)?;
        let meta = io_result::<_, ChmodError>("host.chmod", fs::symlink_metadata(&path))?;
        let meta = if meta.file_type().is_symlink() {
            if !input.follow_symlinks {
                return Err(ChmodError::NotSupported(format!(
                    "host.chmod: `{}` is a symbolic link",
                    path.display()
                )));
            }
            io_result::<_, ChmodError>("host.chmod", fs::metadata(&path))?
        } else {
            meta
        };
        let permissions = platform::permissions(input.mode, meta.permissions());
        io_result("host.chmod", fs::set_permissions(&path, permissions))
    }

    fn chmod_fd(&self, input: &ChmodFd) -> Result<(), ChmodError> {
        self.table.with_handle(input.fd, |handle| -> Result<(), ChmodError> {
            let file = handle.file();
            let current = io_result::<_, ChmodError>("host.fchmod", file.metadata())?;
            let permissions = platform::permissions(input.mode, current.permissions());
            io_result("host.fchmod", file.set_permissions(permissions))
        })?
    }

    fn chown(&self, input: &Chown) -> Result<(), ChownError> {
        let path = self.resolve(&input.path, input.base_directory, false)?;
        io_result(
            "host.chown",
            platform::chown(&path, input.owner, input.group, input.follow_symlinks),
        )
    }

    fn chown_fd(&self, input: &ChownFd) -> Result<(), ChownError> {
        self.table.with_handle(input.fd, |handle| {
            io_result(
                "host.fchown",
                platform::fchown(handle.file(), input.owner, input.group),
            )
        })?
    }

    fn mkdir(&self, input: &Mkdir) -> Result<(), MkdirError> {
        let path = self.resolve(&input.path, input.base_directory, false)?;
        io_result("host.mkdir", platform::mkdir(&path, input.mode))
    }

    fn unlink_file(&self, input: &UnlinkFile) -> Result<(), UnlinkError> {
        let path = self.resolve(&input.path, input.base_directory, false)?;
        io_result("host.unlink", fs::remove_file(&path))
    }

    fn unlink_directory(&self, input: &UnlinkDirectory) -> Result<(), UnlinkError> {
        let path = self.resolve(&input.path, input.base_directory, false)?;
        io_result("host.rmdir", fs::remove_dir(&path))
    }

    fn read_link(&self, input: &ReadLink) -> Result<PathBuf, ReadLinkError> {
        let path = self.resolve(&input.path, input.base_directory, false)?;
        io_result("host.readlink", fs::read_link(&path))
    }

    fn set_timestamp(&self, input: &SetTimestamp) -> Result<(), SetTimestampError> {
        let path = self.resolve(&input.path, input.base_directory, false)?;
        let follow = input.follow_symlinks;
        let metadata = || {
            if follow {
                fs::metadata(&path)
            } else {
                fs::symlink_metadata(&path)
            }
        };
        let (atime, mtime) = io_result::<_, SetTimestampError>(
            "host.utimensat",
            Self::file_times(metadata, input.atime, input.mtime),
        )?;
        let result = if follow {
            filetime::set_file_times(&path, atime, mtime)
        } else {
            filetime::set_symlink_file_times(&path, atime, mtime)
        };
        io_result("host.utimensat", result)
    }

    fn set_timestamp_fd(&self, input: &SetTimestampFd) -> Result<(), SetTimestampError> {
        self.table.with_handle(input.fd, |handle| {
            let to_file_time =
                |time: Timespec| FileTime::from_unix_time(time.seconds, time.nanoseconds);
            io_result(
                "host.futimens",
                filetime::set_file_handle_times(
                    handle.file(),
                    input.atime.map(to_file_time),
                    input.mtime.map(to_file_time),
                ),
            )
        })?
    }

    fn sync_fd(&self, input: &SyncFd) -> Result<(), SyncError> {
        self.table.with_handle(input.fd, |handle| {
            let file = handle.file();
            if input.sync_metadata {
                io_result("host.fsync", file.sync_all())
            } else {
                io_result("host.fdatasync", file.sync_data())
            }
        })?
    }

    fn truncate_fd(&self, input: &TruncateFd) -> Result<(), TruncateError> {
        if input.length > i64::MAX as u64 {
            return Err(TruncateError::FileTooBig(format!(
                "host.ftruncate: length {} exceeds the largest file offset",
                input.length
            )));
        }
        self.table.with_handle(input.fd, |handle| {
            io_result("host.ftruncate", handle.file().set_len(input.length))
        })?
    }

    fn check_access(&self, input: &CheckAccess) -> Result<(), CheckAccessError> {
        let path = self.resolve(&input.path, input.base_directory, input.allow_empty_path)?;
        io_result(
            "host.faccessat",
            platform::check_access(
                &path,
                input.mode,
                input.use_effective_user_id,
                input.follow_symlinks,
            ),
        )
    }

    fn add_advisory_lock_fd(&self, input: &AddAdvisoryLockFd) -> Result<(), AdvisoryLockError> {
        self.table
            .with_handle(input.fd, |handle| handle.add_lock(&input.lock))?
    }

    fn remove_advisory_lock_fd(
        &self,
        input: &RemoveAdvisoryLockFd,
    ) -> Result<(), AdvisoryLockError> {
        self.table
            .with_handle(input.fd, |handle| handle.remove_lock(&input.lock))?
    }

    fn get_current_working_directory(
        &self,
        _input: &GetCurrentWorkingDirectory,
    ) -> Result<PathBuf, GetCwdError> {
        io_result("host.getcwd", std::env::current_dir())
    }
}
