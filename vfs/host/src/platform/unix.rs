use std::ffi::CString;
use std::fs::{self, DirBuilder, File, OpenOptions, Permissions};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{DirBuilderExt, FileExt, MetadataExt, OpenOptionsExt, PermissionsExt};
use std::os::unix::io::AsRawFd;
use std::path::Path;

use vfs_core::{
    AdvisoryLockKind, FileAccessibilityCheck, FileMode, FileType, LockRange, OpenFileFlags,
    StructStat, Timespec,
};

pub(crate) const SUPPORTS_ADVISORY_LOCKS: bool = true;
pub(crate) const NATIVE_POSITIONED_IO: bool = true;

/// Flags `OpenOptions` has no builder method for.
pub(crate) fn apply_open_flags(options: &mut OpenOptions, flags: OpenFileFlags, mode: FileMode) {
    let mut custom = 0;
    if flags.has(OpenFileFlags::NOFOLLOW) {
        custom |= libc::O_NOFOLLOW;
    }
    if flags.has(OpenFileFlags::SYNC) {
        custom |= libc::O_SYNC;
    } else if flags.has(OpenFileFlags::DSYNC) {
        custom |= libc::O_DSYNC;
    }
    options.custom_flags(custom).mode(mode.bits());
}

pub(crate) fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    file.read_at(buf, offset)
}

pub(crate) fn write_at(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    file.write_at(buf, offset)
}

pub(crate) fn stat_from_metadata(meta: &fs::Metadata, _path: &Path) -> StructStat {
    StructStat {
        dev: meta.dev(),
        ino: meta.ino(),
        file_type: FileType::from_mode(meta.mode()),
        mode: FileMode::from_raw(meta.mode()),
        nlink: meta.nlink(),
        uid: meta.uid(),
        gid: meta.gid(),
        rdev: meta.rdev(),
        size: meta.size(),
        blksize: meta.blksize(),
        blocks: meta.blocks(),
        atime: Timespec::new(meta.atime(), meta.atime_nsec() as u32),
        mtime: Timespec::new(meta.mtime(), meta.mtime_nsec() as u32),
        ctime: Timespec::new(meta.ctime(), meta.ctime_nsec() as u32),
    }
}

pub(crate) fn permissions(mode: FileMode, _current: Permissions) -> Permissions {
    Permissions::from_mode(mode.bits())
}

pub(crate) fn chown(
    path: &Path,
    owner: Option<u32>,
    group: Option<u32>,
    follow_symlinks: bool,
) -> io::Result<()> {
    if follow_symlinks {
        std::os::unix::fs::chown(path, owner, group)
    } else {
        std::os::unix::fs::lchown(path, owner, group)
    }
}

pub(crate) fn fchown(file: &File, owner: Option<u32>, group: Option<u32>) -> io::Result<()> {
    std::os::unix::fs::fchown(file, owner, group)
}

pub(crate) fn mkdir(path: &Path, mode: FileMode) -> io::Result<()> {
    DirBuilder::new().mode(mode.bits()).create(path)
}

/// `faccessat(AT_FDCWD, ..)`.
pub(crate) fn check_access(
    path: &Path,
    check: FileAccessibilityCheck,
    effective_ids: bool,
    follow_symlinks: bool,
) -> io::Result<()> {
    let cstr = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL"))?;
    let mut mode = libc::F_OK;
    if check.contains(FileAccessibilityCheck::READABLE) {
        mode |= libc::R_OK;
    }
    if check.contains(FileAccessibilityCheck::WRITABLE) {
        mode |= libc::W_OK;
    }
    if check.contains(FileAccessibilityCheck::EXECUTABLE) {
        mode |= libc::X_OK;
    }
    let mut flags = 0;
    if effective_ids {
        flags |= libc::AT_EACCESS;
    }
    if !follow_symlinks {
        flags |= libc::AT_SYMLINK_NOFOLLOW;
    }
    let res = unsafe { libc::faccessat(libc::AT_FDCWD, cstr.as_ptr(), mode, flags) };
    if res < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

pub(crate) fn set_advisory_lock(
    file: &File,
    kind: Option<AdvisoryLockKind>,
    range: LockRange,
) -> io::Result<()> {
    vfs_unix::set_advisory_lock(file.as_raw_fd(), kind, range)
}
