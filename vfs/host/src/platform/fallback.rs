//! Hosts without POSIX extensions. Values the platform does not expose are
//! derived from what `std::fs::Metadata` offers.

use std::collections::hash_map::DefaultHasher;
use std::fs::{self, File, OpenOptions, Permissions};
use std::hash::{Hash, Hasher};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::SystemTime;

use vfs_core::{
    AdvisoryLockKind, FileAccessibilityCheck, FileMode, FileType, LockRange, OpenFileFlags,
    StructStat, Timespec,
};

pub(crate) const SUPPORTS_ADVISORY_LOCKS: bool = false;
pub(crate) const NATIVE_POSITIONED_IO: bool = false;

pub(crate) fn apply_open_flags(_options: &mut OpenOptions, _flags: OpenFileFlags, _mode: FileMode) {}

/// Positioned read emulated with seeks. The caller holds the handle's I/O
/// lock, so no other position-dependent call observes the temporary offset.
pub(crate) fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    let mut file = file;
    let saved = file.stream_position()?;
    file.seek(SeekFrom::Start(offset))?;
    let result = file.read(buf);
    file.seek(SeekFrom::Start(saved))?;
    result
}

pub(crate) fn write_at(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    let mut file = file;
    let saved = file.stream_position()?;
    file.seek(SeekFrom::Start(offset))?;
    let result = file.write(buf);
    file.seek(SeekFrom::Start(saved))?;
    result
}

/// `dev` and `rdev` are fixed to 1 and the inode is a hash of the path.
pub(crate) fn stat_from_metadata(meta: &fs::Metadata, path: &Path) -> StructStat {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    let file_type = if meta.is_dir() {
        FileType::Directory
    } else if meta.file_type().is_symlink() {
        FileType::SymbolicLink
    } else if meta.is_file() {
        FileType::RegularFile
    } else {
        FileType::Unknown
    };
    let mut mode = if meta.permissions().readonly() {
        0o444
    } else {
        0o666
    };
    if meta.is_dir() {
        mode |= 0o111;
    }
    let time = |time: io::Result<SystemTime>| {
        time.map(Timespec::from_system_time).unwrap_or_default()
    };
    let mtime = time(meta.modified());
    StructStat {
        dev: 1,
        ino: hasher.finish(),
        file_type,
        mode: FileMode::from_raw(mode),
        nlink: 1,
        uid: 0,
        gid: 0,
        rdev: 1,
        size: meta.len(),
        blksize: StructStat::FALLBACK_BLOCK_SIZE,
        blocks: StructStat::blocks_for_size(meta.len()),
        atime: time(meta.accessed()),
        mtime,
        // No change time; creation time is the closest thing.
        ctime: meta.created().map(Timespec::from_system_time).unwrap_or(mtime),
    }
}

pub(crate) fn permissions(mode: FileMode, mut current: Permissions) -> Permissions {
    current.set_readonly(!mode.contains(FileMode::S_IWUSR));
    current
}

pub(crate) fn chown(
    _path: &Path,
    _owner: Option<u32>,
    _group: Option<u32>,
    _follow_symlinks: bool,
) -> io::Result<()> {
    Err(io::ErrorKind::Unsupported.into())
}

pub(crate) fn fchown(_file: &File, _owner: Option<u32>, _group: Option<u32>) -> io::Result<()> {
    Err(io::ErrorKind::Unsupported.into())
}

pub(crate) fn mkdir(path: &Path, _mode: FileMode) -> io::Result<()> {
    fs::create_dir(path)
}

/// Only existence and the read-only attribute are observable.
pub(crate) fn check_access(
    path: &Path,
    check: FileAccessibilityCheck,
    _effective_ids: bool,
    follow_symlinks: bool,
) -> io::Result<()> {
    let meta = if follow_symlinks {
        fs::metadata(path)?
    } else {
        fs::symlink_metadata(path)?
    };
    if check.contains(FileAccessibilityCheck::WRITABLE) && meta.permissions().readonly() {
        return Err(io::ErrorKind::PermissionDenied.into());
    }
    Ok(())
}

pub(crate) fn set_advisory_lock(
    _file: &File,
    _kind: Option<AdvisoryLockKind>,
    _range: LockRange,
) -> io::Result<()> {
    Err(io::ErrorKind::Unsupported.into())
}
