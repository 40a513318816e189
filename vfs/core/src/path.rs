//! Base directories and the backend-independent part of path resolution.
//!
//! Resolution order is fixed for every backend:
//!
//! 1. an empty path is rejected with `EmptyPath` unless the caller allows it,
//!    before the base directory is looked at;
//! 2. an absolute path is used as-is and the base directory is ignored, even
//!    when it names a closed descriptor (POSIX `openat` behaviour);
//! 3. a relative path with [`BaseDirectory::Absolute`] is `RelativePath`;
//! 4. otherwise the path is joined to the working directory or to the
//!    directory behind the descriptor, which the backend validates.

use crate::error::ResolveError;
use crate::ids::Fd;
use std::path::{Component, Path, PathBuf};

/// `AT_FDCWD` as passed by Emscripten guests.
pub const AT_FDCWD: i32 = -100;

/// Directory a relative path is resolved against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BaseDirectory {
    /// The path must be self-contained.
    Absolute,
    CurrentWorkingDirectory,
    /// The path is relative to the directory opened as `Fd`.
    DirectoryFd(Fd),
}

impl BaseDirectory {
    /// Decode a raw `dirfd` argument.
    pub fn from_raw_dir_fd(raw: i32) -> Self {
        if raw == AT_FDCWD {
            BaseDirectory::CurrentWorkingDirectory
        } else {
            BaseDirectory::DirectoryFd(Fd(raw))
        }
    }
}

/// Outcome of [`preflight`]: where the backend has to anchor the path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolvedBase<'a> {
    /// Absolute path, use it directly.
    Absolute(&'a Path),
    /// Relative to the process working directory.
    CurrentWorkingDirectory(&'a Path),
    /// Relative to an open directory descriptor. The backend still has to
    /// check that the descriptor is open and is a directory.
    DirectoryFd(Fd, &'a Path),
}

/// Apply the backend-independent resolution rules.
pub fn preflight(
    path: &Path,
    base: BaseDirectory,
    allow_empty_path: bool,
) -> Result<ResolvedBase<'_>, ResolveError> {
    if path.as_os_str().is_empty() && !allow_empty_path {
        return Err(ResolveError::EmptyPath("empty path".to_string()));
    }
    if path.is_absolute() {
        return Ok(ResolvedBase::Absolute(path));
    }
    match base {
        BaseDirectory::Absolute => Err(ResolveError::RelativePath(format!(
            "path `{}` is not absolute",
            path.display()
        ))),
        BaseDirectory::CurrentWorkingDirectory => Ok(ResolvedBase::CurrentWorkingDirectory(path)),
        BaseDirectory::DirectoryFd(fd) => Ok(ResolvedBase::DirectoryFd(fd, path)),
    }
}

/// Join `path` onto a directory path. An empty `path` names the directory
/// itself.
pub fn join_relative(directory: &Path, path: &Path) -> PathBuf {
    if path.as_os_str().is_empty() {
        directory.to_path_buf()
    } else {
        directory.join(path)
    }
}

/// Fold `.` and `..` components without touching the file system. `..` at
/// the root stays at the root; leading `..` of a relative path are kept.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other),
        }
    }
    normalized
}
