use super::*;
use crate::memory::path_to_bytes;
use vfs_core::FileMode;

/// ### `__syscall_mkdirat()`
#[instrument(level = "debug", skip_all, fields(%dirfd, path = field::Empty, mode), ret)]
pub fn syscall_mkdirat(
    host: &EmbedderHost,
    memory: &dyn GuestMemory,
    dirfd: i32,
    path: u32,
    mode: u32,
) -> i32 {
    let path = syscall_try_mem!(memory.read_path(path));
    record_path(&path);
    syscall_try!(host.file_system().execute(Mkdir {
        path,
        base_directory: BaseDirectory::from_raw_dir_fd(dirfd),
        mode: FileMode::from_raw(mode),
    }));
    0
}

/// ### `__syscall_unlinkat()`
/// Remove a file, or an empty directory when `flags` is `AT_REMOVEDIR`.
#[instrument(level = "debug", skip_all, fields(%dirfd, path = field::Empty, flags), ret)]
pub fn syscall_unlinkat(
    host: &EmbedderHost,
    memory: &dyn GuestMemory,
    dirfd: i32,
    path: u32,
    flags: i32,
) -> i32 {
    if flags & !AT_REMOVEDIR != 0 {
        return Errno::Inval.negative();
    }
    let path = syscall_try_mem!(memory.read_path(path));
    record_path(&path);
    let base_directory = BaseDirectory::from_raw_dir_fd(dirfd);
    if flags & AT_REMOVEDIR != 0 {
        syscall_try!(host.file_system().execute(UnlinkDirectory {
            path,
            base_directory
        }));
    } else {
        syscall_try!(host.file_system().execute(UnlinkFile {
            path,
            base_directory
        }));
    }
    0
}

/// ### `__syscall_rmdir()`
#[instrument(level = "debug", skip_all, fields(path = field::Empty), ret)]
pub fn syscall_rmdir(host: &EmbedderHost, memory: &dyn GuestMemory, path: u32) -> i32 {
    let path = syscall_try_mem!(memory.read_path(path));
    record_path(&path);
    syscall_try!(host.file_system().execute(UnlinkDirectory {
        path,
        base_directory: BaseDirectory::CurrentWorkingDirectory,
    }));
    0
}

/// ### `__syscall_readlinkat()`
/// Copy the target of a symbolic link into `buf`.
/// Inputs:
/// - `int dirfd`
/// - `const char *path`
/// - `char *buf`
/// - `size_t bufsize`
///     The target is truncated to this size and not NUL-terminated
/// Returns the number of bytes written.
#[instrument(level = "debug", skip_all, fields(%dirfd, path = field::Empty, bufsize), ret)]
pub fn syscall_readlinkat(
    host: &EmbedderHost,
    memory: &mut dyn GuestMemory,
    dirfd: i32,
    path: u32,
    buf: u32,
    bufsize: u32,
) -> i32 {
    if bufsize == 0 || bufsize > i32::MAX as u32 {
        return Errno::Inval.negative();
    }
    let path = syscall_try_mem!(memory.read_path(path));
    record_path(&path);
    let target = syscall_try!(host.file_system().execute(ReadLink {
        path,
        base_directory: BaseDirectory::from_raw_dir_fd(dirfd),
    }));

    let bytes = path_to_bytes(&target);
    let len = bytes.len().min(bufsize as usize);
    syscall_try_mem!(memory.write(buf, &bytes[..len]));
    len as i32
}

/// ### `__syscall_getcwd()`
/// Write the NUL-terminated working directory to `buf`.
/// Errors:
/// - `Errno::Inval`
///     If `size` is zero
/// - `Errno::Range`
///     If the path and its terminator do not fit in `size` bytes
/// Returns the number of bytes written, terminator included.
#[instrument(level = "debug", skip_all, fields(size), ret)]
pub fn syscall_getcwd(host: &EmbedderHost, memory: &mut dyn GuestMemory, buf: u32, size: u32) -> i32 {
    if size == 0 {
        return Errno::Inval.negative();
    }
    let cwd = syscall_try!(host.file_system().execute(GetCurrentWorkingDirectory));
    let mut bytes = path_to_bytes(&cwd);
    bytes.push(0);
    if bytes.len() > size as usize {
        return Errno::Range.negative();
    }
    syscall_try_mem!(memory.write(buf, &bytes));
    bytes.len() as i32
}
