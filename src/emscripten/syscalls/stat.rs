use super::*;
use vfs_core::AT_FDCWD;

/// ### `__syscall_fstat64()`
/// Write the `struct stat` of an open descriptor to `buf`.
#[instrument(level = "debug", skip_all, fields(%fd), ret)]
pub fn syscall_fstat64(host: &EmbedderHost, memory: &mut dyn GuestMemory, fd: i32, buf: u32) -> i32 {
    let result = host.file_system().execute(StatFd { fd: Fd(fd) });
    finish_stat(memory, buf, result)
}

/// ### `__syscall_stat64()`
/// `stat` relative to the working directory, following symbolic links.
#[instrument(level = "debug", skip_all, fields(path = field::Empty), ret)]
pub fn syscall_stat64(host: &EmbedderHost, memory: &mut dyn GuestMemory, path: u32, buf: u32) -> i32 {
    stat_path(host, memory, AT_FDCWD, path, buf, true)
}

/// ### `__syscall_lstat64()`
/// Like [`syscall_stat64`] but reports a symbolic link itself.
#[instrument(level = "debug", skip_all, fields(path = field::Empty), ret)]
pub fn syscall_lstat64(host: &EmbedderHost, memory: &mut dyn GuestMemory, path: u32, buf: u32) -> i32 {
    stat_path(host, memory, AT_FDCWD, path, buf, false)
}

/// ### `__syscall_newfstatat()`
/// Inputs:
/// - `int dirfd`
/// - `const char *path`
/// - `struct stat *buf`
/// - `int flags`
///     `AT_SYMLINK_NOFOLLOW` and `AT_EMPTY_PATH`. With `AT_EMPTY_PATH` an
///     empty `path` stats `dirfd` itself.
#[instrument(level = "debug", skip_all, fields(%dirfd, path = field::Empty, flags), ret)]
pub fn syscall_newfstatat(
    host: &EmbedderHost,
    memory: &mut dyn GuestMemory,
    dirfd: i32,
    path: u32,
    buf: u32,
    flags: i32,
) -> i32 {
    if flags & !(AT_SYMLINK_NOFOLLOW | AT_EMPTY_PATH) != 0 {
        return Errno::Inval.negative();
    }
    let follow_symlinks = flags & AT_SYMLINK_NOFOLLOW == 0;
    if flags & AT_EMPTY_PATH != 0 {
        let path_bytes = syscall_try_mem!(memory.read_c_string(path));
        if path_bytes.is_empty() && dirfd != AT_FDCWD {
            let result = host.file_system().execute(StatFd { fd: Fd(dirfd) });
            return finish_stat(memory, buf, result);
        }
        if path_bytes.is_empty() {
            let result = host.file_system().execute(Stat {
                path: ".".into(),
                base_directory: BaseDirectory::CurrentWorkingDirectory,
                follow_symlinks,
            });
            return finish_stat(memory, buf, result);
        }
    }
    stat_path(host, memory, dirfd, path, buf, follow_symlinks)
}

fn stat_path(
    host: &EmbedderHost,
    memory: &mut dyn GuestMemory,
    dirfd: i32,
    path: u32,
    buf: u32,
    follow_symlinks: bool,
) -> i32 {
    let path = syscall_try_mem!(memory.read_path(path));
    record_path(&path);
    let result = host.file_system().execute(Stat {
        path,
        base_directory: BaseDirectory::from_raw_dir_fd(dirfd),
        follow_symlinks,
    });
    finish_stat(memory, buf, result)
}
