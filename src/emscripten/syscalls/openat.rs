use super::*;
use vfs_core::{FileMode, OpenFileFlags};

/// ### `__syscall_openat()`
/// Open a file relative to `dirfd`.
/// Inputs:
/// - `int dirfd`
///     Base directory, or `AT_FDCWD`
/// - `const char *path`
/// - `int flags`
///     `O_*` flags. Unknown bits fail with `EINVAL`
/// - `mode_t mode`
///     Permissions of a newly created file
/// Returns the new descriptor.
#[instrument(level = "debug", skip_all, fields(%dirfd, path = field::Empty, flags), ret)]
pub fn syscall_openat(
    host: &EmbedderHost,
    memory: &dyn GuestMemory,
    dirfd: i32,
    path: u32,
    flags: i32,
    mode: u32,
) -> i32 {
    let path = syscall_try_mem!(memory.read_path(path));
    record_path(&path);
    let flags = syscall_try_mem!(OpenFileFlags::from_bits(flags as u32); Errno::Inval);

    let fd = syscall_try!(host.file_system().execute(Open {
        path,
        base_directory: BaseDirectory::from_raw_dir_fd(dirfd),
        flags,
        mode: FileMode::from_raw(mode),
    }));
    fd.get()
}
