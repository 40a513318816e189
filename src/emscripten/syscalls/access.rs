use super::*;
use vfs_core::FileAccessibilityCheck;

/// ### `__syscall_faccessat()`
/// Check whether the caller may access `path`.
/// Inputs:
/// - `int dirfd`
/// - `const char *path`
/// - `int amode`
///     `F_OK` or a combination of `R_OK`, `W_OK` and `X_OK`
/// - `int flags`
///     `AT_EACCESS` checks with the effective ids, `AT_SYMLINK_NOFOLLOW`
///     checks a symbolic link itself, `AT_EMPTY_PATH` allows an empty `path`
#[instrument(level = "debug", skip_all, fields(%dirfd, path = field::Empty, amode, flags), ret)]
pub fn syscall_faccessat(
    host: &EmbedderHost,
    memory: &dyn GuestMemory,
    dirfd: i32,
    path: u32,
    amode: i32,
    flags: i32,
) -> i32 {
    let mode = syscall_try_mem!(FileAccessibilityCheck::from_bits(amode as u32); Errno::Inval);
    if flags & !(AT_EACCESS | AT_SYMLINK_NOFOLLOW | AT_EMPTY_PATH) != 0 {
        return Errno::Inval.negative();
    }
    let path = syscall_try_mem!(memory.read_path(path));
    record_path(&path);
    syscall_try!(host.file_system().execute(CheckAccess {
        path,
        base_directory: BaseDirectory::from_raw_dir_fd(dirfd),
        mode,
        use_effective_user_id: flags & AT_EACCESS != 0,
        allow_empty_path: flags & AT_EMPTY_PATH != 0,
        follow_symlinks: flags & AT_SYMLINK_NOFOLLOW == 0,
    }));
    0
}
