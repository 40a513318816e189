use super::*;
use vfs_core::{FileMode, Timespec};

/// ### `__syscall_fchmod()`
#[instrument(level = "debug", skip_all, fields(%fd, mode), ret)]
pub fn syscall_fchmod(host: &EmbedderHost, fd: i32, mode: u32) -> i32 {
    syscall_try!(host.file_system().execute(ChmodFd {
        fd: Fd(fd),
        mode: FileMode::from_raw(mode),
    }));
    0
}

/// ### `__syscall_chmod()`
/// Change the permissions of `path`, following symbolic links.
#[instrument(level = "debug", skip_all, fields(path = field::Empty, mode), ret)]
pub fn syscall_chmod(host: &EmbedderHost, memory: &dyn GuestMemory, path: u32, mode: u32) -> i32 {
    let path = syscall_try_mem!(memory.read_path(path));
    record_path(&path);
    syscall_try!(host.file_system().execute(Chmod {
        path,
        base_directory: BaseDirectory::CurrentWorkingDirectory,
        mode: FileMode::from_raw(mode),
        follow_symlinks: true,
    }));
    0
}

/// ### `__syscall_fchown32()`
/// Inputs:
/// - `int fd`
/// - `uid_t owner`, `gid_t group`
///     `-1` leaves the value unchanged
#[instrument(level = "debug", skip_all, fields(%fd, %owner, %group), ret)]
pub fn syscall_fchown32(host: &EmbedderHost, fd: i32, owner: i32, group: i32) -> i32 {
    syscall_try!(host.file_system().execute(ChownFd {
        fd: Fd(fd),
        owner: id_or_keep(owner),
        group: id_or_keep(group),
    }));
    0
}

/// ### `__syscall_utimensat()`
/// Set access and modification times.
/// Inputs:
/// - `int dirfd`
/// - `const char *path`
///     NULL updates `dirfd` itself, which is how `futimens` is implemented
/// - `const struct timespec times[2]`
///     NULL sets both to the current time. `UTIME_NOW` and `UTIME_OMIT`
///     are honoured per entry
/// - `int flags`
///     `AT_SYMLINK_NOFOLLOW`
#[instrument(level = "debug", skip_all, fields(%dirfd, path = field::Empty, flags), ret)]
pub fn syscall_utimensat(
    host: &EmbedderHost,
    memory: &dyn GuestMemory,
    dirfd: i32,
    path: u32,
    times: u32,
    flags: i32,
) -> i32 {
    if flags & !AT_SYMLINK_NOFOLLOW != 0 {
        return Errno::Inval.negative();
    }
    let [atime, mtime] = syscall_try_mem!(read_time_updates(memory, times));
    let now = Timespec::from_system_time(host.clock().now());
    let (atime, mtime) = (atime.resolve(now), mtime.resolve(now));

    if path == 0 {
        syscall_try!(host.file_system().execute(SetTimestampFd {
            fd: Fd(dirfd),
            atime,
            mtime,
        }));
        return 0;
    }

    let path = syscall_try_mem!(memory.read_path(path));
    record_path(&path);
    syscall_try!(host.file_system().execute(SetTimestamp {
        path,
        base_directory: BaseDirectory::from_raw_dir_fd(dirfd),
        atime,
        mtime,
        follow_symlinks: flags & AT_SYMLINK_NOFOLLOW == 0,
    }));
    0
}
