use super::*;

/// ### `__syscall_ftruncate64()`
/// Errors:
/// - `Errno::Inval`
///     If `length` is negative
#[instrument(level = "debug", skip_all, fields(%fd, length), ret)]
pub fn syscall_ftruncate64(host: &EmbedderHost, fd: i32, length: i64) -> i32 {
    let length = syscall_try_mem!(u64::try_from(length).ok(); Errno::Inval);
    syscall_try!(host.file_system().execute(TruncateFd { fd: Fd(fd), length }));
    0
}

/// ### `__syscall_fdatasync()`
/// Flush file data without forcing a metadata update.
#[instrument(level = "debug", skip_all, fields(%fd), ret)]
pub fn syscall_fdatasync(host: &EmbedderHost, fd: i32) -> i32 {
    syscall_try!(host.file_system().execute(SyncFd {
        fd: Fd(fd),
        sync_metadata: false,
    }));
    0
}

/// ### `__syscall_fcntl64()`
/// Only the advisory locking commands are served.
/// Inputs:
/// - `int fd`
/// - `int cmd`
///     `F_SETLK` or `F_SETLKW`. A conflicting lock fails with `EAGAIN` for
///     both; waiting is left to the guest's busy handler
/// - `varargs`
///     Pointer to the variadic arguments; the first one is the
///     `struct flock *`
#[instrument(level = "debug", skip_all, fields(%fd, cmd), ret)]
pub fn syscall_fcntl64(host: &EmbedderHost, memory: &dyn GuestMemory, fd: i32, cmd: i32, varargs: u32) -> i32 {
    match cmd {
        F_SETLK | F_SETLKW => {
            let flock_ptr = syscall_try_mem!(memory.read_u32(varargs));
            let flock = syscall_try_mem!(Flock::read(memory, flock_ptr));
            let lock = syscall_try_mem!(flock.to_advisory_lock());
            let fd = Fd(fd);
            if flock.l_type == F_UNLCK {
                syscall_try!(host.file_system().execute(RemoveAdvisoryLockFd { fd, lock }));
            } else {
                syscall_try!(host.file_system().execute(AddAdvisoryLockFd { fd, lock }));
            }
            0
        }
        _ => {
            tracing::debug!(cmd, "unsupported fcntl command");
            Errno::Inval.negative()
        }
    }
}
