use std::io;
use std::os::fd::RawFd;
use vfs_core::{AdvisoryLockKind, LockRange};

/// Non-blocking `fcntl(F_SETLK)` on an absolute byte range. `None` unlocks.
///
/// A conflicting lock held by another process fails with `EAGAIN` or
/// `EACCES`, depending on the host.
pub fn set_advisory_lock(
    fd: RawFd,
    kind: Option<AdvisoryLockKind>,
    range: LockRange,
) -> io::Result<()> {
    let overflow = || io::Error::from_raw_os_error(libc::EOVERFLOW);
    let start = libc::off_t::try_from(range.start).map_err(|_| overflow())?;
    let len = libc::off_t::try_from(range.len).map_err(|_| overflow())?;

    // SAFETY: `flock` is plain old data.
    let mut request: libc::flock = unsafe { std::mem::zeroed() };
    request.l_type = match kind {
        Some(AdvisoryLockKind::Read) => libc::F_RDLCK,
        Some(AdvisoryLockKind::Write) => libc::F_WRLCK,
        None => libc::F_UNLCK,
    } as libc::c_short;
    request.l_whence = libc::SEEK_SET as libc::c_short;
    request.l_start = start;
    request.l_len = len;

    // SAFETY: `request` outlives the call; an invalid `fd` is reported as EBADF.
    let res = unsafe { libc::fcntl(fd, libc::F_SETLK, &request as *const libc::flock) };
    if res < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
