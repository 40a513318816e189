//! Thin wrappers over the `libc` calls the backend makes.

use std::ffi::{CString, OsString};
use std::io;
use std::mem;
use std::os::fd::{FromRawFd, IntoRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};

use vfs_core::Timespec;

/// Largest symbolic link target or working directory path we accept.
const MAX_PATH_BUFFER: usize = 1 << 20;

fn cstr(path: &Path) -> io::Result<CString> {
    CString::new(path.as_os_str().as_bytes()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("path `{}` contains a NUL byte", path.display()),
        )
    })
}

fn cvt(res: libc::c_int) -> io::Result<libc::c_int> {
    if res < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(res)
}

fn cvt_size(res: libc::ssize_t) -> io::Result<usize> {
    if res < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(res as usize)
}

fn off_t(offset: u64) -> io::Result<libc::off_t> {
    libc::off_t::try_from(offset).map_err(|_| io::Error::from_raw_os_error(libc::EOVERFLOW))
}

pub fn openat(dirfd: RawFd, path: &Path, flags: libc::c_int, mode: libc::mode_t) -> io::Result<OwnedFd> {
    let cstr = cstr(path)?;
    let fd = cvt(unsafe { libc::openat(dirfd, cstr.as_ptr(), flags, mode as libc::c_uint) })?;
    // SAFETY: the kernel just handed us this descriptor.
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

/// `close(2)` with its error reported instead of swallowed.
pub fn close(fd: OwnedFd) -> io::Result<()> {
    let raw = fd.into_raw_fd();
    cvt(unsafe { libc::close(raw) })?;
    Ok(())
}

fn iovecs(bufs: &mut [&mut [u8]]) -> Vec<libc::iovec> {
    bufs.iter_mut()
        .map(|buf| libc::iovec {
            iov_base: buf.as_mut_ptr().cast(),
            iov_len: buf.len(),
        })
        .collect()
}

fn const_iovecs(bufs: &[&[u8]]) -> Vec<libc::iovec> {
    bufs.iter()
        .map(|buf| libc::iovec {
            iov_base: buf.as_ptr().cast_mut().cast(),
            iov_len: buf.len(),
        })
        .collect()
}

/// `readv(2)`, or `preadv(2)` when an offset is given.
pub fn readv(fd: RawFd, bufs: &mut [&mut [u8]], offset: Option<u64>) -> io::Result<usize> {
    let iov = iovecs(bufs);
    let count = iov.len() as libc::c_int;
    let res = match offset {
        None => unsafe { libc::readv(fd, iov.as_ptr(), count) },
        Some(offset) => unsafe { libc::preadv(fd, iov.as_ptr(), count, off_t(offset)?) },
    };
    cvt_size(res)
}

/// `writev(2)`, or `pwritev(2)` when an offset is given.
pub fn writev(fd: RawFd, bufs: &[&[u8]], offset: Option<u64>) -> io::Result<usize> {
    let iov = const_iovecs(bufs);
    let count = iov.len() as libc::c_int;
    let res = match offset {
        None => unsafe { libc::writev(fd, iov.as_ptr(), count) },
        Some(offset) => unsafe { libc::pwritev(fd, iov.as_ptr(), count, off_t(offset)?) },
    };
    cvt_size(res)
}

pub fn lseek(fd: RawFd, offset: i64, whence: libc::c_int) -> io::Result<u64> {
    let res = unsafe { libc::lseek(fd, offset as libc::off_t, whence) };
    if res < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(res as u64)
}

pub fn fstatat(dirfd: RawFd, path: &Path, flags: libc::c_int) -> io::Result<libc::stat> {
    let cstr = cstr(path)?;
    let mut st = unsafe { mem::zeroed::<libc::stat>() };
    cvt(unsafe { libc::fstatat(dirfd, cstr.as_ptr(), &mut st, flags) })?;
    Ok(st)
}

pub fn fstat(fd: RawFd) -> io::Result<libc::stat> {
    let mut st = unsafe { mem::zeroed::<libc::stat>() };
    cvt(unsafe { libc::fstat(fd, &mut st) })?;
    Ok(st)
}

pub fn fchmodat(dirfd: RawFd, path: &Path, mode: libc::mode_t) -> io::Result<()> {
    let cstr = cstr(path)?;
    cvt(unsafe { libc::fchmodat(dirfd, cstr.as_ptr(), mode, 0) })?;
    Ok(())
}

pub fn fchmod(fd: RawFd, mode: libc::mode_t) -> io::Result<()> {
    cvt(unsafe { libc::fchmod(fd, mode) })?;
    Ok(())
}

/// `None` keeps the current owner or group.
fn id_or_keep(id: Option<u32>) -> libc::uid_t {
    id.unwrap_or(u32::MAX)
}

pub fn fchownat(
    dirfd: RawFd,
    path: &Path,
    owner: Option<u32>,
    group: Option<u32>,
    flags: libc::c_int,
) -> io::Result<()> {
    let cstr = cstr(path)?;
    cvt(unsafe {
        libc::fchownat(dirfd, cstr.as_ptr(), id_or_keep(owner), id_or_keep(group), flags)
    })?;
    Ok(())
}

pub fn fchown(fd: RawFd, owner: Option<u32>, group: Option<u32>) -> io::Result<()> {
    cvt(unsafe { libc::fchown(fd, id_or_keep(owner), id_or_keep(group)) })?;
    Ok(())
}

pub fn mkdirat(dirfd: RawFd, path: &Path, mode: libc::mode_t) -> io::Result<()> {
    let cstr = cstr(path)?;
    cvt(unsafe { libc::mkdirat(dirfd, cstr.as_ptr(), mode) })?;
    Ok(())
}

pub fn unlinkat(dirfd: RawFd, path: &Path, flags: libc::c_int) -> io::Result<()> {
    let cstr = cstr(path)?;
    cvt(unsafe { libc::unlinkat(dirfd, cstr.as_ptr(), flags) })?;
    Ok(())
}

/// The buffer doubles until the target fits; targets beyond
/// [`MAX_PATH_BUFFER`] are `ENAMETOOLONG`.
pub fn readlinkat(dirfd: RawFd, path: &Path) -> io::Result<PathBuf> {
    let cstr = cstr(path)?;
    let mut buf = vec![0u8; 256];
    loop {
        let len = cvt_size(unsafe {
            libc::readlinkat(dirfd, cstr.as_ptr(), buf.as_mut_ptr().cast(), buf.len())
        })?;
        if len < buf.len() {
            buf.truncate(len);
            return Ok(PathBuf::from(OsString::from_vec(buf)));
        }
        if buf.len() >= MAX_PATH_BUFFER {
            return Err(io::Error::from_raw_os_error(libc::ENAMETOOLONG));
        }
        buf.resize(buf.len() * 2, 0);
    }
}

fn make_utimespec(time: Option<Timespec>) -> libc::timespec {
    // Some targets pad `timespec`, so no struct literal.
    let mut spec = unsafe { mem::zeroed::<libc::timespec>() };
    match time {
        Some(time) => {
            spec.tv_sec = time.seconds as libc::time_t;
            spec.tv_nsec = time.nanoseconds as _;
        }
        None => spec.tv_nsec = libc::UTIME_OMIT as _,
    }
    spec
}

pub fn utimensat(
    dirfd: RawFd,
    path: &Path,
    atime: Option<Timespec>,
    mtime: Option<Timespec>,
    flags: libc::c_int,
) -> io::Result<()> {
    let cstr = cstr(path)?;
    let times = [make_utimespec(atime), make_utimespec(mtime)];
    cvt(unsafe { libc::utimensat(dirfd, cstr.as_ptr(), times.as_ptr(), flags) })?;
    Ok(())
}

pub fn futimens(fd: RawFd, atime: Option<Timespec>, mtime: Option<Timespec>) -> io::Result<()> {
    let times = [make_utimespec(atime), make_utimespec(mtime)];
    cvt(unsafe { libc::futimens(fd, times.as_ptr()) })?;
    Ok(())
}

pub fn fsync(fd: RawFd, sync_metadata: bool) -> io::Result<()> {
    if sync_metadata {
        cvt(unsafe { libc::fsync(fd) })?;
    } else {
        cvt(unsafe { libc::fdatasync(fd) })?;
    }
    Ok(())
}

pub fn ftruncate(fd: RawFd, length: u64) -> io::Result<()> {
    cvt(unsafe { libc::ftruncate(fd, off_t(length)?) })?;
    Ok(())
}

pub fn faccessat(dirfd: RawFd, path: &Path, mode: libc::c_int, flags: libc::c_int) -> io::Result<()> {
    let cstr = cstr(path)?;
    cvt(unsafe { libc::faccessat(dirfd, cstr.as_ptr(), mode, flags) })?;
    Ok(())
}

/// `getcwd(3)`, growing the buffer on `ERANGE` up to [`MAX_PATH_BUFFER`].
pub fn getcwd() -> io::Result<PathBuf> {
    let mut buf = vec![0u8; 512];
    loop {
        let res = unsafe { libc::getcwd(buf.as_mut_ptr().cast(), buf.len()) };
        if !res.is_null() {
            let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
            buf.truncate(len);
            return Ok(PathBuf::from(OsString::from_vec(buf)));
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ERANGE) || buf.len() >= MAX_PATH_BUFFER {
            return Err(err);
        }
        buf.resize(buf.len() * 2, 0);
    }
}
