use super::*;
use vfs_core::FileType;

/// File mappings are not served. The descriptor is still checked so that
/// a closed one reports `EBADF` like a real `mmap`.
fn refuse_mapping(host: &EmbedderHost, fd: i32) -> i32 {
    let stat = syscall_try!(host.file_system().execute(StatFd { fd: Fd(fd) }));
    if stat.file_type != FileType::RegularFile {
        return Errno::Nodev.negative();
    }
    Errno::Inval.negative()
}

/// ### `_mmap_js()`
/// Inputs:
/// - `size_t len`
/// - `int prot`
/// - `int flags`
/// - `int fd`
/// - `off_t offset`
/// - `int *allocated`, `void **addr`
///     Left untouched
///
/// Errors:
/// - `Errno::Badf`
///     If `fd` is not open
/// - `Errno::Nodev`
///     If `fd` is not a regular file
/// - `Errno::Inval`
///     Otherwise
#[instrument(level = "debug", skip_all, fields(%fd, len, prot, flags, offset), ret)]
#[allow(clippy::too_many_arguments)]
pub fn mmap_js(
    host: &EmbedderHost,
    len: i32,
    prot: i32,
    flags: i32,
    fd: i32,
    offset: i64,
    _allocated: u32,
    _addr: u32,
) -> i32 {
    refuse_mapping(host, fd)
}

/// ### `_munmap_js()`
/// The counterpart of [`mmap_js`]. No mapping can exist, so it fails the
/// same way.
#[instrument(level = "debug", skip_all, fields(%fd, addr, len), ret)]
pub fn munmap_js(
    host: &EmbedderHost,
    addr: u32,
    len: i32,
    _prot: i32,
    _flags: i32,
    fd: i32,
    _offset: i64,
) -> i32 {
    refuse_mapping(host, fd)
}
