use super::*;
use vfs_core::Whence;

/// ### `fd_seek()`
/// Update file descriptor offset
/// Inputs:
/// - `Fd fd`
///     File descriptor to mutate
/// - `i64 offset`
///     Number of bytes to adjust offset by
/// - `Whence whence`
///     What the offset is relative to
/// Output:
/// - `u64 *newoffset`
///     The new offset relative to the start of the file
#[instrument(level = "trace", skip_all, fields(%fd, %offset, whence), ret)]
pub fn fd_seek(
    host: &EmbedderHost,
    memory: &mut dyn GuestMemory,
    fd: i32,
    offset: i64,
    whence: u8,
    newoffset: u32,
) -> Errno {
    let whence = wasi_try_mem!(Whence::from_raw(whence.into()); Errno::Inval);
    wasi_try_mem!(memory.check_range(newoffset, 8));
    let position = wasi_try!(host.file_system().execute(SeekFd {
        fd: Fd(fd),
        offset,
        whence,
    }));
    wasi_try_mem!(memory.write_u64(newoffset, position));
    Errno::Success
}
