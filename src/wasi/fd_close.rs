use super::*;

/// ### `fd_close()`
/// Close an open file descriptor
/// Inputs:
/// - `Fd fd`
///     A file descriptor mapping to an open file to close
/// Errors:
/// - `Errno::Badf`
///     If `fd` is invalid or not open. Closing twice is reported this way
///     and never touches the host handle again
#[instrument(level = "debug", skip_all, fields(%fd), ret)]
pub fn fd_close(host: &EmbedderHost, fd: i32) -> Errno {
    wasi_try!(host.file_system().execute(Close { fd: Fd(fd) }));
    Errno::Success
}
