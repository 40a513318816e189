use super::*;

/// ### `fd_sync()`
/// Synchronize file data and metadata to disk
/// Inputs:
/// - `Fd fd`
///     The file descriptor to sync
#[instrument(level = "debug", skip_all, fields(%fd), ret)]
pub fn fd_sync(host: &EmbedderHost, fd: i32) -> Errno {
    wasi_try!(host.file_system().execute(SyncFd {
        fd: Fd(fd),
        sync_metadata: true,
    }));
    Errno::Success
}
