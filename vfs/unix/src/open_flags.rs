//! `OpenFileFlags` → host `O_*` translation.
//!
//! Guest flag values follow the Emscripten ABI and differ from the host's on
//! most platforms, so every bit is translated individually.

use vfs_core::{AccessMode, FileMode, OpenFileFlags};

const PASS_THROUGH: [(OpenFileFlags, libc::c_int); 9] = [
    (OpenFileFlags::CREAT, libc::O_CREAT),
    (OpenFileFlags::EXCL, libc::O_EXCL),
    (OpenFileFlags::NOCTTY, libc::O_NOCTTY),
    (OpenFileFlags::TRUNC, libc::O_TRUNC),
    (OpenFileFlags::APPEND, libc::O_APPEND),
    (OpenFileFlags::NONBLOCK, libc::O_NONBLOCK),
    (OpenFileFlags::ASYNC, libc::O_ASYNC),
    (OpenFileFlags::DIRECTORY, libc::O_DIRECTORY),
    (OpenFileFlags::NOFOLLOW, libc::O_NOFOLLOW),
];

/// Translate guest open flags into host flags for `openat`.
///
/// Flags no backend implements (`O_DIRECT`, `O_PATH`, `O_TMPFILE`,
/// `O_NOATIME`) are returned as the error. `O_LARGEFILE` is implied on
/// 64-bit offsets and dropped.
pub fn open_flags_to_host(flags: OpenFileFlags) -> Result<libc::c_int, OpenFileFlags> {
    let unsupported = flags.unsupported();
    if !unsupported.is_empty() {
        return Err(unsupported);
    }

    let mut host = match flags.access_mode() {
        Some(AccessMode::ReadOnly) => libc::O_RDONLY,
        Some(AccessMode::WriteOnly) => libc::O_WRONLY,
        Some(AccessMode::ReadWrite) => libc::O_RDWR,
        None => return Err(flags & OpenFileFlags::ACCMODE),
    };
    for (flag, host_flag) in PASS_THROUGH {
        if flags.has(flag) {
            host |= host_flag;
        }
    }
    if flags.has(OpenFileFlags::SYNC) {
        host |= libc::O_SYNC;
    } else if flags.has(OpenFileFlags::DSYNC) {
        host |= libc::O_DSYNC;
    }
    // Descriptors never leak into child processes of the host.
    host |= libc::O_CLOEXEC;
    Ok(host)
}

pub fn mode_to_host(mode: FileMode) -> libc::mode_t {
    mode.bits() as libc::mode_t
}
