//! Translation between host POSIX values and `vfs-core` types.
//!
//! Only meaningful on unix hosts; on other targets the crate is empty.

#![cfg(unix)]

mod errno;
mod lock;
mod open_flags;

pub use errno::{errno_to_host, host_errno, io_error_to_errno, last_errno};
pub use lock::set_advisory_lock;
pub use open_flags::{mode_to_host, open_flags_to_host};

#[cfg(test)]
mod tests {
    mod errno;
    mod open_flags;
}
