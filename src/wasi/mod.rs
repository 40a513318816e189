//! The `wasi_snapshot_preview1` functions an Emscripten SQLite build
//! imports. They return the errno directly; results go to out-pointers.

mod clock_time_get;
mod environ_get;
mod environ_sizes_get;
mod fd_close;
mod fd_read;
mod fd_seek;
mod fd_sync;
mod fd_write;
mod random_get;
mod sched_yield;

pub use clock_time_get::*;
pub use environ_get::*;
pub use environ_sizes_get::*;
pub use fd_close::*;
pub use fd_read::*;
pub use fd_seek::*;
pub use fd_sync::*;
pub use fd_write::*;
pub use random_get::*;
pub use sched_yield::*;

use tracing::{Span, field, instrument};
use vfs_core::op::*;
use vfs_core::{Errno, Fd, ReadWriteStrategy};

use crate::host::EmbedderHost;
use crate::memory::{GuestMemory, Iovec};

/// Bounds-check every buffer of an iovec array before any I/O happens, so
/// a bad pointer cannot consume or produce data that is then lost.
fn guest_iovecs(memory: &dyn GuestMemory, iovs: u32, iovs_len: u32) -> Result<Vec<Iovec>, Errno> {
    let iovecs = memory.read_iovecs(iovs, iovs_len)?;
    let mut total = 0u64;
    for iov in &iovecs {
        memory.check_range(iov.buf, iov.len)?;
        total += iov.len as u64;
    }
    if total > u32::MAX as u64 {
        return Err(Errno::Inval);
    }
    Ok(iovecs)
}

/// `KEY=VALUE` strings of the guest environment, NUL-terminated.
fn environment_strings(host: &EmbedderHost) -> Vec<Vec<u8>> {
    host.environment()
        .variables()
        .into_iter()
        .map(|(key, value)| format!("{key}={value}\0").into_bytes())
        .collect()
}

/// Copy `from` back to back into `buffer` and store a pointer to each
/// piece in the array at `ptr_buffer`. Both ranges are checked first, so a
/// bad pointer leaves the guest memory untouched.
fn write_buffer_array(memory: &mut dyn GuestMemory, from: &[Vec<u8>], ptr_buffer: u32, buffer: u32) -> Errno {
    let count = wasi_try_mem!(u32::try_from(from.len()).ok(); Errno::Overflow);
    let total: usize = from.iter().map(Vec::len).sum();
    let total = wasi_try_mem!(u32::try_from(total).ok(); Errno::Overflow);
    wasi_try_mem!(memory.check_range(ptr_buffer, wasi_try_mem!(count.checked_mul(4); Errno::Overflow)));
    wasi_try_mem!(memory.check_range(buffer, total));

    let mut current_buffer_offset = 0;
    for (i, sub_buffer) in from.iter().enumerate() {
        wasi_try_mem!(memory.write_u32(ptr_buffer + 4 * i as u32, buffer + current_buffer_offset));
        wasi_try_mem!(memory.write(buffer + current_buffer_offset, sub_buffer));
        current_buffer_offset += sub_buffer.len() as u32;
    }
    Errno::Success
}
