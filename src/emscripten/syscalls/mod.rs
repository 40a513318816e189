//! `__syscall_*` imports of an Emscripten SQLite build.
//!
//! Every function decodes its raw arguments, runs exactly one filesystem
//! operation and returns `0` or a non-negative result on success and
//! `-errno` on failure.

mod access;
mod attr;
mod dir;
mod fd;
mod mman;
mod openat;
mod stat;

pub use access::*;
pub use attr::*;
pub use dir::*;
pub use fd::*;
pub use mman::*;
pub use openat::*;
pub use stat::*;

use std::path::Path;
use tracing::{Span, field, instrument};
use vfs_core::op::*;
use vfs_core::{BaseDirectory, Errno, Fd, StructStat};

use super::layout::{self, *};
use crate::host::EmbedderHost;
use crate::memory::GuestMemory;

fn record_path(path: &Path) {
    Span::current().record("path", field::display(path.display()));
}

/// Write the outcome of any `stat` variant to the guest.
fn finish_stat(
    memory: &mut dyn GuestMemory,
    buf: u32,
    result: Result<StructStat, StatError>,
) -> i32 {
    let stat = syscall_try!(result);
    syscall_try_mem!(layout::write_stat(memory, buf, &stat));
    0
}

/// `-1` keeps the current owner or group.
fn id_or_keep(raw: i32) -> Option<u32> {
    if raw == -1 { None } else { Some(raw as u32) }
}
