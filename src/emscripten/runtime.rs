//! Process and heap imports of the Emscripten runtime.

use tracing::instrument;
use vfs_core::Errno;

use crate::host::EmbedderHost;
use crate::memory::{GuestMemory, WASM_PAGE_SIZE};

/// Largest request `getentropy` accepts.
pub const GETENTROPY_MAX: u32 = 256;

/// Most a heap resize grows beyond the requested size.
const OVERGROWN_HEAP_MAX_ADD: u64 = 96 * 1024 * 1024;

/// The guest gave up. The embedder turns this into a trap; execution of
/// the instance must not continue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuestAbort {
    #[error("native code called abort()")]
    Abort,
    #[error("Assertion failed: {condition}, at: {file}:{line} {function}")]
    AssertionFailed {
        condition: String,
        file: String,
        line: i32,
        function: String,
    },
}

/// ### `_abort_js()`
#[instrument(level = "debug", skip_all)]
pub fn abort_js(_host: &EmbedderHost) -> GuestAbort {
    tracing::error!("guest aborted");
    GuestAbort::Abort
}

/// ### `__assert_fail()`
/// Inputs:
/// - `const char *condition`
/// - `const char *file`
/// - `int line`
/// - `const char *function`
///
/// Unreadable strings are reported as `unknown`.
#[instrument(level = "debug", skip_all, fields(line))]
pub fn assert_fail(
    _host: &EmbedderHost,
    memory: &dyn GuestMemory,
    condition: u32,
    file: u32,
    line: i32,
    function: u32,
) -> GuestAbort {
    let string = |ptr: u32| match memory.read_c_string(ptr) {
        Ok(bytes) if ptr != 0 => String::from_utf8_lossy(&bytes).into_owned(),
        _ => "unknown".to_string(),
    };
    let abort = GuestAbort::AssertionFailed {
        condition: string(condition),
        file: string(file),
        line,
        function: string(function),
    };
    tracing::error!(%abort, "guest assertion failed");
    abort
}

/// ### `emscripten_resize_heap()`
/// Grow the guest memory so that it holds at least `requested_size` bytes.
/// The heap overgrows by a fifth of its size, but never by more than
/// 96 MiB past the request.
///
/// Returns `1` when the memory grew and `0` otherwise, as `sbrk` expects.
#[instrument(level = "debug", skip_all, fields(requested_size), ret)]
pub fn emscripten_resize_heap(
    _host: &EmbedderHost,
    memory: &mut dyn GuestMemory,
    requested_size: u32,
) -> i32 {
    let requested = requested_size as u64;
    let old_size = memory.size();
    let maximum = memory.maximum_pages();
    if requested <= old_size {
        tracing::warn!(requested, old_size, "heap resize does not grow the memory");
        return 0;
    }
    if requested > maximum * WASM_PAGE_SIZE {
        tracing::warn!(requested, maximum, "heap resize beyond the memory limit");
        return 0;
    }
    let pages = new_heap_pages(requested, old_size, maximum);
    let Ok(delta) = u32::try_from(pages - old_size / WASM_PAGE_SIZE) else {
        return 0;
    };
    match memory.grow(delta) {
        Ok(_) => 1,
        Err(err) => {
            tracing::warn!(%err, "cannot enlarge memory");
            0
        }
    }
}

fn new_heap_pages(requested: u64, old_size: u64, maximum_pages: u64) -> u64 {
    let overgrown = (old_size + old_size / 5)
        .min(requested + OVERGROWN_HEAP_MAX_ADD)
        .max(requested);
    overgrown.div_ceil(WASM_PAGE_SIZE).min(maximum_pages)
}

/// ### `getentropy()`
/// Fill `size` bytes at `buffer` with random data.
/// Errors:
/// - `Errno::Io`
///     If `size` exceeds [`GETENTROPY_MAX`] or the entropy source fails
#[instrument(level = "trace", skip_all, fields(size), ret)]
pub fn getentropy(host: &EmbedderHost, memory: &mut dyn GuestMemory, buffer: u32, size: u32) -> i32 {
    if size > GETENTROPY_MAX {
        return Errno::Io.negative();
    }
    syscall_try_mem!(memory.check_range(buffer, size));
    let mut bytes = vec![0; size as usize];
    if let Err(err) = host.entropy().fill(&mut bytes) {
        tracing::warn!(%err, "entropy source failed");
        return Errno::Io.negative();
    }
    syscall_try_mem!(memory.write(buffer, &bytes));
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostConfig;
    use crate::host::{EntropyError, EntropySource};
    use crate::memory::{LinearMemory, MemoryError};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    const MIB: u64 = 1024 * 1024;

    fn host() -> EmbedderHost {
        EmbedderHost::from_config(HostConfig::default()).unwrap()
    }

    #[test]
    fn abort_is_reported_as_a_value() {
        assert_eq!(abort_js(&host()), GuestAbort::Abort);
    }

    #[tracing_test::traced_test]
    #[test]
    fn assertion_message() {
        let mut memory = LinearMemory::new(256);
        memory.write(16, b"pPager->eState!=PAGER_ERROR\0").unwrap();
        memory.write(64, b"sqlite3.c\0").unwrap();
        memory.write(80, b"pagerFlush\0").unwrap();

        let abort = assert_fail(&host(), &memory, 16, 64, 5872, 80);
        assert_eq!(
            abort.to_string(),
            "Assertion failed: pPager->eState!=PAGER_ERROR, at: sqlite3.c:5872 pagerFlush"
        );
        assert!(logs_contain("guest assertion failed"));

        let abort = assert_fail(&host(), &memory, 16, 0, 1, 4096);
        assert_eq!(
            abort,
            GuestAbort::AssertionFailed {
                condition: "pPager->eState!=PAGER_ERROR".to_string(),
                file: "unknown".to_string(),
                line: 1,
                function: "unknown".to_string(),
            }
        );
    }

    #[test]
    fn heap_growth_policy() {
        let page = WASM_PAGE_SIZE;
        // a fifth of the old size wins for small requests
        assert_eq!(new_heap_pages(10 * page + 1, 10 * page, 65536), 12);
        // the request wins when it is larger than the overgrowth
        assert_eq!(new_heap_pages(20 * page, 10 * page, 65536), 20);
        // overgrowth is capped at 96 MiB past the request
        assert_eq!(
            new_heap_pages(1024 * MIB + 1, 1024 * MIB, 65536),
            (1120 * MIB + 1).div_ceil(page)
        );
        assert_eq!(new_heap_pages(10 * page + 1, 10 * page, 11), 11);
    }

    #[test]
    fn resize_heap_grows_the_memory() {
        let host = host();
        let mut memory = LinearMemory::with_pages(10).with_maximum_pages(16);
        assert_eq!(emscripten_resize_heap(&host, &mut memory, 10 * WASM_PAGE_SIZE as u32 + 1), 1);
        assert_eq!(memory.size(), 12 * WASM_PAGE_SIZE);

        assert_eq!(emscripten_resize_heap(&host, &mut memory, 100), 0);
        assert_eq!(emscripten_resize_heap(&host, &mut memory, 17 * WASM_PAGE_SIZE as u32), 0);
        assert_eq!(memory.size(), 12 * WASM_PAGE_SIZE);

        assert_eq!(emscripten_resize_heap(&host, &mut memory, 16 * WASM_PAGE_SIZE as u32), 1);
        assert_eq!(memory.size(), 16 * WASM_PAGE_SIZE);
    }

    #[test]
    fn resize_heap_on_a_fixed_memory() {
        struct Fixed(LinearMemory);

        impl GuestMemory for Fixed {
            fn size(&self) -> u64 {
                self.0.size()
            }

            fn read(&self, offset: u32, buf: &mut [u8]) -> Result<(), MemoryError> {
                self.0.read(offset, buf)
            }

            fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), MemoryError> {
                self.0.write(offset, data)
            }
        }

        let mut memory = Fixed(LinearMemory::with_pages(1));
        assert_eq!(emscripten_resize_heap(&host(), &mut memory, 2 * WASM_PAGE_SIZE as u32), 0);
        assert_eq!(memory.size(), WASM_PAGE_SIZE);
    }

    #[test]
    fn entropy_limits() {
        let host = host();
        let mut memory = LinearMemory::new(1024);
        assert_eq!(getentropy(&host, &mut memory, 0, 32), 0);
        assert!(memory.as_slice()[..32].iter().any(|&b| b != 0));
        assert_eq!(getentropy(&host, &mut memory, 0, GETENTROPY_MAX + 1), Errno::Io.negative());
        assert_eq!(getentropy(&host, &mut memory, 1000, 32), Errno::Fault.negative());
        assert_eq!(getentropy(&host, &mut memory, 0, 0), 0);
    }

    #[test]
    fn failing_entropy_source() {
        struct Broken;

        impl EntropySource for Broken {
            fn fill(&self, _buf: &mut [u8]) -> Result<(), EntropyError> {
                Err(EntropyError("no device".to_string()))
            }
        }

        let host = EmbedderHost::builder().entropy(Arc::new(Broken)).build().unwrap();
        let mut memory = LinearMemory::new(64);
        assert_eq!(getentropy(&host, &mut memory, 0, 16), Errno::Io.negative());
    }
}
