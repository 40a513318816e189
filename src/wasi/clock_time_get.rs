use super::*;
use std::time::UNIX_EPOCH;

pub const CLOCK_REALTIME: u32 = 0;
pub const CLOCK_MONOTONIC: u32 = 1;

// Not instrumented: SQLite reads the clock far too often.

/// ### `clock_time_get()`
/// Get the time of the specified clock
///
/// Inputs:
///
/// - `Clockid clock_id`
///   `CLOCK_REALTIME` or `CLOCK_MONOTONIC`; the CPU time clocks are
///   rejected with `Errno::Inval`
/// - `Timestamp precision`
///   Ignored
///
/// Output:
///
/// - `Timestamp *time`
///   The value of the clock in nanoseconds
pub fn clock_time_get(
    host: &EmbedderHost,
    memory: &mut dyn GuestMemory,
    clock_id: u32,
    _precision: u64,
    time: u32,
) -> Errno {
    let elapsed = match clock_id {
        CLOCK_REALTIME => wasi_try_mem!(host.clock().now().duration_since(UNIX_EPOCH).ok(); Errno::Overflow),
        CLOCK_MONOTONIC => host.monotonic_clock().elapsed(),
        _ => return Errno::Inval,
    };
    let nanos = wasi_try_mem!(u64::try_from(elapsed.as_nanos()).ok(); Errno::Overflow);
    wasi_try_mem!(memory.write_u64(time, nanos));
    Errno::Success
}
