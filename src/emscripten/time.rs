//! Clock and time zone imports of the Emscripten runtime.

use tracing::instrument;

use super::layout;
use crate::host::EmbedderHost;
use crate::memory::GuestMemory;

/// Size of the `tzname` buffers handed to `_tzset_js`, terminator included.
pub const TZ_NAME_BUFFER_SIZE: usize = 17;

/// ### `emscripten_date_now()`
/// Wall clock time in milliseconds since the Unix epoch.
pub fn emscripten_date_now(host: &EmbedderHost) -> f64 {
    host.clock().epoch_millis()
}

/// ### `emscripten_get_now()`
/// Monotonic time in milliseconds.
pub fn emscripten_get_now(host: &EmbedderHost) -> f64 {
    host.monotonic_clock().elapsed().as_secs_f64() * 1000.0
}

/// ### `emscripten_get_now_is_monotonic()`
/// Always `1`: [`emscripten_get_now`] reads the monotonic clock.
pub fn emscripten_get_now_is_monotonic(_host: &EmbedderHost) -> i32 {
    1
}

/// ### `_localtime_js()`
/// Break `time` down into the embedder's local time.
/// Inputs:
/// - `time_t time`
///     Seconds since the Unix epoch
/// - `struct tm *tm`
///     Receives the fields up to `tm_gmtoff`
///
/// The import itself returns nothing; the result is `0` or `-EFAULT`.
#[instrument(level = "trace", skip_all, fields(time), ret)]
pub fn localtime_js(host: &EmbedderHost, memory: &mut dyn GuestMemory, time: i64, tm: u32) -> i32 {
    let local = host.local_time().format(time);
    syscall_try_mem!(memory.write(tm, &layout::pack_tm(&local)));
    0
}

/// ### `_tzset_js()`
/// Fill the C library's `timezone`, `daylight` and `tzname` globals.
/// Inputs:
/// - `long *timezone`
///     Seconds west of UTC
/// - `int *daylight`
/// - `char *std_name`, `char *dst_name`
///     Buffers of [`TZ_NAME_BUFFER_SIZE`] bytes. Longer names are cut at a
///     character boundary
///
/// Like [`localtime_js`], reports `0` or `-EFAULT` to the embedder.
#[instrument(level = "debug", skip_all, ret)]
pub fn tzset_js(
    host: &EmbedderHost,
    memory: &mut dyn GuestMemory,
    timezone: u32,
    daylight: u32,
    std_name: u32,
    dst_name: u32,
) -> i32 {
    let info = host.time_zone().time_zone_info();
    syscall_try_mem!(memory.write_i32(timezone, info.timezone));
    syscall_try_mem!(memory.write_i32(daylight, info.daylight as i32));
    syscall_try_mem!(memory.write(std_name, &tz_name_bytes(&info.std_name)));
    syscall_try_mem!(memory.write(dst_name, &tz_name_bytes(&info.dst_name)));
    0
}

fn tz_name_bytes(name: &str) -> Vec<u8> {
    let mut end = name.len().min(TZ_NAME_BUFFER_SIZE - 1);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    let mut bytes = name.as_bytes()[..end].to_vec();
    bytes.push(0);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostConfig;
    use crate::host::{
        Clock, LocalTimeFormatter, MonotonicClock, StructTm, TimeZoneInfo, TimeZoneInfoProvider,
    };
    use crate::memory::LinearMemory;
    use std::sync::Arc;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    use vfs_core::Errno;

    struct Fixed;

    impl Clock for Fixed {
        fn now(&self) -> SystemTime {
            UNIX_EPOCH + Duration::from_millis(1_700_000_000_500)
        }
    }

    impl MonotonicClock for Fixed {
        fn elapsed(&self) -> Duration {
            Duration::from_millis(1_500)
        }
    }

    impl TimeZoneInfoProvider for Fixed {
        fn time_zone_info(&self) -> TimeZoneInfo {
            TimeZoneInfo {
                timezone: -3 * 3600,
                daylight: true,
                std_name: "MSK".to_string(),
                dst_name: "Ümlaut/Long/Zone/Name".to_string(),
            }
        }
    }

    impl LocalTimeFormatter for Fixed {
        fn format(&self, epoch_seconds: i64) -> StructTm {
            StructTm::from_epoch(epoch_seconds, 3 * 3600, false)
        }
    }

    fn host() -> EmbedderHost {
        EmbedderHost::builder()
            .config(HostConfig::default())
            .clock(Arc::new(Fixed))
            .monotonic_clock(Arc::new(Fixed))
            .time_zone(Arc::new(Fixed))
            .local_time(Arc::new(Fixed))
            .build()
            .unwrap()
    }

    #[test]
    fn clocks() {
        let host = host();
        assert_eq!(emscripten_date_now(&host), 1_700_000_000_500.0);
        assert_eq!(emscripten_get_now(&host), 1_500.0);
        assert_eq!(emscripten_get_now_is_monotonic(&host), 1);
    }

    #[test]
    fn local_time_is_written_as_struct_tm() {
        let host = host();
        let mut memory = LinearMemory::new(128);
        assert_eq!(localtime_js(&host, &mut memory, 1_700_000_000, 64), 0);
        let fields: Vec<i32> = (0..10).map(|i| memory.read_i32(64 + 4 * i).unwrap()).collect();
        assert_eq!(fields, [20, 13, 1, 15, 10, 123, 3, 318, 0, 10_800]);
        assert_eq!(memory.read_i32(104).unwrap(), 0);

        assert_eq!(localtime_js(&host, &mut memory, 0, 100), Errno::Fault.negative());
    }

    #[test]
    fn time_zone_globals() {
        let host = host();
        let mut memory = LinearMemory::new(128);
        assert_eq!(tzset_js(&host, &mut memory, 0, 4, 16, 48), 0);
        assert_eq!(memory.read_i32(0).unwrap(), -10800);
        assert_eq!(memory.read_i32(4).unwrap(), 1);
        assert_eq!(memory.read_c_string(16).unwrap(), b"MSK");

        let dst = memory.read_c_string(48).unwrap();
        assert_eq!(dst.len(), 16);
        assert!(String::from_utf8(dst).unwrap().starts_with("Ümlaut/"));

        assert_eq!(tzset_js(&host, &mut memory, 126, 4, 16, 48), Errno::Fault.negative());
        assert_eq!(tzset_js(&host, &mut memory, 0, 4, 16, 120), Errno::Fault.negative());
    }

    #[test]
    fn names_are_cut_at_character_boundaries() {
        assert_eq!(tz_name_bytes("UTC"), b"UTC\0");
        let name = "ééééééééé";
        let bytes = tz_name_bytes(name);
        assert_eq!(bytes.len(), 17);
        assert_eq!(bytes[16], 0);
        assert!(std::str::from_utf8(&bytes[..16]).is_ok());
    }
}
