use crate::flags::{FileMode, FileType};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds and nanoseconds relative to the Unix epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timespec {
    pub seconds: i64,
    pub nanoseconds: u32,
}

impl Timespec {
    pub fn new(seconds: i64, nanoseconds: u32) -> Self {
        Self {
            seconds,
            nanoseconds,
        }
    }

    /// Times before the epoch are represented with a negative `seconds` and a
    /// positive `nanoseconds` component, like `struct timespec`.
    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => Self::new(after.as_secs() as i64, after.subsec_nanos()),
            Err(err) => {
                let before = err.duration();
                let mut seconds = -(before.as_secs() as i64);
                let mut nanoseconds = before.subsec_nanos();
                if nanoseconds > 0 {
                    seconds -= 1;
                    nanoseconds = 1_000_000_000 - nanoseconds;
                }
                Self::new(seconds, nanoseconds)
            }
        }
    }

    pub fn from_duration(since_epoch: Duration) -> Self {
        Self::new(since_epoch.as_secs() as i64, since_epoch.subsec_nanos())
    }
}

/// `struct stat` as reported to the guest.
///
/// Built fresh by every `Stat`/`StatFd` call. Backends that cannot observe a
/// field fill it with a documented fallback instead of leaving it zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StructStat {
    pub dev: u64,
    pub ino: u64,
    pub file_type: FileType,
    pub mode: FileMode,
    pub nlink: u64,
    pub uid: u32,
    pub gid: u32,
    pub rdev: u64,
    pub size: u64,
    pub blksize: u64,
    pub blocks: u64,
    pub atime: Timespec,
    pub mtime: Timespec,
    pub ctime: Timespec,
}

impl StructStat {
    /// Block size reported by backends without a native value.
    pub const FALLBACK_BLOCK_SIZE: u64 = 512;

    /// Combined `st_mode`: type bits plus permission bits.
    pub fn st_mode(&self) -> u32 {
        self.file_type.mode_bits() | self.mode.bits()
    }

    /// Number of 512-byte blocks needed for `size` bytes.
    pub fn blocks_for_size(size: u64) -> u64 {
        size.div_ceil(Self::FALLBACK_BLOCK_SIZE)
    }
}
