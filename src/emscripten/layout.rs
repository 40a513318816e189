//! Structures shared with the Emscripten guest, as wasm32 lays them out.

use byteorder::{ByteOrder, LittleEndian};
use vfs_core::{AdvisoryLockKind, Advisorylock, Errno, StructStat, Timespec, Whence};

use crate::host::StructTm;
use crate::memory::{GuestMemory, MemoryError};

pub const AT_SYMLINK_NOFOLLOW: i32 = 0x100;
pub const AT_REMOVEDIR: i32 = 0x200;
pub const AT_EACCESS: i32 = 0x200;
pub const AT_EMPTY_PATH: i32 = 0x1000;

pub const F_GETLK: i32 = 12;
pub const F_SETLK: i32 = 13;
pub const F_SETLKW: i32 = 14;

pub const F_RDLCK: i16 = 0;
pub const F_WRLCK: i16 = 1;
pub const F_UNLCK: i16 = 2;

pub const UTIME_NOW: i64 = (1 << 30) - 1;
pub const UTIME_OMIT: i64 = (1 << 30) - 2;

/// `sizeof(struct stat)`.
pub const STAT_SIZE: usize = 96;
/// `sizeof(struct flock)`.
pub const FLOCK_SIZE: usize = 32;
/// `sizeof(struct timespec[2])`.
pub const TIMESPEC_PAIR_SIZE: usize = 32;
/// Bytes of `struct tm` written by `_localtime_js`, up to `tm_gmtoff`.
/// `tm_zone` is left to the guest.
pub const STRUCT_TM_SIZE: usize = 40;

/// Encode `stat` the way every `stat` family syscall hands it to the guest.
///
/// Fields wider than the guest's are truncated, as the C library does.
pub fn pack_stat(stat: &StructStat) -> [u8; STAT_SIZE] {
    let mut buf = [0u8; STAT_SIZE];
    LittleEndian::write_u32(&mut buf[0..], stat.dev as u32);
    LittleEndian::write_u32(&mut buf[4..], stat.st_mode());
    LittleEndian::write_u32(&mut buf[8..], stat.nlink as u32);
    LittleEndian::write_u32(&mut buf[12..], stat.uid);
    LittleEndian::write_u32(&mut buf[16..], stat.gid);
    LittleEndian::write_u32(&mut buf[20..], stat.rdev as u32);
    LittleEndian::write_i64(&mut buf[24..], stat.size as i64);
    LittleEndian::write_i32(&mut buf[32..], stat.blksize as i32);
    LittleEndian::write_i32(&mut buf[36..], stat.blocks as i32);
    write_timespec(&mut buf[40..56], stat.atime);
    write_timespec(&mut buf[56..72], stat.mtime);
    write_timespec(&mut buf[72..88], stat.ctime);
    LittleEndian::write_i64(&mut buf[88..], stat.ino as i64);
    buf
}

// `long long tv_sec; long tv_nsec;` padded to 16 bytes.
fn write_timespec(buf: &mut [u8], time: Timespec) {
    LittleEndian::write_i64(&mut buf[0..], time.seconds);
    LittleEndian::write_i32(&mut buf[8..], time.nanoseconds as i32);
}

pub fn write_stat(
    memory: &mut dyn GuestMemory,
    offset: u32,
    stat: &StructStat,
) -> Result<(), MemoryError> {
    memory.write(offset, &pack_stat(stat))
}

pub fn pack_tm(tm: &StructTm) -> [u8; STRUCT_TM_SIZE] {
    let fields = [
        tm.sec, tm.min, tm.hour, tm.mday, tm.mon, tm.year, tm.wday, tm.yday, tm.isdst, tm.gmtoff,
    ];
    let mut buf = [0u8; STRUCT_TM_SIZE];
    LittleEndian::write_i32_into(&fields, &mut buf);
    buf
}

/// `struct flock` as read from the guest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Flock {
    pub l_type: i16,
    pub l_whence: i16,
    pub l_start: i64,
    pub l_len: i64,
    pub l_pid: i32,
}

impl Flock {
    pub fn unpack(raw: &[u8; FLOCK_SIZE]) -> Self {
        Self {
            l_type: LittleEndian::read_i16(&raw[0..]),
            l_whence: LittleEndian::read_i16(&raw[2..]),
            l_start: LittleEndian::read_i64(&raw[8..]),
            l_len: LittleEndian::read_i64(&raw[16..]),
            l_pid: LittleEndian::read_i32(&raw[24..]),
        }
    }

    pub fn read(memory: &dyn GuestMemory, offset: u32) -> Result<Self, MemoryError> {
        let mut raw = [0u8; FLOCK_SIZE];
        memory.read(offset, &mut raw)?;
        Ok(Self::unpack(&raw))
    }

    /// The lock to add or remove. `F_UNLCK` yields a `Read` lock whose kind
    /// is ignored on removal.
    pub fn to_advisory_lock(&self) -> Result<Advisorylock, Errno> {
        let kind = match self.l_type {
            F_RDLCK | F_UNLCK => AdvisoryLockKind::Read,
            F_WRLCK => AdvisoryLockKind::Write,
            _ => return Err(Errno::Inval),
        };
        let whence = Whence::from_raw(self.l_whence.into()).ok_or(Errno::Inval)?;
        Ok(Advisorylock {
            kind,
            whence,
            start: self.l_start,
            length: self.l_len,
        })
    }
}

/// One entry of the `times` argument of `utimensat`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeUpdate {
    Now,
    Omit,
    Set(Timespec),
}

impl TimeUpdate {
    fn decode(seconds: i64, nanoseconds: i64) -> Result<Self, Errno> {
        match nanoseconds {
            UTIME_NOW => Ok(TimeUpdate::Now),
            UTIME_OMIT => Ok(TimeUpdate::Omit),
            0..=999_999_999 => Ok(TimeUpdate::Set(Timespec::new(seconds, nanoseconds as u32))),
            _ => Err(Errno::Inval),
        }
    }

    /// The timestamp to apply, `None` to keep the current one.
    pub fn resolve(self, now: Timespec) -> Option<Timespec> {
        match self {
            TimeUpdate::Now => Some(now),
            TimeUpdate::Omit => None,
            TimeUpdate::Set(time) => Some(time),
        }
    }
}

/// Decode `struct timespec times[2]`. A NULL pointer sets both to now.
pub fn read_time_updates(
    memory: &dyn GuestMemory,
    offset: u32,
) -> Result<[TimeUpdate; 2], Errno> {
    if offset == 0 {
        return Ok([TimeUpdate::Now, TimeUpdate::Now]);
    }
    let mut raw = [0u8; TIMESPEC_PAIR_SIZE];
    memory.read(offset, &mut raw)?;
    let atime = TimeUpdate::decode(
        LittleEndian::read_i64(&raw[0..]),
        LittleEndian::read_i64(&raw[8..]),
    )?;
    let mtime = TimeUpdate::decode(
        LittleEndian::read_i64(&raw[16..]),
        LittleEndian::read_i64(&raw[24..]),
    )?;
    Ok([atime, mtime])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::LinearMemory;
    use pretty_assertions::assert_eq;
    use vfs_core::{FileMode, FileType};

    fn sample() -> StructStat {
        StructStat {
            dev: 0x0102,
            ino: 0x1122_3344_5566,
            file_type: FileType::RegularFile,
            mode: FileMode::from_raw(0o644),
            nlink: 1,
            uid: 1000,
            gid: 100,
            rdev: 0,
            size: 5_000_000_000,
            blksize: 4096,
            blocks: 9_765_632,
            atime: Timespec::new(1_700_000_000, 1),
            mtime: Timespec::new(1_700_000_001, 2),
            ctime: Timespec::new(-5, 999_999_999),
        }
    }

    #[test]
    fn stat_field_offsets() {
        let buf = pack_stat(&sample());
        assert_eq!(LittleEndian::read_u32(&buf[0..]), 0x0102);
        assert_eq!(LittleEndian::read_u32(&buf[4..]), 0o100644);
        assert_eq!(LittleEndian::read_u32(&buf[8..]), 1);
        assert_eq!(LittleEndian::read_u32(&buf[12..]), 1000);
        assert_eq!(LittleEndian::read_u32(&buf[16..]), 100);
        assert_eq!(LittleEndian::read_i64(&buf[24..]), 5_000_000_000);
        assert_eq!(LittleEndian::read_i32(&buf[32..]), 4096);
        assert_eq!(LittleEndian::read_i32(&buf[36..]), 9_765_632);
        assert_eq!(LittleEndian::read_i64(&buf[40..]), 1_700_000_000);
        assert_eq!(LittleEndian::read_i32(&buf[48..]), 1);
        assert_eq!(LittleEndian::read_i64(&buf[56..]), 1_700_000_001);
        assert_eq!(LittleEndian::read_i32(&buf[64..]), 2);
        assert_eq!(LittleEndian::read_i64(&buf[72..]), -5);
        assert_eq!(LittleEndian::read_i32(&buf[80..]), 999_999_999);
        assert_eq!(LittleEndian::read_i64(&buf[88..]), 0x1122_3344_5566);
    }

    #[test]
    fn tm_field_order() {
        let tm = StructTm {
            sec: 1,
            min: 2,
            hour: 3,
            mday: 4,
            mon: 5,
            year: 6,
            wday: 7,
            yday: 8,
            isdst: 9,
            gmtoff: -10,
        };
        let buf = pack_tm(&tm);
        let mut fields = [0i32; 10];
        LittleEndian::read_i32_into(&buf, &mut fields);
        assert_eq!(fields, [1, 2, 3, 4, 5, 6, 7, 8, 9, -10]);
    }

    #[test]
    fn flock_decoding() {
        let mut memory = LinearMemory::new(64);
        memory.write_u16(8, F_WRLCK as u16).unwrap();
        memory.write_u16(10, 1).unwrap();
        memory.write_i64(16, 100).unwrap();
        memory.write_i64(24, -10).unwrap();
        let flock = Flock::read(&memory, 8).unwrap();
        assert_eq!(
            flock.to_advisory_lock().unwrap(),
            Advisorylock {
                kind: AdvisoryLockKind::Write,
                whence: Whence::Cur,
                start: 100,
                length: -10,
            }
        );

        let bad_type = Flock { l_type: 7, ..flock };
        assert_eq!(bad_type.to_advisory_lock(), Err(Errno::Inval));
        let bad_whence = Flock { l_whence: 3, ..flock };
        assert_eq!(bad_whence.to_advisory_lock(), Err(Errno::Inval));
    }

    #[test]
    fn time_update_sentinels() {
        let mut memory = LinearMemory::new(64);
        memory.write_i64(0, 10).unwrap();
        memory.write_i64(8, UTIME_OMIT).unwrap();
        memory.write_i64(16, 20).unwrap();
        memory.write_i64(24, 30).unwrap();
        let [atime, mtime] = read_time_updates(&memory, 0x0).unwrap();
        assert_eq!((atime, mtime), (TimeUpdate::Now, TimeUpdate::Now));

        memory.write_i64(32, 10).unwrap();
        memory.write_i64(40, UTIME_OMIT).unwrap();
        memory.write_i64(48, 20).unwrap();
        memory.write_i64(56, UTIME_NOW).unwrap();
        let [atime, mtime] = read_time_updates(&memory, 32).unwrap();
        let now = Timespec::new(99, 0);
        assert_eq!(atime.resolve(now), None);
        assert_eq!(mtime.resolve(now), Some(now));

        memory.write_i64(56, 1_000_000_000).unwrap();
        assert_eq!(read_time_updates(&memory, 32), Err(Errno::Inval));
    }
}
