//! Access to the guest's linear memory.
//!
//! Guest pointers are 32-bit offsets. Every access is bounds checked; a bad
//! pointer is reported to the guest as `EFAULT` instead of trapping.

use byteorder::{ByteOrder, LittleEndian};
use std::ops::Range;
use std::path::{Path, PathBuf};
use vfs_core::Errno;

/// Longest NUL-terminated string read from the guest.
pub const MAX_STRING_LEN: usize = 4096;

/// Size of a wasm page.
pub const WASM_PAGE_SIZE: u64 = 64 * 1024;

/// Pages addressable by a 32-bit guest.
pub const WASM32_MAX_PAGES: u64 = 65536;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    #[error("access of {len} bytes at {offset:#x} is out of bounds (memory size {size})")]
    OutOfBounds { offset: u64, len: u64, size: u64 },
    #[error("string at {offset:#x} is not NUL-terminated within the length limit")]
    UnterminatedString { offset: u32 },
    #[error("string at {offset:#x} is not valid UTF-8")]
    InvalidString { offset: u32 },
    #[error("cannot grow memory to {pages} pages, the limit is {maximum} pages")]
    GrowthRefused { pages: u64, maximum: u64 },
}

impl From<MemoryError> for Errno {
    fn from(err: MemoryError) -> Self {
        match err {
            MemoryError::OutOfBounds { .. } => Errno::Fault,
            MemoryError::UnterminatedString { .. } => Errno::Nametoolong,
            MemoryError::InvalidString { .. } => Errno::Inval,
            MemoryError::GrowthRefused { .. } => Errno::Nomem,
        }
    }
}

/// WASI `iovec`/`ciovec`: a buffer address and its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Iovec {
    pub buf: u32,
    pub len: u32,
}

impl Iovec {
    pub const SIZE: u32 = 8;
}

/// Linear memory of a guest instance.
///
/// Implementors only provide raw byte access; the typed helpers decode
/// little-endian values the way a wasm32 guest lays them out.
pub trait GuestMemory {
    fn size(&self) -> u64;

    fn read(&self, offset: u32, buf: &mut [u8]) -> Result<(), MemoryError>;

    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), MemoryError>;

    /// Upper bound for [`GuestMemory::grow`], in pages.
    fn maximum_pages(&self) -> u64 {
        WASM32_MAX_PAGES
    }

    /// Append `delta` zeroed pages and return the previous size in pages.
    /// Memories that cannot grow keep the default, which refuses.
    fn grow(&mut self, delta: u32) -> Result<u64, MemoryError> {
        Err(MemoryError::GrowthRefused {
            pages: self.size() / WASM_PAGE_SIZE + delta as u64,
            maximum: self.size() / WASM_PAGE_SIZE,
        })
    }

    /// Fail unless `len` bytes at `offset` are addressable.
    fn check_range(&self, offset: u32, len: u32) -> Result<(), MemoryError> {
        if offset as u64 + len as u64 > self.size() {
            return Err(MemoryError::OutOfBounds {
                offset: offset as u64,
                len: len as u64,
                size: self.size(),
            });
        }
        Ok(())
    }

    /// The length comes from the guest, so it is checked before allocating.
    fn read_bytes(&self, offset: u32, len: u32) -> Result<Vec<u8>, MemoryError> {
        self.check_range(offset, len)?;
        let mut buf = vec![0u8; len as usize];
        self.read(offset, &mut buf)?;
        Ok(buf)
    }

    fn read_u16(&self, offset: u32) -> Result<u16, MemoryError> {
        let mut buf = [0u8; 2];
        self.read(offset, &mut buf)?;
        Ok(LittleEndian::read_u16(&buf))
    }

    fn read_i16(&self, offset: u32) -> Result<i16, MemoryError> {
        Ok(self.read_u16(offset)? as i16)
    }

    fn read_u32(&self, offset: u32) -> Result<u32, MemoryError> {
        let mut buf = [0u8; 4];
        self.read(offset, &mut buf)?;
        Ok(LittleEndian::read_u32(&buf))
    }

    fn read_i32(&self, offset: u32) -> Result<i32, MemoryError> {
        Ok(self.read_u32(offset)? as i32)
    }

    fn read_u64(&self, offset: u32) -> Result<u64, MemoryError> {
        let mut buf = [0u8; 8];
        self.read(offset, &mut buf)?;
        Ok(LittleEndian::read_u64(&buf))
    }

    fn read_i64(&self, offset: u32) -> Result<i64, MemoryError> {
        Ok(self.read_u64(offset)? as i64)
    }

    fn write_u16(&mut self, offset: u32, value: u16) -> Result<(), MemoryError> {
        let mut buf = [0u8; 2];
        LittleEndian::write_u16(&mut buf, value);
        self.write(offset, &buf)
    }

    fn write_u32(&mut self, offset: u32, value: u32) -> Result<(), MemoryError> {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, value);
        self.write(offset, &buf)
    }

    fn write_i32(&mut self, offset: u32, value: i32) -> Result<(), MemoryError> {
        self.write_u32(offset, value as u32)
    }

    fn write_u64(&mut self, offset: u32, value: u64) -> Result<(), MemoryError> {
        let mut buf = [0u8; 8];
        LittleEndian::write_u64(&mut buf, value);
        self.write(offset, &buf)
    }

    fn write_i64(&mut self, offset: u32, value: i64) -> Result<(), MemoryError> {
        self.write_u64(offset, value as u64)
    }

    /// Bytes of the NUL-terminated string at `offset`, without the NUL.
    fn read_c_string(&self, offset: u32) -> Result<Vec<u8>, MemoryError> {
        let mut bytes = Vec::new();
        let mut chunk = [0u8; 64];
        let mut cursor = offset;
        while bytes.len() < MAX_STRING_LEN {
            let available = self.size().saturating_sub(cursor as u64);
            if available == 0 {
                return Err(MemoryError::OutOfBounds {
                    offset: cursor as u64,
                    len: 1,
                    size: self.size(),
                });
            }
            let chunk = &mut chunk[..available.min(64) as usize];
            self.read(cursor, chunk)?;
            match chunk.iter().position(|&b| b == 0) {
                Some(end) => {
                    bytes.extend_from_slice(&chunk[..end]);
                    if bytes.len() > MAX_STRING_LEN {
                        break;
                    }
                    return Ok(bytes);
                }
                None => bytes.extend_from_slice(chunk),
            }
            cursor = cursor.saturating_add(chunk.len() as u32);
        }
        Err(MemoryError::UnterminatedString { offset })
    }

    /// A path argument. Non-UTF-8 bytes are kept as-is on unix hosts.
    fn read_path(&self, offset: u32) -> Result<PathBuf, MemoryError> {
        let bytes = self.read_c_string(offset)?;
        bytes_to_path(bytes).ok_or(MemoryError::InvalidString { offset })
    }

    /// `count` consecutive [`Iovec`] records.
    fn read_iovecs(&self, offset: u32, count: u32) -> Result<Vec<Iovec>, MemoryError> {
        let raw = self.read_bytes(offset, count.saturating_mul(Iovec::SIZE))?;
        Ok(raw
            .chunks_exact(Iovec::SIZE as usize)
            .map(|record| Iovec {
                buf: LittleEndian::read_u32(&record[0..4]),
                len: LittleEndian::read_u32(&record[4..8]),
            })
            .collect())
    }
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        fn bytes_to_path(bytes: Vec<u8>) -> Option<PathBuf> {
            use std::os::unix::ffi::OsStringExt;
            Some(PathBuf::from(std::ffi::OsString::from_vec(bytes)))
        }

        /// Bytes of a host path as the guest sees them.
        pub(crate) fn path_to_bytes(path: &Path) -> Vec<u8> {
            use std::os::unix::ffi::OsStrExt;
            path.as_os_str().as_bytes().to_vec()
        }
    } else {
        fn bytes_to_path(bytes: Vec<u8>) -> Option<PathBuf> {
            String::from_utf8(bytes).ok().map(PathBuf::from)
        }

        pub(crate) fn path_to_bytes(path: &Path) -> Vec<u8> {
            path.to_string_lossy().into_owned().into_bytes()
        }
    }
}

/// Linear memory backed by a `Vec<u8>`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct LinearMemory {
    data: Vec<u8>,
    maximum_pages: Option<u64>,
}

impl std::fmt::Debug for LinearMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinearMemory")
            .field("size", &self.data.len())
            .field("maximum_pages", &self.maximum_pages())
            .finish()
    }
}

impl LinearMemory {
    /// Size of a wasm page.
    pub const PAGE_SIZE: usize = WASM_PAGE_SIZE as usize;

    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size],
            maximum_pages: None,
        }
    }

    pub fn with_pages(pages: usize) -> Self {
        Self::new(pages * Self::PAGE_SIZE)
    }

    /// Limit growth to `pages`, like the maximum of a memory import.
    pub fn with_maximum_pages(mut self, pages: u64) -> Self {
        self.maximum_pages = Some(pages.min(WASM32_MAX_PAGES));
        self
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn range(&self, offset: u32, len: usize) -> Result<Range<usize>, MemoryError> {
        let start = offset as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(start..end),
            _ => Err(MemoryError::OutOfBounds {
                offset: offset as u64,
                len: len as u64,
                size: self.data.len() as u64,
            }),
        }
    }
}

impl From<Vec<u8>> for LinearMemory {
    fn from(data: Vec<u8>) -> Self {
        Self {
            data,
            maximum_pages: None,
        }
    }
}

impl GuestMemory for LinearMemory {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn read(&self, offset: u32, buf: &mut [u8]) -> Result<(), MemoryError> {
        let range = self.range(offset, buf.len())?;
        buf.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), MemoryError> {
        let range = self.range(offset, data.len())?;
        self.data[range].copy_from_slice(data);
        Ok(())
    }

    fn maximum_pages(&self) -> u64 {
        self.maximum_pages.unwrap_or(WASM32_MAX_PAGES)
    }

    fn grow(&mut self, delta: u32) -> Result<u64, MemoryError> {
        let previous = self.size() / WASM_PAGE_SIZE;
        let pages = previous + delta as u64;
        let maximum = self.maximum_pages();
        let refused = MemoryError::GrowthRefused { pages, maximum };
        if pages > maximum {
            return Err(refused);
        }
        let len = usize::try_from(pages * WASM_PAGE_SIZE).map_err(|_| refused)?;
        self.data.resize(len, 0);
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn little_endian_values() {
        let mut memory = LinearMemory::new(64);
        memory.write_u32(0, 0x0403_0201).unwrap();
        assert_eq!(&memory.as_slice()[..4], &[1, 2, 3, 4]);
        memory.write_i64(8, -2).unwrap();
        assert_eq!(memory.read_i64(8).unwrap(), -2);
        memory.write_u16(20, 0xfffe).unwrap();
        assert_eq!(memory.read_i16(20).unwrap(), -2);
    }

    #[test]
    fn bounds_are_checked() {
        let mut memory = LinearMemory::new(16);
        assert_eq!(
            memory.read_u64(12).unwrap_err(),
            MemoryError::OutOfBounds {
                offset: 12,
                len: 8,
                size: 16
            }
        );
        assert!(memory.write(u32::MAX, &[1]).is_err());
        assert_eq!(Errno::from(memory.read_u32(16).unwrap_err()), Errno::Fault);
    }

    #[test]
    fn c_strings() {
        let mut memory = LinearMemory::new(256);
        memory.write(100, b"/tmp/db.sqlite\0").unwrap();
        assert_eq!(
            memory.read_path(100).unwrap(),
            PathBuf::from("/tmp/db.sqlite")
        );
        assert_eq!(memory.read_c_string(114).unwrap(), b"");

        let mut memory = LinearMemory::new(8);
        memory.write(0, b"abcdefgh").unwrap();
        assert!(matches!(
            memory.read_c_string(0),
            Err(MemoryError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn long_strings_are_rejected() {
        let mut memory = LinearMemory::new(MAX_STRING_LEN * 2);
        let long = vec![b'a'; MAX_STRING_LEN + 10];
        memory.write(0, &long).unwrap();
        assert_eq!(
            memory.read_c_string(0).unwrap_err(),
            MemoryError::UnterminatedString { offset: 0 }
        );
    }

    #[test]
    fn huge_guest_lengths_fail_before_reading() {
        /// Memory that must never be read from.
        struct Untouchable;

        impl GuestMemory for Untouchable {
            fn size(&self) -> u64 {
                64
            }

            fn read(&self, _offset: u32, _buf: &mut [u8]) -> Result<(), MemoryError> {
                panic!("read reached the backing store");
            }

            fn write(&mut self, _offset: u32, _data: &[u8]) -> Result<(), MemoryError> {
                panic!("write reached the backing store");
            }
        }

        assert_eq!(
            Untouchable.read_bytes(8, u32::MAX).unwrap_err(),
            MemoryError::OutOfBounds {
                offset: 8,
                len: u32::MAX as u64,
                size: 64
            }
        );
        assert!(matches!(
            Untouchable.read_iovecs(0, u32::MAX / 2),
            Err(MemoryError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn growth_stops_at_the_maximum() {
        let mut memory = LinearMemory::with_pages(1).with_maximum_pages(3);
        assert_eq!(memory.grow(2).unwrap(), 1);
        assert_eq!(memory.size(), 3 * WASM_PAGE_SIZE);
        assert_eq!(memory.read_u32(3 * WASM_PAGE_SIZE as u32 - 4).unwrap(), 0);
        assert_eq!(
            memory.grow(1).unwrap_err(),
            MemoryError::GrowthRefused {
                pages: 4,
                maximum: 3
            }
        );
        assert_eq!(Errno::from(memory.grow(1).unwrap_err()), Errno::Nomem);
        assert_eq!(memory.size(), 3 * WASM_PAGE_SIZE);
    }

    #[test]
    fn iovec_records() {
        let mut memory = LinearMemory::new(64);
        memory.write_u32(0, 32).unwrap();
        memory.write_u32(4, 4).unwrap();
        memory.write_u32(8, 40).unwrap();
        memory.write_u32(12, 8).unwrap();
        assert_eq!(
            memory.read_iovecs(0, 2).unwrap(),
            vec![Iovec { buf: 32, len: 4 }, Iovec { buf: 40, len: 8 }]
        );
    }
}
