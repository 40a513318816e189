//! POSIX-shaped bitmask and enum value types.
//!
//! Bit values follow the Emscripten `fcntl.h`/`stat.h` headers so that guest
//! arguments can be taken over without translation.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// `O_*` flags passed to `openat`.
    #[derive(Default)]
    pub struct OpenFileFlags: u32 {
        const RDONLY = 0x0;
        const WRONLY = 0x1;
        const RDWR = 0x2;
        const ACCMODE = 0x3;
        const CREAT = 0x40;
        const EXCL = 0x80;
        const NOCTTY = 0x100;
        const TRUNC = 0x200;
        const APPEND = 0x400;
        const NONBLOCK = 0x800;
        const DSYNC = 0x1000;
        const ASYNC = 0x2000;
        const DIRECT = 0x4000;
        const LARGEFILE = 0x8000;
        const DIRECTORY = 0x1_0000;
        const NOFOLLOW = 0x2_0000;
        const NOATIME = 0x4_0000;
        const CLOEXEC = 0x8_0000;
        const SYNC = 0x10_1000;
        const PATH = 0x20_0000;
        const TMPFILE = 0x41_0000;
    }
}

/// Access mode encoded in the low bits of [`OpenFileFlags`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl OpenFileFlags {
    /// Flags that neither backend implements.
    const UNSUPPORTED: [OpenFileFlags; 4] = [
        OpenFileFlags::DIRECT,
        OpenFileFlags::PATH,
        OpenFileFlags::TMPFILE,
        OpenFileFlags::NOATIME,
    ];

    /// The unsupported flags touched by `self`. Opening with any of them fails
    /// with `InvalidArgument`.
    ///
    /// A flag counts as soon as one of its own bits is set: `O_TMPFILE`
    /// shares `O_DIRECTORY`, and its remaining bit alone is still rejected.
    pub fn unsupported(self) -> OpenFileFlags {
        Self::UNSUPPORTED
            .iter()
            .filter(|flag| self.bits & flag.bits & !Self::DIRECTORY.bits != 0)
            .fold(OpenFileFlags::empty(), |acc, flag| acc | *flag)
    }

    /// Decode the access mode. `O_ACCMODE` (both bits set) is rejected.
    pub fn access_mode(self) -> Option<AccessMode> {
        match self.bits & Self::ACCMODE.bits {
            0 => Some(AccessMode::ReadOnly),
            1 => Some(AccessMode::WriteOnly),
            2 => Some(AccessMode::ReadWrite),
            _ => None,
        }
    }

    /// `true` when `flag` is fully present. `O_SYNC` includes the `O_DSYNC`
    /// bit, so testing for it with `contains` on a `O_DSYNC` value is wrong.
    #[inline]
    pub fn has(self, flag: OpenFileFlags) -> bool {
        !flag.is_empty() && self.contains(flag)
    }
}

bitflags! {
    /// Permission bits of `mode_t` (the file type lives in [`FileType`]).
    #[derive(Default)]
    pub struct FileMode: u32 {
        const S_ISUID = 0o4000;
        const S_ISGID = 0o2000;
        const S_ISVTX = 0o1000;
        const S_IRUSR = 0o400;
        const S_IWUSR = 0o200;
        const S_IXUSR = 0o100;
        const S_IRGRP = 0o040;
        const S_IWGRP = 0o020;
        const S_IXGRP = 0o010;
        const S_IROTH = 0o004;
        const S_IWOTH = 0o002;
        const S_IXOTH = 0o001;
        const S_IRWXU = 0o700;
        const S_IRWXG = 0o070;
        const S_IRWXO = 0o007;
    }
}

impl FileMode {
    /// Keep the permission bits of a raw `mode_t`, dropping file type bits.
    #[inline]
    pub fn from_raw(mode: u32) -> Self {
        Self::from_bits_truncate(mode)
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0{:o}", self.bits)
    }
}

bitflags! {
    /// Checks requested from `faccessat`. An empty set is `F_OK`.
    #[derive(Default)]
    pub struct FileAccessibilityCheck: u32 {
        const EXECUTABLE = 0x1;
        const WRITABLE = 0x2;
        const READABLE = 0x4;
    }
}

/// File type part of `st_mode`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileType {
    Fifo,
    CharacterDevice,
    Directory,
    BlockDevice,
    RegularFile,
    SymbolicLink,
    Socket,
    Unknown,
}

impl FileType {
    pub const S_IFMT: u32 = 0o170000;

    /// `S_IF*` bits for this type. `Unknown` has no bits.
    pub fn mode_bits(self) -> u32 {
        match self {
            FileType::Fifo => 0o010000,
            FileType::CharacterDevice => 0o020000,
            FileType::Directory => 0o040000,
            FileType::BlockDevice => 0o060000,
            FileType::RegularFile => 0o100000,
            FileType::SymbolicLink => 0o120000,
            FileType::Socket => 0o140000,
            FileType::Unknown => 0,
        }
    }

    pub fn from_mode(mode: u32) -> Self {
        match mode & Self::S_IFMT {
            0o010000 => FileType::Fifo,
            0o020000 => FileType::CharacterDevice,
            0o040000 => FileType::Directory,
            0o060000 => FileType::BlockDevice,
            0o100000 => FileType::RegularFile,
            0o120000 => FileType::SymbolicLink,
            0o140000 => FileType::Socket,
            _ => FileType::Unknown,
        }
    }
}

/// Reference point of a seek or lock range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Whence {
    Set = 0,
    Cur = 1,
    End = 2,
}

impl Whence {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Whence::Set),
            1 => Some(Whence::Cur),
            2 => Some(Whence::End),
            _ => None,
        }
    }
}

/// Positioning behaviour of `ReadFd`/`WriteFd`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadWriteStrategy {
    /// `read`/`readv` semantics: use and advance the shared file offset.
    ChangePosition,
    /// `pread`/`preadv` semantics: use the given offset and leave the shared
    /// file offset untouched.
    DoNotChangePosition(u64),
}
