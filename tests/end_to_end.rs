//! Drives the guest-facing adapters through a `LinearMemory`, the way a
//! compiled SQLite would, against every backend available on the platform.

use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use wasm_sqlite_host::emscripten::{self, layout};
use wasm_sqlite_host::vfs_core::{Errno, InterceptedCall, LogLevel, Logger, OperationKind};
use wasm_sqlite_host::{BackendKind, EmbedderHost, GuestMemory, HostConfig, LinearMemory, wasi};

const AT_FDCWD: i32 = -100;
const O_RDONLY: i32 = 0x0;
const O_RDWR: i32 = 0x2;
const O_CREAT: i32 = 0x40;
const O_DIRECTORY: i32 = 0x1_0000;

const S_IFMT: u32 = 0o170000;
const S_IFREG: u32 = 0o100000;

const PATH: u32 = 0x100;
const STAT: u32 = 0x1000;
const STAT2: u32 = 0x1100;
const OUT: u32 = 0x1200;
const IOVS: u32 = 0x1300;
const VARARGS: u32 = 0x1400;
const FLOCK: u32 = 0x1500;
const TIMES: u32 = 0x1600;
const DATA: u32 = 0x2000;

struct Guest {
    dir: tempfile::TempDir,
    host: EmbedderHost,
    memory: LinearMemory,
}

impl Guest {
    fn new(backend: BackendKind) -> Self {
        let config = HostConfig {
            backend,
            ..HostConfig::default()
        };
        Self::with_host(EmbedderHost::from_config(config).unwrap())
    }

    fn with_host(host: EmbedderHost) -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            host,
            memory: LinearMemory::with_pages(1),
        }
    }

    /// Run `test` once per backend.
    fn each(test: impl Fn(Guest)) {
        test(Guest::new(BackendKind::Host));
        #[cfg(target_os = "linux")]
        test(Guest::new(BackendKind::Native));
    }

    fn c_str(&mut self, at: u32, value: &str) -> u32 {
        self.memory.write(at, value.as_bytes()).unwrap();
        self.memory.write(at + value.len() as u32, &[0]).unwrap();
        at
    }

    /// Store the absolute path of `name` inside the scratch directory as
    /// the path argument.
    fn path(&mut self, name: &str) -> u32 {
        let full = self.dir.path().join(name);
        let full = full.to_str().unwrap().to_owned();
        self.c_str(PATH, &full)
    }

    fn open(&mut self, name: &str, flags: i32) -> i32 {
        let path = self.path(name);
        emscripten::syscall_openat(&self.host, &self.memory, AT_FDCWD, path, flags, 0o644)
    }

    fn set_iovecs(&mut self, lens: &[u32]) {
        for (i, len) in lens.iter().enumerate() {
            let record = IOVS + 8 * i as u32;
            self.memory.write_u32(record, DATA + 0x100 * i as u32).unwrap();
            self.memory.write_u32(record + 4, *len).unwrap();
        }
    }

    fn write(&mut self, fd: i32, data: &[u8]) -> Result<u32, Errno> {
        self.memory.write(DATA, data).unwrap();
        self.set_iovecs(&[data.len() as u32]);
        match wasi::fd_write(&self.host, &mut self.memory, fd, IOVS, 1, OUT) {
            Errno::Success => Ok(self.memory.read_u32(OUT).unwrap()),
            errno => Err(errno),
        }
    }

    /// Read into buffers of `lens` bytes. Returns the count and the full
    /// content of every buffer.
    fn read(&mut self, fd: i32, lens: &[u32], offset: Option<u64>) -> Result<(u32, Vec<Vec<u8>>), Errno> {
        self.memory.write(DATA, &[0; 0x400]).unwrap();
        self.set_iovecs(lens);
        let count = lens.len() as u32;
        let errno = match offset {
            None => wasi::fd_read(&self.host, &mut self.memory, fd, IOVS, count, OUT),
            Some(offset) => wasi::fd_pread(&self.host, &mut self.memory, fd, IOVS, count, offset, OUT),
        };
        if errno != Errno::Success {
            return Err(errno);
        }
        let buffers = lens
            .iter()
            .enumerate()
            .map(|(i, len)| self.memory.read_bytes(DATA + 0x100 * i as u32, *len).unwrap())
            .collect();
        Ok((self.memory.read_u32(OUT).unwrap(), buffers))
    }

    fn seek(&mut self, fd: i32, offset: i64, whence: u8) -> Result<u64, Errno> {
        match wasi::fd_seek(&self.host, &mut self.memory, fd, offset, whence, OUT) {
            Errno::Success => Ok(self.memory.read_u64(OUT).unwrap()),
            errno => Err(errno),
        }
    }

    fn stat(&mut self, name: &str) -> Result<Vec<u8>, i32> {
        let path = self.path(name);
        match emscripten::syscall_stat64(&self.host, &mut self.memory, path, STAT) {
            0 => Ok(self.memory.read_bytes(STAT, layout::STAT_SIZE as u32).unwrap()),
            err => Err(err),
        }
    }

    fn stat_field_u32(stat: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(stat[offset..offset + 4].try_into().unwrap())
    }

    fn stat_field_i64(stat: &[u8], offset: usize) -> i64 {
        i64::from_le_bytes(stat[offset..offset + 8].try_into().unwrap())
    }
}

#[test]
fn open_write_seek_read_close() {
    Guest::each(|mut g| {
        let fd = g.open("x", O_CREAT | O_RDWR);
        assert_eq!(fd, 3);
        assert_eq!(g.write(fd, b"hello"), Ok(5));
        assert_eq!(g.seek(fd, 0, 0), Ok(0));
        assert_eq!(g.read(fd, &[5], None), Ok((5, vec![b"hello".to_vec()])));
        assert_eq!(wasi::fd_close(&g.host, fd), Errno::Success);

        assert_eq!(g.read(fd, &[5], None), Err(Errno::Badf));
        assert_eq!(wasi::fd_close(&g.host, fd), Errno::Badf);
        assert!(g.host.file_system().live_descriptors().is_empty());
    });
}

#[test]
fn vectored_read_stops_at_end_of_file() {
    Guest::each(|mut g| {
        let fd = g.open("short", O_CREAT | O_RDWR);
        g.write(fd, b"abcdef").unwrap();
        g.seek(fd, 0, 0).unwrap();

        let (count, buffers) = g.read(fd, &[4, 4, 4], None).unwrap();
        assert_eq!(count, 6);
        assert_eq!(buffers, vec![b"abcd".to_vec(), b"ef\0\0".to_vec(), vec![0; 4]]);
        wasi::fd_close(&g.host, fd);
    });
}

#[test]
fn positioned_io_keeps_the_offset() {
    Guest::each(|mut g| {
        let fd = g.open("positioned", O_CREAT | O_RDWR);
        g.write(fd, b"0123456789").unwrap();

        g.memory.write(DATA, b"XY").unwrap();
        g.set_iovecs(&[2]);
        assert_eq!(wasi::fd_pwrite(&g.host, &mut g.memory, fd, IOVS, 1, 2, OUT), Errno::Success);
        assert_eq!(g.memory.read_u32(OUT).unwrap(), 2);

        let first = g.read(fd, &[4], Some(0)).unwrap();
        let second = g.read(fd, &[4], Some(0)).unwrap();
        assert_eq!(first, (4, vec![b"01XY".to_vec()]));
        assert_eq!(first, second);

        assert_eq!(g.read(fd, &[4], None), Ok((0, vec![vec![0; 4]])));
        assert_eq!(g.seek(fd, 0, 1), Ok(10));
        assert_eq!(g.seek(fd, -1, 0), Err(Errno::Inval));
        assert_eq!(wasi::fd_seek(&g.host, &mut g.memory, fd, 0, 7, OUT), Errno::Inval);
        wasi::fd_close(&g.host, fd);
    });
}

#[test]
fn stat_variants_agree() {
    Guest::each(|mut g| {
        let fd = g.open("s", O_CREAT | O_RDWR);
        g.write(fd, b"abc").unwrap();

        let by_path = g.stat("s").unwrap();
        assert_eq!(Guest::stat_field_u32(&by_path, 4) & S_IFMT, S_IFREG);
        assert_eq!(Guest::stat_field_i64(&by_path, 24), 3);

        assert_eq!(emscripten::syscall_fstat64(&g.host, &mut g.memory, fd, STAT2), 0);
        assert_eq!(g.memory.read_bytes(STAT2, 96).unwrap(), by_path);

        let path = g.path("s");
        assert_eq!(emscripten::syscall_newfstatat(&g.host, &mut g.memory, AT_FDCWD, path, STAT2, 0), 0);
        assert_eq!(g.memory.read_bytes(STAT2, 96).unwrap(), by_path);

        let empty = g.c_str(PATH, "");
        assert_eq!(
            emscripten::syscall_newfstatat(&g.host, &mut g.memory, fd, empty, STAT2, layout::AT_EMPTY_PATH),
            0
        );
        assert_eq!(g.memory.read_bytes(STAT2, 96).unwrap(), by_path);
        assert_eq!(
            emscripten::syscall_newfstatat(&g.host, &mut g.memory, fd, empty, STAT2, 0x4),
            Errno::Inval.negative()
        );

        assert_eq!(g.stat("missing"), Err(Errno::Noent.negative()));
        assert_eq!(
            emscripten::syscall_fstat64(&g.host, &mut g.memory, 77, STAT2),
            Errno::Badf.negative()
        );
        wasi::fd_close(&g.host, fd);
    });
}

#[cfg(unix)]
#[test]
fn symbolic_links() {
    Guest::each(|mut g| {
        let target = g.dir.path().join("target.db");
        std::fs::write(&target, b"data").unwrap();
        std::os::unix::fs::symlink(&target, g.dir.path().join("link")).unwrap();

        let path = g.path("link");
        assert_eq!(emscripten::syscall_lstat64(&g.host, &mut g.memory, path, STAT), 0);
        let lstat = g.memory.read_bytes(STAT, 96).unwrap();
        assert_eq!(Guest::stat_field_u32(&lstat, 4) & S_IFMT, 0o120000);
        let stat = g.stat("link").unwrap();
        assert_eq!(Guest::stat_field_u32(&stat, 4) & S_IFMT, S_IFREG);

        let expected = target.to_str().unwrap().as_bytes().to_vec();
        let path = g.path("link");
        let written = emscripten::syscall_readlinkat(&g.host, &mut g.memory, AT_FDCWD, path, DATA, 512);
        assert_eq!(written, expected.len() as i32);
        assert_eq!(g.memory.read_bytes(DATA, written as u32).unwrap(), expected);

        assert_eq!(emscripten::syscall_readlinkat(&g.host, &mut g.memory, AT_FDCWD, path, DATA, 4), 4);
        assert_eq!(
            emscripten::syscall_readlinkat(&g.host, &mut g.memory, AT_FDCWD, path, DATA, 0),
            Errno::Inval.negative()
        );
        let regular = g.path("target.db");
        assert_eq!(
            emscripten::syscall_readlinkat(&g.host, &mut g.memory, AT_FDCWD, regular, DATA, 64),
            Errno::Inval.negative()
        );
    });
}

#[test]
fn directories() {
    Guest::each(|mut g| {
        let path = g.path("d");
        assert_eq!(emscripten::syscall_mkdirat(&g.host, &g.memory, AT_FDCWD, path, 0o755), 0);
        assert_eq!(
            emscripten::syscall_mkdirat(&g.host, &g.memory, AT_FDCWD, path, 0o755),
            Errno::Exist.negative()
        );

        let dir_fd = g.open("d", O_DIRECTORY | O_RDONLY);
        assert!(dir_fd >= 3);
        let relative = g.c_str(PATH, "f.txt");
        let file_fd = emscripten::syscall_openat(&g.host, &g.memory, dir_fd, relative, O_CREAT | O_RDWR, 0o644);
        assert!(file_fd > dir_fd);
        assert_eq!(wasi::fd_close(&g.host, file_fd), Errno::Success);
        assert!(g.dir.path().join("d/f.txt").is_file());

        let path = g.path("d");
        assert_eq!(
            emscripten::syscall_unlinkat(&g.host, &g.memory, AT_FDCWD, path, layout::AT_REMOVEDIR),
            Errno::Notempty.negative()
        );
        assert_eq!(
            emscripten::syscall_unlinkat(&g.host, &g.memory, AT_FDCWD, path, 0x1),
            Errno::Inval.negative()
        );
        let relative = g.c_str(PATH, "f.txt");
        assert_eq!(emscripten::syscall_unlinkat(&g.host, &g.memory, dir_fd, relative, 0), 0);

        assert_eq!(wasi::fd_close(&g.host, dir_fd), Errno::Success);
        let relative = g.c_str(PATH, "other.txt");
        assert_eq!(
            emscripten::syscall_openat(&g.host, &g.memory, dir_fd, relative, O_CREAT | O_RDWR, 0o644),
            Errno::Badf.negative()
        );

        let path = g.path("d");
        assert_eq!(emscripten::syscall_rmdir(&g.host, &g.memory, path), 0);
        assert!(!g.dir.path().join("d").exists());
    });
}

#[cfg(unix)]
#[test]
fn advisory_locks() {
    Guest::each(|mut g| {
        let fd = g.open("locked.db", O_CREAT | O_RDWR);
        let set_lock = |g: &mut Guest, fd: i32, l_type: i16, start: i64, len: i64| {
            g.memory.write_u16(FLOCK, l_type as u16).unwrap();
            g.memory.write_u16(FLOCK + 2, 0).unwrap();
            g.memory.write_i64(FLOCK + 8, start).unwrap();
            g.memory.write_i64(FLOCK + 16, len).unwrap();
            g.memory.write_u32(VARARGS, FLOCK).unwrap();
            emscripten::syscall_fcntl64(&g.host, &g.memory, fd, layout::F_SETLK, VARARGS)
        };

        assert_eq!(set_lock(&mut g, fd, layout::F_WRLCK, 0, 10), 0);
        assert_eq!(set_lock(&mut g, fd, layout::F_RDLCK, 5, 10), 0);
        assert_eq!(set_lock(&mut g, fd, layout::F_UNLCK, 0, 0), 0);
        assert_eq!(set_lock(&mut g, fd, 9, 0, 0), Errno::Inval.negative());
        assert_eq!(set_lock(&mut g, 99, layout::F_WRLCK, 0, 1), Errno::Badf.negative());
        assert_eq!(
            emscripten::syscall_fcntl64(&g.host, &g.memory, fd, 1, VARARGS),
            Errno::Inval.negative()
        );
        wasi::fd_close(&g.host, fd);
    });
}

#[test]
fn timestamps() {
    Guest::each(|mut g| {
        let fd = g.open("t", O_CREAT | O_RDWR);

        g.memory.write_i64(TIMES, 0).unwrap();
        g.memory.write_i64(TIMES + 8, layout::UTIME_OMIT).unwrap();
        g.memory.write_i64(TIMES + 16, 1_600_000_000).unwrap();
        g.memory.write_i64(TIMES + 24, 0).unwrap();
        let path = g.path("t");
        assert_eq!(emscripten::syscall_utimensat(&g.host, &g.memory, AT_FDCWD, path, TIMES, 0), 0);
        let stat = g.stat("t").unwrap();
        assert_eq!(Guest::stat_field_i64(&stat, 56), 1_600_000_000);

        g.memory.write_i64(TIMES, 1_500_000_000).unwrap();
        g.memory.write_i64(TIMES + 8, 0).unwrap();
        g.memory.write_i64(TIMES + 24, layout::UTIME_OMIT).unwrap();
        assert_eq!(emscripten::syscall_utimensat(&g.host, &g.memory, fd, 0, TIMES, 0), 0);
        let stat = g.stat("t").unwrap();
        assert_eq!(Guest::stat_field_i64(&stat, 40), 1_500_000_000);
        assert_eq!(Guest::stat_field_i64(&stat, 56), 1_600_000_000);

        g.memory.write_i64(TIMES + 8, 2_000_000_000).unwrap();
        assert_eq!(
            emscripten::syscall_utimensat(&g.host, &g.memory, fd, 0, TIMES, 0),
            Errno::Inval.negative()
        );
        wasi::fd_close(&g.host, fd);
    });
}

#[test]
fn access_checks() {
    Guest::each(|mut g| {
        let fd = g.open("a", O_CREAT | O_RDWR);
        wasi::fd_close(&g.host, fd);

        let path = g.path("a");
        assert_eq!(emscripten::syscall_faccessat(&g.host, &g.memory, AT_FDCWD, path, 0, 0), 0);
        assert_eq!(emscripten::syscall_faccessat(&g.host, &g.memory, AT_FDCWD, path, 6, 0), 0);
        assert_eq!(
            emscripten::syscall_faccessat(&g.host, &g.memory, AT_FDCWD, path, 8, 0),
            Errno::Inval.negative()
        );
        assert_eq!(
            emscripten::syscall_faccessat(&g.host, &g.memory, AT_FDCWD, path, 0, 0x1),
            Errno::Inval.negative()
        );
        let missing = g.path("missing");
        assert_eq!(
            emscripten::syscall_faccessat(&g.host, &g.memory, AT_FDCWD, missing, 0, 0),
            Errno::Noent.negative()
        );
    });
}

#[cfg(unix)]
#[test]
fn permissions_and_ownership() {
    Guest::each(|mut g| {
        let fd = g.open("p", O_CREAT | O_RDWR);
        let path = g.path("p");
        assert_eq!(emscripten::syscall_chmod(&g.host, &g.memory, path, 0o600), 0);
        let stat = g.stat("p").unwrap();
        assert_eq!(Guest::stat_field_u32(&stat, 4) & 0o7777, 0o600);

        assert_eq!(emscripten::syscall_fchmod(&g.host, fd, 0o640), 0);
        let stat = g.stat("p").unwrap();
        assert_eq!(Guest::stat_field_u32(&stat, 4) & 0o7777, 0o640);

        assert_eq!(emscripten::syscall_fchown32(&g.host, fd, -1, -1), 0);
        wasi::fd_close(&g.host, fd);
    });
}

#[test]
fn truncate_and_sync() {
    Guest::each(|mut g| {
        let fd = g.open("trunc", O_CREAT | O_RDWR);
        g.write(fd, b"abcdef").unwrap();
        assert_eq!(emscripten::syscall_ftruncate64(&g.host, fd, 2), 0);
        assert_eq!(emscripten::syscall_fstat64(&g.host, &mut g.memory, fd, STAT), 0);
        assert_eq!(g.memory.read_i64(STAT + 24).unwrap(), 2);
        assert_eq!(emscripten::syscall_ftruncate64(&g.host, fd, -1), Errno::Inval.negative());

        assert_eq!(emscripten::syscall_fdatasync(&g.host, fd), 0);
        assert_eq!(wasi::fd_sync(&g.host, fd), Errno::Success);
        wasi::fd_close(&g.host, fd);
        assert_eq!(wasi::fd_sync(&g.host, fd), Errno::Badf);
    });
}

#[test]
fn working_directory() {
    Guest::each(|mut g| {
        let expected = std::env::current_dir().unwrap();
        let expected = expected.to_str().unwrap().as_bytes().to_vec();

        let written = emscripten::syscall_getcwd(&g.host, &mut g.memory, DATA, 4096);
        assert_eq!(written, expected.len() as i32 + 1);
        assert_eq!(g.memory.read_c_string(DATA).unwrap(), expected);

        assert_eq!(
            emscripten::syscall_getcwd(&g.host, &mut g.memory, DATA, 1),
            Errno::Range.negative()
        );
        assert_eq!(
            emscripten::syscall_getcwd(&g.host, &mut g.memory, DATA, 0),
            Errno::Inval.negative()
        );
    });
}

#[test]
fn bad_guest_pointers() {
    Guest::each(|mut g| {
        let size = g.memory.size() as u32;
        assert_eq!(
            emscripten::syscall_openat(&g.host, &g.memory, AT_FDCWD, size + 16, O_RDONLY, 0),
            Errno::Fault.negative()
        );

        let fd = g.open("fault", O_CREAT | O_RDWR);
        g.memory.write_u32(IOVS, size - 2).unwrap();
        g.memory.write_u32(IOVS + 4, 8).unwrap();
        assert_eq!(wasi::fd_write(&g.host, &mut g.memory, fd, IOVS, 1, OUT), Errno::Fault);
        assert_eq!(g.seek(fd, 0, 2), Ok(0));
        assert_eq!(emscripten::syscall_fstat64(&g.host, &mut g.memory, fd, size - 8), Errno::Fault.negative());
        wasi::fd_close(&g.host, fd);
    });
}

#[test]
fn file_mappings_are_refused() {
    Guest::each(|mut g| {
        let fd = g.open("mapped.db", O_CREAT | O_RDWR);
        g.write(fd, &[7; 4096]).unwrap();
        assert_eq!(emscripten::mmap_js(&g.host, 4096, 0x3, 0x1, fd, 0, OUT, OUT + 4), Errno::Inval.negative());
        assert_eq!(emscripten::munmap_js(&g.host, 0x10000, 4096, 0x3, 0x1, fd, 0), Errno::Inval.negative());

        let path = g.path("dir");
        assert_eq!(emscripten::syscall_mkdirat(&g.host, &g.memory, AT_FDCWD, path, 0o755), 0);
        let dir_fd = g.open("dir", O_DIRECTORY | O_RDONLY);
        assert_eq!(emscripten::mmap_js(&g.host, 4096, 0x1, 0x1, dir_fd, 0, OUT, OUT + 4), Errno::Nodev.negative());
        assert_eq!(emscripten::munmap_js(&g.host, 0x10000, 4096, 0x1, 0x1, dir_fd, 0), Errno::Nodev.negative());

        wasi::fd_close(&g.host, dir_fd);
        wasi::fd_close(&g.host, fd);
        assert_eq!(emscripten::mmap_js(&g.host, 4096, 0x1, 0x1, fd, 0, OUT, OUT + 4), Errno::Badf.negative());
        assert_eq!(emscripten::munmap_js(&g.host, 0x10000, 4096, 0x1, 0x1, fd, 0), Errno::Badf.negative());
        assert!(g.host.file_system().live_descriptors().is_empty());
    });
}

#[test]
fn runtime_imports() {
    let mut g = Guest::new(BackendKind::Host);
    assert_eq!(emscripten::emscripten_get_now_is_monotonic(&g.host), 1);
    assert_eq!(emscripten::getentropy(&g.host, &mut g.memory, DATA, 256), 0);
    assert_eq!(emscripten::getentropy(&g.host, &mut g.memory, DATA, 257), Errno::Io.negative());

    assert_eq!(emscripten::localtime_js(&g.host, &mut g.memory, 86_400 * 365, DATA), 0);
    assert_eq!(g.memory.read_i32(DATA + 20).unwrap(), 71);
    assert_eq!(g.memory.read_i32(DATA + 12).unwrap(), 1);

    let before = g.memory.size();
    assert_eq!(emscripten::emscripten_resize_heap(&g.host, &mut g.memory, before as u32 + 1), 1);
    assert!(g.memory.size() > before);

    let condition = g.c_str(PATH, "rc==SQLITE_OK");
    let abort = emscripten::assert_fail(&g.host, &g.memory, condition, 0, 42, 0);
    assert_eq!(abort.to_string(), "Assertion failed: rc==SQLITE_OK, at: unknown:42 unknown");
    assert_eq!(emscripten::abort_js(&g.host), emscripten::GuestAbort::Abort);
}

#[test]
fn environment_reaches_the_guest() {
    let config = HostConfig::from_toml_str("[environment]\nHOME = \"/home/web_user\"\nLANG = \"C.UTF-8\"\n").unwrap();
    let mut g = Guest::with_host(EmbedderHost::from_config(config).unwrap());

    assert_eq!(wasi::environ_sizes_get(&g.host, &mut g.memory, OUT, OUT + 4), Errno::Success);
    assert_eq!(g.memory.read_u32(OUT).unwrap(), 2);
    let buf_size = g.memory.read_u32(OUT + 4).unwrap();
    assert_eq!(buf_size as usize, "HOME=/home/web_user\0LANG=C.UTF-8\0".len());

    assert_eq!(wasi::environ_get(&g.host, &mut g.memory, OUT, DATA), Errno::Success);
    assert_eq!(g.memory.read_u32(OUT).unwrap(), DATA);
    assert_eq!(g.memory.read_c_string(DATA).unwrap(), b"HOME=/home/web_user");
    let second = g.memory.read_u32(OUT + 4).unwrap();
    assert_eq!(g.memory.read_c_string(second).unwrap(), b"LANG=C.UTF-8");

    let size = g.memory.size() as u32;
    assert_eq!(wasi::environ_get(&g.host, &mut g.memory, OUT, size - 4), Errno::Fault);
    assert_eq!(wasi::sched_yield(&g.host), Errno::Success);
}

#[test]
fn clocks_and_entropy() {
    let mut g = Guest::new(BackendKind::Host);
    assert_eq!(wasi::clock_time_get(&g.host, &mut g.memory, wasi::CLOCK_REALTIME, 1, OUT), Errno::Success);
    assert!(g.memory.read_u64(OUT).unwrap() > 1_600_000_000_000_000_000);

    assert_eq!(wasi::clock_time_get(&g.host, &mut g.memory, wasi::CLOCK_MONOTONIC, 1, OUT), Errno::Success);
    let first = g.memory.read_u64(OUT).unwrap();
    assert_eq!(wasi::clock_time_get(&g.host, &mut g.memory, wasi::CLOCK_MONOTONIC, 1, OUT), Errno::Success);
    assert!(g.memory.read_u64(OUT).unwrap() >= first);

    assert_eq!(wasi::clock_time_get(&g.host, &mut g.memory, 2, 1, OUT), Errno::Inval);
    let size = g.memory.size() as u32;
    assert_eq!(wasi::clock_time_get(&g.host, &mut g.memory, 0, 1, size - 4), Errno::Fault);

    assert_eq!(wasi::random_get(&g.host, &mut g.memory, DATA, 32), Errno::Success);
    assert!(g.memory.read_bytes(DATA, 32).unwrap().iter().any(|&b| b != 0));
    assert_eq!(wasi::random_get(&g.host, &mut g.memory, size - 16, 32), Errno::Fault);
    assert!(emscripten::emscripten_date_now(&g.host) > 1_600_000_000_000.0);
}

#[derive(Default)]
struct Collector(Mutex<Vec<String>>);

impl Logger for Collector {
    fn log(&self, _level: LogLevel, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}

#[test]
fn operations_are_logged_and_intercepted() {
    let collector = Arc::new(Collector::default());
    let config = HostConfig::from_toml_str("[logging]\nstart = \"name\"\nend = \"basic\"\n").unwrap();
    let host = EmbedderHost::builder()
        .config(config)
        .logger(collector.clone())
        .interceptor(|call: &mut dyn InterceptedCall| {
            if call.operation() == OperationKind::UnlinkFile {
                call.reject(Errno::Perm, "read-only guest".to_string());
            } else {
                let _ = call.proceed();
            }
        })
        .build()
        .unwrap();
    let mut g = Guest::with_host(host);

    assert_eq!(g.open("nope", O_RDONLY), Errno::Noent.negative());
    let fd = g.open("yes", O_CREAT | O_RDWR);
    wasi::fd_close(&g.host, fd);
    let path = g.path("yes");
    assert_eq!(
        emscripten::syscall_unlinkat(&g.host, &g.memory, AT_FDCWD, path, 0),
        Errno::Perm.negative()
    );
    assert!(g.dir.path().join("yes").exists());

    let lines = collector.0.lock().unwrap();
    assert_eq!(lines[0], "^open()");
    assert!(lines[1].starts_with("open(): NOENT("), "{}", lines[1]);
    assert!(lines.iter().any(|line| line.starts_with("unlink_file(): PERM(read-only guest")));
}
