use super::*;

/// ### `fd_read()`
/// Read data from file descriptor
/// Inputs:
/// - `Fd fd`
///     File descriptor from which data will be read
/// - `const __wasi_iovec_t *iovs`
///     Vectors where data will be stored
/// - `u32 iovs_len`
///     Length of data in `iovs`
/// Output:
/// - `u32 *nread`
///     Number of bytes read
#[instrument(level = "trace", skip_all, fields(%fd, nread = field::Empty), ret)]
pub fn fd_read(
    host: &EmbedderHost,
    memory: &mut dyn GuestMemory,
    fd: i32,
    iovs: u32,
    iovs_len: u32,
    nread: u32,
) -> Errno {
    read_to_guest(host, memory, fd, iovs, iovs_len, ReadWriteStrategy::ChangePosition, nread)
}

/// ### `fd_pread()`
/// Read from the file at the given offset without updating the file cursor.
/// Inputs:
/// - `Fd fd`
/// - `const __wasi_iovec_t *iovs`
/// - `u32 iovs_len`
/// - `u64 offset`
///     The offset into the file to begin reading at
/// Output:
/// - `u32 *nread`
#[instrument(level = "trace", skip_all, fields(%fd, %offset, nread = field::Empty), ret)]
pub fn fd_pread(
    host: &EmbedderHost,
    memory: &mut dyn GuestMemory,
    fd: i32,
    iovs: u32,
    iovs_len: u32,
    offset: u64,
    nread: u32,
) -> Errno {
    let strategy = ReadWriteStrategy::DoNotChangePosition(offset);
    read_to_guest(host, memory, fd, iovs, iovs_len, strategy, nread)
}

fn read_to_guest(
    host: &EmbedderHost,
    memory: &mut dyn GuestMemory,
    fd: i32,
    iovs: u32,
    iovs_len: u32,
    strategy: ReadWriteStrategy,
    nread: u32,
) -> Errno {
    let iovecs = wasi_try_mem!(guest_iovecs(memory, iovs, iovs_len));
    wasi_try_mem!(memory.check_range(nread, 4));

    let mut buffers: Vec<Vec<u8>> = iovecs.iter().map(|iov| vec![0; iov.len as usize]).collect();
    let bytes_read = wasi_try!(host.file_system().execute(ReadFd {
        fd: Fd(fd),
        iovecs: buffers.iter_mut().map(Vec::as_mut_slice).collect(),
        strategy,
    }));

    let mut remaining = bytes_read as usize;
    for (iov, buf) in iovecs.iter().zip(&buffers) {
        if remaining == 0 {
            break;
        }
        let filled = remaining.min(buf.len());
        wasi_try_mem!(memory.write(iov.buf, &buf[..filled]));
        remaining -= filled;
    }

    Span::current().record("nread", bytes_read);
    wasi_try_mem!(memory.write_u32(nread, bytes_read as u32));
    Errno::Success
}
