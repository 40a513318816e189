use super::*;

/// ### `fd_write()`
/// Write data to the file descriptor
/// Inputs:
/// - `Fd fd`
///     File descriptor (opened with writing) to write to
/// - `const __wasi_ciovec_t *iovs`
///     List of vectors to read data from
/// - `u32 iovs_len`
///     Length of data in `iovs`
/// Output:
/// - `u32 *nwritten`
///     Number of bytes written
#[instrument(level = "trace", skip_all, fields(%fd, nwritten = field::Empty), ret)]
pub fn fd_write(
    host: &EmbedderHost,
    memory: &mut dyn GuestMemory,
    fd: i32,
    iovs: u32,
    iovs_len: u32,
    nwritten: u32,
) -> Errno {
    write_from_guest(host, memory, fd, iovs, iovs_len, ReadWriteStrategy::ChangePosition, nwritten)
}

/// ### `fd_pwrite()`
/// Write to a file without adjusting its offset
/// Inputs:
/// - `Fd fd`
/// - `const __wasi_ciovec_t *iovs`
/// - `u32 iovs_len`
/// - `u64 offset`
///     The offset to write at
/// Output:
/// - `u32 *nwritten`
#[instrument(level = "trace", skip_all, fields(%fd, %offset, nwritten = field::Empty), ret)]
pub fn fd_pwrite(
    host: &EmbedderHost,
    memory: &mut dyn GuestMemory,
    fd: i32,
    iovs: u32,
    iovs_len: u32,
    offset: u64,
    nwritten: u32,
) -> Errno {
    let strategy = ReadWriteStrategy::DoNotChangePosition(offset);
    write_from_guest(host, memory, fd, iovs, iovs_len, strategy, nwritten)
}

fn write_from_guest(
    host: &EmbedderHost,
    memory: &mut dyn GuestMemory,
    fd: i32,
    iovs: u32,
    iovs_len: u32,
    strategy: ReadWriteStrategy,
    nwritten: u32,
) -> Errno {
    let iovecs = wasi_try_mem!(guest_iovecs(memory, iovs, iovs_len));
    wasi_try_mem!(memory.check_range(nwritten, 4));

    let mut buffers = Vec::with_capacity(iovecs.len());
    for iov in &iovecs {
        buffers.push(wasi_try_mem!(memory.read_bytes(iov.buf, iov.len)));
    }
    let bytes_written = wasi_try!(host.file_system().execute(WriteFd {
        fd: Fd(fd),
        cvecs: buffers.iter().map(Vec::as_slice).collect(),
        strategy,
    }));

    Span::current().record("nwritten", bytes_written);
    wasi_try_mem!(memory.write_u32(nwritten, bytes_written as u32));
    Errno::Success
}
