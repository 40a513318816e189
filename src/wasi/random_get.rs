use super::*;

/// ### `random_get()`
/// Fill buffer with high-quality random data.  This function may be slow and block
/// Inputs:
/// - `void *buf`
///     A pointer to a buffer where the random bytes will be written
/// - `size_t buf_len`
///     The number of bytes that will be written
#[instrument(level = "trace", skip_all, fields(%buf_len), ret)]
pub fn random_get(host: &EmbedderHost, memory: &mut dyn GuestMemory, buf: u32, buf_len: u32) -> Errno {
    wasi_try_mem!(memory.check_range(buf, buf_len));
    let mut bytes = vec![0; buf_len as usize];
    if let Err(err) = host.entropy().fill(&mut bytes) {
        tracing::warn!(%err, "entropy source failed");
        return Errno::Io;
    }
    wasi_try_mem!(memory.write(buf, &bytes));
    Errno::Success
}
