use super::*;

/// ### `environ_sizes_get()`
/// Return environment variable data sizes.
/// Outputs:
/// - `size_t *environ_count`
///     The number of environment variables.
/// - `size_t *environ_buf_size`
///     The size of the environment variable string data, terminators
///     included.
#[instrument(level = "trace", skip_all, ret)]
pub fn environ_sizes_get(
    host: &EmbedderHost,
    memory: &mut dyn GuestMemory,
    environ_count: u32,
    environ_buf_size: u32,
) -> Errno {
    let envs = environment_strings(host);
    let count = wasi_try_mem!(u32::try_from(envs.len()).ok(); Errno::Overflow);
    let size: usize = envs.iter().map(Vec::len).sum();
    let size = wasi_try_mem!(u32::try_from(size).ok(); Errno::Overflow);

    wasi_try_mem!(memory.write_u32(environ_count, count));
    wasi_try_mem!(memory.write_u32(environ_buf_size, size));
    tracing::trace!(count, size, "environment sizes");
    Errno::Success
}
