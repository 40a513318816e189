use super::*;

/// ### `environ_get()`
/// Read environment variable data.
/// The sizes of the buffers should match that returned by [`environ_sizes_get()`](#environ_sizes_get).
/// Inputs:
/// - `char **environ`
///     A pointer to a buffer to write the environment variable pointers.
/// - `char *environ_buf`
///     A pointer to a buffer to write the environment variable string data.
#[instrument(level = "trace", skip_all, ret)]
pub fn environ_get(host: &EmbedderHost, memory: &mut dyn GuestMemory, environ: u32, environ_buf: u32) -> Errno {
    let envs = environment_strings(host);
    write_buffer_array(memory, &envs, environ, environ_buf)
}
