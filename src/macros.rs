/// Unwrap the result of a [`FileSystem::execute`](vfs_core::FileSystem::execute)
/// call inside a WASI function, returning the operation's errno on failure.
macro_rules! wasi_try {
    ($expr:expr) => {{
        match $expr {
            Ok(val) => val,
            Err(err) => return vfs_core::OperationError::errno(&err),
        }
    }};
}

/// Like [`wasi_try!`] for anything convertible into an `Errno`, such as
/// guest memory failures.
macro_rules! wasi_try_mem {
    ($expr:expr) => {{
        match $expr {
            Ok(val) => val,
            Err(err) => return vfs_core::Errno::from(err),
        }
    }};
    ($expr:expr; $e:expr) => {{
        let opt: Option<_> = $expr;
        wasi_try_mem!(opt.ok_or($e))
    }};
}

/// Emscripten flavour of [`wasi_try!`]: returns `-errno`.
macro_rules! syscall_try {
    ($expr:expr) => {{
        match $expr {
            Ok(val) => val,
            Err(err) => return vfs_core::OperationError::errno(&err).negative(),
        }
    }};
}

/// Emscripten flavour of [`wasi_try_mem!`]: returns `-errno`.
macro_rules! syscall_try_mem {
    ($expr:expr) => {{
        match $expr {
            Ok(val) => val,
            Err(err) => return vfs_core::Errno::from(err).negative(),
        }
    }};
    ($expr:expr; $e:expr) => {{
        let opt: Option<_> = $expr;
        syscall_try_mem!(opt.ok_or($e))
    }};
}
