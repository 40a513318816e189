//! Host errno → WASI errno translation.
//!
//! This is the single source of truth for mapping raw `libc` errno values to
//! `vfs_core::Errno`. Backends must not duplicate this mapping.

use std::io;
use vfs_core::Errno;

/// Map a raw host errno. `None` for values without a WASI counterpart.
pub fn host_errno(raw: i32) -> Option<Errno> {
    let errno = match raw {
        libc::E2BIG => Errno::Toobig,
        libc::EACCES => Errno::Access,
        libc::EADDRINUSE => Errno::Addrinuse,
        libc::EADDRNOTAVAIL => Errno::Addrnotavail,
        libc::EAFNOSUPPORT => Errno::Afnosupport,
        libc::EAGAIN => Errno::Again,
        libc::EALREADY => Errno::Already,
        libc::EBADF => Errno::Badf,
        libc::EBADMSG => Errno::Badmsg,
        libc::EBUSY => Errno::Busy,
        libc::ECANCELED => Errno::Canceled,
        libc::ECHILD => Errno::Child,
        libc::ECONNABORTED => Errno::Connaborted,
        libc::ECONNREFUSED => Errno::Connrefused,
        libc::ECONNRESET => Errno::Connreset,
        libc::EDEADLK => Errno::Deadlk,
        libc::EDESTADDRREQ => Errno::Destaddrreq,
        libc::EDOM => Errno::Dom,
        libc::EDQUOT => Errno::Dquot,
        libc::EEXIST => Errno::Exist,
        libc::EFAULT => Errno::Fault,
        libc::EFBIG => Errno::Fbig,
        libc::EHOSTUNREACH => Errno::Hostunreach,
        libc::EIDRM => Errno::Idrm,
        libc::EILSEQ => Errno::Ilseq,
        libc::EINPROGRESS => Errno::Inprogress,
        libc::EINTR => Errno::Intr,
        libc::EINVAL => Errno::Inval,
        libc::EIO => Errno::Io,
        libc::EISCONN => Errno::Isconn,
        libc::EISDIR => Errno::Isdir,
        libc::ELOOP => Errno::Loop,
        libc::EMFILE => Errno::Mfile,
        libc::EMLINK => Errno::Mlink,
        libc::EMSGSIZE => Errno::Msgsize,
        libc::EMULTIHOP => Errno::Multihop,
        libc::ENAMETOOLONG => Errno::Nametoolong,
        libc::ENETDOWN => Errno::Netdown,
        libc::ENETRESET => Errno::Netreset,
        libc::ENETUNREACH => Errno::Netunreach,
        libc::ENFILE => Errno::Nfile,
        libc::ENOBUFS => Errno::Nobufs,
        libc::ENODEV => Errno::Nodev,
        libc::ENOENT => Errno::Noent,
        libc::ENOEXEC => Errno::Noexec,
        libc::ENOLCK => Errno::Nolck,
        libc::ENOLINK => Errno::Nolink,
        libc::ENOMEM => Errno::Nomem,
        libc::ENOMSG => Errno::Nomsg,
        libc::ENOPROTOOPT => Errno::Noprotoopt,
        libc::ENOSPC => Errno::Nospc,
        libc::ENOSYS => Errno::Nosys,
        libc::ENOTCONN => Errno::Notconn,
        libc::ENOTDIR => Errno::Notdir,
        libc::ENOTEMPTY => Errno::Notempty,
        libc::ENOTRECOVERABLE => Errno::Notrecoverable,
        libc::ENOTSOCK => Errno::Notsock,
        libc::ENOTSUP => Errno::Notsup,
        libc::ENOTTY => Errno::Notty,
        libc::ENXIO => Errno::Nxio,
        libc::EOVERFLOW => Errno::Overflow,
        libc::EOWNERDEAD => Errno::Ownerdead,
        libc::EPERM => Errno::Perm,
        libc::EPIPE => Errno::Pipe,
        libc::EPROTO => Errno::Proto,
        libc::EPROTONOSUPPORT => Errno::Protonosupport,
        libc::EPROTOTYPE => Errno::Prototype,
        libc::ERANGE => Errno::Range,
        libc::EROFS => Errno::Rofs,
        libc::ESPIPE => Errno::Spipe,
        libc::ESRCH => Errno::Srch,
        libc::ESTALE => Errno::Stale,
        libc::ETIMEDOUT => Errno::Timedout,
        libc::ETXTBSY => Errno::Txtbsy,
        libc::EXDEV => Errno::Xdev,
        // Aliases of the values above on some hosts.
        raw if raw == libc::EWOULDBLOCK => Errno::Again,
        raw if raw == libc::EOPNOTSUPP => Errno::Notsup,
        _ => return None,
    };
    Some(errno)
}

/// Inverse of [`host_errno`] for the canonical host value.
pub fn errno_to_host(errno: Errno) -> Option<i32> {
    let raw = match errno {
        Errno::Success | Errno::Notcapable => return None,
        Errno::Toobig => libc::E2BIG,
        Errno::Access => libc::EACCES,
        Errno::Addrinuse => libc::EADDRINUSE,
        Errno::Addrnotavail => libc::EADDRNOTAVAIL,
        Errno::Afnosupport => libc::EAFNOSUPPORT,
        Errno::Again => libc::EAGAIN,
        Errno::Already => libc::EALREADY,
        Errno::Badf => libc::EBADF,
        Errno::Badmsg => libc::EBADMSG,
        Errno::Busy => libc::EBUSY,
        Errno::Canceled => libc::ECANCELED,
        Errno::Child => libc::ECHILD,
        Errno::Connaborted => libc::ECONNABORTED,
        Errno::Connrefused => libc::ECONNREFUSED,
        Errno::Connreset => libc::ECONNRESET,
        Errno::Deadlk => libc::EDEADLK,
        Errno::Destaddrreq => libc::EDESTADDRREQ,
        Errno::Dom => libc::EDOM,
        Errno::Dquot => libc::EDQUOT,
        Errno::Exist => libc::EEXIST,
        Errno::Fault => libc::EFAULT,
        Errno::Fbig => libc::EFBIG,
        Errno::Hostunreach => libc::EHOSTUNREACH,
        Errno::Idrm => libc::EIDRM,
        Errno::Ilseq => libc::EILSEQ,
        Errno::Inprogress => libc::EINPROGRESS,
        Errno::Intr => libc::EINTR,
        Errno::Inval => libc::EINVAL,
        Errno::Io => libc::EIO,
        Errno::Isconn => libc::EISCONN,
        Errno::Isdir => libc::EISDIR,
        Errno::Loop => libc::ELOOP,
        Errno::Mfile => libc::EMFILE,
        Errno::Mlink => libc::EMLINK,
        Errno::Msgsize => libc::EMSGSIZE,
        Errno::Multihop => libc::EMULTIHOP,
        Errno::Nametoolong => libc::ENAMETOOLONG,
        Errno::Netdown => libc::ENETDOWN,
        Errno::Netreset => libc::ENETRESET,
        Errno::Netunreach => libc::ENETUNREACH,
        Errno::Nfile => libc::ENFILE,
        Errno::Nobufs => libc::ENOBUFS,
        Errno::Nodev => libc::ENODEV,
        Errno::Noent => libc::ENOENT,
        Errno::Noexec => libc::ENOEXEC,
        Errno::Nolck => libc::ENOLCK,
        Errno::Nolink => libc::ENOLINK,
        Errno::Nomem => libc::ENOMEM,
        Errno::Nomsg => libc::ENOMSG,
        Errno::Noprotoopt => libc::ENOPROTOOPT,
        Errno::Nospc => libc::ENOSPC,
        Errno::Nosys => libc::ENOSYS,
        Errno::Notconn => libc::ENOTCONN,
        Errno::Notdir => libc::ENOTDIR,
        Errno::Notempty => libc::ENOTEMPTY,
        Errno::Notrecoverable => libc::ENOTRECOVERABLE,
        Errno::Notsock => libc::ENOTSOCK,
        Errno::Notsup => libc::ENOTSUP,
        Errno::Notty => libc::ENOTTY,
        Errno::Nxio => libc::ENXIO,
        Errno::Overflow => libc::EOVERFLOW,
        Errno::Ownerdead => libc::EOWNERDEAD,
        Errno::Perm => libc::EPERM,
        Errno::Pipe => libc::EPIPE,
        Errno::Proto => libc::EPROTO,
        Errno::Protonosupport => libc::EPROTONOSUPPORT,
        Errno::Prototype => libc::EPROTOTYPE,
        Errno::Range => libc::ERANGE,
        Errno::Rofs => libc::EROFS,
        Errno::Spipe => libc::ESPIPE,
        Errno::Srch => libc::ESRCH,
        Errno::Stale => libc::ESTALE,
        Errno::Timedout => libc::ETIMEDOUT,
        Errno::Txtbsy => libc::ETXTBSY,
        Errno::Xdev => libc::EXDEV,
    };
    Some(raw)
}

/// Errno carried by an `io::Error` created from a host call.
pub fn io_error_to_errno(err: &io::Error) -> Option<Errno> {
    err.raw_os_error().and_then(host_errno)
}

/// Errno left behind by the last failing libc call on this thread.
pub fn last_errno() -> Option<Errno> {
    io_error_to_errno(&io::Error::last_os_error())
}
