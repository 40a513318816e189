//! WASI preview1 errno values.
//!
//! Emscripten builds share this numbering, so the same table is used for
//! both the Emscripten syscall adapters and the WASI functions.

use std::fmt;

macro_rules! errno_table {
    ($( $(#[$meta:meta])* $variant:ident = $code:literal, $name:literal, $description:literal; )+) => {
        /// Error codes returned to the guest.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u16)]
        pub enum Errno {
            $( $(#[$meta])* $variant = $code, )+
        }

        impl Errno {
            /// Every errno value, in numeric order.
            pub const ALL: &'static [Errno] = &[$(Errno::$variant),+];

            /// Upper-case symbolic name without the `E` prefix, e.g. `NOENT`.
            pub fn name(self) -> &'static str {
                match self {
                    $( Errno::$variant => $name, )+
                }
            }

            /// Short human readable description.
            pub fn description(self) -> &'static str {
                match self {
                    $( Errno::$variant => $description, )+
                }
            }

            /// Look up an errno by its numeric code.
            pub fn from_code(code: u16) -> Option<Self> {
                match code {
                    $( $code => Some(Errno::$variant), )+
                    _ => None,
                }
            }
        }
    };
}

errno_table! {
    Success = 0, "SUCCESS", "No error occurred";
    Toobig = 1, "2BIG", "Argument list too long";
    Access = 2, "ACCES", "Permission denied";
    Addrinuse = 3, "ADDRINUSE", "Address in use";
    Addrnotavail = 4, "ADDRNOTAVAIL", "Address not available";
    Afnosupport = 5, "AFNOSUPPORT", "Address family not supported";
    Again = 6, "AGAIN", "Resource unavailable, or operation would block";
    Already = 7, "ALREADY", "Connection already in progress";
    Badf = 8, "BADF", "Bad file descriptor";
    Badmsg = 9, "BADMSG", "Bad message";
    Busy = 10, "BUSY", "Device or resource busy";
    Canceled = 11, "CANCELED", "Operation canceled";
    Child = 12, "CHILD", "No child processes";
    Connaborted = 13, "CONNABORTED", "Connection aborted";
    Connrefused = 14, "CONNREFUSED", "Connection refused";
    Connreset = 15, "CONNRESET", "Connection reset";
    Deadlk = 16, "DEADLK", "Resource deadlock would occur";
    Destaddrreq = 17, "DESTADDRREQ", "Destination address required";
    Dom = 18, "DOM", "Mathematics argument out of domain of function";
    Dquot = 19, "DQUOT", "Disk quota exceeded";
    Exist = 20, "EXIST", "File exists";
    Fault = 21, "FAULT", "Bad address";
    Fbig = 22, "FBIG", "File too large";
    Hostunreach = 23, "HOSTUNREACH", "Host is unreachable";
    Idrm = 24, "IDRM", "Identifier removed";
    Ilseq = 25, "ILSEQ", "Illegal byte sequence";
    Inprogress = 26, "INPROGRESS", "Operation in progress";
    Intr = 27, "INTR", "Interrupted function";
    Inval = 28, "INVAL", "Invalid argument";
    Io = 29, "IO", "I/O error";
    Isconn = 30, "ISCONN", "Socket is connected";
    Isdir = 31, "ISDIR", "Is a directory";
    Loop = 32, "LOOP", "Too many levels of symbolic links";
    Mfile = 33, "MFILE", "File descriptor value too large";
    Mlink = 34, "MLINK", "Too many links";
    Msgsize = 35, "MSGSIZE", "Message too large";
    Multihop = 36, "MULTIHOP", "Multihop attempted";
    Nametoolong = 37, "NAMETOOLONG", "Filename too long";
    Netdown = 38, "NETDOWN", "Network is down";
    Netreset = 39, "NETRESET", "Connection aborted by network";
    Netunreach = 40, "NETUNREACH", "Network unreachable";
    Nfile = 41, "NFILE", "Too many files open in system";
    Nobufs = 42, "NOBUFS", "No buffer space available";
    Nodev = 43, "NODEV", "No such device";
    Noent = 44, "NOENT", "No such file or directory";
    Noexec = 45, "NOEXEC", "Executable file format error";
    Nolck = 46, "NOLCK", "No locks available";
    Nolink = 47, "NOLINK", "Link has been severed";
    Nomem = 48, "NOMEM", "Not enough space";
    Nomsg = 49, "NOMSG", "No message of the desired type";
    Noprotoopt = 50, "NOPROTOOPT", "Protocol not available";
    Nospc = 51, "NOSPC", "No space left on device";
    Nosys = 52, "NOSYS", "Function not supported";
    Notconn = 53, "NOTCONN", "The socket is not connected";
    Notdir = 54, "NOTDIR", "Not a directory or a symbolic link to a directory";
    Notempty = 55, "NOTEMPTY", "Directory not empty";
    Notrecoverable = 56, "NOTRECOVERABLE", "State not recoverable";
    Notsock = 57, "NOTSOCK", "Not a socket";
    Notsup = 58, "NOTSUP", "Not supported, or operation not supported on socket";
    Notty = 59, "NOTTY", "Inappropriate I/O control operation";
    Nxio = 60, "NXIO", "No such device or address";
    Overflow = 61, "OVERFLOW", "Value too large to be stored in data type";
    Ownerdead = 62, "OWNERDEAD", "Previous owner died";
    Perm = 63, "PERM", "Operation not permitted";
    Pipe = 64, "PIPE", "Broken pipe";
    Proto = 65, "PROTO", "Protocol error";
    Protonosupport = 66, "PROTONOSUPPORT", "Protocol not supported";
    Prototype = 67, "PROTOTYPE", "Protocol wrong type for socket";
    Range = 68, "RANGE", "Result too large";
    Rofs = 69, "ROFS", "Read-only file system";
    Spipe = 70, "SPIPE", "Invalid seek";
    Srch = 71, "SRCH", "No such process";
    Stale = 72, "STALE", "Stale file handle";
    Timedout = 73, "TIMEDOUT", "Connection timed out";
    Txtbsy = 74, "TXTBSY", "Text file busy";
    Xdev = 75, "XDEV", "Cross-device link";
    Notcapable = 76, "NOTCAPABLE", "Extension: Capabilities insufficient";
}

impl Errno {
    /// Numeric code as seen by the guest.
    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Value returned by Emscripten syscalls: `0` for success, `-errno` otherwise.
    #[inline]
    pub fn negative(self) -> i32 {
        -(self.code() as i32)
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_dense_and_round_trip() {
        for (index, errno) in Errno::ALL.iter().enumerate() {
            assert_eq!(errno.code() as usize, index);
            assert_eq!(Errno::from_code(errno.code()), Some(*errno));
        }
        assert_eq!(Errno::from_code(77), None);
    }

    #[test]
    fn negative_codes() {
        assert_eq!(Errno::Success.negative(), 0);
        assert_eq!(Errno::Noent.negative(), -44);
        assert_eq!(Errno::Badf.negative(), -8);
    }
}
