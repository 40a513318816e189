//! Error plumbing shared by every operation.
//!
//! Each operation owns a closed error enum declared with [`operation_error!`].
//! The enum doubles as the mapping table between host errno values and typed
//! errors: [`OperationError::from_errno`] accepts exactly the errno values
//! listed for that operation. Anything else reaching a backend is a bug and
//! is reported through [`unmapped_errno`].

use crate::errno::Errno;
use crate::ids::Fd;
use std::fmt;

/// Behaviour common to all per-operation error enums.
pub trait OperationError: std::error::Error + fmt::Debug + Send + Sync + Sized + 'static {
    /// Errno values this error can represent, `NOSYS` excluded.
    const ERRNOS: &'static [Errno];

    /// Errno reported to the guest.
    fn errno(&self) -> Errno;

    /// Human readable detail.
    fn message(&self) -> &str;

    /// Build the variant mapped to `errno`, or `None` when the operation does
    /// not define one.
    fn from_errno(errno: Errno, message: String) -> Option<Self>;

    /// The backend has no handler for the operation.
    fn not_implemented(message: String) -> Self;
}

/// Declare a per-operation error enum.
///
/// ```ignore
/// operation_error! {
///     pub enum CloseError: descriptor {
///         BadFileDescriptor => Badf,
///         IoError => Io,
///     }
/// }
/// ```
///
/// Every enum gets a `NotImplemented` variant mapped to `NOSYS`. The optional
/// `resolve` and `descriptor` markers add `From<ResolveError>` and
/// `From<DescriptorNotOpen>` conversions.
#[macro_export]
macro_rules! operation_error {
    (
        $(#[$meta:meta])*
        pub enum $name:ident $(: $($conv:ident),+)? {
            $( $(#[$vmeta:meta])* $variant:ident => $errno:ident ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[error("{0}")]
                $variant(String),
            )+
            /// No handler for this operation on the active backend.
            #[error("{0}")]
            NotImplemented(String),
        }

        impl $crate::OperationError for $name {
            const ERRNOS: &'static [$crate::Errno] = &[$($crate::Errno::$errno),+];

            fn errno(&self) -> $crate::Errno {
                match self {
                    $( Self::$variant(_) => $crate::Errno::$errno, )+
                    Self::NotImplemented(_) => $crate::Errno::Nosys,
                }
            }

            fn message(&self) -> &str {
                match self {
                    $( Self::$variant(message) => message, )+
                    Self::NotImplemented(message) => message,
                }
            }

            fn from_errno(errno: $crate::Errno, message: String) -> Option<Self> {
                match errno {
                    $( $crate::Errno::$errno => Some(Self::$variant(message)), )+
                    $crate::Errno::Nosys => Some(Self::NotImplemented(message)),
                    _ => None,
                }
            }

            fn not_implemented(message: String) -> Self {
                Self::NotImplemented(message)
            }
        }

        $($( $crate::operation_error!(@conv $conv $name); )+)?
    };
    (@conv resolve $name:ident) => {
        impl From<$crate::ResolveError> for $name {
            fn from(err: $crate::ResolveError) -> Self {
                match err {
                    $crate::ResolveError::EmptyPath(message) => Self::NoEntry(message),
                    $crate::ResolveError::FileDescriptorNotOpen(message) => {
                        Self::BadFileDescriptor(message)
                    }
                    $crate::ResolveError::NotDirectory(message) => Self::NotDirectory(message),
                    $crate::ResolveError::InvalidPath(message)
                    | $crate::ResolveError::RelativePath(message) => Self::InvalidArgument(message),
                }
            }
        }
    };
    (@conv descriptor $name:ident) => {
        impl From<$crate::DescriptorNotOpen> for $name {
            fn from(err: $crate::DescriptorNotOpen) -> Self {
                Self::BadFileDescriptor(err.to_string())
            }
        }
    };
}

/// Failure to turn a `(path, base directory)` pair into a concrete target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("{0}")]
    EmptyPath(String),
    #[error("{0}")]
    FileDescriptorNotOpen(String),
    #[error("{0}")]
    NotDirectory(String),
    #[error("{0}")]
    InvalidPath(String),
    #[error("{0}")]
    RelativePath(String),
}

impl ResolveError {
    pub fn errno(&self) -> Errno {
        match self {
            ResolveError::EmptyPath(_) => Errno::Noent,
            ResolveError::FileDescriptorNotOpen(_) => Errno::Badf,
            ResolveError::NotDirectory(_) => Errno::Notdir,
            ResolveError::InvalidPath(_) | ResolveError::RelativePath(_) => Errno::Inval,
        }
    }
}

/// Lookup or removal of a descriptor that is not in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("file descriptor {0} is not open")]
pub struct DescriptorNotOpen(pub Fd);

/// Every descriptor in the allowed range is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("file descriptor limit exhausted ({max} descriptors)")]
pub struct NoFreeDescriptor {
    pub max: i32,
}

/// Convert a host errno into the typed error of an operation.
///
/// Panics through [`unmapped_errno`] when the operation has no variant for
/// `errno`.
#[track_caller]
pub fn map_errno<E: OperationError>(context: &'static str, errno: Errno) -> E {
    match E::from_errno(errno, format!("{context}: {}", errno.description())) {
        Some(err) => err,
        None => unmapped_errno(context, errno),
    }
}

/// A host call failed with an errno the operation does not list.
///
/// The mapping tables are meant to be total. Reaching this means a platform
/// reported something new and the table needs a new entry.
#[cold]
#[track_caller]
pub fn unmapped_errno(context: &'static str, errno: Errno) -> ! {
    panic!("{context}: unexpected host error {} ({})", errno.name(), errno.description())
}
