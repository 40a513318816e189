//! Core identifier types.

use std::fmt;

/// Guest-visible file descriptor.
///
/// Descriptors are small non-negative integers owned by a
/// [`FileDescriptorTable`](crate::FileDescriptorTable). A value is unique while
/// the descriptor is open and may be handed out again after it is closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Fd(pub i32);

impl Fd {
    /// Raw descriptor value.
    #[inline]
    pub fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Fd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for Fd {
    #[inline]
    fn from(raw: i32) -> Self {
        Self(raw)
    }
}
