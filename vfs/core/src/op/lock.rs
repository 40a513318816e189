use super::operation;
use crate::ids::Fd;
use crate::lock::Advisorylock;
use crate::operation_error;

/// `fcntl(F_SETLK)` with `F_RDLCK`/`F_WRLCK`.
///
/// Never blocks: a conflicting lock held elsewhere fails with `Again`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddAdvisoryLockFd {
    pub fd: Fd,
    pub lock: Advisorylock,
}

/// `fcntl(F_SETLK)` with `F_UNLCK`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemoveAdvisoryLockFd {
    pub fd: Fd,
    pub lock: Advisorylock,
}

operation_error! {
    /// Failures of [`AddAdvisoryLockFd`] and [`RemoveAdvisoryLockFd`].
    pub enum AdvisoryLockError: descriptor {
        Again => Again,
        BadFileDescriptor => Badf,
        Deadlock => Deadlk,
        Interrupted => Intr,
        InvalidArgument => Inval,
        NoLock => Nolck,
        Overflow => Overflow,
    }
}

operation!(AddAdvisoryLockFd => add_advisory_lock_fd, (), AdvisoryLockError);
operation!(RemoveAdvisoryLockFd => remove_advisory_lock_fd, (), AdvisoryLockError);
