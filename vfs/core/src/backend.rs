//! The capability interface every backend implements.

use crate::error::OperationError;
use crate::ids::Fd;
use crate::op::*;
use crate::stat::StructStat;
use enumset::EnumSet;
use std::path::PathBuf;

/// Build the error returned for an operation a backend does not handle.
pub fn not_implemented<E: OperationError>(backend: &str, kind: OperationKind) -> E {
    E::not_implemented(format!("{kind}: not implemented by the {backend} backend"))
}

/// One handler per operation.
///
/// Every handler has a default body returning `NotImplemented`, so a backend
/// only overrides what it supports and lists those kinds in
/// [`supported_operations`](Self::supported_operations). The dispatcher
/// checks that set before calling a handler.
pub trait FileSystemBackend: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Operations with a real handler on this backend.
    fn supported_operations(&self) -> EnumSet<OperationKind>;

    /// Descriptors currently open, in ascending order.
    fn live_descriptors(&self) -> Vec<Fd> {
        Vec::new()
    }

    /// Close every open descriptor and release its locks. Returns the number
    /// of descriptors that were closed.
    fn close_all(&self) -> usize {
        0
    }

    fn open(&self, input: &Open) -> Result<Fd, OpenError> {
        let _ = input;
        Err(not_implemented(self.name(), OperationKind::Open))
    }

    fn close(&self, input: &Close) -> Result<(), CloseError> {
        let _ = input;
        Err(not_implemented(self.name(), OperationKind::Close))
    }

    fn read_fd(&self, input: &mut ReadFd<'_>) -> Result<u64, ReadError> {
        let _ = input;
        Err(not_implemented(self.name(), OperationKind::ReadFd))
    }

    fn write_fd(&self, input: &WriteFd<'_>) -> Result<u64, WriteError> {
        let _ = input;
        Err(not_implemented(self.name(), OperationKind::WriteFd))
    }

    fn seek_fd(&self, input: &SeekFd) -> Result<u64, SeekError> {
        let _ = input;
        Err(not_implemented(self.name(), OperationKind::SeekFd))
    }

    fn stat(&self, input: &Stat) -> Result<StructStat, StatError> {
        let _ = input;
        Err(not_implemented(self.name(), OperationKind::Stat))
    }

    fn stat_fd(&self, input: &StatFd) -> Result<StructStat, StatError> {
        let _ = input;
        Err(not_implemented(self.name(), OperationKind::StatFd))
    }

    fn chmod(&self, input: &Chmod) -> Result<(), ChmodError> {
        let _ = input;
        Err(not_implemented(self.name(), OperationKind::Chmod))
    }

    fn chmod_fd(&self, input: &ChmodFd) -> Result<(), ChmodError> {
        let _ = input;
        Err(not_implemented(self.name(), OperationKind::ChmodFd))
    }

    fn chown(&self, input: &Chown) -> Result<(), ChownError> {
        let _ = input;
        Err(not_implemented(self.name(), OperationKind::Chown))
    }

    fn chown_fd(&self, input: &ChownFd) -> Result<(), ChownError> {
        let _ = input;
        Err(not_implemented(self.name(), OperationKind::ChownFd))
    }

    fn mkdir(&self, input: &Mkdir) -> Result<(), MkdirError> {
        let _ = input;
        Err(not_implemented(self.name(), OperationKind::Mkdir))
    }

    fn unlink_file(&self, input: &UnlinkFile) -> Result<(), UnlinkError> {
        let _ = input;
        Err(not_implemented(self.name(), OperationKind::UnlinkFile))
    }

    fn unlink_directory(&self, input: &UnlinkDirectory) -> Result<(), UnlinkError> {
        let _ = input;
        Err(not_implemented(self.name(), OperationKind::UnlinkDirectory))
    }

    fn read_link(&self, input: &ReadLink) -> Result<PathBuf, ReadLinkError> {
        let _ = input;
        Err(not_implemented(self.name(), OperationKind::ReadLink))
    }

    fn set_timestamp(&self, input: &SetTimestamp) -> Result<(), SetTimestampError> {
        let _ = input;
        Err(not_implemented(self.name(), OperationKind::SetTimestamp))
    }

    fn set_timestamp_fd(&self, input: &SetTimestampFd) -> Result<(), SetTimestampError> {
        let _ = input;
        Err(not_implemented(self.name(), OperationKind::SetTimestampFd))
    }

    fn sync_fd(&self, input: &SyncFd) -> Result<(), SyncError> {
        let _ = input;
        Err(not_implemented(self.name(), OperationKind::SyncFd))
    }

    fn truncate_fd(&self, input: &TruncateFd) -> Result<(), TruncateError> {
        let _ = input;
        Err(not_implemented(self.name(), OperationKind::TruncateFd))
    }

    fn check_access(&self, input: &CheckAccess) -> Result<(), CheckAccessError> {
        let _ = input;
        Err(not_implemented(self.name(), OperationKind::CheckAccess))
    }

    fn add_advisory_lock_fd(&self, input: &AddAdvisoryLockFd) -> Result<(), AdvisoryLockError> {
        let _ = input;
        Err(not_implemented(self.name(), OperationKind::AddAdvisoryLockFd))
    }

    fn remove_advisory_lock_fd(
        &self,
        input: &RemoveAdvisoryLockFd,
    ) -> Result<(), AdvisoryLockError> {
        let _ = input;
        Err(not_implemented(self.name(), OperationKind::RemoveAdvisoryLockFd))
    }

    fn get_current_working_directory(
        &self,
        input: &GetCurrentWorkingDirectory,
    ) -> Result<PathBuf, GetCwdError> {
        let _ = input;
        Err(not_implemented(
            self.name(),
            OperationKind::GetCurrentWorkingDirectory,
        ))
    }
}
