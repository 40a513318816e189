//! Process-local descriptor table.
//!
//! The table lock only covers slot bookkeeping. Handles are stored behind an
//! `Arc` and callers reach them through closures ([`FileDescriptorTable::with_handle`],
//! [`FileDescriptorTable::with_directory`]) that run after the table lock has
//! been released, so I/O on one descriptor never waits for another.

use crate::error::{DescriptorNotOpen, NoFreeDescriptor, ResolveError};
use crate::ids::Fd;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// State every backend handle exposes to the table.
pub trait OpenHandle: Send + Sync {
    /// Path the handle was opened with (after resolution).
    fn path(&self) -> &Path;

    /// Whether the handle refers to a directory.
    fn is_directory(&self) -> bool;
}

/// Capacity policy of a [`FileDescriptorTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FdTableConfig {
    /// Lowest descriptor handed out. `0..first` stay reserved (stdio).
    pub first: i32,
    /// Highest descriptor handed out (inclusive).
    pub max: i32,
}

impl Default for FdTableConfig {
    fn default() -> Self {
        Self { first: 3, max: 1024 }
    }
}

pub struct FileDescriptorTable<H: OpenHandle> {
    config: FdTableConfig,
    slots: Mutex<HashMap<Fd, Arc<H>>>,
}

impl<H: OpenHandle> FileDescriptorTable<H> {
    pub fn new(config: FdTableConfig) -> Self {
        Self {
            config,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> FdTableConfig {
        self.config
    }

    /// Store `handle` under the lowest free descriptor. On failure the
    /// handle is dropped, which closes it.
    pub fn add(&self, handle: H) -> Result<Fd, NoFreeDescriptor> {
        let mut slots = self.slots.lock();
        let fd = (self.config.first..=self.config.max)
            .map(Fd)
            .find(|fd| !slots.contains_key(fd))
            .ok_or(NoFreeDescriptor {
                max: self.config.max,
            })?;
        slots.insert(fd, Arc::new(handle));
        tracing::trace!(%fd, "descriptor allocated");
        Ok(fd)
    }

    /// Run `f` against the handle behind `fd`.
    pub fn with_handle<R>(
        &self,
        fd: Fd,
        f: impl FnOnce(&H) -> R,
    ) -> Result<R, DescriptorNotOpen> {
        let handle = self.slots.lock().get(&fd).cloned().ok_or(DescriptorNotOpen(fd))?;
        Ok(f(&handle))
    }

    /// Like [`with_handle`](Self::with_handle) for a base directory of a path
    /// lookup: a closed descriptor is `FileDescriptorNotOpen` and a
    /// non-directory is `NotDirectory`.
    pub fn with_directory<R>(
        &self,
        fd: Fd,
        f: impl FnOnce(&H) -> R,
    ) -> Result<R, ResolveError> {
        let handle = self.slots.lock().get(&fd).cloned().ok_or_else(|| {
            ResolveError::FileDescriptorNotOpen(DescriptorNotOpen(fd).to_string())
        })?;
        if !handle.is_directory() {
            return Err(ResolveError::NotDirectory(format!(
                "file descriptor {fd} (`{}`) is not a directory",
                handle.path().display()
            )));
        }
        Ok(f(&handle))
    }

    /// Remove `fd` and hand back its handle. Concurrent lookups either see
    /// the handle or `DescriptorNotOpen`, never a half-removed slot.
    pub fn remove(&self, fd: Fd) -> Result<Arc<H>, DescriptorNotOpen> {
        let handle = self.slots.lock().remove(&fd).ok_or(DescriptorNotOpen(fd))?;
        tracing::trace!(%fd, "descriptor released");
        Ok(handle)
    }

    pub fn contains(&self, fd: Fd) -> bool {
        self.slots.lock().contains_key(&fd)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Open descriptors in ascending order.
    pub fn live_descriptors(&self) -> Vec<Fd> {
        let mut fds: Vec<Fd> = self.slots.lock().keys().copied().collect();
        fds.sort_unstable();
        fds
    }

    /// Remove every handle, e.g. on teardown.
    pub fn drain(&self) -> Vec<(Fd, Arc<H>)> {
        let mut handles: Vec<_> = self.slots.lock().drain().collect();
        handles.sort_unstable_by_key(|(fd, _)| *fd);
        handles
    }
}

impl<H: OpenHandle> Drop for FileDescriptorTable<H> {
    fn drop(&mut self) {
        for (fd, handle) in self.slots.get_mut().drain() {
            tracing::warn!(
                %fd,
                path = %handle.path().display(),
                "file descriptor was not closed before the table was dropped"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[derive(Debug)]
    struct TestHandle {
        path: PathBuf,
        directory: bool,
    }

    impl TestHandle {
        fn file(path: &str) -> Self {
            Self {
                path: PathBuf::from(path),
                directory: false,
            }
        }

        fn dir(path: &str) -> Self {
            Self {
                path: PathBuf::from(path),
                directory: true,
            }
        }
    }

    impl OpenHandle for TestHandle {
        fn path(&self) -> &Path {
            &self.path
        }

        fn is_directory(&self) -> bool {
            self.directory
        }
    }

    fn table(first: i32, max: i32) -> FileDescriptorTable<TestHandle> {
        FileDescriptorTable::new(FdTableConfig { first, max })
    }

    #[test]
    fn allocates_lowest_free_descriptor() {
        let table = table(3, 10);
        assert_eq!(table.add(TestHandle::file("/a")).unwrap(), Fd(3));
        assert_eq!(table.add(TestHandle::file("/b")).unwrap(), Fd(4));
        assert_eq!(table.add(TestHandle::file("/c")).unwrap(), Fd(5));

        table.remove(Fd(4)).unwrap();
        assert!(!table.contains(Fd(4)));
        assert_eq!(table.add(TestHandle::file("/d")).unwrap(), Fd(4));
        assert_eq!(table.live_descriptors(), vec![Fd(3), Fd(4), Fd(5)]);
        table.drain();
    }

    #[test]
    fn bounded_capacity() {
        let table = table(3, 4);
        table.add(TestHandle::file("/a")).unwrap();
        table.add(TestHandle::file("/b")).unwrap();
        let err = table.add(TestHandle::file("/c")).unwrap_err();
        assert_eq!(err, NoFreeDescriptor { max: 4 });
        table.drain();
    }

    #[test]
    fn remove_twice_reports_not_open() {
        let table = table(3, 10);
        let fd = table.add(TestHandle::file("/a")).unwrap();
        let handle = table.remove(fd).unwrap();
        assert_eq!(handle.path(), Path::new("/a"));
        assert_eq!(table.remove(fd).unwrap_err(), DescriptorNotOpen(fd));
        assert!(table.with_handle(fd, |_| ()).is_err());
    }

    #[test]
    fn directory_lookup_checks_type() {
        let table = table(3, 10);
        let file = table.add(TestHandle::file("/a")).unwrap();
        let dir = table.add(TestHandle::dir("/d")).unwrap();

        let joined = table
            .with_directory(dir, |h| h.path().join("x"))
            .unwrap();
        assert_eq!(joined, PathBuf::from("/d/x"));
        assert!(matches!(
            table.with_directory(file, |_| ()),
            Err(ResolveError::NotDirectory(_))
        ));
        assert!(matches!(
            table.with_directory(Fd(9), |_| ()),
            Err(ResolveError::FileDescriptorNotOpen(_))
        ));
        table.drain();
    }

    #[test]
    fn handle_outlives_removal_while_in_use() {
        let table = table(3, 10);
        let fd = table.add(TestHandle::file("/a")).unwrap();
        let path = table
            .with_handle(fd, |h| {
                h.path().to_path_buf()
            })
            .unwrap();
        assert_eq!(path, PathBuf::from("/a"));
        let drained = table.drain();
        assert_eq!(drained.len(), 1);
        assert!(table.is_empty());
    }

    #[tracing_test::traced_test]
    #[test]
    fn dropping_a_non_empty_table_reports_leaks() {
        let table = table(3, 10);
        table.add(TestHandle::file("/leaked")).unwrap();
        drop(table);
        assert!(logs_contain("was not closed"));
    }
}
