//! Advisory byte-range lock records.

use crate::flags::Whence;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Shared (`F_RDLCK`) or exclusive (`F_WRLCK`) lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdvisoryLockKind {
    Read,
    Write,
}

/// Lock request as issued by the guest: a whence-relative range.
///
/// `length == 0` extends to the end of file and beyond; a negative length
/// covers the bytes before `start`, as with `fcntl`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Advisorylock {
    pub kind: AdvisoryLockKind,
    pub whence: Whence,
    pub start: i64,
    pub length: i64,
}

/// Absolute byte range. `len == 0` means "up to infinity".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LockRange {
    pub start: u64,
    pub len: u64,
}

impl LockRange {
    pub const fn new(start: u64, len: u64) -> Self {
        Self { start, len }
    }

    /// Exclusive end, `None` for unbounded ranges.
    pub fn end(&self) -> Option<u64> {
        if self.len == 0 {
            None
        } else {
            Some(self.start.saturating_add(self.len))
        }
    }

    pub fn overlaps(&self, other: &LockRange) -> bool {
        let self_before_other = self.end().is_some_and(|end| end <= other.start);
        let other_before_self = other.end().is_some_and(|end| end <= self.start);
        !self_before_other && !other_before_self
    }

    /// Parts of `self` not covered by `other`: at most one piece before and
    /// one after.
    pub fn subtract(&self, other: &LockRange) -> SmallVec<[LockRange; 2]> {
        let mut pieces = SmallVec::new();
        if !self.overlaps(other) {
            pieces.push(*self);
            return pieces;
        }
        if self.start < other.start {
            pieces.push(LockRange::new(self.start, other.start - self.start));
        }
        if let Some(other_end) = other.end() {
            match self.end() {
                Some(self_end) if self_end > other_end => {
                    pieces.push(LockRange::new(other_end, self_end - other_end));
                }
                None => pieces.push(LockRange::new(other_end, 0)),
                _ => {}
            }
        }
        pieces
    }

    /// Turn a whence-relative request into an absolute range.
    ///
    /// `current` and `size` are only consulted for `Whence::Cur` and
    /// `Whence::End`. Returns `None` when the range starts before offset 0 or
    /// does not fit an `off_t`.
    pub fn resolve(lock: &Advisorylock, current: u64, size: u64) -> Option<LockRange> {
        let base: i64 = match lock.whence {
            Whence::Set => 0,
            Whence::Cur => i64::try_from(current).ok()?,
            Whence::End => i64::try_from(size).ok()?,
        };
        let mut start = base.checked_add(lock.start)?;
        let mut len = lock.length;
        if len < 0 {
            start = start.checked_add(len)?;
            len = len.checked_neg()?;
        }
        if start < 0 {
            return None;
        }
        if len > 0 {
            start.checked_add(len)?;
        }
        Some(LockRange::new(start as u64, len as u64))
    }
}

/// Locks currently held through one handle.
///
/// No two records overlap: adding a lock replaces every record it touches.
#[derive(Debug, Default)]
pub struct AdvisoryLockTable {
    records: BTreeMap<LockRange, AdvisoryLockKind>,
}

impl AdvisoryLockTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn get(&self, range: &LockRange) -> Option<AdvisoryLockKind> {
        self.records.get(range).copied()
    }

    /// Records in ascending order.
    pub fn records(&self) -> impl Iterator<Item = (LockRange, AdvisoryLockKind)> + '_ {
        self.records.iter().map(|(range, kind)| (*range, *kind))
    }

    /// Records that overlap `range`.
    pub fn overlapping(&self, range: &LockRange) -> SmallVec<[(LockRange, AdvisoryLockKind); 4]> {
        self.records()
            .filter(|(existing, _)| existing.overlaps(range))
            .collect()
    }

    /// Record a lock that the host has granted. Overlapping records are
    /// dropped and returned so the caller can release whatever part of them
    /// the new lock does not cover.
    pub fn commit_add(
        &mut self,
        range: LockRange,
        kind: AdvisoryLockKind,
    ) -> SmallVec<[(LockRange, AdvisoryLockKind); 4]> {
        let replaced = self.overlapping(&range);
        for (existing, _) in &replaced {
            self.records.remove(existing);
        }
        self.records.insert(range, kind);
        replaced
    }

    /// Record that the host released `range`. Records straddling the range
    /// keep their uncovered parts.
    pub fn commit_remove(&mut self, range: LockRange) {
        for (existing, kind) in self.overlapping(&range) {
            self.records.remove(&existing);
            for piece in existing.subtract(&range) {
                self.records.insert(piece, kind);
            }
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
