use std::collections::HashSet;
use std::slice;

use super::identity::{self, NotASnapshot, SnapshotIdentity, SnapshotKey};

/// Snapshots of one location, oldest first.
///
/// Sorted by timestamp with ties broken on the raw directory name, and
/// deduplicated by raw name. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotSet {
    snapshots: Vec<SnapshotIdentity>,
}

impl SnapshotSet {
    pub fn new(snapshots: impl IntoIterator<Item = SnapshotIdentity>) -> Self {
        let mut snapshots: Vec<SnapshotIdentity> = snapshots.into_iter().collect();
        snapshots.sort();
        snapshots.dedup();
        Self { snapshots }
    }

    /// Parse a directory listing. Names that are not snapshots are handed
    /// back instead of failing the whole set.
    pub fn from_names<I, S>(names: I) -> (Self, Vec<NotASnapshot>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut snapshots = Vec::new();
        let mut rejected = Vec::new();
        for name in names {
            match identity::parse(name.as_ref()) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(not_a_snapshot) => rejected.push(not_a_snapshot),
            }
        }
        (Self::new(snapshots), rejected)
    }

    pub fn iter(&self) -> slice::Iter<'_, SnapshotIdentity> {
        self.snapshots.iter()
    }

    pub fn as_slice(&self) -> &[SnapshotIdentity] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn oldest(&self) -> Option<&SnapshotIdentity> {
        self.snapshots.first()
    }

    pub fn latest(&self) -> Option<&SnapshotIdentity> {
        self.snapshots.last()
    }

    pub fn get(&self, raw_name: &str) -> Option<&SnapshotIdentity> {
        self.snapshots.iter().find(|s| s.raw_name() == raw_name)
    }

    /// The entry describing the same snapshot as `snapshot`, compared by
    /// timestamp and suffix rather than directory name.
    pub fn find(&self, snapshot: &SnapshotIdentity) -> Option<&SnapshotIdentity> {
        self.snapshots.iter().find(|s| s.same_snapshot(snapshot))
    }

    pub fn contains(&self, snapshot: &SnapshotIdentity) -> bool {
        self.find(snapshot).is_some()
    }

    pub fn keys(&self) -> HashSet<SnapshotKey> {
        self.snapshots.iter().map(SnapshotIdentity::key).collect()
    }
}

impl FromIterator<SnapshotIdentity> for SnapshotSet {
    fn from_iter<T: IntoIterator<Item = SnapshotIdentity>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a SnapshotSet {
    type Item = &'a SnapshotIdentity;
    type IntoIter = slice::Iter<'a, SnapshotIdentity>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.iter()
    }
}
