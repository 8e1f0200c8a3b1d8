//! Read-only discovery of snapshots in a directory.

pub mod walk;

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::snapshot::{NotASnapshot, SnapshotSet};

pub use walk::{DirectoryLister, FsLister, Listing};

/// Result of scanning one snapshot location.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub location: PathBuf,
    pub snapshots: SnapshotSet,
    /// Subdirectories whose names are not snapshot names.
    pub rejected: Vec<NotASnapshot>,
}

/// List `location` and parse every entry into a [`SnapshotSet`].
///
/// An empty directory is a valid, empty set. A missing or unreadable one is
/// an error: the caller cannot tell what has already been transferred.
pub fn scan<L>(lister: &L, location: &Path) -> Result<ScanOutcome>
where
    L: DirectoryLister + ?Sized,
{
    let listing = lister.list_entries(location)?;
    let (snapshots, mut rejected) = SnapshotSet::from_names(&listing.names);
    rejected.extend(listing.non_utf8.into_iter().map(NotASnapshot));

    for entry in &rejected {
        warn!("Skipping {} in {}: {}", entry.0, location.display(), entry);
    }
    debug!(
        "Scanned {}: {} snapshots, {} other entries",
        location.display(),
        snapshots.len(),
        rejected.len()
    );

    Ok(ScanOutcome {
        location: location.to_path_buf(),
        snapshots,
        rejected,
    })
}
