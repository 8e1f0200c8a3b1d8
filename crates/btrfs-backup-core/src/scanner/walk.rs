use std::io;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Entry names of one location. Names that are not valid UTF-8 cannot be
/// addressed through a `String` path, so they are kept apart, lossily
/// rendered for display only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub names: Vec<String>,
    pub non_utf8: Vec<String>,
}

/// Supplies the entry names of a snapshot location.
pub trait DirectoryLister {
    fn list(&self, path: &Path) -> Result<Vec<String>>;

    fn list_entries(&self, path: &Path) -> Result<Listing> {
        Ok(Listing {
            names: self.list(path)?,
            non_utf8: Vec::new(),
        })
    }
}

/// Lists real directories. Only subdirectories are reported since every
/// snapshot is a subvolume; plain files are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister;

impl DirectoryLister for FsLister {
    fn list(&self, path: &Path) -> Result<Vec<String>> {
        Ok(self.list_entries(path)?.names)
    }

    fn list_entries(&self, path: &Path) -> Result<Listing> {
        let unreadable = |source: io::Error| Error::UnreadableLocation {
            path: path.to_path_buf(),
            source,
        };

        let metadata = path.metadata().map_err(unreadable)?;
        if !metadata.is_dir() {
            return Err(unreadable(io::Error::new(
                io::ErrorKind::Other,
                "not a directory",
            )));
        }

        let mut listing = Listing::default();
        for entry in WalkDir::new(path).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|err| unreadable(err.into()))?;
            if !entry.file_type().is_dir() {
                debug!("Ignoring non-directory entry {}", entry.path().display());
                continue;
            }
            match entry.file_name().to_str() {
                Some(name) => listing.names.push(name.to_string()),
                None => {
                    warn!("Entry name is not valid UTF-8: {}", entry.path().display());
                    listing
                        .non_utf8
                        .push(entry.file_name().to_string_lossy().into_owned());
                }
            }
        }
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_lists_only_directories() {
        let tmp = tempdir().unwrap();
        fs::create_dir(tmp.path().join("2025-01-01T00:00:00")).unwrap();
        fs::create_dir(tmp.path().join("scratch")).unwrap();
        fs::write(tmp.path().join("2025-01-02T00:00:00"), "not a subvolume").unwrap();

        let mut names = FsLister.list(tmp.path()).unwrap();
        names.sort();
        assert_eq!(names, vec!["2025-01-01T00:00:00", "scratch"]);
    }

    #[test]
    fn test_empty_directory() {
        let tmp = tempdir().unwrap();
        assert!(FsLister.list(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory() {
        let tmp = tempdir().unwrap();
        let err = FsLister.list(&tmp.path().join("absent")).unwrap_err();
        assert!(err.is_unreadable_location());
    }

    #[test]
    fn test_file_is_not_a_location() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("plain");
        fs::write(&file, "x").unwrap();
        assert!(FsLister.list(&file).unwrap_err().is_unreadable_location());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_is_kept_apart() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = tempdir().unwrap();
        fs::create_dir(tmp.path().join("2025-01-01T00:00:00")).unwrap();
        let raw = OsStr::from_bytes(b"2025-01-02T00:00:00-caf\xe9");
        if fs::create_dir(tmp.path().join(raw)).is_err() {
            // Some filesystems refuse non-UTF-8 names outright.
            return;
        }

        let listing = FsLister.list_entries(tmp.path()).unwrap();
        assert_eq!(listing.names, vec!["2025-01-01T00:00:00"]);
        assert_eq!(listing.non_utf8, vec!["2025-01-02T00:00:00-caf\u{fffd}"]);
        assert_eq!(FsLister.list(tmp.path()).unwrap(), listing.names);
    }
}
