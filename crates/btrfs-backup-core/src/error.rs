use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A snapshot directory could not be listed. Planning stops here since
    /// an unknown state could duplicate or skip transfers.
    #[error("Cannot read snapshot location {}: {source}", path.display())]
    UnreadableLocation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Backup pair '{0}' not found in configuration")]
    PairNotFound(String),

    #[error("Invalid snapshot suffix '{0}'")]
    InvalidSuffix(String),

    #[error("Snapshot '{0}' already exists")]
    SnapshotExists(String),

    #[error("Failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command '{command}' failed: {status}")]
    CommandFailed { command: String, status: String },

    /// First failing step of a plan; `step` counts from 1. Nothing after it
    /// was attempted.
    #[error("Step {step} ({action}) failed: {source}")]
    ActionFailed {
        step: usize,
        action: String,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn is_unreadable_location(&self) -> bool {
        matches!(self, Self::UnreadableLocation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_location_display() {
        let err = Error::UnreadableLocation {
            path: PathBuf::from("/mnt/backup"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.to_string(), "Cannot read snapshot location /mnt/backup: gone");
        assert!(err.is_unreadable_location());
    }

    #[test]
    fn test_action_failed_keeps_cause() {
        let err = Error::ActionFailed {
            step: 2,
            action: "delete /src/a".to_string(),
            source: Box::new(Error::CommandFailed {
                command: "btrfs subvolume delete /src/a".to_string(),
                status: "exit status: 1".to_string(),
            }),
        };
        assert!(err.to_string().starts_with("Step 2 (delete /src/a) failed"));
        assert!(!err.is_unreadable_location());
    }
}
