use std::path::PathBuf;

use btrfs_backup_core::config::DEFAULT_CONFIG_FILE;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "btrfs-backup")]
#[command(about = "Snapshot, send and prune btrfs subvolumes", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Show what would run without touching any subvolume
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Which backup pairs a command applies to.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct PairSelection {
    /// Name of a configured backup pair
    #[arg(long)]
    pub pair: Option<String>,

    /// Every configured backup pair, in configuration order
    #[arg(long)]
    pub all: bool,
}

impl PairSelection {
    pub fn name(&self) -> Option<&str> {
        self.pair.as_deref()
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Take a new read-only snapshot of the subvolume
    Snapshot {
        #[command(flatten)]
        pairs: PairSelection,

        /// Appended to the snapshot name after the timestamp
        #[arg(long)]
        suffix: Option<String>,
    },
    /// Send snapshots missing on the target
    Backup {
        #[command(flatten)]
        pairs: PairSelection,
    },
    /// Delete snapshots past retention on source and target
    Purge {
        #[command(flatten)]
        pairs: PairSelection,
    },
    /// Backup, then purge
    Sync {
        #[command(flatten)]
        pairs: PairSelection,
    },
    /// Show snapshots on both sides
    List {
        #[command(flatten)]
        pairs: PairSelection,
    },
    /// Print configuration values
    PrintConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_pair_or_all_required() {
        assert!(Cli::try_parse_from(["btrfs-backup", "backup"]).is_err());
        assert!(Cli::try_parse_from(["btrfs-backup", "backup", "--pair", "a", "--all"]).is_err());

        let cli = Cli::try_parse_from(["btrfs-backup", "backup", "--all"]).unwrap();
        match cli.command {
            Some(Commands::Backup { pairs }) => assert_eq!(pairs.name(), None),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "btrfs-backup",
            "snapshot",
            "--pair",
            "root",
            "--suffix",
            "pre-upgrade",
            "--dry-run",
            "-c",
            "/etc/btrfs-backup.toml",
        ])
        .unwrap();

        assert!(cli.dry_run);
        assert_eq!(cli.config, PathBuf::from("/etc/btrfs-backup.toml"));
        match cli.command {
            Some(Commands::Snapshot { pairs, suffix }) => {
                assert_eq!(pairs.name(), Some("root"));
                assert_eq!(suffix.as_deref(), Some("pre-upgrade"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
