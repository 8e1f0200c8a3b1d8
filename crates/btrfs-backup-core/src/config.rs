use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File as ConfigFile, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::planner::RetentionPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "backup_config.toml";

/// Environment overrides, e.g. `BTRFS_BACKUP_GLOBAL__DRY_RUN=true`.
pub const ENV_PREFIX: &str = "BTRFS_BACKUP";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub default_verbose: bool,
    pub dry_run: bool,
    pub backfill: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupPair {
    pub name: String,
    /// Directory holding the source snapshots.
    pub source: PathBuf,
    /// Directory the snapshots are received into.
    pub target: PathBuf,
    /// Subvolume new snapshots are taken of. Defaults to `source`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_volume: Option<PathBuf>,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    #[serde(default = "default_retention_count")]
    pub retention_count: usize,
    #[serde(default = "default_target_retention_days")]
    pub target_retention_days: u32,
    #[serde(default = "default_target_retention_count")]
    pub target_retention_count: usize,
}

fn default_retention_days() -> u32 {
    30
}

fn default_retention_count() -> usize {
    10
}

fn default_target_retention_days() -> u32 {
    90
}

fn default_target_retention_count() -> usize {
    20
}

impl BackupPair {
    pub fn subvolume(&self) -> &Path {
        self.original_volume.as_deref().unwrap_or(&self.source)
    }

    pub fn source_policy(&self) -> RetentionPolicy {
        RetentionPolicy::new(self.retention_days, self.retention_count)
    }

    pub fn target_policy(&self) -> RetentionPolicy {
        RetentionPolicy::new(self.target_retention_days, self.target_retention_count)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub backup_pairs: Vec<BackupPair>,
}

impl AppConfig {
    pub fn backup_pair(&self, name: &str) -> Option<&BackupPair> {
        self.backup_pairs.iter().find(|pair| pair.name == name)
    }

    /// The named pair, or every pair when no name is given.
    pub fn select_pairs(&self, name: Option<&str>) -> Result<Vec<&BackupPair>> {
        match name {
            Some(name) => self
                .backup_pair(name)
                .map(|pair| vec![pair])
                .ok_or_else(|| Error::PairNotFound(name.to_string())),
            None => Ok(self.backup_pairs.iter().collect()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for pair in &self.backup_pairs {
            if pair.name.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "backup pair with an empty name".to_string(),
                ));
            }
            if !seen.insert(pair.name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "backup pair '{}' is defined more than once",
                    pair.name
                )));
            }
            if pair.source == pair.target {
                return Err(Error::InvalidConfig(format!(
                    "backup pair '{}' uses {} as both source and target",
                    pair.name,
                    pair.source.display()
                )));
            }
        }
        Ok(())
    }
}

/// Load and validate the TOML configuration at `path`, layered with
/// `BTRFS_BACKUP_*` environment overrides.
pub fn load_configuration(path: &Path) -> Result<AppConfig> {
    let settings = Config::builder()
        .add_source(ConfigFile::from(path).format(FileFormat::Toml).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config = settings.try_deserialize::<AppConfig>()?;
    config.validate()?;
    Ok(config)
}
