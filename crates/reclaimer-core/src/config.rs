//! Config - 起動時に一度だけ読む静的設定
//!
//! ```toml
//! sweep_interval = "60s"
//! disk_pressure_threshold = 0.9
//! backup_prefix = "backup-"
//! executor = "native"
//! state_file = "/var/lib/reclaimer/pending.json"
//!
//! [[backup_types]]
//! descriptor = "gold"
//! timestamp_format = "%y%m%d-%H%M"
//!
//! [retention]
//! gold = "48h"
//! ```
//!
//! 省略したキーは既定値。`retention` に無い種別は保護なし。

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{BackupType, BackupTypeRegistry, ReclaimError, RetentionTable};

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(60_000);
pub const DEFAULT_DISK_PRESSURE_THRESHOLD: f64 = 0.9;
pub const DEFAULT_BACKUP_PREFIX: &str = "backup-";
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%y%m%d-%H%M";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Registry(#[from] ReclaimError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorKind {
    #[default]
    Native,
    Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackupTypeConfig {
    pub descriptor: String,
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

fn default_timestamp_format() -> String {
    DEFAULT_TIMESTAMP_FORMAT.to_string()
}

impl BackupTypeConfig {
    pub fn new(descriptor: &str, timestamp_format: &str) -> Self {
        Self {
            descriptor: descriptor.to_string(),
            timestamp_format: timestamp_format.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReclaimerConfig {
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
    /// Backups are deleted regardless of age once the free fraction of their
    /// volume drops below `1 - disk_pressure_threshold`.
    pub disk_pressure_threshold: f64,
    pub backup_prefix: String,
    pub executor: ExecutorKind,
    pub state_file: Option<PathBuf>,
    pub backup_types: Vec<BackupTypeConfig>,
    pub retention: BTreeMap<String, humantime_serde::Serde<Duration>>,
}

impl Default for ReclaimerConfig {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            disk_pressure_threshold: DEFAULT_DISK_PRESSURE_THRESHOLD,
            backup_prefix: DEFAULT_BACKUP_PREFIX.to_string(),
            executor: ExecutorKind::default(),
            state_file: None,
            backup_types: vec![
                BackupTypeConfig::new("gold", "%y%m%d-%H%M"),
                BackupTypeConfig::new("hourly", "%y%m%d-%H%M"),
                BackupTypeConfig::new("daily", "%y%m%d"),
                BackupTypeConfig::new("weekly", "%y%m%d"),
                BackupTypeConfig::new("monthly", "%y%m%d"),
            ],
            retention: BTreeMap::from([(
                "gold".to_string(),
                Duration::from_secs(48 * 3600).into(),
            )]),
        }
    }
}

impl ReclaimerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::Invalid("sweep_interval must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.disk_pressure_threshold) {
            return Err(ConfigError::Invalid(format!(
                "disk_pressure_threshold must be within [0, 1], got {}",
                self.disk_pressure_threshold
            )));
        }
        if self.backup_prefix.is_empty() {
            return Err(ConfigError::Invalid("backup_prefix must not be empty".into()));
        }
        if let Some(bad) = self
            .backup_types
            .iter()
            .find(|t| t.descriptor.is_empty() || t.timestamp_format.is_empty())
        {
            return Err(ConfigError::Invalid(format!(
                "backup type `{}` needs a descriptor and a timestamp_format",
                bad.descriptor
            )));
        }
        Ok(())
    }

    pub fn retention_table(&self) -> RetentionTable {
        self.retention
            .iter()
            .map(|(descriptor, duration)| (descriptor.clone(), duration.into_inner()))
            .collect()
    }

    /// Freeze the type list and retention table into the immutable registry.
    pub fn registry(&self) -> Result<BackupTypeRegistry, ConfigError> {
        let types = self
            .backup_types
            .iter()
            .map(|t| BackupType::new(&self.backup_prefix, &t.descriptor, &t.timestamp_format))
            .collect();
        Ok(BackupTypeRegistry::new(
            self.backup_prefix.clone(),
            types,
            &self.retention_table(),
        )?)
    }
}
