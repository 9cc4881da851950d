//! BackupType - バックアップ種別と保護期間
//!
//! # 命名規約
//! - `{backup_prefix}{descriptor}-{timestamp}`
//! - 例: `backup-gold-230101-0000`
//!
//! # 設計
//! - 起動時に config から `BackupTypeRegistry` を一度だけ構築
//! - 以後は immutable（`Arc` で各コンポーネントに渡す）
//! - 保護期間は `RetentionTable` で別管理し、registry 構築時に結合する

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use super::errors::ReclaimError;

/// A named classification of rotated snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupType {
    descriptor: String,
    name_prefix: String,
    timestamp_format: String,
    protection: Option<Duration>,
}

impl BackupType {
    /// Create an unprotected type. `backup_prefix` is the shared naming
    /// convention (e.g. `backup-`), `timestamp_format` a chrono format string.
    pub fn new(backup_prefix: &str, descriptor: &str, timestamp_format: &str) -> Self {
        Self {
            descriptor: descriptor.to_string(),
            name_prefix: format!("{backup_prefix}{descriptor}-"),
            timestamp_format: timestamp_format.to_string(),
            protection: None,
        }
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn protection(&self) -> Option<Duration> {
        self.protection
    }

    pub fn is_protected(&self) -> bool {
        self.protection.is_some()
    }

    /// Whether `name` follows this type's naming rule.
    ///
    /// Only the `{prefix}{descriptor}-` shape is checked; the timestamp part is
    /// validated by [`BackupType::timestamp`].
    pub fn is_valid_name(&self, name: &str) -> bool {
        name.strip_prefix(&self.name_prefix)
            .is_some_and(|rest| !rest.is_empty())
    }

    /// Extract the creation instant encoded in `name`, interpreted as UTC.
    ///
    /// Formats without a time component (e.g. `%y%m%d`) resolve to midnight.
    pub fn timestamp(&self, name: &str) -> Result<DateTime<Utc>, ReclaimError> {
        let encoded = name
            .strip_prefix(&self.name_prefix)
            .ok_or_else(|| ReclaimError::InvalidBackupName {
                name: name.to_string(),
                backup_type: self.descriptor.clone(),
            })?;

        let parsed = NaiveDateTime::parse_from_str(encoded, &self.timestamp_format).or_else(|_| {
            NaiveDate::parse_from_str(encoded, &self.timestamp_format)
                .map(|date| date.and_time(NaiveTime::MIN))
        });

        parsed
            .map(|naive| naive.and_utc())
            .map_err(|source| ReclaimError::Timestamp {
                name: name.to_string(),
                source,
            })
    }

    /// Name a backup of this type created at `at`.
    pub fn name_for(&self, at: DateTime<Utc>) -> String {
        format!("{}{}", self.name_prefix, at.format(&self.timestamp_format))
    }
}

/// descriptor → protection duration.
///
/// Types absent from the table are unprotected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionTable {
    entries: BTreeMap<String, Duration>,
}

impl RetentionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn protect(mut self, descriptor: impl Into<String>, duration: Duration) -> Self {
        self.entries.insert(descriptor.into(), duration);
        self
    }

    pub fn protection_for(&self, descriptor: &str) -> Option<Duration> {
        self.entries.get(descriptor).copied()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl FromIterator<(String, Duration)> for RetentionTable {
    fn from_iter<I: IntoIterator<Item = (String, Duration)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Immutable lookup of backup types, kept in registration order.
///
/// Registration order matters: a backup name claimed by more than one
/// protected type goes to the first one registered.
#[derive(Debug, Clone)]
pub struct BackupTypeRegistry {
    backup_prefix: String,
    types: Vec<BackupType>,
}

impl BackupTypeRegistry {
    /// Build the registry, attaching protection durations from `retention`.
    ///
    /// Fails on duplicate descriptors and on retention entries that name no
    /// registered type.
    pub fn new(
        backup_prefix: impl Into<String>,
        types: Vec<BackupType>,
        retention: &RetentionTable,
    ) -> Result<Self, ReclaimError> {
        let mut registered: Vec<BackupType> = Vec::with_capacity(types.len());
        for mut backup_type in types {
            if registered.iter().any(|t| t.descriptor == backup_type.descriptor) {
                return Err(ReclaimError::DuplicateBackupType(backup_type.descriptor));
            }
            backup_type.protection = retention.protection_for(&backup_type.descriptor);
            registered.push(backup_type);
        }

        if let Some(unknown) = retention
            .descriptors()
            .find(|d| !registered.iter().any(|t| t.descriptor == *d))
        {
            return Err(ReclaimError::UnknownRetention(unknown.to_string()));
        }

        Ok(Self {
            backup_prefix: backup_prefix.into(),
            types: registered,
        })
    }

    /// Whether `name` follows the shared backup naming convention at all.
    pub fn has_backup_prefix(&self, name: &str) -> bool {
        name.starts_with(&self.backup_prefix)
    }

    pub fn get(&self, descriptor: &str) -> Option<&BackupType> {
        self.types.iter().find(|t| t.descriptor == descriptor)
    }

    pub fn protected(&self) -> impl Iterator<Item = &BackupType> {
        self.types.iter().filter(|t| t.is_protected())
    }

    /// First protected type whose naming rule accepts `name` and whose
    /// timestamp format parses it. Anything else is not worth keeping.
    pub fn claim_protected(&self, name: &str) -> Option<&BackupType> {
        self.protected()
            .find(|t| t.is_valid_name(name) && t.timestamp(name).is_ok())
    }
}
