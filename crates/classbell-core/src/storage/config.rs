//! TOML-based application configuration.
//!
//! Stores the settings the timetable engine consumes:
//! - Active schedule document and global time offset
//! - Alternating-week switch and the week-one start date
//! - Prepare-bell lead time
//! - Temporary override state (weekday substitution, full-schedule backup)
//!
//! Configuration is stored at `~/.config/classbell/config.toml`.
//!
//! Values cross the string boundary (`read`/`write`) only here; the rest of
//! the crate sees typed fields.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::{data_dir, write_atomic};
use crate::error::ConfigError;

/// Schema version written to `other.version`.
pub const CONFIG_VERSION: &str = "1.1";

/// Largest accepted `general.time_offset`, one day either way.
pub const MAX_TIME_OFFSET_SECS: i64 = 86_400;

/// Sections and keys accepted by [`Config::read`] / [`Config::write`].
const SCHEMA: &[(&str, &[&str])] = &[
    ("general", &["schedule", "time_offset", "enable_alt_schedule"]),
    ("date", &["start_date", "countdown_date"]),
    ("toast", &["prepare_minutes"]),
    ("temp", &["set_week", "temp_schedule", "backup"]),
    ("other", &["version"]),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Name of the schedule document in use.
    #[serde(default = "default_schedule_name")]
    pub schedule: String,
    /// Seconds added to every period start, within
    /// [`MAX_TIME_OFFSET_SECS`] either way.
    #[serde(default)]
    pub time_offset: i64,
    /// Use `schedule_even` on even weeks.
    #[serde(default)]
    pub enable_alt_schedule: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateConfig {
    /// First day of week one, for odd/even week parity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Target of the "days until" widget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countdown_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToastConfig {
    /// Minutes before class for the prepare bell. A missing or unreadable
    /// value disables the prepare bell only.
    #[serde(
        default,
        deserialize_with = "lenient_minutes",
        skip_serializing_if = "Option::is_none"
    )]
    pub prepare_minutes: Option<u32>,
}

/// Temporary override state. Cleared on every start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TempConfig {
    /// Weekday (0 = Monday) shown instead of today.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_week: Option<u8>,
    /// Document currently under a full-schedule override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_schedule: Option<String>,
    /// Document holding the pre-override copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherConfig {
    #[serde(default = "default_version")]
    pub version: String,
}

/// Where a config came from and where `save` writes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built in memory; `save` is a no-op.
    #[default]
    Detached,
    File(PathBuf),
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/classbell/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub date: DateConfig,
    #[serde(default)]
    pub toast: ToastConfig,
    #[serde(default)]
    pub temp: TempConfig,
    #[serde(default)]
    pub other: OtherConfig,
    #[serde(skip)]
    source: ConfigSource,
    /// The file as last read or written, including keys this struct does
    /// not model.
    #[serde(skip)]
    document: toml::Table,
    /// Typed values matching `document`; `save` writes only what differs.
    #[serde(skip)]
    persisted: toml::Table,
}

fn default_schedule_name() -> String {
    "default".into()
}
fn default_version() -> String {
    CONFIG_VERSION.into()
}

fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let parsed = match &raw {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_u64().and_then(|m| u32::try_from(m).ok()),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    if parsed.is_none() {
        warn!(value = %raw, "ignoring invalid toast.prepare_minutes; prepare bell disabled");
    }
    Ok(parsed)
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            schedule: default_schedule_name(),
            time_offset: 0,
            enable_alt_schedule: false,
        }
    }
}

impl Default for OtherConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            date: DateConfig::default(),
            toast: ToastConfig::default(),
            temp: TempConfig::default(),
            other: OtherConfig::default(),
            source: ConfigSource::Detached,
            document: toml::Table::new(),
            persisted: toml::Table::new(),
        }
    }
}

/// Insert sections and keys from `defaults` that `existing` lacks.
///
/// Present values are never overwritten or removed, even when their type
/// differs from the default. Returns the number of inserted entries.
pub fn migrate_additive(existing: &mut toml::Table, defaults: &toml::Table) -> usize {
    let mut inserted = 0;
    for (section, default_value) in defaults {
        match (existing.get_mut(section), default_value) {
            (None, value) => {
                inserted += value.as_table().map_or(1, |t| t.len().max(1));
                existing.insert(section.clone(), value.clone());
            }
            (Some(toml::Value::Table(current)), toml::Value::Table(default_keys)) => {
                for (key, value) in default_keys {
                    if !current.contains_key(key) {
                        current.insert(key.clone(), value.clone());
                        inserted += 1;
                    }
                }
            }
            _ => {}
        }
    }
    inserted
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    /// Load from the data directory, creating a default file if none exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed,
    /// or if the default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, migrating older files in place.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let mut cfg = Self::default();
                cfg.source = ConfigSource::File(path.to_path_buf());
                cfg.save()?;
                info!(path = %path.display(), "created default configuration");
                return Ok(cfg);
            }
            Err(e) => {
                return Err(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };

        let mut table: toml::Table =
            toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;

        let version = table
            .get("other")
            .and_then(|o| o.get("version"))
            .and_then(toml::Value::as_str)
            .map(str::to_string);
        let migrated = version.as_deref() != Some(CONFIG_VERSION);
        if migrated {
            let defaults = default_table()?;
            let inserted = migrate_additive(&mut table, &defaults);
            if let Some(toml::Value::Table(other)) = table.get_mut("other") {
                other.insert("version".into(), toml::Value::String(CONFIG_VERSION.into()));
            }
            info!(from = ?version, to = CONFIG_VERSION, inserted, "migrated configuration");
        }

        let mut cfg: Config = toml::Value::Table(table.clone())
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseFailed(e.to_string()))?;
        cfg.persisted = typed_table(&cfg).map_err(ConfigError::ParseFailed)?;
        if !offset_in_range(cfg.general.time_offset) {
            warn!(
                time_offset = cfg.general.time_offset,
                "ignoring out-of-range general.time_offset"
            );
            cfg.general.time_offset = 0;
        }
        cfg.document = table;
        cfg.source = ConfigSource::File(path.to_path_buf());
        if migrated {
            write_document(path, &cfg.document)?;
        }
        Ok(cfg)
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            warn!("using default configuration: {e}");
            Self::default()
        })
    }

    /// Persist to the file this config was loaded from.
    ///
    /// Only typed values that changed since the last load or save are
    /// written; every other key in the file is left as it was.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&mut self) -> Result<(), ConfigError> {
        let ConfigSource::File(path) = &self.source else {
            return Ok(());
        };
        let current = typed_table(self).map_err(|message| ConfigError::SaveFailed {
            path: path.clone(),
            message,
        })?;
        let mut document = self.document.clone();
        merge_changes(&mut document, &self.persisted, &current);
        write_document(path, &document)?;
        self.document = document;
        self.persisted = current;
        Ok(())
    }

    /// Restore every value to its default and save to the same file.
    ///
    /// Keys outside the schema stay in the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be saved.
    pub fn reset(&mut self) -> Result<(), ConfigError> {
        let source = std::mem::take(&mut self.source);
        let mut document = std::mem::take(&mut self.document);
        for (section, keys) in SCHEMA {
            if let Some(toml::Value::Table(table)) = document.get_mut(*section) {
                for key in keys.iter() {
                    table.remove(*key);
                }
            }
        }
        *self = Self {
            source,
            document,
            ..Self::default()
        };
        self.save()
    }

    fn check_key(section: &str, key: &str) -> Result<(), ConfigError> {
        let known = SCHEMA
            .iter()
            .any(|(s, keys)| *s == section && keys.contains(&key));
        if known {
            Ok(())
        } else {
            Err(ConfigError::UnknownKey(format!("{section}.{key}")))
        }
    }

    /// Value as a string; empty when unset or unknown.
    pub fn read(&self, section: &str, key: &str) -> String {
        if Self::check_key(section, key).is_err() {
            return String::new();
        }
        let Ok(json) = serde_json::to_value(self) else {
            return String::new();
        };
        match json.get(section).and_then(|s| s.get(key)) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Parse `value` into the key's type, apply it, and save.
    ///
    /// An empty value clears optional keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn write(&mut self, section: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        Self::check_key(section, key)?;
        let full_key = format!("{section}.{key}");
        let invalid = |message: String| ConfigError::InvalidValue {
            key: full_key.clone(),
            message,
        };

        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        let section_obj = json
            .get_mut(section)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| ConfigError::UnknownKey(full_key.clone()))?;

        let new_value = match section_obj.get(key) {
            _ if value.trim().is_empty() => Value::Null,
            Some(Value::Bool(_)) => Value::Bool(
                value
                    .trim()
                    .parse::<bool>()
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            Some(Value::Number(_)) => value
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|e| invalid(e.to_string()))?,
            Some(Value::String(_)) => Value::String(value.to_string()),
            _ => infer_value(value),
        };
        let expect_set = !new_value.is_null();
        section_obj.insert(key.to_string(), new_value);

        let mut updated: Config =
            serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        // Lenient fields swallow bad input; reject it here instead.
        if expect_set && updated.read(section, key).is_empty() {
            return Err(invalid(format!("cannot use '{value}'")));
        }
        if !offset_in_range(updated.general.time_offset) {
            return Err(invalid(format!(
                "must be within {MAX_TIME_OFFSET_SECS} seconds either way"
            )));
        }
        updated.source = std::mem::take(&mut self.source);
        updated.document = std::mem::take(&mut self.document);
        updated.persisted = std::mem::take(&mut self.persisted);
        *self = updated;
        self.save()
    }

    /// `read` with a dotted `section.key`.
    pub fn get(&self, key: &str) -> Option<String> {
        let (section, key) = key.split_once('.')?;
        Self::check_key(section, key).ok()?;
        Some(self.read(section, key))
    }

    /// `write` with a dotted `section.key`.
    ///
    /// # Errors
    ///
    /// See [`Config::write`].
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let (section, name) = key
            .split_once('.')
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        self.write(section, name, value)
    }

    /// Every `section.key` in the schema.
    pub fn keys() -> impl Iterator<Item = String> {
        SCHEMA
            .iter()
            .flat_map(|(section, keys)| keys.iter().map(move |k| format!("{section}.{k}")))
    }
}

fn offset_in_range(offset: i64) -> bool {
    (-MAX_TIME_OFFSET_SECS..=MAX_TIME_OFFSET_SECS).contains(&offset)
}

/// Typed values as a TOML table.
fn typed_table(cfg: &Config) -> Result<toml::Table, String> {
    match toml::Value::try_from(cfg) {
        Ok(toml::Value::Table(table)) => Ok(table),
        Ok(_) => Err("config is not a table".into()),
        Err(e) => Err(e.to_string()),
    }
}

/// The default config as a TOML table, for migration.
fn default_table() -> Result<toml::Table, ConfigError> {
    typed_table(&Config::default()).map_err(ConfigError::ParseFailed)
}

/// Copy schema keys whose typed value moved from `before` to `after` into
/// `document`. Everything else in `document` is untouched.
fn merge_changes(document: &mut toml::Table, before: &toml::Table, after: &toml::Table) {
    for (section, keys) in SCHEMA {
        let lookup = |table: &toml::Table, key: &str| {
            table.get(*section).and_then(|s| s.get(key)).cloned()
        };
        for key in keys.iter().copied() {
            let value = lookup(after, key);
            if value == lookup(before, key) {
                continue;
            }
            match value {
                Some(value) => {
                    let entry = document
                        .entry(section.to_string())
                        .or_insert(toml::Value::Table(toml::Table::new()));
                    if !entry.is_table() {
                        *entry = toml::Value::Table(toml::Table::new());
                    }
                    if let toml::Value::Table(table) = entry {
                        table.insert(key.to_string(), value);
                    }
                }
                None => {
                    if let Some(toml::Value::Table(table)) = document.get_mut(*section) {
                        table.remove(key);
                    }
                }
            }
        }
    }
}

fn write_document(path: &Path, document: &toml::Table) -> Result<(), ConfigError> {
    let save_failed = |message: String| ConfigError::SaveFailed {
        path: path.to_path_buf(),
        message,
    };
    let content = toml::to_string_pretty(document).map_err(|e| save_failed(e.to_string()))?;
    write_atomic(path, content.as_bytes()).map_err(|e| save_failed(e.to_string()))
}

/// Typed guess for keys whose current value is unset.
fn infer_value(value: &str) -> Value {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Value::Null
    } else if let Ok(b) = trimmed.parse::<bool>() {
        Value::Bool(b)
    } else if let Ok(n) = trimmed.parse::<i64>() {
        Value::from(n)
    } else {
        Value::String(value.to_string())
    }
}
