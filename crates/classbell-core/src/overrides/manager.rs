//! Temporary weekday substitution and full-schedule override.
//!
//! All override state lives in the `[temp]` config section so it survives a
//! crash; [`OverrideManager::restore_on_startup`] undoes it on the next start.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::week::{week_parity, WeekParity};
use crate::error::{CoreError, Result, ValidationError};
use crate::schedule::ScheduleDocument;
use crate::storage::{Config, ScheduleStore, BACKUP_NAME};

/// Snapshot of the override state held in config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporaryOverride {
    /// A full-schedule override is in effect.
    pub active: bool,
    pub substituted_weekday: Option<u8>,
    /// Document holding the pre-override copy.
    pub backup: Option<String>,
}

/// What the startup restore did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupRestore {
    /// Weekday substitution that was cleared.
    pub cleared_weekday: Option<u8>,
    /// Document restored from backup.
    pub restored: Option<String>,
}

/// Applies and reverts temporary overrides.
///
/// Stateless: everything it needs is passed in, so it can run between any
/// two ticks.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverrideManager;

impl OverrideManager {
    pub fn state(config: &Config) -> TemporaryOverride {
        TemporaryOverride {
            active: config.temp.temp_schedule.is_some(),
            substituted_weekday: config.temp.set_week,
            backup: config.temp.backup.clone(),
        }
    }

    /// Weekday to display: the substitution if one is set, else today's.
    pub fn effective_weekday(today: NaiveDate, config: &Config) -> u8 {
        let actual = today.weekday().num_days_from_monday() as u8;
        match config.temp.set_week {
            Some(day) if day <= 6 => day,
            Some(day) => {
                warn!(set_week = day, "ignoring out-of-range weekday substitution");
                actual
            }
            None => actual,
        }
    }

    pub fn parity(today: NaiveDate, config: &Config) -> WeekParity {
        week_parity(today, config.date.start_date)
    }

    /// Lesson list for `weekday`, honouring the alternating-week switch.
    pub fn lessons_for<'a>(
        doc: &'a ScheduleDocument,
        weekday: u8,
        today: NaiveDate,
        config: &Config,
    ) -> &'a [String] {
        let even = config.general.enable_alt_schedule && Self::parity(today, config).is_even();
        doc.lessons_for(weekday, even)
    }

    /// Show `weekday`'s lessons in place of today's until the next start.
    /// `None` clears the substitution.
    pub fn set_weekday_substitution(config: &mut Config, weekday: Option<u8>) -> Result<()> {
        if let Some(day) = weekday {
            if day > 6 {
                return Err(ValidationError::InvalidWeekday(i64::from(day)).into());
            }
        }
        config.temp.set_week = weekday;
        config.save()?;
        info!(weekday = ?weekday, "weekday substitution updated");
        Ok(())
    }

    /// Start a full-schedule override of document `name`.
    ///
    /// The live document is backed up only if no override is active, so
    /// repeated calls never overwrite the original copy.
    pub fn begin_full_override<S: ScheduleStore + ?Sized>(
        store: &mut S,
        config: &mut Config,
        name: &str,
    ) -> Result<()> {
        if let Some(active) = &config.temp.temp_schedule {
            if active != name {
                return Err(CoreError::Custom(format!(
                    "override already active for '{active}'"
                )));
            }
            return Ok(());
        }
        store.copy(name, BACKUP_NAME)?;
        config.temp.temp_schedule = Some(name.to_string());
        config.temp.backup = Some(BACKUP_NAME.to_string());
        config.save()?;
        info!(name, backup = BACKUP_NAME, "backed up schedule before override");
        Ok(())
    }

    /// Write `doc` over the live document `name`, backing it up first if
    /// this is the first write of the override.
    pub fn write_override<S: ScheduleStore + ?Sized>(
        store: &mut S,
        config: &mut Config,
        name: &str,
        doc: &ScheduleDocument,
    ) -> Result<()> {
        Self::begin_full_override(store, config, name)?;
        store.save(name, doc)?;
        Ok(())
    }

    /// Copy the backup over the live document and clear the override flag.
    ///
    /// Returns `false` when no override was active. On failure the flag is
    /// left set so the next start retries.
    pub fn revert<S: ScheduleStore + ?Sized>(store: &mut S, config: &mut Config) -> Result<bool> {
        let Some(name) = config.temp.temp_schedule.clone() else {
            return Ok(false);
        };
        let backup = config
            .temp
            .backup
            .clone()
            .unwrap_or_else(|| BACKUP_NAME.to_string());
        store.copy(&backup, &name)?;
        config.temp.temp_schedule = None;
        config.temp.backup = None;
        config.save()?;
        info!(name = %name, backup = %backup, "restored schedule from backup");
        Ok(true)
    }

    /// One-shot cleanup run before the first tick: drop any weekday
    /// substitution and revert an interrupted full override.
    pub fn restore_on_startup<S: ScheduleStore + ?Sized>(
        store: &mut S,
        config: &mut Config,
    ) -> Result<StartupRestore> {
        let mut outcome = StartupRestore {
            cleared_weekday: config.temp.set_week.take(),
            restored: None,
        };
        if outcome.cleared_weekday.is_some() {
            config.save()?;
        }
        let name = config.temp.temp_schedule.clone();
        if Self::revert(store, config)? {
            outcome.restored = name;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryScheduleStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn substitution_changes_effective_weekday() {
        let mut cfg = Config::default();
        // 2025-09-03 is a Wednesday.
        assert_eq!(OverrideManager::effective_weekday(date(2025, 9, 3), &cfg), 2);
        OverrideManager::set_weekday_substitution(&mut cfg, Some(4)).unwrap();
        assert_eq!(OverrideManager::effective_weekday(date(2025, 9, 3), &cfg), 4);
        assert!(OverrideManager::set_weekday_substitution(&mut cfg, Some(7)).is_err());
        assert_eq!(cfg.temp.set_week, Some(4));
    }

    #[test]
    fn even_week_uses_alternate_list_only_when_enabled() {
        let doc: ScheduleDocument = serde_json::from_value(serde_json::json!({
            "schedule": {"0": ["Math"]},
            "schedule_even": {"0": ["Art"]}
        }))
        .unwrap();
        let mut cfg = Config::default();
        cfg.date.start_date = Some(date(2025, 9, 1));
        let even_monday = date(2025, 9, 8);

        assert_eq!(OverrideManager::lessons_for(&doc, 0, even_monday, &cfg), ["Math"]);
        cfg.general.enable_alt_schedule = true;
        assert_eq!(OverrideManager::lessons_for(&doc, 0, even_monday, &cfg), ["Art"]);
        assert_eq!(OverrideManager::lessons_for(&doc, 0, date(2025, 9, 1), &cfg), ["Math"]);
    }

    #[test]
    fn backup_taken_once_per_session() {
        let original = ScheduleDocument::sample();
        let mut store = MemoryScheduleStore::with_document("default", &original).unwrap();
        let mut cfg = Config::default();

        let mut first = original.clone();
        first.schedule.insert("0".into(), vec!["Swap".into()]);
        OverrideManager::write_override(&mut store, &mut cfg, "default", &first).unwrap();

        let mut second = first.clone();
        second.schedule.insert("1".into(), vec!["Again".into()]);
        OverrideManager::write_override(&mut store, &mut cfg, "default", &second).unwrap();

        assert!(OverrideManager::state(&cfg).active);
        assert_eq!(store.load(BACKUP_NAME).unwrap(), original);
        assert_eq!(store.load("default").unwrap(), second);
    }

    #[test]
    fn override_of_another_document_is_rejected_while_active() {
        let doc = ScheduleDocument::sample();
        let mut store = MemoryScheduleStore::with_document("a", &doc).unwrap();
        store.save("b", &doc).unwrap();
        let mut cfg = Config::default();
        OverrideManager::begin_full_override(&mut store, &mut cfg, "a").unwrap();
        assert!(OverrideManager::begin_full_override(&mut store, &mut cfg, "b").is_err());
    }

    #[test]
    fn startup_restores_and_clears() {
        let original = ScheduleDocument::sample();
        let mut store = MemoryScheduleStore::with_document("default", &original).unwrap();
        let before = store.raw("default").map(<[u8]>::to_vec);
        let mut cfg = Config::default();
        cfg.temp.set_week = Some(3);

        OverrideManager::write_override(&mut store, &mut cfg, "default", &ScheduleDocument::default())
            .unwrap();
        let outcome = OverrideManager::restore_on_startup(&mut store, &mut cfg).unwrap();

        assert_eq!(outcome.cleared_weekday, Some(3));
        assert_eq!(outcome.restored.as_deref(), Some("default"));
        assert_eq!(store.raw("default").map(<[u8]>::to_vec), before);
        assert_eq!(OverrideManager::state(&cfg), TemporaryOverride::default());
    }

    #[test]
    fn revert_without_override_is_noop() {
        let mut store = MemoryScheduleStore::new();
        let mut cfg = Config::default();
        assert!(!OverrideManager::revert(&mut store, &mut cfg).unwrap());
    }

    #[test]
    fn failed_restore_keeps_flag() {
        let mut store = MemoryScheduleStore::new();
        let mut cfg = Config::default();
        cfg.temp.temp_schedule = Some("default".into());
        cfg.temp.backup = Some(BACKUP_NAME.into());
        assert!(OverrideManager::restore_on_startup(&mut store, &mut cfg).is_err());
        assert!(OverrideManager::state(&cfg).active);
    }
}
