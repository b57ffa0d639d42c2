//! The per-second tick pipeline.
//!
//! ```text
//! config reload -> effective weekday -> document -> resolve
//!   -> activity + countdown -> notifications -> snapshot
//! ```
//!
//! Every tick recomputes from scratch. The only state carried between ticks
//! is the notification edge and the last document that loaded cleanly.

use chrono::{NaiveDateTime, SubsecRound, Timelike};
use tracing::{debug, warn};

use crate::activity::{ActivityEngine, ActivityState};
use crate::clock::Clock;
use crate::context::{ContextSnapshot, Extensions};
use crate::error::Result;
use crate::events::Event;
use crate::notification::{Notification, NotificationScheduler, NotificationSink};
use crate::overrides::{days_until, OverrideManager, StartupRestore};
use crate::schedule::ScheduleDocument;
use crate::storage::{Config, ConfigSource, ScheduleStore};
use crate::timeline::{ResolvedDay, TimelineResolver};

/// Result of one tick.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub now: NaiveDateTime,
    pub day: ResolvedDay,
    pub state: ActivityState,
    pub notifications: Vec<Notification>,
    pub snapshot: ContextSnapshot,
}

impl TickOutcome {
    /// Notifications followed by the state snapshot.
    pub fn events(&self) -> Vec<Event> {
        self.notifications
            .iter()
            .map(Event::from)
            .chain(std::iter::once(Event::StateSnapshot {
                snapshot: self.snapshot.clone(),
            }))
            .collect()
    }
}

/// School bell engine: owns config, documents, and the clock.
pub struct ClassBell<S, C> {
    config: Config,
    store: S,
    clock: C,
    activity: ActivityEngine,
    notifications: NotificationScheduler,
    last_good: Option<ScheduleDocument>,
    extensions: Extensions,
    started: bool,
}

impl<S: ScheduleStore, C: Clock> ClassBell<S, C> {
    pub fn new(config: Config, store: S, clock: C) -> Self {
        let notifications = NotificationScheduler::new(config.toast.prepare_minutes);
        Self {
            config,
            store,
            clock,
            activity: ActivityEngine::default(),
            notifications,
            last_good: None,
            extensions: Extensions::default(),
            started: false,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Revert leftover overrides. Runs once; `tick` calls it if the caller
    /// did not.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup cannot be copied back or the config
    /// cannot be saved. The override flag then stays set.
    pub fn startup(&mut self) -> Result<StartupRestore> {
        self.started = true;
        OverrideManager::restore_on_startup(&mut self.store, &mut self.config)
    }

    /// Treat startup as done without touching overrides. For one-shot
    /// readers running alongside a live bell.
    pub fn skip_startup(&mut self) {
        self.started = true;
    }

    /// `startup` as events.
    pub fn startup_events(&mut self) -> Result<Vec<Event>> {
        let restore = self.startup()?;
        let at = self.clock.now().trunc_subsecs(0);
        Ok(restore
            .restored
            .into_iter()
            .map(|name| Event::OverrideRestored { name, at })
            .collect())
    }

    fn reload_config(&mut self) {
        let ConfigSource::File(path) = self.config.source().clone() else {
            return;
        };
        match Config::load_from(&path) {
            Ok(cfg) => self.config = cfg,
            Err(e) => warn!("keeping previous configuration: {e}"),
        }
    }

    fn document(&mut self) -> ScheduleDocument {
        let name = &self.config.general.schedule;
        match self.store.load(name) {
            Ok(doc) => {
                self.last_good = Some(doc.clone());
                doc
            }
            Err(e) => {
                warn!("using last good schedule: {e}");
                self.last_good.clone().unwrap_or_default()
            }
        }
    }

    /// Evaluate the current second. With `notify` false the bell stays
    /// silent and no notification edge is consumed.
    pub fn tick(&mut self, notify: bool) -> TickOutcome {
        if !self.started {
            if let Err(e) = self.startup() {
                warn!("startup restore failed: {e}");
            }
        }
        self.reload_config();

        // Whole seconds, so a boundary reads `40:00` rather than `39:59`.
        let now = self.clock.now().trunc_subsecs(0);
        let today = now.date();
        let weekday = OverrideManager::effective_weekday(today, &self.config);
        let parity = OverrideManager::parity(today, &self.config);
        let doc = self.document();

        let day = TimelineResolver::new(self.config.general.time_offset).resolve(&doc, today, weekday);
        let lessons = OverrideManager::lessons_for(&doc, weekday, today, &self.config);
        let state = self.activity.evaluate(&day, &doc, lessons, now);

        self.notifications
            .set_prepare_minutes(self.config.toast.prepare_minutes);
        let notifications = self.notifications.evaluate(&day, lessons, now, notify);

        let countdown_days = self.config.date.countdown_date.map(|d| days_until(now, d));
        let snapshot = ContextSnapshot::build(
            now,
            &state,
            &self.activity.countdown,
            weekday,
            parity,
            countdown_days,
            &self.extensions,
        );
        debug!(kind = ?state.kind, label = %state.label, text = %state.countdown.text, "tick");

        TickOutcome {
            now,
            day,
            state,
            notifications,
            snapshot,
        }
    }

    /// Tick with notifications on and hand them to `sink`.
    pub fn tick_into<K: NotificationSink + ?Sized>(&mut self, sink: &mut K) -> TickOutcome {
        let outcome = self.tick(true);
        for n in &outcome.notifications {
            sink.notify(n.kind, &n.subject);
        }
        outcome
    }
}

/// Time until the next whole second, so re-arming never drifts.
pub fn next_tick_delay(now: NaiveDateTime) -> std::time::Duration {
    let nanos = u64::from(now.nanosecond().min(999_999_999));
    std::time::Duration::from_nanos(1_000_000_000 - nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::notification::{NotificationKind, RecordingSink};
    use crate::storage::{MemoryScheduleStore, BACKUP_NAME};
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        // 2025-09-01 is a Monday.
        NaiveDate::from_ymd_opt(2025, 9, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn bell(start: NaiveDateTime) -> ClassBell<MemoryScheduleStore, ManualClock> {
        let store = MemoryScheduleStore::with_document("default", &ScheduleDocument::sample()).unwrap();
        ClassBell::new(Config::default(), store, ManualClock::new(start))
    }

    #[test]
    fn tick_reports_first_lesson() {
        let mut bell = bell(at(8, 10, 0));
        let out = bell.tick(false);
        assert_eq!(out.snapshot.lesson_name, "Math");
        assert_eq!(out.snapshot.state, 1);
        assert_eq!(out.snapshot.part_id.as_deref(), Some("0"));
        assert!(out.notifications.is_empty());
    }

    #[test]
    fn bell_rings_once_into_sink() {
        let mut bell = bell(at(7, 59, 58));
        let mut sink = RecordingSink::default();
        for _ in 0..4 {
            bell.tick_into(&mut sink);
            bell.tick_into(&mut sink);
            bell.clock().advance_secs(1);
        }
        assert_eq!(
            sink.received,
            vec![(NotificationKind::ClassStart, "Math".to_string())]
        );
    }

    #[test]
    fn missing_document_reuses_last_good() {
        let mut bell = bell(at(8, 10, 0));
        assert_eq!(bell.tick(false).snapshot.lesson_name, "Math");
        bell.config_mut().general.schedule = "gone".into();
        assert_eq!(bell.tick(false).snapshot.lesson_name, "Math");
    }

    #[test]
    fn no_document_at_all_is_no_schedule() {
        let store = MemoryScheduleStore::new();
        let mut bell = ClassBell::new(Config::default(), store, ManualClock::new(at(9, 0, 0)));
        let out = bell.tick(true);
        assert_eq!(out.snapshot.lesson_name, "No schedule");
        assert_eq!(out.snapshot.countdown_text, "00:00");
        assert!(out.notifications.is_empty());
    }

    #[test]
    fn first_tick_restores_interrupted_override() {
        let mut bell = bell(at(8, 10, 0));
        bell.store_mut().copy("default", BACKUP_NAME).unwrap();
        bell.store_mut()
            .save("default", &ScheduleDocument::default())
            .unwrap();
        bell.config_mut().temp.temp_schedule = Some("default".into());
        bell.config_mut().temp.backup = Some(BACKUP_NAME.into());
        bell.config_mut().temp.set_week = Some(4);

        let out = bell.tick(false);
        assert_eq!(out.snapshot.lesson_name, "Math");
        assert_eq!(out.snapshot.weekday, 0);
        assert!(bell.config().temp.temp_schedule.is_none());
    }

    #[test]
    fn weekday_substitution_changes_lessons() {
        let mut bell = bell(at(8, 10, 0));
        bell.startup().unwrap();
        OverrideManager::set_weekday_substitution(bell.config_mut(), Some(1)).unwrap();
        let out = bell.tick(false);
        assert_eq!(out.snapshot.weekday, 1);
        assert_eq!(out.snapshot.lesson_name, "Chemistry");
    }

    #[test]
    fn countdown_days_in_snapshot() {
        let mut bell = bell(at(8, 10, 0));
        bell.config_mut().date.countdown_date = NaiveDate::from_ymd_opt(2025, 9, 11);
        assert_eq!(bell.tick(false).snapshot.countdown_days, Some(10));
    }

    #[test]
    fn next_tick_lands_on_whole_second() {
        let now = at(8, 0, 0) + chrono::Duration::milliseconds(250);
        assert_eq!(next_tick_delay(now), std::time::Duration::from_millis(750));
        assert_eq!(next_tick_delay(at(8, 0, 0)), std::time::Duration::from_secs(1));
    }

    #[test]
    fn sub_second_clock_reads_whole_seconds() {
        let mut bell = bell(at(8, 0, 0) + chrono::Duration::milliseconds(400));
        let out = bell.tick(true);
        assert_eq!(out.now, at(8, 0, 0));
        assert_eq!(out.state.countdown.text, "45:00");
        assert_eq!(out.state.countdown.percent, 100.0);
        assert!(matches!(out.notifications.first().map(|n| n.kind), Some(NotificationKind::ClassStart)));
    }

    #[test]
    fn tick_events_end_with_snapshot() {
        let mut bell = bell(at(8, 0, 0));
        let events = bell.tick(true).events();
        assert!(matches!(events.first(), Some(Event::Notification { code: 1, .. })));
        assert!(matches!(events.last(), Some(Event::StateSnapshot { .. })));
    }
}
