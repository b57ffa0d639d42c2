//! End-to-end timetable scenarios driven through the tick pipeline.
//!
//! Each test builds a document in memory, injects a manual clock, and walks
//! simulated time across period and segment boundaries.

use chrono::{NaiveDate, NaiveDateTime};
use classbell_core::notification::NotificationKind;
use classbell_core::{
    ActivityKind, ClassBell, Config, CountdownPhase, ManualClock, MemoryScheduleStore,
    ScheduleDocument, TickOutcome,
};
use serde_json::json;

// ============================================================================
// Helpers
// ============================================================================

/// 2025-09-01 is a Monday (weekday 0).
fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 9, 1)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn bell_for(doc: serde_json::Value, start: NaiveDateTime) -> ClassBell<MemoryScheduleStore, ManualClock> {
    let doc: ScheduleDocument = serde_json::from_value(doc).unwrap();
    let store = MemoryScheduleStore::with_document("default", &doc).unwrap();
    let mut bell = ClassBell::new(Config::default(), store, ManualClock::new(start));
    bell.startup().unwrap();
    bell
}

fn tick_at(bell: &mut ClassBell<MemoryScheduleStore, ManualClock>, now: NaiveDateTime) -> TickOutcome {
    bell.clock().set(now);
    bell.tick(true)
}

fn single_lesson_doc() -> serde_json::Value {
    json!({
        "part": {"0": [8, 0]},
        "timeline": {"default": {"a0": 40, "f0": 10}},
        "schedule": {"0": ["Math"]}
    })
}

// ============================================================================
// Single period, one lesson
// ============================================================================

#[test]
fn single_lesson_day_walkthrough() {
    let mut bell = bell_for(single_lesson_doc(), at(7, 59, 0));

    let before = tick_at(&mut bell, at(7, 59, 0));
    assert_eq!(before.state.kind, ActivityKind::BeforeFirstPeriod);
    assert_eq!(before.state.countdown.phase, CountdownPhase::UntilFirstPeriod);
    assert_eq!(before.state.countdown.target, Some(at(8, 0, 0)));
    assert_eq!(before.state.countdown.text, "01:00");
    assert!(before.notifications.is_empty());

    let start = tick_at(&mut bell, at(8, 0, 0));
    assert_eq!(start.state.kind, ActivityKind::InClass);
    assert_eq!(start.state.label, "Math");
    assert_eq!(start.snapshot.state, 1);
    assert_eq!(start.state.countdown.percent, 100.0);
    assert_eq!(start.state.countdown.text, "40:00");

    let late = tick_at(&mut bell, at(8, 39, 59));
    assert_eq!(late.state.kind, ActivityKind::InClass);
    assert_eq!(late.state.countdown.text, "00:01");
    assert!(late.state.countdown.percent < start.state.countdown.percent);

    let end = tick_at(&mut bell, at(8, 40, 0));
    assert_eq!(end.state.kind, ActivityKind::InBreak);
    assert_eq!(end.snapshot.state, 0);
    assert_eq!(end.state.countdown.percent, 100.0);
    let kinds: Vec<_> = end.notifications.iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NotificationKind::ClassEnd, NotificationKind::DayEnd]);
    assert_eq!(end.notifications[0].subject, "");

    let after = tick_at(&mut bell, at(8, 50, 0));
    assert_eq!(after.state.kind, ActivityKind::DayEnded);
    assert_eq!(after.state.countdown.text, "00:00");
    assert_eq!(after.state.countdown.percent, 100.0);
}

#[test]
fn percent_never_increases_within_a_segment() {
    let mut bell = bell_for(single_lesson_doc(), at(8, 0, 0));
    let mut last = f64::INFINITY;
    let mut now = at(8, 0, 0);
    while now < at(8, 40, 0) {
        let out = tick_at(&mut bell, now);
        assert!(out.state.countdown.percent <= last, "percent rose at {now}");
        assert!((0.0..=100.0).contains(&out.state.countdown.percent));
        last = out.state.countdown.percent;
        now += chrono::Duration::seconds(7);
    }
    assert_eq!(tick_at(&mut bell, at(8, 40, 0)).state.countdown.percent, 100.0);
}

#[test]
fn exactly_one_class_start_with_duplicate_ticks() {
    let mut bell = bell_for(single_lesson_doc(), at(7, 59, 50));
    let mut starts = 0;
    let mut now = at(7, 59, 50);
    while now <= at(8, 0, 10) {
        for _ in 0..2 {
            let out = tick_at(&mut bell, now);
            starts += out
                .notifications
                .iter()
                .filter(|n| n.kind == NotificationKind::ClassStart)
                .count();
        }
        now += chrono::Duration::seconds(1);
    }
    assert_eq!(starts, 1);
}

#[test]
fn a_skipped_second_is_caught_up() {
    let mut bell = bell_for(single_lesson_doc(), at(7, 59, 58));
    tick_at(&mut bell, at(7, 59, 58));
    let out = tick_at(&mut bell, at(8, 0, 2));
    assert_eq!(out.notifications.len(), 1);
    assert_eq!(out.notifications[0].kind, NotificationKind::ClassStart);
    assert_eq!(out.notifications[0].at, at(8, 0, 0));
}

#[test]
fn silent_refresh_does_not_swallow_the_bell() {
    let mut bell = bell_for(single_lesson_doc(), at(7, 59, 59));
    tick_at(&mut bell, at(7, 59, 59));
    bell.clock().set(at(8, 0, 0));
    assert!(bell.tick(false).notifications.is_empty());
    assert_eq!(bell.tick(true).notifications.len(), 1);
}

// ============================================================================
// Placeholders and lookahead
// ============================================================================

#[test]
fn placeholder_slot_reads_no_lesson_and_is_hidden_from_lookahead() {
    let mut bell = bell_for(
        json!({
            "part": {"0": [8, 0]},
            "timeline": {"default": {"a01": 40, "f01": 10, "a02": 40, "f02": 10, "a03": 40}},
            "schedule": {"0": ["Not set", "English", "未添加"]}
        }),
        at(8, 5, 0),
    );

    let first = tick_at(&mut bell, at(8, 5, 0));
    assert_eq!(first.state.label, "No lesson");
    assert_eq!(first.state.next_lessons, vec!["English", "No lesson"]);
    assert_eq!(first.snapshot.next_lessons_text, "English");

    let third = tick_at(&mut bell, at(9, 45, 0));
    assert_eq!(third.state.label, "No lesson");
    assert_eq!(third.snapshot.next_lessons_text, "No upcoming lessons");
}

#[test]
fn out_of_range_lesson_index_is_no_lesson() {
    let mut bell = bell_for(
        json!({
            "part": {"0": [8, 0]},
            "timeline": {"default": {"a01": 40, "f01": 10, "a02": 40}},
            "schedule": {"0": ["Math"]}
        }),
        at(8, 55, 0),
    );
    assert_eq!(tick_at(&mut bell, at(8, 55, 0)).state.label, "No lesson");
}

#[test]
fn unreadable_lesson_slot_reads_no_lesson() {
    let mut bell = bell_for(
        json!({
            "part": {"0": [8, 0]},
            "timeline": {"default": {"a01": 40, "f01": 10, "a02": 40}},
            "schedule": {"0": [null, "English"]}
        }),
        at(8, 5, 0),
    );
    assert_eq!(tick_at(&mut bell, at(8, 5, 0)).state.label, "No lesson");
    assert_eq!(tick_at(&mut bell, at(8, 55, 0)).state.label, "English");
}

// ============================================================================
// Multiple periods
// ============================================================================

#[test]
fn dismissal_marker_after_last_lesson_ends_the_day() {
    let mut bell = bell_for(
        json!({
            "part": {"0": [8, 0], "1": [17, 0]},
            "timeline": {"default": {"a01": 40, "f01": 10}},
            "schedule": {"0": ["Math"]}
        }),
        at(8, 39, 59),
    );
    tick_at(&mut bell, at(8, 39, 59));
    let end = tick_at(&mut bell, at(8, 40, 0));
    let kinds: Vec<_> = end.notifications.iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NotificationKind::ClassEnd, NotificationKind::DayEnd]);

    let after = tick_at(&mut bell, at(9, 0, 0));
    assert_eq!(after.state.kind, ActivityKind::DayEnded);
    assert_eq!(after.state.countdown.phase, CountdownPhase::Finished);
    assert_eq!(after.state.countdown.text, "00:00");
}

#[test]
fn out_of_order_periods_and_break_part() {
    let mut bell = bell_for(
        json!({
            "part": {"2": [13, 30], "0": [8, 0], "1": [12, 0, "break"]},
            "part_name": {"1": "Lunch"},
            "timeline": {"default": {
                "a01": 45, "f01": 10, "a02": 45,
                "f11": 60,
                "a21": 45
            }},
            "schedule": {"0": ["Math", "English", "Art"]}
        }),
        at(8, 0, 0),
    );

    let lunch = tick_at(&mut bell, at(12, 30, 0));
    assert_eq!(lunch.state.kind, ActivityKind::InBreak);
    assert_eq!(lunch.state.label, "Lunch");
    assert_eq!(lunch.snapshot.state, 2);
    assert_eq!(lunch.state.part_id.as_deref(), Some("1"));

    let gap = tick_at(&mut bell, at(13, 10, 0));
    assert_eq!(gap.state.kind, ActivityKind::InBreak);
    assert_eq!(gap.state.label, "No lesson");
    assert_eq!(gap.state.countdown.phase, CountdownPhase::UntilNextPeriod);
    assert_eq!(gap.state.countdown.target, Some(at(13, 30, 0)));
    assert_eq!(gap.state.next_lessons, vec!["Art"]);

    let afternoon = tick_at(&mut bell, at(13, 31, 0));
    assert_eq!(afternoon.state.label, "Art");

    let done = tick_at(&mut bell, at(14, 15, 0));
    assert!(done
        .notifications
        .iter()
        .any(|n| n.kind == NotificationKind::DayEnd));
    assert_eq!(tick_at(&mut bell, at(15, 0, 0)).state.kind, ActivityKind::DayEnded);
}

#[test]
fn prepare_bell_rings_ahead_of_lessons_outside_class() {
    let mut bell = bell_for(
        json!({
            "part": {"0": [8, 0]},
            "timeline": {"default": {"a01": 40, "f01": 10, "a02": 40}},
            "schedule": {"0": ["Math", "English"]}
        }),
        at(7, 57, 0),
    );
    bell.config_mut().toast.prepare_minutes = Some(2);

    // Before the first period counts as a break.
    let early = tick_at(&mut bell, at(7, 58, 0));
    assert_eq!(early.notifications.len(), 1);
    assert_eq!(early.notifications[0].subject, "Math");

    // 08:38 is inside the first lesson.
    assert!(tick_at(&mut bell, at(8, 38, 0)).notifications.is_empty());

    let out = tick_at(&mut bell, at(8, 48, 0));
    assert_eq!(out.notifications.len(), 1);
    assert_eq!(out.notifications[0].kind, NotificationKind::Prepare);
    assert_eq!(out.notifications[0].subject, "English");
}

#[test]
fn time_offset_shifts_every_boundary() {
    let mut bell = bell_for(single_lesson_doc(), at(8, 0, 0));
    bell.config_mut().general.time_offset = 120;
    assert_eq!(
        tick_at(&mut bell, at(8, 1, 0)).state.kind,
        ActivityKind::BeforeFirstPeriod
    );
    let start = tick_at(&mut bell, at(8, 2, 0));
    assert_eq!(start.notifications[0].kind, NotificationKind::ClassStart);
}

#[test]
fn absurd_time_offset_does_not_stop_the_tick() {
    let mut bell = bell_for(single_lesson_doc(), at(8, 10, 0));
    bell.config_mut().general.time_offset = 10_000_000_000_000;
    let out = tick_at(&mut bell, at(8, 10, 0));
    assert_eq!(out.state.kind, ActivityKind::NoSchedule);

    bell.config_mut().general.time_offset = i64::MAX;
    let out = tick_at(&mut bell, at(8, 10, 0));
    assert_eq!(out.state.label, "Math");
}

// ============================================================================
// Timeline selection
// ============================================================================

#[test]
fn weekday_timeline_overrides_default() {
    let doc = json!({
        "part": {"0": [8, 0]},
        "timeline": {
            "default": {"a01": 40},
            "0": {"a01": 30},
            "1": {}
        },
        "schedule": {"0": ["Math"], "1": ["Art"]}
    });
    let mut bell = bell_for(doc.clone(), at(8, 35, 0));
    // Monday uses its own 30-minute timeline.
    assert_eq!(tick_at(&mut bell, at(8, 35, 0)).state.kind, ActivityKind::DayEnded);

    // Tuesday's entry is empty and falls back to the default.
    let tuesday = NaiveDate::from_ymd_opt(2025, 9, 2)
        .unwrap()
        .and_hms_opt(8, 35, 0)
        .unwrap();
    let out = tick_at(&mut bell, tuesday);
    assert_eq!(out.state.kind, ActivityKind::InClass);
    assert_eq!(out.state.label, "Art");
}

#[test]
fn alternate_week_list_on_even_weeks() {
    let mut bell = bell_for(
        json!({
            "part": {"0": [8, 0]},
            "timeline": {"a01": 40},
            "schedule": {"0": ["Math"]},
            "schedule_even": {"0": ["Music"]}
        }),
        at(8, 10, 0),
    );
    bell.config_mut().general.enable_alt_schedule = true;
    bell.config_mut().date.start_date = NaiveDate::from_ymd_opt(2025, 8, 25);
    assert_eq!(tick_at(&mut bell, at(8, 10, 0)).state.label, "Music");

    bell.config_mut().date.start_date = NaiveDate::from_ymd_opt(2025, 9, 1);
    assert_eq!(tick_at(&mut bell, at(8, 11, 0)).state.label, "Math");
}
