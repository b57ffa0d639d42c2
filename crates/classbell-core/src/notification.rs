//! Edge-triggered bell notifications.
//!
//! Every segment boundary is a trigger instant. A tick fires the triggers
//! that fall in `(previous_tick, now]`, so a second is never announced
//! twice and a late tick still catches the boundary it straddled.
//!
//! ## Triggers
//!
//! - class segment start        -> `ClassStart(lesson)`
//! - free segment start         -> `ClassEnd(next lesson or "")`, plus
//!   `DayEnd` when it is the final segment of the final period and no
//!   lesson follows
//! - end of a final class segment of the final period -> `DayEnd`
//! - class start minus N minutes while on a break -> `Prepare(lesson)`

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::activity::{ActivityEngine, ClassState, CountdownCalculator};
use crate::schedule::lesson_at;
use crate::timeline::{ResolvedDay, SegmentKind};

/// Longest gap between ticks that is still caught up on.
pub const MAX_CATCH_UP_SECS: i64 = 5;

/// Wire codes match what bell sinks expect: end 0, start 1, day end 2, prepare 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ClassEnd,
    ClassStart,
    DayEnd,
    Prepare,
}

impl NotificationKind {
    pub fn code(self) -> u8 {
        match self {
            NotificationKind::ClassEnd => 0,
            NotificationKind::ClassStart => 1,
            NotificationKind::DayEnd => 2,
            NotificationKind::Prepare => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    /// Lesson name; empty for day end or when no lesson follows.
    pub subject: String,
    /// Trigger instant.
    pub at: NaiveDateTime,
}

/// Receives bell notifications (toast, sound, speech...).
pub trait NotificationSink {
    fn notify(&mut self, kind: NotificationKind, subject: &str);
}

/// Sink that just remembers what it was told.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub received: Vec<(NotificationKind, String)>,
}

impl NotificationSink for RecordingSink {
    fn notify(&mut self, kind: NotificationKind, subject: &str) {
        self.received.push((kind, subject.to_string()));
    }
}

/// Decides which notifications a tick produces.
#[derive(Debug, Clone, Default)]
pub struct NotificationScheduler {
    prepare_minutes: Option<u32>,
    last_evaluated: Option<NaiveDateTime>,
}

impl NotificationScheduler {
    /// `prepare_minutes` of `None` or `Some(0)` disables the prepare bell.
    pub fn new(prepare_minutes: Option<u32>) -> Self {
        Self {
            prepare_minutes,
            last_evaluated: None,
        }
    }

    pub fn set_prepare_minutes(&mut self, prepare_minutes: Option<u32>) {
        self.prepare_minutes = prepare_minutes;
    }

    /// Notifications due at `now`.
    ///
    /// With `notify` false nothing fires and no edge is consumed, so a
    /// display-only refresh never swallows a bell.
    pub fn evaluate(
        &mut self,
        day: &ResolvedDay,
        lessons: &[String],
        now: NaiveDateTime,
        notify: bool,
    ) -> Vec<Notification> {
        if !notify {
            return Vec::new();
        }
        let since = match self.last_evaluated {
            Some(prev) if prev == now => return Vec::new(),
            Some(prev) if now > prev && now - prev <= Duration::seconds(MAX_CATCH_UP_SECS) => {
                Some(prev)
            }
            _ => None,
        };
        self.last_evaluated = Some(now);

        let due = |t: NaiveDateTime| match since {
            Some(prev) => prev < t && t <= now,
            None => t == now,
        };

        let mut fired: Vec<Notification> = self
            .triggers(day, lessons)
            .into_iter()
            .filter(|n| due(n.at))
            .collect();
        fired.sort_by_key(|n| n.at);

        for n in &fired {
            debug!(kind = ?n.kind, subject = %n.subject, at = %n.at, "bell");
        }
        fired
    }

    /// Evaluate and hand the result to `sink`.
    pub fn dispatch<S: NotificationSink + ?Sized>(
        &mut self,
        day: &ResolvedDay,
        lessons: &[String],
        now: NaiveDateTime,
        sink: &mut S,
    ) -> Vec<Notification> {
        let fired = self.evaluate(day, lessons, now, true);
        for n in &fired {
            sink.notify(n.kind, &n.subject);
        }
        fired
    }

    /// Every trigger of the day, in period then authoring order.
    fn triggers(&self, day: &ResolvedDay, lessons: &[String]) -> Vec<Notification> {
        let lookahead = CountdownCalculator::default();
        let prepare = self
            .prepare_minutes
            .filter(|m| *m > 0)
            .map(|m| Duration::minutes(i64::from(m)));

        let mut out = Vec::new();
        for part_index in 0..day.parts.len() {
            let final_part = day.is_last_part(part_index);
            for window in day.windows(part_index) {
                let segment = window.segment;
                let lesson = || {
                    segment
                        .lesson_ordinal
                        .map(|o| lesson_at(lessons, o))
                        .unwrap_or_default()
                };
                let final_segment = final_part && window.is_last_in_part;

                match segment.kind {
                    SegmentKind::Active => {
                        out.push(Notification {
                            kind: NotificationKind::ClassStart,
                            subject: lesson(),
                            at: window.start,
                        });
                        if let Some(lead) = prepare {
                            let at = window.start - lead;
                            let state = ActivityEngine::position(day, at).class_state(day);
                            if state == ClassState::Break {
                                out.push(Notification {
                                    kind: NotificationKind::Prepare,
                                    subject: lesson(),
                                    at,
                                });
                            }
                        }
                        if final_segment {
                            out.push(Notification {
                                kind: NotificationKind::DayEnd,
                                subject: String::new(),
                                at: window.end,
                            });
                        }
                    }
                    SegmentKind::Free => {
                        let next = lookahead
                            .lookahead(day, part_index, lessons, window.start)
                            .into_iter()
                            .next();
                        let day_over = next.is_none() && final_segment;
                        out.push(Notification {
                            kind: NotificationKind::ClassEnd,
                            subject: next.unwrap_or_default(),
                            at: window.start,
                        });
                        if day_over {
                            out.push(Notification {
                                kind: NotificationKind::DayEnd,
                                subject: String::new(),
                                at: window.start,
                            });
                        }
                    }
                }
            }
        }
        out
    }
}
