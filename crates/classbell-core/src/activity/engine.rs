//! Activity engine: where in the day are we right now.
//!
//! ## Location rules
//!
//! ```text
//! before first period start      -> BeforeFirstPeriod
//! period i active, not started   -> BeforePart (gap between periods)
//! inside [seg.start, seg.end)    -> InSegment
//! past the final segment         -> DayEnded
//! ```
//!
//! Period `i` is active while `now < start + span`; a period without
//! segments is a marker and never active. The last period that has
//! segments stays active once reached, so a trailing marker (a dismissal
//! time, say) never reopens the day.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::countdown::{Countdown, CountdownCalculator, CountdownPhase};
use crate::schedule::{lesson_at, PartKind, ScheduleDocument, BREAK_LABEL, NO_LESSON};
use crate::timeline::{ResolvedDay, SegmentKind, SegmentWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    BeforeFirstPeriod,
    InClass,
    InBreak,
    DayEnded,
    /// No period could be resolved from the document.
    NoSchedule,
}

/// Coarse state shared with widgets: break = 0, class = 1, rest = 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassState {
    Break,
    Class,
    /// Inside a period whose kind is `break` (lunch, assembly).
    Rest,
}

impl ClassState {
    pub fn as_u8(self) -> u8 {
        match self {
            ClassState::Break => 0,
            ClassState::Class => 1,
            ClassState::Rest => 2,
        }
    }
}

/// Where `now` falls on a resolved day.
#[derive(Debug, Clone, Copy)]
pub enum Position<'a> {
    NoSchedule,
    BeforeFirstPeriod,
    /// The active period has not started yet.
    BeforePart { part_index: usize },
    InSegment {
        part_index: usize,
        window: SegmentWindow<'a>,
    },
    DayEnded { part_index: usize },
}

impl Position<'_> {
    pub fn part_index(&self) -> Option<usize> {
        match self {
            Position::NoSchedule => None,
            Position::BeforeFirstPeriod => Some(0),
            Position::BeforePart { part_index }
            | Position::InSegment { part_index, .. }
            | Position::DayEnded { part_index } => Some(*part_index),
        }
    }

    pub fn class_state(&self, day: &ResolvedDay) -> ClassState {
        match self {
            Position::InSegment { window, .. } if window.segment.kind == SegmentKind::Active => {
                ClassState::Class
            }
            Position::InSegment { part_index, .. } | Position::DayEnded { part_index }
                if day.parts[*part_index].kind == PartKind::Break =>
            {
                ClassState::Rest
            }
            _ => ClassState::Break,
        }
    }
}

/// Recomputed every tick; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityState {
    pub kind: ActivityKind,
    pub label: String,
    pub class_state: ClassState,
    pub part_id: Option<String>,
    pub part_start: Option<NaiveDateTime>,
    pub segment_id: Option<String>,
    pub countdown: Countdown,
    /// Upcoming lessons in the active period, most imminent first.
    pub next_lessons: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityEngine {
    pub countdown: CountdownCalculator,
}

impl ActivityEngine {
    pub fn new(countdown: CountdownCalculator) -> Self {
        Self { countdown }
    }

    /// Active period index and time elapsed since its start (negative when
    /// it has not begun).
    pub fn locate(day: &ResolvedDay, now: NaiveDateTime) -> Option<(usize, Duration)> {
        let final_index = day.final_part_index()?;
        for (i, part) in day.parts.iter().enumerate().take(final_index + 1) {
            let span = day.span_of(part);
            let running = !span.is_zero()
                && part
                    .start
                    .checked_add_signed(span)
                    .map_or(true, |end| now < end);
            if i == final_index || running {
                return Some((i, now - part.start));
            }
        }
        None
    }

    pub fn position(day: &ResolvedDay, now: NaiveDateTime) -> Position<'_> {
        let Some(first) = day.parts.first() else {
            return Position::NoSchedule;
        };
        if now < first.start {
            return Position::BeforeFirstPeriod;
        }
        let Some((part_index, elapsed)) = Self::locate(day, now) else {
            return Position::NoSchedule;
        };
        if elapsed < Duration::zero() {
            return Position::BeforePart { part_index };
        }
        day.windows(part_index)
            .into_iter()
            .find(|w| w.contains(now))
            .map(|window| Position::InSegment { part_index, window })
            .unwrap_or(Position::DayEnded { part_index })
    }

    pub fn evaluate(
        &self,
        day: &ResolvedDay,
        doc: &ScheduleDocument,
        lessons: &[String],
        now: NaiveDateTime,
    ) -> ActivityState {
        let position = Self::position(day, now);
        let class_state = position.class_state(day);
        let part = position.part_index().and_then(|i| day.parts.get(i));
        let next_lessons = position
            .part_index()
            .map(|i| self.countdown.lookahead(day, i, lessons, now))
            .unwrap_or_default();

        let break_part_label = || {
            part.and_then(|p| doc.part_label(&p.id))
                .unwrap_or(BREAK_LABEL)
                .to_string()
        };

        let (kind, label, segment_id, countdown) = match position {
            Position::NoSchedule => (
                ActivityKind::NoSchedule,
                "No schedule".to_string(),
                None,
                Countdown::finished(),
            ),
            Position::BeforeFirstPeriod => (
                ActivityKind::BeforeFirstPeriod,
                NO_LESSON.to_string(),
                None,
                self.countdown
                    .until(day.parts[0].start, now, CountdownPhase::UntilFirstPeriod),
            ),
            Position::BeforePart { part_index } => (
                ActivityKind::InBreak,
                NO_LESSON.to_string(),
                None,
                self.countdown.until(
                    day.parts[part_index].start,
                    now,
                    CountdownPhase::UntilNextPeriod,
                ),
            ),
            Position::InSegment { window, .. } => {
                let (kind, label) = match (window.segment.kind, class_state) {
                    (SegmentKind::Active, _) => (
                        ActivityKind::InClass,
                        window
                            .segment
                            .lesson_ordinal
                            .map(|ordinal| lesson_at(lessons, ordinal))
                            .unwrap_or_else(|| NO_LESSON.to_string()),
                    ),
                    (SegmentKind::Free, ClassState::Rest) => (ActivityKind::InBreak, break_part_label()),
                    (SegmentKind::Free, _) => (ActivityKind::InBreak, BREAK_LABEL.to_string()),
                };
                (
                    kind,
                    label,
                    Some(window.segment.id.clone()),
                    self.countdown.segment(&window, now),
                )
            }
            Position::DayEnded { .. } => {
                let label = if class_state == ClassState::Rest {
                    break_part_label()
                } else {
                    NO_LESSON.to_string()
                };
                (ActivityKind::DayEnded, label, None, Countdown::finished())
            }
        };

        ActivityState {
            kind,
            label,
            class_state,
            part_id: part.map(|p| p.id.clone()),
            part_start: part.map(|p| p.start),
            segment_id,
            countdown,
            next_lessons,
        }
    }
}
