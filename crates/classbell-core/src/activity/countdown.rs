//! Countdown text, segment progress, and upcoming-lesson lookahead.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::schedule::{abbreviate, lesson_at, NO_LESSON};
use crate::timeline::{ResolvedDay, SegmentKind, SegmentWindow};

/// What the countdown is counting towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownPhase {
    /// Inside a class segment.
    ActivityRemaining,
    /// Inside a free segment.
    BreakRemaining,
    UntilFirstPeriod,
    /// Waiting for a later period to begin.
    UntilNextPeriod,
    Finished,
}

impl CountdownPhase {
    pub fn label(self) -> &'static str {
        match self {
            CountdownPhase::ActivityRemaining => "Time left in current activity",
            CountdownPhase::BreakRemaining => "Time left in break",
            CountdownPhase::UntilFirstPeriod => "Time until first period",
            CountdownPhase::UntilNextPeriod => "Time until next period",
            CountdownPhase::Finished => "Classes are over for today",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Countdown {
    pub phase: CountdownPhase,
    pub target: Option<NaiveDateTime>,
    pub remaining_secs: i64,
    /// `MM:SS`; minutes are not wrapped at 60.
    pub text: String,
    /// Share of the current segment still ahead, 0..=100: 100 at the
    /// segment start, falling towards 0 at its end.
    ///
    /// This is not the legacy `100 - remaining / total * 100`, which is the
    /// elapsed share and starts at 0. `100.0 - percent` gives that value.
    pub percent: f64,
}

impl Countdown {
    fn new(phase: CountdownPhase, target: Option<NaiveDateTime>, remaining_secs: i64, percent: f64) -> Self {
        let remaining_secs = remaining_secs.max(0);
        Self {
            phase,
            target,
            remaining_secs,
            text: format!("{:02}:{:02}", remaining_secs / 60, remaining_secs % 60),
            percent: percent.clamp(0.0, 100.0),
        }
    }

    /// Fixed `00:00` / 100% once nothing is left to count.
    pub fn finished() -> Self {
        Self::new(CountdownPhase::Finished, None, 0, 100.0)
    }

    pub fn label(&self) -> &'static str {
        self.phase.label()
    }

    /// Minute-granularity text for compact widgets, e.g. `< 5 min`.
    pub fn fuzzy_text(&self) -> String {
        if self.remaining_secs == 0 {
            "< - min".to_string()
        } else {
            format!("< {} min", self.remaining_secs / 60 + 1)
        }
    }
}

/// Derives countdowns and the lookahead list.
#[derive(Debug, Clone, Copy)]
pub struct CountdownCalculator {
    /// Upper bound on lookahead entries.
    pub max_lookahead: usize,
    /// How long before a later period starts its lessons become visible.
    pub lookahead_window: Duration,
}

impl Default for CountdownCalculator {
    fn default() -> Self {
        Self {
            max_lookahead: 5,
            lookahead_window: Duration::minutes(60),
        }
    }
}

impl CountdownCalculator {
    /// Countdown to the end of the segment containing `now`.
    pub fn segment(&self, window: &SegmentWindow<'_>, now: NaiveDateTime) -> Countdown {
        let phase = match window.segment.kind {
            SegmentKind::Active => CountdownPhase::ActivityRemaining,
            SegmentKind::Free => CountdownPhase::BreakRemaining,
        };
        let remaining = (window.end - now).num_seconds().max(0);
        let total = window.segment.duration().num_seconds();
        let percent = if total > 0 {
            remaining as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        Countdown::new(phase, Some(window.end), remaining, percent)
    }

    /// Countdown to a period that has not started; progress is held at 100.
    pub fn until(&self, target: NaiveDateTime, now: NaiveDateTime, phase: CountdownPhase) -> Countdown {
        Countdown::new(phase, Some(target), (target - now).num_seconds(), 100.0)
    }

    /// Lesson names of class segments in the period at `part_index` that
    /// start after `now`, most imminent first.
    ///
    /// Never looks past the period. A later period only shows its lessons
    /// once `now` is inside the lookahead window before its start.
    pub fn lookahead(
        &self,
        day: &ResolvedDay,
        part_index: usize,
        lessons: &[String],
        now: NaiveDateTime,
    ) -> Vec<String> {
        let Some(part) = day.parts.get(part_index) else {
            return Vec::new();
        };
        if part_index != 0 && now < part.start - self.lookahead_window {
            return Vec::new();
        }

        day.windows(part_index)
            .iter()
            .filter(|w| w.start > now && w.segment.kind == SegmentKind::Active)
            .filter_map(|w| w.segment.lesson_ordinal)
            .map(|ordinal| lesson_at(lessons, ordinal))
            .take(self.max_lookahead)
            .collect()
    }

    /// One-line rendering of the lookahead list.
    ///
    /// Empty slots are left out; with more than two entries each name is
    /// shortened to its first character.
    pub fn next_lessons_text(&self, next: &[String]) -> String {
        let shown: Vec<&String> = next
            .iter()
            .take(self.max_lookahead)
            .filter(|name| name.as_str() != NO_LESSON)
            .collect();
        if shown.is_empty() {
            return "No upcoming lessons".to_string();
        }
        let compact = shown.len() > 2;
        shown
            .into_iter()
            .map(|name| if compact { abbreviate(name) } else { name.clone() })
            .collect::<Vec<_>>()
            .join("  ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ScheduleDocument;
    use crate::timeline::TimelineResolver;
    use chrono::NaiveDate;
    use serde_json::json;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn day() -> ResolvedDay {
        let doc: ScheduleDocument = serde_json::from_value(json!({
            "part": {"0": [8, 0], "1": [14, 0]},
            "timeline": {"default": {
                "a01": 40, "f01": 10, "a02": 40, "f02": 10, "a03": 40,
                "a11": 40, "f11": 10
            }}
        }))
        .unwrap();
        TimelineResolver::default().resolve(&doc, at(0, 0, 0).date(), 0)
    }

    fn lessons() -> Vec<String> {
        ["Math", "Not set", "Physics", "Art"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn segment_countdown_counts_down_remaining_share() {
        let day = day();
        let windows = day.windows(0);
        let calc = CountdownCalculator::default();

        let start = calc.segment(&windows[0], at(8, 0, 0));
        assert_eq!(start.text, "40:00");
        assert_eq!(start.percent, 100.0);
        assert_eq!(start.phase, CountdownPhase::ActivityRemaining);

        let late = calc.segment(&windows[0], at(8, 39, 0));
        assert_eq!(late.text, "01:00");
        assert!((late.percent - 2.5).abs() < 1e-9);

        let brk = calc.segment(&windows[1], at(8, 45, 0));
        assert_eq!(brk.phase, CountdownPhase::BreakRemaining);
        assert_eq!(brk.label(), "Time left in break");
    }

    #[test]
    fn until_holds_progress_full() {
        let calc = CountdownCalculator::default();
        let c = calc.until(at(8, 0, 0), at(7, 58, 30), CountdownPhase::UntilFirstPeriod);
        assert_eq!(c.text, "01:30");
        assert_eq!(c.percent, 100.0);
        assert_eq!(c.fuzzy_text(), "< 2 min");
    }

    #[test]
    fn finished_is_zero_and_full() {
        let c = Countdown::finished();
        assert_eq!(c.text, "00:00");
        assert_eq!(c.percent, 100.0);
        assert_eq!(c.fuzzy_text(), "< - min");
    }

    #[test]
    fn lookahead_stays_within_part() {
        let day = day();
        let calc = CountdownCalculator::default();
        let next = calc.lookahead(&day, 0, &lessons(), at(8, 10, 0));
        assert_eq!(next, ["No lesson", "Physics"]);
        let next = calc.lookahead(&day, 0, &lessons(), at(7, 0, 0));
        assert_eq!(next, ["Math", "No lesson", "Physics"]);
    }

    #[test]
    fn later_part_lookahead_waits_for_window() {
        let day = day();
        let calc = CountdownCalculator::default();
        assert!(calc.lookahead(&day, 1, &lessons(), at(12, 30, 0)).is_empty());
        assert_eq!(calc.lookahead(&day, 1, &lessons(), at(13, 30, 0)), ["Art"]);
    }

    #[test]
    fn lookahead_is_capped() {
        let calc = CountdownCalculator {
            max_lookahead: 2,
            ..Default::default()
        };
        let next = calc.lookahead(&day(), 0, &lessons(), at(7, 0, 0));
        assert_eq!(next.len(), 2);
    }

    #[test]
    fn next_lessons_text_excludes_empty_slots() {
        let calc = CountdownCalculator::default();
        let names = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(calc.next_lessons_text(&names(&["Math", "No lesson"])), "Math");
        assert_eq!(
            calc.next_lessons_text(&names(&["Math", "Physics", "Art"])),
            "M  P  A"
        );
        assert_eq!(calc.next_lessons_text(&[]), "No upcoming lessons");
        assert_eq!(calc.next_lessons_text(&names(&["No lesson"])), "No upcoming lessons");
    }
}
