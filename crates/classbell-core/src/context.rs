//! Read-only view of the current tick for UIs and extensions.

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::activity::{ActivityKind, ActivityState, CountdownCalculator};
use crate::overrides::WeekParity;

/// Everything a display needs from one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub now: NaiveDateTime,
    pub kind: ActivityKind,
    /// Current lesson, break label, or "No lesson".
    pub lesson_name: String,
    /// 0 break, 1 class, 2 rest.
    pub state: u8,
    pub part_id: Option<String>,
    pub part_start: Option<NaiveDateTime>,
    pub countdown_label: String,
    pub countdown_text: String,
    pub countdown_fuzzy: String,
    pub percent: f64,
    pub next_lessons: Vec<String>,
    pub next_lessons_text: String,
    /// Weekday shown, after substitution (0 = Monday).
    pub weekday: u8,
    pub parity: WeekParity,
    /// Days until `date.countdown_date`, when configured.
    pub countdown_days: Option<i64>,
    pub extensions: Extensions,
}

impl ContextSnapshot {
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        now: NaiveDateTime,
        state: &ActivityState,
        countdown: &CountdownCalculator,
        weekday: u8,
        parity: WeekParity,
        countdown_days: Option<i64>,
        extensions: &Extensions,
    ) -> Self {
        Self {
            now,
            kind: state.kind,
            lesson_name: state.label.clone(),
            state: state.class_state.as_u8(),
            part_id: state.part_id.clone(),
            part_start: state.part_start,
            countdown_label: state.countdown.label().to_string(),
            countdown_text: state.countdown.text.clone(),
            countdown_fuzzy: state.countdown.fuzzy_text(),
            percent: state.countdown.percent,
            next_lessons: state.next_lessons.clone(),
            next_lessons_text: countdown.next_lessons_text(&state.next_lessons),
            weekday,
            parity,
            countdown_days,
            extensions: extensions.clone(),
        }
    }
}

/// Widgets registered by extensions.
///
/// Append-only: registering an existing code replaces its entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extensions {
    /// Widget code -> display name.
    pub names: IndexMap<String, String>,
    /// Widget code -> width in pixels.
    pub widths: IndexMap<String, u32>,
}

impl Extensions {
    pub fn register_widget(&mut self, code: &str, name: &str, width: u32) {
        self.names.insert(code.to_string(), name.to_string());
        self.widths.insert(code.to_string(), width);
    }

    pub fn adjust_width(&mut self, code: &str, width: u32) {
        self.widths.insert(code.to_string(), width);
    }

    /// Code of the widget registered under `name`; the latest wins.
    pub fn code_of(&self, name: &str) -> Option<&str> {
        self.names
            .iter()
            .rev()
            .find(|(_, n)| n.as_str() == name)
            .map(|(code, _)| code.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.widths.is_empty()
    }
}
