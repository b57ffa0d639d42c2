//! Schedule documents: periods, segment timelines, and weekday lesson lists.
//!
//! A document is the unit of storage. It is deliberately permissive on the
//! way in (raw part entries and durations are kept as JSON values) and is
//! validated entry by entry when the timeline is resolved, so one bad
//! period never takes the whole day down.

mod document;
mod lessons;

pub use document::{PartEntry, PartKind, ScheduleDocument, Timeline, DEFAULT_TIMELINE_KEY};
pub use lessons::{abbreviate, is_placeholder, lesson_at, BREAK_LABEL, NO_LESSON, PLACEHOLDER_SLOT};
