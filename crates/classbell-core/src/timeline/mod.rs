//! Timeline resolution.
//!
//! This module provides:
//! - Segment id parsing (`a<period><n>` / `f<period><n>`)
//! - Period placement on a date, sorted by start time
//! - Weekday timeline selection with fallback to `default`

mod resolver;
mod segment;

pub use resolver::{ResolvedDay, ResolvedPart, Segment, SegmentWindow, TimelineResolver};
pub use segment::{SegmentId, SegmentKind};
