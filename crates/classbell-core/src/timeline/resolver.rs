//! Turns a schedule document into a dated, ordered timeline.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tracing::{debug, warn};

use super::segment::{SegmentId, SegmentKind};
use crate::schedule::{PartEntry, PartKind, ScheduleDocument};

/// A period placed on the resolution date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPart {
    pub id: String,
    pub start: NaiveDateTime,
    pub kind: PartKind,
}

/// One timeline entry, in authored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub id: String,
    pub kind: SegmentKind,
    pub minutes: u32,
    /// Owning period, if any period id prefixes the segment body.
    pub part_id: Option<String>,
    /// Zero-based index into the weekday's lesson list (class segments only).
    pub lesson_ordinal: Option<usize>,
}

impl Segment {
    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.minutes))
    }
}

/// A segment placed in time within its period.
#[derive(Debug, Clone, Copy)]
pub struct SegmentWindow<'a> {
    pub segment: &'a Segment,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub is_last_in_part: bool,
}

impl SegmentWindow<'_> {
    /// Half-open containment: `[start, end)`.
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at < self.end
    }
}

/// The resolved timetable for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDay {
    pub date: NaiveDate,
    pub weekday: u8,
    /// Sorted by start time ascending.
    pub parts: Vec<ResolvedPart>,
    pub segments: Vec<Segment>,
}

impl ResolvedDay {
    pub fn empty(date: NaiveDate, weekday: u8) -> Self {
        Self {
            date,
            weekday,
            parts: Vec::new(),
            segments: Vec::new(),
        }
    }

    /// No periods resolved: a legitimate "no schedule" day.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Index of the last period that has segments. Segment-less periods
    /// after it are markers and never take over the day. Falls back to the
    /// last period when none has segments.
    pub fn final_part_index(&self) -> Option<usize> {
        self.parts
            .iter()
            .rposition(|p| !self.span_of(p).is_zero())
            .or_else(|| self.parts.len().checked_sub(1))
    }

    pub fn is_last_part(&self, index: usize) -> bool {
        self.final_part_index() == Some(index)
    }

    pub fn segments_of<'a>(&'a self, part_id: &'a str) -> impl Iterator<Item = &'a Segment> + 'a {
        self.segments
            .iter()
            .filter(move |s| s.part_id.as_deref() == Some(part_id))
    }

    /// Sum of the period's segment durations.
    pub fn span_of(&self, part: &ResolvedPart) -> Duration {
        self.segments_of(&part.id)
            .fold(Duration::zero(), |acc, s| acc + s.duration())
    }

    /// Segments of the period at `part_index`, laid end to end from its start.
    pub fn windows(&self, part_index: usize) -> Vec<SegmentWindow<'_>> {
        let Some(part) = self.parts.get(part_index) else {
            return Vec::new();
        };
        let owned: Vec<&Segment> = self.segments_of(&part.id).collect();
        let count = owned.len();
        let mut cursor = part.start;
        let mut windows = Vec::with_capacity(count);
        for (i, segment) in owned.into_iter().enumerate() {
            let Some(end) = cursor.checked_add_signed(segment.duration()) else {
                break;
            };
            windows.push(SegmentWindow {
                segment,
                start: cursor,
                end,
                is_last_in_part: i + 1 == count,
            });
            cursor = end;
        }
        windows
    }
}

/// Resolves documents against a date and a fixed time offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimelineResolver {
    offset: Duration,
}

impl TimelineResolver {
    /// `offset_secs` shifts every period start (positive = later). An
    /// offset too large to represent is ignored.
    pub fn new(offset_secs: i64) -> Self {
        let offset = Duration::try_seconds(offset_secs).unwrap_or_else(|| {
            warn!(offset_secs, "time offset out of range; using 0");
            Duration::zero()
        });
        Self { offset }
    }

    pub fn resolve(&self, doc: &ScheduleDocument, date: NaiveDate, weekday: u8) -> ResolvedDay {
        let parts = self.resolve_parts(doc, date);
        let segments = resolve_segments(doc, weekday, &parts);
        debug!(
            %date,
            weekday,
            parts = parts.len(),
            segments = segments.len(),
            "resolved timeline"
        );
        ResolvedDay {
            date,
            weekday,
            parts,
            segments,
        }
    }

    fn resolve_parts(&self, doc: &ScheduleDocument, date: NaiveDate) -> Vec<ResolvedPart> {
        let mut parts: Vec<ResolvedPart> = doc
            .part
            .iter()
            .filter_map(|(id, raw)| match PartEntry::parse(id, raw) {
                Ok(entry) => {
                    let time = NaiveTime::from_hms_opt(entry.hour, entry.minute, 0)?;
                    let Some(start) = date.and_time(time).checked_add_signed(self.offset) else {
                        warn!(part = %id, "skipping period: offset start out of range");
                        return None;
                    };
                    Some(ResolvedPart {
                        id: id.clone(),
                        start,
                        kind: entry.kind,
                    })
                }
                Err(e) => {
                    warn!("skipping period: {e}");
                    None
                }
            })
            .collect();
        // Documents may declare periods in any order; start time is authoritative.
        parts.sort_by_key(|p| p.start);
        parts
    }
}

fn resolve_segments(doc: &ScheduleDocument, weekday: u8, parts: &[ResolvedPart]) -> Vec<Segment> {
    let Some(raw) = doc.timeline.for_weekday(weekday) else {
        warn!(weekday, "document has no default timeline");
        return Vec::new();
    };

    let mut ordinal = 0usize;
    let mut segments = Vec::with_capacity(raw.len());
    for (id, minutes) in raw {
        let parsed = match SegmentId::parse(id) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("skipping segment: {e}");
                continue;
            }
        };

        // Class ordinals follow authoring order even if a duration is bad,
        // so one broken entry does not shift every later lesson.
        let lesson_ordinal = match parsed.kind {
            SegmentKind::Active => {
                ordinal += 1;
                Some(ordinal - 1)
            }
            SegmentKind::Free => None,
        };

        let minutes = match crate::schedule::Timeline::parse_minutes(id, minutes) {
            Ok(m) => m,
            Err(e) => {
                warn!("skipping segment: {e}");
                continue;
            }
        };

        let part_id = parsed.owner(parts.iter().map(|p| p.id.as_str())).map(str::to_string);
        if part_id.is_none() {
            debug!(segment = %id, "segment matches no period");
        }

        segments.push(Segment {
            id: id.clone(),
            kind: parsed.kind,
            minutes,
            part_id,
            lesson_ordinal,
        });
    }
    segments
}
