use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use super::lessons::PLACEHOLDER_SLOT;
use crate::error::ValidationError;

/// Timeline key used when a weekday has no timeline of its own.
pub const DEFAULT_TIMELINE_KEY: &str = "default";

/// Kind of a top-level period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    /// A teaching period. Documents spell this `part` or `class`.
    #[serde(alias = "part")]
    Class,
    Break,
}

/// A validated `part` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartEntry {
    pub hour: u32,
    pub minute: u32,
    pub kind: PartKind,
}

impl PartEntry {
    /// Parse `[hour, minute]` or `[hour, minute, kind]`.
    ///
    /// Any kind other than `break` is a class period.
    pub fn parse(id: &str, raw: &Value) -> Result<Self, ValidationError> {
        let malformed = |message: &str| ValidationError::MalformedPart {
            id: id.to_string(),
            message: message.to_string(),
        };

        let items = raw
            .as_array()
            .ok_or_else(|| malformed("expected an array"))?;
        if items.len() < 2 {
            return Err(malformed("expected at least hour and minute"));
        }

        let hour = items[0]
            .as_u64()
            .filter(|h| *h < 24)
            .ok_or_else(|| malformed("hour must be an integer in 0..=23"))?;
        let minute = items[1]
            .as_u64()
            .filter(|m| *m < 60)
            .ok_or_else(|| malformed("minute must be an integer in 0..=59"))?;

        let kind = match items.get(2).and_then(Value::as_str) {
            Some("break") => PartKind::Break,
            _ => PartKind::Class,
        };

        Ok(Self {
            hour: hour as u32,
            minute: minute as u32,
            kind,
        })
    }
}

/// Segment timelines, either shared or keyed by weekday.
///
/// Values are minutes, authored as integers or numeric strings. A map is
/// read per weekday when it has a `default` key or any object value; in
/// that shape non-object entries are dropped with a warning.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Timeline {
    /// `{"default": {...}, "0": {...}, ...}`
    PerWeekday(IndexMap<String, IndexMap<String, Value>>),
    /// Legacy single map, equivalent to `{"default": {...}}`.
    Flat(IndexMap<String, Value>),
}

impl Default for Timeline {
    fn default() -> Self {
        Timeline::PerWeekday(IndexMap::new())
    }
}

impl<'de> Deserialize<'de> for Timeline {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<IndexMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
        let per_weekday =
            raw.is_empty() || raw.contains_key(DEFAULT_TIMELINE_KEY) || raw.values().any(Value::is_object);
        if !per_weekday {
            return Ok(Timeline::Flat(raw));
        }
        let variants = raw
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::Object(segments) => Some((key, segments.into_iter().collect())),
                other => {
                    warn!(timeline = %key, value = %other, "skipping timeline that is not an object");
                    None
                }
            })
            .collect();
        Ok(Timeline::PerWeekday(variants))
    }
}

impl Timeline {
    /// Raw segment map applying to `weekday`.
    ///
    /// A weekday entry wins only when the document has more than one
    /// variant and that entry is non-empty; otherwise `default` applies.
    pub fn for_weekday(&self, weekday: u8) -> Option<&IndexMap<String, Value>> {
        match self {
            Timeline::Flat(map) => Some(map),
            Timeline::PerWeekday(variants) => {
                if variants.len() > 1 {
                    if let Some(day) = variants.get(&weekday.to_string()) {
                        if !day.is_empty() {
                            return Some(day);
                        }
                    }
                }
                variants.get(DEFAULT_TIMELINE_KEY)
            }
        }
    }

    pub fn parse_minutes(id: &str, raw: &Value) -> Result<u32, ValidationError> {
        let invalid = || ValidationError::InvalidDuration {
            id: id.to_string(),
            value: raw.to_string(),
        };
        match raw {
            Value::Number(n) => n
                .as_u64()
                .and_then(|m| u32::try_from(m).ok())
                .ok_or_else(invalid),
            Value::String(s) => s.trim().parse::<u32>().map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

/// A named schedule document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDocument {
    /// Period id -> `[hour, minute, kind?]`, validated at resolution.
    #[serde(default)]
    pub part: IndexMap<String, Value>,
    /// Period id -> label shown while inside a break period.
    #[serde(default, deserialize_with = "lenient_labels")]
    pub part_name: IndexMap<String, String>,
    #[serde(default)]
    pub timeline: Timeline,
    /// Weekday (`"0"` = Monday) -> lesson names in class-segment order.
    /// Unreadable slots load as the placeholder.
    #[serde(default, deserialize_with = "lenient_lessons")]
    pub schedule: IndexMap<String, Vec<String>>,
    /// Even-week variant of `schedule`.
    #[serde(
        default,
        deserialize_with = "lenient_even_lessons",
        skip_serializing_if = "Option::is_none"
    )]
    pub schedule_even: Option<IndexMap<String, Vec<String>>>,
}

fn lenient_labels<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<IndexMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|(id, value)| match value {
            Value::String(label) => Some((id, label)),
            other => {
                warn!(part = %id, value = %other, "ignoring period label that is not a string");
                None
            }
        })
        .collect())
}

fn lenient_lessons<'de, D>(deserializer: D) -> Result<IndexMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<IndexMap<String, Value>>::deserialize(deserializer)?;
    Ok(raw.map(lesson_lists).unwrap_or_default())
}

fn lenient_even_lessons<'de, D>(
    deserializer: D,
) -> Result<Option<IndexMap<String, Vec<String>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<IndexMap<String, Value>>::deserialize(deserializer)?;
    Ok(raw.map(lesson_lists))
}

fn lesson_lists(raw: IndexMap<String, Value>) -> IndexMap<String, Vec<String>> {
    raw.into_iter()
        .map(|(weekday, value)| {
            let slots = match value {
                Value::Array(items) => items
                    .into_iter()
                    .enumerate()
                    .map(|(slot, item)| match item {
                        Value::String(name) => name,
                        other => {
                            warn!(%weekday, slot, value = %other, "unreadable lesson slot");
                            PLACEHOLDER_SLOT.to_string()
                        }
                    })
                    .collect(),
                Value::Null => Vec::new(),
                other => {
                    warn!(%weekday, value = %other, "lesson list is not an array");
                    Vec::new()
                }
            };
            (weekday, slots)
        })
        .collect()
}

impl ScheduleDocument {
    /// Lesson list for a weekday.
    ///
    /// With `even_week` set the even-week list is used when the document
    /// has one for that day; otherwise the primary list.
    pub fn lessons_for(&self, weekday: u8, even_week: bool) -> &[String] {
        let key = weekday.to_string();
        if even_week {
            if let Some(list) = self.schedule_even.as_ref().and_then(|even| even.get(&key)) {
                return list;
            }
        }
        self.schedule.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Label for a break period, if the document names it.
    pub fn part_label(&self, part_id: &str) -> Option<&str> {
        self.part_name
            .get(part_id)
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// A small working day used when no document exists yet.
    pub fn sample() -> Self {
        let json = serde_json::json!({
            "part": {
                "0": [8, 0, "part"],
                "1": [12, 0, "break"],
                "2": [13, 30, "part"]
            },
            "part_name": {
                "0": "Morning",
                "1": "Lunch",
                "2": "Afternoon"
            },
            "timeline": {
                "default": {
                    "a01": 45, "f01": 10, "a02": 45, "f02": 20,
                    "a03": 45, "f03": 10, "a04": 45,
                    "f11": 90,
                    "a21": 45, "f21": 10, "a22": 45
                }
            },
            "schedule": {
                "0": ["Math", "English", "Physics", "History", "Art", "Biology"],
                "1": ["Chemistry", "Math", "Literature", "PE", "English", "Music"],
                "2": ["English", "Biology", "Math", "Geography", "Physics", "Not set"],
                "3": ["History", "Chemistry", "English", "Math", "IT", "PE"],
                "4": ["Literature", "Math", "Physics", "English", "Class meeting", "Not set"],
                "5": [],
                "6": []
            }
        });
        // The literal above is a valid document.
        serde_json::from_value(json).unwrap_or_default()
    }
}
