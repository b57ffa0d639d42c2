/// Label for an empty or missing lesson slot.
pub const NO_LESSON: &str = "No lesson";

/// Label for a free segment inside a class period.
pub const BREAK_LABEL: &str = "Break";

/// What editors write into a slot that is intentionally left empty.
pub const PLACEHOLDER_SLOT: &str = "Not set";

/// Older documents use this spelling for the same placeholder.
const LEGACY_PLACEHOLDER_SLOT: &str = "未添加";

pub fn is_placeholder(slot: &str) -> bool {
    let slot = slot.trim();
    slot.is_empty() || slot == PLACEHOLDER_SLOT || slot == LEGACY_PLACEHOLDER_SLOT
}

/// Resolve a class ordinal against a weekday's lesson list.
///
/// Out-of-range ordinals and placeholder slots both read as [`NO_LESSON`].
pub fn lesson_at(lessons: &[String], ordinal: usize) -> String {
    match lessons.get(ordinal) {
        Some(name) if !is_placeholder(name) => name.clone(),
        _ => NO_LESSON.to_string(),
    }
}

/// Short form used when several upcoming lessons share one line.
pub fn abbreviate(name: &str) -> String {
    name.trim().chars().next().map(String::from).unwrap_or_default()
}
