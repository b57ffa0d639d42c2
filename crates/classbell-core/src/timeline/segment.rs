use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Whether a segment is taught time or free time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// `a`-prefixed: a lesson is held.
    Active,
    /// `f`-prefixed: break inside or after the period.
    Free,
}

impl SegmentKind {
    pub fn prefix(self) -> char {
        match self {
            SegmentKind::Active => 'a',
            SegmentKind::Free => 'f',
        }
    }
}

/// A parsed segment id such as `a01` or `f3`.
///
/// The body is the owning period id followed by an ordinal suffix
/// (possibly empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentId {
    pub kind: SegmentKind,
    pub body: String,
}

impl SegmentId {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let mut chars = raw.chars();
        let kind = match chars.next() {
            Some('a') => SegmentKind::Active,
            Some('f') => SegmentKind::Free,
            _ => return Err(ValidationError::MalformedSegment(raw.to_string())),
        };
        let body = chars.as_str();
        if body.is_empty() {
            return Err(ValidationError::MalformedSegment(raw.to_string()));
        }
        Ok(Self {
            kind,
            body: body.to_string(),
        })
    }

    /// Whether this segment belongs to the period `part_id`.
    pub fn matches_part(&self, part_id: &str) -> bool {
        !part_id.is_empty() && self.body.starts_with(part_id)
    }

    /// Pick the owning period among `part_ids`.
    ///
    /// Several ids can prefix the same body (`1` and `10` both prefix
    /// `101`); the longest one wins.
    pub fn owner<'a, I>(&self, part_ids: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        part_ids
            .into_iter()
            .filter(|id| self.matches_part(id))
            .max_by_key(|id| id.len())
    }
}
