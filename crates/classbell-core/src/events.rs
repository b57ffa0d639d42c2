use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::context::ContextSnapshot;
use crate::notification::{Notification, NotificationKind};

/// Everything the bell reports to the outside world.
/// The CLI prints these as JSON lines; a UI can subscribe to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    Notification {
        kind: NotificationKind,
        /// Sink wire code: end 0, start 1, day end 2, prepare 3.
        code: u8,
        subject: String,
        at: NaiveDateTime,
    },
    StateSnapshot {
        snapshot: ContextSnapshot,
    },
    /// A full-schedule override was reverted at startup.
    OverrideRestored {
        name: String,
        at: NaiveDateTime,
    },
}

impl From<&Notification> for Event {
    fn from(n: &Notification) -> Self {
        Event::Notification {
            kind: n.kind,
            code: n.kind.code(),
            subject: n.subject.clone(),
            at: n.at,
        }
    }
}
