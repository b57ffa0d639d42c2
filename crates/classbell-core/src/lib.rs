//! # Classbell Core Library
//!
//! Timetable engine for a school day. Given a schedule document, the
//! override state, and the current time it answers what is happening now,
//! what comes next, and how long until the next transition. A standalone
//! CLI binary drives it; any UI is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Schedule**: typed schedule documents and lesson slots
//! - **Timeline**: resolves periods and segments onto a date
//! - **Activity**: locates `now` on the day and derives countdowns
//! - **Notification**: edge-triggered bells, once per transition
//! - **Overrides**: week parity, weekday substitution, full-schedule override
//! - **Storage**: TOML configuration and named JSON schedule documents
//!
//! ## Key Components
//!
//! - [`ClassBell`]: per-second tick pipeline with an injected [`Clock`]
//! - [`TimelineResolver`]: sorted, validated timeline for a weekday
//! - [`ActivityEngine`]: current activity state
//! - [`NotificationScheduler`]: bell decisions
//! - [`OverrideManager`]: temporary overrides with crash-safe restore
//! - [`Config`]: application configuration management

pub mod activity;
pub mod bell;
pub mod clock;
pub mod context;
pub mod error;
pub mod events;
pub mod notification;
pub mod overrides;
pub mod schedule;
pub mod storage;
pub mod timeline;

pub use activity::{ActivityEngine, ActivityKind, ActivityState, ClassState, Countdown, CountdownCalculator, CountdownPhase};
pub use bell::{next_tick_delay, ClassBell, TickOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{ContextSnapshot, Extensions};
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use events::Event;
pub use notification::{Notification, NotificationKind, NotificationScheduler, NotificationSink};
pub use overrides::{days_until, week_parity, OverrideManager, TemporaryOverride, WeekParity};
pub use schedule::ScheduleDocument;
pub use storage::{Config, FsScheduleStore, MemoryScheduleStore, ScheduleStore};
pub use timeline::{ResolvedDay, TimelineResolver};
