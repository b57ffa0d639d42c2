//! Week parity and temporary overrides.

mod manager;
mod week;

pub use manager::{OverrideManager, StartupRestore, TemporaryOverride};
pub use week::{days_until, week_parity, WeekParity};
