//! Current-activity determination and countdowns.

mod countdown;
mod engine;

pub use countdown::{Countdown, CountdownCalculator, CountdownPhase};
pub use engine::{ActivityEngine, ActivityKind, ActivityState, ClassState, Position};
