use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Odd/even week designation. Week one (the week containing the start
/// date) is odd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekParity {
    Odd,
    Even,
}

impl WeekParity {
    pub fn is_even(self) -> bool {
        self == WeekParity::Even
    }
}

/// Parity of the week containing `today`, counted in whole 7-day blocks
/// from `start_date`. Without a start date every week is odd.
///
/// Dates before the start date keep alternating backwards.
pub fn week_parity(today: NaiveDate, start_date: Option<NaiveDate>) -> WeekParity {
    let Some(start) = start_date else {
        return WeekParity::Odd;
    };
    let days = (today - start).num_days();
    if days.div_euclid(7).rem_euclid(2) == 0 {
        WeekParity::Odd
    } else {
        WeekParity::Even
    }
}

/// Days left until `target`, counting today when it is still ahead.
///
/// `0` once the target's midnight has passed; a target of tomorrow reads `1`.
pub fn days_until(now: NaiveDateTime, target: NaiveDate) -> i64 {
    let remaining = target.and_time(chrono::NaiveTime::MIN) - now;
    if remaining < chrono::Duration::zero() {
        0
    } else {
        remaining.num_days() + 1
    }
}
