//! Wall-clock access and arithmetic for the quarter-hour display grid.

use chrono::{DateTime, TimeZone, Timelike, Utc};
use std::sync::Mutex;

/// Minutes covered by a full scrub in one direction.
pub const MINUTES_IN_12_HOURS: i64 = 720;

/// Returns the signed number of minutes to add to `minute` to land on the
/// nearest quarter-hour boundary ({0, 15, 30, 45}).
///
/// Ties resolve toward the later boundary, so the delta is always in
/// `-7..=7`. The caller is expected to apply the delta with full date
/// arithmetic so that `:59 -> +1` rolls the hour over correctly.
pub fn round_to_quarter_hour(minute: u32) -> i64 {
    let rem = (minute % 15) as i64;
    if rem < 8 {
        -rem
    } else {
        15 - rem
    }
}

/// Zeroes the seconds and sub-seconds of a timestamp.
pub fn truncate_to_minute<Z: TimeZone>(dt: DateTime<Z>) -> DateTime<Z> {
    dt.clone()
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(dt)
}

/// The controller's single source of real time.
///
/// Production hosts use [`SystemClock`]; tests and simulations swap in a
/// [`FixedClock`] so that polling and scrub arithmetic stay deterministic.
pub trait WallClock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

impl<W: WallClock + ?Sized> WallClock for std::sync::Arc<W> {
    fn now_utc(&self) -> DateTime<Utc> {
        (**self).now_utc()
    }
}

/// Reads the operating-system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A settable clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self(Mutex::new(instant))
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = instant;
    }
}

impl WallClock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}
