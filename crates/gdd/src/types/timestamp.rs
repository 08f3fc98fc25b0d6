// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Seconds + nanoseconds time stamp attached to every descriptor.

use std::fmt;
use std::ops::{Add, Sub};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const NSEC_PER_SEC: u32 = 1_000_000_000;

/// Time stamp relative to the Unix epoch.
///
/// `nsec` is always below one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TimeStamp {
    sec: u64,
    nsec: u32,
}

impl TimeStamp {
    /// Build a stamp, carrying excess nanoseconds into seconds.
    pub fn new(sec: u64, nsec: u32) -> Self {
        Self {
            sec: sec.saturating_add(u64::from(nsec / NSEC_PER_SEC)),
            nsec: nsec % NSEC_PER_SEC,
        }
    }

    pub fn now() -> Self {
        SystemTime::now().into()
    }

    pub fn sec(&self) -> u64 {
        self.sec
    }

    pub fn nsec(&self) -> u32 {
        self.nsec
    }

    /// Non-negative floating point seconds; negative input clamps to 0.
    pub fn from_secs_f64(secs: f64) -> Self {
        if !(secs > 0.0) {
            return Self::default();
        }
        let whole = secs.trunc();
        let frac = ((secs - whole) * f64::from(NSEC_PER_SEC)).round() as u32;
        Self::new(whole as u64, frac)
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.sec as f64 + f64::from(self.nsec) / f64::from(NSEC_PER_SEC)
    }

    pub fn as_duration(&self) -> Duration {
        Duration::new(self.sec, self.nsec)
    }
}

impl From<SystemTime> for TimeStamp {
    fn from(time: SystemTime) -> Self {
        let since = time.duration_since(UNIX_EPOCH).unwrap_or_default();
        Self::new(since.as_secs(), since.subsec_nanos())
    }
}

impl From<TimeStamp> for SystemTime {
    fn from(stamp: TimeStamp) -> Self {
        UNIX_EPOCH + stamp.as_duration()
    }
}

impl From<Duration> for TimeStamp {
    fn from(d: Duration) -> Self {
        Self::new(d.as_secs(), d.subsec_nanos())
    }
}

impl Add<Duration> for TimeStamp {
    type Output = TimeStamp;

    fn add(self, rhs: Duration) -> TimeStamp {
        self.as_duration().saturating_add(rhs).into()
    }
}

impl Sub<Duration> for TimeStamp {
    type Output = TimeStamp;

    fn sub(self, rhs: Duration) -> TimeStamp {
        self.as_duration().saturating_sub(rhs).into()
    }
}

impl Sub for TimeStamp {
    type Output = Duration;

    /// Elapsed time between two stamps; zero when `rhs` is later.
    fn sub(self, rhs: TimeStamp) -> Duration {
        self.as_duration().saturating_sub(rhs.as_duration())
    }
}

impl fmt::Display for TimeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.sec, self.nsec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_nanoseconds() {
        let ts = TimeStamp::new(1, 2_500_000_000);
        assert_eq!(ts.sec(), 3);
        assert_eq!(ts.nsec(), 500_000_000);
    }

    #[test]
    fn test_arithmetic() {
        let ts = TimeStamp::new(10, 900_000_000);
        let later = ts + Duration::from_millis(200);
        assert_eq!(later, TimeStamp::new(11, 100_000_000));
        assert_eq!(later - ts, Duration::from_millis(200));
        assert_eq!(ts - later, Duration::ZERO);
        assert_eq!(later - Duration::from_secs(100), TimeStamp::default());
    }

    #[test]
    fn test_float_seconds() {
        let ts = TimeStamp::from_secs_f64(12.25);
        assert_eq!(ts, TimeStamp::new(12, 250_000_000));
        assert_eq!(ts.as_secs_f64(), 12.25);
        assert_eq!(TimeStamp::from_secs_f64(-3.0), TimeStamp::default());
    }

    #[test]
    fn test_system_time_round_trip() {
        let ts = TimeStamp::new(1_700_000_000, 123);
        let st: SystemTime = ts.into();
        assert_eq!(TimeStamp::from(st), ts);
        assert_eq!(ts.to_string(), "1700000000.000000123");
    }
}
