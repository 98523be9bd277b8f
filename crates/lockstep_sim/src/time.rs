//! Simulated time with picosecond resolution.
//!
//! [`SimTime`] is the engine's only notion of time. It is carried on the
//! paused Tokio clock of the scenario runtime: one simulated picosecond is one
//! virtual millisecond of that clock, which is the finest step the runtime's
//! timer wheel can express. [`Timebase`] converts the runtime clock back into
//! simulated time for diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;
use std::time::Duration;

/// Picoseconds per nanosecond.
pub const PS_PER_NS: u64 = 1_000;
/// Picoseconds per microsecond.
pub const PS_PER_US: u64 = 1_000_000;
/// Picoseconds per millisecond.
pub const PS_PER_MS: u64 = 1_000_000_000;

/// A point in (or span of) simulated time, in picoseconds.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SimTime {
    /// Simulated time in picoseconds.
    pub ps: u64,
}

impl SimTime {
    /// Time zero.
    pub fn zero() -> Self {
        Self { ps: 0 }
    }

    /// Creates a time from a picosecond value.
    pub fn from_ps(ps: u64) -> Self {
        Self { ps }
    }

    /// Creates a time from a nanosecond value.
    pub fn from_ns(ns: u64) -> Self {
        Self { ps: ns * PS_PER_NS }
    }

    /// Converts to nanoseconds (truncated).
    pub fn to_ns(&self) -> u64 {
        self.ps / PS_PER_NS
    }

    /// `n` times this span, or `None` past the largest representable time.
    pub fn checked_mul(self, n: u64) -> Option<SimTime> {
        self.ps.checked_mul(n).map(SimTime::from_ps)
    }

    /// Sum of two times, or `None` past the largest representable time.
    pub fn checked_add(self, rhs: SimTime) -> Option<SimTime> {
        self.ps.checked_add(rhs.ps).map(SimTime::from_ps)
    }

    /// Subtraction clamped at zero.
    pub fn saturating_sub(self, rhs: SimTime) -> SimTime {
        SimTime::from_ps(self.ps.saturating_sub(rhs.ps))
    }

    /// Duration on the runtime's virtual clock covering this span.
    pub fn to_runtime(self) -> Duration {
        Duration::from_millis(self.ps)
    }

    /// Inverse of [`to_runtime`](Self::to_runtime); sub-millisecond remainders
    /// are dropped.
    pub fn from_runtime(elapsed: Duration) -> Self {
        Self::from_ps(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Saturates at the largest representable time; use
/// [`SimTime::checked_add`] where overflow must be reported.
impl Add for SimTime {
    type Output = SimTime;

    fn add(self, rhs: SimTime) -> SimTime {
        SimTime::from_ps(self.ps.saturating_add(rhs.ps))
    }
}

impl Sub for SimTime {
    type Output = SimTime;

    fn sub(self, rhs: SimTime) -> SimTime {
        SimTime::from_ps(self.ps - rhs.ps)
    }
}

/// Saturates at the largest representable time; use
/// [`SimTime::checked_mul`] where overflow must be reported.
impl Mul<u64> for SimTime {
    type Output = SimTime;

    fn mul(self, rhs: u64) -> SimTime {
        SimTime::from_ps(self.ps.saturating_mul(rhs))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ps = self.ps;
        if ps == 0 {
            write!(f, "0 ps")
        } else if ps % PS_PER_MS == 0 {
            write!(f, "{} ms", ps / PS_PER_MS)
        } else if ps % PS_PER_US == 0 {
            write!(f, "{} us", ps / PS_PER_US)
        } else if ps % PS_PER_NS == 0 {
            write!(f, "{} ns", ps / PS_PER_NS)
        } else {
            write!(f, "{ps} ps")
        }
    }
}

/// Error returned when a time string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: '{input}'")]
pub struct ParseTimeError {
    /// The input string that failed to parse.
    pub input: String,
}

impl FromStr for SimTime {
    type Err = ParseTimeError;

    /// Parses `"<integer><unit>"` with an optional space, where the unit is
    /// one of `ps`, `ns`, `us`, `ms`. A bare integer is taken as picoseconds.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseTimeError {
            input: s.to_string(),
        };
        let lower = s.to_ascii_lowercase();
        let (digits, scale) = [("ps", 1), ("ns", PS_PER_NS), ("us", PS_PER_US), ("ms", PS_PER_MS)]
            .iter()
            .find_map(|(suffix, scale)| lower.strip_suffix(suffix).map(|d| (d.trim(), *scale)))
            .unwrap_or((lower.as_str(), 1));
        let value: u64 = digits.parse().map_err(|_| err())?;
        value.checked_mul(scale).map(SimTime::from_ps).ok_or_else(err)
    }
}

/// Maps the runtime's virtual clock onto simulated time for one scenario.
///
/// Captured when the scenario runtime starts; every timestamp in a
/// diagnostic is relative to it.
#[derive(Clone, Copy, Debug)]
pub struct Timebase {
    origin: tokio::time::Instant,
}

impl Timebase {
    /// Starts simulated time at the runtime's current instant.
    pub fn start() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }

    /// Current simulated time.
    pub fn now(&self) -> SimTime {
        SimTime::from_runtime(tokio::time::Instant::now().saturating_duration_since(self.origin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_ns() {
        assert_eq!(SimTime::from_ns(10).ps, 10_000);
        assert_eq!(SimTime::from_ns(10).to_ns(), 10);
    }

    #[test]
    fn arithmetic() {
        let period = SimTime::from_ns(1);
        assert_eq!(period * 17, SimTime::from_ns(17));
        assert_eq!(period + SimTime::from_ps(500), SimTime::from_ps(1_500));
        assert_eq!(SimTime::from_ps(5).saturating_sub(period), SimTime::zero());
    }

    #[test]
    fn overflow_is_reported_or_saturates() {
        let period = SimTime::from_ns(1);
        let cycles = (1u64 << 55) + 1;
        assert_eq!(period.checked_mul(cycles), None);
        assert_eq!(period * cycles, SimTime::from_ps(u64::MAX));
        assert_eq!(period.checked_mul(17), Some(SimTime::from_ns(17)));
        let late = SimTime::from_ps(u64::MAX - 1);
        assert_eq!(late.checked_add(period), None);
        assert_eq!(late + period, SimTime::from_ps(u64::MAX));
    }

    #[test]
    fn ordering() {
        assert!(SimTime::from_ps(999) < SimTime::from_ns(1));
    }

    #[test]
    fn display_picks_largest_exact_unit() {
        assert_eq!(SimTime::zero().to_string(), "0 ps");
        assert_eq!(SimTime::from_ps(500).to_string(), "500 ps");
        assert_eq!(SimTime::from_ns(12).to_string(), "12 ns");
        assert_eq!(SimTime::from_ps(1_500).to_string(), "1500 ps");
        assert_eq!(SimTime::from_ns(3_000).to_string(), "3 us");
        assert_eq!(SimTime::from_ps(PS_PER_MS).to_string(), "1 ms");
    }

    #[test]
    fn parse_with_units() {
        assert_eq!("1ns".parse::<SimTime>().unwrap(), SimTime::from_ns(1));
        assert_eq!("500 ps".parse::<SimTime>().unwrap(), SimTime::from_ps(500));
        assert_eq!("50us".parse::<SimTime>().unwrap(), SimTime::from_ns(50_000));
        assert_eq!("2MS".parse::<SimTime>().unwrap().ps, 2 * PS_PER_MS);
        assert_eq!("42".parse::<SimTime>().unwrap(), SimTime::from_ps(42));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("fast".parse::<SimTime>().is_err());
        assert!("1.5ns".parse::<SimTime>().is_err());
        assert!("".parse::<SimTime>().is_err());
    }

    #[test]
    fn runtime_mapping_roundtrip() {
        let t = SimTime::from_ps(1_234);
        assert_eq!(t.to_runtime(), Duration::from_millis(1_234));
        assert_eq!(SimTime::from_runtime(t.to_runtime()), t);
    }

    #[tokio::test(start_paused = true)]
    async fn timebase_tracks_virtual_clock() {
        let tb = Timebase::start();
        tokio::time::sleep(SimTime::from_ns(3).to_runtime()).await;
        assert_eq!(tb.now(), SimTime::from_ns(3));
    }
}
