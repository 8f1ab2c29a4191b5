// Copyright 2026 the Layerhack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clock values used for frame pacing.
//!
//! Both types count nanoseconds on the backend's monotonic clock. Nothing in
//! this crate reads a clock: callers pass `now` in, which keeps the registry
//! and the pacers deterministic in tests.

use core::fmt;
use core::ops::Add;

const NS_PER_US: u64 = 1_000;
const NS_PER_MS: u64 = 1_000_000;
const NS_PER_S: u64 = 1_000_000_000;

/// An instant on the monotonic clock.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// Time elapsed from `earlier` to `self`; zero if `earlier` is later.
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// `self + span`, clamped to the end of the clock.
    #[must_use]
    pub const fn saturating_add(self, span: Duration) -> Self {
        Self(self.0.saturating_add(span.0))
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        self.saturating_add(rhs)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t+{}ns", self.0)
    }
}

/// A non-negative span of nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// No time at all.
    pub const ZERO: Self = Self(0);

    /// Hack draw delays are reported in microseconds.
    #[must_use]
    pub const fn from_micros(us: u64) -> Self {
        Self(us.saturating_mul(NS_PER_US))
    }

    /// Milliseconds, saturating.
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms.saturating_mul(NS_PER_MS))
    }

    /// Whole seconds, saturating.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(NS_PER_S))
    }

    /// Seconds as a float, for rate math.
    #[must_use]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NS_PER_S as f64
    }

    /// `(whole seconds, leftover nanoseconds)`, the shape of a `timespec`.
    #[must_use]
    pub const fn split_secs(self) -> (u64, u32) {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "a remainder modulo 1e9 fits in u32"
        )]
        let nanos = (self.0 % NS_PER_S) as u32;
        (self.0 / NS_PER_S, nanos)
    }

    /// The shorter of the two spans.
    #[must_use]
    pub const fn min(self, other: Self) -> Self {
        if other.0 < self.0 { other } else { self }
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (secs, nanos) = self.split_secs();
        write!(f, "{secs}.{nanos:09}s")
    }
}

#[cfg(test)]
mod tests {
    use super::{Duration, HostTime};

    #[test]
    fn draw_delay_in_microseconds() {
        assert_eq!(Duration::from_micros(16_000), Duration::from_millis(16));
        assert_eq!(Duration::from_millis(3_000), Duration::from_secs(3));
        assert_eq!(Duration::from_secs(u64::MAX), Duration(u64::MAX), "saturates");
    }

    #[test]
    fn deadline_arithmetic_never_wraps() {
        let start = HostTime(1_000);
        assert_eq!(start + Duration(250), HostTime(1_250));
        assert_eq!(HostTime(u64::MAX) + Duration(1), HostTime(u64::MAX));
        assert_eq!(start.saturating_duration_since(HostTime(400)), Duration(600));
        assert_eq!(
            start.saturating_duration_since(HostTime(9_000)),
            Duration::ZERO,
            "deadline already passed"
        );
    }

    #[test]
    fn timespec_split_and_debug() {
        let span = Duration::from_millis(2_250);
        assert_eq!(span.split_secs(), (2, 250_000_000));
        assert_eq!(format!("{span:?}"), "2.250000000s");
        assert_eq!(Duration(7).min(Duration(3)), Duration(3));
    }
}
