// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host time.
//!
//! [`HostTime`] is a point on the host's monotonic clock and [`Duration`] a
//! span on the same clock, both counted in nanoseconds. The origin of
//! [`HostTime`] is unspecified; only differences between values taken from
//! the same clock are meaningful.
//!
//! Frame arithmetic ([`Duration::frames_in`], [`Duration::times`]) is done in
//! integers so the crate stays usable without a floating-point runtime.

use core::fmt;
use core::ops::{Add, AddAssign, Sub};

/// A point in time on the host's monotonic clock, in nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// The clock origin.
    pub const ZERO: Self = Self(0);

    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Returns the duration between `self` and an earlier time, or zero if
    /// `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// Adds a duration, clamping at the end of the clock's range.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration.0))
    }

    /// Subtracts a duration, clamping at the clock origin.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, duration: Duration) -> Self {
        Self(self.0.saturating_sub(duration.0))
    }

    /// Checked addition of a duration.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, duration: Duration) -> Option<Self> {
        match self.0.checked_add(duration.0) {
            Some(t) => Some(Self(t)),
            None => None,
        }
    }

    /// Checked subtraction of a duration.
    #[inline]
    #[must_use]
    pub const fn checked_sub(self, duration: Duration) -> Option<Self> {
        match self.0.checked_sub(duration.0) {
            Some(t) => Some(Self(t)),
            None => None,
        }
    }

    /// Milliseconds since the clock origin, for display.
    #[inline]
    #[must_use]
    pub fn as_millis_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign<Duration> for HostTime {
    #[inline]
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs.0;
    }
}

impl Sub<Duration> for HostTime {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Duration) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Sub for HostTime {
    type Output = Duration;

    #[inline]
    fn sub(self, rhs: Self) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTime({})", self.0)
    }
}

/// A span of host time, in nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// A zero-length duration.
    pub const ZERO: Self = Self(0);

    /// The longest representable duration. Used as the "unbounded" marker
    /// for a slide that was never replaced.
    pub const MAX: Self = Self(u64::MAX);

    /// Creates a duration from nanoseconds.
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Creates a duration from microseconds.
    #[inline]
    #[must_use]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros.saturating_mul(1_000))
    }

    /// Creates a duration from milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    /// Creates a duration from whole seconds.
    #[inline]
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1_000_000_000))
    }

    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Returns `true` if this is a zero-length duration.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Saturating addition.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Number of whole `period`s in `self`, rounded to the nearest frame.
    ///
    /// Returns zero when `period` is zero.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u128 intermediate avoids overflow; the quotient fits u64 for any non-zero period"
    )]
    pub const fn frames_in(self, period: Self) -> u64 {
        if period.0 == 0 {
            return 0;
        }
        ((self.0 as u128 + period.0 as u128 / 2) / period.0 as u128) as u64
    }

    /// `self` multiplied by a frame count, clamped at [`Duration::MAX`].
    #[inline]
    #[must_use]
    pub const fn times(self, frames: u64) -> Self {
        Self(self.0.saturating_mul(frames))
    }

    /// Milliseconds, for display.
    #[inline]
    #[must_use]
    pub fn as_millis_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Duration {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::MAX {
            f.write_str("Duration(MAX)")
        } else {
            write!(f, "Duration({})", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD_60HZ: Duration = Duration(16_666_667);

    #[test]
    fn unit_constructors() {
        assert_eq!(Duration::from_millis(5).nanos(), 5_000_000, "ms");
        assert_eq!(Duration::from_micros(250).nanos(), 250_000, "µs");
        assert_eq!(Duration::from_secs(2).nanos(), 2_000_000_000, "s");
        assert_eq!(Duration::from_secs(u64::MAX), Duration::MAX, "saturates");
    }

    #[test]
    fn frames_in_rounds_to_nearest() {
        assert_eq!(Duration::from_millis(1000).frames_in(PERIOD_60HZ), 60);
        assert_eq!(Duration::from_millis(250).frames_in(PERIOD_60HZ), 15);
        assert_eq!(Duration::from_millis(500).frames_in(PERIOD_60HZ), 30);
        // 1.4 frames rounds down, 1.6 frames rounds up.
        assert_eq!(Duration(14).frames_in(Duration(10)), 1, "round down");
        assert_eq!(Duration(16).frames_in(Duration(10)), 2, "round up");
    }

    #[test]
    fn frames_in_zero_period_is_zero() {
        assert_eq!(Duration::from_millis(100).frames_in(Duration::ZERO), 0);
    }

    #[test]
    fn times_saturates() {
        assert_eq!(PERIOD_60HZ.times(3), Duration(50_000_001), "3 frames");
        assert_eq!(PERIOD_60HZ.times(u64::MAX), Duration::MAX, "clamped");
    }

    #[test]
    fn host_time_duration_ops() {
        let t = HostTime(1000);
        let d = Duration(200);
        assert_eq!((t + d).nanos(), 1200);
        assert_eq!((t - d).nanos(), 800);
        assert_eq!(t.saturating_duration_since(HostTime(1500)), Duration::ZERO);
        assert_eq!(t.saturating_duration_since(HostTime(400)), Duration(600));
        assert_eq!(t.saturating_sub(Duration(5000)), HostTime::ZERO, "clamped");
        assert_eq!(HostTime(u64::MAX).checked_add(d), None, "overflow");
    }

    #[test]
    fn max_debug_is_readable() {
        assert_eq!(alloc::format!("{:?}", Duration::MAX), "Duration(MAX)");
    }
}
