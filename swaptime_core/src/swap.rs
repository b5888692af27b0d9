// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Buffer-swap telemetry.
//!
//! A swap source publishes a [`SwapSample`] after every completed buffer swap:
//! the running swap count and the host time the swap returned, written
//! together so readers never see a count from one swap paired with the time
//! of another.
//!
//! Consumers keep their own [`SwapCursor`] to ask "has a swap happened since I
//! last looked?" without interfering with other consumers.
//!
//! [`SwapHistory`] keeps a short ring of swap intervals for period estimates.

use crate::time::{Duration, HostTime};

/// One published swap observation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SwapSample {
    /// Number of swaps completed since the source was created.
    pub count: u64,
    /// Host time at which swap number `count` returned. Meaningless while
    /// `count == 0`.
    pub timestamp: HostTime,
}

impl SwapSample {
    /// Returns the sample that follows this one for a swap completed at `at`.
    #[inline]
    #[must_use]
    pub const fn next(self, at: HostTime) -> Self {
        Self {
            count: self.count + 1,
            timestamp: at,
        }
    }
}

/// Per-consumer edge detector over a swap counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SwapCursor {
    seen: u64,
}

impl SwapCursor {
    /// Creates a cursor that treats `count` as already observed.
    #[inline]
    #[must_use]
    pub const fn at(count: u64) -> Self {
        Self { seen: count }
    }

    /// Returns `true` if `count` moved past what this cursor last saw, and
    /// records it. Several swaps between checks still report a single `true`.
    #[inline]
    pub fn advance(&mut self, count: u64) -> bool {
        if count != self.seen {
            self.seen = count;
            true
        } else {
            false
        }
    }

    /// The last swap count this cursor observed.
    #[inline]
    #[must_use]
    pub const fn seen(self) -> u64 {
        self.seen
    }
}

/// Rolling history of the last `N` swap intervals.
#[derive(Clone, Debug)]
pub struct SwapHistory<const N: usize> {
    intervals: [Duration; N],
    cursor: usize,
    filled: usize,
    last: Option<HostTime>,
}

impl<const N: usize> Default for SwapHistory<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SwapHistory<N> {
    /// Creates an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            intervals: [Duration::ZERO; N],
            cursor: 0,
            filled: 0,
            last: None,
        }
    }

    /// Records a swap that returned at `at`.
    pub fn observe(&mut self, at: HostTime) {
        if let Some(prev) = self.last {
            self.intervals[self.cursor % N] = at.saturating_duration_since(prev);
            self.cursor = (self.cursor + 1) % N;
            self.filled = (self.filled + 1).min(N);
        }
        self.last = Some(at);
    }

    /// Forgets all recorded swaps.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Interval between the two most recent swaps.
    #[must_use]
    pub fn last_period(&self) -> Option<Duration> {
        if self.filled == 0 {
            return None;
        }
        Some(self.intervals[(self.cursor + N - 1) % N])
    }

    /// Mean of the recorded intervals.
    #[must_use]
    pub fn typical_period(&self) -> Option<Duration> {
        if self.filled == 0 {
            return None;
        }
        let start = (self.cursor + N - self.filled) % N;
        let mut sum: u128 = 0;
        let mut i = 0;
        while i < self.filled {
            sum += u128::from(self.intervals[(start + i) % N].nanos());
            i += 1;
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "mean of u64 values fits u64"
        )]
        let mean = (sum / self.filled as u128) as u64;
        Some(Duration(mean))
    }

    /// Number of intervals currently held.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.filled
    }

    /// Returns `true` if fewer than two swaps have been observed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.filled == 0
    }
}
