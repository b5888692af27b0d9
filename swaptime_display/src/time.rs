// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host clock reads.
//!
//! On unix this is `CLOCK_MONOTONIC`; elsewhere it is a process-local
//! [`Instant`](std::time::Instant) epoch. Either way the values are
//! nanoseconds and only differences are meaningful.

use swaptime_core::time::{Duration, HostTime};

/// Returns the current monotonic host time in nanoseconds.
#[must_use]
pub fn now() -> HostTime {
    imp::now()
}

/// Sleeps the calling thread until `deadline` (or returns at once if it has
/// passed).
pub fn sleep_until(deadline: HostTime) {
    let remaining = deadline.saturating_duration_since(now());
    if !remaining.is_zero() {
        std::thread::sleep(to_std(remaining));
    }
}

/// Converts to a standard library duration.
#[must_use]
pub fn to_std(d: Duration) -> std::time::Duration {
    std::time::Duration::from_nanos(d.nanos())
}

#[cfg(unix)]
mod imp {
    use rustix::time::{ClockId, Timespec, clock_gettime};
    use swaptime_core::time::HostTime;

    const NANOS_PER_SECOND: u128 = 1_000_000_000;

    pub(super) fn now() -> HostTime {
        timespec_to_host_time(clock_gettime(ClockId::Monotonic))
    }

    pub(super) fn timespec_to_host_time(timespec: Timespec) -> HostTime {
        let seconds = u64::try_from(timespec.tv_sec).unwrap_or(0);
        let nanos = u64::try_from(timespec.tv_nsec)
            .unwrap_or(0)
            .min(999_999_999);

        let ticks = u128::from(seconds)
            .saturating_mul(NANOS_PER_SECOND)
            .saturating_add(u128::from(nanos));
        HostTime(u64::try_from(ticks).unwrap_or(u64::MAX))
    }
}

#[cfg(not(unix))]
mod imp {
    use std::sync::OnceLock;
    use std::time::Instant;

    use swaptime_core::time::HostTime;

    static EPOCH: OnceLock<Instant> = OnceLock::new();

    pub(super) fn now() -> HostTime {
        let epoch = EPOCH.get_or_init(Instant::now);
        HostTime(u64::try_from(epoch.elapsed().as_nanos()).unwrap_or(u64::MAX))
    }
}
