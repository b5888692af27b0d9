// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stepping a presenter along a virtual clock.

use log::warn;
use swaptime_core::display::Display;
use swaptime_core::presenter::SlidePresenter;
use swaptime_core::time::{Duration, HostTime};

use crate::virtual_display::VirtualDisplay;

/// Default granularity of simulated `update()` calls.
pub const DEFAULT_STEP: Duration = Duration::from_millis(1);

/// Alternately advances the clock by `step` and calls `update()` until the
/// clock reaches `until`. Stops early if presentation ends.
pub fn run_until(presenter: &mut SlidePresenter<VirtualDisplay>, until: HostTime, step: Duration) {
    while presenter.is_presenting() {
        let Some(display) = presenter.display_mut() else {
            return;
        };
        if display.now() >= until {
            return;
        }
        display.advance(step);
        presenter.update();
    }
}

/// Keeps stepping an idle presenter until no copy fences are outstanding or
/// the clock reaches `until`.
pub fn settle_fences(
    presenter: &mut SlidePresenter<VirtualDisplay>,
    until: HostTime,
    step: Duration,
) {
    while presenter.awaiting_fences() {
        let Some(display) = presenter.display_mut() else {
            return;
        };
        if display.now() >= until {
            return;
        }
        display.advance(step);
        presenter.update();
    }
}

/// Drives presentation to its end, then lets pending copy fences signal.
/// Returns `false` if either was still outstanding after `limit` of virtual
/// time.
pub fn run_to_end(
    presenter: &mut SlidePresenter<VirtualDisplay>,
    step: Duration,
    limit: Duration,
) -> bool {
    let Some(deadline) = presenter.display().map(|d| d.now() + limit) else {
        return false;
    };
    run_until(presenter, deadline, step);
    if presenter.is_presenting() {
        warn!("presentation still running after {limit:?}");
        return false;
    }
    settle_fences(presenter, deadline, step);
    if presenter.awaiting_fences() {
        warn!("copy fences still pending after {limit:?}");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_display::VirtualConfig;
    use swaptime_core::config::PresenterConfig;

    #[test]
    fn run_until_stops_at_the_deadline() {
        let mut p = SlidePresenter::with_display(
            VirtualDisplay::new(VirtualConfig::default()),
            PresenterConfig::multi_core(),
        );
        p.append_by_callback("a", Duration::from_secs(10), |_| {})
            .unwrap();
        p.append_by_callback("b", Duration::from_secs(10), |_| {})
            .unwrap();
        p.start().unwrap();
        run_until(&mut p, HostTime(50_000_000), DEFAULT_STEP);
        assert!(p.is_presenting(), "still on the first slide");
        assert_eq!(p.display().unwrap().now(), HostTime(50_000_000), "clock at deadline");
    }

    #[test]
    fn run_to_end_reports_timeouts() {
        let mut p = SlidePresenter::with_display(
            VirtualDisplay::new(VirtualConfig::default()),
            PresenterConfig::multi_core(),
        );
        p.append_by_callback("a", Duration::from_secs(10), |_| {})
            .unwrap();
        p.append_by_callback("b", Duration::from_secs(10), |_| {})
            .unwrap();
        p.start().unwrap();
        assert!(
            !run_to_end(&mut p, DEFAULT_STEP, Duration::from_secs(1)),
            "ten-second slide cannot finish in one second"
        );
    }
}
