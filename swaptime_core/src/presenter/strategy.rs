// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Swap strategies: how a slide gets from the back buffer onto the screen.

use alloc::boxed::Box;

use log::warn;

use super::{Flow, Session, SessionState};
use crate::config::SwappingMode;
use crate::display::Display;
use crate::swap::SwapSample;
use crate::time::{Duration, HostTime};

/// Most swaps tried while locking a single-core presentation to the refresh.
const SYNC_SWAP_LIMIT: u32 = 120;

/// A blocking swap that returned this much faster than a full period did
/// not wait for a refresh boundary.
const SYNC_TOLERANCE: Duration = Duration::from_millis(1);

/// One `update()` step of a presentation.
pub(crate) trait SwapStrategy<D: Display> {
    fn update(&mut self, session: &mut Session<D>, display: &mut D);
}

pub(crate) fn for_mode<D: Display>(mode: SwappingMode) -> Box<dyn SwapStrategy<D>> {
    match mode {
        SwappingMode::MultiCore => Box::new(MultiCore),
        SwappingMode::SingleCoreBlocking => Box::new(SingleCoreBlocking::default()),
        SwappingMode::SingleCoreThreaded => Box::new(SingleCoreThreaded::default()),
    }
}

// ---------------------------------------------------------------------------
// Multi-core
// ---------------------------------------------------------------------------

/// Follows the display's background swaps.
#[derive(Debug)]
struct MultiCore;

impl<D: Display> SwapStrategy<D> for MultiCore {
    fn update(&mut self, session: &mut Session<D>, display: &mut D) {
        match session.state {
            SessionState::Idle => return,
            SessionState::Synchronizing => {
                if display.has_swapped_since_last_check() {
                    session.begin_presenting(display);
                }
            }
            SessionState::Presenting => {
                if display.has_swapped_since_last_check() {
                    // Count and onset must come from the same swap.
                    let swap = display.latest_swap();
                    if session.current_awaiting_swap()
                        && session.on_onset(display, swap.timestamp, swap.count) == Flow::Ended
                    {
                        return;
                    }
                    session.advance_if_due(display, swap.count);
                }
            }
        }
        session.wait_sync_check(display);
    }
}

// ---------------------------------------------------------------------------
// Single-core
// ---------------------------------------------------------------------------

/// Maps onset times to frame numbers.
///
/// A blocking swap counts as one frame however many refreshes it waited
/// through, so single-core frame numbers are derived from elapsed time
/// since the first slide's onset.
#[derive(Clone, Copy, Debug, Default)]
struct FrameAnchor {
    origin: Option<(HostTime, u64)>,
}

impl FrameAnchor {
    fn frame_at(&mut self, swap: SwapSample, onset: HostTime, period: Duration) -> u64 {
        match self.origin {
            Some((time, frame)) => frame + onset.saturating_duration_since(time).frames_in(period),
            None => {
                self.origin = Some((onset, swap.count));
                swap.count
            }
        }
    }
}

/// Issues its own blocking swaps from `update()`.
#[derive(Debug, Default)]
struct SingleCoreBlocking {
    hogging_start: HostTime,
    anchor: FrameAnchor,
}

impl SingleCoreBlocking {
    /// Swaps until a swap is seen to block for about a whole period, so the
    /// next one starts right after a refresh.
    fn lock_to_refresh<D: Display>(display: &mut D) {
        let min_wait = display.frame_period().saturating_sub(SYNC_TOLERANCE);
        for _ in 0..SYNC_SWAP_LIMIT {
            let before = display.now();
            display.blocking_swap();
            if display.now().saturating_duration_since(before) >= min_wait {
                return;
            }
        }
        warn!("no swap blocked for a full refresh after {SYNC_SWAP_LIMIT} tries; starting anyway");
    }
}

impl<D: Display> SwapStrategy<D> for SingleCoreBlocking {
    fn update(&mut self, session: &mut Session<D>, display: &mut D) {
        match session.state {
            SessionState::Idle => return,
            SessionState::Synchronizing => {
                Self::lock_to_refresh(display);
                session.begin_presenting(display);
                self.hogging_start = display.now();
            }
            SessionState::Presenting => {
                if session.current_swappable() && display.now() >= self.hogging_start {
                    display.blocking_swap();
                    let onset = display.now();
                    let swap = display.latest_swap();
                    let frame = self.anchor.frame_at(swap, onset, display.frame_period());
                    if session.on_onset(display, onset, frame) == Flow::Ended {
                        return;
                    }
                    if let Some(next) = session.advance(display) {
                        self.hogging_start =
                            next.saturating_sub(session.config.pre_swap_busy_wait);
                    }
                }
            }
        }
        session.wait_sync_check(display);
    }
}

/// Asks the display's background loop for one swap per slide.
#[derive(Debug, Default)]
struct SingleCoreThreaded {
    hogging_start: HostTime,
    anchor: FrameAnchor,
    swap_requested: bool,
}

impl<D: Display> SwapStrategy<D> for SingleCoreThreaded {
    fn update(&mut self, session: &mut Session<D>, display: &mut D) {
        match session.state {
            SessionState::Idle => return,
            SessionState::Synchronizing => {
                if !self.swap_requested {
                    display.request_swaps(1);
                    self.swap_requested = true;
                } else if display.has_swapped_since_last_check() {
                    self.swap_requested = false;
                    session.begin_presenting(display);
                    self.hogging_start = display.now();
                }
            }
            SessionState::Presenting => {
                if self.swap_requested {
                    if display.has_swapped_since_last_check() {
                        self.swap_requested = false;
                        let swap = display.latest_swap();
                        let onset = swap.timestamp;
                        let frame = self.anchor.frame_at(swap, onset, display.frame_period());
                        if session.on_onset(display, onset, frame) == Flow::Ended {
                            return;
                        }
                        if let Some(next) = session.advance(display) {
                            self.hogging_start =
                                next.saturating_sub(session.config.pre_swap_busy_wait);
                        }
                    }
                } else if session.current_swappable() && display.now() >= self.hogging_start {
                    display.request_swaps(1);
                    self.swap_requested = true;
                }
            }
        }
        session.wait_sync_check(display);
    }
}
