// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display timing service.

use kurbo::{Rect, Size};
use log::{debug, error, info, warn};
use swaptime_core::display::{Display, Orientation, RenderTarget, clamp_copy_region};
use swaptime_core::swap::{SwapCursor, SwapSample};
use swaptime_core::time::{Duration, HostTime};

use crate::backend::Backend;
use crate::swap_clock::{SwapBuffers, SwapClock};
use crate::time::now;

/// Startup behaviour of a [`TimedDisplay`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Blocking swaps thrown away before measuring. The first swaps after a
    /// context is created often return early.
    pub warmup_swaps: u32,
    /// How long the startup frame-period estimate samples swaps.
    pub initial_estimate: Duration,
}

impl DisplayConfig {
    /// A quick, less precise startup.
    #[must_use]
    pub const fn quick() -> Self {
        Self {
            warmup_swaps: 1,
            initial_estimate: Duration::from_millis(100),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            warmup_swaps: 5,
            initial_estimate: Duration::from_millis(500),
        }
    }
}

/// Swap-synchronized display over a rendering [`Backend`].
///
/// Combines the backend with a [`SwapClock`] for background swaps. Manual
/// blocking swaps run on the calling thread and are counted separately; the
/// frame number is the sum of both.
pub struct TimedDisplay<B: Backend> {
    backend: B,
    clock: SwapClock<B::Swapper>,
    cursor: SwapCursor,
    manual_swaps: u64,
    last_manual_swap: HostTime,
    frame_period: Duration,
}

impl<B: Backend> std::fmt::Debug for TimedDisplay<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedDisplay")
            .field("clock", &self.clock)
            .field("manual_swaps", &self.manual_swaps)
            .field("frame_period", &self.frame_period)
            .finish_non_exhaustive()
    }
}

impl<B: Backend> TimedDisplay<B> {
    /// Wraps `backend`, warms up the swap chain and measures the frame
    /// period.
    pub fn new(backend: B, config: DisplayConfig) -> Self {
        let mut display = Self::with_frame_period(backend, Duration::ZERO);
        for _ in 0..config.warmup_swaps {
            display.blocking_swap();
        }
        display.estimate_frame_period(config.initial_estimate);
        display
    }

    /// Wraps `backend` with a known frame period, skipping measurement.
    #[must_use]
    pub fn with_frame_period(backend: B, frame_period: Duration) -> Self {
        let clock = SwapClock::new(backend.swapper());
        Self {
            backend,
            clock,
            cursor: SwapCursor::default(),
            manual_swaps: 0,
            last_manual_swap: HostTime::ZERO,
            frame_period,
        }
    }

    /// Measures the frame period by swapping back to back for `duration`.
    ///
    /// Auto-swap is paused for the measurement and restored afterwards. If
    /// fewer than two swaps fit in `duration`, the previous estimate is kept.
    pub fn estimate_frame_period(&mut self, duration: Duration) -> Duration {
        let was_auto = self.clock.is_auto_swapping();
        if was_auto {
            self.clock.set_auto_swap(false);
        }

        self.blocking_swap();
        let first = self.last_manual_swap;
        let mut intervals: u64 = 0;
        while self.last_manual_swap.saturating_duration_since(first) < duration {
            self.blocking_swap();
            intervals += 1;
        }

        if intervals == 0 {
            warn!("frame period estimate over {duration:?} saw fewer than two swaps; keeping {:?}", self.frame_period);
        } else {
            let total = self.last_manual_swap.saturating_duration_since(first);
            self.frame_period = Duration(total.nanos() / intervals);
            info!(
                "frame period estimated at {:.3} ms from {intervals} swaps",
                self.frame_period.as_millis_f64()
            );
        }

        if was_auto {
            self.clock.set_auto_swap(true);
        }
        self.frame_period
    }

    /// Overrides the frame period estimate.
    pub fn set_frame_period(&mut self, period: Duration) {
        self.frame_period = period;
    }

    /// The background swap clock.
    #[must_use]
    pub fn swap_clock(&self) -> &SwapClock<B::Swapper> {
        &self.clock
    }

    /// Mean of recent background swap intervals, if auto-swap has run.
    #[must_use]
    pub fn typical_swap_period(&self) -> Option<Duration> {
        self.clock.typical_swap_period()
    }

    /// The rendering backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the rendering backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Orientation of the presentation surface.
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.backend.orientation()
    }
}

impl<B: Backend> Display for TimedDisplay<B> {
    type Canvas = B::Canvas;
    type Surface = B::Surface;
    type Fence = B::Fence;

    fn now(&self) -> HostTime {
        now()
    }

    fn frame_period(&self) -> Duration {
        self.frame_period
    }

    fn latest_swap(&self) -> SwapSample {
        // One read of the clock; count and timestamp describe the same swap.
        let sample = self.clock.latest();
        SwapSample {
            count: sample.count + self.manual_swaps,
            timestamp: sample.timestamp.max(self.last_manual_swap),
        }
    }

    fn has_swapped_since_last_check(&mut self) -> bool {
        let frame = self.latest_swap().count;
        self.cursor.advance(frame)
    }

    fn is_auto_swapping(&self) -> bool {
        self.clock.is_auto_swapping()
    }

    fn set_auto_swap(&mut self, enabled: bool) {
        self.clock.set_auto_swap(enabled);
    }

    fn blocking_swap(&mut self) {
        if self.clock.is_auto_swapping() {
            debug!("blocking swap skipped while auto-swapping");
            return;
        }
        self.clock.swapper().swap_buffers();
        self.last_manual_swap = now();
        self.manual_swaps += 1;
    }

    fn request_swaps(&mut self, n: u32) {
        self.clock.request_swaps(n);
    }

    fn wait_for_gpu(&mut self) {
        self.backend.finish();
    }

    fn resolution(&self) -> Size {
        self.backend.resolution()
    }

    fn allocate_surface(&mut self) -> B::Surface {
        let size = self.backend.resolution();
        self.backend.create_surface(size)
    }

    fn release_surface(&mut self, surface: B::Surface) {
        self.backend.destroy_surface(surface);
    }

    fn begin_render_to_target(&mut self, target: RenderTarget<'_, B::Surface>) {
        self.backend.bind(target);
    }

    fn canvas(&mut self) -> &mut B::Canvas {
        self.backend.canvas()
    }

    fn end_render_to_target(&mut self) {
        self.backend.flush();
        self.backend.bind(RenderTarget::BackBuffer);
    }

    fn copy_surface_to_back_buffer(
        &mut self,
        surface: &B::Surface,
        source: Option<Rect>,
        dest: Option<Rect>,
    ) {
        let orientation = self.backend.orientation();
        if orientation.is_portrait() {
            error!("copy to back buffer skipped: {orientation:?} orientation is not supported");
            return;
        }
        let (source, dest) = clamp_copy_region(
            self.backend.surface_size(surface),
            self.backend.resolution(),
            source,
            dest,
        );
        if source.is_zero_area() {
            debug!("copy to back buffer skipped: empty region");
            return;
        }
        self.backend.bind(RenderTarget::BackBuffer);
        self.backend
            .blit(surface, source, dest, orientation == Orientation::LandscapeInverted);
    }

    fn supports_fences(&self) -> bool {
        self.backend.supports_fences()
    }

    fn insert_fence(&mut self) -> Option<B::Fence> {
        self.backend.insert_fence()
    }
}
