// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A display on a manually advanced clock.

use std::cell::Cell;
use std::rc::Rc;

use kurbo::{Rect, Size};
use log::trace;
use swaptime_core::display::{Display, Fence, RenderTarget};
use swaptime_core::swap::{SwapCursor, SwapSample};
use swaptime_core::time::{Duration, HostTime};

/// Settings for a [`VirtualDisplay`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VirtualConfig {
    /// Exact refresh period. Refreshes happen at every multiple of it.
    pub period: Duration,
    /// Back-buffer size.
    pub resolution: Size,
    /// Delay between inserting a fence and it signaling. `None` disables
    /// fences.
    pub gpu_latency: Option<Duration>,
}

impl VirtualConfig {
    /// A 60 Hz display whose GPU finishes instantly.
    pub const SIXTY_HZ: Self = Self {
        period: Duration(16_666_667),
        resolution: Size::new(640.0, 480.0),
        gpu_latency: Some(Duration::ZERO),
    };
}

impl Default for VirtualConfig {
    fn default() -> Self {
        Self::SIXTY_HZ
    }
}

/// What a canvas currently shows: the label of the last draw.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VirtualCanvas {
    /// Label of the last thing drawn.
    pub content: Option<String>,
    /// Number of draws.
    pub draws: u32,
}

impl VirtualCanvas {
    /// Replaces the canvas content with `label`.
    pub fn draw(&mut self, label: impl Into<String>) {
        self.content = Some(label.into());
        self.draws += 1;
    }
}

/// Handle to a [`VirtualDisplay`] surface.
#[derive(Debug, PartialEq, Eq)]
pub struct VirtualSurface(usize);

/// Fence that signals a fixed time after insertion.
#[derive(Debug)]
pub struct VirtualFence {
    clock: Rc<Cell<HostTime>>,
    ready_at: HostTime,
}

impl Fence for VirtualFence {
    fn poll_ready(&mut self) -> bool {
        self.clock.get() >= self.ready_at
    }
}

/// A change of what is on screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShownFrame {
    /// Frame number of the swap.
    pub frame: u64,
    /// Host time of the swap.
    pub at: HostTime,
    /// Label now on screen.
    pub content: Option<String>,
}

/// A [`Display`] whose clock only moves when told to.
///
/// Refreshes happen at exact multiples of the period. With auto-swap on,
/// every refresh passed by [`advance`](Self::advance) swaps; otherwise only
/// requested swaps do. Blocking swaps jump the clock to the next refresh.
#[derive(Debug)]
pub struct VirtualDisplay {
    config: VirtualConfig,
    clock: Rc<Cell<HostTime>>,
    next_refresh: HostTime,
    latest: SwapSample,
    cursor: SwapCursor,
    auto: bool,
    pending: u64,
    back: VirtualCanvas,
    surfaces: Vec<Option<VirtualCanvas>>,
    bound: Option<usize>,
    front: Option<String>,
    shown: Vec<ShownFrame>,
    released: usize,
}

impl VirtualDisplay {
    /// A display at time zero, first refresh one period later.
    #[must_use]
    pub fn new(config: VirtualConfig) -> Self {
        Self {
            config,
            clock: Rc::new(Cell::new(HostTime::ZERO)),
            next_refresh: HostTime::ZERO + config.period,
            latest: SwapSample::default(),
            cursor: SwapCursor::default(),
            auto: false,
            pending: 0,
            back: VirtualCanvas::default(),
            surfaces: Vec::new(),
            bound: None,
            front: None,
            shown: Vec::new(),
            released: 0,
        }
    }

    /// Moves the clock forward by `dt`, swapping at each refresh on the way
    /// if auto-swapping or a swap was requested.
    pub fn advance(&mut self, dt: Duration) {
        let target = self.clock.get() + dt;
        while self.next_refresh <= target {
            self.clock.set(self.next_refresh);
            if self.auto {
                self.swap_now();
            } else if self.pending > 0 {
                self.pending -= 1;
                self.swap_now();
            }
            self.next_refresh += self.config.period;
        }
        self.clock.set(target);
    }

    /// Moves the clock forward to `t` (no-op if already past).
    pub fn advance_to(&mut self, t: HostTime) {
        let dt = t.saturating_duration_since(self.clock.get());
        self.advance(dt);
    }

    fn swap_now(&mut self) {
        self.latest = self.latest.next(self.clock.get());
        if self.front != self.back.content {
            self.front.clone_from(&self.back.content);
            self.shown.push(ShownFrame {
                frame: self.latest.count,
                at: self.latest.timestamp,
                content: self.front.clone(),
            });
        }
        trace!("virtual swap {} at {:?}", self.latest.count, self.latest.timestamp);
    }

    /// Every change of on-screen content so far.
    #[must_use]
    pub fn shown(&self) -> &[ShownFrame] {
        &self.shown
    }

    /// The back buffer.
    #[must_use]
    pub fn back_buffer(&self) -> &VirtualCanvas {
        &self.back
    }

    /// Surfaces released so far.
    #[must_use]
    pub fn released_surfaces(&self) -> usize {
        self.released
    }

    /// Surfaces currently allocated.
    #[must_use]
    pub fn live_surfaces(&self) -> usize {
        self.surfaces.iter().filter(|s| s.is_some()).count()
    }
}

impl Display for VirtualDisplay {
    type Canvas = VirtualCanvas;
    type Surface = VirtualSurface;
    type Fence = VirtualFence;

    fn now(&self) -> HostTime {
        self.clock.get()
    }

    fn frame_period(&self) -> Duration {
        self.config.period
    }

    fn latest_swap(&self) -> SwapSample {
        self.latest
    }

    fn has_swapped_since_last_check(&mut self) -> bool {
        self.cursor.advance(self.latest.count)
    }

    fn is_auto_swapping(&self) -> bool {
        self.auto
    }

    fn set_auto_swap(&mut self, enabled: bool) {
        self.auto = enabled;
        if !enabled {
            self.pending = 0;
        }
    }

    fn blocking_swap(&mut self) {
        if self.auto {
            return;
        }
        self.clock.set(self.next_refresh);
        self.swap_now();
        self.next_refresh += self.config.period;
    }

    fn request_swaps(&mut self, n: u32) {
        self.pending += u64::from(n);
    }

    fn wait_for_gpu(&mut self) {}

    fn resolution(&self) -> Size {
        self.config.resolution
    }

    fn allocate_surface(&mut self) -> VirtualSurface {
        self.surfaces.push(Some(VirtualCanvas::default()));
        VirtualSurface(self.surfaces.len() - 1)
    }

    fn release_surface(&mut self, surface: VirtualSurface) {
        if let Some(slot) = self.surfaces.get_mut(surface.0) {
            *slot = None;
            self.released += 1;
        }
    }

    fn begin_render_to_target(&mut self, target: RenderTarget<'_, VirtualSurface>) {
        self.bound = match target {
            RenderTarget::BackBuffer => None,
            RenderTarget::Surface(s) => Some(s.0),
        };
    }

    fn canvas(&mut self) -> &mut VirtualCanvas {
        if let Some(i) = self.bound {
            if let Some(Some(canvas)) = self.surfaces.get_mut(i) {
                return canvas;
            }
        }
        &mut self.back
    }

    fn end_render_to_target(&mut self) {
        self.bound = None;
    }

    fn copy_surface_to_back_buffer(
        &mut self,
        surface: &VirtualSurface,
        _source: Option<Rect>,
        _dest: Option<Rect>,
    ) {
        if let Some(Some(canvas)) = self.surfaces.get(surface.0) {
            self.back.content.clone_from(&canvas.content);
            self.back.draws += 1;
        }
    }

    fn supports_fences(&self) -> bool {
        self.config.gpu_latency.is_some()
    }

    fn insert_fence(&mut self) -> Option<VirtualFence> {
        let latency = self.config.gpu_latency?;
        Some(VirtualFence {
            clock: Rc::clone(&self.clock),
            ready_at: self.clock.get() + latency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: Duration = VirtualConfig::SIXTY_HZ.period;

    #[test]
    fn auto_swap_follows_refreshes() {
        let mut d = VirtualDisplay::new(VirtualConfig::default());
        d.advance(P.times(3));
        assert_eq!(d.frame_number(), 0, "no swaps without auto-swap");
        d.set_auto_swap(true);
        d.advance(P.times(2));
        assert_eq!(d.frame_number(), 2, "two refreshes");
        assert_eq!(d.last_swap_time(), HostTime::ZERO + P.times(5), "on the refresh");
        assert!(d.has_swapped_since_last_check(), "edge");
        assert!(!d.has_swapped_since_last_check(), "once");
    }

    #[test]
    fn blocking_swap_jumps_to_the_next_refresh() {
        let mut d = VirtualDisplay::new(VirtualConfig::default());
        d.advance(Duration::from_millis(3));
        d.blocking_swap();
        assert_eq!(d.now(), HostTime::ZERO + P, "first refresh");
        d.blocking_swap();
        assert_eq!(d.now(), HostTime::ZERO + P.times(2), "second refresh");
        assert_eq!(d.frame_number(), 2, "two swaps");
    }

    #[test]
    fn requested_swaps_are_spent_one_per_refresh() {
        let mut d = VirtualDisplay::new(VirtualConfig::default());
        d.request_swaps(2);
        d.advance(P.times(5));
        assert_eq!(d.frame_number(), 2, "only the requested swaps");
    }

    #[test]
    fn fence_signals_after_latency() {
        let mut d = VirtualDisplay::new(VirtualConfig {
            gpu_latency: Some(Duration::from_millis(2)),
            ..VirtualConfig::default()
        });
        let mut fence = d.insert_fence().unwrap();
        assert!(!fence.poll_ready(), "not yet");
        d.advance(Duration::from_millis(2));
        assert!(fence.poll_ready(), "after latency");
    }

    #[test]
    fn swaps_record_screen_changes() {
        let mut d = VirtualDisplay::new(VirtualConfig::default());
        d.set_auto_swap(true);
        d.render_to_target(RenderTarget::BackBuffer, |c| c.draw("a"));
        d.advance(P.times(2));
        let s = d.allocate_surface();
        d.render_to_target(RenderTarget::Surface(&s), |c| c.draw("b"));
        d.copy_surface_to_back_buffer(&s, None, None);
        d.advance(P);
        let labels: Vec<_> = d.shown().iter().map(|f| f.content.as_deref()).collect();
        assert_eq!(labels, [Some("a"), Some("b")], "one entry per change");
        assert_eq!(d.shown()[1].frame, 3, "b shown by the third swap");
    }
}
