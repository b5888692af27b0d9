// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Software backend with a simulated vertical refresh.
//!
//! [`HeadlessBackend`] draws into CPU pixel buffers and swaps by sleeping to
//! the next multiple of the configured refresh period. It needs no window or
//! GPU, which makes it suitable for trial runs and tests.

use std::sync::Arc;

use kurbo::{Rect, Size};
use slab::Slab;
use swaptime_core::display::{Fence, Orientation, RenderTarget};
use swaptime_core::time::{Duration, HostTime};

use crate::backend::Backend;
use crate::swap_clock::SwapBuffers;
use crate::time::{now, sleep_until};

/// Settings for a [`HeadlessBackend`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadlessConfig {
    /// Back-buffer size in pixels.
    pub size: Size,
    /// Simulated refresh period.
    pub refresh: Duration,
    /// Reported orientation.
    pub orientation: Orientation,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            size: Size::new(640.0, 480.0),
            refresh: Duration(16_666_667),
            orientation: Orientation::Landscape,
        }
    }
}

// ---------------------------------------------------------------------------
// PixelCanvas
// ---------------------------------------------------------------------------

/// A CPU pixel buffer, one `u32` per pixel.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelCanvas {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl std::fmt::Debug for PixelCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelCanvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "pixel coordinates are clamped to the buffer before conversion"
)]
fn to_px(v: f64, max: usize) -> usize {
    v.round().clamp(0.0, max as f64) as usize
}

impl PixelCanvas {
    /// A zeroed canvas of `size` pixels.
    #[must_use]
    pub fn new(size: Size) -> Self {
        let width = to_px(size.width, u16::MAX.into());
        let height = to_px(size.height, u16::MAX.into());
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    /// Size in pixels.
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }

    /// Fills the whole canvas.
    pub fn clear(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    /// Fills `rect`, clipped to the canvas.
    pub fn fill_rect(&mut self, rect: Rect, color: u32) {
        let x0 = to_px(rect.x0, self.width);
        let x1 = to_px(rect.x1, self.width);
        let y0 = to_px(rect.y0, self.height);
        let y1 = to_px(rect.y1, self.height);
        if x0 >= x1 {
            return;
        }
        for y in y0..y1 {
            self.pixels[y * self.width + x0..y * self.width + x1].fill(color);
        }
    }

    /// The pixel at `(x, y)`.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    fn set(&mut self, x: usize, y: usize, color: u32) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = color;
        }
    }
}

// ---------------------------------------------------------------------------
// Swapping and fences
// ---------------------------------------------------------------------------

/// Swaps by sleeping to the next refresh boundary.
#[derive(Debug)]
pub struct VsyncTimer {
    epoch: HostTime,
    period: Duration,
}

impl VsyncTimer {
    /// A timer whose boundaries are `period` apart, starting now.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            epoch: now(),
            period,
        }
    }

    /// The first refresh boundary strictly after `t`.
    #[must_use]
    pub fn next_boundary(&self, t: HostTime) -> HostTime {
        if self.period.is_zero() {
            return t;
        }
        let elapsed = t.saturating_duration_since(self.epoch).nanos();
        let k = elapsed / self.period.nanos() + 1;
        self.epoch.saturating_add(self.period.times(k))
    }
}

impl SwapBuffers for VsyncTimer {
    fn swap_buffers(&self) {
        sleep_until(self.next_boundary(now()));
    }
}

/// CPU drawing is complete when the call returns, so this fence is always
/// ready.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateFence;

impl Fence for ImmediateFence {
    fn poll_ready(&mut self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// HeadlessBackend
// ---------------------------------------------------------------------------

/// Handle to a [`HeadlessBackend`] surface. Owned by exactly one slide.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SurfaceId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Bound {
    BackBuffer,
    Surface(usize),
}

/// A [`Backend`] that renders into CPU memory.
#[derive(Debug)]
pub struct HeadlessBackend {
    config: HeadlessConfig,
    back: PixelCanvas,
    surfaces: Slab<PixelCanvas>,
    bound: Bound,
    timer: Arc<VsyncTimer>,
    flushes: u64,
}

impl HeadlessBackend {
    /// Creates a backend with its own refresh timer.
    #[must_use]
    pub fn new(config: HeadlessConfig) -> Self {
        Self {
            back: PixelCanvas::new(config.size),
            surfaces: Slab::new(),
            bound: Bound::BackBuffer,
            timer: Arc::new(VsyncTimer::new(config.refresh)),
            flushes: 0,
            config,
        }
    }

    /// The back buffer.
    #[must_use]
    pub fn back_buffer(&self) -> &PixelCanvas {
        &self.back
    }

    /// Number of live surfaces.
    #[must_use]
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Number of flushes so far.
    #[must_use]
    pub fn flushes(&self) -> u64 {
        self.flushes
    }
}

impl Backend for HeadlessBackend {
    type Canvas = PixelCanvas;
    type Surface = SurfaceId;
    type Fence = ImmediateFence;
    type Swapper = VsyncTimer;

    fn swapper(&self) -> Arc<VsyncTimer> {
        Arc::clone(&self.timer)
    }

    fn resolution(&self) -> Size {
        self.config.size
    }

    fn orientation(&self) -> Orientation {
        self.config.orientation
    }

    fn create_surface(&mut self, size: Size) -> SurfaceId {
        SurfaceId(self.surfaces.insert(PixelCanvas::new(size)))
    }

    fn surface_size(&self, surface: &SurfaceId) -> Size {
        self.surfaces
            .get(surface.0)
            .map_or(Size::ZERO, PixelCanvas::size)
    }

    fn destroy_surface(&mut self, surface: SurfaceId) {
        if self.bound == Bound::Surface(surface.0) {
            self.bound = Bound::BackBuffer;
        }
        self.surfaces.try_remove(surface.0);
    }

    fn bind(&mut self, target: RenderTarget<'_, SurfaceId>) {
        self.bound = match target {
            RenderTarget::BackBuffer => Bound::BackBuffer,
            RenderTarget::Surface(id) if self.surfaces.contains(id.0) => Bound::Surface(id.0),
            RenderTarget::Surface(_) => Bound::BackBuffer,
        };
    }

    fn canvas(&mut self) -> &mut PixelCanvas {
        match self.bound {
            Bound::Surface(key) if self.surfaces.contains(key) => &mut self.surfaces[key],
            _ => &mut self.back,
        }
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }

    fn finish(&mut self) {}

    fn blit(&mut self, surface: &SurfaceId, source: Rect, dest: Rect, mirror_x: bool) {
        let Some(src) = self.surfaces.get(surface.0) else {
            return;
        };
        let sx0 = to_px(source.x0, src.width);
        let sy0 = to_px(source.y0, src.height);
        let width = to_px(source.width(), src.width);
        let height = to_px(source.height(), src.height);
        let dx0 = to_px(dest.x0, self.back.width);
        let dy0 = to_px(dest.y0, self.back.height);
        for row in 0..height {
            for col in 0..width {
                let Some(color) = src.pixel(sx0 + col, sy0 + row) else {
                    continue;
                };
                let dx = if mirror_x {
                    (dx0 + width).saturating_sub(col + 1)
                } else {
                    dx0 + col
                };
                self.back.set(dx, dy0 + row, color);
            }
        }
    }

    fn supports_fences(&self) -> bool {
        true
    }

    fn insert_fence(&mut self) -> Option<ImmediateFence> {
        Some(ImmediateFence)
    }
}
