// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display contract consumed by the slide scheduler.
//!
//! Swaptime splits the timing problem in two. This crate owns the slide
//! model and the scheduling logic; display crates own the platform glue. A
//! display provides the following pieces, all behind the [`Display`] trait:
//!
//! - **Swap telemetry**: the unified frame number, the host time of the last
//!   completed swap, and an edge detector for "a swap happened since I last
//!   asked". With automatic swapping on, these advance from a background swap
//!   thread.
//!
//! - **Swapping**: one-shot blocking swaps, continuous automatic swapping,
//!   and a request for exactly `n` background swaps.
//!
//! - **Render targets**: off-screen surfaces and the back buffer, bound for
//!   drawing between [`begin_render_to_target`] and [`end_render_to_target`].
//!   The canvas type is whatever the display draws with.
//!
//! - **GPU completion**: optional fences that report, without blocking,
//!   whether the commands issued before them have finished.
//!
//! # Crate boundaries
//!
//! `swaptime_core` is `no_std` and never touches a clock or a GPU directly.
//! `swaptime_display` implements [`Display`] on top of a background swap
//! clock and a rendering backend; `swaptime_harness` implements it on a
//! virtual, manually advanced clock for deterministic tests.
//!
//! [`begin_render_to_target`]: Display::begin_render_to_target
//! [`end_render_to_target`]: Display::end_render_to_target

use kurbo::{Point, Rect, Size};

use crate::swap::SwapSample;
use crate::time::{Duration, HostTime};

/// Non-blocking completion signal for previously issued GPU commands.
pub trait Fence {
    /// Returns `true` once every command issued before the fence has
    /// completed. Never blocks.
    fn poll_ready(&mut self) -> bool;
}

/// Where drawing goes between `begin_render_to_target` and
/// `end_render_to_target`.
#[derive(Debug)]
pub enum RenderTarget<'a, S> {
    /// The back buffer, shown at the next swap.
    BackBuffer,
    /// An off-screen surface.
    Surface(&'a S),
}

/// Physical orientation of the presentation surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// The surface's native orientation.
    #[default]
    Landscape,
    /// Rotated 180°.
    LandscapeInverted,
    /// Rotated 90° counter-clockwise.
    PortraitLeft,
    /// Rotated 90° clockwise.
    PortraitRight,
}

impl Orientation {
    /// Returns `true` for orientations that swap width and height.
    #[must_use]
    pub const fn is_portrait(self) -> bool {
        matches!(self, Self::PortraitLeft | Self::PortraitRight)
    }
}

/// A swap-synchronized display.
///
/// # Presentation loop
///
/// The scheduler only ever talks to the display through this trait. A
/// multi-core presentation looks roughly like this:
///
/// ```rust,ignore
/// display.set_auto_swap(true);
/// loop {
///     if display.has_swapped_since_last_check() {
///         let swap = display.latest_swap();
///         let (onset, frame) = (swap.timestamp, swap.count);
///         // stamp the slide that just appeared, maybe draw the next one
///         display.render_to_target(RenderTarget::BackBuffer, |canvas| draw(canvas));
///     }
/// }
/// ```
pub trait Display {
    /// Drawing surface handed to render callbacks.
    type Canvas;
    /// Off-screen render target owned by a slide.
    type Surface;
    /// GPU completion fence.
    type Fence: Fence;

    /// Current host time on the clock swap timestamps are taken from.
    fn now(&self) -> HostTime;

    /// Current estimate of the refresh period.
    fn frame_period(&self) -> Duration;

    /// Most recent swap as one consistent snapshot: the unified swap count
    /// (background plus manual blocking swaps) and the time that swap
    /// completed.
    fn latest_swap(&self) -> SwapSample;

    /// Unified swap counter: background swaps plus manual blocking swaps.
    fn frame_number(&self) -> u64 {
        self.latest_swap().count
    }

    /// Host time at which the most recent swap completed.
    ///
    /// Pairing this with a separate [`frame_number`](Self::frame_number)
    /// call may mix two swaps; use [`latest_swap`](Self::latest_swap) when
    /// both are needed.
    fn last_swap_time(&self) -> HostTime {
        self.latest_swap().timestamp
    }

    /// Predicted completion time of the next swap.
    fn estimate_next_swap_time(&self) -> HostTime {
        self.last_swap_time().saturating_add(self.frame_period())
    }

    /// Returns `true` at most once per distinct swap, tracked with a cursor
    /// private to the display's owner.
    fn has_swapped_since_last_check(&mut self) -> bool;

    /// Whether the background swap loop is running continuously.
    fn is_auto_swapping(&self) -> bool;

    /// Starts or stops continuous background swapping. Stopping blocks until
    /// the background loop has exited.
    fn set_auto_swap(&mut self, enabled: bool);

    /// Issues one swap and blocks until it completes. Does nothing while
    /// auto-swapping.
    fn blocking_swap(&mut self);

    /// Asks the background loop for exactly `n` more swaps without enabling
    /// continuous mode.
    fn request_swaps(&mut self, n: u32);

    /// Blocks until all submitted rendering has completed.
    fn wait_for_gpu(&mut self);

    /// Size of the back buffer.
    fn resolution(&self) -> Size;

    /// Centre of the back buffer.
    fn center(&self) -> Point {
        let size = self.resolution();
        Point::new(size.width / 2.0, size.height / 2.0)
    }

    /// Allocates an off-screen surface matching the back buffer.
    fn allocate_surface(&mut self) -> Self::Surface;

    /// Releases a surface's resources.
    fn release_surface(&mut self, surface: Self::Surface);

    /// Binds `target` for drawing.
    fn begin_render_to_target(&mut self, target: RenderTarget<'_, Self::Surface>);

    /// The canvas of the currently bound target.
    fn canvas(&mut self) -> &mut Self::Canvas;

    /// Flushes pending drawing and unbinds the current target.
    fn end_render_to_target(&mut self);

    /// Binds `target`, runs `draw`, then always unbinds and flushes.
    fn render_to_target<R>(
        &mut self,
        target: RenderTarget<'_, Self::Surface>,
        draw: impl FnOnce(&mut Self::Canvas) -> R,
    ) -> R
    where
        Self: Sized,
    {
        self.begin_render_to_target(target);
        let out = draw(self.canvas());
        self.end_render_to_target();
        out
    }

    /// Copies `source` of `surface` onto `dest` of the back buffer without
    /// a CPU readback. `None` means the whole surface or back buffer. Both
    /// rectangles are clamped to the smaller of the two extents.
    fn copy_surface_to_back_buffer(
        &mut self,
        surface: &Self::Surface,
        source: Option<Rect>,
        dest: Option<Rect>,
    );

    /// Whether [`insert_fence`](Self::insert_fence) can ever return a fence.
    fn supports_fences(&self) -> bool {
        false
    }

    /// Inserts a completion fence after the commands issued so far.
    fn insert_fence(&mut self) -> Option<Self::Fence> {
        None
    }
}

/// Clamps a copy between a `surface`-sized source and a `target`-sized back
/// buffer.
///
/// Missing rectangles default to the full extent. The copied extent is the
/// smaller of the two rectangles in each axis, and both rectangles are
/// intersected with their own bounds first.
#[must_use]
pub fn clamp_copy_region(
    surface: Size,
    target: Size,
    source: Option<Rect>,
    dest: Option<Rect>,
) -> (Rect, Rect) {
    let source = source
        .unwrap_or_else(|| surface.to_rect())
        .intersect(surface.to_rect());
    let dest = dest
        .unwrap_or_else(|| target.to_rect())
        .intersect(target.to_rect());
    let width = source.width().min(dest.width()).max(0.0);
    let height = source.height().min(dest.height()).max(0.0);
    let extent = Size::new(width, height);
    (
        Rect::from_origin_size(source.origin(), extent),
        Rect::from_origin_size(dest.origin(), extent),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_copy_uses_smaller_extent() {
        let (src, dst) = clamp_copy_region(
            Size::new(800.0, 600.0),
            Size::new(640.0, 480.0),
            None,
            None,
        );
        assert_eq!(src, Rect::new(0.0, 0.0, 640.0, 480.0), "source clamped");
        assert_eq!(dst, Rect::new(0.0, 0.0, 640.0, 480.0), "dest clamped");
    }

    #[test]
    fn explicit_rects_are_bounded() {
        let (src, dst) = clamp_copy_region(
            Size::new(100.0, 100.0),
            Size::new(200.0, 200.0),
            Some(Rect::new(50.0, 50.0, 150.0, 150.0)),
            Some(Rect::new(10.0, 10.0, 110.0, 110.0)),
        );
        assert_eq!(src, Rect::new(50.0, 50.0, 100.0, 100.0), "source cut to surface");
        assert_eq!(dst, Rect::new(10.0, 10.0, 60.0, 60.0), "dest matches source extent");
    }

    #[test]
    fn disjoint_source_copies_nothing() {
        let (src, _) = clamp_copy_region(
            Size::new(100.0, 100.0),
            Size::new(100.0, 100.0),
            Some(Rect::new(200.0, 200.0, 300.0, 300.0)),
            None,
        );
        assert!(src.is_zero_area(), "nothing to copy: {src:?}");
    }

    #[test]
    fn portrait_orientations() {
        assert!(Orientation::PortraitLeft.is_portrait(), "left");
        assert!(Orientation::PortraitRight.is_portrait(), "right");
        assert!(!Orientation::LandscapeInverted.is_portrait(), "inverted");
    }
}
