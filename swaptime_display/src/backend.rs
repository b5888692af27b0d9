// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendering backend contract for [`TimedDisplay`](crate::TimedDisplay).
//!
//! A backend owns the graphics context: the back buffer, off-screen surfaces
//! and the drawing canvas. Swapping is split out into a separate
//! [`SwapBuffers`] handle, because the swap thread calls it while the
//! foreground thread keeps the backend itself.
//!
//! [`TimedDisplay`] adds the timing layer on top: swap telemetry, period
//! estimation, copy clamping and orientation checks. Backends only carry out
//! the requests they are given.

use std::sync::Arc;

use kurbo::{Rect, Size};
use swaptime_core::display::{Fence, Orientation, RenderTarget};

use crate::swap_clock::SwapBuffers;

/// Graphics context behind a [`TimedDisplay`](crate::TimedDisplay).
pub trait Backend {
    /// Drawing surface handed to render callbacks.
    type Canvas;
    /// Off-screen render target.
    type Surface;
    /// GPU completion fence.
    type Fence: Fence;
    /// Swap handle shared with the swap thread.
    type Swapper: SwapBuffers;

    /// The swap handle.
    fn swapper(&self) -> Arc<Self::Swapper>;

    /// Size of the back buffer.
    fn resolution(&self) -> Size;

    /// Orientation of the presentation surface.
    fn orientation(&self) -> Orientation {
        Orientation::Landscape
    }

    /// Creates an off-screen surface of `size`.
    fn create_surface(&mut self, size: Size) -> Self::Surface;

    /// Size of `surface`.
    fn surface_size(&self, surface: &Self::Surface) -> Size;

    /// Frees `surface`.
    fn destroy_surface(&mut self, surface: Self::Surface);

    /// Makes `target` the destination of subsequent drawing.
    fn bind(&mut self, target: RenderTarget<'_, Self::Surface>);

    /// Canvas of the bound target.
    fn canvas(&mut self) -> &mut Self::Canvas;

    /// Submits pending drawing commands.
    fn flush(&mut self);

    /// Blocks until all submitted commands have executed.
    fn finish(&mut self);

    /// Copies `source` of `surface` to `dest` of the back buffer. The two
    /// rectangles have the same size. With `mirror_x` the copy is flipped
    /// horizontally.
    fn blit(&mut self, surface: &Self::Surface, source: Rect, dest: Rect, mirror_x: bool);

    /// Whether [`insert_fence`](Self::insert_fence) can return fences.
    fn supports_fences(&self) -> bool {
        false
    }

    /// Inserts a completion fence after the submitted commands.
    fn insert_fence(&mut self) -> Option<Self::Fence> {
        None
    }
}
