// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::mem;

use log::{debug, warn};

use super::PresenterError;
use crate::display::{Display, RenderTarget};
use crate::slide::{Slide, SlideContent};
use crate::time::Duration;

/// Slides plus the fences guarding their back-buffer copies, index-aligned.
pub(crate) struct SlideQueue<D: Display> {
    pub(crate) slides: Vec<Slide<D>>,
    pub(crate) fences: Vec<Option<D::Fence>>,
    drawing_open: bool,
}

impl<D: Display> SlideQueue<D> {
    pub(crate) const fn new() -> Self {
        Self {
            slides: Vec::new(),
            fences: Vec::new(),
            drawing_open: false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slides.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub(crate) const fn is_drawing(&self) -> bool {
        self.drawing_open
    }

    /// Queues `slide`, computing its planned frame count from the display's
    /// period. Slides without a positive duration are rejected.
    pub(crate) fn push(&mut self, display: &mut D, mut slide: Slide<D>) -> Result<(), PresenterError> {
        self.close_open_drawing(display);
        if slide.intended.duration.is_zero() {
            warn!("slide {:?} rejected: duration must be positive", slide.name);
            if let SlideContent::Surface(surface) = mem::replace(&mut slide.content, SlideContent::Released) {
                display.release_surface(surface);
            }
            return Err(PresenterError::ZeroDuration);
        }
        let period = display.frame_period();
        if period.is_zero() {
            warn!(
                "slide {:?} queued before the frame period is known; its frame count is 0",
                slide.name
            );
        }
        slide.intended.frame_count = slide.intended.duration.frames_in(period);
        slide.reset();
        debug!(
            "queued slide {} {:?}: {:?} ({} frames)",
            self.slides.len(),
            slide.name,
            slide.intended.duration,
            slide.intended.frame_count
        );
        self.slides.push(slide);
        self.fences.push(None);
        Ok(())
    }

    /// Queues a new surface-backed slide and binds its surface for drawing.
    pub(crate) fn begin_slide(
        &mut self,
        display: &mut D,
        name: String,
        duration: Duration,
    ) -> Result<(), PresenterError> {
        self.close_open_drawing(display);
        if duration.is_zero() {
            warn!("slide {name:?} rejected: duration must be positive");
            return Err(PresenterError::ZeroDuration);
        }
        let surface = display.allocate_surface();
        self.push(display, Slide::from_surface(name, duration, surface))?;
        if let Some(Slide {
            content: SlideContent::Surface(surface),
            ..
        }) = self.slides.last()
        {
            display.begin_render_to_target(RenderTarget::Surface(surface));
            self.drawing_open = true;
        }
        Ok(())
    }

    pub(crate) fn end_slide(&mut self, display: &mut D) -> Result<(), PresenterError> {
        if !self.drawing_open {
            warn!("no slide is open for drawing");
            return Err(PresenterError::NoOpenSlide);
        }
        display.end_render_to_target();
        self.drawing_open = false;
        Ok(())
    }

    pub(crate) fn draw_slide(
        &mut self,
        display: &mut D,
        name: String,
        duration: Duration,
        draw: impl FnOnce(&mut D::Canvas),
    ) -> Result<(), PresenterError> {
        self.begin_slide(display, name, duration)?;
        draw(display.canvas());
        self.end_slide(display)
    }

    pub(crate) fn close_open_drawing(&mut self, display: &mut D) {
        if self.drawing_open {
            debug!("closing the slide still open for drawing");
            display.end_render_to_target();
            self.drawing_open = false;
        }
    }

    /// Releases the surface of every slide from `start` on.
    pub(crate) fn release_from(&mut self, display: &mut D, start: usize) {
        for slide in self.slides.iter_mut().skip(start) {
            release_content(display, slide);
        }
    }

    pub(crate) fn clear_fences(&mut self) {
        for fence in &mut self.fences {
            *fence = None;
        }
    }

    pub(crate) fn clear(&mut self, display: Option<&mut D>) {
        if let Some(display) = display {
            self.close_open_drawing(display);
            self.release_from(display, 0);
        }
        self.slides.clear();
        self.fences.clear();
        self.drawing_open = false;
    }
}

pub(crate) fn release_content<D: Display>(display: &mut D, slide: &mut Slide<D>) {
    if matches!(slide.content, SlideContent::Surface(_)) {
        if let SlideContent::Surface(surface) = mem::replace(&mut slide.content, SlideContent::Released) {
            display.release_surface(surface);
        }
    }
}

/// What a final-slide callback can do while the last queued slide is coming
/// on screen.
///
/// Appending at least one slide keeps the presentation going; appending
/// nothing, or calling [`stop`](Self::stop), ends it.
pub struct FinalSlideContext<'a, D: Display> {
    queue: &'a mut SlideQueue<D>,
    display: &'a mut D,
    current: usize,
    stop_requested: bool,
}

impl<D: Display> fmt::Debug for FinalSlideContext<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinalSlideContext")
            .field("current", &self.current)
            .field("slide_count", &self.queue.len())
            .field("stop_requested", &self.stop_requested)
            .finish_non_exhaustive()
    }
}

impl<'a, D: Display> FinalSlideContext<'a, D> {
    pub(crate) fn new(queue: &'a mut SlideQueue<D>, display: &'a mut D, current: usize) -> Self {
        Self {
            queue,
            display,
            current,
            stop_requested: false,
        }
    }

    /// Index of the slide that just came on screen.
    #[must_use]
    pub fn current_slide_index(&self) -> usize {
        self.current
    }

    /// Number of queued slides, including any appended by this callback.
    #[must_use]
    pub fn slide_count(&self) -> usize {
        self.queue.len()
    }

    /// The display, for allocating surfaces or reading the frame period.
    pub fn display(&mut self) -> &mut D {
        &mut *self.display
    }

    /// Appends a pre-rendered slide.
    pub fn append_prerendered(&mut self, slide: Slide<D>) -> Result<(), PresenterError> {
        self.queue.push(&mut *self.display, slide)
    }

    /// Appends a slide drawn by `render` when it is due.
    pub fn append_by_callback(
        &mut self,
        name: impl Into<String>,
        duration: Duration,
        render: impl FnMut(&mut D::Canvas) + 'static,
    ) -> Result<(), PresenterError> {
        self.queue
            .push(&mut *self.display, Slide::from_render_fn(name, duration, render))
    }

    /// Draws a new surface-backed slide with `draw` and appends it.
    pub fn draw_next_slide(
        &mut self,
        name: impl Into<String>,
        duration: Duration,
        draw: impl FnOnce(&mut D::Canvas),
    ) -> Result<(), PresenterError> {
        self.queue
            .draw_slide(&mut *self.display, name.into(), duration, draw)
    }

    /// Ends presentation once the current slide is up, even if slides were
    /// appended.
    pub fn stop(&mut self) {
        self.stop_requested = true;
    }

    pub(crate) const fn stop_requested(&self) -> bool {
        self.stop_requested
    }
}
