// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slide queue and swap-locked scheduler.
//!
//! [`SlidePresenter`] holds an ordered queue of slides and shows each one for
//! its planned number of display refreshes. The caller drives it by calling
//! [`update`](SlidePresenter::update) in a tight loop; there is no internal
//! event loop.
//!
//! # Session states
//!
//! ```text
//!   Idle ──start()──► Synchronizing ──first swap──► Presenting ──last slide up──► Idle
//!     ▲                                                  │
//!     └───────────────────────stop()─────────────────────┘
//! ```
//!
//! Each slide moves through
//! [`SlideStatus`](crate::slide::SlideStatus) independently: it is drawn to
//! the back buffer one frame ahead of its planned onset, stamped with the
//! swap that shows it, and finished when the next slide replaces it.
//!
//! # Drift
//!
//! Planned onsets are computed one slide ahead. With
//! [`ErrorMode::PropagateDelays`] a slide that came up late becomes the new
//! reference for the next one; with [`ErrorMode::NoCorrection`] the original
//! plan is kept and the next slide is cut short instead.
//!
//! # Open-ended presentations
//!
//! When the last queued slide comes on screen, the final-slide callback (if
//! any) may append more slides through a [`FinalSlideContext`]. If it adds
//! none, presentation ends and the last slide's actual timing is marked
//! unbounded.

mod queue;
mod strategy;

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use log::{debug, error, info, warn};

pub use queue::FinalSlideContext;

use self::queue::{SlideQueue, release_content};
use self::strategy::SwapStrategy;
use crate::config::{ErrorMode, PresenterConfig};
use crate::display::{Display, Fence, RenderTarget};
use crate::report::{PresentationErrors, check_outcomes};
use crate::slide::{Slide, SlideContent, SlideRecord, SlideStatus, SlideTiming};
use crate::time::{Duration, HostTime};
use crate::trace::{
    CopyCompleteEvent, PresentationEndEvent, SlideFinishedEvent, SlideOnsetEvent,
    SlideRenderedEvent, TraceSink, Tracer,
};

/// Called when the last queued slide comes on screen.
pub type FinalSlideCallback<D> = Box<dyn FnMut(&mut FinalSlideContext<'_, D>)>;

/// Errors from configuring or querying a [`SlidePresenter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PresenterError {
    /// No display has been set up.
    #[error("no display has been set up")]
    NoDisplay,
    /// `start()` was called with nothing queued.
    #[error("the slide queue is empty")]
    EmptyQueue,
    /// A slide's duration was zero.
    #[error("slide duration must be positive")]
    ZeroDuration,
    /// Actual timing was requested before presentation finished.
    #[error("presentation is still running")]
    StillPresenting,
    /// `canvas()` or `end_current_slide()` without `begin_next_slide()`.
    #[error("no slide is open for drawing")]
    NoOpenSlide,
}

/// Coarse presenter state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Not presenting.
    #[default]
    Idle,
    /// Started, waiting for a swap to anchor the first slide to.
    Synchronizing,
    /// Showing slides.
    Presenting,
}

/// Whether presentation continues after a slide's onset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Ended,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Everything a swap strategy reads and writes.
pub(crate) struct Session<D: Display> {
    pub(crate) queue: SlideQueue<D>,
    pub(crate) state: SessionState,
    pub(crate) current: usize,
    pub(crate) config: PresenterConfig,
    final_slide: Option<FinalSlideCallback<D>>,
    trace: Option<Box<dyn TraceSink>>,
}

impl<D: Display> Session<D> {
    fn new(config: PresenterConfig) -> Self {
        Self {
            queue: SlideQueue::new(),
            state: SessionState::Idle,
            current: 0,
            config,
            final_slide: None,
            trace: None,
        }
    }

    fn tracer(&mut self) -> Tracer<'_> {
        match &mut self.trace {
            Some(sink) => Tracer::new(sink.as_mut()),
            None => Tracer::none(),
        }
    }

    fn reset(&mut self) {
        for slide in &mut self.queue.slides {
            slide.reset();
        }
        self.queue.clear_fences();
        self.current = 0;
    }

    /// Draws the first slide and switches to `Presenting`.
    pub(crate) fn begin_presenting(&mut self, display: &mut D) {
        self.current = 0;
        self.render_current(display);
        self.state = SessionState::Presenting;
        debug!("synchronized; first slide on the back buffer");
    }

    /// The current slide is on the back buffer, possibly still being copied.
    pub(crate) fn current_awaiting_swap(&self) -> bool {
        self.queue.slides.get(self.current).is_some_and(|s| {
            matches!(
                s.status,
                SlideStatus::SwapPending | SlideStatus::CopyToBackBufferPending
            )
        })
    }

    /// The current slide may be swapped in by a single-core strategy.
    pub(crate) fn current_swappable(&self) -> bool {
        let wait = self.config.wait_for_fence_before_swap;
        self.queue
            .slides
            .get(self.current)
            .is_some_and(|s| match s.status {
                SlideStatus::SwapPending => true,
                SlideStatus::CopyToBackBufferPending => !wait,
                _ => false,
            })
    }

    /// Puts the current slide on the back buffer and fences the copy if
    /// fences are in use.
    pub(crate) fn render_current(&mut self, display: &mut D) {
        let idx = self.current;
        let use_fences = self.config.use_fence_sync;
        let queue = &mut self.queue;
        let Some(slide) = queue.slides.get_mut(idx) else {
            return;
        };
        match &mut slide.content {
            SlideContent::Render(render) => {
                display.render_to_target(RenderTarget::BackBuffer, |canvas| render(canvas));
            }
            SlideContent::Surface(surface) => {
                display.copy_surface_to_back_buffer(surface, None, None);
            }
            SlideContent::Released => {
                warn!(
                    "slide {idx} ({:?}) has no content left to show; its surface was released",
                    slide.name
                );
            }
        }
        let fence = if use_fences {
            display.insert_fence()
        } else {
            None
        };
        let fenced = fence.is_some();
        slide.status = if fenced {
            SlideStatus::CopyToBackBufferPending
        } else {
            SlideStatus::SwapPending
        };
        if let Some(slot) = queue.fences.get_mut(idx) {
            *slot = fence;
        }
        let at = display.now();
        self.tracer().slide_rendered(&SlideRenderedEvent {
            index: idx,
            at,
            fenced,
        });
    }

    /// Stamps the current slide as shown by the swap at `onset`, finishes
    /// the previous one, and plans the next.
    pub(crate) fn on_onset(&mut self, display: &mut D, onset: HostTime, frame: u64) -> Flow {
        let idx = self.current;
        let Some(slide) = self.queue.slides.get_mut(idx) else {
            return Flow::Ended;
        };
        slide.status = SlideStatus::InProgress;
        slide.actual.start_time = onset;
        slide.actual.start_frame = frame;
        if idx == 0 {
            slide.intended.start_time = onset;
            slide.intended.start_frame = frame;
        }
        let intended_frame = slide.intended.start_frame;
        self.tracer().slide_onset(&SlideOnsetEvent {
            index: idx,
            onset,
            frame,
            intended_frame,
        });

        if idx > 0 {
            self.finish_previous(display);
        }
        if idx + 1 == self.queue.len() && self.handle_final(display) == Flow::Ended {
            return Flow::Ended;
        }
        self.prepare_next();
        Flow::Continue
    }

    fn finish_previous(&mut self, display: &mut D) {
        let idx = self.current;
        let (done, rest) = self.queue.slides.split_at_mut(idx);
        let (Some(prev), Some(now)) = (done.last_mut(), rest.first()) else {
            return;
        };
        prev.status = SlideStatus::Finished;
        prev.actual.duration = now.actual.start_time.saturating_duration_since(prev.actual.start_time);
        prev.actual.frame_count = now.actual.start_frame.saturating_sub(prev.actual.start_frame);
        let event = SlideFinishedEvent {
            index: idx - 1,
            duration: prev.actual.duration,
            frame_count: prev.actual.frame_count,
            intended_frame_count: prev.intended.frame_count,
        };
        if self.config.release_completed_slides {
            release_content(display, prev);
        }
        self.tracer().slide_finished(&event);
    }

    /// Plans the slide after the current one.
    fn prepare_next(&mut self) {
        let idx = self.current;
        let mode = self.config.error_mode;
        let (done, rest) = self.queue.slides.split_at_mut(idx + 1);
        let (Some(cur), Some(next)) = (done.last(), rest.first_mut()) else {
            return;
        };
        let late = cur.actual.start_time > cur.intended.start_time;
        let anchor = match mode {
            ErrorMode::PropagateDelays if late => cur.actual,
            _ => cur.intended,
        };
        next.intended.start_time = anchor.start_time.saturating_add(cur.intended.duration);
        next.intended.start_frame = anchor.start_frame.saturating_add(cur.intended.frame_count);
    }

    /// Moves to the next slide if it is due at or before the swap after
    /// `frame`, drawing it onto the back buffer.
    pub(crate) fn advance_if_due(&mut self, display: &mut D, frame: u64) {
        let on_screen = self
            .queue
            .slides
            .get(self.current)
            .is_some_and(|s| s.status == SlideStatus::InProgress);
        let due = self
            .queue
            .slides
            .get(self.current + 1)
            .is_some_and(|next| next.intended.start_frame <= frame + 1);
        if on_screen && due {
            self.current += 1;
            self.render_current(display);
        }
    }

    /// Moves to the next slide and draws it. Returns its planned onset.
    pub(crate) fn advance(&mut self, display: &mut D) -> Option<HostTime> {
        let next = self.queue.slides.get(self.current + 1)?.intended.start_time;
        self.current += 1;
        self.render_current(display);
        Some(next)
    }

    /// Gives the final-slide callback a chance to extend the queue.
    fn handle_final(&mut self, display: &mut D) -> Flow {
        let before = self.queue.len();
        let mut stop_requested = false;
        if let Some(mut callback) = self.final_slide.take() {
            let mut ctx = FinalSlideContext::new(&mut self.queue, display, self.current);
            callback(&mut ctx);
            stop_requested = ctx.stop_requested();
            self.final_slide = Some(callback);
        }
        if stop_requested || self.queue.len() == before {
            self.end_presentation(display);
            Flow::Ended
        } else {
            debug!("final-slide callback queued {} more", self.queue.len() - before);
            Flow::Continue
        }
    }

    /// Leaves the current slide on screen and returns to `Idle`.
    fn end_presentation(&mut self, display: &mut D) {
        let idx = self.current;
        let slide_count = self.queue.len();
        for (i, slide) in self.queue.slides.iter_mut().enumerate().skip(idx) {
            if i == idx {
                slide.actual.duration = SlideTiming::UNBOUNDED.duration;
                slide.actual.frame_count = SlideTiming::UNBOUNDED.frame_count;
                slide.status = SlideStatus::Finished;
            } else {
                slide.actual = SlideTiming::default();
            }
        }
        if self.config.release_completed_slides {
            self.queue.release_from(display, idx);
        }
        // Outstanding fences stay armed; `update()` keeps polling them.
        self.state = SessionState::Idle;
        info!("presentation ended on slide {idx} of {slide_count}");
        let at = display.now();
        self.tracer().presentation_end(&PresentationEndEvent {
            last_index: idx,
            slide_count,
            at,
        });
    }

    /// Polls every outstanding fence once.
    pub(crate) fn wait_sync_check(&mut self, display: &mut D) {
        for idx in 0..self.queue.fences.len() {
            let ready = match &mut self.queue.fences[idx] {
                Some(fence) => fence.poll_ready(),
                None => false,
            };
            if !ready {
                continue;
            }
            self.queue.fences[idx] = None;
            let at = display.now();
            let Some(slide) = self.queue.slides.get_mut(idx) else {
                continue;
            };
            slide.copy_complete_time = Some(at);
            let expected = slide.status == SlideStatus::CopyToBackBufferPending;
            if expected {
                slide.status = SlideStatus::SwapPending;
            } else {
                warn!(
                    "fence for slide {idx} ({:?}) signaled while the slide was {:?}",
                    slide.name, slide.status
                );
            }
            self.tracer().copy_complete(&CopyCompleteEvent {
                index: idx,
                at,
                expected,
            });
        }
    }
}

// ---------------------------------------------------------------------------
// SlidePresenter
// ---------------------------------------------------------------------------

/// Shows queued slides for exact numbers of display refreshes.
pub struct SlidePresenter<D: Display> {
    display: Option<D>,
    session: Session<D>,
    strategy: Option<Box<dyn SwapStrategy<D>>>,
}

impl<D: Display> fmt::Debug for SlidePresenter<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlidePresenter")
            .field("has_display", &self.display.is_some())
            .field("state", &self.session.state)
            .field("current", &self.session.current)
            .field("slide_count", &self.session.queue.len())
            .field("config", &self.session.config)
            .finish_non_exhaustive()
    }
}

impl<D: Display> SlidePresenter<D> {
    /// Creates a presenter with no display. Call [`setup`](Self::setup)
    /// before queuing slides.
    #[must_use]
    pub fn new(config: PresenterConfig) -> Self {
        Self {
            display: None,
            session: Session::new(config),
            strategy: None,
        }
    }

    /// Creates a presenter driving `display`.
    #[must_use]
    pub fn with_display(display: D, config: PresenterConfig) -> Self {
        let mut presenter = Self::new(config);
        presenter.install(display, config);
        presenter
    }

    /// Replaces the display and configuration. Queued slides are released
    /// and cleared.
    pub fn setup(&mut self, display: D, config: PresenterConfig) -> Result<(), PresenterError> {
        if self.is_presenting() {
            error!("setup called while presenting");
            return Err(PresenterError::StillPresenting);
        }
        self.clear_slides();
        self.install(display, config);
        Ok(())
    }

    fn install(&mut self, display: D, mut config: PresenterConfig) {
        let limit = display.frame_period().saturating_sub(Duration::from_millis(1));
        if config.pre_swap_busy_wait > limit {
            warn!(
                "pre-swap busy wait {:?} exceeds one frame period minus 1 ms; clamping to {limit:?}",
                config.pre_swap_busy_wait
            );
            config.pre_swap_busy_wait = limit;
        }
        if config.use_fence_sync && !display.supports_fences() {
            warn!("display has no GPU fences; back-buffer copies will not be verified");
            config.use_fence_sync = false;
        }
        self.session.config = config;
        self.display = Some(display);
    }

    /// The effective configuration, after setup-time adjustments.
    #[must_use]
    pub fn config(&self) -> &PresenterConfig {
        &self.session.config
    }

    /// The display, if one is set up.
    #[must_use]
    pub fn display(&self) -> Option<&D> {
        self.display.as_ref()
    }

    /// Mutable access to the display, if one is set up.
    pub fn display_mut(&mut self) -> Option<&mut D> {
        self.display.as_mut()
    }

    /// Registers the callback run when the last queued slide comes on screen.
    pub fn set_final_slide_callback(
        &mut self,
        callback: impl FnMut(&mut FinalSlideContext<'_, D>) + 'static,
    ) {
        self.session.final_slide = Some(Box::new(callback));
    }

    /// Removes the final-slide callback.
    pub fn clear_final_slide_callback(&mut self) {
        self.session.final_slide = None;
    }

    /// Sends presentation events to `sink`. Only dispatched with the `trace`
    /// feature.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.session.trace = Some(sink);
    }

    fn require(display: &mut Option<D>) -> Result<&mut D, PresenterError> {
        display.as_mut().ok_or_else(|| {
            error!("no display has been set up");
            PresenterError::NoDisplay
        })
    }

    // -- queue -------------------------------------------------------------

    /// Appends a pre-rendered slide.
    pub fn append_prerendered(&mut self, slide: Slide<D>) -> Result<(), PresenterError> {
        let display = Self::require(&mut self.display)?;
        self.session.queue.push(display, slide)
    }

    /// Appends a slide drawn by `render` onto the back buffer when it is due.
    pub fn append_by_callback(
        &mut self,
        name: impl Into<String>,
        duration: Duration,
        render: impl FnMut(&mut D::Canvas) + 'static,
    ) -> Result<(), PresenterError> {
        self.append_prerendered(Slide::from_render_fn(name, duration, render))
    }

    /// Queues a new surface-backed slide and binds its surface, so that
    /// [`canvas`](Self::canvas) draws into it until
    /// [`end_current_slide`](Self::end_current_slide).
    pub fn begin_next_slide(
        &mut self,
        name: impl Into<String>,
        duration: Duration,
    ) -> Result<(), PresenterError> {
        let name = name.into();
        let display = Self::require(&mut self.display)?;
        self.session.queue.begin_slide(display, name, duration)
    }

    /// The canvas of the slide opened by
    /// [`begin_next_slide`](Self::begin_next_slide).
    pub fn canvas(&mut self) -> Result<&mut D::Canvas, PresenterError> {
        if !self.session.queue.is_drawing() {
            return Err(PresenterError::NoOpenSlide);
        }
        Ok(Self::require(&mut self.display)?.canvas())
    }

    /// Finishes drawing the slide opened by
    /// [`begin_next_slide`](Self::begin_next_slide).
    pub fn end_current_slide(&mut self) -> Result<(), PresenterError> {
        let display = Self::require(&mut self.display)?;
        self.session.queue.end_slide(display)
    }

    /// Queues a new surface-backed slide drawn by `draw`.
    pub fn draw_next_slide(
        &mut self,
        name: impl Into<String>,
        duration: Duration,
        draw: impl FnOnce(&mut D::Canvas),
    ) -> Result<(), PresenterError> {
        let name = name.into();
        let display = Self::require(&mut self.display)?;
        self.session.queue.draw_slide(display, name, duration, draw)
    }

    /// Stops presentation and drops every slide, releasing their surfaces.
    pub fn clear_slides(&mut self) {
        self.stop();
        self.session.queue.clear(self.display.as_mut());
        self.session.current = 0;
    }

    /// Number of queued slides.
    #[must_use]
    pub fn slide_count(&self) -> usize {
        self.session.queue.len()
    }

    /// Status of slide `index`, readable at any time.
    #[must_use]
    pub fn slide_status(&self, index: usize) -> Option<SlideStatus> {
        self.session.queue.slides.get(index).map(|s| s.status)
    }

    // -- presentation ------------------------------------------------------

    /// Starts presenting from the first slide.
    ///
    /// Corrects the display's auto-swap mode to what the configured strategy
    /// needs, then waits for the GPU and enters `Synchronizing`.
    pub fn start(&mut self) -> Result<(), PresenterError> {
        let Some(display) = self.display.as_mut() else {
            error!("cannot start: no display has been set up");
            return Err(PresenterError::NoDisplay);
        };
        let session = &mut self.session;
        session.queue.close_open_drawing(display);
        if session.queue.is_empty() {
            warn!("cannot start: no slides are queued");
            return Err(PresenterError::EmptyQueue);
        }

        let mode = session.config.swapping_mode;
        let wanted = mode.requires_auto_swap();
        if display.is_auto_swapping() != wanted {
            info!(
                "{mode:?} presentation needs auto-swap {}; switching it",
                if wanted { "on" } else { "off" }
            );
            display.set_auto_swap(wanted);
        }

        session.reset();
        display.wait_for_gpu();
        // Forget swaps that happened before start.
        _ = display.has_swapped_since_last_check();
        self.strategy = Some(strategy::for_mode(mode));
        session.state = SessionState::Synchronizing;
        debug!("presentation of {} slides started", session.queue.len());
        Ok(())
    }

    /// Advances presentation. Call as often as possible.
    ///
    /// After presentation ends on its own, this still polls the fences of
    /// copies that had not completed, so a late final copy gets counted.
    pub fn update(&mut self) {
        if self.session.state == SessionState::Idle {
            if let Some(display) = self.display.as_mut() {
                self.session.wait_sync_check(display);
            }
            return;
        }
        let (Some(display), Some(strategy)) = (self.display.as_mut(), self.strategy.as_mut())
        else {
            return;
        };
        strategy.update(&mut self.session, display);
    }

    /// Ends presentation immediately. The current slide index is kept.
    pub fn stop(&mut self) {
        if self.session.state != SessionState::Idle {
            debug!("presentation stopped on slide {}", self.session.current);
        }
        self.session.state = SessionState::Idle;
        self.session.queue.clear_fences();
        self.strategy = None;
    }

    /// `true` while synchronizing or presenting.
    #[must_use]
    pub fn is_presenting(&self) -> bool {
        self.session.state != SessionState::Idle
    }

    /// `true` while any back-buffer copy is still guarded by an unsignaled
    /// fence.
    #[must_use]
    pub fn awaiting_fences(&self) -> bool {
        self.session.queue.fences.iter().any(Option::is_some)
    }

    /// Coarse presentation state.
    #[must_use]
    pub fn session_state(&self) -> SessionState {
        self.session.state
    }

    /// Index of the slide currently shown, or last shown after presentation.
    #[must_use]
    pub fn current_slide_index(&self) -> usize {
        self.session.current
    }

    // -- results -----------------------------------------------------------

    fn finalized(&self, what: &str) -> Result<(), PresenterError> {
        if self.is_presenting() {
            error!("{what} requested while presenting; timing is not final");
            Err(PresenterError::StillPresenting)
        } else {
            Ok(())
        }
    }

    /// Every queued slide with its final timing.
    pub fn presented_slides(&self) -> Result<&[Slide<D>], PresenterError> {
        self.finalized("presented slides")?;
        Ok(&self.session.queue.slides)
    }

    /// Actual time on screen per slide.
    pub fn actual_durations(&self) -> Result<Vec<Duration>, PresenterError> {
        self.finalized("actual durations")?;
        Ok(self.session.queue.slides.iter().map(|s| s.actual.duration).collect())
    }

    /// Actual swaps on screen per slide.
    pub fn actual_frame_counts(&self) -> Result<Vec<u64>, PresenterError> {
        self.finalized("actual frame counts")?;
        Ok(self.session.queue.slides.iter().map(|s| s.actual.frame_count).collect())
    }

    /// One row per slide for an external results table.
    pub fn slide_records(&self) -> Result<Vec<SlideRecord>, PresenterError> {
        self.finalized("slide records")?;
        Ok(self.session.queue.slides.iter().map(Slide::record).collect())
    }

    /// Classifies timing errors of the finished presentation. Returns an
    /// unchecked report while presenting.
    #[must_use]
    pub fn check_for_errors(&self) -> PresentationErrors {
        if self.finalized("error check").is_err() {
            return PresentationErrors::UNCHECKED;
        }
        check_outcomes(self.session.queue.slides.iter().map(Slide::outcome))
    }
}

impl<D: Display> Drop for SlidePresenter<D> {
    fn drop(&mut self) {
        self.session.queue.clear(self.display.as_mut());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SwappingMode;
    use crate::display::Fence;
    use crate::swap::{SwapCursor, SwapSample};
    use kurbo::{Rect, Size};

    const PERIOD: Duration = Duration(16_666_667);

    struct NeverReady;

    impl Fence for NeverReady {
        fn poll_ready(&mut self) -> bool {
            false
        }
    }

    /// Swaps only when told to, at exact period boundaries.
    #[derive(Default)]
    struct StubDisplay {
        period: Duration,
        now: HostTime,
        swaps: u64,
        cursor: SwapCursor,
        auto: bool,
        canvas: u32,
        begun: u32,
        ended: u32,
        allocated: u32,
        released: u32,
        /// Makes the single-value getters report a swap newer than
        /// `latest_swap`, as if one landed between two calls.
        racing: bool,
    }

    impl StubDisplay {
        fn new() -> Self {
            Self {
                period: PERIOD,
                ..Self::default()
            }
        }

        fn swap(&mut self) {
            self.now += self.period;
            self.swaps += 1;
        }
    }

    impl Display for StubDisplay {
        type Canvas = u32;
        type Surface = u32;
        type Fence = NeverReady;

        fn now(&self) -> HostTime {
            self.now
        }
        fn frame_period(&self) -> Duration {
            self.period
        }
        fn latest_swap(&self) -> SwapSample {
            SwapSample {
                count: self.swaps,
                timestamp: self.now,
            }
        }
        fn frame_number(&self) -> u64 {
            self.swaps + u64::from(self.racing)
        }
        fn last_swap_time(&self) -> HostTime {
            if self.racing { self.now + self.period } else { self.now }
        }
        fn has_swapped_since_last_check(&mut self) -> bool {
            self.cursor.advance(self.swaps)
        }
        fn is_auto_swapping(&self) -> bool {
            self.auto
        }
        fn set_auto_swap(&mut self, enabled: bool) {
            self.auto = enabled;
        }
        fn blocking_swap(&mut self) {
            if !self.auto {
                self.swap();
            }
        }
        fn request_swaps(&mut self, n: u32) {
            for _ in 0..n {
                self.swap();
            }
        }
        fn wait_for_gpu(&mut self) {}
        fn resolution(&self) -> Size {
            Size::new(64.0, 64.0)
        }
        fn allocate_surface(&mut self) -> u32 {
            self.allocated += 1;
            self.allocated
        }
        fn release_surface(&mut self, _: u32) {
            self.released += 1;
        }
        fn begin_render_to_target(&mut self, _: RenderTarget<'_, u32>) {
            self.begun += 1;
        }
        fn canvas(&mut self) -> &mut u32 {
            &mut self.canvas
        }
        fn end_render_to_target(&mut self) {
            self.ended += 1;
        }
        fn copy_surface_to_back_buffer(&mut self, _: &u32, _: Option<Rect>, _: Option<Rect>) {}
    }

    fn presenter() -> SlidePresenter<StubDisplay> {
        SlidePresenter::with_display(StubDisplay::new(), PresenterConfig::multi_core())
    }

    #[test]
    fn zero_duration_is_rejected() {
        let mut p = presenter();
        let r = p.append_by_callback("empty", Duration::ZERO, |c: &mut u32| *c += 1);
        assert_eq!(r, Err(PresenterError::ZeroDuration));
        assert_eq!(p.slide_count(), 0, "queue unchanged");
        let r = p.begin_next_slide("empty surface", Duration::ZERO);
        assert_eq!(r, Err(PresenterError::ZeroDuration));
        assert_eq!(p.display().map(|d| d.allocated), Some(0), "nothing allocated");
    }

    #[test]
    fn rejected_prerendered_surface_is_released() {
        let mut p = presenter();
        let slide = Slide::from_surface("s", Duration::ZERO, 7);
        assert_eq!(p.append_prerendered(slide), Err(PresenterError::ZeroDuration));
        assert_eq!(p.display().map(|d| d.released), Some(1), "surface given back");
    }

    #[test]
    fn frame_count_is_rounded_duration_over_period() {
        let mut p = presenter();
        for ms in [1000, 250, 500, 8, 9] {
            p.append_by_callback("s", Duration::from_millis(ms), |_: &mut u32| {})
                .unwrap();
        }
        let counts: Vec<u64> = p
            .presented_slides()
            .unwrap()
            .iter()
            .map(|s| s.intended.frame_count)
            .collect();
        assert_eq!(counts, [60, 15, 30, 0, 1], "round(D / P)");
    }

    #[test]
    fn queue_operations_need_a_display() {
        let mut p = SlidePresenter::<StubDisplay>::new(PresenterConfig::default());
        let r = p.append_by_callback("s", Duration::from_millis(10), |_: &mut u32| {});
        assert_eq!(r, Err(PresenterError::NoDisplay));
        assert_eq!(p.start(), Err(PresenterError::NoDisplay));
        assert!(!p.is_presenting(), "still idle");
    }

    #[test]
    fn start_with_empty_queue_fails() {
        let mut p = presenter();
        assert_eq!(p.start(), Err(PresenterError::EmptyQueue));
        assert_eq!(p.session_state(), SessionState::Idle);
    }

    #[test]
    fn start_corrects_auto_swap() {
        let mut p = presenter();
        p.append_by_callback("s", Duration::from_millis(100), |_: &mut u32| {})
            .unwrap();
        p.start().unwrap();
        assert_eq!(p.display().map(|d| d.auto), Some(true), "multi-core turns it on");
        assert_eq!(p.session_state(), SessionState::Synchronizing);

        let mut p = SlidePresenter::with_display(
            StubDisplay {
                auto: true,
                ..StubDisplay::new()
            },
            PresenterConfig::single_core_blocking(),
        );
        p.append_by_callback("s", Duration::from_millis(100), |_: &mut u32| {})
            .unwrap();
        p.start().unwrap();
        assert_eq!(p.display().map(|d| d.auto), Some(false), "blocking turns it off");
    }

    #[test]
    fn setup_clamps_busy_wait_and_disables_missing_fences() {
        let config = PresenterConfig {
            pre_swap_busy_wait: Duration::from_millis(50),
            ..PresenterConfig::single_core_blocking()
        };
        let p = SlidePresenter::with_display(StubDisplay::new(), config);
        assert_eq!(
            p.config().pre_swap_busy_wait,
            PERIOD - Duration::from_millis(1),
            "clamped to period - 1 ms",
        );
        assert!(!p.config().use_fence_sync, "stub has no fences");
        assert_eq!(p.config().swapping_mode, SwappingMode::SingleCoreBlocking);
    }

    #[test]
    fn begin_next_slide_closes_the_open_one() {
        let mut p = presenter();
        p.begin_next_slide("a", Duration::from_millis(100)).unwrap();
        *p.canvas().unwrap() += 1;
        p.begin_next_slide("b", Duration::from_millis(100)).unwrap();
        p.end_current_slide().unwrap();
        let d = p.display().unwrap();
        assert_eq!((d.begun, d.ended), (2, 2), "every begin matched by an end");
        assert_eq!(p.end_current_slide(), Err(PresenterError::NoOpenSlide));
        assert!(p.canvas().is_err(), "no canvas once closed");
    }

    #[test]
    fn telemetry_is_refused_while_presenting() {
        let mut p = presenter();
        p.append_by_callback("s", Duration::from_millis(100), |_: &mut u32| {})
            .unwrap();
        p.start().unwrap();
        assert_eq!(p.actual_durations(), Err(PresenterError::StillPresenting));
        assert_eq!(p.actual_frame_counts(), Err(PresenterError::StillPresenting));
        assert!(p.presented_slides().is_err(), "slides refused");
        assert_eq!(p.check_for_errors(), PresentationErrors::UNCHECKED);
    }

    #[test]
    fn stop_keeps_the_current_index() {
        let mut p = presenter();
        for _ in 0..3 {
            p.append_by_callback("s", Duration::from_millis(50), |c: &mut u32| *c += 1)
                .unwrap();
        }
        p.start().unwrap();
        // Every stub swap advances the clock by one period.
        for _ in 0..12 {
            p.display_mut().unwrap().swap();
            p.update();
        }
        let index = p.current_slide_index();
        assert!(index > 0, "presentation moved on");
        p.stop();
        assert_eq!(p.current_slide_index(), index, "index kept");
        assert!(!p.is_presenting(), "stopped");
    }

    #[test]
    fn onsets_take_count_and_time_from_one_swap() {
        let mut p = SlidePresenter::with_display(
            StubDisplay {
                racing: true,
                ..StubDisplay::new()
            },
            PresenterConfig::multi_core(),
        );
        for _ in 0..2 {
            p.append_by_callback("s", Duration::from_millis(50), |c: &mut u32| *c += 1)
                .unwrap();
        }
        p.start().unwrap();
        for _ in 0..8 {
            p.display_mut().unwrap().swap();
            p.update();
        }
        assert!(!p.is_presenting(), "both slides shown");
        for slide in p.presented_slides().unwrap() {
            assert_eq!(
                slide.actual.start_time,
                HostTime::ZERO + PERIOD.times(slide.actual.start_frame),
                "onset time belongs to the onset frame",
            );
        }
        assert_eq!(p.actual_frame_counts().unwrap()[0], 3, "50 ms at 60 Hz");
    }

    #[test]
    fn clear_slides_releases_surfaces() {
        let mut p = presenter();
        p.draw_next_slide("a", Duration::from_millis(100), |c| *c += 1)
            .unwrap();
        p.draw_next_slide("b", Duration::from_millis(100), |c| *c += 1)
            .unwrap();
        p.clear_slides();
        assert_eq!(p.slide_count(), 0, "cleared");
        assert_eq!(p.display().map(|d| d.released), Some(2), "both released");
    }
}
