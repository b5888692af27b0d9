// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slides: timed units of visual content.

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

use crate::display::Display;
use crate::time::{Duration, HostTime};

/// Draws a slide's content into the canvas of the back buffer.
pub type RenderFn<C> = Box<dyn FnMut(&mut C)>;

/// Start and length of a slide, in host time and in swaps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlideTiming {
    /// Host time the slide appeared (or is meant to appear).
    pub start_time: HostTime,
    /// Frame number of the swap that showed the slide.
    pub start_frame: u64,
    /// Time on screen. [`Duration::MAX`] when the end is unknown.
    pub duration: Duration,
    /// Swaps on screen. `u64::MAX` when the end is unknown.
    pub frame_count: u64,
}

impl SlideTiming {
    /// Timing of a slide that stays up until someone else replaces it.
    pub const UNBOUNDED: Self = Self {
        start_time: HostTime::ZERO,
        start_frame: 0,
        duration: Duration::MAX,
        frame_count: u64::MAX,
    };

    /// Returns `true` if the end of the slide was never observed.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.frame_count == u64::MAX
    }
}

/// Lifecycle of a slide during one presentation.
///
/// `NotStarted → CopyToBackBufferPending → SwapPending → InProgress → Finished`,
/// where `CopyToBackBufferPending` is skipped unless fences are in use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SlideStatus {
    /// Queued, not yet drawn.
    #[default]
    NotStarted,
    /// Drawn to the back buffer, waiting for the GPU fence.
    CopyToBackBufferPending,
    /// Ready on the back buffer, waiting for the swap.
    SwapPending,
    /// On screen.
    InProgress,
    /// Replaced by the next slide.
    Finished,
}

/// What a slide shows.
pub enum SlideContent<D: Display> {
    /// Pre-rendered off-screen surface, copied to the back buffer.
    Surface(D::Surface),
    /// Drawn directly into the back buffer when the slide is due.
    Render(RenderFn<D::Canvas>),
    /// The surface was released after the slide was shown.
    Released,
}

impl<D: Display> fmt::Debug for SlideContent<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Surface(_) => "Surface",
            Self::Render(_) => "Render",
            Self::Released => "Released",
        })
    }
}

/// One scheduled unit of visual content.
pub struct Slide<D: Display> {
    /// Diagnostic name.
    pub name: String,
    /// Content to show.
    pub content: SlideContent<D>,
    /// Planned timing. The frame count is filled in when the slide is queued.
    pub intended: SlideTiming,
    /// Observed timing, filled in during presentation.
    pub actual: SlideTiming,
    /// Lifecycle status.
    pub status: SlideStatus,
    /// When the GPU reported the back-buffer copy complete, if fences are used.
    pub copy_complete_time: Option<HostTime>,
}

impl<D: Display> Slide<D> {
    fn with_content(name: impl Into<String>, duration: Duration, content: SlideContent<D>) -> Self {
        Self {
            name: name.into(),
            content,
            intended: SlideTiming {
                duration,
                ..SlideTiming::default()
            },
            actual: SlideTiming::default(),
            status: SlideStatus::NotStarted,
            copy_complete_time: None,
        }
    }

    /// A slide showing a pre-rendered surface for `duration`.
    #[must_use]
    pub fn from_surface(name: impl Into<String>, duration: Duration, surface: D::Surface) -> Self {
        Self::with_content(name, duration, SlideContent::Surface(surface))
    }

    /// A slide drawn by `render` for `duration`.
    #[must_use]
    pub fn from_render_fn(
        name: impl Into<String>,
        duration: Duration,
        render: impl FnMut(&mut D::Canvas) + 'static,
    ) -> Self {
        Self::with_content(name, duration, SlideContent::Render(Box::new(render)))
    }

    /// Timing summary for error checking.
    #[must_use]
    pub fn outcome(&self) -> SlideOutcome {
        SlideOutcome {
            intended_frames: self.intended.frame_count,
            actual_frames: self.actual.frame_count,
            actual_start: self.actual.start_time,
            copy_complete_time: self.copy_complete_time,
        }
    }

    /// Row for an external results table.
    #[must_use]
    pub fn record(&self) -> SlideRecord {
        SlideRecord {
            name: self.name.clone(),
            intended: self.intended,
            actual: self.actual,
            copy_complete_time: self.copy_complete_time,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.status = SlideStatus::NotStarted;
        self.actual = SlideTiming::default();
        self.copy_complete_time = None;
    }
}

impl<D: Display> fmt::Debug for Slide<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slide")
            .field("name", &self.name)
            .field("content", &self.content)
            .field("intended", &self.intended)
            .field("actual", &self.actual)
            .field("status", &self.status)
            .field("copy_complete_time", &self.copy_complete_time)
            .finish()
    }
}

/// The parts of a finished slide the error check looks at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlideOutcome {
    /// Planned number of swaps on screen.
    pub intended_frames: u64,
    /// Observed number of swaps on screen.
    pub actual_frames: u64,
    /// Observed onset.
    pub actual_start: HostTime,
    /// GPU completion of the back-buffer copy, if known.
    pub copy_complete_time: Option<HostTime>,
}

impl SlideOutcome {
    /// Returns `true` if the GPU finished drawing after the slide was already
    /// on screen.
    #[must_use]
    pub fn copied_late(&self) -> bool {
        self.copy_complete_time
            .is_some_and(|t| t > self.actual_start)
    }
}

/// Display-independent copy of a slide's timing, one row per slide.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlideRecord {
    /// Diagnostic name.
    pub name: String,
    /// Planned timing.
    pub intended: SlideTiming,
    /// Observed timing.
    pub actual: SlideTiming,
    /// GPU completion of the back-buffer copy, if known.
    pub copy_complete_time: Option<HostTime>,
}

impl SlideRecord {
    /// Timing summary for error checking.
    #[must_use]
    pub fn outcome(&self) -> SlideOutcome {
        SlideOutcome {
            intended_frames: self.intended.frame_count,
            actual_frames: self.actual.frame_count,
            actual_start: self.actual.start_time,
            copy_complete_time: self.copy_complete_time,
        }
    }
}
