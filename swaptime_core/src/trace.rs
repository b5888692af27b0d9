// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for slide presentation.
//!
//! This module provides a [`TraceSink`] trait with one method per event the
//! presenter emits while it runs. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).

use crate::time::{Duration, HostTime};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a slide has been drawn or copied to the back buffer.
#[derive(Clone, Copy, Debug)]
pub struct SlideRenderedEvent {
    /// Queue index of the slide.
    pub index: usize,
    /// Host time after the draw calls were issued.
    pub at: HostTime,
    /// Whether a GPU fence now guards the slide.
    pub fenced: bool,
}

/// Emitted when the swap that shows a slide has been observed.
#[derive(Clone, Copy, Debug)]
pub struct SlideOnsetEvent {
    /// Queue index of the slide.
    pub index: usize,
    /// Host time of the swap.
    pub onset: HostTime,
    /// Frame number of the swap.
    pub frame: u64,
    /// Frame number the slide was planned for.
    pub intended_frame: u64,
}

/// Emitted when a slide has been replaced on screen.
#[derive(Clone, Copy, Debug)]
pub struct SlideFinishedEvent {
    /// Queue index of the slide.
    pub index: usize,
    /// Observed time on screen.
    pub duration: Duration,
    /// Observed swaps on screen.
    pub frame_count: u64,
    /// Planned swaps on screen.
    pub intended_frame_count: u64,
}

/// Emitted when a slide's GPU fence signals.
#[derive(Clone, Copy, Debug)]
pub struct CopyCompleteEvent {
    /// Queue index of the slide.
    pub index: usize,
    /// Host time the signal was observed.
    pub at: HostTime,
    /// `false` if the slide was no longer waiting for the copy.
    pub expected: bool,
}

/// Emitted when presentation ends on its own.
#[derive(Clone, Copy, Debug)]
pub struct PresentationEndEvent {
    /// Index of the slide left on screen.
    pub last_index: usize,
    /// Number of slides in the queue.
    pub slide_count: usize,
    /// Host time presentation ended.
    pub at: HostTime,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the presenter.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called after a slide is put on the back buffer.
    fn on_slide_rendered(&mut self, e: &SlideRenderedEvent) {
        _ = e;
    }

    /// Called when a slide appears on screen.
    fn on_slide_onset(&mut self, e: &SlideOnsetEvent) {
        _ = e;
    }

    /// Called when a slide is replaced on screen.
    fn on_slide_finished(&mut self, e: &SlideFinishedEvent) {
        _ = e;
    }

    /// Called when a GPU fence signals.
    fn on_copy_complete(&mut self, e: &CopyCompleteEvent) {
        _ = e;
    }

    /// Called when presentation ends.
    fn on_presentation_end(&mut self, e: &PresentationEndEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`SlideRenderedEvent`].
    #[inline]
    pub fn slide_rendered(&mut self, e: &SlideRenderedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_slide_rendered(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SlideOnsetEvent`].
    #[inline]
    pub fn slide_onset(&mut self, e: &SlideOnsetEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_slide_onset(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SlideFinishedEvent`].
    #[inline]
    pub fn slide_finished(&mut self, e: &SlideFinishedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_slide_finished(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CopyCompleteEvent`].
    #[inline]
    pub fn copy_complete(&mut self, e: &CopyCompleteEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_copy_complete(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PresentationEndEvent`].
    #[inline]
    pub fn presentation_end(&mut self, e: &PresentationEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_presentation_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

#[cfg(all(test, feature = "trace"))]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counting {
        onsets: u32,
        ends: u32,
    }

    impl TraceSink for Counting {
        fn on_slide_onset(&mut self, _: &SlideOnsetEvent) {
            self.onsets += 1;
        }

        fn on_presentation_end(&mut self, _: &PresentationEndEvent) {
            self.ends += 1;
        }
    }

    #[test]
    fn tracer_dispatches_to_sink() {
        let mut sink = Counting::default();
        let mut t = Tracer::new(&mut sink);
        t.slide_onset(&SlideOnsetEvent {
            index: 0,
            onset: HostTime(1),
            frame: 1,
            intended_frame: 1,
        });
        t.slide_rendered(&SlideRenderedEvent {
            index: 1,
            at: HostTime(2),
            fenced: false,
        });
        t.presentation_end(&PresentationEndEvent {
            last_index: 0,
            slide_count: 1,
            at: HostTime(3),
        });
        assert_eq!(sink.onsets, 1, "onset forwarded");
        assert_eq!(sink.ends, 1, "end forwarded");
    }

    #[test]
    fn none_discards() {
        let mut t = Tracer::none();
        t.copy_complete(&CopyCompleteEvent {
            index: 0,
            at: HostTime(0),
            expected: true,
        });
    }
}
