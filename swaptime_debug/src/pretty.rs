// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Host times are
//! printed in milliseconds.

use std::io::Write;

use swaptime_core::trace::{
    CopyCompleteEvent, PresentationEndEvent, SlideFinishedEvent, SlideOnsetEvent,
    SlideRenderedEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_slide_rendered(&mut self, e: &SlideRenderedEvent) {
        _ = writeln!(
            self.writer,
            "[render] slide={} at {:.3}ms{}",
            e.index,
            e.at.as_millis_f64(),
            if e.fenced { " fenced" } else { "" },
        );
    }

    fn on_slide_onset(&mut self, e: &SlideOnsetEvent) {
        let slip = e.frame.abs_diff(e.intended_frame);
        let verdict = match e.frame.cmp(&e.intended_frame) {
            core::cmp::Ordering::Equal => "on time".to_owned(),
            core::cmp::Ordering::Greater => format!("LATE by {slip}"),
            core::cmp::Ordering::Less => format!("EARLY by {slip}"),
        };
        _ = writeln!(
            self.writer,
            "[onset] slide={} frame={} planned={} at {:.3}ms {verdict}",
            e.index,
            e.frame,
            e.intended_frame,
            e.onset.as_millis_f64(),
        );
    }

    fn on_slide_finished(&mut self, e: &SlideFinishedEvent) {
        let ok = if e.frame_count == e.intended_frame_count {
            "ok"
        } else {
            "MISMATCH"
        };
        _ = writeln!(
            self.writer,
            "[finish] slide={} frames={}/{} duration={:.3}ms {ok}",
            e.index,
            e.frame_count,
            e.intended_frame_count,
            e.duration.as_millis_f64(),
        );
    }

    fn on_copy_complete(&mut self, e: &CopyCompleteEvent) {
        _ = writeln!(
            self.writer,
            "[copy] slide={} at {:.3}ms{}",
            e.index,
            e.at.as_millis_f64(),
            if e.expected { "" } else { " AFTER ONSET" },
        );
    }

    fn on_presentation_end(&mut self, e: &PresentationEndEvent) {
        _ = writeln!(
            self.writer,
            "[end] last={} of {} at {:.3}ms",
            e.last_index,
            e.slide_count,
            e.at.as_millis_f64(),
        );
    }
}
