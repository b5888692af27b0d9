// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Post-hoc presentation error classification.

use crate::slide::SlideOutcome;

/// Timing errors found in a finished presentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PresentationErrors {
    /// `false` if the check was refused because presentation was running.
    pub checked: bool,
    /// Slides, other than the last, shown for a different number of swaps
    /// than planned.
    pub incorrect_frame_counts: usize,
    /// Slides whose back-buffer copy completed after they were on screen.
    pub late_copies_to_back_buffer: usize,
}

impl PresentationErrors {
    /// The result of a refused check.
    pub const UNCHECKED: Self = Self {
        checked: false,
        incorrect_frame_counts: 0,
        late_copies_to_back_buffer: 0,
    };

    /// Sum of all error counts.
    #[must_use]
    pub const fn total_errors(&self) -> usize {
        self.incorrect_frame_counts + self.late_copies_to_back_buffer
    }
}

/// Classifies the outcomes of a finished presentation, in queue order.
///
/// The last slide's frame count is not compared, since nothing ever replaced
/// it on screen.
#[must_use]
pub fn check_outcomes(outcomes: impl IntoIterator<Item = SlideOutcome>) -> PresentationErrors {
    let mut errors = PresentationErrors {
        checked: true,
        ..PresentationErrors::default()
    };
    let mut pending_mismatch = false;
    for outcome in outcomes {
        // A mismatch only counts once we know the slide was not the last.
        if pending_mismatch {
            errors.incorrect_frame_counts += 1;
        }
        pending_mismatch = outcome.actual_frames != outcome.intended_frames;
        if outcome.copied_late() {
            errors.late_copies_to_back_buffer += 1;
        }
    }
    errors
}
