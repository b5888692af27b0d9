// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Plain-text results table.

use std::fmt::Write;

use swaptime_core::report::PresentationErrors;
use swaptime_core::slide::SlideRecord;

/// Formats finished slides as a table, one row per slide, followed by the
/// error summary. Rows that count as errors are marked `***`.
#[must_use]
pub fn presentation_report(records: &[SlideRecord], errors: &PresentationErrors) -> String {
    let mut out = String::new();
    _ = writeln!(
        out,
        "{:>4}  {:<16} {:>11} {:>11} {:>7} {:>7} {:>7} {:>7} {:>10} {:>10} {:>11}",
        "#",
        "name",
        "plan ms",
        "onset ms",
        "plan f",
        "onset f",
        "frames",
        "shown",
        "plan dur",
        "dur",
        "copy ms",
    );
    let last = records.len().saturating_sub(1);
    for (i, r) in records.iter().enumerate() {
        let outcome = r.outcome();
        let (shown, duration) = if r.actual.is_unbounded() {
            ("open".to_owned(), "open".to_owned())
        } else {
            (
                r.actual.frame_count.to_string(),
                format!("{:.3}", r.actual.duration.as_millis_f64()),
            )
        };
        let copy = r
            .copy_complete_time
            .map_or_else(|| "-".to_owned(), |t| format!("{:.3}", t.as_millis_f64()));
        let wrong_count = i != last && outcome.actual_frames != outcome.intended_frames;
        let flag = if wrong_count || outcome.copied_late() {
            "  ***"
        } else {
            ""
        };
        _ = writeln!(
            out,
            "{i:>4}  {:<16} {:>11.3} {:>11.3} {:>7} {:>7} {:>7} {shown:>7} {:>10.3} {duration:>10} {copy:>11}{flag}",
            r.name,
            r.intended.start_time.as_millis_f64(),
            r.actual.start_time.as_millis_f64(),
            r.intended.start_frame,
            r.actual.start_frame,
            r.intended.frame_count,
            r.intended.duration.as_millis_f64(),
        );
    }
    if errors.checked {
        _ = writeln!(
            out,
            "errors: {} (frame counts {}, late copies {})",
            errors.total_errors(),
            errors.incorrect_frame_counts,
            errors.late_copies_to_back_buffer
        );
    } else {
        out.push_str("errors: unchecked\n");
    }
    out
}
