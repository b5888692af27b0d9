// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] writes finished slides as [Chrome Trace Event Format][spec]
//! JSON: planned and actual time on screen as complete events on two tracks,
//! and GPU copy completions as instant events.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use swaptime_core::slide::SlideRecord;
use swaptime_core::time::{Duration, HostTime};

const TID_ACTUAL: u32 = 0;
const TID_PLANNED: u32 = 1;
const TID_GPU: u32 = 2;

/// Exports slide records as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Slides that never reached the screen are omitted; the slide left on
/// screen at the end is an instant event.
pub fn export(records: &[SlideRecord], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for (index, r) in records.iter().enumerate() {
        if index > 0 && r.actual.start_time == HostTime::ZERO {
            continue;
        }
        let args = json!({
            "index": index,
            "planned_frames": r.intended.frame_count,
            "planned_start_frame": r.intended.start_frame,
            "start_frame": r.actual.start_frame,
            "frames": (!r.actual.is_unbounded()).then_some(r.actual.frame_count),
        });
        if r.actual.is_unbounded() {
            events.push(json!({
                "ph": "i",
                "name": r.name,
                "cat": "Slide",
                "ts": host_us(r.actual.start_time),
                "pid": 0,
                "tid": TID_ACTUAL,
                "s": "t",
                "args": args,
            }));
        } else {
            events.push(json!({
                "ph": "X",
                "name": r.name,
                "cat": "Slide",
                "ts": host_us(r.actual.start_time),
                "dur": duration_us(r.actual.duration),
                "pid": 0,
                "tid": TID_ACTUAL,
                "args": args,
            }));
        }
        events.push(json!({
            "ph": "X",
            "name": r.name,
            "cat": "Plan",
            "ts": host_us(r.intended.start_time),
            "dur": duration_us(r.intended.duration),
            "pid": 0,
            "tid": TID_PLANNED,
            "args": { "index": index },
        }));
        if let Some(at) = r.copy_complete_time {
            events.push(json!({
                "ph": "i",
                "name": "CopyComplete",
                "cat": "Gpu",
                "ts": host_us(at),
                "pid": 0,
                "tid": TID_GPU,
                "s": "t",
                "args": {
                    "index": index,
                    "late": r.outcome().copied_late(),
                }
            }));
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn host_us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}

fn duration_us(d: Duration) -> f64 {
    d.nanos() as f64 / 1000.0
}
