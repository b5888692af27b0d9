// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing, result tables and Chrome trace export for swaptime
//! presentations.
//!
//! - [`pretty::PrettyPrintSink`]: a [`TraceSink`](swaptime_core::trace::TraceSink)
//!   writing one line per presenter event.
//! - [`report::presentation_report`]: a plain-text table of finished slides
//!   with their errors flagged.
//! - [`chrome::export`]: Chrome Trace Event Format JSON of finished slides.

pub mod chrome;
pub mod pretty;
pub mod report;
