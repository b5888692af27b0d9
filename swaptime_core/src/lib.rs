// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-accurate, swap-locked slide presentation.
//!
//! `swaptime_core` schedules the onset and offset of visual stimuli so that
//! each one stays on screen for an exact number of display refreshes. It is
//! `no_std` compatible (with `alloc`) and never touches a clock, a thread or
//! a GPU itself; all of that sits behind the [`Display`](display::Display)
//! trait.
//!
//! # Architecture
//!
//! ```text
//!   caller ──append──► SlideQueue
//!     │
//!     └──update()──► SwapStrategy ◄──swap events── Display (swap clock)
//!                         │
//!                         ├──draw next slide──► back buffer ──fence──┐
//!                         │                                          │
//!                         ◄──────────────poll_ready()────────────────┘
//!                         ▼
//!               actual timing ──► check_outcomes() ──► PresentationErrors
//! ```
//!
//! **[`time`]**: nanosecond host time and durations with integer frame
//! arithmetic.
//!
//! **[`swap`]**: swap telemetry published by a swap source, per-consumer
//! swap cursors and a rolling swap-interval history.
//!
//! **[`display`]**: the [`Display`](display::Display) contract: swap
//! telemetry, blocking and background swaps, render targets and GPU fences.
//!
//! **[`slide`]**: slides, their lifecycle status and their intended and
//! actual timing.
//!
//! **[`config`]**: presenter settings and presets.
//!
//! **[`presenter`]**: the [`SlidePresenter`](presenter::SlidePresenter)
//! queue and scheduler with its three swap strategies.
//!
//! **[`report`]**: post-hoc classification of timing errors.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! presentation instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod config;
pub mod display;
pub mod presenter;
pub mod report;
pub mod slide;
pub mod swap;
pub mod time;
pub mod trace;
