// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Background swap clock and display timing service.
//!
//! This crate implements [`swaptime_core::display::Display`] for real
//! (threaded, wall-clock) use:
//!
//! - [`time`]: host clock reads (`CLOCK_MONOTONIC` via `rustix` on unix).
//! - [`swap_clock::SwapClock`]: a dedicated thread issuing buffer swaps
//!   continuously or on request, publishing consistent swap samples.
//! - [`TimedDisplay`]: frame-period estimation, blocking swaps, render-target
//!   scoping and clamped surface copies on top of any [`Backend`].
//! - [`headless::HeadlessBackend`]: a CPU backend with a simulated refresh.

pub mod backend;
pub mod headless;
pub mod swap_clock;
pub mod time;
pub mod timed_display;

pub use backend::Backend;
pub use timed_display::{DisplayConfig, TimedDisplay};
