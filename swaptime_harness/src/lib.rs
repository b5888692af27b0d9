// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic presentation runs for tests and tooling.
//!
//! [`VirtualDisplay`] implements [`Display`](swaptime_core::display::Display)
//! on a clock that only moves when told to, with refreshes at exact multiples
//! of its period. Swaps, GPU fences and on-screen content are all simulated,
//! so a run of a [`SlidePresenter`](swaptime_core::presenter::SlidePresenter)
//! produces the same frame counts every time.
//!
//! ```
//! use swaptime_core::config::PresenterConfig;
//! use swaptime_core::presenter::SlidePresenter;
//! use swaptime_core::time::Duration;
//! use swaptime_harness::{VirtualConfig, VirtualDisplay, drive};
//!
//! let mut presenter = SlidePresenter::with_display(
//!     VirtualDisplay::new(VirtualConfig::SIXTY_HZ),
//!     PresenterConfig::multi_core(),
//! );
//! presenter.append_by_callback("a", Duration::from_millis(100), |c| c.draw("a")).unwrap();
//! presenter.append_by_callback("b", Duration::from_millis(100), |c| c.draw("b")).unwrap();
//! presenter.start().unwrap();
//! assert!(drive::run_to_end(&mut presenter, drive::DEFAULT_STEP, Duration::from_secs(1)));
//! assert_eq!(presenter.actual_frame_counts().unwrap()[0], 6);
//! ```

pub mod drive;
mod virtual_display;

pub use virtual_display::{
    ShownFrame, VirtualCanvas, VirtualConfig, VirtualDisplay, VirtualFence, VirtualSurface,
};
