// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Presenter configuration.

use crate::time::Duration;

/// How slides are swapped onto the screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SwappingMode {
    /// A background thread swaps every refresh; the presenter follows its
    /// swap events. Requires auto-swap on.
    #[default]
    MultiCore,
    /// The presenter issues its own blocking swaps from `update()`.
    /// Requires auto-swap off.
    SingleCoreBlocking,
    /// The presenter asks the background thread for one swap per slide.
    /// Requires auto-swap off.
    SingleCoreThreaded,
}

impl SwappingMode {
    /// Whether the display must swap continuously in this mode.
    #[must_use]
    pub const fn requires_auto_swap(self) -> bool {
        matches!(self, Self::MultiCore)
    }
}

/// How the next slide's planned onset reacts to a late slide.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ErrorMode {
    /// Plan from the current slide's actual onset when it came up late, so a
    /// delay only shortens or lengthens the slide before it.
    #[default]
    PropagateDelays,
    /// Always plan from intended onsets. Later slides are cut short to stay
    /// on the original schedule.
    NoCorrection,
}

/// Settings for a [`SlidePresenter`](crate::presenter::SlidePresenter).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PresenterConfig {
    /// Swap strategy.
    pub swapping_mode: SwappingMode,
    /// Drift handling.
    pub error_mode: ErrorMode,
    /// Release a slide's surface once it has been replaced on screen.
    pub release_completed_slides: bool,
    /// How long before a planned onset the single-core strategies start
    /// spinning on the swap. Clamped to one frame period minus 1 ms.
    pub pre_swap_busy_wait: Duration,
    /// Confirm GPU completion of each back-buffer copy with a fence.
    pub use_fence_sync: bool,
    /// Single-core only: hold the swap until the copy's fence has signaled.
    pub wait_for_fence_before_swap: bool,
}

impl PresenterConfig {
    /// Default busy-wait margin before a single-core swap.
    pub const DEFAULT_BUSY_WAIT: Duration = Duration::from_millis(5);

    /// Background swapping with delay propagation.
    #[must_use]
    pub const fn multi_core() -> Self {
        Self {
            swapping_mode: SwappingMode::MultiCore,
            error_mode: ErrorMode::PropagateDelays,
            release_completed_slides: true,
            pre_swap_busy_wait: Self::DEFAULT_BUSY_WAIT,
            use_fence_sync: true,
            wait_for_fence_before_swap: false,
        }
    }

    /// Presenter-issued blocking swaps.
    #[must_use]
    pub const fn single_core_blocking() -> Self {
        Self {
            swapping_mode: SwappingMode::SingleCoreBlocking,
            ..Self::multi_core()
        }
    }

    /// One requested background swap per slide.
    #[must_use]
    pub const fn single_core_threaded() -> Self {
        Self {
            swapping_mode: SwappingMode::SingleCoreThreaded,
            ..Self::multi_core()
        }
    }

    /// Returns this configuration with a different error mode.
    #[must_use]
    pub const fn with_error_mode(mut self, error_mode: ErrorMode) -> Self {
        self.error_mode = error_mode;
        self
    }
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self::multi_core()
    }
}
