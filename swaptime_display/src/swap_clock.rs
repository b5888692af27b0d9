// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Background buffer-swap thread.
//!
//! [`SwapClock`] owns at most one worker thread that calls
//! [`SwapBuffers::swap_buffers`] back to back, either continuously
//! ([`set_auto_swap`](SwapClock::set_auto_swap)) or for a fixed number of
//! swaps ([`request_swaps`](SwapClock::request_swaps)). After each swap it
//! publishes a [`SwapSample`] (count and timestamp together, under one lock)
//! and feeds a rolling [`SwapHistory`].
//!
//! Readers copy the sample out; each consumer detects new swaps with its own
//! [`SwapCursor`].

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error};
use parking_lot::{Condvar, Mutex};
use swaptime_core::swap::{SwapCursor, SwapHistory, SwapSample};
use swaptime_core::time::{Duration, HostTime};

use crate::time::{now, to_std};

/// Swap intervals kept for [`SwapClock::typical_swap_period`].
pub const HISTORY_LEN: usize = 32;

/// Presents the back buffer and blocks until the swap has completed.
///
/// Called from the swap thread, so implementations must be shareable.
pub trait SwapBuffers: Send + Sync + 'static {
    /// Swaps the front and back buffers, blocking until the swap completes.
    fn swap_buffers(&self);
}

#[derive(Debug, Default)]
struct Telemetry {
    latest: SwapSample,
    history: SwapHistory<HISTORY_LEN>,
}

#[derive(Debug, Default)]
struct Control {
    continuous: bool,
    pending: u64,
    stop: bool,
    running: bool,
}

#[derive(Debug, Default)]
struct Shared {
    telemetry: Mutex<Telemetry>,
    swapped: Condvar,
    control: Mutex<Control>,
}

/// Swap telemetry source backed by a dedicated swap thread.
pub struct SwapClock<S: SwapBuffers> {
    swapper: Arc<S>,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl<S: SwapBuffers> std::fmt::Debug for SwapClock<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwapClock")
            .field("latest", &self.latest())
            .field("auto_swapping", &self.is_auto_swapping())
            .finish_non_exhaustive()
    }
}

impl<S: SwapBuffers> SwapClock<S> {
    /// Creates an idle clock around `swapper`.
    #[must_use]
    pub fn new(swapper: Arc<S>) -> Self {
        Self {
            swapper,
            shared: Arc::default(),
            worker: None,
        }
    }

    /// The swapper the worker thread calls.
    #[must_use]
    pub fn swapper(&self) -> &Arc<S> {
        &self.swapper
    }

    /// Starts or stops continuous swapping.
    ///
    /// Starting while the thread already runs only switches it to continuous
    /// mode. Stopping blocks until the thread has exited; outstanding
    /// requested swaps are dropped.
    pub fn set_auto_swap(&mut self, enabled: bool) {
        if enabled {
            let spawn = {
                let mut control = self.shared.control.lock();
                control.continuous = true;
                !control.running
            };
            if spawn {
                self.spawn();
            }
        } else {
            {
                let mut control = self.shared.control.lock();
                control.continuous = false;
                control.pending = 0;
                control.stop = true;
            }
            self.join();
            self.shared.control.lock().stop = false;
        }
    }

    /// Whether the thread is swapping continuously.
    #[must_use]
    pub fn is_auto_swapping(&self) -> bool {
        self.shared.control.lock().continuous
    }

    /// Queues exactly `n` more swaps on the swap thread without enabling
    /// continuous mode.
    pub fn request_swaps(&mut self, n: u32) {
        if n == 0 {
            return;
        }
        let spawn = {
            let mut control = self.shared.control.lock();
            control.pending += u64::from(n);
            !control.running
        };
        if spawn {
            self.spawn();
        }
    }

    fn spawn(&mut self) {
        // A previous worker may have run out of work; reap it first.
        self.join();
        self.shared.control.lock().running = true;
        let shared = Arc::clone(&self.shared);
        let swapper = Arc::clone(&self.swapper);
        let spawned = thread::Builder::new()
            .name("swaptime-swap".into())
            .spawn(move || swap_loop(&shared, &*swapper));
        match spawned {
            Ok(handle) => self.worker = Some(handle),
            Err(e) => {
                error!("failed to spawn the swap thread: {e}");
                let mut control = self.shared.control.lock();
                control.running = false;
                control.continuous = false;
                control.pending = 0;
            }
        }
    }

    fn join(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!("swap thread panicked");
                self.shared.control.lock().running = false;
            }
        }
    }

    /// The most recent swap, read as one consistent snapshot.
    #[must_use]
    pub fn latest(&self) -> SwapSample {
        self.shared.telemetry.lock().latest
    }

    /// Returns `true` if a swap completed since `cursor` last looked.
    pub fn swapped_since(&self, cursor: &mut SwapCursor) -> bool {
        cursor.advance(self.latest().count)
    }

    /// Mean of the last [`HISTORY_LEN`] swap intervals.
    #[must_use]
    pub fn typical_swap_period(&self) -> Option<Duration> {
        self.shared.telemetry.lock().history.typical_period()
    }

    /// Interval between the last two swaps.
    #[must_use]
    pub fn last_swap_period(&self) -> Option<Duration> {
        self.shared.telemetry.lock().history.last_period()
    }

    /// Blocks until at least `count` swaps have completed or `timeout`
    /// elapsed. Returns the latest sample either way.
    pub fn wait_for_count(&self, count: u64, timeout: Duration) -> SwapSample {
        let deadline = now().saturating_add(timeout);
        let mut telemetry = self.shared.telemetry.lock();
        while telemetry.latest.count < count {
            let left = deadline.saturating_duration_since(now());
            if left.is_zero() {
                break;
            }
            _ = self.shared.swapped.wait_for(&mut telemetry, to_std(left));
        }
        telemetry.latest
    }
}

impl<S: SwapBuffers> Drop for SwapClock<S> {
    fn drop(&mut self) {
        self.set_auto_swap(false);
    }
}

fn swap_loop<S: SwapBuffers + ?Sized>(shared: &Shared, swapper: &S) {
    debug!("swap thread started");
    loop {
        {
            let mut control = shared.control.lock();
            if control.stop || !(control.continuous || control.pending > 0) {
                control.running = false;
                break;
            }
            if !control.continuous {
                control.pending -= 1;
            }
        }

        swapper.swap_buffers();
        let at: HostTime = now();

        let mut telemetry = shared.telemetry.lock();
        telemetry.latest = telemetry.latest.next(at);
        telemetry.history.observe(at);
        drop(telemetry);
        shared.swapped.notify_all();
    }
    debug!("swap thread exited");
}
