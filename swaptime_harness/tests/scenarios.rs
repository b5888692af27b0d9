// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end presentations on a virtual 60 Hz display.

use std::cell::RefCell;
use std::rc::Rc;

use swaptime_core::config::{ErrorMode, PresenterConfig};
use swaptime_core::display::Display;
use swaptime_core::presenter::{PresenterError, SessionState, SlidePresenter};
use swaptime_core::report::PresentationErrors;
use swaptime_core::slide::SlideStatus;
use swaptime_core::time::{Duration, HostTime};
use swaptime_core::trace::{
    PresentationEndEvent, SlideFinishedEvent, SlideOnsetEvent, SlideRenderedEvent, TraceSink,
};
use swaptime_harness::drive::{DEFAULT_STEP, run_to_end, run_until};
use swaptime_harness::{VirtualConfig, VirtualDisplay};

const P: Duration = VirtualConfig::SIXTY_HZ.period;
const LIMIT: Duration = Duration::from_secs(10);

fn presenter(config: PresenterConfig, display: VirtualConfig) -> SlidePresenter<VirtualDisplay> {
    SlidePresenter::with_display(VirtualDisplay::new(display), config)
}

fn append_labeled(p: &mut SlidePresenter<VirtualDisplay>, label: &'static str, millis: u64) {
    p.append_by_callback(label, Duration::from_millis(millis), move |c| c.draw(label))
        .unwrap();
}

fn shown_labels(p: &SlidePresenter<VirtualDisplay>) -> Vec<(u64, &str)> {
    p.display()
        .unwrap()
        .shown()
        .iter()
        .map(|f| (f.frame, f.content.as_deref().unwrap_or_default()))
        .collect()
}

// ---------------------------------------------------------------------------
// Basic runs
// ---------------------------------------------------------------------------

#[test]
fn three_slides_get_their_frame_counts() {
    let mut p = presenter(PresenterConfig::multi_core(), VirtualConfig::SIXTY_HZ);
    append_labeled(&mut p, "a", 1000);
    append_labeled(&mut p, "b", 250);
    append_labeled(&mut p, "c", 500);
    p.start().unwrap();
    assert!(run_to_end(&mut p, DEFAULT_STEP, LIMIT), "presentation ends");

    let slides = p.presented_slides().unwrap();
    let intended: Vec<_> = slides.iter().map(|s| s.intended.frame_count).collect();
    assert_eq!(intended, [60, 15, 30], "planned from the refresh rate");

    let actual = p.actual_frame_counts().unwrap();
    assert_eq!(actual[..2], [60, 15], "replaced slides ran for their plan");
    assert!(slides[2].actual.is_unbounded(), "last slide never replaced");
    assert_eq!(
        p.actual_durations().unwrap()[2],
        Duration::MAX,
        "last slide duration unknown"
    );

    assert_eq!(
        shown_labels(&p),
        [(2, "a"), (62, "b"), (77, "c")],
        "each slide reached the screen on its planned swap"
    );

    let errors = p.check_for_errors();
    assert!(errors.checked, "checked after the run");
    assert_eq!(errors.total_errors(), 0, "{errors:?}");
    assert_eq!(p.session_state(), SessionState::Idle, "back to idle");
    assert_eq!(p.current_slide_index(), 2, "last slide stays up");
}

#[test]
fn presented_slides_match_what_was_appended() {
    let lists: [&[u64]; 5] = [
        &[100],
        &[50, 50],
        &[100, 200, 50, 150],
        &[17, 33, 50, 67],
        &[250, 16, 250],
    ];
    for mode in [ErrorMode::PropagateDelays, ErrorMode::NoCorrection] {
        for durations in lists {
            let config = PresenterConfig::multi_core().with_error_mode(mode);
            let mut p = presenter(config, VirtualConfig::SIXTY_HZ);
            for &ms in durations {
                p.append_by_callback("s", Duration::from_millis(ms), |c| c.draw("s"))
                    .unwrap();
            }
            p.start().unwrap();
            assert!(run_to_end(&mut p, DEFAULT_STEP, LIMIT), "{durations:?} ends");

            let slides = p.presented_slides().unwrap();
            assert_eq!(slides.len(), durations.len(), "{durations:?}: one per append");
            for s in &slides[..slides.len() - 1] {
                assert_eq!(
                    s.actual.frame_count, s.intended.frame_count,
                    "{mode:?} {durations:?}: no jitter means exact counts"
                );
                assert_eq!(s.status, SlideStatus::Finished, "replaced slides finish");
            }
            assert_eq!(p.check_for_errors().total_errors(), 0, "{durations:?}");
        }
    }
}

#[test]
fn zero_duration_slides_are_rejected() {
    let mut p = presenter(PresenterConfig::multi_core(), VirtualConfig::SIXTY_HZ);
    append_labeled(&mut p, "a", 100);
    let err = p
        .append_by_callback("zero", Duration::ZERO, |c| c.draw("zero"))
        .unwrap_err();
    assert_eq!(err, PresenterError::ZeroDuration, "rejected");
    assert_eq!(p.slide_count(), 1, "queue unchanged");

    let err = p
        .draw_next_slide("zero", Duration::ZERO, |c| c.draw("zero"))
        .unwrap_err();
    assert_eq!(err, PresenterError::ZeroDuration, "rejected");
    assert_eq!(p.slide_count(), 1, "queue unchanged");
    assert_eq!(
        p.display().unwrap().live_surfaces(),
        0,
        "surface of the rejected slide was released"
    );
}

// ---------------------------------------------------------------------------
// Drift after a missed refresh
// ---------------------------------------------------------------------------

/// Five 100 ms slides; the caller stalls for three periods while the second
/// slide is up, so the third slide comes on screen two swaps late.
fn stalled_run(mode: ErrorMode) -> SlidePresenter<VirtualDisplay> {
    let config = PresenterConfig::multi_core().with_error_mode(mode);
    let mut p = presenter(config, VirtualConfig::SIXTY_HZ);
    for label in ["s0", "s1", "s2", "s3", "s4"] {
        append_labeled(&mut p, label, 100);
    }
    p.start().unwrap();
    run_until(&mut p, HostTime(205_000_000), DEFAULT_STEP);
    assert_eq!(p.current_slide_index(), 1, "second slide is up before the stall");
    p.display_mut().unwrap().advance(P.times(3));
    assert!(run_to_end(&mut p, DEFAULT_STEP, LIMIT), "presentation ends");
    p
}

#[test]
fn propagated_delay_shifts_later_slides() {
    let p = stalled_run(ErrorMode::PropagateDelays);
    let slides = p.presented_slides().unwrap();
    let counts: Vec<_> = slides[..4].iter().map(|s| s.actual.frame_count).collect();
    assert_eq!(counts, [6, 8, 6, 6], "only the stalled slide ran long");

    let late = &slides[2];
    assert_eq!(
        late.actual.start_frame - late.intended.start_frame,
        2,
        "third slide two swaps late"
    );
    let shift = late.actual.start_time.saturating_duration_since(late.intended.start_time);
    assert!(
        shift.saturating_sub(P.times(2)) < Duration::from_micros(1),
        "late by two periods, got {shift:?}"
    );
    assert_eq!(slides[3].actual.start_frame, 22, "rest of the plan moved");

    let errors = p.check_for_errors();
    assert_eq!(errors.incorrect_frame_counts, 1, "{errors:?}");
    assert_eq!(errors.late_copies_to_back_buffer, 0, "{errors:?}");
}

#[test]
fn uncorrected_delay_keeps_the_schedule() {
    let p = stalled_run(ErrorMode::NoCorrection);
    let slides = p.presented_slides().unwrap();
    let counts: Vec<_> = slides[..4].iter().map(|s| s.actual.frame_count).collect();
    assert_eq!(counts, [6, 8, 4, 6], "late slide cut short");
    assert_eq!(
        slides[2].actual.start_frame - slides[2].intended.start_frame,
        2,
        "third slide two swaps late"
    );
    assert_eq!(
        slides[3].actual.start_frame, slides[3].intended.start_frame,
        "fourth slide back on schedule"
    );
    assert_eq!(slides[3].actual.start_frame, 20, "original plan");

    let errors = p.check_for_errors();
    assert_eq!(errors.incorrect_frame_counts, 2, "{errors:?}");
}

// ---------------------------------------------------------------------------
// GPU fences
// ---------------------------------------------------------------------------

#[test]
fn slow_gpu_copies_are_reported_late() {
    let gpu = VirtualConfig {
        gpu_latency: Some(P.times(2)),
        ..VirtualConfig::SIXTY_HZ
    };
    let mut p = presenter(PresenterConfig::multi_core(), gpu);
    for label in ["a", "b", "c"] {
        append_labeled(&mut p, label, 100);
    }
    p.start().unwrap();
    run_until(&mut p, HostTime::ZERO + LIMIT, DEFAULT_STEP);
    assert!(!p.is_presenting(), "presentation ends");
    assert!(p.awaiting_fences(), "last copy still in flight at the end");
    assert!(
        p.presented_slides().unwrap()[2].copy_complete_time.is_none(),
        "not signaled yet"
    );

    assert!(run_to_end(&mut p, DEFAULT_STEP, LIMIT), "fences settle while idle");
    assert!(!p.awaiting_fences(), "every fence polled to completion");
    let slides = p.presented_slides().unwrap();
    assert!(slides[0].copy_complete_time.is_some(), "first copy observed");
    let last = &slides[2];
    let copied = last.copy_complete_time.expect("last copy observed after the end");
    assert!(copied > last.actual.start_time, "last copy finished after its onset");

    let errors = p.check_for_errors();
    assert_eq!(errors.late_copies_to_back_buffer, 3, "{errors:?}");
    assert_eq!(errors.incorrect_frame_counts, 0, "{errors:?}");
    assert_eq!(errors.total_errors(), 3, "{errors:?}");
}

#[test]
fn stop_drops_fences_left_by_the_last_run() {
    let gpu = VirtualConfig {
        gpu_latency: Some(P.times(6)),
        ..VirtualConfig::SIXTY_HZ
    };
    let mut p = presenter(PresenterConfig::multi_core(), gpu);
    append_labeled(&mut p, "a", 100);
    p.start().unwrap();
    run_until(&mut p, HostTime::ZERO + LIMIT, DEFAULT_STEP);
    assert!(p.awaiting_fences(), "only slide still copying");

    p.stop();
    assert!(!p.awaiting_fences(), "stop discards fences");
}

#[test]
fn displays_without_fences_disable_fence_sync() {
    let no_fences = VirtualConfig {
        gpu_latency: None,
        ..VirtualConfig::SIXTY_HZ
    };
    let mut p = presenter(PresenterConfig::multi_core(), no_fences);
    assert!(!p.config().use_fence_sync, "turned off at setup");
    append_labeled(&mut p, "a", 100);
    append_labeled(&mut p, "b", 100);
    p.start().unwrap();
    assert!(run_to_end(&mut p, DEFAULT_STEP, LIMIT), "presentation ends");
    let slides = p.presented_slides().unwrap();
    assert!(
        slides.iter().all(|s| s.copy_complete_time.is_none()),
        "no copy times without fences"
    );
    assert_eq!(p.check_for_errors().total_errors(), 0, "clean run");
}

// ---------------------------------------------------------------------------
// Final-slide callback
// ---------------------------------------------------------------------------

#[test]
fn final_slide_callback_extends_the_presentation() {
    let mut p = presenter(PresenterConfig::multi_core(), VirtualConfig::SIXTY_HZ);
    append_labeled(&mut p, "s0", 50);
    let calls = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&calls);
    p.set_final_slide_callback(move |ctx| {
        let mut seen = seen.borrow_mut();
        seen.push(ctx.current_slide_index());
        if seen.len() <= 5 {
            ctx.append_by_callback("more", Duration::from_millis(50), |c| c.draw("more"))
                .unwrap();
        }
    });
    p.start().unwrap();
    assert!(run_to_end(&mut p, DEFAULT_STEP, LIMIT), "presentation ends");

    assert_eq!(*calls.borrow(), [0, 1, 2, 3, 4, 5], "once per last slide");
    assert_eq!(p.slide_count(), 6, "five slides appended");
    assert_eq!(p.session_state(), SessionState::Idle, "ended when none were added");
    let counts = p.actual_frame_counts().unwrap();
    assert_eq!(counts[..5], [3, 3, 3, 3, 3], "appended slides keep time");
    assert_eq!(counts[5], u64::MAX, "last unbounded");
}

#[test]
fn final_slide_callback_can_stop_early() {
    let mut p = presenter(PresenterConfig::multi_core(), VirtualConfig::SIXTY_HZ);
    append_labeled(&mut p, "a", 50);
    p.set_final_slide_callback(|ctx| {
        ctx.draw_next_slide("never shown", Duration::from_millis(50), |c| c.draw("x"))
            .unwrap();
        ctx.stop();
    });
    p.start().unwrap();
    assert!(run_to_end(&mut p, DEFAULT_STEP, LIMIT), "presentation ends");
    let slides = p.presented_slides().unwrap();
    assert_eq!(slides.len(), 2, "appended slide kept in the queue");
    assert_eq!(slides[1].status, SlideStatus::NotStarted, "but never shown");
    assert_eq!(p.current_slide_index(), 0, "first slide stays up");
}

// ---------------------------------------------------------------------------
// Results while presenting
// ---------------------------------------------------------------------------

#[test]
fn results_are_refused_while_presenting() {
    let mut p = presenter(PresenterConfig::multi_core(), VirtualConfig::SIXTY_HZ);
    append_labeled(&mut p, "a", 500);
    append_labeled(&mut p, "b", 500);
    p.start().unwrap();
    run_until(&mut p, HostTime(100_000_000), DEFAULT_STEP);
    assert!(p.is_presenting(), "still running");
    assert_eq!(
        p.check_for_errors(),
        PresentationErrors::UNCHECKED,
        "no verdict mid-run"
    );
    assert_eq!(
        p.presented_slides().unwrap_err(),
        PresenterError::StillPresenting,
        "timing not final"
    );
    assert_eq!(
        p.slide_status(0),
        Some(SlideStatus::InProgress),
        "status readable any time"
    );
    p.stop();
    assert!(p.check_for_errors().checked, "readable after stop");
}

// ---------------------------------------------------------------------------
// Surface slides
// ---------------------------------------------------------------------------

#[test]
fn prerendered_surfaces_are_shown_and_released() {
    let mut p = presenter(PresenterConfig::multi_core(), VirtualConfig::SIXTY_HZ);
    p.begin_next_slide("red", Duration::from_millis(100)).unwrap();
    p.canvas().unwrap().draw("red");
    p.end_current_slide().unwrap();
    p.draw_next_slide("green", Duration::from_millis(100), |c| c.draw("green"))
        .unwrap();
    // Left open on purpose: start() finishes it.
    p.begin_next_slide("blue", Duration::from_millis(100)).unwrap();
    p.canvas().unwrap().draw("blue");
    assert_eq!(p.display().unwrap().live_surfaces(), 3, "one per slide");

    p.start().unwrap();
    assert!(run_to_end(&mut p, DEFAULT_STEP, LIMIT), "presentation ends");

    assert_eq!(
        shown_labels(&p),
        [(2, "red"), (8, "green"), (14, "blue")],
        "surfaces copied on time"
    );
    let display = p.display().unwrap();
    assert_eq!(display.live_surfaces(), 0, "all released");
    assert_eq!(display.released_surfaces(), 3, "each once");
}

#[test]
fn surfaces_are_kept_when_release_is_off() {
    let config = PresenterConfig {
        release_completed_slides: false,
        ..PresenterConfig::multi_core()
    };
    let mut p = presenter(config, VirtualConfig::SIXTY_HZ);
    p.draw_next_slide("a", Duration::from_millis(50), |c| c.draw("a"))
        .unwrap();
    p.draw_next_slide("b", Duration::from_millis(50), |c| c.draw("b"))
        .unwrap();
    p.start().unwrap();
    assert!(run_to_end(&mut p, DEFAULT_STEP, LIMIT), "presentation ends");
    assert_eq!(p.display().unwrap().live_surfaces(), 2, "kept for a rerun");

    p.start().unwrap();
    assert!(run_to_end(&mut p, DEFAULT_STEP, LIMIT), "rerun ends");
    assert_eq!(p.actual_frame_counts().unwrap()[0], 3, "rerun keeps time");

    p.clear_slides();
    assert_eq!(p.slide_count(), 0, "cleared");
    assert_eq!(p.display().unwrap().live_surfaces(), 0, "released on clear");
}

// ---------------------------------------------------------------------------
// Single-core strategies
// ---------------------------------------------------------------------------

fn four_slides(config: PresenterConfig) -> SlidePresenter<VirtualDisplay> {
    let mut p = presenter(config, VirtualConfig::SIXTY_HZ);
    for label in ["a", "b", "c", "d"] {
        append_labeled(&mut p, label, 100);
    }
    p.start().unwrap();
    assert!(
        !p.display().unwrap().is_auto_swapping(),
        "single-core runs swap on demand"
    );
    assert!(run_to_end(&mut p, DEFAULT_STEP, LIMIT), "presentation ends");
    p
}

#[test]
fn single_core_blocking_keeps_time() {
    let p = four_slides(PresenterConfig::single_core_blocking());
    assert_eq!(p.actual_frame_counts().unwrap()[..3], [6, 6, 6], "exact counts");
    assert_eq!(
        shown_labels(&p),
        [
            (2, "a"),
            (3, "b"),
            (4, "c"),
            (5, "d")
        ],
        "one blocking swap per slide"
    );
    let onsets: Vec<_> = p
        .presented_slides()
        .unwrap()
        .iter()
        .map(|s| s.actual.start_time)
        .collect();
    assert_eq!(
        onsets,
        [2, 8, 14, 20].map(|k| HostTime::ZERO + P.times(k)),
        "each onset on its planned refresh"
    );
    assert_eq!(p.check_for_errors().total_errors(), 0, "clean run");
}

/// Four 100 ms single-core slides on a GPU that needs 25 ms per copy, more
/// than the busy-wait margin before a swap.
fn slow_copy_run(wait_for_fence_before_swap: bool) -> SlidePresenter<VirtualDisplay> {
    let gpu = VirtualConfig {
        gpu_latency: Some(Duration::from_millis(25)),
        ..VirtualConfig::SIXTY_HZ
    };
    let config = PresenterConfig {
        wait_for_fence_before_swap,
        ..PresenterConfig::single_core_blocking()
    };
    assert!(
        Duration::from_millis(25) > config.pre_swap_busy_wait,
        "copy outlasts the busy wait"
    );
    let mut p = presenter(config, gpu);
    for label in ["a", "b", "c", "d"] {
        append_labeled(&mut p, label, 100);
    }
    p.start().unwrap();
    assert!(run_to_end(&mut p, DEFAULT_STEP, LIMIT), "presentation ends");
    p
}

#[test]
fn single_core_swap_waits_for_the_copy() {
    let p = slow_copy_run(true);
    let slides = p.presented_slides().unwrap();
    for (i, slide) in slides.iter().enumerate() {
        let copied = slide.copy_complete_time.expect("every copy observed");
        assert!(
            copied <= slide.actual.start_time,
            "slide {i} swapped in at {:?} before its copy finished at {copied:?}",
            slide.actual.start_time,
        );
    }
    // The first copy ends 25 ms after the refresh lock at P, past 2P.
    assert_eq!(
        slides.iter().map(|s| s.actual.start_time).collect::<Vec<_>>(),
        [3, 9, 15, 21].map(|k| HostTime::ZERO + P.times(k)),
        "first swap held one refresh for its copy"
    );
    assert_eq!(p.actual_frame_counts().unwrap()[..3], [6, 6, 6], "exact counts");
    let errors = p.check_for_errors();
    assert_eq!(errors.late_copies_to_back_buffer, 0, "{errors:?}");
    assert_eq!(errors.total_errors(), 0, "{errors:?}");
}

#[test]
fn single_core_swap_without_waiting_shows_a_late_copy() {
    let p = slow_copy_run(false);
    let first = &p.presented_slides().unwrap()[0];
    assert_eq!(first.actual.start_time, HostTime::ZERO + P.times(2), "not held");
    let errors = p.check_for_errors();
    assert_eq!(errors.late_copies_to_back_buffer, 1, "{errors:?}");
}

#[test]
fn single_core_threaded_keeps_time() {
    let p = four_slides(PresenterConfig::single_core_threaded());
    assert_eq!(p.actual_frame_counts().unwrap()[..3], [6, 6, 6], "exact counts");
    let onsets: Vec<_> = p
        .presented_slides()
        .unwrap()
        .iter()
        .map(|s| s.actual.start_time)
        .collect();
    assert_eq!(
        onsets,
        [2, 8, 14, 20].map(|k| HostTime::ZERO + P.times(k)),
        "each onset on its planned refresh"
    );
    assert_eq!(p.check_for_errors().total_errors(), 0, "clean run");
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Counts {
    rendered: usize,
    onsets: Vec<(usize, u64, u64)>,
    finished: usize,
    ends: Vec<usize>,
}

struct Shared(Rc<RefCell<Counts>>);

impl TraceSink for Shared {
    fn on_slide_rendered(&mut self, _: &SlideRenderedEvent) {
        self.0.borrow_mut().rendered += 1;
    }

    fn on_slide_onset(&mut self, e: &SlideOnsetEvent) {
        self.0
            .borrow_mut()
            .onsets
            .push((e.index, e.frame, e.intended_frame));
    }

    fn on_slide_finished(&mut self, _: &SlideFinishedEvent) {
        self.0.borrow_mut().finished += 1;
    }

    fn on_presentation_end(&mut self, e: &PresentationEndEvent) {
        self.0.borrow_mut().ends.push(e.last_index);
    }
}

#[test]
fn trace_sink_sees_every_slide() {
    let counts = Rc::new(RefCell::new(Counts::default()));
    let mut p = presenter(PresenterConfig::multi_core(), VirtualConfig::SIXTY_HZ);
    p.set_trace_sink(Box::new(Shared(Rc::clone(&counts))));
    for label in ["a", "b", "c"] {
        append_labeled(&mut p, label, 100);
    }
    p.start().unwrap();
    assert!(run_to_end(&mut p, DEFAULT_STEP, LIMIT), "presentation ends");

    let counts = counts.borrow();
    assert_eq!(counts.rendered, 3, "each slide drawn once");
    assert_eq!(
        counts.onsets,
        [(0, 2, 2), (1, 8, 8), (2, 14, 14)],
        "onsets on plan"
    );
    assert_eq!(counts.finished, 2, "last slide never finishes");
    assert_eq!(counts.ends, [2], "one end on the last slide");
}
