// Copyright 2026 the Swaptime Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Presents a sequence of solid-color slides on the headless display.
//!
//! Slides alternate between pre-rendered surfaces and draw callbacks. Events
//! are printed with a
//! [`PrettyPrintSink`](swaptime_debug::pretty::PrettyPrintSink); afterwards the
//! results table is printed and a Chrome trace JSON file is written.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use kurbo::Rect;
use swaptime_core::config::{ErrorMode, PresenterConfig};
use swaptime_core::display::Display;
use swaptime_core::presenter::{PresenterError, SlidePresenter};
use swaptime_core::time::Duration;
use swaptime_debug::pretty::PrettyPrintSink;
use swaptime_display::headless::{HeadlessBackend, HeadlessConfig};
use swaptime_display::{DisplayConfig, TimedDisplay};

const COLORS: [u32; 4] = [0xff_e0_40_40, 0xff_40_c0_40, 0xff_40_60_e0, 0xff_f0_f0_f0];

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    MultiCore,
    SingleCoreBlocking,
    SingleCoreThreaded,
}

/// Timed slide presentation on a simulated 60 Hz display.
#[derive(Debug, Parser)]
struct Args {
    /// Swap strategy.
    #[arg(long, value_enum, default_value_t = Mode::MultiCore)]
    mode: Mode,
    /// Keep the original schedule after a late slide.
    #[arg(long)]
    no_correction: bool,
    /// Number of slides.
    #[arg(long, default_value_t = 12)]
    slides: u32,
    /// Duration of each slide in milliseconds.
    #[arg(long, default_value_t = 100)]
    millis: u64,
    /// Chrome trace output.
    #[arg(long, default_value = "swaptime_trace.json")]
    trace: PathBuf,
    /// Skip per-event output.
    #[arg(long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // -- display -----------------------------------------------------------
    let backend = HeadlessBackend::new(HeadlessConfig::default());
    let display = TimedDisplay::new(backend, DisplayConfig::quick());
    println!(
        "frame period {:.3}ms, resolution {:?}",
        display.frame_period().as_millis_f64(),
        display.resolution()
    );

    // -- presenter ---------------------------------------------------------
    let config = match args.mode {
        Mode::MultiCore => PresenterConfig::multi_core(),
        Mode::SingleCoreBlocking => PresenterConfig::single_core_blocking(),
        Mode::SingleCoreThreaded => PresenterConfig::single_core_threaded(),
    };
    let config = if args.no_correction {
        config.with_error_mode(ErrorMode::NoCorrection)
    } else {
        config
    };
    let mut presenter = SlidePresenter::with_display(display, config);
    if !args.quiet {
        presenter.set_trace_sink(Box::new(PrettyPrintSink::new(Box::new(std::io::stdout()))));
    }

    if let Err(e) = queue_and_run(&mut presenter, &args) {
        eprintln!("cannot present: {e}");
        return ExitCode::FAILURE;
    }

    // -- results -----------------------------------------------------------
    let records = presenter.slide_records().expect("presentation has ended");
    let errors = presenter.check_for_errors();
    print!(
        "{}",
        swaptime_debug::report::presentation_report(&records, &errors)
    );

    let file = File::create(&args.trace).expect("failed to create trace file");
    let mut writer = BufWriter::new(file);
    swaptime_debug::chrome::export(&records, &mut writer).expect("failed to write Chrome trace");
    println!("Wrote {}", args.trace.display());
    ExitCode::SUCCESS
}

/// Queues `args.slides` slides and presents them to the end.
fn queue_and_run(
    presenter: &mut SlidePresenter<TimedDisplay<HeadlessBackend>>,
    args: &Args,
) -> Result<(), PresenterError> {
    let duration = Duration::from_millis(args.millis);
    for i in 0..args.slides {
        let color = COLORS[i as usize % COLORS.len()];
        let name = format!("slide {i}");
        if i % 2 == 0 {
            presenter.draw_next_slide(name, duration, |canvas| canvas.clear(color))?;
        } else {
            presenter.append_by_callback(name, duration, move |canvas| {
                canvas.clear(0xff_00_00_00);
                canvas.fill_rect(Rect::new(80.0, 60.0, 560.0, 420.0), color);
            })?;
        }
    }

    // -- run ---------------------------------------------------------------
    presenter.start()?;
    while presenter.is_presenting() || presenter.awaiting_fences() {
        presenter.update();
    }
    Ok(())
}
