//! # Frame Grabber
//! Hooks Direct3D presentation and writes a fixed number of presented frames to disk, rendering
//! a self test window as the default target.
//!

#![allow(clippy::std_instead_of_alloc)]

extern crate alloc;

use std::process::ExitCode;

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[cfg(windows)]
mod app;
#[cfg_attr(not(windows), allow(dead_code))]
mod cli;
#[cfg_attr(not(windows), allow(dead_code))]
mod config;
#[cfg(windows)]
mod failure;
#[cfg(windows)]
mod logger;
#[cfg_attr(not(windows), allow(dead_code))]
mod settings;
#[cfg(windows)]
mod target;

/// The Cargo package version.
#[cfg(not(debug_assertions))]
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The Cargo package version or '0.0.0' if a non-release build.
#[cfg(debug_assertions)]
pub const VERSION: &str = "0.0.0";

#[cfg(windows)]
fn main() -> ExitCode {
    use clap::Parser;
    use tracing::{info, info_span};
    use winit::event_loop::{ControlFlow, EventLoop};

    use crate::{
        app::FrameGrabber,
        cli::Cli,
        config::Config,
        failure::{Failure, report},
        logger::setup_logger,
        settings::Settings,
    };

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Set up logger
    let _logger_guards = match setup_logger(cli.debug) {
        Ok(guards) => Some(guards),
        Err(error) => {
            eprintln!("Failed to set up logger:\n{error}");
            None
        }
    };

    // Log application start
    let _span = info_span!("[Main Thread]").entered();
    info!("Frame Grabber v{}", VERSION);

    // Load config
    let config = match Config::try_load_config(&cli.config) {
        Ok(maybe_config) => maybe_config.unwrap_or_default(),
        Err(error) => {
            report(error, "Your config file is invalid");
            return ExitCode::FAILURE;
        }
    };
    let settings = Settings::resolve(&cli, config);

    // Create event loop
    let Some(event_loop) = EventLoop::new().report("Could not create the event loop") else {
        return ExitCode::FAILURE;
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    // Run the app
    let mut app = FrameGrabber::new(settings);
    if event_loop
        .run_app(&mut app)
        .report("The event loop failed")
        .is_none()
    {
        return ExitCode::FAILURE;
    }

    if app.failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(not(windows))]
fn main() -> ExitCode {
    eprintln!("Frame Grabber v{VERSION} needs Windows, Direct3D is not available on this platform");
    ExitCode::FAILURE
}
