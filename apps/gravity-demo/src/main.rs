//! Gravity demo: a spinning cube.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p gravity-demo -- [OPTIONS]
//! ```
//!
//! Left and right arrows change the spin speed, Space pauses and Escape
//! quits. Run with `--help` for the swapchain and debug options, and set
//! `RUST_LOG` (e.g. `debug`) for more output.

mod app;
mod cube;

use clap::Parser;
use gravity_app::{report_fatal, run_app, AppConfig, CliArgs};

use crate::app::DemoApp;

fn main() {
    let config = CliArgs::parse().apply(AppConfig::new("Gravity Cube"));
    if let Err(e) = run_app::<DemoApp>(config) {
        report_fatal(&e);
    }
}
