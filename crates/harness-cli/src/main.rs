//! demoqa: behaviour-driven UI tests for DemoQA
//!
//! ## Usage
//!
//! ```bash
//! demoqa run                                  # Run every feature under features/
//! demoqa run features/checkbox.feature        # One feature file
//! demoqa run --tags smoke --headless          # Tagged scenarios, no window
//! demoqa list --name TC_PF                    # Show what would run
//! demoqa config --base-url http://localhost   # Effective configuration
//! ```

use clap::Parser;
use demoqa_harness_cli::{execute, Cli, Outcome};
use std::process::ExitCode;

fn main() -> ExitCode {
    match execute(Cli::parse()) {
        Ok(Outcome::Success) => ExitCode::SUCCESS,
        Ok(Outcome::Unsuccessful) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}
