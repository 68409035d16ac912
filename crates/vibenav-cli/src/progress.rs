//! Progress reporting for long-running commands

use std::io::{self, Write};
use vibenav_core::index::BuildProgress;

/// Prints embedding progress on stderr, overwriting one line
pub struct ProgressReporter {
    label: String,
}

impl ProgressReporter {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
        }
    }

    pub fn set_message(&self, msg: &str) {
        eprint!("\r{:<50}", msg);
        io::stderr().flush().ok();
    }

    pub fn update(&self, progress: BuildProgress) {
        let pct = if progress.total > 0 {
            progress.embedded as f64 / progress.total as f64 * 100.0
        } else {
            100.0
        };
        eprint!(
            "\r{}: {}/{} chunks ({:.0}%)   ",
            self.label, progress.embedded, progress.total, pct
        );
        io::stderr().flush().ok();
    }

    pub fn finish(&self) {
        eprintln!();
    }
}
