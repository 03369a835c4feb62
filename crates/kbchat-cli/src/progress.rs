//! Upload progress on stderr

use std::io::{self, Write};

/// Per-file progress for batch uploads
pub struct ProgressReporter {
    total: usize,
    done: usize,
    failed: usize,
}

impl ProgressReporter {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            done: 0,
            failed: 0,
        }
    }

    pub fn start(&self, name: &str) {
        eprint!("\r[{}/{}] {:<50}", self.done + 1, self.total, name);
        io::stderr().flush().ok();
    }

    pub fn succeed(&mut self) {
        self.done += 1;
    }

    pub fn fail(&mut self, name: &str, error: &dyn std::fmt::Display) {
        self.done += 1;
        self.failed += 1;
        eprintln!("\rFailed: {}: {}", name, error);
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn finish(&self) {
        eprintln!(
            "\rDone ({}/{} uploaded)                    ",
            self.done - self.failed,
            self.total
        );
    }
}
