//! Preflight checks run before `run` touches the source or the store.
//!
//! Checks only inspect; they never create files or tables.

mod source;
mod store;

use crate::models::config::Config;
use colored::Colorize;
use std::io::{self, Write};

/// Outcome of one check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
    pub message: String,
    pub hint: Option<String>,
}

impl CheckResult {
    pub fn ok(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            message: message.into(),
            hint: None,
        }
    }

    pub fn fail(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            passed: false,
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Check the source file, then the store.
pub fn run_preflight_checks(config: &Config) -> Vec<CheckResult> {
    vec![source::check(&config.source), store::check(&config.store)]
}

/// Write one line per check, plus its hint when it failed.
pub fn print_results<W: Write>(results: &[CheckResult], out: &mut W) -> io::Result<()> {
    for result in results {
        let tag = if result.passed {
            "[OK]".green()
        } else {
            "[FAIL]".red()
        };
        writeln!(out, "{} {}: {}", tag, result.name.bold(), result.message)?;

        if let (false, Some(hint)) = (result.passed, result.hint.as_deref()) {
            writeln!(out, "  {} {}", "->".yellow(), hint)?;
        }
    }
    Ok(())
}

/// Whether every check passed.
pub fn all_passed(results: &[CheckResult]) -> bool {
    results.iter().all(|r| r.passed)
}
