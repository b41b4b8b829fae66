//! Source file preflight check.

use super::CheckResult;
use crate::core::extract;
use crate::models::config::SourceConfig;

const NAME: &str = "Source";

/// Check that the source file exists and its encoding is known.
pub fn check(config: &SourceConfig) -> CheckResult {
    if let Err(e) = extract::resolve_encoding(&config.encoding) {
        return CheckResult::fail(NAME, e.to_string())
            .with_hint("Use an encoding label such as latin1 or utf-8");
    }

    match std::fs::File::open(&config.path) {
        Ok(_) => CheckResult::ok(NAME, config.path.display().to_string()),
        Err(e) => CheckResult::fail(NAME, format!("{}: {}", config.path.display(), e))
            .with_hint("Pass the CSV path to `run` or set [source] path in the config file"),
    }
}
