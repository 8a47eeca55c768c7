use crate::error::EnvError;
use colored::Colorize;
use tracing::warn;

/// Label printed above the missing keys
pub const MISSING_LABEL: &str = "The following ENV variables are REQUIRED but not found.";

/// Exit status used when missing keys end the process
pub const EXIT_CODE: i32 = 1;

/// Render the missing-key summary: blank line, label, one key per line, blank line
pub fn format_missing_keys(keys: &[String]) -> String {
    let list = keys
        .iter()
        .map(|k| format!("  - {}\n", k.magenta().bold()))
        .collect::<String>();

    format!("\n{}\n{}\n", MISSING_LABEL.red().bold(), list)
}

/// Turn a missing-key set into the configured failure
///
/// Returns `Ok(())` when nothing is missing. With `end_process` the summary is
/// printed to stderr and the process exits; otherwise the keys come back as
/// [`EnvError::MissingRequiredKeys`].
pub fn report_missing(keys: Vec<String>, end_process: bool) -> Result<(), EnvError> {
    if keys.is_empty() {
        return Ok(());
    }

    warn!(missing = ?keys, end_process, "required env variables not found");

    if end_process {
        eprint!("{}", format_missing_keys(&keys));
        std::process::exit(EXIT_CODE);
    }

    Err(EnvError::MissingRequiredKeys { keys })
}
