//! Reading and de-noising server log files.
//!
//! Servers on some platforms flood their logs with harmless transport-reset
//! tracebacks. [`filter_noise`] drops such a block from its trigger line up
//! to the next line that starts with a log-level prefix, then collapses runs
//! of blank lines. The transform is pure.

use crate::error::{Error, Result};
use std::path::Path;

/// Prefixes that mark the start of a regular log record.
pub const LOG_PREFIXES: [&str; 4] = ["INFO:", "WARNING:", "ERROR:", "DEBUG:"];

/// Substrings that open a suppressible noise block.
pub const NOISE_TRIGGERS: [&str; 3] = [
    "[WinError 10054]",
    "ConnectionResetError",
    "_ProactorBasePipeTransport._call_connection_lost",
];

/// Last `n` lines of `lines`.
pub fn tail<S: AsRef<str>>(lines: &[S], n: usize) -> Vec<String> {
    let skip = lines.len().saturating_sub(n);
    lines[skip..]
        .iter()
        .map(|line| line.as_ref().to_string())
        .collect()
}

/// Removes noise blocks and collapses consecutive blank lines.
pub fn filter_noise<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let mut kept = Vec::with_capacity(lines.len());
    let mut skipping = false;

    for line in lines.iter().map(AsRef::as_ref) {
        if skipping {
            let trimmed = line.trim_start();
            if LOG_PREFIXES.iter().any(|prefix| trimmed.starts_with(prefix)) {
                skipping = false;
                kept.push(line);
            }
        } else if NOISE_TRIGGERS.iter().any(|trigger| line.contains(trigger)) {
            skipping = true;
        } else {
            kept.push(line);
        }
    }

    let mut compact = Vec::with_capacity(kept.len());
    let mut prev_blank = false;
    for line in kept {
        let blank = line.trim().is_empty();
        if !blank || !prev_blank {
            compact.push(line.to_string());
        }
        prev_blank = blank;
    }
    compact
}

/// Reads the last `n` lines of a log file, optionally de-noised.
///
/// `name` only feeds the error message.
pub async fn read_tail(name: &str, path: &Path, n: usize, remove_noise: bool) -> Result<Vec<String>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::LogsUnavailable(name.to_string()));
        }
        Err(e) => {
            return Err(Error::Process(format!(
                "Failed to read log file '{}': {}",
                path.display(),
                e
            )));
        }
    };

    let lines: Vec<&str> = content.lines().collect();
    let lines = tail(&lines, n);

    Ok(if remove_noise { filter_noise(&lines) } else { lines })
}
