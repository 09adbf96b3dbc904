//! Duty reporting and replay configuration.

use serde::Deserialize;

/// Default number of per-item failures logged for one duty.
pub const DEFAULT_MAX_FAILURES_LOGGED: usize = 20;

/// Default replay input file.
pub const DEFAULT_DUTIES_FILE: &str = "duties.json";

/// How duty results are written to the log.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    /// Log a summary line when a duty has successes.
    pub log_successes: bool,

    /// Maximum failure lines per duty; the remainder is summarized in one line.
    ///
    /// Default: 20. Large validator sets can otherwise flood the log when the
    /// beacon node is unavailable.
    pub max_failures_logged: usize,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            log_successes: true,
            max_failures_logged: DEFAULT_MAX_FAILURES_LOGGED,
        }
    }
}

/// Input for the dry-run replay binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// JSON file describing the productions to replay.
    pub duties_file: String,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            duties_file: DEFAULT_DUTIES_FILE.to_string(),
        }
    }
}
