//! duty-dispatch: dry-run replay of recorded duty productions
//!
//! Sends every recorded attestation and aggregate-and-proof through the
//! individual sending strategies against an in-memory beacon node channel and
//! logs the result of each duty.
//!
//! Aggregates are issued on detached tasks and count as sent once issued, so
//! some aggregate submissions may not reach the channel before the process
//! exits. The aggregate summary reports issued submissions, not acknowledged
//! ones.
//!
//! ## Configuration
//! - First argument: replay file (overrides `replay.duties_file`)
//! - DUTY_DISPATCH_CONFIG: Path to a YAML config file (optional)
//! - DUTY_DISPATCH_LOG: Log filter (default: info)

use std::sync::Arc;

use tracing::info;

use duty_dispatch::api::MockValidatorApiChannel;
use duty_dispatch::config::Config;
use duty_dispatch::replay::{replay, ReplayFile};
use duty_dispatch::utils::bootstrap::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::load(None)?;
    let duties_file = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config.replay.duties_file.clone());

    info!(file = %duties_file, "duty-dispatch started");
    let file = ReplayFile::from_path(&duties_file)?;
    let slot = file.slot;

    let channel = Arc::new(MockValidatorApiChannel::new());
    let report = replay(file, channel, &config.reporting).await;

    info!(
        slot,
        attestations = %report.attestations.summary(),
        aggregates = %report.aggregates.summary(),
        "Replay complete"
    );
    Ok(())
}
