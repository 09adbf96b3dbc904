//! Dry-run replay of recorded duty productions.
//!
//! A replay file describes the productions of one attestation duty and one
//! aggregation duty for a slot. Each production lists its validators and
//! either the produced message or the production error:
//!
//! ```json
//! {
//!   "slot": 1024,
//!   "attestations": [
//!     { "validators": ["0xa1..."], "message": { "validator_index": 1, ... } },
//!     { "validators": ["0xb2..."], "error": "Signing timed out" }
//!   ],
//!   "aggregates": []
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::api::ValidatorApiChannel;
use crate::config::ReportingConfig;
use crate::duties::{DutyResult, ProductionResult};
use crate::sending::{ready, IndividualSendingStrategy};
use crate::types::{SignedAggregateAndProof, SignedAttestation, ValidatorKey};

/// Reason recorded for an entry with neither a message nor an error.
const MISSING_MESSAGE: &str = "No message produced";

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Failed to read replay file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse replay file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One recorded production.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordedProduction<T> {
    pub validators: Vec<ValidatorKey>,
    pub message: Option<T>,
    pub error: Option<String>,
}

impl<T> RecordedProduction<T> {
    pub fn into_production(self) -> ProductionResult<T> {
        match self.message {
            Some(message) => ProductionResult::produced(self.validators, message),
            None => ProductionResult::failed(
                self.validators,
                self.error.unwrap_or_else(|| MISSING_MESSAGE.to_string()),
            ),
        }
    }
}

/// Productions recorded for one slot.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayFile {
    pub slot: u64,
    #[serde(default)]
    pub attestations: Vec<RecordedProduction<SignedAttestation>>,
    #[serde(default)]
    pub aggregates: Vec<RecordedProduction<SignedAggregateAndProof>>,
}

impl ReplayFile {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(contents)?)
    }
}

/// Results of replaying one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub attestations: DutyResult,
    pub aggregates: DutyResult,
}

/// Send every recorded production through the individual strategies and
/// report both duties.
pub async fn replay(
    file: ReplayFile,
    channel: Arc<dyn ValidatorApiChannel>,
    reporting: &ReportingConfig,
) -> ReplayReport {
    let ReplayFile {
        slot,
        attestations,
        aggregates,
    } = file;
    info!(
        slot,
        attestations = attestations.len(),
        aggregates = aggregates.len(),
        "Replaying duties"
    );

    let attestation_sender = IndividualSendingStrategy::attestation_sender(Arc::clone(&channel));
    let attestations = attestation_sender
        .send_all(
            attestations
                .into_iter()
                .map(|recorded| ready(recorded.into_production())),
        )
        .await;
    attestations.report(attestation_sender.name(), slot, reporting);

    let aggregate_sender = IndividualSendingStrategy::aggregate_sender(channel);
    let aggregates = aggregate_sender
        .send_all(
            aggregates
                .into_iter()
                .map(|recorded| ready(recorded.into_production())),
        )
        .await;
    aggregates.report(aggregate_sender.name(), slot, reporting);

    ReplayReport {
        attestations,
        aggregates,
    }
}
