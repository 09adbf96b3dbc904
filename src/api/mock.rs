//! Mock validator API channel for testing and dry runs.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{ApiError, Result, SubmitDataError, ValidatorApiChannel};
use crate::types::{SignedAggregateAndProof, SignedAttestation};

/// In-memory channel that records submissions.
///
/// Accepts everything by default. Rejections can be scripted per validator
/// index or per attestation slot; transport failures and latency per
/// validator index.
#[derive(Default)]
pub struct MockValidatorApiChannel {
    attestation_calls: AtomicUsize,
    aggregate_calls: AtomicUsize,
    attestations: RwLock<Vec<SignedAttestation>>,
    aggregates: RwLock<Vec<SignedAggregateAndProof>>,
    rejections: RwLock<HashMap<u64, String>>,
    slot_rejections: RwLock<HashMap<u64, String>>,
    transport_failures: RwLock<HashSet<u64>>,
    delays: RwLock<HashMap<u64, Duration>>,
    fail_aggregates: RwLock<Option<String>>,
}

impl MockValidatorApiChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject attestations from `validator_index` with `message`.
    pub async fn reject_validator(&self, validator_index: u64, message: impl Into<String>) {
        self.rejections
            .write()
            .await
            .insert(validator_index, message.into());
    }

    /// Reject every attestation for `slot` with `message`.
    pub async fn reject_slot(&self, slot: u64, message: impl Into<String>) {
        self.slot_rejections.write().await.insert(slot, message.into());
    }

    /// Fail the transport for attestations from `validator_index`.
    pub async fn fail_validator(&self, validator_index: u64) {
        self.transport_failures.write().await.insert(validator_index);
    }

    /// Delay responses for `validator_index`.
    pub async fn delay_validator(&self, validator_index: u64, delay: Duration) {
        self.delays.write().await.insert(validator_index, delay);
    }

    /// Make every aggregate submission report `message` as an error.
    pub async fn set_fail_aggregates(&self, message: Option<String>) {
        *self.fail_aggregates.write().await = message;
    }

    /// Number of attestation submissions attempted, including failed ones.
    pub fn attestation_calls(&self) -> usize {
        self.attestation_calls.load(Ordering::SeqCst)
    }

    /// Number of aggregate submissions attempted, including failed ones.
    pub fn aggregate_calls(&self) -> usize {
        self.aggregate_calls.load(Ordering::SeqCst)
    }

    pub async fn submitted_attestations(&self) -> Vec<SignedAttestation> {
        self.attestations.read().await.clone()
    }

    pub async fn submitted_aggregates(&self) -> Vec<SignedAggregateAndProof> {
        self.aggregates.read().await.clone()
    }

    /// Scripted rejection for `attestation`; a validator rejection wins over a
    /// slot rejection.
    async fn rejection_for(&self, attestation: &SignedAttestation) -> Option<String> {
        if let Some(message) = self.rejections.read().await.get(&attestation.validator_index) {
            return Some(message.clone());
        }
        self.slot_rejections
            .read()
            .await
            .get(&attestation.slot)
            .cloned()
    }

    async fn delay_for(&self, validator_index: u64) {
        let delay = self.delays.read().await.get(&validator_index).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ValidatorApiChannel for MockValidatorApiChannel {
    async fn send_signed_attestations(
        &self,
        attestations: Vec<SignedAttestation>,
    ) -> Result<Vec<SubmitDataError>> {
        self.attestation_calls.fetch_add(1, Ordering::SeqCst);

        let mut errors = Vec::new();
        for (index, attestation) in attestations.into_iter().enumerate() {
            self.delay_for(attestation.validator_index).await;

            if self
                .transport_failures
                .read()
                .await
                .contains(&attestation.validator_index)
            {
                return Err(ApiError::Connection(format!(
                    "Mock connection reset for validator {}",
                    attestation.validator_index
                )));
            }

            if let Some(message) = self.rejection_for(&attestation).await {
                errors.push(SubmitDataError::new(index, message));
            }

            debug!(
                validator_index = attestation.validator_index,
                slot = attestation.slot,
                "Mock channel received attestation"
            );
            self.attestations.write().await.push(attestation);
        }
        Ok(errors)
    }

    async fn send_aggregate_and_proof(&self, aggregate: SignedAggregateAndProof) -> Result<()> {
        self.aggregate_calls.fetch_add(1, Ordering::SeqCst);
        self.delay_for(aggregate.aggregator_index).await;

        debug!(
            aggregator_index = aggregate.aggregator_index,
            slot = aggregate.aggregate.slot,
            "Mock channel received aggregate"
        );
        self.aggregates.write().await.push(aggregate);

        match self.fail_aggregates.read().await.clone() {
            Some(message) => Err(ApiError::Unexpected(message)),
            None => Ok(()),
        }
    }
}
