//! Remote validator API channel.
//!
//! This module contains:
//! - `ValidatorApiChannel` trait: submission operations exposed by the beacon node
//! - `SubmitDataError`: per-item rejection returned by batch submissions
//! - `ApiError`: transport-level failures of the channel itself
//! - Implementations: Mock (in-memory, used for tests and dry runs)

pub mod mock;

pub use mock::MockValidatorApiChannel;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{SignedAggregateAndProof, SignedAttestation};

/// Result type for channel operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors raised by the channel itself, before or instead of a node response.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Beacon node is syncing")]
    NodeSyncing,

    #[error("Unexpected response: {0}")]
    Unexpected(String),
}

/// The node's rejection of one item in a submission.
///
/// `index` is the position of the rejected item in the submitted list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitDataError {
    pub index: usize,
    pub message: String,
}

impl SubmitDataError {
    pub fn new(index: usize, message: impl Into<String>) -> Self {
        Self {
            index,
            message: message.into(),
        }
    }
}

/// Submission operations of the beacon node API.
///
/// Timeouts, retries of the underlying transport and serialization belong to
/// implementations of this trait, not to its callers.
#[async_trait]
pub trait ValidatorApiChannel: Send + Sync {
    /// Submit signed attestations.
    ///
    /// Returns one error per rejected attestation; an empty list means every
    /// attestation was accepted.
    async fn send_signed_attestations(
        &self,
        attestations: Vec<SignedAttestation>,
    ) -> Result<Vec<SubmitDataError>>;

    /// Submit a signed aggregate-and-proof.
    ///
    /// There is no per-item rejection channel for aggregates.
    async fn send_aggregate_and_proof(&self, aggregate: SignedAggregateAndProof) -> Result<()>;
}
