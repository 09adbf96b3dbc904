//! Strategies for sending produced duty artifacts to the beacon node.
//!
//! This module contains:
//! - `SendingStrategy` trait: turns a duty's productions into one `DutyResult`
//! - `SendCapability` trait: submits one produced artifact
//! - `IndividualSendingStrategy`: one submission per artifact, all concurrent

mod individual;

pub use individual::{AggregateSender, AttestationSender, IndividualSendingStrategy};

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::api::ApiError;
use crate::duties::{DispatchOutcome, DutyResult, ProductionResult};

/// A production that resolves once the artifact has been built (or failed to).
pub type ProductionFuture<T> = BoxFuture<'static, ProductionResult<T>>;

/// The productions of one duty: finite and consumed exactly once.
pub type Productions<T> = Box<dyn Iterator<Item = ProductionFuture<T>> + Send>;

/// Errors raised while submitting a single artifact.
///
/// These never escape a `SendingStrategy`; they are converted into a failed
/// outcome for the item that raised them.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Submits one produced artifact.
///
/// Only called for productions that carry a message; `message` is that
/// message. Constructed once per duty type and reused for every item.
#[async_trait]
pub trait SendCapability<T>: Send + Sync {
    async fn send(
        &self,
        production: &ProductionResult<T>,
        message: &T,
    ) -> Result<DispatchOutcome, SendError>;
}

/// Sends every production of a duty and folds the outcomes.
///
/// Implementations must not fail: every per-item failure, however caused, is
/// recorded in the returned `DutyResult`.
#[async_trait]
pub trait SendingStrategy<T>: Send + Sync {
    async fn send(&self, productions: Productions<T>) -> DutyResult;
}

/// Wrap an already-available production.
pub fn ready<T: Send + 'static>(production: ProductionResult<T>) -> ProductionFuture<T> {
    Box::pin(futures::future::ready(production))
}

/// Box a finite sequence of productions.
pub fn productions<T, I>(productions: I) -> Productions<T>
where
    I: IntoIterator<Item = ProductionFuture<T>>,
    I::IntoIter: Send + 'static,
{
    Box::new(productions.into_iter())
}
