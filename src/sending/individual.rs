//! One submission per produced artifact.
//!
//! Each production is awaited and sent on its own task. A failure in one task
//! is converted into that item's outcome and never cancels or affects its
//! siblings.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::task::JoinSet;
use tracing::{debug, error, warn, Instrument};

use super::{ProductionFuture, Productions, SendCapability, SendError, SendingStrategy};
use crate::api::ValidatorApiChannel;
use crate::duties::{DispatchOutcome, DutyError, DutyResult, ProductionResult};
use crate::types::{SignedAggregateAndProof, SignedAttestation};

/// Sends each artifact in its own request, all concurrently.
///
/// Stateless apart from its capability, so a single instance can serve every
/// round of a duty.
pub struct IndividualSendingStrategy<T> {
    name: &'static str,
    capability: Arc<dyn SendCapability<T>>,
}

impl<T: Send + Sync + 'static> IndividualSendingStrategy<T> {
    pub fn new(capability: impl SendCapability<T> + 'static) -> Self {
        Self {
            name: "duty",
            capability: Arc::new(capability),
        }
    }

    /// Label used in log fields.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Send every production and wait for all of them to settle.
    #[tracing::instrument(name = "duty.send", skip_all, fields(duty = %self.name))]
    pub async fn send_all<I>(&self, productions: I) -> DutyResult
    where
        I: IntoIterator<Item = ProductionFuture<T>>,
    {
        let mut tasks = self.spawn_all(productions);
        let mut result = DutyResult::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => result.add(outcome),
                Err(e) => {
                    // Only a panicking production gets here; its validators
                    // were never reported.
                    error!(error = %e, "Send task did not complete");
                    result.add(DispatchOutcome::failure(
                        std::iter::empty(),
                        DutyError::Transport(format!("Send task did not complete: {}", e)),
                    ));
                }
            }
        }

        debug!(
            successes = result.success_count(),
            failures = result.failure_count(),
            "All sends settled"
        );
        result
    }

    fn spawn_all<I>(&self, productions: I) -> JoinSet<DispatchOutcome>
    where
        I: IntoIterator<Item = ProductionFuture<T>>,
    {
        let mut tasks = JoinSet::new();
        for production in productions {
            let capability = Arc::clone(&self.capability);
            tasks.spawn(send_if_produced(capability, production).in_current_span());
        }
        tasks
    }
}

impl IndividualSendingStrategy<SignedAttestation> {
    /// Strategy submitting each attestation on its own.
    pub fn attestation_sender(channel: Arc<dyn ValidatorApiChannel>) -> Self {
        Self::new(AttestationSender::new(channel)).named("attestation")
    }
}

impl IndividualSendingStrategy<SignedAggregateAndProof> {
    /// Strategy submitting each aggregate-and-proof on its own.
    pub fn aggregate_sender(channel: Arc<dyn ValidatorApiChannel>) -> Self {
        Self::new(AggregateSender::new(channel)).named("aggregate")
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> SendingStrategy<T> for IndividualSendingStrategy<T> {
    async fn send(&self, productions: Productions<T>) -> DutyResult {
        self.send_all(productions).await
    }
}

async fn send_if_produced<T: Send + Sync + 'static>(
    capability: Arc<dyn SendCapability<T>>,
    production: ProductionFuture<T>,
) -> DispatchOutcome {
    let production = production.await;

    if let Some(message) = production.message() {
        let sent = AssertUnwindSafe(capability.send(&production, message))
            .catch_unwind()
            .await;
        return match sent {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                warn!(
                    validators = production.validators().len(),
                    error = %e,
                    "Failed to send"
                );
                DispatchOutcome::failure(
                    production.validators().iter().cloned(),
                    DutyError::Transport(e.to_string()),
                )
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                error!(
                    validators = production.validators().len(),
                    panic = %reason,
                    "Send panicked"
                );
                DispatchOutcome::failure(
                    production.validators().iter().cloned(),
                    DutyError::Transport(format!("Send panicked: {}", reason)),
                )
            }
        };
    }

    debug!(
        validators = production.validators().len(),
        "Nothing to send, production failed"
    );
    production.into_outcome()
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

/// Submits a single attestation and maps the node's rejections.
pub struct AttestationSender {
    channel: Arc<dyn ValidatorApiChannel>,
}

impl AttestationSender {
    pub fn new(channel: Arc<dyn ValidatorApiChannel>) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl SendCapability<SignedAttestation> for AttestationSender {
    async fn send(
        &self,
        production: &ProductionResult<SignedAttestation>,
        attestation: &SignedAttestation,
    ) -> Result<DispatchOutcome, SendError> {
        let errors = self
            .channel
            .send_signed_attestations(vec![attestation.clone()])
            .await?;

        // Only the first rejection is reported.
        Ok(match errors.into_iter().next() {
            None => production.outcome().clone(),
            Some(rejection) => DispatchOutcome::failure(
                production.validators().iter().cloned(),
                DutyError::Rejected(rejection.message),
            ),
        })
    }
}

/// Issues a single aggregate-and-proof without waiting for the node.
///
/// The submission runs on a detached task and the item counts as sent as soon
/// as it is issued. Errors reported later by the channel are logged only.
pub struct AggregateSender {
    channel: Arc<dyn ValidatorApiChannel>,
}

impl AggregateSender {
    pub fn new(channel: Arc<dyn ValidatorApiChannel>) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl SendCapability<SignedAggregateAndProof> for AggregateSender {
    async fn send(
        &self,
        production: &ProductionResult<SignedAggregateAndProof>,
        aggregate: &SignedAggregateAndProof,
    ) -> Result<DispatchOutcome, SendError> {
        let channel = Arc::clone(&self.channel);
        let aggregate = aggregate.clone();
        let aggregator_index = aggregate.aggregator_index;

        tokio::spawn(
            async move {
                if let Err(e) = channel.send_aggregate_and_proof(aggregate).await {
                    warn!(aggregator_index, error = %e, "Aggregate submission failed after dispatch");
                }
            }
            .in_current_span(),
        );

        Ok(production.outcome().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::sending::ready;
    use crate::types::ValidatorKey;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(hex: &str) -> ValidatorKey {
        hex.parse().unwrap()
    }

    /// Capability that succeeds unless the message is listed in `fail`.
    struct ScriptedCapability {
        calls: Arc<AtomicUsize>,
        fail: Vec<u32>,
        panic_on: Option<u32>,
    }

    impl ScriptedCapability {
        fn new(calls: Arc<AtomicUsize>) -> Self {
            Self {
                calls,
                fail: Vec::new(),
                panic_on: None,
            }
        }
    }

    #[async_trait]
    impl SendCapability<u32> for ScriptedCapability {
        async fn send(
            &self,
            production: &ProductionResult<u32>,
            message: &u32,
        ) -> Result<DispatchOutcome, SendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.panic_on == Some(*message) {
                panic!("capability panicked on {}", message);
            }
            if self.fail.contains(message) {
                return Err(ApiError::Connection(format!("boom {}", message)).into());
            }
            Ok(production.outcome().clone())
        }
    }

    #[tokio::test]
    async fn test_all_produced_all_succeed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = IndividualSendingStrategy::new(ScriptedCapability::new(calls.clone()));

        let result = strategy
            .send_all((0..5u32).map(|i| ready(ProductionResult::produced([key(&format!("0x0{}", i))], i))))
            .await;

        assert_eq!(result.success_count(), 5);
        assert!(result.failures().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_production_failure_skips_capability() {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = IndividualSendingStrategy::new(ScriptedCapability::new(calls.clone()));

        let result = strategy
            .send_all(vec![ready(ProductionResult::<u32>::failed(
                [key("0x01")],
                "Signing timed out",
            ))])
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(result.success_count(), 0);
        assert_eq!(
            result.failures()[0].error,
            DutyError::Production("Signing timed out".to_string())
        );
    }

    #[tokio::test]
    async fn test_send_error_becomes_transport_failure_for_that_item_only() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut capability = ScriptedCapability::new(calls.clone());
        capability.fail = vec![2];
        let strategy = IndividualSendingStrategy::new(capability);

        let result = strategy
            .send_all(vec![
                ready(ProductionResult::produced([key("0x01")], 1u32)),
                ready(ProductionResult::produced([key("0x02")], 2u32)),
                ready(ProductionResult::produced([key("0x03")], 3u32)),
            ])
            .await;

        assert_eq!(result.success_count(), 2);
        assert_eq!(result.failure_count(), 1);
        let failure = &result.failures()[0];
        assert!(failure.validators.contains(&key("0x02")));
        assert_eq!(
            failure.error,
            DutyError::Transport("Connection failed: boom 2".to_string())
        );
    }

    #[tokio::test]
    async fn test_panicking_send_is_contained() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut capability = ScriptedCapability::new(calls.clone());
        capability.panic_on = Some(9);
        let strategy = IndividualSendingStrategy::new(capability);

        let result = strategy
            .send_all(vec![
                ready(ProductionResult::produced([key("0x01")], 1u32)),
                ready(ProductionResult::produced([key("0x09")], 9u32)),
            ])
            .await;

        assert_eq!(result.success_count(), 1);
        assert_eq!(result.failure_count(), 1);
        let failure = &result.failures()[0];
        assert_eq!(failure.validators, BTreeSet::from([key("0x09")]));
        assert_eq!(
            failure.error,
            DutyError::Transport("Send panicked: capability panicked on 9".to_string())
        );
    }

    #[tokio::test]
    async fn test_productions_resolving_late_are_awaited() {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = IndividualSendingStrategy::new(ScriptedCapability::new(calls.clone()));

        let (tx, rx) = tokio::sync::oneshot::channel::<ProductionResult<u32>>();
        let late: ProductionFuture<u32> = Box::pin(async move {
            rx.await
                .unwrap_or_else(|_| ProductionResult::failed([key("0x02")], "producer dropped"))
        });

        let send = tokio::spawn(async move {
            strategy
                .send_all(vec![ready(ProductionResult::produced([key("0x01")], 1u32)), late])
                .await
        });
        tokio::task::yield_now().await;
        tx.send(ProductionResult::produced([key("0x02")], 2u32)).unwrap();

        let result = send.await.unwrap();
        assert_eq!(result.success_count(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_productions_yield_empty_result() {
        let strategy = IndividualSendingStrategy::<u32>::new(ScriptedCapability::new(Arc::new(
            AtomicUsize::new(0),
        )));

        let result = SendingStrategy::send(&strategy, crate::sending::productions(Vec::new())).await;

        assert!(result.is_empty());
    }

    #[test]
    fn test_named_sets_log_label() {
        let strategy = IndividualSendingStrategy::<u32>::new(ScriptedCapability::new(Arc::new(
            AtomicUsize::new(0),
        )))
        .named("sync_committee");
        assert_eq!(strategy.name(), "sync_committee");
    }
}
