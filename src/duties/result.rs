use std::collections::BTreeSet;

use tracing::{error, info, warn};

use super::DutyError;
use crate::config::ReportingConfig;
use crate::types::ValidatorKey;

/// Settled outcome of a single duty item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    validators: BTreeSet<ValidatorKey>,
    error: Option<DutyError>,
}

impl DispatchOutcome {
    pub fn success(validators: impl IntoIterator<Item = ValidatorKey>) -> Self {
        Self {
            validators: validators.into_iter().collect(),
            error: None,
        }
    }

    pub fn failure(validators: impl IntoIterator<Item = ValidatorKey>, error: DutyError) -> Self {
        Self {
            validators: validators.into_iter().collect(),
            error: Some(error),
        }
    }

    pub fn validators(&self) -> &BTreeSet<ValidatorKey> {
        &self.validators
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn error(&self) -> Option<&DutyError> {
        self.error.as_ref()
    }

    /// Raw error message; present iff the item failed.
    pub fn error_description(&self) -> Option<&str> {
        self.error.as_ref().map(DutyError::message)
    }
}

/// A failed item as recorded in a [`DutyResult`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DutyFailure {
    pub validators: BTreeSet<ValidatorKey>,
    pub error: DutyError,
}

impl DutyFailure {
    /// Comma-separated abbreviated keys, for log lines.
    pub fn validators_display(&self) -> String {
        self.validators
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Aggregate result of a duty: how many items succeeded and why the rest failed.
///
/// Built by folding [`DispatchOutcome`]s. The fold is associative and
/// order-independent up to the order of `failures`, which follows the order
/// outcomes were added. The empty result is the identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DutyResult {
    success_count: usize,
    failures: Vec<DutyFailure>,
}

impl DutyResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a finite collection of outcomes into one result.
    pub fn combine(outcomes: impl IntoIterator<Item = DispatchOutcome>) -> Self {
        outcomes.into_iter().collect()
    }

    /// Merge two partial results.
    pub fn merge(mut self, other: DutyResult) -> Self {
        self.success_count += other.success_count;
        self.failures.extend(other.failures);
        self
    }

    pub fn add(&mut self, outcome: DispatchOutcome) {
        match outcome.error {
            None => self.success_count += 1,
            Some(error) => self.failures.push(DutyFailure {
                validators: outcome.validators,
                error,
            }),
        }
    }

    pub fn success_count(&self) -> usize {
        self.success_count
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn failures(&self) -> &[DutyFailure] {
        &self.failures
    }

    pub fn total(&self) -> usize {
        self.success_count + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// "N of M succeeded".
    pub fn summary(&self) -> String {
        format!("{} of {} succeeded", self.success_count, self.total())
    }

    /// Log the result of a duty for the given slot.
    ///
    /// Emits one summary line for successes and one line per failure, capped
    /// at `config.max_failures_logged`. An empty result logs nothing.
    pub fn report(&self, duty: &str, slot: u64, config: &ReportingConfig) {
        if self.is_empty() {
            return;
        }

        if self.success_count > 0 && config.log_successes {
            info!(
                duty,
                slot,
                successes = self.success_count,
                failures = self.failures.len(),
                total = self.total(),
                "Published {}: {}",
                duty,
                self.summary()
            );
        }

        for failure in self.failures.iter().take(config.max_failures_logged) {
            error!(
                duty,
                slot,
                validators = %failure.validators_display(),
                kind = failure.error.kind(),
                error = %failure.error.message(),
                "Failed to publish {}",
                duty
            );
        }

        let omitted = self
            .failures
            .len()
            .saturating_sub(config.max_failures_logged);
        if omitted > 0 {
            warn!(duty, slot, omitted, "{} further {} failures not logged", omitted, duty);
        }
    }
}

impl From<DispatchOutcome> for DutyResult {
    fn from(outcome: DispatchOutcome) -> Self {
        let mut result = Self::new();
        result.add(outcome);
        result
    }
}

impl Extend<DispatchOutcome> for DutyResult {
    fn extend<I: IntoIterator<Item = DispatchOutcome>>(&mut self, outcomes: I) {
        for outcome in outcomes {
            self.add(outcome);
        }
    }
}

impl FromIterator<DispatchOutcome> for DutyResult {
    fn from_iter<I: IntoIterator<Item = DispatchOutcome>>(outcomes: I) -> Self {
        let mut result = Self::new();
        result.extend(outcomes);
        result
    }
}
