use std::collections::BTreeSet;

use super::{DispatchOutcome, DutyError};
use crate::types::ValidatorKey;

/// The upstream result of producing one artifact for a set of validators.
///
/// A message is present if and only if production succeeded. When it is
/// absent, `outcome` already records the production failure and is forwarded
/// as-is by the sending strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionResult<T> {
    validators: BTreeSet<ValidatorKey>,
    message: Option<T>,
    outcome: DispatchOutcome,
}

impl<T> ProductionResult<T> {
    /// A successfully produced artifact.
    pub fn produced(validators: impl IntoIterator<Item = ValidatorKey>, message: T) -> Self {
        let validators: BTreeSet<_> = validators.into_iter().collect();
        Self {
            outcome: DispatchOutcome::success(validators.iter().cloned()),
            validators,
            message: Some(message),
        }
    }

    /// Production failed; nothing will be sent for these validators.
    pub fn failed(
        validators: impl IntoIterator<Item = ValidatorKey>,
        reason: impl Into<String>,
    ) -> Self {
        let validators: BTreeSet<_> = validators.into_iter().collect();
        Self {
            outcome: DispatchOutcome::failure(
                validators.iter().cloned(),
                DutyError::Production(reason.into()),
            ),
            validators,
            message: None,
        }
    }

    pub fn validators(&self) -> &BTreeSet<ValidatorKey> {
        &self.validators
    }

    pub fn message(&self) -> Option<&T> {
        self.message.as_ref()
    }

    /// The outcome to report if the artifact is not (or cannot be) sent.
    pub fn outcome(&self) -> &DispatchOutcome {
        &self.outcome
    }

    pub fn failed_to_produce(&self) -> bool {
        self.message.is_none()
    }

    pub fn into_outcome(self) -> DispatchOutcome {
        self.outcome
    }
}
