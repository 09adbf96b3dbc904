//! Duty results and the per-item values they are folded from.
//!
//! This module contains:
//! - `ProductionResult`: an artifact produced upstream, or the reason it wasn't
//! - `DispatchOutcome`: the settled outcome of a single item
//! - `DutyResult`: the commutative fold of many outcomes, used for reporting
//! - `DutyError`: how a single item can fail

mod production;
mod result;

pub use production::ProductionResult;
pub use result::{DispatchOutcome, DutyFailure, DutyResult};

/// Ways a single duty item can fail.
///
/// Every variant is terminal for the item; none are retried.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, thiserror::Error)]
pub enum DutyError {
    /// The artifact could not be built or signed upstream.
    #[error("Failed to produce: {0}")]
    Production(String),

    /// The beacon node explicitly rejected the submitted artifact.
    #[error("Rejected by beacon node: {0}")]
    Rejected(String),

    /// The submission itself failed before or instead of a node response.
    #[error("Send failed: {0}")]
    Transport(String),
}

impl DutyError {
    /// The raw message, without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Production(message) | Self::Rejected(message) | Self::Transport(message) => {
                message
            }
        }
    }

    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Production(_) => "production",
            Self::Rejected(_) => "rejected",
            Self::Transport(_) => "transport",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_strips_kind_prefix() {
        let error = DutyError::Rejected("Invalid signature".to_string());
        assert_eq!(error.message(), "Invalid signature");
        assert_eq!(error.to_string(), "Rejected by beacon node: Invalid signature");
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(DutyError::Production(String::new()).kind(), "production");
        assert_eq!(DutyError::Rejected(String::new()).kind(), "rejected");
        assert_eq!(DutyError::Transport(String::new()).kind(), "transport");
    }
}
