//! Engine error taxonomy and the action response envelope.
//!
//! Three failure classes with very different blast radii:
//!
//! - `RuleViolation`: the action is not legal right now (wrong actor, wrong
//!   pending decision, bad target, insufficient funds). Surfaced as a
//!   `Failure` response; the caller may retry with corrected parameters.
//! - `GatewayFailure`: a payment declined or timed out. Never surfaced
//!   directly - the orchestrator promotes it into the bankruptcy protocol.
//! - `InternalInconsistency`: state that should be impossible (a decision
//!   referencing a vanished square, a bankrupt actor holding the pending
//!   decision). Surfaced as an `Error` response after the stale decision is
//!   cleared, so a bug never deadlocks the game.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::player::PlayerId;

/// Errors produced while handling a submitted action.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The action is not legal in the current state. Retryable.
    #[error("rule violation: {0}")]
    RuleViolation(String),

    /// A payment gateway call declined or timed out.
    ///
    /// The orchestrator routes this into the liquidation protocol rather
    /// than returning it to the caller.
    #[error("payment gateway failure: {reason}")]
    GatewayFailure { reason: String },

    /// The engine found state that violates its own invariants.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),
}

impl EngineError {
    /// Shorthand for a rule violation.
    pub fn rule(msg: impl Into<String>) -> Self {
        Self::RuleViolation(msg.into())
    }

    /// Rule violation for an actor acting out of turn or against someone
    /// else's pending decision.
    pub fn wrong_actor(actor: PlayerId) -> Self {
        Self::RuleViolation(format!("{actor} may not act on the current decision"))
    }

    /// Shorthand for an internal inconsistency.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalInconsistency(msg.into())
    }
}

/// Outcome class of a submitted action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
    /// The action was applied.
    Success,
    /// Legal-move rules rejected the action; retry with corrected params.
    Failure,
    /// The engine hit an internal inconsistency.
    Error,
}

/// Response envelope for `Engine::submit_action`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub status: ActionStatus,
    pub message: String,
}

impl ActionResponse {
    /// Build a success response.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Success,
            message: message.into(),
        }
    }

    /// Build a failure response.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Failure,
            message: message.into(),
        }
    }

    /// Build an error response.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Error,
            message: message.into(),
        }
    }

    /// Whether the action was applied.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ActionStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::rule("not your turn");
        assert_eq!(err.to_string(), "rule violation: not your turn");

        let err = EngineError::GatewayFailure {
            reason: "timeout".into(),
        };
        assert_eq!(err.to_string(), "payment gateway failure: timeout");
    }

    #[test]
    fn test_response_constructors() {
        let ok = ActionResponse::success("bought");
        assert!(ok.is_success());
        assert_eq!(ok.status, ActionStatus::Success);

        let bad = ActionResponse::failure("cannot afford");
        assert!(!bad.is_success());
        assert_eq!(bad.message, "cannot afford");
    }

    #[test]
    fn test_response_serialization() {
        let resp = ActionResponse::failure("wrong actor");
        let json = serde_json::to_string(&resp).unwrap();
        let back: ActionResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(resp, back);
    }
}
