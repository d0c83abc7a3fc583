//! The asynchronous payment gateway port.
//!
//! Every money movement in the engine goes through this interface. Calls
//! may be slow or fail; the orchestrator wraps each one in a bounded
//! timeout and treats timeout exactly like a decline. The engine is
//! single-threaded per game, so two settlement attempts for the same
//! logical transfer can never run concurrently.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::core::PlayerId;

/// Abstract settlement backend.
///
/// All methods return `false` on insufficient funds or external failure;
/// the engine treats both identically.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Transfer between two players.
    async fn pay_player_to_player(
        &self,
        payer: PlayerId,
        recipient: PlayerId,
        amount: i64,
        reason: &str,
    ) -> bool;

    /// Player pays the bank.
    async fn pay_player_to_system(&self, payer: PlayerId, amount: i64, reason: &str) -> bool;

    /// Bank pays a player.
    async fn pay_system_to_player(&self, recipient: PlayerId, amount: i64, reason: &str) -> bool;
}

/// Await a gateway call with the configured bound; timeout is a decline.
pub async fn settle_with_timeout<F>(bound: Duration, call: F) -> bool
where
    F: std::future::Future<Output = bool>,
{
    tokio::time::timeout(bound, call).await.unwrap_or(false)
}

/// Gateway that approves every transfer instantly.
///
/// The engine's own cash fields are authoritative for rule checks, so
/// this is the right backend for a game with no external settlement.
#[derive(Clone, Copy, Debug, Default)]
pub struct InstantGateway;

#[async_trait]
impl PaymentGateway for InstantGateway {
    async fn pay_player_to_player(
        &self,
        _payer: PlayerId,
        _recipient: PlayerId,
        _amount: i64,
        _reason: &str,
    ) -> bool {
        true
    }

    async fn pay_player_to_system(&self, _payer: PlayerId, _amount: i64, _reason: &str) -> bool {
        true
    }

    async fn pay_system_to_player(&self, _recipient: PlayerId, _amount: i64, _reason: &str) -> bool {
        true
    }
}

/// Gateway that replays a scripted sequence of outcomes, then approves.
///
/// Test backend for exercising decline and shortfall paths.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    outcomes: Mutex<VecDeque<bool>>,
}

impl ScriptedGateway {
    /// Queue outcomes for the next calls, in order.
    #[must_use]
    pub fn with_outcomes(outcomes: impl IntoIterator<Item = bool>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
        }
    }

    fn next(&self) -> bool {
        self.outcomes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front()
            .unwrap_or(true)
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn pay_player_to_player(
        &self,
        _payer: PlayerId,
        _recipient: PlayerId,
        _amount: i64,
        _reason: &str,
    ) -> bool {
        self.next()
    }

    async fn pay_player_to_system(&self, _payer: PlayerId, _amount: i64, _reason: &str) -> bool {
        self.next()
    }

    async fn pay_system_to_player(&self, _recipient: PlayerId, _amount: i64, _reason: &str) -> bool {
        self.next()
    }
}
