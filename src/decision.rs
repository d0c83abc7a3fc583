//! The decision register: the single source of truth for what is pending.
//!
//! Exactly one decision is ever open, and it names the one actor who may
//! act. Every other actor's available-actions query collapses to `wait`.
//! Each decision variant carries only the fields that decision needs, so a
//! handler can never read a "wrong key" out of an untyped context.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::board::SquareId;
use crate::core::PlayerId;
use crate::trade::TradeId;

/// The open decision blocking further turn progress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingDecision {
    /// The landing player must buy the square or send it to auction.
    BuyOrAuction { player: PlayerId, square: SquareId },

    /// An auction is running; the actor is the bidder on turn, derived
    /// from the auction state.
    AuctionBid,

    /// The recipient of a trade offer must accept, reject, or counter.
    RespondToTrade { player: PlayerId, trade: TradeId },

    /// After a rejection below the cap, the proposer re-proposes or ends
    /// the negotiation.
    ContinueNegotiation { player: PlayerId, trade: TradeId },

    /// Mortgaged properties changed hands in a trade; the receiver pays
    /// 10% of each mortgage principal to keep it mortgaged, or 110% to
    /// clear it.
    HandleMortgagedProperties {
        player: PlayerId,
        squares: SmallVec<[SquareId; 2]>,
    },

    /// Start-of-turn jail escape choice.
    JailOptions {
        player: PlayerId,
        /// Failed double-roll attempts so far this stay.
        rolls_attempted: u8,
        /// A roll was already attempted this turn; only bail or a card
        /// remain until the next turn.
        rolled_this_turn: bool,
    },

    /// A payment left the player's cash negative; they must liquidate or
    /// go bankrupt.
    LiquidateForDebt {
        player: PlayerId,
        debt: i64,
        creditor: Option<PlayerId>,
    },
}

impl PendingDecision {
    /// The actor this decision targets, if it is fixed by the decision
    /// itself. `AuctionBid` derives its actor from the auction rotation.
    #[must_use]
    pub fn fixed_actor(&self) -> Option<PlayerId> {
        match *self {
            PendingDecision::BuyOrAuction { player, .. }
            | PendingDecision::RespondToTrade { player, .. }
            | PendingDecision::ContinueNegotiation { player, .. }
            | PendingDecision::HandleMortgagedProperties { player, .. }
            | PendingDecision::JailOptions { player, .. }
            | PendingDecision::LiquidateForDebt { player, .. } => Some(player),
            PendingDecision::AuctionBid => None,
        }
    }

    /// Short name for events and messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            PendingDecision::BuyOrAuction { .. } => "buy_or_auction",
            PendingDecision::AuctionBid => "auction_bid",
            PendingDecision::RespondToTrade { .. } => "respond_to_trade",
            PendingDecision::ContinueNegotiation { .. } => "continue_negotiation",
            PendingDecision::HandleMortgagedProperties { .. } => "handle_mortgaged_properties",
            PendingDecision::JailOptions { .. } => "jail_options",
            PendingDecision::LiquidateForDebt { .. } => "liquidate_for_debt",
        }
    }
}

/// Register holding the at-most-one open decision plus the dice-outcome
/// flag for the current turn segment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRegister {
    pending: Option<PendingDecision>,
    outcome_processed: bool,
}

impl DecisionRegister {
    /// Fresh register: nothing pending, ready to roll.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: None,
            outcome_processed: true,
        }
    }

    /// The open decision, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&PendingDecision> {
        self.pending.as_ref()
    }

    /// Whether the current dice outcome has been fully resolved.
    #[must_use]
    pub fn outcome_processed(&self) -> bool {
        self.outcome_processed
    }

    /// Open a decision, leaving the segment unresolved.
    pub fn open(&mut self, decision: PendingDecision) {
        self.pending = Some(decision);
        self.outcome_processed = false;
    }

    /// Replace the open decision without resolving the segment.
    pub fn replace(&mut self, decision: PendingDecision) {
        self.pending = Some(decision);
    }

    /// Resolve the segment: clear the decision and mark the outcome
    /// processed.
    pub fn resolve(&mut self) {
        self.pending = None;
        self.outcome_processed = true;
    }

    /// Mark the segment unresolved without opening a decision (dice are in
    /// flight).
    pub fn begin_segment(&mut self) {
        self.outcome_processed = false;
    }

    /// Drop a stale decision (e.g. targeting a bankrupt actor) so the game
    /// cannot deadlock.
    pub fn clear_stale(&mut self) {
        self.pending = None;
        self.outcome_processed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_starts_ready() {
        let reg = DecisionRegister::new();
        assert!(reg.pending().is_none());
        assert!(reg.outcome_processed());
    }

    #[test]
    fn test_open_and_resolve() {
        let mut reg = DecisionRegister::new();

        reg.open(PendingDecision::BuyOrAuction {
            player: PlayerId::new(1),
            square: SquareId::new(3),
        });
        assert!(reg.pending().is_some());
        assert!(!reg.outcome_processed());

        reg.resolve();
        assert!(reg.pending().is_none());
        assert!(reg.outcome_processed());
    }

    #[test]
    fn test_fixed_actor() {
        let d = PendingDecision::JailOptions {
            player: PlayerId::new(2),
            rolls_attempted: 1,
            rolled_this_turn: false,
        };
        assert_eq!(d.fixed_actor(), Some(PlayerId::new(2)));

        assert_eq!(PendingDecision::AuctionBid.fixed_actor(), None);
    }

    #[test]
    fn test_decision_serialization() {
        let d = PendingDecision::LiquidateForDebt {
            player: PlayerId::new(0),
            debt: 40,
            creditor: Some(PlayerId::new(1)),
        };
        let json = serde_json::to_string(&d).unwrap();
        let back: PendingDecision = serde_json::from_str(&json).unwrap();
        assert_eq!(d, back);
    }
}
