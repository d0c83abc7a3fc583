//! Action representation: typed verbs with typed parameters.
//!
//! External callers submit `(actor, Action)`; the orchestrator validates
//! the pair against the decision register before any protocol runs.
//! `ActionKind` is the parameter-free discriminant used for
//! available-actions queries and failed-action tracking.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::board::SquareId;
use crate::core::PlayerId;
use crate::trade::{TradeId, TradeItem};

/// A complete submitted action.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    // Turn progression
    RollDice,
    EndTurn,
    Wait,

    // Buy-or-auction decision
    BuyProperty,
    DeclineProperty,

    // Auction
    Bid { amount: i64 },
    PassBid,

    // Property management
    BuildHouse { square: SquareId },
    SellHouse { square: SquareId },
    Mortgage { square: SquareId },
    Unmortgage { square: SquareId },

    // Trade protocol
    ProposeTrade {
        recipient: PlayerId,
        offered: SmallVec<[TradeItem; 3]>,
        requested: SmallVec<[TradeItem; 3]>,
        message: Option<String>,
    },
    AcceptTrade { trade: TradeId },
    RejectTrade { trade: TradeId },
    CounterTrade {
        trade: TradeId,
        offered: SmallVec<[TradeItem; 3]>,
        requested: SmallVec<[TradeItem; 3]>,
        message: Option<String>,
    },
    EndNegotiation,

    // Received-mortgaged-property follow-up
    KeepMortgaged { square: SquareId },
    ClearMortgage { square: SquareId },

    // Jail protocol
    PayBail,
    UseJailCard,
    RollForDoubles,

    // Liquidation protocol
    ConfirmLiquidationDone,
}

/// Parameter-free action discriminant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    RollDice,
    EndTurn,
    Wait,
    BuyProperty,
    DeclineProperty,
    Bid,
    PassBid,
    BuildHouse,
    SellHouse,
    Mortgage,
    Unmortgage,
    ProposeTrade,
    AcceptTrade,
    RejectTrade,
    CounterTrade,
    EndNegotiation,
    KeepMortgaged,
    ClearMortgage,
    PayBail,
    UseJailCard,
    RollForDoubles,
    ConfirmLiquidationDone,
}

impl ActionKind {
    /// Stable wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::RollDice => "roll_dice",
            ActionKind::EndTurn => "end_turn",
            ActionKind::Wait => "wait",
            ActionKind::BuyProperty => "buy_property",
            ActionKind::DeclineProperty => "decline_property",
            ActionKind::Bid => "bid",
            ActionKind::PassBid => "pass_bid",
            ActionKind::BuildHouse => "build_house",
            ActionKind::SellHouse => "sell_house",
            ActionKind::Mortgage => "mortgage",
            ActionKind::Unmortgage => "unmortgage",
            ActionKind::ProposeTrade => "propose_trade",
            ActionKind::AcceptTrade => "accept_trade",
            ActionKind::RejectTrade => "reject_trade",
            ActionKind::CounterTrade => "counter_trade",
            ActionKind::EndNegotiation => "end_negotiation",
            ActionKind::KeepMortgaged => "keep_mortgaged",
            ActionKind::ClearMortgage => "clear_mortgage",
            ActionKind::PayBail => "pay_bail",
            ActionKind::UseJailCard => "use_jail_card",
            ActionKind::RollForDoubles => "roll_for_doubles",
            ActionKind::ConfirmLiquidationDone => "confirm_liquidation_done",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Action {
    /// The discriminant of this action.
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::RollDice => ActionKind::RollDice,
            Action::EndTurn => ActionKind::EndTurn,
            Action::Wait => ActionKind::Wait,
            Action::BuyProperty => ActionKind::BuyProperty,
            Action::DeclineProperty => ActionKind::DeclineProperty,
            Action::Bid { .. } => ActionKind::Bid,
            Action::PassBid => ActionKind::PassBid,
            Action::BuildHouse { .. } => ActionKind::BuildHouse,
            Action::SellHouse { .. } => ActionKind::SellHouse,
            Action::Mortgage { .. } => ActionKind::Mortgage,
            Action::Unmortgage { .. } => ActionKind::Unmortgage,
            Action::ProposeTrade { .. } => ActionKind::ProposeTrade,
            Action::AcceptTrade { .. } => ActionKind::AcceptTrade,
            Action::RejectTrade { .. } => ActionKind::RejectTrade,
            Action::CounterTrade { .. } => ActionKind::CounterTrade,
            Action::EndNegotiation => ActionKind::EndNegotiation,
            Action::KeepMortgaged { .. } => ActionKind::KeepMortgaged,
            Action::ClearMortgage { .. } => ActionKind::ClearMortgage,
            Action::PayBail => ActionKind::PayBail,
            Action::UseJailCard => ActionKind::UseJailCard,
            Action::RollForDoubles => ActionKind::RollForDoubles,
            Action::ConfirmLiquidationDone => ActionKind::ConfirmLiquidationDone,
        }
    }
}

/// A recorded action with metadata, kept for replay and observability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub player: PlayerId,
    pub action: Action,
    pub turn: u32,
}

impl ActionRecord {
    /// Create a new action record.
    #[must_use]
    pub fn new(player: PlayerId, action: Action, turn: u32) -> Self {
        Self { player, action, turn }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(Action::RollDice.kind(), ActionKind::RollDice);
        assert_eq!(Action::Bid { amount: 50 }.kind(), ActionKind::Bid);
        assert_eq!(
            Action::Mortgage { square: SquareId::new(3) }.kind(),
            ActionKind::Mortgage
        );
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(ActionKind::RollDice.as_str(), "roll_dice");
        assert_eq!(ActionKind::ConfirmLiquidationDone.as_str(), "confirm_liquidation_done");
        assert_eq!(format!("{}", ActionKind::Wait), "wait");
    }

    #[test]
    fn test_action_hash_distinguishes_params() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let hash = |a: &Action| {
            let mut h = DefaultHasher::new();
            a.hash(&mut h);
            h.finish()
        };

        let a1 = Action::Bid { amount: 50 };
        let a2 = Action::Bid { amount: 50 };
        let a3 = Action::Bid { amount: 60 };

        assert_eq!(hash(&a1), hash(&a2));
        assert_ne!(hash(&a1), hash(&a3));
    }

    #[test]
    fn test_action_serialization() {
        let action = Action::ProposeTrade {
            recipient: PlayerId::new(1),
            offered: smallvec::smallvec![TradeItem::Money(100)],
            requested: smallvec::smallvec![TradeItem::Deed(SquareId::new(3))],
            message: Some("deal?".into()),
        };
        let json = serde_json::to_string(&action).unwrap();
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(action, back);
    }
}
