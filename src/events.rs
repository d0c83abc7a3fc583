//! Typed game events.
//!
//! Every state transition appends an event to the in-state log. The engine
//! never interprets its own events; they exist for transport and
//! persistence layers to drain and forward to observers.

use serde::{Deserialize, Serialize};

/// What happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    GameStarted,
    DiceRolled,
    Moved,
    SalaryCollected,
    DecisionOpened,
    DecisionResolved,
    PropertyPurchased,
    RentPaid,
    TaxPaid,
    CardDrawn,
    WentToJail,
    LeftJail,
    AuctionStarted,
    BidPlaced,
    BidPassed,
    AuctionConcluded,
    TradeProposed,
    TradeAccepted,
    TradeRejected,
    TradeCountered,
    NegotiationEnded,
    HouseBuilt,
    HouseSold,
    PropertyMortgaged,
    PropertyUnmortgaged,
    PaymentDeclined,
    DebtIncurred,
    BankruptcyFinalized,
    TurnEnded,
    GameEnded,
}

/// A single log entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    pub kind: EventKind,
    pub message: String,
    pub turn: u32,
    pub game_id: u64,
}

impl GameEvent {
    /// Create a new event.
    #[must_use]
    pub fn new(kind: EventKind, message: impl Into<String>, turn: u32, game_id: u64) -> Self {
        Self {
            kind,
            message: message.into(),
            turn,
            game_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_construction() {
        let event = GameEvent::new(EventKind::DiceRolled, "Player 0 rolled 3+4", 2, 7);
        assert_eq!(event.kind, EventKind::DiceRolled);
        assert_eq!(event.turn, 2);
        assert_eq!(event.game_id, 7);
    }

    #[test]
    fn test_event_serialization() {
        let event = GameEvent::new(EventKind::TradeAccepted, "trade 3 accepted", 9, 1);
        let json = serde_json::to_string(&event).unwrap();
        let back: GameEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
