//! Trade offers and negotiations.
//!
//! An offer is immutable once created: a counter-offer is a brand-new
//! offer with the sides swapped, linked to the one it replaces. The
//! rejection count lives on the negotiation, scoped to the whole
//! counter-offer chain, and is the single counter the termination cap
//! checks.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::board::{DeckKind, Square, SquareId};
use crate::core::{EngineError, Player, PlayerId};

/// Trade offer identifier, unique within a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeId(pub u32);

impl std::fmt::Display for TradeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Trade {}", self.0)
    }
}

/// One side's item in a trade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeItem {
    /// Cash amount.
    Money(i64),
    /// A purchasable square.
    Deed(SquareId),
    /// A get-out-of-jail card from the named deck.
    JailCard(DeckKind),
}

/// Lifecycle of a single offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeStatus {
    Pending,
    Accepted,
    Rejected,
    /// Superseded by a counter-offer; inert.
    Countered,
    /// The negotiation hit the rejection cap or was ended by the proposer.
    Terminated,
}

/// A single immutable trade offer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeOffer {
    pub id: TradeId,
    pub proposer: PlayerId,
    pub recipient: PlayerId,
    pub offered: SmallVec<[TradeItem; 3]>,
    pub requested: SmallVec<[TradeItem; 3]>,
    pub status: TradeStatus,
    /// The offer this one counters, if any.
    pub counter_of: Option<TradeId>,
    pub turn_proposed: u32,
    pub message: Option<String>,
}

/// A negotiation: the chain of an offer and its counters.
///
/// `rejections` is the one rejection counter for the whole chain
/// (per-offer counts do not exist).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Negotiation {
    /// First offer of the chain.
    pub root: TradeId,
    /// Offer currently awaiting a response or re-proposal.
    pub active: TradeId,
    /// Rejections across the whole chain.
    pub rejections: u8,
}

/// Validate that one side of a trade can actually deliver its items.
///
/// Called at proposal time and again at acceptance time: an intervening
/// state change (a spent card, a sold deed, drained cash) invalidates the
/// trade.
pub fn validate_side(
    board: &[Square],
    giver: &Player,
    giver_id: PlayerId,
    items: &[TradeItem],
) -> Result<(), EngineError> {
    let mut cash_needed = 0i64;
    for item in items {
        match *item {
            TradeItem::Money(amount) => {
                if amount <= 0 {
                    return Err(EngineError::rule("trade money amounts must be positive"));
                }
                cash_needed += amount;
            }
            TradeItem::Deed(square) => {
                let sq = &board[square.index()];
                if sq.owner() != Some(giver_id) {
                    return Err(EngineError::rule(format!(
                        "{giver_id} does not own {}",
                        sq.name()
                    )));
                }
                if sq.as_property().is_some_and(|p| p.houses > 0) {
                    return Err(EngineError::rule(format!(
                        "{} has houses; sell them before trading the deed",
                        sq.name()
                    )));
                }
            }
            TradeItem::JailCard(deck) => {
                let held = match deck {
                    DeckKind::Chance => giver.jail_cards.chance,
                    DeckKind::CommunityChest => giver.jail_cards.community_chest,
                };
                if !held {
                    return Err(EngineError::rule(format!(
                        "{giver_id} does not hold a {deck} jail card"
                    )));
                }
            }
        }
    }

    if giver.money < cash_needed {
        return Err(EngineError::rule(format!(
            "{giver_id} cannot cover {cash_needed} in offered cash"
        )));
    }
    Ok(())
}

/// Mortgaged deeds in an item list; these trigger the receive-mortgaged
/// follow-up decision after the swap.
#[must_use]
pub fn mortgaged_deeds(board: &[Square], items: &[TradeItem]) -> SmallVec<[SquareId; 2]> {
    items
        .iter()
        .filter_map(|item| match *item {
            TradeItem::Deed(square) if board[square.index()].is_mortgaged() => Some(square),
            _ => None,
        })
        .collect()
}
