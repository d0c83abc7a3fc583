//! Auction state machine.
//!
//! Exists only while an auction is in progress; destroyed on conclusion.
//! Bidding order cycles through the remaining active bidders, starting
//! just after the player whose decline triggered the auction.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::board::SquareId;
use crate::core::{EngineError, PlayerId};

/// How a concluded auction ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuctionOutcome {
    /// The last standing bidder wins at the current bid.
    Won { winner: PlayerId, bid: i64 },
    /// Everyone passed without a qualifying bid; the square stays unowned.
    NoSale,
}

/// A running auction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionState {
    pub square: SquareId,
    pub current_bid: i64,
    pub highest_bidder: Option<PlayerId>,
    active_bidders: SmallVec<[PlayerId; 8]>,
    current_index: usize,
}

impl AuctionState {
    /// Start an auction over `square`.
    ///
    /// `bidders` must be the non-bankrupt players in seating order;
    /// bidding starts just after `decliner`.
    #[must_use]
    pub fn new(square: SquareId, bidders: &[PlayerId], decliner: PlayerId) -> Self {
        let active_bidders: SmallVec<[PlayerId; 8]> = bidders.iter().copied().collect();
        let start = active_bidders
            .iter()
            .position(|&p| p == decliner)
            .map(|i| (i + 1) % active_bidders.len())
            .unwrap_or(0);

        Self {
            square,
            current_bid: 0,
            highest_bidder: None,
            active_bidders,
            current_index: start,
        }
    }

    /// The bidder whose turn it is.
    #[must_use]
    pub fn current_bidder(&self) -> Option<PlayerId> {
        self.active_bidders.get(self.current_index).copied()
    }

    /// Remaining active bidders.
    #[must_use]
    pub fn active_bidders(&self) -> &[PlayerId] {
        &self.active_bidders
    }

    /// Place a bid for the bidder on turn.
    ///
    /// Must exceed the current bid and fit within `cash`.
    pub fn bid(&mut self, bidder: PlayerId, amount: i64, cash: i64) -> Result<(), EngineError> {
        if self.current_bidder() != Some(bidder) {
            return Err(EngineError::rule(format!("{bidder} is not the bidder on turn")));
        }
        if amount <= self.current_bid {
            return Err(EngineError::rule(format!(
                "bid {amount} does not beat the current bid of {}",
                self.current_bid
            )));
        }
        if amount > cash {
            return Err(EngineError::rule(format!("{bidder} cannot cover a bid of {amount}")));
        }

        self.current_bid = amount;
        self.highest_bidder = Some(bidder);
        self.advance();
        Ok(())
    }

    /// Withdraw the bidder on turn from the auction.
    ///
    /// A placed bid is binding: the holder of the high bid cannot
    /// withdraw it by passing. The rotation never reaches the high
    /// bidder without an intervening overbid, so this check only guards
    /// direct callers.
    pub fn pass(&mut self, bidder: PlayerId) -> Result<(), EngineError> {
        if self.current_bidder() != Some(bidder) {
            return Err(EngineError::rule(format!("{bidder} is not the bidder on turn")));
        }
        if self.highest_bidder == Some(bidder) {
            return Err(EngineError::rule(format!(
                "{bidder} holds the high bid and cannot withdraw it"
            )));
        }

        self.active_bidders.remove(self.current_index);
        if self.current_index >= self.active_bidders.len() {
            self.current_index = 0;
        }
        Ok(())
    }

    fn advance(&mut self) {
        if !self.active_bidders.is_empty() {
            self.current_index = (self.current_index + 1) % self.active_bidders.len();
        }
    }

    /// Check whether the auction has concluded.
    ///
    /// Fires once at most one active bidder remains. A lone remaining
    /// bidder only wins if they hold the highest bid above the floor;
    /// otherwise the auction ends with no sale.
    #[must_use]
    pub fn conclusion(&self, bid_floor: i64) -> Option<AuctionOutcome> {
        let settled = || match self.highest_bidder {
            Some(winner) if self.current_bid >= bid_floor => AuctionOutcome::Won {
                winner,
                bid: self.current_bid,
            },
            _ => AuctionOutcome::NoSale,
        };

        match self.active_bidders.len() {
            0 => Some(settled()),
            1 => {
                // A lone remaining bidder who has not bid yet still gets
                // the chance; once anyone holds the high bid, it stands.
                if self.highest_bidder.is_some() {
                    Some(settled())
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}
