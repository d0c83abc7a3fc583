//! The authoritative per-game state aggregate.
//!
//! One `GameState` per game instance; all mutation is serialized through
//! the orchestrator. Everything in here serializes, which is what makes
//! the once-per-turn snapshot a complete dump.

use im::Vector;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::actions::ActionRecord;
use crate::auction::AuctionState;
use crate::board::{standard_board, CardDeck, Square, SquareId};
use crate::core::{EngineError, GameConfig, GameRng, Player, PlayerId, PlayerMap};
use crate::decision::{DecisionRegister, PendingDecision};
use crate::events::{EventKind, GameEvent};
use crate::trade::{Negotiation, TradeId, TradeOffer};

/// Complete state of one game instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    pub game_id: u64,

    pub players: PlayerMap<Player>,
    pub board: Vec<Square>,
    pub chance: CardDeck,
    pub community_chest: CardDeck,
    pub rng: GameRng,

    /// Turn number, starting at 1.
    pub turn_number: u32,
    pub current_player: PlayerId,

    /// The single pending-decision register.
    pub register: DecisionRegister,

    // Per-turn dice bookkeeping.
    pub rolled_this_turn: bool,
    /// A double was rolled and the bonus roll is still owed.
    pub bonus_roll: bool,
    /// Consecutive doubles this turn; three sends the roller to jail.
    pub doubles_streak: u8,
    /// Total of the most recent movement roll (utilities rent input).
    pub last_dice_total: u8,

    // Protocol state.
    pub trades: FxHashMap<TradeId, TradeOffer>,
    next_trade_id: u32,
    pub negotiation: Option<Negotiation>,
    pub auction: Option<AuctionState>,

    /// Players still owing the mortgaged-deed follow-up after a trade,
    /// with the deeds each received. Processed one player at a time.
    pub mortgage_followups: Vec<(PlayerId, smallvec::SmallVec<[SquareId; 2]>)>,

    /// A liquidation decision suspended while the debtor negotiates a
    /// trade to raise cash; restored when the negotiation concludes.
    pub suspended_liquidation: Option<PendingDecision>,

    // Observability.
    pub events: Vector<GameEvent>,
    pub action_history: Vector<ActionRecord>,
}

impl GameState {
    /// Create a fresh game: standard board, shuffled decks, everyone at GO.
    #[must_use]
    pub fn new(config: &GameConfig, game_id: u64) -> Self {
        let mut rng = GameRng::new(config.seed);
        let chance = CardDeck::standard_chance(&mut rng);
        let community_chest = CardDeck::standard_community_chest(&mut rng);

        let mut state = Self {
            game_id,
            players: PlayerMap::new(config.player_count, |_| Player::new(config.starting_money)),
            board: standard_board(),
            chance,
            community_chest,
            rng,
            turn_number: 1,
            current_player: PlayerId::new(0),
            register: DecisionRegister::new(),
            rolled_this_turn: false,
            bonus_roll: false,
            doubles_streak: 0,
            last_dice_total: 0,
            trades: FxHashMap::default(),
            next_trade_id: 0,
            negotiation: None,
            auction: None,
            mortgage_followups: Vec::new(),
            suspended_liquidation: None,
            events: Vector::new(),
            action_history: Vector::new(),
        };

        state.push_event(
            EventKind::GameStarted,
            format!("game started with {} players", config.player_count),
        );
        state
    }

    /// Get a player's record.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[id]
    }

    /// Get a mutable player record.
    pub fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        &mut self.players[id]
    }

    /// Non-bankrupt players in seating order.
    #[must_use]
    pub fn active_players(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|(_, p)| p.active())
            .map(|(id, _)| id)
            .collect()
    }

    /// The next non-bankrupt player after `from` in seating order.
    #[must_use]
    pub fn next_active_after(&self, from: PlayerId) -> PlayerId {
        let count = self.players.player_count() as u8;
        let mut candidate = from.0;
        for _ in 0..count {
            candidate = (candidate + 1) % count;
            if self.players[PlayerId(candidate)].active() {
                return PlayerId(candidate);
            }
        }
        from
    }

    /// Fewer than two players remain.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.active_players().len() < 2
    }

    /// The surviving winner, once the game is over.
    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        let active = self.active_players();
        if active.len() == 1 {
            Some(active[0])
        } else {
            None
        }
    }

    /// The actor targeted by the open decision, if any.
    ///
    /// `AuctionBid` derives its actor from the auction rotation.
    #[must_use]
    pub fn decision_actor(&self) -> Option<PlayerId> {
        match self.register.pending()? {
            PendingDecision::AuctionBid => self.auction.as_ref()?.current_bidder(),
            other => other.fixed_actor(),
        }
    }

    /// Allocate the next trade offer ID.
    pub fn alloc_trade_id(&mut self) -> TradeId {
        let id = TradeId(self.next_trade_id);
        self.next_trade_id += 1;
        id
    }

    /// Append an event to the log.
    pub fn push_event(&mut self, kind: EventKind, message: impl Into<String>) {
        let event = GameEvent::new(kind, message, self.turn_number, self.game_id);
        self.events.push_back(event);
    }

    /// Square lookup.
    #[must_use]
    pub fn square(&self, id: SquareId) -> &Square {
        &self.board[id.index()]
    }

    /// Mutable square lookup.
    pub fn square_mut(&mut self, id: SquareId) -> &mut Square {
        &mut self.board[id.index()]
    }

    /// Take the once-per-turn full-state snapshot.
    pub fn snapshot(&self) -> Result<TurnSnapshot, EngineError> {
        let data = bincode::serialize(self)
            .map_err(|e| EngineError::internal(format!("snapshot serialization failed: {e}")))?;
        Ok(TurnSnapshot {
            game_id: self.game_id,
            turn_number: self.turn_number,
            data,
        })
    }
}

/// Serializable full-state dump keyed by `(game_id, turn_number)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSnapshot {
    pub game_id: u64,
    pub turn_number: u32,
    data: Vec<u8>,
}

impl TurnSnapshot {
    /// Restore the full state from this snapshot.
    pub fn restore(&self) -> Result<GameState, EngineError> {
        bincode::deserialize(&self.data)
            .map_err(|e| EngineError::internal(format!("snapshot deserialization failed: {e}")))
    }
}
