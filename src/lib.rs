//! # landlord-engine
//!
//! A rules engine for a classic property-trading board game, built for
//! autonomous agents rather than humans at a table.
//!
//! ## Design Principles
//!
//! 1. **One pending decision**: the engine blocks on at most one typed
//!    decision at a time, and that decision names the one actor who may
//!    act. Everyone else's legal-move set collapses to `wait`.
//!
//! 2. **Deterministic core, async edges**: dice and game-start shuffles
//!    are the only randomness, driven by a seeded, serializable RNG.
//!    Asynchrony exists solely at the payment-gateway seam.
//!
//! 3. **The ledger is authoritative**: required payments settle in full
//!    even into negative cash; insolvency is handled by an explicit
//!    liquidation protocol, never by silently shrinking a debt.
//!
//! ## Modules
//!
//! - `core`: player identity, configuration, RNG, errors
//! - `board`: squares, the standard board catalog, card decks
//! - `rules`: stateless rent, building, and mortgage computations
//! - `decision`: the typed pending-decision register
//! - `actions`: the submitted-action vocabulary
//! - `trade`, `auction`: protocol state machines
//! - `engine`: the orchestrator driving turns and protocols
//! - `gateway`: the async payment port
//! - `state`: the per-game state aggregate and turn snapshots
//! - `events`: the typed observability log
//! - `throttle`: the failed-action tracker

pub mod actions;
pub mod auction;
pub mod board;
pub mod core;
pub mod decision;
pub mod engine;
pub mod events;
pub mod gateway;
pub mod rules;
pub mod state;
pub mod throttle;
pub mod trade;

// Re-export commonly used types
pub use crate::core::{
    ActionResponse, ActionStatus, DiceRoll, EngineError, GameConfig, GameRng, GameRngState,
    JailCards, Player, PlayerId, PlayerMap,
};

pub use crate::actions::{Action, ActionKind, ActionRecord};
pub use crate::auction::{AuctionOutcome, AuctionState};
pub use crate::board::{
    standard_board, BoardLayout, Card, CardDeck, CardEffect, ColorGroup, DeckKind, Square,
    SquareId,
};
pub use crate::decision::{DecisionRegister, PendingDecision};
pub use crate::engine::Engine;
pub use crate::events::{EventKind, GameEvent};
pub use crate::gateway::{InstantGateway, PaymentGateway, ScriptedGateway};
pub use crate::state::{GameState, TurnSnapshot};
pub use crate::trade::{Negotiation, TradeId, TradeItem, TradeOffer, TradeStatus};
