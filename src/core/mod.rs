//! Core types: players, RNG, configuration, errors.

pub mod config;
pub mod error;
pub mod player;
pub mod rng;

pub use config::GameConfig;
pub use error::{ActionResponse, ActionStatus, EngineError};
pub use player::{JailCards, Player, PlayerId, PlayerMap};
pub use rng::{DiceRoll, GameRng, GameRngState};
