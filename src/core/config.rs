//! Game configuration.
//!
//! All tunables live here so a game is fully described by
//! `(GameConfig, action sequence)`. Defaults are the classic rules.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine configuration, fixed at game creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Number of seats (2-8).
    pub player_count: usize,

    /// RNG seed for dice and game-start deck shuffles.
    pub seed: u64,

    /// Cash each player starts with.
    pub starting_money: i64,

    /// Salary granted when passing GO.
    pub go_salary: i64,

    /// Fixed bail amount for leaving jail.
    pub bail_amount: i64,

    /// Maximum double-roll escape attempts per jail stay.
    pub max_jail_rolls: u8,

    /// Negotiation-level rejection cap; reaching it terminates the chain.
    pub max_trade_rejections: u8,

    /// Minimum winning auction bid. Auctions with no bid above this floor
    /// conclude with no winner.
    pub auction_bid_floor: i64,

    /// Bound on every payment gateway call; timeout counts as failure.
    pub gateway_timeout: Duration,

    /// Rolling window for the failed-action tracker.
    pub failed_action_window: Duration,

    /// Identical failures within the window before blocking kicks in.
    pub failed_action_limit: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_count: 4,
            seed: 0,
            starting_money: 1500,
            go_salary: 200,
            bail_amount: 50,
            max_jail_rolls: 3,
            max_trade_rejections: 3,
            auction_bid_floor: 1,
            gateway_timeout: Duration::from_secs(5),
            failed_action_window: Duration::from_secs(60),
            failed_action_limit: 3,
        }
    }
}

impl GameConfig {
    /// Classic defaults with the given seat count and seed.
    #[must_use]
    pub fn new(player_count: usize, seed: u64) -> Self {
        Self {
            player_count,
            seed,
            ..Self::default()
        }
    }
}
