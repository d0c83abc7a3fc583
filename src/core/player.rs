//! Player identification, per-player storage, and the player record.
//!
//! ## PlayerId
//!
//! Type-safe player identifier supporting 2-8 seats.
//!
//! ## PlayerMap
//!
//! Efficient per-player data storage backed by `Vec` for O(1) access.
//!
//! ## Player
//!
//! The mutable per-agent record: cash, board position, jail status and
//! get-out-of-jail card flags. Every protocol in the engine mutates this
//! through the orchestrator; once `bankrupt` is set the record is frozen
//! and the player leaves the turn rotation.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

use crate::board::SquareId;

/// Player identifier. Seat indices are 0-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw seat index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over all player IDs for a game with `player_count` seats.
    pub fn all(player_count: usize) -> impl Iterator<Item = PlayerId> {
        (0..player_count as u8).map(PlayerId)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

/// Per-player data storage with O(1) access.
///
/// Backed by a `Vec<T>` with one entry per seat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMap<T> {
    data: Vec<T>,
}

impl<T> PlayerMap<T> {
    /// Create a new PlayerMap with values from a factory function.
    ///
    /// The factory receives the `PlayerId` for each seat.
    pub fn new(player_count: usize, factory: impl Fn(PlayerId) -> T) -> Self {
        assert!(player_count >= 2, "Must have at least 2 players");
        assert!(player_count <= 8, "At most 8 players supported");

        let data = (0..player_count as u8)
            .map(|i| factory(PlayerId(i)))
            .collect();

        Self { data }
    }

    /// Create a new PlayerMap with all entries set to the same value.
    pub fn with_value(player_count: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self::new(player_count, |_| value.clone())
    }

    /// Get the number of seats.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.data.len()
    }

    /// Get a reference to a player's data.
    #[must_use]
    pub fn get(&self, player: PlayerId) -> &T {
        &self.data[player.index()]
    }

    /// Get a mutable reference to a player's data.
    pub fn get_mut(&mut self, player: PlayerId) -> &mut T {
        &mut self.data[player.index()]
    }

    /// Iterate over (PlayerId, &T) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }

    /// Iterate over all player IDs.
    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> {
        (0..self.data.len() as u8).map(PlayerId)
    }
}

impl<T> Index<PlayerId> for PlayerMap<T> {
    type Output = T;

    fn index(&self, player: PlayerId) -> &Self::Output {
        self.get(player)
    }
}

impl<T> IndexMut<PlayerId> for PlayerMap<T> {
    fn index_mut(&mut self, player: PlayerId) -> &mut Self::Output {
        self.get_mut(player)
    }
}

/// Get-out-of-jail card flags, one per deck.
///
/// The cards are not removed from their deck while held (cyclic decks);
/// holding both flags is the cap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JailCards {
    pub chance: bool,
    pub community_chest: bool,
}

impl JailCards {
    /// Whether the player holds at least one card.
    #[must_use]
    pub fn any(self) -> bool {
        self.chance || self.community_chest
    }

    /// Spend one card, preferring the Chance copy.
    ///
    /// Returns false if no card was held.
    pub fn spend(&mut self) -> bool {
        if self.chance {
            self.chance = false;
            true
        } else if self.community_chest {
            self.community_chest = false;
            true
        } else {
            false
        }
    }
}

/// The mutable per-agent record.
///
/// `money` is allowed to go negative transiently: a required payment always
/// settles in full and the liquidation protocol is responsible for bringing
/// cash back to zero or finalizing bankruptcy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Cash on hand.
    pub money: i64,

    /// Current board position.
    pub position: SquareId,

    /// In jail (as opposed to just visiting).
    pub in_jail: bool,

    /// Failed double-roll escape attempts this jail stay (0..=3).
    pub jail_rolls_attempted: u8,

    /// Get-out-of-jail card flags.
    pub jail_cards: JailCards,

    /// Frozen and out of the turn rotation.
    pub bankrupt: bool,
}

impl Player {
    /// Create a player at GO with the given starting cash.
    #[must_use]
    pub fn new(starting_money: i64) -> Self {
        Self {
            money: starting_money,
            position: SquareId::GO,
            in_jail: false,
            jail_rolls_attempted: 0,
            jail_cards: JailCards::default(),
            bankrupt: false,
        }
    }

    /// Whether the player is still in the game.
    #[must_use]
    pub fn active(&self) -> bool {
        !self.bankrupt
    }
}
