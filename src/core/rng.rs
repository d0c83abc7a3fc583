//! Deterministic random number generation for dice and deck shuffles.
//!
//! ## Key Features
//!
//! - **Deterministic**: same seed plus same action sequence produces an
//!   identical game, which is what makes agent runs replayable.
//! - **Serializable**: O(1) state capture via the ChaCha8 word position,
//!   so turn snapshots restore mid-stream.
//!
//! Dice and shuffles are the only sources of randomness in the engine;
//! everything else is a pure function of state and submitted actions.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Deterministic RNG backing dice rolls and game-start deck shuffles.
///
/// Uses ChaCha8 for speed while keeping a serializable stream position.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
}

/// A single roll of two six-sided dice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    pub first: u8,
    pub second: u8,
}

impl DiceRoll {
    /// Sum of both dice.
    #[must_use]
    pub fn total(self) -> u8 {
        self.first + self.second
    }

    /// Whether the roll is a double.
    #[must_use]
    pub fn is_double(self) -> bool {
        self.first == self.second
    }
}

impl std::fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}+{}", self.first, self.second)
    }
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Roll two uniform 1-6 dice.
    pub fn roll_dice(&mut self) -> DiceRoll {
        DiceRoll {
            first: self.inner.gen_range(1..=6),
            second: self.inner.gen_range(1..=6),
        }
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.inner);
    }

    /// Get the current state for serialization.
    #[must_use]
    pub fn state(&self) -> GameRngState {
        GameRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
        }
    }

    /// Restore from a saved state.
    #[must_use]
    pub fn from_state(state: &GameRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
        }
    }
}

/// Serializable RNG state for snapshots.
///
/// Uses the ChaCha8 word position for O(1) capture regardless of how many
/// random numbers have been generated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRngState {
    /// Original seed.
    pub seed: u64,
    /// ChaCha8 word position (128-bit counter).
    pub word_pos: u128,
}

impl Serialize for GameRng {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.state().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GameRng {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let state = GameRngState::deserialize(deserializer)?;
        Ok(GameRng::from_state(&state))
    }
}
