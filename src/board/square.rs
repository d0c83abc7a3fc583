//! Board squares as a closed sum type.
//!
//! Every square on the board is one of six variants, matched exhaustively
//! by the landing dispatcher. Purchasable variants carry their own mutable
//! ownership state; there is no separate ownership table to drift out of
//! sync.
//!
//! Invariants:
//! - only purchasable variants ever have an owner
//! - a property with houses is never mortgaged

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;

/// Board position, 0..=39. GO is square 0; indices increase clockwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SquareId(pub u8);

impl SquareId {
    /// Number of squares on the board.
    pub const BOARD_SIZE: u8 = 40;

    /// The GO square.
    pub const GO: SquareId = SquareId(0);

    /// The jail / just-visiting square.
    pub const JAIL: SquareId = SquareId(10);

    /// Create a new square ID.
    ///
    /// Panics if `id` is off the board.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        assert!(id < Self::BOARD_SIZE, "square index off the board");
        Self(id)
    }

    /// Get the raw board index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Advance by `steps` squares, wrapping at GO.
    ///
    /// Returns the destination and whether the move wrapped past GO.
    #[must_use]
    pub fn advance(self, steps: u8) -> (SquareId, bool) {
        let raw = (self.0 as u16 + steps as u16) % Self::BOARD_SIZE as u16;
        let dest = SquareId(raw as u8);
        (dest, dest.0 < self.0)
    }

    /// Step backwards by `steps` squares. Never grants GO salary.
    #[must_use]
    pub fn step_back(self, steps: u8) -> SquareId {
        let board = Self::BOARD_SIZE as i16;
        let raw = (self.0 as i16 - steps as i16).rem_euclid(board);
        SquareId(raw as u8)
    }
}

impl std::fmt::Display for SquareId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Square {}", self.0)
    }
}

/// Color groups for street properties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorGroup {
    Brown,
    LightBlue,
    Pink,
    Orange,
    Red,
    Yellow,
    Green,
    DarkBlue,
}

/// Which card deck an action square draws from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeckKind {
    Chance,
    CommunityChest,
}

impl std::fmt::Display for DeckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeckKind::Chance => write!(f, "Chance"),
            DeckKind::CommunityChest => write!(f, "Community Chest"),
        }
    }
}

/// A street property: rentable, buildable, part of a color group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub group: ColorGroup,
    pub price: i64,
    pub mortgage_value: i64,
    /// Rent by improvement level: [base, 1 house, .., 4 houses, hotel].
    pub rent_levels: [i64; 6],
    pub house_price: i64,
    pub owner: Option<PlayerId>,
    pub mortgaged: bool,
    /// 0..=5; 5 is a hotel.
    pub houses: u8,
}

/// A railroad. Rent scales with how many the owner holds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Railroad {
    pub name: String,
    pub price: i64,
    pub mortgage_value: i64,
    pub owner: Option<PlayerId>,
    pub mortgaged: bool,
}

/// A utility. Rent is a multiple of the landing dice total.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utility {
    pub name: String,
    pub price: i64,
    pub mortgage_value: i64,
    pub owner: Option<PlayerId>,
    pub mortgaged: bool,
}

/// Non-purchasable corner and passive squares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialKind {
    Go,
    JailVisiting,
    FreeParking,
    GoToJail,
}

/// A single board square.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Square {
    Property(Property),
    Railroad(Railroad),
    Utility(Utility),
    Tax { name: String, amount: i64 },
    ActionCard { deck: DeckKind },
    Special(SpecialKind),
}

impl Square {
    /// Human-readable square name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Square::Property(p) => &p.name,
            Square::Railroad(r) => &r.name,
            Square::Utility(u) => &u.name,
            Square::Tax { name, .. } => name,
            Square::ActionCard { deck: DeckKind::Chance } => "Chance",
            Square::ActionCard { deck: DeckKind::CommunityChest } => "Community Chest",
            Square::Special(SpecialKind::Go) => "GO",
            Square::Special(SpecialKind::JailVisiting) => "Jail",
            Square::Special(SpecialKind::FreeParking) => "Free Parking",
            Square::Special(SpecialKind::GoToJail) => "Go To Jail",
        }
    }

    /// Whether the square can be owned.
    #[must_use]
    pub fn is_purchasable(&self) -> bool {
        matches!(
            self,
            Square::Property(_) | Square::Railroad(_) | Square::Utility(_)
        )
    }

    /// Owner of a purchasable square; `None` for unowned or non-purchasable.
    #[must_use]
    pub fn owner(&self) -> Option<PlayerId> {
        match self {
            Square::Property(p) => p.owner,
            Square::Railroad(r) => r.owner,
            Square::Utility(u) => u.owner,
            _ => None,
        }
    }

    /// Set or clear the owner of a purchasable square.
    ///
    /// No-op for non-purchasable squares.
    pub fn set_owner(&mut self, owner: Option<PlayerId>) {
        match self {
            Square::Property(p) => p.owner = owner,
            Square::Railroad(r) => r.owner = owner,
            Square::Utility(u) => u.owner = owner,
            _ => {}
        }
    }

    /// Purchase price, if purchasable.
    #[must_use]
    pub fn price(&self) -> Option<i64> {
        match self {
            Square::Property(p) => Some(p.price),
            Square::Railroad(r) => Some(r.price),
            Square::Utility(u) => Some(u.price),
            _ => None,
        }
    }

    /// Mortgage proceeds, if purchasable.
    #[must_use]
    pub fn mortgage_value(&self) -> Option<i64> {
        match self {
            Square::Property(p) => Some(p.mortgage_value),
            Square::Railroad(r) => Some(r.mortgage_value),
            Square::Utility(u) => Some(u.mortgage_value),
            _ => None,
        }
    }

    /// Mortgage flag; false for non-purchasable squares.
    #[must_use]
    pub fn is_mortgaged(&self) -> bool {
        match self {
            Square::Property(p) => p.mortgaged,
            Square::Railroad(r) => r.mortgaged,
            Square::Utility(u) => u.mortgaged,
            _ => false,
        }
    }

    /// Set the mortgage flag on a purchasable square.
    pub fn set_mortgaged(&mut self, mortgaged: bool) {
        match self {
            Square::Property(p) => p.mortgaged = mortgaged,
            Square::Railroad(r) => r.mortgaged = mortgaged,
            Square::Utility(u) => u.mortgaged = mortgaged,
            _ => {}
        }
    }

    /// Street property view, if this is one.
    #[must_use]
    pub fn as_property(&self) -> Option<&Property> {
        match self {
            Square::Property(p) => Some(p),
            _ => None,
        }
    }

    /// Mutable street property view, if this is one.
    pub fn as_property_mut(&mut self) -> Option<&mut Property> {
        match self {
            Square::Property(p) => Some(p),
            _ => None,
        }
    }
}
