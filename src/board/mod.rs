//! Board catalog: squares, the fixed 40-square layout, and card decks.

pub mod catalog;
pub mod deck;
pub mod square;

pub use catalog::{group_members, standard_board, BoardLayout, SquareSummary};
pub use deck::{Card, CardDeck, CardEffect};
pub use square::{ColorGroup, DeckKind, Property, Railroad, SpecialKind, Square, SquareId, Utility};
