//! Chance and Community Chest card decks.
//!
//! Decks are shuffled once at game start and drawn cyclically; there is no
//! reshuffle-on-exhaustion. Get-out-of-jail cards stay in the deck while a
//! player holds the matching flag, so a redraw while one is outstanding
//! grants the flag idempotently.

use serde::{Deserialize, Serialize};

use super::square::{DeckKind, SquareId};
use crate::core::GameRng;

/// What a drawn card does.
///
/// Movement effects re-enter the landing dispatcher at the destination;
/// everything else resolves in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardEffect {
    /// The bank pays the drawer.
    CollectFromBank(i64),
    /// The drawer pays the bank.
    PayBank(i64),
    /// Move directly to a square, collecting GO salary on wrap.
    AdvanceTo(SquareId),
    /// Step backwards; no GO salary.
    MoveBack(u8),
    /// Straight to jail, no GO salary.
    GoToJail,
    /// Grant the drawer this deck's get-out-of-jail flag.
    GetOutOfJailFree,
    /// Every other player pays the drawer.
    CollectFromEachPlayer(i64),
    /// The drawer pays every other player.
    PayEachPlayer(i64),
    /// Levy per building the drawer owns.
    StreetRepairs { per_house: i64, per_hotel: i64 },
}

/// A single deck card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub description: String,
    pub effect: CardEffect,
}

impl Card {
    fn new(description: &str, effect: CardEffect) -> Self {
        Self {
            description: description.into(),
            effect,
        }
    }
}

/// An ordered card deck with a cyclic draw pointer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDeck {
    pub kind: DeckKind,
    cards: Vec<Card>,
    next: usize,
}

impl CardDeck {
    /// Create a deck and shuffle it once.
    #[must_use]
    pub fn new(kind: DeckKind, mut cards: Vec<Card>, rng: &mut GameRng) -> Self {
        assert!(!cards.is_empty(), "deck must hold at least one card");
        rng.shuffle(&mut cards);
        Self {
            kind,
            cards,
            next: 0,
        }
    }

    /// The standard Chance deck.
    #[must_use]
    pub fn standard_chance(rng: &mut GameRng) -> Self {
        use CardEffect::*;

        let cards = vec![
            Card::new("Advance to GO. Collect salary.", AdvanceTo(SquareId::GO)),
            Card::new("Advance to Illinois Avenue.", AdvanceTo(SquareId::new(24))),
            Card::new("Advance to St. Charles Place.", AdvanceTo(SquareId::new(11))),
            Card::new("Take a trip to Reading Railroad.", AdvanceTo(SquareId::new(5))),
            Card::new("Advance to Boardwalk.", AdvanceTo(SquareId::new(39))),
            Card::new("Go back 3 spaces.", MoveBack(3)),
            Card::new("Go directly to jail.", GoToJail),
            Card::new("Get out of jail free.", GetOutOfJailFree),
            Card::new("Bank pays you dividend of $50.", CollectFromBank(50)),
            Card::new("Your building loan matures. Collect $150.", CollectFromBank(150)),
            Card::new("Speeding fine. Pay $15.", PayBank(15)),
            Card::new(
                "Make general repairs: $25 per house, $100 per hotel.",
                StreetRepairs { per_house: 25, per_hotel: 100 },
            ),
            Card::new(
                "You have been elected chairman of the board. Pay each player $50.",
                PayEachPlayer(50),
            ),
        ];

        Self::new(DeckKind::Chance, cards, rng)
    }

    /// The standard Community Chest deck.
    #[must_use]
    pub fn standard_community_chest(rng: &mut GameRng) -> Self {
        use CardEffect::*;

        let cards = vec![
            Card::new("Advance to GO. Collect salary.", AdvanceTo(SquareId::GO)),
            Card::new("Go directly to jail.", GoToJail),
            Card::new("Get out of jail free.", GetOutOfJailFree),
            Card::new("Bank error in your favor. Collect $200.", CollectFromBank(200)),
            Card::new("Doctor's fees. Pay $50.", PayBank(50)),
            Card::new("From sale of stock you get $50.", CollectFromBank(50)),
            Card::new("Holiday fund matures. Collect $100.", CollectFromBank(100)),
            Card::new("Income tax refund. Collect $20.", CollectFromBank(20)),
            Card::new("Hospital fees. Pay $100.", PayBank(100)),
            Card::new("School fees. Pay $50.", PayBank(50)),
            Card::new("You inherit $100.", CollectFromBank(100)),
            Card::new(
                "It is your birthday. Collect $10 from each player.",
                CollectFromEachPlayer(10),
            ),
            Card::new(
                "Street repairs: $40 per house, $115 per hotel.",
                StreetRepairs { per_house: 40, per_hotel: 115 },
            ),
        ];

        Self::new(DeckKind::CommunityChest, cards, rng)
    }

    /// Draw the next card, advancing the cyclic pointer.
    pub fn draw(&mut self) -> Card {
        let card = self.cards[self.next].clone();
        self.next = (self.next + 1) % self.cards.len();
        card
    }

    /// Number of cards in the deck.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Decks are never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
