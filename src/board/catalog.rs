//! The fixed 40-square board table and its read-only client projection.

use serde::{Deserialize, Serialize};

use super::square::{ColorGroup, DeckKind, Property, Railroad, SpecialKind, Square, SquareId, Utility};

fn street(
    name: &str,
    group: ColorGroup,
    price: i64,
    rent_levels: [i64; 6],
    house_price: i64,
) -> Square {
    Square::Property(Property {
        name: name.into(),
        group,
        price,
        mortgage_value: price / 2,
        rent_levels,
        house_price,
        owner: None,
        mortgaged: false,
        houses: 0,
    })
}

fn railroad(name: &str) -> Square {
    Square::Railroad(Railroad {
        name: name.into(),
        price: 200,
        mortgage_value: 100,
        owner: None,
        mortgaged: false,
    })
}

fn utility(name: &str) -> Square {
    Square::Utility(Utility {
        name: name.into(),
        price: 150,
        mortgage_value: 75,
        owner: None,
        mortgaged: false,
    })
}

/// Build the classic US board layout.
///
/// Index 0 is GO; indices increase clockwise.
#[must_use]
pub fn standard_board() -> Vec<Square> {
    use ColorGroup::*;
    use DeckKind::*;
    use SpecialKind::*;

    let board = vec![
        Square::Special(Go),
        street("Mediterranean Avenue", Brown, 60, [2, 10, 30, 90, 160, 250], 50),
        Square::ActionCard { deck: CommunityChest },
        street("Baltic Avenue", Brown, 60, [4, 20, 60, 180, 320, 450], 50),
        Square::Tax { name: "Income Tax".into(), amount: 200 },
        railroad("Reading Railroad"),
        street("Oriental Avenue", LightBlue, 100, [6, 30, 90, 270, 400, 550], 50),
        Square::ActionCard { deck: Chance },
        street("Vermont Avenue", LightBlue, 100, [6, 30, 90, 270, 400, 550], 50),
        street("Connecticut Avenue", LightBlue, 120, [8, 40, 100, 300, 450, 600], 50),
        Square::Special(JailVisiting),
        street("St. Charles Place", Pink, 140, [10, 50, 150, 450, 625, 750], 100),
        utility("Electric Company"),
        street("States Avenue", Pink, 140, [10, 50, 150, 450, 625, 750], 100),
        street("Virginia Avenue", Pink, 160, [12, 60, 180, 500, 700, 900], 100),
        railroad("Pennsylvania Railroad"),
        street("St. James Place", Orange, 180, [14, 70, 200, 550, 750, 950], 100),
        Square::ActionCard { deck: CommunityChest },
        street("Tennessee Avenue", Orange, 180, [14, 70, 200, 550, 750, 950], 100),
        street("New York Avenue", Orange, 200, [16, 80, 220, 600, 800, 1000], 100),
        Square::Special(FreeParking),
        street("Kentucky Avenue", Red, 220, [18, 90, 250, 700, 875, 1050], 150),
        Square::ActionCard { deck: Chance },
        street("Indiana Avenue", Red, 220, [18, 90, 250, 700, 875, 1050], 150),
        street("Illinois Avenue", Red, 240, [20, 100, 300, 750, 925, 1100], 150),
        railroad("B. & O. Railroad"),
        street("Atlantic Avenue", Yellow, 260, [22, 110, 330, 800, 975, 1150], 150),
        street("Ventnor Avenue", Yellow, 260, [22, 110, 330, 800, 975, 1150], 150),
        utility("Water Works"),
        street("Marvin Gardens", Yellow, 280, [24, 120, 360, 850, 1025, 1200], 150),
        Square::Special(GoToJail),
        street("Pacific Avenue", Green, 300, [26, 130, 390, 900, 1100, 1275], 200),
        street("North Carolina Avenue", Green, 300, [26, 130, 390, 900, 1100, 1275], 200),
        Square::ActionCard { deck: CommunityChest },
        street("Pennsylvania Avenue", Green, 320, [28, 150, 450, 1000, 1200, 1400], 200),
        railroad("Short Line"),
        Square::ActionCard { deck: Chance },
        street("Park Place", DarkBlue, 350, [35, 175, 500, 1100, 1300, 1500], 200),
        Square::Tax { name: "Luxury Tax".into(), amount: 100 },
        street("Boardwalk", DarkBlue, 400, [50, 200, 600, 1400, 1700, 2000], 200),
    ];

    debug_assert_eq!(board.len(), SquareId::BOARD_SIZE as usize);
    board
}

/// All squares belonging to a color group.
#[must_use]
pub fn group_members(board: &[Square], group: ColorGroup) -> Vec<SquareId> {
    board
        .iter()
        .enumerate()
        .filter(|(_, sq)| sq.as_property().is_some_and(|p| p.group == group))
        .map(|(i, _)| SquareId(i as u8))
        .collect()
}

/// One square in the client-facing layout projection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquareSummary {
    pub index: u8,
    pub name: String,
    pub kind: String,
    pub price: Option<i64>,
    pub group: Option<ColorGroup>,
}

/// Read-only board projection for client rendering.
///
/// Carries no engine semantics; ownership and improvements are reported
/// through events and snapshots instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardLayout {
    pub squares: Vec<SquareSummary>,
}

impl BoardLayout {
    /// Project a board into its static layout.
    #[must_use]
    pub fn from_board(board: &[Square]) -> Self {
        let squares = board
            .iter()
            .enumerate()
            .map(|(i, sq)| SquareSummary {
                index: i as u8,
                name: sq.name().to_string(),
                kind: match sq {
                    Square::Property(_) => "property",
                    Square::Railroad(_) => "railroad",
                    Square::Utility(_) => "utility",
                    Square::Tax { .. } => "tax",
                    Square::ActionCard { .. } => "action_card",
                    Square::Special(_) => "special",
                }
                .to_string(),
                price: sq.price(),
                group: sq.as_property().map(|p| p.group),
            })
            .collect();

        Self { squares }
    }
}
