//! Property-based checks over the stateless rules layer.

use proptest::prelude::*;

use landlord_engine::rules::{
    can_build_house, can_sell_house, rent, unmortgage_cost,
};
use landlord_engine::{standard_board, ColorGroup, PlayerId, Square, SquareId};

fn street_ids(board: &[Square], group: ColorGroup) -> Vec<SquareId> {
    board
        .iter()
        .enumerate()
        .filter(|(_, sq)| matches!(sq, Square::Property(p) if p.group == group))
        .map(|(i, _)| SquareId(i as u8))
        .collect()
}

proptest! {
    #[test]
    fn rent_is_never_negative(square in 0u8..40, dice in 2u8..=12, houses in 0u8..=5) {
        let mut board = standard_board();
        let id = SquareId(square);
        board[id.index()].set_owner(Some(PlayerId::new(0)));
        if let Some(p) = board[id.index()].as_property_mut() {
            p.houses = houses;
        }
        prop_assert!(rent(&board, id, dice) >= 0);
    }

    #[test]
    fn mortgaged_squares_charge_nothing(square in 0u8..40, dice in 2u8..=12) {
        let mut board = standard_board();
        let id = SquareId(square);
        board[id.index()].set_owner(Some(PlayerId::new(0)));
        board[id.index()].set_mortgaged(true);
        prop_assert_eq!(rent(&board, id, dice), 0);
    }

    #[test]
    fn monopoly_exactly_doubles_unimproved_rent(dice in 2u8..=12) {
        let owner = PlayerId::new(0);
        let mut board = standard_board();
        let browns = street_ids(&board, ColorGroup::Brown);

        board[browns[0].index()].set_owner(Some(owner));
        let solo = rent(&board, browns[0], dice);

        for &id in &browns {
            board[id.index()].set_owner(Some(owner));
        }
        prop_assert_eq!(rent(&board, browns[0], dice), solo * 2);
    }

    #[test]
    fn build_sequences_keep_development_even(choices in proptest::collection::vec(0usize..3, 0..30)) {
        let owner = PlayerId::new(0);
        let mut board = standard_board();
        let oranges = street_ids(&board, ColorGroup::Orange);
        for &id in &oranges {
            board[id.index()].set_owner(Some(owner));
        }

        for choice in choices {
            let target = oranges[choice % oranges.len()];
            if can_build_house(&board, owner, target).is_ok() {
                board[target.index()].as_property_mut().unwrap().houses += 1;
            }

            let counts: Vec<u8> = oranges
                .iter()
                .map(|id| board[id.index()].as_property().unwrap().houses)
                .collect();
            let min = *counts.iter().min().unwrap();
            let max = *counts.iter().max().unwrap();
            prop_assert!(max - min <= 1);
        }
    }

    #[test]
    fn sell_sequences_keep_development_even(choices in proptest::collection::vec(0usize..3, 0..30)) {
        let owner = PlayerId::new(0);
        let mut board = standard_board();
        let reds = street_ids(&board, ColorGroup::Red);
        for &id in &reds {
            let sq = &mut board[id.index()];
            sq.set_owner(Some(owner));
            sq.as_property_mut().unwrap().houses = 5;
        }

        for choice in choices {
            let target = reds[choice % reds.len()];
            if can_sell_house(&board, owner, target).is_ok() {
                board[target.index()].as_property_mut().unwrap().houses -= 1;
            }

            let counts: Vec<u8> = reds
                .iter()
                .map(|id| board[id.index()].as_property().unwrap().houses)
                .collect();
            prop_assert!(counts.iter().max().unwrap() - counts.iter().min().unwrap() <= 1);
        }
    }

    #[test]
    fn mortgage_round_trip_never_profits(price in 2i64..=1000) {
        // Redeeming always costs at least the principal raised.
        prop_assert!(unmortgage_cost(price) >= price / 2);
    }
}
