//! Stateless rent, building, and mortgage rules.
//!
//! Every function here is a pure computation over the board slice; the
//! orchestrator and protocols own all mutation. Legality checks return
//! `Result` with a `RuleViolation` naming the reason, so handlers can
//! surface it directly as a failure response.

use crate::board::{group_members, ColorGroup, Square, SquareId};
use crate::core::{EngineError, PlayerId};

/// Base rent per railroad; doubles with each additional one owned.
pub const RAILROAD_BASE_RENT: i64 = 25;

/// All purchasable squares owned by a player.
#[must_use]
pub fn owned_squares(board: &[Square], player: PlayerId) -> Vec<SquareId> {
    board
        .iter()
        .enumerate()
        .filter(|(_, sq)| sq.owner() == Some(player))
        .map(|(i, _)| SquareId(i as u8))
        .collect()
}

/// Number of railroads a player holds.
#[must_use]
pub fn railroads_owned(board: &[Square], player: PlayerId) -> u32 {
    board
        .iter()
        .filter(|sq| matches!(sq, Square::Railroad(r) if r.owner == Some(player)))
        .count() as u32
}

/// Number of utilities a player holds.
#[must_use]
pub fn utilities_owned(board: &[Square], player: PlayerId) -> u32 {
    board
        .iter()
        .filter(|sq| matches!(sq, Square::Utility(u) if u.owner == Some(player)))
        .count() as u32
}

/// Whether a player owns every street in a color group.
#[must_use]
pub fn owns_full_group(board: &[Square], player: PlayerId, group: ColorGroup) -> bool {
    group_members(board, group)
        .iter()
        .all(|id| board[id.index()].owner() == Some(player))
}

/// Whether every street in a group is unmortgaged.
#[must_use]
pub fn group_unmortgaged(board: &[Square], group: ColorGroup) -> bool {
    group_members(board, group)
        .iter()
        .all(|id| !board[id.index()].is_mortgaged())
}

fn group_house_bounds(board: &[Square], group: ColorGroup) -> (u8, u8) {
    let mut min = u8::MAX;
    let mut max = 0;
    for id in group_members(board, group) {
        if let Some(p) = board[id.index()].as_property() {
            min = min.min(p.houses);
            max = max.max(p.houses);
        }
    }
    (min, max)
}

/// Rent owed for landing on a square.
///
/// Returns 0 for unowned or mortgaged squares. The caller is responsible
/// for skipping self-rent. `dice_total` is the landing roll, used only for
/// utilities.
#[must_use]
pub fn rent(board: &[Square], square: SquareId, dice_total: u8) -> i64 {
    let sq = &board[square.index()];
    let Some(owner) = sq.owner() else {
        return 0;
    };
    if sq.is_mortgaged() {
        return 0;
    }

    match sq {
        Square::Property(p) => match p.houses {
            0 => {
                if owns_full_group(board, owner, p.group) {
                    p.rent_levels[0] * 2
                } else {
                    p.rent_levels[0]
                }
            }
            n @ 1..=5 => p.rent_levels[n as usize],
            _ => p.rent_levels[5],
        },
        Square::Railroad(_) => {
            let owned = railroads_owned(board, owner).max(1);
            RAILROAD_BASE_RENT * 2i64.pow(owned - 1)
        }
        Square::Utility(_) => {
            let multiplier = if utilities_owned(board, owner) >= 2 { 10 } else { 4 };
            multiplier * i64::from(dice_total)
        }
        _ => 0,
    }
}

/// Check house-build legality; returns the build cost.
///
/// Requires a full unmortgaged color group, fewer than 5 houses on the
/// target, and even development: the target must sit at the group minimum.
pub fn can_build_house(
    board: &[Square],
    player: PlayerId,
    square: SquareId,
) -> Result<i64, EngineError> {
    let Some(p) = board[square.index()].as_property() else {
        return Err(EngineError::rule(format!("{square} is not a street property")));
    };
    if p.owner != Some(player) {
        return Err(EngineError::rule(format!("{player} does not own {}", p.name)));
    }
    if !owns_full_group(board, player, p.group) {
        return Err(EngineError::rule(format!(
            "{player} does not hold the full {:?} group",
            p.group
        )));
    }
    if !group_unmortgaged(board, p.group) {
        return Err(EngineError::rule(format!(
            "{:?} group has a mortgaged street",
            p.group
        )));
    }
    if p.houses >= 5 {
        return Err(EngineError::rule(format!("{} already has a hotel", p.name)));
    }
    let (min, _) = group_house_bounds(board, p.group);
    if p.houses != min {
        return Err(EngineError::rule(format!(
            "uneven development: {} must wait for the rest of the {:?} group",
            p.name, p.group
        )));
    }
    Ok(p.house_price)
}

/// Check house-sale legality; returns the sale proceeds.
///
/// Mirror of building: the target must sit at the group maximum.
pub fn can_sell_house(
    board: &[Square],
    player: PlayerId,
    square: SquareId,
) -> Result<i64, EngineError> {
    let Some(p) = board[square.index()].as_property() else {
        return Err(EngineError::rule(format!("{square} is not a street property")));
    };
    if p.owner != Some(player) {
        return Err(EngineError::rule(format!("{player} does not own {}", p.name)));
    }
    if p.houses == 0 {
        return Err(EngineError::rule(format!("{} has no houses to sell", p.name)));
    }
    let (_, max) = group_house_bounds(board, p.group);
    if p.houses != max {
        return Err(EngineError::rule(format!(
            "uneven development: sell from the most-built street of the {:?} group first",
            p.group
        )));
    }
    Ok(p.house_price / 2)
}

/// Check mortgage legality; returns the proceeds.
///
/// Streets require zero houses across the whole color group.
pub fn can_mortgage(
    board: &[Square],
    player: PlayerId,
    square: SquareId,
) -> Result<i64, EngineError> {
    let sq = &board[square.index()];
    if !sq.is_purchasable() {
        return Err(EngineError::rule(format!("{square} cannot be mortgaged")));
    }
    if sq.owner() != Some(player) {
        return Err(EngineError::rule(format!("{player} does not own {}", sq.name())));
    }
    if sq.is_mortgaged() {
        return Err(EngineError::rule(format!("{} is already mortgaged", sq.name())));
    }
    if let Some(p) = sq.as_property() {
        let (_, max) = group_house_bounds(board, p.group);
        if max > 0 {
            return Err(EngineError::rule(format!(
                "the {:?} group still has houses",
                p.group
            )));
        }
    }
    sq.mortgage_value()
        .ok_or_else(|| EngineError::internal(format!("{square} has no mortgage value")))
}

/// Check unmortgage legality; returns the cost (principal plus 10%).
pub fn can_unmortgage(
    board: &[Square],
    player: PlayerId,
    square: SquareId,
) -> Result<i64, EngineError> {
    let sq = &board[square.index()];
    if sq.owner() != Some(player) {
        return Err(EngineError::rule(format!("{player} does not own {}", sq.name())));
    }
    if !sq.is_mortgaged() {
        return Err(EngineError::rule(format!("{} is not mortgaged", sq.name())));
    }
    let price = sq
        .price()
        .ok_or_else(|| EngineError::internal(format!("{square} has no price")))?;
    Ok(unmortgage_cost(price))
}

/// Unmortgage cost: `floor(price/2 * 1.1)`.
#[must_use]
pub fn unmortgage_cost(price: i64) -> i64 {
    price / 2 * 11 / 10
}

/// Count a player's buildings for street-repair levies.
///
/// Returns `(houses, hotels)`; a hotel square counts as one hotel and no
/// houses.
#[must_use]
pub fn building_count(board: &[Square], player: PlayerId) -> (u32, u32) {
    let mut houses = 0;
    let mut hotels = 0;
    for sq in board {
        if let Square::Property(p) = sq {
            if p.owner == Some(player) {
                match p.houses {
                    5 => hotels += 1,
                    n => houses += u32::from(n),
                }
            }
        }
    }
    (houses, hotels)
}
