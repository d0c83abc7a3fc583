//! Turn progression: dice, movement, the landing dispatcher, card
//! effects, and property management.
//!
//! Movement cards re-enter the landing dispatcher, so landing is a loop
//! rather than a recursion: a Chance card can move the player onto the
//! other deck's square, which draws again.

use smallvec::SmallVec;

use super::Engine;
use crate::auction::AuctionState;
use crate::board::{CardEffect, DeckKind, SpecialKind, Square, SquareId};
use crate::core::{EngineError, PlayerId};
use crate::decision::PendingDecision;
use crate::events::EventKind;
use crate::gateway::PaymentGateway;
use crate::rules;

impl<G: PaymentGateway> Engine<G> {
    pub(super) async fn handle_roll_dice(&mut self, actor: PlayerId) -> Result<String, EngineError> {
        if self.state.register.pending().is_some() {
            return Err(EngineError::rule(
                "a decision is pending; the dice cannot be rolled",
            ));
        }
        if self.state.rolled_this_turn && !self.state.bonus_roll {
            return Err(EngineError::rule(format!("{actor} already rolled this turn")));
        }

        self.state.register.begin_segment();
        self.state.bonus_roll = false;
        self.state.rolled_this_turn = true;

        let roll = self.state.rng.roll_dice();
        self.state.last_dice_total = roll.total();
        self.state
            .push_event(EventKind::DiceRolled, format!("{actor} rolled {roll}"));

        if roll.is_double() {
            self.state.doubles_streak += 1;
            if self.state.doubles_streak >= 3 {
                self.send_to_jail(actor);
                self.state.register.resolve();
                return Ok(format!("{actor} rolled a third double and went to jail"));
            }
            self.state.bonus_roll = true;
        }

        self.move_forward(actor, roll.total()).await;
        self.land(actor).await?;
        Ok(format!("{actor} rolled {roll}"))
    }

    pub(super) fn handle_end_turn(&mut self, actor: PlayerId) -> Result<String, EngineError> {
        match self.state.register.pending() {
            Some(PendingDecision::JailOptions {
                rolled_this_turn: true,
                rolls_attempted,
                ..
            }) if *rolls_attempted < self.config.max_jail_rolls => {
                self.state.register.resolve();
                self.state.push_event(
                    EventKind::DecisionResolved,
                    format!("{actor} stays in jail"),
                );
            }
            Some(other) => {
                return Err(EngineError::rule(format!(
                    "cannot end the turn while {} is pending",
                    other.name()
                )));
            }
            None => {
                if !self.state.rolled_this_turn {
                    return Err(EngineError::rule("roll the dice before ending the turn"));
                }
                if self.state.bonus_roll {
                    return Err(EngineError::rule(
                        "a double grants another roll; roll again before ending the turn",
                    ));
                }
                if !self.state.register.outcome_processed() {
                    return Err(EngineError::internal(
                        "turn segment unresolved with no pending decision",
                    ));
                }
            }
        }

        self.advance_turn()?;
        Ok(format!("{actor} ended the turn"))
    }

    /// Rotate to the next active player, snapshotting the completed turn.
    pub(super) fn advance_turn(&mut self) -> Result<(), EngineError> {
        self.state.push_event(
            EventKind::TurnEnded,
            format!("turn {} ended", self.state.turn_number),
        );
        self.last_snapshot = Some(self.state.snapshot()?);

        let next = self.state.next_active_after(self.state.current_player);
        self.state.current_player = next;
        self.state.turn_number += 1;
        self.state.rolled_this_turn = false;
        self.state.bonus_roll = false;
        self.state.doubles_streak = 0;
        self.state.last_dice_total = 0;

        let player = self.state.player(next);
        if player.in_jail {
            let rolls_attempted = player.jail_rolls_attempted;
            self.open_decision(PendingDecision::JailOptions {
                player: next,
                rolls_attempted,
                rolled_this_turn: false,
            });
        }
        Ok(())
    }

    pub(super) async fn handle_buy_property(
        &mut self,
        actor: PlayerId,
    ) -> Result<String, EngineError> {
        let square = match self.state.register.pending() {
            Some(PendingDecision::BuyOrAuction { square, .. }) => *square,
            _ => return Err(EngineError::rule("no purchase decision is pending")),
        };
        let price = self
            .state
            .square(square)
            .price()
            .ok_or_else(|| EngineError::internal(format!("{square} has no purchase price")))?;

        self.settle_voluntary(actor, None, price, "property purchase")
            .await?;
        self.state.square_mut(square).set_owner(Some(actor));
        self.state.register.resolve();

        let name = self.state.square(square).name().to_owned();
        self.state.push_event(
            EventKind::PropertyPurchased,
            format!("{actor} bought {name} for {price}"),
        );
        Ok(format!("{actor} bought {name} for {price}"))
    }

    pub(super) fn handle_decline_property(&mut self, actor: PlayerId) -> Result<String, EngineError> {
        let square = match self.state.register.pending() {
            Some(PendingDecision::BuyOrAuction { square, .. }) => *square,
            _ => return Err(EngineError::rule("no purchase decision is pending")),
        };

        let bidders = self.state.active_players();
        self.state.auction = Some(AuctionState::new(square, &bidders, actor));
        self.state.register.replace(PendingDecision::AuctionBid);

        let name = self.state.square(square).name().to_owned();
        self.state.push_event(
            EventKind::AuctionStarted,
            format!("{actor} declined {name}; auction opened"),
        );
        Ok(format!("{actor} declined {name}; it goes to auction"))
    }

    pub(super) async fn handle_build_house(
        &mut self,
        actor: PlayerId,
        square: SquareId,
    ) -> Result<String, EngineError> {
        self.management_context(false)?;
        let cost = rules::can_build_house(&self.state.board, actor, square)?;
        self.settle_voluntary(actor, None, cost, "house purchase")
            .await?;

        let property = self
            .state
            .square_mut(square)
            .as_property_mut()
            .ok_or_else(|| EngineError::internal(format!("{square} is not a street")))?;
        property.houses += 1;
        let name = property.name.clone();

        self.state
            .push_event(EventKind::HouseBuilt, format!("{actor} built on {name}"));
        Ok(format!("{actor} built a house on {name} for {cost}"))
    }

    pub(super) async fn handle_sell_house(
        &mut self,
        actor: PlayerId,
        square: SquareId,
    ) -> Result<String, EngineError> {
        self.management_context(true)?;
        let proceeds = rules::can_sell_house(&self.state.board, actor, square)?;

        let property = self
            .state
            .square_mut(square)
            .as_property_mut()
            .ok_or_else(|| EngineError::internal(format!("{square} is not a street")))?;
        property.houses -= 1;
        let name = property.name.clone();

        self.credit_from_bank(actor, proceeds, "house sale").await;
        self.state.push_event(
            EventKind::HouseSold,
            format!("{actor} sold a house on {name} for {proceeds}"),
        );
        self.refresh_liquidation(actor);
        Ok(format!("{actor} sold a house on {name} for {proceeds}"))
    }

    pub(super) async fn handle_mortgage(
        &mut self,
        actor: PlayerId,
        square: SquareId,
    ) -> Result<String, EngineError> {
        self.management_context(true)?;
        let proceeds = rules::can_mortgage(&self.state.board, actor, square)?;

        self.state.square_mut(square).set_mortgaged(true);
        self.credit_from_bank(actor, proceeds, "mortgage").await;

        let name = self.state.square(square).name().to_owned();
        self.state.push_event(
            EventKind::PropertyMortgaged,
            format!("{actor} mortgaged {name} for {proceeds}"),
        );
        self.refresh_liquidation(actor);
        Ok(format!("{actor} mortgaged {name} for {proceeds}"))
    }

    pub(super) async fn handle_unmortgage(
        &mut self,
        actor: PlayerId,
        square: SquareId,
    ) -> Result<String, EngineError> {
        self.management_context(false)?;
        let cost = rules::can_unmortgage(&self.state.board, actor, square)?;
        self.settle_voluntary(actor, None, cost, "mortgage redemption")
            .await?;

        self.state.square_mut(square).set_mortgaged(false);
        let name = self.state.square(square).name().to_owned();
        self.state.push_event(
            EventKind::PropertyUnmortgaged,
            format!("{actor} unmortgaged {name} for {cost}"),
        );
        Ok(format!("{actor} unmortgaged {name} for {cost}"))
    }

    /// Management actions run on the actor's own turn with no pending
    /// decision, or (for cash-raising ones) during their own liquidation.
    fn management_context(&self, during_liquidation: bool) -> Result<(), EngineError> {
        match self.state.register.pending() {
            None => Ok(()),
            Some(PendingDecision::LiquidateForDebt { .. }) if during_liquidation => Ok(()),
            Some(other) => Err(EngineError::rule(format!(
                "not available while {} is pending",
                other.name()
            ))),
        }
    }

    /// Keep the open liquidation decision's remaining debt current after a
    /// cash-raising action.
    fn refresh_liquidation(&mut self, actor: PlayerId) {
        if let Some(PendingDecision::LiquidateForDebt {
            player, creditor, ..
        }) = self.state.register.pending()
        {
            if *player == actor {
                let (player, creditor) = (*player, *creditor);
                let debt = (-self.state.player(actor).money).max(0);
                self.state.register.replace(PendingDecision::LiquidateForDebt {
                    player,
                    debt,
                    creditor,
                });
            }
        }
    }

    /// Move forward, collecting GO salary on a wrap.
    pub(super) async fn move_forward(&mut self, player: PlayerId, steps: u8) {
        let from = self.state.player(player).position;
        let (dest, wrapped) = from.advance(steps);
        self.state.player_mut(player).position = dest;

        let name = self.state.square(dest).name().to_owned();
        self.state
            .push_event(EventKind::Moved, format!("{player} moved to {name}"));

        if wrapped {
            let salary = self.config.go_salary;
            self.credit_from_bank(player, salary, "GO salary").await;
            self.state.push_event(
                EventKind::SalaryCollected,
                format!("{player} collected {salary} salary"),
            );
        }
    }

    /// Resolve the square the player now stands on.
    ///
    /// Either resolves the turn segment in place or leaves a decision
    /// open. Loops when a card effect moves the player again.
    pub(super) async fn land(&mut self, player: PlayerId) -> Result<(), EngineError> {
        loop {
            let position = self.state.player(player).position;
            let square = self.state.square(position).clone();

            match square {
                Square::Property(_) | Square::Railroad(_) | Square::Utility(_) => {
                    match square.owner() {
                        None => {
                            self.open_decision(PendingDecision::BuyOrAuction {
                                player,
                                square: position,
                            });
                        }
                        Some(owner) if owner == player => {
                            self.state.register.resolve();
                        }
                        Some(owner) => {
                            let due =
                                rules::rent(&self.state.board, position, self.state.last_dice_total);
                            self.state.register.resolve();
                            if due > 0 {
                                self.state.push_event(
                                    EventKind::RentPaid,
                                    format!("{player} owes {owner} {due} rent for {}", square.name()),
                                );
                                self.charge(player, Some(owner), due, "rent").await;
                            }
                        }
                    }
                    return Ok(());
                }
                Square::Tax { name, amount } => {
                    self.state.register.resolve();
                    self.state.push_event(
                        EventKind::TaxPaid,
                        format!("{player} pays {amount} for {name}"),
                    );
                    self.charge(player, None, amount, "tax").await;
                    return Ok(());
                }
                Square::ActionCard { deck } => {
                    let card = match deck {
                        DeckKind::Chance => self.state.chance.draw(),
                        DeckKind::CommunityChest => self.state.community_chest.draw(),
                    };
                    self.state.push_event(
                        EventKind::CardDrawn,
                        format!("{player} drew: {}", card.description),
                    );
                    if self.apply_card(player, deck, card.effect).await? {
                        continue;
                    }
                    return Ok(());
                }
                Square::Special(SpecialKind::GoToJail) => {
                    self.send_to_jail(player);
                    self.state.register.resolve();
                    return Ok(());
                }
                Square::Special(_) => {
                    self.state.register.resolve();
                    return Ok(());
                }
            }
        }
    }

    /// Apply a card effect. Returns true when the player moved and the
    /// landing dispatcher must run again.
    async fn apply_card(
        &mut self,
        player: PlayerId,
        deck: DeckKind,
        effect: CardEffect,
    ) -> Result<bool, EngineError> {
        match effect {
            CardEffect::CollectFromBank(amount) => {
                self.credit_from_bank(player, amount, "card payout").await;
                self.state.register.resolve();
                Ok(false)
            }
            CardEffect::PayBank(amount) => {
                self.state.register.resolve();
                self.charge(player, None, amount, "card levy").await;
                Ok(false)
            }
            CardEffect::AdvanceTo(dest) => {
                let from = self.state.player(player).position;
                let steps = (dest.0 + SquareId::BOARD_SIZE - from.0) % SquareId::BOARD_SIZE;
                self.move_forward(player, steps).await;
                Ok(true)
            }
            CardEffect::MoveBack(steps) => {
                let from = self.state.player(player).position;
                let dest = from.step_back(steps);
                self.state.player_mut(player).position = dest;
                let name = self.state.square(dest).name().to_owned();
                self.state.push_event(
                    EventKind::Moved,
                    format!("{player} moved back to {name}"),
                );
                Ok(true)
            }
            CardEffect::GoToJail => {
                self.send_to_jail(player);
                self.state.register.resolve();
                Ok(false)
            }
            CardEffect::GetOutOfJailFree => {
                // Cyclic decks: the flag is granted idempotently if a
                // redraw happens while one copy is outstanding.
                match deck {
                    DeckKind::Chance => self.state.player_mut(player).jail_cards.chance = true,
                    DeckKind::CommunityChest => {
                        self.state.player_mut(player).jail_cards.community_chest = true;
                    }
                }
                self.state.register.resolve();
                Ok(false)
            }
            CardEffect::CollectFromEachPlayer(amount) => {
                // Payers contribute at most their non-negative cash, so a
                // birthday card never drives a payer insolvent. Resolve
                // before charging: a declined contribution still opens a
                // liquidation decision for that payer.
                self.state.register.resolve();
                let others: Vec<PlayerId> = self
                    .state
                    .active_players()
                    .into_iter()
                    .filter(|&p| p != player)
                    .collect();
                for other in others {
                    let contribution = amount.min(self.state.player(other).money.max(0));
                    if contribution > 0 {
                        self.charge(other, Some(player), contribution, "card collection")
                            .await;
                    }
                }
                Ok(false)
            }
            CardEffect::PayEachPlayer(amount) => {
                self.state.register.resolve();
                let others: Vec<PlayerId> = self
                    .state
                    .active_players()
                    .into_iter()
                    .filter(|&p| p != player)
                    .collect();
                for &other in &others {
                    self.charge(player, Some(other), amount, "card payment").await;
                }
                Ok(false)
            }
            CardEffect::StreetRepairs {
                per_house,
                per_hotel,
            } => {
                let (houses, hotels) = rules::building_count(&self.state.board, player);
                let levy = per_house * i64::from(houses) + per_hotel * i64::from(hotels);
                self.state.register.resolve();
                if levy > 0 {
                    self.charge(player, None, levy, "street repairs").await;
                }
                Ok(false)
            }
        }
    }

    /// Send a player to jail: no salary, no bonus roll, streak reset.
    pub(super) fn send_to_jail(&mut self, player: PlayerId) {
        {
            let record = self.state.player_mut(player);
            record.position = SquareId::JAIL;
            record.in_jail = true;
            record.jail_rolls_attempted = 0;
        }
        self.state.bonus_roll = false;
        self.state.doubles_streak = 0;
        self.state
            .push_event(EventKind::WentToJail, format!("{player} went to jail"));
    }

    /// Release a player from jail, resetting the escape-attempt counter.
    pub(super) fn release_from_jail(&mut self, player: PlayerId) {
        let record = self.state.player_mut(player);
        record.in_jail = false;
        record.jail_rolls_attempted = 0;
    }

    /// Queue of mortgaged-deed follow-ups, exposed for the trade protocol.
    pub(super) fn push_mortgage_followup(
        &mut self,
        player: PlayerId,
        squares: SmallVec<[SquareId; 2]>,
    ) {
        if !squares.is_empty() {
            self.state.mortgage_followups.push((player, squares));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Action;
    use crate::core::GameConfig;
    use crate::gateway::InstantGateway;

    const BALTIC: SquareId = SquareId(3);
    const ORIENTAL: SquareId = SquareId(6);
    const GO_TO_JAIL: SquareId = SquareId(30);
    const INCOME_TAX: SquareId = SquareId(4);

    fn engine() -> Engine<InstantGateway> {
        Engine::new(GameConfig::new(4, 42), InstantGateway, 1)
    }

    fn p(n: u8) -> PlayerId {
        PlayerId::new(n)
    }

    #[tokio::test]
    async fn test_buy_property_debits_and_assigns() {
        let mut engine = engine();
        engine.state.register.open(PendingDecision::BuyOrAuction {
            player: p(0),
            square: BALTIC,
        });

        let resp = engine.submit_action(p(0), Action::BuyProperty).await;
        assert!(resp.is_success());
        assert_eq!(engine.state.player(p(0)).money, 1440);
        assert_eq!(engine.state.square(BALTIC).owner(), Some(p(0)));
        assert!(engine.state.register.pending().is_none());
        assert!(engine.state.register.outcome_processed());
    }

    #[tokio::test]
    async fn test_decline_opens_auction() {
        let mut engine = engine();
        engine.state.register.open(PendingDecision::BuyOrAuction {
            player: p(1),
            square: ORIENTAL,
        });

        let resp = engine.submit_action(p(1), Action::DeclineProperty).await;
        assert!(resp.is_success());
        assert_eq!(
            engine.state.register.pending(),
            Some(&PendingDecision::AuctionBid)
        );
        // Bidding starts just after the decliner.
        let auction = engine.state.auction.as_ref().unwrap();
        assert_eq!(auction.current_bidder(), Some(p(2)));
    }

    #[tokio::test]
    async fn test_landing_on_owned_square_charges_rent() {
        let mut engine = engine();
        engine.state.square_mut(BALTIC).set_owner(Some(p(1)));
        engine.state.player_mut(p(0)).position = BALTIC;
        engine.state.last_dice_total = 7;
        engine.state.register.begin_segment();

        engine.land(p(0)).await.unwrap();

        assert_eq!(engine.state.player(p(0)).money, 1496);
        assert_eq!(engine.state.player(p(1)).money, 1504);
        assert!(engine.state.register.outcome_processed());
    }

    #[tokio::test]
    async fn test_landing_on_own_square_is_free() {
        let mut engine = engine();
        engine.state.square_mut(BALTIC).set_owner(Some(p(0)));
        engine.state.player_mut(p(0)).position = BALTIC;
        engine.state.register.begin_segment();

        engine.land(p(0)).await.unwrap();

        assert_eq!(engine.state.player(p(0)).money, 1500);
        assert!(engine.state.register.outcome_processed());
    }

    #[tokio::test]
    async fn test_landing_on_tax_square() {
        let mut engine = engine();
        engine.state.player_mut(p(0)).position = INCOME_TAX;
        engine.state.register.begin_segment();

        engine.land(p(0)).await.unwrap();

        assert_eq!(engine.state.player(p(0)).money, 1300);
    }

    #[tokio::test]
    async fn test_landing_on_go_to_jail() {
        let mut engine = engine();
        engine.state.player_mut(p(0)).position = GO_TO_JAIL;
        engine.state.register.begin_segment();

        engine.land(p(0)).await.unwrap();

        let player = engine.state.player(p(0));
        assert!(player.in_jail);
        assert_eq!(player.position, SquareId::JAIL);
    }

    #[tokio::test]
    async fn test_move_forward_collects_salary_on_wrap() {
        let mut engine = engine();
        engine.state.player_mut(p(0)).position = SquareId::new(38);

        engine.move_forward(p(0), 4).await;

        assert_eq!(engine.state.player(p(0)).position, SquareId::new(2));
        assert_eq!(engine.state.player(p(0)).money, 1700);
    }

    #[tokio::test]
    async fn test_end_turn_requires_roll() {
        let mut engine = engine();
        let resp = engine.submit_action(p(0), Action::EndTurn).await;
        assert!(!resp.is_success());
    }

    #[tokio::test]
    async fn test_end_turn_rotates_and_snapshots() {
        let mut engine = engine();
        engine.state.rolled_this_turn = true;

        let resp = engine.submit_action(p(0), Action::EndTurn).await;
        assert!(resp.is_success());
        assert_eq!(engine.state.current_player, p(1));
        assert_eq!(engine.state.turn_number, 2);
        assert!(!engine.state.rolled_this_turn);

        let snapshot = engine.last_snapshot().unwrap();
        assert_eq!(snapshot.turn_number, 1);
    }

    #[tokio::test]
    async fn test_end_turn_blocked_by_owed_bonus_roll() {
        let mut engine = engine();
        engine.state.rolled_this_turn = true;
        engine.state.bonus_roll = true;

        let resp = engine.submit_action(p(0), Action::EndTurn).await;
        assert!(!resp.is_success());
    }

    #[tokio::test]
    async fn test_turn_rotation_opens_jail_options() {
        let mut engine = engine();
        engine.state.player_mut(p(1)).in_jail = true;
        engine.state.player_mut(p(1)).position = SquareId::JAIL;
        engine.state.rolled_this_turn = true;

        engine.submit_action(p(0), Action::EndTurn).await;

        assert!(matches!(
            engine.state.register.pending(),
            Some(PendingDecision::JailOptions {
                player,
                rolls_attempted: 0,
                rolled_this_turn: false,
            }) if *player == p(1)
        ));
    }

    #[tokio::test]
    async fn test_build_and_sell_house() {
        let mut engine = engine();
        engine.state.square_mut(SquareId::new(1)).set_owner(Some(p(0)));
        engine.state.square_mut(BALTIC).set_owner(Some(p(0)));

        let resp = engine
            .submit_action(p(0), Action::BuildHouse { square: BALTIC })
            .await;
        assert!(resp.is_success());
        assert_eq!(engine.state.player(p(0)).money, 1450);
        assert_eq!(
            engine.state.square(BALTIC).as_property().unwrap().houses,
            1
        );

        let resp = engine
            .submit_action(p(0), Action::SellHouse { square: BALTIC })
            .await;
        assert!(resp.is_success());
        assert_eq!(engine.state.player(p(0)).money, 1475);
        assert_eq!(
            engine.state.square(BALTIC).as_property().unwrap().houses,
            0
        );
    }

    #[tokio::test]
    async fn test_mortgage_round_trip_costs_ten_percent() {
        let mut engine = engine();
        engine.state.square_mut(BALTIC).set_owner(Some(p(0)));

        engine
            .submit_action(p(0), Action::Mortgage { square: BALTIC })
            .await;
        assert_eq!(engine.state.player(p(0)).money, 1530);
        assert!(engine.state.square(BALTIC).is_mortgaged());

        engine
            .submit_action(p(0), Action::Unmortgage { square: BALTIC })
            .await;
        assert_eq!(engine.state.player(p(0)).money, 1497);
        assert!(!engine.state.square(BALTIC).is_mortgaged());
    }

    #[tokio::test]
    async fn test_rent_shortfall_opens_liquidation() {
        let mut engine = engine();
        engine.state.square_mut(BALTIC).set_owner(Some(p(1)));
        engine.state.player_mut(p(0)).money = 1;
        engine.state.player_mut(p(0)).position = BALTIC;
        engine.state.last_dice_total = 7;
        engine.state.register.begin_segment();

        engine.land(p(0)).await.unwrap();

        assert_eq!(engine.state.player(p(0)).money, -3);
        assert_eq!(engine.state.player(p(1)).money, 1504);
        assert!(matches!(
            engine.state.register.pending(),
            Some(PendingDecision::LiquidateForDebt {
                player,
                debt: 3,
                creditor: Some(creditor),
            }) if *player == p(0) && *creditor == p(1)
        ));
    }

    #[tokio::test]
    async fn test_street_repairs_card_levy() {
        let mut engine = engine();
        engine.state.square_mut(SquareId::new(1)).set_owner(Some(p(0)));
        engine.state.square_mut(BALTIC).set_owner(Some(p(0)));
        engine
            .state
            .square_mut(BALTIC)
            .as_property_mut()
            .unwrap()
            .houses = 5;
        engine.state.register.begin_segment();

        let moved = engine
            .apply_card(
                p(0),
                DeckKind::Chance,
                CardEffect::StreetRepairs {
                    per_house: 25,
                    per_hotel: 100,
                },
            )
            .await
            .unwrap();

        assert!(!moved);
        assert_eq!(engine.state.player(p(0)).money, 1400);
    }

    #[tokio::test]
    async fn test_birthday_card_caps_at_available_cash() {
        let mut engine = engine();
        engine.state.player_mut(p(1)).money = 4;
        engine.state.register.begin_segment();

        engine
            .apply_card(p(0), DeckKind::CommunityChest, CardEffect::CollectFromEachPlayer(10))
            .await
            .unwrap();

        // p1 pays only what they have; p2 and p3 pay in full.
        assert_eq!(engine.state.player(p(1)).money, 0);
        assert_eq!(engine.state.player(p(0)).money, 1500 + 4 + 10 + 10);
        assert!(engine.state.register.pending().is_none());
    }

    #[tokio::test]
    async fn test_get_out_of_jail_card_grants_flag_idempotently() {
        let mut engine = engine();
        engine.state.register.begin_segment();

        engine
            .apply_card(p(0), DeckKind::Chance, CardEffect::GetOutOfJailFree)
            .await
            .unwrap();
        engine.state.register.begin_segment();
        engine
            .apply_card(p(0), DeckKind::Chance, CardEffect::GetOutOfJailFree)
            .await
            .unwrap();

        let cards = engine.state.player(p(0)).jail_cards;
        assert!(cards.chance);
        assert!(!cards.community_chest);
    }

    #[tokio::test]
    async fn test_advance_to_go_grants_salary() {
        let mut engine = engine();
        engine.state.player_mut(p(0)).position = SquareId::new(7);
        engine.state.register.begin_segment();

        let moved = engine
            .apply_card(p(0), DeckKind::Chance, CardEffect::AdvanceTo(SquareId::GO))
            .await
            .unwrap();

        assert!(moved);
        assert_eq!(engine.state.player(p(0)).position, SquareId::GO);
        assert_eq!(engine.state.player(p(0)).money, 1700);
    }
}
