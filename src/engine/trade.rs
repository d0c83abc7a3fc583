//! The trade protocol driver.
//!
//! One negotiation at a time. An offer targets its recipient with a
//! `RespondToTrade` decision; rejection below the cap hands control back
//! to the proposer as `ContinueNegotiation`; counter-offers create new
//! immutable offers with the sides swapped. Acceptance re-validates both
//! sides before the atomic swap, then queues the mortgaged-deed follow-up
//! per receiving player.
//!
//! A debtor mid-liquidation may open a negotiation to raise cash; their
//! liquidation decision is suspended and restored (with the remaining
//! debt recomputed) when the negotiation concludes.

use smallvec::SmallVec;

use super::Engine;
use crate::core::{EngineError, PlayerId};
use crate::decision::PendingDecision;
use crate::events::EventKind;
use crate::gateway::PaymentGateway;
use crate::rules;
use crate::trade::{
    mortgaged_deeds, validate_side, Negotiation, TradeId, TradeItem, TradeOffer, TradeStatus,
};

impl<G: PaymentGateway> Engine<G> {
    pub(super) fn handle_propose_trade(
        &mut self,
        actor: PlayerId,
        recipient: PlayerId,
        offered: SmallVec<[TradeItem; 3]>,
        requested: SmallVec<[TradeItem; 3]>,
        message: Option<String>,
    ) -> Result<String, EngineError> {
        let suspending = match self.state.register.pending() {
            None => false,
            Some(PendingDecision::LiquidateForDebt { .. }) => true,
            Some(other) => {
                return Err(EngineError::rule(format!(
                    "not available while {} is pending",
                    other.name()
                )));
            }
        };
        if self.state.negotiation.is_some() {
            return Err(EngineError::rule("a negotiation is already in progress"));
        }
        if recipient == actor {
            return Err(EngineError::rule("cannot trade with yourself"));
        }
        if recipient.index() >= self.state.players.player_count()
            || !self.state.player(recipient).active()
        {
            return Err(EngineError::rule(format!(
                "{recipient} is not an active player"
            )));
        }
        if offered.is_empty() && requested.is_empty() {
            return Err(EngineError::rule("a trade must move something"));
        }
        validate_side(&self.state.board, self.state.player(actor), actor, &offered)?;
        validate_side(
            &self.state.board,
            self.state.player(recipient),
            recipient,
            &requested,
        )?;

        if suspending {
            self.state.suspended_liquidation = self.state.register.pending().cloned();
        }

        let id = self.state.alloc_trade_id();
        let offer = TradeOffer {
            id,
            proposer: actor,
            recipient,
            offered,
            requested,
            status: TradeStatus::Pending,
            counter_of: None,
            turn_proposed: self.state.turn_number,
            message,
        };
        self.state.trades.insert(id, offer);
        self.state.negotiation = Some(Negotiation {
            root: id,
            active: id,
            rejections: 0,
        });
        self.state.push_event(
            EventKind::TradeProposed,
            format!("{actor} proposed {id} to {recipient}"),
        );
        self.open_decision(PendingDecision::RespondToTrade {
            player: recipient,
            trade: id,
        });
        Ok(format!("{actor} proposed {id} to {recipient}"))
    }

    pub(super) async fn handle_accept_trade(
        &mut self,
        actor: PlayerId,
        trade: TradeId,
    ) -> Result<String, EngineError> {
        match self.state.register.pending() {
            Some(PendingDecision::RespondToTrade { trade: pending, .. }) if *pending == trade => {}
            _ => {
                return Err(EngineError::rule(format!(
                    "{trade} is not awaiting {actor}'s response"
                )));
            }
        }
        let offer = self
            .state
            .trades
            .get(&trade)
            .cloned()
            .ok_or_else(|| EngineError::internal(format!("{trade} vanished from the ledger")))?;

        // An intervening state change invalidates the offer; the
        // recipient can still reject it.
        validate_side(
            &self.state.board,
            self.state.player(offer.proposer),
            offer.proposer,
            &offer.offered,
        )?;
        validate_side(
            &self.state.board,
            self.state.player(offer.recipient),
            offer.recipient,
            &offer.requested,
        )?;

        let to_recipient = mortgaged_deeds(&self.state.board, &offer.offered);
        let to_proposer = mortgaged_deeds(&self.state.board, &offer.requested);

        self.apply_items(offer.proposer, offer.recipient, &offer.offered)
            .await;
        self.apply_items(offer.recipient, offer.proposer, &offer.requested)
            .await;

        if let Some(stored) = self.state.trades.get_mut(&trade) {
            stored.status = TradeStatus::Accepted;
        }
        self.state.negotiation = None;
        self.state.push_event(
            EventKind::TradeAccepted,
            format!("{actor} accepted {trade}"),
        );
        self.state.register.resolve();

        self.push_mortgage_followup(offer.proposer, to_proposer);
        self.push_mortgage_followup(offer.recipient, to_recipient);
        self.after_trade_cleanup();

        Ok(format!("{actor} accepted {trade}"))
    }

    pub(super) fn handle_reject_trade(
        &mut self,
        actor: PlayerId,
        trade: TradeId,
    ) -> Result<String, EngineError> {
        match self.state.register.pending() {
            Some(PendingDecision::RespondToTrade { trade: pending, .. }) if *pending == trade => {}
            _ => {
                return Err(EngineError::rule(format!(
                    "{trade} is not awaiting {actor}'s response"
                )));
            }
        }
        let proposer = {
            let offer = self
                .state
                .trades
                .get_mut(&trade)
                .ok_or_else(|| EngineError::internal(format!("{trade} vanished from the ledger")))?;
            offer.status = TradeStatus::Rejected;
            offer.proposer
        };
        self.state
            .push_event(EventKind::TradeRejected, format!("{actor} rejected {trade}"));

        let negotiation = self
            .state
            .negotiation
            .as_mut()
            .ok_or_else(|| EngineError::internal("trade response without a negotiation"))?;
        negotiation.rejections += 1;

        if negotiation.rejections >= self.config.max_trade_rejections {
            self.state.negotiation = None;
            self.state.push_event(
                EventKind::NegotiationEnded,
                format!("negotiation over {trade} hit the rejection cap"),
            );
            self.state.register.resolve();
            self.after_trade_cleanup();
            Ok(format!("{actor} rejected {trade}; negotiation terminated"))
        } else {
            self.state.register.replace(PendingDecision::ContinueNegotiation {
                player: proposer,
                trade,
            });
            Ok(format!("{actor} rejected {trade}"))
        }
    }

    pub(super) fn handle_counter_trade(
        &mut self,
        actor: PlayerId,
        trade: TradeId,
        offered: SmallVec<[TradeItem; 3]>,
        requested: SmallVec<[TradeItem; 3]>,
        message: Option<String>,
    ) -> Result<String, EngineError> {
        match self.state.register.pending() {
            Some(PendingDecision::RespondToTrade { trade: pending, .. })
            | Some(PendingDecision::ContinueNegotiation { trade: pending, .. })
                if *pending == trade => {}
            _ => {
                return Err(EngineError::rule(format!(
                    "{trade} is not open for a counter-offer"
                )));
            }
        }
        let old = self
            .state
            .trades
            .get(&trade)
            .cloned()
            .ok_or_else(|| EngineError::internal(format!("{trade} vanished from the ledger")))?;
        let other = if old.proposer == actor {
            old.recipient
        } else {
            old.proposer
        };

        if offered.is_empty() && requested.is_empty() {
            return Err(EngineError::rule("a trade must move something"));
        }
        validate_side(&self.state.board, self.state.player(actor), actor, &offered)?;
        validate_side(&self.state.board, self.state.player(other), other, &requested)?;

        if let Some(stored) = self.state.trades.get_mut(&trade) {
            if stored.status == TradeStatus::Pending {
                stored.status = TradeStatus::Countered;
            }
        }

        let id = self.state.alloc_trade_id();
        let counter = TradeOffer {
            id,
            proposer: actor,
            recipient: other,
            offered,
            requested,
            status: TradeStatus::Pending,
            counter_of: Some(trade),
            turn_proposed: self.state.turn_number,
            message,
        };
        self.state.trades.insert(id, counter);

        let negotiation = self
            .state
            .negotiation
            .as_mut()
            .ok_or_else(|| EngineError::internal("counter-offer without a negotiation"))?;
        negotiation.active = id;

        self.state.push_event(
            EventKind::TradeCountered,
            format!("{actor} countered {trade} with {id}"),
        );
        self.state.register.replace(PendingDecision::RespondToTrade {
            player: other,
            trade: id,
        });
        Ok(format!("{actor} countered {trade} with {id}"))
    }

    pub(super) fn handle_end_negotiation(&mut self, actor: PlayerId) -> Result<String, EngineError> {
        let trade = match self.state.register.pending() {
            Some(PendingDecision::ContinueNegotiation { trade, .. }) => *trade,
            _ => return Err(EngineError::rule("no negotiation is awaiting continuation")),
        };
        if let Some(offer) = self.state.trades.get_mut(&trade) {
            offer.status = TradeStatus::Terminated;
        }
        self.state.negotiation = None;
        self.state.push_event(
            EventKind::NegotiationEnded,
            format!("{actor} ended the negotiation over {trade}"),
        );
        self.state.register.resolve();
        self.after_trade_cleanup();
        Ok(format!("{actor} ended the negotiation"))
    }

    pub(super) async fn handle_keep_mortgaged(
        &mut self,
        actor: PlayerId,
        square: crate::board::SquareId,
    ) -> Result<String, EngineError> {
        let squares = match self.state.register.pending() {
            Some(PendingDecision::HandleMortgagedProperties { squares, .. }) => squares.clone(),
            _ => return Err(EngineError::rule("no mortgaged-deed follow-up is pending")),
        };
        if !squares.contains(&square) {
            return Err(EngineError::rule(format!(
                "{square} is not part of the pending follow-up"
            )));
        }
        // Same base as clearing: the fee is 10% of the mortgage
        // principal, clearing costs 110% of it.
        let principal = self
            .state
            .square(square)
            .mortgage_value()
            .ok_or_else(|| EngineError::internal(format!("{square} has no mortgage value")))?;
        let fee = principal / 10;

        let remaining: SmallVec<[crate::board::SquareId; 2]> =
            squares.into_iter().filter(|&s| s != square).collect();
        // Re-queue the rest before the fee can open a liquidation, so no
        // follow-up is lost if the register gets taken over.
        if !remaining.is_empty() {
            self.state.mortgage_followups.insert(0, (actor, remaining));
        }
        self.state.register.resolve();

        let name = self.state.square(square).name().to_owned();
        self.state.push_event(
            EventKind::PropertyMortgaged,
            format!("{actor} keeps {name} mortgaged, paying a {fee} fee"),
        );
        self.charge(actor, None, fee, "mortgage holding fee").await;
        self.after_trade_cleanup();
        Ok(format!("{actor} kept {name} mortgaged and paid {fee}"))
    }

    pub(super) async fn handle_clear_mortgage(
        &mut self,
        actor: PlayerId,
        square: crate::board::SquareId,
    ) -> Result<String, EngineError> {
        let (player, squares) = match self.state.register.pending() {
            Some(PendingDecision::HandleMortgagedProperties { player, squares }) => {
                (*player, squares.clone())
            }
            _ => return Err(EngineError::rule("no mortgaged-deed follow-up is pending")),
        };
        if !squares.contains(&square) {
            return Err(EngineError::rule(format!(
                "{square} is not part of the pending follow-up"
            )));
        }
        let cost = rules::can_unmortgage(&self.state.board, actor, square)?;
        self.settle_voluntary(actor, None, cost, "mortgage redemption")
            .await?;
        self.state.square_mut(square).set_mortgaged(false);

        let name = self.state.square(square).name().to_owned();
        self.state.push_event(
            EventKind::PropertyUnmortgaged,
            format!("{actor} cleared the mortgage on {name} for {cost}"),
        );

        let remaining: SmallVec<[crate::board::SquareId; 2]> =
            squares.into_iter().filter(|&s| s != square).collect();
        if remaining.is_empty() {
            self.state.register.resolve();
            self.after_trade_cleanup();
        } else {
            self.state
                .register
                .replace(PendingDecision::HandleMortgagedProperties {
                    player,
                    squares: remaining,
                });
        }
        Ok(format!("{actor} cleared the mortgage on {name} for {cost}"))
    }

    /// Move one side's items to the other party.
    ///
    /// Both sides were validated, so the transfers are committed; the
    /// engine's ledger is authoritative over the gateway here, as with
    /// every required settlement.
    async fn apply_items(&mut self, giver: PlayerId, receiver: PlayerId, items: &[TradeItem]) {
        for item in items {
            match *item {
                TradeItem::Money(amount) => {
                    crate::gateway::settle_with_timeout(
                        self.config.gateway_timeout,
                        self.gateway
                            .pay_player_to_player(giver, receiver, amount, "trade"),
                    )
                    .await;
                    self.state.player_mut(giver).money -= amount;
                    self.state.player_mut(receiver).money += amount;
                }
                TradeItem::Deed(square) => {
                    self.state.square_mut(square).set_owner(Some(receiver));
                }
                TradeItem::JailCard(deck) => {
                    match deck {
                        crate::board::DeckKind::Chance => {
                            self.state.player_mut(giver).jail_cards.chance = false;
                            self.state.player_mut(receiver).jail_cards.chance = true;
                        }
                        crate::board::DeckKind::CommunityChest => {
                            self.state.player_mut(giver).jail_cards.community_chest = false;
                            self.state.player_mut(receiver).jail_cards.community_chest = true;
                        }
                    }
                }
            }
        }
    }

    /// Hand the register to whatever the concluded negotiation left
    /// behind: queued mortgaged-deed follow-ups first, then a suspended
    /// liquidation with its remaining debt recomputed.
    pub(super) fn after_trade_cleanup(&mut self) {
        if self.state.register.pending().is_some() {
            return;
        }
        if !self.state.mortgage_followups.is_empty() {
            let (player, squares) = self.state.mortgage_followups.remove(0);
            self.open_decision(PendingDecision::HandleMortgagedProperties { player, squares });
            return;
        }
        if let Some(PendingDecision::LiquidateForDebt {
            player, creditor, ..
        }) = self.state.suspended_liquidation.take()
        {
            let balance = self.state.player(player).money;
            if balance < 0 {
                self.open_decision(PendingDecision::LiquidateForDebt {
                    player,
                    debt: -balance,
                    creditor,
                });
            } else {
                self.state.push_event(
                    EventKind::DecisionResolved,
                    format!("{player} covered the outstanding debt"),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Action;
    use crate::board::SquareId;
    use crate::core::GameConfig;
    use crate::gateway::InstantGateway;
    use smallvec::smallvec;

    const BALTIC: SquareId = SquareId(3);
    const ORIENTAL: SquareId = SquareId(6);

    fn p(n: u8) -> PlayerId {
        PlayerId::new(n)
    }

    fn engine() -> Engine<InstantGateway> {
        let mut engine = Engine::new(GameConfig::new(3, 42), InstantGateway, 1);
        engine.state.square_mut(BALTIC).set_owner(Some(p(0)));
        engine.state.square_mut(ORIENTAL).set_owner(Some(p(1)));
        engine
    }

    fn deed_for_money(recipient: PlayerId) -> Action {
        Action::ProposeTrade {
            recipient,
            offered: smallvec![TradeItem::Deed(BALTIC)],
            requested: smallvec![TradeItem::Money(200)],
            message: None,
        }
    }

    #[tokio::test]
    async fn test_accept_swaps_atomically() {
        let mut engine = engine();

        assert!(engine
            .submit_action(p(0), deed_for_money(p(1)))
            .await
            .is_success());

        let trade = engine.state.negotiation.as_ref().unwrap().active;
        let resp = engine.submit_action(p(1), Action::AcceptTrade { trade }).await;
        assert!(resp.is_success());

        assert_eq!(engine.state.square(BALTIC).owner(), Some(p(1)));
        assert_eq!(engine.state.player(p(0)).money, 1700);
        assert_eq!(engine.state.player(p(1)).money, 1300);
        assert!(engine.state.negotiation.is_none());
        assert!(engine.state.register.pending().is_none());
        assert_eq!(
            engine.state.trades.get(&trade).unwrap().status,
            TradeStatus::Accepted
        );
    }

    #[tokio::test]
    async fn test_accept_revalidates_cash() {
        let mut engine = engine();
        engine.submit_action(p(0), deed_for_money(p(1))).await;

        // The recipient's cash drains before they respond.
        engine.state.player_mut(p(1)).money = 100;

        let trade = engine.state.negotiation.as_ref().unwrap().active;
        let resp = engine.submit_action(p(1), Action::AcceptTrade { trade }).await;
        assert!(!resp.is_success());
        // The offer stays open; rejecting is still possible.
        let resp = engine.submit_action(p(1), Action::RejectTrade { trade }).await;
        assert!(resp.is_success());
    }

    #[tokio::test]
    async fn test_rejection_hands_control_back() {
        let mut engine = engine();
        engine.submit_action(p(0), deed_for_money(p(1))).await;

        let trade = engine.state.negotiation.as_ref().unwrap().active;
        engine.submit_action(p(1), Action::RejectTrade { trade }).await;

        assert!(matches!(
            engine.state.register.pending(),
            Some(PendingDecision::ContinueNegotiation { player, .. }) if *player == p(0)
        ));

        let resp = engine.submit_action(p(0), Action::EndNegotiation).await;
        assert!(resp.is_success());
        assert!(engine.state.negotiation.is_none());
        assert!(engine.state.register.pending().is_none());
    }

    #[tokio::test]
    async fn test_rejection_cap_terminates_negotiation() {
        let mut engine = engine();
        engine.submit_action(p(0), deed_for_money(p(1))).await;

        for round in 0i64..3 {
            let trade = engine.state.negotiation.as_ref().unwrap().active;
            engine.submit_action(p(1), Action::RejectTrade { trade }).await;

            if round < 2 {
                // Proposer re-proposes with a sweetened counter.
                let resp = engine
                    .submit_action(
                        p(0),
                        Action::CounterTrade {
                            trade,
                            offered: smallvec![
                                TradeItem::Deed(BALTIC),
                                TradeItem::Money(10 * (round + 1)),
                            ],
                            requested: smallvec![TradeItem::Money(200)],
                            message: None,
                        },
                    )
                    .await;
                assert!(resp.is_success());
            }
        }

        // Third rejection hit the chain-wide cap.
        assert!(engine.state.negotiation.is_none());
        assert!(engine.state.register.pending().is_none());
    }

    #[tokio::test]
    async fn test_counter_swaps_roles() {
        let mut engine = engine();
        engine.submit_action(p(0), deed_for_money(p(1))).await;

        let original = engine.state.negotiation.as_ref().unwrap().active;
        let resp = engine
            .submit_action(
                p(1),
                Action::CounterTrade {
                    trade: original,
                    offered: smallvec![TradeItem::Money(150)],
                    requested: smallvec![TradeItem::Deed(BALTIC)],
                    message: Some("150 is fair".into()),
                },
            )
            .await;
        assert!(resp.is_success());

        let counter = engine.state.negotiation.as_ref().unwrap().active;
        assert_ne!(counter, original);
        let offer = engine.state.trades.get(&counter).unwrap();
        assert_eq!(offer.proposer, p(1));
        assert_eq!(offer.recipient, p(0));
        assert_eq!(offer.counter_of, Some(original));
        assert_eq!(
            engine.state.trades.get(&original).unwrap().status,
            TradeStatus::Countered
        );
        assert!(matches!(
            engine.state.register.pending(),
            Some(PendingDecision::RespondToTrade { player, .. }) if *player == p(0)
        ));
    }

    #[tokio::test]
    async fn test_mortgaged_deed_triggers_followup() {
        let mut engine = engine();
        engine.state.square_mut(BALTIC).set_mortgaged(true);

        engine.submit_action(p(0), deed_for_money(p(1))).await;
        let trade = engine.state.negotiation.as_ref().unwrap().active;
        engine.submit_action(p(1), Action::AcceptTrade { trade }).await;

        assert!(matches!(
            engine.state.register.pending(),
            Some(PendingDecision::HandleMortgagedProperties { player, .. }) if *player == p(1)
        ));

        // Keep it mortgaged: 10% of the 30 mortgage principal as a
        // holding fee, the same base the 110% clearing cost uses.
        let resp = engine
            .submit_action(p(1), Action::KeepMortgaged { square: BALTIC })
            .await;
        assert!(resp.is_success());
        assert_eq!(engine.state.player(p(1)).money, 1300 - 3);
        assert!(engine.state.square(BALTIC).is_mortgaged());
        assert!(engine.state.register.pending().is_none());
    }

    #[tokio::test]
    async fn test_clear_mortgage_followup() {
        let mut engine = engine();
        engine.state.square_mut(BALTIC).set_mortgaged(true);

        engine.submit_action(p(0), deed_for_money(p(1))).await;
        let trade = engine.state.negotiation.as_ref().unwrap().active;
        engine.submit_action(p(1), Action::AcceptTrade { trade }).await;

        let resp = engine
            .submit_action(p(1), Action::ClearMortgage { square: BALTIC })
            .await;
        assert!(resp.is_success());
        assert!(!engine.state.square(BALTIC).is_mortgaged());
        // 110% of the 30 mortgage principal.
        assert_eq!(engine.state.player(p(1)).money, 1300 - 33);
        assert!(engine.state.register.pending().is_none());
    }

    #[tokio::test]
    async fn test_deed_with_houses_cannot_be_offered() {
        let mut engine = engine();
        engine.state.square_mut(SquareId::new(1)).set_owner(Some(p(0)));
        engine
            .state
            .square_mut(BALTIC)
            .as_property_mut()
            .unwrap()
            .houses = 1;

        let resp = engine.submit_action(p(0), deed_for_money(p(1))).await;
        assert!(!resp.is_success());
    }

    #[tokio::test]
    async fn test_trade_during_liquidation_suspends_and_restores() {
        let mut engine = engine();
        engine.state.player_mut(p(0)).money = -50;
        engine.state.register.open(PendingDecision::LiquidateForDebt {
            player: p(0),
            debt: 50,
            creditor: Some(p(2)),
        });

        // Debtor sells Baltic to raise cash.
        assert!(engine
            .submit_action(p(0), deed_for_money(p(1)))
            .await
            .is_success());
        assert!(engine.state.suspended_liquidation.is_some());

        let trade = engine.state.negotiation.as_ref().unwrap().active;
        engine.submit_action(p(1), Action::AcceptTrade { trade }).await;

        // Debt fully covered: the suspended liquidation dissolves.
        assert_eq!(engine.state.player(p(0)).money, 150);
        assert!(engine.state.suspended_liquidation.is_none());
        assert!(engine.state.register.pending().is_none());
    }

    #[tokio::test]
    async fn test_failed_trade_restores_liquidation_with_updated_debt() {
        let mut engine = engine();
        engine.state.player_mut(p(0)).money = -50;
        engine.state.register.open(PendingDecision::LiquidateForDebt {
            player: p(0),
            debt: 50,
            creditor: Some(p(2)),
        });

        engine.submit_action(p(0), deed_for_money(p(1))).await;
        let trade = engine.state.negotiation.as_ref().unwrap().active;
        engine.submit_action(p(1), Action::RejectTrade { trade }).await;
        engine.submit_action(p(0), Action::EndNegotiation).await;

        assert!(matches!(
            engine.state.register.pending(),
            Some(PendingDecision::LiquidateForDebt { player, debt: 50, .. }) if *player == p(0)
        ));
        assert!(engine.state.suspended_liquidation.is_none());
    }
}
