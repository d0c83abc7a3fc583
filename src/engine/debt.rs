//! The liquidation and bankruptcy protocol.
//!
//! A required payment that drives cash negative opens `LiquidateForDebt`.
//! The creditor was already credited in full; the debtor's job is to
//! bring their own balance back to zero by selling houses, mortgaging,
//! or trading. Confirming while still insolvent concedes: bankruptcy is
//! finalized and the debtor's remaining assets go to the creditor, or
//! back to the bank unencumbered when the creditor is the bank.

use super::Engine;
use crate::core::{EngineError, JailCards, PlayerId};
use crate::decision::PendingDecision;
use crate::events::EventKind;
use crate::gateway::PaymentGateway;
use crate::rules;
use crate::trade::TradeStatus;

impl<G: PaymentGateway> Engine<G> {
    /// Open the liquidation decision for an insolvent payer.
    pub(super) fn open_liquidation(
        &mut self,
        player: PlayerId,
        debt: i64,
        creditor: Option<PlayerId>,
    ) {
        let holder = match creditor {
            Some(c) => format!("{c}"),
            None => "the bank".to_owned(),
        };
        self.state.push_event(
            EventKind::DebtIncurred,
            format!("{player} owes {holder} {debt} beyond available cash"),
        );
        self.open_decision(PendingDecision::LiquidateForDebt {
            player,
            debt,
            creditor,
        });
    }

    pub(super) fn handle_confirm_liquidation(
        &mut self,
        actor: PlayerId,
    ) -> Result<String, EngineError> {
        let creditor = match self.state.register.pending() {
            Some(PendingDecision::LiquidateForDebt { creditor, .. }) => *creditor,
            _ => return Err(EngineError::rule("no liquidation is pending")),
        };

        if self.state.player(actor).money >= 0 {
            self.state.register.resolve();
            self.state.push_event(
                EventKind::DecisionResolved,
                format!("{actor} covered the debt"),
            );
            self.after_trade_cleanup();
            return Ok(format!("{actor} covered the debt"));
        }

        self.finalize_bankruptcy(actor, creditor)?;
        Ok(format!("{actor} is bankrupt"))
    }

    /// Strip the debtor and remove them from the rotation.
    ///
    /// Deeds and jail cards pass to the creditor as they stand; with no
    /// creditor they return to the bank unowned, unmortgaged, and
    /// unimproved.
    pub(super) fn finalize_bankruptcy(
        &mut self,
        debtor: PlayerId,
        creditor: Option<PlayerId>,
    ) -> Result<(), EngineError> {
        self.state.register.resolve();

        for square in rules::owned_squares(&self.state.board, debtor) {
            let sq = self.state.square_mut(square);
            match creditor {
                Some(c) => sq.set_owner(Some(c)),
                None => {
                    sq.set_owner(None);
                    sq.set_mortgaged(false);
                    if let Some(property) = sq.as_property_mut() {
                        property.houses = 0;
                    }
                }
            }
        }

        let cards = self.state.player(debtor).jail_cards;
        if let Some(c) = creditor {
            let record = self.state.player_mut(c);
            record.jail_cards.chance |= cards.chance;
            record.jail_cards.community_chest |= cards.community_chest;
        }
        {
            let record = self.state.player_mut(debtor);
            record.jail_cards = JailCards::default();
            record.money = 0;
            record.in_jail = false;
            record.bankrupt = true;
        }
        self.state.push_event(
            EventKind::BankruptcyFinalized,
            format!("{debtor} is bankrupt"),
        );

        // Tear down protocol state the debtor was party to.
        if let Some(negotiation) = self.state.negotiation.clone() {
            if let Some(offer) = self.state.trades.get(&negotiation.active).cloned() {
                if offer.proposer == debtor || offer.recipient == debtor {
                    if let Some(stored) = self.state.trades.get_mut(&negotiation.active) {
                        stored.status = TradeStatus::Terminated;
                    }
                    self.state.negotiation = None;
                    self.state.push_event(
                        EventKind::NegotiationEnded,
                        format!("negotiation dissolved by {debtor}'s bankruptcy"),
                    );
                }
            }
        }
        self.state.mortgage_followups.retain(|(p, _)| *p != debtor);
        if matches!(
            &self.state.suspended_liquidation,
            Some(PendingDecision::LiquidateForDebt { player, .. }) if *player == debtor
        ) {
            self.state.suspended_liquidation = None;
        }

        if self.state.is_game_over() {
            let winner = match self.state.winner() {
                Some(w) => format!("{w} wins"),
                None => "no players remain".to_owned(),
            };
            self.state
                .push_event(EventKind::GameEnded, format!("game over: {winner}"));
            return Ok(());
        }

        if debtor == self.state.current_player {
            self.advance_turn()?;
        } else {
            self.after_trade_cleanup();
        }
        Ok(())
    }
}
