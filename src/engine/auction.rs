//! The auction protocol driver.
//!
//! The `AuctionState` machine owns the bidding rules; this module wires
//! it to the decision register, settles the winning bid, and assigns the
//! deed. The square stays unowned when every bidder passes.

use super::Engine;
use crate::auction::AuctionOutcome;
use crate::core::{EngineError, PlayerId};
use crate::decision::PendingDecision;
use crate::events::EventKind;
use crate::gateway::PaymentGateway;

impl<G: PaymentGateway> Engine<G> {
    pub(super) async fn handle_bid(
        &mut self,
        actor: PlayerId,
        amount: i64,
    ) -> Result<String, EngineError> {
        if !matches!(
            self.state.register.pending(),
            Some(PendingDecision::AuctionBid)
        ) {
            return Err(EngineError::rule("no auction is in progress"));
        }
        let cash = self.state.player(actor).money;
        let auction = self
            .state
            .auction
            .as_mut()
            .ok_or_else(|| EngineError::internal("auction decision without auction state"))?;

        auction.bid(actor, amount, cash)?;
        self.state
            .push_event(EventKind::BidPlaced, format!("{actor} bid {amount}"));
        self.conclude_if_settled().await?;
        Ok(format!("{actor} bid {amount}"))
    }

    pub(super) async fn handle_pass_bid(&mut self, actor: PlayerId) -> Result<String, EngineError> {
        if !matches!(
            self.state.register.pending(),
            Some(PendingDecision::AuctionBid)
        ) {
            return Err(EngineError::rule("no auction is in progress"));
        }
        let auction = self
            .state
            .auction
            .as_mut()
            .ok_or_else(|| EngineError::internal("auction decision without auction state"))?;

        auction.pass(actor)?;
        self.state
            .push_event(EventKind::BidPassed, format!("{actor} passed"));
        self.conclude_if_settled().await?;
        Ok(format!("{actor} passed"))
    }

    async fn conclude_if_settled(&mut self) -> Result<(), EngineError> {
        let Some(auction) = &self.state.auction else {
            return Ok(());
        };
        let Some(outcome) = auction.conclusion(self.config.auction_bid_floor) else {
            return Ok(());
        };
        let square = auction.square;

        self.state.auction = None;
        self.state.register.resolve();

        match outcome {
            AuctionOutcome::Won { winner, bid } => {
                let name = self.state.square(square).name().to_owned();
                self.state.push_event(
                    EventKind::AuctionConcluded,
                    format!("{winner} won {name} at {bid}"),
                );
                // The winner committed at bid time; the payment is
                // required even if their cash has since changed. The deed
                // only transfers once the settlement clears; otherwise it
                // stays unowned and the winner is left to liquidate.
                if self.charge(winner, None, bid, "auction settlement").await {
                    self.state.square_mut(square).set_owner(Some(winner));
                    self.state.push_event(
                        EventKind::PropertyPurchased,
                        format!("{winner} bought {name} at auction for {bid}"),
                    );
                } else {
                    self.state.push_event(
                        EventKind::AuctionConcluded,
                        format!("settlement for {name} failed; it stays unowned"),
                    );
                }
            }
            AuctionOutcome::NoSale => {
                let name = self.state.square(square).name().to_owned();
                self.state.push_event(
                    EventKind::AuctionConcluded,
                    format!("{name} drew no bids and stays unowned"),
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Action;
    use crate::board::SquareId;
    use crate::core::GameConfig;
    use crate::gateway::InstantGateway;

    const ORIENTAL: SquareId = SquareId(6);

    fn p(n: u8) -> PlayerId {
        PlayerId::new(n)
    }

    async fn auction_engine() -> Engine<InstantGateway> {
        let mut engine = Engine::new(GameConfig::new(3, 42), InstantGateway, 1);
        engine.state.register.open(PendingDecision::BuyOrAuction {
            player: p(0),
            square: ORIENTAL,
        });
        engine.submit_action(p(0), Action::DeclineProperty).await;
        engine
    }

    #[tokio::test]
    async fn test_winner_pays_and_receives_deed() {
        let mut engine = auction_engine().await;

        // Bidding starts with p1, just after the decliner.
        assert!(engine
            .submit_action(p(1), Action::Bid { amount: 60 })
            .await
            .is_success());
        assert!(engine
            .submit_action(p(2), Action::Bid { amount: 80 })
            .await
            .is_success());
        assert!(engine.submit_action(p(0), Action::PassBid).await.is_success());
        assert!(engine.submit_action(p(1), Action::PassBid).await.is_success());

        assert_eq!(engine.state.square(ORIENTAL).owner(), Some(p(2)));
        assert_eq!(engine.state.player(p(2)).money, 1420);
        assert!(engine.state.auction.is_none());
        assert!(engine.state.register.pending().is_none());
    }

    #[tokio::test]
    async fn test_all_pass_leaves_square_unowned() {
        let mut engine = auction_engine().await;

        engine.submit_action(p(1), Action::PassBid).await;
        engine.submit_action(p(2), Action::PassBid).await;
        engine.submit_action(p(0), Action::PassBid).await;

        assert_eq!(engine.state.square(ORIENTAL).owner(), None);
        assert!(engine.state.auction.is_none());
        assert!(engine.state.register.pending().is_none());
        assert!(engine.state.register.outcome_processed());
    }

    #[tokio::test]
    async fn test_settlement_decline_leaves_square_unowned() {
        use crate::gateway::ScriptedGateway;

        let mut engine = Engine::new(
            GameConfig::new(3, 42),
            ScriptedGateway::with_outcomes([false]),
            1,
        );
        engine.state.register.open(PendingDecision::BuyOrAuction {
            player: p(0),
            square: ORIENTAL,
        });
        engine.submit_action(p(0), Action::DeclineProperty).await;

        engine.submit_action(p(1), Action::Bid { amount: 80 }).await;
        engine.submit_action(p(2), Action::PassBid).await;
        engine.submit_action(p(0), Action::PassBid).await;

        // The bid is still owed, but the failed settlement keeps the
        // deed with the bank and leaves the winner to liquidate.
        assert_eq!(engine.state.square(ORIENTAL).owner(), None);
        assert_eq!(engine.state.player(p(1)).money, 1420);
        assert!(engine.state.auction.is_none());
        assert!(matches!(
            engine.state.register.pending(),
            Some(PendingDecision::LiquidateForDebt {
                player,
                debt: 0,
                creditor: None,
            }) if *player == p(1)
        ));
    }

    #[tokio::test]
    async fn test_out_of_turn_bid_rejected() {
        let mut engine = auction_engine().await;

        let resp = engine.submit_action(p(2), Action::Bid { amount: 10 }).await;
        assert!(!resp.is_success());
    }

    #[tokio::test]
    async fn test_bid_beyond_cash_rejected() {
        let mut engine = auction_engine().await;
        engine.state.player_mut(p(1)).money = 30;

        let resp = engine.submit_action(p(1), Action::Bid { amount: 50 }).await;
        assert!(!resp.is_success());

        // The failed bid does not advance the rotation.
        let auction = engine.state.auction.as_ref().unwrap();
        assert_eq!(auction.current_bidder(), Some(p(1)));
    }
}
