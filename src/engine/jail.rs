//! The jail protocol.
//!
//! Opens as a `JailOptions` decision when the turn rotates to a jailed
//! player. Escape routes: pay bail, spend a get-out-of-jail card, or roll
//! for doubles (once per turn, capped attempts per stay). After the final
//! failed attempt bail stops being optional: it settles as a required
//! payment even into debt.

use super::Engine;
use crate::core::{EngineError, PlayerId};
use crate::decision::PendingDecision;
use crate::events::EventKind;
use crate::gateway::PaymentGateway;

impl<G: PaymentGateway> Engine<G> {
    pub(super) async fn handle_pay_bail(&mut self, actor: PlayerId) -> Result<String, EngineError> {
        let rolls_attempted = match self.state.register.pending() {
            Some(PendingDecision::JailOptions { rolls_attempted, .. }) => *rolls_attempted,
            _ => return Err(EngineError::rule("no jail decision is pending")),
        };
        let bail = self.config.bail_amount;

        if rolls_attempted >= self.config.max_jail_rolls {
            // Escape attempts exhausted: bail is mandatory and settles
            // even into debt.
            self.state.register.resolve();
            self.release_from_jail(actor);
            self.state.push_event(
                EventKind::LeftJail,
                format!("{actor} paid {bail} bail after exhausting escape attempts"),
            );
            self.charge(actor, None, bail, "bail").await;
        } else {
            self.settle_voluntary(actor, None, bail, "bail").await?;
            self.state.register.resolve();
            self.release_from_jail(actor);
            self.state
                .push_event(EventKind::LeftJail, format!("{actor} paid {bail} bail"));
        }

        Ok(format!("{actor} paid {bail} bail and left jail"))
    }

    pub(super) fn handle_use_jail_card(&mut self, actor: PlayerId) -> Result<String, EngineError> {
        let rolls_attempted = match self.state.register.pending() {
            Some(PendingDecision::JailOptions { rolls_attempted, .. }) => *rolls_attempted,
            _ => return Err(EngineError::rule("no jail decision is pending")),
        };
        if rolls_attempted >= self.config.max_jail_rolls {
            return Err(EngineError::rule(
                "escape attempts exhausted; bail is the only way out",
            ));
        }
        if !self.state.player_mut(actor).jail_cards.spend() {
            return Err(EngineError::rule(format!(
                "{actor} holds no get-out-of-jail card"
            )));
        }

        self.state.register.resolve();
        self.release_from_jail(actor);
        self.state.push_event(
            EventKind::LeftJail,
            format!("{actor} used a get-out-of-jail card"),
        );
        Ok(format!("{actor} used a get-out-of-jail card and left jail"))
    }

    pub(super) async fn handle_roll_for_doubles(
        &mut self,
        actor: PlayerId,
    ) -> Result<String, EngineError> {
        let rolls_attempted = match self.state.register.pending() {
            Some(PendingDecision::JailOptions {
                rolls_attempted,
                rolled_this_turn,
                ..
            }) => {
                if *rolled_this_turn {
                    return Err(EngineError::rule(
                        "already attempted an escape roll this turn",
                    ));
                }
                *rolls_attempted
            }
            _ => return Err(EngineError::rule("no jail decision is pending")),
        };
        if rolls_attempted >= self.config.max_jail_rolls {
            return Err(EngineError::rule(
                "escape attempts exhausted; bail is required",
            ));
        }

        let roll = self.state.rng.roll_dice();
        self.state.rolled_this_turn = true;
        self.state.last_dice_total = roll.total();
        self.state.push_event(
            EventKind::DiceRolled,
            format!("{actor} rolled {roll} for doubles"),
        );

        if roll.is_double() {
            self.state.register.resolve();
            self.release_from_jail(actor);
            self.state.push_event(
                EventKind::LeftJail,
                format!("{actor} rolled a double and left jail"),
            );
            // A jail-escape double grants no bonus roll.
            self.move_forward(actor, roll.total()).await;
            self.land(actor).await?;
            return Ok(format!("{actor} rolled {roll} and escaped jail"));
        }

        let attempts = rolls_attempted + 1;
        self.state.player_mut(actor).jail_rolls_attempted = attempts;
        self.state.register.replace(PendingDecision::JailOptions {
            player: actor,
            rolls_attempted: attempts,
            rolled_this_turn: true,
        });
        Ok(format!("{actor} rolled {roll}; still in jail"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Action, ActionKind};
    use crate::board::SquareId;
    use crate::core::GameConfig;
    use crate::gateway::InstantGateway;

    fn p(n: u8) -> PlayerId {
        PlayerId::new(n)
    }

    fn jailed_engine(rolls_attempted: u8) -> Engine<InstantGateway> {
        let mut engine = Engine::new(GameConfig::new(4, 42), InstantGateway, 1);
        {
            let player = engine.state.player_mut(p(0));
            player.in_jail = true;
            player.position = SquareId::JAIL;
            player.jail_rolls_attempted = rolls_attempted;
        }
        engine.state.register.open(PendingDecision::JailOptions {
            player: p(0),
            rolls_attempted,
            rolled_this_turn: false,
        });
        engine
    }

    #[tokio::test]
    async fn test_voluntary_bail() {
        let mut engine = jailed_engine(0);

        let resp = engine.submit_action(p(0), Action::PayBail).await;
        assert!(resp.is_success());

        let player = engine.state.player(p(0));
        assert!(!player.in_jail);
        assert_eq!(player.money, 1450);
        assert!(engine.state.register.pending().is_none());
        // The roll is still owed this turn.
        assert!(engine
            .available_actions(p(0))
            .contains(&ActionKind::RollDice));
    }

    #[tokio::test]
    async fn test_voluntary_bail_needs_cash() {
        let mut engine = jailed_engine(0);
        engine.state.player_mut(p(0)).money = 10;

        let resp = engine.submit_action(p(0), Action::PayBail).await;
        assert!(!resp.is_success());
        assert!(engine.state.player(p(0)).in_jail);
        assert_eq!(engine.state.player(p(0)).money, 10);
    }

    #[tokio::test]
    async fn test_forced_bail_settles_into_debt() {
        let mut engine = jailed_engine(3);
        engine.state.player_mut(p(0)).money = 10;

        let resp = engine.submit_action(p(0), Action::PayBail).await;
        assert!(resp.is_success());

        let player = engine.state.player(p(0));
        assert!(!player.in_jail);
        assert_eq!(player.money, -40);
        assert!(matches!(
            engine.state.register.pending(),
            Some(PendingDecision::LiquidateForDebt {
                debt: 40,
                creditor: None,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_forced_bail_gateway_decline_opens_liquidation() {
        use crate::gateway::ScriptedGateway;

        let mut engine = Engine::new(
            GameConfig::new(4, 42),
            ScriptedGateway::with_outcomes([false]),
            1,
        );
        {
            let player = engine.state.player_mut(p(0));
            player.in_jail = true;
            player.position = SquareId::JAIL;
            player.jail_rolls_attempted = 3;
        }
        engine.state.register.open(PendingDecision::JailOptions {
            player: p(0),
            rolls_attempted: 3,
            rolled_this_turn: false,
        });

        let resp = engine.submit_action(p(0), Action::PayBail).await;
        assert!(resp.is_success());

        // The ledger still debits, but the declined settlement routes
        // into liquidation instead of being treated as cleared.
        assert!(!engine.state.player(p(0)).in_jail);
        assert_eq!(engine.state.player(p(0)).money, 1450);
        assert!(matches!(
            engine.state.register.pending(),
            Some(PendingDecision::LiquidateForDebt {
                debt: 0,
                creditor: None,
                ..
            })
        ));

        // A solvent payer clears it with one confirmation.
        let resp = engine
            .submit_action(p(0), Action::ConfirmLiquidationDone)
            .await;
        assert!(resp.is_success());
        assert!(engine.state.register.pending().is_none());
    }

    #[tokio::test]
    async fn test_card_refused_after_attempts_exhausted() {
        let mut engine = jailed_engine(3);
        engine.state.player_mut(p(0)).jail_cards.chance = true;

        assert!(!engine
            .available_actions(p(0))
            .contains(&ActionKind::UseJailCard));

        let resp = engine.submit_action(p(0), Action::UseJailCard).await;
        assert!(!resp.is_success());
        assert!(engine.state.player(p(0)).in_jail);
        assert!(engine.state.player(p(0)).jail_cards.chance);
    }

    #[tokio::test]
    async fn test_use_jail_card() {
        let mut engine = jailed_engine(1);
        engine.state.player_mut(p(0)).jail_cards.community_chest = true;

        let resp = engine.submit_action(p(0), Action::UseJailCard).await;
        assert!(resp.is_success());
        assert!(!engine.state.player(p(0)).in_jail);
        assert!(!engine.state.player(p(0)).jail_cards.any());
        assert_eq!(engine.state.player(p(0)).money, 1500);
    }

    #[tokio::test]
    async fn test_use_jail_card_without_one() {
        let mut engine = jailed_engine(1);
        let resp = engine.submit_action(p(0), Action::UseJailCard).await;
        assert!(!resp.is_success());
        assert!(engine.state.player(p(0)).in_jail);
    }

    #[tokio::test]
    async fn test_roll_for_doubles_progresses() {
        let mut engine = jailed_engine(0);

        let resp = engine.submit_action(p(0), Action::RollForDoubles).await;
        assert!(resp.is_success());

        let player = engine.state.player(p(0));
        if player.in_jail {
            assert_eq!(player.jail_rolls_attempted, 1);
            assert!(matches!(
                engine.state.register.pending(),
                Some(PendingDecision::JailOptions {
                    rolls_attempted: 1,
                    rolled_this_turn: true,
                    ..
                })
            ));
            // A second attempt this turn is refused.
            let resp = engine.submit_action(p(0), Action::RollForDoubles).await;
            assert!(!resp.is_success());
            // Ending the turn from jail is allowed after the failed roll.
            let resp = engine.submit_action(p(0), Action::EndTurn).await;
            assert!(resp.is_success());
            assert_eq!(engine.state.current_player, p(1));
        } else {
            // Escaped on a double: moved off the jail square.
            assert_ne!(player.position, SquareId::JAIL);
            assert_eq!(player.jail_rolls_attempted, 0);
        }
    }

    #[tokio::test]
    async fn test_roll_refused_after_attempts_exhausted() {
        let mut engine = jailed_engine(3);

        let resp = engine.submit_action(p(0), Action::RollForDoubles).await;
        assert!(!resp.is_success());

        let actions = engine.available_actions(p(0));
        assert!(actions.contains(&ActionKind::PayBail));
        assert!(!actions.contains(&ActionKind::RollForDoubles));
        assert!(!actions.contains(&ActionKind::EndTurn));
    }
}
