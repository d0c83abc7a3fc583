//! The game orchestrator.
//!
//! One `Engine` per game instance. Callers submit `(actor, Action)` pairs
//! one at a time; the engine validates the pair against the decision
//! register, runs the owning protocol, and returns a response envelope.
//! Asynchrony exists only at the payment gateway seam; the game logic
//! itself is strictly sequential, which is what upholds the
//! single-pending-decision invariant.
//!
//! Money movement comes in two flavors:
//!
//! - voluntary payments (purchases, building, unmortgaging, early bail)
//!   are validated up front and leave no trace on failure
//! - required payments (rent, taxes, levies, forced bail) always settle
//!   in full, driving the payer's cash negative if need be; insolvency
//!   or a gateway decline opens the liquidation protocol

mod auction;
mod debt;
mod jail;
mod trade;
mod turn;

use crate::actions::{Action, ActionKind, ActionRecord};
use crate::board::BoardLayout;
use crate::core::{ActionResponse, EngineError, GameConfig, PlayerId};
use crate::decision::PendingDecision;
use crate::events::EventKind;
use crate::gateway::{settle_with_timeout, PaymentGateway};
use crate::state::{GameState, TurnSnapshot};
use crate::throttle::FailedActionTracker;

/// The per-game orchestrator.
pub struct Engine<G: PaymentGateway> {
    config: GameConfig,
    state: GameState,
    gateway: G,
    tracker: FailedActionTracker,
    last_snapshot: Option<TurnSnapshot>,
}

impl<G: PaymentGateway> Engine<G> {
    /// Create a fresh game.
    #[must_use]
    pub fn new(config: GameConfig, gateway: G, game_id: u64) -> Self {
        let state = GameState::new(&config, game_id);
        let tracker =
            FailedActionTracker::new(config.failed_action_window, config.failed_action_limit);
        Self {
            config,
            state,
            gateway,
            tracker,
            last_snapshot: None,
        }
    }

    /// Resume a game from restored state, e.g. a turn snapshot.
    #[must_use]
    pub fn from_state(config: GameConfig, state: GameState, gateway: G) -> Self {
        let tracker =
            FailedActionTracker::new(config.failed_action_window, config.failed_action_limit);
        Self {
            config,
            state,
            gateway,
            tracker,
            last_snapshot: None,
        }
    }

    /// The current game state.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// The game configuration.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The snapshot taken at the end of the most recent turn.
    #[must_use]
    pub fn last_snapshot(&self) -> Option<&TurnSnapshot> {
        self.last_snapshot.as_ref()
    }

    /// Static board layout for clients.
    #[must_use]
    pub fn board_layout(&self) -> BoardLayout {
        BoardLayout::from_board(&self.state.board)
    }

    /// The winner, once the game is over.
    #[must_use]
    pub fn game_result(&self) -> Option<PlayerId> {
        self.state.winner()
    }

    /// Submit an action on behalf of an actor.
    ///
    /// Never returns `Err`: rule violations become `Failure` responses and
    /// internal inconsistencies become `Error` responses after the stale
    /// decision is cleared.
    pub async fn submit_action(&mut self, actor: PlayerId, action: Action) -> ActionResponse {
        if actor.index() >= self.state.players.player_count() {
            return ActionResponse::failure(format!("{actor} is not seated at this game"));
        }
        if self.state.is_game_over() {
            return ActionResponse::failure("the game is over");
        }
        if !self.state.player(actor).active() {
            return ActionResponse::failure(format!("{actor} is bankrupt and cannot act"));
        }
        if matches!(action, Action::Wait) {
            return ActionResponse::success(format!("{actor} waits"));
        }
        if self.tracker.is_blocked(actor, &action) {
            return ActionResponse::failure(format!(
                "{} blocked after repeated failures; wait or submit a different action",
                action.kind()
            ));
        }
        if let Err(err) = self.ensure_actor(actor) {
            self.tracker.record_failure(actor, &action);
            return ActionResponse::failure(err.to_string());
        }

        match self.dispatch(actor, action.clone()).await {
            Ok(message) => {
                self.tracker.clear(actor, &action);
                let turn = self.state.turn_number;
                self.state
                    .action_history
                    .push_back(ActionRecord::new(actor, action, turn));
                ActionResponse::success(message)
            }
            Err(EngineError::RuleViolation(message)) => {
                self.tracker.record_failure(actor, &action);
                ActionResponse::failure(message)
            }
            Err(EngineError::GatewayFailure { reason }) => {
                self.tracker.record_failure(actor, &action);
                ActionResponse::failure(format!("payment declined: {reason}"))
            }
            Err(EngineError::InternalInconsistency(message)) => {
                // Never let a bug deadlock the game on a stale decision.
                self.state.register.clear_stale();
                self.state.auction = None;
                ActionResponse::error(message)
            }
        }
    }

    /// Actions the actor may legally submit right now.
    ///
    /// Collapses to `[wait]` for anyone the open decision does not target,
    /// and to `[]` for bankrupt players or a finished game.
    #[must_use]
    pub fn available_actions(&self, actor: PlayerId) -> Vec<ActionKind> {
        if actor.index() >= self.state.players.player_count() {
            return Vec::new();
        }
        if self.state.is_game_over() || !self.state.player(actor).active() {
            return Vec::new();
        }

        if let Some(pending) = self.state.register.pending() {
            if self.state.decision_actor() != Some(actor) {
                return vec![ActionKind::Wait];
            }
            return match pending {
                PendingDecision::BuyOrAuction { square, .. } => {
                    let mut actions = Vec::new();
                    if let Some(price) = self.state.square(*square).price() {
                        if self.state.player(actor).money >= price {
                            actions.push(ActionKind::BuyProperty);
                        }
                    }
                    actions.push(ActionKind::DeclineProperty);
                    actions
                }
                PendingDecision::AuctionBid => vec![ActionKind::Bid, ActionKind::PassBid],
                PendingDecision::RespondToTrade { .. } => vec![
                    ActionKind::AcceptTrade,
                    ActionKind::RejectTrade,
                    ActionKind::CounterTrade,
                ],
                PendingDecision::ContinueNegotiation { .. } => {
                    vec![ActionKind::CounterTrade, ActionKind::EndNegotiation]
                }
                PendingDecision::HandleMortgagedProperties { .. } => {
                    vec![ActionKind::KeepMortgaged, ActionKind::ClearMortgage]
                }
                PendingDecision::JailOptions {
                    rolls_attempted,
                    rolled_this_turn,
                    ..
                } => {
                    // After the last failed escape roll, bail is the only
                    // remaining path.
                    let mut actions = vec![ActionKind::PayBail];
                    if *rolls_attempted < self.config.max_jail_rolls {
                        if self.state.player(actor).jail_cards.any() {
                            actions.push(ActionKind::UseJailCard);
                        }
                        if !rolled_this_turn {
                            actions.push(ActionKind::RollForDoubles);
                        }
                    }
                    if *rolled_this_turn && *rolls_attempted < self.config.max_jail_rolls {
                        actions.push(ActionKind::EndTurn);
                    }
                    actions
                }
                PendingDecision::LiquidateForDebt { .. } => vec![
                    ActionKind::SellHouse,
                    ActionKind::Mortgage,
                    ActionKind::ProposeTrade,
                    ActionKind::ConfirmLiquidationDone,
                ],
            };
        }

        if actor != self.state.current_player {
            return vec![ActionKind::Wait];
        }

        let mut actions = Vec::new();
        if !self.state.rolled_this_turn || self.state.bonus_roll {
            actions.push(ActionKind::RollDice);
        }
        if self.state.rolled_this_turn && !self.state.bonus_roll {
            actions.push(ActionKind::EndTurn);
        }
        actions.extend([
            ActionKind::BuildHouse,
            ActionKind::SellHouse,
            ActionKind::Mortgage,
            ActionKind::Unmortgage,
            ActionKind::ProposeTrade,
        ]);
        actions
    }

    /// Reject actors the current state does not target.
    fn ensure_actor(&self, actor: PlayerId) -> Result<(), EngineError> {
        if self.state.register.pending().is_some() {
            match self.state.decision_actor() {
                Some(target) if target == actor => Ok(()),
                Some(_) => Err(EngineError::wrong_actor(actor)),
                None => Err(EngineError::internal(
                    "open decision has no resolvable actor",
                )),
            }
        } else if actor == self.state.current_player {
            Ok(())
        } else {
            Err(EngineError::wrong_actor(actor))
        }
    }

    async fn dispatch(&mut self, actor: PlayerId, action: Action) -> Result<String, EngineError> {
        match action {
            Action::RollDice => self.handle_roll_dice(actor).await,
            Action::EndTurn => self.handle_end_turn(actor),
            Action::Wait => Ok(format!("{actor} waits")),
            Action::BuyProperty => self.handle_buy_property(actor).await,
            Action::DeclineProperty => self.handle_decline_property(actor),
            Action::Bid { amount } => self.handle_bid(actor, amount).await,
            Action::PassBid => self.handle_pass_bid(actor).await,
            Action::BuildHouse { square } => self.handle_build_house(actor, square).await,
            Action::SellHouse { square } => self.handle_sell_house(actor, square).await,
            Action::Mortgage { square } => self.handle_mortgage(actor, square).await,
            Action::Unmortgage { square } => self.handle_unmortgage(actor, square).await,
            Action::ProposeTrade {
                recipient,
                offered,
                requested,
                message,
            } => self.handle_propose_trade(actor, recipient, offered, requested, message),
            Action::AcceptTrade { trade } => self.handle_accept_trade(actor, trade).await,
            Action::RejectTrade { trade } => self.handle_reject_trade(actor, trade),
            Action::CounterTrade {
                trade,
                offered,
                requested,
                message,
            } => self.handle_counter_trade(actor, trade, offered, requested, message),
            Action::EndNegotiation => self.handle_end_negotiation(actor),
            Action::KeepMortgaged { square } => self.handle_keep_mortgaged(actor, square).await,
            Action::ClearMortgage { square } => self.handle_clear_mortgage(actor, square).await,
            Action::PayBail => self.handle_pay_bail(actor).await,
            Action::UseJailCard => self.handle_use_jail_card(actor),
            Action::RollForDoubles => self.handle_roll_for_doubles(actor).await,
            Action::ConfirmLiquidationDone => self.handle_confirm_liquidation(actor),
        }
    }

    /// Open a decision and log it.
    fn open_decision(&mut self, decision: PendingDecision) {
        self.state.push_event(
            EventKind::DecisionOpened,
            format!("awaiting {}", decision.name()),
        );
        self.state.register.open(decision);
    }

    /// Settle a voluntary payment: full validation up front, no state
    /// change on failure.
    async fn settle_voluntary(
        &mut self,
        payer: PlayerId,
        creditor: Option<PlayerId>,
        amount: i64,
        reason: &str,
    ) -> Result<(), EngineError> {
        if self.state.player(payer).money < amount {
            return Err(EngineError::rule(format!(
                "{payer} cannot afford {amount} for {reason}"
            )));
        }

        let settled = match creditor {
            Some(recipient) => {
                settle_with_timeout(
                    self.config.gateway_timeout,
                    self.gateway
                        .pay_player_to_player(payer, recipient, amount, reason),
                )
                .await
            }
            None => {
                settle_with_timeout(
                    self.config.gateway_timeout,
                    self.gateway.pay_player_to_system(payer, amount, reason),
                )
                .await
            }
        };
        if !settled {
            return Err(EngineError::GatewayFailure {
                reason: reason.into(),
            });
        }

        self.state.player_mut(payer).money -= amount;
        if let Some(recipient) = creditor {
            self.state.player_mut(recipient).money += amount;
        }
        Ok(())
    }

    /// Settle a required payment.
    ///
    /// Debits the payer in full even into negative cash and credits the
    /// creditor in full; the engine's ledger is authoritative and a
    /// gateway decline does not void the obligation. Returns true only
    /// when the payment cleared and the payer stayed solvent. On an
    /// insolvent balance or a declined/timed-out settlement the
    /// liquidation protocol opens instead; a solvent payer resolves it
    /// with a single confirmation.
    async fn charge(
        &mut self,
        payer: PlayerId,
        creditor: Option<PlayerId>,
        amount: i64,
        reason: &str,
    ) -> bool {
        let settled = match creditor {
            Some(recipient) => {
                settle_with_timeout(
                    self.config.gateway_timeout,
                    self.gateway
                        .pay_player_to_player(payer, recipient, amount, reason),
                )
                .await
            }
            None => {
                settle_with_timeout(
                    self.config.gateway_timeout,
                    self.gateway.pay_player_to_system(payer, amount, reason),
                )
                .await
            }
        };

        self.state.player_mut(payer).money -= amount;
        if let Some(recipient) = creditor {
            self.state.player_mut(recipient).money += amount;
        }

        let balance = self.state.player(payer).money;
        if settled && balance >= 0 {
            return true;
        }
        if !settled {
            self.state.push_event(
                EventKind::PaymentDeclined,
                format!("gateway declined {reason} from {payer}"),
            );
        }
        self.open_liquidation(payer, (-balance).max(0), creditor);
        false
    }

    /// Credit a player from the bank. Bank credits never fail the action.
    async fn credit_from_bank(&mut self, recipient: PlayerId, amount: i64, reason: &str) {
        settle_with_timeout(
            self.config.gateway_timeout,
            self.gateway.pay_system_to_player(recipient, amount, reason),
        )
        .await;
        self.state.player_mut(recipient).money += amount;
    }
}
