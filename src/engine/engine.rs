use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn, Instrument};

use crate::cards::{Card, Deck};
use crate::fanout::Broadcaster;
use crate::showdown::{evaluate, find_winners, HandRank};
use crate::store::{HandStore, NewHand};

use super::actor::EngineCommand;
use super::errors::{EngineError, InvariantCheck};
use super::events::{ActionKind, ClientAction, GameWinner, RoomEvent, StackEntry, WinnerEntry};
use super::hand::HandState;
use super::player::{PlayerState, SeatedPlayer};
use super::pots;
use super::rules;
use super::seating::{clockwise_from, next_position};
use super::snapshot::{EngineSnapshot, HandSnapshot, PlayerSnapshot};
use super::timer::TurnTimer;
use super::types::{Chips, EngineConfig, GameId, SeatId, Street, UserId};

const LOG_TARGET: &str = "holdem_engine::engine";

/// Rank name persisted and broadcast for uncontested wins.
pub const WIN_BY_FOLD: &str = "Win by fold";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePhase {
    Idle,
    InHand,
    Ended,
    /// A room-fatal error occurred; every further action is refused.
    Faulted,
}

impl EnginePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            EnginePhase::Idle => "idle",
            EnginePhase::InHand => "in_hand",
            EnginePhase::Ended => "ended",
            EnginePhase::Faulted => "faulted",
        }
    }
}

/// The authoritative per-room state machine. Owns every piece of game
/// state exclusively; all mutation flows through the owning actor
/// task, so no method takes a lock.
pub struct Engine {
    game_id: GameId,
    cfg: EngineConfig,
    players: Vec<PlayerState>, // sorted by position
    hand: Option<HandState>,
    phase: EnginePhase,
    next_hand_number: u32,
    dealer_pos: SeatId,
    sb_pos: SeatId,
    bb_pos: SeatId,
    broadcaster: Arc<dyn Broadcaster>,
    store: Arc<dyn HandStore>,
    timer: TurnTimer,
    mailbox: Option<mpsc::Sender<EngineCommand>>,
    next_deck: Option<Deck>,
}

impl Engine {
    pub fn new(
        game_id: GameId,
        seats: Vec<SeatedPlayer>,
        cfg: EngineConfig,
        broadcaster: Arc<dyn Broadcaster>,
        store: Arc<dyn HandStore>,
    ) -> Result<Self, EngineError> {
        if seats.len() < cfg.min_players {
            return Err(EngineError::BadInput(format!(
                "need at least {} seated players",
                cfg.min_players
            )));
        }
        if seats.len() > cfg.max_seats {
            return Err(EngineError::BadInput(format!(
                "at most {} seats supported",
                cfg.max_seats
            )));
        }
        let mut players: Vec<PlayerState> = seats.into_iter().map(PlayerState::new).collect();
        players.sort_by_key(|p| p.position);
        if players.windows(2).any(|w| w[0].position == w[1].position) {
            return Err(EngineError::BadInput("duplicate seat positions".into()));
        }
        if players.iter().any(|p| p.position as usize >= cfg.max_seats) {
            return Err(EngineError::BadInput("seat position out of range".into()));
        }

        let dealer_pos = players[0].position;
        let mut engine = Self {
            game_id,
            cfg,
            players,
            hand: None,
            phase: EnginePhase::Idle,
            next_hand_number: 1,
            dealer_pos,
            sb_pos: dealer_pos,
            bb_pos: dealer_pos,
            broadcaster,
            store,
            timer: TurnTimer::default(),
            mailbox: None,
            next_deck: None,
        };
        engine.assign_blinds();
        Ok(engine)
    }

    pub(crate) fn attach_mailbox(&mut self, tx: mpsc::Sender<EngineCommand>) {
        self.mailbox = Some(tx);
    }

    /// Queue a deck for the next hand instead of shuffling. Used by
    /// scenario tests and replays that need deterministic deals.
    pub fn preload_deck(&mut self, deck: Deck) {
        self.next_deck = Some(deck);
    }

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn players(&self) -> &[PlayerState] {
        &self.players
    }

    pub fn hand(&self) -> Option<&HandState> {
        self.hand.as_ref()
    }

    pub fn positions(&self) -> (SeatId, SeatId, SeatId) {
        (self.dealer_pos, self.sb_pos, self.bb_pos)
    }

    // ---- hand lifecycle -------------------------------------------------

    /// Deal a new hand: rotate state was fixed at the previous
    /// completion, so this posts blinds, deals, persists, and opens
    /// the preflop betting round.
    pub async fn start_hand(&mut self) -> Result<(), EngineError> {
        if self.phase != EnginePhase::Idle {
            return Err(EngineError::IllegalAction(format!(
                "cannot start a hand while {}",
                self.phase.as_str()
            )));
        }
        let dealt_count = self.players.iter().filter(|p| !p.eliminated).count();
        if dealt_count < self.cfg.min_players {
            return Err(EngineError::IllegalAction(
                "not enough funded players to start a hand".into(),
            ));
        }

        let hand_number = self.next_hand_number;
        self.next_hand_number += 1;
        for p in self.players.iter_mut().filter(|p| !p.eliminated) {
            p.reset_for_hand();
        }

        let bb = self.cfg.stakes.big_blind;
        let mut hand = HandState {
            hand_id: 0,
            hand_number,
            dealer_pos: self.dealer_pos,
            sb_pos: self.sb_pos,
            bb_pos: self.bb_pos,
            to_act_pos: self.bb_pos,
            street: Street::Preflop,
            board: Vec::new(),
            pot: 0,
            current_bet: bb,
            min_raise: bb,
            last_aggressor_pos: Some(self.bb_pos),
            deck: self.next_deck.take().unwrap_or_else(Deck::shuffled),
        };

        // Blinds post capped at the stack; a blind that empties the
        // stack is an all-in.
        for (seat, amount) in [
            (self.sb_pos, self.cfg.stakes.small_blind),
            (self.bb_pos, self.cfg.stakes.big_blind),
        ] {
            let idx = self.seat_index(seat);
            let p = &mut self.players[idx];
            hand.pot += p.commit(amount.min(p.stack));
        }

        // Two rounds of one card each, clockwise starting left of the
        // dealer.
        let order = clockwise_from(
            self.players
                .iter()
                .filter(|p| !p.eliminated)
                .map(|p| p.position)
                .collect(),
            self.dealer_pos,
        );
        let mut dealt: Vec<(SeatId, Vec<Card>)> =
            order.iter().map(|&pos| (pos, Vec::with_capacity(2))).collect();
        for _round in 0..2 {
            for slot in dealt.iter_mut() {
                slot.1.push(hand.deck.deal_one()?);
            }
        }
        let mut hole_rows: Vec<(UserId, [Card; 2])> = Vec::with_capacity(dealt.len());
        for (pos, cards) in dealt {
            let idx = self.seat_index(pos);
            let hole = [cards[0], cards[1]];
            self.players[idx].hole_cards = Some(hole);
            hole_rows.push((self.players[idx].user_id, hole));
        }

        let record = NewHand {
            game_id: self.game_id,
            hand_number,
            dealer_seat: hand.dealer_pos,
            sb_seat: hand.sb_pos,
            bb_seat: hand.bb_pos,
            street: Street::Preflop,
            pot: hand.pot,
        };
        hand.hand_id = storage(
            self.store
                .insert_hand_with_hole_cards(record, &hole_rows)
                .await,
        )?;

        let started = RoomEvent::HandStarted {
            hand_number,
            dealer_pos: hand.dealer_pos,
            sb_pos: hand.sb_pos,
            bb_pos: hand.bb_pos,
            pot: hand.pot,
        };
        info!(
            target: LOG_TARGET,
            game_id = self.game_id,
            hand_id = hand.hand_id,
            hand_number,
            dealer = hand.dealer_pos,
            "hand started"
        );
        self.phase = EnginePhase::InHand;
        self.hand = Some(hand);
        self.emit(started);
        for (user_id, hole_cards) in &hole_rows {
            self.emit_private(*user_id, RoomEvent::HoleCardsDealt { hole_cards: *hole_cards });
        }

        self.advance().await
    }

    /// Validate and apply one client action, persist it, fan out the
    /// result, and move the hand forward.
    pub async fn submit_action(
        &mut self,
        user_id: UserId,
        action: ClientAction,
    ) -> Result<(), EngineError> {
        if self.phase != EnginePhase::InHand {
            return Err(EngineError::NotInHand);
        }
        let idx = self
            .players
            .iter()
            .position(|p| p.user_id == user_id)
            .ok_or(EngineError::NotInHand)?;
        if self.players[idx].eliminated {
            return Err(EngineError::NotInHand);
        }
        let to_act = self.hand.as_ref().expect("active hand").to_act_pos;
        if self.players[idx].position != to_act {
            return Err(EngineError::NotYourTurn);
        }
        if self.players[idx].folded || self.players[idx].all_in {
            return Err(EngineError::NotInHand);
        }

        let (kind, amount) = self.apply_action(idx, action)?;
        self.timer.disarm();

        let (hand_id, street, pot, current_bet) = {
            let hand = self.hand.as_ref().expect("active hand");
            (hand.hand_id, hand.street, hand.pot, hand.current_bet)
        };
        storage(
            self.store
                .insert_action(hand_id, user_id, kind, amount, street)
                .await,
        )?;
        debug!(
            target: LOG_TARGET,
            game_id = self.game_id,
            user_id,
            action = kind.as_str(),
            amount,
            pot,
            "action applied"
        );
        self.emit(RoomEvent::ActionPerformed {
            user_id,
            action: kind,
            amount,
            pot,
            current_bet,
        });
        self.emit(RoomEvent::PotUpdated { pot });

        self.advance().await
    }

    /// Dispatch one action. Validation failures leave all state (and
    /// the running turn timer) untouched.
    fn apply_action(
        &mut self,
        idx: usize,
        action: ClientAction,
    ) -> Result<(ActionKind, Chips), EngineError> {
        let hand = self.hand.as_mut().expect("active hand");
        let seat = self.players[idx].position;
        match action {
            ClientAction::Fold => {
                let p = &mut self.players[idx];
                p.folded = true;
                p.has_acted_this_street = true;
                Ok((ActionKind::Fold, 0))
            }
            ClientAction::Check => {
                let p = &mut self.players[idx];
                if p.committed_this_street != hand.current_bet {
                    return Err(EngineError::IllegalAction(
                        "cannot check facing a bet".into(),
                    ));
                }
                p.has_acted_this_street = true;
                Ok((ActionKind::Check, 0))
            }
            ClientAction::Call => {
                let p = &mut self.players[idx];
                let price = hand.current_bet.saturating_sub(p.committed_this_street);
                if price == 0 {
                    return Err(EngineError::IllegalAction("nothing to call".into()));
                }
                // A stack that cannot cover the price calls for less
                // and is all-in.
                let paid = p.commit(price.min(p.stack));
                hand.pot += paid;
                p.has_acted_this_street = true;
                Ok((ActionKind::Call, paid))
            }
            ClientAction::Raise { amount: to } => {
                if to == 0 {
                    return Err(EngineError::BadInput("raise amount must be positive".into()));
                }
                if self.players[idx].has_acted_this_street {
                    // The turn came back without a full raise (a short
                    // all-in lifted the price): calling and folding
                    // are the only options left.
                    return Err(EngineError::IllegalAction(
                        "the action has not been reopened".into(),
                    ));
                }
                let min_to = hand.current_bet + hand.min_raise;
                if to < min_to {
                    return Err(EngineError::IllegalAction(format!(
                        "raise to {to} is below the minimum of {min_to}"
                    )));
                }
                let p = &mut self.players[idx];
                let needed = to - p.committed_this_street;
                if needed > p.stack {
                    return Err(EngineError::InsufficientChips);
                }
                let previous_bet = hand.current_bet;
                p.commit(needed);
                p.has_acted_this_street = true;
                hand.pot += needed;
                hand.current_bet = to;
                hand.min_raise = to - previous_bet;
                hand.last_aggressor_pos = Some(seat);
                self.reopen_action(seat);
                Ok((ActionKind::Raise, needed))
            }
            ClientAction::AllIn => {
                let p = &mut self.players[idx];
                let needed = p.stack;
                p.commit(needed);
                p.has_acted_this_street = true;
                hand.pot += needed;
                let total = self.players[idx].committed_this_street;
                if total > hand.current_bet {
                    let increment = total - hand.current_bet;
                    hand.current_bet = total;
                    // Only a full raise reopens the action; a short
                    // all-in raises the price without resetting who
                    // has acted or the raise size.
                    if rules::is_full_raise(increment, hand.min_raise) {
                        hand.min_raise = increment;
                        hand.last_aggressor_pos = Some(seat);
                        self.reopen_action(seat);
                    }
                }
                Ok((ActionKind::AllIn, needed))
            }
        }
    }

    fn reopen_action(&mut self, aggressor: SeatId) {
        for p in self.players.iter_mut() {
            if p.position != aggressor && p.in_hand() && !p.all_in {
                p.has_acted_this_street = false;
            }
        }
    }

    /// Move the hand forward after any state change: finish on a
    /// fold-out, close the street when betting is settled (running
    /// out the board when nobody can act), or pass the turn.
    async fn advance(&mut self) -> Result<(), EngineError> {
        if self.players.iter().filter(|p| p.in_hand()).count() <= 1 {
            return self.hand_complete().await;
        }
        {
            let hand = self.hand.as_ref().expect("active hand");
            if !rules::round_complete(&self.players, hand.current_bet) {
                let from = hand.to_act_pos;
                if let Some(seat) = self.next_actor(from) {
                    self.begin_turn(seat);
                    return Ok(());
                }
                warn!(
                    target: LOG_TARGET,
                    game_id = self.game_id,
                    "open betting round with no seat able to act"
                );
            }
        }
        loop {
            let street = self.hand.as_ref().expect("active hand").street;
            let Some(next) = street.next_betting() else {
                return self.hand_complete().await;
            };
            self.deal_street(next).await?;
            if self.players.iter().filter(|p| p.can_act()).count() >= 2 {
                let dealer = self.hand.as_ref().expect("active hand").dealer_pos;
                if let Some(seat) = self.next_actor(dealer) {
                    self.begin_turn(seat);
                    return Ok(());
                }
            }
            // Everyone is all-in (or a single seat has no one left to
            // bet against): keep dealing to the river.
        }
    }

    fn next_actor(&self, from: SeatId) -> Option<SeatId> {
        let candidates: Vec<SeatId> = self
            .players
            .iter()
            .filter(|p| p.can_act())
            .map(|p| p.position)
            .collect();
        next_position(&candidates, from)
    }

    fn begin_turn(&mut self, seat: SeatId) {
        self.hand.as_mut().expect("active hand").to_act_pos = seat;
        let hand = self.hand.as_ref().expect("active hand");
        let p = self
            .players
            .iter()
            .find(|p| p.position == seat)
            .expect("acting seat exists");
        let legals = rules::legal_actions(p, hand);
        let event = RoomEvent::TurnStarted {
            user_id: p.user_id,
            position: seat,
            time_remaining: self.cfg.action_time_limit.as_secs(),
            current_bet: hand.current_bet,
            min_raise: hand.min_raise,
            call_amount: legals.call_amount,
        };
        self.emit(event);
        if let Some(tx) = self.mailbox.clone() {
            self.timer.arm(tx, self.cfg.action_time_limit);
        }
    }

    /// Roll per-street state, deal the community cards for `street`,
    /// persist, and announce.
    async fn deal_street(&mut self, street: Street) -> Result<(), EngineError> {
        for p in self.players.iter_mut().filter(|p| p.in_hand()) {
            p.reset_for_street();
        }
        let (hand_id, board, pot) = {
            let hand = self.hand.as_mut().expect("active hand");
            hand.current_bet = 0;
            hand.min_raise = self.cfg.stakes.big_blind;
            hand.last_aggressor_pos = None;
            let cards = hand.deck.deal(street.cards_dealt())?;
            hand.board.extend(cards);
            hand.street = street;
            (hand.hand_id, hand.board.clone(), hand.pot)
        };
        storage(
            self.store
                .update_hand_board_street_pot(hand_id, &board, street, pot)
                .await,
        )?;
        debug!(
            target: LOG_TARGET,
            game_id = self.game_id,
            street = street.as_str(),
            board = %crate::cards::board_string(&board),
            "street advanced"
        );
        self.emit(RoomEvent::StreetAdvanced { street, board, pot });
        Ok(())
    }

    /// Settle the hand: award the pot (fold-out) or evaluate every
    /// side pot, persist winners, rotate the button, and either end
    /// the game or schedule the next hand.
    async fn hand_complete(&mut self) -> Result<(), EngineError> {
        self.timer.disarm();
        let (hand_id, pot_total, board, dealer_pos) = {
            let hand = self.hand.as_ref().expect("active hand");
            (
                hand.hand_id,
                hand.pot,
                hand.board.clone(),
                hand.dealer_pos,
            )
        };

        let contenders: Vec<SeatId> = self
            .players
            .iter()
            .filter(|p| p.in_hand())
            .map(|p| p.position)
            .collect();
        let showdown = contenders.len() >= 2;

        let mut awards: BTreeMap<SeatId, Chips> = BTreeMap::new();
        let mut ranks: HashMap<SeatId, HandRank> = HashMap::new();
        if showdown {
            self.hand.as_mut().expect("active hand").street = Street::Showdown;
            for &seat in &contenders {
                let p = &self.players[self.seat_index(seat)];
                let hole = p.hole_cards.expect("contender was dealt in");
                ranks.insert(seat, evaluate(hole, &board));
            }
            for pot in pots::partition(&self.players) {
                let entries: Vec<(SeatId, HandRank)> = pot
                    .eligible
                    .iter()
                    .map(|seat| (*seat, ranks[seat].clone()))
                    .collect();
                let winners = clockwise_from(find_winners(&entries), dealer_pos);
                for (seat, chips) in pots::split_award(pot.amount, &winners) {
                    *awards.entry(seat).or_insert(0) += chips;
                }
            }
        } else {
            // Fold-out: the last seat standing takes everything,
            // cards stay hidden.
            awards.insert(contenders[0], pot_total);
        }

        let mut winner_entries: Vec<WinnerEntry> = Vec::with_capacity(awards.len());
        for (&seat, &chips) in &awards {
            let idx = self.seat_index(seat);
            self.players[idx].stack += chips;
            let (hand_rank_name, hole_cards) = if showdown {
                (
                    ranks[&seat].name().to_string(),
                    self.players[idx].hole_cards,
                )
            } else {
                (WIN_BY_FOLD.to_string(), None)
            };
            winner_entries.push(WinnerEntry {
                user_id: self.players[idx].user_id,
                amount_won: chips,
                hand_rank_name,
                hole_cards,
            });
        }

        for entry in &winner_entries {
            storage(
                self.store
                    .insert_winner(hand_id, entry.user_id, entry.amount_won, &entry.hand_rank_name)
                    .await,
            )?;
        }
        storage(self.store.mark_hand_completed(hand_id).await)?;

        info!(
            target: LOG_TARGET,
            game_id = self.game_id,
            hand_id,
            pot = pot_total,
            winners = winner_entries.len(),
            showdown,
            "hand complete"
        );
        self.emit(RoomEvent::WinnerDetermined {
            winners: winner_entries,
            pot: pot_total,
            board,
        });

        self.hand = None;
        self.phase = EnginePhase::Idle;
        self.rotate();
        self.emit(RoomEvent::PositionsUpdated {
            dealer_pos: self.dealer_pos,
            sb_pos: self.sb_pos,
            bb_pos: self.bb_pos,
        });
        self.emit(RoomEvent::StacksUpdated {
            players: self
                .players
                .iter()
                .map(|p| StackEntry {
                    user_id: p.user_id,
                    stack: p.stack,
                    eliminated: p.eliminated,
                })
                .collect(),
        });

        let mut funded = self.players.iter().filter(|p| p.stack > 0);
        match (funded.next(), funded.next()) {
            (Some(winner), None) => {
                info!(
                    target: LOG_TARGET,
                    game_id = self.game_id,
                    user_id = winner.user_id,
                    "game over"
                );
                let event = RoomEvent::GameEnded {
                    winner: Some(GameWinner {
                        user_id: winner.user_id,
                        stack: winner.stack,
                    }),
                };
                self.phase = EnginePhase::Ended;
                self.emit(event);
            }
            (None, _) => {
                self.phase = EnginePhase::Ended;
                self.emit(RoomEvent::GameEnded { winner: None });
            }
            _ => self.schedule_next_hand(),
        }
        Ok(())
    }

    /// Eliminate busted seats and advance the button and blinds among
    /// the survivors. Heads-up, the dealer posts the small blind.
    fn rotate(&mut self) {
        for p in self.players.iter_mut() {
            if p.stack == 0 {
                p.eliminated = true;
            }
        }
        let live: Vec<SeatId> = self
            .players
            .iter()
            .filter(|p| !p.eliminated)
            .map(|p| p.position)
            .collect();
        if live.is_empty() {
            return;
        }
        if let Some(dealer) = next_position(&live, self.dealer_pos) {
            self.dealer_pos = dealer;
        }
        self.assign_blinds();
    }

    fn assign_blinds(&mut self) {
        let live: Vec<SeatId> = self
            .players
            .iter()
            .filter(|p| !p.eliminated)
            .map(|p| p.position)
            .collect();
        match live.len() {
            0 | 1 => {
                self.sb_pos = self.dealer_pos;
                self.bb_pos = self.dealer_pos;
            }
            2 => {
                let other = next_position(&live, self.dealer_pos).expect("two live seats");
                self.sb_pos = self.dealer_pos;
                self.bb_pos = other;
            }
            _ => {
                let sb = next_position(&live, self.dealer_pos).expect("live seats");
                let bb = next_position(&live, sb).expect("live seats");
                self.sb_pos = sb;
                self.bb_pos = bb;
            }
        }
    }

    fn schedule_next_hand(&self) {
        let Some(tx) = self.mailbox.clone() else {
            return;
        };
        let pause = self.cfg.inter_hand_pause;
        let span = tracing::debug_span!("inter_hand_pause", game_id = self.game_id);
        tokio::spawn(
            async move {
                tokio::time::sleep(pause).await;
                let _ = tx.send(EngineCommand::Start).await;
            }
            .instrument(span),
        );
    }

    // ---- timer callbacks ------------------------------------------------

    pub(crate) fn handle_timer_tick(&self, generation: u64, remaining: u64) {
        if !self.timer.is_current(generation) || self.phase != EnginePhase::InHand {
            return;
        }
        self.emit(RoomEvent::TurnTick {
            time_remaining: remaining,
        });
    }

    /// Expiry auto-folds the acting seat through the normal action
    /// path. A stale generation means an action won the race.
    pub(crate) async fn handle_timer_expired(&mut self, generation: u64) {
        if !self.timer.is_current(generation) || self.phase != EnginePhase::InHand {
            return;
        }
        let seat = self.hand.as_ref().expect("active hand").to_act_pos;
        let user_id = self.players[self.seat_index(seat)].user_id;
        info!(
            target: LOG_TARGET,
            game_id = self.game_id,
            user_id,
            seat,
            "turn timer expired; auto-folding"
        );
        if let Err(err) = self.submit_action(user_id, ClientAction::Fold).await {
            self.surface_error(Some(user_id), err);
        }
    }

    // ---- error surfacing ------------------------------------------------

    /// Client-facing errors go privately to the submitter and change
    /// nothing. Fatal errors quiesce the room.
    pub fn surface_error(&mut self, user_id: Option<UserId>, err: EngineError) {
        let event = RoomEvent::GameError {
            message: err.to_string(),
            kind: err.kind(),
        };
        if err.is_fatal() {
            if self.phase != EnginePhase::Faulted {
                error!(
                    target: LOG_TARGET,
                    game_id = self.game_id,
                    error = %err,
                    "fatal engine error; room quiesced"
                );
                self.timer.disarm();
                self.phase = EnginePhase::Faulted;
                self.emit(event);
            }
            return;
        }
        if let Some(user_id) = user_id {
            debug!(
                target: LOG_TARGET,
                game_id = self.game_id,
                user_id,
                kind = err.kind(),
                "rejected action"
            );
            self.emit_private(user_id, event);
        }
    }

    // ---- views ----------------------------------------------------------

    /// Public state for (re)connecting clients; hole cards appear only
    /// for the requesting user, legal actions only when it is their
    /// turn.
    pub fn snapshot(&self, for_user: Option<UserId>) -> EngineSnapshot {
        let hand = self.hand.as_ref().map(|h| HandSnapshot {
            hand_number: h.hand_number,
            street: h.street,
            board: h.board.clone(),
            pot: h.pot,
            current_bet: h.current_bet,
            min_raise: h.min_raise,
            to_act_pos: h.to_act_pos,
            dealer_pos: h.dealer_pos,
            sb_pos: h.sb_pos,
            bb_pos: h.bb_pos,
        });
        let players = self
            .players
            .iter()
            .map(|p| PlayerSnapshot {
                user_id: p.user_id,
                username: p.username.clone(),
                position: p.position,
                stack: p.stack,
                committed_this_street: p.committed_this_street,
                folded: p.folded,
                all_in: p.all_in,
                eliminated: p.eliminated,
                hole_cards: (for_user == Some(p.user_id)).then_some(p.hole_cards).flatten(),
            })
            .collect();
        let legal_actions = match (self.hand.as_ref(), for_user) {
            (Some(h), Some(user)) if self.phase == EnginePhase::InHand => self
                .players
                .iter()
                .find(|p| p.position == h.to_act_pos && p.user_id == user)
                .map(|p| rules::legal_actions(p, h)),
            _ => None,
        };
        EngineSnapshot {
            phase: self.phase.as_str(),
            hand,
            players,
            legal_actions,
        }
    }

    fn seat_index(&self, seat: SeatId) -> usize {
        self.players
            .iter()
            .position(|p| p.position == seat)
            .expect("seat must exist")
    }

    fn emit(&self, event: RoomEvent) {
        self.broadcaster.broadcast(self.game_id, &event);
    }

    fn emit_private(&self, user_id: UserId, event: RoomEvent) {
        self.broadcaster.send_private(self.game_id, user_id, &event);
    }
}

fn storage<T>(result: anyhow::Result<T>) -> Result<T, EngineError> {
    result.map_err(EngineError::StorageFailure)
}

impl InvariantCheck for Engine {
    fn validate_invariants(&self) -> Result<(), String> {
        if let Some(hand) = &self.hand {
            let committed: Chips = self.players.iter().map(|p| p.committed_this_hand).sum();
            if hand.pot != committed {
                return Err(format!(
                    "pot {} != total committed {}",
                    hand.pot, committed
                ));
            }
            let expected_board = match hand.street {
                Street::Preflop => 0,
                Street::Flop => 3,
                Street::Turn => 4,
                _ => 5,
            };
            if hand.board.len() != expected_board {
                return Err(format!(
                    "street {} with {} board cards",
                    hand.street.as_str(),
                    hand.board.len()
                ));
            }
            for p in &self.players {
                if p.eliminated {
                    continue;
                }
                if p.stack == 0 && p.committed_this_hand > 0 && !p.all_in && !p.folded {
                    return Err(format!("seat {} has no stack but is not all-in", p.position));
                }
                if p.folded && !p.has_acted_this_street && p.committed_this_street > 0 {
                    return Err(format!("seat {} folded without acting", p.position));
                }
            }
        }
        Ok(())
    }
}
