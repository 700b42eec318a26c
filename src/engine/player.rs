use serde::Serialize;

use crate::cards::Card;

use super::types::{Chips, SeatId, UserId};

/// A request to seat a user before the engine starts.
#[derive(Clone, Debug)]
pub struct SeatedPlayer {
    pub user_id: UserId,
    pub username: String,
    pub position: SeatId,
    pub buy_in: Chips,
}

/// Per-seat state. Lives for the life of the engine; per-hand fields
/// reset at the head of every hand.
#[derive(Clone, Debug, Serialize)]
pub struct PlayerState {
    pub user_id: UserId,
    pub username: String,
    pub position: SeatId,
    pub stack: Chips,
    pub committed_this_street: Chips,
    pub committed_this_hand: Chips,
    #[serde(skip)]
    pub hole_cards: Option<[Card; 2]>,
    pub folded: bool,
    pub all_in: bool,
    pub eliminated: bool,
    pub has_acted_this_street: bool,
}

impl PlayerState {
    pub fn new(seat: SeatedPlayer) -> Self {
        Self {
            user_id: seat.user_id,
            username: seat.username,
            position: seat.position,
            stack: seat.buy_in,
            committed_this_street: 0,
            committed_this_hand: 0,
            hole_cards: None,
            folded: false,
            all_in: false,
            eliminated: false,
            has_acted_this_street: false,
        }
    }

    pub fn reset_for_hand(&mut self) {
        self.committed_this_street = 0;
        self.committed_this_hand = 0;
        self.hole_cards = None;
        self.folded = false;
        self.all_in = false;
        self.has_acted_this_street = false;
    }

    /// Street rollover: all-in players count as having acted so the
    /// round-completion check passes over them.
    pub fn reset_for_street(&mut self) {
        self.committed_this_street = 0;
        self.has_acted_this_street = self.all_in;
    }

    /// Move `amount` chips from the stack into the pot counters.
    /// Callers validate `amount <= stack`; a stack emptied here is an
    /// all-in by definition.
    pub fn commit(&mut self, amount: Chips) -> Chips {
        debug_assert!(amount <= self.stack);
        self.stack -= amount;
        self.committed_this_street += amount;
        self.committed_this_hand += amount;
        if self.stack == 0 {
            self.all_in = true;
        }
        amount
    }

    /// Dealt into the current hand and not folded.
    pub fn in_hand(&self) -> bool {
        !self.eliminated && !self.folded
    }

    /// Still able to act on the current street.
    pub fn can_act(&self) -> bool {
        self.in_hand() && !self.all_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(stack: Chips) -> PlayerState {
        PlayerState::new(SeatedPlayer {
            user_id: 1,
            username: "p1".into(),
            position: 0,
            buy_in: stack,
        })
    }

    #[test]
    fn commit_tracks_both_counters_and_flags_all_in() {
        let mut p = player(100);
        p.commit(40);
        assert_eq!((p.stack, p.committed_this_street, p.committed_this_hand), (60, 40, 40));
        assert!(!p.all_in);
        p.commit(60);
        assert_eq!(p.stack, 0);
        assert!(p.all_in);
    }

    #[test]
    fn street_reset_keeps_hand_total_and_marks_all_in_as_acted() {
        let mut p = player(100);
        p.commit(100);
        p.reset_for_street();
        assert_eq!(p.committed_this_street, 0);
        assert_eq!(p.committed_this_hand, 100);
        assert!(p.has_acted_this_street);
    }
}
