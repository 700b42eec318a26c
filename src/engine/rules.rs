use serde::Serialize;

use super::hand::HandState;
use super::player::PlayerState;
use super::types::Chips;

/// What the acting seat may legally do, precomputed for turn events
/// and snapshots so clients never re-derive betting rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LegalActions {
    pub may_fold: bool,
    pub may_check: bool,
    /// Chips a call would actually commit (capped at the stack).
    pub call_amount: Chips,
    /// Lowest legal raise-to total, when a full raise is affordable.
    pub min_raise_to: Option<Chips>,
    /// Raise-to total of an all-in, when the stack covers more than a
    /// call.
    pub max_raise_to: Option<Chips>,
}

/// Chips the seat owes to match the current street bet.
pub fn price_to_call(player: &PlayerState, current_bet: Chips) -> Chips {
    current_bet.saturating_sub(player.committed_this_street)
}

/// A raise reopens the action only when its increment meets the last
/// full raise; short all-ins fall below this.
pub fn is_full_raise(increment: Chips, min_raise: Chips) -> bool {
    increment >= min_raise
}

pub fn legal_actions(player: &PlayerState, hand: &HandState) -> LegalActions {
    let price = price_to_call(player, hand.current_bet);
    let min_to = hand.current_bet + hand.min_raise;
    let all_in_to = player.committed_this_street + player.stack;
    // A seat that already acted and faces only a short all-in may call
    // or fold; the action was never reopened for it.
    let may_raise = !player.has_acted_this_street && all_in_to >= min_to;
    LegalActions {
        may_fold: true,
        may_check: price == 0,
        call_amount: price.min(player.stack),
        min_raise_to: may_raise.then_some(min_to),
        max_raise_to: (all_in_to > hand.current_bet).then_some(all_in_to),
    }
}

/// A street is finished when every player still in the hand is either
/// all-in or has acted and matched the current bet. The big blind's
/// preflop option falls out of this naturally: blinds post without
/// marking the seat as having acted.
pub fn round_complete(players: &[PlayerState], current_bet: Chips) -> bool {
    players.iter().filter(|p| p.in_hand()).all(|p| {
        p.all_in || (p.has_acted_this_street && p.committed_this_street == current_bet)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Deck;
    use crate::engine::player::SeatedPlayer;
    use crate::engine::types::Street;

    fn player(position: u8, stack: Chips, committed: Chips, acted: bool) -> PlayerState {
        let mut p = PlayerState::new(SeatedPlayer {
            user_id: position as u64 + 1,
            username: format!("p{position}"),
            position,
            buy_in: stack + committed,
        });
        if committed > 0 {
            p.commit(committed);
        }
        p.has_acted_this_street = acted;
        p
    }

    fn hand(current_bet: Chips, min_raise: Chips) -> HandState {
        HandState {
            hand_id: 1,
            hand_number: 1,
            dealer_pos: 0,
            sb_pos: 1,
            bb_pos: 2,
            to_act_pos: 0,
            street: Street::Preflop,
            board: vec![],
            pot: 0,
            current_bet,
            min_raise,
            last_aggressor_pos: None,
            deck: Deck::stacked(vec![]),
        }
    }

    #[test]
    fn facing_a_bet_cannot_check() {
        let legals = legal_actions(&player(0, 100, 0, false), &hand(20, 20));
        assert!(!legals.may_check);
        assert_eq!(legals.call_amount, 20);
        assert_eq!(legals.min_raise_to, Some(40));
        assert_eq!(legals.max_raise_to, Some(100));
    }

    #[test]
    fn short_stack_loses_the_full_raise_option() {
        // 30 behind against a 20 bet with min raise 20: call or jam only.
        let legals = legal_actions(&player(0, 30, 0, false), &hand(20, 20));
        assert_eq!(legals.min_raise_to, None);
        assert_eq!(legals.max_raise_to, Some(30));
        assert_eq!(legals.call_amount, 20);
    }

    #[test]
    fn call_amount_caps_at_the_stack() {
        let legals = legal_actions(&player(0, 15, 0, false), &hand(50, 20));
        assert_eq!(legals.call_amount, 15);
        assert_eq!(legals.max_raise_to, None);
    }

    #[test]
    fn round_incomplete_until_the_big_blind_option_resolves() {
        // Everyone limped to the blind. The big blind has matched but
        // has not acted, so the street stays open.
        let players = vec![
            player(0, 80, 20, true),
            player(1, 80, 20, true),
            player(2, 80, 20, false), // big blind, posted without acting
        ];
        assert!(!round_complete(&players, 20));
        let mut players = players;
        players[2].has_acted_this_street = true;
        assert!(round_complete(&players, 20));
    }

    #[test]
    fn all_in_seats_do_not_hold_the_round_open() {
        let mut short = player(1, 10, 0, false);
        short.commit(10); // all-in below the bet
        let players = vec![player(0, 80, 20, true), short];
        assert!(round_complete(&players, 20));
    }

    #[test]
    fn round_complete_is_monotone_under_matching() {
        let players = vec![player(0, 80, 20, true), player(1, 80, 20, true)];
        assert!(round_complete(&players, 20));
        // No further action can reopen it without a raise.
        assert!(round_complete(&players, 20));
    }
}
