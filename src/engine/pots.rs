use serde::Serialize;

use super::player::PlayerState;
use super::types::{Chips, SeatId};

/// One layer of the pot with the seats eligible to win it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Pot {
    pub amount: Chips,
    pub eligible: Vec<SeatId>,
}

/// Partition the hand's committed chips into main and side pots.
///
/// Levels are the distinct positive `committed_this_hand` values over
/// all seats, folded included: folded chips inflate the lowest layer
/// that covers them but never grant eligibility. Adjacent layers with
/// identical eligibility (a folded seat's own level) are merged;
/// totals and winners are unaffected. The amounts always sum to the
/// hand pot.
pub fn partition(players: &[PlayerState]) -> Vec<Pot> {
    let mut levels: Vec<Chips> = players
        .iter()
        .map(|p| p.committed_this_hand)
        .filter(|&c| c > 0)
        .collect();
    levels.sort_unstable();
    levels.dedup();

    let mut pots: Vec<Pot> = Vec::new();
    let mut prev = 0;
    for level in levels {
        let amount = (level - prev)
            * players
                .iter()
                .filter(|p| p.committed_this_hand >= level)
                .count() as Chips;
        let mut eligible: Vec<SeatId> = players
            .iter()
            .filter(|p| p.in_hand() && p.committed_this_hand >= level)
            .map(|p| p.position)
            .collect();
        eligible.sort_unstable();
        match pots.last_mut() {
            Some(last) if last.eligible == eligible => last.amount += amount,
            _ => pots.push(Pot { amount, eligible }),
        }
        prev = level;
    }
    pots
}

/// Split one pot between `winners`, already sorted into clockwise
/// order from the dealer: each gets the floor share, the remainder
/// drips one chip at a time from the front.
pub fn split_award(amount: Chips, winners: &[SeatId]) -> Vec<(SeatId, Chips)> {
    debug_assert!(!winners.is_empty());
    let n = winners.len() as Chips;
    let share = amount / n;
    let mut remainder = amount % n;
    winners
        .iter()
        .map(|&seat| {
            let extra = if remainder > 0 {
                remainder -= 1;
                1
            } else {
                0
            };
            (seat, share + extra)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::player::SeatedPlayer;

    fn committed(position: u8, amount: Chips, folded: bool) -> PlayerState {
        let mut p = PlayerState::new(SeatedPlayer {
            user_id: position as u64 + 1,
            username: format!("p{position}"),
            position,
            buy_in: amount + 500,
        });
        p.commit(amount);
        p.folded = folded;
        p
    }

    #[test]
    fn uneven_stacks_produce_main_and_side_pots() {
        // Short stack all-in 100, two callers to 500.
        let players = vec![
            committed(0, 100, false),
            committed(1, 500, false),
            committed(2, 500, false),
        ];
        let pots = partition(&players);
        assert_eq!(
            pots,
            vec![
                Pot { amount: 300, eligible: vec![0, 1, 2] },
                Pot { amount: 800, eligible: vec![1, 2] },
            ]
        );
        assert_eq!(pots.iter().map(|p| p.amount).sum::<Chips>(), 1100);
    }

    #[test]
    fn folded_chips_inflate_without_eligibility() {
        let players = vec![
            committed(0, 60, true), // folded after betting 60
            committed(1, 200, false),
            committed(2, 200, false),
        ];
        let pots = partition(&players);
        // The folded seat's level merges into one pot: same eligibility.
        assert_eq!(
            pots,
            vec![Pot { amount: 460, eligible: vec![1, 2] }]
        );
    }

    #[test]
    fn folded_chips_above_an_all_in_go_to_the_covering_layer() {
        let players = vec![
            committed(0, 50, false),  // all-in short
            committed(1, 80, true),   // folded for more than the short stack
            committed(2, 200, false),
            committed(3, 200, false),
        ];
        let pots = partition(&players);
        assert_eq!(
            pots,
            vec![
                Pot { amount: 200, eligible: vec![0, 2, 3] },
                Pot { amount: 330, eligible: vec![2, 3] },
            ]
        );
        assert_eq!(pots.iter().map(|p| p.amount).sum::<Chips>(), 530);
    }

    #[test]
    fn partition_conserves_every_committed_chip() {
        let players = vec![
            committed(0, 37, false),
            committed(1, 121, true),
            committed(2, 121, false),
            committed(3, 540, false),
            committed(4, 540, false),
        ];
        let total: Chips = players.iter().map(|p| p.committed_this_hand).sum();
        let pots = partition(&players);
        assert_eq!(pots.iter().map(|p| p.amount).sum::<Chips>(), total);
        for pot in &pots {
            for seat in &pot.eligible {
                let p = players.iter().find(|p| p.position == *seat).unwrap();
                assert!(p.in_hand());
            }
        }
    }

    #[test]
    fn split_award_drips_the_remainder_in_order() {
        let awards = split_award(101, &[4, 7, 1]);
        assert_eq!(awards, vec![(4, 34), (7, 34), (1, 33)]);
        let total: Chips = awards.iter().map(|(_, c)| c).sum();
        assert_eq!(total, 101);
    }

    #[test]
    fn even_split_gives_no_extra_chips() {
        assert_eq!(split_award(100, &[2, 5]), vec![(2, 50), (5, 50)]);
    }
}
