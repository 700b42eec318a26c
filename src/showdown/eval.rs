use crate::cards::{Card, Rank, ACE};

use super::rank::{HandCategory, HandRank};

/// Rank the best five-card hand available from two hole cards and up
/// to five board cards. Enumerates every `C(n,5)` subset and keeps the
/// maximum; with a full board that is 21 classifications.
pub fn evaluate(hole: [Card; 2], board: &[Card]) -> HandRank {
    debug_assert!(board.len() <= 5);
    let mut cards: Vec<Card> = Vec::with_capacity(2 + board.len());
    cards.extend_from_slice(&hole);
    cards.extend_from_slice(board);
    debug_assert!(cards.len() >= 5, "need at least five cards to rank");

    let n = cards.len();
    let mut best: Option<HandRank> = None;
    for a in 0..n - 4 {
        for b in a + 1..n - 3 {
            for c in b + 1..n - 2 {
                for d in c + 1..n - 1 {
                    for e in d + 1..n {
                        let rank =
                            classify_five([cards[a], cards[b], cards[c], cards[d], cards[e]]);
                        if best.as_ref().map_or(true, |cur| rank > *cur) {
                            best = Some(rank);
                        }
                    }
                }
            }
        }
    }
    best.expect("at least one five-card subset")
}

/// All entries tied for the maximum rank.
pub fn find_winners<I: Copy + Eq>(entries: &[(I, HandRank)]) -> Vec<I> {
    let best = match entries.iter().map(|(_, rank)| rank).max() {
        Some(best) => best.clone(),
        None => return Vec::new(),
    };
    entries
        .iter()
        .filter(|(_, rank)| *rank == best)
        .map(|(id, _)| *id)
        .collect()
}

/// Classify exactly five cards into a [`HandRank`].
pub fn classify_five(hand: [Card; 5]) -> HandRank {
    let mut counts = [0u8; 15];
    for card in &hand {
        counts[card.rank as usize] += 1;
    }
    // (count, rank) descending: primary grouping for pairs and sets.
    let mut groups: Vec<(u8, Rank)> = (2..=ACE)
        .rev()
        .filter(|&r| counts[r as usize] > 0)
        .map(|r| (counts[r as usize], r))
        .collect();
    groups.sort_by(|a, b| b.cmp(a));

    let flush = hand.iter().all(|c| c.suit == hand[0].suit);
    let straight_high = straight_high(&groups);
    let values_desc = || -> Vec<Rank> {
        let mut v: Vec<Rank> = hand.iter().map(|c| c.rank).collect();
        v.sort_unstable_by(|a, b| b.cmp(a));
        v
    };
    let kickers = |exclude: &[Rank]| -> Vec<Rank> {
        values_desc()
            .into_iter()
            .filter(|r| !exclude.contains(r))
            .collect()
    };

    if flush {
        if let Some(high) = straight_high {
            return HandRank::new(HandCategory::StraightFlush, vec![high]);
        }
    }
    if groups[0].0 == 4 {
        let quad = groups[0].1;
        return HandRank::new(HandCategory::FourOfAKind, vec![quad, groups[1].1]);
    }
    if groups[0].0 == 3 && groups[1].0 == 2 {
        return HandRank::new(HandCategory::FullHouse, vec![groups[0].1, groups[1].1]);
    }
    if flush {
        return HandRank::new(HandCategory::Flush, values_desc());
    }
    if let Some(high) = straight_high {
        return HandRank::new(HandCategory::Straight, vec![high]);
    }
    if groups[0].0 == 3 {
        let trip = groups[0].1;
        let mut tb = vec![trip];
        tb.extend(kickers(&[trip]));
        return HandRank::new(HandCategory::ThreeOfAKind, tb);
    }
    if groups[0].0 == 2 && groups[1].0 == 2 {
        let (hi, lo) = (groups[0].1, groups[1].1);
        return HandRank::new(HandCategory::TwoPair, vec![hi, lo, groups[2].1]);
    }
    if groups[0].0 == 2 {
        let pair = groups[0].1;
        let mut tb = vec![pair];
        tb.extend(kickers(&[pair]));
        return HandRank::new(HandCategory::Pair, tb);
    }
    HandRank::new(HandCategory::HighCard, values_desc())
}

/// Top value of a straight made from these rank groups, if any. The
/// wheel (A-2-3-4-5) ranks as a five-high straight.
fn straight_high(groups: &[(u8, Rank)]) -> Option<Rank> {
    if groups.len() != 5 {
        return None;
    }
    let mut values: Vec<Rank> = groups.iter().map(|(_, r)| *r).collect();
    values.sort_unstable_by(|a, b| b.cmp(a));
    if values[0] - values[4] == 4 {
        return Some(values[0]);
    }
    if values == [14, 5, 4, 3, 2] {
        return Some(5);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Suit;

    fn c(s: &str) -> Card {
        s.parse().unwrap()
    }

    fn cards(s: &str) -> Vec<Card> {
        s.split_whitespace().map(c).collect()
    }

    fn five(s: &str) -> [Card; 5] {
        cards(s).try_into().unwrap()
    }

    #[test]
    fn classifies_every_category() {
        let grid = [
            ("As Ks Qs Js Ts", HandCategory::StraightFlush),
            ("Ac Ad Ah As Kc", HandCategory::FourOfAKind),
            ("Ac Ad Ah Kc Kd", HandCategory::FullHouse),
            ("As Qs 9s 7s 2s", HandCategory::Flush),
            ("Ac Kd Qh Js Tc", HandCategory::Straight),
            ("Qc Qd Qh Ac Kc", HandCategory::ThreeOfAKind),
            ("Ac Ad Kc Kd Qc", HandCategory::TwoPair),
            ("Ac Ad Kc Qc Jc", HandCategory::Pair),
            ("Ac Qd 9s 7h 3c", HandCategory::HighCard),
        ];
        for (input, expected) in grid {
            assert_eq!(classify_five(five(input)).category, expected, "{input}");
        }
    }

    #[test]
    fn wheel_straight_ranks_five_high() {
        let rank = classify_five(five("Ad 2c 3h 4s 5d"));
        assert_eq!(rank.category, HandCategory::Straight);
        assert_eq!(rank.tiebreakers, vec![5]);
        let six_high = classify_five(five("2c 3h 4s 5d 6h"));
        assert!(six_high > rank);
    }

    #[test]
    fn wheel_straight_flush_ranks_below_six_high() {
        let wheel = classify_five(five("Ad 2d 3d 4d 5d"));
        assert_eq!(wheel.category, HandCategory::StraightFlush);
        assert_eq!(rank_of_wheel_top(&wheel), 5);
        let six_high = classify_five(five("2h 3h 4h 5h 6h"));
        assert!(six_high > wheel);
    }

    fn rank_of_wheel_top(rank: &HandRank) -> Rank {
        rank.tiebreakers[0]
    }

    #[test]
    fn best_of_seven_prefers_the_board_straight_over_a_pair() {
        // Hole pair of kings loses to the straight one king completes.
        let rank = evaluate(
            [c("Kc"), c("Kd")],
            &cards("9h Th Jh Qd 8c"),
        );
        assert_eq!(rank.category, HandCategory::Straight);
        assert_eq!(rank.tiebreakers, vec![13]);
    }

    #[test]
    fn ace_low_straight_from_seven_cards() {
        let rank = evaluate([c("As"), c("2d")], &cards("3c 4c 5h 9d Kc"));
        assert_eq!(rank.category, HandCategory::Straight);
        assert_eq!(rank.tiebreakers, vec![5]);
    }

    #[test]
    fn flush_tiebreak_uses_top_five_of_the_suit() {
        // Six clubs available; only the top five count.
        let rank = evaluate([c("Ac"), c("2c")], &cards("Kc 9c 7c 4c 3d"));
        assert_eq!(rank.category, HandCategory::Flush);
        assert_eq!(rank.tiebreakers, vec![14, 13, 9, 7, 4]);
    }

    #[test]
    fn kickers_break_pair_ties() {
        let a = evaluate([c("Ac"), c("Ad")], &cards("Kc Qd Jh 9s 2c"));
        let b = evaluate([c("Ah"), c("As")], &cards("Kd Qc Th 9c 2d"));
        assert_eq!(a.category, HandCategory::Pair);
        assert!(a > b); // J kicker beats T kicker
    }

    #[test]
    fn comparison_is_antisymmetric_and_reflexive() {
        let hands = [
            evaluate([c("As"), c("Ks")], &cards("Qs Js Ts 2d 3c")),
            evaluate([c("Ac"), c("Ad")], &cards("Ah As Kc 2d 3c")),
            evaluate([c("2c"), c("7d")], &cards("9h Jc Qs Kd 3s")),
        ];
        for a in &hands {
            assert_eq!(a.cmp(a), std::cmp::Ordering::Equal);
            for b in &hands {
                assert_eq!(a.cmp(b), b.cmp(a).reverse());
            }
        }
    }

    #[test]
    fn find_winners_returns_all_ties() {
        // Board plays for both: the straight on the board is the best hand.
        let board = cards("9h Th Jh Qd Kc");
        let a = evaluate([c("2c"), c("3d")], &board);
        let b = evaluate([c("4c"), c("5d")], &board);
        let winners = find_winners(&[(1u64, a), (2u64, b)]);
        assert_eq!(winners, vec![1, 2]);
    }

    #[test]
    fn suits_never_break_ties() {
        let spades = classify_five([
            Card::new(14, Suit::Spades),
            Card::new(12, Suit::Spades),
            Card::new(9, Suit::Spades),
            Card::new(7, Suit::Spades),
            Card::new(2, Suit::Spades),
        ]);
        let hearts = classify_five([
            Card::new(14, Suit::Hearts),
            Card::new(12, Suit::Hearts),
            Card::new(9, Suit::Hearts),
            Card::new(7, Suit::Hearts),
            Card::new(2, Suit::Hearts),
        ]);
        assert_eq!(spades, hearts);
    }
}
