use rand::rngs::StdRng;
use rand::{CryptoRng, Rng, SeedableRng};
use thiserror::Error;

use super::card::{Card, Suit, ACE, MIN_RANK};

pub const DECK_SIZE: usize = 52;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("deck exhausted: asked for {requested}, {remaining} remaining")]
pub struct DeckExhausted {
    pub requested: usize,
    pub remaining: usize,
}

/// An ordered deck dealt from the head. Construction shuffles the full
/// 52-card set with a Fisher-Yates pass driven by a CSPRNG.
#[derive(Clone, Debug)]
pub struct Deck {
    cards: Vec<Card>,
    next: usize,
}

impl Deck {
    pub fn shuffled() -> Self {
        Self::shuffled_with(&mut StdRng::from_entropy())
    }

    /// The `CryptoRng` bound keeps non-cryptographic generators out of
    /// production shuffles; tests inject a seeded `StdRng`.
    pub fn shuffled_with<R: Rng + CryptoRng>(rng: &mut R) -> Self {
        let mut cards = full_deck();
        for i in (1..cards.len()).rev() {
            let j = rng.gen_range(0..=i);
            cards.swap(i, j);
        }
        Self { cards, next: 0 }
    }

    /// A deck that deals exactly `cards` in order. Deterministic
    /// dealing for scenario tests and replays.
    pub fn stacked(cards: Vec<Card>) -> Self {
        Self { cards, next: 0 }
    }

    pub fn deal(&mut self, n: usize) -> Result<Vec<Card>, DeckExhausted> {
        if n > self.remaining() {
            return Err(DeckExhausted {
                requested: n,
                remaining: self.remaining(),
            });
        }
        let dealt = self.cards[self.next..self.next + n].to_vec();
        self.next += n;
        Ok(dealt)
    }

    pub fn deal_one(&mut self) -> Result<Card, DeckExhausted> {
        Ok(self.deal(1)?[0])
    }

    pub fn remaining(&self) -> usize {
        self.cards.len() - self.next
    }
}

fn full_deck() -> Vec<Card> {
    let mut cards = Vec::with_capacity(DECK_SIZE);
    for suit in Suit::ALL {
        for rank in MIN_RANK..=ACE {
            cards.push(Card::new(rank, suit));
        }
    }
    cards
}
