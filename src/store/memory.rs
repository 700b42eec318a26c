use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::cards::Card;
use crate::engine::events::ActionKind;
use crate::engine::types::{Chips, HandId, Street, UserId};

use super::{HandStore, NewHand};

/// Every write the store accepted, in issue order.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreWrite {
    Hand { hand_id: HandId, hand: NewHand },
    HoleCards {
        hand_id: HandId,
        user_id: UserId,
        cards: [Card; 2],
    },
    Action {
        hand_id: HandId,
        user_id: UserId,
        action: ActionKind,
        amount: Chips,
        street: Street,
    },
    Board {
        hand_id: HandId,
        board: Vec<Card>,
        street: Street,
        pot: Chips,
    },
    Winner {
        hand_id: HandId,
        user_id: UserId,
        amount_won: Chips,
        hand_rank: String,
    },
    Completed { hand_id: HandId },
}

/// In-memory store recording writes in order. Tests inspect the log;
/// `fail_writes(true)` makes every subsequent call error to exercise
/// the storage-failure path.
#[derive(Default)]
pub struct InMemoryHandStore {
    next_hand_id: AtomicI64,
    failing: AtomicBool,
    writes: Mutex<Vec<StoreWrite>>,
}

impl InMemoryHandStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn writes(&self) -> Vec<StoreWrite> {
        self.writes.lock().clone()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(anyhow!("in-memory store configured to fail"))
        } else {
            Ok(())
        }
    }

    fn push(&self, write: StoreWrite) {
        self.writes.lock().push(write);
    }
}

#[async_trait]
impl HandStore for InMemoryHandStore {
    async fn insert_hand(&self, hand: NewHand) -> Result<HandId> {
        self.check()?;
        let hand_id = self.next_hand_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.push(StoreWrite::Hand { hand_id, hand });
        Ok(hand_id)
    }

    async fn insert_hole_cards(
        &self,
        hand_id: HandId,
        user_id: UserId,
        cards: [Card; 2],
    ) -> Result<()> {
        self.check()?;
        self.push(StoreWrite::HoleCards {
            hand_id,
            user_id,
            cards,
        });
        Ok(())
    }

    async fn insert_action(
        &self,
        hand_id: HandId,
        user_id: UserId,
        action: ActionKind,
        amount: Chips,
        street: Street,
    ) -> Result<()> {
        self.check()?;
        self.push(StoreWrite::Action {
            hand_id,
            user_id,
            action,
            amount,
            street,
        });
        Ok(())
    }

    async fn update_hand_board_street_pot(
        &self,
        hand_id: HandId,
        board: &[Card],
        street: Street,
        pot: Chips,
    ) -> Result<()> {
        self.check()?;
        self.push(StoreWrite::Board {
            hand_id,
            board: board.to_vec(),
            street,
            pot,
        });
        Ok(())
    }

    async fn insert_winner(
        &self,
        hand_id: HandId,
        user_id: UserId,
        amount_won: Chips,
        hand_rank: &str,
    ) -> Result<()> {
        self.check()?;
        self.push(StoreWrite::Winner {
            hand_id,
            user_id,
            amount_won,
            hand_rank: hand_rank.to_string(),
        });
        Ok(())
    }

    async fn mark_hand_completed(&self, hand_id: HandId) -> Result<()> {
        self.check()?;
        self.push(StoreWrite::Completed { hand_id });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::Street;

    fn new_hand() -> NewHand {
        NewHand {
            game_id: 1,
            hand_number: 1,
            dealer_seat: 0,
            sb_seat: 1,
            bb_seat: 2,
            street: Street::Preflop,
            pot: 30,
        }
    }

    #[tokio::test]
    async fn hand_ids_are_monotone() {
        let store = InMemoryHandStore::new();
        let first = store.insert_hand(new_hand()).await.unwrap();
        let second = store.insert_hand(new_hand()).await.unwrap();
        assert_eq!((first, second), (1, 2));
    }

    #[tokio::test]
    async fn composite_insert_orders_hand_before_cards() {
        let store = InMemoryHandStore::new();
        let cards = [
            (7u64, ["Ah".parse().unwrap(), "Kd".parse().unwrap()]),
            (8u64, ["2c".parse().unwrap(), "2d".parse().unwrap()]),
        ];
        let hand_id = store
            .insert_hand_with_hole_cards(new_hand(), &cards)
            .await
            .unwrap();
        let writes = store.writes();
        assert!(matches!(writes[0], StoreWrite::Hand { .. }));
        assert!(matches!(
            writes[1],
            StoreWrite::HoleCards { user_id: 7, .. }
        ));
        assert!(matches!(
            writes[2],
            StoreWrite::HoleCards { user_id: 8, .. }
        ));
        assert_eq!(hand_id, 1);
    }

    #[tokio::test]
    async fn failure_toggle_rejects_writes() {
        let store = InMemoryHandStore::new();
        store.fail_writes(true);
        assert!(store.insert_hand(new_hand()).await.is_err());
        store.fail_writes(false);
        assert!(store.insert_hand(new_hand()).await.is_ok());
    }
}
