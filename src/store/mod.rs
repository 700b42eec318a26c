//! Durable writes for hands, hole cards, actions, and winners.
//!
//! The engine issues writes in emission order and treats them as
//! fire-and-forget relative to the broadcast path: a failure faults
//! the room but chip state is never rolled back.

pub mod memory;
pub mod sea_orm;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::cards::Card;
use crate::engine::events::ActionKind;
use crate::engine::types::{Chips, GameId, HandId, SeatId, Street, UserId};

pub use self::memory::{InMemoryHandStore, StoreWrite};
pub use self::sea_orm::SeaOrmHandStore;

/// Row for a freshly started hand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewHand {
    pub game_id: GameId,
    pub hand_number: u32,
    pub dealer_seat: SeatId,
    pub sb_seat: SeatId,
    pub bb_seat: SeatId,
    pub street: Street,
    pub pot: Chips,
}

pub type SharedHandStore = Arc<dyn HandStore>;

/// Persistence consumed by the engine. Implementations tolerate
/// concurrent callers across rooms; per-hand writes arrive serialized.
#[async_trait]
pub trait HandStore: Send + Sync {
    async fn insert_hand(&self, hand: NewHand) -> Result<HandId>;

    async fn insert_hole_cards(
        &self,
        hand_id: HandId,
        user_id: UserId,
        cards: [Card; 2],
    ) -> Result<()>;

    async fn insert_action(
        &self,
        hand_id: HandId,
        user_id: UserId,
        action: ActionKind,
        amount: Chips,
        street: Street,
    ) -> Result<()>;

    async fn update_hand_board_street_pot(
        &self,
        hand_id: HandId,
        board: &[Card],
        street: Street,
        pot: Chips,
    ) -> Result<()>;

    async fn insert_winner(
        &self,
        hand_id: HandId,
        user_id: UserId,
        amount_won: Chips,
        hand_rank: &str,
    ) -> Result<()>;

    async fn mark_hand_completed(&self, hand_id: HandId) -> Result<()>;

    /// Hand row plus every hole-card row in one unit. Backends with
    /// transactions override this to make the composite atomic.
    async fn insert_hand_with_hole_cards(
        &self,
        hand: NewHand,
        hole_cards: &[(UserId, [Card; 2])],
    ) -> Result<HandId> {
        let hand_id = self.insert_hand(hand).await?;
        for (user_id, cards) in hole_cards {
            self.insert_hole_cards(hand_id, *user_id, *cards).await?;
        }
        Ok(hand_id)
    }
}
