use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};

use crate::cards::{board_string, Card};
use crate::db::entity::{actions, hand_cards, hands, winners};
use crate::engine::events::ActionKind;
use crate::engine::types::{Chips, HandId, Street, UserId};

use super::{HandStore, NewHand};

/// Postgres-backed store over the `hands`/`hand_cards`/`actions`/
/// `winners` tables.
pub struct SeaOrmHandStore {
    connection: DatabaseConnection,
}

impl SeaOrmHandStore {
    pub fn new(connection: DatabaseConnection) -> Self {
        Self { connection }
    }
}

fn to_db_user(user_id: UserId) -> Result<i64> {
    i64::try_from(user_id).map_err(|_| anyhow!("user id {user_id} exceeds i64::MAX"))
}

fn to_db_chips(chips: Chips) -> Result<i64> {
    i64::try_from(chips).map_err(|_| anyhow!("chip amount {chips} exceeds i64::MAX"))
}

fn hand_active_model(hand: &NewHand) -> Result<hands::ActiveModel> {
    Ok(hands::ActiveModel {
        game_id: Set(hand.game_id),
        hand_number: Set(hand.hand_number as i32),
        dealer_seat: Set(hand.dealer_seat as i16),
        sb_seat: Set(hand.sb_seat as i16),
        bb_seat: Set(hand.bb_seat as i16),
        current_street: Set(hand.street.as_str().to_string()),
        pot_size: Set(to_db_chips(hand.pot)?),
        board_cards: Set(String::new()),
        is_completed: Set(false),
        start_time: Set(chrono::Utc::now()),
        ..Default::default()
    })
}

fn hole_card_active_model(
    hand_id: HandId,
    user_id: UserId,
    cards: [Card; 2],
) -> Result<hand_cards::ActiveModel> {
    Ok(hand_cards::ActiveModel {
        hand_id: Set(hand_id),
        user_id: Set(to_db_user(user_id)?),
        card_1: Set(cards[0].to_string()),
        card_2: Set(cards[1].to_string()),
    })
}

#[async_trait]
impl HandStore for SeaOrmHandStore {
    async fn insert_hand(&self, hand: NewHand) -> Result<HandId> {
        let result = hands::Entity::insert(hand_active_model(&hand)?)
            .exec(&self.connection)
            .await
            .context("failed to insert hand record")?;
        Ok(result.last_insert_id)
    }

    async fn insert_hole_cards(
        &self,
        hand_id: HandId,
        user_id: UserId,
        cards: [Card; 2],
    ) -> Result<()> {
        hand_cards::Entity::insert(hole_card_active_model(hand_id, user_id, cards)?)
            .exec(&self.connection)
            .await
            .context("failed to insert hole card record")?;
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
        let active = actions::ActiveModel {
            hand_id: Set(hand_id),
            user_id: Set(to_db_user(user_id)?),
            action_type: Set(action.as_str().to_string()),
            amount: Set(to_db_chips(amount)?),
            street: Set(street.as_str().to_string()),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };
        actions::Entity::insert(active)
            .exec(&self.connection)
            .await
            .context("failed to insert action record")?;
        Ok(())
    }

    async fn update_hand_board_street_pot(
        &self,
        hand_id: HandId,
        board: &[Card],
        street: Street,
        pot: Chips,
    ) -> Result<()> {
        let active = hands::ActiveModel {
            id: Set(hand_id),
            board_cards: Set(board_string(board)),
            current_street: Set(street.as_str().to_string()),
            pot_size: Set(to_db_chips(pot)?),
            ..Default::default()
        };
        active
            .update(&self.connection)
            .await
            .context("failed to update hand board/street/pot")?;
        Ok(())
    }

    async fn insert_winner(
        &self,
        hand_id: HandId,
        user_id: UserId,
        amount_won: Chips,
        hand_rank: &str,
    ) -> Result<()> {
        let active = winners::ActiveModel {
            hand_id: Set(hand_id),
            user_id: Set(to_db_user(user_id)?),
            amount_won: Set(to_db_chips(amount_won)?),
            hand_rank: Set(hand_rank.to_string()),
            created_at: Set(chrono::Utc::now()),
        };
        winners::Entity::insert(active)
            .exec(&self.connection)
            .await
            .context("failed to insert winner record")?;
        Ok(())
    }

    async fn mark_hand_completed(&self, hand_id: HandId) -> Result<()> {
        let active = hands::ActiveModel {
            id: Set(hand_id),
            is_completed: Set(true),
            ..Default::default()
        };
        active
            .update(&self.connection)
            .await
            .context("failed to mark hand completed")?;
        Ok(())
    }

    async fn insert_hand_with_hole_cards(
        &self,
        hand: NewHand,
        hole_cards: &[(UserId, [Card; 2])],
    ) -> Result<HandId> {
        let txn = self
            .connection
            .begin()
            .await
            .context("failed to open hand insert transaction")?;
        let result = hands::Entity::insert(hand_active_model(&hand)?)
            .exec(&txn)
            .await
            .context("failed to insert hand record")?;
        let hand_id = result.last_insert_id;
        for (user_id, cards) in hole_cards {
            hand_cards::Entity::insert(hole_card_active_model(hand_id, *user_id, *cards)?)
                .exec(&txn)
                .await
                .context("failed to insert hole card record")?;
        }
        txn.commit()
            .await
            .context("failed to commit hand insert transaction")?;
        Ok(hand_id)
    }
}
