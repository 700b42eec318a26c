use serde::Serialize;

use crate::cards::Card;

use super::rules::LegalActions;
use super::types::{Chips, SeatId, Street, UserId};

/// Public per-seat view. `hole_cards` is populated only for the seat
/// belonging to the requesting user.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub user_id: UserId,
    pub username: String,
    pub position: SeatId,
    pub stack: Chips,
    pub committed_this_street: Chips,
    pub folded: bool,
    pub all_in: bool,
    pub eliminated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole_cards: Option<[Card; 2]>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HandSnapshot {
    pub hand_number: u32,
    pub street: Street,
    pub board: Vec<Card>,
    pub pot: Chips,
    pub current_bet: Chips,
    pub min_raise: Chips,
    pub to_act_pos: SeatId,
    pub dealer_pos: SeatId,
    pub sb_pos: SeatId,
    pub bb_pos: SeatId,
}

/// Read-only view of the whole engine, served to reconnecting clients.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub phase: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand: Option<HandSnapshot>,
    pub players: Vec<PlayerSnapshot>,
    /// Present when the requesting user is the seat to act.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_actions: Option<LegalActions>,
}
