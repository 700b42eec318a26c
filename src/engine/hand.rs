use crate::cards::{Card, Deck};

use super::types::{Chips, HandId, SeatId, Street};

/// Authoritative state of one hand. Created by the hand-start path,
/// mutated only by the engine's owning task, dropped on completion.
#[derive(Debug)]
pub struct HandState {
    pub hand_id: HandId,
    pub hand_number: u32,
    pub dealer_pos: SeatId,
    pub sb_pos: SeatId,
    pub bb_pos: SeatId,
    pub to_act_pos: SeatId,
    pub street: Street,
    pub board: Vec<Card>,
    /// Total chips committed this hand; always equals the sum of
    /// `committed_this_hand` over all seats.
    pub pot: Chips,
    /// Highest `committed_this_street` any live seat owes to match.
    pub current_bet: Chips,
    /// Smallest legal raise increment: the big blind until a full
    /// raise resets it to that raise's size.
    pub min_raise: Chips,
    pub last_aggressor_pos: Option<SeatId>,
    pub deck: Deck,
}
