use serde::{Deserialize, Serialize};

use crate::cards::Card;

use super::types::{Chips, SeatId, Street, UserId};

/// Client-to-engine action payloads. `Raise.amount` is the total the
/// street bet is raised *to*, not the increment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientAction {
    Fold,
    Check,
    Call,
    Raise { amount: Chips },
    AllIn,
}

/// Normalized action names as broadcast and persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    Raise,
    AllIn,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Fold => "fold",
            ActionKind::Check => "check",
            ActionKind::Call => "call",
            ActionKind::Raise => "raise",
            ActionKind::AllIn => "all_in",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WinnerEntry {
    pub user_id: UserId,
    pub amount_won: Chips,
    pub hand_rank_name: String,
    /// Revealed at showdown only; fold-out wins stay hidden.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole_cards: Option<[Card; 2]>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StackEntry {
    pub user_id: UserId,
    pub stack: Chips,
    pub eliminated: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameWinner {
    pub user_id: UserId,
    pub stack: Chips,
}

/// Events emitted by the engine. Room events fan out to every
/// connected client of the room; `HoleCardsDealt` is delivered only
/// through the per-user private path.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    HandStarted {
        hand_number: u32,
        dealer_pos: SeatId,
        sb_pos: SeatId,
        bb_pos: SeatId,
        pot: Chips,
    },
    PotUpdated {
        pot: Chips,
    },
    ActionPerformed {
        user_id: UserId,
        action: ActionKind,
        amount: Chips,
        pot: Chips,
        current_bet: Chips,
    },
    StreetAdvanced {
        street: Street,
        board: Vec<Card>,
        pot: Chips,
    },
    TurnStarted {
        user_id: UserId,
        position: SeatId,
        time_remaining: u64,
        current_bet: Chips,
        min_raise: Chips,
        call_amount: Chips,
    },
    TurnTick {
        time_remaining: u64,
    },
    WinnerDetermined {
        winners: Vec<WinnerEntry>,
        pot: Chips,
        board: Vec<Card>,
    },
    StacksUpdated {
        players: Vec<StackEntry>,
    },
    PositionsUpdated {
        dealer_pos: SeatId,
        sb_pos: SeatId,
        bb_pos: SeatId,
    },
    GameEnded {
        #[serde(skip_serializing_if = "Option::is_none")]
        winner: Option<GameWinner>,
    },
    GameError {
        message: String,
        kind: &'static str,
    },
    HoleCardsDealt {
        hole_cards: [Card; 2],
    },
}

impl RoomEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            RoomEvent::HandStarted { .. } => "hand_started",
            RoomEvent::PotUpdated { .. } => "pot_updated",
            RoomEvent::ActionPerformed { .. } => "action_performed",
            RoomEvent::StreetAdvanced { .. } => "street_advanced",
            RoomEvent::TurnStarted { .. } => "turn_started",
            RoomEvent::TurnTick { .. } => "turn_tick",
            RoomEvent::WinnerDetermined { .. } => "winner_determined",
            RoomEvent::StacksUpdated { .. } => "stacks_updated",
            RoomEvent::PositionsUpdated { .. } => "positions_updated",
            RoomEvent::GameEnded { .. } => "game_ended",
            RoomEvent::GameError { .. } => "game_error",
            RoomEvent::HoleCardsDealt { .. } => "hole_cards_dealt",
        }
    }
}
