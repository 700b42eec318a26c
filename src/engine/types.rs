use std::time::Duration;

use serde::{Deserialize, Serialize};

pub type Chips = u64;
pub type SeatId = u8; // 0..=9
pub type UserId = u64;

/// Store keys.
pub type GameId = i64;
pub type HandId = i64;

pub const STARTING_STACK: Chips = 1500;
pub const SMALL_BLIND: Chips = 10;
pub const BIG_BLIND: Chips = 20;
pub const TURN_TIME: Duration = Duration::from_secs(30);
pub const MAX_SEATS: usize = 10;
pub const MIN_PLAYERS: usize = 2;
pub const INTER_HAND_PAUSE: Duration = Duration::from_secs(3);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
    Complete,
}

impl Street {
    pub fn as_str(self) -> &'static str {
        match self {
            Street::Preflop => "preflop",
            Street::Flop => "flop",
            Street::Turn => "turn",
            Street::River => "river",
            Street::Showdown => "showdown",
            Street::Complete => "complete",
        }
    }

    /// The betting street after this one, while betting streets remain.
    pub fn next_betting(self) -> Option<Street> {
        match self {
            Street::Preflop => Some(Street::Flop),
            Street::Flop => Some(Street::Turn),
            Street::Turn => Some(Street::River),
            _ => None,
        }
    }

    /// Community cards dealt on entry to this street.
    pub fn cards_dealt(self) -> usize {
        match self {
            Street::Flop => 3,
            Street::Turn | Street::River => 1,
            _ => 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStakes {
    pub small_blind: Chips,
    pub big_blind: Chips,
}

/// Per-room rules. `Default` yields the fixed table configuration:
/// 1500 starting stack, 10/20 blinds, 30 second turns, ten seats.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub stakes: TableStakes,
    pub starting_stack: Chips,
    pub action_time_limit: Duration,
    pub inter_hand_pause: Duration,
    pub max_seats: usize,
    pub min_players: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stakes: TableStakes {
                small_blind: SMALL_BLIND,
                big_blind: BIG_BLIND,
            },
            starting_stack: STARTING_STACK,
            action_time_limit: TURN_TIME,
            inter_hand_pause: INTER_HAND_PAUSE,
            max_seats: MAX_SEATS,
            min_players: MIN_PLAYERS,
        }
    }
}
