use thiserror::Error;

use crate::cards::DeckExhausted;

/// Engine error taxonomy. The `kind` string is the stable identifier
/// carried by `GameError` events; clients match on it, so it never
/// changes.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("action submitted out of turn")]
    NotYourTurn,
    #[error("illegal action: {0}")]
    IllegalAction(String),
    #[error("insufficient chips for this action")]
    InsufficientChips,
    #[error("no active hand for this player")]
    NotInHand,
    #[error("malformed action payload: {0}")]
    BadInput(String),
    #[error("persistence layer failure")]
    StorageFailure(#[source] anyhow::Error),
    #[error(transparent)]
    DeckExhausted(#[from] DeckExhausted),
}

impl EngineError {
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::NotYourTurn => "NotYourTurn",
            EngineError::IllegalAction(_) => "IllegalAction",
            EngineError::InsufficientChips => "InsufficientChips",
            EngineError::NotInHand => "NotInHand",
            EngineError::BadInput(_) => "BadInput",
            EngineError::StorageFailure(_) => "StorageFailure",
            EngineError::DeckExhausted(_) => "DeckExhausted",
        }
    }

    /// Room-fatal errors quiesce the engine; everything else is
    /// reported privately to the submitter and changes nothing.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::StorageFailure(_) | EngineError::DeckExhausted(_)
        )
    }
}

/// Structural self-checks run by tests after every mutation.
pub trait InvariantCheck {
    fn validate_invariants(&self) -> Result<(), String>;
}
