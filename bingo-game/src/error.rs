use bingo_core::PlayerId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GameError>;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Bingo core error: {0}")]
    Core(#[from] bingo_core::BingoError),

    #[error("Transaction {hash} still pending after {attempts} polls")]
    WatchTimeout { hash: String, attempts: u32 },

    #[error("Cancelled")]
    Cancelled,

    #[error("Player not found: {0}")]
    UnknownPlayer(PlayerId),

    #[error("Invalid game state: {0}")]
    InvalidState(String),

    #[error("Insufficient balance: need {need} {unit}, have {available} {unit}")]
    InsufficientBalance {
        need: String,
        available: String,
        unit: String,
    },

    #[error("Round information is not available yet")]
    RoundUnavailable,
}

impl GameError {
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Errors a polling loop logs and retries on its next tick.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Core(e) => e.is_transient(),
            Self::RoundUnavailable => true,
            _ => false,
        }
    }
}
