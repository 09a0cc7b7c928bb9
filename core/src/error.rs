use alloc::string::String;
use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid card index")]
    InvalidIndex,
    #[error("Invalid board dimensions")]
    InvalidDimensions,
    #[error("Board must hold an even number of cards")]
    OddCardCount,
    #[error("Board needs more pairs than there are symbols")]
    TooManyPairs,
    #[error("Deck does not match the board dimensions")]
    DeckMismatch,
    #[error("Every symbol must appear exactly twice")]
    UnpairedSymbol,
    #[error("Invalid card symbol")]
    InvalidSymbol,
    #[error("Saved progress does not fit the deck")]
    InconsistentProgress,
}

pub type Result<T> = core::result::Result<T, GameError>;

/// Failures while reading or writing persisted records. Never surfaced to the player.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
    #[error("Malformed record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Snapshot has no deck order")]
    MissingDeck,
    #[error("Snapshot rejected: {0}")]
    Game(#[from] GameError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Storage is unavailable")]
    Unavailable,
    #[error("Storage read failed: {0}")]
    ReadFailed(String),
    #[error("Storage rejected the write: {0}")]
    WriteRejected(String),
}
