#![allow(dead_code)]
//! Error taxonomy for the rules engine. See spec.md §7.
//!
//! Validation errors are returned synchronously and never partially mutate
//! state. Protocol errors (malformed prompt replies) are handled by the
//! caller degrading to the timeout policy rather than by constructing a
//! `GameError` variant here. Storage errors are logged by the journal/store
//! glue and never propagate into the rules engine.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Caller is not the current player (build/trade/dice/end-turn outside turn).
    NotCurrentPlayer,
    /// An action was attempted before dice were rolled this turn.
    DiceNotRolled,
    /// A player already has an outstanding pending action.
    PendingActionExists,
    /// Action is not legal during special-build phase.
    InvalidDuringSpecialBuild,
    /// Not enough resources in hand to pay a cost.
    InsufficientResources,
    /// The requested vertex/edge/tile is not a legal target for this operation.
    IllegalLocation(String),
    /// No buildable pieces of this type remain for the player.
    NoPiecesLeft,
    /// The bank cannot satisfy the request (dev card deck empty, etc).
    BankExhausted,
    /// Referenced a trade offer, player seat, or card type that does not exist.
    NotFound(String),
    /// A trade offer acceptance state does not allow the requested close.
    InvalidTradeState(String),
    /// Generic bad-input validation failure with a human message.
    BadRequest(String),
    /// The session was terminated while a caller was suspended.
    SessionTerminated,
    /// A journal entry was missing or out of sequence during replay.
    JournalGap(u64),
    /// Wraps a (de)serialization failure encountered while journaling or snapshotting.
    Serde(String),
    /// Wraps a storage-layer failure; callers should log and retry, never propagate into rules.
    Storage(String),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::NotCurrentPlayer => write!(f, "not the current player"),
            GameError::DiceNotRolled => write!(f, "dice have not been rolled this turn"),
            GameError::PendingActionExists => write!(f, "player already has a pending action"),
            GameError::InvalidDuringSpecialBuild => {
                write!(f, "action not permitted during special-build phase")
            }
            GameError::InsufficientResources => write!(f, "not enough resources"),
            GameError::IllegalLocation(desc) => write!(f, "illegal location: {}", desc),
            GameError::NoPiecesLeft => write!(f, "no buildable pieces of this type remain"),
            GameError::BankExhausted => write!(f, "the bank cannot satisfy this request"),
            GameError::NotFound(desc) => write!(f, "not found: {}", desc),
            GameError::InvalidTradeState(desc) => write!(f, "invalid trade state: {}", desc),
            GameError::BadRequest(desc) => write!(f, "bad request: {}", desc),
            GameError::SessionTerminated => write!(f, "session terminated"),
            GameError::JournalGap(idx) => write!(f, "journal gap before index {}", idx),
            GameError::Serde(desc) => write!(f, "serialization error: {}", desc),
            GameError::Storage(desc) => write!(f, "storage error: {}", desc),
        }
    }
}

impl std::error::Error for GameError {}

impl From<serde_json::Error> for GameError {
    fn from(err: serde_json::Error) -> Self {
        GameError::Serde(err.to_string())
    }
}

impl From<std::io::Error> for GameError {
    fn from(err: std::io::Error) -> Self {
        GameError::Storage(err.to_string())
    }
}

pub type GameResult<T> = Result<T, GameError>;
