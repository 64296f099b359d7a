#![allow(dead_code)]
//! The storage contract as an external collaborator (spec.md §6). Grounded
//! on `cosmos_db/database_abstractions.rs`'s `GameDbTrait`/`Database` enum
//! pattern: an `#[async_trait]` trait plus a swappable backend, rather than
//! baking persistence into the session itself.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GameResult;
use crate::journal::JournalEntry;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamePlayerRecord {
    pub id: String,
    pub display_name: String,
    pub order: u8,
    pub is_spectator: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameSettingsRecord {
    pub cities_and_knights: bool,
    pub num_players: u8,
    pub turn_seconds: u32,
    pub discard_seconds: u32,
}

/// The full set of operations a backend must provide, per spec.md §6's
/// table. One trait, swappable implementations (see `Database` in the
/// teacher's `database_abstractions.rs`).
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_game_if_not_exists(&self, game_id: &str) -> GameResult<()>;
    async fn create_game_state_if_not_exists(&self, game_id: &str) -> GameResult<()>;
    async fn terminate_game(&self, game_id: &str) -> GameResult<()>;

    async fn write_game_server(&self, game_id: &str, server_id: &str) -> GameResult<()>;
    async fn write_game_started(&self, game_id: &str) -> GameResult<()>;
    async fn write_game_finished(&self, game_id: &str, winner: Option<u8>) -> GameResult<()>;
    async fn write_game_completed_for_user(&self, game_id: &str, user_id: &str) -> GameResult<()>;

    async fn write_game_players(&self, game_id: &str, players: &[GamePlayerRecord]) -> GameResult<()>;
    async fn write_game_active_players(&self, game_id: &str, active: &[u8]) -> GameResult<()>;
    async fn write_game_privacy(&self, game_id: &str, is_private: bool) -> GameResult<()>;
    async fn write_game_settings(&self, game_id: &str, settings: &GameSettingsRecord) -> GameResult<()>;

    async fn write_journal_entries(&self, game_id: &str, entries: &[JournalEntry]) -> GameResult<()>;
    async fn write_game_state(&self, game_id: &str, snapshot: &[u8]) -> GameResult<()>;
    async fn write_game_id_for_user(&self, user_id: &str, game_id: &str) -> GameResult<()>;

    async fn read_journal(&self, game_id: &str) -> GameResult<Vec<JournalEntry>>;
    async fn read_game_players(&self, game_id: &str) -> GameResult<Vec<GamePlayerRecord>>;
    async fn read_game_settings(&self, game_id: &str) -> GameResult<GameSettingsRecord>;
    async fn check_if_journal_exists(&self, game_id: &str) -> GameResult<bool>;
}
