#![allow(dead_code)]
//! In-memory `Store`, grounded on `cosmos_db/mocked_db.rs`'s `TestDb`
//! (`Arc<RwLock<HashMap<...>>>` fields, one per collection) but fully
//! implemented rather than left as `todo!()`, since this backend is the
//! one the test suite and `catan-replay` actually exercise.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::GameResult;
use crate::journal::JournalEntry;

use super::{GamePlayerRecord, GameSettingsRecord, Store};

#[derive(Debug, Default, Clone)]
struct GameRecord {
    started: bool,
    finished: bool,
    winner: Option<u8>,
    server_id: Option<String>,
    is_private: bool,
    active_players: Vec<u8>,
    settings: GameSettingsRecord,
    players: Vec<GamePlayerRecord>,
    journal: Vec<JournalEntry>,
    snapshot: Option<Vec<u8>>,
}

pub struct InMemoryStore {
    games: Arc<RwLock<HashMap<String, GameRecord>>>,
    user_games: Arc<RwLock<HashMap<String, Vec<String>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore {
            games: Arc::new(RwLock::new(HashMap::new())),
            user_games: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn create_game_if_not_exists(&self, game_id: &str) -> GameResult<()> {
        self.games.write().await.entry(game_id.to_string()).or_default();
        Ok(())
    }

    async fn create_game_state_if_not_exists(&self, game_id: &str) -> GameResult<()> {
        self.games.write().await.entry(game_id.to_string()).or_default();
        Ok(())
    }

    async fn terminate_game(&self, game_id: &str) -> GameResult<()> {
        self.games.write().await.remove(game_id);
        Ok(())
    }

    async fn write_game_server(&self, game_id: &str, server_id: &str) -> GameResult<()> {
        let mut games = self.games.write().await;
        let record = games.entry(game_id.to_string()).or_default();
        record.server_id = Some(server_id.to_string());
        Ok(())
    }

    async fn write_game_started(&self, game_id: &str) -> GameResult<()> {
        let mut games = self.games.write().await;
        let record = games.entry(game_id.to_string()).or_default();
        record.started = true;
        Ok(())
    }

    async fn write_game_finished(&self, game_id: &str, winner: Option<u8>) -> GameResult<()> {
        let mut games = self.games.write().await;
        let record = games.entry(game_id.to_string()).or_default();
        record.finished = true;
        record.winner = winner;
        Ok(())
    }

    async fn write_game_completed_for_user(&self, game_id: &str, user_id: &str) -> GameResult<()> {
        let mut user_games = self.user_games.write().await;
        user_games
            .entry(user_id.to_string())
            .or_default()
            .push(game_id.to_string());
        Ok(())
    }

    async fn write_game_players(&self, game_id: &str, players: &[GamePlayerRecord]) -> GameResult<()> {
        let mut games = self.games.write().await;
        let record = games.entry(game_id.to_string()).or_default();
        record.players = players.to_vec();
        Ok(())
    }

    async fn write_game_active_players(&self, game_id: &str, active: &[u8]) -> GameResult<()> {
        let mut games = self.games.write().await;
        let record = games.entry(game_id.to_string()).or_default();
        record.active_players = active.to_vec();
        Ok(())
    }

    async fn write_game_privacy(&self, game_id: &str, is_private: bool) -> GameResult<()> {
        let mut games = self.games.write().await;
        let record = games.entry(game_id.to_string()).or_default();
        record.is_private = is_private;
        Ok(())
    }

    async fn write_game_settings(&self, game_id: &str, settings: &GameSettingsRecord) -> GameResult<()> {
        let mut games = self.games.write().await;
        let record = games.entry(game_id.to_string()).or_default();
        record.settings = settings.clone();
        Ok(())
    }

    async fn write_journal_entries(&self, game_id: &str, entries: &[JournalEntry]) -> GameResult<()> {
        let mut games = self.games.write().await;
        let record = games.entry(game_id.to_string()).or_default();
        record.journal.extend_from_slice(entries);
        Ok(())
    }

    async fn write_game_state(&self, game_id: &str, snapshot: &[u8]) -> GameResult<()> {
        let mut games = self.games.write().await;
        let record = games.entry(game_id.to_string()).or_default();
        record.snapshot = Some(snapshot.to_vec());
        Ok(())
    }

    async fn write_game_id_for_user(&self, user_id: &str, game_id: &str) -> GameResult<()> {
        let mut user_games = self.user_games.write().await;
        let list = user_games.entry(user_id.to_string()).or_default();
        if !list.iter().any(|g| g == game_id) {
            list.push(game_id.to_string());
        }
        Ok(())
    }

    async fn read_journal(&self, game_id: &str) -> GameResult<Vec<JournalEntry>> {
        let games = self.games.read().await;
        Ok(games.get(game_id).map(|r| r.journal.clone()).unwrap_or_default())
    }

    async fn read_game_players(&self, game_id: &str) -> GameResult<Vec<GamePlayerRecord>> {
        let games = self.games.read().await;
        Ok(games.get(game_id).map(|r| r.players.clone()).unwrap_or_default())
    }

    async fn read_game_settings(&self, game_id: &str) -> GameResult<GameSettingsRecord> {
        let games = self.games.read().await;
        Ok(games.get(game_id).map(|r| r.settings.clone()).unwrap_or_default())
    }

    async fn check_if_journal_exists(&self, game_id: &str) -> GameResult<bool> {
        let games = self.games.read().await;
        Ok(games.get(game_id).map(|r| !r.journal.is_empty()).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn journal_entries_accumulate_per_game() {
        let store = InMemoryStore::new();
        store.create_game_if_not_exists("g1").await.unwrap();
        assert!(!store.check_if_journal_exists("g1").await.unwrap());

        store
            .write_journal_entries(
                "g1",
                &[JournalEntry {
                    index: 1,
                    record: crate::journal::JournalRecord::EndTurn { seat: 0 },
                }],
            )
            .await
            .unwrap();

        assert!(store.check_if_journal_exists("g1").await.unwrap());
        assert_eq!(store.read_journal("g1").await.unwrap().len(), 1);
    }
}
