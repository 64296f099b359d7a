#![allow(dead_code)]
//! Top-level session registry (spec.md §9's "Global mutable state" design
//! note): a map of session id → session, with one `Ticker` per session.
//! Grounded on `games_service/game_container/game_container.rs`'s
//! `GAME_MAP` (`lazy_static<Arc<RwLock<HashMap<...>>>>`), adapted to own
//! this crate's `Session`/`Ticker` pair instead of the teacher's HTTP-era
//! `GameContainer`.
//!
//! Multiple sessions coexist independently; nothing here is shared game
//! state, only the bookkeeping needed to find a session by id and to spin
//! its ticker up or down.

use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use tokio::sync::RwLock;

use crate::board::map_definition::MapDefinition;
use crate::config::EngineConfig;
use crate::engine::GameState;
use crate::error::{GameError, GameResult};
use crate::scheduler::Ticker;
use crate::session::Session;
use crate::store::Store;

/// A fresh game id, distinct from the replayed-session id path (which reuses
/// whatever id the store already has on file).
pub fn generate_game_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

struct Entry {
    session: Arc<Session>,
    ticker: Ticker,
}

lazy_static! {
    static ref SESSIONS: RwLock<HashMap<String, Entry>> = RwLock::new(HashMap::new());
}

/// Registers `session`, spawning its ticker, and returns the `Arc` the
/// caller should hand to connection handlers. Replaces any prior entry
/// with the same id (the old ticker is dropped, which aborts it).
pub async fn register(session: Arc<Session>, config: &EngineConfig) -> Arc<Session> {
    let ticker = Ticker::spawn(session.clone(), config);
    let id = session.id.clone();
    let mut map = SESSIONS.write().await;
    map.insert(id, Entry { session: session.clone(), ticker });
    session
}

/// Looks up a live session by id.
pub async fn get(game_id: &str) -> GameResult<Arc<Session>> {
    let map = SESSIONS.read().await;
    map.get(game_id)
        .map(|e| e.session.clone())
        .ok_or_else(|| GameError::NotFound(format!("no session for game {}", game_id)))
}

/// Looks up a session if present, without error on a miss.
pub async fn try_get(game_id: &str) -> Option<Arc<Session>> {
    let map = SESSIONS.read().await;
    map.get(game_id).map(|e| e.session.clone())
}

/// Starts a brand-new game (spec.md §1's "create a game" entry point):
/// generates a fresh id, builds the initial `GameState`, and registers it.
pub async fn create_game(
    defn: &MapDefinition,
    player_names: &[(String, String)],
    cities_and_knights: bool,
    base_discard_limit: u32,
    seed: u64,
    store: Arc<dyn Store>,
    config: &EngineConfig,
) -> Arc<Session> {
    let id = generate_game_id();
    let state = GameState::new(id, defn, player_names, cities_and_knights, base_discard_limit, seed);
    let session = Session::new(state, store);
    register(session, config).await
}

/// Rehydrates a session from the journal and registers it (spec.md §4.7,
/// the migration/crash-recovery path): used instead of `register` when
/// there's no in-memory `GameState` yet, only a store record.
pub async fn load_and_register(game_id: &str, store: Arc<dyn Store>, config: &EngineConfig) -> GameResult<Arc<Session>> {
    if let Some(existing) = try_get(game_id).await {
        return Ok(existing);
    }
    let session = Session::from_store(game_id, store).await?;
    Ok(register(session, config).await)
}

/// Terminates and removes a session (spec.md §5's "closing the session"):
/// marks it uninitialized so every suspended caller observes the
/// terminal-error path, aborts its ticker, and drops it from the map.
pub async fn terminate(game_id: &str) {
    let mut map = SESSIONS.write().await;
    if let Some(entry) = map.remove(game_id) {
        entry.session.terminate();
        entry.ticker.stop();
    }
}

pub async fn active_session_ids() -> Vec<String> {
    SESSIONS.read().await.keys().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    fn make_state(id: &str) -> GameState {
        GameState::new(
            id,
            &MapDefinition::base_4_player(),
            &[("a".into(), "A".into()), ("b".into(), "B".into())],
            false,
            7,
            1,
        )
    }

    #[tokio::test]
    async fn register_then_get_round_trips() {
        let config = EngineConfig::default();
        let session = Session::new(make_state("reg-1"), Arc::new(InMemoryStore::new()));
        register(session, &config).await;

        let found = get("reg-1").await.unwrap();
        assert_eq!(found.id, "reg-1");

        terminate("reg-1").await;
        assert!(get("reg-1").await.is_err());
    }

    #[tokio::test]
    async fn try_get_returns_none_for_an_unknown_session() {
        assert!(try_get("does-not-exist").await.is_none());
    }

    #[tokio::test]
    async fn create_game_assigns_a_fresh_id_and_registers_it() {
        let config = EngineConfig::default();
        let session = create_game(
            &MapDefinition::base_4_player(),
            &[("a".into(), "A".into()), ("b".into(), "B".into())],
            false,
            7,
            1,
            Arc::new(InMemoryStore::new()),
            &config,
        )
        .await;

        assert!(!session.id.is_empty());
        let found = get(&session.id).await.unwrap();
        assert_eq!(found.id, session.id);
        terminate(&session.id).await;
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(generate_game_id(), generate_game_id());
    }
}
