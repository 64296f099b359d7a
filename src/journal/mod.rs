#![allow(dead_code)]
//! Append-only, replayable action journal (spec.md §4.7). Grounded on
//! `original_source/game/journal.go`: `Write`/`Flush`/`Play` keep the same
//! shape (buffered channel, batched flush, playing-flag suppression,
//! strictly increasing index, replay-time dispatch), but each record kind
//! gets its own typed struct variant instead of a positional
//! `[]interface{}` + runtime decode, which is the idiomatic Rust
//! replacement for `mapstructure.Decode`.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::board::coordinate::{EdgeCoord, TileCoord, VertexCoord};
use crate::board::tile::{Port, TileType};
use crate::entities::buildable::{BuildableType, SeatIndex};
use crate::entities::hand::{CardType, DevCardType};
use crate::error::{GameError, GameResult};
use crate::store::Store;

/// One journal record kind, mirroring the original's `J*` constants
/// (`original_source/game/journal.go`) one-to-one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum JournalRecord {
    CreateTile {
        center: TileCoord,
        tile_type: TileType,
        fog: bool,
    },
    GenVerticesEdges,
    SetTileType {
        center: TileCoord,
        tile_type: TileType,
        number: u32,
    },
    SetRobber {
        center: TileCoord,
    },
    VertexBuild {
        at: VertexCoord,
        placement: Option<(SeatIndex, BuildableType)>,
        force: bool,
    },
    EdgeBuild {
        at: EdgeCoord,
        placement: Option<(SeatIndex, BuildableType)>,
    },
    CityImprove {
        seat: SeatIndex,
        commodity: CardType,
        level: u32,
    },
    SetKnightActive {
        at: VertexCoord,
        active: bool,
        can_use: bool,
    },
    BuildWall {
        seat: SeatIndex,
        at: VertexCoord,
    },
    BuildMetropolis {
        at: VertexCoord,
        metropolis: bool,
    },
    MerchantFleet {
        commodity: CardType,
    },
    Merchant {
        tile: TileCoord,
        owner: SeatIndex,
    },
    GiveProgress {
        seat: SeatIndex,
        stack: CardType,
    },
    MovePlacement {
        from: VertexCoord,
        to: VertexCoord,
    },
    EndTurn {
        seat: SeatIndex,
    },
    RollDice {
        red: u32,
        white: u32,
    },
    RollEventDice {
        roll: u32,
    },
    SpecialBuild {
        seat: SeatIndex,
        active: bool,
    },
    /// A `MoveCards` transfer (spec.md §4.2); `None` on either side is the
    /// bank. Recorded with both endpoints (rather than a single signed
    /// delta) so replay doesn't have to guess the counterparty of a
    /// player-to-player leg.
    UpdateCard {
        from: Option<SeatIndex>,
        to: Option<SeatIndex>,
        card: CardType,
        qty: i32,
    },
    UpdateResources {
        seat: Option<SeatIndex>,
        delta: [i32; 5],
    },
    UpdateDevelopmentCard {
        seat: Option<SeatIndex>,
        card: DevCardType,
        quantity_delta: i32,
        num_used_delta: i32,
        can_use: bool,
    },
    ReinsertDevelopmentCard {
        stack: CardType,
        card: DevCardType,
    },
    DevelopmentCardOrder {
        stack: Option<CardType>,
        order: Vec<DevCardType>,
    },
    DevelopmentCardCursor {
        stack: Option<CardType>,
        cursor: usize,
    },
    SetPorts {
        ports: Vec<Port>,
    },
    SetInitPhase {
        active: bool,
    },
    SetUsername {
        seat: SeatIndex,
        username: String,
    },
    SetId {
        seat: SeatIndex,
        id: String,
    },
    SetGameSettings {
        cities_and_knights: bool,
        num_players: u8,
    },
    SetAdvancedSettings {
        turn_seconds: u32,
        discard_seconds: u32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub index: u64,
    pub record: JournalRecord,
}

/// Append-only log with batched flush to the `Store` and deterministic replay.
///
/// `playing` suppresses writes while a replay is in progress, same as the
/// original's `j.playing` guard in `Write` — replay must not re-journal the
/// actions it is reconstructing.
pub struct Journal {
    game_id: String,
    index: AtomicU64,
    playing: std::sync::atomic::AtomicBool,
    pending_tx: mpsc::UnboundedSender<JournalEntry>,
    pending_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<JournalEntry>>,
}

impl Journal {
    pub fn new(game_id: impl Into<String>) -> Self {
        let (pending_tx, pending_rx) = mpsc::unbounded_channel();
        Journal {
            game_id: game_id.into(),
            index: AtomicU64::new(0),
            playing: std::sync::atomic::AtomicBool::new(false),
            pending_tx,
            pending_rx: tokio::sync::Mutex::new(pending_rx),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    /// Appends `record` to the pending buffer, unless a replay is in progress.
    pub fn write(&self, record: JournalRecord) {
        if self.is_playing() {
            return;
        }
        let index = self.index.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.pending_tx.send(JournalEntry { index, record });
    }

    /// Drains the pending buffer without awaiting anything, so a caller
    /// holding a synchronous lock on the surrounding `GameState` can call
    /// this and only await the store write after releasing it.
    pub fn drain_pending(&self) -> Vec<JournalEntry> {
        let mut rx = match self.pending_rx.try_lock() {
            Ok(rx) => rx,
            Err(_) => return Vec::new(), // a flush is already in flight
        };
        let mut batch = Vec::new();
        while let Ok(entry) = rx.try_recv() {
            batch.push(entry);
        }
        batch
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// Drains the pending buffer and hands the batch to the store.
    pub async fn flush(&self, store: &dyn Store) -> GameResult<()> {
        let batch = self.drain_pending();
        if batch.is_empty() {
            return Ok(());
        }
        store.write_journal_entries(&self.game_id, &batch).await
    }

    /// Gzip-compresses a batch of entries for the `{state: blob}`
    /// `StoreGameState` document (spec.md §6): JSON stands in for the
    /// original's msgpack, matching this crate's `serde_json` convention
    /// elsewhere, and gzip keeps the blob small the way the teacher's
    /// `long_poller`/`game_container` zlib-encode their payloads.
    pub fn compress_entries(entries: &[JournalEntry]) -> GameResult<Vec<u8>> {
        let json = serde_json::to_vec(entries)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&json)
            .map_err(|e| GameError::Storage(e.to_string()))?;
        encoder.finish().map_err(|e| GameError::Storage(e.to_string()))
    }

    /// Inverse of `compress_entries`, used when rehydrating from a
    /// `StoreGameState` blob instead of the raw per-entry journal.
    pub fn decompress_entries(bytes: &[u8]) -> GameResult<Vec<JournalEntry>> {
        let mut decoder = GzDecoder::new(bytes);
        let mut json = Vec::new();
        decoder
            .read_to_end(&mut json)
            .map_err(|e| GameError::Storage(e.to_string()))?;
        Ok(serde_json::from_slice(&json)?)
    }

    /// Replays every entry from the store in index order, calling `apply`
    /// for each. Rejects on an index gap the same way the original logs and
    /// bails on `e.Index != i+1`.
    pub async fn play<F>(&self, store: &dyn Store, mut apply: F) -> GameResult<()>
    where
        F: FnMut(&JournalRecord),
    {
        self.playing.store(true, Ordering::SeqCst);
        let result = self.play_inner(store, &mut apply).await;
        self.playing.store(false, Ordering::SeqCst);
        result
    }

    async fn play_inner<F>(&self, store: &dyn Store, apply: &mut F) -> GameResult<()>
    where
        F: FnMut(&JournalRecord),
    {
        let mut entries = store.read_journal(&self.game_id).await?;
        entries.sort_by_key(|e| e.index);

        for (i, entry) in entries.iter().enumerate() {
            if entry.index != (i + 1) as u64 {
                return Err(GameError::JournalGap(entry.index));
            }
            apply(&entry.record);
            self.index.store(entry.index, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    #[tokio::test]
    async fn write_then_flush_round_trips_through_the_store() {
        let journal = Journal::new("g1");
        journal.write(JournalRecord::EndTurn { seat: 0 });
        journal.write(JournalRecord::RollDice { red: 3, white: 4 });

        let store = InMemoryStore::new();
        journal.flush(&store).await.unwrap();

        let mut seen = Vec::new();
        journal.play(&store, |r| seen.push(format!("{:?}", r))).await.unwrap();
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn compress_then_decompress_round_trips() {
        let entries = vec![
            JournalEntry { index: 1, record: JournalRecord::EndTurn { seat: 0 } },
            JournalEntry { index: 2, record: JournalRecord::RollDice { red: 3, white: 4 } },
        ];
        let blob = Journal::compress_entries(&entries).unwrap();
        let decoded = Journal::decompress_entries(&blob).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].index, 1);
        assert_eq!(decoded[1].index, 2);
    }

    #[test]
    fn write_is_suppressed_while_playing() {
        let journal = Journal::new("g1");
        journal.playing.store(true, Ordering::SeqCst);
        journal.write(JournalRecord::EndTurn { seat: 0 });
        assert_eq!(journal.index.load(Ordering::SeqCst), 0);
    }
}
