//! `catan-replay`: rehydrates a session from a journal dump and prints a
//! summary of the resulting state, exercising spec.md §4.7/S5 ("after a
//! 200-move game, terminate and replay from the journal... state is
//! structurally identical to the pre-termination snapshot") as a
//! standalone tool rather than only as a test assertion.
//!
//! Input is a single JSON file — `{ players, settings, journal }` — the
//! same three records `Store::read_game_players`/`read_game_settings`/
//! `read_journal` would hand back; a real deployment's `catan-replay`
//! would instead point this at its production `Store` implementation,
//! but the shape of the work (load, replay, report) is identical.

use std::fs;

use anyhow::{Context, Result};
use catan_core::journal::JournalEntry;
use catan_core::store::memory::InMemoryStore;
use catan_core::store::{GamePlayerRecord, GameSettingsRecord, Store};
use clap::Parser;
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "catan-replay", about = "Replay a Catan session journal and print the resulting state")]
struct Args {
    /// Path to a JSON dump of `{ players, settings, journal }`.
    input: String,

    /// Game id to use when loading into the scratch store (defaults to the file stem).
    #[arg(long)]
    game_id: Option<String>,
}

#[derive(Deserialize)]
struct ReplayBundle {
    players: Vec<GamePlayerRecord>,
    settings: GameSettingsRecord,
    journal: Vec<JournalEntry>,
}

#[tokio::main]
async fn main() -> Result<()> {
    catan_core::config::init_logging();
    let args = Args::parse();

    let game_id = args.game_id.clone().unwrap_or_else(|| {
        std::path::Path::new(&args.input)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "replay".to_string())
    });

    let contents = fs::read_to_string(&args.input).with_context(|| format!("failed to read {}", args.input))?;
    let bundle: ReplayBundle =
        serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", args.input))?;

    let store = InMemoryStore::new();
    store
        .write_game_players(&game_id, &bundle.players)
        .await
        .context("failed to seed player roster")?;
    store
        .write_game_settings(&game_id, &bundle.settings)
        .await
        .context("failed to seed settings")?;
    store
        .write_journal_entries(&game_id, &bundle.journal)
        .await
        .context("failed to seed journal")?;

    let state = catan_core::engine::replay::load_from_store(&game_id, &store)
        .await
        .context("replay failed")?;

    println!("replayed {} journal entries for game {:?}", bundle.journal.len(), game_id);
    println!("current player: seat {}", state.current_player);
    println!("init phase: {}", state.init_phase);
    println!("barbarian position: {}", state.barbarian_position);
    for seat in 0..state.num_players() as u8 {
        let player = state.player(seat);
        println!(
            "  seat {} ({}): {} public VP, {} total VP, {} cards in hand",
            seat,
            player.display_name,
            state.public_victory_points(seat),
            state.total_victory_points(seat),
            player.hand.total_cards(),
        );
    }
    if let Some(winner) = state.winner() {
        println!("winner: seat {}", winner);
    }

    Ok(())
}
