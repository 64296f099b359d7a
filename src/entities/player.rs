#![allow(dead_code)]
//! Player entity. Grounded on `games_service/player/player.rs` for field
//! shape and `original_source/entities/player.go` for behavior
//! (`BuildAtVertex`/`CanBuild`/atomics for `IsBot`/`InactiveSeconds`).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::board::coordinate::{EdgeCoord, VertexCoord};
use crate::entities::buildable::{BuildableId, BuildableType, RoadBuildable, SeatIndex, VertexBuildable};
use crate::entities::hand::Hand;
use crate::interaction::ActionDescriptor;

const SEAT_COLORS: [&str; 6] = [
    "#ff0000", "#00ff00", "#0000ff", "#ffff00", "#fc41ec", "#26eded",
];

pub fn seat_color(order: SeatIndex) -> &'static str {
    SEAT_COLORS
        .get(order as usize)
        .copied()
        .unwrap_or(SEAT_COLORS[0])
}

/// The reply a client (or the bot driver, or the timeout injector) sends
/// back to a suspended `BlockForAction` call (spec.md §4.5). `None` models
/// an explicit cancel or a clock timeout.
pub type ActionReply = Option<serde_json::Value>;

#[derive(Debug)]
pub struct PendingAction {
    pub descriptor: ActionDescriptor,
    /// Completes the suspended `BlockForAction` call with the player's reply.
    pub responder: oneshot::Sender<ActionReply>,
}

#[derive(Debug)]
pub struct Player {
    pub id: String,
    pub display_name: String,
    pub order: SeatIndex,
    pub color: &'static str,

    pub hand: Hand,
    pub vertex_placements: HashMap<u64, VertexBuildable>,
    pub edge_placements: HashMap<u64, RoadBuildable>,
    next_placement_id: u64,

    pub buildables_left: HashMap<BuildableType, u32>,
    /// C&K improvement levels 0..=5 per commodity.
    pub improvements: HashMap<crate::entities::hand::CardType, u32>,
    /// Per-opponent outstanding embargo (true = embargoed).
    pub embargos: Vec<bool>,

    pub time_left: u32,
    pub special_build: bool,
    pub is_bot: AtomicBool,
    pub inactive_seconds: AtomicU32,
    pub is_spectator: bool,

    pub good_rolls: u32,
    pub bad_rolls: u32,

    pub pending_action: Option<PendingAction>,
}

impl Player {
    pub fn new(id: &str, display_name: &str, order: SeatIndex, num_players: usize, cities_and_knights: bool) -> Self {
        let mut buildables_left = HashMap::new();
        buildables_left.insert(BuildableType::Settlement, 5);
        buildables_left.insert(BuildableType::City, 4);
        buildables_left.insert(BuildableType::Road, 15);
        if cities_and_knights {
            buildables_left.insert(BuildableType::Knight, 6);
            buildables_left.insert(BuildableType::Wall, 3);
        }

        let mut improvements = HashMap::new();
        improvements.insert(crate::entities::hand::CardType::Paper, 0);
        improvements.insert(crate::entities::hand::CardType::Cloth, 0);
        improvements.insert(crate::entities::hand::CardType::Coin, 0);

        Player {
            id: id.to_string(),
            display_name: display_name.to_string(),
            order,
            color: seat_color(order),
            hand: Hand::new(),
            vertex_placements: HashMap::new(),
            edge_placements: HashMap::new(),
            next_placement_id: 0,
            buildables_left,
            improvements,
            embargos: vec![false; num_players],
            time_left: 0,
            special_build: false,
            is_bot: AtomicBool::new(false),
            inactive_seconds: AtomicU32::new(0),
            is_spectator: false,
            good_rolls: 0,
            bad_rolls: 0,
            pending_action: None,
        }
    }

    pub fn next_id(&mut self) -> BuildableId {
        let id = self.next_placement_id;
        self.next_placement_id += 1;
        BuildableId { owner: self.order, id }
    }

    pub fn buildables_left(&self, t: BuildableType) -> u32 {
        *self.buildables_left.get(&t).unwrap_or(&0)
    }

    pub fn consume_buildable(&mut self, t: BuildableType) -> bool {
        match self.buildables_left.get_mut(&t) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn return_buildable(&mut self, t: BuildableType) {
        *self.buildables_left.entry(t).or_insert(0) += 1;
    }

    pub fn add_vertex_placement(&mut self, piece: VertexBuildable) {
        self.vertex_placements.insert(piece.id().id, piece);
    }

    pub fn remove_vertex_placement(&mut self, id: u64) -> Option<VertexBuildable> {
        self.vertex_placements.remove(&id)
    }

    pub fn add_edge_placement(&mut self, piece: RoadBuildable) {
        self.edge_placements.insert(piece.id.id, piece);
    }

    pub fn remove_edge_placement(&mut self, id: u64) -> Option<RoadBuildable> {
        self.edge_placements.remove(&id)
    }

    pub fn settlements_and_cities(&self) -> impl Iterator<Item = &VertexBuildable> {
        self.vertex_placements
            .values()
            .filter(|v| matches!(v.kind(), BuildableType::Settlement | BuildableType::City))
    }

    pub fn knights(&self) -> impl Iterator<Item = &VertexBuildable> {
        self.vertex_placements
            .values()
            .filter(|v| matches!(v.kind(), BuildableType::Knight))
    }

    pub fn owned_vertices(&self) -> Vec<VertexCoord> {
        self.vertex_placements.values().map(|v| v.at()).collect()
    }

    pub fn owned_edges(&self) -> Vec<EdgeCoord> {
        self.edge_placements.values().map(|e| e.at).collect()
    }

    /// Piece-based VP only; the metropolis +2 bonus lives in
    /// `ExtraVictoryPoints::vp_for_seat` alongside longest-road/largest-army
    /// so it isn't counted twice (`GameState::public_victory_points` sums both).
    pub fn public_victory_points(&self) -> u32 {
        self.vertex_placements
            .values()
            .map(|v| match v {
                VertexBuildable::Settlement { .. } => 1,
                VertexBuildable::City { .. } => 2,
                VertexBuildable::Knight { .. } => 0,
            })
            .sum()
    }

    pub fn get_is_bot(&self) -> bool {
        self.is_bot.load(Ordering::SeqCst)
    }

    pub fn set_is_bot(&self, val: bool) {
        self.is_bot.store(val, Ordering::SeqCst);
    }

    pub fn reset_inactivity(&self) {
        self.inactive_seconds.store(0, Ordering::SeqCst);
        self.set_is_bot(false);
    }

    pub fn bump_inactivity(&self) -> u32 {
        self.inactive_seconds.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn has_pending_action(&self) -> bool {
        self.pending_action.is_some()
    }

    pub fn clear_pending_action(&mut self) -> Option<PendingAction> {
        self.pending_action.take()
    }
}
