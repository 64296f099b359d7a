#![allow(dead_code)]
//! The engine's aggregate state. Grounded on `original_source/game/game.go`'s
//! `Game` struct, split (like the original's package-wide `Game` methods
//! spread across `game/*.go` files) into one `impl GameState` block per
//! operational concern (`build.rs`, `dice.rs`, `trade.rs`, ...).
//!
//! Engine operations are synchronous and take any player choice they need
//! as an already-resolved parameter — obtaining that choice by suspending
//! on a prompt is `session.rs`'s job (spec.md §4.5/§5). This keeps the
//! rules engine runtime-agnostic and directly testable.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::board::graph::Graph;
use crate::board::map_definition::MapDefinition;
use crate::entities::bank::Bank;
use crate::entities::buildable::SeatIndex;
use crate::entities::extra_vp::ExtraVictoryPoints;
use crate::entities::hand::CardType;
use crate::entities::player::Player;
use crate::entities::trade_offer::{OfferCounter, TradeOffer};
use crate::journal::{Journal, JournalRecord};

pub struct GameState {
    pub id: String,
    pub cities_and_knights: bool,
    pub graph: Graph,
    pub players: Vec<Player>,
    pub bank: Bank,
    pub extra_vp: ExtraVictoryPoints,
    pub journal: Journal,

    pub current_player: SeatIndex,
    pub dice_rolled: bool,
    pub last_roll: Option<(u32, u32)>,
    pub last_event_roll: Option<u32>,

    pub init_phase: bool,
    /// Vertex of the most recently placed init-phase settlement still
    /// awaiting its free adjacent road, if any.
    pub init_settlement_needing_road: Option<crate::board::coordinate::VertexCoord>,
    pub special_build_active: bool,
    /// Remaining seats in the special-build ring, consumed front-to-back.
    pub special_build_queue: Vec<SeatIndex>,

    pub trade_offers: Vec<TradeOffer>,
    pub offer_counter: OfferCounter,

    /// C&K merchant piece: tile it sits on and the owner who placed it.
    pub merchant: Option<(crate::board::coordinate::TileCoord, SeatIndex)>,
    /// C&K Merchant Fleet: per-seat 2:1 override for one card type, this turn only.
    pub merchant_fleet: HashMap<SeatIndex, CardType>,

    pub barbarian_position: u32,
    pub num_barbarian_attacks: u32,

    pub base_discard_limit: u32,

    pub(crate) rng: StdRng,
    pub initialized: bool,
}

impl GameState {
    pub fn new(
        id: impl Into<String>,
        defn: &MapDefinition,
        player_names: &[(String, String)],
        cities_and_knights: bool,
        base_discard_limit: u32,
        seed: u64,
    ) -> Self {
        let id = id.into();
        let mut rng = StdRng::seed_from_u64(seed);
        let graph = Graph::generate(defn, &mut rng);
        let bank = Bank::new(cities_and_knights, &mut rng);

        let num_players = player_names.len();
        let players = player_names
            .iter()
            .enumerate()
            .map(|(i, (id, name))| Player::new(id, name, i as SeatIndex, num_players, cities_and_knights))
            .collect();

        let state = GameState {
            journal: Journal::new(id.clone()),
            id,
            cities_and_knights,
            graph,
            players,
            bank,
            extra_vp: ExtraVictoryPoints::new(),
            current_player: 0,
            dice_rolled: false,
            last_roll: None,
            last_event_roll: None,
            init_phase: true,
            init_settlement_needing_road: None,
            special_build_active: false,
            special_build_queue: Vec::new(),
            trade_offers: Vec::new(),
            offer_counter: OfferCounter::default(),
            merchant: None,
            merchant_fleet: HashMap::new(),
            barbarian_position: 7,
            num_barbarian_attacks: 0,
            base_discard_limit,
            rng,
            initialized: true,
        };
        state.journal_initial_state(num_players as u8);
        state
    }

    /// Starting point for reconstructing a game from its journal alone: an
    /// empty board and a bank with empty dev-card orders, both filled in as
    /// `apply_journal_record` walks the `CreateTile`/`SetPorts`/
    /// `DevelopmentCardOrder`/... records a live `new()` wrote (spec.md
    /// §4.7). The roster is supplied by the caller (from the store's player
    /// records) rather than rediscovered from the journal.
    pub fn new_for_replay(
        id: impl Into<String>,
        player_names: &[(String, String)],
        cities_and_knights: bool,
        base_discard_limit: u32,
    ) -> Self {
        let id = id.into();
        let num_players = player_names.len();
        let players = player_names
            .iter()
            .enumerate()
            .map(|(i, (pid, name))| Player::new(pid, name, i as SeatIndex, num_players, cities_and_knights))
            .collect();

        GameState {
            journal: Journal::new(id.clone()),
            id,
            cities_and_knights,
            graph: Graph::empty(),
            players,
            bank: Bank::new_for_replay(cities_and_knights),
            extra_vp: ExtraVictoryPoints::new(),
            current_player: 0,
            dice_rolled: false,
            last_roll: None,
            last_event_roll: None,
            init_phase: true,
            init_settlement_needing_road: None,
            special_build_active: false,
            special_build_queue: Vec::new(),
            trade_offers: Vec::new(),
            offer_counter: OfferCounter::default(),
            merchant: None,
            merchant_fleet: HashMap::new(),
            barbarian_position: 7,
            num_barbarian_attacks: 0,
            base_discard_limit,
            rng: StdRng::seed_from_u64(0),
            initialized: false,
        }
    }

    /// Journals the board/bank facts a fresh `new()` just produced, so a
    /// from-scratch replay never has to re-run the generation RNG (spec.md
    /// §4.7's requirement that the journal alone reconstruct a game).
    fn journal_initial_state(&self, num_players: u8) {
        let mut centers: Vec<_> = self.graph.tiles.keys().copied().collect();
        centers.sort_by_key(|c| (c.x, c.y));
        for center in &centers {
            let tile = &self.graph.tiles[center];
            self.journal.write(JournalRecord::CreateTile {
                center: *center,
                tile_type: tile.tile_type,
                fog: tile.fog,
            });
        }
        self.journal.write(JournalRecord::GenVerticesEdges);
        for center in &centers {
            let tile = &self.graph.tiles[center];
            if tile.number != 0 {
                self.journal.write(JournalRecord::SetTileType {
                    center: *center,
                    tile_type: tile.tile_type,
                    number: tile.number,
                });
            }
        }
        self.journal.write(JournalRecord::SetPorts {
            ports: self.graph.ports.clone(),
        });
        self.journal.write(JournalRecord::SetRobber { center: self.graph.robber });
        self.journal.write(JournalRecord::SetGameSettings {
            cities_and_knights: self.cities_and_knights,
            num_players,
        });

        if !self.bank.base_dev_card_order.is_empty() {
            self.journal.write(JournalRecord::DevelopmentCardOrder {
                stack: None,
                order: self.bank.base_dev_card_order.clone(),
            });
        }
        for (stack, order) in [
            (CardType::Paper, &self.bank.paper_order),
            (CardType::Cloth, &self.bank.cloth_order),
            (CardType::Coin, &self.bank.coin_order),
        ] {
            if !order.is_empty() {
                self.journal.write(JournalRecord::DevelopmentCardOrder {
                    stack: Some(stack),
                    order: order.clone(),
                });
            }
        }
    }

    pub fn player(&self, seat: SeatIndex) -> &Player {
        &self.players[seat as usize]
    }

    pub fn player_mut(&mut self, seat: SeatIndex) -> &mut Player {
        &mut self.players[seat as usize]
    }

    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    /// Discard limit for a player: base (default 7) plus 2 per wall in C&K.
    pub fn discard_limit(&self, seat: SeatIndex) -> u32 {
        let walls = if self.cities_and_knights {
            self.player(seat)
                .settlements_and_cities()
                .filter(|v| matches!(v, crate::entities::buildable::VertexBuildable::City { wall: true, .. }))
                .count() as u32
        } else {
            0
        };
        self.base_discard_limit + walls * 2
    }

    /// VP visible to opponents: pieces, longest road/largest army, C&K
    /// defender/metropolis/constitution/printer, and the merchant owner's
    /// point. Excludes Victory Point cards sitting unplayed in hand.
    pub fn public_victory_points(&self, seat: SeatIndex) -> u32 {
        let mut vp = self.player(seat).public_victory_points() + self.extra_vp.vp_for_seat(seat);
        if self.cities_and_knights && self.merchant.map(|(_, owner)| owner) == Some(seat) {
            vp += 1;
        }
        vp
    }

    /// Total VP including hidden Victory Point cards, the only correct
    /// quantity to check for a win (`original_source/game/state.go`'s
    /// `GetVictoryPoints(p, false)`).
    pub fn total_victory_points(&self, seat: SeatIndex) -> u32 {
        let hidden = self
            .player(seat)
            .hand
            .dev_deck(crate::entities::hand::DevCardType::VictoryPoint)
            .quantity
            .max(0) as u32;
        self.public_victory_points(seat) + hidden
    }

    pub fn winner(&self) -> Option<SeatIndex> {
        self.players
            .iter()
            .find(|p| self.total_victory_points(p.order) >= 10)
            .map(|p| p.order)
    }
}
