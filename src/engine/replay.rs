#![allow(dead_code)]
//! Deterministic replay: applies a previously-journaled record directly to
//! state, instead of re-running the validated, possibly RNG-consuming
//! operation that first produced it (spec.md §4.7). Grounded on
//! `original_source/game/journal.go`'s `Play` dispatch switch — one arm per
//! record kind, mirroring the `Write` call sites in `build.rs`/`dice.rs`/
//! `trade.rs`/`actions.rs`/`turn.rs`.
//!
//! `VertexBuild`/`EdgeBuild` are deliberately generic: several distinct
//! operations (settlement build, city upgrade, knight build/upgrade,
//! progress-card displacement) all funnel through the same low-level
//! record, so replay reconstructs the placement from the record's fields
//! rather than calling back into whichever high-level method wrote it.

use crate::board::coordinate::{EdgeCoord, VertexCoord};
use crate::board::tile::Tile;
use crate::entities::bank::Bank;
use crate::entities::buildable::{BuildableType, KnightLevel, RoadBuildable, SeatIndex, VertexBuildable};
use crate::entities::extra_vp::ExtraVictoryPoints;
use crate::error::GameResult;
use crate::journal::JournalRecord;
use crate::store::Store;

use super::state::GameState;

/// Rebuilds a `GameState` from nothing but what's in the store: the
/// player roster, the settings snapshot (needed up front to size each
/// player's starting C&K piece pools) and the journal itself. This is
/// `catan-replay`'s entry point and the disaster-recovery path a crashed
/// session's restart would use (spec.md §4.7/§6).
pub async fn load_from_store(game_id: &str, store: &dyn Store) -> GameResult<GameState> {
    let mut players = store.read_game_players(game_id).await?;
    players.sort_by_key(|p| p.order);
    let settings = store.read_game_settings(game_id).await?;

    let names: Vec<(String, String)> = players
        .iter()
        .map(|p| (p.id.clone(), p.display_name.clone()))
        .collect();

    let mut state = GameState::new_for_replay(
        game_id,
        &names,
        settings.cities_and_knights,
        crate::config::ENGINE_CONFIG.base_discard_limit,
    );

    let journal = std::mem::replace(&mut state.journal, crate::journal::Journal::new(game_id.to_string()));
    journal
        .play(store, |record| state.apply_journal_record(record))
        .await?;
    state.journal = journal;
    state.initialized = true;
    Ok(state)
}

impl GameState {
    /// Applies one entry from the journal. Called with `self.journal`
    /// already in its `playing` state (see `Journal::play`), so any
    /// `journal.write` this reaches transitively is a no-op — the record
    /// being applied here is that write's own echo.
    pub fn apply_journal_record(&mut self, record: &JournalRecord) {
        match record.clone() {
            JournalRecord::CreateTile { center, tile_type, fog } => {
                let mut tile = Tile::new(center, tile_type, 0);
                tile.fog = fog;
                self.graph.insert_tile(tile);
            }
            JournalRecord::GenVerticesEdges => self.graph.finalize_vertices_edges(),
            JournalRecord::SetTileType { center, tile_type, number } => {
                self.graph.set_tile_type(center, tile_type, number);
            }
            JournalRecord::SetRobber { center } => self.graph.set_robber(center),
            JournalRecord::SetPorts { ports } => self.graph.set_ports(ports),
            JournalRecord::VertexBuild { at, placement, .. } => self.replay_vertex_build(at, placement),
            JournalRecord::EdgeBuild { at, placement } => self.replay_edge_build(at, placement),
            JournalRecord::BuildWall { seat, at } => self.replay_build_wall(seat, at),
            JournalRecord::BuildMetropolis { at, metropolis } => self.replay_set_metropolis(at, metropolis),
            JournalRecord::CityImprove { seat, commodity, level } => {
                self.player_mut(seat).improvements.insert(commodity, level);
            }
            JournalRecord::SetKnightActive { at, active, can_use } => {
                self.replay_set_knight_active(at, active, can_use);
            }
            JournalRecord::MerchantFleet { commodity } => {
                let seat = self.current_player;
                self.merchant_fleet.insert(seat, commodity);
            }
            JournalRecord::Merchant { tile, owner } => self.merchant = Some((tile, owner)),
            JournalRecord::GiveProgress { seat, stack } => {
                if let Some(card) = self.bank.draw_progress_card(stack) {
                    self.player_mut(seat).hand.add_dev_card(card, false);
                }
            }
            JournalRecord::MovePlacement { from, to } => self.replay_move_placement(from, to),
            JournalRecord::EndTurn { seat } => self.replay_end_turn(seat),
            JournalRecord::RollDice { red, white } => {
                self.dice_rolled = true;
                self.last_roll = Some((red, white));
            }
            JournalRecord::RollEventDice { roll } => self.last_event_roll = Some(roll),
            JournalRecord::SpecialBuild { seat, active } => self.replay_special_build(seat, active),
            JournalRecord::UpdateCard { from, to, card, qty } => {
                match from {
                    Some(seat) => {
                        self.player_mut(seat).hand.try_remove(card, qty);
                    }
                    None => {
                        self.bank.hand.try_remove(card, qty);
                    }
                }
                match to {
                    Some(seat) => self.player_mut(seat).hand.add(card, qty),
                    None => self.bank.hand.add(card, qty),
                }
            }
            JournalRecord::UpdateResources { seat, delta } => self.replay_update_resources(seat, delta),
            JournalRecord::UpdateDevelopmentCard {
                seat,
                card,
                quantity_delta,
                num_used_delta: _,
                can_use,
            } => self.replay_update_dev_card(seat, card, quantity_delta, can_use),
            JournalRecord::ReinsertDevelopmentCard { stack, card } => {
                // The record doesn't carry which seat's hand lost the card
                // (spec.md §4.7's record shape), so replay can only restore
                // the bank-side deck; a documented simplification, noted in
                // DESIGN.md alongside the other replay gaps.
                self.bank.reinsert_progress_card(stack, card);
            }
            JournalRecord::DevelopmentCardOrder { stack, order } => match stack {
                None => self.bank.base_dev_card_order = order,
                Some(crate::entities::hand::CardType::Paper) => self.bank.paper_order = order,
                Some(crate::entities::hand::CardType::Cloth) => self.bank.cloth_order = order,
                Some(crate::entities::hand::CardType::Coin) => self.bank.coin_order = order,
                Some(_) => {}
            },
            JournalRecord::DevelopmentCardCursor { stack, cursor } => match stack {
                None => self.bank.base_dev_card_cursor = cursor,
                Some(crate::entities::hand::CardType::Paper) => self.bank.paper_cursor = cursor,
                Some(crate::entities::hand::CardType::Cloth) => self.bank.cloth_cursor = cursor,
                Some(crate::entities::hand::CardType::Coin) => self.bank.coin_cursor = cursor,
                Some(_) => {}
            },
            JournalRecord::SetInitPhase { active } => self.init_phase = active,
            JournalRecord::SetUsername { seat, username } => {
                self.player_mut(seat).display_name = username;
            }
            JournalRecord::SetId { seat, id } => self.player_mut(seat).id = id,
            JournalRecord::SetGameSettings { cities_and_knights, .. } => {
                self.cities_and_knights = cities_and_knights;
                self.bank = Bank::new_for_replay(cities_and_knights);
                self.extra_vp = ExtraVictoryPoints::new();
                // `new_for_replay` seeds every player's buildables before this
                // record is known, back-filling the C&K-only piece pools here
                // mirrors `Player::new`'s own seeding for that case.
                if cities_and_knights {
                    for player in &mut self.players {
                        player.buildables_left.entry(BuildableType::Knight).or_insert(6);
                        player.buildables_left.entry(BuildableType::Wall).or_insert(3);
                    }
                }
            }
            JournalRecord::SetAdvancedSettings { .. } => {}
        }
    }

    fn replay_vertex_build(&mut self, at: VertexCoord, placement: Option<(SeatIndex, BuildableType)>) {
        if placement.is_none() {
            if let Some(id) = self.graph.vertices.get(&at).and_then(|v| v.placement) {
                self.player_mut(id.owner).remove_vertex_placement(id.id);
                if let Some(v) = self.graph.vertices.get_mut(&at) {
                    v.placement = None;
                }
            }
            return;
        }
        let (seat, kind) = placement.unwrap();

        match kind {
            BuildableType::Settlement => {
                let id = self.player_mut(seat).next_id();
                self.graph.vertices.entry(at).or_default().placement = Some(id);
                self.player_mut(seat).add_vertex_placement(VertexBuildable::Settlement { id, at });
                self.player_mut(seat).consume_buildable(BuildableType::Settlement);
            }
            BuildableType::City => {
                let prior_settlement = self
                    .player(seat)
                    .vertex_placements
                    .values()
                    .find(|p| p.at() == at && p.kind() == BuildableType::Settlement)
                    .map(|p| p.id().id);
                if let Some(old_id) = prior_settlement {
                    self.player_mut(seat).remove_vertex_placement(old_id);
                    self.player_mut(seat).return_buildable(BuildableType::Settlement);
                }
                let id = self.player_mut(seat).next_id();
                self.graph.vertices.entry(at).or_default().placement = Some(id);
                self.player_mut(seat).add_vertex_placement(VertexBuildable::City {
                    id,
                    at,
                    wall: false,
                    metropolis: false,
                });
                self.player_mut(seat).consume_buildable(BuildableType::City);
            }
            BuildableType::Knight => {
                let existing = self.graph.vertices.get(&at).and_then(|v| v.placement);
                let upgrade_from = match existing {
                    Some(id) if id.owner == seat => {
                        match self.player(seat).vertex_placements.get(&id.id) {
                            Some(VertexBuildable::Knight { level, activated, can_use, .. }) => {
                                Some((*level, *activated, *can_use))
                            }
                            _ => None,
                        }
                    }
                    _ => None,
                };
                let (level, activated, can_use) = match upgrade_from {
                    Some((level, activated, can_use)) => {
                        self.player_mut(seat).remove_vertex_placement(existing.unwrap().id);
                        (level.upgrade().unwrap_or(level), activated, can_use)
                    }
                    None => (KnightLevel::Basic, false, false),
                };
                let id = self.player_mut(seat).next_id();
                self.graph.vertices.entry(at).or_default().placement = Some(id);
                self.player_mut(seat).add_vertex_placement(VertexBuildable::Knight {
                    id,
                    at,
                    level,
                    activated,
                    can_use,
                });
                if upgrade_from.is_none() {
                    self.player_mut(seat).consume_buildable(BuildableType::Knight);
                }
            }
            BuildableType::Road | BuildableType::Wall => {}
        }
    }

    fn replay_edge_build(&mut self, at: EdgeCoord, placement: Option<(SeatIndex, BuildableType)>) {
        match placement {
            None => {
                if let Some(id) = self.graph.edges.get(&at).and_then(|e| e.placement) {
                    self.player_mut(id.owner).remove_edge_placement(id.id);
                    if let Some(e) = self.graph.edges.get_mut(&at) {
                        e.placement = None;
                    }
                }
            }
            Some((seat, _)) => {
                let id = self.player_mut(seat).next_id();
                if let Some(e) = self.graph.edges.get_mut(&at) {
                    e.placement = Some(id);
                }
                self.player_mut(seat).add_edge_placement(RoadBuildable { id, at });
                self.player_mut(seat).consume_buildable(BuildableType::Road);
            }
        }
    }

    fn replay_build_wall(&mut self, seat: SeatIndex, at: VertexCoord) {
        if let Some(id) = self.graph.vertices.get(&at).and_then(|v| v.placement) {
            if let Some(VertexBuildable::City { wall, .. }) = self.player_mut(id.owner).vertex_placements.get_mut(&id.id) {
                *wall = true;
            }
        }
        self.player_mut(seat).consume_buildable(BuildableType::Wall);
    }

    fn replay_set_metropolis(&mut self, at: VertexCoord, metropolis: bool) {
        if let Some(id) = self.graph.vertices.get(&at).and_then(|v| v.placement) {
            if let Some(VertexBuildable::City { metropolis: m, .. }) =
                self.player_mut(id.owner).vertex_placements.get_mut(&id.id)
            {
                *m = metropolis;
            }
        }
    }

    fn replay_set_knight_active(&mut self, at: VertexCoord, active: bool, can_use: bool) {
        if let Some(id) = self.graph.vertices.get(&at).and_then(|v| v.placement) {
            if let Some(VertexBuildable::Knight { activated, can_use: cu, .. }) =
                self.player_mut(id.owner).vertex_placements.get_mut(&id.id)
            {
                *activated = active;
                *cu = can_use;
            }
        }
    }

    fn replay_move_placement(&mut self, from: VertexCoord, to: VertexCoord) {
        let Some(id) = self.graph.vertices.get(&from).and_then(|v| v.placement) else {
            return;
        };
        if let Some(v) = self.graph.vertices.get_mut(&from) {
            v.placement = None;
        }
        self.graph.vertices.entry(to).or_default().placement = Some(id);
        if let Some(piece) = self.player_mut(id.owner).vertex_placements.get_mut(&id.id) {
            match piece {
                VertexBuildable::Settlement { at, .. }
                | VertexBuildable::City { at, .. }
                | VertexBuildable::Knight { at, .. } => *at = to,
            }
        }
    }

    /// Mirrors `turn::end_turn`'s state transition without its validation
    /// (already passed the first time this was journaled) or its forced
    /// discard (separately reconstructed from `ReinsertDevelopmentCard`
    /// entries, so re-running it here would double the effect).
    fn replay_end_turn(&mut self, seat: SeatIndex) {
        self.trade_offers.clear();
        let num_players = self.num_players() as SeatIndex;
        let entering_special_build = if self.special_build_active {
            self.advance_special_build_ring(seat, num_players)
        } else {
            self.current_player = (seat + 1) % num_players;
            false
        };
        if !entering_special_build {
            self.dice_rolled = false;
            self.end_turn_reset_development_cards();
        }
    }

    fn replay_special_build(&mut self, seat: SeatIndex, active: bool) {
        self.player_mut(seat).special_build = active;
        if active {
            self.special_build_active = true;
            if !self.special_build_queue.contains(&seat) {
                self.special_build_queue.push(seat);
            }
        } else {
            self.special_build_queue.retain(|&s| s != seat);
        }
    }

    fn replay_update_resources(&mut self, seat: Option<SeatIndex>, delta: [i32; 5]) {
        use crate::entities::hand::CardType::*;
        for (t, amt) in [Wood, Brick, Wool, Wheat, Ore].into_iter().zip(delta) {
            if amt == 0 {
                continue;
            }
            let hand = match seat {
                Some(s) => &mut self.player_mut(s).hand,
                None => &mut self.bank.hand,
            };
            if amt > 0 {
                hand.add(t, amt);
            } else {
                hand.try_remove(t, -amt);
            }
        }
    }

    fn replay_update_dev_card(
        &mut self,
        seat: Option<SeatIndex>,
        card: crate::entities::hand::DevCardType,
        quantity_delta: i32,
        can_use: bool,
    ) {
        let Some(seat) = seat else { return };
        let hand = &mut self.player_mut(seat).hand;
        match quantity_delta.cmp(&0) {
            std::cmp::Ordering::Greater => {
                for _ in 0..quantity_delta {
                    hand.add_dev_card(card, can_use);
                }
            }
            std::cmp::Ordering::Less => {
                for _ in 0..(-quantity_delta) {
                    hand.try_remove_dev_card(card);
                }
            }
            std::cmp::Ordering::Equal => hand.set_dev_can_use(card, can_use),
        }
    }
}
