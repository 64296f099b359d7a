#![allow(dead_code)]
//! Build/buy operations (spec.md §4.3): settlement, city, road, knight,
//! wall, and Base development-card purchase. Grounded on
//! `original_source/game/actions.go` (`BuildSettlement`/`BuildCity`/
//! `BuildRoad`/`BuildKnight`/`ActivateKnight`/`BuildWall`/
//! `BuyDevelopmentCard`) for validation order and effects.

use std::collections::HashSet;

use crate::board::coordinate::{EdgeCoord, VertexCoord};
use crate::entities::buildable::{BuildableId, BuildableType, KnightLevel, RoadBuildable, SeatIndex, VertexBuildable};
use crate::entities::hand::{CardType, DevCardType};
use crate::error::{GameError, GameResult};
use crate::journal::JournalRecord;

use super::state::GameState;

pub(crate) const SETTLEMENT_COST: [(CardType, i32); 4] = [
    (CardType::Wood, 1),
    (CardType::Brick, 1),
    (CardType::Wool, 1),
    (CardType::Wheat, 1),
];
pub(crate) const CITY_COST: [(CardType, i32); 2] = [(CardType::Wheat, 2), (CardType::Ore, 3)];
pub(crate) const ROAD_COST: [(CardType, i32); 2] = [(CardType::Wood, 1), (CardType::Brick, 1)];
pub(crate) const KNIGHT_COST: [(CardType, i32); 2] = [(CardType::Wool, 1), (CardType::Ore, 1)];
pub(crate) const WALL_COST: [(CardType, i32); 1] = [(CardType::Brick, 2)];
pub(crate) const DEV_CARD_COST: [(CardType, i32); 3] =
    [(CardType::Wool, 1), (CardType::Wheat, 1), (CardType::Ore, 1)];

impl GameState {
    fn vertex_occupied(&self, v: VertexCoord) -> bool {
        self.graph.vertices.get(&v).map(|x| x.placement.is_some()).unwrap_or(false)
    }

    fn vertex_owner(&self, v: VertexCoord) -> Option<BuildableId> {
        self.graph.vertices.get(&v).and_then(|x| x.placement)
    }

    fn adjacent_to_fog(&self, v: VertexCoord) -> bool {
        self.graph
            .tiles_touching_vertex(v)
            .iter()
            .any(|t| self.graph.tiles.get(t).map(|tile| tile.fog).unwrap_or(false))
    }

    fn no_adjacent_occupied(&self, v: VertexCoord) -> bool {
        !v.adjacent().iter().any(|&n| self.vertex_occupied(n))
    }

    /// Legal settlement locations. `init` skips the "must connect to an
    /// owned road" requirement (spec.md §4.3).
    pub fn legal_settlement_locations(&self, seat: SeatIndex, init: bool) -> Vec<VertexCoord> {
        let mut out = Vec::new();
        let player_edges: HashSet<VertexCoord> = self
            .player(seat)
            .owned_edges()
            .iter()
            .flat_map(|e| e.endpoints())
            .collect();

        for &v in self.graph.vertices.keys() {
            if self.vertex_occupied(v) || self.adjacent_to_fog(v) || !self.no_adjacent_occupied(v) {
                continue;
            }
            if init || player_edges.contains(&v) {
                out.push(v);
            }
        }
        out
    }

    pub fn legal_city_locations(&self, seat: SeatIndex, init: bool) -> Vec<VertexCoord> {
        if init {
            return self.legal_settlement_locations(seat, true);
        }
        self.player(seat)
            .vertex_placements
            .values()
            .filter(|p| p.kind() == BuildableType::Settlement)
            .map(|p| p.at())
            .collect()
    }

    /// Legal road edges. Non-init: unoccupied, incident to a vertex the
    /// player owns a building on, or incident to a vertex reachable from an
    /// owned road whose occupant is nobody or the player (spec.md §4.3).
    pub fn legal_road_locations(&self, seat: SeatIndex, init: bool) -> Vec<EdgeCoord> {
        if init {
            let Some(anchor) = self.init_settlement_needing_road else {
                return Vec::new();
            };
            return self
                .graph
                .edges
                .keys()
                .copied()
                .filter(|e| e.placement.is_none() && e.endpoints().contains(&anchor))
                .collect();
        }

        let owned_vertices: HashSet<VertexCoord> = self.player(seat).owned_vertices().into_iter().collect();
        let owned_road_vertices: HashSet<VertexCoord> = self
            .player(seat)
            .owned_edges()
            .iter()
            .flat_map(|e| e.endpoints())
            .collect();

        self.graph
            .edges
            .iter()
            .filter(|(_, e)| e.placement.is_none())
            .map(|(c, _)| *c)
            .filter(|e| {
                e.endpoints().iter().any(|&v| {
                    owned_vertices.contains(&v)
                        || (owned_road_vertices.contains(&v)
                            && self.vertex_owner(v).map(|id| id.owner == seat).unwrap_or(true))
                })
            })
            .collect()
    }

    pub fn build_settlement(&mut self, seat: SeatIndex, at: VertexCoord, init: bool) -> GameResult<()> {
        self.validate_turn(seat, init, false)?;
        if !init && self.player(seat).buildables_left(BuildableType::Settlement) == 0 {
            return Err(GameError::NoPiecesLeft);
        }
        if !self.legal_settlement_locations(seat, init).contains(&at) {
            return Err(GameError::IllegalLocation(format!("{:?} not legal for settlement", at)));
        }
        if !init && !self.has_at_least(seat, &SETTLEMENT_COST) {
            return Err(GameError::InsufficientResources);
        }

        if !init {
            for &(t, qty) in &SETTLEMENT_COST {
                self.move_cards(Some(seat), None, t, qty, true)?;
            }
        }

        let id = self.player_mut(seat).next_id();
        self.graph.vertices.entry(at).or_default().placement = Some(id);
        self.player_mut(seat).add_vertex_placement(VertexBuildable::Settlement { id, at });
        self.player_mut(seat).consume_buildable(BuildableType::Settlement);

        if init {
            self.init_settlement_needing_road = Some(at);
        }

        self.journal.write(JournalRecord::VertexBuild {
            at,
            placement: Some((seat, BuildableType::Settlement)),
            force: false,
        });
        self.recompute_extra_vp();
        Ok(())
    }

    pub fn build_city(&mut self, seat: SeatIndex, at: VertexCoord, init: bool) -> GameResult<()> {
        self.validate_turn(seat, init, false)?;
        if !init && self.player(seat).buildables_left(BuildableType::City) == 0 {
            return Err(GameError::NoPiecesLeft);
        }
        if !self.legal_city_locations(seat, init).contains(&at) {
            return Err(GameError::IllegalLocation(format!("{:?} not legal for city", at)));
        }
        if !init && !self.has_at_least(seat, &CITY_COST) {
            return Err(GameError::InsufficientResources);
        }
        if !init {
            for &(t, qty) in &CITY_COST {
                self.move_cards(Some(seat), None, t, qty, true)?;
            }
        }
        self.place_city(seat, at);
        Ok(())
    }

    /// Free city upgrade for the Medicine progress card: same legality as a
    /// normal non-init city, no cost. Grounded on
    /// `original_source/game/actions_progress_paper.go`'s
    /// `UseProgressPaperMedicine`.
    pub(crate) fn build_free_city(&mut self, seat: SeatIndex, at: VertexCoord) -> GameResult<()> {
        if self.player(seat).buildables_left(BuildableType::City) == 0 {
            return Err(GameError::NoPiecesLeft);
        }
        if !self.legal_city_locations(seat, false).contains(&at) {
            return Err(GameError::IllegalLocation(format!("{:?} not legal for city", at)));
        }
        self.place_city(seat, at);
        Ok(())
    }

    fn place_city(&mut self, seat: SeatIndex, at: VertexCoord) {
        let existing = self
            .player(seat)
            .vertex_placements
            .values()
            .find(|p| p.at() == at && p.kind() == BuildableType::Settlement)
            .map(|p| p.id().id);
        if let Some(id) = existing {
            self.player_mut(seat).remove_vertex_placement(id);
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

        self.journal.write(JournalRecord::VertexBuild {
            at,
            placement: Some((seat, BuildableType::City)),
            force: false,
        });
        self.recompute_extra_vp();
    }

    /// Builds a road, revealing any adjacent fog tiles (spec.md §4.1/§4.3).
    pub fn build_road(&mut self, seat: SeatIndex, at: EdgeCoord, init: bool) -> GameResult<()> {
        self.validate_turn(seat, init, false)?;
        if !init && self.player(seat).buildables_left(BuildableType::Road) == 0 {
            return Err(GameError::NoPiecesLeft);
        }
        if !self.legal_road_locations(seat, init).contains(&at) {
            return Err(GameError::IllegalLocation(format!("{:?} not legal for road", at)));
        }
        if !init && !self.has_at_least(seat, &ROAD_COST) {
            return Err(GameError::InsufficientResources);
        }

        if !init {
            for &(t, qty) in &ROAD_COST {
                self.move_cards(Some(seat), None, t, qty, true)?;
            }
        }

        self.place_road(seat, at, init);
        Ok(())
    }

    /// Free road placement for Road Building dev/progress cards: same
    /// legality as a normal non-init road, no cost, no turn re-validation
    /// (the caller already validated the card use). Grounded on
    /// `original_source/game/actions_devel.go`'s `UseDevRoadBuilding`.
    pub(crate) fn build_free_road(&mut self, seat: SeatIndex, at: EdgeCoord) -> GameResult<()> {
        if self.player(seat).buildables_left(BuildableType::Road) == 0 {
            return Err(GameError::NoPiecesLeft);
        }
        if !self.legal_road_locations(seat, false).contains(&at) {
            return Err(GameError::IllegalLocation(format!("{:?} not legal for road", at)));
        }
        self.place_road(seat, at, false);
        Ok(())
    }

    fn place_road(&mut self, seat: SeatIndex, at: EdgeCoord, init: bool) {
        let id = self.player_mut(seat).next_id();
        if let Some(e) = self.graph.edges.get_mut(&at) {
            e.placement = Some(id);
        }
        self.player_mut(seat).add_edge_placement(RoadBuildable { id, at });
        self.player_mut(seat).consume_buildable(BuildableType::Road);

        if init
            && (self.init_settlement_needing_road == Some(at.endpoints()[0])
                || self.init_settlement_needing_road == Some(at.endpoints()[1]))
        {
            self.init_settlement_needing_road = None;
        }

        self.journal.write(JournalRecord::EdgeBuild {
            at,
            placement: Some((seat, BuildableType::Road)),
        });

        self.reveal_fog_for_edge(seat, at);
        self.recompute_extra_vp();
    }

    fn reveal_fog_for_edge(&mut self, seat: SeatIndex, at: EdgeCoord) {
        let touching: Vec<_> = self.graph.tiles_touching_edge(at);
        for coord in touching {
            let (was_fog, tile_type) = {
                let Some(tile) = self.graph.tiles.get(&coord) else { continue };
                (tile.fog, tile.tile_type)
            };
            if !was_fog {
                continue;
            }
            if let Some(tile) = self.graph.tiles.get_mut(&coord) {
                tile.fog = false;
            }
            self.journal.write(JournalRecord::SetTileType {
                center: coord,
                tile_type,
                number: self.graph.tiles.get(&coord).map(|t| t.number).unwrap_or(0),
            });
            if tile_type.is_resource() {
                let card = resource_card(tile_type);
                if self.bank.hand.count(card) > 0 {
                    let _ = self.move_cards(None, Some(seat), card, 1, false);
                }
            }
        }
    }

    /// Builds a basic knight, or upgrades the player's own knight one level
    /// (`BuildKnight` in the original collapses both into one call keyed by
    /// the existing occupant's level).
    pub fn build_knight(&mut self, seat: SeatIndex, at: VertexCoord) -> GameResult<()> {
        self.validate_turn(seat, false, false)?;

        let existing = self.vertex_owner(at);
        let (target_level, upgrading) = match existing {
            None => (KnightLevel::Basic, false),
            Some(id) if id.owner == seat => {
                let level = self
                    .player(seat)
                    .vertex_placements
                    .get(&id.id)
                    .and_then(|p| match p {
                        VertexBuildable::Knight { level, .. } => Some(*level),
                        _ => None,
                    })
                    .ok_or_else(|| GameError::IllegalLocation("not a knight".into()))?;
                let next = level.upgrade().ok_or(GameError::NoPiecesLeft)?;
                (next, true)
            }
            Some(_) => return Err(GameError::IllegalLocation("vertex occupied by opponent".into())),
        };

        if !upgrading && self.player(seat).buildables_left(BuildableType::Knight) == 0 {
            return Err(GameError::NoPiecesLeft);
        }
        if !self.has_at_least(seat, &KNIGHT_COST) {
            return Err(GameError::InsufficientResources);
        }
        for &(t, qty) in &KNIGHT_COST {
            self.move_cards(Some(seat), None, t, qty, true)?;
        }

        let (activated, can_use) = if upgrading {
            if let Some(id) = existing {
                let prior = self.player(seat).vertex_placements.get(&id.id).cloned();
                self.player_mut(seat).remove_vertex_placement(id.id);
                match prior {
                    Some(VertexBuildable::Knight { activated, can_use, .. }) => (activated, can_use),
                    _ => (false, false),
                }
            } else {
                (false, false)
            }
        } else {
            (false, false)
        };

        let id = self.player_mut(seat).next_id();
        self.graph.vertices.entry(at).or_default().placement = Some(id);
        self.player_mut(seat).add_vertex_placement(VertexBuildable::Knight {
            id,
            at,
            level: target_level,
            activated,
            can_use,
        });
        if !upgrading {
            self.player_mut(seat).consume_buildable(BuildableType::Knight);
        }

        self.journal.write(JournalRecord::VertexBuild {
            at,
            placement: Some((seat, BuildableType::Knight)),
            force: false,
        });
        self.recompute_extra_vp();
        Ok(())
    }

    pub fn activate_knight(&mut self, seat: SeatIndex, at: VertexCoord) -> GameResult<()> {
        self.validate_turn(seat, false, false)?;
        let id = self
            .vertex_owner(at)
            .filter(|id| id.owner == seat)
            .ok_or_else(|| GameError::IllegalLocation("no own knight here".into()))?;
        let is_knight = matches!(
            self.player(seat).vertex_placements.get(&id.id),
            Some(VertexBuildable::Knight { activated: false, .. })
        );
        if !is_knight {
            return Err(GameError::IllegalLocation("knight already activated".into()));
        }
        self.move_cards(Some(seat), None, CardType::Wheat, 1, true)?;
        self.set_knight_active(seat, id.id, true, true);
        Ok(())
    }

    pub(crate) fn set_knight_active(&mut self, seat: SeatIndex, id: u64, active: bool, can_use: bool) {
        if let Some(VertexBuildable::Knight { activated, can_use: cu, at, .. }) =
            self.player_mut(seat).vertex_placements.get_mut(&id)
        {
            *activated = active;
            *cu = can_use;
            let at = *at;
            self.journal.write(JournalRecord::SetKnightActive { at, active, can_use });
        }
    }

    fn unwalled_city_of(&self, seat: SeatIndex, at: VertexCoord) -> GameResult<BuildableId> {
        let id = self
            .vertex_owner(at)
            .filter(|id| id.owner == seat)
            .ok_or_else(|| GameError::IllegalLocation("no own city here".into()))?;
        let is_unwalled_city = matches!(
            self.player(seat).vertex_placements.get(&id.id),
            Some(VertexBuildable::City { wall: false, .. })
        );
        if !is_unwalled_city {
            return Err(GameError::IllegalLocation("not an unwalled city".into()));
        }
        Ok(id)
    }

    pub fn build_wall(&mut self, seat: SeatIndex, at: VertexCoord) -> GameResult<()> {
        self.validate_turn(seat, false, false)?;
        let id = self.unwalled_city_of(seat, at)?;
        if self.player(seat).buildables_left(BuildableType::Wall) == 0 {
            return Err(GameError::NoPiecesLeft);
        }
        if !self.has_at_least(seat, &WALL_COST) {
            return Err(GameError::InsufficientResources);
        }
        for &(t, qty) in &WALL_COST {
            self.move_cards(Some(seat), None, t, qty, true)?;
        }
        self.place_wall(seat, id, at);
        Ok(())
    }

    /// Free wall for the Engineer progress card: skips cost, still bounded
    /// by the 3-per-player wall limit.
    pub(crate) fn build_free_wall(&mut self, seat: SeatIndex, at: VertexCoord) -> GameResult<()> {
        let id = self.unwalled_city_of(seat, at)?;
        if self.player(seat).buildables_left(BuildableType::Wall) == 0 {
            return Err(GameError::NoPiecesLeft);
        }
        self.place_wall(seat, id, at);
        Ok(())
    }

    fn place_wall(&mut self, seat: SeatIndex, id: BuildableId, at: VertexCoord) {
        if let Some(VertexBuildable::City { wall, .. }) = self.player_mut(seat).vertex_placements.get_mut(&id.id) {
            *wall = true;
        }
        self.player_mut(seat).consume_buildable(BuildableType::Wall);
        self.journal.write(JournalRecord::BuildWall { seat, at });
    }

    /// Legal vertices for a wall: the player's own unwalled cities.
    pub fn legal_wall_locations(&self, seat: SeatIndex) -> Vec<VertexCoord> {
        self.player(seat)
            .vertex_placements
            .values()
            .filter(|p| matches!(p, VertexBuildable::City { wall: false, .. }))
            .map(|p| p.at())
            .collect()
    }

    pub fn buy_development_card(&mut self, seat: SeatIndex) -> GameResult<DevCardType> {
        self.validate_turn(seat, false, false)?;
        if !self.has_at_least(seat, &DEV_CARD_COST) {
            return Err(GameError::InsufficientResources);
        }
        let card = self.bank.draw_base_dev_card().ok_or(GameError::BankExhausted)?;
        for &(t, qty) in &DEV_CARD_COST {
            self.move_cards(Some(seat), None, t, qty, true)?;
        }
        self.journal.write(JournalRecord::DevelopmentCardCursor {
            stack: None,
            cursor: self.bank.base_dev_card_cursor,
        });
        self.player_mut(seat).hand.add_dev_card(card, false);
        self.journal.write(JournalRecord::UpdateDevelopmentCard {
            seat: Some(seat),
            card,
            quantity_delta: 1,
            num_used_delta: 0,
            can_use: false,
        });
        Ok(card)
    }
}

pub(crate) fn resource_card(t: crate::board::tile::TileType) -> CardType {
    use crate::board::tile::TileType;
    match t {
        TileType::Wood => CardType::Wood,
        TileType::Brick => CardType::Brick,
        TileType::Wool => CardType::Wool,
        TileType::Wheat => CardType::Wheat,
        TileType::Ore => CardType::Ore,
        _ => CardType::Wood,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::map_definition::MapDefinition;

    fn ready_state() -> GameState {
        let mut g = GameState::new(
            "g1",
            &MapDefinition::base_4_player(),
            &[("a".into(), "A".into()), ("b".into(), "B".into())],
            false,
            7,
            1,
        );
        g.init_phase = false;
        g.dice_rolled = true;
        g
    }

    #[test]
    fn settlement_build_consumes_hand_and_piece_count() {
        let mut g = ready_state();
        let edge = *g.graph.edges.keys().next().unwrap();
        let road_id = g.player_mut(0).next_id();
        g.graph.edges.get_mut(&edge).unwrap().placement = Some(road_id);
        g.player_mut(0).add_edge_placement(RoadBuildable { id: road_id, at: edge });

        let legal = g.legal_settlement_locations(0, false);
        let at = *legal
            .iter()
            .find(|v| edge.endpoints().contains(v))
            .expect("one of the road's endpoints should be legal");

        g.player_mut(0).hand.add(CardType::Wood, 1);
        g.player_mut(0).hand.add(CardType::Brick, 1);
        g.player_mut(0).hand.add(CardType::Wool, 1);
        g.player_mut(0).hand.add(CardType::Wheat, 1);

        g.build_settlement(0, at, false).unwrap();
        assert_eq!(g.player(0).hand.count(CardType::Wood), 0);
        assert_eq!(g.player(0).buildables_left(BuildableType::Settlement), 4);
    }

    #[test]
    fn cannot_build_on_occupied_vertex() {
        let mut g = ready_state();
        let at = g.legal_settlement_locations(0, true)[0];
        g.build_settlement(0, at, true).unwrap();
        assert!(g.build_settlement(1, at, true).is_err());
    }
}
