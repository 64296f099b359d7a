#![allow(dead_code)]
//! Longest-road and largest-army recomputation, run after any build/move/
//! displace that could change either. Grounded on spec.md's "Longest-road
//! DFS with branch handling" supplement and
//! `original_source/entities/player.go`'s `KnightDFS`-style walk, generalized
//! to roads.

use std::collections::{HashMap, HashSet};

use crate::board::coordinate::{EdgeCoord, VertexCoord};
use crate::entities::buildable::SeatIndex;

use super::state::GameState;

impl GameState {
    /// Recomputes longest road and largest army for every seat and updates
    /// the holder/count, honoring the no-tie-displacement rule (§8, S8).
    pub fn recompute_extra_vp(&mut self) {
        for seat in 0..self.num_players() as SeatIndex {
            let length = self.longest_road_for(seat);
            self.extra_vp.consider_longest_road(seat, length);

            // Largest Army only exists in Base: it's the number of Knight dev
            // cards played. Cities & Knights has no such card; knight strength
            // earns barbarian defender points instead
            // (`original_source/game/state.go`'s `SetExtraVictoryPoints`, Base-only gate).
            if !self.cities_and_knights {
                let army = self
                    .player(seat)
                    .hand
                    .dev_deck(crate::entities::hand::DevCardType::Knight)
                    .num_used
                    .max(0) as u32;
                self.extra_vp.consider_largest_army(seat, army);
            }
        }
    }

    /// Longest simple path of `seat`'s own roads, blocked from continuing
    /// through a vertex occupied by another player's settlement/city (but not
    /// by the player's own buildings, nor by knights).
    pub fn longest_road_for(&self, seat: SeatIndex) -> u32 {
        let edges: Vec<EdgeCoord> = self.player(seat).owned_edges();
        if edges.is_empty() {
            return 0;
        }

        let mut adjacency: HashMap<VertexCoord, Vec<EdgeCoord>> = HashMap::new();
        for e in &edges {
            let [a, b] = e.endpoints();
            adjacency.entry(a).or_default().push(*e);
            adjacency.entry(b).or_default().push(*e);
        }

        let blocked = |v: VertexCoord| -> bool {
            match self.graph.vertices.get(&v).and_then(|vtx| vtx.placement) {
                Some(id) => {
                    id.owner != seat
                        && self
                            .player(id.owner)
                            .vertex_placements
                            .get(&id.id)
                            .map(|p| {
                                matches!(
                                    p.kind(),
                                    crate::entities::buildable::BuildableType::Settlement
                                        | crate::entities::buildable::BuildableType::City
                                )
                            })
                            .unwrap_or(false)
                }
                None => false,
            }
        };

        let mut best = 0u32;
        for &start in adjacency.keys() {
            let mut used = HashSet::new();
            best = best.max(self.walk(start, &adjacency, &mut used, blocked));
        }
        best
    }

    fn walk(
        &self,
        at: VertexCoord,
        adjacency: &HashMap<VertexCoord, Vec<EdgeCoord>>,
        used: &mut HashSet<EdgeCoord>,
        blocked: impl Fn(VertexCoord) -> bool + Copy,
    ) -> u32 {
        let Some(candidates) = adjacency.get(&at) else {
            return 0;
        };
        let mut best = 0u32;
        for &e in candidates {
            if used.contains(&e) {
                continue;
            }
            let [a, b] = e.endpoints();
            let next = if a == at { b } else { a };
            if blocked(next) {
                continue;
            }
            used.insert(e);
            let found = 1 + self.walk(next, adjacency, used, blocked);
            used.remove(&e);
            best = best.max(found);
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::coordinate::VertexCoord;
    use crate::board::map_definition::MapDefinition;
    use crate::entities::buildable::{BuildableId, RoadBuildable, VertexBuildable};

    fn state() -> GameState {
        GameState::new(
            "g1",
            &MapDefinition::base_4_player(),
            &[("a".into(), "A".into()), ("b".into(), "B".into())],
            false,
            7,
            1,
        )
    }

    #[test]
    fn straight_chain_counts_every_edge() {
        let mut g = state();
        let v = [
            VertexCoord::new(0, 0),
            VertexCoord::new(2, 2),
            VertexCoord::new(4, 4),
            VertexCoord::new(6, 6),
        ];
        for w in v.windows(2) {
            let edge = EdgeCoord::new(w[0], w[1]);
            let id = g.player_mut(0).next_id();
            g.player_mut(0).add_edge_placement(RoadBuildable { id, at: edge });
        }
        assert_eq!(g.longest_road_for(0), 3);
    }

    #[test]
    fn opponent_settlement_blocks_continuation() {
        let mut g = state();
        let v = [
            VertexCoord::new(0, 0),
            VertexCoord::new(2, 2),
            VertexCoord::new(4, 4),
        ];
        for w in v.windows(2) {
            let edge = EdgeCoord::new(w[0], w[1]);
            let id = g.player_mut(0).next_id();
            g.player_mut(0).add_edge_placement(RoadBuildable { id, at: edge });
        }
        let opp_id = BuildableId { owner: 1, id: 0 };
        g.graph.vertices.entry(v[1]).or_default().placement = Some(opp_id);
        g.player_mut(1)
            .add_vertex_placement(VertexBuildable::Settlement { id: opp_id, at: v[1] });

        assert_eq!(g.longest_road_for(0), 1);
    }
}
