#![allow(dead_code)]
//! Cities & Knights city improvements: spending commodity cards to raise
//! a paper/cloth/coin track, wonder animations at level 3, and metropolis
//! claims at level 4+. Grounded on `original_source/game/city_improvements.go`
//! (`CanBuildImprovement`/`BuildCityImprovement`) (spec.md §4.4).

use crate::board::coordinate::VertexCoord;
use crate::entities::buildable::{BuildableType, SeatIndex, VertexBuildable};
use crate::entities::hand::CardType;
use crate::error::{GameError, GameResult};
use crate::journal::JournalRecord;

use super::state::GameState;

impl GameState {
    pub fn can_build_improvement(&self, seat: SeatIndex, commodity: CardType, crane_assist: bool) -> GameResult<()> {
        if !self.cities_and_knights {
            return Err(GameError::BadRequest("wrong game mode".into()));
        }
        if !commodity.is_commodity() {
            return Err(GameError::BadRequest("no such improvement".into()));
        }

        let player = self.player(seat);
        let have = player.hand.count(commodity) + if crane_assist { 1 } else { 0 };
        let level = player.improvements.get(&commodity).copied().unwrap_or(0);
        if have <= level as i32 {
            return Err(GameError::InsufficientResources);
        }
        if level >= 5 {
            return Err(GameError::BadRequest("cannot improve further".into()));
        }

        let has_city = player
            .vertex_placements
            .values()
            .any(|p| p.kind() == BuildableType::City);
        if !has_city {
            return Err(GameError::IllegalLocation("no town to improve".into()));
        }

        if level >= 3 {
            let current_holder = self.extra_vp.metropolis_holders.get(&commodity).copied();
            let becoming_new_high = current_holder != Some(seat)
                && current_holder
                    .map(|h| self.player(h).improvements.get(&commodity).copied().unwrap_or(0) == level)
                    .unwrap_or(true);
            if becoming_new_high {
                let has_empty_city = player.vertex_placements.values().any(|p| {
                    matches!(p, VertexBuildable::City { metropolis, .. } if !*metropolis) && p.kind() == BuildableType::City
                });
                if !has_empty_city {
                    return Err(GameError::IllegalLocation("no town that can hold a wonder".into()));
                }
            }
        }

        Ok(())
    }

    /// Spends `level+1` (or `level` with Crane assistance) commodity cards
    /// to raise `commodity` one level. `metropolis_choice` is consulted only
    /// when this improvement newly claims a metropolis with more than one
    /// eligible city; it must be one of the player's own unwalled... any
    /// non-metropolis city.
    pub fn build_city_improvement(
        &mut self,
        seat: SeatIndex,
        commodity: CardType,
        crane_assist: bool,
        metropolis_choice: Option<VertexCoord>,
    ) -> GameResult<()> {
        self.validate_turn(seat, false, false)?;
        self.can_build_improvement(seat, commodity, crane_assist)?;

        let level = self.player(seat).improvements.get(&commodity).copied().unwrap_or(0);
        let cost = if crane_assist { level } else { level + 1 };
        self.move_cards(Some(seat), None, commodity, cost as i32, true)?;

        let new_level = level + 1;
        *self.player_mut(seat).improvements.entry(commodity).or_insert(0) = new_level;
        self.journal.write(JournalRecord::CityImprove { seat, commodity, level: new_level });

        if new_level >= 4 {
            self.settle_metropolis(seat, commodity, new_level, metropolis_choice);
        }

        self.recompute_extra_vp();
        Ok(())
    }

    fn settle_metropolis(&mut self, seat: SeatIndex, commodity: CardType, new_level: u32, choice: Option<VertexCoord>) {
        let current_holder = self.extra_vp.metropolis_holders.get(&commodity).copied();

        if let Some(holder) = current_holder {
            if holder != seat {
                let holder_level = self.player(holder).improvements.get(&commodity).copied().unwrap_or(0);
                if new_level > holder_level {
                    let demoted = self
                        .player(holder)
                        .vertex_placements
                        .values()
                        .find(|p| matches!(p, VertexBuildable::City { metropolis, .. } if *metropolis))
                        .map(|p| p.at());
                    if let Some(at) = demoted {
                        if let Some(VertexBuildable::City { metropolis, .. }) = self
                            .player_mut(holder)
                            .vertex_placements
                            .values_mut()
                            .find(|p| p.at() == at)
                        {
                            *metropolis = false;
                        }
                        self.journal.write(JournalRecord::BuildMetropolis { at, metropolis: false });
                    }
                    self.extra_vp.metropolis_holders.remove(&commodity);
                } else {
                    return;
                }
            } else {
                return;
            }
        }

        let eligible: Vec<VertexCoord> = self
            .player(seat)
            .vertex_placements
            .values()
            .filter(|p| matches!(p, VertexBuildable::City { metropolis, .. } if !*metropolis))
            .map(|p| p.at())
            .collect();
        if eligible.is_empty() {
            return;
        }
        let at = choice.filter(|c| eligible.contains(c)).unwrap_or(eligible[0]);

        self.extra_vp.metropolis_holders.insert(commodity, seat);
        if let Some(VertexBuildable::City { metropolis, .. }) = self
            .player_mut(seat)
            .vertex_placements
            .values_mut()
            .find(|p| p.at() == at)
        {
            *metropolis = true;
        }
        self.journal.write(JournalRecord::BuildMetropolis { at, metropolis: true });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::map_definition::MapDefinition;
    use crate::entities::buildable::BuildableId;

    fn ready_state() -> GameState {
        let mut g = GameState::new(
            "g1",
            &MapDefinition::base_4_player(),
            &[("a".into(), "A".into()), ("b".into(), "B".into())],
            true,
            7,
            1,
        );
        g.init_phase = false;
        g.dice_rolled = true;
        g
    }

    fn give_city(g: &mut GameState, seat: SeatIndex) -> VertexCoord {
        let at = *g.graph.vertices.keys().next().unwrap();
        let id = BuildableId { owner: seat, id: 9000 };
        g.graph.vertices.get_mut(&at).unwrap().placement = Some(id);
        g.player_mut(seat).add_vertex_placement(VertexBuildable::City { id, at, wall: false, metropolis: false });
        at
    }

    #[test]
    fn requires_cities_and_knights_mode() {
        let mut g = ready_state();
        g.cities_and_knights = false;
        assert!(g.can_build_improvement(0, CardType::Paper, false).is_err());
    }

    #[test]
    fn build_improvement_spends_commodity_and_raises_level() {
        let mut g = ready_state();
        give_city(&mut g, 0);
        g.player_mut(0).hand.add(CardType::Paper, 1);
        g.build_city_improvement(0, CardType::Paper, false, None).unwrap();
        assert_eq!(g.player(0).improvements[&CardType::Paper], 1);
        assert_eq!(g.player(0).hand.count(CardType::Paper), 0);
    }

    #[test]
    fn claiming_metropolis_requires_a_free_city() {
        let mut g = ready_state();
        give_city(&mut g, 0);
        g.player_mut(0).improvements.insert(CardType::Paper, 3);
        g.player_mut(0).hand.add(CardType::Paper, 4);
        assert!(g.can_build_improvement(0, CardType::Paper, false).is_ok());
        g.build_city_improvement(0, CardType::Paper, false, None).unwrap();
        assert_eq!(g.extra_vp.metropolis_holders.get(&CardType::Paper), Some(&0));
    }
}
