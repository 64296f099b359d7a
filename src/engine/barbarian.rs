#![allow(dead_code)]
//! Cities & Knights barbarian track: strength comparison, attack
//! resolution, and progress-card hand-outs. Grounded on
//! `original_source/game/barbarian.go` (`MoveBarbarian`/`GiveProgressCard`/
//! `BarbarianDistributeProgressCards`/`BarbarianDestruction`) (spec.md §4.4).

use crate::board::coordinate::VertexCoord;
use crate::entities::buildable::{BuildableType, SeatIndex, VertexBuildable};
use crate::entities::hand::{CardType, DevCardType};
use crate::error::GameResult;
use crate::journal::JournalRecord;

use super::state::GameState;

/// What happened when the barbarian track reached zero. `NoAttack` means
/// the track just ticked down without reaching zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarbarianOutcome {
    NoAttack,
    /// A single seat had the most activated knight strength: they earn a
    /// defender point if any remain.
    Victory { defender: SeatIndex },
    /// Two or more seats tied for most strength: each gets to pick a
    /// progress-card stack (resolved by the caller, then fed to
    /// `give_progress_card`).
    VictoryTied { tied: Vec<SeatIndex> },
    /// Total activated knight strength fell short of the number of cities:
    /// every seat with the least knight strength (and a non-metropolis
    /// city) must sacrifice one city (resolved by the caller, then fed to
    /// `destroy_city`).
    Defeat { chosen: Vec<SeatIndex> },
}

impl GameState {
    /// Total number of cities on the board (the barbarians' strength),
    /// `None` outside Cities & Knights.
    pub fn barbarian_strength(&self) -> Option<u32> {
        if !self.cities_and_knights {
            return None;
        }
        Some(
            self.players
                .iter()
                .flat_map(|p| p.vertex_placements.values())
                .filter(|p| p.kind() == BuildableType::City)
                .count() as u32,
        )
    }

    fn activated_knight_strength(&self, seat: SeatIndex) -> u32 {
        self.player(seat)
            .knights()
            .map(|k| match k {
                VertexBuildable::Knight { activated: true, level, .. } => level.strength(),
                _ => 0,
            })
            .sum()
    }

    /// Sum of every seat's activated knight strength, `None` outside
    /// Cities & Knights.
    pub fn barbarian_knights(&self) -> Option<u32> {
        if !self.cities_and_knights {
            return None;
        }
        Some((0..self.num_players() as SeatIndex).map(|s| self.activated_knight_strength(s)).sum())
    }

    /// Ticks the barbarian track down by one, resolving an attack at zero.
    /// Deactivates every knight on the board whenever an attack triggers,
    /// win or lose, matching the original's unconditional deactivation pass.
    pub fn move_barbarian(&mut self) -> BarbarianOutcome {
        if self.barbarian_position > 0 {
            self.barbarian_position -= 1;
        }
        if self.barbarian_position != 0 {
            return BarbarianOutcome::NoAttack;
        }

        self.num_barbarian_attacks += 1;
        self.barbarian_position = 7;

        let mut total_knights = 0u32;
        let mut max_knights = 0u32;
        let mut max_players = Vec::new();
        let mut min_knights = u32::MAX;
        let mut min_players = Vec::new();

        for seat in 0..self.num_players() as SeatIndex {
            let k = self.activated_knight_strength(seat);
            total_knights += k;

            let has_city = self.player(seat).vertex_placements.values().any(|p| {
                matches!(p, VertexBuildable::City { metropolis, .. } if !*metropolis)
            });

            let knight_vertices: Vec<(u64, VertexCoord)> = self
                .player(seat)
                .vertex_placements
                .iter()
                .filter(|(_, p)| p.kind() == BuildableType::Knight)
                .map(|(&id, p)| (id, p.at()))
                .collect();
            for (id, _) in knight_vertices {
                self.set_knight_active(seat, id, false, false);
            }

            match k.cmp(&max_knights) {
                std::cmp::Ordering::Greater => {
                    max_knights = k;
                    max_players = vec![seat];
                }
                std::cmp::Ordering::Equal if !max_players.is_empty() => max_players.push(seat),
                _ => {}
            }

            if has_city {
                match k.cmp(&min_knights) {
                    std::cmp::Ordering::Less => {
                        min_knights = k;
                        min_players = vec![seat];
                    }
                    std::cmp::Ordering::Equal => min_players.push(seat),
                    _ => {}
                }
            }
        }

        let strength = self.barbarian_strength().unwrap_or(0);
        if total_knights >= strength {
            if max_players.len() > 1 {
                BarbarianOutcome::VictoryTied { tied: max_players }
            } else if let Some(&seat) = max_players.first() {
                self.grant_defender_point(seat);
                BarbarianOutcome::Victory { defender: seat }
            } else {
                BarbarianOutcome::NoAttack
            }
        } else if !min_players.is_empty() {
            BarbarianOutcome::Defeat { chosen: min_players }
        } else {
            BarbarianOutcome::NoAttack
        }
    }

    fn grant_defender_point(&mut self, seat: SeatIndex) {
        if self.extra_vp.defender_points.len() >= 8 {
            return;
        }
        self.extra_vp.defender_points.push(seat);
    }

    /// Hands the top card of `stack`'s deck to `seat`. Constitution and
    /// Printer are silent VP cards: they set the holder directly instead of
    /// entering the hand.
    pub fn give_progress_card(&mut self, seat: SeatIndex, stack: CardType) -> GameResult<Option<DevCardType>> {
        let Some(card) = self.bank.draw_progress_card(stack) else {
            return Ok(None);
        };
        self.journal.write(JournalRecord::GiveProgress { seat, stack });

        if card.is_silent_vp() {
            match card {
                DevCardType::Constitution => self.extra_vp.constitution_holder = Some(seat),
                DevCardType::Printer => self.extra_vp.printer_holder = Some(seat),
                _ => {}
            }
        } else {
            self.player_mut(seat).hand.add_dev_card(card, true);
            self.journal.write(JournalRecord::UpdateDevelopmentCard {
                seat: Some(seat),
                card,
                quantity_delta: 1,
                num_used_delta: 0,
                can_use: true,
            });
        }
        Ok(Some(card))
    }

    /// Demotes one of `seat`'s non-metropolis cities to a settlement,
    /// refunding a wall if it had one. `choice` must name one of the
    /// player's eligible cities; an ineligible or missing choice falls back
    /// to an arbitrary eligible city.
    pub fn destroy_city(&mut self, seat: SeatIndex, choice: Option<VertexCoord>) -> GameResult<()> {
        let eligible: Vec<VertexCoord> = self
            .player(seat)
            .vertex_placements
            .values()
            .filter(|p| matches!(p, VertexBuildable::City { metropolis, .. } if !*metropolis))
            .map(|p| p.at())
            .collect();
        let Some(at) = choice.filter(|c| eligible.contains(c)).or_else(|| eligible.first().copied()) else {
            return Ok(());
        };

        let (id, wall) = self
            .player(seat)
            .vertex_placements
            .iter()
            .find_map(|(&id, p)| match p {
                VertexBuildable::City { at: city_at, wall, .. } if *city_at == at => Some((id, *wall)),
                _ => None,
            })
            .expect("eligible city must exist");

        self.player_mut(seat).remove_vertex_placement(id);
        if wall {
            self.player_mut(seat).return_buildable(BuildableType::Wall);
        }
        self.player_mut(seat).return_buildable(BuildableType::City);
        self.player_mut(seat).consume_buildable(BuildableType::Settlement);

        let new_id = self.player_mut(seat).next_id();
        self.graph.vertices.entry(at).or_default().placement = Some(new_id);
        self.player_mut(seat).add_vertex_placement(VertexBuildable::Settlement { id: new_id, at });

        self.journal.write(JournalRecord::VertexBuild { at, placement: Some((seat, BuildableType::Settlement)), force: true });
        self.recompute_extra_vp();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::map_definition::MapDefinition;
    use crate::entities::buildable::{BuildableId, KnightLevel};

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

    #[test]
    fn barbarian_attacks_at_zero_and_resets_to_seven() {
        let mut g = ready_state();
        g.barbarian_position = 1;
        let outcome = g.move_barbarian();
        assert_eq!(g.barbarian_position, 7);
        assert_ne!(outcome, BarbarianOutcome::NoAttack);
    }

    #[test]
    fn victory_grants_a_single_defender_point() {
        let mut g = ready_state();
        let id = BuildableId { owner: 0, id: 500 };
        let at = *g.graph.vertices.keys().next().unwrap();
        g.player_mut(0).add_vertex_placement(VertexBuildable::Knight { id, at, level: KnightLevel::Mighty, activated: true, can_use: true });
        g.barbarian_position = 1;
        let outcome = g.move_barbarian();
        assert_eq!(outcome, BarbarianOutcome::Victory { defender: 0 });
        assert_eq!(g.extra_vp.defender_points, vec![0]);
    }
}
