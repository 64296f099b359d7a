#![allow(dead_code)]
//! Dice roll, resource distribution and the roll-7/robber/steal sequence
//! (spec.md §4.4). Grounded on `original_source/game/dice.go`'s
//! `RollDiceWith`/`RollEventDiceWith`/`DiscardHalfCards`/
//! `MoveRobberInteractive`/`StealCardWithRobber`.
//!
//! As with the rest of `engine`, the *choice* half of a prompt (which tile
//! for the robber, which player to steal from, which cards to discard) is
//! resolved by the caller; these functions take the resolved choice and
//! apply it, or expose what a choice is needed *for* via a `*_targets`
//! query the caller uses to decide whether a prompt is needed at all.

use std::collections::HashMap;

use rand::Rng;

use crate::board::coordinate::TileCoord;
use crate::board::tile::TileType;
use crate::entities::buildable::{BuildableType, SeatIndex};
use crate::entities::hand::CardType;
use crate::error::{GameError, GameResult};
use crate::journal::JournalRecord;

use super::state::GameState;

#[derive(Debug, Clone, Copy)]
pub struct RollResult {
    pub red: u32,
    pub white: u32,
    pub event: Option<u32>,
}

impl RollResult {
    pub fn total(&self) -> u32 {
        self.red + self.white
    }
}

/// A resource-choice owed to a seat (gold tile, or a paper-3 bonus pick)
/// the caller must resolve via a prompt before the roll is fully applied.
#[derive(Debug, Clone, Copy)]
pub struct GoldEntitlement {
    pub seat: SeatIndex,
    pub quantity: u32,
}

#[derive(Debug, Default)]
pub struct DistributionOutcome {
    pub gains: Vec<(SeatIndex, CardType, i32)>,
    pub suppressed: Vec<CardType>,
    pub gold: Vec<GoldEntitlement>,
}

fn resource_card(t: TileType) -> Option<CardType> {
    match t {
        TileType::Wood => Some(CardType::Wood),
        TileType::Brick => Some(CardType::Brick),
        TileType::Wool => Some(CardType::Wool),
        TileType::Wheat => Some(CardType::Wheat),
        TileType::Ore => Some(CardType::Ore),
        _ => None,
    }
}

fn commodity_for(t: TileType) -> Option<CardType> {
    match t {
        TileType::Wood => Some(CardType::Paper),
        TileType::Wool => Some(CardType::Cloth),
        TileType::Ore => Some(CardType::Coin),
        _ => None,
    }
}

impl GameState {
    /// Rolls the dice for `seat` (must be the current player). `given_*`
    /// overrides are for tests/replay/Alchemist; `0` means "roll randomly".
    /// Does not distribute resources — call `distribute_roll` after.
    pub fn roll_dice(&mut self, seat: SeatIndex, given_red: u32, given_white: u32) -> GameResult<RollResult> {
        if seat != self.current_player {
            return Err(GameError::NotCurrentPlayer);
        }
        if self.dice_rolled {
            return Err(GameError::BadRequest("already rolled for this turn".into()));
        }

        let red = if given_red != 0 { given_red } else { self.rng.gen_range(1..=6) };
        let white = if given_white != 0 { given_white } else { self.rng.gen_range(1..=6) };
        let event = if self.cities_and_knights {
            Some(self.rng.gen_range(1..=6))
        } else {
            None
        };

        self.dice_rolled = true;
        self.last_roll = Some((red, white));
        self.last_event_roll = event;

        self.journal.write(JournalRecord::RollDice { red, white });
        if let Some(e) = event {
            self.journal.write(JournalRecord::RollEventDice { roll: e });
        }

        Ok(RollResult { red, white, event })
    }

    /// Applies resource distribution for a non-seven roll (spec.md §4.4
    /// items 1-4). Bank underflow on a type suppresses that type for
    /// *every* gainer this roll; gold entitlements are returned for the
    /// caller to resolve via a prompt (item 5's concurrent gold fan-out).
    pub fn distribute_roll(&mut self, roll: u32) -> DistributionOutcome {
        let mut outcome = DistributionOutcome::default();
        if roll == 7 {
            return outcome;
        }

        let mut demand: HashMap<CardType, i32> = HashMap::new();
        // (seat, card, qty) pending grants, computed before mutating anything.
        let mut pending: Vec<(SeatIndex, CardType, i32)> = Vec::new();
        let mut gold: HashMap<SeatIndex, u32> = HashMap::new();
        let mut gained_anything: HashMap<SeatIndex, bool> = HashMap::new();

        for (tile_coord, vertex) in self.graph.vertices_for_roll(roll) {
            let Some(id) = self.graph.vertices.get(&vertex).and_then(|v| v.placement) else {
                continue;
            };
            let owner = id.owner;
            let Some(piece) = self.player(owner).vertex_placements.get(&id.id) else {
                continue;
            };
            if piece.kind() == BuildableType::Knight {
                continue;
            }
            let qty = piece.resource_multiplier() as i32;
            let tile_type = self.graph.tiles.get(&tile_coord).map(|t| t.tile_type).unwrap_or(TileType::Sea);

            if tile_type == TileType::Gold {
                *gold.entry(owner).or_insert(0) += qty as u32;
                continue;
            }

            if let Some(card) = resource_card(tile_type) {
                *demand.entry(card).or_insert(0) += qty;
                pending.push((owner, card, qty));
                gained_anything.insert(owner, true);

                if self.cities_and_knights && piece.kind() == BuildableType::City {
                    if let Some(commodity) = commodity_for(tile_type) {
                        *demand.entry(commodity).or_insert(0) += qty;
                        pending.push((owner, commodity, qty));
                    }
                }
            }
        }

        let suppressed: Vec<CardType> = demand
            .iter()
            .filter(|&(&card, &need)| self.bank.hand.count(card) < need)
            .map(|(&card, _)| card)
            .collect();

        for (seat, card, qty) in pending {
            if suppressed.contains(&card) {
                continue;
            }
            self.grant_from_bank(seat, card, qty);
            outcome.gains.push((seat, card, qty));
        }
        outcome.suppressed = suppressed;

        if self.cities_and_knights {
            for seat in 0..self.num_players() as SeatIndex {
                if self.player(seat).improvements.get(&CardType::Paper).copied().unwrap_or(0) >= 3
                    && !gained_anything.get(&seat).copied().unwrap_or(false)
                {
                    *gold.entry(seat).or_insert(0) += 1;
                }
            }
        }

        outcome.gold = gold
            .into_iter()
            .map(|(seat, quantity)| GoldEntitlement { seat, quantity })
            .collect();
        outcome
    }

    /// Grants a resolved gold pick to `seat`; the caller is responsible for
    /// capping `picks` at the entitled quantity and for falling back to a
    /// random bank pick on timeout (session's job, spec.md §4.5).
    pub fn resolve_gold_choice(&mut self, seat: SeatIndex, picks: &[(CardType, i32)]) {
        for &(card, qty) in picks {
            let available = self.bank.hand.count(card).min(qty);
            if available > 0 {
                self.grant_from_bank(seat, card, available);
            }
        }
    }

    /// Seats whose hand exceeds their discard limit, with the count to discard.
    pub fn discard_targets(&self) -> Vec<(SeatIndex, u32)> {
        (0..self.num_players() as SeatIndex)
            .filter_map(|seat| {
                let total = self.player(seat).hand.total_cards();
                let limit = self.discard_limit(seat) as i32;
                if total > limit {
                    Some((seat, (total as u32 + 1) / 2))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Applies a resolved discard: removes `picks` (capped at holdings),
    /// then tops up with random cards from the remainder of the hand until
    /// `required` cards have left it (the timeout / malformed-reply policy,
    /// spec.md §7's "protocol errors degrade to timeout").
    pub fn resolve_discard(&mut self, seat: SeatIndex, required: u32, picks: &[(CardType, i32)]) {
        let mut discarded = 0u32;
        for &(card, qty) in picks {
            if discarded >= required {
                break;
            }
            let have = self.player(seat).hand.count(card);
            let take = qty.min(have).min((required - discarded) as i32);
            if take > 0 {
                let _ = self.move_cards(Some(seat), None, card, take, true);
                discarded += take as u32;
            }
        }
        while discarded < required {
            let Some(card) = self.players[seat as usize].hand.random_card_type(&mut self.rng) else {
                break;
            };
            let _ = self.move_cards(Some(seat), None, card, 1, true);
            discarded += 1;
        }
    }

    /// Moves the robber. `allow_same_tile` supports the advanced
    /// `RerollOn7` + desert rule where the robber may stay put.
    pub fn move_robber(&mut self, at: TileCoord, allow_same_tile: bool) -> GameResult<()> {
        if !self.graph.tiles.contains_key(&at) {
            return Err(GameError::IllegalLocation(format!("{:?} is not a tile", at)));
        }
        if self.graph.tiles.get(&at).map(|t| t.fog).unwrap_or(true) {
            return Err(GameError::IllegalLocation("cannot place robber on fog".into()));
        }
        if !allow_same_tile && at == self.graph.robber {
            return Err(GameError::IllegalLocation("robber must move to a new tile".into()));
        }
        self.graph.robber = at;
        self.journal.write(JournalRecord::SetRobber { center: at });
        Ok(())
    }

    /// Seats with a settlement/city on the robber's tile, excluding `seat`
    /// itself and any with an empty hand.
    pub fn steal_targets(&self, seat: SeatIndex) -> Vec<SeatIndex> {
        let tile = self.graph.robber;
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for v in tile.vertices() {
            let Some(id) = self.graph.vertices.get(&v).and_then(|vx| vx.placement) else {
                continue;
            };
            if id.owner == seat || !seen.insert(id.owner) {
                continue;
            }
            let is_building = self
                .player(id.owner)
                .vertex_placements
                .get(&id.id)
                .map(|p| matches!(p.kind(), BuildableType::Settlement | BuildableType::City))
                .unwrap_or(false);
            if is_building && self.player(id.owner).hand.total_cards() > 0 {
                out.push(id.owner);
            }
        }
        out
    }

    /// Steals one random card from `victim`'s hand to `stealer` (a secret
    /// `CardMove`, per spec.md §4.2 — the caller decides visibility).
    pub fn steal_random_card(&mut self, stealer: SeatIndex, victim: SeatIndex) {
        let Some(card) = self.players[victim as usize].hand.random_card_type(&mut self.rng) else {
            return;
        };
        let _ = self.move_cards(Some(victim), Some(stealer), card, 1, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::map_definition::MapDefinition;
    use crate::entities::buildable::{BuildableId, VertexBuildable};

    fn state_with_settlement(tile: TileCoord, vertex: crate::board::coordinate::VertexCoord, owner: SeatIndex) -> GameState {
        let mut g = GameState::new(
            "g1",
            &MapDefinition::base_4_player(),
            &[("a".into(), "A".into()), ("b".into(), "B".into())],
            false,
            7,
            1,
        );
        let _ = tile;
        let id = BuildableId { owner, id: 0 };
        g.graph.vertices.entry(vertex).or_default().placement = Some(id);
        g.player_mut(owner).add_vertex_placement(VertexBuildable::Settlement { id, at: vertex });
        g
    }

    #[test]
    fn bank_underflow_suppresses_type_for_everyone() {
        let mut g = GameState::new(
            "g1",
            &MapDefinition::base_4_player(),
            &[("a".into(), "A".into()), ("b".into(), "B".into())],
            false,
            7,
            1,
        );
        // Drain the bank's wood to 1, then place six settlements on wood tiles rolling 5.
        let drained = g.bank.hand.count(CardType::Wood) - 1;
        g.bank.hand.try_remove(CardType::Wood, drained);

        let wood_tiles: Vec<_> = g
            .graph
            .tiles
            .iter()
            .filter(|(_, t)| t.tile_type == TileType::Wood)
            .map(|(c, _)| *c)
            .collect();
        assert!(!wood_tiles.is_empty());
        for (i, &coord) in wood_tiles.iter().enumerate() {
            if let Some(t) = g.graph.tiles.get_mut(&coord) {
                t.number = 5;
            }
            let v = coord.vertices()[0];
            let id = BuildableId { owner: (i % 2) as SeatIndex, id: i as u64 };
            g.graph.vertices.entry(v).or_default().placement = Some(id);
            g.player_mut((i % 2) as SeatIndex).add_vertex_placement(VertexBuildable::Settlement { id, at: v });
        }

        let outcome = g.distribute_roll(5);
        assert!(outcome.suppressed.contains(&CardType::Wood));
        assert!(outcome.gains.iter().all(|&(_, c, _)| c != CardType::Wood));
        assert_eq!(g.bank.hand.count(CardType::Wood), 1, "no partial grants on suppression");
    }

    #[test]
    fn discard_targets_half_rounded_up() {
        let mut g = state_with_settlement(TileCoord::new(0, 0), crate::board::coordinate::VertexCoord::new(0, 0), 0);
        for _ in 0..9 {
            g.player_mut(0).hand.add(CardType::Wood, 1);
        }
        let targets = g.discard_targets();
        assert_eq!(targets, vec![(0, 5)]);
    }

    #[test]
    fn resolve_discard_tops_up_randomly_on_underspecified_pick() {
        let mut g = state_with_settlement(TileCoord::new(0, 0), crate::board::coordinate::VertexCoord::new(0, 0), 0);
        g.player_mut(0).hand.add(CardType::Wood, 9);
        g.resolve_discard(0, 5, &[]);
        assert_eq!(g.player(0).hand.total_cards(), 4);
    }
}
