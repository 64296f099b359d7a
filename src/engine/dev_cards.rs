#![allow(dead_code)]
//! Base-game development card use effects: Knight, Monopoly, Road Building,
//! Year of Plenty, Victory Point. Grounded on
//! `original_source/game/actions_devel.go`'s `UseDevelopmentCard` dispatcher
//! and its `useCard()` closure (one-card-per-turn rule, spec.md §4.3).
//!
//! As with the rest of `engine`, which tile/resource/player to target is an
//! already-resolved parameter; `session` supplies it (spec.md §4.5).

use rand::Rng;

use crate::board::coordinate::{EdgeCoord, TileCoord};
use crate::entities::buildable::SeatIndex;
use crate::entities::hand::{CardType, DevCardType};
use crate::error::{GameError, GameResult};
use crate::journal::JournalRecord;

use super::state::GameState;

impl GameState {
    /// Current player, dice rolled, card held and usable. Does not mutate —
    /// callers validate any target-specific legality (e.g. the robber's new
    /// tile) before calling `consume_base_dev_card`, so a bad target never
    /// burns the card.
    fn check_base_dev_card(&self, seat: SeatIndex, card: DevCardType) -> GameResult<()> {
        self.validate_turn(seat, false, false)?;
        let deck = self.player(seat).hand.dev_deck(card);
        if deck.quantity < 1 {
            return Err(GameError::NotFound(format!("{:?} not held", card)));
        }
        if !deck.can_use {
            return Err(GameError::BadRequest(format!("{:?} cannot be used this turn", card)));
        }
        Ok(())
    }

    /// Decrements the card and, in Base mode only, disables every other dev
    /// card the player holds for the rest of the turn (the original's
    /// one-card-per-turn rule; Cities & Knights has no such restriction).
    fn consume_base_dev_card(&mut self, seat: SeatIndex, card: DevCardType) {
        self.player_mut(seat).hand.try_remove_dev_card(card);
        let deck = self.player(seat).hand.dev_deck(card);
        self.journal.write(JournalRecord::UpdateDevelopmentCard {
            seat: Some(seat),
            card,
            quantity_delta: -1,
            num_used_delta: 1,
            can_use: deck.can_use,
        });

        if self.cities_and_knights {
            return;
        }
        let others: Vec<DevCardType> = self
            .player(seat)
            .hand
            .iter_dev_cards()
            .filter(|&(t, d)| t != card && d.can_use)
            .map(|(t, _)| t)
            .collect();
        for t in others {
            self.player_mut(seat).hand.set_dev_can_use(t, false);
            self.journal.write(JournalRecord::UpdateDevelopmentCard {
                seat: Some(seat),
                card: t,
                quantity_delta: 0,
                num_used_delta: 0,
                can_use: false,
            });
        }
    }

    fn scarcest_bank_resource(&self) -> CardType {
        [CardType::Wood, CardType::Brick, CardType::Wool, CardType::Wheat, CardType::Ore]
            .into_iter()
            .min_by_key(|&c| self.bank.hand.count(c))
            .unwrap_or(CardType::Wood)
    }

    fn random_bank_resource(&mut self) -> Option<CardType> {
        let weights: Vec<(CardType, i32)> = [CardType::Wood, CardType::Brick, CardType::Wool, CardType::Wheat, CardType::Ore]
            .into_iter()
            .map(|c| (c, self.bank.hand.count(c)))
            .filter(|&(_, q)| q > 0)
            .collect();
        let total: i32 = weights.iter().map(|&(_, q)| q).sum();
        if total <= 0 {
            return None;
        }
        let mut pick = self.rng.gen_range(0..total);
        for (c, q) in weights {
            if pick < q {
                return Some(c);
            }
            pick -= q;
        }
        None
    }

    /// Knight: move the robber and optionally steal, then recompute VP
    /// (the knight itself may have just made this player eligible/ineligible
    /// for largest army via the played-count it increments).
    pub fn use_knight_card(&mut self, seat: SeatIndex, robber_at: TileCoord, steal_from: Option<SeatIndex>) -> GameResult<()> {
        self.check_base_dev_card(seat, DevCardType::Knight)?;
        self.move_robber(robber_at, false)?;
        self.consume_base_dev_card(seat, DevCardType::Knight);

        if let Some(victim) = steal_from {
            if self.steal_targets(seat).contains(&victim) {
                self.steal_random_card(seat, victim);
            }
        }
        self.recompute_extra_vp();
        Ok(())
    }

    /// Monopoly: steal every opponent's holding of one resource type.
    /// `resource` is the caller's resolved pick; a missing or non-resource
    /// reply falls back to the bank's scarcest resource
    /// (`original_source/game/actions_devel.go`'s malformed-reply policy).
    pub fn use_monopoly_card(&mut self, seat: SeatIndex, resource: Option<CardType>) -> GameResult<(CardType, Vec<(SeatIndex, i32)>)> {
        self.check_base_dev_card(seat, DevCardType::Monopoly)?;
        let resource = resource.filter(|c| c.is_resource()).unwrap_or_else(|| self.scarcest_bank_resource());
        self.consume_base_dev_card(seat, DevCardType::Monopoly);

        let mut stolen = Vec::new();
        for victim in 0..self.num_players() as SeatIndex {
            if victim == seat {
                continue;
            }
            let qty = self.player(victim).hand.count(resource);
            if qty > 0 {
                let _ = self.move_cards(Some(victim), Some(seat), resource, qty, true);
                stolen.push((victim, qty));
            }
        }
        Ok((resource, stolen))
    }

    /// Road Building: two free roads. Each slot falls back to the first
    /// currently-legal edge when the caller's pick is missing or now illegal
    /// (`original_source/game/actions_devel.go`'s `UseDevRoadBuilding`).
    pub fn use_road_building_card(&mut self, seat: SeatIndex, first: Option<EdgeCoord>, second: Option<EdgeCoord>) -> GameResult<()> {
        self.check_base_dev_card(seat, DevCardType::RoadBuilding)?;
        self.consume_base_dev_card(seat, DevCardType::RoadBuilding);
        self.free_road_or_fallback(seat, first);
        self.free_road_or_fallback(seat, second);
        Ok(())
    }

    pub(crate) fn free_road_or_fallback(&mut self, seat: SeatIndex, choice: Option<EdgeCoord>) {
        let legal = self.legal_road_locations(seat, false);
        let at = choice.filter(|e| legal.contains(e)).or_else(|| legal.first().copied());
        if let Some(at) = at {
            let _ = self.build_free_road(seat, at);
        }
    }

    /// Year of Plenty: grant up to 2 resources from the bank. Underspecified
    /// or unavailable picks are topped up with a random bank resource.
    pub fn use_year_of_plenty_card(&mut self, seat: SeatIndex, picks: &[(CardType, i32)]) -> GameResult<()> {
        self.check_base_dev_card(seat, DevCardType::YearOfPlenty)?;
        self.consume_base_dev_card(seat, DevCardType::YearOfPlenty);

        let mut granted = 0i32;
        for &(card, qty) in picks {
            if granted >= 2 {
                break;
            }
            if !card.is_resource() {
                continue;
            }
            let take = qty.max(0).min(2 - granted);
            let available = self.bank.hand.count(card).min(take);
            if available > 0 {
                self.grant_from_bank(seat, card, available);
                granted += available;
            }
        }
        while granted < 2 {
            let Some(card) = self.random_bank_resource() else { break };
            self.grant_from_bank(seat, card, 1);
            granted += 1;
        }
        Ok(())
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
    fn knight_moves_robber_and_steals() {
        let mut g = ready_state();
        g.player_mut(0).hand.add_dev_card(DevCardType::Knight, true);
        let other_tile = *g.graph.tiles.keys().find(|&&c| c != g.graph.robber && !g.graph.tiles[&c].fog).unwrap();
        g.use_knight_card(0, other_tile, None).unwrap();
        assert_eq!(g.graph.robber, other_tile);
        assert_eq!(g.player(0).hand.dev_deck(DevCardType::Knight).quantity, 0);
    }

    #[test]
    fn monopoly_steals_every_opponents_resource() {
        let mut g = ready_state();
        g.player_mut(0).hand.add_dev_card(DevCardType::Monopoly, true);
        g.player_mut(1).hand.add(CardType::Wood, 3);
        let (resource, stolen) = g.use_monopoly_card(0, Some(CardType::Wood)).unwrap();
        assert_eq!(resource, CardType::Wood);
        assert_eq!(stolen, vec![(1, 3)]);
        assert_eq!(g.player(0).hand.count(CardType::Wood), 3);
        assert_eq!(g.player(1).hand.count(CardType::Wood), 0);
    }

    #[test]
    fn using_one_base_card_disables_the_rest_for_the_turn() {
        let mut g = ready_state();
        g.player_mut(0).hand.add_dev_card(DevCardType::Knight, true);
        g.player_mut(0).hand.add_dev_card(DevCardType::Monopoly, true);
        let tile = g.graph.robber;
        let other_tile = *g.graph.tiles.keys().find(|&&c| c != tile && !g.graph.tiles[&c].fog).unwrap();
        g.use_knight_card(0, other_tile, None).unwrap();
        assert!(!g.player(0).hand.dev_deck(DevCardType::Monopoly).can_use);
    }

    #[test]
    fn year_of_plenty_tops_up_when_underspecified() {
        let mut g = ready_state();
        g.player_mut(0).hand.add_dev_card(DevCardType::YearOfPlenty, true);
        g.use_year_of_plenty_card(0, &[(CardType::Wood, 1)]).unwrap();
        assert_eq!(g.player(0).hand.total_cards(), 2);
    }
}
