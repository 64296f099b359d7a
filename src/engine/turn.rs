#![allow(dead_code)]
//! End-of-turn bookkeeping: special-build ring advancement, dev-card
//! `can_use` resets, and the forced discard it triggers for an outgoing
//! Cities & Knights player whose hand of progress cards overflowed.
//! Grounded on `original_source/game/actions.go`'s `CanEndTurn`/`EndTurn`/
//! `EndTurnResetDevelopmentCards` (spec.md §4.3).

use crate::entities::buildable::{SeatIndex, VertexBuildable};
use crate::entities::hand::DevCardType;
use crate::error::{GameError, GameResult};
use crate::journal::JournalRecord;

use super::state::GameState;

impl GameState {
    pub fn can_end_turn(&self, seat: SeatIndex) -> GameResult<()> {
        if seat != self.current_player {
            return Err(GameError::NotCurrentPlayer);
        }
        if self.player(seat).has_pending_action() {
            return Err(GameError::PendingActionExists);
        }
        if !self.dice_rolled {
            return Err(GameError::DiceNotRolled);
        }
        Ok(())
    }

    /// Advances to the next player, handling the special-build ring
    /// (`special_build_queue` holds seats still owed a build window this
    /// round, in the order they announced it). Returns the outgoing
    /// player's seat so the caller can prompt a forced progress-card
    /// discard if one is owed.
    pub fn end_turn(&mut self, seat: SeatIndex) -> GameResult<()> {
        self.can_end_turn(seat)?;

        self.journal.write(JournalRecord::EndTurn { seat });
        for offer in self.trade_offers.iter_mut() {
            offer.destroy();
        }
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

        if seat != self.current_player {
            if self.cities_and_knights && self.player(seat).hand.total_dev_cards() > 4 {
                self.discard_progress_overflow(seat);
            }
            for (card_type, deck) in self.player(seat).hand.iter_dev_cards().collect::<Vec<_>>() {
                if deck.can_use {
                    self.player_mut(seat).hand.set_dev_can_use(card_type, false);
                }
            }
        }

        Ok(())
    }

    /// Returns true while the special-build phase is still in progress
    /// (i.e. the new current player owes a build window, not a full turn).
    pub(crate) fn advance_special_build_ring(&mut self, seat: SeatIndex, num_players: SeatIndex) -> bool {
        let starter = match self.special_build_queue.first().copied() {
            Some(s) => s,
            None => {
                self.special_build_active = false;
                self.current_player = (seat + 1) % num_players;
                return false;
            }
        };

        let mut next_player = None;
        for i in 1..=num_players {
            let candidate = (seat + i) % num_players;
            if candidate == starter {
                break;
            }
            if self.player(candidate).special_build {
                next_player = Some(candidate);
                self.set_special_build(candidate, false);
                break;
            }
        }

        match next_player {
            Some(p) => {
                self.current_player = p;
                true
            }
            None => {
                self.current_player = (starter + 1) % num_players;
                self.special_build_active = false;
                self.special_build_queue.clear();
                for p in 0..num_players {
                    if self.player(p).special_build {
                        self.set_special_build(p, false);
                    }
                }
                false
            }
        }
    }

    pub(crate) fn end_turn_reset_development_cards(&mut self) {
        let seat = self.current_player;
        if !self.cities_and_knights {
            for (t, deck) in self.player(seat).hand.iter_dev_cards().collect::<Vec<_>>() {
                if deck.quantity > 0 && t != DevCardType::VictoryPoint {
                    self.player_mut(seat).hand.set_dev_can_use(t, true);
                }
            }
            return;
        }

        self.player_mut(seat).hand.set_dev_can_use(DevCardType::Alchemist, true);
        self.merchant_fleet.remove(&seat);

        let knights: Vec<(u64, bool)> = self
            .player(seat)
            .vertex_placements
            .iter()
            .filter_map(|(&id, p)| match p {
                VertexBuildable::Knight { activated, .. } => Some((id, *activated)),
                _ => None,
            })
            .collect();
        for (id, activated) in knights {
            if let Some(VertexBuildable::Knight { at, activated: a, can_use, .. }) =
                self.player_mut(seat).vertex_placements.get_mut(&id)
            {
                *can_use = activated;
                let at = *at;
                let active = *a;
                self.journal.write(JournalRecord::SetKnightActive { at, active, can_use: activated });
            }
        }
    }

    /// Forced random discard of progress cards down to 4, shared by end of
    /// turn and the barbarian-attack aftermath (`original_source/game/
    /// actions_progress_coin.go`'s `DiscardProgressCard`).
    pub(crate) fn discard_progress_overflow(&mut self, seat: SeatIndex) {
        let overflow = self.player(seat).hand.total_dev_cards() - 4;
        if overflow <= 0 {
            return;
        }
        let mut remaining = overflow;
        let decks: Vec<_> = self.player(seat).hand.iter_dev_cards().collect();
        for (t, deck) in decks {
            if remaining <= 0 {
                break;
            }
            let take = deck.quantity.min(remaining);
            for _ in 0..take {
                if self.player_mut(seat).hand.try_remove_dev_card(t) {
                    if let Some(stack) = t.commodity_stack() {
                        self.bank.reinsert_progress_card(stack, t);
                        self.journal
                            .write(JournalRecord::ReinsertDevelopmentCard { stack, card: t });
                    }
                    remaining -= 1;
                }
            }
        }
    }

    pub fn begin_special_build(&mut self, seat: SeatIndex) -> GameResult<()> {
        if self.special_build_queue.is_empty() {
            self.special_build_queue.push(seat);
        } else if !self.special_build_queue.contains(&seat) {
            self.special_build_queue.push(seat);
        }
        self.special_build_active = true;
        self.set_special_build(seat, true);
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
    fn end_turn_advances_current_player_and_clears_dice() {
        let mut g = ready_state();
        g.end_turn(0).unwrap();
        assert_eq!(g.current_player, 1);
        assert!(!g.dice_rolled);
    }

    #[test]
    fn cannot_end_turn_before_rolling() {
        let mut g = ready_state();
        g.dice_rolled = false;
        assert!(g.end_turn(0).is_err());
    }

    #[test]
    fn cannot_end_turn_as_non_current_player() {
        let mut g = ready_state();
        assert!(g.end_turn(1).is_err());
    }
}
