#![allow(dead_code)]
//! Shared validation and the card-movement primitive every rules operation
//! funnels through. Grounded on `original_source/game/game.go`'s
//! `EnsureCurrentPlayer`/dice-rolled/pending-action guards (spec.md §4.3)
//! and `original_source/entities/hand.go`'s card-transfer helpers, unified
//! here into one `MoveCards` per spec.md §4.2.

use crate::entities::buildable::SeatIndex;
use crate::entities::hand::CardType;
use crate::error::{GameError, GameResult};
use crate::journal::JournalRecord;

use super::state::GameState;

impl GameState {
    /// The four checks every rules-engine operation opens with (spec.md §4.3):
    /// caller is current player, dice rolled, no pending action, not special-build
    /// unless the op explicitly allows it. `allow_init` skips the first two
    /// during the placement phase; `allow_special_build` skips the fourth.
    pub fn validate_turn(
        &self,
        seat: SeatIndex,
        allow_init: bool,
        allow_special_build: bool,
    ) -> GameResult<()> {
        if !allow_init {
            if seat != self.current_player {
                return Err(GameError::NotCurrentPlayer);
            }
            if !self.dice_rolled {
                return Err(GameError::DiceNotRolled);
            }
        }
        if self.player(seat).has_pending_action() {
            return Err(GameError::PendingActionExists);
        }
        if self.special_build_active && !allow_special_build {
            return Err(GameError::InvalidDuringSpecialBuild);
        }
        Ok(())
    }

    pub fn has_at_least(&self, seat: SeatIndex, costs: &[(CardType, i32)]) -> bool {
        let hand = &self.player(seat).hand;
        costs.iter().all(|&(t, qty)| hand.count(t) >= qty)
    }

    /// Moves `qty` of `card` between two hands (bank = `None`), optionally
    /// journaling and broadcasting. Returns an error without mutating if the
    /// source can't afford it; callers are expected to have validated via
    /// `has_at_least` first for player->anything transfers.
    pub fn move_cards(
        &mut self,
        from: Option<SeatIndex>,
        to: Option<SeatIndex>,
        card: CardType,
        qty: i32,
        journal: bool,
    ) -> GameResult<()> {
        if qty <= 0 {
            return Ok(());
        }

        let available = match from {
            Some(seat) => self.player(seat).hand.count(card),
            None => self.bank.hand.count(card),
        };
        if available < qty {
            return Err(GameError::InsufficientResources);
        }

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

        if journal {
            self.journal.write(JournalRecord::UpdateCard { from, to, card, qty });
        }
        Ok(())
    }

    /// A roll-distribution variant of `move_cards`: grants `qty` of `card`
    /// from the bank to `seat` only if the bank can satisfy every gainer of
    /// that type this roll (suppression is enforced by the caller, which
    /// pre-computes total demand before calling this for any individual seat).
    pub fn grant_from_bank(&mut self, seat: SeatIndex, card: CardType, qty: i32) {
        if qty <= 0 {
            return;
        }
        self.bank.hand.try_remove(card, qty);
        self.player_mut(seat).hand.add(card, qty);
        self.journal
            .write(JournalRecord::UpdateCard { from: None, to: Some(seat), card, qty });
    }

    /// Conjures `qty` of `card` into `seat`'s hand without touching the
    /// bank's stock, for progress cards that hand out the exact resources a
    /// build requires (`original_source/game/actions_progress_paper.go`'s
    /// Medicine/Smith/Engineer comment "Do not check the bank").
    pub(crate) fn grant_free(&mut self, seat: SeatIndex, card: CardType, qty: i32) {
        if qty <= 0 {
            return;
        }
        self.player_mut(seat).hand.add(card, qty);
        self.journal
            .write(JournalRecord::UpdateCard { from: None, to: Some(seat), card, qty });
    }

    /// Undoes a `grant_free` that turned out not to be spendable (the build
    /// it was meant to pay for was illegal after all), also without
    /// touching the bank.
    pub(crate) fn revoke_free(&mut self, seat: SeatIndex, card: CardType, qty: i32) {
        if qty <= 0 {
            return;
        }
        self.player_mut(seat).hand.try_remove(card, qty);
        self.journal
            .write(JournalRecord::UpdateCard { from: Some(seat), to: None, card, qty });
    }
}
