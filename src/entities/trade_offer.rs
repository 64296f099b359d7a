#![allow(dead_code)]
//! Trade offers as first-class entities with destroy semantics (§9's
//! "Trade offer life-cycle" design note). Grounded on
//! `original_source/entities/player.go`'s `TradeOffer`/`TradeOfferDetails`.

use serde::{Deserialize, Serialize};

use crate::entities::buildable::SeatIndex;
use crate::entities::hand::CardType;

/// Index 0 is unused; indices 1..=8 map to `CardType` discriminants + 1 so
/// the wire shape matches the original's fixed `[9]int` arrays exactly.
pub type CardVector = [i32; 9];

pub fn card_index(t: CardType) -> usize {
    match t {
        CardType::Wood => 1,
        CardType::Brick => 2,
        CardType::Wool => 3,
        CardType::Wheat => 4,
        CardType::Ore => 5,
        CardType::Paper => 6,
        CardType::Cloth => 7,
        CardType::Coin => 8,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Acceptance {
    Pending,
    Yes,
    No,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeOfferDetails {
    pub give: CardVector,
    pub ask: CardVector,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeOffer {
    pub id: u32,
    pub created_by: SeatIndex,
    pub current_player: SeatIndex,
    pub details: TradeOfferDetails,
    pub acceptances: Vec<Acceptance>,
    pub destroyed: bool,
}

impl TradeOffer {
    pub fn new(
        id: u32,
        created_by: SeatIndex,
        current_player: SeatIndex,
        details: TradeOfferDetails,
        num_players: usize,
        embargos_against_current: impl Fn(SeatIndex) -> bool,
    ) -> Self {
        let mut acceptances = vec![Acceptance::Pending; num_players];
        acceptances[created_by as usize] = Acceptance::Yes;
        for seat in 0..num_players {
            if seat as SeatIndex == created_by {
                continue;
            }
            if embargos_against_current(seat as SeatIndex) {
                acceptances[seat] = Acceptance::No;
            }
        }
        TradeOffer {
            id,
            created_by,
            current_player,
            details,
            acceptances,
            destroyed: false,
        }
    }

    pub fn destroy(&mut self) {
        // idempotent, per §9
        self.destroyed = true;
    }
}

/// Monotonic id generator shared by one game (`OfferCounter`, spec.md §3).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct OfferCounter(u32);

impl OfferCounter {
    pub fn next(&mut self) -> u32 {
        self.0 += 1;
        self.0
    }
}
