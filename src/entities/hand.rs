#![allow(dead_code)]
//! A hand is `(card-type -> deck) and (dev-card-type -> deck)`. Grounded on
//! `original_source/entities/hand.go` and `entities/card.go` for the deck
//! shape and initial quantities, and spec.md §3/§4.2.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum CardType {
    Wood,
    Brick,
    Wool,
    Wheat,
    Ore,
    Paper,
    Cloth,
    Coin,
}

impl CardType {
    pub fn is_resource(&self) -> bool {
        matches!(
            self,
            CardType::Wood | CardType::Brick | CardType::Wool | CardType::Wheat | CardType::Ore
        )
    }

    pub fn is_commodity(&self) -> bool {
        matches!(self, CardType::Paper | CardType::Cloth | CardType::Coin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum DevCardType {
    Knight,
    VictoryPoint,
    RoadBuilding,
    YearOfPlenty,
    Monopoly,
    // Paper stack
    Alchemist,
    Crane,
    Engineer,
    Inventor,
    Irrigation,
    Medicine,
    Mining,
    Printer,
    ProgressRoadBuilding,
    Smith,
    // Cloth stack
    CommercialHarbor,
    MasterMerchant,
    Merchant,
    MerchantFleet,
    ResourceMonopoly,
    TradeMonopoly,
    // Coin stack
    Bishop,
    Constitution,
    Deserter,
    Diplomat,
    Intrigue,
    Saboteur,
    Spy,
    Warlord,
    Wedding,
}

impl DevCardType {
    pub fn commodity_stack(&self) -> Option<CardType> {
        use DevCardType::*;
        match self {
            Alchemist | Crane | Engineer | Inventor | Irrigation | Medicine | Mining | Printer
            | ProgressRoadBuilding | Smith => Some(CardType::Paper),
            CommercialHarbor | MasterMerchant | Merchant | MerchantFleet | ResourceMonopoly
            | TradeMonopoly => Some(CardType::Cloth),
            Bishop | Constitution | Deserter | Diplomat | Intrigue | Saboteur | Spy | Warlord
            | Wedding => Some(CardType::Coin),
            _ => None,
        }
    }

    /// Progress cards that grant VP without entering the hand (§4.4 event die).
    pub fn is_silent_vp(&self) -> bool {
        matches!(self, DevCardType::Printer | DevCardType::Constitution)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DevCardDeck {
    pub quantity: i32,
    pub can_use: bool,
    pub num_used: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hand {
    cards: HashMap<CardType, i32>,
    dev_cards: HashMap<DevCardType, DevCardDeck>,
}

impl Hand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, t: CardType) -> i32 {
        *self.cards.get(&t).unwrap_or(&0)
    }

    pub fn total_cards(&self) -> i32 {
        self.cards.values().sum()
    }

    pub fn total_dev_cards(&self) -> i32 {
        self.dev_cards.values().map(|d| d.quantity).sum()
    }

    pub fn add(&mut self, t: CardType, qty: i32) {
        *self.cards.entry(t).or_insert(0) += qty;
    }

    /// Removes `qty` of `t`; returns false (no-op) if insufficient.
    pub fn try_remove(&mut self, t: CardType, qty: i32) -> bool {
        let have = self.count(t);
        if have < qty {
            return false;
        }
        self.cards.insert(t, have - qty);
        true
    }

    pub fn has_at_least(&self, t: CardType, qty: i32) -> bool {
        self.count(t) >= qty
    }

    pub fn iter_cards(&self) -> impl Iterator<Item = (CardType, i32)> + '_ {
        self.cards.iter().map(|(&t, &q)| (t, q))
    }

    pub fn dev_deck(&self, t: DevCardType) -> DevCardDeck {
        self.dev_cards.get(&t).copied().unwrap_or_default()
    }

    pub fn add_dev_card(&mut self, t: DevCardType, can_use: bool) {
        let deck = self.dev_cards.entry(t).or_insert_with(DevCardDeck::default);
        deck.quantity += 1;
        if deck.quantity == 1 {
            deck.can_use = can_use;
        }
    }

    pub fn try_remove_dev_card(&mut self, t: DevCardType) -> bool {
        if let Some(deck) = self.dev_cards.get_mut(&t) {
            if deck.quantity > 0 {
                deck.quantity -= 1;
                deck.num_used += 1;
                return true;
            }
        }
        false
    }

    pub fn usable_dev_cards(&self) -> impl Iterator<Item = DevCardType> + '_ {
        self.dev_cards
            .iter()
            .filter(|(_, d)| d.quantity > 0 && d.can_use)
            .map(|(&t, _)| t)
    }

    pub fn iter_dev_cards(&self) -> impl Iterator<Item = (DevCardType, DevCardDeck)> + '_ {
        self.dev_cards.iter().map(|(&t, &d)| (t, d))
    }

    /// Makes every held dev card usable again (start-of-turn reset, §4.3 End turn).
    pub fn refresh_can_use(&mut self) {
        for deck in self.dev_cards.values_mut() {
            if deck.quantity > 0 {
                deck.can_use = true;
            }
        }
    }

    /// Sets `can_use` for one held dev card type, leaving the rest alone.
    pub fn set_dev_can_use(&mut self, t: DevCardType, can_use: bool) {
        if let Some(deck) = self.dev_cards.get_mut(&t) {
            deck.can_use = can_use;
        }
    }

    pub fn knight_card_deck(&self) -> DevCardDeck {
        self.dev_deck(DevCardType::Knight)
    }

    /// Picks one held card type weighted by quantity, for the robber's
    /// steal and forced random discards (`original_source/entities/hand.go`'s
    /// `ChooseRandomCardType`).
    pub fn random_card_type(&self, rng: &mut impl rand::Rng) -> Option<CardType> {
        let total = self.total_cards();
        if total <= 0 {
            return None;
        }
        let mut pick = rng.gen_range(0..total);
        for (t, q) in self.iter_cards() {
            if q <= 0 {
                continue;
            }
            if pick < q {
                return Some(t);
            }
            pick -= q;
        }
        None
    }

    /// Picks one held progress card weighted by quantity, for Spy's blind
    /// steal (`original_source/game/actions_progress_coin.go`'s
    /// `UseSpy` random fallback when the caller doesn't specify one).
    pub fn random_dev_card_type(&self, rng: &mut impl rand::Rng) -> Option<DevCardType> {
        let candidates: Vec<(DevCardType, i32)> = self
            .iter_dev_cards()
            .filter(|&(t, d)| d.quantity > 0 && t.commodity_stack().is_some())
            .map(|(t, d)| (t, d.quantity))
            .collect();
        let total: i32 = candidates.iter().map(|&(_, q)| q).sum();
        if total <= 0 {
            return None;
        }
        let mut pick = rng.gen_range(0..total);
        for (t, q) in candidates {
            if pick < q {
                return Some(t);
            }
            pick -= q;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_remove_rejects_insufficient() {
        let mut h = Hand::new();
        h.add(CardType::Wood, 1);
        assert!(!h.try_remove(CardType::Wood, 2));
        assert_eq!(h.count(CardType::Wood), 1);
    }

    #[test]
    fn dev_card_round_trips() {
        let mut h = Hand::new();
        h.add_dev_card(DevCardType::Knight, false);
        assert_eq!(h.dev_deck(DevCardType::Knight).quantity, 1);
        assert!(!h.dev_deck(DevCardType::Knight).can_use);
        h.refresh_can_use();
        assert!(h.dev_deck(DevCardType::Knight).can_use);
        assert!(h.try_remove_dev_card(DevCardType::Knight));
        assert_eq!(h.dev_deck(DevCardType::Knight).quantity, 0);
    }
}
