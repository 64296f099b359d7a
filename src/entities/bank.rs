#![allow(dead_code)]
//! The bank: a shared hand plus one development-card deck order per
//! commodity stack, plus a cursor into the Base stack. See spec.md §3/§4.2.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::hand::{CardType, DevCardType, Hand};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bank {
    pub hand: Hand,
    /// Shuffled Base-game dev card order; `cursor` points at the next card to draw.
    pub base_dev_card_order: Vec<DevCardType>,
    pub base_dev_card_cursor: usize,
    /// Cities & Knights progress decks, one fixed multiset order per commodity.
    pub paper_order: Vec<DevCardType>,
    pub paper_cursor: usize,
    pub cloth_order: Vec<DevCardType>,
    pub cloth_cursor: usize,
    pub coin_order: Vec<DevCardType>,
    pub coin_cursor: usize,
}

const BASE_RESOURCE_QTY: i32 = 24;
const CK_COMMODITY_QTY: i32 = 12;

impl Bank {
    pub fn new(cities_and_knights: bool, rng: &mut impl Rng) -> Self {
        let mut hand = Hand::new();
        for t in [
            CardType::Wood,
            CardType::Brick,
            CardType::Wool,
            CardType::Wheat,
            CardType::Ore,
        ] {
            hand.add(t, BASE_RESOURCE_QTY);
        }
        if cities_and_knights {
            for t in [CardType::Paper, CardType::Cloth, CardType::Coin] {
                hand.add(t, CK_COMMODITY_QTY);
            }
        }

        let mut base_dev_card_order = Vec::new();
        base_dev_card_order.extend(std::iter::repeat(DevCardType::Knight).take(14));
        base_dev_card_order.extend(std::iter::repeat(DevCardType::VictoryPoint).take(5));
        base_dev_card_order.extend(std::iter::repeat(DevCardType::RoadBuilding).take(2));
        base_dev_card_order.extend(std::iter::repeat(DevCardType::YearOfPlenty).take(2));
        base_dev_card_order.extend(std::iter::repeat(DevCardType::Monopoly).take(2));
        base_dev_card_order.shuffle(rng);

        let (paper_order, cloth_order, coin_order) = if cities_and_knights {
            (
                shuffled_paper_deck(rng),
                shuffled_cloth_deck(rng),
                shuffled_coin_deck(rng),
            )
        } else {
            (Vec::new(), Vec::new(), Vec::new())
        };

        Bank {
            hand,
            base_dev_card_order,
            base_dev_card_cursor: 0,
            paper_order,
            paper_cursor: 0,
            cloth_order,
            cloth_cursor: 0,
            coin_order,
            coin_cursor: 0,
        }
    }

    /// Starting resource quantities with every dev-card deck order empty;
    /// replay re-populates the orders from journaled `DevelopmentCardOrder`
    /// records instead of drawing a fresh shuffle (spec.md §4.7 — a second
    /// `rng.shuffle` here would diverge from the original deal).
    pub fn new_for_replay(cities_and_knights: bool) -> Self {
        let mut hand = Hand::new();
        for t in [
            CardType::Wood,
            CardType::Brick,
            CardType::Wool,
            CardType::Wheat,
            CardType::Ore,
        ] {
            hand.add(t, BASE_RESOURCE_QTY);
        }
        if cities_and_knights {
            for t in [CardType::Paper, CardType::Cloth, CardType::Coin] {
                hand.add(t, CK_COMMODITY_QTY);
            }
        }

        Bank {
            hand,
            base_dev_card_order: Vec::new(),
            base_dev_card_cursor: 0,
            paper_order: Vec::new(),
            paper_cursor: 0,
            cloth_order: Vec::new(),
            cloth_cursor: 0,
            coin_order: Vec::new(),
            coin_cursor: 0,
        }
    }

    /// Draws the next Base dev card, advancing the cursor. `None` if exhausted.
    pub fn draw_base_dev_card(&mut self) -> Option<DevCardType> {
        if self.base_dev_card_cursor >= self.base_dev_card_order.len() {
            return None;
        }
        let card = self.base_dev_card_order[self.base_dev_card_cursor];
        self.base_dev_card_cursor += 1;
        Some(card)
    }

    pub fn draw_progress_card(&mut self, stack: CardType) -> Option<DevCardType> {
        let (order, cursor) = match stack {
            CardType::Paper => (&self.paper_order, &mut self.paper_cursor),
            CardType::Cloth => (&self.cloth_order, &mut self.cloth_cursor),
            CardType::Coin => (&self.coin_order, &mut self.coin_cursor),
            _ => return None,
        };
        if *cursor >= order.len() {
            return None;
        }
        let card = order[*cursor];
        *cursor += 1;
        Some(card)
    }

    /// Returns a development card to the bottom of its deck order (reinsert
    /// on "no legal use" cases); does not rewind the cursor.
    pub fn reinsert_progress_card(&mut self, stack: CardType, card: DevCardType) {
        match stack {
            CardType::Paper => self.paper_order.push(card),
            CardType::Cloth => self.cloth_order.push(card),
            CardType::Coin => self.coin_order.push(card),
            _ => {}
        }
    }
}

fn shuffled_paper_deck(rng: &mut impl Rng) -> Vec<DevCardType> {
    use DevCardType::*;
    let mut v = vec![
        Alchemist, Alchemist, Crane, Crane, Engineer, Engineer, Inventor, Inventor, Irrigation,
        Irrigation, Medicine, Medicine, Mining, Mining, Printer, Printer, ProgressRoadBuilding,
        ProgressRoadBuilding, Smith, Smith,
    ];
    v.shuffle(rng);
    v
}

fn shuffled_cloth_deck(rng: &mut impl Rng) -> Vec<DevCardType> {
    use DevCardType::*;
    let mut v = vec![
        CommercialHarbor,
        CommercialHarbor,
        MasterMerchant,
        MasterMerchant,
        Merchant,
        Merchant,
        MerchantFleet,
        MerchantFleet,
        ResourceMonopoly,
        ResourceMonopoly,
        TradeMonopoly,
        TradeMonopoly,
    ];
    v.shuffle(rng);
    v
}

fn shuffled_coin_deck(rng: &mut impl Rng) -> Vec<DevCardType> {
    use DevCardType::*;
    let mut v = vec![
        Bishop,
        Bishop,
        Constitution,
        Constitution,
        Deserter,
        Deserter,
        Diplomat,
        Diplomat,
        Intrigue,
        Intrigue,
        Saboteur,
        Saboteur,
        Spy,
        Spy,
        Warlord,
        Warlord,
        Wedding,
        Wedding,
    ];
    v.shuffle(rng);
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn base_dev_card_cursor_is_monotonic() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let mut bank = Bank::new(false, &mut rng);
        let total = bank.base_dev_card_order.len();
        let mut drawn = 0;
        while bank.draw_base_dev_card().is_some() {
            drawn += 1;
        }
        assert_eq!(drawn, total);
        assert_eq!(bank.base_dev_card_cursor, total);
    }
}
