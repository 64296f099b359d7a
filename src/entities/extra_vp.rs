#![allow(dead_code)]
//! Extra victory point bookkeeping: longest road, largest army, C&K
//! defender points / constitution / printer / metropolis holders. Grounded
//! on `original_source/entities/victory_points.go` and spec.md §3.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entities::buildable::SeatIndex;
use crate::entities::hand::CardType;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtraVictoryPoints {
    pub longest_road_holder: Option<SeatIndex>,
    pub longest_road_length: u32,
    pub largest_army_holder: Option<SeatIndex>,
    pub largest_army_count: u32,
    /// C&K: 8 defender-point slots, filled in barbarian-attack order.
    pub defender_points: Vec<SeatIndex>,
    pub constitution_holder: Option<SeatIndex>,
    pub printer_holder: Option<SeatIndex>,
    /// C&K: metropolis holder per commodity.
    pub metropolis_holders: HashMap<CardType, SeatIndex>,
}

impl ExtraVictoryPoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Longest road must exceed 4 (tie does not displace the holder, S8).
    pub fn consider_longest_road(&mut self, seat: SeatIndex, length: u32) {
        if length < 5 {
            if self.longest_road_holder == Some(seat) && length < self.longest_road_length {
                // the holder's own road shrank below the threshold, e.g. a displaced piece
                self.longest_road_holder = None;
                self.longest_road_length = 0;
            }
            return;
        }
        if length > self.longest_road_length {
            self.longest_road_holder = Some(seat);
            self.longest_road_length = length;
        }
    }

    /// Largest army requires >= 3 activated knights and strictly more than the current holder.
    pub fn consider_largest_army(&mut self, seat: SeatIndex, count: u32) {
        if count < 3 {
            return;
        }
        if count > self.largest_army_count {
            self.largest_army_holder = Some(seat);
            self.largest_army_count = count;
        }
    }

    pub fn vp_for_seat(&self, seat: SeatIndex) -> u32 {
        let mut vp = 0;
        if self.longest_road_holder == Some(seat) {
            vp += 2;
        }
        if self.largest_army_holder == Some(seat) {
            vp += 2;
        }
        vp += self.defender_points.iter().filter(|&&s| s == seat).count() as u32;
        if self.constitution_holder == Some(seat) {
            vp += 1;
        }
        if self.printer_holder == Some(seat) {
            vp += 1;
        }
        vp += self.metropolis_holders.values().filter(|&&s| s == seat).count() as u32 * 2;
        vp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_road_requires_five_and_no_tie_displacement() {
        let mut evp = ExtraVictoryPoints::new();
        evp.consider_longest_road(0, 4);
        assert_eq!(evp.longest_road_holder, None);
        evp.consider_longest_road(0, 5);
        assert_eq!(evp.longest_road_holder, Some(0));
        evp.consider_longest_road(1, 5);
        assert_eq!(evp.longest_road_holder, Some(0), "a tie must not displace the holder");
        evp.consider_longest_road(1, 6);
        assert_eq!(evp.longest_road_holder, Some(1));
    }
}
