#![allow(dead_code)]
//! Static map layouts. Grounded on `original_source/entities/graph.go`'s
//! `MapDefinition` shape and `original_source/game/map.go`'s row-stepping
//! placement loop; the base 4-player layout's tile/number/port counts are
//! the standard Catan distribution referenced (not transcribed) from there.

use serde::{Deserialize, Serialize};

use super::tile::TileType;

/// One cell in a map's row grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileSlot {
    /// No tile at this grid position.
    None,
    /// A fixed resource/sea type, not touched by shuffling.
    Fixed(TileType),
    /// Filled in from `random_tiles` during generation.
    Random,
    /// Filled in from `random_tiles`, but starts obscured (C&K fog island).
    Fog,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapDefinition {
    pub name: String,
    /// Row-major grid; each row is stepped left-to-right in tile-coordinate
    /// space starting from a per-row origin (see `Graph::generate`).
    pub rows: Vec<Vec<TileSlot>>,
    /// One entry per row: `true` shifts the next row's origin left, `false` right.
    pub order: Vec<bool>,
    /// Number tokens to distribute over non-desert, non-sea tiles (excludes 7).
    pub numbers: Vec<u32>,
    /// Shuffled into every `Random`/`Fog` slot, in generation order.
    pub random_tiles: Vec<TileType>,
    /// One port ratio token per port to place, consumed in shuffle order.
    pub ports: Vec<super::tile::PortRatio>,
}

impl MapDefinition {
    /// The standard 4-player base board: 19 land tiles in a 3-4-5-4-3
    /// arrangement, 18 number tokens, 9 ports (4 generic, 5 resource).
    pub fn base_4_player() -> Self {
        use TileSlot::Random as R;

        MapDefinition {
            name: "base-4p".to_string(),
            rows: vec![
                vec![R, R, R],
                vec![R, R, R, R],
                vec![R, R, R, R, R],
                vec![R, R, R, R],
                vec![R, R, R],
            ],
            order: vec![true, true, false, false, false],
            numbers: vec![
                5, 2, 6, 3, 8, 10, 9, 12, 11, 4, 8, 10, 9, 4, 5, 6, 3, 11,
            ],
            random_tiles: vec![
                TileType::Wood,
                TileType::Wood,
                TileType::Wood,
                TileType::Wood,
                TileType::Brick,
                TileType::Brick,
                TileType::Brick,
                TileType::Wool,
                TileType::Wool,
                TileType::Wool,
                TileType::Wool,
                TileType::Wheat,
                TileType::Wheat,
                TileType::Wheat,
                TileType::Wheat,
                TileType::Ore,
                TileType::Ore,
                TileType::Ore,
                TileType::Desert,
            ],
            ports: vec![
                super::tile::PortRatio::TwoToOne(TileType::Wood),
                super::tile::PortRatio::TwoToOne(TileType::Brick),
                super::tile::PortRatio::TwoToOne(TileType::Wool),
                super::tile::PortRatio::TwoToOne(TileType::Wheat),
                super::tile::PortRatio::TwoToOne(TileType::Ore),
                super::tile::PortRatio::ThreeToOne,
                super::tile::PortRatio::ThreeToOne,
                super::tile::PortRatio::ThreeToOne,
                super::tile::PortRatio::ThreeToOne,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_map_has_nineteen_land_tiles_and_matching_numbers() {
        let defn = MapDefinition::base_4_player();
        let tile_count: usize = defn.rows.iter().map(|r| r.len()).sum();
        assert_eq!(tile_count, 19);
        assert_eq!(defn.random_tiles.len(), 19);
        // one fewer number than tile since the desert carries none
        assert_eq!(defn.numbers.len(), 18);
        assert_eq!(defn.ports.len(), 9);
    }
}
