#![allow(dead_code)]
//! Tile, vertex and edge records. Grounded on `games_service/tiles/tile.rs`
//! and `games_service/roads/road.rs` for the field shape, generalized to
//! the weak-back-reference design note in spec.md §9.

use serde::{Deserialize, Serialize};

use super::coordinate::{EdgeCoord, TileCoord, VertexCoord};
use crate::entities::buildable::BuildableId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileType {
    Wood,
    Brick,
    Wool,
    Wheat,
    Ore,
    Desert,
    Sea,
    Fog,
    Gold,
}

impl TileType {
    pub fn is_resource(&self) -> bool {
        matches!(
            self,
            TileType::Wood | TileType::Brick | TileType::Wool | TileType::Wheat | TileType::Ore
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub key: TileCoord,
    pub tile_type: TileType,
    /// Number token 2..=12, excluding 7. `0` for sea/desert/fog-without-number.
    pub number: u32,
    pub fog: bool,
}

impl Tile {
    pub fn new(key: TileCoord, tile_type: TileType, number: u32) -> Self {
        let fog = tile_type == TileType::Fog;
        Self {
            key,
            tile_type,
            number,
            fog,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Vertex {
    /// Weak back-reference: presence lives here, quantity/identity lives on the player.
    pub placement: Option<BuildableId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Edge {
    pub placement: Option<BuildableId>,
    pub is_beach: bool,
    pub port: Option<Port>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortRatio {
    ThreeToOne,
    TwoToOne(TileType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub ratio: PortRatio,
    pub edge: EdgeCoord,
}
