#![allow(dead_code)]
//! Polymorphic buildables: a tagged variant sharing an owner/location
//! capability, per the §9 design note ("Polymorphic buildables").

use serde::{Deserialize, Serialize};

use crate::board::coordinate::{EdgeCoord, VertexCoord};

pub type SeatIndex = u8;

/// A weak back-reference a vertex/edge holds into the owning player's
/// placement table (§9's "Cyclic graph" design note). Presence lives on the
/// graph; quantity and identity live on the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildableId {
    pub owner: SeatIndex,
    pub id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildableType {
    Settlement,
    City,
    Road,
    Knight,
    /// C&K: defensive city upgrade, capped at 3 per player.
    Wall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KnightLevel {
    Basic,
    Strong,
    Mighty,
}

impl KnightLevel {
    pub fn strength(&self) -> u32 {
        match self {
            KnightLevel::Basic => 1,
            KnightLevel::Strong => 2,
            KnightLevel::Mighty => 3,
        }
    }

    pub fn upgrade(&self) -> Option<KnightLevel> {
        match self {
            KnightLevel::Basic => Some(KnightLevel::Strong),
            KnightLevel::Strong => Some(KnightLevel::Mighty),
            KnightLevel::Mighty => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VertexBuildable {
    Settlement {
        id: BuildableId,
        at: VertexCoord,
    },
    City {
        id: BuildableId,
        at: VertexCoord,
        /// C&K: has this city been upgraded with a defensive wall?
        wall: bool,
        /// C&K: is this city the metropolis for some commodity?
        metropolis: bool,
    },
    Knight {
        id: BuildableId,
        at: VertexCoord,
        level: KnightLevel,
        activated: bool,
        can_use: bool,
    },
}

impl VertexBuildable {
    pub fn id(&self) -> BuildableId {
        match self {
            VertexBuildable::Settlement { id, .. }
            | VertexBuildable::City { id, .. }
            | VertexBuildable::Knight { id, .. } => *id,
        }
    }

    pub fn at(&self) -> VertexCoord {
        match self {
            VertexBuildable::Settlement { at, .. }
            | VertexBuildable::City { at, .. }
            | VertexBuildable::Knight { at, .. } => *at,
        }
    }

    pub fn kind(&self) -> BuildableType {
        match self {
            VertexBuildable::Settlement { .. } => BuildableType::Settlement,
            VertexBuildable::City { .. } => BuildableType::City,
            VertexBuildable::Knight { .. } => BuildableType::Knight,
        }
    }

    /// Resource-generation multiplier on dice rolls: settlement=1, city=2.
    pub fn resource_multiplier(&self) -> u32 {
        match self {
            VertexBuildable::Settlement { .. } => 1,
            VertexBuildable::City { .. } => 2,
            VertexBuildable::Knight { .. } => 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadBuildable {
    pub id: BuildableId,
    pub at: EdgeCoord,
}
