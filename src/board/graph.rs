#![allow(dead_code)]
//! Board generation. Grounded on `original_source/game/map.go`
//! (`generateMapInner`/`generateVertices`/`generateEdges`/`generatePorts`)
//! and `original_source/game/assignment.go` (`assignTileTypes`/`assignNumbers`)
//! for the exact placement, shuffle and red-number-spacing algorithms.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::coordinate::{EdgeCoord, TileCoord, VertexCoord};
use super::map_definition::{MapDefinition, TileSlot};
use super::tile::{Edge, Port, Tile, TileType, Vertex};

/// Six-neighborhood deltas between tile centers, used to keep red (6/8)
/// numbers from sharing a vertex (`original_source/game/assignment.go`).
const RED_NEIGHBOR_DELTAS: [(i32, i32); 6] =
    [(2, -4), (4, 0), (2, 4), (-2, 4), (-4, 0), (-2, -4)];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    pub tiles: HashMap<TileCoord, Tile>,
    pub vertices: HashMap<VertexCoord, Vertex>,
    pub edges: HashMap<EdgeCoord, Edge>,
    pub ports: Vec<Port>,
    pub robber: TileCoord,
}

impl Graph {
    pub fn generate(defn: &MapDefinition, rng: &mut impl Rng) -> Self {
        let (mut tiles, random_coords, fog_coords) = place_tiles(defn);

        let pending: Vec<TileCoord> = random_coords.into_iter().chain(fog_coords).collect();
        assign_tile_types(&mut tiles, &defn.random_tiles, &pending, rng);
        let robber = assign_numbers(&mut tiles, &defn.numbers, rng);

        let mut graph = Graph {
            tiles,
            vertices: HashMap::new(),
            edges: HashMap::new(),
            ports: Vec::new(),
            robber,
        };
        graph.finalize_vertices_edges();
        graph.assign_ports(defn, rng);
        graph
    }

    /// An empty board a replay fills in tile-by-tile from journaled
    /// `CreateTile`/`GenVerticesEdges`/`SetTileType`/`SetPorts`/`SetRobber`
    /// records (spec.md §4.7), rather than re-running `generate`'s RNG draws.
    pub fn empty() -> Self {
        Graph {
            tiles: HashMap::new(),
            vertices: HashMap::new(),
            edges: HashMap::new(),
            ports: Vec::new(),
            robber: TileCoord::new(0, 0),
        }
    }

    pub fn insert_tile(&mut self, tile: Tile) {
        self.tiles.insert(tile.key, tile);
    }

    /// Derives the vertex/edge tables (with beach flags) from `self.tiles`.
    /// Shared by fresh generation and by replay's `GenVerticesEdges` record,
    /// which fires once every `CreateTile` for the board has been applied.
    pub fn finalize_vertices_edges(&mut self) {
        let mut vertices: HashMap<VertexCoord, Vertex> = HashMap::new();
        let mut edges: HashMap<EdgeCoord, Edge> = HashMap::new();
        let mut edge_tile_count: HashMap<EdgeCoord, u32> = HashMap::new();

        for tile in self.tiles.values() {
            for v in tile.key.vertices() {
                vertices.entry(v).or_default();
            }
            for e in tile.key.edges() {
                edges.entry(e).or_default();
                *edge_tile_count.entry(e).or_insert(0) += 1;
            }
        }
        for (coord, edge) in edges.iter_mut() {
            edge.is_beach = edge_tile_count.get(coord).copied().unwrap_or(0) == 1;
        }

        self.vertices = vertices;
        self.edges = edges;
    }

    pub fn set_tile_type(&mut self, center: TileCoord, tile_type: TileType, number: u32) {
        if let Some(t) = self.tiles.get_mut(&center) {
            t.tile_type = tile_type;
            t.number = number;
            t.fog = false;
        }
    }

    pub fn set_robber(&mut self, center: TileCoord) {
        self.robber = center;
    }

    /// Replaces the port list wholesale and mirrors each port onto its edge,
    /// for replay's `SetPorts` record (generation instead calls `assign_ports`).
    pub fn set_ports(&mut self, ports: Vec<Port>) {
        for port in &ports {
            if let Some(e) = self.edges.get_mut(&port.edge) {
                e.port = Some(*port);
            }
        }
        self.ports = ports;
    }

    fn assign_ports(&mut self, defn: &MapDefinition, rng: &mut impl Rng) {
        let mut beach: Vec<EdgeCoord> = self
            .edges
            .iter()
            .filter(|(_, e)| e.is_beach)
            .map(|(c, _)| *c)
            .collect();
        // deterministic starting order; randomness comes from the draws below
        beach.sort_by_key(|c| (c.c1.x, c.c1.y, c.c2.x, c.c2.y));

        for &ratio in &defn.ports {
            if beach.is_empty() {
                break;
            }
            let idx = rng.gen_range(0..beach.len());
            let chosen = beach[idx];
            let port = Port { ratio, edge: chosen };
            self.ports.push(port);
            if let Some(e) = self.edges.get_mut(&chosen) {
                e.port = Some(port);
            }

            let [c1, c2] = chosen.endpoints();
            beach.retain(|e| {
                let [a, b] = e.endpoints();
                a != c1 && a != c2 && b != c1 && b != c2
            });
        }
    }

    /// Tiles sharing `v` as one of their six vertices.
    pub fn tiles_touching_vertex(&self, v: VertexCoord) -> Vec<TileCoord> {
        self.tiles
            .keys()
            .copied()
            .filter(|t| t.vertices().contains(&v))
            .collect()
    }

    /// Tiles sharing `e` as one of their six edges.
    pub fn tiles_touching_edge(&self, e: EdgeCoord) -> Vec<TileCoord> {
        self.tiles
            .keys()
            .copied()
            .filter(|t| t.edges().contains(&e))
            .collect()
    }

    /// Vertices adjacent to a tile with the given roll, for resource distribution.
    pub fn vertices_for_roll(&self, roll: u32) -> Vec<(TileCoord, VertexCoord)> {
        self.tiles
            .values()
            .filter(|t| t.number == roll && !t.fog && self.robber != t.key)
            .flat_map(|t| t.key.vertices().into_iter().map(move |v| (t.key, v)))
            .collect()
    }
}

fn place_tiles(defn: &MapDefinition) -> (HashMap<TileCoord, Tile>, Vec<TileCoord>, Vec<TileCoord>) {
    let mut tiles = HashMap::new();
    let mut random_coords = Vec::new();
    let mut fog_coords = Vec::new();

    let mut start_x: i32 = 2;
    let mut start_y: i32 = 3;

    for (i, row) in defn.rows.iter().enumerate() {
        let odd = defn.order.get(i).copied().unwrap_or(true);
        let mut x = start_x;
        let y = start_y;

        for slot in row {
            let center = TileCoord::new(x, y);
            match slot {
                TileSlot::None => {}
                TileSlot::Fixed(t) => {
                    tiles.insert(
                        center,
                        Tile {
                            key: center,
                            tile_type: *t,
                            number: 0,
                            fog: false,
                        },
                    );
                }
                TileSlot::Random => {
                    tiles.insert(
                        center,
                        Tile {
                            key: center,
                            tile_type: TileType::Desert,
                            number: 0,
                            fog: false,
                        },
                    );
                    random_coords.push(center);
                }
                TileSlot::Fog => {
                    tiles.insert(
                        center,
                        Tile {
                            key: center,
                            tile_type: TileType::Fog,
                            number: 0,
                            fog: true,
                        },
                    );
                    fog_coords.push(center);
                }
            }
            x += 4;
        }

        let factor = if odd { -2 } else { 2 };
        start_x += factor;
        start_y += 4;
    }

    (tiles, random_coords, fog_coords)
}

fn assign_tile_types(
    tiles: &mut HashMap<TileCoord, Tile>,
    random_tiles: &[TileType],
    pending: &[TileCoord],
    rng: &mut impl Rng,
) {
    let mut types: Vec<TileType> = random_tiles.to_vec();
    types.shuffle(rng);
    let mut types = types.into_iter();

    for coord in pending {
        let Some(t) = types.next() else { break };
        if let Some(tile) = tiles.get_mut(coord) {
            tile.tile_type = t;
        }
    }
}

/// Distributes number tokens, keeping red (6/8) numbers off shared vertices
/// where possible, and returns the robber's starting tile.
fn assign_numbers(tiles: &mut HashMap<TileCoord, Tile>, numbers: &[u32], rng: &mut impl Rng) -> TileCoord {
    let red: Vec<u32> = numbers.iter().copied().filter(|&n| n == 6 || n == 8).collect();
    let mut white: Vec<u32> = numbers.iter().copied().filter(|&n| n != 6 && n != 8).collect();

    let mut red_pool: Vec<TileCoord> = Vec::new();
    let mut all_pool: Vec<TileCoord> = Vec::new();
    let mut robber = None;

    for (coord, tile) in tiles.iter() {
        if tile.tile_type.is_resource() {
            red_pool.push(*coord);
            all_pool.push(*coord);
        } else if !tile.fog && robber.is_none() {
            robber = Some(*coord);
        }
    }
    if robber.is_none() {
        robber = tiles.iter().find(|(_, t)| !t.fog).map(|(c, _)| *c);
    }

    for num in red {
        if red_pool.is_empty() {
            white.push(num);
            continue;
        }
        let idx = rng.gen_range(0..red_pool.len());
        let coord = red_pool[idx];
        if let Some(t) = tiles.get_mut(&coord) {
            t.number = num;
        }
        red_pool.retain(|c| *c != coord);
        all_pool.retain(|c| *c != coord);
        for (dx, dy) in RED_NEIGHBOR_DELTAS {
            let neighbor = TileCoord::new(coord.x + dx, coord.y + dy);
            red_pool.retain(|c| *c != neighbor);
        }
    }

    for num in white {
        if all_pool.is_empty() {
            break;
        }
        let idx = rng.gen_range(0..all_pool.len());
        let coord = all_pool[idx];
        if let Some(t) = tiles.get_mut(&coord) {
            t.number = num;
        }
        all_pool.retain(|c| *c != coord);
    }

    robber.unwrap_or_else(|| *tiles.keys().next().expect("board has at least one tile"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn generate_produces_full_base_board() {
        let defn = MapDefinition::base_4_player();
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let graph = Graph::generate(&defn, &mut rng);

        assert_eq!(graph.tiles.len(), 19);
        assert_eq!(graph.ports.len(), 9);
        let numbered: usize = graph.tiles.values().filter(|t| t.number != 0).count();
        assert_eq!(numbered, 18);
        assert!(graph.tiles.contains_key(&graph.robber));
    }

    #[test]
    fn red_numbers_never_share_a_vertex_on_base_board() {
        let defn = MapDefinition::base_4_player();
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let graph = Graph::generate(&defn, &mut rng);

        let reds: Vec<TileCoord> = graph
            .tiles
            .values()
            .filter(|t| t.number == 6 || t.number == 8)
            .map(|t| t.key)
            .collect();

        for &a in &reds {
            for (dx, dy) in RED_NEIGHBOR_DELTAS {
                let neighbor = TileCoord::new(a.x + dx, a.y + dy);
                assert!(
                    !reds.contains(&neighbor) || reds.len() > 18,
                    "red numbers {:?} and {:?} are adjacent",
                    a,
                    neighbor
                );
            }
        }
    }
}
