//! Game map structure with tiles and spatial queries.
//!
//! Tiles live in a flat row-major arena indexed by [`TileId`]; anything that
//! needs to reference a tile holds its id rather than a pointer into the map.

use crate::hex::OffsetCoord;
use crate::types::TileId;
use serde::{Deserialize, Serialize};

/// The game map containing all tiles.
///
/// Width, height and the tile list are fixed for the lifetime of a game.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Map {
    /// Map width in tiles.
    pub width: u32,
    /// Map height in tiles.
    pub height: u32,
    /// All tiles in row-major order (`row * width + col`).
    pub tiles: Vec<Tile>,
}

impl Map {
    /// Create a map filled with a single terrain type.
    pub fn filled(width: u32, height: u32, terrain: Terrain) -> Self {
        let mut tiles = Vec::with_capacity((width * height) as usize);
        for row in 0..height as i32 {
            for col in 0..width as i32 {
                let coord = OffsetCoord::new(col, row);
                tiles.push(Tile::new((row as u32 * width + col as u32) as TileId, coord, terrain));
            }
        }
        Self { width, height, tiles }
    }

    /// Build a map from an existing tile list.
    ///
    /// Tiles must already be in row-major order matching `width`/`height`.
    pub fn from_tiles(width: u32, height: u32, tiles: Vec<Tile>) -> Self {
        Self { width, height, tiles }
    }

    /// Check if a coordinate is within the map bounds.
    pub fn in_bounds(&self, coord: &OffsetCoord) -> bool {
        coord.in_bounds(self.width, self.height)
    }

    /// Get the tile id for a coordinate, if in bounds.
    pub fn tile_id(&self, coord: &OffsetCoord) -> Option<TileId> {
        if !self.in_bounds(coord) {
            return None;
        }
        Some(coord.row as u32 * self.width + coord.col as u32)
    }

    /// Get a tile at the given coordinate.
    pub fn get(&self, coord: &OffsetCoord) -> Option<&Tile> {
        self.tile_id(coord).map(|id| &self.tiles[id as usize])
    }

    /// Get a tile by id.
    pub fn get_by_id(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id as usize)
    }

    /// Get valid neighbors of a hex (respecting map boundaries).
    ///
    /// Order follows the cube direction enumeration.
    pub fn neighbors(&self, coord: &OffsetCoord) -> Vec<OffsetCoord> {
        coord
            .to_cube()
            .neighbors()
            .into_iter()
            .map(|c| c.to_offset())
            .filter(|c| self.in_bounds(c))
            .collect()
    }

    /// Count total tiles in the map.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Iterate over all tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }
}

/// A single tile on the map.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tile {
    /// Arena index of this tile.
    pub id: TileId,
    /// Position on the map.
    pub coord: OffsetCoord,
    /// Terrain classification.
    pub terrain: Terrain,
    /// Optional resource deposit.
    pub resource: Option<ResourceDeposit>,
}

impl Tile {
    /// Create a new tile with just terrain.
    pub fn new(id: TileId, coord: OffsetCoord, terrain: Terrain) -> Self {
        Self {
            id,
            coord,
            terrain,
            resource: None,
        }
    }

    /// Attach a resource deposit to this tile.
    pub fn with_resource(mut self, kind: ResourceKind, amount: u32) -> Self {
        self.resource = Some(ResourceDeposit { kind, amount });
        self
    }
}

/// Base terrain classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Terrain {
    #[default]
    Plains,
    Grassland,
    Forest,
    Hills,
    Desert,
    Water,
}

/// Kinds of resources a tile can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Iron,
    Horses,
    Grain,
    Gold,
}

/// A resource deposit on a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDeposit {
    pub kind: ResourceKind,
    pub amount: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_map() {
        let map = Map::filled(10, 8, Terrain::Grassland);
        assert_eq!(map.tile_count(), 80);
        assert!(map.iter().all(|t| t.terrain == Terrain::Grassland));
    }

    #[test]
    fn test_tile_id_row_major() {
        let map = Map::filled(10, 8, Terrain::Plains);
        assert_eq!(map.tile_id(&OffsetCoord::new(0, 0)), Some(0));
        assert_eq!(map.tile_id(&OffsetCoord::new(3, 2)), Some(23));
        assert_eq!(map.tile_id(&OffsetCoord::new(10, 0)), None);
        assert_eq!(map.tile_id(&OffsetCoord::new(0, 8)), None);
    }

    #[test]
    fn test_get_matches_coord() {
        let map = Map::filled(6, 6, Terrain::Plains);
        let coord = OffsetCoord::new(4, 3);
        let tile = map.get(&coord).unwrap();
        assert_eq!(tile.coord, coord);
        assert_eq!(map.get_by_id(tile.id).unwrap().coord, coord);
    }

    #[test]
    fn test_neighbors_clipped_at_edge() {
        let map = Map::filled(5, 5, Terrain::Plains);
        // Interior hexes keep all six neighbors
        assert_eq!(map.neighbors(&OffsetCoord::new(2, 2)).len(), 6);
        // Corner hexes lose out-of-bounds ones
        assert!(map.neighbors(&OffsetCoord::new(0, 0)).len() < 6);
    }

    #[test]
    fn test_from_tiles() {
        let tiles = vec![
            Tile::new(0, OffsetCoord::new(0, 0), Terrain::Water),
            Tile::new(1, OffsetCoord::new(1, 0), Terrain::Plains),
            Tile::new(2, OffsetCoord::new(0, 1), Terrain::Hills),
            Tile::new(3, OffsetCoord::new(1, 1), Terrain::Forest),
        ];
        let map = Map::from_tiles(2, 2, tiles);
        assert_eq!(map.get(&OffsetCoord::new(0, 0)).unwrap().terrain, Terrain::Water);
        assert_eq!(map.get(&OffsetCoord::new(1, 1)).unwrap().terrain, Terrain::Forest);
    }

    #[test]
    fn test_resource_deposit() {
        let tile = Tile::new(0, OffsetCoord::new(0, 0), Terrain::Hills)
            .with_resource(ResourceKind::Iron, 3);
        let deposit = tile.resource.unwrap();
        assert_eq!(deposit.kind, ResourceKind::Iron);
        assert_eq!(deposit.amount, 3);
    }

    #[test]
    fn test_map_serialization() {
        let map = Map::filled(4, 4, Terrain::Desert);
        let json = serde_json::to_string(&map).unwrap();
        let restored: Map = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.width, map.width);
        assert_eq!(restored.tile_count(), map.tile_count());
    }
}
