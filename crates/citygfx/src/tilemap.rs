use thiserror::Error;

use crate::geometry::TilePos;
use crate::tile::{Terrain, Tile};

/// Ordered list of tile positions. Iteration follows insertion order; duplicates
/// are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TilesArray(Vec<TilePos>);

impl TilesArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn push(&mut self, pos: TilePos) {
        self.0.push(pos);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, pos: TilePos) -> bool {
        self.0.contains(&pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = TilePos> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[TilePos] {
        &self.0
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub(crate) fn sort_by_key<K: Ord>(&mut self, key: impl FnMut(&TilePos) -> K) {
        self.0.sort_by_key(key);
    }
}

impl FromIterator<TilePos> for TilesArray {
    fn from_iter<T: IntoIterator<Item = TilePos>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<TilePos> for TilesArray {
    fn extend<T: IntoIterator<Item = TilePos>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TilemapError {
    #[error("tilemap dimensions must be non-zero, got {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },
    #[error("terrain count mismatch: expected {expected}, got {actual}")]
    TerrainCountMismatch { expected: usize, actual: usize },
}

/// Tile storage. `i` indexes columns (`0..width`), `j` indexes rows (`0..height`).
#[derive(Debug, Clone, PartialEq)]
pub struct Tilemap {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl Tilemap {
    pub fn new(width: u32, height: u32, fill: Terrain) -> Result<Self, TilemapError> {
        let count = width as usize * height as usize;
        Self::from_terrain(width, height, vec![fill; count])
    }

    /// Builds a tilemap from row-major terrain (`j` outer, `i` inner).
    pub fn from_terrain(
        width: u32,
        height: u32,
        terrain: Vec<Terrain>,
    ) -> Result<Self, TilemapError> {
        if width == 0 || height == 0 {
            return Err(TilemapError::EmptyDimensions { width, height });
        }
        let expected = width as usize * height as usize;
        if terrain.len() != expected {
            return Err(TilemapError::TerrainCountMismatch {
                expected,
                actual: terrain.len(),
            });
        }
        let tiles = terrain
            .into_iter()
            .enumerate()
            .map(|(index, terrain)| {
                let i = (index % width as usize) as i32;
                let j = (index / width as usize) as i32;
                Tile::new(TilePos::new(i, j), terrain)
            })
            .collect();
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, pos: TilePos) -> bool {
        self.index_of(pos).is_some()
    }

    pub fn index_of(&self, pos: TilePos) -> Option<usize> {
        if pos.i < 0 || pos.j < 0 || pos.i >= self.width as i32 || pos.j >= self.height as i32 {
            return None;
        }
        Some(pos.j as usize * self.width as usize + pos.i as usize)
    }

    pub fn tile(&self, pos: TilePos) -> Option<&Tile> {
        self.index_of(pos).and_then(|index| self.tiles.get(index))
    }

    pub fn tile_mut(&mut self, pos: TilePos) -> Option<&mut Tile> {
        self.index_of(pos).and_then(|index| self.tiles.get_mut(index))
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Nearest in-bounds position.
    pub fn clamp(&self, pos: TilePos) -> TilePos {
        TilePos::new(
            pos.i.clamp(0, self.width as i32 - 1),
            pos.j.clamp(0, self.height as i32 - 1),
        )
    }

    /// In-bounds tiles of the `size x size` square anchored at `pos`.
    pub fn area(&self, pos: TilePos, size: u32) -> TilesArray {
        let size = i64::from(size);
        let (i_from, i_to) = self.clip_i(i64::from(pos.i), i64::from(pos.i) + size - 1);
        let (j_from, j_to) = self.clip_j(i64::from(pos.j), i64::from(pos.j) + size - 1);
        self.collect_rect(i_from, i_to, j_from, j_to)
    }

    /// In-bounds tiles of the inclusive rectangle spanned by two corners.
    pub fn area_between(&self, a: TilePos, b: TilePos) -> TilesArray {
        let (i_from, i_to) = self.clip_i(i64::from(a.i.min(b.i)), i64::from(a.i.max(b.i)));
        let (j_from, j_to) = self.clip_j(i64::from(a.j.min(b.j)), i64::from(a.j.max(b.j)));
        self.collect_rect(i_from, i_to, j_from, j_to)
    }

    fn clip_i(&self, from: i64, to: i64) -> (i64, i64) {
        (from.max(0), to.min(i64::from(self.width) - 1))
    }

    fn clip_j(&self, from: i64, to: i64) -> (i64, i64) {
        (from.max(0), to.min(i64::from(self.height) - 1))
    }

    /// Row-major positions of an inclusive rectangle already clipped to the map.
    fn collect_rect(&self, i_from: i64, i_to: i64, j_from: i64, j_to: i64) -> TilesArray {
        let columns = (i_to - i_from + 1).max(0);
        let rows = (j_to - j_from + 1).max(0);
        let mut area = TilesArray::with_capacity((columns * rows) as usize);
        for j in j_from..=j_to {
            for i in i_from..=i_to {
                // Clipped to the map, so both fit in i32.
                area.push(TilePos::new(i as i32, j as i32));
            }
        }
        area
    }

    pub fn reset_was_drawn(&mut self, positions: &TilesArray) {
        for pos in positions.iter() {
            if let Some(tile) = self.tile_mut(pos) {
                tile.reset_was_drawn();
            }
        }
    }

    pub fn advance_animations(&mut self) {
        for tile in &mut self.tiles {
            if let Some(animation) = tile.animation_mut() {
                animation.advance();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn areas_near_the_integer_limit_are_clipped() {
        let map = Tilemap::new(4, 4, Terrain::Grass).expect("tilemap");
        assert!(map.area(TilePos::new(i32::MAX, 0), 1).is_empty());
        assert!(map.area(TilePos::new(i32::MIN, i32::MIN), u32::MAX).len() == 16);
        assert_eq!(map.area(TilePos::new(3, 3), u32::MAX).as_slice(), &[TilePos::new(3, 3)]);
        assert_eq!(
            map.area_between(TilePos::new(i32::MIN, 2), TilePos::new(i32::MAX, 2)).len(),
            4
        );
    }

    #[test]
    fn rejects_empty_dimensions() {
        assert_eq!(
            Tilemap::new(0, 4, Terrain::Grass).expect_err("empty"),
            TilemapError::EmptyDimensions {
                width: 0,
                height: 4
            }
        );
    }

    #[test]
    fn rejects_terrain_count_mismatch() {
        let error = Tilemap::from_terrain(2, 2, vec![Terrain::Grass; 3]).expect_err("mismatch");
        assert_eq!(
            error,
            TilemapError::TerrainCountMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn tiles_know_their_positions() {
        let map = Tilemap::from_terrain(
            3,
            2,
            vec![
                Terrain::Grass,
                Terrain::Water,
                Terrain::Grass,
                Terrain::Rock,
                Terrain::Grass,
                Terrain::Tree,
            ],
        )
        .expect("tilemap");
        assert_eq!(map.tile(TilePos::new(1, 0)).map(Tile::terrain), Some(Terrain::Water));
        assert_eq!(map.tile(TilePos::new(0, 1)).map(Tile::terrain), Some(Terrain::Rock));
        assert_eq!(map.tile(TilePos::new(2, 1)).map(Tile::pos), Some(TilePos::new(2, 1)));
        assert!(map.tile(TilePos::new(3, 0)).is_none());
        assert!(map.tile(TilePos::new(-1, 0)).is_none());
    }

    #[test]
    fn area_is_row_major_and_clipped() {
        let map = Tilemap::new(4, 4, Terrain::Grass).expect("tilemap");
        let area = map.area(TilePos::new(1, 1), 2);
        assert_eq!(
            area.as_slice(),
            &[
                TilePos::new(1, 1),
                TilePos::new(2, 1),
                TilePos::new(1, 2),
                TilePos::new(2, 2)
            ]
        );
        assert_eq!(map.area(TilePos::new(3, 3), 3).len(), 1);
    }

    #[test]
    fn area_between_accepts_any_corner_order() {
        let map = Tilemap::new(5, 5, Terrain::Grass).expect("tilemap");
        let forward = map.area_between(TilePos::new(1, 1), TilePos::new(2, 3));
        let backward = map.area_between(TilePos::new(2, 3), TilePos::new(1, 1));
        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 6);
        assert_eq!(map.area_between(TilePos::new(2, 2), TilePos::new(2, 2)).len(), 1);
    }

    #[test]
    fn clamp_keeps_positions_on_map() {
        let map = Tilemap::new(3, 2, Terrain::Grass).expect("tilemap");
        assert_eq!(map.clamp(TilePos::new(-4, 9)), TilePos::new(0, 1));
        assert_eq!(map.clamp(TilePos::new(1, 1)), TilePos::new(1, 1));
    }
}
