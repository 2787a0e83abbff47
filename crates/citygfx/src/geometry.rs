use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

pub const TILE_HALF_WIDTH_PX: i32 = 30;
pub const TILE_HALF_HEIGHT_PX: i32 = 15;
pub const TILE_WIDTH_PX: i32 = TILE_HALF_WIDTH_PX * 2;
pub const TILE_HEIGHT_PX: i32 = TILE_HALF_HEIGHT_PX * 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Grid coordinate of a tile. `i` runs along the map width, `j` along its height.
///
/// Projection convention:
/// - `map_pos()` is the left corner of the tile's 60x30 diamond.
/// - The diamond center is `map_pos() + (30, 0)`.
/// - `depth()` grows toward the viewer; the sprite pass draws in ascending depth.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TilePos {
    pub i: i32,
    pub j: i32,
}

impl TilePos {
    pub const fn new(i: i32, j: i32) -> Self {
        Self { i, j }
    }

    pub const fn depth(self) -> i32 {
        self.i - self.j
    }

    pub const fn offset(self, di: i32, dj: i32) -> Self {
        Self::new(self.i + di, self.j + dj)
    }

    pub const fn map_pos(self) -> Point {
        Point::new(
            TILE_HALF_WIDTH_PX * (self.i + self.j),
            TILE_HALF_HEIGHT_PX * (self.i - self.j),
        )
    }

    pub const fn map_center(self) -> Point {
        let pos = self.map_pos();
        Point::new(pos.x + TILE_HALF_WIDTH_PX, pos.y)
    }

    /// Tile whose diamond contains `map_pos`. Points on a shared edge resolve
    /// by rounding half away from zero.
    pub fn from_map_pos(map_pos: Point) -> Self {
        let sum = (map_pos.x - TILE_HALF_WIDTH_PX) as f32 / TILE_HALF_WIDTH_PX as f32;
        let diff = map_pos.y as f32 / TILE_HALF_HEIGHT_PX as f32;
        let i = ((sum + diff) * 0.5).round() as i32;
        let j = ((sum - diff) * 0.5).round() as i32;
        Self::new(i, j)
    }
}
