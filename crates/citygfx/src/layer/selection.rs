use std::collections::HashSet;

use crate::camera::Camera;
use crate::city::City;
use crate::geometry::{Point, TilePos};
use crate::tilemap::{Tilemap, TilesArray};

/// Tiles of the drag rectangle between two cursor positions.
///
/// Cursor positions past the map border clamp onto it. Without both cursors
/// the area is empty.
pub fn selected_area(
    tilemap: &Tilemap,
    camera: &Camera,
    start: Option<Point>,
    last: Option<Point>,
) -> TilesArray {
    let (Some(start), Some(last)) = (start, last) else {
        return TilesArray::new();
    };
    let start_tile = camera.at_clamped(start, tilemap);
    let stop_tile = camera.at_clamped(last, tilemap);
    tilemap.area_between(start_tile, stop_tile)
}

/// A selection grown to cover every overlay it touches, keyed by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionArea {
    tiles: HashSet<TilePos>,
}

impl SelectionArea {
    /// Raw selection plus the full footprint of each overlay standing on a
    /// selected tile.
    pub fn resolve(city: &City, selection: &TilesArray) -> Self {
        let mut tiles = HashSet::with_capacity(selection.len());
        for pos in selection.iter() {
            tiles.insert(pos);
            if let Some(overlay) = city.overlay_at(pos) {
                tiles.extend(city.overlay_area(overlay.id()).iter());
            }
        }
        Self { tiles }
    }

    pub fn contains(&self, pos: TilePos) -> bool {
        self.tiles.contains(&pos)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Positions in row-major order (`j`, then `i`).
    pub fn sorted(&self) -> Vec<TilePos> {
        let mut tiles: Vec<TilePos> = self.tiles.iter().copied().collect();
        tiles.sort_by_key(|pos| (pos.j, pos.i));
        tiles
    }
}
