use thiserror::Error;
use tracing::debug;

use crate::geometry::TilePos;
use crate::gfx::Picture;
use crate::overlay::{Overlay, OverlayDesc, OverlayId, OverlayKind, OverlayRegistry};
use crate::tile::{Terrain, TileFlags};
use crate::tilemap::{Tilemap, TilesArray};
use crate::walker::{WalkerId, WalkerKind, WalkerRegistry};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("overlay footprint must be at least one tile")]
    EmptyFootprint,
    #[error("footprint of size {size} at {pos:?} leaves the map")]
    OutOfBounds { pos: TilePos, size: u32 },
    #[error("tile {pos:?} is already occupied by overlay {occupant:?}")]
    Occupied { pos: TilePos, occupant: OverlayId },
    #[error("tile {pos:?} has unbuildable terrain {terrain:?}")]
    Blocked { pos: TilePos, terrain: Terrain },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalkerError {
    #[error("walker position {pos:?} is off the map")]
    OffMap { pos: TilePos },
    #[error("unknown walker {id:?}")]
    Unknown { id: WalkerId },
}

/// The tilemap together with the overlays and walkers placed on it.
#[derive(Debug)]
pub struct City {
    tilemap: Tilemap,
    overlays: OverlayRegistry,
    walkers: WalkerRegistry,
}

impl City {
    pub fn new(tilemap: Tilemap) -> Self {
        Self {
            tilemap,
            overlays: OverlayRegistry::default(),
            walkers: WalkerRegistry::default(),
        }
    }

    pub fn tilemap(&self) -> &Tilemap {
        &self.tilemap
    }

    pub fn tilemap_mut(&mut self) -> &mut Tilemap {
        &mut self.tilemap
    }

    pub fn overlays(&self) -> &OverlayRegistry {
        &self.overlays
    }

    pub fn walkers(&self) -> &WalkerRegistry {
        &self.walkers
    }

    pub fn overlay_at(&self, pos: TilePos) -> Option<&Overlay> {
        let id = self.tilemap.tile(pos)?.overlay()?;
        self.overlays.get(id)
    }

    /// Every tile of the overlay's footprint.
    pub fn overlay_area(&self, id: OverlayId) -> TilesArray {
        match self.overlays.get(id) {
            Some(overlay) => self.tilemap.area(overlay.pos(), overlay.size()),
            None => TilesArray::new(),
        }
    }

    /// Places an overlay and links its footprint tiles to it.
    ///
    /// Tiles of a multi-tile footprint, the anchor included, get the anchor as
    /// their master; a single-tile overlay leaves `master` empty.
    pub fn build(&mut self, desc: OverlayDesc) -> Result<OverlayId, BuildError> {
        if desc.size == 0 {
            return Err(BuildError::EmptyFootprint);
        }
        let extent = self.tilemap.width().max(self.tilemap.height());
        if desc.size > extent {
            return Err(BuildError::OutOfBounds {
                pos: desc.pos,
                size: desc.size,
            });
        }
        let footprint = self.tilemap.area(desc.pos, desc.size);
        if footprint.len() as u64 != u64::from(desc.size) * u64::from(desc.size) {
            return Err(BuildError::OutOfBounds {
                pos: desc.pos,
                size: desc.size,
            });
        }
        for pos in footprint.iter() {
            let Some(tile) = self.tilemap.tile(pos) else {
                return Err(BuildError::OutOfBounds {
                    pos: desc.pos,
                    size: desc.size,
                });
            };
            if let Some(occupant) = tile.overlay() {
                return Err(BuildError::Occupied { pos, occupant });
            }
            if !tile.terrain().can_build_on() {
                return Err(BuildError::Blocked {
                    pos,
                    terrain: tile.terrain(),
                });
            }
        }

        let anchor = desc.pos;
        let master = (desc.size > 1).then_some(anchor);
        let flat = desc.flat;
        let destructible = desc.destructible;
        let is_road = desc.kind == OverlayKind::Road;
        let kind_name = desc.kind.name().to_string();
        let id = self.overlays.insert(desc);
        for pos in footprint.iter() {
            if let Some(tile) = self.tilemap.tile_mut(pos) {
                tile.attach_overlay(id, master);
                tile.set_flag(TileFlags::FLAT, flat);
                tile.set_flag(TileFlags::DESTRUCTIBLE, destructible);
                tile.set_flag(TileFlags::ROAD, is_road);
                tile.set_flag(TileFlags::MEADOW, false);
            }
        }
        debug!(
            overlay_id = id.0,
            kind = kind_name.as_str(),
            i = anchor.i,
            j = anchor.j,
            tiles = footprint.len(),
            "overlay_built"
        );
        Ok(id)
    }

    /// Clears whatever occupies `pos`: the whole overlay footprint, or a tree.
    /// Returns whether anything changed; rocks, water and bare land are left as is.
    pub fn clear_land(&mut self, pos: TilePos) -> bool {
        let Some(tile) = self.tilemap.tile(pos) else {
            return false;
        };
        let terrain = tile.terrain();
        match tile.overlay() {
            Some(id) => {
                let footprint = self.overlay_area(id);
                let Some(overlay) = self.overlays.remove(id) else {
                    return false;
                };
                for footprint_pos in footprint.iter() {
                    if let Some(tile) = self.tilemap.tile_mut(footprint_pos) {
                        let terrain = tile.terrain();
                        tile.reset_terrain(terrain);
                    }
                }
                debug!(
                    overlay_id = id.0,
                    kind = overlay.kind().name(),
                    tiles = footprint.len(),
                    "overlay_cleared"
                );
                true
            }
            None if terrain == Terrain::Tree => {
                if let Some(tile) = self.tilemap.tile_mut(pos) {
                    tile.reset_terrain(Terrain::Meadow);
                }
                debug!(i = pos.i, j = pos.j, "tree_cleared");
                true
            }
            None => false,
        }
    }

    pub fn spawn_walker(&mut self, kind: WalkerKind, pos: TilePos) -> Result<WalkerId, WalkerError> {
        self.spawn_walker_with_picture(kind, pos, kind.picture())
    }

    pub fn spawn_walker_with_picture(
        &mut self,
        kind: WalkerKind,
        pos: TilePos,
        picture: Picture,
    ) -> Result<WalkerId, WalkerError> {
        if !self.tilemap.contains(pos) {
            return Err(WalkerError::OffMap { pos });
        }
        Ok(self.walkers.spawn(kind, pos, picture))
    }

    pub fn move_walker(&mut self, id: WalkerId, pos: TilePos) -> Result<(), WalkerError> {
        if !self.tilemap.contains(pos) {
            return Err(WalkerError::OffMap { pos });
        }
        if self.walkers.set_pos(id, pos) {
            Ok(())
        } else {
            Err(WalkerError::Unknown { id })
        }
    }

    pub fn remove_walker(&mut self, id: WalkerId) -> bool {
        self.walkers.remove(id)
    }
}
