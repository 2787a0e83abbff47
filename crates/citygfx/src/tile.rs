use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::geometry::{Point, TilePos, TILE_HALF_HEIGHT_PX};
use crate::gfx::Picture;
use crate::overlay::OverlayId;

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct TileFlags: u16 {
        /// Walkable or boatable ground, drawn in the flat pass.
        const FLAT = 1 << 0;
        const DESTRUCTIBLE = 1 << 1;
        const TREE = 1 << 2;
        const WATER = 1 << 3;
        const ROCK = 1 << 4;
        const ROAD = 1 << 5;
        const MEADOW = 1 << 6;
        /// Set when the tile has been drawn in the current frame.
        const WAS_DRAWN = 1 << 7;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    #[default]
    Grass,
    Meadow,
    Tree,
    Rock,
    Water,
}

impl Terrain {
    pub const fn flags(self) -> TileFlags {
        match self {
            Terrain::Grass => TileFlags::FLAT,
            Terrain::Meadow => TileFlags::FLAT.union(TileFlags::MEADOW),
            Terrain::Tree => TileFlags::TREE.union(TileFlags::DESTRUCTIBLE),
            Terrain::Rock => TileFlags::ROCK,
            Terrain::Water => TileFlags::FLAT.union(TileFlags::WATER),
        }
    }

    pub const fn picture_name(self) -> &'static str {
        match self {
            Terrain::Grass => "grass",
            Terrain::Meadow => "meadow",
            Terrain::Tree => "tree",
            Terrain::Rock => "rock",
            Terrain::Water => "water",
        }
    }

    /// Ground picture anchored so its top-left sits half a tile above `map_pos`.
    pub fn picture(self) -> Picture {
        Picture::new(self.picture_name(), 1).with_offset(Point::new(0, -TILE_HALF_HEIGHT_PX))
    }

    pub fn can_build_on(self) -> bool {
        matches!(self, Terrain::Grass | Terrain::Meadow)
    }
}

/// Cycles through a fixed list of frames, one step per `advance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animation {
    frames: Vec<Picture>,
    current: usize,
}

impl Animation {
    pub fn new(frames: Vec<Picture>) -> Self {
        Self { frames, current: 0 }
    }

    pub fn current_frame(&self) -> Option<&Picture> {
        self.frames.get(self.current)
    }

    pub fn advance(&mut self) {
        if self.frames.is_empty() {
            return;
        }
        self.current = (self.current + 1) % self.frames.len();
    }
}

/// One map cell.
///
/// `overlay` and `master` are non-owning: the overlay lives in the city's
/// registry and the master is another tile of the same tilemap. WAS_DRAWN is
/// per-frame scratch state owned by the frame driver; it is cleared by
/// `Camera::start_frame` before any tile of a frame is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pos: TilePos,
    terrain: Terrain,
    flags: TileFlags,
    picture: Picture,
    animation: Option<Animation>,
    overlay: Option<OverlayId>,
    master: Option<TilePos>,
}

impl Tile {
    pub fn new(pos: TilePos, terrain: Terrain) -> Self {
        Self {
            pos,
            terrain,
            flags: terrain.flags(),
            picture: terrain.picture(),
            animation: None,
            overlay: None,
            master: None,
        }
    }

    pub fn pos(&self) -> TilePos {
        self.pos
    }

    pub fn i(&self) -> i32 {
        self.pos.i
    }

    pub fn j(&self) -> i32 {
        self.pos.j
    }

    pub fn map_pos(&self) -> Point {
        self.pos.map_pos()
    }

    pub fn terrain(&self) -> Terrain {
        self.terrain
    }

    pub fn flags(&self) -> TileFlags {
        self.flags
    }

    pub fn has_flag(&self, flag: TileFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: TileFlags, enabled: bool) {
        self.flags.set(flag, enabled);
    }

    pub fn is_flat(&self) -> bool {
        self.has_flag(TileFlags::FLAT)
    }

    pub fn is_destructible(&self) -> bool {
        self.has_flag(TileFlags::DESTRUCTIBLE)
    }

    pub fn was_drawn(&self) -> bool {
        self.has_flag(TileFlags::WAS_DRAWN)
    }

    pub fn set_was_drawn(&mut self) {
        self.flags.insert(TileFlags::WAS_DRAWN);
    }

    pub fn reset_was_drawn(&mut self) {
        self.flags.remove(TileFlags::WAS_DRAWN);
    }

    pub fn picture(&self) -> &Picture {
        &self.picture
    }

    pub fn set_picture(&mut self, picture: Picture) {
        self.picture = picture;
    }

    pub fn animation(&self) -> Option<&Animation> {
        self.animation.as_ref()
    }

    pub fn set_animation(&mut self, animation: Option<Animation>) {
        self.animation = animation;
    }

    pub(crate) fn animation_mut(&mut self) -> Option<&mut Animation> {
        self.animation.as_mut()
    }

    pub fn overlay(&self) -> Option<OverlayId> {
        self.overlay
    }

    /// Anchor tile of the multi-tile structure covering this tile, if any.
    pub fn master(&self) -> Option<TilePos> {
        self.master
    }

    pub(crate) fn attach_overlay(&mut self, overlay: OverlayId, master: Option<TilePos>) {
        self.overlay = Some(overlay);
        self.master = master;
        self.reset_was_drawn();
    }

    /// Detaches any overlay and restores the terrain's own flags and picture.
    pub(crate) fn reset_terrain(&mut self, terrain: Terrain) {
        self.terrain = terrain;
        self.flags = terrain.flags();
        self.picture = terrain.picture();
        self.overlay = None;
        self.master = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terrain_flags_mark_flat_ground() {
        assert!(Tile::new(TilePos::new(0, 0), Terrain::Grass).is_flat());
        assert!(Tile::new(TilePos::new(0, 0), Terrain::Water).is_flat());
        assert!(!Tile::new(TilePos::new(0, 0), Terrain::Tree).is_flat());
        assert!(!Tile::new(TilePos::new(0, 0), Terrain::Rock).is_flat());
        assert!(Tile::new(TilePos::new(0, 0), Terrain::Tree).is_destructible());
    }

    #[test]
    fn terrain_flags_combine_kind_bits() {
        assert_eq!(Terrain::Meadow.flags(), TileFlags::FLAT | TileFlags::MEADOW);
        assert_eq!(Terrain::Water.flags(), TileFlags::FLAT | TileFlags::WATER);
        assert_eq!(Terrain::Tree.flags(), TileFlags::TREE | TileFlags::DESTRUCTIBLE);
        assert_eq!(Terrain::Rock.flags(), TileFlags::ROCK);

        let mut tile = Tile::new(TilePos::new(1, 1), Terrain::Grass);
        tile.set_flag(TileFlags::ROAD | TileFlags::DESTRUCTIBLE, true);
        tile.set_flag(TileFlags::ROAD, false);
        assert_eq!(tile.flags(), TileFlags::FLAT | TileFlags::DESTRUCTIBLE);
    }

    #[test]
    fn flags_insert_and_remove_independently() {
        let mut flags = TileFlags::FLAT | TileFlags::ROAD;
        flags.insert(TileFlags::WAS_DRAWN);
        flags.remove(TileFlags::ROAD);
        assert!(flags.contains(TileFlags::FLAT | TileFlags::WAS_DRAWN));
        assert!(!flags.contains(TileFlags::ROAD));
        assert_eq!(flags.bits(), TileFlags::FLAT.bits() | TileFlags::WAS_DRAWN.bits());
    }

    #[test]
    fn was_drawn_toggles() {
        let mut tile = Tile::new(TilePos::new(2, 3), Terrain::Meadow);
        assert!(!tile.was_drawn());
        tile.set_was_drawn();
        assert!(tile.was_drawn());
        tile.reset_was_drawn();
        assert!(!tile.was_drawn());
        assert!(tile.has_flag(TileFlags::MEADOW));
    }

    #[test]
    fn animation_wraps_around() {
        let mut animation = Animation::new(vec![Picture::new("water", 1), Picture::new("water", 2)]);
        animation.advance();
        assert_eq!(animation.current_frame().map(Picture::index), Some(2));
        animation.advance();
        assert_eq!(animation.current_frame().map(Picture::index), Some(1));
        assert_eq!(Animation::new(Vec::new()).current_frame(), None);
    }
}
