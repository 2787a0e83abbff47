use serde::{Deserialize, Serialize};

use crate::geometry::{Point, TilePos, TILE_HALF_HEIGHT_PX};
use crate::gfx::Picture;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    House,
    Road,
    Plaza,
    Temple,
    Hippodrome,
    Tree,
    Named(String),
}

impl OverlayKind {
    pub fn name(&self) -> &str {
        match self {
            OverlayKind::House => "house",
            OverlayKind::Road => "road",
            OverlayKind::Plaza => "plaza",
            OverlayKind::Temple => "temple",
            OverlayKind::Hippodrome => "hippodrome",
            OverlayKind::Tree => "tree",
            OverlayKind::Named(name) => name,
        }
    }

    /// Roads and plazas are walkable ground and stay in the flat pass.
    pub fn is_flat(&self) -> bool {
        matches!(self, OverlayKind::Road | OverlayKind::Plaza)
    }
}

/// Draw pass an overlay picture belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderPass {
    Ground,
    GroundAnimation,
    Foreground,
    /// Drawn after every tile and walker of the frame.
    Overlay,
}

/// Everything needed to place an overlay; `City::build` turns it into an [`Overlay`].
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayDesc {
    pub kind: OverlayKind,
    pub pos: TilePos,
    pub size: u32,
    pub flat: bool,
    pub destructible: bool,
    pub pictures: Vec<(RenderPass, Picture)>,
}

impl OverlayDesc {
    /// Description with the kind's defaults: one picture named after the kind,
    /// on the ground pass for flat kinds and the foreground pass otherwise.
    pub fn new(kind: OverlayKind, pos: TilePos, size: u32) -> Self {
        let flat = kind.is_flat();
        let pass = if flat {
            RenderPass::Ground
        } else {
            RenderPass::Foreground
        };
        let lift = TILE_HALF_HEIGHT_PX.saturating_mul(i32::try_from(size.max(1)).unwrap_or(i32::MAX));
        let picture = Picture::new(kind.name(), 1).with_offset(Point::new(0, -lift));
        Self {
            kind,
            pos,
            size,
            flat,
            destructible: true,
            pictures: vec![(pass, picture)],
        }
    }

    pub fn with_picture(mut self, pass: RenderPass, picture: Picture) -> Self {
        self.pictures.push((pass, picture));
        self
    }

    pub fn with_pictures(mut self, pictures: Vec<(RenderPass, Picture)>) -> Self {
        self.pictures = pictures;
        self
    }

    pub fn indestructible(mut self) -> Self {
        self.destructible = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    id: OverlayId,
    kind: OverlayKind,
    pos: TilePos,
    size: u32,
    flat: bool,
    destructible: bool,
    pictures: Vec<(RenderPass, Picture)>,
}

impl Overlay {
    pub fn id(&self) -> OverlayId {
        self.id
    }

    pub fn kind(&self) -> &OverlayKind {
        &self.kind
    }

    /// Anchor tile of the footprint.
    pub fn pos(&self) -> TilePos {
        self.pos
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn is_flat(&self) -> bool {
        self.flat
    }

    pub fn is_destructible(&self) -> bool {
        self.destructible
    }

    pub fn pictures(&self, pass: RenderPass) -> impl Iterator<Item = &Picture> {
        self.pictures
            .iter()
            .filter(move |(picture_pass, _)| *picture_pass == pass)
            .map(|(_, picture)| picture)
    }
}

#[derive(Debug, Default)]
struct OverlayIdAllocator {
    next: u64,
}

impl OverlayIdAllocator {
    fn allocate(&mut self) -> OverlayId {
        let id = OverlayId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Owns every overlay of a city, in build order.
#[derive(Debug, Default)]
pub struct OverlayRegistry {
    overlays: Vec<Overlay>,
    ids: OverlayIdAllocator,
}

impl OverlayRegistry {
    pub(crate) fn insert(&mut self, desc: OverlayDesc) -> OverlayId {
        let id = self.ids.allocate();
        self.overlays.push(Overlay {
            id,
            kind: desc.kind,
            pos: desc.pos,
            size: desc.size,
            flat: desc.flat,
            destructible: desc.destructible,
            pictures: desc.pictures,
        });
        id
    }

    pub(crate) fn remove(&mut self, id: OverlayId) -> Option<Overlay> {
        let index = self.overlays.iter().position(|overlay| overlay.id == id)?;
        Some(self.overlays.remove(index))
    }

    pub fn get(&self, id: OverlayId) -> Option<&Overlay> {
        self.overlays.iter().find(|overlay| overlay.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Overlay> {
        self.overlays.iter()
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desc_defaults_follow_kind() {
        let road = OverlayDesc::new(OverlayKind::Road, TilePos::new(0, 0), 1);
        assert!(road.flat);
        assert_eq!(road.pictures[0].0, RenderPass::Ground);

        let temple = OverlayDesc::new(OverlayKind::Temple, TilePos::new(0, 0), 2);
        assert!(!temple.flat);
        assert_eq!(temple.pictures[0].0, RenderPass::Foreground);
        assert_eq!(temple.pictures[0].1.name(), "temple");
        assert_eq!(temple.pictures[0].1.offset(), Point::new(0, -30));
    }

    #[test]
    fn oversized_desc_lift_saturates() {
        let huge = OverlayDesc::new(OverlayKind::Temple, TilePos::new(0, 0), u32::MAX);
        assert_eq!(huge.pictures[0].1.offset(), Point::new(0, -i32::MAX));
        let wide = OverlayDesc::new(OverlayKind::Temple, TilePos::new(0, 0), 70_000);
        assert_eq!(wide.pictures[0].1.offset(), Point::new(0, -1_050_000));
    }

    #[test]
    fn registry_allocates_distinct_ids_and_removes() {
        let mut registry = OverlayRegistry::default();
        let a = registry.insert(OverlayDesc::new(OverlayKind::House, TilePos::new(0, 0), 1));
        let b = registry.insert(OverlayDesc::new(OverlayKind::House, TilePos::new(1, 0), 1));
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);

        let removed = registry.remove(a).expect("removed");
        assert_eq!(removed.pos(), TilePos::new(0, 0));
        assert!(registry.get(a).is_none());
        assert!(registry.remove(a).is_none());
        assert_eq!(registry.get(b).map(Overlay::pos), Some(TilePos::new(1, 0)));
    }

    #[test]
    fn pictures_filter_by_pass() {
        let mut registry = OverlayRegistry::default();
        let id = registry.insert(
            OverlayDesc::new(OverlayKind::Hippodrome, TilePos::new(0, 0), 3)
                .with_picture(RenderPass::Overlay, Picture::new("hippodrome_flag", 1))
                .with_picture(RenderPass::Foreground, Picture::new("hippodrome", 2)),
        );
        let overlay = registry.get(id).expect("overlay");
        assert_eq!(overlay.pictures(RenderPass::Foreground).count(), 2);
        assert_eq!(overlay.pictures(RenderPass::Overlay).count(), 1);
        assert_eq!(overlay.pictures(RenderPass::Ground).count(), 0);
    }
}
