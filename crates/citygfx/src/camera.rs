use std::collections::HashSet;

use crate::geometry::{Point, Size, TilePos, TILE_HALF_HEIGHT_PX, TILE_WIDTH_PX};
use crate::tilemap::{Tilemap, TilesArray};

pub const DEFAULT_SCROLL_SPEED_PX: i32 = 8;
/// Extra margin around the viewport so tall pictures anchored just off-screen
/// still get drawn.
const VIEW_PADDING_PX: i32 = TILE_WIDTH_PX * 2;

/// Visible tile window over the tilemap.
///
/// Panning is a per-frame velocity: `move_*` sets the speed on one axis and
/// `update` applies it once per frame until the speed is set back to zero.
#[derive(Debug, Clone)]
pub struct Camera {
    viewport: Size,
    center: Point,
    scroll_speed: i32,
    velocity: Point,
    tiles: TilesArray,
}

impl Camera {
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            center: Point::default(),
            scroll_speed: DEFAULT_SCROLL_SPEED_PX,
            velocity: Point::default(),
            tiles: TilesArray::new(),
        }
    }

    pub fn with_scroll_speed(mut self, scroll_speed: i32) -> Self {
        self.scroll_speed = scroll_speed.max(0);
        self
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn set_center(&mut self, center: Point) {
        self.center = center;
    }

    pub fn center_on(&mut self, pos: TilePos) {
        self.center = pos.map_center();
    }

    pub fn scroll_speed(&self) -> i32 {
        self.scroll_speed
    }

    pub fn velocity(&self) -> Point {
        self.velocity
    }

    /// Screen offset of map pixel space: `screen = map_pos + offset`.
    pub fn offset(&self) -> Point {
        Point::new(
            self.viewport.width as i32 / 2 - self.center.x,
            self.viewport.height as i32 / 2 - self.center.y,
        )
    }

    pub fn tile_screen_center(&self, pos: TilePos) -> Point {
        pos.map_center() + self.offset()
    }

    /// Tile under a screen position, `None` off the map.
    pub fn at(&self, screen_pos: Point, tilemap: &Tilemap) -> Option<TilePos> {
        let pos = TilePos::from_map_pos(screen_pos - self.offset());
        tilemap.contains(pos).then_some(pos)
    }

    /// Like [`Camera::at`] but clamps positions past the map border onto it.
    pub fn at_clamped(&self, screen_pos: Point, tilemap: &Tilemap) -> TilePos {
        tilemap.clamp(TilePos::from_map_pos(screen_pos - self.offset()))
    }

    /// Recomputes the visible tiles in draw order (ascending depth).
    ///
    /// The master of every visible subordinate tile is included even when it
    /// lies outside the viewport, so a structure straddling the edge is still
    /// drawn through its master.
    pub fn refresh(&mut self, tilemap: &Tilemap) {
        let offset = self.offset();
        let left = -VIEW_PADDING_PX;
        let top = -VIEW_PADDING_PX;
        let right = self.viewport.width as i32 + VIEW_PADDING_PX;
        let bottom = self.viewport.height as i32 + VIEW_PADDING_PX;

        let mut seen = HashSet::new();
        let mut visible = TilesArray::new();
        for tile in tilemap.tiles() {
            let screen = tile.map_pos() + offset;
            let intersects = screen.x + TILE_WIDTH_PX >= left
                && screen.x <= right
                && screen.y + TILE_HALF_HEIGHT_PX >= top
                && screen.y - TILE_HALF_HEIGHT_PX <= bottom;
            if intersects && seen.insert(tile.pos()) {
                visible.push(tile.pos());
            }
        }
        let masters: Vec<TilePos> = visible
            .iter()
            .filter_map(|pos| tilemap.tile(pos).and_then(|tile| tile.master()))
            .collect();
        for master in masters {
            if seen.insert(master) {
                visible.push(master);
            }
        }
        visible.sort_by_key(|pos| (pos.depth(), pos.i));
        self.tiles = visible;
    }

    pub fn tiles(&self) -> &TilesArray {
        &self.tiles
    }

    /// Clears WAS_DRAWN on every visible tile. Must run before any tile of the
    /// frame is drawn.
    pub fn start_frame(&self, tilemap: &mut Tilemap) {
        tilemap.reset_was_drawn(&self.tiles);
    }

    pub fn move_up(&mut self, amount: i32) {
        self.velocity.y = -amount;
    }

    pub fn move_down(&mut self, amount: i32) {
        self.velocity.y = amount;
    }

    pub fn move_left(&mut self, amount: i32) {
        self.velocity.x = -amount;
    }

    pub fn move_right(&mut self, amount: i32) {
        self.velocity.x = amount;
    }

    pub fn stop(&mut self) {
        self.velocity = Point::default();
    }

    /// Applies one frame of panning.
    pub fn update(&mut self) {
        self.center = self.center + self.velocity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::City;
    use crate::overlay::{OverlayDesc, OverlayKind};
    use crate::tile::Terrain;

    fn grass_map(width: u32, height: u32) -> Tilemap {
        Tilemap::new(width, height, Terrain::Grass).expect("tilemap")
    }

    #[test]
    fn offset_centers_the_view() {
        let mut camera = Camera::new(Size::new(800, 600));
        camera.set_center(Point::new(100, -20));
        assert_eq!(camera.offset(), Point::new(300, 320));
    }

    #[test]
    fn at_inverts_tile_screen_center() {
        let map = grass_map(8, 8);
        let mut camera = Camera::new(Size::new(640, 480));
        camera.center_on(TilePos::new(4, 4));
        for pos in [TilePos::new(0, 0), TilePos::new(4, 4), TilePos::new(7, 2)] {
            assert_eq!(camera.at(camera.tile_screen_center(pos), &map), Some(pos));
        }
    }

    #[test]
    fn at_returns_none_off_map() {
        let map = grass_map(4, 4);
        let mut camera = Camera::new(Size::new(640, 480));
        camera.center_on(TilePos::new(2, 2));
        let outside = camera.tile_screen_center(TilePos::new(-3, 1));
        assert_eq!(camera.at(outside, &map), None);
        assert_eq!(camera.at_clamped(outside, &map), TilePos::new(0, 1));
    }

    #[test]
    fn refresh_orders_tiles_by_depth() {
        let map = grass_map(5, 5);
        let mut camera = Camera::new(Size::new(2000, 2000));
        camera.center_on(TilePos::new(2, 2));
        camera.refresh(&map);
        assert_eq!(camera.tiles().len(), 25);
        let depths: Vec<i32> = camera.tiles().iter().map(TilePos::depth).collect();
        assert!(depths.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn refresh_culls_far_tiles_but_keeps_masters() {
        let mut city = City::new(grass_map(40, 40));
        city.build(OverlayDesc::new(OverlayKind::Temple, TilePos::new(20, 14), 3))
            .expect("build");
        let mut camera = Camera::new(Size::new(120, 60));
        camera.center_on(TilePos::new(22, 16));
        camera.refresh(city.tilemap());

        assert!(camera.tiles().len() < 40 * 40);
        assert!(!camera.tiles().contains(TilePos::new(0, 0)));
        assert!(camera.tiles().contains(TilePos::new(20, 14)));
        let unique: HashSet<TilePos> = camera.tiles().iter().collect();
        assert_eq!(unique.len(), camera.tiles().len());
    }

    #[test]
    fn start_frame_clears_was_drawn_on_visible_tiles() {
        let mut map = grass_map(3, 3);
        let mut camera = Camera::new(Size::new(1000, 1000));
        camera.center_on(TilePos::new(1, 1));
        camera.refresh(&map);
        for pos in camera.tiles().clone().iter() {
            map.tile_mut(pos).expect("tile").set_was_drawn();
        }
        camera.start_frame(&mut map);
        assert!(map.tiles().all(|tile| !tile.was_drawn()));
    }

    #[test]
    fn velocity_applies_every_frame_until_stopped() {
        let mut camera = Camera::new(Size::new(100, 100)).with_scroll_speed(5);
        camera.move_right(5);
        camera.move_up(10);
        camera.update();
        camera.update();
        assert_eq!(camera.center(), Point::new(10, -20));
        camera.move_right(0);
        camera.move_up(0);
        camera.update();
        assert_eq!(camera.center(), Point::new(10, -20));
    }
}
