mod destroy;
mod selection;
mod simple;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::city::City;
use crate::events::EventQueue;
use crate::geometry::{Point, TilePos};
use crate::gfx::{Engine, Picture};
use crate::input::{InputEvent, Key, KeyboardEvent};
use crate::overlay::RenderPass;
use crate::tile::Tile;
use crate::tilemap::TilesArray;
use crate::walker::WalkerFilter;

pub use destroy::DestroyLayer;
pub use selection::{selected_area, SelectionArea};
pub use simple::SimpleLayer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Simple,
    Destroy,
}

pub const DEFAULT_SHIFT_MULTIPLIER: i32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerSettings {
    /// Pan speed multiplier while shift is held.
    pub shift_multiplier: i32,
    /// Marker drawn over single tiles inside the demolition selection.
    pub clear_marker: Picture,
}

impl Default for LayerSettings {
    fn default() -> Self {
        Self {
            shift_multiplier: DEFAULT_SHIFT_MULTIPLIER,
            clear_marker: Picture::new("oc3_land", 2),
        }
    }
}

/// Mutable city state a layer works on for one call.
pub struct LayerContext<'a> {
    pub city: &'a mut City,
    pub camera: &'a mut Camera,
    pub events: &'a mut EventQueue,
}

/// State every layer carries: the requested layer switch, the selection
/// cursors and the tiles queued for the post-render pass.
#[derive(Debug, Clone, Default)]
pub struct LayerBase {
    next_layer: Option<LayerKind>,
    start_cursor: Option<Point>,
    last_cursor: Option<Point>,
    post_render: TilesArray,
    settings: LayerSettings,
}

impl LayerBase {
    pub fn new(settings: LayerSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &LayerSettings {
        &self.settings
    }

    pub fn start_cursor(&self) -> Option<Point> {
        self.start_cursor
    }

    pub fn last_cursor(&self) -> Option<Point> {
        self.last_cursor
    }

    pub fn request_layer(&mut self, kind: LayerKind) {
        self.next_layer = Some(kind);
    }

    pub fn post_render_tiles(&self) -> &TilesArray {
        &self.post_render
    }

    /// Drops cursors and pending requests, used when the layer becomes active.
    pub fn reset_interaction(&mut self) {
        self.next_layer = None;
        self.start_cursor = None;
        self.last_cursor = None;
    }

    /// Arrow keys set camera velocity; releasing a key stops that axis.
    /// Returns false for keys that do not pan.
    pub fn handle_camera_keys(&self, camera: &mut Camera, event: &KeyboardEvent) -> bool {
        let multiplier = if event.shift {
            self.settings.shift_multiplier
        } else {
            1
        };
        let amount = camera.scroll_speed() * multiplier * i32::from(event.pressed);
        match event.key {
            Key::ArrowUp => camera.move_up(amount),
            Key::ArrowDown => camera.move_down(amount),
            Key::ArrowLeft => camera.move_left(amount),
            Key::ArrowRight => camera.move_right(amount),
            _ => return false,
        }
        true
    }

    /// Queues overlay tiles for the post-render pass and marks the tile drawn.
    /// Returns false when the tile is missing or was already drawn this frame.
    fn begin_tile(&mut self, city: &mut City, pos: TilePos) -> bool {
        let Some(tile) = city.tilemap_mut().tile_mut(pos) else {
            return false;
        };
        if tile.overlay().is_some() {
            self.post_render.push(pos);
        }
        if tile.was_drawn() {
            return false;
        }
        tile.set_was_drawn();
        true
    }
}

/// Render policy of one city view mode.
pub trait Layer {
    fn kind(&self) -> LayerKind;
    fn base(&self) -> &LayerBase;
    fn base_mut(&mut self) -> &mut LayerBase;

    fn visible_walkers(&self) -> WalkerFilter {
        WalkerFilter::All
    }

    /// Draws one tile unless it was already drawn this frame.
    fn draw_tile(&mut self, engine: &mut dyn Engine, city: &mut City, pos: TilePos, offset: Point);

    fn render(&mut self, ctx: &mut LayerContext<'_>, engine: &mut dyn Engine) {
        render_frame(self, ctx, engine);
    }

    fn handle_event(&mut self, ctx: &mut LayerContext<'_>, event: &InputEvent);

    fn take_next_layer(&mut self) -> Option<LayerKind> {
        self.base_mut().next_layer.take()
    }

    /// Draws the `Overlay` pass of every overlay touched this frame, once each.
    fn after_render(&mut self, ctx: &mut LayerContext<'_>, engine: &mut dyn Engine) {
        let offset = ctx.camera.offset();
        let base = self.base_mut();
        let mut drawn = HashSet::new();
        for pos in base.post_render.iter() {
            let Some(overlay) = ctx.city.overlay_at(pos) else {
                continue;
            };
            if !drawn.insert(overlay.id()) {
                continue;
            }
            let screen = overlay.pos().map_pos() + offset;
            for picture in overlay.pictures(RenderPass::Overlay) {
                engine.draw_picture(picture, screen);
            }
        }
        base.post_render.clear();
    }
}

/// Refreshes the camera and clears WAS_DRAWN on the visible tiles. Returns the
/// visible tiles in draw order.
pub fn begin_frame<L: Layer + ?Sized>(layer: &mut L, ctx: &mut LayerContext<'_>) -> TilesArray {
    layer.base_mut().post_render.clear();
    ctx.camera.refresh(ctx.city.tilemap());
    ctx.camera.start_frame(ctx.city.tilemap_mut());
    ctx.camera.tiles().clone()
}

/// The shared frame: flat ground first, then sprites and walkers in depth
/// order, then the post-render pass.
pub fn render_frame<L: Layer + ?Sized>(
    layer: &mut L,
    ctx: &mut LayerContext<'_>,
    engine: &mut dyn Engine,
) {
    let visible = begin_frame(layer, ctx);
    let offset = ctx.camera.offset();

    for pos in visible.iter() {
        draw_flat_tile(layer, engine, ctx.city, pos, offset);
    }

    let filter = layer.visible_walkers();
    for pos in visible.iter() {
        draw_tile_r(layer, engine, ctx.city, pos, offset);
        draw_walkers(engine, ctx.city, &filter, pos, offset);
        engine.reset_tile_draw_mask();
    }

    layer.after_render(ctx, engine);
}

/// Flat-pass step: a flat tile draws itself, or its master if the master has
/// not been drawn yet. Non-flat tiles are skipped.
pub fn draw_flat_tile<L: Layer + ?Sized>(
    layer: &mut L,
    engine: &mut dyn Engine,
    city: &mut City,
    pos: TilePos,
    offset: Point,
) {
    let Some(tile) = city.tilemap().tile(pos) else {
        return;
    };
    if !tile.is_flat() {
        return;
    }
    match tile.master() {
        None => layer.draw_tile(engine, city, pos, offset),
        Some(master) => {
            let master_drawn = city.tilemap().tile(master).map_or(true, Tile::was_drawn);
            if !master_drawn {
                layer.draw_tile(engine, city, master, offset);
            }
        }
    }
}

/// Sprite-pass step for a non-flat tile. A multi-tile structure is drawn
/// through its master, when the visited tile sits at the master's depth.
pub fn draw_tile_r<L: Layer + ?Sized>(
    layer: &mut L,
    engine: &mut dyn Engine,
    city: &mut City,
    pos: TilePos,
    offset: Point,
) {
    let Some(tile) = city.tilemap().tile(pos) else {
        return;
    };
    if tile.is_flat() {
        return;
    }
    let master = tile.master().unwrap_or(pos);
    let master_flat = city.tilemap().tile(master).map_or(true, Tile::is_flat);
    if master_flat || master.depth() != pos.depth() {
        return;
    }
    layer.draw_tile(engine, city, master, offset);
}

pub fn draw_walkers(
    engine: &mut dyn Engine,
    city: &City,
    filter: &WalkerFilter,
    pos: TilePos,
    offset: Point,
) {
    let screen = pos.map_pos() + offset;
    for walker in city.walkers().on_tile(pos) {
        if filter.allows(walker.kind()) {
            engine.draw_picture(walker.picture(), screen);
        }
    }
}

/// Draws one render pass of a tile: its own picture (ground) or animation
/// frame (ground animation) followed by the matching overlay pictures.
pub fn draw_tile_pass(
    engine: &mut dyn Engine,
    city: &City,
    pos: TilePos,
    offset: Point,
    pass: RenderPass,
) {
    let Some(tile) = city.tilemap().tile(pos) else {
        return;
    };
    let screen = pos.map_pos() + offset;
    match pass {
        RenderPass::Ground => engine.draw_picture(tile.picture(), screen),
        RenderPass::GroundAnimation => {
            if let Some(frame) = tile.animation().and_then(|animation| animation.current_frame()) {
                engine.draw_picture(frame, screen);
            }
        }
        RenderPass::Foreground | RenderPass::Overlay => {}
    }
    let Some(overlay) = tile.overlay().and_then(|id| city.overlays().get(id)) else {
        return;
    };
    for picture in overlay.pictures(pass) {
        engine.draw_picture(picture, screen);
    }
}
