use tracing::debug;

use crate::city::City;
use crate::events::GameEvent;
use crate::geometry::{Point, TilePos};
use crate::gfx::{Engine, TileDrawMask};
use crate::input::{InputEvent, Key, MouseEvent, MouseEventKind};
use crate::overlay::RenderPass;
use crate::tile::Tile;

use super::{
    begin_frame, draw_flat_tile, draw_tile_pass, draw_tile_r, draw_walkers, selected_area, Layer,
    LayerBase, LayerContext, LayerKind, LayerSettings, SelectionArea,
};

/// Demolition tool. Drag with the left button to select, release to clear,
/// right-click to leave.
#[derive(Debug, Clone)]
pub struct DestroyLayer {
    base: LayerBase,
}

impl DestroyLayer {
    pub fn new(settings: LayerSettings) -> Self {
        Self {
            base: LayerBase::new(settings),
        }
    }

    /// Current drag rectangle grown to whole overlay footprints.
    pub fn selection(&self, ctx: &LayerContext<'_>) -> SelectionArea {
        let area = selected_area(
            ctx.city.tilemap(),
            ctx.camera,
            self.base.start_cursor,
            self.base.last_cursor,
        );
        SelectionArea::resolve(ctx.city, &area)
    }

    fn clear_selection(&self, ctx: &mut LayerContext<'_>) -> usize {
        let selection = self.selection(ctx);
        for pos in selection.sorted() {
            ctx.events.dispatch(GameEvent::ClearLand { pos });
        }
        selection.len()
    }

    /// Flat-pass drawing for a tile inside the selection: single tiles get the
    /// clear marker, multi-tile structures are tinted when destructible.
    fn draw_selected_flat_tile(
        &mut self,
        engine: &mut dyn Engine,
        city: &mut City,
        pos: TilePos,
        offset: Point,
    ) {
        let Some(tile) = city.tilemap().tile(pos) else {
            return;
        };
        match tile.master() {
            None => {
                self.draw_tile(engine, city, pos, offset);
                engine.draw_picture(&self.base.settings.clear_marker, pos.map_pos() + offset);
            }
            Some(master) => {
                let (destructible, drawn) = city
                    .tilemap()
                    .tile(master)
                    .map_or((false, true), |tile| (tile.is_destructible(), tile.was_drawn()));
                if destructible {
                    engine.set_tile_draw_mask(TileDrawMask::DESTROY_HIGHLIGHT);
                }
                if !drawn {
                    self.draw_tile(engine, city, master, offset);
                }
                engine.reset_tile_draw_mask();
            }
        }
    }

    fn handle_mouse(&mut self, ctx: &mut LayerContext<'_>, mouse: &MouseEvent) {
        match mouse.kind {
            MouseEventKind::Moved => {
                self.base.last_cursor = Some(mouse.pos);
                if !mouse.left_held || self.base.start_cursor.is_none() {
                    self.base.start_cursor = Some(mouse.pos);
                }
            }
            MouseEventKind::LeftPressed => {
                let anchor = self.base.last_cursor.unwrap_or(mouse.pos);
                self.base.last_cursor = Some(anchor);
                self.base.start_cursor = Some(anchor);
            }
            MouseEventKind::LeftReleased => {
                if ctx.camera.at(mouse.pos, ctx.city.tilemap()).is_none() {
                    return;
                }
                self.base.last_cursor = Some(mouse.pos);
                let cleared = self.clear_selection(ctx);
                debug!(
                    tiles = cleared,
                    x = mouse.pos.x,
                    y = mouse.pos.y,
                    "destroy_selection_committed"
                );
                self.base.start_cursor = self.base.last_cursor;
            }
            MouseEventKind::RightReleased => self.base.request_layer(LayerKind::Simple),
            MouseEventKind::RightPressed => {}
        }
    }
}

impl Layer for DestroyLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Destroy
    }

    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn draw_tile(&mut self, engine: &mut dyn Engine, city: &mut City, pos: TilePos, offset: Point) {
        if !self.base.begin_tile(city, pos) {
            return;
        }
        draw_tile_pass(engine, city, pos, offset, RenderPass::Ground);
        if let Some(tile) = city.tilemap().tile(pos) {
            if let Some(frame) = tile.animation().and_then(|animation| animation.current_frame()) {
                engine.draw_picture(frame, pos.map_pos() + offset);
            }
        }
        draw_tile_pass(engine, city, pos, offset, RenderPass::Foreground);
    }

    fn render(&mut self, ctx: &mut LayerContext<'_>, engine: &mut dyn Engine) {
        let visible = begin_frame(self, ctx);
        let offset = ctx.camera.offset();
        let selection = self.selection(ctx);

        for pos in visible.iter() {
            if selection.contains(pos) {
                let flat = ctx.city.tilemap().tile(pos).is_some_and(Tile::is_flat);
                if flat {
                    self.draw_selected_flat_tile(engine, ctx.city, pos, offset);
                }
            } else {
                draw_flat_tile(self, engine, ctx.city, pos, offset);
            }
        }

        let filter = self.visible_walkers();
        for pos in visible.iter() {
            let destructible = ctx
                .city
                .tilemap()
                .tile(pos)
                .is_some_and(Tile::is_destructible);
            if destructible && selection.contains(pos) {
                engine.set_tile_draw_mask(TileDrawMask::DESTROY_HIGHLIGHT);
            }
            draw_tile_r(self, engine, ctx.city, pos, offset);
            draw_walkers(engine, ctx.city, &filter, pos, offset);
            engine.reset_tile_draw_mask();
        }

        self.after_render(ctx, engine);
    }

    fn handle_event(&mut self, ctx: &mut LayerContext<'_>, event: &InputEvent) {
        match event {
            InputEvent::Mouse(mouse) => self.handle_mouse(ctx, mouse),
            InputEvent::Keyboard(keyboard) => {
                if self.base.handle_camera_keys(ctx.camera, keyboard) {
                    return;
                }
                if keyboard.pressed && keyboard.key == Key::Escape {
                    self.base.request_layer(LayerKind::Simple);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::events::EventQueue;
    use crate::geometry::Size;
    use crate::layer::test_support::{EngineCall, RecordingEngine};
    use crate::overlay::{OverlayDesc, OverlayKind};
    use crate::tile::Terrain;
    use crate::tilemap::Tilemap;

    struct Fixture {
        city: City,
        camera: Camera,
        events: EventQueue,
        layer: DestroyLayer,
    }

    impl Fixture {
        fn new(width: u32, height: u32) -> Self {
            let city = City::new(Tilemap::new(width, height, Terrain::Grass).expect("tilemap"));
            let mut camera = Camera::new(Size::new(1600, 1200));
            camera.center_on(TilePos::new(width as i32 / 2, height as i32 / 2));
            Self {
                city,
                camera,
                events: EventQueue::new(),
                layer: DestroyLayer::new(LayerSettings::default()),
            }
        }

        fn screen(&self, pos: TilePos) -> Point {
            self.camera.tile_screen_center(pos)
        }

        fn send(&mut self, event: InputEvent) {
            let mut ctx = LayerContext {
                city: &mut self.city,
                camera: &mut self.camera,
                events: &mut self.events,
            };
            self.layer.handle_event(&mut ctx, &event);
        }

        fn drag(&mut self, from: TilePos, to: TilePos) {
            let from = self.screen(from);
            let to = self.screen(to);
            self.send(InputEvent::mouse(MouseEventKind::Moved, from, false));
            self.send(InputEvent::mouse(MouseEventKind::LeftPressed, from, true));
            self.send(InputEvent::mouse(MouseEventKind::Moved, to, true));
        }

        fn render(&mut self) -> RecordingEngine {
            let mut engine = RecordingEngine::default();
            let mut ctx = LayerContext {
                city: &mut self.city,
                camera: &mut self.camera,
                events: &mut self.events,
            };
            self.layer.render(&mut ctx, &mut engine);
            engine
        }

        fn cleared(&mut self) -> Vec<TilePos> {
            self.events
                .drain()
                .into_iter()
                .map(|event| match event {
                    GameEvent::ClearLand { pos } => pos,
                })
                .collect()
        }
    }

    #[test]
    fn release_over_tile_clears_every_selected_tile_once() {
        let mut fixture = Fixture::new(6, 6);
        fixture.drag(TilePos::new(1, 1), TilePos::new(2, 2));
        let release = fixture.screen(TilePos::new(2, 2));
        fixture.send(InputEvent::mouse(MouseEventKind::LeftReleased, release, false));

        assert_eq!(
            fixture.cleared(),
            vec![
                TilePos::new(1, 1),
                TilePos::new(2, 1),
                TilePos::new(1, 2),
                TilePos::new(2, 2)
            ]
        );
        assert_eq!(fixture.layer.base().start_cursor(), Some(release));
    }

    #[test]
    fn release_over_no_tile_dispatches_nothing() {
        let mut fixture = Fixture::new(4, 4);
        fixture.drag(TilePos::new(0, 0), TilePos::new(1, 1));
        let off_map = fixture.screen(TilePos::new(-5, -5));
        fixture.send(InputEvent::mouse(MouseEventKind::LeftReleased, off_map, false));
        assert!(fixture.cleared().is_empty());
    }

    #[test]
    fn release_clears_whole_building_when_only_a_corner_is_selected() {
        let mut fixture = Fixture::new(8, 8);
        let id = fixture
            .city
            .build(OverlayDesc::new(OverlayKind::Temple, TilePos::new(3, 3), 2))
            .expect("temple");
        let footprint = fixture.city.overlay_area(id);

        fixture.drag(TilePos::new(2, 2), TilePos::new(3, 3));
        let release = fixture.screen(TilePos::new(3, 3));
        fixture.send(InputEvent::mouse(MouseEventKind::LeftReleased, release, false));

        let cleared = fixture.cleared();
        assert_eq!(cleared.len(), 7);
        for pos in footprint.iter() {
            assert_eq!(cleared.iter().filter(|cleared| **cleared == pos).count(), 1);
        }
    }

    #[test]
    fn mouse_move_without_button_drags_the_anchor_along() {
        let mut fixture = Fixture::new(6, 6);
        let a = fixture.screen(TilePos::new(1, 1));
        let b = fixture.screen(TilePos::new(3, 3));
        fixture.send(InputEvent::mouse(MouseEventKind::Moved, a, false));
        fixture.send(InputEvent::mouse(MouseEventKind::Moved, b, false));
        assert_eq!(fixture.layer.base().start_cursor(), Some(b));
        assert_eq!(fixture.layer.base().last_cursor(), Some(b));

        fixture.send(InputEvent::mouse(MouseEventKind::LeftPressed, b, true));
        fixture.send(InputEvent::mouse(MouseEventKind::Moved, a, true));
        assert_eq!(fixture.layer.base().start_cursor(), Some(b));
        assert_eq!(fixture.layer.base().last_cursor(), Some(a));
    }

    #[test]
    fn right_release_and_escape_return_to_simple_layer() {
        let mut fixture = Fixture::new(3, 3);
        let pos = fixture.screen(TilePos::new(1, 1));
        fixture.send(InputEvent::mouse(MouseEventKind::RightPressed, pos, false));
        assert_eq!(fixture.layer.take_next_layer(), None);
        fixture.send(InputEvent::mouse(MouseEventKind::RightReleased, pos, false));
        assert_eq!(fixture.layer.take_next_layer(), Some(LayerKind::Simple));

        fixture.send(InputEvent::key(Key::Escape, true, false));
        assert_eq!(fixture.layer.take_next_layer(), Some(LayerKind::Simple));
    }

    #[test]
    fn arrow_keys_pan_linearly_with_shift() {
        let mut fixture = Fixture::new(3, 3);
        let speed = fixture.camera.scroll_speed();
        fixture.send(InputEvent::key(Key::ArrowDown, true, false));
        assert_eq!(fixture.camera.velocity().y, speed);
        fixture.send(InputEvent::key(Key::ArrowDown, true, true));
        assert_eq!(fixture.camera.velocity().y, 4 * speed);
        fixture.send(InputEvent::key(Key::ArrowDown, false, true));
        assert_eq!(fixture.camera.velocity().y, 0);
    }

    #[test]
    fn selected_single_tiles_get_the_clear_marker() {
        let mut fixture = Fixture::new(4, 4);
        fixture.drag(TilePos::new(1, 1), TilePos::new(2, 1));
        let engine = fixture.render();
        assert_eq!(engine.draws_named("oc3_land"), 2);
    }

    #[test]
    fn selected_building_is_drawn_once_with_the_highlight_mask() {
        let mut fixture = Fixture::new(8, 8);
        fixture
            .city
            .build(OverlayDesc::new(OverlayKind::Temple, TilePos::new(3, 3), 3))
            .expect("temple");
        fixture.drag(TilePos::new(4, 4), TilePos::new(4, 4));

        for _ in 0..2 {
            let engine = fixture.render();
            assert_eq!(engine.draws_named("temple"), 1);
            let masked = engine.masked_draws();
            assert!(masked.iter().any(|name| name == "temple"));
            assert!(!masked.iter().any(|name| name == "oc3_land"));
            assert_eq!(engine.mask(), None);
        }
    }

    #[test]
    fn mask_is_reset_after_every_sprite_tile() {
        let mut fixture = Fixture::new(5, 5);
        fixture
            .city
            .build(OverlayDesc::new(OverlayKind::House, TilePos::new(2, 2), 1))
            .expect("house");
        fixture.drag(TilePos::new(2, 2), TilePos::new(2, 2));
        let engine = fixture.render();

        let mut mask_open = false;
        for call in &engine.calls {
            match call {
                EngineCall::SetMask(_) => {
                    assert!(!mask_open, "mask set twice without reset");
                    mask_open = true;
                }
                EngineCall::ResetMask => mask_open = false,
                EngineCall::Draw { .. } => {}
            }
        }
        assert!(!mask_open);
        assert_eq!(engine.masked_draws(), vec!["grass".to_owned(), "house".to_owned()]);
    }

    #[test]
    fn selection_outside_the_overlay_leaves_it_unmasked() {
        let mut fixture = Fixture::new(8, 8);
        fixture
            .city
            .build(OverlayDesc::new(OverlayKind::House, TilePos::new(6, 6), 1))
            .expect("house");
        fixture.drag(TilePos::new(0, 0), TilePos::new(1, 1));
        let engine = fixture.render();
        assert!(!engine.masked_draws().iter().any(|name| name == "house"));
        assert_eq!(engine.draws_named("house"), 1);
    }
}
