use crate::city::City;
use crate::geometry::{Point, TilePos};
use crate::gfx::Engine;
use crate::input::{InputEvent, Key, MouseEventKind};
use crate::overlay::RenderPass;

use super::{draw_tile_pass, Layer, LayerBase, LayerContext, LayerKind, LayerSettings};

/// Plain city view: ground, ground animation and foreground for every tile.
#[derive(Debug, Clone)]
pub struct SimpleLayer {
    base: LayerBase,
}

impl SimpleLayer {
    pub fn new(settings: LayerSettings) -> Self {
        Self {
            base: LayerBase::new(settings),
        }
    }
}

impl Layer for SimpleLayer {
    fn kind(&self) -> LayerKind {
        LayerKind::Simple
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
        for pass in [
            RenderPass::Ground,
            RenderPass::GroundAnimation,
            RenderPass::Foreground,
        ] {
            draw_tile_pass(engine, city, pos, offset, pass);
        }
    }

    fn handle_event(&mut self, ctx: &mut LayerContext<'_>, event: &InputEvent) {
        match event {
            InputEvent::Mouse(mouse) => {
                if mouse.kind == MouseEventKind::Moved {
                    self.base.last_cursor = Some(mouse.pos);
                }
            }
            InputEvent::Keyboard(keyboard) => {
                if self.base.handle_camera_keys(ctx.camera, keyboard) {
                    return;
                }
                if keyboard.pressed && matches!(keyboard.key, Key::Character('d' | 'D')) {
                    self.base.request_layer(LayerKind::Destroy);
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
    use crate::gfx::Picture;
    use crate::layer::test_support::RecordingEngine;
    use crate::overlay::{OverlayDesc, OverlayKind};
    use crate::tile::{Animation, Terrain};
    use crate::tilemap::Tilemap;

    fn city() -> City {
        City::new(Tilemap::new(4, 4, Terrain::Grass).expect("tilemap"))
    }

    #[test]
    fn draw_tile_runs_ground_animation_and_foreground_in_order() {
        let mut city = city();
        let pos = TilePos::new(1, 1);
        city.build(
            OverlayDesc::new(OverlayKind::House, pos, 1)
                .with_picture(RenderPass::GroundAnimation, Picture::new("house_smoke", 1)),
        )
        .expect("house");
        city.tilemap_mut()
            .tile_mut(pos)
            .expect("tile")
            .set_animation(Some(Animation::new(vec![Picture::new("grass_sway", 3)])));

        let mut layer = SimpleLayer::new(LayerSettings::default());
        let mut engine = RecordingEngine::default();
        layer.draw_tile(&mut engine, &mut city, pos, Point::default());

        let names: Vec<String> = engine
            .calls
            .iter()
            .filter_map(|call| match call {
                crate::layer::test_support::EngineCall::Draw { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["grass", "grass_sway", "house_smoke", "house"]);
        assert_eq!(layer.base().post_render_tiles().as_slice(), &[pos]);
    }

    #[test]
    fn d_key_requests_destroy_layer_and_arrows_pan() {
        let mut city = city();
        let mut camera = Camera::new(Size::new(200, 200));
        let mut events = EventQueue::new();
        let mut ctx = LayerContext {
            city: &mut city,
            camera: &mut camera,
            events: &mut events,
        };
        let mut layer = SimpleLayer::new(LayerSettings::default());

        layer.handle_event(&mut ctx, &InputEvent::key(Key::ArrowLeft, true, false));
        assert_eq!(ctx.camera.velocity().x, -ctx.camera.scroll_speed());
        assert_eq!(layer.take_next_layer(), None);

        layer.handle_event(&mut ctx, &InputEvent::key(Key::Character('d'), true, false));
        assert_eq!(layer.take_next_layer(), Some(LayerKind::Destroy));
        assert_eq!(layer.take_next_layer(), None);
    }
}
