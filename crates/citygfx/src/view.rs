use tracing::{debug, info};

use crate::camera::Camera;
use crate::city::City;
use crate::events::{EventQueue, GameEvent};
use crate::gfx::Engine;
use crate::input::InputEvent;
use crate::layer::{DestroyLayer, Layer, LayerContext, LayerKind, LayerSettings, SimpleLayer};

/// Owns the city, its camera and one instance of every layer, and routes
/// frames and input to the active layer.
pub struct CityView {
    city: City,
    camera: Camera,
    events: EventQueue,
    simple: Box<dyn Layer>,
    destroy: Box<dyn Layer>,
    active: LayerKind,
}

impl CityView {
    pub fn new(city: City, camera: Camera, settings: LayerSettings) -> Self {
        Self {
            city,
            camera,
            events: EventQueue::new(),
            simple: Box::new(SimpleLayer::new(settings.clone())),
            destroy: Box::new(DestroyLayer::new(settings)),
            active: LayerKind::Simple,
        }
    }

    pub fn city(&self) -> &City {
        &self.city
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn layer_kind(&self) -> LayerKind {
        self.active
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Activates `kind`. Returns false when it is already active.
    pub fn set_layer(&mut self, kind: LayerKind) -> bool {
        if self.active == kind {
            return false;
        }
        let previous = self.active;
        self.active = kind;
        self.layer_mut(kind).base_mut().reset_interaction();
        info!(from = ?previous, to = ?kind, "layer_switched");
        true
    }

    pub fn render(&mut self, engine: &mut dyn Engine) {
        let (layer, mut ctx) = self.split_active();
        layer.render(&mut ctx, engine);
    }

    /// Forwards input to the active layer, then applies any layer switch it
    /// requested.
    pub fn handle_event(&mut self, event: &InputEvent) {
        let next = {
            let (layer, mut ctx) = self.split_active();
            layer.handle_event(&mut ctx, event);
            layer.take_next_layer()
        };
        if let Some(kind) = next {
            self.set_layer(kind);
        }
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }

    /// Applies queued events to the city. Returns how many changed it.
    pub fn apply_events(&mut self) -> usize {
        let mut applied = 0;
        for event in self.events.drain() {
            match event {
                GameEvent::ClearLand { pos } => {
                    if self.city.clear_land(pos) {
                        applied += 1;
                    }
                }
            }
        }
        if applied > 0 {
            debug!(applied, "game_events_applied");
        }
        applied
    }

    /// Per-frame state advance: camera panning and tile animations.
    pub fn update(&mut self) {
        self.camera.update();
        self.city.tilemap_mut().advance_animations();
    }

    fn layer_mut(&mut self, kind: LayerKind) -> &mut dyn Layer {
        match kind {
            LayerKind::Simple => self.simple.as_mut(),
            LayerKind::Destroy => self.destroy.as_mut(),
        }
    }

    fn split_active(&mut self) -> (&mut dyn Layer, LayerContext<'_>) {
        let layer = match self.active {
            LayerKind::Simple => self.simple.as_mut(),
            LayerKind::Destroy => self.destroy.as_mut(),
        };
        let ctx = LayerContext {
            city: &mut self.city,
            camera: &mut self.camera,
            events: &mut self.events,
        };
        (layer, ctx)
    }
}
