use std::path::PathBuf;
use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::geometry::Size;
use crate::gfx::{FrameEngine, PictureBank};
use crate::view::CityView;

const CLEAR_COLOR: [u8; 4] = [16, 18, 24, 255];

/// Window-backed pixel surface plus the picture cache used to fill it.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    size: Size,
    bank: PictureBank,
}

impl Renderer {
    pub fn new(window: Arc<Window>, asset_root: PathBuf) -> Result<Self, Error> {
        let inner = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), inner.width, inner.height)?;
        Ok(Self {
            window,
            pixels,
            size: Size::new(inner.width, inner.height),
            bank: PictureBank::new(asset_root),
        })
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.size = Size::new(width, height);
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    /// Draws one frame of the view and presents it. Returns the number of
    /// pictures drawn.
    pub fn render_view(&mut self, view: &mut CityView) -> Result<u32, Error> {
        let pictures_drawn = {
            let mut engine = FrameEngine::new(self.pixels.frame_mut(), self.size, &mut self.bank);
            engine.clear(CLEAR_COLOR);
            view.render(&mut engine);
            engine.pictures_drawn()
        };
        self.pixels.render()?;
        Ok(pictures_drawn)
    }

    pub fn cached_pictures(&self) -> usize {
        self.bank.cached_count()
    }
}
