use crate::geometry::{Point, Size, TILE_HALF_HEIGHT_PX, TILE_HALF_WIDTH_PX};

use super::picture::{Picture, PictureBank};

/// Drawing surface consumed by layers.
pub trait Engine {
    fn draw_picture(&mut self, picture: &Picture, pos: Point);
    fn set_tile_draw_mask(&mut self, mask: TileDrawMask);
    fn reset_tile_draw_mask(&mut self);
}

/// Per-channel ARGB masks. A masked pixel keeps `(argb & red) | (argb & green)
/// | (argb & blue) | (argb & alpha)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileDrawMask {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
    pub alpha: u32,
}

impl TileDrawMask {
    /// Keeps only the red channel, used to tint tiles marked for demolition.
    pub const DESTROY_HIGHLIGHT: TileDrawMask = TileDrawMask {
        red: 0x00ff_0000,
        green: 0,
        blue: 0,
        alpha: 0xff00_0000,
    };

    pub const fn apply(self, argb: u32) -> u32 {
        (argb & self.red) | (argb & self.green) | (argb & self.blue) | (argb & self.alpha)
    }

    pub fn apply_rgba(self, rgba: [u8; 4]) -> [u8; 4] {
        let argb = u32::from_be_bytes([rgba[3], rgba[0], rgba[1], rgba[2]]);
        let [a, r, g, b] = self.apply(argb).to_be_bytes();
        [r, g, b, a]
    }
}

const FALLBACK_GRASS_COLOR: [u8; 4] = [74, 112, 56, 255];
const FALLBACK_MEADOW_COLOR: [u8; 4] = [96, 128, 60, 255];
const FALLBACK_WATER_COLOR: [u8; 4] = [48, 86, 140, 255];
const FALLBACK_ROCK_COLOR: [u8; 4] = [110, 106, 98, 255];
const FALLBACK_TREE_COLOR: [u8; 4] = [38, 78, 40, 255];
const FALLBACK_ROAD_COLOR: [u8; 4] = [140, 120, 92, 255];
const FALLBACK_UNKNOWN_COLOR: [u8; 4] = [168, 150, 130, 255];

/// Software [`Engine`] that blits pictures into an RGBA8 frame.
///
/// Pictures missing from the bank are drawn as a flat diamond the size of a tile.
pub struct FrameEngine<'a> {
    frame: &'a mut [u8],
    size: Size,
    bank: &'a mut PictureBank,
    mask: Option<TileDrawMask>,
    pictures_drawn: u32,
}

impl<'a> FrameEngine<'a> {
    pub fn new(frame: &'a mut [u8], size: Size, bank: &'a mut PictureBank) -> Self {
        Self {
            frame,
            size,
            bank,
            mask: None,
            pictures_drawn: 0,
        }
    }

    pub fn clear(&mut self, color: [u8; 4]) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    pub fn pictures_drawn(&self) -> u32 {
        self.pictures_drawn
    }

    pub fn mask(&self) -> Option<TileDrawMask> {
        self.mask
    }
}

impl Engine for FrameEngine<'_> {
    fn draw_picture(&mut self, picture: &Picture, pos: Point) {
        let top_left = pos + picture.offset();
        self.pictures_drawn = self.pictures_drawn.saturating_add(1);
        let Some(loaded) = self.bank.resolve(picture) else {
            draw_fallback_diamond(
                self.frame,
                self.size,
                self.mask,
                top_left,
                fallback_color(picture.name()),
            );
            return;
        };
        for y in 0..loaded.height() {
            for x in 0..loaded.width() {
                let Some(color) = loaded.pixel(x, y) else {
                    continue;
                };
                if color[3] == 0 {
                    continue;
                }
                write_pixel_clipped(
                    self.frame,
                    self.size,
                    self.mask,
                    top_left.x + x as i32,
                    top_left.y + y as i32,
                    color,
                );
            }
        }
    }

    fn set_tile_draw_mask(&mut self, mask: TileDrawMask) {
        self.mask = Some(mask);
    }

    fn reset_tile_draw_mask(&mut self) {
        self.mask = None;
    }
}

fn draw_fallback_diamond(
    frame: &mut [u8],
    size: Size,
    mask: Option<TileDrawMask>,
    top_left: Point,
    color: [u8; 4],
) {
    let center_x = top_left.x + TILE_HALF_WIDTH_PX;
    let center_y = top_left.y + TILE_HALF_HEIGHT_PX;
    for dy in -TILE_HALF_HEIGHT_PX..TILE_HALF_HEIGHT_PX {
        let half_span = (TILE_HALF_HEIGHT_PX - dy.abs()) * TILE_HALF_WIDTH_PX / TILE_HALF_HEIGHT_PX;
        for x in (center_x - half_span)..(center_x + half_span) {
            write_pixel_clipped(frame, size, mask, x, center_y + dy, color);
        }
    }
}

fn write_pixel_clipped(
    frame: &mut [u8],
    size: Size,
    mask: Option<TileDrawMask>,
    x: i32,
    y: i32,
    color: [u8; 4],
) {
    if x < 0 || y < 0 || x >= size.width as i32 || y >= size.height as i32 {
        return;
    }
    let color = match mask {
        Some(mask) => mask.apply_rgba(color),
        None => color,
    };
    let offset = (y as usize * size.width as usize + x as usize) * 4;
    if let Some(pixel) = frame.get_mut(offset..offset + 4) {
        pixel.copy_from_slice(&color);
    }
}

fn fallback_color(name: &str) -> [u8; 4] {
    match name {
        "grass" => FALLBACK_GRASS_COLOR,
        "meadow" => FALLBACK_MEADOW_COLOR,
        "water" => FALLBACK_WATER_COLOR,
        "rock" => FALLBACK_ROCK_COLOR,
        "tree" => FALLBACK_TREE_COLOR,
        "road" => FALLBACK_ROAD_COLOR,
        _ => FALLBACK_UNKNOWN_COLOR,
    }
}
