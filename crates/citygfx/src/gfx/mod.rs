mod engine;
mod picture;

pub use engine::{Engine, FrameEngine, TileDrawMask};
pub use picture::{
    LoadedPicture, Picture, PictureBank, PictureError, PictureNameError, PictureOffset,
};
