use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use image::ImageReader;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::geometry::Point;

/// Handle to one picture of a named picture set, e.g. `land1a` #2.
///
/// `offset` is added to the draw position to get the picture's top-left corner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Picture {
    name: String,
    index: u32,
    #[serde(default)]
    offset: PictureOffset,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PictureOffset {
    pub x: i32,
    pub y: i32,
}

impl Picture {
    pub fn new(name: impl Into<String>, index: u32) -> Self {
        Self {
            name: name.into(),
            index,
            offset: PictureOffset::default(),
        }
    }

    pub fn with_offset(mut self, offset: Point) -> Self {
        self.offset = PictureOffset {
            x: offset.x,
            y: offset.y,
        };
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn offset(&self) -> Point {
        Point::new(self.offset.x, self.offset.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PictureNameError {
    #[error("picture name must not be empty")]
    Empty,
    #[error("picture name must not contain path separators")]
    PathSeparator,
    #[error("picture name must not contain '..'")]
    ParentTraversal,
    #[error("picture name contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

#[derive(Debug, Error)]
pub enum PictureError {
    #[error("invalid picture name {name:?}: {source}")]
    InvalidName {
        name: String,
        #[source]
        source: PictureNameError,
    },
    #[error("failed to open picture file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode picture file {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("pixel buffer holds {actual} bytes, {width}x{height} RGBA needs {expected}")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

pub(crate) fn validate_picture_name(name: &str) -> Result<(), PictureNameError> {
    if name.is_empty() {
        return Err(PictureNameError::Empty);
    }
    if name.contains('/') || name.contains('\\') {
        return Err(PictureNameError::PathSeparator);
    }
    if name.contains("..") {
        return Err(PictureNameError::ParentTraversal);
    }
    for ch in name.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '-') {
            continue;
        }
        return Err(PictureNameError::InvalidCharacter { character: ch });
    }
    Ok(())
}

/// Decoded RGBA8 pixels of a picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPicture {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl LoadedPicture {
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, PictureError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(PictureError::BufferSize {
                width,
                height,
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn load(path: &Path) -> Result<Self, PictureError> {
        let reader = ImageReader::open(path).map_err(|source| PictureError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded = reader.decode().map_err(|source| PictureError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let image = decoded.to_rgba8();
        Ok(Self {
            width: image.width(),
            height: image.height(),
            rgba: image.into_raw(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let bytes = self.rgba.get(offset..offset + 4)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

type PictureKey = (String, u32);

/// Lazily loads pictures from `<root>/pictures/<name>_<index:05>.png`.
///
/// Failed loads are cached as misses and warned about once per picture.
#[derive(Debug, Default)]
pub struct PictureBank {
    root: PathBuf,
    cache: HashMap<PictureKey, Option<LoadedPicture>>,
    warned: HashSet<PictureKey>,
}

impl PictureBank {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: HashMap::new(),
            warned: HashSet::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn insert(&mut self, name: &str, index: u32, picture: LoadedPicture) {
        self.cache.insert((name.to_string(), index), Some(picture));
    }

    pub fn path_for(&self, picture: &Picture) -> Result<PathBuf, PictureError> {
        validate_picture_name(picture.name()).map_err(|source| PictureError::InvalidName {
            name: picture.name().to_string(),
            source,
        })?;
        Ok(self
            .root
            .join("pictures")
            .join(format!("{}_{:05}.png", picture.name(), picture.index())))
    }

    pub fn resolve(&mut self, picture: &Picture) -> Option<&LoadedPicture> {
        let key = (picture.name().to_string(), picture.index());
        if !self.cache.contains_key(&key) {
            let loaded = match self
                .path_for(picture)
                .and_then(|path| LoadedPicture::load(&path))
            {
                Ok(loaded) => Some(loaded),
                Err(error) => {
                    self.warn_once(&key, &error);
                    None
                }
            };
            self.cache.insert(key.clone(), loaded);
        }
        self.cache.get(&key).and_then(Option::as_ref)
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    fn warn_once(&mut self, key: &PictureKey, error: &PictureError) {
        if !self.warned.insert(key.clone()) {
            return;
        }
        warn!(
            picture = key.0.as_str(),
            index = key.1,
            error = %error,
            "picture_load_failed_using_placeholder"
        );
    }
}
