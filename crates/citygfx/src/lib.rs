use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod camera;
pub mod city;
pub mod events;
pub mod geometry;
pub mod gfx;
pub mod input;
pub mod layer;
pub mod overlay;
pub mod tile;
pub mod tilemap;
pub mod view;
pub mod walker;

pub use app::{run_app, run_app_with_metrics, AppError, FrameMetricsSnapshot, LoopConfig, MetricsHandle};
pub use camera::{Camera, DEFAULT_SCROLL_SPEED_PX};
pub use city::{BuildError, City, WalkerError};
pub use events::{EventQueue, GameEvent};
pub use geometry::{Point, Size, TilePos};
pub use gfx::{Engine, FrameEngine, Picture, PictureBank, PictureError, TileDrawMask};
pub use input::{InputEvent, Key, KeyboardEvent, MouseEvent, MouseEventKind};
pub use layer::{
    DestroyLayer, Layer, LayerContext, LayerKind, LayerSettings, SelectionArea, SimpleLayer,
};
pub use overlay::{Overlay, OverlayDesc, OverlayId, OverlayKind, RenderPass};
pub use tile::{Animation, Terrain, Tile, TileFlags};
pub use tilemap::{Tilemap, TilemapError, TilesArray};
pub use view::CityView;
pub use walker::{Walker, WalkerFilter, WalkerId, WalkerKind};

pub const ROOT_ENV_VAR: &str = "CITYVIEW_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub scenarios_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("{var} points at {path}, which is not a cityview checkout (needs Cargo.toml plus crates/ or assets/)")]
    InvalidEnvRoot { var: &'static str, path: PathBuf },
    #[error("no cityview checkout found above {start_dir}; set {var} to the project directory")]
    RootNotFound {
        start_dir: PathBuf,
        var: &'static str,
    },
}

/// Locates the project root from `CITYVIEW_ROOT`, or by walking up from the
/// executable. Picture files live under `<root>/assets/pictures`.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = match env::var(ROOT_ENV_VAR) {
        Ok(value) => root_from_env(Path::new(&value))?,
        Err(env::VarError::NotPresent) => root_from_exe()?,
        Err(source) => {
            return Err(StartupError::EnvVar {
                var: ROOT_ENV_VAR,
                source,
            })
        }
    };
    Ok(AppPaths::for_root(root))
}

impl AppPaths {
    fn for_root(root: PathBuf) -> Self {
        Self {
            assets_dir: root.join("assets"),
            scenarios_dir: root.join("scenarios"),
            root,
        }
    }
}

fn root_from_env(value: &Path) -> Result<PathBuf, StartupError> {
    let root = canonical_or_raw(value);
    if is_project_root(&root) {
        Ok(root)
    } else {
        Err(StartupError::InvalidEnvRoot {
            var: ROOT_ENV_VAR,
            path: root,
        })
    }
}

fn root_from_exe() -> Result<PathBuf, StartupError> {
    let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
    let start_dir = exe
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;
    find_project_root(&start_dir).ok_or_else(|| StartupError::RootNotFound {
        start_dir: canonical_or_raw(&start_dir),
        var: ROOT_ENV_VAR,
    })
}

fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| is_project_root(candidate))
        .map(canonical_or_raw)
}

fn is_project_root(path: &Path) -> bool {
    path.join("Cargo.toml").is_file()
        && (path.join("crates").is_dir() || path.join("assets").is_dir())
}

fn canonical_or_raw(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
