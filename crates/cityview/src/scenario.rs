use std::fs;
use std::path::{Path, PathBuf};

use citygfx::{
    BuildError, City, LayerSettings, OverlayDesc, OverlayKind, Picture, RenderPass, Terrain,
    TilePos, Tilemap, TilemapError, WalkerError, WalkerKind,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

pub(crate) const BUILTIN_SCENARIO_NAME: &str = "riverside";
const BUILTIN_SCENARIO_JSON: &str = include_str!("../scenarios/riverside.json");

/// City layout loaded from JSON: map size, terrain, overlays, walkers and
/// view settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    pub(crate) name: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
    #[serde(default)]
    pub(crate) fill: Terrain,
    #[serde(default)]
    pub(crate) terrain: Vec<TerrainPatch>,
    #[serde(default)]
    pub(crate) overlays: Vec<OverlaySpec>,
    #[serde(default)]
    pub(crate) walkers: Vec<WalkerSpec>,
    #[serde(default)]
    pub(crate) view: ViewSpec,
}

/// Inclusive rectangle of tiles set to one terrain.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TerrainPatch {
    pub(crate) terrain: Terrain,
    pub(crate) from: TilePos,
    pub(crate) to: TilePos,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct OverlaySpec {
    pub(crate) kind: OverlayKind,
    pub(crate) pos: TilePos,
    #[serde(default = "default_overlay_size")]
    pub(crate) size: u32,
    #[serde(default)]
    pub(crate) indestructible: bool,
    /// Replaces the kind's default pictures when present.
    #[serde(default)]
    pub(crate) pictures: Option<Vec<PictureSpec>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PictureSpec {
    pub(crate) pass: RenderPass,
    #[serde(flatten)]
    pub(crate) picture: Picture,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct WalkerSpec {
    pub(crate) kind: WalkerKind,
    pub(crate) pos: TilePos,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ViewSpec {
    #[serde(default)]
    pub(crate) start_tile: Option<TilePos>,
    #[serde(default)]
    pub(crate) scroll_speed: Option<i32>,
    #[serde(default)]
    pub(crate) layer: Option<LayerSettings>,
}

fn default_overlay_size() -> u32 {
    1
}

#[derive(Debug, Error)]
pub(crate) enum ScenarioError {
    #[error("failed to read scenario file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario {origin} at {path}: {source}")]
    Parse {
        origin: String,
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("scenario {name} has an invalid tilemap: {source}")]
    Tilemap {
        name: String,
        #[source]
        source: TilemapError,
    },
    #[error("scenario {name} overlay #{index} cannot be built: {source}")]
    Build {
        name: String,
        index: usize,
        #[source]
        source: BuildError,
    },
    #[error("scenario {name} walker #{index} cannot be placed: {source}")]
    Walker {
        name: String,
        index: usize,
        #[source]
        source: WalkerError,
    },
}

impl Scenario {
    pub(crate) fn builtin() -> Result<Self, ScenarioError> {
        Self::parse(BUILTIN_SCENARIO_JSON, BUILTIN_SCENARIO_NAME)
    }

    pub(crate) fn load(path: &Path) -> Result<Self, ScenarioError> {
        let raw = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw, &path.display().to_string())
    }

    pub(crate) fn parse(raw: &str, origin: &str) -> Result<Self, ScenarioError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            let path = error.path().to_string();
            ScenarioError::Parse {
                origin: origin.to_string(),
                path,
                source: error.into_inner(),
            }
        })
    }

    /// Builds the city: terrain patches in order, then overlays, then walkers.
    pub(crate) fn build_city(&self) -> Result<City, ScenarioError> {
        let mut terrain = vec![self.fill; self.width as usize * self.height as usize];
        for patch in &self.terrain {
            let (i_min, i_max) = (patch.from.i.min(patch.to.i), patch.from.i.max(patch.to.i));
            let (j_min, j_max) = (patch.from.j.min(patch.to.j), patch.from.j.max(patch.to.j));
            for j in j_min.max(0)..=j_max.min(self.height as i32 - 1) {
                for i in i_min.max(0)..=i_max.min(self.width as i32 - 1) {
                    terrain[j as usize * self.width as usize + i as usize] = patch.terrain;
                }
            }
        }
        let tilemap = Tilemap::from_terrain(self.width, self.height, terrain).map_err(|source| {
            ScenarioError::Tilemap {
                name: self.name.clone(),
                source,
            }
        })?;

        let mut city = City::new(tilemap);
        for (index, spec) in self.overlays.iter().enumerate() {
            let mut desc = OverlayDesc::new(spec.kind.clone(), spec.pos, spec.size);
            if let Some(pictures) = &spec.pictures {
                desc = desc.with_pictures(
                    pictures
                        .iter()
                        .map(|picture| (picture.pass, picture.picture.clone()))
                        .collect(),
                );
            }
            if spec.indestructible {
                desc = desc.indestructible();
            }
            city.build(desc).map_err(|source| ScenarioError::Build {
                name: self.name.clone(),
                index,
                source,
            })?;
        }
        for (index, spec) in self.walkers.iter().enumerate() {
            city.spawn_walker(spec.kind, spec.pos)
                .map_err(|source| ScenarioError::Walker {
                    name: self.name.clone(),
                    index,
                    source,
                })?;
        }

        info!(
            scenario = self.name.as_str(),
            width = self.width,
            height = self.height,
            overlays = city.overlays().len(),
            walkers = city.walkers().len(),
            "scenario_built"
        );
        Ok(city)
    }
}
