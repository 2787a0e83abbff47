use std::ffi::OsString;
use std::path::PathBuf;

use citygfx::{City, LoopConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::scenario::{Scenario, ScenarioError};

const MAX_FPS_ENV_VAR: &str = "CITYVIEW_MAX_FPS";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) city: City,
}

/// Sets up logging, then loads the scenario named by the first argument or
/// the built-in one.
pub(crate) fn build_app(args: impl IntoIterator<Item = OsString>) -> Result<AppWiring, ScenarioError> {
    init_tracing();
    info!("=== City View Startup ===");

    let scenario = match scenario_path(args) {
        Some(path) => {
            info!(path = %path.display(), "scenario_loading");
            Scenario::load(&path)?
        }
        None => Scenario::builtin()?,
    };
    let city = scenario.build_city()?;
    let config = loop_config_for(&scenario, std::env::var(MAX_FPS_ENV_VAR).ok().as_deref());

    Ok(AppWiring { config, city })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn scenario_path(args: impl IntoIterator<Item = OsString>) -> Option<PathBuf> {
    args.into_iter().nth(1).map(PathBuf::from)
}

fn loop_config_for(scenario: &Scenario, max_fps: Option<&str>) -> LoopConfig {
    let defaults = LoopConfig::default();
    LoopConfig {
        window_title: format!("City View - {}", scenario.name),
        scroll_speed: scenario.view.scroll_speed.unwrap_or(defaults.scroll_speed),
        layer_settings: scenario
            .view
            .layer
            .clone()
            .unwrap_or_else(|| defaults.layer_settings.clone()),
        start_tile: scenario.view.start_tile,
        max_render_fps: max_fps.map_or(defaults.max_render_fps, parse_render_cap),
        ..defaults
    }
}

/// `off` or `0` disables the cap; unparsable values keep the default.
fn parse_render_cap(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("off") {
        return None;
    }
    match trimmed.parse::<u32>() {
        Ok(0) => None,
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = MAX_FPS_ENV_VAR, value = trimmed, "render_cap_ignored");
            LoopConfig::default().max_render_fps
        }
    }
}

#[cfg(test)]
mod tests {
    use citygfx::TilePos;

    use super::*;

    #[test]
    fn scenario_path_skips_program_name() {
        let args = vec![OsString::from("cityview"), OsString::from("maps/port.json")];
        assert_eq!(scenario_path(args), Some(PathBuf::from("maps/port.json")));
        assert_eq!(scenario_path(vec![OsString::from("cityview")]), None);
    }

    #[test]
    fn loop_config_takes_view_settings_from_scenario() {
        let scenario = Scenario::parse(
            r#"{ "name": "delta", "width": 8, "height": 8,
                 "view": {
                    "start_tile": { "i": 3, "j": 4 },
                    "scroll_speed": 20,
                    "layer": { "shift_multiplier": 2 }
                 } }"#,
            "inline",
        )
        .expect("parse");

        let config = loop_config_for(&scenario, None);
        assert_eq!(config.window_title, "City View - delta");
        assert_eq!(config.scroll_speed, 20);
        assert_eq!(config.layer_settings.shift_multiplier, 2);
        assert_eq!(config.start_tile, Some(TilePos::new(3, 4)));
        assert_eq!(config.max_render_fps, LoopConfig::default().max_render_fps);
    }

    #[test]
    fn render_cap_parsing() {
        assert_eq!(parse_render_cap("off"), None);
        assert_eq!(parse_render_cap(" 0 "), None);
        assert_eq!(parse_render_cap("144"), Some(144));
        assert_eq!(parse_render_cap("fast"), LoopConfig::default().max_render_fps);
    }
}
