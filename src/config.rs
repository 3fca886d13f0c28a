//! Terrain configuration.
//!
//! [`TerrainConfig`] is plain data: it can be built in code, parsed from TOML
//! with [`TerrainConfig::from_toml_str`], or loaded as a `*.terrain.toml`
//! asset through [`TerrainConfigPlugin`], which also hot-reloads it.

use bevy::asset::AssetEvent;
use bevy::ecs::message::MessageReader;
use bevy::prelude::*;
use bevy::reflect::TypePath;
use bevy_common_assets::toml::TomlAssetPlugin;
use serde::Deserialize;

use crate::grid::TerrainGrid;
use crate::schedule::TerrainSet;

/// Construction parameters for a terrain grid.
///
/// Missing TOML keys fall back to [`Default`].
#[derive(Asset, TypePath, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
  /// Samples along each side of a tile.
  pub resolution: u32,
  /// World units between adjacent samples.
  pub cell_scale: f32,
  /// Extrusion depth of contour walls.
  pub wall_depth: f32,
  /// Fill tiles anchored below world Y = 0 with solid material.
  pub generate_ground: bool,
  /// Radius used by [`PaintTerrain::with_defaults`](crate::PaintTerrain::with_defaults).
  pub brush_radius: f32,
  /// Magnitude of a default brush stroke.
  pub brush_strength: f32,
  /// World units per texture repeat.
  pub uv_scale: f32,
}

impl Default for TerrainConfig {
  fn default() -> Self {
    Self {
      resolution: 16,
      cell_scale: 1.0,
      wall_depth: 1.0,
      generate_ground: true,
      brush_radius: 2.0,
      brush_strength: 0.25,
      uv_scale: 1.0,
    }
  }
}

impl TerrainConfig {
  /// Side length of one tile in world units.
  #[inline]
  pub fn footprint(&self) -> f32 {
    self.resolution as f32 * self.cell_scale
  }

  /// Parses and validates a TOML document.
  pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
    let config: Self = toml::from_str(source).map_err(ConfigError::Parse)?;
    config.validate()?;
    Ok(config)
  }

  /// Checks the values a grid cannot work with.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.resolution < 2 {
      return Err(ConfigError::Invalid(format!(
        "resolution must be at least 2, got {}",
        self.resolution
      )));
    }
    let positive = |name: &str, value: f32| {
      if value.is_finite() && value > 0.0 {
        Ok(())
      } else {
        Err(ConfigError::Invalid(format!(
          "{name} must be positive and finite, got {value}"
        )))
      }
    };
    positive("cell_scale", self.cell_scale)?;
    positive("wall_depth", self.wall_depth)?;
    positive("brush_radius", self.brush_radius)?;
    positive("uv_scale", self.uv_scale)?;
    Ok(())
  }
}

/// Errors from loading a [`TerrainConfig`].
#[derive(Debug)]
pub enum ConfigError {
  Parse(toml::de::Error),
  Invalid(String),
}

impl std::fmt::Display for ConfigError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Parse(e) => write!(f, "failed to parse terrain config: {}", e),
      Self::Invalid(msg) => write!(f, "invalid terrain config: {}", msg),
    }
  }
}

impl std::error::Error for ConfigError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Parse(e) => Some(e),
      Self::Invalid(_) => None,
    }
  }
}

/// Handle of the config asset driving the grid.
#[derive(Resource)]
pub struct TerrainConfigHandle(pub Handle<TerrainConfig>);

/// Loads a terrain config asset and rebuilds the grid whenever it changes.
///
/// Requires `AssetPlugin` and [`MarchingTerrainPlugin`](crate::MarchingTerrainPlugin).
pub struct TerrainConfigPlugin {
  /// Asset path, e.g. `"config/world.terrain.toml"`.
  pub path: String,
}

impl Plugin for TerrainConfigPlugin {
  fn build(&self, app: &mut App) {
    app.add_plugins(TomlAssetPlugin::<TerrainConfig>::new(&["terrain.toml"]));

    let path = self.path.clone();
    app.add_systems(
      Startup,
      move |mut commands: Commands, asset_server: Res<AssetServer>| {
        let handle: Handle<TerrainConfig> = asset_server.load(path.clone());
        commands.insert_resource(TerrainConfigHandle(handle));
      },
    );
    app.add_systems(Update, watch_config_changes.in_set(TerrainSet::Edit));
  }
}

fn watch_config_changes(
  config_handle: Option<Res<TerrainConfigHandle>>,
  mut messages: MessageReader<AssetEvent<TerrainConfig>>,
  configs: Res<Assets<TerrainConfig>>,
  mut grid: ResMut<TerrainGrid>,
) {
  let Some(config_handle) = config_handle else {
    messages.clear();
    return;
  };

  for event in messages.read() {
    let (AssetEvent::LoadedWithDependencies { id } | AssetEvent::Modified { id }) = event else {
      continue;
    };
    if config_handle.0.id() != *id {
      continue;
    }
    let Some(config) = configs.get(&config_handle.0) else {
      continue;
    };
    if let Err(e) = config.validate() {
      warn!("Ignoring terrain config: {e}");
      continue;
    }
    if grid.config() != config {
      info!("Terrain config reloaded, rebuilding grid");
      grid.reconfigure(*config);
    }
  }
}
