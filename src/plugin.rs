//! Bevy integration: the terrain plugin, its messages and core systems.

use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;

use crate::config::TerrainConfig;
use crate::coords::TileCoord;
use crate::grid::TerrainGrid;
use crate::render::{TileEntities, sync_tile_meshes};
use crate::schedule::{TerrainSet, configure_sets};

/// Marker for the entity whose position keeps tiles streamed in, usually the
/// camera or the player.
#[derive(Component)]
pub struct StreamingViewpoint;

/// Request to add density around a point. Negative `delta` removes material.
#[derive(bevy::prelude::Message, Clone, Copy, Debug, PartialEq)]
pub struct PaintTerrain {
  /// World position, projected onto the tile plane.
  pub position: Vec3,
  pub radius: f32,
  pub delta: f32,
}

impl PaintTerrain {
  pub fn new(position: Vec3, radius: f32, delta: f32) -> Self {
    Self {
      position,
      radius,
      delta,
    }
  }

  /// A stroke with the configured brush radius and strength. The sign of
  /// `sign` picks between adding and removing material.
  pub fn with_defaults(config: &TerrainConfig, position: Vec3, sign: f32) -> Self {
    Self::new(
      position,
      config.brush_radius,
      config.brush_strength.copysign(sign),
    )
  }
}

/// Drops every tile, optionally switching to a new cell scale.
#[derive(bevy::prelude::Message, Clone, Copy, Debug, Default, PartialEq)]
pub struct ResetTerrain {
  pub cell_scale: Option<f32>,
}

/// Written after a tile's mesh buffer was replaced.
#[derive(bevy::prelude::Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileRemeshed {
  pub coord: TileCoord,
  pub triangle_count: usize,
}

/// Deformable marching squares terrain.
///
/// Inserts a [`TerrainGrid`] built from `config` and runs streaming, edits,
/// meshing and the render sink in [`TerrainSet`] order. With the `rapier2d`
/// feature, tiles also get fixed colliders.
#[derive(Default)]
pub struct MarchingTerrainPlugin {
  pub config: TerrainConfig,
}

impl Plugin for MarchingTerrainPlugin {
  fn build(&self, app: &mut App) {
    let config = match self.config.validate() {
      Ok(()) => self.config,
      Err(e) => {
        error!("{e}, falling back to the default terrain config");
        TerrainConfig::default()
      }
    };

    app
      .insert_resource(TerrainGrid::new(config))
      .init_resource::<TileEntities>()
      .add_message::<PaintTerrain>()
      .add_message::<ResetTerrain>()
      .add_message::<TileRemeshed>();

    configure_sets(app);

    app.add_systems(
      Update,
      (
        stream_tiles.in_set(TerrainSet::Stream),
        (apply_reset_messages, apply_paint_messages)
          .chain()
          .in_set(TerrainSet::Edit),
        remesh_tiles.in_set(TerrainSet::Mesh),
        sync_tile_meshes.in_set(TerrainSet::Sync),
      ),
    );

    #[cfg(feature = "rapier2d")]
    app
      .init_resource::<crate::collision::TileColliderRegistry>()
      .add_systems(
        Update,
        crate::collision::sync_tile_colliders.in_set(TerrainSet::Sync),
      );
  }
}

/// Keeps the 3x3 block of tiles around every viewpoint alive.
fn stream_tiles(
  viewpoints: Query<&GlobalTransform, With<StreamingViewpoint>>,
  mut grid: ResMut<TerrainGrid>,
) {
  for transform in &viewpoints {
    let created = grid.stream_around(transform.translation().truncate());
    if created > 0 {
      debug!("Streamed in {created} terrain tiles");
    }
  }
}

fn apply_reset_messages(mut messages: MessageReader<ResetTerrain>, mut grid: ResMut<TerrainGrid>) {
  for reset in messages.read() {
    info!("Resetting terrain ({} tiles)", grid.len());
    grid.reset(reset.cell_scale);
  }
}

fn apply_paint_messages(mut messages: MessageReader<PaintTerrain>, mut grid: ResMut<TerrainGrid>) {
  for paint in messages.read() {
    grid.paint(paint.position, paint.radius, paint.delta);
  }
}

/// System: runs the meshing tick and announces every replaced mesh.
#[cfg_attr(feature = "tracy", tracing::instrument(skip_all))]
fn remesh_tiles(mut grid: ResMut<TerrainGrid>, mut remeshed: MessageWriter<TileRemeshed>) {
  for coord in grid.tick() {
    let triangle_count = grid
      .tile(coord)
      .map_or(0, |tile| tile.mesh().triangle_count());
    remeshed.write(TileRemeshed {
      coord,
      triangle_count,
    });
  }
}
