//! Shared schedule labels for terrain systems.
//!
//! All terrain systems run in [`Update`] within one of the four
//! [`TerrainSet`] phases. External consumers can order their own systems
//! relative to these sets, e.g. write [`PaintTerrain`](crate::PaintTerrain)
//! messages before `Edit` or read [`TileRemeshed`](crate::TileRemeshed)
//! after `Mesh`.

use bevy::prelude::*;

/// System sets for the terrain update loop, chained in order:
///
/// ```text
/// Stream → Edit → Mesh → Sync
/// ```
///
/// # Usage
///
/// ```ignore
/// app.add_systems(Update, fire_bullets.before(TerrainSet::Edit));
/// ```
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TerrainSet {
  /// Tile creation around the streaming viewpoint.
  Stream,
  /// Paint and reset messages, config reloads.
  Edit,
  /// Meshing tick over every tile.
  Mesh,
  /// Render and collider sinks.
  Sync,
}

pub(crate) fn configure_sets(app: &mut App) {
  app.configure_sets(
    Update,
    (
      TerrainSet::Stream,
      TerrainSet::Edit,
      TerrainSet::Mesh,
      TerrainSet::Sync,
    )
      .chain(),
  );
}
