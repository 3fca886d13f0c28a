//! Collider sink: one fixed rapier2d body per tile.
//!
//! Colliders are built from the contour face only; walls are flat in the
//! physics plane.

use std::collections::HashMap;

use bevy::ecs::message::MessageReader;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

use crate::contour::TileMesh;
use crate::coords::TileCoord;
use crate::grid::TerrainGrid;
use crate::plugin::TileRemeshed;

/// Tracks spawned collider entities by tile coordinate.
#[derive(Resource, Default)]
pub struct TileColliderRegistry {
  pub entities: HashMap<TileCoord, Entity>,
}

/// Marker component for tile collider entities.
#[derive(Component)]
pub struct TileCollider {
  pub coord: TileCoord,
}

/// Builds a compound collider from the contour triangles of a tile mesh.
///
/// Returns `None` when the mesh has no usable triangle.
pub fn tile_collider(mesh: &TileMesh) -> Option<Collider> {
  let shapes: Vec<(Vec2, f32, Collider)> = mesh
    .surface_triangles()
    .filter_map(|[a, b, c]| {
      let (a, b, c) = (a.truncate(), b.truncate(), c.truncate());
      // Degenerate triangles crash parry2d's BVH.
      let cross = (b - a).perp_dot(c - a);
      (cross.abs() > f32::EPSILON).then(|| (Vec2::ZERO, 0.0, Collider::triangle(a, b, c)))
    })
    .collect();

  if shapes.is_empty() {
    None
  } else {
    Some(Collider::compound(shapes))
  }
}

/// System: replaces the collider of every remeshed tile and despawns
/// colliders of tiles that left the grid.
pub fn sync_tile_colliders(
  mut commands: Commands,
  grid: Res<TerrainGrid>,
  mut remeshed: MessageReader<TileRemeshed>,
  mut registry: ResMut<TileColliderRegistry>,
) {
  registry.entities.retain(|coord, entity| {
    if grid.contains(*coord) {
      true
    } else {
      commands.entity(*entity).despawn();
      false
    }
  });

  for message in remeshed.read() {
    if let Some(old) = registry.entities.remove(&message.coord) {
      commands.entity(old).despawn();
    }

    let Some(tile) = grid.tile(message.coord) else {
      continue;
    };
    let Some(collider) = tile_collider(tile.mesh()) else {
      continue;
    };

    let entity = commands
      .spawn((
        RigidBody::Fixed,
        collider,
        Transform::from_translation(tile.anchor().extend(0.0)),
        TileCollider {
          coord: message.coord,
        },
      ))
      .id();
    registry.entities.insert(message.coord, entity);
  }
}
