//! Render sink: mirrors tile meshes into Bevy mesh entities.
//!
//! Tile geometry is built with the contour face at `z = 0`, walls toward
//! `+Z` and clockwise front faces. Bevy is right-handed with
//! counter-clockwise front faces, so the conversion mirrors Z and flips each
//! triangle. Seen from a default camera looking down `-Z`, the contour faces
//! the viewer and walls recede into the screen.

use std::collections::HashMap;

use bevy::asset::RenderAssetUsages;
use bevy::ecs::message::MessageReader;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;

use crate::contour::TileMesh;
use crate::coords::TileCoord;
use crate::grid::TerrainGrid;
use crate::plugin::TileRemeshed;

/// Entity mirroring one tile.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileEntity {
  pub coord: TileCoord,
}

/// Tracks spawned tile entities by coordinate.
#[derive(Resource, Default)]
pub struct TileEntities {
  pub entities: HashMap<TileCoord, Entity>,
}

/// Material applied to every tile mesh when present.
#[derive(Resource, Clone)]
pub struct TerrainMaterial(pub Handle<StandardMaterial>);

/// Converts a tile mesh into a Bevy mesh.
///
/// UVs are world XY divided by `uv_scale`, so textures tile seamlessly across
/// tiles. Normals are only computed for non-empty meshes.
pub fn build_tile_mesh(mesh: &TileMesh, anchor: Vec2, uv_scale: f32) -> Mesh {
  let positions: Vec<[f32; 3]> = mesh.vertices.iter().map(|v| [v.x, v.y, -v.z]).collect();
  let uvs: Vec<[f32; 2]> = mesh
    .vertices
    .iter()
    .map(|v| ((anchor + v.truncate()) / uv_scale).to_array())
    .collect();
  let indices: Vec<u32> = mesh
    .triangles
    .iter()
    .flat_map(|&[a, b, c]| [a, c, b])
    .collect();

  let out = Mesh::new(
    PrimitiveTopology::TriangleList,
    RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
  )
  .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
  .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
  .with_inserted_indices(Indices::U32(indices));

  if mesh.is_empty() {
    out
  } else {
    out.with_computed_smooth_normals()
  }
}

/// System: spawns, updates and despawns tile entities.
///
/// Every remeshed tile gets an entity with a [`TileEntity`] and a transform
/// at the tile anchor. The mesh asset is rebuilt from scratch when
/// `Assets<Mesh>` exists; headless apps only track entities. Entities of
/// tiles that left the grid are despawned.
pub fn sync_tile_meshes(
  mut commands: Commands,
  grid: Res<TerrainGrid>,
  mut remeshed: MessageReader<TileRemeshed>,
  mut tile_entities: ResMut<TileEntities>,
  mut meshes: Option<ResMut<Assets<Mesh>>>,
  material: Option<Res<TerrainMaterial>>,
) {
  tile_entities.entities.retain(|coord, entity| {
    if grid.contains(*coord) {
      true
    } else {
      commands.entity(*entity).despawn();
      false
    }
  });

  let uv_scale = grid.config().uv_scale;
  for message in remeshed.read() {
    let Some(tile) = grid.tile(message.coord) else {
      continue;
    };
    let transform = Transform::from_translation(tile.anchor().extend(0.0));

    let entity = *tile_entities
      .entities
      .entry(message.coord)
      .or_insert_with(|| {
        commands
          .spawn(TileEntity {
            coord: message.coord,
          })
          .id()
      });

    let mut entity_commands = commands.entity(entity);
    entity_commands.insert(transform);

    if let Some(meshes) = meshes.as_deref_mut() {
      let handle = meshes.add(build_tile_mesh(tile.mesh(), tile.anchor(), uv_scale));
      entity_commands.insert(Mesh3d(handle));
      if let Some(material) = &material {
        entity_commands.insert(MeshMaterial3d(material.0.clone()));
      }
    }
  }
}
