//! Indexed triangle buffers produced by contouring.

use std::collections::HashMap;

use bevy::math::Vec3;

/// Indexed triangle mesh in tile-local space.
///
/// The contour face lies at `z = 0` and walls extend toward `+Z`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TileMesh {
  pub vertices: Vec<Vec3>,
  pub triangles: Vec<[u32; 3]>,
}

impl TileMesh {
  /// Returns true if the mesh has no triangles.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.triangles.is_empty()
  }

  #[inline]
  pub fn triangle_count(&self) -> usize {
    self.triangles.len()
  }

  #[inline]
  pub fn vertex_count(&self) -> usize {
    self.vertices.len()
  }

  /// Flattened index buffer.
  pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
    self.triangles.iter().flatten().copied()
  }

  /// Iterates over the triangles of the contour face, skipping walls.
  pub fn surface_triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
    self
      .triangles
      .iter()
      .map(|tri| tri.map(|i| self.vertices[i as usize]))
      .filter(|tri| tri.iter().all(|v| v.z == 0.0))
  }

  /// Releases spare capacity left over from building.
  pub fn shrink_to_fit(&mut self) {
    self.vertices.shrink_to_fit();
    self.triangles.shrink_to_fit();
  }
}

/// Exact key for a vertex position. `+ 0.0` folds `-0.0` into `0.0`.
fn vertex_key(v: Vec3) -> [u32; 3] {
  [
    (v.x + 0.0).to_bits(),
    (v.y + 0.0).to_bits(),
    (v.z + 0.0).to_bits(),
  ]
}

/// Accumulates one meshing pass.
///
/// Contour vertices with identical positions share an index; wall vertices
/// are always appended. The lookup is scoped to the pass, so reuse the
/// builder across tiles to keep its allocations.
#[derive(Debug, Default)]
pub struct MeshBuilder {
  mesh: TileMesh,
  lookup: HashMap<[u32; 3], u32>,
}

impl MeshBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Drops everything accumulated so far.
  pub fn clear(&mut self) {
    self.mesh.vertices.clear();
    self.mesh.triangles.clear();
    self.lookup.clear();
  }

  /// Returns the index of a contour vertex, adding it if unseen.
  pub fn contour_vertex(&mut self, position: Vec3) -> u32 {
    let next = self.mesh.vertices.len() as u32;
    let index = *self.lookup.entry(vertex_key(position)).or_insert(next);
    if index == next {
      self.mesh.vertices.push(position);
    }
    index
  }

  /// Adds a contour triangle. Triangles that collapsed onto a shared vertex
  /// are dropped.
  pub fn contour_triangle(&mut self, [a, b, c]: [u32; 3]) {
    if a == b || b == c || a == c {
      return;
    }
    self.mesh.triangles.push([a, b, c]);
  }

  /// Appends four wall vertices and returns the index of the first.
  pub fn wall_quad(&mut self, corners: [Vec3; 4]) -> u32 {
    let base = self.mesh.vertices.len() as u32;
    self.mesh.vertices.extend(corners);
    base
  }

  pub fn wall_triangle(&mut self, tri: [u32; 3]) {
    self.mesh.triangles.push(tri);
  }

  /// Moves the accumulated mesh out and resets for the next pass.
  pub fn take(&mut self) -> TileMesh {
    self.lookup.clear();
    std::mem::take(&mut self.mesh)
  }
}
