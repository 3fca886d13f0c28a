//! One tile of terrain: a scalar field plus the mesh derived from it.
//!
//! A tile meshes its interior cells on its own. The cells straddling its top
//! and right seams need samples from the tiles above, to the right and
//! diagonally up-right; those are passed in as [`TileNeighbors`] so the tile
//! never holds references to its siblings.

use bevy::math::Vec2;

use crate::contour::{Cell, MeshBuilder, TileMesh, emit_cell};
use crate::field::{FieldError, ScalarField};

/// Number of consecutive remeshes after which a tile counts as dynamic.
const DYNAMIC_HEAT: u8 = 2;

/// Meshing state of a tile.
///
/// `Clean` → `Dirty` (paint, sample write, neighbour change) → `Clean` (mesh
/// replaced).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TileState {
  /// Mesh matches the field.
  Clean,
  /// Field or a seam changed since the last meshing pass.
  #[default]
  Dirty,
}

/// Read-only fields of the tiles a meshing pass stitches against.
#[derive(Clone, Copy, Debug, Default)]
pub struct TileNeighbors<'a> {
  pub up: Option<&'a ScalarField>,
  pub right: Option<&'a ScalarField>,
  pub up_right: Option<&'a ScalarField>,
}

impl TileNeighbors<'_> {
  /// No neighbours: only interior cells are meshed.
  pub const fn none() -> Self {
    Self {
      up: None,
      right: None,
      up_right: None,
    }
  }
}

/// A square region of the field and its current mesh.
#[derive(Clone, Debug)]
pub struct Tile {
  anchor: Vec2,
  field: ScalarField,
  wall_depth: f32,
  state: TileState,
  /// Saturating count of recent remeshes, decays on clean ticks.
  heat: u8,
  settled: bool,
  mesh: TileMesh,
}

impl Tile {
  /// Creates a standalone tile with explicit dimensions.
  ///
  /// The tile starts dirty so its first tick publishes a mesh.
  ///
  /// # Panics
  /// Panics if `resolution < 2` or if `wall_depth` is not positive: walls
  /// must leave the contour plane to stay apart from the surface.
  pub fn new(anchor: Vec2, resolution: u32, cell_scale: f32, wall_depth: f32) -> Self {
    assert!(
      wall_depth > 0.0,
      "tile wall depth must be positive, got {wall_depth}"
    );
    Self {
      anchor,
      field: ScalarField::new(resolution, cell_scale),
      wall_depth,
      state: TileState::Dirty,
      heat: 0,
      settled: true,
      mesh: TileMesh::default(),
    }
  }

  /// World-space bottom-left corner.
  #[inline]
  pub fn anchor(&self) -> Vec2 {
    self.anchor
  }

  #[inline]
  pub fn field(&self) -> &ScalarField {
    &self.field
  }

  /// Mutable field access. Writes through it flag the field as changed, so
  /// the next tick remeshes.
  #[inline]
  pub fn field_mut(&mut self) -> &mut ScalarField {
    &mut self.field
  }

  #[inline]
  pub fn wall_depth(&self) -> f32 {
    self.wall_depth
  }

  #[inline]
  pub fn state(&self) -> TileState {
    self.state
  }

  /// Applies a circular brush centred on a world position.
  ///
  /// Returns the number of samples inside the brush. The tile is dirty
  /// afterwards either way.
  pub fn paint(&mut self, world_center: Vec2, radius: f32, delta: f32) -> usize {
    self.state = TileState::Dirty;
    self
      .field
      .add_circular_brush(world_center - self.anchor, radius, delta)
  }

  /// Writes one sample and marks the tile dirty.
  pub fn set(&mut self, x: u32, y: u32, value: f32) -> Result<(), FieldError> {
    self.field.set(x, y, value)?;
    self.state = TileState::Dirty;
    Ok(())
  }

  /// Forces a remesh on the next tick.
  pub fn mark_dirty(&mut self) {
    self.state = TileState::Dirty;
  }

  /// Returns true if the next tick will remesh.
  #[inline]
  pub fn needs_remesh(&self) -> bool {
    self.state == TileState::Dirty || self.field.is_changed()
  }

  /// Builds a fresh mesh from the field and the given neighbours.
  ///
  /// Interior cells come first, then the top seam, the right seam and the
  /// top-right corner. The corner cell is only emitted when the diagonal
  /// neighbour exists; a missing up or right neighbour contributes `0.0`.
  pub fn generate_mesh(&self, neighbors: &TileNeighbors, builder: &mut MeshBuilder) -> TileMesh {
    builder.clear();

    let field = &self.field;
    let res = field.resolution();
    let last = res - 1;
    let scale = field.cell_scale();
    let depth = self.wall_depth;
    let origin = |x: u32, y: u32| Vec2::new(x as f32 * scale, y as f32 * scale);

    for y in 0..last {
      for x in 0..last {
        let cell = Cell::new(
          field.at(x, y),
          field.at(x + 1, y),
          field.at(x, y + 1),
          field.at(x + 1, y + 1),
        );
        emit_cell(&cell, origin(x, y), scale, depth, builder);
      }
    }

    if let Some(up) = neighbors.up {
      for x in 0..last {
        let cell = Cell::new(
          field.at(x, last),
          field.at(x + 1, last),
          up.at(x, 0),
          up.at(x + 1, 0),
        );
        emit_cell(&cell, origin(x, last), scale, depth, builder);
      }
    }

    if let Some(right) = neighbors.right {
      for y in 0..last {
        let cell = Cell::new(
          field.at(last, y),
          right.at(0, y),
          field.at(last, y + 1),
          right.at(0, y + 1),
        );
        emit_cell(&cell, origin(last, y), scale, depth, builder);
      }
    }

    if let Some(up_right) = neighbors.up_right {
      let cell = Cell::new(
        field.at(last, last),
        neighbors.right.map_or(0.0, |r| r.at(0, last)),
        neighbors.up.map_or(0.0, |u| u.at(last, 0)),
        up_right.at(0, 0),
      );
      emit_cell(&cell, origin(last, last), scale, depth, builder);
    }

    builder.take()
  }

  /// Publishes a freshly generated mesh and returns the tile to `Clean`.
  pub fn replace_mesh(&mut self, mesh: TileMesh) {
    log::trace!(
      "tile at {:?} remeshed: {} vertices, {} triangles",
      self.anchor,
      mesh.vertex_count(),
      mesh.triangle_count()
    );
    self.mesh = mesh;
    self.field.take_changed();
    self.state = TileState::Clean;
    self.heat = self.heat.saturating_add(1);
    self.settled = false;
  }

  /// Clean-tick bookkeeping: decays heat, then settles the mesh once heat
  /// has run out.
  ///
  /// Returns true on the tick the mesh settles.
  pub fn cool_down(&mut self) -> bool {
    if self.heat > 0 {
      self.heat -= 1;
      false
    } else if !self.mesh.is_empty() && !self.settled {
      self.mesh.shrink_to_fit();
      self.settled = true;
      true
    } else {
      false
    }
  }

  /// Runs one tick for a tile meshed outside a grid.
  ///
  /// Returns true if the mesh was replaced.
  pub fn tick(&mut self, neighbors: &TileNeighbors, builder: &mut MeshBuilder) -> bool {
    if self.needs_remesh() {
      let mesh = self.generate_mesh(neighbors, builder);
      self.replace_mesh(mesh);
      true
    } else {
      self.cool_down();
      false
    }
  }

  /// The last published mesh, in tile-local space.
  #[inline]
  pub fn mesh(&self) -> &TileMesh {
    &self.mesh
  }

  #[inline]
  pub fn heat(&self) -> u8 {
    self.heat
  }

  /// Returns true while the tile is being edited every few ticks.
  #[inline]
  pub fn is_dynamic(&self) -> bool {
    self.heat > DYNAMIC_HEAT
  }

  /// Returns true once the current mesh went through the settle pass.
  #[inline]
  pub fn is_settled(&self) -> bool {
    self.settled
  }
}
