//! The tile directory.
//!
//! [`TerrainGrid`] maps tile coordinates to tiles, creates tiles lazily on
//! lookup and routes edits across tile boundaries. Neighbours are never
//! linked: a meshing pass looks them up by coordinate, so creation order does
//! not matter and removing a tile needs no cleanup elsewhere.

use std::collections::HashMap;

use bevy::math::{Vec2, Vec3};
use bevy::prelude::Resource;

use crate::config::TerrainConfig;
use crate::contour::MeshBuilder;
use crate::coords::{TileCoord, WorldRect};
use crate::field::{FieldError, MAX_SAMPLE};
use crate::tile::{Tile, TileNeighbors};

/// Builds a tile for a coordinate, filling it with ground when anchored
/// below the horizon.
fn build_tile(config: &TerrainConfig, coord: TileCoord) -> Tile {
  let anchor = coord.anchor(config.footprint());
  let mut tile = Tile::new(
    anchor,
    config.resolution,
    config.cell_scale,
    config.wall_depth,
  );
  if config.generate_ground && anchor.y < 0.0 {
    tile.field_mut().fill(MAX_SAMPLE);
  }
  tile
}

/// Every tile of the terrain, keyed by coordinate.
#[derive(Resource, Debug)]
pub struct TerrainGrid {
  config: TerrainConfig,
  tiles: HashMap<TileCoord, Tile>,
  /// Scratch buffers reused by every meshing pass.
  builder: MeshBuilder,
}

impl TerrainGrid {
  /// Creates an empty grid.
  ///
  /// # Panics
  /// Tile creation panics later if `config.resolution < 2` or
  /// `config.wall_depth` is not positive; run
  /// [`TerrainConfig::validate`] on untrusted input.
  pub fn new(config: TerrainConfig) -> Self {
    Self {
      config,
      tiles: HashMap::new(),
      builder: MeshBuilder::new(),
    }
  }

  #[inline]
  pub fn config(&self) -> &TerrainConfig {
    &self.config
  }

  /// Side length of a tile in world units.
  #[inline]
  pub fn footprint(&self) -> f32 {
    self.config.footprint()
  }

  /// Returns the coordinate of the tile containing a world position.
  #[inline]
  pub fn tile_coord_for(&self, world_pos: Vec2) -> TileCoord {
    TileCoord::from_world(world_pos, self.footprint())
  }

  pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
    self.tiles.get(&coord)
  }

  pub fn tile_mut(&mut self, coord: TileCoord) -> Option<&mut Tile> {
    self.tiles.get_mut(&coord)
  }

  pub fn contains(&self, coord: TileCoord) -> bool {
    self.tiles.contains_key(&coord)
  }

  pub fn len(&self) -> usize {
    self.tiles.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tiles.is_empty()
  }

  /// Iterates over all tiles in no particular order.
  pub fn iter(&self) -> impl Iterator<Item = (TileCoord, &Tile)> + '_ {
    self.tiles.iter().map(|(&coord, tile)| (coord, tile))
  }

  /// Returns the tile at `coord`, creating it when absent.
  ///
  /// A new tile starts dirty and marks every existing tile among its eight
  /// neighbours dirty so their seams are rebuilt against it.
  pub fn ensure_tile(&mut self, coord: TileCoord) -> &mut Tile {
    if !self.tiles.contains_key(&coord) {
      for neighbor in coord.neighbors() {
        if let Some(tile) = self.tiles.get_mut(&neighbor) {
          tile.mark_dirty();
        }
      }
      log::debug!("creating tile {:?}", coord);
    }
    let config = self.config;
    self
      .tiles
      .entry(coord)
      .or_insert_with(|| build_tile(&config, coord))
  }

  /// Returns the tile containing a world position, creating it when absent.
  pub fn get_or_create_tile(&mut self, world_pos: Vec2) -> &mut Tile {
    let coord = self.tile_coord_for(world_pos);
    self.ensure_tile(coord)
  }

  /// Returns the tile at an integer tile index, creating it when absent.
  pub fn tile_at_index(&mut self, x: i64, y: i64) -> &mut Tile {
    self.ensure_tile(TileCoord::new(x, y))
  }

  /// Drops a tile. Neighbours see the slot as empty on their next pass.
  pub fn remove_tile(&mut self, coord: TileCoord) -> Option<Tile> {
    let removed = self.tiles.remove(&coord);
    if removed.is_some() {
      log::debug!("removed tile {:?}", coord);
    }
    removed
  }

  /// Forces a tile to remesh on the next tick. No-op for absent tiles.
  pub fn mark_dirty(&mut self, coord: TileCoord) {
    if let Some(tile) = self.tiles.get_mut(&coord) {
      tile.mark_dirty();
    }
  }

  /// Adds `delta` to every sample within `radius` of `position`, across the
  /// tiles the brush's bounding square overlaps. Only the tile containing
  /// `position` and its eight neighbours are reached, whatever the radius.
  ///
  /// `position` is projected onto the tile plane. Overlapped tiles are
  /// created when missing and each is painted once. Returns the number of
  /// samples inside the brush.
  pub fn paint(&mut self, position: Vec3, radius: f32, delta: f32) -> usize {
    let footprint = self.footprint();
    if radius > footprint {
      log::warn!(
        "paint radius {} exceeds tile footprint {}, only adjacent tiles are reached",
        radius,
        footprint
      );
    }

    let center = position.truncate();
    let primary = self.tile_coord_for(center);
    let rect = WorldRect::centered(center, radius);

    let mut touched = 0;
    for coord in rect.to_tile_range(footprint, primary, 1) {
      touched += self.ensure_tile(coord).paint(center, radius, delta);
    }
    touched
  }

  /// Reads the sample nearest to a world position.
  pub fn sample_at(&mut self, world_pos: Vec2) -> f32 {
    let tile = self.get_or_create_tile(world_pos);
    let (x, y) = tile.field().local_index_for(world_pos - tile.anchor());
    tile.field().at(x, y)
  }

  /// Writes the sample nearest to a world position.
  ///
  /// Writing a border sample also marks the tile across that border dirty.
  pub fn set_sample_at(&mut self, world_pos: Vec2, value: f32) -> Result<(), FieldError> {
    let coord = self.tile_coord_for(world_pos);
    let tile = self.ensure_tile(coord);
    let (x, y) = tile.field().local_index_for(world_pos - tile.anchor());
    tile.set(x, y, value)?;

    let last = self.config.resolution - 1;
    if x == 0 {
      self.mark_dirty(coord.offset(-1, 0));
    }
    if x == last {
      self.mark_dirty(coord.offset(1, 0));
    }
    if y == 0 {
      self.mark_dirty(coord.offset(0, -1));
    }
    if y == last {
      self.mark_dirty(coord.offset(0, 1));
    }
    if x == 0 && y == 0 {
      self.mark_dirty(coord.offset(-1, -1));
    }
    if x == last && y == last {
      self.mark_dirty(coord.offset(1, 1));
    }
    Ok(())
  }

  /// Ensures the 3x3 block of tiles around the viewpoint exists.
  ///
  /// Returns how many tiles were created.
  pub fn stream_around(&mut self, viewpoint: Vec2) -> usize {
    let center = self.tile_coord_for(viewpoint);
    let mut created = 0;
    for coord in center.block_3x3() {
      if !self.contains(coord) {
        self.ensure_tile(coord);
        created += 1;
      }
    }
    created
  }

  /// Drops every tile, optionally switching to a new cell scale.
  pub fn reset(&mut self, cell_scale: Option<f32>) {
    match cell_scale {
      Some(scale) if scale.is_finite() && scale > 0.0 => self.config.cell_scale = scale,
      Some(scale) => log::warn!("ignoring invalid cell scale {}", scale),
      None => {}
    }
    log::debug!(
      "reset terrain: dropped {} tiles, cell scale {}",
      self.tiles.len(),
      self.config.cell_scale
    );
    self.tiles.clear();
  }

  /// Drops every tile and adopts a new configuration.
  pub fn reconfigure(&mut self, config: TerrainConfig) {
    self.config = config;
    self.reset(None);
  }

  /// Runs one meshing tick over every tile.
  ///
  /// Dirty tiles rebuild their mesh against their current neighbours; clean
  /// tiles cool down. Returns the remeshed coordinates in sorted order.
  pub fn tick(&mut self) -> Vec<TileCoord> {
    let mut coords: Vec<TileCoord> = self.tiles.keys().copied().collect();
    coords.sort_unstable();

    let mut remeshed = Vec::new();
    for coord in coords {
      let Some(tile) = self.tiles.get(&coord) else {
        continue;
      };

      if !tile.needs_remesh() {
        if let Some(tile) = self.tiles.get_mut(&coord) {
          tile.cool_down();
        }
        continue;
      }

      let neighbors = TileNeighbors {
        up: self.tiles.get(&coord.up()).map(Tile::field),
        right: self.tiles.get(&coord.right()).map(Tile::field),
        up_right: self.tiles.get(&coord.up_right()).map(Tile::field),
      };
      let mesh = tile.generate_mesh(&neighbors, &mut self.builder);

      if let Some(tile) = self.tiles.get_mut(&coord) {
        tile.replace_mesh(mesh);
        remeshed.push(coord);
      }
    }
    remeshed
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config(resolution: u32) -> TerrainConfig {
    TerrainConfig {
      resolution,
      cell_scale: 1.0,
      generate_ground: false,
      ..TerrainConfig::default()
    }
  }

  #[test]
  fn tile_coord_floors_by_footprint() {
    let grid = TerrainGrid::new(config(4));
    assert_eq!(grid.tile_coord_for(Vec2::new(3.9, 0.0)), TileCoord::new(0, 0));
    assert_eq!(grid.tile_coord_for(Vec2::new(4.0, -0.1)), TileCoord::new(1, -1));
  }

  #[test]
  fn new_tile_dirties_existing_neighbors() {
    let mut grid = TerrainGrid::new(config(4));
    grid.tile_at_index(0, 0);
    grid.tile_at_index(5, 5);
    grid.tick();
    assert!(!grid.tile(TileCoord::new(0, 0)).unwrap().needs_remesh());

    grid.tile_at_index(1, 1);
    assert!(grid.tile(TileCoord::new(0, 0)).unwrap().needs_remesh());
    assert!(!grid.tile(TileCoord::new(5, 5)).unwrap().needs_remesh());
  }

  #[test]
  fn ground_fills_tiles_below_horizon() {
    let mut grid = TerrainGrid::new(TerrainConfig {
      generate_ground: true,
      ..config(4)
    });
    assert_eq!(grid.sample_at(Vec2::new(1.0, -1.0)), 1.0);
    assert_eq!(grid.sample_at(Vec2::new(1.0, 1.0)), 0.0);
  }

  #[test]
  fn paint_across_seam_touches_both_tiles() {
    let mut grid = TerrainGrid::new(config(4));
    let touched = grid.paint(Vec3::new(3.8, 1.5, 7.0), 1.0, 1.0);
    assert!(touched > 0);
    assert_eq!(grid.len(), 2);

    let left = grid.tile(TileCoord::new(0, 0)).unwrap();
    let right = grid.tile(TileCoord::new(1, 0)).unwrap();
    assert_eq!(left.field().get(3, 1), Ok(1.0));
    assert_eq!(right.field().get(0, 1), Ok(1.0));
    assert_eq!(right.field().get(1, 1), Ok(0.0));
  }

  #[test]
  fn paint_near_corner_reaches_diagonal_tile() {
    let mut grid = TerrainGrid::new(config(4));
    grid.paint(Vec3::new(0.2, 0.2, 0.0), 0.5, 1.0);
    assert_eq!(grid.len(), 4);
    assert!(grid.contains(TileCoord::new(-1, -1)));
    assert_eq!(grid.tile(TileCoord::new(0, 0)).unwrap().field().get(0, 0), Ok(1.0));
  }

  #[test]
  fn paint_inside_tile_stays_local() {
    let mut grid = TerrainGrid::new(config(8));
    grid.paint(Vec3::new(4.0, 4.0, 0.0), 1.5, 0.5);
    assert_eq!(grid.len(), 1);
  }

  #[test]
  fn oversized_radius_is_limited_to_adjacent_tiles() {
    let mut grid = TerrainGrid::new(config(2));
    grid.paint(Vec3::new(1.0, 1.0, 0.0), 5.0, 1.0);
    assert_eq!(grid.len(), 9);
  }

  #[test]
  fn set_sample_on_border_dirties_neighbor() {
    let mut grid = TerrainGrid::new(config(4));
    for coord in TileCoord::new(0, 0).block_3x3() {
      grid.ensure_tile(coord);
    }
    grid.tick();

    grid.set_sample_at(Vec2::new(0.0, 0.0), 1.0).unwrap();
    for dirty in [(0, 0), (-1, 0), (0, -1), (-1, -1)] {
      let coord = TileCoord::new(dirty.0, dirty.1);
      assert!(grid.tile(coord).unwrap().needs_remesh(), "{coord:?}");
    }
    assert!(!grid.tile(TileCoord::new(1, 1)).unwrap().needs_remesh());
    assert_eq!(grid.sample_at(Vec2::new(0.2, 0.1)), 1.0);
  }

  #[test]
  fn stream_around_builds_block_once() {
    let mut grid = TerrainGrid::new(config(4));
    assert_eq!(grid.stream_around(Vec2::new(5.0, 5.0)), 9);
    assert_eq!(grid.stream_around(Vec2::new(6.0, 7.0)), 0);
    assert!(grid.contains(TileCoord::new(0, 0)));
    assert!(grid.contains(TileCoord::new(2, 2)));
  }

  #[test]
  fn reset_drops_tiles_and_rescales() {
    let mut grid = TerrainGrid::new(config(4));
    grid.stream_around(Vec2::ZERO);
    grid.reset(Some(0.5));
    assert!(grid.is_empty());
    assert_eq!(grid.footprint(), 2.0);
    assert_eq!(grid.tile_coord_for(Vec2::new(2.5, 0.0)), TileCoord::new(1, 0));

    grid.reset(Some(0.0));
    assert_eq!(grid.footprint(), 2.0);
  }

  #[test]
  fn huge_brush_stays_within_neighbors() {
    for radius in [1e9, f32::INFINITY] {
      let mut grid = TerrainGrid::new(config(4));
      let touched = grid.paint(Vec3::new(-2.0, 6.0, 0.0), radius, 1.0);

      assert_eq!(grid.len(), 9, "radius {radius}");
      assert_eq!(touched, 9 * 16);
      for coord in TileCoord::new(-1, 1).block_3x3() {
        let tile = grid.tile(coord).unwrap();
        assert!(tile.field().samples().iter().all(|&s| s == 1.0));
      }
    }
  }

  #[test]
  fn remove_does_not_cascade() {
    let mut grid = TerrainGrid::new(config(4));
    grid.stream_around(Vec2::ZERO);
    assert!(grid.remove_tile(TileCoord::new(0, 0)).is_some());
    assert!(grid.remove_tile(TileCoord::new(0, 0)).is_none());
    assert_eq!(grid.len(), 8);
  }

  #[test]
  fn tick_reports_sorted_remeshes_then_cools() {
    let mut grid = TerrainGrid::new(config(4));
    grid.tile_at_index(1, 0);
    grid.tile_at_index(-1, 2);
    grid.tile_at_index(0, 0);

    let remeshed = grid.tick();
    assert_eq!(
      remeshed,
      vec![
        TileCoord::new(-1, 2),
        TileCoord::new(0, 0),
        TileCoord::new(1, 0)
      ]
    );
    assert!(grid.tick().is_empty());
  }

  #[test]
  fn end_to_end_single_tile_brush() {
    let mut grid = TerrainGrid::new(config(4));
    grid.tile_at_index(0, 0);
    grid.tick();
    assert_eq!(grid.tile(TileCoord::new(0, 0)).unwrap().mesh().triangle_count(), 0);

    // Centre of the 4x4 sample lattice.
    let center = Vec3::new(1.5, 1.5, 0.0);
    grid.paint(center, 2.0, 0.25);
    grid.paint(center, 2.0, 0.25);
    grid.tick();
    assert_eq!(grid.tile(TileCoord::new(0, 0)).unwrap().mesh().triangle_count(), 0);

    grid.paint(center, 2.0, 0.25);
    let remeshed = grid.tick();
    assert!(remeshed.contains(&TileCoord::new(0, 0)));
    assert!(grid.tile(TileCoord::new(0, 0)).unwrap().mesh().triangle_count() > 0);
  }

  /// World-space triangles of a mesh, sorted for order-independent
  /// comparison.
  fn world_triangles(anchor: Vec2, mesh: &crate::contour::TileMesh) -> Vec<[[u32; 3]; 3]> {
    let mut tris: Vec<_> = mesh
      .triangles
      .iter()
      .map(|tri| {
        tri.map(|i| {
          let v = mesh.vertices[i as usize] + anchor.extend(0.0);
          [v.x.to_bits(), v.y.to_bits(), v.z.to_bits()]
        })
      })
      .collect();
    tris.sort_unstable();
    tris
  }

  #[test]
  fn seams_match_a_single_field() {
    let res = 4u32;
    let pattern = |x: u32, y: u32| -> f32 {
      if (x * 7 + y * 3) % 5 < 2 { 1.0 } else { 0.0 }
    };

    let mut grid = TerrainGrid::new(config(res));
    for ty in 0..2i64 {
      for tx in 0..2i64 {
        let tile = grid.tile_at_index(tx, ty);
        for y in 0..res {
          for x in 0..res {
            let gx = tx as u32 * res + x;
            let gy = ty as u32 * res + y;
            tile.set(x, y, pattern(gx, gy)).unwrap();
          }
        }
      }
    }
    grid.tick();

    let mut stitched: Vec<_> = grid
      .iter()
      .flat_map(|(_, tile)| world_triangles(tile.anchor(), tile.mesh()))
      .collect();
    stitched.sort_unstable();

    let mut whole = Tile::new(Vec2::ZERO, res * 2, 1.0, 1.0);
    for y in 0..res * 2 {
      for x in 0..res * 2 {
        whole.set(x, y, pattern(x, y)).unwrap();
      }
    }
    let mesh = whole.generate_mesh(&TileNeighbors::none(), &mut MeshBuilder::new());
    let expected = world_triangles(Vec2::ZERO, &mesh);

    assert!(!expected.is_empty());
    assert_eq!(stitched, expected);
  }

  #[test]
  fn missing_neighbor_leaves_seam_open() {
    let mut grid = TerrainGrid::new(config(3));
    let tile = grid.tile_at_index(0, 0);
    tile.field_mut().fill(1.0);
    grid.tick();
    let alone = grid.tile(TileCoord::new(0, 0)).unwrap().mesh().triangle_count();

    let right = grid.tile_at_index(1, 0);
    right.field_mut().fill(1.0);
    grid.tick();
    let stitched = grid.tile(TileCoord::new(0, 0)).unwrap().mesh().triangle_count();
    assert_eq!(stitched, alone + 4);
  }
}
