//! Coordinate types for the tile grid.
//!
//! The world plane is covered by square tiles with no gaps or overlaps:
//! - [`TileCoord`]: integer tile index (i64 for effectively infinite worlds)
//! - a tile's anchor is `coord * footprint`, its bottom-left corner in world
//!   units, where `footprint = resolution * cell_scale`
//!
//! Y+ is up, X+ is right, matching the field's sample layout.

use bevy::math::Vec2;

/// Offsets of the eight tiles surrounding a tile, axis-aligned first.
pub const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
  (0, 1),
  (1, 0),
  (0, -1),
  (-1, 0),
  (1, 1),
  (-1, 1),
  (1, -1),
  (-1, -1),
];

/// Position of a tile in the world grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
  pub x: i64,
  pub y: i64,
}

impl TileCoord {
  /// Creates a new tile coordinate.
  pub const fn new(x: i64, y: i64) -> Self {
    Self { x, y }
  }

  /// Returns the tile coordinate containing a world position.
  ///
  /// Uses floor division on each axis independently, so `-0.1` maps to tile
  /// `-1` rather than `0`.
  pub fn from_world(pos: Vec2, footprint: f32) -> Self {
    Self::new(
      (pos.x / footprint).floor() as i64,
      (pos.y / footprint).floor() as i64,
    )
  }

  /// Returns the world-space bottom-left corner of this tile.
  pub fn anchor(self, footprint: f32) -> Vec2 {
    Vec2::new(self.x as f32 * footprint, self.y as f32 * footprint)
  }

  /// Returns the coordinate shifted by the given number of tiles.
  pub const fn offset(self, dx: i64, dy: i64) -> Self {
    Self::new(self.x + dx, self.y + dy)
  }

  /// Tile directly above.
  pub const fn up(self) -> Self {
    self.offset(0, 1)
  }

  /// Tile directly to the right.
  pub const fn right(self) -> Self {
    self.offset(1, 0)
  }

  /// Tile diagonally above and to the right.
  pub const fn up_right(self) -> Self {
    self.offset(1, 1)
  }

  /// Iterates over the eight surrounding coordinates.
  pub fn neighbors(self) -> impl Iterator<Item = TileCoord> {
    NEIGHBOR_OFFSETS
      .into_iter()
      .map(move |(dx, dy)| self.offset(dx, dy))
  }

  /// Iterates over the 3x3 block centred on this coordinate, row by row from
  /// the bottom.
  pub fn block_3x3(self) -> impl Iterator<Item = TileCoord> {
    (-1..=1).flat_map(move |dy| (-1..=1).map(move |dx| self.offset(dx, dy)))
  }
}

/// World-space axis-aligned rectangle, used for brush extents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldRect {
  pub min: Vec2,
  pub max: Vec2,
}

impl WorldRect {
  /// Creates a square centred on a point with the given half extent.
  pub fn centered(center: Vec2, radius: f32) -> Self {
    Self {
      min: center - Vec2::splat(radius),
      max: center + Vec2::splat(radius),
    }
  }

  /// Returns true if the two rectangles overlap (touching edges count).
  pub fn overlaps(&self, other: &WorldRect) -> bool {
    self.min.x <= other.max.x
      && self.max.x >= other.min.x
      && self.min.y <= other.max.y
      && self.max.y >= other.min.y
  }

  /// Returns the tile coordinates this rect overlaps, limited to `reach`
  /// tiles of `center` on each axis.
  ///
  /// The bound is applied before iterating, so huge or infinite rects stay
  /// cheap.
  pub fn to_tile_range(
    &self,
    footprint: f32,
    center: TileCoord,
    reach: i64,
  ) -> impl Iterator<Item = TileCoord> {
    let min = TileCoord::from_world(self.min, footprint);
    let max = TileCoord::from_world(self.max, footprint);
    let x0 = min.x.max(center.x.saturating_sub(reach));
    let x1 = max.x.min(center.x.saturating_add(reach));
    let y0 = min.y.max(center.y.saturating_sub(reach));
    let y1 = max.y.min(center.y.saturating_add(reach));

    (y0..=y1).flat_map(move |ty| (x0..=x1).map(move |tx| TileCoord::new(tx, ty)))
  }
}
