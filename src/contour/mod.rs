//! Marching squares contouring with wall extrusion.
//!
//! Each cell between four adjacent samples is classified into one of 16
//! cases. The case selects a fixed polygon (solid corners plus interpolated
//! edge crossings) and the wall segments along the contour. Walls are
//! extruded along +Z by the tile's wall depth so the 2-D contour reads as a
//! solid slab.
//!
//! # Cell layout
//!
//! ```text
//!   c (top-left) ---- d (top-right)
//!   |                 |
//!   a (bottom-left) - b (bottom-right)
//! ```
//!
//! The case index packs one bit per corner, `a` most significant, a set bit
//! meaning the corner is *not* above the threshold. Case 0 is fully solid,
//! case 15 fully empty.

mod cases;
mod mesh;

pub use cases::{CASE_TABLE, CaseShape, CellPoint, WallSegment, emit_cell, triangle_count};
pub use mesh::{MeshBuilder, TileMesh};

use crate::field::THRESHOLD;

/// One of the 16 marching squares cases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellCase(u8);

impl CellCase {
  /// Every corner above the threshold.
  pub const SOLID: CellCase = CellCase(0);
  /// No corner above the threshold.
  pub const EMPTY: CellCase = CellCase(15);

  /// Returns the case for a raw index, or `None` outside `0..=15`.
  pub const fn new(index: u8) -> Option<Self> {
    if index < 16 { Some(Self(index)) } else { None }
  }

  /// Raw case index in `0..=15`.
  #[inline]
  pub const fn index(self) -> usize {
    self.0 as usize
  }

  /// Returns true if the contour crosses this cell.
  #[inline]
  pub const fn has_contour(self) -> bool {
    self.0 != 0 && self.0 != 15
  }
}

/// Classifies four corner samples against [`THRESHOLD`].
///
/// A corner equal to the threshold counts as not above it.
pub fn classify(a: f32, b: f32, c: f32, d: f32) -> CellCase {
  let below = |v: f32| (v <= THRESHOLD) as u8;
  CellCase((below(a) << 3) | (below(b) << 2) | (below(c) << 1) | below(d))
}

/// Fraction along the edge from `v0` to `v1` where the iso line crosses.
///
/// Only meaningful when the endpoints straddle the threshold, which the case
/// table guarantees for every edge it interpolates.
///
/// # Panics
/// Panics when `v0 == v1`: such an edge cannot be crossed and reaching it
/// means the cell was built inconsistently.
#[inline]
pub fn interpolate(v0: f32, v1: f32) -> f32 {
  assert!(
    v0 != v1,
    "degenerate edge interpolation between equal samples {v0}"
  );
  (THRESHOLD - v0) / (v1 - v0)
}

/// Four corner samples and their case, built fresh for each meshing pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
  /// Bottom-left.
  pub a: f32,
  /// Bottom-right.
  pub b: f32,
  /// Top-left.
  pub c: f32,
  /// Top-right.
  pub d: f32,
  case: CellCase,
}

impl Cell {
  /// Builds and classifies a cell.
  pub fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
    Self {
      a,
      b,
      c,
      d,
      case: classify(a, b, c, d),
    }
  }

  /// The cell's case.
  #[inline]
  pub fn case(&self) -> CellCase {
    self.case
  }
}
