//! Bounded scalar samples for one tile.
//!
//! A [`ScalarField`] is a square grid of density samples. Samples above
//! [`THRESHOLD`] are solid, the rest are empty. Every write is clamped to
//! `[MIN_SAMPLE, MAX_SAMPLE]`.
//!
//! # Coordinate System
//!
//! Sample `(x, y)` sits at local position `(x * cell_scale, y * cell_scale)`:
//! - **(0, 0)** is the bottom-left sample
//! - data is stored row-major with row 0 at the bottom

use std::fmt;

use bevy::math::Vec2;

use crate::coords::WorldRect;

/// Lowest value a sample can hold.
pub const MIN_SAMPLE: f32 = 0.0;

/// Highest value a sample can hold.
pub const MAX_SAMPLE: f32 = 1.0;

/// Iso value separating solid from empty.
pub const THRESHOLD: f32 = 0.5;

/// Errors raised by field access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldError {
  /// Grid index outside `[0, resolution)` on at least one axis.
  OutOfRange { x: u32, y: u32, resolution: u32 },
}

impl fmt::Display for FieldError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::OutOfRange { x, y, resolution } => write!(
        f,
        "sample ({x}, {y}) out of range for resolution {resolution}"
      ),
    }
  }
}

impl std::error::Error for FieldError {}

/// Clamps a value into the sample range. NaN reads as empty.
#[inline]
fn clamp_sample(value: f32) -> f32 {
  if value.is_nan() {
    MIN_SAMPLE
  } else {
    value.clamp(MIN_SAMPLE, MAX_SAMPLE)
  }
}

/// Square grid of clamped density samples.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarField {
  resolution: u32,
  cell_scale: f32,
  samples: Box<[f32]>,
  changed: bool,
}

impl ScalarField {
  /// Creates a field with every sample at [`MIN_SAMPLE`].
  ///
  /// # Panics
  /// Panics if `resolution < 2`; a field needs at least one cell.
  pub fn new(resolution: u32, cell_scale: f32) -> Self {
    assert!(
      resolution >= 2,
      "field resolution must be at least 2, got {resolution}"
    );
    let len = (resolution as usize) * (resolution as usize);
    Self {
      resolution,
      cell_scale,
      samples: vec![MIN_SAMPLE; len].into_boxed_slice(),
      changed: false,
    }
  }

  /// Number of samples along each side.
  #[inline]
  pub fn resolution(&self) -> u32 {
    self.resolution
  }

  /// World units between adjacent samples.
  #[inline]
  pub fn cell_scale(&self) -> f32 {
    self.cell_scale
  }

  /// Local distance from the first to the last sample on one axis.
  #[inline]
  pub fn extent(&self) -> f32 {
    (self.resolution - 1) as f32 * self.cell_scale
  }

  #[inline]
  fn index_of(&self, x: u32, y: u32) -> Result<usize, FieldError> {
    if x < self.resolution && y < self.resolution {
      Ok((y as usize) * (self.resolution as usize) + (x as usize))
    } else {
      Err(FieldError::OutOfRange {
        x,
        y,
        resolution: self.resolution,
      })
    }
  }

  /// Returns the sample at `(x, y)`.
  #[inline]
  pub fn get(&self, x: u32, y: u32) -> Result<f32, FieldError> {
    self.index_of(x, y).map(|i| self.samples[i])
  }

  /// Sample read for indices the caller already keeps in range.
  #[inline]
  pub(crate) fn at(&self, x: u32, y: u32) -> f32 {
    self.samples[(y as usize) * (self.resolution as usize) + (x as usize)]
  }

  /// Writes a clamped sample at `(x, y)` and flags the field as changed.
  pub fn set(&mut self, x: u32, y: u32, value: f32) -> Result<(), FieldError> {
    let i = self.index_of(x, y)?;
    self.samples[i] = clamp_sample(value);
    self.changed = true;
    Ok(())
  }

  /// Sets every sample to the clamped value.
  pub fn fill(&mut self, value: f32) {
    self.samples.fill(clamp_sample(value));
    self.changed = true;
  }

  /// Row-major view of all samples.
  #[inline]
  pub fn samples(&self) -> &[f32] {
    &self.samples
  }

  /// Returns true if the field was written since the last [`take_changed`].
  ///
  /// [`take_changed`]: Self::take_changed
  #[inline]
  pub fn is_changed(&self) -> bool {
    self.changed
  }

  /// Returns and clears the changed flag.
  #[inline]
  pub fn take_changed(&mut self) -> bool {
    std::mem::take(&mut self.changed)
  }

  /// Flags the field as changed without touching samples.
  #[inline]
  pub fn mark_changed(&mut self) {
    self.changed = true;
  }

  /// Returns the sample nearest to a local position.
  ///
  /// Halfway positions round to even; the result is clamped into the grid so
  /// a point in the gap past the last sample resolves to the last sample.
  pub fn local_index_for(&self, local: Vec2) -> (u32, u32) {
    let last = (self.resolution - 1) as f32;
    let p = local / self.cell_scale;
    let x = p.x.min(last).round_ties_even().max(0.0);
    let y = p.y.min(last).round_ties_even().max(0.0);
    (x as u32, y as u32)
  }

  /// Adds `delta` to every sample strictly inside `radius` of a local point.
  ///
  /// Returns how many samples were inside the brush. The field is flagged as
  /// changed even when the brush misses every sample, so the owning tile
  /// re-meshes its seams after a neighbouring paint. A NaN `delta` leaves
  /// the field untouched.
  pub fn add_circular_brush(&mut self, center: Vec2, radius: f32, delta: f32) -> usize {
    if delta.is_nan() {
      return 0;
    }
    self.changed = true;

    let footprint = WorldRect {
      min: Vec2::ZERO,
      max: Vec2::splat(self.extent()),
    };
    if !WorldRect::centered(center, radius).overlaps(&footprint) {
      return 0;
    }

    let radius_sq = radius * radius;
    let res = self.resolution as usize;
    let mut touched = 0;
    for y in 0..res {
      for x in 0..res {
        let pos = Vec2::new(x as f32 * self.cell_scale, y as f32 * self.cell_scale);
        if pos.distance_squared(center) < radius_sq {
          let sample = &mut self.samples[y * res + x];
          *sample = clamp_sample(*sample + delta);
          touched += 1;
        }
      }
    }
    touched
  }
}
