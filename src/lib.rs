//! Marching Terrain - deformable marching squares terrain for Bevy.
//!
//! A scalar density field is split into square tiles that stream in around a
//! viewpoint. Painting adds or removes density; every edited tile is
//! re-contoured with marching squares, its contour extruded into walls, and
//! its seams stitched against the tiles above and to the right so the surface
//! stays continuous across tile borders.
//!
//! The core ([`ScalarField`], [`Tile`], [`TerrainGrid`]) is plain data and
//! runs without an app. [`MarchingTerrainPlugin`] drives it from Bevy
//! systems and mirrors tiles into mesh entities and, with the `rapier2d`
//! feature, colliders.

pub mod config;
pub mod contour;
pub mod coords;
pub mod field;
pub mod grid;
pub mod plugin;
pub mod render;
pub mod schedule;
pub mod tile;

#[cfg(feature = "rapier2d")]
pub mod collision;
#[cfg(feature = "tracy")]
mod tracy_init;

#[cfg(feature = "rapier2d")]
pub use collision::{TileCollider, TileColliderRegistry, tile_collider};
pub use config::{ConfigError, TerrainConfig, TerrainConfigHandle, TerrainConfigPlugin};
pub use contour::{Cell, CellCase, MeshBuilder, TileMesh, classify, interpolate};
pub use coords::{TileCoord, WorldRect};
pub use field::{FieldError, MAX_SAMPLE, MIN_SAMPLE, ScalarField, THRESHOLD};
pub use grid::TerrainGrid;
pub use plugin::{
  MarchingTerrainPlugin, PaintTerrain, ResetTerrain, StreamingViewpoint, TileRemeshed,
};
pub use render::{TerrainMaterial, TileEntities, TileEntity, build_tile_mesh};
pub use schedule::TerrainSet;
pub use tile::{Tile, TileNeighbors, TileState};
#[cfg(feature = "tracy")]
pub use tracy_init::init_tracy;
