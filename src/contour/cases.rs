//! The 16-entry marching squares case table.
//!
//! Every case lists its polygon as symbolic [`CellPoint`]s, a triangle
//! pattern indexing into that polygon, and the wall segments the contour
//! produces. Triangle orders are clockwise when seen from -Z (the side the
//! contour faces); wall orders depend on which side of the segment is solid.

use bevy::math::{Vec2, Vec3};

use super::mesh::MeshBuilder;
use super::{Cell, interpolate};

/// A corner of the cell or the iso crossing on one of its edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellPoint {
  BottomLeft,
  BottomRight,
  TopLeft,
  TopRight,
  /// Crossing on the a-b edge.
  Bottom,
  /// Crossing on the c-d edge.
  Top,
  /// Crossing on the a-c edge.
  Left,
  /// Crossing on the b-d edge.
  Right,
}

impl CellPoint {
  /// Cell-local position of this point for the given samples.
  pub fn resolve(self, cell: &Cell, scale: f32) -> Vec2 {
    match self {
      CellPoint::BottomLeft => Vec2::ZERO,
      CellPoint::BottomRight => Vec2::new(scale, 0.0),
      CellPoint::TopLeft => Vec2::new(0.0, scale),
      CellPoint::TopRight => Vec2::new(scale, scale),
      CellPoint::Bottom => Vec2::new(scale * interpolate(cell.a, cell.b), 0.0),
      CellPoint::Top => Vec2::new(scale * interpolate(cell.c, cell.d), scale),
      CellPoint::Left => Vec2::new(0.0, scale * interpolate(cell.a, cell.c)),
      CellPoint::Right => Vec2::new(scale, scale * interpolate(cell.b, cell.d)),
    }
  }
}

/// A contour segment to extrude into a wall quad.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WallSegment {
  pub from: CellPoint,
  pub to: CellPoint,
  /// Selects the second of the two fixed triangle orders.
  pub ccw: bool,
}

/// Geometry emitted for one case.
#[derive(Clone, Copy, Debug)]
pub struct CaseShape {
  pub polygon: &'static [CellPoint],
  pub triangles: &'static [[u8; 3]],
  pub walls: &'static [WallSegment],
}

use CellPoint::{
  Bottom, BottomLeft as BL, BottomRight as BR, Left, Right, Top, TopLeft as TL, TopRight as TR,
};

const fn wall(from: CellPoint, to: CellPoint, ccw: bool) -> WallSegment {
  WallSegment { from, to, ccw }
}

/// Case geometry indexed by [`CellCase::index`](super::CellCase::index).
pub const CASE_TABLE: [CaseShape; 16] = [
  // 0: all solid
  CaseShape {
    polygon: &[BL, BR, TR, TL],
    triangles: &[[0, 2, 1], [0, 3, 2]],
    walls: &[],
  },
  // 1: d empty
  CaseShape {
    polygon: &[BL, BR, TL, Top, Right],
    triangles: &[[0, 2, 3], [0, 3, 4], [0, 4, 1]],
    walls: &[wall(Top, Right, false)],
  },
  // 2: c empty
  CaseShape {
    polygon: &[BL, BR, TR, Top, Left],
    triangles: &[[0, 4, 1], [1, 4, 3], [1, 3, 2]],
    walls: &[wall(Left, Top, false)],
  },
  // 3: top row empty
  CaseShape {
    polygon: &[BL, BR, Right, Left],
    triangles: &[[0, 2, 1], [0, 3, 2]],
    walls: &[wall(Left, Right, false)],
  },
  // 4: b empty
  CaseShape {
    polygon: &[BL, TL, TR, Bottom, Right],
    triangles: &[[1, 2, 4], [1, 4, 3], [1, 3, 0]],
    walls: &[wall(Bottom, Right, true)],
  },
  // 5: right column empty
  CaseShape {
    polygon: &[BL, Bottom, Top, TL],
    triangles: &[[0, 3, 2], [0, 2, 1]],
    walls: &[wall(Bottom, Top, true)],
  },
  // 6: saddle, a and d solid
  CaseShape {
    polygon: &[BL, Left, Bottom, TR, Right, Top],
    triangles: &[[0, 1, 2], [3, 4, 5]],
    walls: &[wall(Left, Bottom, false), wall(Top, Right, true)],
  },
  // 7: only a solid
  CaseShape {
    polygon: &[BL, Left, Bottom],
    triangles: &[[0, 1, 2]],
    walls: &[wall(Left, Bottom, false)],
  },
  // 8: a empty
  CaseShape {
    polygon: &[TL, BR, TR, Bottom, Left],
    triangles: &[[2, 4, 0], [2, 3, 4], [2, 1, 3]],
    walls: &[wall(Left, Bottom, true)],
  },
  // 9: saddle, b and c solid
  CaseShape {
    polygon: &[TL, Top, Left, BR, Bottom, Right],
    triangles: &[[0, 1, 2], [3, 4, 5]],
    walls: &[wall(Left, Top, true), wall(Bottom, Right, false)],
  },
  // 10: left column empty
  CaseShape {
    polygon: &[BR, Bottom, Top, TR],
    triangles: &[[1, 2, 3], [1, 3, 0]],
    walls: &[wall(Bottom, Top, false)],
  },
  // 11: only b solid
  CaseShape {
    polygon: &[BR, Bottom, Right],
    triangles: &[[0, 1, 2]],
    walls: &[wall(Bottom, Right, false)],
  },
  // 12: bottom row empty
  CaseShape {
    polygon: &[TL, TR, Right, Left],
    triangles: &[[3, 0, 1], [3, 1, 2]],
    walls: &[wall(Left, Right, true)],
  },
  // 13: only c solid
  CaseShape {
    polygon: &[TL, Top, Left],
    triangles: &[[0, 1, 2]],
    walls: &[wall(Left, Top, true)],
  },
  // 14: only d solid
  CaseShape {
    polygon: &[Top, TR, Right],
    triangles: &[[0, 1, 2]],
    walls: &[wall(Top, Right, true)],
  },
  // 15: all empty
  CaseShape {
    polygon: &[],
    triangles: &[],
    walls: &[],
  },
];

/// Emits one cell's contour polygon and walls into `out`.
///
/// `origin` is the cell's bottom-left corner in tile-local space. Contour
/// vertices go through the builder's deduplication; each wall adds four
/// fresh vertices, the segment at `z = 0` and at `z = wall_depth`.
pub fn emit_cell(cell: &Cell, origin: Vec2, scale: f32, wall_depth: f32, out: &mut MeshBuilder) {
  let shape = &CASE_TABLE[cell.case().index()];

  let mut local = [0u32; 6];
  for (slot, point) in local.iter_mut().zip(shape.polygon) {
    let p = origin + point.resolve(cell, scale);
    *slot = out.contour_vertex(p.extend(0.0));
  }
  for tri in shape.triangles {
    out.contour_triangle([
      local[tri[0] as usize],
      local[tri[1] as usize],
      local[tri[2] as usize],
    ]);
  }

  for segment in shape.walls {
    let from = origin + segment.from.resolve(cell, scale);
    let to = origin + segment.to.resolve(cell, scale);
    let base = out.wall_quad([
      from.extend(0.0),
      to.extend(0.0),
      from.extend(wall_depth),
      to.extend(wall_depth),
    ]);
    let order: [[u32; 3]; 2] = if segment.ccw {
      [[0, 3, 2], [0, 1, 3]]
    } else {
      [[0, 2, 3], [0, 3, 1]]
    };
    for tri in order {
      out.wall_triangle([base + tri[0], base + tri[1], base + tri[2]]);
    }
  }
}

/// Returns the number of triangles a case emits, walls included.
pub fn triangle_count(case: super::CellCase) -> usize {
  let shape = &CASE_TABLE[case.index()];
  shape.triangles.len() + shape.walls.len() * 2
}

#[cfg(test)]
mod tests {
  use super::super::{CellCase, classify};
  use super::*;

  /// Builds a cell whose corners are solid (1.0) or empty (0.0) per case bit.
  fn cell_for_case(index: u8) -> Cell {
    let v = |bit: u8| if index & bit == 0 { 1.0 } else { 0.0 };
    Cell::new(v(8), v(4), v(2), v(1))
  }

  /// Whether a cell point is solid: corners by sample, crossings always.
  fn is_solid(cell: &Cell, point: CellPoint) -> bool {
    match point {
      CellPoint::BottomLeft => cell.a > 0.5,
      CellPoint::BottomRight => cell.b > 0.5,
      CellPoint::TopLeft => cell.c > 0.5,
      CellPoint::TopRight => cell.d > 0.5,
      _ => true,
    }
  }

  /// The two corners of the edge a crossing point lies on.
  fn edge_corners(point: CellPoint) -> [CellPoint; 2] {
    match point {
      CellPoint::Bottom => [CellPoint::BottomLeft, CellPoint::BottomRight],
      CellPoint::Top => [CellPoint::TopLeft, CellPoint::TopRight],
      CellPoint::Left => [CellPoint::BottomLeft, CellPoint::TopLeft],
      CellPoint::Right => [CellPoint::BottomRight, CellPoint::TopRight],
      corner => panic!("wall endpoint {corner:?} is not an edge crossing"),
    }
  }

  fn emit(cell: &Cell) -> super::super::TileMesh {
    let mut builder = MeshBuilder::new();
    emit_cell(cell, Vec2::ZERO, 1.0, 1.0, &mut builder);
    builder.take()
  }

  #[test]
  fn case_zero_is_a_single_quad() {
    let mesh = emit(&cell_for_case(0));
    assert_eq!(mesh.vertices.len(), 4);
    assert_eq!(mesh.triangles.len(), 2);
    assert!(mesh.vertices.iter().all(|v| v.z == 0.0));
  }

  #[test]
  fn case_fifteen_is_empty() {
    let mesh = emit(&cell_for_case(15));
    assert!(mesh.vertices.is_empty());
    assert!(mesh.triangles.is_empty());
  }

  #[test]
  fn every_contour_case_emits_walls() {
    for index in 1..15u8 {
      let cell = cell_for_case(index);
      assert_eq!(cell.case().index(), index as usize);

      let shape = &CASE_TABLE[index as usize];
      assert!(!shape.walls.is_empty(), "case {index} has no wall");
      assert!((3..=6).contains(&shape.polygon.len()));

      let mesh = emit(&cell);
      let wall_vertices = mesh.vertices.iter().filter(|v| v.z == 1.0).count();
      assert_eq!(wall_vertices, shape.walls.len() * 2);
      assert_eq!(
        mesh.triangles.len(),
        triangle_count(CellCase::new(index).unwrap())
      );
    }
  }

  #[test]
  fn triangle_patterns_stay_inside_polygon() {
    for (index, shape) in CASE_TABLE.iter().enumerate() {
      for tri in shape.triangles {
        for &i in tri {
          assert!(
            (i as usize) < shape.polygon.len(),
            "case {index} indexes past its polygon"
          );
        }
      }
    }
  }

  #[test]
  fn polygons_only_use_solid_corners() {
    for index in 0..16u8 {
      let cell = cell_for_case(index);
      for &point in CASE_TABLE[index as usize].polygon {
        assert!(
          is_solid(&cell, point),
          "case {index} uses empty corner {point:?}"
        );
      }
    }
  }

  #[test]
  fn contour_triangles_face_the_same_way() {
    // Every polygon triangle winds clockwise in the XY plane.
    for index in 0..15u8 {
      let mut cell = cell_for_case(index);
      // Off-centre crossings so no triangle collapses.
      for v in [&mut cell.a, &mut cell.b, &mut cell.c, &mut cell.d] {
        if *v == 0.0 {
          *v = 0.2;
        }
      }
      let cell = Cell::new(cell.a, cell.b, cell.c, cell.d);
      let shape = &CASE_TABLE[index as usize];
      let points: Vec<Vec2> = shape.polygon.iter().map(|p| p.resolve(&cell, 1.0)).collect();
      for tri in shape.triangles {
        let [p0, p1, p2] = tri.map(|i| points[i as usize]);
        let cross = (p1 - p0).perp_dot(p2 - p0);
        assert!(cross < 0.0, "case {index} triangle {tri:?} winds ccw");
      }
    }
  }

  #[test]
  fn walls_face_away_from_solid_corners() {
    // Like contour faces (normal -Z, away from the slab), wall normals point
    // out of the material: toward the empty corner of every edge the wall
    // crosses, away from the solid one.
    for index in 1..15u8 {
      let cell = cell_for_case(index);
      let shape = &CASE_TABLE[index as usize];
      let mesh = emit(&cell);
      let first_wall = mesh.triangles.len() - shape.walls.len() * 2;

      for (segment, tris) in shape
        .walls
        .iter()
        .zip(mesh.triangles[first_wall..].chunks(2))
      {
        let from = segment.from.resolve(&cell, 1.0);
        for tri in tris {
          let [p0, p1, p2] = tri.map(|i| mesh.vertices[i as usize]);
          let normal = (p1 - p0).cross(p2 - p0);
          assert!(normal.z.abs() < 1e-6, "case {index}: wall not upright");
          let facing = normal.truncate();

          for crossing in [segment.from, segment.to] {
            for corner in edge_corners(crossing) {
              let side = facing.dot(corner.resolve(&cell, 1.0) - from);
              if is_solid(&cell, corner) {
                assert!(side < 0.0, "case {index}: {segment:?} faces solid {corner:?}");
              } else {
                assert!(side > 0.0, "case {index}: {segment:?} faces away from empty {corner:?}");
              }
            }
          }
        }
      }
    }
  }

  #[test]
  fn walls_run_along_interpolated_crossings() {
    let cell = Cell::new(0.9, 0.1, 0.1, 0.1);
    assert_eq!(cell.case(), classify(0.9, 0.1, 0.1, 0.1));
    let mesh = emit(&cell);

    let left = Vec3::new(0.0, interpolate(0.9, 0.1), 0.0);
    let bottom = Vec3::new(interpolate(0.9, 0.1), 0.0, 0.0);
    assert!(mesh.vertices.contains(&left));
    assert!(mesh.vertices.contains(&bottom));
    assert!(mesh.vertices.contains(&left.with_z(1.0)));
    assert!(mesh.vertices.contains(&bottom.with_z(1.0)));
  }

  #[test]
  fn emission_is_deterministic() {
    let cell = Cell::new(0.73, 0.12, 0.61, 0.07);
    assert_eq!(emit(&cell), emit(&cell));
  }
}
