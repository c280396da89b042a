// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cap and face triangulation
//!
//! Small convex outlines (most walls, columns and slabs) get a fan; anything
//! else goes through earcutr. Boolean results arrive as planar 3D polygons
//! and are flattened onto their own plane first.

use crate::error::{Error, Result};
use nalgebra::{Point2, Point3, Vector3};

/// Largest outline that is fanned instead of ear-clipped
const MAX_FAN_VERTICES: usize = 8;

/// Cross products below this are treated as collinear turns
const TURN_EPSILON: f64 = 1e-10;

/// Twice the signed area of triangle (a, b, c); positive when counter-clockwise
#[inline]
fn doubled_area(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// All non-collinear turns go the same way
fn is_convex(points: &[Point2<f64>]) -> bool {
    let n = points.len();
    let mut turn = 0.0f64;
    for i in 0..n {
        let cross = doubled_area(&points[i], &points[(i + 1) % n], &points[(i + 2) % n]);
        if cross.abs() <= TURN_EPSILON {
            continue;
        }
        if turn != 0.0 && turn.signum() != cross.signum() {
            return false;
        }
        turn = cross;
    }
    true
}

/// Triangulate a simple polygon (no holes)
///
/// Returns triangle indices into the input points. Every returned triangle
/// is wound counter-clockwise regardless of the input orientation, so cap
/// builders only have to decide which side faces out.
pub fn triangulate_polygon(points: &[Point2<f64>]) -> Result<Vec<usize>> {
    let n = points.len();
    if n < 3 {
        return Err(Error::TriangulationError(format!(
            "outline has {} points, need at least 3",
            n
        )));
    }

    let mut indices = if n <= MAX_FAN_VERTICES && is_convex(points) {
        (1..n - 1).flat_map(|i| [0, i, i + 1]).collect()
    } else {
        let coords: Vec<f64> = points.iter().flat_map(|p| [p.x, p.y]).collect();
        earcutr::earcut(&coords, &[], 2)
            .map_err(|e| Error::TriangulationError(format!("{:?}", e)))?
    };

    if indices.is_empty() {
        return Err(Error::TriangulationError(
            "outline produced no triangles".to_string(),
        ));
    }

    for tri in indices.chunks_exact_mut(3) {
        if doubled_area(&points[tri[0]], &points[tri[1]], &points[tri[2]]) < 0.0 {
            tri.swap(1, 2);
        }
    }

    Ok(indices)
}

/// Flatten planar 3D points into coordinates on their plane
///
/// The in-plane axes `(u, v)` satisfy `u × v = normal`, so a polygon that
/// is counter-clockwise seen from the normal stays counter-clockwise.
pub fn project_to_2d(points: &[Point3<f64>], normal: &Vector3<f64>) -> Vec<Point2<f64>> {
    let Some(origin) = points.first() else {
        return Vec::new();
    };

    // Reference axis least aligned with the normal
    let reference = if normal.x.abs() <= normal.y.abs() && normal.x.abs() <= normal.z.abs() {
        Vector3::x()
    } else if normal.y.abs() <= normal.z.abs() {
        Vector3::y()
    } else {
        Vector3::z()
    };
    let u = normal.cross(&reference).normalize();
    let v = normal.cross(&u).normalize();

    points
        .iter()
        .map(|p| {
            let d = p - origin;
            Point2::new(d.dot(&u), d.dot(&v))
        })
        .collect()
}

/// Unnormalized polygon normal by Newell's method
///
/// Robust for non-convex and slightly non-planar polygons; zero for
/// degenerate input.
pub fn calculate_polygon_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let n = points.len();
    (0..n).fold(Vector3::zeros(), |acc, i| {
        let (a, b) = (&points[i], &points[(i + 1) % n]);
        acc + Vector3::new(
            (a.y - b.y) * (a.z + b.z),
            (a.z - b.z) * (a.x + b.x),
            (a.x - b.x) * (a.y + b.y),
        )
    })
}
