// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D Profile definitions
//!
//! Turns decoded polylines (with bulge-encoded arcs) and circles into
//! closed, counter-clockwise outlines ready for extrusion.

use crate::error::{Error, Result};
use crate::triangulation::triangulate_polygon;
use dxf_lite_core::PolylineVertex;
use nalgebra::Point2;
use smallvec::SmallVec;

/// Bulges below this magnitude are straight segments
pub const BULGE_EPSILON: f64 = 1e-6;

/// Chords shorter than this collapse to their start point
pub const CHORD_EPSILON: f64 = 1e-6;

/// Consecutive points closer than this are merged
const POINT_EPSILON: f64 = 1e-9;

/// Minimum number of segments for a full circle
pub const MIN_CIRCLE_SEGMENTS: usize = 32;

/// Points along one arc; inline for the default segment count
pub type ArcPoints = SmallVec<[Point2<f64>; 17]>;

/// 2D Profile with optional holes
#[derive(Debug, Clone)]
pub struct Profile2D {
    /// Outer boundary (counter-clockwise)
    pub outer: Vec<Point2<f64>>,
    /// Holes (clockwise)
    pub holes: Vec<Vec<Point2<f64>>>,
    /// Outline was drawn clockwise and has been reversed
    pub reversed: bool,
}

impl Profile2D {
    /// Create a new profile
    pub fn new(outer: Vec<Point2<f64>>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
            reversed: false,
        }
    }

    /// Build a validated profile from raw outline points
    ///
    /// Drops repeated points (including a closing point equal to the first),
    /// rejects outlines with fewer than 3 points or zero area, and
    /// normalizes the winding to counter-clockwise.
    pub fn from_points(points: &[Point2<f64>], area_epsilon: f64) -> Result<Self> {
        let mut outer: Vec<Point2<f64>> = Vec::with_capacity(points.len());
        for p in points {
            if !(p.x.is_finite() && p.y.is_finite()) {
                return Err(Error::InvalidProfile("non-finite point".to_string()));
            }
            if outer
                .last()
                .map_or(true, |last| (p - last).norm() > POINT_EPSILON)
            {
                outer.push(*p);
            }
        }
        while outer.len() > 1 && (outer[0] - outer[outer.len() - 1]).norm() <= POINT_EPSILON {
            outer.pop();
        }

        if outer.len() < 3 {
            return Err(Error::DegenerateGeometry(format!(
                "outline has {} distinct points, need at least 3",
                outer.len()
            )));
        }

        let area = signed_area(&outer);
        if area.abs() <= area_epsilon {
            return Err(Error::DegenerateGeometry(format!(
                "outline area {:.3e} is zero",
                area
            )));
        }
        let reversed = area < 0.0;
        if reversed {
            // Keep the drawn first edge at the front: [p1, p0, pn-1, ...]
            outer.reverse();
            outer.rotate_right(2);
        }

        Ok(Self {
            reversed,
            ..Self::new(outer)
        })
    }

    /// First edge of the outline in drawing order
    pub fn first_edge(&self) -> (Point2<f64>, Point2<f64>) {
        if self.reversed {
            (self.outer[1], self.outer[0])
        } else {
            (self.outer[0], self.outer[1])
        }
    }

    /// Add a hole to the profile
    pub fn add_hole(&mut self, hole: Vec<Point2<f64>>) {
        self.holes.push(hole);
    }

    /// Plan area of the outer boundary minus holes
    pub fn area(&self) -> f64 {
        signed_area(&self.outer).abs()
            - self.holes.iter().map(|h| signed_area(h).abs()).sum::<f64>()
    }

    /// Outer perimeter
    pub fn perimeter(&self) -> f64 {
        segment_lengths(&self.outer).iter().sum()
    }

    /// Area centroid of the outer boundary
    pub fn centroid(&self) -> Point2<f64> {
        polygon_centroid(&self.outer)
    }

    /// Triangulate the profile
    /// Returns triangle indices into `outer` followed by all holes
    pub fn triangulate(&self) -> Result<Triangulation> {
        if self.outer.len() < 3 {
            return Err(Error::InvalidProfile(
                "Profile must have at least 3 vertices".to_string(),
            ));
        }

        if self.holes.is_empty() {
            return Ok(Triangulation {
                points: self.outer.clone(),
                indices: triangulate_polygon(&self.outer)?,
            });
        }

        let mut vertices = Vec::with_capacity(
            (self.outer.len() + self.holes.iter().map(|h| h.len()).sum::<usize>()) * 2,
        );
        for p in &self.outer {
            vertices.push(p.x);
            vertices.push(p.y);
        }

        let mut hole_indices = Vec::with_capacity(self.holes.len());
        for hole in &self.holes {
            hole_indices.push(vertices.len() / 2);
            for p in hole {
                vertices.push(p.x);
                vertices.push(p.y);
            }
        }

        let mut indices = earcutr::earcut(&vertices, &hole_indices, 2)
            .map_err(|e| Error::TriangulationError(format!("{:?}", e)))?;

        let points: Vec<Point2<f64>> = vertices
            .chunks_exact(2)
            .map(|c| Point2::new(c[0], c[1]))
            .collect();

        for tri in indices.chunks_exact_mut(3) {
            let (a, b, c) = (points[tri[0]], points[tri[1]], points[tri[2]]);
            if (b - a).perp(&(c - a)) < 0.0 {
                tri.swap(1, 2);
            }
        }

        Ok(Triangulation { points, indices })
    }
}

/// Triangulated profile result
#[derive(Debug, Clone)]
pub struct Triangulation {
    /// All vertices (outer + holes)
    pub points: Vec<Point2<f64>>,
    /// Triangle indices, counter-clockwise
    pub indices: Vec<usize>,
}

/// Discretize one bulge segment from `start` to `end`
///
/// The bulge is `tan(θ/4)` for an arc of included angle `θ`; positive bulges
/// turn counter-clockwise. Returns both endpoints plus `segments - 1`
/// intermediate points. A near-zero bulge yields just `[start, end]`; a
/// near-zero chord yields `[start]`.
pub fn discretize_bulge(
    start: Point2<f64>,
    end: Point2<f64>,
    bulge: f64,
    segments: usize,
) -> ArcPoints {
    let mut points = ArcPoints::new();

    if bulge.abs() < BULGE_EPSILON {
        points.push(start);
        points.push(end);
        return points;
    }

    let chord = end - start;
    let chord_length = chord.norm();
    if chord_length < CHORD_EPSILON {
        points.push(start);
        return points;
    }

    let segments = segments.max(1);
    let sweep = 4.0 * bulge.atan();
    let radius = chord_length * (1.0 + bulge * bulge) / (4.0 * bulge.abs());
    let sagitta = bulge * chord_length / 2.0;

    let mid = Point2::from((start.coords + end.coords) / 2.0);
    let dir = chord / chord_length;
    let perp = nalgebra::Vector2::new(-dir.y, dir.x);
    let center = mid + perp * (radius - sagitta.abs()) * bulge.signum();

    let start_angle = (start.y - center.y).atan2(start.x - center.x);

    points.push(start);
    for i in 1..segments {
        let angle = start_angle + sweep * (i as f64 / segments as f64);
        points.push(center + nalgebra::Vector2::new(angle.cos(), angle.sin()) * radius);
    }
    points.push(end);

    points
}

/// Expand polyline vertices into an explicit point list
///
/// Arc segments contribute every discretized point except their end (the
/// next vertex supplies it). For open polylines the last vertex is kept.
pub fn polyline_points(vertices: &[PolylineVertex], closed: bool, segments: usize) -> Vec<Point2<f64>> {
    let mut points = Vec::with_capacity(vertices.len());
    let n = vertices.len();

    for (i, vertex) in vertices.iter().enumerate() {
        let start = Point2::new(vertex.x, vertex.y);

        let next = if i + 1 < n {
            &vertices[i + 1]
        } else if closed {
            &vertices[0]
        } else {
            points.push(start);
            break;
        };
        let end = Point2::new(next.x, next.y);

        if vertex.bulge.abs() > BULGE_EPSILON {
            let arc = discretize_bulge(start, end, vertex.bulge, segments);
            let keep = if arc.len() > 1 { arc.len() - 1 } else { arc.len() };
            points.extend_from_slice(&arc[..keep]);
        } else {
            points.push(start);
        }
    }

    points
}

/// Segment count used for full circles
#[inline]
pub fn circle_segments(arc_segments: usize) -> usize {
    MIN_CIRCLE_SEGMENTS.max(arc_segments * 2)
}

/// Discretize a full circle, counter-clockwise from angle 0
pub fn circle_points(center: Point2<f64>, radius: f64, segments: usize) -> Vec<Point2<f64>> {
    (0..segments)
        .map(|i| {
            let angle = 2.0 * std::f64::consts::PI * (i as f64) / (segments as f64);
            Point2::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect()
}

/// Signed area (shoelace); positive for counter-clockwise
pub fn signed_area(contour: &[Point2<f64>]) -> f64 {
    let n = contour.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += contour[i].x * contour[j].y - contour[j].x * contour[i].y;
    }
    area * 0.5
}

/// Length of each closed-loop edge
pub fn segment_lengths(contour: &[Point2<f64>]) -> Vec<f64> {
    let n = contour.len();
    if n < 2 {
        return Vec::new();
    }
    (0..n)
        .map(|i| (contour[(i + 1) % n] - contour[i]).norm())
        .collect()
}

/// Area centroid; falls back to the vertex mean for degenerate outlines
pub fn polygon_centroid(contour: &[Point2<f64>]) -> Point2<f64> {
    let n = contour.len();
    if n == 0 {
        return Point2::origin();
    }

    let area = signed_area(contour);
    if area.abs() < 1e-12 {
        let sum = contour.iter().fold(nalgebra::Vector2::zeros(), |acc, p| acc + p.coords);
        return Point2::from(sum / n as f64);
    }

    let (mut cx, mut cy) = (0.0, 0.0);
    for i in 0..n {
        let (p, q) = (contour[i], contour[(i + 1) % n]);
        let cross = p.x * q.y - q.x * p.y;
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }
    Point2::new(cx / (6.0 * area), cy / (6.0 * area))
}

/// Create a rectangular profile centred on the origin
pub fn create_rectangle(width: f64, height: f64) -> Profile2D {
    let half_w = width / 2.0;
    let half_h = height / 2.0;

    Profile2D::new(vec![
        Point2::new(-half_w, -half_h),
        Point2::new(half_w, -half_h),
        Point2::new(half_w, half_h),
        Point2::new(-half_w, half_h),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_bulge_yields_endpoints() {
        let points = discretize_bulge(Point2::new(0.0, 0.0), Point2::new(2.0, 0.0), 0.0, 16);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], Point2::new(0.0, 0.0));
        assert_eq!(points[1], Point2::new(2.0, 0.0));
    }

    #[test]
    fn test_zero_chord_yields_start() {
        let points = discretize_bulge(Point2::new(1.0, 1.0), Point2::new(1.0, 1.0), 0.5, 16);
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_semicircle_bulge() {
        // bulge 1 = half circle, radius = chord / 2
        let points = discretize_bulge(Point2::new(0.0, 0.0), Point2::new(2.0, 0.0), 1.0, 8);
        assert_eq!(points.len(), 9);
        for p in &points {
            assert_relative_eq!((p - Point2::new(1.0, 0.0)).norm(), 1.0, epsilon = 1e-9);
        }
        // Counter-clockwise from (0,0) to (2,0) passes below the chord
        assert_relative_eq!(points[4].y, -1.0, epsilon = 1e-9);
        assert_eq!(*points.last().unwrap(), Point2::new(2.0, 0.0));
    }

    #[test]
    fn test_negative_bulge_turns_clockwise() {
        let points = discretize_bulge(Point2::new(0.0, 0.0), Point2::new(2.0, 0.0), -1.0, 8);
        assert_relative_eq!(points[4].y, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_polyline_points_with_arc() {
        let vertices = [
            PolylineVertex::new(0.0, 0.0, 0.0),
            PolylineVertex::new(2.0, 0.0, 1.0),
            PolylineVertex::new(2.0, 2.0, 0.0),
            PolylineVertex::new(0.0, 2.0, 0.0),
        ];
        let points = polyline_points(&vertices, true, 4);
        // 1 straight + 4 arc points (end excluded) + 2 straight
        assert_eq!(points.len(), 7);
        assert_eq!(points[1], Point2::new(2.0, 0.0));
        assert_eq!(points[5], Point2::new(2.0, 2.0));
    }

    #[test]
    fn test_open_polyline_keeps_last_vertex() {
        let vertices = [
            PolylineVertex::new(0.0, 0.0, 0.0),
            PolylineVertex::new(1.0, 0.0, 0.0),
            PolylineVertex::new(1.0, 1.0, 0.0),
        ];
        assert_eq!(polyline_points(&vertices, false, 16).len(), 3);
    }

    #[test]
    fn test_from_points_normalizes() {
        // Clockwise square with closing duplicate
        let points = [
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 2.0),
            Point2::new(2.0, 2.0),
            Point2::new(2.0, 0.0),
            Point2::new(0.0, 0.0),
        ];
        let profile = Profile2D::from_points(&points, 1e-9).unwrap();
        assert_eq!(profile.outer.len(), 4);
        assert!(signed_area(&profile.outer) > 0.0);
        assert_relative_eq!(profile.area(), 4.0);
        assert_relative_eq!(profile.perimeter(), 8.0);
        assert_eq!(profile.centroid(), Point2::new(1.0, 1.0));
        assert!(profile.reversed);
        assert_eq!(
            profile.first_edge(),
            (Point2::new(0.0, 0.0), Point2::new(0.0, 2.0))
        );
    }

    #[test]
    fn test_from_points_rejects_degenerate() {
        let two = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
        assert!(Profile2D::from_points(&two, 1e-9).is_err());

        let collinear = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(2.0, 0.0)];
        match Profile2D::from_points(&collinear, 1e-9) {
            Err(Error::DegenerateGeometry(_)) => {}
            _ => panic!("Expected DegenerateGeometry"),
        }
    }

    #[test]
    fn test_circle_points() {
        assert_eq!(circle_segments(16), 32);
        assert_eq!(circle_segments(24), 48);
        let points = circle_points(Point2::new(1.0, 1.0), 0.5, 32);
        assert_eq!(points.len(), 32);
        assert!(signed_area(&points) > 0.0);
    }

    #[test]
    fn test_triangulate_with_hole() {
        let mut profile = create_rectangle(10.0, 10.0);
        let mut hole = create_rectangle(2.0, 2.0).outer;
        hole.reverse();
        profile.add_hole(hole);

        let tri = profile.triangulate().unwrap();
        assert_eq!(tri.points.len(), 8);
        assert_eq!(tri.indices.len() % 3, 0);
        assert_relative_eq!(profile.area(), 96.0);
    }
}
