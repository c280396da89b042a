// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CSG (Constructive Solid Geometry) Operations
//!
//! Boolean difference/intersection through csgrs, plus the horizontal
//! half-space cut used for roof trimming.

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::triangulation::{calculate_polygon_normal, project_to_2d, triangulate_polygon};
use nalgebra::{Point3, Vector3};

/// Plane definition for clipping
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    /// Point on the plane
    pub point: Point3<f64>,
    /// Normal vector (must be normalized)
    pub normal: Vector3<f64>,
}

impl Plane {
    /// Create a new plane
    pub fn new(point: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            point,
            normal: normal.normalize(),
        }
    }

    /// Horizontal plane at height `z`, normal pointing up
    pub fn horizontal(z: f64) -> Self {
        Self::new(Point3::new(0.0, 0.0, z), Vector3::z())
    }

    /// Calculate signed distance from point to plane
    /// Positive = in front, Negative = behind
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        (point - self.point).dot(&self.normal)
    }

    /// Project a point onto the plane
    pub fn project(&self, point: &Point3<f64>) -> Point3<f64> {
        point - self.normal * self.signed_distance(point)
    }
}

/// Closed axis-aligned box, two outward-wound triangles per face
pub fn box_mesh(min: Point3<f64>, max: Point3<f64>) -> Mesh {
    let corner = |i: usize| {
        Point3::new(
            if i & 1 == 0 { min.x } else { max.x },
            if i & 2 == 0 { min.y } else { max.y },
            if i & 4 == 0 { min.z } else { max.z },
        )
    };
    // Corner bit 0 = x, bit 1 = y, bit 2 = z; quads counter-clockwise from outside
    const FACES: [([usize; 4], [f64; 3]); 6] = [
        ([0, 2, 3, 1], [0.0, 0.0, -1.0]),
        ([4, 5, 7, 6], [0.0, 0.0, 1.0]),
        ([0, 4, 6, 2], [-1.0, 0.0, 0.0]),
        ([1, 3, 7, 5], [1.0, 0.0, 0.0]),
        ([0, 1, 5, 4], [0.0, -1.0, 0.0]),
        ([2, 6, 7, 3], [0.0, 1.0, 0.0]),
    ];

    let mut mesh = Mesh::with_capacity(24, 36);
    for (quad, normal) in FACES {
        let base = mesh.vertex_count() as u32;
        let normal = Vector3::from(normal);
        for i in quad {
            mesh.add_vertex(corner(i), normal);
        }
        mesh.add_triangle(base, base + 1, base + 2);
        mesh.add_triangle(base, base + 2, base + 3);
    }
    mesh
}

/// CSG Clipping Processor
#[derive(Debug, Clone, Copy)]
pub struct ClippingProcessor {
    /// Epsilon for floating point comparisons
    pub epsilon: f64,
}

impl ClippingProcessor {
    /// Create a new clipping processor
    pub fn new() -> Self {
        Self { epsilon: 1e-6 }
    }

    /// Create a processor with a custom tolerance
    pub fn with_epsilon(epsilon: f64) -> Self {
        Self { epsilon }
    }

    /// Convert our Mesh format to csgrs Mesh format
    fn mesh_to_csgrs(mesh: &Mesh) -> Result<csgrs::mesh::Mesh<()>> {
        use csgrs::mesh::{polygon::Polygon, vertex::Vertex, Mesh as CSGMesh};

        let mut polygons = Vec::with_capacity(mesh.triangle_count());

        for [v0, v1, v2] in mesh.triangles() {
            // Skip degenerate triangles to avoid NaN propagation
            let face_normal = match (v1 - v0).cross(&(v2 - v0)).try_normalize(1e-12) {
                Some(n) => n,
                None => continue,
            };

            let vertices = vec![
                Vertex::new(v0, face_normal),
                Vertex::new(v1, face_normal),
                Vertex::new(v2, face_normal),
            ];

            polygons.push(Polygon::new(vertices, None));
        }

        if polygons.is_empty() && !mesh.is_empty() {
            return Err(Error::DegenerateGeometry(
                "mesh has no non-degenerate triangles".to_string(),
            ));
        }

        Ok(CSGMesh::from_polygons(&polygons, None))
    }

    /// Convert csgrs Mesh format back to our Mesh format
    fn csgrs_to_mesh(csg_mesh: &csgrs::mesh::Mesh<()>) -> Result<Mesh> {
        let mut mesh = Mesh::new();

        for polygon in &csg_mesh.polygons {
            let vertices = &polygon.vertices;
            if vertices.len() < 3 {
                continue;
            }

            let points_3d: Vec<Point3<f64>> = vertices
                .iter()
                .map(|v| Point3::new(v.pos[0], v.pos[1], v.pos[2]))
                .collect();

            if points_3d
                .iter()
                .any(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
            {
                return Err(Error::BooleanFailed(
                    "non-finite vertex in boolean result".to_string(),
                ));
            }

            let raw_normal = Vector3::new(
                vertices[0].normal[0],
                vertices[0].normal[1],
                vertices[0].normal[2],
            );

            let csg_normal = match raw_normal.try_normalize(1e-10) {
                Some(n) if n.x.is_finite() && n.y.is_finite() && n.z.is_finite() => n,
                _ => match calculate_polygon_normal(&points_3d).try_normalize(1e-10) {
                    Some(n) => n,
                    None => continue,
                },
            };

            let base_idx = mesh.vertex_count() as u32;

            if points_3d.len() == 3 {
                for p in &points_3d {
                    mesh.add_vertex(*p, csg_normal);
                }
                mesh.add_triangle(base_idx, base_idx + 1, base_idx + 2);
                continue;
            }

            // Project along the polygon normal so the 2D winding matches
            let points_2d = project_to_2d(&points_3d, &csg_normal);
            let indices = match triangulate_polygon(&points_2d) {
                Ok(idx) => idx,
                Err(e) => {
                    tracing::trace!(vertices = points_3d.len(), error = %e, "Dropping untriangulable polygon");
                    continue;
                }
            };

            for p in &points_3d {
                mesh.add_vertex(*p, csg_normal);
            }
            for tri in indices.chunks_exact(3) {
                mesh.add_triangle(
                    base_idx + tri[0] as u32,
                    base_idx + tri[1] as u32,
                    base_idx + tri[2] as u32,
                );
            }
        }

        Ok(mesh)
    }

    /// Subtract `cutter` from `host` (host - cutter)
    pub fn subtract_mesh(&self, host: &Mesh, cutter: &Mesh) -> Result<Mesh> {
        use csgrs::traits::CSG;

        if cutter.is_empty() {
            return Ok(host.clone());
        }
        if host.is_empty() {
            return Err(Error::EmptyMesh("difference host".to_string()));
        }

        let host_csg = Self::mesh_to_csgrs(host)?;
        let cutter_csg = Self::mesh_to_csgrs(cutter)?;

        let result = Self::csgrs_to_mesh(&host_csg.difference(&cutter_csg))?;
        Ok(result.repair(self.epsilon * self.epsilon))
    }

    /// Intersect two meshes (a ∩ b)
    pub fn intersect_mesh(&self, a: &Mesh, b: &Mesh) -> Result<Mesh> {
        use csgrs::traits::CSG;

        if a.is_empty() || b.is_empty() {
            return Ok(Mesh::new());
        }

        let a_csg = Self::mesh_to_csgrs(a)?;
        let b_csg = Self::mesh_to_csgrs(b)?;

        let result = Self::csgrs_to_mesh(&a_csg.intersection(&b_csg))?;
        Ok(result.repair(self.epsilon * self.epsilon))
    }

    /// Volume shared by two meshes
    pub fn intersection_volume(&self, a: &Mesh, b: &Mesh) -> Result<f64> {
        Ok(self.intersect_mesh(a, b)?.volume())
    }

    /// Remove the half-space above `z`, capping the cut face
    ///
    /// Vertices left within `epsilon` of the plane are snapped onto it so the
    /// trimmed top lies exactly at `z`. A mesh already below `z` is returned
    /// unchanged.
    pub fn clip_above(&self, mesh: &Mesh, z: f64) -> Result<Mesh> {
        let bounds = mesh
            .bounds()
            .ok_or_else(|| Error::EmptyMesh("clip host".to_string()))?;

        if bounds.max.z <= z + self.epsilon {
            return Ok(mesh.clone());
        }

        let margin = 1.0 + (bounds.max - bounds.min).norm();
        let cutter_min = Point3::new(bounds.min.x - margin, bounds.min.y - margin, z);
        let cutter_max = Point3::new(bounds.max.x + margin, bounds.max.y + margin, bounds.max.z + margin);

        let mut clipped = self.subtract_mesh(mesh, &box_mesh(cutter_min, cutter_max))?;

        let plane = Plane::horizontal(z);
        for chunk in clipped.positions.chunks_exact_mut(3) {
            let p = Point3::new(chunk[0], chunk[1], chunk[2]);
            if plane.signed_distance(&p).abs() <= self.epsilon {
                chunk[2] = plane.project(&p).z;
            }
        }

        Ok(clipped)
    }
}

impl Default for ClippingProcessor {
    fn default() -> Self {
        Self::new()
    }
}
