// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures

use nalgebra::{Point3, Vector3};
use rustc_hash::FxHashSet;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Aabb {
    /// Create a new bounding box
    #[inline]
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Check 3D overlap, growing both boxes by `padding`
    #[inline]
    pub fn intersects(&self, other: &Aabb, padding: f64) -> bool {
        self.min.x <= other.max.x + padding
            && self.max.x + padding >= other.min.x
            && self.min.y <= other.max.y + padding
            && self.max.y + padding >= other.min.y
            && self.min.z <= other.max.z + padding
            && self.max.z + padding >= other.min.z
    }

    /// Check plan (XY) overlap only
    #[inline]
    pub fn intersects_plan(&self, other: &Aabb, padding: f64) -> bool {
        self.min.x <= other.max.x + padding
            && self.max.x + padding >= other.min.x
            && self.min.y <= other.max.y + padding
            && self.max.y + padding >= other.min.y
    }
}

/// Triangle mesh
///
/// Positions stay in f64: drawings are in metres with millimetre detail and
/// every boolean pass re-reads the coordinates.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f64>,
    /// Vertex normals (nx, ny, nz)
    pub normals: Vec<f32>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Create a mesh with capacity
    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Vec::with_capacity(vertex_count * 3),
            indices: Vec::with_capacity(index_count),
        }
    }

    /// Add a vertex with normal
    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>, normal: Vector3<f64>) {
        self.positions.push(position.x);
        self.positions.push(position.y);
        self.positions.push(position.z);

        self.normals.push(normal.x as f32);
        self.normals.push(normal.y as f32);
        self.normals.push(normal.z as f32);
    }

    /// Add a triangle
    #[inline]
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    /// Vertex position by index
    #[inline]
    pub fn vertex(&self, index: usize) -> Point3<f64> {
        Point3::new(
            self.positions[index * 3],
            self.positions[index * 3 + 1],
            self.positions[index * 3 + 2],
        )
    }

    /// Iterate triangles as vertex triples
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<f64>; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                self.vertex(tri[0] as usize),
                self.vertex(tri[1] as usize),
                self.vertex(tri[2] as usize),
            ]
        })
    }

    /// Calculate bounds; `None` for an empty mesh
    #[inline]
    pub fn bounds(&self) -> Option<Aabb> {
        if self.positions.is_empty() {
            return None;
        }

        let mut min = Point3::new(f64::MAX, f64::MAX, f64::MAX);
        let mut max = Point3::new(f64::MIN, f64::MIN, f64::MIN);

        self.positions.chunks_exact(3).for_each(|chunk| {
            let (x, y, z) = (chunk[0], chunk[1], chunk[2]);
            min.x = min.x.min(x);
            min.y = min.y.min(y);
            min.z = min.z.min(z);
            max.x = max.x.max(x);
            max.y = max.y.max(y);
            max.z = max.z.max(z);
        });

        Some(Aabb::new(min, max))
    }

    /// Signed volume (divergence theorem); positive for outward winding
    pub fn signed_volume(&self) -> f64 {
        self.triangles()
            .map(|[a, b, c]| a.coords.dot(&b.coords.cross(&c.coords)) / 6.0)
            .sum()
    }

    /// Absolute enclosed volume
    #[inline]
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    /// Reverse the winding of every triangle and negate normals
    pub fn flip_winding(&mut self) {
        for tri in self.indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
        for n in self.normals.iter_mut() {
            *n = -*n;
        }
    }

    /// Flip the whole mesh if it encloses negative volume
    pub fn orient_outward(&mut self) {
        if self.signed_volume() < 0.0 {
            self.flip_winding();
        }
    }

    /// Remove zero-area and duplicate triangles, then fix orientation
    ///
    /// Duplicates are detected on the unordered set of quantized corner
    /// positions, so a face listed twice with either winding is kept once.
    pub fn repair(&self, area_epsilon: f64) -> Mesh {
        const QUANTUM: f64 = 1e-9;
        let quantize = |p: &Point3<f64>| -> [i64; 3] {
            [
                (p.x / QUANTUM).round() as i64,
                (p.y / QUANTUM).round() as i64,
                (p.z / QUANTUM).round() as i64,
            ]
        };

        let mut seen: FxHashSet<[[i64; 3]; 3]> = FxHashSet::default();
        let mut result = Mesh::with_capacity(self.vertex_count(), self.indices.len());

        for tri in self.indices.chunks_exact(3) {
            let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let (a, b, c) = (self.vertex(i0), self.vertex(i1), self.vertex(i2));

            let area = (b - a).cross(&(c - a)).norm() * 0.5;
            if !area.is_finite() || area < area_epsilon {
                continue;
            }

            let mut key = [quantize(&a), quantize(&b), quantize(&c)];
            key.sort_unstable();
            if !seen.insert(key) {
                continue;
            }

            let base = result.vertex_count() as u32;
            for i in [i0, i1, i2] {
                let normal = Vector3::new(
                    self.normals.get(i * 3).copied().unwrap_or(0.0) as f64,
                    self.normals.get(i * 3 + 1).copied().unwrap_or(0.0) as f64,
                    self.normals.get(i * 3 + 2).copied().unwrap_or(0.0) as f64,
                );
                result.add_vertex(self.vertex(i), normal);
            }
            result.add_triangle(base, base + 1, base + 2);
        }

        result.orient_outward();
        result
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
