// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extrusion operations - converting 2D profiles to 3D meshes
//!
//! Every extrusion here is a prism between a base ring and a top ring with
//! the same vertex count: caps reuse the plan triangulation, side walls are
//! quads split into two triangles.

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::profile::{Profile2D, Triangulation};
use nalgebra::{Matrix4, Point3, Vector3};
use std::ops::Range;

/// Extrude a 2D profile along the Z axis
#[inline]
pub fn extrude_profile(
    profile: &Profile2D,
    depth: f64,
    transform: Option<Matrix4<f64>>,
) -> Result<Mesh> {
    if !(depth > 0.0) {
        return Err(Error::InvalidExtrusion(
            "Depth must be positive".to_string(),
        ));
    }

    let triangulation = profile.triangulate()?;
    let base: Vec<Point3<f64>> = triangulation
        .points
        .iter()
        .map(|p| Point3::new(p.x, p.y, 0.0))
        .collect();
    let top: Vec<Point3<f64>> = base.iter().map(|p| p + Vector3::new(0.0, 0.0, depth)).collect();

    let mut mesh = Mesh::with_capacity(
        base.len() * 6,
        triangulation.indices.len() * 2 + base.len() * 6,
    );
    create_cap_mesh(&triangulation, &base, Vector3::new(0.0, 0.0, -1.0), true, &mut mesh);
    create_cap_mesh(&triangulation, &top, Vector3::new(0.0, 0.0, 1.0), false, &mut mesh);

    for ring in profile_rings(profile) {
        create_side_walls(&base[ring.clone()], &top[ring], &mut mesh);
    }

    if let Some(mat) = transform {
        apply_transform(&mut mesh, &mat);
    }

    Ok(mesh)
}

/// Build a closed prism between two matching rings
///
/// `base` and `top` are the 3D images of `triangulation.points`, so the
/// plan triangulation can be reused for both caps. `rings` are the index
/// ranges of the outer boundary and each hole (see [`profile_rings`]).
pub fn extrude_between(
    triangulation: &Triangulation,
    rings: &[Range<usize>],
    base: &[Point3<f64>],
    top: &[Point3<f64>],
) -> Result<Mesh> {
    let n = triangulation.points.len();
    if base.len() != n || top.len() != n {
        return Err(Error::InvalidExtrusion(format!(
            "ring sizes {}/{} do not match profile size {}",
            base.len(),
            top.len(),
            n
        )));
    }

    let up = ring_normal(top, base);
    let mut mesh = Mesh::with_capacity(n * 6, triangulation.indices.len() * 2 + n * 6);
    create_cap_mesh(triangulation, base, -up, true, &mut mesh);
    create_cap_mesh(triangulation, top, up, false, &mut mesh);
    for ring in rings {
        create_side_walls(&base[ring.clone()], &top[ring.clone()], &mut mesh);
    }

    Ok(mesh)
}

/// Index ranges of the outer ring and every hole ring
pub fn profile_rings(profile: &Profile2D) -> Vec<Range<usize>> {
    let mut rings = Vec::with_capacity(1 + profile.holes.len());
    let mut start = 0;
    rings.push(start..profile.outer.len());
    start += profile.outer.len();
    for hole in &profile.holes {
        rings.push(start..start + hole.len());
        start += hole.len();
    }
    rings
}

/// Average extrusion direction from base to top
fn ring_normal(top: &[Point3<f64>], base: &[Point3<f64>]) -> Vector3<f64> {
    let sum = top
        .iter()
        .zip(base)
        .fold(Vector3::zeros(), |acc, (t, b)| acc + (t - b));
    sum.try_normalize(1e-12).unwrap_or_else(Vector3::z)
}

/// Create a cap mesh from the plan triangulation
///
/// Triangulation indices are counter-clockwise in plan; the bottom cap
/// reverses them so it faces away from the top.
#[inline]
fn create_cap_mesh(
    triangulation: &Triangulation,
    ring: &[Point3<f64>],
    normal: Vector3<f64>,
    reverse: bool,
    mesh: &mut Mesh,
) {
    let base_index = mesh.vertex_count() as u32;

    for point in ring {
        mesh.add_vertex(*point, normal);
    }

    for tri in triangulation.indices.chunks_exact(3) {
        let i0 = base_index + tri[0] as u32;
        let i1 = base_index + tri[1] as u32;
        let i2 = base_index + tri[2] as u32;

        if reverse {
            mesh.add_triangle(i0, i2, i1);
        } else {
            mesh.add_triangle(i0, i1, i2);
        }
    }
}

/// Create side walls between matching base and top rings
#[inline]
fn create_side_walls(base: &[Point3<f64>], top: &[Point3<f64>], mesh: &mut Mesh) {
    let n = base.len();

    for i in 0..n {
        let j = (i + 1) % n;

        let edge = base[j] - base[i];
        let rise = top[i] - base[i];
        // Skip degenerate edge (duplicate points in profile)
        let normal = match edge.cross(&rise).try_normalize(1e-12) {
            Some(n) => n,
            None => continue,
        };

        let idx = mesh.vertex_count() as u32;
        mesh.add_vertex(base[i], normal);
        mesh.add_vertex(base[j], normal);
        mesh.add_vertex(top[j], normal);
        mesh.add_vertex(top[i], normal);

        mesh.add_triangle(idx, idx + 1, idx + 2);
        mesh.add_triangle(idx, idx + 2, idx + 3);
    }
}

/// Apply transformation matrix to mesh
///
/// Normals use the inverse transpose. Mirroring transforms (negative
/// determinant) also reverse the triangle winding so faces stay outward.
#[inline]
pub fn apply_transform(mesh: &mut Mesh, transform: &Matrix4<f64>) {
    mesh.positions.chunks_exact_mut(3).for_each(|chunk| {
        let point = Point3::new(chunk[0], chunk[1], chunk[2]);
        let transformed = transform.transform_point(&point);
        chunk[0] = transformed.x;
        chunk[1] = transformed.y;
        chunk[2] = transformed.z;
    });

    let normal_matrix = transform.try_inverse().unwrap_or(*transform).transpose();

    mesh.normals.chunks_exact_mut(3).for_each(|chunk| {
        let normal = Vector3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
        let transformed = (normal_matrix * normal.to_homogeneous())
            .xyz()
            .try_normalize(1e-12)
            .unwrap_or(normal);
        chunk[0] = transformed.x as f32;
        chunk[1] = transformed.y as f32;
        chunk[2] = transformed.z as f32;
    });

    if transform.fixed_view::<3, 3>(0, 0).determinant() < 0.0 {
        for tri in mesh.indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
    }
}
