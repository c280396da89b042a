// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solid construction strategies
//!
//! A plan profile becomes a closed mesh in one of three ways:
//!
//! - **Orthogonal**: straight prism along +Z.
//! - **Inclined**: the profile is tilted about its first edge. Right angles
//!   rotate the finished orthogonal prism; every other angle rotates and
//!   projects the outline onto the tilted plane and extrudes along its
//!   normal. The two paths are separate branches, not a limit of each other.
//! - **Spatial**: each outline vertex sits on a terrain interpolated from
//!   control points and is lifted vertically by the height.

use crate::csg::Plane;
use crate::error::{Error, Result};
use crate::extrusion::{apply_transform, extrude_between, extrude_profile, profile_rings};
use crate::mesh::Mesh;
use crate::profile::Profile2D;
use crate::spatial::ControlSurface;
use crate::transform::{cos_sin_deg, pivot_rotation, rodrigues, rotation_about_line, RIGHT_ANGLE_EPSILON};
use dxf_lite_core::Metadata;
use nalgebra::{Matrix4, Point3, Vector3};

/// First edges shorter than this cannot define a tilt axis
const MIN_AXIS_LENGTH: f64 = 1e-9;

/// How an incline angle is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleClass {
    /// Multiple of 360°: no tilt
    Flat,
    /// Exactly 90°, 180° or 270°: rotate the whole prism
    Right,
    /// Anything else: rotate, project and extrude along the tilted normal
    Oblique,
}

impl AngleClass {
    pub fn classify(degrees: f64) -> Self {
        let normalized = degrees.rem_euclid(360.0);
        if normalized < RIGHT_ANGLE_EPSILON || 360.0 - normalized < RIGHT_ANGLE_EPSILON {
            return AngleClass::Flat;
        }
        if [90.0, 180.0, 270.0]
            .iter()
            .any(|q| (normalized - q).abs() < RIGHT_ANGLE_EPSILON)
        {
            AngleClass::Right
        } else {
            AngleClass::Oblique
        }
    }
}

/// Extrusion strategy for one entity
#[derive(Debug, Clone, Copy)]
pub enum ExtrusionStrategy<'a> {
    Orthogonal,
    Inclined { angle: f64 },
    Spatial(&'a ControlSurface),
}

impl<'a> ExtrusionStrategy<'a> {
    /// Pick a strategy from metadata
    ///
    /// An incline always wins. `surface` is only offered by the caller when
    /// the entity's layer takes part in spatial extrusion; a flat surface
    /// falls back to orthogonal.
    pub fn select(metadata: &Metadata, surface: Option<&'a ControlSurface>) -> Self {
        if AngleClass::classify(metadata.incline_angle) != AngleClass::Flat {
            return ExtrusionStrategy::Inclined {
                angle: metadata.incline_angle,
            };
        }
        match surface {
            Some(surface) if !surface.is_flat() => ExtrusionStrategy::Spatial(surface),
            _ => ExtrusionStrategy::Orthogonal,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExtrusionStrategy::Orthogonal => "orthogonal",
            ExtrusionStrategy::Inclined { .. } => "inclined",
            ExtrusionStrategy::Spatial(_) => "spatial",
        }
    }
}

/// Build the closed, repaired mesh for a profile
pub fn construct(
    profile: &Profile2D,
    strategy: ExtrusionStrategy<'_>,
    base_z: f64,
    height: f64,
    area_epsilon: f64,
) -> Result<Mesh> {
    let mesh = match strategy {
        ExtrusionStrategy::Orthogonal => build_prism(profile, base_z, height)?,
        ExtrusionStrategy::Inclined { angle } => build_inclined(profile, base_z, height, angle)?,
        ExtrusionStrategy::Spatial(surface) => build_spatial(profile, base_z, height, surface)?,
    };

    let repaired = mesh.repair(area_epsilon);
    let dropped = mesh.triangle_count() - repaired.triangle_count();
    if dropped > 0 {
        tracing::debug!(
            strategy = strategy.name(),
            dropped,
            "Removed degenerate triangles"
        );
    }
    if repaired.is_empty() {
        return Err(Error::EmptyMesh(format!(
            "{} extrusion left no triangles",
            strategy.name()
        )));
    }
    Ok(repaired)
}

/// Straight prism from `base_z` to `base_z + height`
pub fn build_prism(profile: &Profile2D, base_z: f64, height: f64) -> Result<Mesh> {
    extrude_profile(
        profile,
        height,
        Some(Matrix4::new_translation(&Vector3::new(0.0, 0.0, base_z))),
    )
}

/// Prism tilted by `angle` degrees about the profile's first edge
pub fn build_inclined(profile: &Profile2D, base_z: f64, height: f64, angle: f64) -> Result<Mesh> {
    let (start, end) = profile.first_edge();
    let edge = end - start;
    let length = edge.norm();
    if length < MIN_AXIS_LENGTH {
        return Err(Error::DegenerateGeometry(
            "first edge has zero length, no tilt axis".to_string(),
        ));
    }
    let axis = Vector3::new(edge.x, edge.y, 0.0) / length;
    let pivot = Point3::new(start.x, start.y, base_z);

    match AngleClass::classify(angle) {
        AngleClass::Flat => build_prism(profile, base_z, height),
        AngleClass::Right => {
            let mut mesh = build_prism(profile, base_z, height)?;
            apply_transform(&mut mesh, &rotation_about_line(&pivot, &axis, angle));
            Ok(mesh)
        }
        AngleClass::Oblique => {
            let (cos, sin) = cos_sin_deg(angle);
            let rotation = rodrigues(&axis, cos, sin);
            let normal = rotation * Vector3::z();
            let plane = Plane::new(pivot, normal);

            let triangulation = profile.triangulate()?;
            let base: Vec<Point3<f64>> = triangulation
                .points
                .iter()
                .map(|p| {
                    let tilted = pivot + rotation * (Point3::new(p.x, p.y, base_z) - pivot);
                    plane.project(&tilted)
                })
                .collect();
            let top: Vec<Point3<f64>> = base.iter().map(|p| p + plane.normal * height).collect();

            extrude_between(&triangulation, &profile_rings(profile), &base, &top)
        }
    }
}

/// Prism whose base follows the control surface
pub fn build_spatial(
    profile: &Profile2D,
    base_z: f64,
    height: f64,
    surface: &ControlSurface,
) -> Result<Mesh> {
    if !(height > 0.0) {
        return Err(Error::InvalidExtrusion(
            "Depth must be positive".to_string(),
        ));
    }

    let triangulation = profile.triangulate()?;
    let base: Vec<Point3<f64>> = triangulation
        .points
        .iter()
        .map(|p| Point3::new(p.x, p.y, base_z + surface.height_at(p)))
        .collect();
    let top: Vec<Point3<f64>> = base
        .iter()
        .map(|p| p + Vector3::new(0.0, 0.0, height))
        .collect();

    extrude_between(&triangulation, &profile_rings(profile), &base, &top)
}

/// Element-level X/Y rotation about `pivot`, if the metadata asks for one
///
/// `rotate90` adds a quarter turn about X on top of `rotate_x`.
pub fn element_rotation(metadata: &Metadata, pivot: &Point3<f64>) -> Option<Matrix4<f64>> {
    if !metadata.has_rotation() {
        return None;
    }
    Some(pivot_rotation(
        pivot,
        metadata.effective_rotate_x(),
        metadata.rotate_y,
    ))
}
