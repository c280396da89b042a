// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plan footprints of finished meshes
//!
//! Projects every triangle onto XY and unions them with i_overlay, so a
//! full-height opening cut through a wall shows up as a hole in the plan
//! area.

use crate::mesh::Mesh;
use crate::profile::signed_area;
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::Point2;

/// Projected triangles with less doubled area than this are dropped
const MIN_PROJECTED_AREA: f64 = 1e-12;

/// Plan contours of a mesh: union of its XY-projected triangles
///
/// Each inner vector is one shape: its outer contour first, holes after.
pub fn plan_shapes(mesh: &Mesh) -> Vec<Vec<Vec<Point2<f64>>>> {
    let mut paths: Vec<Vec<[f64; 2]>> = mesh
        .triangles()
        .filter_map(|[a, b, c]| {
            let doubled = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
            if doubled.abs() < MIN_PROJECTED_AREA {
                None
            } else if doubled > 0.0 {
                Some(vec![[a.x, a.y], [b.x, b.y], [c.x, c.y]])
            } else {
                Some(vec![[a.x, a.y], [c.x, c.y], [b.x, b.y]])
            }
        })
        .collect();

    if paths.is_empty() {
        return Vec::new();
    }

    let clip = paths.split_off(1);
    let result = paths.overlay(&clip, OverlayRule::Union, FillRule::NonZero);

    result
        .into_iter()
        .map(|shape| {
            shape
                .into_iter()
                .map(|contour| contour.into_iter().map(|p| Point2::new(p[0], p[1])).collect())
                .filter(|c: &Vec<Point2<f64>>| c.len() >= 3)
                .collect()
        })
        .filter(|shape: &Vec<Vec<Point2<f64>>>| !shape.is_empty())
        .collect()
}

/// Plan area of a mesh (outer contours minus holes)
pub fn plan_area(mesh: &Mesh) -> f64 {
    plan_shapes(mesh)
        .iter()
        .map(|shape| {
            let mut contours = shape.iter();
            let outer = contours.next().map(|c| signed_area(c).abs()).unwrap_or(0.0);
            let holes: f64 = contours.map(|c| signed_area(c).abs()).sum();
            outer - holes
        })
        .sum()
}
