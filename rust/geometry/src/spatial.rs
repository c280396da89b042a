// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Non-planar base surfaces interpolated from control points

use dxf_lite_core::ControlPoint;
use nalgebra::Point2;

/// Distance below which a control point is taken as an exact match
pub const EXACT_MATCH_DISTANCE: f64 = 1e-6;

/// Control points differing in Z by less than this count as flat
const FLAT_TOLERANCE: f64 = 1e-9;

/// Terrain-like surface defined by scattered `(x, y, z)` samples
#[derive(Debug, Clone, Default)]
pub struct ControlSurface {
    points: Vec<ControlPoint>,
}

impl ControlSurface {
    pub fn new(points: Vec<ControlPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when the surface carries no height variation
    ///
    /// An empty set is flat; so is any set whose Z values all agree.
    pub fn is_flat(&self) -> bool {
        let mut zs = self.points.iter().map(|p| p.z);
        match zs.next() {
            None => true,
            Some(first) => zs.all(|z| (z - first).abs() < FLAT_TOLERANCE),
        }
    }

    /// Inverse-distance-weighted height at a plan position
    ///
    /// Weight is `1/d²`. A control point closer than
    /// [`EXACT_MATCH_DISTANCE`] returns its own Z unchanged.
    pub fn height_at(&self, at: &Point2<f64>) -> f64 {
        let mut weighted = 0.0;
        let mut total = 0.0;

        for cp in &self.points {
            let dx = at.x - cp.x;
            let dy = at.y - cp.y;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance < EXACT_MATCH_DISTANCE {
                return cp.z;
            }
            let weight = 1.0 / (distance * distance);
            weighted += weight * cp.z;
            total += weight;
        }

        if total > 0.0 {
            weighted / total
        } else {
            0.0
        }
    }
}
