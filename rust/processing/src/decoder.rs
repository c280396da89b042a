// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity decoding: outline points plus typed metadata

use dxf_lite_core::{Entity, EntityGeometry, Metadata};
use dxf_lite_geometry::{circle_points, circle_segments, polyline_points, Point2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Polyline,
    Circle,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Polyline => "polyline",
            EntityKind::Circle => "circle",
        }
    }
}

/// An outline entity ready for solid construction
#[derive(Debug, Clone)]
pub struct DecodedEntity {
    pub points: Vec<Point2<f64>>,
    pub metadata: Metadata,
    pub layer: String,
    pub kind: EntityKind,
    pub handle: Option<String>,
}

impl DecodedEntity {
    /// Same entity on another layer (block sub-entities on layer `0`)
    pub fn on_layer(self, layer: &str) -> Self {
        Self {
            layer: layer.to_string(),
            ..self
        }
    }
}

/// Decode an outline entity; block instances return `None`
///
/// Bulge arcs are discretized with `arc_segments` segments each; circles
/// get `max(32, 2 · arc_segments)` points.
pub fn decode(entity: &Entity, arc_segments: usize) -> Option<DecodedEntity> {
    let (points, kind) = match &entity.geometry {
        EntityGeometry::Polyline { closed, vertices } => (
            polyline_points(vertices, *closed, arc_segments),
            EntityKind::Polyline,
        ),
        EntityGeometry::Circle { center, radius } => (
            circle_points(
                Point2::new(center[0], center[1]),
                *radius,
                circle_segments(arc_segments),
            ),
            EntityKind::Circle,
        ),
        EntityGeometry::Insert(_) => return None,
    };

    Some(DecodedEntity {
        points,
        metadata: entity.metadata().clone(),
        layer: entity.layer.clone(),
        kind,
        handle: entity.handle.clone(),
    })
}
