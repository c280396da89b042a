// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! DXF-Lite Geometry Processing
//!
//! Turns annotated plan outlines into closed solids: bulge-arc profiles,
//! earcutr triangulation, orthogonal / inclined / spatial extrusion,
//! nalgebra transforms and csgrs booleans.

pub mod construction;
pub mod csg;
pub mod error;
pub mod extrusion;
pub mod footprint;
pub mod mesh;
pub mod profile;
pub mod solid;
pub mod spatial;
pub mod transform;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point2, Point3, Vector2, Vector3};

pub use construction::{construct, element_rotation, AngleClass, ExtrusionStrategy};
pub use csg::{box_mesh, ClippingProcessor, Plane};
pub use error::{Error, Result};
pub use extrusion::{apply_transform, extrude_profile};
pub use footprint::plan_area;
pub use mesh::{Aabb, Mesh};
pub use profile::{circle_points, circle_segments, polyline_points, Profile2D};
pub use solid::{Elevation, Quantities, Role, Solid, SolidId};
pub use spatial::ControlSurface;
pub use transform::{block_instance_matrix, fixture_matrix};
pub use triangulation::triangulate_polygon;
