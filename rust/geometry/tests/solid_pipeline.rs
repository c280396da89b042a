// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outline -> profile -> solid -> booleans, across modules.

use approx::assert_relative_eq;
use dxf_lite_core::{ControlPoint, PolylineVertex};
use dxf_lite_geometry::{
    box_mesh, construct, plan_area, polyline_points, ClippingProcessor, ControlSurface,
    ExtrusionStrategy, Point2, Point3, Profile2D,
};

const AREA_EPSILON: f64 = 1e-12;

/// 4 x 2 rectangle with a semicircular bulge on its top edge
fn rounded_outline(segments: usize) -> Vec<Point2<f64>> {
    polyline_points(
        &[
            PolylineVertex::new(0.0, 0.0, 0.0),
            PolylineVertex::new(4.0, 0.0, 0.0),
            PolylineVertex::new(4.0, 2.0, 1.0),
            PolylineVertex::new(0.0, 2.0, 0.0),
        ],
        true,
        segments,
    )
}

#[test]
fn test_bulge_outline_extrudes_to_expected_volume() {
    let points = rounded_outline(64);
    let profile = Profile2D::from_points(&points, AREA_EPSILON).unwrap();

    // Rectangle plus half a disc of radius 2, slightly under for the polygon
    let exact = 8.0 + std::f64::consts::PI * 2.0;
    assert!(profile.area() < exact);
    assert_relative_eq!(profile.area(), exact, epsilon = 1e-2);

    let mesh = construct(&profile, ExtrusionStrategy::Orthogonal, 0.5, 3.0, AREA_EPSILON).unwrap();
    assert_relative_eq!(mesh.signed_volume(), profile.area() * 3.0, epsilon = 1e-9);
    assert_relative_eq!(plan_area(&mesh), profile.area(), epsilon = 1e-9);

    let bounds = mesh.bounds().unwrap();
    assert_relative_eq!(bounds.min.z, 0.5);
    assert_relative_eq!(bounds.max.y, 4.0, epsilon = 1e-9);
}

#[test]
fn test_booleans_keep_outward_winding() {
    let profile = Profile2D::from_points(&rounded_outline(32), AREA_EPSILON).unwrap();
    let solid = construct(&profile, ExtrusionStrategy::Orthogonal, 0.0, 3.0, AREA_EPSILON).unwrap();
    let clipper = ClippingProcessor::new();

    let drilled = clipper
        .subtract_mesh(
            &solid,
            &box_mesh(Point3::new(1.0, 0.5, -1.0), Point3::new(2.0, 1.5, 4.0)),
        )
        .unwrap();
    assert!(drilled.signed_volume() > 0.0);
    assert_relative_eq!(
        drilled.signed_volume(),
        solid.signed_volume() - 3.0,
        epsilon = 1e-6
    );
    assert_relative_eq!(plan_area(&drilled), profile.area() - 1.0, epsilon = 1e-6);

    let trimmed = clipper.clip_above(&drilled, 2.0).unwrap();
    assert!(trimmed.signed_volume() > 0.0);
    assert_eq!(trimmed.bounds().unwrap().max.z, 2.0);
    assert_relative_eq!(
        trimmed.signed_volume(),
        (profile.area() - 1.0) * 2.0,
        epsilon = 1e-6
    );
}

#[test]
fn test_spatial_slab_follows_control_points() {
    let surface = ControlSurface::new(vec![
        ControlPoint::new(0.0, 0.0, 0.0),
        ControlPoint::new(10.0, 0.0, 0.0),
        ControlPoint::new(10.0, 10.0, 2.0),
        ControlPoint::new(0.0, 10.0, 2.0),
    ]);
    let profile = Profile2D::from_points(
        &[
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ],
        AREA_EPSILON,
    )
    .unwrap();

    let slab = construct(
        &profile,
        ExtrusionStrategy::Spatial(&surface),
        3.0,
        0.25,
        AREA_EPSILON,
    )
    .unwrap();

    let bounds = slab.bounds().unwrap();
    assert_relative_eq!(bounds.min.z, 3.0, epsilon = 1e-12);
    assert_relative_eq!(bounds.max.z, 5.25, epsilon = 1e-12);
    // Every base vertex moved up by the same height
    assert_relative_eq!(slab.signed_volume(), 100.0 * 0.25, epsilon = 1e-9);
}
