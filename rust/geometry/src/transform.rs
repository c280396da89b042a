// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rotation and placement transforms
//!
//! All rotations are built from Rodrigues' formula so right angles can be
//! fed exact sine/cosine values and produce exact matrices.

use dxf_lite_core::BlockInsert;
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

/// Tolerance for recognizing multiples of 90 degrees
pub const RIGHT_ANGLE_EPSILON: f64 = 1e-9;

/// Cosine and sine of an angle in degrees, exact for multiples of 90°
#[inline]
pub fn cos_sin_deg(degrees: f64) -> (f64, f64) {
    let normalized = degrees.rem_euclid(360.0);
    let quarter = (normalized / 90.0).round();
    if (normalized - quarter * 90.0).abs() < RIGHT_ANGLE_EPSILON {
        match quarter as i64 % 4 {
            0 => return (1.0, 0.0),
            1 => return (0.0, 1.0),
            2 => return (-1.0, 0.0),
            _ => return (0.0, -1.0),
        }
    }
    let radians = normalized.to_radians();
    (radians.cos(), radians.sin())
}

/// Rodrigues rotation matrix `I + sinθ·K + (1 − cosθ)·K²` about a unit axis
#[inline]
pub fn rodrigues(axis: &Vector3<f64>, cos: f64, sin: f64) -> Matrix3<f64> {
    let k = axis.cross_matrix();
    Matrix3::identity() + k * sin + k * k * (1.0 - cos)
}

/// Rotation by `degrees` about a unit axis through the origin
#[inline]
pub fn axis_rotation(axis: &Vector3<f64>, degrees: f64) -> Matrix4<f64> {
    let (cos, sin) = cos_sin_deg(degrees);
    rodrigues(axis, cos, sin).to_homogeneous()
}

/// Rotation by `degrees` about the line through `point` along `axis`
pub fn rotation_about_line(point: &Point3<f64>, axis: &Vector3<f64>, degrees: f64) -> Matrix4<f64> {
    Matrix4::new_translation(&point.coords)
        * axis_rotation(axis, degrees)
        * Matrix4::new_translation(&-point.coords)
}

/// Rotation about X then Y applied to an already Z-rotated frame
///
/// Composition order is Z, Y, X: the returned matrix is `Rx · Ry`, so a
/// point is rotated about Y first and X last.
#[inline]
pub fn rotation_yx(rotate_x: f64, rotate_y: f64) -> Matrix4<f64> {
    axis_rotation(&Vector3::x(), rotate_x) * axis_rotation(&Vector3::y(), rotate_y)
}

/// Element-level X/Y rotation about a pivot point
pub fn pivot_rotation(pivot: &Point3<f64>, rotate_x: f64, rotate_y: f64) -> Matrix4<f64> {
    Matrix4::new_translation(&pivot.coords)
        * rotation_yx(rotate_x, rotate_y)
        * Matrix4::new_translation(&-pivot.coords)
}

/// Placement of a block instance
///
/// Fixed order: scale at the origin, self-rotation about Z at the origin,
/// `rotate_y` then `rotate_x` about the insertion point, translation to the
/// insertion point lifted by `z_offset`.
pub fn block_instance_matrix(
    insert: &BlockInsert,
    rotate_x: f64,
    rotate_y: f64,
    z_offset: f64,
) -> Matrix4<f64> {
    let scale = Matrix4::new_nonuniform_scaling(&Vector3::new(
        insert.scale[0],
        insert.scale[1],
        insert.scale[2],
    ));
    let rotate_z = axis_rotation(&Vector3::z(), insert.rotation);
    let translate = Matrix4::new_translation(&Vector3::new(
        insert.position[0],
        insert.position[1],
        insert.position[2] + z_offset,
    ));

    translate * rotation_yx(rotate_x, rotate_y) * rotate_z * scale
}

/// Placement of a fixture: scale, Z rotation, translation (no X/Y rotation)
pub fn fixture_matrix(insert: &BlockInsert, z_offset: f64) -> Matrix4<f64> {
    block_instance_matrix(insert, 0.0, 0.0, z_offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_right_angles() {
        assert_eq!(cos_sin_deg(90.0), (0.0, 1.0));
        assert_eq!(cos_sin_deg(180.0), (-1.0, 0.0));
        assert_eq!(cos_sin_deg(-90.0), (0.0, -1.0));
        assert_eq!(cos_sin_deg(450.0), (0.0, 1.0));
        let (c, s) = cos_sin_deg(89.999);
        assert!(c > 0.0 && c < 1e-4);
        assert!(s < 1.0);
    }

    #[test]
    fn test_rodrigues_matches_nalgebra() {
        let axis = Vector3::new(1.0, 2.0, 3.0).normalize();
        let angle: f64 = 37.0;
        let ours = rodrigues(&axis, angle.to_radians().cos(), angle.to_radians().sin());
        let theirs = nalgebra::Rotation3::from_axis_angle(
            &nalgebra::Unit::new_normalize(axis),
            angle.to_radians(),
        );
        assert_relative_eq!(ours, *theirs.matrix(), epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_about_line() {
        let m = rotation_about_line(&Point3::new(1.0, 0.0, 0.0), &Vector3::z(), 90.0);
        let p = m.transform_point(&Point3::new(2.0, 0.0, 0.0));
        assert_eq!(p, Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_block_order_scale_then_rotate_then_translate() {
        let mut insert = BlockInsert::new("B", [10.0, 5.0, 0.0]);
        insert.scale = [2.0, 1.0, 1.0];
        insert.rotation = 90.0;

        let m = block_instance_matrix(&insert, 0.0, 0.0, 0.0);
        // (1,0,0) scaled to (2,0,0), rotated to (0,2,0), moved to (10,7,0)
        let p = m.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(10.0, 7.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_block_rotate_x_pivots_on_insertion_point() {
        let insert = BlockInsert::new("B", [6.0, 0.0, 0.0]);
        let m = block_instance_matrix(&insert, 90.0, 0.0, 1.5);

        // Insertion point itself does not move (apart from the Z lift)
        let origin = m.transform_point(&Point3::origin());
        assert_relative_eq!(origin, Point3::new(6.0, 0.0, 1.5), epsilon = 1e-12);

        // Local +Y stands up along +Z
        let p = m.transform_point(&Point3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(p, Point3::new(6.0, 0.0, 2.5), epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_order_y_before_x() {
        // Point on +Z: Ry(90) sends it to +X, then Rx(90) leaves +X alone
        let m = rotation_yx(90.0, 90.0);
        let p = m.transform_point(&Point3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(p, Point3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_fixture_matrix_ignores_xy_rotation() {
        let mut insert = BlockInsert::new("door90_TOV", [3.0, 0.0, 0.0]);
        insert.rotation = 180.0;
        let m = fixture_matrix(&insert, 0.0);
        let p = m.transform_point(&Point3::new(1.0, 0.0, 2.0));
        assert_relative_eq!(p, Point3::new(2.0, 0.0, 2.0), epsilon = 1e-12);
    }
}
