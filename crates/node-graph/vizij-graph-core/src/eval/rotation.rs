//! Rotation and transform math backed by nalgebra.
//!
//! Quaternions travel through the graph as `[x, y, z, w]` vectors and matrices as 16
//! column-major components. Euler angles are radians, applied about fixed axes in the
//! sequence given by the rotate order.

use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, UnitQuaternion, Vector3};
use vizij_expr_core::RotateOrder;

fn axis(index: usize) -> Unit<Vector3<f64>> {
    match index {
        0 => Vector3::x_axis(),
        1 => Vector3::y_axis(),
        _ => Vector3::z_axis(),
    }
}

pub fn euler_to_quat(angles: [f64; 3], order: RotateOrder) -> UnitQuaternion<f64> {
    let [first, second, third] = order.axes();
    let about = |i: usize| UnitQuaternion::from_axis_angle(&axis(i), angles[i]);
    about(third) * about(second) * about(first)
}

pub fn quat_to_vec(q: &UnitQuaternion<f64>) -> Vec<f64> {
    vec![q.i, q.j, q.k, q.w]
}

/// Normalised quaternion from `[x, y, z, w]`; `None` for the zero quaternion.
pub fn vec_to_quat(v: &[f64]) -> Option<UnitQuaternion<f64>> {
    match v {
        [x, y, z, w] => {
            let q = Quaternion::new(*w, *x, *y, *z);
            (q.norm() > f64::EPSILON).then(|| UnitQuaternion::new_normalize(q))
        }
        _ => None,
    }
}

pub fn axis_angle(axis: &[f64], angle: f64) -> Option<UnitQuaternion<f64>> {
    match axis {
        [x, y, z] => Unit::try_new(Vector3::new(*x, *y, *z), f64::EPSILON)
            .map(|unit| UnitQuaternion::from_axis_angle(&unit, angle)),
        _ => None,
    }
}

/// Rotation from either a quaternion (4 components) or XYZ Euler angles (3 components).
pub fn rotation_from(v: &[f64]) -> Option<UnitQuaternion<f64>> {
    match v {
        [x, y, z] => Some(euler_to_quat([*x, *y, *z], RotateOrder::Xyz)),
        _ => vec_to_quat(v),
    }
}

/// Spherical interpolation. Opposite rotations have no unique path; the nearer
/// endpoint is returned instead.
pub fn slerp(a: &UnitQuaternion<f64>, b: &UnitQuaternion<f64>, t: f64) -> UnitQuaternion<f64> {
    a.try_slerp(b, t, 1.0e-9)
        .unwrap_or(if t < 0.5 { *a } else { *b })
}

/// Translate * rotate * scale.
pub fn trs_matrix(translate: [f64; 3], rotate: &UnitQuaternion<f64>, scale: [f64; 3]) -> Matrix4<f64> {
    Matrix4::new_translation(&Vector3::from(translate))
        * rotate.to_homogeneous()
        * Matrix4::new_nonuniform_scaling(&Vector3::from(scale))
}

/// 4x4 matrix from 16 column-major components, or a 3x3 rotation/scale block from 9.
pub fn matrix_from(components: &[f64]) -> Option<Matrix4<f64>> {
    match components.len() {
        16 => Some(Matrix4::from_column_slice(components)),
        9 => Some(Matrix3::from_column_slice(components).to_homogeneous()),
        _ => None,
    }
}

pub fn matrix_to_vec(m: &Matrix4<f64>) -> Vec<f64> {
    m.as_slice().to_vec()
}
