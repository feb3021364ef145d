//! The affine kinematic map.
//!
//! A body's pose is `q = [F | t]` flattened row-major:
//!
//! ```text
//! q = [F00, F01, F02, t0, F10, F11, F12, t1, F20, F21, F22, t2]
//! ```
//!
//! A local point `X` maps to `x = F·X + t = J(X)·q`, with
//!
//! ```text
//! J(X) = [X0 X1 X2 1  0  0  0  0  0  0  0  0]
//!        [0  0  0  0  X0 X1 X2 1  0  0  0  0]
//!        [0  0  0  0  0  0  0  0  X0 X1 X2 1]
//! ```

use glam::{DMat3, DVec3};

use crate::linalg::{Mat3x12, Vec12};

/// Kinematic Jacobian `J(X)` such that `world = J(X) · q`.
pub fn kinematic_jacobian(x: DVec3) -> Mat3x12 {
    let mut j = Mat3x12::zeros();
    for row in 0..3 {
        let base = 4 * row;
        j[(row, base)] = x.x;
        j[(row, base + 1)] = x.y;
        j[(row, base + 2)] = x.z;
        j[(row, base + 3)] = 1.0;
    }
    j
}

/// `J(X)ᵀ · v` without materializing the Jacobian.
#[inline]
pub fn jacobian_transpose_mul(x: DVec3, v: DVec3) -> Vec12 {
    #[rustfmt::skip]
    let rows = [
        v.x * x.x, v.x * x.y, v.x * x.z, v.x,
        v.y * x.x, v.y * x.y, v.y * x.z, v.y,
        v.z * x.x, v.z * x.y, v.z * x.z, v.z,
    ];
    Vec12::from_column_slice(&rows)
}

/// World position of local point `x` under pose `q`.
#[inline]
pub fn world_position(q: &Vec12, x: DVec3) -> DVec3 {
    DVec3::new(
        q[0] * x.x + q[1] * x.y + q[2] * x.z + q[3],
        q[4] * x.x + q[5] * x.y + q[6] * x.z + q[7],
        q[8] * x.x + q[9] * x.y + q[10] * x.z + q[11],
    )
}

/// The linear part `F` of a pose.
pub fn linear_part(q: &Vec12) -> DMat3 {
    // glam is column-major; q stores F row-major.
    DMat3::from_cols(
        DVec3::new(q[0], q[4], q[8]),
        DVec3::new(q[1], q[5], q[9]),
        DVec3::new(q[2], q[6], q[10]),
    )
}

/// The translation part `t` of a pose.
pub fn translation(q: &Vec12) -> DVec3 {
    DVec3::new(q[3], q[7], q[11])
}

/// Packs a linear part and translation into a pose vector.
pub fn compose(f: DMat3, t: DVec3) -> Vec12 {
    #[rustfmt::skip]
    let rows = [
        f.x_axis.x, f.y_axis.x, f.z_axis.x, t.x,
        f.x_axis.y, f.y_axis.y, f.z_axis.y, t.y,
        f.x_axis.z, f.y_axis.z, f.z_axis.z, t.z,
    ];
    Vec12::from_column_slice(&rows)
}

/// The rest pose translated to `t`.
pub fn from_translation(t: DVec3) -> Vec12 {
    compose(DMat3::IDENTITY, t)
}

/// Pose from the top three rows of a row-major 4×4 homogeneous transform.
pub fn from_rows(rows: &[[f64; 4]; 3]) -> Vec12 {
    let mut q = Vec12::zeros();
    for (r, row) in rows.iter().enumerate() {
        for (c, &v) in row.iter().enumerate() {
            q[4 * r + c] = v;
        }
    }
    q
}

/// Applies `q` to every point in a slice.
pub fn transform_points(q: &Vec12, points: &[DVec3]) -> Vec<DVec3> {
    points.iter().map(|&p| world_position(q, p)).collect()
}
