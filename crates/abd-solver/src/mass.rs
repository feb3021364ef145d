//! Mass operator.
//!
//! Volume integrals of `1, x, y, z, x², y², z², xy, yz, zx` over the solid
//! bounded by a triangle mesh, computed with the divergence theorem per
//! triangle (Eberly, "Polyhedral Mass Properties").
//!
//! With `x = J(X)·q` the kinetic energy is `½ q̇ᵀ M q̇` where
//! `M = ρ ∫ JᵀJ dV`. The three rows of `J` share the same `[X, 1]`
//! pattern, so `M` is three copies of the 4×4 block
//!
//! ```text
//! ρ · | ∫xx ∫xy ∫xz ∫x |
//!     | ∫xy ∫yy ∫yz ∫y |
//!     | ∫xz ∫yz ∫zz ∫z |
//!     | ∫x  ∫y  ∫z  V  |
//! ```

use std::ops::Add;

use abd_math::reduce::pairwise_sum;
use abd_math::{DMat3, DVec3, Mat12};
use abd_mesh::TriangleMesh;
use abd_types::AbdResult;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Unscaled per-triangle integral terms.
#[derive(Debug, Clone, Copy, Default)]
struct Moments([f64; 10]);

impl Add for Moments {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let mut out = self.0;
        for (o, r) in out.iter_mut().zip(rhs.0) {
            *o += r;
        }
        Moments(out)
    }
}

const SCALE: [f64; 10] = [
    1.0 / 6.0,
    1.0 / 24.0,
    1.0 / 24.0,
    1.0 / 24.0,
    1.0 / 60.0,
    1.0 / 60.0,
    1.0 / 60.0,
    1.0 / 120.0,
    1.0 / 120.0,
    1.0 / 120.0,
];

/// Per-axis polynomial subexpressions of one triangle.
struct Sub {
    f1: f64,
    f2: f64,
    f3: f64,
    g: [f64; 3],
}

fn subexpressions(w0: f64, w1: f64, w2: f64) -> Sub {
    let t0 = w0 + w1;
    let f1 = t0 + w2;
    let t1 = w0 * w0;
    let t2 = t1 + w1 * t0;
    let f2 = t2 + w2 * f1;
    let f3 = w0 * t1 + w1 * t2 + w2 * f2;
    Sub {
        f1,
        f2,
        f3,
        g: [f2 + w0 * (f1 + w0), f2 + w1 * (f1 + w1), f2 + w2 * (f1 + w2)],
    }
}

fn triangle_moments([p0, p1, p2]: [DVec3; 3]) -> Moments {
    let d = (p1 - p0).cross(p2 - p0);
    let sx = subexpressions(p0.x, p1.x, p2.x);
    let sy = subexpressions(p0.y, p1.y, p2.y);
    let sz = subexpressions(p0.z, p1.z, p2.z);

    Moments([
        d.x * sx.f1,
        d.x * sx.f2,
        d.y * sy.f2,
        d.z * sz.f2,
        d.x * sx.f3,
        d.y * sy.f3,
        d.z * sz.f3,
        d.x * (p0.y * sx.g[0] + p1.y * sx.g[1] + p2.y * sx.g[2]),
        d.y * (p0.z * sy.g[0] + p1.z * sy.g[1] + p2.z * sy.g[2]),
        d.z * (p0.x * sz.g[0] + p1.x * sz.g[1] + p2.x * sz.g[2]),
    ])
}

/// Unit-density volume moments of a closed mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassProperties {
    /// `∫ 1 dV`.
    pub volume: f64,
    /// `(∫x, ∫y, ∫z)`.
    pub first: DVec3,
    /// Symmetric matrix of `∫ X Xᵀ dV`.
    pub second: DMat3,
}

impl MassProperties {
    /// Integrates over the solid bounded by `mesh`.
    ///
    /// Triangles are processed in parallel and reduced pairwise in index
    /// order, so the result does not depend on scheduling. An inverted or
    /// open mesh yields a non-positive or meaningless volume; the caller
    /// decides whether that is acceptable.
    pub fn integrate(mesh: &TriangleMesh) -> AbdResult<Self> {
        mesh.validate()?;
        let per_triangle: Vec<Moments> = (0..mesh.triangle_count())
            .into_par_iter()
            .map(|t| triangle_moments(mesh.triangle_positions(t)))
            .collect();
        let mut m = pairwise_sum(&per_triangle, Moments::default()).0;
        for (v, s) in m.iter_mut().zip(SCALE) {
            *v *= s;
        }

        let [volume, x, y, z, xx, yy, zz, xy, yz, zx] = m;
        Ok(Self {
            volume,
            first: DVec3::new(x, y, z),
            second: DMat3::from_cols(
                DVec3::new(xx, xy, zx),
                DVec3::new(xy, yy, yz),
                DVec3::new(zx, yz, zz),
            ),
        })
    }

    /// Total mass at the given density.
    pub fn mass(&self, density: f64) -> f64 {
        density * self.volume
    }

    /// Center of mass in the local frame.
    pub fn center_of_mass(&self) -> DVec3 {
        if self.volume.abs() > 0.0 {
            self.first / self.volume
        } else {
            DVec3::ZERO
        }
    }

    /// The 12×12 generalized mass block at the given density.
    pub fn mass_matrix(&self, density: f64) -> Mat12 {
        let s = self.second;
        let f = self.first;
        let block = [
            [s.x_axis.x, s.y_axis.x, s.z_axis.x, f.x],
            [s.x_axis.y, s.y_axis.y, s.z_axis.y, f.y],
            [s.x_axis.z, s.y_axis.z, s.z_axis.z, f.z],
            [f.x, f.y, f.z, self.volume],
        ];
        let mut m = Mat12::zeros();
        for axis in 0..3 {
            let o = 4 * axis;
            for r in 0..4 {
                for c in 0..4 {
                    m[(o + r, o + c)] = density * block[r][c];
                }
            }
        }
        m
    }
}
