//! Scalar type alias for the simulation.
//!
//! The implicit solve accumulates stiff elastic and contact terms scaled by
//! `dt²`, so the whole pipeline runs in double precision.

/// The floating-point type used throughout the simulation.
pub type Scalar = f64;
