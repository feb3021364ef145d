//! # abd-types
//!
//! Shared types, identifiers, error types, and physical constants
//! for the affine body dynamics (ABD) simulator.
//!
//! This crate has no domain logic. It defines the vocabulary
//! that all other `abd-*` crates share.

pub mod constants;
pub mod error;
pub mod ids;
pub mod scalar;

pub use error::{AbdError, AbdResult};
pub use ids::BodyId;
pub use scalar::Scalar;
