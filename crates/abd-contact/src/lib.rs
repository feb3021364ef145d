//! # abd-contact
//!
//! Contact detection and penalty contact energy between affine bodies.
//!
//! The contact stage is split into three parts:
//! 1. **Proximity query**: an injectable [`ProximityQuery`] answering
//!    "closest point, face normal, distance, inside/outside" for a point
//!    against a mesh in the mesh's local frame
//! 2. **Enumeration**: [`ContactDetector`] queries every vertex of every
//!    body against every other body and keeps valid penetrations
//! 3. **Penalty model**: [`PenaltyContact`] turns each contact into an
//!    energy `k·d²` with gradient and four 12×12 Hessian blocks

pub mod contact;
pub mod detector;
pub mod geometry;
pub mod penalty;
pub mod query;

pub use contact::Contact;
pub use detector::{ContactDetector, ContactSet, ContactStats};
pub use penalty::{ContactEvaluation, PenaltyContact};
pub use query::{BruteForceQuery, ProximityHit, ProximityQuery};
