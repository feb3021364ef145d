//! Error types for the ABD simulator.
//!
//! All crates return `AbdResult<T>` from fallible operations. Numerical
//! non-convergence is not an error: solvers report it in their result
//! structs and the step always advances.

use thiserror::Error;

/// Unified error type for the ABD simulator.
#[derive(Debug, Error)]
pub enum AbdError {
    /// Mesh data is malformed or inconsistent.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A body record is missing data or carries out-of-range values.
    #[error("Invalid body {body}: {reason}")]
    InvalidBody {
        body: u32,
        reason: String,
    },

    /// The requested geometry type has no simulation model.
    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometry(String),

    /// Vector or matrix dimensions do not agree.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    Dimension {
        expected: usize,
        actual: usize,
    },

    /// A linear solver backend failed (e.g. a non-SPD factorization).
    #[error("Linear solve failed: {0}")]
    LinearSolve(String),

    /// An operation required `setup()` to have run first.
    #[error("Simulator not initialized: {0}")]
    NotInitialized(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for `Result<T, AbdError>`.
pub type AbdResult<T> = Result<T, AbdError>;
