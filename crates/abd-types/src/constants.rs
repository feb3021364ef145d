//! Physical constants and simulation defaults.

/// Gravitational acceleration (m/s²).
pub const GRAVITY: f64 = 9.8;

/// Default simulation timestep (seconds).
pub const DEFAULT_DT: f64 = 0.01;

/// Number of generalized coordinates per affine body (3×4 transform).
pub const DOFS_PER_BODY: usize = 12;

/// Default penalty contact stiffness.
pub const DEFAULT_CONTACT_STIFFNESS: f64 = 1.0e4;

/// Default penetration depth above which a proximity result is discarded.
pub const DEFAULT_CONTACT_THRESHOLD: f64 = 1.0e-2;

/// Default maximum distance handed to the proximity query service.
pub const DEFAULT_QUERY_DISTANCE: f64 = 0.2;

/// Default capacity of the per-step contact buffer.
pub const DEFAULT_MAX_CONTACTS: usize = 4096;

/// Default orthogonality (near-rigidity) stiffness.
pub const DEFAULT_ELASTIC_STIFFNESS: f64 = 1.0e8;

/// Default material density (kg/m³).
pub const DEFAULT_DENSITY: f64 = 1000.0;

/// Default maximum Newton iterations per timestep.
pub const DEFAULT_NEWTON_ITERATIONS: u32 = 10;

/// Default Newton convergence tolerance on the free-DOF gradient norm.
pub const DEFAULT_NEWTON_TOLERANCE: f64 = 1.0e-1;

/// Default relative tolerance of the conjugate gradient inner solve.
pub const DEFAULT_CG_TOLERANCE: f64 = 1.0e-5;

/// Default maximum conjugate gradient iterations per Newton step.
pub const DEFAULT_CG_ITERATIONS: u32 = 50;

/// Default number of backtracking line-search trials.
pub const DEFAULT_LINE_SEARCH_STEPS: u32 = 5;

/// Default energy-increase tolerance accepted by the line search.
pub const DEFAULT_LINE_SEARCH_TOLERANCE: f64 = 1.0e-1;

/// Epsilon for floating-point comparisons.
pub const EPSILON: f64 = 1.0e-12;

/// Area threshold below which a triangle counts as degenerate.
pub const DEGENERATE_AREA_THRESHOLD: f64 = 1.0e-14;
