//! # abd-bench
//!
//! Benchmark suite for the affine body simulator.
//!
//! Provides 3 procedural rigid-body scenes, metric collection,
//! and CSV export for regression tracking.

pub mod metrics;
pub mod runner;
pub mod scenarios;

pub use metrics::BenchmarkMetrics;
pub use runner::BenchmarkRunner;
pub use scenarios::{Scenario, ScenarioKind};
