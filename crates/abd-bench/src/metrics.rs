//! Benchmark metrics: data collected during a benchmark run.

use serde::{Deserialize, Serialize};

/// Metrics collected from a benchmark scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    /// Scenario name.
    pub scenario: String,
    /// Number of bodies, floor included.
    pub body_count: usize,
    /// Vertex count over all bodies.
    pub vertex_count: usize,
    /// Triangle count over all bodies.
    pub triangle_count: usize,
    /// Number of timesteps executed.
    pub timesteps: u32,
    /// Total wall-clock time (seconds).
    pub total_wall_time: f64,
    /// Average wall-clock time per timestep (seconds).
    pub avg_step_time: f64,
    /// Minimum step time.
    pub min_step_time: f64,
    /// Maximum step time.
    pub max_step_time: f64,
    /// Average Newton iterations per step.
    pub avg_newton_iterations: f64,
    /// Steps whose Newton solve stopped before reaching tolerance.
    pub unconverged_steps: u32,
    /// Largest contact count seen in a step.
    pub max_contacts: usize,
    /// Deepest penetration seen at the start of a step.
    pub max_penetration: f64,
    /// Kinetic energy after the last step (approaches zero once settled).
    pub final_kinetic_energy: f64,
    /// Largest vertex displacement from the initial configuration.
    pub max_displacement: f64,
}

impl BenchmarkMetrics {
    /// CSV header line.
    pub fn to_csv_header() -> String {
        "scenario,bodies,vertex_count,triangle_count,timesteps,total_wall_time_s,avg_step_ms,min_step_ms,max_step_ms,avg_newton_iterations,unconverged_steps,max_contacts,max_penetration,final_ke,max_displacement".to_string()
    }

    /// Format this metrics instance as a CSV data row.
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{:.6},{:.4},{:.4},{:.4},{:.2},{},{},{:.6e},{:.6e},{:.6}",
            self.scenario,
            self.body_count,
            self.vertex_count,
            self.triangle_count,
            self.timesteps,
            self.total_wall_time,
            self.avg_step_time * 1000.0,
            self.min_step_time * 1000.0,
            self.max_step_time * 1000.0,
            self.avg_newton_iterations,
            self.unconverged_steps,
            self.max_contacts,
            self.max_penetration,
            self.final_kinetic_energy,
            self.max_displacement,
        )
    }

    /// Format multiple metrics as a complete CSV string.
    pub fn to_csv(metrics: &[BenchmarkMetrics]) -> String {
        let mut csv = Self::to_csv_header();
        for m in metrics {
            csv.push('\n');
            csv.push_str(&m.to_csv_row());
        }
        csv
    }
}
