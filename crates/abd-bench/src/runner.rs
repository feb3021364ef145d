//! Benchmark runner: executes scenarios and collects metrics.

use std::time::Instant;

use abd_math::DVec3;
use abd_solver::{Simulator, StepReport};
use abd_types::{AbdResult, BodyId};

use crate::metrics::BenchmarkMetrics;
use crate::scenarios::{Scenario, ScenarioKind};

/// Runs benchmark scenarios and collects metrics.
pub struct BenchmarkRunner;

impl BenchmarkRunner {
    /// Run a single scenario from setup to its last timestep.
    pub fn run(scenario: &Scenario) -> AbdResult<BenchmarkMetrics> {
        let mut sim = Simulator::new(scenario.config.clone(), scenario.bodies.clone())?;
        sim.setup()?;

        let initial = Self::all_vertices(&sim)?;
        let mut reports: Vec<StepReport> = Vec::with_capacity(scenario.timesteps as usize);

        let total_start = Instant::now();
        for _ in 0..scenario.timesteps {
            reports.push(sim.step()?);
        }
        let total_wall_time = total_start.elapsed().as_secs_f64();

        let max_displacement = initial
            .iter()
            .zip(Self::all_vertices(&sim)?)
            .map(|(a, b)| a.distance(b))
            .fold(0.0, f64::max);

        let steps = reports.len().max(1) as f64;
        let metrics = BenchmarkMetrics {
            scenario: scenario.kind.name().to_string(),
            body_count: scenario.bodies.len(),
            vertex_count: scenario.vertex_count(),
            triangle_count: scenario.triangle_count(),
            timesteps: scenario.timesteps,
            total_wall_time,
            avg_step_time: reports.iter().map(|r| r.wall_time).sum::<f64>() / steps,
            min_step_time: if reports.is_empty() {
                0.0
            } else {
                reports.iter().map(|r| r.wall_time).fold(f64::MAX, f64::min)
            },
            max_step_time: reports.iter().map(|r| r.wall_time).fold(0.0, f64::max),
            avg_newton_iterations: reports.iter().map(|r| r.newton_iterations as f64).sum::<f64>()
                / steps,
            unconverged_steps: reports.iter().filter(|r| !r.converged).count() as u32,
            max_contacts: reports.iter().map(|r| r.contact_count).max().unwrap_or(0),
            max_penetration: reports.iter().map(|r| r.max_penetration).fold(0.0, f64::max),
            final_kinetic_energy: sim.kinetic_energy()?,
            max_displacement,
        };

        tracing::info!(
            scenario = %metrics.scenario,
            steps = metrics.timesteps,
            wall_time = metrics.total_wall_time,
            unconverged = metrics.unconverged_steps,
            "benchmark complete"
        );
        Ok(metrics)
    }

    /// Run all scenarios and return metrics for each.
    pub fn run_all() -> AbdResult<Vec<BenchmarkMetrics>> {
        ScenarioKind::all()
            .iter()
            .map(|&kind| Self::run(&Scenario::from_kind(kind)))
            .collect()
    }

    fn all_vertices(sim: &Simulator) -> AbdResult<Vec<DVec3>> {
        let mut out = Vec::new();
        for i in 0..sim.body_count() {
            out.extend(sim.get_deformed_vertices(BodyId::from(i))?);
        }
        Ok(out)
    }
}
