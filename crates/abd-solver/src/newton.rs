//! Damped Newton solver for the incremental potential.
//!
//! Each iteration:
//! 1. Evaluate the gradient `g` at `q`; stop when `‖P g‖ < tolerance`.
//! 2. Assemble the Hessian `H` and restrict both to the free DOFs.
//! 3. Solve `(P H Pᵀ) d = P g` with Jacobi-PCG (or faer LLᵀ).
//! 4. Backtrack `α = 1, ½, ¼, ...` until `Φ(q − α Pᵀd) − Φ(q) ≤ tol`,
//!    taking the smallest trial if none passes.
//! 5. Update `q ← q − α Pᵀd`.
//!
//! Exhausting any iteration budget is not an error: the solver always
//! returns with the best configuration it reached and reports how it went.

use abd_math::faer_solver::FaerSolver;
use abd_math::linalg::norm;
use abd_math::pcg::PcgSolver;
use abd_math::{CsrMatrix, PinningProjection, SolveStats, SparseSolver};
use abd_types::{AbdError, AbdResult};
use serde::{Deserialize, Serialize};

use crate::assembly::IncrementalPotential;
use crate::config::{LinearSolverKind, NewtonConfig};

/// What happened in one Newton iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewtonIterationRecord {
    /// Iteration index within the step.
    pub iteration: u32,
    /// Free-DOF gradient norm before the update.
    pub gradient_norm: f64,
    /// Potential after the update.
    pub energy: f64,
    /// Accepted step length.
    pub step_length: f64,
    /// Whether a line-search trial passed the energy test.
    pub line_search_accepted: bool,
    /// Solver that produced the direction.
    pub linear_solver: String,
    /// Inner solver iterations.
    pub linear_iterations: u32,
    /// Inner solver relative residual.
    pub linear_residual: f64,
}

/// Outcome of one Newton solve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewtonReport {
    /// Updates applied.
    pub iterations: u32,
    /// Free-DOF gradient norm at the returned configuration.
    pub gradient_norm: f64,
    /// Whether `gradient_norm` dropped below tolerance.
    pub converged: bool,
    /// Potential at the starting configuration.
    pub initial_energy: f64,
    /// Potential at the returned configuration.
    pub final_energy: f64,
    /// Inner solver iterations summed over the step.
    pub linear_iterations: u32,
    /// Iterations whose line search exhausted its trials.
    pub line_search_failures: u32,
    /// One record per applied update.
    pub history: Vec<NewtonIterationRecord>,
}

/// Newton-CG solver with reusable inner solvers.
pub struct NewtonSolver {
    config: NewtonConfig,
    pcg: PcgSolver,
    cholesky: FaerSolver,
}

impl NewtonSolver {
    /// Creates a solver with the given controls.
    pub fn new(config: NewtonConfig) -> Self {
        let pcg = PcgSolver::new(config.cg_tolerance, config.cg_max_iterations);
        Self {
            config,
            pcg,
            cholesky: FaerSolver::new(),
        }
    }

    /// Iteration controls in use.
    pub fn config(&self) -> &NewtonConfig {
        &self.config
    }

    /// Minimizes `potential` over the free DOFs of `projection`, updating `q` in place.
    ///
    /// Errors only on inconsistent dimensions; numerical trouble is
    /// reported in the returned [`NewtonReport`].
    pub fn solve(
        &mut self,
        potential: &IncrementalPotential<'_>,
        projection: &PinningProjection,
        q: &mut Vec<f64>,
    ) -> AbdResult<NewtonReport> {
        if projection.dimension() != q.len() {
            return Err(AbdError::Dimension {
                expected: projection.dimension(),
                actual: q.len(),
            });
        }

        let mut energy = potential.energy(q)?.total;
        let mut report = NewtonReport {
            initial_energy: energy,
            ..Default::default()
        };

        loop {
            let gradient = potential.gradient(q)?;
            let g_free = projection.restrict(&gradient);
            let g_norm = norm(&g_free);
            report.gradient_norm = g_norm;

            if !g_norm.is_finite() {
                tracing::warn!(
                    iteration = report.iterations,
                    "non-finite gradient, stopping Newton iteration"
                );
                break;
            }
            if g_norm < self.config.tolerance {
                report.converged = true;
                break;
            }
            if report.iterations >= self.config.max_iterations {
                break;
            }

            let hessian = potential.hessian(q)?.to_csr();
            let h_free = projection.restrict_matrix(&hessian)?;
            let (direction, stats, solver) = self.direction(&h_free, &g_free)?;
            let step = projection.lift(&direction);

            let (trial, trial_energy, alpha, accepted) = self.line_search(potential, q, &step, energy)?;
            if !accepted {
                report.line_search_failures += 1;
            }
            *q = trial;
            energy = trial_energy;

            tracing::debug!(
                iteration = report.iterations,
                gradient_norm = g_norm,
                energy,
                alpha,
                solver,
                linear_iterations = stats.iterations,
                linear_residual = stats.residual,
                "newton iteration"
            );

            report.linear_iterations += stats.iterations;
            report.history.push(NewtonIterationRecord {
                iteration: report.iterations,
                gradient_norm: g_norm,
                energy,
                step_length: alpha,
                line_search_accepted: accepted,
                linear_solver: solver.to_string(),
                linear_iterations: stats.iterations,
                linear_residual: stats.residual,
            });
            report.iterations += 1;
        }

        report.final_energy = energy;
        Ok(report)
    }

    /// Solves the restricted Newton system for the descent direction.
    fn direction(
        &mut self,
        h_free: &CsrMatrix,
        g_free: &[f64],
    ) -> AbdResult<(Vec<f64>, SolveStats, &'static str)> {
        let mut direction = vec![0.0; g_free.len()];

        if self.config.linear_solver == LinearSolverKind::Cholesky {
            let attempt = self
                .cholesky
                .factorize(h_free)
                .and_then(|()| self.cholesky.solve(g_free, &mut direction));
            match attempt {
                Ok(stats) => return Ok((direction, stats, "faer-cholesky")),
                Err(e) => {
                    tracing::warn!(error = %e, "direct solve failed, falling back to PCG");
                }
            }
        }

        self.pcg.factorize(h_free)?;
        let stats = self.pcg.solve(g_free, &mut direction)?;
        if !stats.converged {
            tracing::debug!(
                iterations = stats.iterations,
                residual = stats.residual,
                "PCG stopped before reaching tolerance"
            );
        }
        Ok((direction, stats, "pcg"))
    }

    /// Backtracking on the potential. Returns the new configuration, its
    /// energy, the step length, and whether a trial passed the test.
    fn line_search(
        &self,
        potential: &IncrementalPotential<'_>,
        q: &[f64],
        step: &[f64],
        energy: f64,
    ) -> AbdResult<(Vec<f64>, f64, f64, bool)> {
        let mut alpha = 1.0;
        let mut trial = q.to_vec();
        let mut trial_energy = energy;

        for attempt in 0..self.config.line_search_max_steps {
            if attempt > 0 {
                alpha *= 0.5;
            }
            for ((t, qi), si) in trial.iter_mut().zip(q).zip(step) {
                *t = qi - alpha * si;
            }
            trial_energy = potential.energy(&trial)?.total;
            tracing::trace!(attempt, alpha, trial_energy, energy, "line search trial");
            if trial_energy - energy <= self.config.line_search_tolerance {
                return Ok((trial, trial_energy, alpha, true));
            }
        }

        tracing::debug!(alpha, trial_energy, energy, "line search exhausted, taking smallest step");
        Ok((trial, trial_energy, alpha, false))
    }
}
