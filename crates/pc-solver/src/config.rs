//! Solver settings.

use serde::{Deserialize, Serialize};

/// Newton iteration settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Maximum Newton iterations.
    pub max_iterations: usize,
    /// Convergence threshold on the 2-norm of the scaled residual vector.
    pub tolerance: f64,
    /// Relative finite difference step for the Jacobian.
    pub jacobian_epsilon: f64,
    /// Smallest step fraction tried by the line search.
    pub min_step: f64,
    /// Maximum step halvings per iteration.
    pub max_line_search: usize,
    /// Lowest admissible pressure [Pa].
    pub min_pressure: f64,
    /// Sweeps of the initial guess propagation over all components.
    pub propagation_passes: usize,
    /// Singular values of the column-scaled Jacobian below this fraction of
    /// the largest one count as rank deficiency.
    pub rank_tolerance: f64,
    /// Residual norm accepted once the Newton step has become negligible.
    /// `None` requires the residual norm to reach `tolerance`.
    pub stall_tolerance: Option<f64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-6,
            jacobian_epsilon: 1e-6,
            min_step: 1e-6,
            max_line_search: 20,
            min_pressure: 1.0,
            propagation_passes: 10,
            rank_tolerance: 1e-10,
            stall_tolerance: None,
        }
    }
}

impl SolverConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_min_pressure(mut self, min_pressure: f64) -> Self {
        self.min_pressure = min_pressure;
        self
    }

    pub fn with_propagation_passes(mut self, passes: usize) -> Self {
        self.propagation_passes = passes;
        self
    }

    /// Accept a residual norm up to `stall_tolerance` when the step has
    /// dropped below `tolerance`; for property backends with a noise floor.
    pub fn with_stall_tolerance(mut self, stall_tolerance: f64) -> Self {
        self.stall_tolerance = Some(stall_tolerance);
        self
    }
}
