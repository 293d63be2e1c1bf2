//! Parameter sweeps over a network.

use pc_network::{NetworkGraph, NetworkResult, SolveMode};
use rayon::prelude::*;
use tracing::warn;

use crate::error::SolverError;
use crate::solve::Solver;
use crate::state::ConvergedState;

/// Outcome of one sweep point.
#[derive(Debug)]
pub struct SweepPoint<S, R> {
    pub setting: S,
    pub outcome: Result<R, SolverError>,
}

impl<S, R> SweepPoint<S, R> {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Applies a sequence of settings and solves after each one. A failed point
/// is recorded and the sweep moves on.
#[derive(Debug, Clone, Copy)]
pub struct SweepDriver<'p> {
    solver: Solver<'p>,
    mode: SolveMode,
}

impl<'p> SweepDriver<'p> {
    pub fn new(solver: Solver<'p>, mode: SolveMode) -> Self {
        Self { solver, mode }
    }

    /// Sweep on `graph` itself. Each point starts from the last converged
    /// state, so settings ordered by proximity converge fastest.
    pub fn run<S, R, A, F>(
        &self,
        graph: &mut NetworkGraph,
        settings: impl IntoIterator<Item = S>,
        apply: A,
        record: F,
    ) -> Vec<SweepPoint<S, R>>
    where
        A: Fn(&mut NetworkGraph, &S) -> NetworkResult<()>,
        F: Fn(&ConvergedState) -> R,
    {
        settings
            .into_iter()
            .enumerate()
            .map(|(index, setting)| {
                let outcome = self.point(graph, &setting, &apply, &record);
                if let Err(e) = &outcome {
                    warn!(point = index, mode = %self.mode, error = %e, "sweep point failed");
                }
                SweepPoint { setting, outcome }
            })
            .collect()
    }

    /// Sweep in parallel, one clone of `graph` per point. The clones carry
    /// the graph's converged state and design reference; `graph` itself is
    /// not modified. Results keep the order of `settings`.
    pub fn run_parallel<S, R, A, F>(
        &self,
        graph: &NetworkGraph,
        settings: Vec<S>,
        apply: A,
        record: F,
    ) -> Vec<SweepPoint<S, R>>
    where
        S: Send,
        R: Send,
        A: Fn(&mut NetworkGraph, &S) -> NetworkResult<()> + Sync,
        F: Fn(&ConvergedState) -> R + Sync,
    {
        settings
            .into_par_iter()
            .enumerate()
            .map(|(index, setting)| {
                let mut local = graph.clone();
                let outcome = self.point(&mut local, &setting, &apply, &record);
                if let Err(e) = &outcome {
                    warn!(point = index, mode = %self.mode, error = %e, "sweep point failed");
                }
                SweepPoint { setting, outcome }
            })
            .collect()
    }

    fn point<S, R, A, F>(
        &self,
        graph: &mut NetworkGraph,
        setting: &S,
        apply: &A,
        record: &F,
    ) -> Result<R, SolverError>
    where
        A: Fn(&mut NetworkGraph, &S) -> NetworkResult<()>,
        F: Fn(&ConvergedState) -> R,
    {
        apply(graph, setting)?;
        let state = self.solver.solve(graph, self.mode)?;
        Ok(record(&state))
    }
}
