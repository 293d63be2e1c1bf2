//! Error types for solver operations.

use pc_components::ComponentError;
use pc_design::DesignError;
use pc_fluids::FluidError;
use pc_network::NetworkError;
use thiserror::Error;

/// Why a solve failed. A failed solve never touches the graph's converged
/// state or design reference.
#[derive(Error, Debug)]
pub enum SolverError {
    /// Equation and unknown counts differ, or the equations are dependent and
    /// `equations` counts the independent ones (Jacobian rank). Reported
    /// before any iteration unless the rank drops along the way.
    #[error("Degrees of freedom mismatch: {equations} independent equations for {unknowns} unknowns")]
    DegreesOfFreedom { equations: usize, unknowns: usize },

    /// Damping could not keep the iterate inside the physical domain.
    #[error("Iterate left the physical domain at {variable}: {value} (previous {previous})")]
    Domain {
        variable: String,
        value: f64,
        previous: f64,
    },

    #[error("No convergence after {iterations} iterations, residual norm {residual_norm:e}")]
    Convergence {
        iterations: usize,
        residual_norm: f64,
    },

    /// The property provider rejected a state.
    #[error("Property evaluation failed: {0}")]
    OutOfRange(FluidError),

    #[error("Missing design reference: {what}")]
    MissingDesignReference { what: String },

    /// Full rank, but the LU solve produced no finite step.
    #[error("Singular Jacobian at iteration {iteration}")]
    SingularJacobian { iteration: usize },

    #[error("Solve cancelled at iteration {iteration}")]
    Cancelled { iteration: usize },

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Component error: {0}")]
    Component(ComponentError),

    #[error("Design archive error: {0}")]
    Design(#[from] DesignError),
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<FluidError> for SolverError {
    fn from(e: FluidError) -> Self {
        SolverError::OutOfRange(e)
    }
}

impl From<ComponentError> for SolverError {
    fn from(e: ComponentError) -> Self {
        match e {
            ComponentError::Fluid(fluid) => SolverError::OutOfRange(fluid),
            ComponentError::MissingDesignValue { component, key } => {
                SolverError::MissingDesignReference {
                    what: format!("'{key}' of component '{component}'"),
                }
            }
            other => SolverError::Component(other),
        }
    }
}

impl SolverError {
    /// Errors raised by a trial iterate that step damping may recover from.
    pub(crate) fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SolverError::OutOfRange(_)
                | SolverError::Component(ComponentError::NonPhysical { .. })
        )
    }
}
