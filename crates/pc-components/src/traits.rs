//! The equation interface every component kind implements.

use pc_design::ComponentDesign;
use pc_network::Param;

use crate::common::unsupported;
use crate::context::ComponentContext;
use crate::error::ComponentResult;

/// Value an imposed parameter is held at.
#[derive(Debug, Clone, Copy)]
pub enum ParamTarget<'a> {
    /// A scalar parameter at a user or design value.
    Value(f64),
    /// A characteristic relation against the component's design record.
    Characteristic(&'a ComponentDesign),
}

/// Equations of one component kind.
///
/// Models are stateless; every call receives the current port values through
/// a [`ComponentContext`]. Residuals are scaled (see [`crate::common`]) so a
/// single norm tolerance fits every equation.
pub trait ComponentModel: Send + Sync {
    /// Number of equations that hold regardless of imposed parameters.
    fn structural_count(&self, inlets: usize, outlets: usize) -> usize;

    /// Append the structural residuals, exactly `structural_count` of them.
    fn structural(&self, ctx: &ComponentContext<'_>, out: &mut Vec<f64>) -> ComponentResult<()>;

    /// Residual of an imposed parameter.
    fn parameter(
        &self,
        ctx: &ComponentContext<'_>,
        param: Param,
        _target: ParamTarget<'_>,
    ) -> ComponentResult<f64> {
        Err(unsupported(ctx, param))
    }

    /// Value of `param` implied by the current streams, if it can be measured.
    fn measure(&self, _ctx: &ComponentContext<'_>, _param: Param) -> ComponentResult<Option<f64>> {
        Ok(None)
    }

    /// Bus energy term [W].
    ///
    /// Machines report produced shaft power (turbine positive, pump negative),
    /// heat exchangers the heat entering the cycle stream (for two-stream
    /// exchangers the hot side, so a condenser is negative).
    fn energy(&self, _ctx: &ComponentContext<'_>) -> ComponentResult<f64> {
        Ok(0.0)
    }
}
