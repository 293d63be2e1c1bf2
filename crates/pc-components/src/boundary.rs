//! Open boundaries and the loop closer.

use crate::common::{ENTHALPY_SCALE, PRESSURE_SCALE};
use crate::context::ComponentContext;
use crate::error::ComponentResult;
use crate::traits::ComponentModel;

/// Source or sink. Its connection is fixed entirely by user constraints.
#[derive(Debug, Clone, Copy, Default)]
pub struct Boundary;

impl ComponentModel for Boundary {
    fn structural_count(&self, _inlets: usize, _outlets: usize) -> usize {
        0
    }

    fn structural(&self, _ctx: &ComponentContext<'_>, _out: &mut Vec<f64>) -> ComponentResult<()> {
        Ok(())
    }
}

/// Joins the last connection of a closed loop to the first.
///
/// Only pressure and enthalpy are equated. The mass balance around a closed
/// loop is linearly dependent on the other components' balances, so the
/// closer leaves it out and the loop's mass flow is set by a constraint.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleCloser;

impl ComponentModel for CycleCloser {
    fn structural_count(&self, _inlets: usize, _outlets: usize) -> usize {
        2
    }

    fn structural(&self, ctx: &ComponentContext<'_>, out: &mut Vec<f64>) -> ComponentResult<()> {
        let i = ctx.inlet(0)?;
        let o = ctx.outlet(0)?;
        out.push((o.p - i.p) / PRESSURE_SCALE);
        out.push((o.h - i.h) / ENTHALPY_SCALE);
        Ok(())
    }
}
