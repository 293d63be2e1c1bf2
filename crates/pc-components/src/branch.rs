//! Splitter and merge.

use crate::common::{ENTHALPY_SCALE, MASS_SCALE, POWER_SCALE, PRESSURE_SCALE};
use crate::context::ComponentContext;
use crate::error::ComponentResult;
use crate::traits::ComponentModel;

/// One inlet into N outlets of identical state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Splitter;

impl ComponentModel for Splitter {
    fn structural_count(&self, _inlets: usize, outlets: usize) -> usize {
        1 + 2 * outlets
    }

    fn structural(&self, ctx: &ComponentContext<'_>, out: &mut Vec<f64>) -> ComponentResult<()> {
        let i = ctx.inlet(0)?;
        let m_out: f64 = ctx.outlets.iter().map(|o| o.m).sum();
        out.push((i.m - m_out) / MASS_SCALE);
        for o in ctx.outlets {
            out.push((o.p - i.p) / PRESSURE_SCALE);
            out.push((o.h - i.h) / ENTHALPY_SCALE);
        }
        Ok(())
    }
}

/// N inlets mixed adiabatically into one outlet at the common inlet pressure.
#[derive(Debug, Clone, Copy, Default)]
pub struct Merge;

impl ComponentModel for Merge {
    fn structural_count(&self, inlets: usize, _outlets: usize) -> usize {
        2 + inlets
    }

    fn structural(&self, ctx: &ComponentContext<'_>, out: &mut Vec<f64>) -> ComponentResult<()> {
        let o = ctx.outlet(0)?;
        let m_in: f64 = ctx.inlets.iter().map(|i| i.m).sum();
        let mh_in: f64 = ctx.inlets.iter().map(|i| i.m * i.h).sum();
        out.push((m_in - o.m) / MASS_SCALE);
        out.push((mh_in - o.m * o.h) / POWER_SCALE);
        for i in ctx.inlets {
            out.push((i.p - o.p) / PRESSURE_SCALE);
        }
        Ok(())
    }
}
