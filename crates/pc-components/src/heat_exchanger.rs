//! Heat exchangers: single stream, counter-flow and condenser.

use pc_core::log_mean_difference;
use pc_network::{CharSlot, Param};

use crate::common::{
    ENTHALPY_SCALE, EPSILON, MASS_SCALE, MIN_TERMINAL_DIFFERENCE, POWER_SCALE, design_value,
    positive, pressure_ratio_residual, unsupported, zeta_residual, zeta_value,
};
use crate::context::{ComponentContext, PortState};
use crate::error::{ComponentError, ComponentResult};
use crate::traits::{ComponentModel, ParamTarget};

/// One stream exchanging heat `Q = m (h_out − h_in)` with the surroundings.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleHeatExchanger;

impl ComponentModel for SimpleHeatExchanger {
    fn structural_count(&self, _inlets: usize, _outlets: usize) -> usize {
        1
    }

    fn structural(&self, ctx: &ComponentContext<'_>, out: &mut Vec<f64>) -> ComponentResult<()> {
        out.push((ctx.inlet(0)?.m - ctx.outlet(0)?.m) / MASS_SCALE);
        Ok(())
    }

    fn parameter(
        &self,
        ctx: &ComponentContext<'_>,
        param: Param,
        target: ParamTarget<'_>,
    ) -> ComponentResult<f64> {
        let i = ctx.inlet(0)?;
        let o = ctx.outlet(0)?;
        match (param, target) {
            (Param::Q, ParamTarget::Value(q)) => Ok((i.m * (o.h - i.h) - q) / POWER_SCALE),
            (Param::Pr, ParamTarget::Value(pr)) => Ok(pressure_ratio_residual(i, o, pr)),
            (Param::Zeta, ParamTarget::Value(zeta)) => zeta_residual(ctx, i, o, zeta),
            _ => Err(unsupported(ctx, param)),
        }
    }

    fn measure(&self, ctx: &ComponentContext<'_>, param: Param) -> ComponentResult<Option<f64>> {
        let i = ctx.inlet(0)?;
        let o = ctx.outlet(0)?;
        match param {
            Param::Q => Ok(Some(i.m * (o.h - i.h))),
            Param::Pr => Ok((i.p > 0.0).then(|| o.p / i.p)),
            Param::Zeta => zeta_value(ctx, i, o),
            _ => Ok(None),
        }
    }

    fn energy(&self, ctx: &ComponentContext<'_>) -> ComponentResult<f64> {
        let i = ctx.inlet(0)?;
        let o = ctx.outlet(0)?;
        Ok(i.m * (o.h - i.h))
    }
}

/// Counter-flow exchanger, hot side on port 0, cold side on port 1.
///
/// Terminal temperature differences:
///
/// ```text
/// ttd_u = T_in,hot − T_out,cold        (condenser: T_sat(p_in,hot) − T_out,cold)
/// ttd_l = T_out,hot − T_in,cold
/// ```
///
/// `kA` relates the heat released by the hot side to the log-mean of the two
/// terminal differences. With `condenser` set the hot side additionally
/// leaves as saturated liquid.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeatExchanger {
    pub condenser: bool,
}

/// Ports of both sides.
struct Sides<'c> {
    hot_in: &'c PortState<'c>,
    hot_out: &'c PortState<'c>,
    cold_in: &'c PortState<'c>,
    cold_out: &'c PortState<'c>,
}

impl HeatExchanger {
    pub fn new(condenser: bool) -> Self {
        Self { condenser }
    }

    fn sides<'c>(&self, ctx: &ComponentContext<'c>) -> ComponentResult<Sides<'c>> {
        Ok(Sides {
            hot_in: ctx.inlet(0)?,
            hot_out: ctx.outlet(0)?,
            cold_in: ctx.inlet(1)?,
            cold_out: ctx.outlet(1)?,
        })
    }

    /// Hot side heat flow into its stream; negative while heat is released.
    fn hot_side_heat(s: &Sides<'_>) -> f64 {
        s.hot_in.m * (s.hot_out.h - s.hot_in.h)
    }

    fn upper_difference(&self, ctx: &ComponentContext<'_>, s: &Sides<'_>) -> ComponentResult<f64> {
        let hot = if self.condenser {
            ctx.saturation_temperature(s.hot_in)?
        } else {
            ctx.temperature(s.hot_in)?
        };
        Ok(hot - ctx.temperature(s.cold_out)?)
    }

    fn lower_difference(&self, ctx: &ComponentContext<'_>, s: &Sides<'_>) -> ComponentResult<f64> {
        Ok(ctx.temperature(s.hot_out)? - ctx.temperature(s.cold_in)?)
    }

    fn lmtd(&self, ctx: &ComponentContext<'_>, s: &Sides<'_>) -> ComponentResult<f64> {
        let upper = self.upper_difference(ctx, s)?.max(MIN_TERMINAL_DIFFERENCE);
        let lower = self.lower_difference(ctx, s)?.max(MIN_TERMINAL_DIFFERENCE);
        log_mean_difference(upper, lower).map_err(|_| ctx.non_physical("log-mean temperature difference"))
    }

    fn ka_residual(&self, ctx: &ComponentContext<'_>, s: &Sides<'_>, ka: f64) -> ComponentResult<f64> {
        let released = -Self::hot_side_heat(s);
        Ok((released - ka * self.lmtd(ctx, s)?) / POWER_SCALE)
    }

    /// kA at the current flows from the design value and both side characteristics.
    fn characteristic_ka(
        &self,
        ctx: &ComponentContext<'_>,
        s: &Sides<'_>,
        record: &pc_design::ComponentDesign,
    ) -> ComponentResult<f64> {
        let ka_design = design_value(ctx, record, Param::KA)?;
        let m_hot = record.inlet(0).map(|d| d.m).ok_or_else(|| missing(ctx, "hot inlet stream"))?;
        let m_cold = record.inlet(1).map(|d| d.m).ok_or_else(|| missing(ctx, "cold inlet stream"))?;
        let hot_ratio = s.hot_in.m / positive(ctx, m_hot, "design hot side mass flow")?;
        let cold_ratio = s.cold_in.m / positive(ctx, m_cold, "design cold side mass flow")?;

        let f_hot = ctx.component.characteristic(CharSlot::HotSideHeatTransfer).evaluate(hot_ratio);
        let f_cold = ctx.component.characteristic(CharSlot::ColdSideHeatTransfer).evaluate(cold_ratio);
        if f_hot <= 0.0 || f_cold <= 0.0 {
            return Err(ctx.non_physical("heat transfer characteristic must stay positive"));
        }
        Ok(ka_design * 2.0 / (1.0 / f_hot + 1.0 / f_cold))
    }
}

fn missing(ctx: &ComponentContext<'_>, key: &'static str) -> ComponentError {
    ComponentError::MissingDesignValue {
        component: ctx.label().to_string(),
        key,
    }
}

impl ComponentModel for HeatExchanger {
    fn structural_count(&self, _inlets: usize, _outlets: usize) -> usize {
        if self.condenser { 4 } else { 3 }
    }

    fn structural(&self, ctx: &ComponentContext<'_>, out: &mut Vec<f64>) -> ComponentResult<()> {
        let s = self.sides(ctx)?;
        out.push((s.hot_in.m - s.hot_out.m) / MASS_SCALE);
        out.push((s.cold_in.m - s.cold_out.m) / MASS_SCALE);
        let cold_heat = s.cold_in.m * (s.cold_out.h - s.cold_in.h);
        out.push((Self::hot_side_heat(&s) + cold_heat) / POWER_SCALE);
        if self.condenser {
            let h_sat = ctx.saturated_liquid_enthalpy(s.hot_out)?;
            out.push((s.hot_out.h - h_sat) / ENTHALPY_SCALE);
        }
        Ok(())
    }

    fn parameter(
        &self,
        ctx: &ComponentContext<'_>,
        param: Param,
        target: ParamTarget<'_>,
    ) -> ComponentResult<f64> {
        let s = self.sides(ctx)?;
        match (param, target) {
            (Param::Q, ParamTarget::Value(q)) => Ok((Self::hot_side_heat(&s) - q) / POWER_SCALE),
            (Param::KA, ParamTarget::Value(ka)) => self.ka_residual(ctx, &s, ka),
            (Param::KAChar, ParamTarget::Characteristic(record)) => {
                let ka = self.characteristic_ka(ctx, &s, record)?;
                self.ka_residual(ctx, &s, ka)
            }
            (Param::TtdU, ParamTarget::Value(ttd)) => Ok(self.upper_difference(ctx, &s)? - ttd),
            (Param::TtdL, ParamTarget::Value(ttd)) => Ok(self.lower_difference(ctx, &s)? - ttd),
            (Param::Pr1, ParamTarget::Value(pr)) => {
                Ok(pressure_ratio_residual(s.hot_in, s.hot_out, pr))
            }
            (Param::Pr2, ParamTarget::Value(pr)) => {
                Ok(pressure_ratio_residual(s.cold_in, s.cold_out, pr))
            }
            (Param::Zeta1, ParamTarget::Value(zeta)) => zeta_residual(ctx, s.hot_in, s.hot_out, zeta),
            (Param::Zeta2, ParamTarget::Value(zeta)) => {
                zeta_residual(ctx, s.cold_in, s.cold_out, zeta)
            }
            _ => Err(unsupported(ctx, param)),
        }
    }

    fn measure(&self, ctx: &ComponentContext<'_>, param: Param) -> ComponentResult<Option<f64>> {
        let s = self.sides(ctx)?;
        let ratio = |i: &PortState<'_>, o: &PortState<'_>| (i.p > 0.0).then(|| o.p / i.p);
        match param {
            Param::Q => Ok(Some(Self::hot_side_heat(&s))),
            Param::KA => {
                let upper = self.upper_difference(ctx, &s)?;
                let lower = self.lower_difference(ctx, &s)?;
                let Ok(lmtd) = log_mean_difference(upper, lower) else {
                    return Ok(None);
                };
                Ok((lmtd > EPSILON).then(|| -Self::hot_side_heat(&s) / lmtd))
            }
            Param::TtdU => Ok(Some(self.upper_difference(ctx, &s)?)),
            Param::TtdL => Ok(Some(self.lower_difference(ctx, &s)?)),
            Param::Pr1 => Ok(ratio(s.hot_in, s.hot_out)),
            Param::Pr2 => Ok(ratio(s.cold_in, s.cold_out)),
            Param::Zeta1 => zeta_value(ctx, s.hot_in, s.hot_out),
            Param::Zeta2 => zeta_value(ctx, s.cold_in, s.cold_out),
            _ => Ok(None),
        }
    }

    fn energy(&self, ctx: &ComponentContext<'_>) -> ComponentResult<f64> {
        Ok(Self::hot_side_heat(&self.sides(ctx)?))
    }
}
