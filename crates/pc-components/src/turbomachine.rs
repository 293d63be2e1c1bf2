//! Turbines, pumps and compressors.

use pc_network::{CharSlot, Param};

use crate::common::{
    EPSILON, ENTHALPY_SCALE, MASS_SCALE, POWER_SCALE, design_value, positive,
    pressure_ratio_residual, unsupported,
};
use crate::context::ComponentContext;
use crate::error::{ComponentError, ComponentResult};
use crate::traits::{ComponentModel, ParamTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineRole {
    /// Expands the stream and delivers shaft power.
    Turbine,
    /// Raises liquid pressure; efficiency characteristic over volumetric flow.
    Pump,
    /// Raises gas pressure; efficiency characteristic over mass flow.
    Compressor,
}

/// Single-stream turbomachine with an isentropic efficiency model.
///
/// ```text
/// turbine:             h_out − h_in = eta · (h_s − h_in)
/// pump / compressor:   eta · (h_out − h_in) = h_s − h_in
/// ```
///
/// where `h_s` is the enthalpy after isentropic change to the outlet pressure.
/// Off-design, `eta_s_char` scales the design efficiency by the flow
/// characteristic and the turbine `cone` law ties inlet mass flow to the
/// pressures and inlet specific volume:
///
/// ```text
/// m = m0 · (p_in/p0) · sqrt(p0 v0 / (p_in v_in)) · sqrt((1 − (p_out/p_in)²) / (1 − (p_out0/p0)²))
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Turbomachine {
    pub role: MachineRole,
}

impl Turbomachine {
    pub fn new(role: MachineRole) -> Self {
        Self { role }
    }

    fn efficiency_residual(&self, ctx: &ComponentContext<'_>, eta: f64) -> ComponentResult<f64> {
        let i = ctx.inlet(0)?;
        let o = ctx.outlet(0)?;
        let h_s = ctx.isentropic_enthalpy(i, o.p)?;
        let r = match self.role {
            MachineRole::Turbine => (o.h - i.h) - eta * (h_s - i.h),
            MachineRole::Pump | MachineRole::Compressor => eta * (o.h - i.h) - (h_s - i.h),
        };
        Ok(r / ENTHALPY_SCALE)
    }

    /// Efficiency at the current flow from the design value and characteristic.
    fn characteristic_efficiency(
        &self,
        ctx: &ComponentContext<'_>,
        record: &pc_design::ComponentDesign,
    ) -> ComponentResult<f64> {
        let eta_design = design_value(ctx, record, Param::EtaS)?;
        let i = ctx.inlet(0)?;
        let reference = design_inlet(ctx, record)?;
        let ratio = match self.role {
            MachineRole::Pump => {
                let v = ctx.specific_volume(i)?;
                let flow = positive(ctx, reference.volumetric_flow(), "design volumetric flow")?;
                i.m * v / flow
            }
            MachineRole::Turbine | MachineRole::Compressor => {
                i.m / positive(ctx, reference.m, "design mass flow")?
            }
        };
        let factor = ctx.component.characteristic(CharSlot::Efficiency).evaluate(ratio);
        Ok(eta_design * factor)
    }

    fn cone_residual(
        &self,
        ctx: &ComponentContext<'_>,
        record: &pc_design::ComponentDesign,
    ) -> ComponentResult<f64> {
        let i = ctx.inlet(0)?;
        let o = ctx.outlet(0)?;
        let d_in = design_inlet(ctx, record)?;
        let d_out = record
            .outlet(0)
            .ok_or_else(|| missing_stream(ctx, "outlet stream"))?;

        let p0 = positive(ctx, d_in.p, "design inlet pressure")?;
        let design_term = positive(
            ctx,
            1.0 - (d_out.p / p0).powi(2),
            "design pressure ratio of cone law",
        )?;
        let v_in = ctx.specific_volume(i)?;
        if i.p <= 0.0 || v_in <= 0.0 {
            return Err(ctx.non_physical("inlet state of cone law"));
        }
        let current_term = (1.0 - (o.p / i.p).powi(2)).max(0.0);

        let m = d_in.m
            * (i.p / p0)
            * (p0 * d_in.v / (i.p * v_in)).sqrt()
            * (current_term / design_term).sqrt();
        Ok((i.m - m) / MASS_SCALE)
    }
}

fn design_inlet<'r>(
    ctx: &ComponentContext<'_>,
    record: &'r pc_design::ComponentDesign,
) -> ComponentResult<&'r pc_design::StreamDesign> {
    record
        .inlet(0)
        .ok_or_else(|| missing_stream(ctx, "inlet stream"))
}

fn missing_stream(ctx: &ComponentContext<'_>, key: &'static str) -> ComponentError {
    ComponentError::MissingDesignValue {
        component: ctx.label().to_string(),
        key,
    }
}

impl ComponentModel for Turbomachine {
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
            (Param::EtaS, ParamTarget::Value(eta)) => self.efficiency_residual(ctx, eta),
            (Param::Pr, ParamTarget::Value(pr)) => Ok(pressure_ratio_residual(i, o, pr)),
            (Param::P, ParamTarget::Value(power)) => {
                Ok((i.m * (o.h - i.h) - power) / POWER_SCALE)
            }
            (Param::EtaSChar, ParamTarget::Characteristic(record)) => {
                let eta = self.characteristic_efficiency(ctx, record)?;
                self.efficiency_residual(ctx, eta)
            }
            (Param::Cone, ParamTarget::Characteristic(record))
                if self.role == MachineRole::Turbine =>
            {
                self.cone_residual(ctx, record)
            }
            _ => Err(unsupported(ctx, param)),
        }
    }

    fn measure(&self, ctx: &ComponentContext<'_>, param: Param) -> ComponentResult<Option<f64>> {
        let i = ctx.inlet(0)?;
        let o = ctx.outlet(0)?;
        let value = match param {
            Param::EtaS => {
                let ideal = ctx.isentropic_enthalpy(i, o.p)? - i.h;
                let actual = o.h - i.h;
                let (num, den) = match self.role {
                    MachineRole::Turbine => (actual, ideal),
                    MachineRole::Pump | MachineRole::Compressor => (ideal, actual),
                };
                (den.abs() > EPSILON).then(|| num / den)
            }
            Param::Pr => (i.p > 0.0).then(|| o.p / i.p),
            Param::P => Some(i.m * (o.h - i.h)),
            _ => None,
        };
        Ok(value)
    }

    fn energy(&self, ctx: &ComponentContext<'_>) -> ComponentResult<f64> {
        let i = ctx.inlet(0)?;
        let o = ctx.outlet(0)?;
        Ok(-i.m * (o.h - i.h))
    }
}
