//! Residual scales and equations shared by several component kinds.

use pc_design::ComponentDesign;
use pc_network::Param;

use crate::context::{ComponentContext, PortState};
use crate::error::{ComponentError, ComponentResult};

/// Residual divisors. Mass in kg/s, pressure in bar, specific enthalpy in
/// kJ/kg, heat and power in kW, temperature in K.
pub const MASS_SCALE: f64 = 1.0;
pub const PRESSURE_SCALE: f64 = 1e5;
pub const ENTHALPY_SCALE: f64 = 1e3;
pub const POWER_SCALE: f64 = 1e3;
pub const ENTROPY_SCALE: f64 = 1e3;

/// Below this magnitude a flow or enthalpy difference counts as zero.
pub const EPSILON: f64 = 1e-9;

/// Smallest terminal difference fed into the log-mean temperature difference.
/// Crossed temperatures at intermediate iterates are clamped to it.
pub const MIN_TERMINAL_DIFFERENCE: f64 = 1e-3;

/// `p_out = pr · p_in`.
pub fn pressure_ratio_residual(inlet: &PortState<'_>, outlet: &PortState<'_>, pr: f64) -> f64 {
    (outlet.p - pr * inlet.p) / PRESSURE_SCALE
}

/// `p_in − p_out = zeta · m|m| · v_mean / 2`.
pub fn zeta_residual(
    ctx: &ComponentContext<'_>,
    inlet: &PortState<'_>,
    outlet: &PortState<'_>,
    zeta: f64,
) -> ComponentResult<f64> {
    let v_mean = 0.5 * (ctx.specific_volume(inlet)? + ctx.specific_volume(outlet)?);
    let drop = zeta * inlet.m * inlet.m.abs() * v_mean / 2.0;
    Ok((inlet.p - outlet.p - drop) / PRESSURE_SCALE)
}

pub fn zeta_value(
    ctx: &ComponentContext<'_>,
    inlet: &PortState<'_>,
    outlet: &PortState<'_>,
) -> ComponentResult<Option<f64>> {
    if inlet.m.abs() < EPSILON {
        return Ok(None);
    }
    let v_mean = 0.5 * (ctx.specific_volume(inlet)? + ctx.specific_volume(outlet)?);
    Ok(Some(
        2.0 * (inlet.p - outlet.p) / (inlet.m * inlet.m.abs() * v_mean),
    ))
}

/// Design value of `param` from a component's design record.
pub fn design_value(
    ctx: &ComponentContext<'_>,
    record: &ComponentDesign,
    param: Param,
) -> ComponentResult<f64> {
    record
        .param(param.key())
        .ok_or_else(|| ComponentError::MissingDesignValue {
            component: ctx.label().to_string(),
            key: param.key(),
        })
}

pub fn unsupported(ctx: &ComponentContext<'_>, param: Param) -> ComponentError {
    ComponentError::NotSupported {
        component: ctx.label().to_string(),
        kind: ctx.component.kind().name(),
        param: param.key(),
    }
}

/// Guard a design reference quantity used as a divisor.
pub fn positive(ctx: &ComponentContext<'_>, value: f64, what: &'static str) -> ComponentResult<f64> {
    if value.is_finite() && value.abs() > EPSILON {
        Ok(value)
    } else {
        Err(ctx.non_physical(what))
    }
}
