//! Capture of design reference values from a converged component.

use std::collections::BTreeMap;

use pc_design::{ComponentDesign, StreamDesign};

use crate::context::{ComponentContext, PortState};
use crate::error::ComponentResult;
use crate::traits::ComponentModel;

/// Reference stream of one port.
pub fn stream_design(ctx: &ComponentContext<'_>, port: &PortState<'_>) -> ComponentResult<StreamDesign> {
    let state = ctx.state(port)?;
    Ok(StreamDesign {
        m: port.m,
        p: port.p,
        h: port.h,
        t: state.t,
        s: state.s,
        v: state.v(),
    })
}

/// Every measurable parameter, the energy term and the port streams.
pub fn capture(model: &dyn ComponentModel, ctx: &ComponentContext<'_>) -> ComponentResult<ComponentDesign> {
    let kind = ctx.component.kind();
    let mut params = BTreeMap::new();
    for &param in kind.parameters() {
        if param.is_characteristic() {
            continue;
        }
        if let Some(value) = model.measure(ctx, param)?
            && value.is_finite()
        {
            params.insert(param.key().to_string(), value);
        }
    }

    Ok(ComponentDesign {
        kind: kind.name().to_string(),
        energy: model.energy(ctx)?,
        params,
        inlets: ctx
            .inlets
            .iter()
            .map(|p| stream_design(ctx, p))
            .collect::<ComponentResult<_>>()?,
        outlets: ctx
            .outlets
            .iter()
            .map(|p| stream_design(ctx, p))
            .collect::<ComponentResult<_>>()?,
    })
}
