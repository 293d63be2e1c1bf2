//! Port values and the evaluation context handed to component equations.

use pc_fluids::{Composition, FluidState, PropertyProvider, StateInput};
use pc_network::Component;

use crate::error::{ComponentError, ComponentResult};

/// Current values of one connection as seen from a component port, SI.
#[derive(Debug, Clone, Copy)]
pub struct PortState<'a> {
    pub m: f64,
    pub p: f64,
    pub h: f64,
    pub fluid: &'a Composition,
}

/// Everything a component needs to evaluate its equations at one iterate.
#[derive(Clone, Copy)]
pub struct ComponentContext<'a> {
    pub component: &'a Component,
    pub provider: &'a dyn PropertyProvider,
    pub inlets: &'a [PortState<'a>],
    pub outlets: &'a [PortState<'a>],
}

impl<'a> ComponentContext<'a> {
    pub fn label(&self) -> &'a str {
        self.component.label()
    }

    pub fn inlet(&self, port: usize) -> ComponentResult<&'a PortState<'a>> {
        self.inlets.get(port).ok_or_else(|| ComponentError::MissingPort {
            component: self.label().to_string(),
            port,
            side: "inlet",
        })
    }

    pub fn outlet(&self, port: usize) -> ComponentResult<&'a PortState<'a>> {
        self.outlets.get(port).ok_or_else(|| ComponentError::MissingPort {
            component: self.label().to_string(),
            port,
            side: "outlet",
        })
    }

    /// Full state of a port from its pressure and enthalpy.
    pub fn state(&self, port: &PortState<'_>) -> ComponentResult<FluidState> {
        Ok(self
            .provider
            .properties(port.fluid, StateInput::ph(port.p, port.h))?)
    }

    pub fn temperature(&self, port: &PortState<'_>) -> ComponentResult<f64> {
        Ok(self.state(port)?.t)
    }

    pub fn specific_volume(&self, port: &PortState<'_>) -> ComponentResult<f64> {
        Ok(self.state(port)?.v())
    }

    /// Enthalpy after an isentropic change from `inlet` to pressure `p`.
    pub fn isentropic_enthalpy(&self, inlet: &PortState<'_>, p: f64) -> ComponentResult<f64> {
        let s = self.state(inlet)?.s;
        Ok(self.provider.properties(inlet.fluid, StateInput::ps(p, s))?.h)
    }

    /// Saturated liquid enthalpy at the port pressure.
    pub fn saturated_liquid_enthalpy(&self, port: &PortState<'_>) -> ComponentResult<f64> {
        Ok(self
            .provider
            .properties(port.fluid, StateInput::pq(port.p, 0.0))?
            .h)
    }

    pub fn saturation_temperature(&self, port: &PortState<'_>) -> ComponentResult<f64> {
        Ok(self.provider.saturation_temperature(port.fluid, port.p)?)
    }

    pub(crate) fn non_physical(&self, what: &'static str) -> ComponentError {
        ComponentError::NonPhysical {
            component: self.label().to_string(),
            what,
        }
    }
}
