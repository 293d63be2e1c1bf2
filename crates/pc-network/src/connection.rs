//! Connections (directed streams between component ports).

use std::collections::BTreeMap;

use pc_core::{ComponentId, ConnectionId, UnitSystem};
use pc_fluids::Composition;
use serde::{Deserialize, Serialize};

use crate::spec::Spec;

/// Stream attributes that can be constrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConnAttr {
    /// Mass flow [kg/s].
    M,
    /// Pressure.
    P,
    /// Specific enthalpy.
    H,
    /// Temperature.
    T,
    /// Specific entropy.
    S,
    /// Volumetric flow [m³/s].
    V,
    /// Vapour quality [-].
    X,
}

impl ConnAttr {
    pub fn key(&self) -> &'static str {
        match self {
            ConnAttr::M => "m",
            ConnAttr::P => "p",
            ConnAttr::H => "h",
            ConnAttr::T => "T",
            ConnAttr::S => "s",
            ConnAttr::V => "v",
            ConnAttr::X => "x",
        }
    }

    /// Convert a value in network units to SI.
    pub fn to_si(&self, units: &UnitSystem, v: f64) -> f64 {
        match self {
            ConnAttr::P => units.pressure_to_si(v),
            ConnAttr::H => units.enthalpy_to_si(v),
            ConnAttr::T => units.temperature_to_si(v),
            ConnAttr::S => units.entropy_to_si(v),
            ConnAttr::M | ConnAttr::V | ConnAttr::X => v,
        }
    }

    /// Convert an SI value to network units.
    pub fn from_si(&self, units: &UnitSystem, v: f64) -> f64 {
        match self {
            ConnAttr::P => units.pressure_from_si(v),
            ConnAttr::H => units.enthalpy_from_si(v),
            ConnAttr::T => units.temperature_from_si(v),
            ConnAttr::S => units.entropy_from_si(v),
            ConnAttr::M | ConnAttr::V | ConnAttr::X => v,
        }
    }
}

/// One end of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub component: ComponentId,
    pub port: usize,
}

/// Converged stream values, SI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamState {
    pub m: f64,
    pub p: f64,
    pub h: f64,
    pub t: f64,
    pub s: f64,
    /// Specific volume [m³/kg].
    pub v: f64,
    pub quality: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub(crate) id: ConnectionId,
    pub(crate) label: String,
    pub(crate) source: PortRef,
    pub(crate) target: PortRef,
    pub(crate) fluid: Option<Composition>,
    /// Constraint values are stored in SI.
    pub(crate) specs: BTreeMap<ConnAttr, Spec>,
    pub(crate) state: Option<StreamState>,
}

impl Connection {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> PortRef {
        self.source
    }

    pub fn target(&self) -> PortRef {
        self.target
    }

    /// Fluid set directly on this connection, if any.
    pub fn fluid(&self) -> Option<&Composition> {
        self.fluid.as_ref()
    }

    /// Constraint on `attr`, value in SI.
    pub fn spec(&self, attr: ConnAttr) -> Option<Spec> {
        self.specs.get(&attr).copied()
    }

    pub fn specs(&self) -> impl Iterator<Item = (ConnAttr, Spec)> + '_ {
        self.specs.iter().map(|(a, s)| (*a, *s))
    }

    /// Last converged state.
    pub fn state(&self) -> Option<&StreamState> {
        self.state.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_units() {
        let units = UnitSystem::engineering();
        assert!((ConnAttr::P.to_si(&units, 0.05) - 5_000.0).abs() < 1e-9);
        assert!((ConnAttr::T.from_si(&units, 289.15) - 16.0).abs() < 1e-9);
        assert_eq!(ConnAttr::M.to_si(&units, 54.0), 54.0);
    }
}
