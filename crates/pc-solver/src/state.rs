//! Read-only snapshot of a converged solve.

use pc_core::UnitSystem;
use pc_network::{ConnAttr, SolveMode};
use serde::{Deserialize, Serialize};

/// Resolved stream of one connection, in the network's units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionResult {
    pub label: String,
    /// Mass flow [kg/s].
    pub m: f64,
    pub p: f64,
    pub h: f64,
    pub t: f64,
    pub s: f64,
    /// Volumetric flow [m³/s].
    pub v: f64,
    /// Vapour quality inside the two-phase region.
    pub quality: Option<f64>,
}

/// Energy term of one component (W, produced power and released heat positive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentReport {
    pub label: String,
    pub kind: String,
    pub group: Option<String>,
    pub energy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusReport {
    pub label: String,
    /// Net bus value [W].
    pub value: f64,
}

/// Result of a successful solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergedState {
    pub mode: SolveMode,
    pub iterations: usize,
    pub residual_norm: f64,
    /// Accepted at the configured stall tolerance, above `tolerance`.
    #[serde(default)]
    pub stalled: bool,
    pub units: UnitSystem,
    pub connections: Vec<ConnectionResult>,
    pub components: Vec<ComponentReport>,
    pub buses: Vec<BusReport>,
    /// Enthalpy flow leaving through sinks minus entering through sources [W].
    pub(crate) boundary_heat: f64,
}

impl ConvergedState {
    pub fn connection(&self, label: &str) -> Option<&ConnectionResult> {
        self.connections.iter().find(|c| c.label == label)
    }

    pub fn component(&self, label: &str) -> Option<&ComponentReport> {
        self.components.iter().find(|c| c.label == label)
    }

    pub fn bus(&self, label: &str) -> Option<f64> {
        self.buses.iter().find(|b| b.label == label).map(|b| b.value)
    }

    /// Sum of the energy terms of every component in `group`.
    pub fn group_energy(&self, group: &str) -> f64 {
        self.components
            .iter()
            .filter(|c| c.group.as_deref() == Some(group))
            .map(|c| c.energy)
            .sum()
    }

    pub fn boundary_heat(&self) -> f64 {
        self.boundary_heat
    }

    /// Temperature of a connection in Kelvin, whatever the network units.
    pub fn temperature_si(&self, label: &str) -> Option<f64> {
        self.connection(label)
            .map(|c| ConnAttr::T.to_si(&self.units, c.t))
    }
}
