//! State inputs and resolved fluid states.

use std::fmt;

use pc_core::units::{Density, Pressure, Temperature, k, pa};
use uom::si::mass_density::kilogram_per_cubic_meter;

/// Specific enthalpy [J/kg].
pub type SpecEnthalpy = f64;

/// Specific entropy [J/(kg·K)].
pub type SpecEntropy = f64;

/// Two independent variables fixing a state. Values are SI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateInput {
    /// Pressure [Pa] and temperature [K].
    PT { p: f64, t: f64 },
    /// Pressure [Pa] and specific enthalpy [J/kg].
    PH { p: f64, h: SpecEnthalpy },
    /// Pressure [Pa] and specific entropy [J/(kg·K)].
    PS { p: f64, s: SpecEntropy },
    /// Pressure [Pa] and vapour quality [-].
    PQ { p: f64, x: f64 },
}

impl StateInput {
    pub fn pt(p: f64, t: f64) -> Self {
        Self::PT { p, t }
    }

    pub fn ph(p: f64, h: f64) -> Self {
        Self::PH { p, h }
    }

    pub fn ps(p: f64, s: f64) -> Self {
        Self::PS { p, s }
    }

    pub fn pq(p: f64, x: f64) -> Self {
        Self::PQ { p, x }
    }

    pub fn pressure(&self) -> f64 {
        match *self {
            Self::PT { p, .. } | Self::PH { p, .. } | Self::PS { p, .. } | Self::PQ { p, .. } => p,
        }
    }
}

impl fmt::Display for StateInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::PT { p, t } => write!(f, "p={p} Pa, T={t} K"),
            Self::PH { p, h } => write!(f, "p={p} Pa, h={h} J/kg"),
            Self::PS { p, s } => write!(f, "p={p} Pa, s={s} J/kgK"),
            Self::PQ { p, x } => write!(f, "p={p} Pa, x={x}"),
        }
    }
}

/// A fully resolved state, all SI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluidState {
    pub p: f64,
    pub t: f64,
    pub h: SpecEnthalpy,
    pub s: SpecEntropy,
    pub rho: f64,
    /// Vapour quality when the state lies inside the two-phase dome.
    pub quality: Option<f64>,
}

impl FluidState {
    /// Specific volume [m³/kg].
    pub fn v(&self) -> f64 {
        1.0 / self.rho
    }

    pub fn pressure(&self) -> Pressure {
        pa(self.p)
    }

    pub fn temperature(&self) -> Temperature {
        k(self.t)
    }

    pub fn density(&self) -> Density {
        Density::new::<kilogram_per_cubic_meter>(self.rho)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_reports_pressure() {
        assert_eq!(StateInput::pq(5000.0, 0.0).pressure(), 5000.0);
        assert_eq!(StateInput::ph(1e5, 3e6).to_string(), "p=100000 Pa, h=3000000 J/kg");
    }
}
