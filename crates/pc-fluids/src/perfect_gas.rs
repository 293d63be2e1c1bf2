//! Perfect gas with constant heat capacity.
//!
//! Enthalpy and entropy are measured from a reference state (`t_ref`,
//! `p_ref`). Mixture constants are mass-weighted averages of the species
//! values. Useful for closed Brayton studies and as a fast, smooth provider
//! for exercising the solver.

use crate::composition::Composition;
use crate::error::FluidResult;
use crate::model::{PropertyProvider, validation};
use crate::state::{FluidState, StateInput};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerfectGasModel {
    t_ref: f64,
    p_ref: f64,
}

impl Default for PerfectGasModel {
    fn default() -> Self {
        Self {
            t_ref: 298.15,
            p_ref: 101_325.0,
        }
    }
}

impl PerfectGasModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reference state [K], [Pa] where h = 0 and s = 0.
    pub fn with_reference(t_ref: f64, p_ref: f64) -> Self {
        Self { t_ref, p_ref }
    }

    /// (cp, R) of the composition [J/(kg·K)].
    pub fn constants(&self, comp: &Composition) -> (f64, f64) {
        (
            comp.mass_average(|s| s.ideal_gas_cp()),
            comp.mass_average(|s| s.gas_constant()),
        )
    }
}

impl PropertyProvider for PerfectGasModel {
    fn name(&self) -> &str {
        "PerfectGas"
    }

    fn supports(&self, _comp: &Composition) -> bool {
        true
    }

    fn properties(&self, comp: &Composition, input: StateInput) -> FluidResult<FluidState> {
        validation::validate_input(comp, &input)?;
        let (cp, r) = self.constants(comp);
        let p = input.pressure();
        let pressure_term = r * (p / self.p_ref).ln();

        let t = match input {
            StateInput::PT { t, .. } => t,
            StateInput::PH { h, .. } => self.t_ref + h / cp,
            StateInput::PS { s, .. } => self.t_ref * ((s + pressure_term) / cp).exp(),
            StateInput::PQ { .. } => {
                return Err(validation::out_of_range(
                    comp,
                    &input,
                    "perfect gas has no saturation region",
                ));
            }
        };
        if !t.is_finite() || t <= 0.0 {
            return Err(validation::out_of_range(
                comp,
                &input,
                format!("resolved temperature {t} K is not positive"),
            ));
        }

        let state = FluidState {
            p,
            t,
            h: cp * (t - self.t_ref),
            s: cp * (t / self.t_ref).ln() - pressure_term,
            rho: p / (r * t),
            quality: None,
        };
        validation::validate_state(&state)?;
        Ok(state)
    }

    fn saturation_temperature(&self, comp: &Composition, p: f64) -> FluidResult<f64> {
        Err(validation::out_of_range(
            comp,
            &StateInput::pq(p, 0.0),
            "perfect gas has no saturation region",
        ))
    }
}
