//! Property provider trait and validation helpers.

use crate::composition::Composition;
use crate::error::{FluidError, FluidResult};
use crate::state::{FluidState, StateInput};

/// Equation-of-state boundary used by the solver.
///
/// Implementations are pure functions of their inputs: identical calls give
/// identical results and no call mutates shared state. They must be
/// thread-safe (Send + Sync) so sweeps can solve independent networks in
/// parallel against one provider.
pub trait PropertyProvider: Send + Sync {
    /// Model name (for logging).
    fn name(&self) -> &str;

    /// Check if this model can evaluate the given composition.
    fn supports(&self, comp: &Composition) -> bool;

    /// Resolve the full state from two independent variables.
    ///
    /// Fails with `FluidError::OutOfRange` when the pair is outside the
    /// model's valid region.
    fn properties(&self, comp: &Composition, input: StateInput) -> FluidResult<FluidState>;

    /// Saturation temperature [K] at pressure `p` [Pa].
    fn saturation_temperature(&self, comp: &Composition, p: f64) -> FluidResult<f64> {
        Ok(self.properties(comp, StateInput::pq(p, 0.0))?.t)
    }

    /// Vapour quality at (p, h), `None` outside the two-phase dome or for
    /// models without one.
    fn quality(&self, _comp: &Composition, _p: f64, _h: f64) -> FluidResult<Option<f64>> {
        Ok(None)
    }
}

/// Validation helpers shared by the backends.
pub(crate) mod validation {
    use super::*;

    pub fn out_of_range(comp: &Composition, input: &StateInput, reason: impl ToString) -> FluidError {
        FluidError::OutOfRange {
            fluid: comp.to_string(),
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Reject inputs no backend can make sense of.
    pub fn validate_input(comp: &Composition, input: &StateInput) -> FluidResult<()> {
        let p = input.pressure();
        if !p.is_finite() || p <= 0.0 {
            return Err(out_of_range(comp, input, "pressure must be positive and finite"));
        }
        match *input {
            StateInput::PT { t, .. } if !t.is_finite() || t <= 0.0 => Err(out_of_range(
                comp,
                input,
                "temperature must be positive and finite",
            )),
            StateInput::PH { h, .. } if !h.is_finite() => {
                Err(out_of_range(comp, input, "enthalpy must be finite"))
            }
            StateInput::PS { s, .. } if !s.is_finite() => {
                Err(out_of_range(comp, input, "entropy must be finite"))
            }
            StateInput::PQ { x, .. } if !(0.0..=1.0).contains(&x) => {
                Err(out_of_range(comp, input, "quality must lie in [0, 1]"))
            }
            _ => Ok(()),
        }
    }

    /// Ensure the backend produced a physical state.
    pub fn validate_state(state: &FluidState) -> FluidResult<()> {
        if !state.t.is_finite() || state.t <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "temperature must be positive and finite",
            });
        }
        if !state.rho.is_finite() || state.rho <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "density must be positive and finite",
            });
        }
        if !state.h.is_finite() || !state.s.is_finite() {
            return Err(FluidError::NonPhysical {
                what: "enthalpy and entropy must be finite",
            });
        }
        Ok(())
    }
}
