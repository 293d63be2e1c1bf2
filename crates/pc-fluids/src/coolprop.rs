//! CoolProp-based property provider.

use crate::composition::Composition;
use crate::error::{FluidError, FluidResult};
use crate::model::{PropertyProvider, validation};
use crate::state::{FluidState, StateInput};
use rfluids::prelude::*;

/// CoolProp backend (Helmholtz equations of state through `rfluids`).
///
/// Pure fluids only. Every call builds a fresh backend state, so the model
/// holds no mutable data and is safe to share across threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoolPropModel {}

impl CoolPropModel {
    pub fn new() -> Self {
        Self {}
    }

    fn pure_for(&self, comp: &Composition) -> FluidResult<Pure> {
        comp.is_pure()
            .map(|species| species.rfluids_pure())
            .ok_or(FluidError::NotSupported {
                what: "CoolProp backend evaluates pure fluids only",
            })
    }

    fn backend_error(what: &str, err: impl std::fmt::Display) -> FluidError {
        FluidError::Backend {
            message: format!("rfluids error getting {what}: {err}"),
        }
    }
}

impl PropertyProvider for CoolPropModel {
    fn name(&self) -> &str {
        "CoolProp"
    }

    fn supports(&self, comp: &Composition) -> bool {
        comp.is_pure().is_some()
    }

    fn properties(&self, comp: &Composition, input: StateInput) -> FluidResult<FluidState> {
        validation::validate_input(comp, &input)?;
        let pure = self.pure_for(comp)?;

        let (first, second) = match input {
            StateInput::PT { p, t } => (FluidInput::pressure(p), FluidInput::temperature(t)),
            StateInput::PH { p, h } => (FluidInput::pressure(p), FluidInput::enthalpy(h)),
            StateInput::PS { p, s } => (FluidInput::pressure(p), FluidInput::entropy(s)),
            StateInput::PQ { p, x } => (FluidInput::pressure(p), FluidInput::quality(x)),
        };

        let mut fluid = Fluid::from(pure)
            .in_state(first, second)
            .map_err(|e| validation::out_of_range(comp, &input, e))?;

        let state = FluidState {
            p: input.pressure(),
            t: fluid
                .temperature()
                .map_err(|e| Self::backend_error("temperature", e))?,
            h: fluid
                .enthalpy()
                .map_err(|e| Self::backend_error("enthalpy", e))?,
            s: fluid
                .entropy()
                .map_err(|e| Self::backend_error("entropy", e))?,
            rho: fluid
                .density()
                .map_err(|e| Self::backend_error("density", e))?,
            quality: match input {
                StateInput::PQ { x, .. } => Some(x),
                _ => None,
            },
        };
        validation::validate_state(&state)?;
        Ok(state)
    }

    fn quality(&self, comp: &Composition, p: f64, h: f64) -> FluidResult<Option<f64>> {
        // Above the critical pressure the saturation flash fails: no dome.
        let Ok(liquid) = self.properties(comp, StateInput::pq(p, 0.0)) else {
            return Ok(None);
        };
        let vapour = self.properties(comp, StateInput::pq(p, 1.0))?;
        let x = (h - liquid.h) / (vapour.h - liquid.h);
        Ok((0.0..=1.0).contains(&x).then_some(x))
    }
}
