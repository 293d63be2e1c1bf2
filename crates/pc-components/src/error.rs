//! Error types for component equations.

use pc_fluids::FluidError;
use thiserror::Error;

/// Errors raised while evaluating component equations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("Non-physical value at '{component}': {what}")]
    NonPhysical {
        component: String,
        what: &'static str,
    },

    #[error("'{component}' ({kind}) has no equation for parameter '{param}'")]
    NotSupported {
        component: String,
        kind: &'static str,
        param: &'static str,
    },

    #[error("'{component}' has no {side} port {port}")]
    MissingPort {
        component: String,
        port: usize,
        side: &'static str,
    },

    #[error("Design reference of '{component}' lacks '{key}'")]
    MissingDesignValue {
        component: String,
        key: &'static str,
    },

    #[error(transparent)]
    Fluid(#[from] FluidError),
}

pub type ComponentResult<T> = Result<T, ComponentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ComponentError::MissingDesignValue {
            component: "turbine".into(),
            key: "eta_s",
        };
        assert!(err.to_string().contains("eta_s"));
    }

    #[test]
    fn fluid_errors_pass_through() {
        let err: ComponentError = FluidError::NonPhysical { what: "density" }.into();
        assert!(err.to_string().contains("density"));
    }
}
