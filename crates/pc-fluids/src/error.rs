//! Fluid property errors.

use pc_core::CoreError;
use thiserror::Error;

/// Result type for fluid operations.
pub type FluidResult<T> = Result<T, FluidError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluidError {
    /// The provider rejected the requested state.
    #[error("State out of range for {fluid} at {input}: {reason}")]
    OutOfRange {
        fluid: String,
        input: String,
        reason: String,
    },

    /// Backend returned a value that cannot be a physical property.
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    #[error("Invalid composition: {what}")]
    InvalidComposition { what: String },

    /// Composition or state pair the backend cannot evaluate.
    #[error("Not supported: {what}")]
    NotSupported { what: &'static str },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

impl From<CoreError> for FluidError {
    fn from(err: CoreError) -> Self {
        FluidError::Backend {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_names_state() {
        let err = FluidError::OutOfRange {
            fluid: "water".into(),
            input: "p=-1 Pa, T=300 K".into(),
            reason: "pressure must be positive".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("water"));
        assert!(msg.contains("p=-1 Pa"));
    }
}
