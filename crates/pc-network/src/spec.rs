//! Constraint tags and solve modes.

use serde::{Deserialize, Serialize};

/// Which set of constraints a solve enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolveMode {
    /// Sizing solve; records a design reference on success.
    Design,
    /// Performance solve against a previously recorded design reference.
    OffDesign,
}

impl std::fmt::Display for SolveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveMode::Design => f.write_str("design"),
            SolveMode::OffDesign => f.write_str("off-design"),
        }
    }
}

/// How a connection attribute or component parameter is imposed.
///
/// Anything without a `Spec` is free and solved for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Spec {
    /// Enforced in every mode.
    Fixed(f64),
    /// Enforced in design mode, free off-design.
    Design(f64),
    /// Enforced off-design at the value the design solve produced.
    OffDesign,
    /// Enforced off-design at a given value, free in design mode.
    OffDesignValue(f64),
}

/// Where an active constraint takes its value from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpecSource {
    Value(f64),
    DesignReference,
}

impl Spec {
    /// The constraint in force for `mode`, if any.
    pub fn resolve(&self, mode: SolveMode) -> Option<SpecSource> {
        match (self, mode) {
            (Spec::Fixed(v), _) => Some(SpecSource::Value(*v)),
            (Spec::Design(v), SolveMode::Design) => Some(SpecSource::Value(*v)),
            (Spec::Design(_), SolveMode::OffDesign) => None,
            (Spec::OffDesign, SolveMode::OffDesign) => Some(SpecSource::DesignReference),
            (Spec::OffDesign, SolveMode::Design) => None,
            (Spec::OffDesignValue(v), SolveMode::OffDesign) => Some(SpecSource::Value(*v)),
            (Spec::OffDesignValue(_), SolveMode::Design) => None,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Spec::Fixed(v) | Spec::Design(v) | Spec::OffDesignValue(v) => Some(*v),
            Spec::OffDesign => None,
        }
    }

    pub(crate) fn map_value(self, f: impl Fn(f64) -> f64) -> Self {
        match self {
            Spec::Fixed(v) => Spec::Fixed(f(v)),
            Spec::Design(v) => Spec::Design(f(v)),
            Spec::OffDesignValue(v) => Spec::OffDesignValue(f(v)),
            Spec::OffDesign => Spec::OffDesign,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_per_mode() {
        assert_eq!(
            Spec::Fixed(1.0).resolve(SolveMode::OffDesign),
            Some(SpecSource::Value(1.0))
        );
        assert_eq!(
            Spec::Design(2.0).resolve(SolveMode::Design),
            Some(SpecSource::Value(2.0))
        );
        assert_eq!(Spec::Design(2.0).resolve(SolveMode::OffDesign), None);
        assert_eq!(Spec::OffDesign.resolve(SolveMode::Design), None);
        assert_eq!(
            Spec::OffDesign.resolve(SolveMode::OffDesign),
            Some(SpecSource::DesignReference)
        );
        assert_eq!(Spec::OffDesignValue(3.0).resolve(SolveMode::Design), None);
        assert_eq!(
            Spec::OffDesignValue(3.0).resolve(SolveMode::OffDesign),
            Some(SpecSource::Value(3.0))
        );
    }

    #[test]
    fn off_design_values_are_converted_like_any_other() {
        let converted = Spec::OffDesignValue(2.0).map_value(|v| v * 1e5);
        assert_eq!(converted, Spec::OffDesignValue(2e5));
        assert_eq!(Spec::OffDesign.map_value(|v| v * 1e5), Spec::OffDesign);
    }
}
