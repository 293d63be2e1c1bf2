//! Design record types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{DesignError, DesignResult};

/// Bumped whenever the record layout changes; older records are rejected.
pub const SCHEMA_VERSION: u32 = 1;

/// Sizing results of one converged design solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignState {
    pub schema_version: u32,
    /// RFC 3339 creation time.
    pub created: String,
    /// Topology fingerprint of the network that produced the record.
    pub fingerprint: String,
    pub components: BTreeMap<String, ComponentDesign>,
    pub connections: BTreeMap<String, StreamDesign>,
}

/// Reference values for one component, keyed by its label in [`DesignState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDesign {
    pub kind: String,
    /// Bus energy term at design [W]; produced power and heat into the cycle positive.
    pub energy: f64,
    /// Design value of every parameter computable from the converged streams,
    /// keyed by parameter name (`eta_s`, `pr`, `kA`, ...).
    pub params: BTreeMap<String, f64>,
    pub inlets: Vec<StreamDesign>,
    pub outlets: Vec<StreamDesign>,
}

/// Stream reference, SI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamDesign {
    pub m: f64,
    pub p: f64,
    pub h: f64,
    pub t: f64,
    pub s: f64,
    /// Specific volume [m³/kg].
    pub v: f64,
}

impl StreamDesign {
    /// Volumetric flow [m³/s].
    pub fn volumetric_flow(&self) -> f64 {
        self.m * self.v
    }
}

impl DesignState {
    pub fn new(fingerprint: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            created: chrono::Utc::now().to_rfc3339(),
            fingerprint: fingerprint.into(),
            components: BTreeMap::new(),
            connections: BTreeMap::new(),
        }
    }

    pub fn component(&self, label: &str) -> DesignResult<&ComponentDesign> {
        self.components
            .get(label)
            .ok_or_else(|| DesignError::MissingEntry {
                what: format!("component '{label}'"),
            })
    }

    pub fn connection(&self, label: &str) -> DesignResult<&StreamDesign> {
        self.connections
            .get(label)
            .ok_or_else(|| DesignError::MissingEntry {
                what: format!("connection '{label}'"),
            })
    }

    pub fn ensure_fingerprint(&self, expected: &str) -> DesignResult<()> {
        if self.fingerprint == expected {
            Ok(())
        } else {
            Err(DesignError::FingerprintMismatch {
                expected: expected.to_string(),
                found: self.fingerprint.clone(),
            })
        }
    }
}

impl ComponentDesign {
    pub fn param(&self, key: &str) -> Option<f64> {
        self.params.get(key).copied()
    }

    pub fn inlet(&self, index: usize) -> Option<&StreamDesign> {
        self.inlets.get(index)
    }

    pub fn outlet(&self, index: usize) -> Option<&StreamDesign> {
        self.outlets.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_component_is_reported_by_label() {
        let state = DesignState::new("abc");
        let err = state.component("feed pump").unwrap_err();
        assert!(err.to_string().contains("feed pump"));
    }

    #[test]
    fn fingerprint_check() {
        let state = DesignState::new("abc");
        assert!(state.ensure_fingerprint("abc").is_ok());
        assert!(matches!(
            state.ensure_fingerprint("def"),
            Err(DesignError::FingerprintMismatch { .. })
        ));
    }

    #[test]
    fn created_timestamp_parses() {
        let state = DesignState::new("abc");
        assert!(chrono::DateTime::parse_from_rfc3339(&state.created).is_ok());
    }
}
