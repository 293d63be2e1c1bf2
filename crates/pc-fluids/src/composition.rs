//! Fluid composition as mass fractions.

use std::fmt;

use crate::error::{FluidError, FluidResult};
use crate::species::Species;
use pc_core::numeric::{Tolerances, nearly_equal};
use serde::{Deserialize, Serialize};

/// Fluid composition defined by mass fractions.
///
/// Always normalized (fractions sum to 1.0) and sorted by species so two
/// compositions built in a different order compare equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    items: Vec<(Species, f64)>,
}

impl Composition {
    pub fn pure(species: Species) -> Self {
        Self {
            items: vec![(species, 1.0)],
        }
    }

    /// Create a composition from mass fractions.
    ///
    /// Fractions must be finite and non-negative with a positive sum; they are
    /// normalized to sum to one.
    pub fn from_mass_fractions(fractions: Vec<(Species, f64)>) -> FluidResult<Self> {
        if fractions.is_empty() {
            return Err(FluidError::InvalidComposition {
                what: "empty composition".into(),
            });
        }

        let mut merged: Vec<(Species, f64)> = Vec::with_capacity(fractions.len());
        for (species, frac) in fractions {
            if !frac.is_finite() || frac < 0.0 {
                return Err(FluidError::InvalidComposition {
                    what: format!("mass fraction of {species} is {frac}"),
                });
            }
            match merged.iter_mut().find(|(s, _)| *s == species) {
                Some((_, f)) => *f += frac,
                None => merged.push((species, frac)),
            }
        }

        let sum: f64 = merged.iter().map(|(_, f)| f).sum();
        if sum <= 0.0 {
            return Err(FluidError::InvalidComposition {
                what: "mass fractions sum to zero".into(),
            });
        }

        let mut items: Vec<(Species, f64)> = merged
            .into_iter()
            .map(|(s, f)| (s, f / sum))
            .filter(|(_, f)| *f > 1e-15)
            .collect();
        items.sort_by_key(|(s, _)| *s);

        Ok(Self { items })
    }

    /// Build from substance names, e.g. `[("water", 1.0)]`.
    pub fn from_names(fractions: &[(&str, f64)]) -> FluidResult<Self> {
        let parsed = fractions
            .iter()
            .map(|(name, f)| {
                name.parse::<Species>()
                    .map(|s| (s, *f))
                    .map_err(|_| FluidError::InvalidComposition {
                        what: format!("unknown substance '{name}'"),
                    })
            })
            .collect::<FluidResult<Vec<_>>>()?;
        Self::from_mass_fractions(parsed)
    }

    pub fn mass_fraction(&self, species: Species) -> f64 {
        self.items
            .iter()
            .find(|(s, _)| *s == species)
            .map(|(_, f)| *f)
            .unwrap_or(0.0)
    }

    /// Returns `Some(species)` if a single species carries all the mass.
    pub fn is_pure(&self) -> Option<Species> {
        match self.items.as_slice() {
            [(species, frac)] if nearly_equal(*frac, 1.0, Tolerances::new(1e-10, 1e-10)) => {
                Some(*species)
            }
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Species, f64)> + '_ {
        self.items.iter().copied()
    }

    /// Mass-weighted mixture property.
    pub fn mass_average(&self, property: impl Fn(Species) -> f64) -> f64 {
        self.items.iter().map(|(s, f)| f * property(*s)).sum()
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(species) = self.is_pure() {
            return write!(f, "{species}");
        }
        let parts: Vec<String> = self
            .items
            .iter()
            .map(|(s, frac)| format!("{s}:{frac:.4}"))
            .collect();
        f.write_str(&parts.join(","))
    }
}
