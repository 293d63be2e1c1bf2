//! Working fluid species.

use serde::{Deserialize, Serialize};

/// Universal gas constant [J/(kmol·K)].
const R_UNIVERSAL: f64 = 8_314.462_618;

/// Working fluids and secondary streams of steam, gas and organic cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Species {
    /// Water and steam.
    Water,
    /// Carbon dioxide, the working fluid of supercritical CO₂ cycles.
    CO2,
    N2,
    O2,
    Ar,
    /// Dry air as a pseudo-pure fluid.
    Air,
    /// Organic Rankine working fluid, as is R245fa.
    Isopentane,
    R245fa,
}

impl Species {
    pub const ALL: [Species; 8] = [
        Species::Water,
        Species::CO2,
        Species::N2,
        Species::O2,
        Species::Ar,
        Species::Air,
        Species::Isopentane,
        Species::R245fa,
    ];

    /// Name used in compositions and design records.
    pub fn key(&self) -> &'static str {
        match self {
            Species::Water => "water",
            Species::CO2 => "CO2",
            Species::N2 => "N2",
            Species::O2 => "O2",
            Species::Ar => "Ar",
            Species::Air => "air",
            Species::Isopentane => "isopentane",
            Species::R245fa => "R245fa",
        }
    }

    /// Molar mass [kg/kmol].
    pub fn molar_mass(&self) -> f64 {
        match self {
            Species::Water => 18.015,
            Species::CO2 => 44.010,
            Species::N2 => 28.014,
            Species::O2 => 31.999,
            Species::Ar => 39.948,
            Species::Air => 28.965,
            Species::Isopentane => 72.151,
            Species::R245fa => 134.048,
        }
    }

    /// Specific gas constant [J/(kg·K)].
    pub fn gas_constant(&self) -> f64 {
        R_UNIVERSAL / self.molar_mass()
    }

    /// Ideal-gas cp at 300 K [J/(kg·K)], used by the perfect gas provider.
    pub fn ideal_gas_cp(&self) -> f64 {
        match self {
            Species::Water => 1_864.0,
            Species::CO2 => 846.0,
            Species::N2 => 1_040.0,
            Species::O2 => 918.0,
            Species::Ar => 520.3,
            Species::Air => 1_005.0,
            Species::Isopentane => 1_660.0,
            Species::R245fa => 906.0,
        }
    }

    pub(crate) fn rfluids_pure(&self) -> rfluids::substance::Pure {
        use rfluids::substance::Pure;
        match self {
            Species::Water => Pure::Water,
            Species::CO2 => Pure::CarbonDioxide,
            Species::N2 => Pure::Nitrogen,
            Species::O2 => Pure::Oxygen,
            Species::Ar => Pure::Argon,
            Species::Air => Pure::Air,
            Species::Isopentane => Pure::Isopentane,
            Species::R245fa => Pure::R245fa,
        }
    }
}

impl std::fmt::Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for Species {
    type Err = &'static str;

    /// Accepts the record key in any case plus a few common aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if let Some(species) = Species::ALL
            .into_iter()
            .find(|sp| sp.key().eq_ignore_ascii_case(name))
        {
            return Ok(species);
        }
        match name.to_ascii_lowercase().as_str() {
            "h2o" | "steam" => Ok(Species::Water),
            "carbon dioxide" | "carbondioxide" => Ok(Species::CO2),
            "nitrogen" => Ok(Species::N2),
            "oxygen" => Ok(Species::O2),
            "argon" => Ok(Species::Ar),
            "i-pentane" => Ok(Species::Isopentane),
            _ => Err("unknown species"),
        }
    }
}
