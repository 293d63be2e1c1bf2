// pc-core/src/units.rs

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uom::si::f64::{
    AvailableEnergy as UomAvailableEnergy, MassDensity as UomMassDensity,
    Pressure as UomPressure, SpecificHeatCapacity as UomSpecificHeatCapacity,
    ThermodynamicTemperature as UomThermodynamicTemperature,
};

use crate::{CoreError, CoreResult};

// Canonical unit types (SI, f64)
pub type Density = UomMassDensity;
pub type Pressure = UomPressure;
pub type SpecificEnergy = UomAvailableEnergy;
pub type SpecificEntropy = UomSpecificHeatCapacity;
pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn j_per_kg(v: f64) -> SpecificEnergy {
    use uom::si::available_energy::joule_per_kilogram;
    SpecificEnergy::new::<joule_per_kilogram>(v)
}

#[inline]
pub fn j_per_kg_k(v: f64) -> SpecificEntropy {
    use uom::si::specific_heat_capacity::joule_per_kilogram_kelvin;
    SpecificEntropy::new::<joule_per_kilogram_kelvin>(v)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    Kelvin,
    Celsius,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PressureUnit {
    #[default]
    Pascal,
    Kilopascal,
    Bar,
    Megapascal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnthalpyUnit {
    #[default]
    JoulePerKilogram,
    KilojoulePerKilogram,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EntropyUnit {
    #[default]
    JoulePerKilogramKelvin,
    KilojoulePerKilogramKelvin,
}

/// Units a network speaks at its API boundary.
///
/// Everything inside the solver is SI; values handed to the constraint API
/// and values reported in results go through this table. Mass flow is always
/// kg/s and volumetric flow m³/s.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnitSystem {
    pub temperature: TemperatureUnit,
    pub pressure: PressureUnit,
    pub enthalpy: EnthalpyUnit,
    pub entropy: EntropyUnit,
}

impl UnitSystem {
    /// Pure SI: K, Pa, J/kg, J/(kg·K).
    pub fn si() -> Self {
        Self::default()
    }

    /// °C, bar, kJ/kg, kJ/(kg·K), the usual plant engineering set.
    pub fn engineering() -> Self {
        Self {
            temperature: TemperatureUnit::Celsius,
            pressure: PressureUnit::Bar,
            enthalpy: EnthalpyUnit::KilojoulePerKilogram,
            entropy: EntropyUnit::KilojoulePerKilogramKelvin,
        }
    }

    pub fn temperature_to_si(&self, v: f64) -> f64 {
        use uom::si::thermodynamic_temperature::{degree_celsius, kelvin};
        match self.temperature {
            TemperatureUnit::Kelvin => v,
            TemperatureUnit::Celsius => Temperature::new::<degree_celsius>(v).get::<kelvin>(),
        }
    }

    pub fn temperature_from_si(&self, v: f64) -> f64 {
        use uom::si::thermodynamic_temperature::degree_celsius;
        match self.temperature {
            TemperatureUnit::Kelvin => v,
            TemperatureUnit::Celsius => k(v).get::<degree_celsius>(),
        }
    }

    pub fn pressure_to_si(&self, v: f64) -> f64 {
        use uom::si::pressure::{bar, kilopascal, megapascal, pascal};
        match self.pressure {
            PressureUnit::Pascal => v,
            PressureUnit::Kilopascal => Pressure::new::<kilopascal>(v).get::<pascal>(),
            PressureUnit::Bar => Pressure::new::<bar>(v).get::<pascal>(),
            PressureUnit::Megapascal => Pressure::new::<megapascal>(v).get::<pascal>(),
        }
    }

    pub fn pressure_from_si(&self, v: f64) -> f64 {
        use uom::si::pressure::{bar, kilopascal, megapascal};
        match self.pressure {
            PressureUnit::Pascal => v,
            PressureUnit::Kilopascal => pa(v).get::<kilopascal>(),
            PressureUnit::Bar => pa(v).get::<bar>(),
            PressureUnit::Megapascal => pa(v).get::<megapascal>(),
        }
    }

    pub fn enthalpy_to_si(&self, v: f64) -> f64 {
        use uom::si::available_energy::{joule_per_kilogram, kilojoule_per_kilogram};
        match self.enthalpy {
            EnthalpyUnit::JoulePerKilogram => v,
            EnthalpyUnit::KilojoulePerKilogram => {
                SpecificEnergy::new::<kilojoule_per_kilogram>(v).get::<joule_per_kilogram>()
            }
        }
    }

    pub fn enthalpy_from_si(&self, v: f64) -> f64 {
        use uom::si::available_energy::kilojoule_per_kilogram;
        match self.enthalpy {
            EnthalpyUnit::JoulePerKilogram => v,
            EnthalpyUnit::KilojoulePerKilogram => j_per_kg(v).get::<kilojoule_per_kilogram>(),
        }
    }

    pub fn entropy_to_si(&self, v: f64) -> f64 {
        use uom::si::specific_heat_capacity::{
            joule_per_kilogram_kelvin, kilojoule_per_kilogram_kelvin,
        };
        match self.entropy {
            EntropyUnit::JoulePerKilogramKelvin => v,
            EntropyUnit::KilojoulePerKilogramKelvin => {
                SpecificEntropy::new::<kilojoule_per_kilogram_kelvin>(v)
                    .get::<joule_per_kilogram_kelvin>()
            }
        }
    }

    pub fn entropy_from_si(&self, v: f64) -> f64 {
        use uom::si::specific_heat_capacity::kilojoule_per_kilogram_kelvin;
        match self.entropy {
            EntropyUnit::JoulePerKilogramKelvin => v,
            EntropyUnit::KilojoulePerKilogramKelvin => {
                j_per_kg_k(v).get::<kilojoule_per_kilogram_kelvin>()
            }
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim() {
            "K" | "kelvin" => Ok(Self::Kelvin),
            "C" | "°C" | "degC" | "celsius" => Ok(Self::Celsius),
            other => Err(CoreError::UnknownUnit {
                quantity: "temperature",
                unit: other.to_string(),
            }),
        }
    }
}

impl FromStr for PressureUnit {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim() {
            "Pa" => Ok(Self::Pascal),
            "kPa" => Ok(Self::Kilopascal),
            "bar" => Ok(Self::Bar),
            "MPa" => Ok(Self::Megapascal),
            other => Err(CoreError::UnknownUnit {
                quantity: "pressure",
                unit: other.to_string(),
            }),
        }
    }
}

impl FromStr for EnthalpyUnit {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.replace(' ', "").as_str() {
            "J/kg" => Ok(Self::JoulePerKilogram),
            "kJ/kg" => Ok(Self::KilojoulePerKilogram),
            other => Err(CoreError::UnknownUnit {
                quantity: "enthalpy",
                unit: other.to_string(),
            }),
        }
    }
}

impl FromStr for EntropyUnit {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.replace(' ', "").as_str() {
            "J/kgK" | "J/(kgK)" => Ok(Self::JoulePerKilogramKelvin),
            "kJ/kgK" | "kJ/(kgK)" => Ok(Self::KilojoulePerKilogramKelvin),
            other => Err(CoreError::UnknownUnit {
                quantity: "entropy",
                unit: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = match self.temperature {
            TemperatureUnit::Kelvin => "K",
            TemperatureUnit::Celsius => "°C",
        };
        let p = match self.pressure {
            PressureUnit::Pascal => "Pa",
            PressureUnit::Kilopascal => "kPa",
            PressureUnit::Bar => "bar",
            PressureUnit::Megapascal => "MPa",
        };
        let h = match self.enthalpy {
            EnthalpyUnit::JoulePerKilogram => "J/kg",
            EnthalpyUnit::KilojoulePerKilogram => "kJ/kg",
        };
        write!(f, "T[{t}] p[{p}] h[{h}]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engineering_units_convert() {
        let units = UnitSystem::engineering();
        assert!((units.temperature_to_si(384.0) - 657.15).abs() < 1e-9);
        assert!((units.pressure_to_si(104.0) - 104e5).abs() < 1e-6);
        assert!((units.enthalpy_to_si(2.5) - 2500.0).abs() < 1e-9);
        assert!((units.entropy_from_si(6500.0) - 6.5).abs() < 1e-12);
    }

    #[test]
    fn si_is_identity() {
        let units = UnitSystem::si();
        assert_eq!(units.pressure_to_si(5000.0), 5000.0);
        assert_eq!(units.temperature_from_si(300.0), 300.0);
    }

    #[test]
    fn unit_names_parse() {
        assert_eq!("°C".parse::<TemperatureUnit>().unwrap(), TemperatureUnit::Celsius);
        assert_eq!("kJ / kg".parse::<EnthalpyUnit>().unwrap(), EnthalpyUnit::KilojoulePerKilogram);
        assert!("psi".parse::<PressureUnit>().is_err());
    }

    #[test]
    fn unit_system_serializes() {
        let json = serde_json::to_string(&UnitSystem::engineering()).unwrap();
        let back: UnitSystem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, UnitSystem::engineering());
    }
}
