//! Buses: plant-level aggregation of component energy terms.

use pc_core::{BusId, ComponentId};

use crate::char_line::CharLine;

/// Conversion efficiency of a bus member.
#[derive(Debug, Clone, PartialEq)]
pub enum Efficiency {
    Constant(f64),
    /// Efficiency over load fraction (energy / design energy).
    Curve(CharLine),
}

impl Efficiency {
    pub fn at_load(&self, load: f64) -> f64 {
        match self {
            Efficiency::Constant(eta) => *eta,
            Efficiency::Curve(line) => line.evaluate(load),
        }
    }
}

/// Where the efficiency sits relative to the component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusBase {
    /// The component's energy is the input: bus value = energy · eta
    /// (a generator behind a turbine).
    Component,
    /// The bus side is the input: bus value = energy / eta
    /// (a motor driving a pump, a boiler burning fuel).
    Bus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BusMember {
    pub component: ComponentId,
    pub efficiency: Efficiency,
    pub base: BusBase,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bus {
    pub(crate) id: BusId,
    pub(crate) label: String,
    pub(crate) members: Vec<BusMember>,
}

impl Bus {
    pub fn id(&self) -> BusId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn members(&self) -> &[BusMember] {
        &self.members
    }
}
