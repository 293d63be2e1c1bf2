//! Component kinds, parameters and the component node.

use std::borrow::Cow;
use std::collections::BTreeMap;

use pc_core::ComponentId;
use serde::{Deserialize, Serialize};

use crate::char_line::CharLine;
use crate::spec::Spec;

/// Closed catalog of component kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Open boundary feeding one outlet.
    Source,
    /// Open boundary absorbing one inlet.
    Sink,
    /// Closes a loop: outlet pressure and enthalpy equal the inlet's.
    CycleCloser,
    Turbine,
    Pump,
    Compressor,
    /// One stream with a heat duty across a boundary.
    SimpleHeatExchanger,
    /// Counter-flow exchanger, hot side on port 0, cold side on port 1.
    HeatExchanger,
    /// Heat exchanger whose hot side leaves as saturated liquid.
    Condenser,
    Splitter { outlets: usize },
    Merge { inlets: usize },
}

impl ComponentKind {
    pub fn inlet_count(&self) -> usize {
        match self {
            ComponentKind::Source => 0,
            ComponentKind::HeatExchanger | ComponentKind::Condenser => 2,
            ComponentKind::Merge { inlets } => *inlets,
            _ => 1,
        }
    }

    pub fn outlet_count(&self) -> usize {
        match self {
            ComponentKind::Sink => 0,
            ComponentKind::HeatExchanger | ComponentKind::Condenser => 2,
            ComponentKind::Splitter { outlets } => *outlets,
            _ => 1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ComponentKind::Source => "Source",
            ComponentKind::Sink => "Sink",
            ComponentKind::CycleCloser => "CycleCloser",
            ComponentKind::Turbine => "Turbine",
            ComponentKind::Pump => "Pump",
            ComponentKind::Compressor => "Compressor",
            ComponentKind::SimpleHeatExchanger => "SimpleHeatExchanger",
            ComponentKind::HeatExchanger => "HeatExchanger",
            ComponentKind::Condenser => "Condenser",
            ComponentKind::Splitter { .. } => "Splitter",
            ComponentKind::Merge { .. } => "Merge",
        }
    }

    /// Parameters that can be imposed on this kind.
    pub fn parameters(&self) -> &'static [Param] {
        use Param::*;
        match self {
            ComponentKind::Turbine => &[EtaS, Pr, P, Cone, EtaSChar],
            ComponentKind::Pump | ComponentKind::Compressor => &[EtaS, Pr, P, EtaSChar],
            ComponentKind::SimpleHeatExchanger => &[Q, Pr, Zeta],
            ComponentKind::HeatExchanger | ComponentKind::Condenser => {
                &[Q, KA, KAChar, TtdU, TtdL, Pr1, Pr2, Zeta1, Zeta2]
            }
            _ => &[],
        }
    }

    pub fn accepts(&self, param: Param) -> bool {
        self.parameters().contains(&param)
    }
}

/// Component parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Param {
    /// Isentropic efficiency.
    EtaS,
    /// Pressure ratio p_out/p_in.
    Pr,
    /// Hot side pressure ratio.
    Pr1,
    /// Cold side pressure ratio.
    Pr2,
    /// Heat duty [W]; heat into the stream positive.
    Q,
    /// Power [W]; power into the fluid positive.
    P,
    /// Upper terminal temperature difference [K].
    TtdU,
    /// Lower terminal temperature difference [K].
    TtdL,
    /// Pressure loss coefficient.
    Zeta,
    Zeta1,
    Zeta2,
    /// Heat transfer coefficient times area [W/K].
    KA,
    /// Stodola cone law against the design point.
    Cone,
    /// Efficiency from the design value and a flow characteristic.
    EtaSChar,
    /// kA from the design value and flow characteristics of both sides.
    KAChar,
}

impl Param {
    /// Name used in design records.
    pub fn key(&self) -> &'static str {
        match self {
            Param::EtaS => "eta_s",
            Param::Pr => "pr",
            Param::Pr1 => "pr1",
            Param::Pr2 => "pr2",
            Param::Q => "Q",
            Param::P => "P",
            Param::TtdU => "ttd_u",
            Param::TtdL => "ttd_l",
            Param::Zeta => "zeta",
            Param::Zeta1 => "zeta1",
            Param::Zeta2 => "zeta2",
            Param::KA => "kA",
            Param::Cone => "cone",
            Param::EtaSChar => "eta_s_char",
            Param::KAChar => "kA_char",
        }
    }

    /// Characteristic parameters carry no value of their own.
    pub fn is_characteristic(&self) -> bool {
        matches!(self, Param::Cone | Param::EtaSChar | Param::KAChar)
    }
}

/// Slots where a component uses a characteristic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CharSlot {
    Efficiency,
    HotSideHeatTransfer,
    ColdSideHeatTransfer,
}

/// A typed node of the network.
#[derive(Debug, Clone)]
pub struct Component {
    pub(crate) id: ComponentId,
    pub(crate) label: String,
    pub(crate) kind: ComponentKind,
    pub(crate) params: BTreeMap<Param, Spec>,
    pub(crate) group: Option<String>,
    pub(crate) characteristics: BTreeMap<CharSlot, CharLine>,
}

impl Component {
    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Functional group tag, reporting only.
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn param(&self, param: Param) -> Option<Spec> {
        self.params.get(&param).copied()
    }

    pub fn params(&self) -> impl Iterator<Item = (Param, Spec)> + '_ {
        self.params.iter().map(|(p, s)| (*p, *s))
    }

    /// The characteristic line in use for `slot`: the user's, else the kind default.
    pub fn characteristic(&self, slot: CharSlot) -> Cow<'_, CharLine> {
        if let Some(line) = self.characteristics.get(&slot) {
            return Cow::Borrowed(line);
        }
        Cow::Owned(match (self.kind, slot) {
            (ComponentKind::Turbine, CharSlot::Efficiency) => CharLine::turbine_efficiency(),
            (ComponentKind::Pump, CharSlot::Efficiency) => CharLine::pump_efficiency(),
            (ComponentKind::Compressor, CharSlot::Efficiency) => {
                CharLine::compressor_efficiency()
            }
            (ComponentKind::Condenser, CharSlot::HotSideHeatTransfer) => {
                CharLine::heat_transfer_condensing()
            }
            (_, CharSlot::HotSideHeatTransfer | CharSlot::ColdSideHeatTransfer) => {
                CharLine::heat_transfer_single_phase()
            }
            _ => CharLine::constant(1.0),
        })
    }
}
