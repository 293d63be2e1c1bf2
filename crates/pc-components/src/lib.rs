//! pc-components: equation library for cycle components.
//!
//! Every [`ComponentKind`] maps to a stateless [`ComponentModel`] that
//! contributes:
//! - structural equations (mass balances, equalities, energy balances)
//! - one residual per imposed parameter, from a value or a characteristic
//!   against the design record
//! - measured parameter values and an energy term for buses and design capture
//!
//! # Example
//!
//! ```no_run
//! use pc_components::{ComponentContext, ParamTarget, PortState, model_for};
//! use pc_core::UnitSystem;
//! use pc_fluids::{Composition, PerfectGasModel, Species};
//! use pc_network::{ComponentKind, NetworkGraph, Param};
//!
//! let mut graph = NetworkGraph::new(UnitSystem::si());
//! let id = graph.add_component(ComponentKind::Compressor, "compressor").unwrap();
//! let air = Composition::pure(Species::Air);
//! let inlet = [PortState { m: 10.0, p: 1e5, h: 1.7e3, fluid: &air }];
//! let outlet = [PortState { m: 10.0, p: 4e5, h: 1.75e5, fluid: &air }];
//!
//! let ctx = ComponentContext {
//!     component: graph.component(id).unwrap(),
//!     provider: &PerfectGasModel::new(),
//!     inlets: &inlet,
//!     outlets: &outlet,
//! };
//! let model = model_for(ComponentKind::Compressor);
//! let r = model.parameter(&ctx, Param::EtaS, ParamTarget::Value(0.85)).unwrap();
//! println!("efficiency residual: {r}");
//! ```

pub mod boundary;
pub mod branch;
pub mod common;
pub mod context;
pub mod design;
pub mod error;
pub mod heat_exchanger;
pub mod traits;
pub mod turbomachine;

pub use boundary::{Boundary, CycleCloser};
pub use branch::{Merge, Splitter};
pub use context::{ComponentContext, PortState};
pub use design::{capture, stream_design};
pub use error::{ComponentError, ComponentResult};
pub use heat_exchanger::{HeatExchanger, SimpleHeatExchanger};
pub use traits::{ComponentModel, ParamTarget};
pub use turbomachine::{MachineRole, Turbomachine};

use pc_network::ComponentKind;

/// The equation model of a component kind.
pub fn model_for(kind: ComponentKind) -> Box<dyn ComponentModel> {
    match kind {
        ComponentKind::Source | ComponentKind::Sink => Box::new(Boundary),
        ComponentKind::CycleCloser => Box::new(CycleCloser),
        ComponentKind::Turbine => Box::new(Turbomachine::new(MachineRole::Turbine)),
        ComponentKind::Pump => Box::new(Turbomachine::new(MachineRole::Pump)),
        ComponentKind::Compressor => Box::new(Turbomachine::new(MachineRole::Compressor)),
        ComponentKind::SimpleHeatExchanger => Box::new(SimpleHeatExchanger),
        ComponentKind::HeatExchanger => Box::new(HeatExchanger::new(false)),
        ComponentKind::Condenser => Box::new(HeatExchanger::new(true)),
        ComponentKind::Splitter { .. } => Box::new(Splitter),
        ComponentKind::Merge { .. } => Box::new(Merge),
    }
}
