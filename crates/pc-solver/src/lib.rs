//! Steady-state solver for power-cycle networks.
//!
//! The unknowns are the mass flow, pressure and specific enthalpy of every
//! connection that is not fixed by a constraint. Component equations and
//! remaining constraints form a square system of scaled residuals, solved by
//! a damped Newton iteration with a finite-difference Jacobian. Temperature,
//! entropy and specific volume are always derived from (p, h) through the
//! property provider.
//!
//! # Example
//!
//! ```no_run
//! use pc_core::UnitSystem;
//! use pc_fluids::{Composition, PerfectGasModel, Species};
//! use pc_network::{ComponentKind, ConnAttr, NetworkGraph, Param, SolveMode, Spec};
//! use pc_solver::Solver;
//!
//! let mut graph = NetworkGraph::new(UnitSystem::si());
//! let source = graph.add_component(ComponentKind::Source, "source").unwrap();
//! let heater = graph.add_component(ComponentKind::SimpleHeatExchanger, "heater").unwrap();
//! let sink = graph.add_component(ComponentKind::Sink, "sink").unwrap();
//! let inlet = graph.add_connection(source, 0, heater, 0, "in").unwrap();
//! graph.add_connection(heater, 0, sink, 0, "out").unwrap();
//!
//! graph.set_fluid(inlet, Composition::pure(Species::Air)).unwrap();
//! graph.set_connection(inlet, ConnAttr::M, Spec::Fixed(2.0)).unwrap();
//! graph.set_connection(inlet, ConnAttr::P, Spec::Fixed(1e5)).unwrap();
//! graph.set_connection(inlet, ConnAttr::T, Spec::Fixed(300.0)).unwrap();
//! graph.set_component(heater, Param::Q, Spec::Fixed(2e5)).unwrap();
//! graph.set_component(heater, Param::Pr, Spec::Fixed(0.98)).unwrap();
//!
//! let model = PerfectGasModel::new();
//! let state = Solver::new(&model).solve(&mut graph, SolveMode::Design).unwrap();
//! println!("outlet at {:.1} K", state.connection("out").unwrap().t);
//! ```

pub mod bus;
pub mod config;
pub mod error;
mod initialization;
pub mod jacobian;
pub mod newton;
pub mod solve;
pub mod state;
pub mod sweep;
pub mod system;

pub use config::SolverConfig;
pub use error::{SolverError, SolverResult};
pub use newton::{Control, IterationProgress, NonlinearSystem};
pub use solve::Solver;
pub use state::{BusReport, ComponentReport, ConnectionResult, ConvergedState};
pub use sweep::{SweepDriver, SweepPoint};
pub use system::{EquationSystem, Slot, Var};
