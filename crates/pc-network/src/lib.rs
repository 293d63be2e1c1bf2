//! pc-network: the cycle model.
//!
//! A [`NetworkGraph`] owns typed components, the directed connections between
//! their ports, and buses. Constraints are tagged with a [`Spec`] that decides
//! whether they hold in design mode, off-design mode or both.

pub mod bus;
pub mod char_line;
pub mod component;
pub mod connection;
pub mod error;
pub mod graph;
pub mod spec;
pub mod topology;
mod validate;

pub use bus::{Bus, BusBase, BusMember, Efficiency};
pub use char_line::CharLine;
pub use component::{CharSlot, Component, ComponentKind, Param};
pub use connection::{ConnAttr, Connection, PortRef, StreamState};
pub use error::{NetworkError, NetworkResult};
pub use graph::NetworkGraph;
pub use spec::{SolveMode, Spec, SpecSource};
pub use topology::Topology;
