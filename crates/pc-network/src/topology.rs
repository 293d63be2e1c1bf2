//! Resolved wiring of a validated network.

use pc_core::{ComponentId, ConnectionId};
use pc_fluids::Composition;

/// Port-ordered incidence lists plus the fluid carried by every connection.
///
/// Produced by [`crate::NetworkGraph::validate`]; indices follow component
/// and connection ids.
#[derive(Debug, Clone)]
pub struct Topology {
    pub(crate) inlets: Vec<Vec<ConnectionId>>,
    pub(crate) outlets: Vec<Vec<ConnectionId>>,
    pub(crate) fluids: Vec<Composition>,
}

impl Topology {
    pub fn inlets(&self, comp: ComponentId) -> &[ConnectionId] {
        self.inlets.get(comp.index()).map_or(&[], Vec::as_slice)
    }

    pub fn outlets(&self, comp: ComponentId) -> &[ConnectionId] {
        self.outlets.get(comp.index()).map_or(&[], Vec::as_slice)
    }

    pub fn fluid(&self, conn: ConnectionId) -> Option<&Composition> {
        self.fluids.get(conn.index())
    }

    pub fn fluids(&self) -> &[Composition] {
        &self.fluids
    }
}
