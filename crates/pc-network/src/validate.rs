//! Structural validation and fluid propagation.

use pc_core::ConnectionId;
use pc_fluids::Composition;

use crate::component::{Component, ComponentKind};
use crate::connection::Connection;
use crate::error::{NetworkError, NetworkResult};
use crate::topology::Topology;

/// Check every port is wired exactly once and resolve the fluid of every
/// connection.
pub(crate) fn build_topology(
    components: &[Component],
    connections: &[Connection],
) -> NetworkResult<Topology> {
    let mut inlets: Vec<Vec<Option<ConnectionId>>> = components
        .iter()
        .map(|c| vec![None; c.kind.inlet_count()])
        .collect();
    let mut outlets: Vec<Vec<Option<ConnectionId>>> = components
        .iter()
        .map(|c| vec![None; c.kind.outlet_count()])
        .collect();

    for conn in connections {
        let slot = outlets
            .get_mut(conn.source.component.index())
            .and_then(|ports| ports.get_mut(conn.source.port))
            .ok_or(NetworkError::UnknownHandle {
                what: "component",
                id: conn.source.component,
            })?;
        *slot = Some(conn.id);

        let slot = inlets
            .get_mut(conn.target.component.index())
            .and_then(|ports| ports.get_mut(conn.target.port))
            .ok_or(NetworkError::UnknownHandle {
                what: "component",
                id: conn.target.component,
            })?;
        *slot = Some(conn.id);
    }

    let resolve = |ports: Vec<Vec<Option<ConnectionId>>>, outlet: bool| {
        ports
            .into_iter()
            .zip(components)
            .map(|(ports, comp)| {
                ports
                    .into_iter()
                    .enumerate()
                    .map(|(port, conn)| {
                        conn.ok_or_else(|| NetworkError::DanglingPort {
                            component: comp.label.clone(),
                            port,
                            outlet,
                        })
                    })
                    .collect::<NetworkResult<Vec<_>>>()
            })
            .collect::<NetworkResult<Vec<_>>>()
    };
    let inlets = resolve(inlets, false)?;
    let outlets = resolve(outlets, true)?;

    let fluids = propagate_fluids(components, connections, &inlets, &outlets)?;

    Ok(Topology {
        inlets,
        outlets,
        fluids,
    })
}

/// Connections joined through a component share a fluid. Heat exchangers keep
/// their two sides apart.
fn propagate_fluids(
    components: &[Component],
    connections: &[Connection],
    inlets: &[Vec<ConnectionId>],
    outlets: &[Vec<ConnectionId>],
) -> NetworkResult<Vec<Composition>> {
    let mut parent: Vec<usize> = (0..connections.len()).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for (comp, (ins, outs)) in components.iter().zip(inlets.iter().zip(outlets)) {
        let pairs: Vec<(ConnectionId, ConnectionId)> = match comp.kind {
            ComponentKind::Source | ComponentKind::Sink => Vec::new(),
            ComponentKind::Splitter { .. } | ComponentKind::Merge { .. } => {
                let all: Vec<ConnectionId> = ins.iter().chain(outs).copied().collect();
                all.windows(2).map(|w| (w[0], w[1])).collect()
            }
            _ => ins.iter().copied().zip(outs.iter().copied()).collect(),
        };
        for (a, b) in pairs {
            let ra = find(&mut parent, a.index());
            let rb = find(&mut parent, b.index());
            parent[ra] = rb;
        }
    }

    let mut group_fluid: Vec<Option<(usize, Composition)>> = vec![None; connections.len()];
    for (i, conn) in connections.iter().enumerate() {
        let Some(fluid) = &conn.fluid else { continue };
        let root = find(&mut parent, i);
        match &group_fluid[root] {
            Some((first, existing)) if existing != fluid => {
                return Err(NetworkError::FluidConflict {
                    connection: conn.label.clone(),
                    first: format!("{} (from '{}')", existing, connections[*first].label),
                    second: fluid.to_string(),
                });
            }
            Some(_) => {}
            None => group_fluid[root] = Some((i, fluid.clone())),
        }
    }

    (0..connections.len())
        .map(|i| {
            let root = find(&mut parent, i);
            group_fluid[root]
                .as_ref()
                .map(|(_, f)| f.clone())
                .ok_or_else(|| NetworkError::MissingFluid {
                    connection: connections[i].label.clone(),
                })
        })
        .collect()
}
