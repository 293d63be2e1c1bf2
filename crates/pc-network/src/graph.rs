//! The network: components, connections and buses with their constraints.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use pc_core::{BusId, ComponentId, ConnectionId, Id, UnitSystem};
use pc_design::{DesignArchive, DesignError, DesignResult, DesignState, topology_fingerprint};
use pc_fluids::Composition;

use crate::bus::{Bus, BusBase, BusMember, Efficiency};
use crate::char_line::CharLine;
use crate::component::{CharSlot, Component, ComponentKind, Param};
use crate::connection::{ConnAttr, Connection, PortRef, StreamState};
use crate::error::{NetworkError, NetworkResult};
use crate::spec::{SolveMode, Spec};
use crate::topology::Topology;
use crate::validate;

/// Owns the whole cycle model between solves.
///
/// Constraint values enter in the network's [`UnitSystem`] and are stored in
/// SI. The graph also remembers the last converged stream states (warm start
/// and reporting) and the design reference used by off-design solves.
#[derive(Debug, Clone, Default)]
pub struct NetworkGraph {
    units: UnitSystem,
    components: Vec<Component>,
    connections: Vec<Connection>,
    buses: Vec<Bus>,
    mode: Option<SolveMode>,
    design: Option<Arc<DesignState>>,
}

impl NetworkGraph {
    pub fn new(units: UnitSystem) -> Self {
        Self {
            units,
            ..Self::default()
        }
    }

    pub fn units(&self) -> UnitSystem {
        self.units
    }

    fn label_taken(&self, label: &str) -> bool {
        self.components.iter().any(|c| c.label == label)
            || self.connections.iter().any(|c| c.label == label)
            || self.buses.iter().any(|b| b.label == label)
    }

    fn check_label(&self, label: &str) -> NetworkResult<()> {
        if self.label_taken(label) {
            Err(NetworkError::DuplicateLabel {
                label: label.to_string(),
            })
        } else {
            Ok(())
        }
    }

    pub fn add_component(
        &mut self,
        kind: ComponentKind,
        label: impl Into<String>,
    ) -> NetworkResult<ComponentId> {
        let label = label.into();
        self.check_label(&label)?;
        let branches = match kind {
            ComponentKind::Splitter { outlets } => Some(outlets),
            ComponentKind::Merge { inlets } => Some(inlets),
            _ => None,
        };
        if let Some(count) = branches
            && count < 2
        {
            return Err(NetworkError::InvalidBranchCount {
                component: label,
                count,
            });
        }

        let id = ComponentId::from_index(self.components.len());
        self.components.push(Component {
            id,
            label,
            kind,
            params: BTreeMap::new(),
            group: None,
            characteristics: BTreeMap::new(),
        });
        self.invalidate();
        Ok(id)
    }

    /// Connect `outlet` of `source` to `inlet` of `target`.
    pub fn add_connection(
        &mut self,
        source: ComponentId,
        outlet: usize,
        target: ComponentId,
        inlet: usize,
        label: impl Into<String>,
    ) -> NetworkResult<ConnectionId> {
        let label = label.into();
        self.check_label(&label)?;

        let src = self.component(source)?;
        if outlet >= src.kind.outlet_count() {
            return Err(NetworkError::PortOutOfRange {
                component: src.label.clone(),
                port: outlet,
                available: src.kind.outlet_count(),
                outlet: true,
            });
        }
        let tgt = self.component(target)?;
        if inlet >= tgt.kind.inlet_count() {
            return Err(NetworkError::PortOutOfRange {
                component: tgt.label.clone(),
                port: inlet,
                available: tgt.kind.inlet_count(),
                outlet: false,
            });
        }

        let source = PortRef {
            component: source,
            port: outlet,
        };
        let target = PortRef {
            component: target,
            port: inlet,
        };
        if let Some(existing) = self
            .connections
            .iter()
            .find(|c| c.source == source || c.target == target)
        {
            let (comp, port) = if existing.source == source {
                (source.component, outlet)
            } else {
                (target.component, inlet)
            };
            return Err(NetworkError::PortInUse {
                component: self.component(comp)?.label.clone(),
                port,
                connection: existing.label.clone(),
            });
        }

        let id = ConnectionId::from_index(self.connections.len());
        self.connections.push(Connection {
            id,
            label,
            source,
            target,
            fluid: None,
            specs: BTreeMap::new(),
            state: None,
        });
        self.invalidate();
        Ok(id)
    }

    pub fn add_bus(&mut self, label: impl Into<String>) -> NetworkResult<BusId> {
        let label = label.into();
        self.check_label(&label)?;
        let id = BusId::from_index(self.buses.len());
        self.buses.push(Bus {
            id,
            label,
            members: Vec::new(),
        });
        Ok(id)
    }

    pub fn add_bus_member(
        &mut self,
        bus: BusId,
        component: ComponentId,
        efficiency: Efficiency,
        base: BusBase,
    ) -> NetworkResult<()> {
        self.component(component)?;
        if let Efficiency::Constant(eta) = efficiency
            && (!eta.is_finite() || eta <= 0.0)
        {
            return Err(NetworkError::InvalidValue {
                what: format!("bus efficiency of component {component}"),
                value: eta,
            });
        }
        let bus = self
            .buses
            .get_mut(bus.index())
            .ok_or(NetworkError::UnknownHandle { what: "bus", id: bus })?;
        bus.members.push(BusMember {
            component,
            efficiency,
            base,
        });
        Ok(())
    }

    // ---- constraint API -------------------------------------------------

    /// Impose `attr` on a connection; the value is in network units.
    pub fn set_connection(
        &mut self,
        conn: ConnectionId,
        attr: ConnAttr,
        spec: Spec,
    ) -> NetworkResult<()> {
        let units = self.units;
        let c = self.connection_mut(conn)?;
        if let Some(v) = spec.value()
            && !v.is_finite()
        {
            return Err(NetworkError::InvalidValue {
                what: format!("{} of connection '{}'", attr.key(), c.label),
                value: v,
            });
        }
        c.specs.insert(attr, spec.map_value(|v| attr.to_si(&units, v)));
        Ok(())
    }

    pub fn clear_connection(&mut self, conn: ConnectionId, attr: ConnAttr) -> NetworkResult<()> {
        self.connection_mut(conn)?.specs.remove(&attr);
        Ok(())
    }

    pub fn set_fluid(&mut self, conn: ConnectionId, fluid: Composition) -> NetworkResult<()> {
        self.connection_mut(conn)?.fluid = Some(fluid);
        Ok(())
    }

    /// Impose `param` on a component. Values are SI except temperature
    /// differences, which are the same in K and °C.
    pub fn set_component(
        &mut self,
        comp: ComponentId,
        param: Param,
        spec: Spec,
    ) -> NetworkResult<()> {
        let c = self.component_mut(comp)?;
        if !c.kind.accepts(param) {
            return Err(NetworkError::UnsupportedParameter {
                component: c.label.clone(),
                kind: c.kind.name(),
                param: param.key(),
            });
        }
        if param.is_characteristic() && spec != Spec::OffDesign {
            return Err(NetworkError::CharacteristicNeedsOffDesign {
                component: c.label.clone(),
                param: param.key(),
            });
        }
        if let Some(v) = spec.value()
            && !v.is_finite()
        {
            return Err(NetworkError::InvalidValue {
                what: format!("{} of '{}'", param.key(), c.label),
                value: v,
            });
        }
        c.params.insert(param, spec);
        Ok(())
    }

    pub fn clear_component(&mut self, comp: ComponentId, param: Param) -> NetworkResult<()> {
        self.component_mut(comp)?.params.remove(&param);
        Ok(())
    }

    /// Replace the default characteristic line of a component.
    pub fn set_characteristic(
        &mut self,
        comp: ComponentId,
        slot: CharSlot,
        line: CharLine,
    ) -> NetworkResult<()> {
        self.component_mut(comp)?.characteristics.insert(slot, line);
        Ok(())
    }

    pub fn set_group(&mut self, comp: ComponentId, group: impl Into<String>) -> NetworkResult<()> {
        self.component_mut(comp)?.group = Some(group.into());
        Ok(())
    }

    // ---- lookup ---------------------------------------------------------

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn buses(&self) -> &[Bus] {
        &self.buses
    }

    pub fn component(&self, id: ComponentId) -> NetworkResult<&Component> {
        self.components.get(id.index()).ok_or(unknown("component", id))
    }

    pub fn connection(&self, id: ConnectionId) -> NetworkResult<&Connection> {
        self.connections.get(id.index()).ok_or(unknown("connection", id))
    }

    fn component_mut(&mut self, id: ComponentId) -> NetworkResult<&mut Component> {
        self.components
            .get_mut(id.index())
            .ok_or(unknown("component", id))
    }

    fn connection_mut(&mut self, id: ConnectionId) -> NetworkResult<&mut Connection> {
        self.connections
            .get_mut(id.index())
            .ok_or(unknown("connection", id))
    }

    pub fn component_by_label(&self, label: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.label == label)
    }

    pub fn connection_by_label(&self, label: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.label == label)
    }

    /// Check wiring and fluids; the returned topology drives assembly.
    pub fn validate(&self) -> NetworkResult<Topology> {
        validate::build_topology(&self.components, &self.connections)
    }

    /// Hash of component kinds and wiring, independent of constraints.
    pub fn fingerprint(&self) -> String {
        let label = |id: ComponentId| {
            self.components
                .get(id.index())
                .map_or("?", |c| c.label.as_str())
        };
        let entries = self
            .components
            .iter()
            .map(|c| format!("component|{}|{:?}", c.label, c.kind))
            .chain(self.connections.iter().map(|c| {
                format!(
                    "connection|{}|{}:{}->{}:{}",
                    c.label,
                    label(c.source.component),
                    c.source.port,
                    label(c.target.component),
                    c.target.port
                )
            }));
        topology_fingerprint(entries)
    }

    // ---- solve state ----------------------------------------------------

    /// Mode of the last successful solve.
    pub fn mode(&self) -> Option<SolveMode> {
        self.mode
    }

    /// True when every connection carries a converged state.
    pub fn has_converged_state(&self) -> bool {
        !self.connections.is_empty() && self.connections.iter().all(|c| c.state.is_some())
    }

    /// Write back a converged solution. `states` is indexed by connection.
    pub fn commit_solution(&mut self, mode: SolveMode, states: Vec<StreamState>) {
        for (conn, state) in self.connections.iter_mut().zip(states) {
            conn.state = Some(state);
        }
        self.mode = Some(mode);
    }

    /// Forget converged states; the next solve starts from a fresh guess.
    pub fn clear_results(&mut self) {
        for conn in &mut self.connections {
            conn.state = None;
        }
        self.mode = None;
    }

    fn invalidate(&mut self) {
        self.clear_results();
    }

    pub fn design_reference(&self) -> Option<&Arc<DesignState>> {
        self.design.as_ref()
    }

    pub fn set_design_reference(&mut self, design: Arc<DesignState>) {
        self.design = Some(design);
    }

    /// Persist the current design reference under `name`.
    pub fn save_design(&self, archive: &DesignArchive, name: &str) -> DesignResult<PathBuf> {
        let design = self
            .design
            .as_ref()
            .ok_or_else(|| DesignError::MissingReference {
                name: name.to_string(),
            })?;
        archive.save(name, design)
    }

    /// Load `name` from the archive and attach it as design reference.
    pub fn load_design(&mut self, archive: &DesignArchive, name: &str) -> DesignResult<()> {
        let design = archive.load(name)?;
        design.ensure_fingerprint(&self.fingerprint())?;
        self.design = Some(Arc::new(design));
        Ok(())
    }
}

fn unknown(what: &'static str, id: Id) -> NetworkError {
    NetworkError::UnknownHandle { what, id }
}
