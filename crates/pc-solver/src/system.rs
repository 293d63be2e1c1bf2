//! Equation assembly: unknowns, presolved constraints and residual evaluation.

use std::sync::Arc;

use nalgebra::DVector;
use pc_components::common::{ENTHALPY_SCALE, ENTROPY_SCALE};
use pc_components::{ComponentContext, ComponentModel, ParamTarget, PortState, model_for};
use pc_design::{ComponentDesign, DesignState, StreamDesign};
use pc_fluids::{Composition, PropertyProvider, StateInput};
use pc_network::{
    Component, ConnAttr, Connection, NetworkGraph, Param, SolveMode, SpecSource, Topology,
};

use crate::config::SolverConfig;
use crate::error::{SolverError, SolverResult};
use crate::newton::NonlinearSystem;

/// Primary stream variables of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Var {
    M,
    P,
    H,
}

impl Var {
    pub const ALL: [Var; 3] = [Var::M, Var::P, Var::H];

    fn key(self) -> &'static str {
        match self {
            Var::M => "m",
            Var::P => "p",
            Var::H => "h",
        }
    }
}

/// A stream variable is either fixed before the solve or an unknown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot {
    Known(f64),
    Free(usize),
}

/// How an active component parameter is evaluated.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Target {
    Value(f64),
    Characteristic,
}

pub(crate) struct ComponentBlock<'g> {
    pub component: &'g Component,
    pub model: Box<dyn ComponentModel>,
    pub inlets: Vec<usize>,
    pub outlets: Vec<usize>,
    params: Vec<(Param, Target)>,
    design: Option<ComponentDesign>,
}

/// A connection constraint that stays a residual equation.
#[derive(Debug, Clone, Copy)]
struct ConnectionEquation {
    conn: usize,
    attr: ConnAttr,
    value: f64,
}

/// The square system of one solve.
///
/// Unknowns are the mass flow, pressure and enthalpy of every connection
/// minus those fixed by constraints. Temperature and quality constraints on a
/// connection with known pressure are converted to enthalpy up front; every
/// other constraint and every component relation becomes a scaled residual.
pub struct EquationSystem<'g> {
    graph: &'g NetworkGraph,
    provider: &'g dyn PropertyProvider,
    mode: SolveMode,
    topology: Topology,
    design: Option<Arc<DesignState>>,
    slots: Vec<[Slot; 3]>,
    unknowns: Vec<(usize, Var)>,
    blocks: Vec<ComponentBlock<'g>>,
    equations: Vec<ConnectionEquation>,
    min_pressure: f64,
}

impl<'g> EquationSystem<'g> {
    pub fn assemble(
        graph: &'g NetworkGraph,
        provider: &'g dyn PropertyProvider,
        mode: SolveMode,
        config: &SolverConfig,
    ) -> SolverResult<Self> {
        let topology = graph.validate()?;
        let design = match mode {
            SolveMode::Design => None,
            SolveMode::OffDesign => Some(checked_design(graph)?),
        };

        let mut slots = Vec::with_capacity(graph.connections().len());
        let mut equations = Vec::new();
        for (index, conn) in graph.connections().iter().enumerate() {
            let fluid = topology.fluid(conn.id()).ok_or_else(|| {
                SolverError::Network(pc_network::NetworkError::MissingFluid {
                    connection: conn.label().to_string(),
                })
            })?;
            let (known, residuals) =
                presolve_connection(conn, fluid, provider, mode, design.as_deref())?;
            slots.push(known);
            equations.extend(residuals.into_iter().map(|(attr, value)| ConnectionEquation {
                conn: index,
                attr,
                value,
            }));
        }

        let mut unknowns = Vec::new();
        for (conn, vars) in slots.iter_mut().enumerate() {
            for (slot, var) in vars.iter_mut().zip(Var::ALL) {
                if let Slot::Free(_) = slot {
                    *slot = Slot::Free(unknowns.len());
                    unknowns.push((conn, var));
                }
            }
        }

        let mut blocks = Vec::with_capacity(graph.components().len());
        for component in graph.components() {
            blocks.push(component_block(component, &topology, mode, design.as_deref())?);
        }

        Ok(Self {
            graph,
            provider,
            mode,
            topology,
            design,
            slots,
            unknowns,
            blocks,
            equations,
            min_pressure: config.min_pressure,
        })
    }

    pub fn mode(&self) -> SolveMode {
        self.mode
    }

    pub fn graph(&self) -> &'g NetworkGraph {
        self.graph
    }

    pub fn provider(&self) -> &'g dyn PropertyProvider {
        self.provider
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Design reference in force for an off-design solve.
    pub fn design(&self) -> Option<&DesignState> {
        self.design.as_deref()
    }

    pub fn unknown_count(&self) -> usize {
        self.unknowns.len()
    }

    pub fn equation_count(&self) -> usize {
        self.blocks
            .iter()
            .map(|b| b.model.structural_count(b.inlets.len(), b.outlets.len()) + b.params.len())
            .sum::<usize>()
            + self.equations.len()
    }

    /// Fail unless the system is square.
    pub fn check_degrees_of_freedom(&self) -> SolverResult<()> {
        let equations = self.equation_count();
        let unknowns = self.unknown_count();
        if equations == unknowns {
            Ok(())
        } else {
            Err(SolverError::DegreesOfFreedom {
                equations,
                unknowns,
            })
        }
    }

    pub fn slot(&self, conn: usize, var: Var) -> Slot {
        self.slots[conn][var as usize]
    }

    pub(crate) fn unknowns(&self) -> &[(usize, Var)] {
        &self.unknowns
    }

    pub(crate) fn blocks(&self) -> &[ComponentBlock<'g>] {
        &self.blocks
    }

    /// Connections whose temperature or quality stays a residual, with the
    /// attribute and SI target.
    pub(crate) fn deferred_constraints(&self) -> impl Iterator<Item = (usize, ConnAttr, f64)> + '_ {
        self.equations.iter().map(|e| (e.conn, e.attr, e.value))
    }

    pub fn fluid(&self, conn: usize) -> &Composition {
        &self.topology.fluids()[conn]
    }

    fn value(&self, x: &DVector<f64>, conn: usize, var: Var) -> f64 {
        match self.slot(conn, var) {
            Slot::Known(v) => v,
            Slot::Free(i) => x[i],
        }
    }

    /// Port values of every connection at iterate `x`.
    pub fn ports(&self, x: &DVector<f64>) -> Vec<PortState<'_>> {
        (0..self.slots.len())
            .map(|c| PortState {
                m: self.value(x, c, Var::M),
                p: self.value(x, c, Var::P),
                h: self.value(x, c, Var::H),
                fluid: self.fluid(c),
            })
            .collect()
    }

    /// Run `f` with the evaluation context of every component.
    pub(crate) fn for_each_component<F>(&self, ports: &[PortState<'_>], mut f: F) -> SolverResult<()>
    where
        F: FnMut(&ComponentBlock<'g>, &ComponentContext<'_>) -> SolverResult<()>,
    {
        for block in &self.blocks {
            let inlets: Vec<PortState<'_>> = block.inlets.iter().map(|&c| ports[c]).collect();
            let outlets: Vec<PortState<'_>> = block.outlets.iter().map(|&c| ports[c]).collect();
            let ctx = ComponentContext {
                component: block.component,
                provider: self.provider,
                inlets: &inlets,
                outlets: &outlets,
            };
            f(block, &ctx)?;
        }
        Ok(())
    }

    fn connection_residual(&self, eq: &ConnectionEquation, port: &PortState<'_>) -> SolverResult<f64> {
        let state = self
            .provider
            .properties(port.fluid, StateInput::ph(port.p, port.h))?;
        let r = match eq.attr {
            ConnAttr::T => state.t - eq.value,
            ConnAttr::S => (state.s - eq.value) / ENTROPY_SCALE,
            ConnAttr::V => port.m * state.v() - eq.value,
            ConnAttr::X => {
                let h_x = self
                    .provider
                    .properties(port.fluid, StateInput::pq(port.p, eq.value))?
                    .h;
                (port.h - h_x) / ENTHALPY_SCALE
            }
            // m, p and h are always presolved.
            ConnAttr::M | ConnAttr::P | ConnAttr::H => 0.0,
        };
        Ok(r)
    }
}

impl ComponentBlock<'_> {
    pub(crate) fn target<'d>(&'d self, target: Target) -> SolverResult<ParamTarget<'d>> {
        match target {
            Target::Value(v) => Ok(ParamTarget::Value(v)),
            Target::Characteristic => self
                .design
                .as_ref()
                .map(ParamTarget::Characteristic)
                .ok_or_else(|| SolverError::MissingDesignReference {
                    what: format!("component '{}'", self.component.label()),
                }),
        }
    }
}

impl NonlinearSystem for EquationSystem<'_> {
    fn residuals(&self, x: &DVector<f64>) -> SolverResult<DVector<f64>> {
        let ports = self.ports(x);
        let mut out = Vec::with_capacity(self.unknowns.len());
        self.for_each_component(&ports, |block, ctx| {
            block.model.structural(ctx, &mut out)?;
            for &(param, target) in &block.params {
                out.push(block.model.parameter(ctx, param, block.target(target)?)?);
            }
            Ok(())
        })?;
        for eq in &self.equations {
            out.push(self.connection_residual(eq, &ports[eq.conn])?);
        }
        Ok(DVector::from_vec(out))
    }

    fn domain_violation(&self, x: &DVector<f64>) -> Option<usize> {
        self.unknowns
            .iter()
            .zip(x.iter())
            .position(|(&(_, var), &value)| {
                !value.is_finite()
                    || match var {
                        Var::M => value < 0.0,
                        Var::P => value <= self.min_pressure,
                        Var::H => false,
                    }
            })
    }

    fn describe(&self, index: usize) -> String {
        match self.unknowns.get(index) {
            Some(&(conn, var)) => format!(
                "{} of connection '{}'",
                var.key(),
                self.graph.connections()[conn].label()
            ),
            None => format!("unknown #{index}"),
        }
    }
}

/// The graph's design reference, checked against its current topology.
fn checked_design(graph: &NetworkGraph) -> SolverResult<Arc<DesignState>> {
    let design = graph
        .design_reference()
        .ok_or_else(|| SolverError::MissingDesignReference {
            what: "no design solve recorded or loaded for this network".into(),
        })?;
    if design.fingerprint != graph.fingerprint() {
        return Err(SolverError::MissingDesignReference {
            what: "design reference was recorded for a different topology".into(),
        });
    }
    Ok(Arc::clone(design))
}

fn design_stream<'d>(design: Option<&'d DesignState>, conn: &Connection) -> SolverResult<&'d StreamDesign> {
    design
        .ok_or_else(|| SolverError::MissingDesignReference {
            what: format!("connection '{}'", conn.label()),
        })?
        .connection(conn.label())
        .map_err(|_| SolverError::MissingDesignReference {
            what: format!("connection '{}'", conn.label()),
        })
}

/// Value of a connection attribute recorded at the design point.
fn design_attribute(
    design: Option<&DesignState>,
    conn: &Connection,
    attr: ConnAttr,
    fluid: &Composition,
    provider: &dyn PropertyProvider,
) -> SolverResult<f64> {
    let d = design_stream(design, conn)?;
    let value = match attr {
        ConnAttr::M => d.m,
        ConnAttr::P => d.p,
        ConnAttr::H => d.h,
        ConnAttr::T => d.t,
        ConnAttr::S => d.s,
        ConnAttr::V => d.volumetric_flow(),
        ConnAttr::X => provider.quality(fluid, d.p, d.h)?.ok_or_else(|| {
            SolverError::MissingDesignReference {
                what: format!("quality of connection '{}' (single phase at design)", conn.label()),
            }
        })?,
    };
    Ok(value)
}

/// Fixed stream values of one connection and the constraints left as residuals.
fn presolve_connection(
    conn: &Connection,
    fluid: &Composition,
    provider: &dyn PropertyProvider,
    mode: SolveMode,
    design: Option<&DesignState>,
) -> SolverResult<([Slot; 3], Vec<(ConnAttr, f64)>)> {
    let mut active = Vec::new();
    for (attr, spec) in conn.specs() {
        let value = match spec.resolve(mode) {
            None => continue,
            Some(SpecSource::Value(v)) => v,
            Some(SpecSource::DesignReference) => {
                design_attribute(design, conn, attr, fluid, provider)?
            }
        };
        active.push((attr, value));
    }

    let get = |attr: ConnAttr| active.iter().find(|(a, _)| *a == attr).map(|(_, v)| *v);
    let m = get(ConnAttr::M);
    let p = get(ConnAttr::P);
    let mut h = get(ConnAttr::H);

    let mut residuals = Vec::new();
    for (attr, value) in active.iter().copied() {
        match attr {
            ConnAttr::M | ConnAttr::P | ConnAttr::H => {}
            ConnAttr::T | ConnAttr::X => match (p, h) {
                (Some(p), None) => {
                    let input = if attr == ConnAttr::T {
                        StateInput::pt(p, value)
                    } else {
                        StateInput::pq(p, value)
                    };
                    h = Some(provider.properties(fluid, input)?.h);
                }
                _ => residuals.push((attr, value)),
            },
            ConnAttr::S | ConnAttr::V => residuals.push((attr, value)),
        }
    }

    let slot = |v: Option<f64>| v.map_or(Slot::Free(0), Slot::Known);
    Ok(([slot(m), slot(p), slot(h)], residuals))
}

fn design_record<'d>(
    design: Option<&'d DesignState>,
    component: &Component,
) -> SolverResult<&'d ComponentDesign> {
    let missing = || SolverError::MissingDesignReference {
        what: format!("component '{}'", component.label()),
    };
    design
        .ok_or_else(missing)?
        .component(component.label())
        .map_err(|_| missing())
}

fn component_block<'g>(
    component: &'g Component,
    topology: &Topology,
    mode: SolveMode,
    design: Option<&DesignState>,
) -> SolverResult<ComponentBlock<'g>> {
    let mut params = Vec::new();
    let mut needs_record = false;
    for (param, spec) in component.params() {
        let target = match spec.resolve(mode) {
            None => continue,
            Some(SpecSource::Value(v)) => Target::Value(v),
            Some(SpecSource::DesignReference) if param.is_characteristic() => {
                needs_record = true;
                Target::Characteristic
            }
            Some(SpecSource::DesignReference) => {
                let value = design_record(design, component)?.param(param.key()).ok_or_else(|| {
                    SolverError::MissingDesignReference {
                        what: format!("'{}' of component '{}'", param.key(), component.label()),
                    }
                })?;
                Target::Value(value)
            }
        };
        params.push((param, target));
    }

    let to_index = |ids: &[pc_core::ConnectionId]| ids.iter().map(|id| id.index()).collect();
    Ok(ComponentBlock {
        component,
        model: model_for(component.kind()),
        inlets: to_index(topology.inlets(component.id())),
        outlets: to_index(topology.outlets(component.id())),
        params,
        design: if needs_record { Some(design_record(design, component)?.clone()) } else { None },
    })
}
