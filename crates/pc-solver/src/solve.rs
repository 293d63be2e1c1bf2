//! Solve entry point.

use std::sync::Arc;

use pc_components::capture;
use pc_design::{DesignState, StreamDesign};
use pc_fluids::{PropertyProvider, StateInput};
use pc_network::{ComponentKind, ConnAttr, NetworkGraph, Param, SolveMode, StreamState};
use tracing::{debug, info, warn};

use crate::bus;
use crate::config::SolverConfig;
use crate::error::SolverResult;
use crate::initialization::initial_guess;
use crate::newton::{Control, IterationProgress, NewtonOutcome, newton_solve};
use crate::state::{BusReport, ComponentReport, ConnectionResult, ConvergedState};
use crate::system::EquationSystem;

/// Solves networks against one property provider.
///
/// A solve reads the graph, iterates on a private vector of unknowns and
/// writes back only after convergence: the converged streams and, for a
/// design solve, the new design reference. Any error leaves the graph as it
/// was.
#[derive(Clone, Copy)]
pub struct Solver<'p> {
    provider: &'p dyn PropertyProvider,
    config: SolverConfig,
}

/// Everything derived from a converged iterate before the graph is touched.
struct Evaluation {
    state: ConvergedState,
    streams: Vec<StreamState>,
    design: Option<DesignState>,
}

impl<'p> Solver<'p> {
    pub fn new(provider: &'p dyn PropertyProvider) -> Self {
        Self {
            provider,
            config: SolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn solve(&self, graph: &mut NetworkGraph, mode: SolveMode) -> SolverResult<ConvergedState> {
        self.solve_with_observer(graph, mode, &mut |_| Control::Continue)
    }

    /// Solve, reporting progress at every iteration boundary. The observer
    /// may cancel; the graph is then left unchanged.
    pub fn solve_with_observer(
        &self,
        graph: &mut NetworkGraph,
        mode: SolveMode,
        observer: &mut dyn FnMut(IterationProgress) -> Control,
    ) -> SolverResult<ConvergedState> {
        let evaluation = {
            let system = EquationSystem::assemble(graph, self.provider, mode, &self.config)?;
            system.check_degrees_of_freedom()?;
            debug!(
                unknowns = system.unknown_count(),
                mode = %mode,
                "system assembled"
            );
            let x0 = initial_guess(&system, &self.config);
            let outcome = newton_solve(&system, x0, &self.config, observer)?;
            self.evaluate(&system, &outcome)?
        };

        info!(
            mode = %mode,
            iterations = evaluation.state.iterations,
            residual_norm = evaluation.state.residual_norm,
            stalled = evaluation.state.stalled,
            "solve converged"
        );
        graph.commit_solution(mode, evaluation.streams);
        if let Some(design) = evaluation.design {
            graph.set_design_reference(Arc::new(design));
        }
        Ok(evaluation.state)
    }

    fn evaluate(&self, system: &EquationSystem<'_>, outcome: &NewtonOutcome) -> SolverResult<Evaluation> {
        let graph = system.graph();
        let units = graph.units();
        let ports = system.ports(&outcome.x);

        let mut streams = Vec::with_capacity(ports.len());
        for port in &ports {
            let props = self
                .provider
                .properties(port.fluid, StateInput::ph(port.p, port.h))?;
            streams.push(StreamState {
                m: port.m,
                p: port.p,
                h: port.h,
                t: props.t,
                s: props.s,
                v: props.v(),
                quality: self.provider.quality(port.fluid, port.p, port.h)?,
            });
        }

        let mut design = (system.mode() == SolveMode::Design)
            .then(|| DesignState::new(graph.fingerprint()));
        let mut energies = Vec::with_capacity(graph.components().len());
        let mut boundary_heat = 0.0;
        system.for_each_component(&ports, |block, ctx| {
            let component = block.component;
            energies.push(block.model.energy(ctx)?);
            match component.kind() {
                ComponentKind::Sink => boundary_heat += ctx.inlet(0)?.m * ctx.inlet(0)?.h,
                ComponentKind::Source => boundary_heat -= ctx.outlet(0)?.m * ctx.outlet(0)?.h,
                ComponentKind::HeatExchanger | ComponentKind::Condenser => {
                    warn_on_crossing(block.model.as_ref(), ctx);
                }
                _ => {}
            }
            if let Some(design) = design.as_mut() {
                design
                    .components
                    .insert(component.label().to_string(), capture(block.model.as_ref(), ctx)?);
            }
            Ok(())
        })?;

        if let Some(design) = design.as_mut() {
            for (conn, stream) in graph.connections().iter().zip(&streams) {
                design.connections.insert(
                    conn.label().to_string(),
                    StreamDesign {
                        m: stream.m,
                        p: stream.p,
                        h: stream.h,
                        t: stream.t,
                        s: stream.s,
                        v: stream.v,
                    },
                );
            }
        }

        let buses = graph
            .buses()
            .iter()
            .map(|b| {
                Ok(BusReport {
                    label: b.label().to_string(),
                    value: bus::evaluate(graph, b, &energies, system.design())?,
                })
            })
            .collect::<SolverResult<Vec<_>>>()?;

        let connections = graph
            .connections()
            .iter()
            .zip(&streams)
            .map(|(conn, s)| ConnectionResult {
                label: conn.label().to_string(),
                m: s.m,
                p: ConnAttr::P.from_si(&units, s.p),
                h: ConnAttr::H.from_si(&units, s.h),
                t: ConnAttr::T.from_si(&units, s.t),
                s: ConnAttr::S.from_si(&units, s.s),
                v: s.m * s.v,
                quality: s.quality,
            })
            .collect();

        let components = graph
            .components()
            .iter()
            .zip(&energies)
            .map(|(c, &energy)| ComponentReport {
                label: c.label().to_string(),
                kind: c.kind().name().to_string(),
                group: c.group().map(str::to_string),
                energy,
            })
            .collect();

        Ok(Evaluation {
            state: ConvergedState {
                mode: system.mode(),
                iterations: outcome.iterations,
                residual_norm: outcome.residual_norm,
                stalled: outcome.stalled,
                units,
                connections,
                components,
                buses,
                boundary_heat,
            },
            streams,
            design,
        })
    }
}

/// Converged exchangers whose streams cross still satisfy their equations,
/// but the result is not physical.
fn warn_on_crossing(model: &dyn pc_components::ComponentModel, ctx: &pc_components::ComponentContext<'_>) {
    for param in [Param::TtdU, Param::TtdL] {
        if let Ok(Some(ttd)) = model.measure(ctx, param)
            && ttd < 0.0
        {
            warn!(
                component = ctx.label(),
                parameter = param.key(),
                value = ttd,
                "negative terminal temperature difference"
            );
        }
    }
}

impl std::fmt::Debug for Solver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solver").field("config", &self.config).finish_non_exhaustive()
    }
}
