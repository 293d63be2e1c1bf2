//! Initial guess for the Newton iteration.
//!
//! Priority per unknown:
//! 1. the graph's last converged state (warm start)
//! 2. the design reference streams for an off-design solve
//! 3. values propagated from known neighbours through component relations
//! 4. defaults (1 kg/s, 1 bar, enthalpy at 300 K)

use nalgebra::DVector;
use pc_components::common::EPSILON;
use pc_fluids::{Composition, PropertyProvider, StateInput};
use pc_network::{Component, ComponentKind, ConnAttr, Param, SpecSource};

use crate::config::SolverConfig;
use crate::system::{ComponentBlock, EquationSystem, Slot, Var};

const DEFAULT_MASS_FLOW: f64 = 1.0;
const DEFAULT_PRESSURE: f64 = 1e5;
const DEFAULT_TEMPERATURE: f64 = 300.0;

/// Partially known stream values, indexed by connection.
struct Guess {
    values: Vec<[Option<f64>; 3]>,
}

impl Guess {
    fn get(&self, conn: usize, var: Var) -> Option<f64> {
        self.values[conn][var as usize]
    }

    /// Fill an empty value; returns true when something changed.
    fn fill(&mut self, conn: usize, var: Var, value: f64) -> bool {
        let slot = &mut self.values[conn][var as usize];
        if slot.is_none() && value.is_finite() {
            *slot = Some(value);
            true
        } else {
            false
        }
    }

    fn fill_opt(&mut self, conn: usize, var: Var, value: Option<f64>) -> bool {
        value.is_some_and(|v| self.fill(conn, var, v))
    }

    /// Copy `var` between two connections in whichever direction is open.
    fn link(&mut self, a: usize, b: usize, var: Var) -> bool {
        match (self.get(a, var), self.get(b, var)) {
            (Some(v), None) => self.fill(b, var, v),
            (None, Some(v)) => self.fill(a, var, v),
            _ => false,
        }
    }

    fn ratio(&mut self, inlet: usize, outlet: usize, pr: f64) -> bool {
        match (self.get(inlet, Var::P), self.get(outlet, Var::P)) {
            (Some(p), None) => self.fill(outlet, Var::P, pr * p),
            (None, Some(p)) if pr.abs() > EPSILON => self.fill(inlet, Var::P, p / pr),
            _ => false,
        }
    }
}

pub(crate) fn initial_guess(system: &EquationSystem<'_>, config: &SolverConfig) -> DVector<f64> {
    let graph = system.graph();
    let n = graph.connections().len();
    let mut guess = Guess {
        values: vec![[None; 3]; n],
    };
    for conn in 0..n {
        for var in Var::ALL {
            if let Slot::Known(v) = system.slot(conn, var) {
                guess.fill(conn, var, v);
            }
        }
    }

    if graph.has_converged_state() {
        for (c, conn) in graph.connections().iter().enumerate() {
            if let Some(state) = conn.state() {
                guess.fill(c, Var::M, state.m);
                guess.fill(c, Var::P, state.p);
                guess.fill(c, Var::H, state.h);
            }
        }
    } else if let Some(design) = system.design() {
        for (c, conn) in graph.connections().iter().enumerate() {
            if let Ok(d) = design.connection(conn.label()) {
                guess.fill(c, Var::M, d.m);
                guess.fill(c, Var::P, d.p);
                guess.fill(c, Var::H, d.h);
            }
        }
    }

    for _ in 0..config.propagation_passes {
        let mut changed = false;
        for block in system.blocks() {
            changed |= propagate_component(&mut guess, system, block);
        }
        changed |= apply_deferred(&mut guess, system);
        if !changed {
            break;
        }
    }

    fill_defaults(&mut guess, system);

    DVector::from_iterator(
        system.unknown_count(),
        system.unknowns().iter().map(|&(conn, var)| {
            guess.get(conn, var).unwrap_or(match var {
                Var::M => DEFAULT_MASS_FLOW,
                Var::P => DEFAULT_PRESSURE,
                Var::H => 0.0,
            })
        }),
    )
}

/// Value of a scalar parameter in force for this solve.
fn param_value(system: &EquationSystem<'_>, component: &Component, param: Param) -> Option<f64> {
    match component.param(param)?.resolve(system.mode())? {
        SpecSource::Value(v) => Some(v),
        SpecSource::DesignReference => design_param(system, component, param),
    }
}

fn design_param(system: &EquationSystem<'_>, component: &Component, param: Param) -> Option<f64> {
    system
        .design()?
        .component(component.label())
        .ok()?
        .param(param.key())
}

/// Efficiency to estimate an outlet enthalpy with, from a value or the
/// design point of an efficiency characteristic.
fn efficiency(system: &EquationSystem<'_>, component: &Component) -> Option<f64> {
    param_value(system, component, Param::EtaS).or_else(|| {
        component
            .param(Param::EtaSChar)?
            .resolve(system.mode())?;
        design_param(system, component, Param::EtaS)
    })
}

fn temperature(provider: &dyn PropertyProvider, fluid: &Composition, p: f64, h: f64) -> Option<f64> {
    provider.properties(fluid, StateInput::ph(p, h)).ok().map(|s| s.t)
}

fn enthalpy(provider: &dyn PropertyProvider, fluid: &Composition, input: StateInput) -> Option<f64> {
    provider.properties(fluid, input).ok().map(|s| s.h)
}

fn propagate_component(g: &mut Guess, system: &EquationSystem<'_>, block: &ComponentBlock<'_>) -> bool {
    let component = block.component;
    let provider = system.provider();
    let ins = &block.inlets;
    let outs = &block.outlets;
    let mut changed = false;

    match component.kind() {
        ComponentKind::Source | ComponentKind::Sink => {}
        ComponentKind::CycleCloser => {
            for var in Var::ALL {
                changed |= g.link(ins[0], outs[0], var);
            }
        }
        ComponentKind::Splitter { .. } => {
            let i = ins[0];
            for &o in outs {
                changed |= g.link(i, o, Var::P);
                changed |= g.link(i, o, Var::H);
            }
            let open: Vec<usize> = outs.iter().copied().filter(|&o| g.get(o, Var::M).is_none()).collect();
            let known: f64 = outs.iter().filter_map(|&o| g.get(o, Var::M)).sum();
            match (g.get(i, Var::M), open.as_slice()) {
                (Some(m), [last]) if m - known > 0.0 => changed |= g.fill(*last, Var::M, m - known),
                (None, []) => changed |= g.fill(i, Var::M, known),
                _ => {}
            }
        }
        ComponentKind::Merge { .. } => {
            let o = outs[0];
            for &i in ins {
                changed |= g.link(i, o, Var::P);
            }
            let flows: Option<Vec<(f64, f64)>> = ins
                .iter()
                .map(|&i| Some((g.get(i, Var::M)?, g.get(i, Var::H)?)))
                .collect();
            if let Some(flows) = flows {
                let m: f64 = flows.iter().map(|(m, _)| m).sum();
                changed |= g.fill(o, Var::M, m);
                if m > EPSILON {
                    let mh: f64 = flows.iter().map(|(m, h)| m * h).sum();
                    changed |= g.fill(o, Var::H, mh / m);
                }
            }
        }
        ComponentKind::Turbine | ComponentKind::Pump | ComponentKind::Compressor => {
            let (i, o) = (ins[0], outs[0]);
            changed |= g.link(i, o, Var::M);
            if let Some(pr) = param_value(system, component, Param::Pr) {
                changed |= g.ratio(i, o, pr);
            }
            if g.get(o, Var::H).is_none() {
                if let (Some(m), Some(h_in), Some(power)) = (
                    g.get(i, Var::M),
                    g.get(i, Var::H),
                    param_value(system, component, Param::P),
                ) && m > EPSILON
                {
                    changed |= g.fill(o, Var::H, h_in + power / m);
                } else if let (Some(p_in), Some(h_in), Some(p_out), Some(eta)) = (
                    g.get(i, Var::P),
                    g.get(i, Var::H),
                    g.get(o, Var::P),
                    efficiency(system, component),
                ) {
                    let fluid = system.fluid(i);
                    let h_s = provider
                        .properties(fluid, StateInput::ph(p_in, h_in))
                        .ok()
                        .and_then(|s| enthalpy(provider, fluid, StateInput::ps(p_out, s.s)));
                    if let Some(h_s) = h_s
                        && eta > EPSILON
                    {
                        let h_out = if component.kind() == ComponentKind::Turbine {
                            h_in + eta * (h_s - h_in)
                        } else {
                            h_in + (h_s - h_in) / eta
                        };
                        changed |= g.fill(o, Var::H, h_out);
                    }
                }
            }
        }
        ComponentKind::SimpleHeatExchanger => {
            let (i, o) = (ins[0], outs[0]);
            changed |= g.link(i, o, Var::M);
            if let Some(pr) = param_value(system, component, Param::Pr) {
                changed |= g.ratio(i, o, pr);
            }
            if let (Some(q), Some(m)) = (param_value(system, component, Param::Q), g.get(i, Var::M))
                && m > EPSILON
            {
                match (g.get(i, Var::H), g.get(o, Var::H)) {
                    (Some(h), None) => changed |= g.fill(o, Var::H, h + q / m),
                    (None, Some(h)) => changed |= g.fill(i, Var::H, h - q / m),
                    _ => {}
                }
            }
        }
        ComponentKind::HeatExchanger | ComponentKind::Condenser => {
            changed |= propagate_heat_exchanger(g, system, block);
        }
    }
    changed
}

fn propagate_heat_exchanger(g: &mut Guess, system: &EquationSystem<'_>, block: &ComponentBlock<'_>) -> bool {
    let component = block.component;
    let provider = system.provider();
    let condenser = component.kind() == ComponentKind::Condenser;
    let (hot_in, cold_in) = (block.inlets[0], block.inlets[1]);
    let (hot_out, cold_out) = (block.outlets[0], block.outlets[1]);
    let mut changed = false;

    changed |= g.link(hot_in, hot_out, Var::M);
    changed |= g.link(cold_in, cold_out, Var::M);
    if let Some(pr) = param_value(system, component, Param::Pr1) {
        changed |= g.ratio(hot_in, hot_out, pr);
    }
    if let Some(pr) = param_value(system, component, Param::Pr2) {
        changed |= g.ratio(cold_in, cold_out, pr);
    }

    if condenser && let Some(p) = g.get(hot_out, Var::P) {
        changed |= g.fill_opt(
            hot_out,
            Var::H,
            enthalpy(provider, system.fluid(hot_out), StateInput::pq(p, 0.0)),
        );
    }

    // Terminal temperature differences fix an outlet temperature.
    if let (Some(ttd), Some(p_out), None) = (
        param_value(system, component, Param::TtdU),
        g.get(cold_out, Var::P),
        g.get(cold_out, Var::H),
    ) {
        let hot = if condenser {
            g.get(hot_in, Var::P)
                .and_then(|p| provider.saturation_temperature(system.fluid(hot_in), p).ok())
        } else {
            g.get(hot_in, Var::P)
                .zip(g.get(hot_in, Var::H))
                .and_then(|(p, h)| temperature(provider, system.fluid(hot_in), p, h))
        };
        if let Some(t_hot) = hot {
            let h = enthalpy(provider, system.fluid(cold_out), StateInput::pt(p_out, t_hot - ttd));
            changed |= g.fill_opt(cold_out, Var::H, h);
        }
    }
    if let Some(ttd) = param_value(system, component, Param::TtdL) {
        let t_cold_in = g
            .get(cold_in, Var::P)
            .zip(g.get(cold_in, Var::H))
            .and_then(|(p, h)| temperature(provider, system.fluid(cold_in), p, h));
        if let (Some(t), Some(p_out), None) = (t_cold_in, g.get(hot_out, Var::P), g.get(hot_out, Var::H)) {
            let h = enthalpy(provider, system.fluid(hot_out), StateInput::pt(p_out, t + ttd));
            changed |= g.fill_opt(hot_out, Var::H, h);
        }
    }

    if let (Some(q), Some(m), Some(h_in)) = (
        param_value(system, component, Param::Q),
        g.get(hot_in, Var::M),
        g.get(hot_in, Var::H),
    ) && m > EPSILON
    {
        changed |= g.fill(hot_out, Var::H, h_in + q / m);
    }

    // Energy balance between the sides.
    let dh = |g: &Guess, i: usize, o: usize| Some(g.get(o, Var::H)? - g.get(i, Var::H)?);
    let (m_hot, m_cold) = (g.get(hot_in, Var::M), g.get(cold_in, Var::M));
    match (m_hot, m_cold, dh(g, hot_in, hot_out), dh(g, cold_in, cold_out)) {
        (Some(m), None, Some(d_hot), Some(d_cold)) if d_cold.abs() > EPSILON => {
            let m_cold = -m * d_hot / d_cold;
            if m_cold > 0.0 {
                changed |= g.fill(cold_in, Var::M, m_cold);
            }
        }
        (None, Some(m), Some(d_hot), Some(d_cold)) if d_hot.abs() > EPSILON => {
            let m_hot = -m * d_cold / d_hot;
            if m_hot > 0.0 {
                changed |= g.fill(hot_in, Var::M, m_hot);
            }
        }
        (Some(mh), Some(mc), Some(d_hot), None) if mc > EPSILON => {
            if let Some(h) = g.get(cold_in, Var::H) {
                changed |= g.fill(cold_out, Var::H, h - mh * d_hot / mc);
            }
        }
        (Some(mh), Some(mc), None, Some(d_cold)) if mh > EPSILON => {
            if let Some(h) = g.get(hot_in, Var::H) {
                changed |= g.fill(hot_out, Var::H, h - mc * d_cold / mh);
            }
        }
        _ => {}
    }
    changed
}

/// Connection constraints kept as residuals still pin the guess.
fn apply_deferred(g: &mut Guess, system: &EquationSystem<'_>) -> bool {
    let provider = system.provider();
    let mut changed = false;
    for (conn, attr, value) in system.deferred_constraints() {
        let fluid = system.fluid(conn);
        match (attr, g.get(conn, Var::P), g.get(conn, Var::H)) {
            (ConnAttr::T, Some(p), None) => {
                changed |= g.fill_opt(conn, Var::H, enthalpy(provider, fluid, StateInput::pt(p, value)));
            }
            (ConnAttr::X, Some(p), None) => {
                changed |= g.fill_opt(conn, Var::H, enthalpy(provider, fluid, StateInput::pq(p, value)));
            }
            (ConnAttr::S, Some(p), None) => {
                changed |= g.fill_opt(conn, Var::H, enthalpy(provider, fluid, StateInput::ps(p, value)));
            }
            (ConnAttr::V, Some(p), Some(h)) if g.get(conn, Var::M).is_none() => {
                if let Ok(state) = provider.properties(fluid, StateInput::ph(p, h))
                    && state.v() > 0.0
                {
                    changed |= g.fill(conn, Var::M, value / state.v());
                }
            }
            _ => {}
        }
    }
    changed
}

fn fill_defaults(g: &mut Guess, system: &EquationSystem<'_>) {
    let provider = system.provider();
    for conn in 0..g.values.len() {
        g.fill(conn, Var::M, DEFAULT_MASS_FLOW);
        g.fill(conn, Var::P, DEFAULT_PRESSURE);
        if g.get(conn, Var::H).is_none() {
            let p = g.get(conn, Var::P).unwrap_or(DEFAULT_PRESSURE);
            let h = enthalpy(
                provider,
                system.fluid(conn),
                StateInput::pt(p, DEFAULT_TEMPERATURE),
            )
            .unwrap_or(0.0);
            g.fill(conn, Var::H, h);
        }
    }
}

/// Stream values of a finished guess, for inspection in tests.
#[cfg(test)]
pub(crate) fn guessed_streams(system: &EquationSystem<'_>, x: &DVector<f64>) -> Vec<(f64, f64, f64)> {
    system.ports(x).iter().map(|p| (p.m, p.p, p.h)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pc_core::UnitSystem;
    use pc_fluids::{PerfectGasModel, Species};
    use pc_network::{NetworkGraph, SolveMode, Spec};

    #[test]
    fn guess_follows_pressure_ratios_around_a_loop() {
        let mut g = NetworkGraph::new(UnitSystem::si());
        let cc = g.add_component(ComponentKind::CycleCloser, "cc").unwrap();
        let comp = g.add_component(ComponentKind::Compressor, "compressor").unwrap();
        let heater = g.add_component(ComponentKind::SimpleHeatExchanger, "heater").unwrap();
        let c1 = g.add_connection(cc, 0, comp, 0, "1").unwrap();
        g.add_connection(comp, 0, heater, 0, "2").unwrap();
        g.add_connection(heater, 0, cc, 0, "3").unwrap();
        g.set_fluid(c1, Composition::pure(Species::Air)).unwrap();
        g.set_connection(c1, ConnAttr::P, Spec::Fixed(1e5)).unwrap();
        g.set_connection(c1, ConnAttr::T, Spec::Fixed(300.0)).unwrap();
        g.set_connection(c1, ConnAttr::M, Spec::Fixed(2.0)).unwrap();
        g.set_component(comp, Param::Pr, Spec::Fixed(4.0)).unwrap();
        g.set_component(comp, Param::EtaS, Spec::Fixed(0.8)).unwrap();
        g.set_component(heater, Param::Pr, Spec::Fixed(0.25)).unwrap();

        let model = PerfectGasModel::new();
        let config = SolverConfig::default();
        let system = EquationSystem::assemble(&g, &model, SolveMode::Design, &config).unwrap();
        let x = initial_guess(&system, &config);
        let streams = guessed_streams(&system, &x);

        assert_eq!(streams[1].0, 2.0);
        assert!((streams[1].1 - 4e5).abs() < 1e-6);
        // Compression heats the gas.
        assert!(streams[1].2 > streams[0].2);
        assert!((streams[2].1 - 1e5).abs() < 1e-6);
    }
}
