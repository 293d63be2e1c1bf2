//! Vapour quality constraints on real water.

use pc_core::UnitSystem;
use pc_fluids::{Composition, CoolPropModel, PropertyProvider, Species, StateInput};
use pc_network::{ComponentKind, ConnAttr, NetworkGraph, Param, SolveMode, Spec};
use pc_solver::{Solver, SolverConfig};

fn water() -> Composition {
    Composition::pure(Species::Water)
}

fn close(a: f64, b: f64, rel: f64) -> bool {
    (a - b).abs() <= rel * a.abs().max(b.abs()).max(1.0)
}

/// Saturated liquid at 10 bar boiled to half quality across a heater with a
/// 10 % pressure loss.
fn evaporator_line() -> NetworkGraph {
    let mut g = NetworkGraph::new(UnitSystem::si());
    let source = g.add_component(ComponentKind::Source, "feed").unwrap();
    let heater = g.add_component(ComponentKind::SimpleHeatExchanger, "evaporator").unwrap();
    let sink = g.add_component(ComponentKind::Sink, "drum").unwrap();
    let feed = g.add_connection(source, 0, heater, 0, "feed").unwrap();
    let wet = g.add_connection(heater, 0, sink, 0, "wet").unwrap();

    g.set_fluid(feed, water()).unwrap();
    g.set_connection(feed, ConnAttr::M, Spec::Fixed(2.0)).unwrap();
    g.set_connection(feed, ConnAttr::P, Spec::Fixed(10e5)).unwrap();
    g.set_connection(feed, ConnAttr::X, Spec::Fixed(0.0)).unwrap();
    g.set_connection(wet, ConnAttr::X, Spec::Fixed(0.5)).unwrap();
    g.set_component(heater, Param::Pr, Spec::Fixed(0.9)).unwrap();
    g
}

#[test]
fn quality_fixes_the_enthalpy_at_known_and_solved_pressures() {
    let model = CoolPropModel::new();
    let mut g = evaporator_line();
    let state = Solver::new(&model)
        .with_config(SolverConfig::default().with_stall_tolerance(1e-3))
        .solve(&mut g, SolveMode::Design)
        .unwrap();

    // Known pressure: the inlet enthalpy is presolved from (p, x).
    let h_feed = model.properties(&water(), StateInput::pq(10e5, 0.0)).unwrap().h;
    let feed = state.connection("feed").unwrap();
    assert!(close(feed.h, h_feed, 1e-9), "{} vs {h_feed}", feed.h);

    // Solved pressure: the outlet quality is a residual of the iteration.
    let wet = state.connection("wet").unwrap();
    assert!(close(wet.p, 9e5, 1e-9));
    let h_wet = model.properties(&water(), StateInput::pq(9e5, 0.5)).unwrap().h;
    assert!(close(wet.h, h_wet, 1e-5), "{} vs {h_wet}", wet.h);
    let x = wet.quality.unwrap();
    assert!((x - 0.5).abs() < 1e-4, "quality {x}");

    let duty = state.component("evaporator").unwrap().energy;
    assert!(close(duty, 2.0 * (h_wet - h_feed), 1e-5), "duty {duty}");
}
