//! Bus evaluation over converged component energies.

use pc_design::DesignState;
use pc_network::{Bus, BusBase, BusMember, NetworkGraph};

use crate::error::{SolverError, SolverResult};

/// Load fraction of a member: energy over its design-point energy.
fn load(member_energy: f64, design: Option<(&DesignState, &str)>) -> f64 {
    let Some((design, label)) = design else {
        return 1.0;
    };
    match design.component(label) {
        Ok(record) if record.energy.abs() > f64::EPSILON => member_energy / record.energy,
        _ => 1.0,
    }
}

fn member_value(member: &BusMember, label: &str, energy: f64, load: f64) -> SolverResult<f64> {
    let eta = member.efficiency.at_load(load);
    if !eta.is_finite() || eta <= 0.0 {
        return Err(SolverError::Component(pc_components::ComponentError::NonPhysical {
            component: label.to_string(),
            what: "bus efficiency must stay positive",
        }));
    }
    Ok(match member.base {
        BusBase::Component => energy * eta,
        BusBase::Bus => energy / eta,
    })
}

/// Net value of `bus`, given the energy term of every component (indexed by
/// component id). Load fractions refer to `design` when one is given.
pub fn evaluate(
    graph: &NetworkGraph,
    bus: &Bus,
    energies: &[f64],
    design: Option<&DesignState>,
) -> SolverResult<f64> {
    bus.members().iter().try_fold(0.0, |sum, member| -> SolverResult<f64> {
        let component = graph.component(member.component)?;
        let energy = energies[member.component.index()];
        let load = load(energy, design.map(|d| (d, component.label())));
        Ok(sum + member_value(member, component.label(), energy, load)?)
    })
}
