//! pc-fluids: fluid property boundary for the cycle solver.
//!
//! Provides:
//! - Working fluid species and mass-fraction compositions
//! - `StateInput` pairs (p-T, p-h, p-s, p-x) and the resolved `FluidState`
//! - The `PropertyProvider` trait the solver calls as a pure function
//! - CoolProp backend (via `rfluids`) for real fluids
//! - Perfect-gas backend with constant heat capacity
//!
//! # Example
//!
//! ```no_run
//! use pc_fluids::{Composition, CoolPropModel, PropertyProvider, Species, StateInput};
//!
//! let model = CoolPropModel::new();
//! let water = Composition::pure(Species::Water);
//! let live_steam = model
//!     .properties(&water, StateInput::pt(104e5, 657.15))
//!     .unwrap();
//! println!("h = {:.1} kJ/kg", live_steam.h / 1e3);
//! ```

pub mod composition;
pub mod coolprop;
pub mod error;
pub mod model;
pub mod perfect_gas;
pub mod species;
pub mod state;

pub use composition::Composition;
pub use coolprop::CoolPropModel;
pub use error::{FluidError, FluidResult};
pub use model::PropertyProvider;
pub use perfect_gas::PerfectGasModel;
pub use species::Species;
pub use state::{FluidState, SpecEnthalpy, SpecEntropy, StateInput};
