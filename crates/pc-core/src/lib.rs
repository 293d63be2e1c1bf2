//! pc-core: shared foundation for the powercycle workspace.
//!
//! Contains:
//! - units (uom SI aliases, constructors, per-network unit system)
//! - numeric (Real, tolerances, log-mean differences)
//! - ids (compact ids for components, connections and buses)
//! - error (shared error type)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
