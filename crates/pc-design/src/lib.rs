//! pc-design: design reference records and their on-disk archive.
//!
//! A design solve sizes the plant; the resulting per-component reference
//! values (efficiencies, pressure ratios, heat transfer coefficients, port
//! streams) are captured in a [`DesignState`]. Off-design solves read it
//! back through characteristic equations. Records are stored as versioned
//! JSON by [`DesignArchive`].

pub mod archive;
pub mod fingerprint;
pub mod types;

pub use archive::DesignArchive;
pub use fingerprint::topology_fingerprint;
pub use types::*;

pub type DesignResult<T> = Result<T, DesignError>;

#[derive(thiserror::Error, Debug)]
pub enum DesignError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No design reference named '{name}'")]
    MissingReference { name: String },

    #[error("Design reference has no entry for {what}")]
    MissingEntry { what: String },

    #[error("Design record schema version {found} is not supported (expected {expected})")]
    SchemaMismatch { found: u32, expected: u32 },

    #[error("Design record was sized for another topology ({found} != {expected})")]
    FingerprintMismatch { expected: String, found: String },

    #[error("Invalid design reference name '{name}'")]
    InvalidName { name: String },
}
