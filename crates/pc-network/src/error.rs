//! Network construction and validation errors.

use pc_core::Id;

pub type NetworkResult<T> = Result<T, NetworkError>;

#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// Two components, connections or buses share a label.
    DuplicateLabel { label: String },

    /// A handle that this graph never issued.
    UnknownHandle { what: &'static str, id: Id },

    /// Port index beyond what the component kind provides.
    PortOutOfRange {
        component: String,
        port: usize,
        available: usize,
        outlet: bool,
    },

    /// A port already carries a connection.
    PortInUse {
        component: String,
        port: usize,
        connection: String,
    },

    /// A port with no connection at solve time.
    DanglingPort {
        component: String,
        port: usize,
        outlet: bool,
    },

    /// Parameter not defined for the component kind.
    UnsupportedParameter {
        component: String,
        kind: &'static str,
        param: &'static str,
    },

    /// Characteristic parameters only make sense against a design reference.
    CharacteristicNeedsOffDesign { component: String, param: &'static str },

    /// Non-finite or otherwise unusable constraint value.
    InvalidValue { what: String, value: f64 },

    /// Two connections on one flow path carry different fluids.
    FluidConflict {
        connection: String,
        first: String,
        second: String,
    },

    /// No fluid specified anywhere on the flow path of a connection.
    MissingFluid { connection: String },

    /// Characteristic line rejected (unsorted abscissa, length mismatch).
    InvalidCharLine { what: &'static str },

    /// Splitter/merge with fewer than two branches.
    InvalidBranchCount { component: String, count: usize },
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let side = |outlet: bool| if outlet { "outlet" } else { "inlet" };
        match self {
            NetworkError::DuplicateLabel { label } => {
                write!(f, "Label '{}' is already in use", label)
            }
            NetworkError::UnknownHandle { what, id } => {
                write!(f, "Unknown {} handle {}", what, id)
            }
            NetworkError::PortOutOfRange {
                component,
                port,
                available,
                outlet,
            } => write!(
                f,
                "Component '{}' has {} {} port(s), got index {}",
                component,
                available,
                side(*outlet),
                port
            ),
            NetworkError::PortInUse {
                component,
                port,
                connection,
            } => write!(
                f,
                "Port {} of '{}' is already used by connection '{}'",
                port, component, connection
            ),
            NetworkError::DanglingPort {
                component,
                port,
                outlet,
            } => write!(
                f,
                "{} port {} of '{}' is not connected",
                side(*outlet),
                port,
                component
            ),
            NetworkError::UnsupportedParameter {
                component,
                kind,
                param,
            } => write!(
                f,
                "Parameter '{}' is not defined for '{}' ({})",
                param, component, kind
            ),
            NetworkError::CharacteristicNeedsOffDesign { component, param } => write!(
                f,
                "'{}' of '{}' is a characteristic and can only be tagged off-design",
                param, component
            ),
            NetworkError::InvalidValue { what, value } => {
                write!(f, "Invalid value {} for {}", value, what)
            }
            NetworkError::FluidConflict {
                connection,
                first,
                second,
            } => write!(
                f,
                "Connection '{}' joins flow paths carrying {} and {}",
                connection, first, second
            ),
            NetworkError::MissingFluid { connection } => {
                write!(f, "No fluid reaches connection '{}'", connection)
            }
            NetworkError::InvalidCharLine { what } => {
                write!(f, "Invalid characteristic line: {}", what)
            }
            NetworkError::InvalidBranchCount { component, count } => write!(
                f,
                "'{}' needs at least two branches, got {}",
                component, count
            ),
        }
    }
}

impl std::error::Error for NetworkError {}
