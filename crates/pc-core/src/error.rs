use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Unknown {quantity} unit '{unit}'")]
    UnknownUnit { quantity: &'static str, unit: String },

    #[error("Non-positive temperature difference ({a}, {b}) in log-mean")]
    NonPositiveDifference { a: f64, b: f64 },
}
