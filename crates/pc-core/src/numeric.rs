use crate::{CoreError, CoreResult};

/// Floating point type used throughout the solver.
pub type Real = f64;

/// Absolute plus relative tolerance pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-9,
            rel: 1e-9,
        }
    }
}

impl Tolerances {
    pub const fn new(abs: Real, rel: Real) -> Self {
        Self { abs, rel }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    diff <= tol.abs || diff <= tol.rel * a.abs().max(b.abs())
}

/// Log-mean of two positive differences, e.g. terminal temperature
/// differences of a counter-flow heat exchanger.
pub fn log_mean_difference(a: Real, b: Real) -> CoreResult<Real> {
    if !(a > 0.0 && b > 0.0) || !a.is_finite() || !b.is_finite() {
        return Err(CoreError::NonPositiveDifference { a, b });
    }
    let ratio = a / b;
    if (ratio - 1.0).abs() < 1e-6 {
        // Limit for a -> b; avoids 0/0.
        return Ok(0.5 * (a + b));
    }
    Ok((a - b) / ratio.ln())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_uses_either_bound() {
        let tol = Tolerances::new(1e-12, 1e-9);
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(1e6, 1e6 + 1e-4, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn lmtd_known_value() {
        // 6.9 K and 16.9 K terminal differences of a condenser.
        let lmtd = log_mean_difference(6.9, 16.9).unwrap();
        assert!((lmtd - 10.0 / (16.9_f64 / 6.9).ln()).abs() < 1e-12);
    }

    #[test]
    fn lmtd_rejects_crossing() {
        assert!(log_mean_difference(-1.0, 5.0).is_err());
        assert!(log_mean_difference(3.0, 0.0).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn lmtd_is_symmetric_and_bounded(a in 0.01_f64..500.0, b in 0.01_f64..500.0) {
            let ab = log_mean_difference(a, b).unwrap();
            let ba = log_mean_difference(b, a).unwrap();
            prop_assert!(nearly_equal(ab, ba, Tolerances::new(1e-9, 1e-9)));
            prop_assert!(ab <= a.max(b) * (1.0 + 1e-9));
            prop_assert!(ab >= a.min(b) * (1.0 - 1e-9));
        }
    }
}
