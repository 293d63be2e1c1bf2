//! Finite difference Jacobian computation.

use nalgebra::{DMatrix, DVector};

use crate::error::SolverResult;
use crate::newton::NonlinearSystem;

/// Jacobian by forward differences, falling back to a backward difference for
/// columns whose forward step leaves the domain or fails to evaluate. An error
/// of the backward step is returned as is.
///
/// The step for column j is `epsilon · max(|x_j|, 1)`.
pub fn finite_difference_jacobian<S: NonlinearSystem + ?Sized>(
    system: &S,
    x: &DVector<f64>,
    f_x: &DVector<f64>,
    epsilon: f64,
) -> SolverResult<DMatrix<f64>> {
    let n = x.len();
    let m = f_x.len();
    let mut jac = DMatrix::zeros(m, n);

    for j in 0..n {
        let dx = epsilon * x[j].abs().max(1.0);

        let column = match perturbed(system, x, j, dx) {
            Ok(Some(f_plus)) => (f_plus - f_x) / dx,
            Ok(None) | Err(_) => match perturbed(system, x, j, -dx)? {
                Some(f_minus) => (f_x - f_minus) / dx,
                // Pinned on both sides; the rank check sees a zero column.
                None => DVector::zeros(m),
            },
        };
        jac.set_column(j, &column);
    }

    Ok(jac)
}

/// Residuals at `x` with `x[j]` shifted by `dx`, or `None` outside the domain.
fn perturbed<S: NonlinearSystem + ?Sized>(
    system: &S,
    x: &DVector<f64>,
    j: usize,
    dx: f64,
) -> SolverResult<Option<DVector<f64>>> {
    let mut x_step = x.clone();
    x_step[j] += dx;
    if system.domain_violation(&x_step).is_some() {
        return Ok(None);
    }
    system.residuals(&x_step).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// f(x) = x², domain x ≥ 0.
    struct Square;

    impl NonlinearSystem for Square {
        fn residuals(&self, x: &DVector<f64>) -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] * x[0]))
        }

        fn domain_violation(&self, x: &DVector<f64>) -> Option<usize> {
            (x[0] < 0.0).then_some(0)
        }

        fn describe(&self, _index: usize) -> String {
            "x".into()
        }
    }

    #[test]
    fn jacobian_quadratic() {
        let x = DVector::from_element(1, 3.0);
        let f_x = Square.residuals(&x).unwrap();
        let jac = finite_difference_jacobian(&Square, &x, &f_x, 1e-7).unwrap();
        assert!((jac[(0, 0)] - 6.0).abs() < 1e-5);
    }

    #[test]
    fn falls_back_to_backward_difference() {
        struct Bounded;
        impl NonlinearSystem for Bounded {
            fn residuals(&self, x: &DVector<f64>) -> SolverResult<DVector<f64>> {
                Ok(DVector::from_element(1, 2.0 * x[0]))
            }
            fn domain_violation(&self, x: &DVector<f64>) -> Option<usize> {
                (x[0] > 1.0).then_some(0)
            }
            fn describe(&self, _index: usize) -> String {
                "x".into()
            }
        }

        let x = DVector::from_element(1, 1.0);
        let f_x = Bounded.residuals(&x).unwrap();
        let jac = finite_difference_jacobian(&Bounded, &x, &f_x, 1e-6).unwrap();
        assert!((jac[(0, 0)] - 2.0).abs() < 1e-6);
    }
}
