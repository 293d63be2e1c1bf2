//! Damped Newton iteration with a domain-preserving line search.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::config::SolverConfig;
use crate::error::{SolverError, SolverResult};
use crate::jacobian::finite_difference_jacobian;

/// A square system of scaled residual equations.
pub trait NonlinearSystem {
    fn residuals(&self, x: &DVector<f64>) -> SolverResult<DVector<f64>>;

    /// Index of the first unknown outside the physical domain.
    fn domain_violation(&self, x: &DVector<f64>) -> Option<usize>;

    /// Human readable name of unknown `index`.
    fn describe(&self, index: usize) -> String;
}

/// Progress reported at every iteration boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationProgress {
    pub iteration: usize,
    pub residual_norm: f64,
}

/// Observer verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Cancel,
}

/// Converged iterate.
#[derive(Debug, Clone)]
pub struct NewtonOutcome {
    pub x: DVector<f64>,
    pub residual_norm: f64,
    pub iterations: usize,
    /// Accepted through `SolverConfig::stall_tolerance` rather than `tolerance`.
    pub stalled: bool,
}

/// Numerical rank of `jac` after scaling column j by `max(|x_j|, 1)`, so that
/// every column is the response to a relative change of its unknown.
pub fn numerical_rank(jac: &DMatrix<f64>, x: &DVector<f64>, rank_tolerance: f64) -> usize {
    if jac.is_empty() {
        return 0;
    }
    let mut scaled = jac.clone();
    for (j, mut column) in scaled.column_iter_mut().enumerate() {
        column *= x[j].abs().max(1.0);
    }
    let singular = scaled.singular_values();
    let largest = singular.iter().copied().fold(0.0, f64::max);
    if largest <= 0.0 || !largest.is_finite() {
        return 0;
    }
    singular.iter().filter(|&&s| s > rank_tolerance * largest).count()
}

/// Fail unless the Jacobian at `x` determines every unknown.
fn ensure_full_rank(jac: &DMatrix<f64>, x: &DVector<f64>, config: &SolverConfig) -> SolverResult<()> {
    let rank = numerical_rank(jac, x, config.rank_tolerance);
    if rank < x.len() {
        return Err(SolverError::DegreesOfFreedom {
            equations: rank,
            unknowns: x.len(),
        });
    }
    Ok(())
}

/// Solve `J dx = -r` by LU. A rank deficient Jacobian means the constraints
/// leave some unknown undetermined; no least-squares step is taken.
fn linear_step(
    jac: DMatrix<f64>,
    x: &DVector<f64>,
    r: &DVector<f64>,
    iteration: usize,
    config: &SolverConfig,
) -> SolverResult<DVector<f64>> {
    ensure_full_rank(&jac, x, config)?;
    match jac.lu().solve(&-r) {
        Some(dx) if dx.iter().all(|v| v.is_finite()) => Ok(dx),
        _ => Err(SolverError::SingularJacobian { iteration }),
    }
}

/// Largest update relative to the magnitude of its unknown.
fn relative_step(x: &DVector<f64>, step: &DVector<f64>) -> f64 {
    x.iter()
        .zip(step.iter())
        .map(|(xi, di)| di.abs() / xi.abs().max(1.0))
        .fold(0.0, f64::max)
}

/// `Some(stalled)` once the iterate is accepted. `stalled` marks acceptance
/// through the stall tolerance after a step below `tolerance`.
fn convergence(r_norm: f64, last_step: f64, config: &SolverConfig) -> Option<bool> {
    if r_norm <= config.tolerance {
        return Some(false);
    }
    let stalled = config
        .stall_tolerance
        .is_some_and(|floor| last_step < config.tolerance && r_norm <= floor);
    stalled.then_some(true)
}

/// Why the last trial point was rejected.
enum Rejection {
    Domain { index: usize, value: f64, previous: f64 },
    Evaluation(SolverError),
}

/// Damped Newton iteration.
///
/// The Jacobian at the start point must have full rank; otherwise the
/// constraints do not pin every unknown and the solve fails with
/// `DegreesOfFreedom` before the observer is first called. Each step is
/// halved while the trial point leaves the domain or cannot be evaluated.
/// The first trial that lowers the residual norm is taken; if none does,
/// the first admissible one is. Converged when the residual norm drops to
/// the tolerance. With `stall_tolerance` set, a negligible step at a norm
/// within that bound is accepted too and flagged as stalled.
pub fn newton_solve<S: NonlinearSystem + ?Sized>(
    system: &S,
    x0: DVector<f64>,
    config: &SolverConfig,
    observer: &mut dyn FnMut(IterationProgress) -> Control,
) -> SolverResult<NewtonOutcome> {
    let mut x = x0;
    if let Some(index) = system.domain_violation(&x) {
        return Err(SolverError::Domain {
            variable: system.describe(index),
            value: x[index],
            previous: x[index],
        });
    }
    let mut r = system.residuals(&x)?;
    let mut r_norm = r.norm();
    let start_jacobian = finite_difference_jacobian(system, &x, &r, config.jacobian_epsilon)?;
    ensure_full_rank(&start_jacobian, &x, config)?;
    let mut cached_jacobian = Some(start_jacobian);
    let mut last_step = f64::INFINITY;

    for iteration in 0..=config.max_iterations {
        if observer(IterationProgress {
            iteration,
            residual_norm: r_norm,
        }) == Control::Cancel
        {
            return Err(SolverError::Cancelled { iteration });
        }

        if let Some(stalled) = convergence(r_norm, last_step, config) {
            return Ok(NewtonOutcome {
                x,
                residual_norm: r_norm,
                iterations: iteration,
                stalled,
            });
        }
        if iteration == config.max_iterations {
            break;
        }

        let jac = match cached_jacobian.take() {
            Some(jac) => jac,
            None => finite_difference_jacobian(system, &x, &r, config.jacobian_epsilon)?,
        };
        let dx = linear_step(jac, &x, &r, iteration, config)?;

        let mut alpha = 1.0;
        let mut first_valid: Option<(DVector<f64>, DVector<f64>, f64, f64)> = None;
        let mut accepted = None;
        let mut rejection = None;

        for _ in 0..=config.max_line_search {
            let trial = &x + alpha * &dx;
            if let Some(index) = system.domain_violation(&trial) {
                rejection = Some(Rejection::Domain {
                    index,
                    value: trial[index],
                    previous: x[index],
                });
            } else {
                match system.residuals(&trial) {
                    Ok(r_trial) => {
                        let norm = r_trial.norm();
                        if norm.is_finite() && norm < r_norm {
                            accepted = Some((trial, r_trial, norm, alpha));
                            break;
                        }
                        if norm.is_finite() && first_valid.is_none() {
                            first_valid = Some((trial, r_trial, norm, alpha));
                        }
                    }
                    Err(e) if e.is_recoverable() => rejection = Some(Rejection::Evaluation(e)),
                    Err(e) => return Err(e),
                }
            }
            alpha *= 0.5;
            if alpha < config.min_step {
                break;
            }
        }

        let Some((x_new, r_new, norm_new, step)) = accepted.or(first_valid) else {
            return Err(match rejection {
                Some(Rejection::Domain {
                    index,
                    value,
                    previous,
                }) => SolverError::Domain {
                    variable: system.describe(index),
                    value,
                    previous,
                },
                Some(Rejection::Evaluation(e)) => e,
                None => SolverError::Convergence {
                    iterations: iteration,
                    residual_norm: r_norm,
                },
            });
        };

        last_step = relative_step(&x, &(step * &dx));
        debug!(
            iteration,
            residual_norm = norm_new,
            step,
            "newton iteration"
        );
        x = x_new;
        r = r_new;
        r_norm = norm_new;
    }

    Err(SolverError::Convergence {
        iterations: config.max_iterations,
        residual_norm: r_norm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// x² − 4 = 0 on x > 0.
    struct Root;

    impl NonlinearSystem for Root {
        fn residuals(&self, x: &DVector<f64>) -> SolverResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] * x[0] - 4.0))
        }

        fn domain_violation(&self, x: &DVector<f64>) -> Option<usize> {
            (x[0] <= 0.0).then_some(0)
        }

        fn describe(&self, _index: usize) -> String {
            "x".into()
        }
    }

    fn never_cancel(_: IterationProgress) -> Control {
        Control::Continue
    }

    #[test]
    fn simple_quadratic() {
        let x0 = DVector::from_element(1, 3.0);
        let out = newton_solve(&Root, x0, &SolverConfig::default(), &mut never_cancel).unwrap();
        assert!((out.x[0] - 2.0).abs() < 1e-6);
        assert!(out.iterations > 0);
    }

    #[test]
    fn damping_keeps_iterate_positive() {
        // The full step from 0.1 overshoots to 20.05; halving finds a lower residual.
        let x0 = DVector::from_element(1, 0.1);
        let out = newton_solve(&Root, x0, &SolverConfig::default(), &mut never_cancel).unwrap();
        assert!((out.x[0] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn converged_start_needs_no_iteration() {
        let x0 = DVector::from_element(1, 2.0);
        let out = newton_solve(&Root, x0, &SolverConfig::default(), &mut never_cancel).unwrap();
        assert_eq!(out.iterations, 0);
    }

    #[test]
    fn iteration_limit_is_reported() {
        let config = SolverConfig::default().with_max_iterations(1);
        let x0 = DVector::from_element(1, 100.0);
        let err = newton_solve(&Root, x0, &config, &mut never_cancel).unwrap_err();
        assert!(matches!(err, SolverError::Convergence { iterations: 1, .. }));
    }

    #[test]
    fn observer_can_cancel() {
        let x0 = DVector::from_element(1, 3.0);
        let mut seen = Vec::new();
        let err = newton_solve(&Root, x0, &SolverConfig::default(), &mut |p| {
            seen.push(p.iteration);
            if p.iteration == 1 {
                Control::Cancel
            } else {
                Control::Continue
            }
        })
        .unwrap_err();
        assert!(matches!(err, SolverError::Cancelled { iteration: 1 }));
        assert_eq!(seen, vec![0, 1]);
    }

    #[test]
    fn infeasible_start_is_a_domain_error() {
        let x0 = DVector::from_element(1, -1.0);
        let err = newton_solve(&Root, x0, &SolverConfig::default(), &mut never_cancel).unwrap_err();
        assert!(matches!(err, SolverError::Domain { .. }));
    }

    /// Two unknowns, one relation stated twice.
    struct Redundant;

    impl NonlinearSystem for Redundant {
        fn residuals(&self, x: &DVector<f64>) -> SolverResult<DVector<f64>> {
            let sum = x[0] + x[1] - 2.0;
            Ok(DVector::from_vec(vec![sum, 2.0 * sum]))
        }

        fn domain_violation(&self, _x: &DVector<f64>) -> Option<usize> {
            None
        }

        fn describe(&self, index: usize) -> String {
            format!("x{index}")
        }
    }

    #[test]
    fn square_but_underdetermined_system_is_rejected_before_iterating() {
        // Already satisfied at the start point, so only the rank check can catch it.
        let x0 = DVector::from_vec(vec![1.0, 1.0]);
        let mut calls = 0;
        let err = newton_solve(&Redundant, x0, &SolverConfig::default(), &mut |_| {
            calls += 1;
            Control::Continue
        })
        .unwrap_err();
        assert!(matches!(
            err,
            SolverError::DegreesOfFreedom {
                equations: 1,
                unknowns: 2
            }
        ));
        assert_eq!(calls, 0);
    }

    #[test]
    fn rank_ignores_unknown_magnitudes() {
        // Pressure-like and mass-flow-like columns of very different size.
        let jac = DMatrix::from_row_slice(2, 2, &[1e-5, 0.0, 0.0, 1.0]);
        let x = DVector::from_vec(vec![4e5, 10.0]);
        assert_eq!(numerical_rank(&jac, &x, 1e-10), 2);
        let singular = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        assert_eq!(numerical_rank(&singular, &x, 1e-10), 1);
    }

    #[test]
    fn noise_floor_is_not_accepted_by_default() {
        // Negligible step, residual far above tolerance but within its square root.
        let config = SolverConfig::default();
        assert_eq!(convergence(9e-4, 1e-9, &config), None);
        assert_eq!(convergence(1e-7, f64::INFINITY, &config), Some(false));
    }

    #[test]
    fn configured_stall_tolerance_accepts_the_noise_floor() {
        let config = SolverConfig::default().with_stall_tolerance(1e-3);
        assert_eq!(convergence(9e-4, 1e-9, &config), Some(true));
        // Still moving: keep iterating.
        assert_eq!(convergence(9e-4, 1e-2, &config), None);
        assert_eq!(convergence(2e-3, 1e-9, &config), None);
    }

    #[test]
    fn exact_convergence_is_not_flagged_as_stalled() {
        let x0 = DVector::from_element(1, 3.0);
        let config = SolverConfig::default().with_stall_tolerance(1e-3);
        let out = newton_solve(&Root, x0, &config, &mut never_cancel).unwrap();
        assert!(!out.stalled);
    }
}
