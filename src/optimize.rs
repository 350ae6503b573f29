//! Bounded least-squares fitting of the piecewise model.
//!
//! Runs one bounded Nelder-Mead minimization of the sum of squared errors
//! for a given bounds configuration, then scores the fit (R², CV(RMSE)),
//! tests both slopes for significance, and estimates the coefficient
//! covariance from a finite-difference Jacobian.

use crate::bounds::CoefficientBounds;
use crate::metrics::{cvrmse, mean, r_squared};
use crate::piecewise::piecewise_linear;
use crate::significance::{slope_significance, SlopeKind, SlopeSignificance};
use crate::types::Coefficients;

/// One candidate fit from a single grid cell.
///
/// Transient: produced once per change-point window, consumed by model
/// selection within the same fitting call, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFit {
    /// Fitted coefficients (heating slope, heating CP, baseload, cooling
    /// CP, cooling slope).
    pub coefficients: [f64; 5],
    /// Covariance estimate s²(JᵀJ)⁻¹; NaN-filled when JᵀJ is singular or
    /// there are too few points.
    pub covariance: [[f64; 5]; 5],
    /// R² on the full dataset.
    pub r_squared: f64,
    /// CV(RMSE) on the full dataset.
    pub cvrmse: f64,
    /// Heating slope p-value (`None` for a structurally absent slope).
    pub heating_pvalue: Option<f64>,
    /// Cooling slope p-value (`None` for a structurally absent slope).
    pub cooling_pvalue: Option<f64>,
    /// Whether the heating slope cleared the significance threshold.
    pub heating_significant: bool,
    /// Whether the cooling slope cleared the significance threshold.
    pub cooling_significant: bool,
}

/// Attempt one bounded least-squares fit for a single bounds configuration.
///
/// Returns `None` when the solver fails to converge or the objective is not
/// finite at the solution. Such failures are expected for degenerate
/// change-point windows and simply mean "no candidate produced"; the
/// caller drops them and moves on to the next grid cell.
pub fn fit_once(
    x: &[f64],
    y: &[f64],
    bounds: &CoefficientBounds,
    significant_pvalue: f64,
) -> Option<CandidateFit> {
    let initial = initial_guess(x, y, bounds);
    let solution = minimize(
        |theta| sum_of_squared_errors(x, y, theta),
        initial,
        bounds,
        &SolverConfig::default(),
    );

    if !solution.converged || !solution.value.is_finite() {
        return None;
    }

    let coefficients = solution.point;
    let predicted = piecewise_linear(x, &Coefficients::full(&coefficients));
    let r2 = r_squared(y, &predicted);
    let cv = cvrmse(y, &predicted);

    let heating = slope_significance(
        coefficients[0],
        x,
        y,
        &coefficients,
        SlopeKind::Heating,
        significant_pvalue,
    );
    let cooling = slope_significance(
        coefficients[4],
        x,
        y,
        &coefficients,
        SlopeKind::Cooling,
        significant_pvalue,
    );

    let covariance = covariance_estimate(x, &coefficients, solution.value);

    Some(candidate(coefficients, covariance, r2, cv, heating, cooling))
}

fn candidate(
    coefficients: [f64; 5],
    covariance: [[f64; 5]; 5],
    r2: f64,
    cv: f64,
    heating: SlopeSignificance,
    cooling: SlopeSignificance,
) -> CandidateFit {
    CandidateFit {
        coefficients,
        covariance,
        r_squared: r2,
        cvrmse: cv,
        heating_pvalue: heating.pvalue,
        cooling_pvalue: cooling.pvalue,
        heating_significant: heating.significant,
        cooling_significant: cooling.significant,
    }
}

/// Sum of squared errors of the piecewise model against the data.
fn sum_of_squared_errors(x: &[f64], y: &[f64], theta: &[f64; 5]) -> f64 {
    let predicted = piecewise_linear(x, &Coefficients::full(theta));
    y.iter()
        .zip(predicted.iter())
        .map(|(yi, pi)| (yi - pi).powi(2))
        .sum()
}

/// Deterministic starting point inside the bounds: change points at their
/// window midpoints, baseload at the clamped data mean, and slopes at the
/// overall rise-over-run of the data with the sign each bound allows.
fn initial_guess(x: &[f64], y: &[f64], bounds: &CoefficientBounds) -> [f64; 5] {
    let pairs = bounds.as_pairs();

    let x_span = finite_span(x);
    let y_span = finite_span(y);
    let slope_scale = if x_span > 0.0 { y_span / x_span } else { 0.0 };

    [
        clamp(-slope_scale, pairs[0]),
        midpoint(pairs[1]),
        clamp(mean(y), pairs[2]),
        midpoint(pairs[3]),
        clamp(slope_scale, pairs[4]),
    ]
}

fn finite_span(values: &[f64]) -> f64 {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        if v.is_nan() {
            continue;
        }
        min = min.min(v);
        max = max.max(v);
    }
    if min > max {
        0.0
    } else {
        max - min
    }
}

fn midpoint((lower, upper): (f64, f64)) -> f64 {
    lower + (upper - lower) / 2.0
}

/// NaN-tolerant clamp: out-of-range values snap to the nearest bound, NaN
/// passes through unchanged.
fn clamp(value: f64, (lower, upper): (f64, f64)) -> f64 {
    if value < lower {
        lower
    } else if value > upper {
        upper
    } else {
        value
    }
}

fn clamp_point(point: &mut [f64; 5], pairs: &[(f64, f64); 5]) {
    for (value, &pair) in point.iter_mut().zip(pairs.iter()) {
        *value = clamp(*value, pair);
    }
}

/// Nelder-Mead settings for the 5-dimensional coefficient search.
#[derive(Debug, Clone)]
struct SolverConfig {
    max_iterations: usize,
    tolerance: f64,
    reflection: f64,
    expansion: f64,
    contraction: f64,
    shrink: f64,
    initial_step: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-8,
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
            initial_step: 0.05,
        }
    }
}

#[derive(Debug, Clone)]
struct Solution {
    point: [f64; 5],
    value: f64,
    converged: bool,
}

/// Bounded Nelder-Mead simplex minimization over the five coefficients.
///
/// Every trial point is clamped into the bounds before evaluation, which
/// keeps the sign constraints on the slopes and the change-point windows
/// hard. Convergence is declared when the simplex value range (or its
/// spatial extent) drops below the tolerance.
fn minimize<F>(
    objective: F,
    initial: [f64; 5],
    bounds: &CoefficientBounds,
    config: &SolverConfig,
) -> Solution
where
    F: Fn(&[f64; 5]) -> f64,
{
    const DIM: usize = 5;
    let pairs = bounds.as_pairs();

    let mut simplex: Vec<[f64; 5]> = Vec::with_capacity(DIM + 1);
    simplex.push(initial);
    for k in 0..DIM {
        let mut vertex = initial;
        let step = if initial[k].abs() > 1e-10 {
            config.initial_step * initial[k].abs()
        } else {
            config.initial_step
        };
        vertex[k] += step;
        clamp_point(&mut vertex, &pairs);
        simplex.push(vertex);
    }

    let mut values: Vec<f64> = simplex.iter().map(|v| objective(v)).collect();
    let mut converged = false;

    for _ in 0..config.max_iterations {
        let mut order: Vec<usize> = (0..=DIM).collect();
        order.sort_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let best = order[0];
        let worst = order[DIM];
        let second_worst = order[DIM - 1];

        if values[worst] - values[best] < config.tolerance {
            converged = true;
            break;
        }

        let centroid = centroid_excluding(&simplex, worst);
        let extent = simplex
            .iter()
            .map(|v| distance(v, &centroid))
            .fold(0.0, f64::max);
        if extent < config.tolerance {
            converged = true;
            break;
        }

        // Reflection.
        let mut reflected = step_from(&centroid, &simplex[worst], -config.reflection);
        clamp_point(&mut reflected, &pairs);
        let reflected_value = objective(&reflected);

        if reflected_value < values[second_worst] && reflected_value >= values[best] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        if reflected_value < values[best] {
            // Expansion.
            let mut expanded = step_from(&centroid, &reflected, config.expansion);
            clamp_point(&mut expanded, &pairs);
            let expanded_value = objective(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        // Contraction, outside or inside of the worst vertex.
        let toward = if reflected_value < values[worst] {
            reflected
        } else {
            simplex[worst]
        };
        let mut contracted = step_from(&centroid, &toward, config.contraction);
        clamp_point(&mut contracted, &pairs);
        let contracted_value = objective(&contracted);
        if contracted_value < values[worst].min(reflected_value) {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        // Shrink toward the best vertex.
        let anchor = simplex[best];
        for (k, vertex) in simplex.iter_mut().enumerate() {
            if k == best {
                continue;
            }
            for d in 0..DIM {
                vertex[d] = anchor[d] + config.shrink * (vertex[d] - anchor[d]);
            }
            clamp_point(vertex, &pairs);
            values[k] = objective(vertex);
        }
    }

    let best = values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    Solution {
        point: simplex[best],
        value: values[best],
        converged,
    }
}

fn centroid_excluding(simplex: &[[f64; 5]], exclude: usize) -> [f64; 5] {
    let mut centroid = [0.0; 5];
    let count = (simplex.len() - 1) as f64;
    for (k, vertex) in simplex.iter().enumerate() {
        if k == exclude {
            continue;
        }
        for d in 0..5 {
            centroid[d] += vertex[d];
        }
    }
    for c in &mut centroid {
        *c /= count;
    }
    centroid
}

/// Point at `centroid + factor * (target - centroid)`; a negative factor
/// reflects `target` through the centroid.
fn step_from(centroid: &[f64; 5], target: &[f64; 5], factor: f64) -> [f64; 5] {
    let mut point = [0.0; 5];
    for d in 0..5 {
        point[d] = centroid[d] + factor * (target[d] - centroid[d]);
    }
    point
}

fn distance(a: &[f64; 5], b: &[f64; 5]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Covariance of the fitted coefficients: s²(JᵀJ)⁻¹ with a
/// forward-difference Jacobian of the model predictions at the optimum.
///
/// Returns a NaN-filled matrix when the system is singular (common for
/// degenerate fits where a slope is pinned at zero) or when there are not
/// enough points for the residual variance.
fn covariance_estimate(x: &[f64], theta: &[f64; 5], sse: f64) -> [[f64; 5]; 5] {
    const NAN_MATRIX: [[f64; 5]; 5] = [[f64::NAN; 5]; 5];
    let n = x.len();
    if n <= 5 {
        return NAN_MATRIX;
    }

    let base = piecewise_linear(x, &Coefficients::full(theta));
    let mut jacobian = vec![[0.0f64; 5]; n];
    for k in 0..5 {
        let h = (theta[k].abs() * 1e-6).max(1e-6);
        let mut shifted = *theta;
        shifted[k] += h;
        let predicted = piecewise_linear(x, &Coefficients::full(&shifted));
        for i in 0..n {
            jacobian[i][k] = (predicted[i] - base[i]) / h;
        }
    }

    let mut jtj = [[0.0f64; 5]; 5];
    for row in &jacobian {
        for a in 0..5 {
            for b in 0..5 {
                jtj[a][b] += row[a] * row[b];
            }
        }
    }

    let inverse = match invert_5x5(&jtj) {
        Some(m) => m,
        None => return NAN_MATRIX,
    };

    let residual_variance = sse / (n - 5) as f64;
    let mut covariance = inverse;
    for row in &mut covariance {
        for value in row.iter_mut() {
            *value *= residual_variance;
        }
    }
    covariance
}

/// Gauss-Jordan inversion with partial pivoting; `None` for a singular
/// matrix.
fn invert_5x5(matrix: &[[f64; 5]; 5]) -> Option<[[f64; 5]; 5]> {
    const DIM: usize = 5;
    let mut a = *matrix;
    let mut inv = [[0.0f64; 5]; 5];
    for (d, row) in inv.iter_mut().enumerate() {
        row[d] = 1.0;
    }

    for col in 0..DIM {
        let pivot_row = (col..DIM)
            .max_by(|&r, &s| {
                a[r][col]
                    .abs()
                    .partial_cmp(&a[s][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        if a[pivot_row][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot_row);
        inv.swap(col, pivot_row);

        let pivot = a[col][col];
        for d in 0..DIM {
            a[col][d] /= pivot;
            inv[col][d] /= pivot;
        }
        for r in 0..DIM {
            if r == col {
                continue;
            }
            let factor = a[r][col];
            for d in 0..DIM {
                a[r][d] -= factor * a[col][d];
                inv[r][d] -= factor * inv[col][d];
            }
        }
    }

    Some(inv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::{change_point_windows, CoefficientBounds};
    use approx::assert_relative_eq;

    fn five_parameter_data() -> (Vec<f64>, Vec<f64>) {
        // Clean 5P shape: slope -0.4 below 12, baseload 5, slope 0.5 above 20.
        let x: Vec<f64> = (0..17).map(|i| i as f64 * 2.0).collect();
        let y: Vec<f64> = x
            .iter()
            .map(|&xi| {
                if xi < 12.0 {
                    -0.4 * (xi - 12.0) + 5.0
                } else if xi > 20.0 {
                    0.5 * (xi - 20.0) + 5.0
                } else {
                    5.0
                }
            })
            .collect();
        (x, y)
    }

    #[test]
    fn recovers_clean_five_parameter_coefficients() {
        let (x, y) = five_parameter_data();
        let base = CoefficientBounds::from_data(&x, &y);

        // Window around the true change points: heating in [8, 12],
        // cooling in [20, 24].
        let window = change_point_windows(&x, 8)
            .into_iter()
            .find(|w| w.heating.0 <= 12.0 && 12.0 <= w.heating.1 && w.cooling.0 <= 20.0 && 20.0 <= w.cooling.1)
            .expect("grid contains a window around the true change points");
        let cell = base.with_change_point_window(&window);

        let fit = fit_once(&x, &y, &cell, 0.1).expect("clean data should fit");
        assert!(fit.r_squared > 0.95, "r² = {}", fit.r_squared);
        assert!(fit.coefficients[0] < -0.1, "heating slope = {}", fit.coefficients[0]);
        assert!(fit.coefficients[4] > 0.1, "cooling slope = {}", fit.coefficients[4]);
        assert!(fit.heating_significant);
        assert!(fit.cooling_significant);
    }

    #[test]
    fn non_finite_data_produces_no_candidate() {
        let x = vec![0.0, f64::NAN, 10.0, 15.0];
        let y = vec![1.0, 2.0, 3.0, 4.0];
        let bounds = CoefficientBounds::from_data(&x, &y);
        assert!(fit_once(&x, &y, &bounds, 0.1).is_none());
    }

    #[test]
    fn constant_data_converges_to_baseload() {
        let x = vec![10.0; 8];
        let y = vec![5.0; 8];
        let bounds = CoefficientBounds::from_data(&x, &y);
        let fit = fit_once(&x, &y, &bounds, 0.1).expect("constant data converges");
        assert_relative_eq!(fit.coefficients[2], 5.0);
        assert!(!fit.heating_significant);
        assert!(!fit.cooling_significant);
    }

    #[test]
    fn solver_clamps_to_bounds() {
        let (x, y) = five_parameter_data();
        let bounds = CoefficientBounds::from_data(&x, &y);
        for window in change_point_windows(&x, 8) {
            let cell = bounds.with_change_point_window(&window);
            if let Some(fit) = fit_once(&x, &y, &cell, 0.1) {
                assert!(fit.coefficients[0] <= 0.0);
                assert!(fit.coefficients[4] >= 0.0);
                assert!(fit.coefficients[1] >= window.heating.0 - 1e-9);
                assert!(fit.coefficients[1] <= window.heating.1 + 1e-9);
                assert!(fit.coefficients[3] >= window.cooling.0 - 1e-9);
                assert!(fit.coefficients[3] <= window.cooling.1 + 1e-9);
            }
        }
    }

    #[test]
    fn covariance_diagonal_is_nonnegative_or_nan() {
        let (x, y) = five_parameter_data();
        let bounds = CoefficientBounds::from_data(&x, &y);
        for window in change_point_windows(&x, 8) {
            let cell = bounds.with_change_point_window(&window);
            if let Some(fit) = fit_once(&x, &y, &cell, 0.1) {
                for d in 0..5 {
                    let var = fit.covariance[d][d];
                    assert!(var.is_nan() || var >= -1e-9, "negative variance {var}");
                }
            }
        }
    }

    #[test]
    fn invert_5x5_identity_roundtrip() {
        let mut m = [[0.0f64; 5]; 5];
        for (d, row) in m.iter_mut().enumerate() {
            row[d] = (d + 1) as f64;
        }
        let inv = invert_5x5(&m).expect("diagonal matrix is invertible");
        for d in 0..5 {
            assert_relative_eq!(inv[d][d], 1.0 / (d + 1) as f64, epsilon = 1e-12);
        }
    }

    #[test]
    fn invert_5x5_singular_returns_none() {
        let m = [[1.0f64; 5]; 5];
        assert!(invert_5x5(&m).is_none());
    }

    #[test]
    fn initial_guess_respects_bounds() {
        let x = vec![0.0, 10.0, 20.0, 30.0];
        let y = vec![8.0, 5.0, 5.0, 9.0];
        let bounds = CoefficientBounds::from_data(&x, &y);
        let guess = initial_guess(&x, &y, &bounds);
        let pairs = bounds.as_pairs();
        for d in 0..5 {
            assert!(guess[d] >= pairs[d].0 && guess[d] <= pairs[d].1);
        }
        assert!(guess[0] <= 0.0);
        assert!(guess[4] >= 0.0);
    }
}
