//! Model selection: from candidate fits to one final result.
//!
//! Filters candidates for statistical validity, picks the best-fitting one,
//! classifies its shape from the two slope significance flags, gates it on
//! R², and falls back to a constant (1P) model or "No-fit" when nothing
//! qualifies.

use crate::metrics::{cvrmse, mean, r_squared};
use crate::optimize::CandidateFit;
use crate::piecewise::piecewise_linear;
use crate::types::{ChangePointModelResult, Coefficients, ModelShape};

/// Select the single best model from the grid-search candidates.
///
/// The cascade is strictly linear: candidates with at least one significant
/// slope are filtered, the highest-R² one wins (first encountered on ties,
/// in grid order), its shape is classified from the two significance flags
/// and gated on `min_r_squared`. A gate failure drops straight to the 1P
/// fallback: a 5P candidate failing its gate is *not* re-tried as either
/// 3P sub-model. The fallback accepts a constant model when its CV(RMSE) is
/// within `max_cv_rmse` and reports "No-fit" otherwise, with the baseload
/// still set to the data mean.
pub fn select_model(
    candidates: &[CandidateFit],
    x: &[f64],
    y: &[f64],
    min_r_squared: f64,
    max_cv_rmse: f64,
) -> ChangePointModelResult {
    let mut best: Option<&CandidateFit> = None;
    for candidate in candidates {
        if !(candidate.heating_significant || candidate.cooling_significant) {
            continue;
        }
        // Strict comparison keeps the first-encountered candidate on ties.
        if best.map_or(true, |b| candidate.r_squared > b.r_squared) {
            best = Some(candidate);
        }
    }

    if let Some(winner) = best {
        if let Some(result) = classify(winner, x, y, min_r_squared) {
            return result;
        }
    }

    fit_constant_fallback(y, max_cv_rmse)
}

/// Classify the winning candidate's shape from its significance flags and
/// apply the R² gate for that shape. `None` means the gate failed and the
/// caller should fall back.
fn classify(
    winner: &CandidateFit,
    x: &[f64],
    y: &[f64],
    min_r_squared: f64,
) -> Option<ChangePointModelResult> {
    let [heating_slope, heating_cp, baseload, cooling_cp, cooling_slope] = winner.coefficients;

    let (shape, gate_coefficients) = match (winner.heating_significant, winner.cooling_significant)
    {
        (true, true) => (
            ModelShape::FiveParameter {
                heating_slope,
                heating_change_point: heating_cp,
                baseload,
                cooling_change_point: cooling_cp,
                cooling_slope,
            },
            Coefficients::full(&winner.coefficients),
        ),
        (false, true) => (
            ModelShape::ThreeParameterCooling {
                baseload,
                cooling_change_point: cooling_cp,
                cooling_slope,
            },
            Coefficients::cooling_only(baseload, cooling_cp, cooling_slope),
        ),
        (true, false) => (
            ModelShape::ThreeParameterHeating {
                heating_slope,
                heating_change_point: heating_cp,
                baseload,
            },
            Coefficients::heating_only(heating_slope, heating_cp, baseload),
        ),
        // Unreachable: the winner passed the any-significant filter.
        (false, false) => return None,
    };

    if !passes_r2_gate(x, y, &gate_coefficients, min_r_squared) {
        return None;
    }

    Some(ChangePointModelResult {
        shape,
        r_squared: winner.r_squared,
        cvrmse: winner.cvrmse,
        heating_pvalue: winner.heating_pvalue,
        cooling_pvalue: winner.cooling_pvalue,
    })
}

/// Re-predict with the shape's own coefficient set and check the R²
/// threshold.
fn passes_r2_gate(x: &[f64], y: &[f64], coefficients: &Coefficients, min_r_squared: f64) -> bool {
    let predicted = piecewise_linear(x, coefficients);
    r_squared(y, &predicted) >= min_r_squared
}

/// Constant-model fallback: baseload = mean(y), accepted as 1P when its
/// CV(RMSE) is within the threshold, otherwise reported as "No-fit".
pub fn fit_constant_fallback(y: &[f64], max_cv_rmse: f64) -> ChangePointModelResult {
    let baseload = mean(y);
    let predicted = vec![baseload; y.len()];
    let r2 = r_squared(y, &predicted);
    let cv = cvrmse(y, &predicted);

    let shape = if cv <= max_cv_rmse {
        ModelShape::OneParameter { baseload }
    } else {
        ModelShape::NoFit { baseload }
    };

    ChangePointModelResult {
        shape,
        r_squared: r2,
        cvrmse: cv,
        heating_pvalue: None,
        cooling_pvalue: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModelType;
    use approx::assert_relative_eq;

    const NO_COVARIANCE: [[f64; 5]; 5] = [[f64::NAN; 5]; 5];

    fn candidate(
        coefficients: [f64; 5],
        r_squared: f64,
        heating_significant: bool,
        cooling_significant: bool,
    ) -> CandidateFit {
        CandidateFit {
            coefficients,
            covariance: NO_COVARIANCE,
            r_squared,
            cvrmse: 0.1,
            heating_pvalue: if heating_significant { Some(0.01) } else { Some(0.5) },
            cooling_pvalue: if cooling_significant { Some(0.02) } else { Some(0.6) },
            heating_significant,
            cooling_significant,
        }
    }

    /// Clean 5P data matching coefficients [-0.4, 12, 5, 20, 0.5].
    fn five_parameter_data() -> (Vec<f64>, Vec<f64>) {
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
    fn both_significant_passing_gate_yields_five_parameter() {
        let (x, y) = five_parameter_data();
        let winner = candidate([-0.4, 12.0, 5.0, 20.0, 0.5], 0.99, true, true);
        let result = select_model(&[winner], &x, &y, 0.6, 0.5);

        assert_eq!(result.model_type(), ModelType::FiveParameter);
        assert_relative_eq!(result.r_squared, 0.99);
        assert_eq!(result.heating_pvalue, Some(0.01));
        assert_eq!(result.cooling_pvalue, Some(0.02));
        assert_eq!(result.heating_slope(), Some(-0.4));
        assert_eq!(result.cooling_slope(), Some(0.5));
    }

    #[test]
    fn only_cooling_significant_yields_three_parameter_cooling() {
        // Cooling-only data: flat at 5 until x = 20, rising after.
        let x: Vec<f64> = (0..16).map(|i| i as f64 * 2.0).collect();
        let y: Vec<f64> = x
            .iter()
            .map(|&xi| if xi > 20.0 { 0.5 * (xi - 20.0) + 5.0 } else { 5.0 })
            .collect();
        let winner = candidate([0.0, 10.0, 5.0, 20.0, 0.5], 0.97, false, true);
        let result = select_model(&[winner], &x, &y, 0.6, 0.5);

        assert_eq!(result.model_type(), ModelType::ThreeParameterCooling);
        assert_eq!(result.heating_slope(), None);
        assert_eq!(result.heating_change_point(), None);
        assert_eq!(result.cooling_slope(), Some(0.5));
        // The non-driving slope's p-value is still reported.
        assert_eq!(result.heating_pvalue, Some(0.5));
    }

    #[test]
    fn only_heating_significant_yields_three_parameter_heating() {
        let x: Vec<f64> = (0..16).map(|i| i as f64 * 2.0).collect();
        let y: Vec<f64> = x
            .iter()
            .map(|&xi| if xi < 12.0 { -0.4 * (xi - 12.0) + 5.0 } else { 5.0 })
            .collect();
        let winner = candidate([-0.4, 12.0, 5.0, 25.0, 0.0], 0.96, true, false);
        let result = select_model(&[winner], &x, &y, 0.6, 0.5);

        assert_eq!(result.model_type(), ModelType::ThreeParameterHeating);
        assert_eq!(result.cooling_slope(), None);
        assert_eq!(result.cooling_change_point(), None);
        assert_eq!(result.heating_slope(), Some(-0.4));
    }

    #[test]
    fn gate_failure_falls_back_without_trying_simpler_shapes() {
        // Winner claims both slopes significant but its coefficients do not
        // describe the data at all, so the 5P re-prediction fails the gate.
        let (x, y) = five_parameter_data();
        let winner = candidate([-0.01, 2.0, 9.0, 30.0, 0.01], 0.95, true, true);
        let result = select_model(&[winner], &x, &y, 0.6, 0.5);

        // Straight to the constant fallback, never 3P.
        assert!(matches!(
            result.model_type(),
            ModelType::OneParameter | ModelType::NoFit
        ));
        assert_relative_eq!(result.baseload(), mean(&y));
        assert_eq!(result.heating_pvalue, None);
    }

    #[test]
    fn no_significant_candidates_falls_back_to_constant() {
        let (x, y) = five_parameter_data();
        let candidates = vec![
            candidate([-0.4, 12.0, 5.0, 20.0, 0.5], 0.99, false, false),
            candidate([-0.3, 10.0, 5.0, 22.0, 0.4], 0.90, false, false),
        ];
        let result = select_model(&candidates, &x, &y, 0.6, 0.5);
        assert!(matches!(
            result.model_type(),
            ModelType::OneParameter | ModelType::NoFit
        ));
    }

    #[test]
    fn highest_r_squared_wins_first_encountered_on_ties() {
        let (x, y) = five_parameter_data();
        let first = candidate([-0.4, 12.0, 5.0, 20.0, 0.5], 0.99, true, true);
        let mut tied = first.clone();
        tied.coefficients = [-0.39, 11.0, 5.0, 21.0, 0.49];
        let lower = candidate([-0.2, 8.0, 5.5, 24.0, 0.3], 0.80, true, true);

        let result = select_model(&[lower.clone(), first.clone(), tied], &x, &y, 0.6, 0.5);
        // The first 0.99 candidate wins, not the tied later one.
        assert_eq!(result.heating_change_point(), Some(12.0));

        let result = select_model(&[first, lower], &x, &y, 0.6, 0.5);
        assert_eq!(result.heating_change_point(), Some(12.0));
    }

    #[test]
    fn constant_fallback_accepts_within_cvrmse() {
        let y = vec![5.0, 5.2, 4.8, 5.1, 4.9];
        let result = fit_constant_fallback(&y, 0.5);
        assert_eq!(result.model_type(), ModelType::OneParameter);
        assert_relative_eq!(result.baseload(), 5.0, epsilon = 1e-12);
        assert!(result.cvrmse <= 0.5);
    }

    #[test]
    fn constant_fallback_reports_no_fit_beyond_cvrmse() {
        let y = vec![1.0, 20.0, 1.0, 20.0];
        let result = fit_constant_fallback(&y, 0.5);
        assert_eq!(result.model_type(), ModelType::NoFit);
        // Baseload still populated with the mean.
        assert_relative_eq!(result.baseload(), 10.5);
        assert_eq!(result.heating_pvalue, None);
        assert_eq!(result.cooling_pvalue, None);
    }

    #[test]
    fn constant_fallback_on_zero_variance_is_perfect() {
        let y = vec![5.0; 20];
        let result = fit_constant_fallback(&y, 0.5);
        assert_eq!(result.model_type(), ModelType::OneParameter);
        assert_relative_eq!(result.r_squared, 1.0);
        assert_relative_eq!(result.cvrmse, 0.0);
    }
}
