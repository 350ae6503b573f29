//! Fitting orchestration: input validation, grid search, and model
//! selection.

use crate::bounds::{change_point_windows, CoefficientBounds, DEFAULT_SEARCH_BINS};
use crate::error::{ChangePointError, Result};
use crate::optimize::fit_once;
use crate::selection::select_model;
use crate::types::{ChangePointModelResult, ModelShape};

/// Default minimum R² for accepting a classified model.
pub const DEFAULT_R2_THRESHOLD: f64 = 0.6;
/// Default maximum CV(RMSE) for accepting the constant fallback.
pub const DEFAULT_CVRMSE_THRESHOLD: f64 = 0.5;
/// Default p-value threshold below which a slope counts as significant.
pub const DEFAULT_SIGNIFICANT_PVAL: f64 = 0.1;

/// Thresholds and search settings for one fitting call.
///
/// All state is explicit per call; the engine holds no process-wide
/// configuration.
///
/// # Example
/// ```
/// use energy_changepoint::FitOptions;
///
/// let options = FitOptions::default().min_r_squared(0.7);
/// assert_eq!(options.min_r_squared, 0.7);
/// assert_eq!(options.max_cv_rmse, 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Minimum R² a classified 5P/3P model must reach.
    pub min_r_squared: f64,
    /// Maximum CV(RMSE) for the 1P fallback to be accepted.
    pub max_cv_rmse: f64,
    /// Significance threshold for slope p-values.
    pub significant_pvalue: f64,
    /// Number of bins in the change-point search grid.
    pub n_bins: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            min_r_squared: DEFAULT_R2_THRESHOLD,
            max_cv_rmse: DEFAULT_CVRMSE_THRESHOLD,
            significant_pvalue: DEFAULT_SIGNIFICANT_PVAL,
            n_bins: DEFAULT_SEARCH_BINS,
        }
    }
}

impl FitOptions {
    /// Set the minimum R² threshold.
    pub fn min_r_squared(mut self, value: f64) -> Self {
        self.min_r_squared = value;
        self
    }

    /// Set the maximum CV(RMSE) threshold.
    pub fn max_cv_rmse(mut self, value: f64) -> Self {
        self.max_cv_rmse = value;
        self
    }

    /// Set the slope significance threshold.
    pub fn significant_pvalue(mut self, value: f64) -> Self {
        self.significant_pvalue = value;
        self
    }

    /// Set the number of change-point search bins.
    pub fn n_bins(mut self, value: usize) -> Self {
        self.n_bins = value;
        self
    }
}

/// Fit a change-point model to an (x, y) relationship.
///
/// Typical usage is x = outdoor temperature, y = energy use intensity, but
/// any paired numeric relationship works. The engine builds coefficient
/// bounds from the data's own extent, searches a grid of change-point
/// windows (in increasing bin order, which fixes the tie-break for equal-R²
/// candidates), and delegates to model selection. The call is a pure
/// function of its inputs: identical inputs and options yield identical
/// results.
///
/// # Errors
/// - invalid input (empty arrays, length mismatch, all-NaN x) is rejected
///   up front;
/// - [`ChangePointError::FittingFailed`] when no grid cell converges at all.
///
/// Per-cell convergence failures are expected and recovered locally; a
/// "No-fit" result is a normal outcome, not an error.
///
/// # Example
/// ```
/// use energy_changepoint::{fit_changepoint_model, FitOptions};
///
/// let x = vec![0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0];
/// let y = vec![10.0, 8.0, 6.0, 5.0, 5.0, 7.0, 10.0];
/// let result = fit_changepoint_model(&x, &y, &FitOptions::default()).unwrap();
/// assert!(result.baseload() > 0.0);
/// ```
pub fn fit_changepoint_model(
    x: &[f64],
    y: &[f64],
    options: &FitOptions,
) -> Result<ChangePointModelResult> {
    validate_inputs(x, y)?;

    let base_bounds = CoefficientBounds::from_data(x, y);
    let windows = change_point_windows(x, options.n_bins);

    let mut candidates = Vec::with_capacity(windows.len());
    for window in &windows {
        let cell = base_bounds.with_change_point_window(window);
        if let Some(fit) = fit_once(x, y, &cell, options.significant_pvalue) {
            candidates.push(fit);
        }
    }

    if candidates.is_empty() {
        return Err(ChangePointError::FittingFailed);
    }

    Ok(select_model(
        &candidates,
        x,
        y,
        options.min_r_squared,
        options.max_cv_rmse,
    ))
}

/// Fit and force the result toward a heating-only (3P-H) shape.
///
/// Runs the full fit; a 5P winner is projected down to its heating branch
/// (quality metrics kept verbatim from the full fit). Results that carry no
/// heating component are returned unchanged.
pub fn fit_heating_model(
    x: &[f64],
    y: &[f64],
    options: &FitOptions,
) -> Result<ChangePointModelResult> {
    let result = fit_changepoint_model(x, y, options)?;
    match result.shape {
        ModelShape::FiveParameter {
            heating_slope,
            heating_change_point,
            baseload,
            ..
        } => Ok(ChangePointModelResult {
            shape: ModelShape::ThreeParameterHeating {
                heating_slope,
                heating_change_point,
                baseload,
            },
            ..result
        }),
        _ => Ok(result),
    }
}

/// Fit and force the result toward a cooling-only (3P-C) shape.
///
/// The mirror image of [`fit_heating_model`].
pub fn fit_cooling_model(
    x: &[f64],
    y: &[f64],
    options: &FitOptions,
) -> Result<ChangePointModelResult> {
    let result = fit_changepoint_model(x, y, options)?;
    match result.shape {
        ModelShape::FiveParameter {
            baseload,
            cooling_change_point,
            cooling_slope,
            ..
        } => Ok(ChangePointModelResult {
            shape: ModelShape::ThreeParameterCooling {
                baseload,
                cooling_change_point,
                cooling_slope,
            },
            ..result
        }),
        _ => Ok(result),
    }
}

/// Fit with the full five-parameter search.
///
/// An alias for [`fit_changepoint_model`]: the full fit already considers
/// every shape, so there is nothing to force. Kept for symmetry with
/// [`fit_heating_model`] and [`fit_cooling_model`].
pub fn fit_five_parameter_model(
    x: &[f64],
    y: &[f64],
    options: &FitOptions,
) -> Result<ChangePointModelResult> {
    fit_changepoint_model(x, y, options)
}

fn validate_inputs(x: &[f64], y: &[f64]) -> Result<()> {
    if y.is_empty() {
        return Err(ChangePointError::EmptyY);
    }
    if x.is_empty() {
        return Err(ChangePointError::EmptyX);
    }
    if x.len() != y.len() {
        return Err(ChangePointError::LengthMismatch {
            x_len: x.len(),
            y_len: y.len(),
        });
    }
    if x.iter().all(|v| v.is_nan()) {
        return Err(ChangePointError::AllNanX);
    }
    Ok(())
}
