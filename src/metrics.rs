//! Quality metrics gating model acceptance: R² and CV(RMSE).

/// Tolerance below which a residual sum of squares counts as zero when the
/// actual values have no variance.
const ZERO_RESIDUAL_TOLERANCE: f64 = 1e-12;

/// Coefficient of determination (R²) between actual and predicted values.
///
/// A zero-variance actual series is special-cased: a model that reproduces
/// the constant exactly scores 1.0, anything else scores 0.0, avoiding a
/// division by zero.
///
/// # Example
/// ```
/// use energy_changepoint::metrics::r_squared;
///
/// let actual = vec![1.0, 2.0, 3.0];
/// assert!((r_squared(&actual, &actual) - 1.0).abs() < 1e-12);
/// ```
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    debug_assert_eq!(actual.len(), predicted.len());
    if actual.is_empty() {
        return f64::NAN;
    }

    let mean = mean(actual);
    let ss_residuals: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_total: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_total == 0.0 {
        return if ss_residuals < ZERO_RESIDUAL_TOLERANCE {
            1.0
        } else {
            0.0
        };
    }

    1.0 - ss_residuals / ss_total
}

/// Coefficient of variation of the root-mean-squared error: RMSE normalized
/// by the mean of the actual values. Returns +∞ when that mean is zero.
pub fn cvrmse(actual: &[f64], predicted: &[f64]) -> f64 {
    debug_assert_eq!(actual.len(), predicted.len());
    if actual.is_empty() {
        return f64::NAN;
    }

    let n = actual.len() as f64;
    let mse: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / n;
    let mean_actual = mean(actual);

    if mean_actual == 0.0 {
        f64::INFINITY
    } else {
        mse.sqrt() / mean_actual
    }
}

/// Arithmetic mean of a slice; NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
