//! Slope significance testing.
//!
//! Decides whether a fitted heating or cooling slope is statistically
//! distinguishable from zero using a one-sample t-test over the data subset
//! that slope governs.

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::metrics::mean;
use crate::piecewise::piecewise_linear;
use crate::types::Coefficients;

/// Slopes within this distance of zero are treated as structurally absent
/// rather than "insignificant but nonzero".
pub const ZERO_SLOPE_TOLERANCE: f64 = 1e-5;

/// Which slope of the fitted model is under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlopeKind {
    /// Slope below the heating change point (coefficient 0, governs
    /// x <= heating CP).
    Heating,
    /// Slope above the cooling change point (coefficient 4, governs
    /// x >= cooling CP).
    Cooling,
}

/// Outcome of a slope significance test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlopeSignificance {
    /// Two-tailed p-value. `None` for a structurally absent (near-zero)
    /// slope; +∞ when the governed subset has too few points.
    pub pvalue: Option<f64>,
    /// Whether the p-value clears the significance threshold.
    pub significant: bool,
}

impl SlopeSignificance {
    fn absent() -> Self {
        SlopeSignificance {
            pvalue: None,
            significant: false,
        }
    }

    fn insufficient_data() -> Self {
        SlopeSignificance {
            pvalue: Some(f64::INFINITY),
            significant: false,
        }
    }
}

/// Test a fitted slope against the data subset it governs.
///
/// `coefficients` is the full five-element vector from the optimizer; the
/// subset is x <= heating CP for [`SlopeKind::Heating`] and x >= cooling CP
/// for [`SlopeKind::Cooling`]. The standard error uses the residual sample
/// variance over (n - 2) degrees of freedom divided by the sum of squared
/// deviations of the subset's x values, and the two-tailed p-value comes
/// from the Student's-t survival function with (n - 1) degrees of freedom.
pub fn slope_significance(
    slope: f64,
    x: &[f64],
    y: &[f64],
    coefficients: &[f64; 5],
    kind: SlopeKind,
    significant_pvalue: f64,
) -> SlopeSignificance {
    if slope.abs() <= ZERO_SLOPE_TOLERANCE {
        return SlopeSignificance::absent();
    }

    let change_point = match kind {
        SlopeKind::Heating => coefficients[1],
        SlopeKind::Cooling => coefficients[3],
    };

    let (x_subset, y_subset): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y.iter())
        .filter(|(&xi, _)| match kind {
            SlopeKind::Heating => xi <= change_point,
            SlopeKind::Cooling => xi >= change_point,
        })
        .map(|(&xi, &yi)| (xi, yi))
        .unzip();

    if x_subset.len() <= 2 {
        return SlopeSignificance::insufficient_data();
    }

    let predicted = piecewise_linear(&x_subset, &Coefficients::full(coefficients));
    let pvalue = slope_pvalue(slope, &x_subset, &y_subset, &predicted);

    SlopeSignificance {
        pvalue: Some(pvalue),
        significant: pvalue < significant_pvalue,
    }
}

/// Two-tailed p-value of a regression slope from residuals over its subset.
fn slope_pvalue(slope: f64, x_subset: &[f64], y_subset: &[f64], predicted: &[f64]) -> f64 {
    let n = x_subset.len();
    if n <= 2 {
        return f64::INFINITY;
    }

    let sample_variance: f64 = y_subset
        .iter()
        .zip(predicted.iter())
        .map(|(yi, pi)| (yi - pi).powi(2))
        .sum::<f64>()
        / (n - 2) as f64;

    let x_mean = mean(x_subset);
    let sum_squares_x: f64 = x_subset.iter().map(|xi| (xi - x_mean).powi(2)).sum();

    let standard_error = (sample_variance / sum_squares_x).sqrt();
    let t_statistic = slope / standard_error;

    // Degrees of freedom n - 1 >= 2, so the constructor cannot fail.
    let dist = StudentsT::new(0.0, 1.0, (n - 1) as f64).unwrap();
    2.0 * dist.sf(t_statistic.abs())
}
