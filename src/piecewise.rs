//! The 5-parameter piecewise-linear change-point function.
//!
//! Evaluates predicted energy use at given x values (typically outdoor
//! temperatures) and degrades gracefully to 3-parameter and 1-parameter
//! shapes when coefficient slots are absent.

use crate::types::Coefficients;

/// Evaluate the piecewise-linear change-point function at every x.
///
/// The three regimes are:
/// - `x < heating_change_point`: a decreasing linear branch anchored so its
///   value at the change point equals the baseload;
/// - `heating_change_point <= x <= cooling_change_point`: the constant
///   baseload;
/// - `x > cooling_change_point`: an increasing linear branch anchored the
///   same way.
///
/// Absent (or NaN) coefficient slots degrade the shape: with no baseload the
/// output is all-NaN (an unusable model); with all four slope/change-point
/// slots absent the output is the constant baseload; with only one
/// slope/change-point pair present the missing pair collapses onto the other
/// change point with a zero slope.
///
/// Change-point ordering (heating CP <= cooling CP) is enforced upstream by
/// bounds construction; an ill-posed ordering here still evaluates without
/// panicking, with the heating comparison taking precedence. NaN x values
/// propagate to NaN predictions.
///
/// # Example
/// ```
/// use energy_changepoint::piecewise::piecewise_linear;
/// use energy_changepoint::types::Coefficients;
///
/// let coeffs = Coefficients::full(&[-0.5, 10.0, 4.0, 20.0, 0.25]);
/// let predicted = piecewise_linear(&[0.0, 10.0, 15.0, 20.0, 24.0], &coeffs);
/// assert_eq!(predicted, vec![9.0, 4.0, 4.0, 4.0, 5.0]);
/// ```
pub fn piecewise_linear(x: &[f64], coefficients: &Coefficients) -> Vec<f64> {
    let baseload = match present(coefficients.baseload) {
        Some(b) => b,
        None => return vec![f64::NAN; x.len()],
    };

    let heating = coefficient_pair(
        coefficients.heating_slope,
        coefficients.heating_change_point,
    );
    let cooling = coefficient_pair(
        coefficients.cooling_slope,
        coefficients.cooling_change_point,
    );

    let ((heating_slope, heating_cp), (cooling_slope, cooling_cp)) = match (heating, cooling) {
        (None, None) => return vec![baseload; x.len()],
        (Some(h), Some(c)) => (h, c),
        // Missing pair collapses onto the other change point with zero slope.
        (None, Some((cs, ccp))) => ((0.0, ccp), (cs, ccp)),
        (Some((hs, hcp)), None) => ((hs, hcp), (0.0, hcp)),
    };

    x.iter()
        .map(|&xi| {
            if xi.is_nan() {
                f64::NAN
            } else if xi < heating_cp {
                heating_slope * xi + baseload - heating_slope * heating_cp
            } else if xi > cooling_cp {
                cooling_slope * xi + baseload - cooling_slope * cooling_cp
            } else {
                baseload
            }
        })
        .collect()
}

/// A slot is present only when set and non-NaN.
fn present(slot: Option<f64>) -> Option<f64> {
    slot.filter(|v| !v.is_nan())
}

/// Both members of a slope/change-point pair must be present for the pair to
/// count; a half-set pair is treated as absent.
fn coefficient_pair(slope: Option<f64>, change_point: Option<f64>) -> Option<(f64, f64)> {
    match (present(slope), present(change_point)) {
        (Some(s), Some(cp)) => Some((s, cp)),
        _ => None,
    }
}
