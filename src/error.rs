//! Error types for the energy-changepoint library.

use thiserror::Error;

/// Result type alias for change-point fitting operations.
pub type Result<T> = std::result::Result<T, ChangePointError>;

/// Errors that can occur during change-point model fitting.
///
/// Invalid-input variants are detected synchronously at entry and never
/// retried. [`ChangePointError::FittingFailed`] means every candidate in the
/// change-point search grid failed to converge; callers may retry with a
/// different grid resolution, but the engine does not do so automatically.
///
/// A "No-fit" outcome is *not* an error: it is a normal
/// [`ChangePointModelResult`](crate::types::ChangePointModelResult) stating
/// that the data does not support any model meeting the quality thresholds.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChangePointError {
    /// The dependent variable array is empty.
    #[error("empty input data: y")]
    EmptyY,

    /// The independent variable array is empty.
    #[error("empty input data: x")]
    EmptyX,

    /// The two input arrays have different lengths.
    #[error("length mismatch: x has {x_len} elements, y has {y_len}")]
    LengthMismatch { x_len: usize, y_len: usize },

    /// The independent variable contains no usable (non-NaN) values.
    #[error("x data is entirely NaN")]
    AllNanX,

    /// No candidate in the change-point search grid converged.
    #[error("could not fit any change-point model with the given data")]
    FittingFailed,
}

impl ChangePointError {
    /// True for errors raised by input validation, as opposed to a fitting
    /// failure on structurally valid data.
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, ChangePointError::FittingFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        assert_eq!(ChangePointError::EmptyY.to_string(), "empty input data: y");
        assert_eq!(ChangePointError::EmptyX.to_string(), "empty input data: x");

        let err = ChangePointError::LengthMismatch { x_len: 12, y_len: 11 };
        assert_eq!(
            err.to_string(),
            "length mismatch: x has 12 elements, y has 11"
        );

        assert_eq!(
            ChangePointError::AllNanX.to_string(),
            "x data is entirely NaN"
        );
        assert_eq!(
            ChangePointError::FittingFailed.to_string(),
            "could not fit any change-point model with the given data"
        );
    }

    #[test]
    fn invalid_input_classification() {
        assert!(ChangePointError::EmptyX.is_invalid_input());
        assert!(ChangePointError::AllNanX.is_invalid_input());
        assert!(!ChangePointError::FittingFailed.is_invalid_input());
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = ChangePointError::EmptyY;
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
