//! Core types: model shapes, coefficient vectors, and the fit result.

use std::fmt;

use crate::piecewise::piecewise_linear;

/// The selected model complexity.
///
/// The short labels follow the change-point modeling literature: "1P" is a
/// constant baseload, "3P-H"/"3P-C" add a heating or cooling slope, and "5P"
/// has both slopes plus two change points. "No-fit" means no shape met the
/// quality thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelType {
    OneParameter,
    ThreeParameterHeating,
    ThreeParameterCooling,
    FiveParameter,
    NoFit,
}

impl ModelType {
    /// Short label ("1P", "3P-H", "3P-C", "5P", "No-fit").
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::OneParameter => "1P",
            ModelType::ThreeParameterHeating => "3P-H",
            ModelType::ThreeParameterCooling => "3P-C",
            ModelType::FiveParameter => "5P",
            ModelType::NoFit => "No-fit",
        }
    }

    /// Number of free parameters in the shape (1 for "No-fit", which still
    /// carries a baseload).
    pub fn parameter_count(&self) -> usize {
        match self {
            ModelType::OneParameter | ModelType::NoFit => 1,
            ModelType::ThreeParameterHeating | ModelType::ThreeParameterCooling => 3,
            ModelType::FiveParameter => 5,
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fitted coefficients for one model shape.
///
/// Each variant carries exactly the coefficients that exist for that shape,
/// so illegal combinations (e.g. cooling fields on a heating-only model)
/// cannot be constructed. Baseload is present in every variant, including
/// `NoFit`, where it holds the data mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelShape {
    NoFit {
        baseload: f64,
    },
    OneParameter {
        baseload: f64,
    },
    ThreeParameterHeating {
        heating_slope: f64,
        heating_change_point: f64,
        baseload: f64,
    },
    ThreeParameterCooling {
        baseload: f64,
        cooling_change_point: f64,
        cooling_slope: f64,
    },
    FiveParameter {
        heating_slope: f64,
        heating_change_point: f64,
        baseload: f64,
        cooling_change_point: f64,
        cooling_slope: f64,
    },
}

impl ModelShape {
    /// The model type tag for this shape.
    pub fn model_type(&self) -> ModelType {
        match self {
            ModelShape::NoFit { .. } => ModelType::NoFit,
            ModelShape::OneParameter { .. } => ModelType::OneParameter,
            ModelShape::ThreeParameterHeating { .. } => ModelType::ThreeParameterHeating,
            ModelShape::ThreeParameterCooling { .. } => ModelType::ThreeParameterCooling,
            ModelShape::FiveParameter { .. } => ModelType::FiveParameter,
        }
    }

    /// Constant-regime value; defined for every shape.
    pub fn baseload(&self) -> f64 {
        match *self {
            ModelShape::NoFit { baseload }
            | ModelShape::OneParameter { baseload }
            | ModelShape::ThreeParameterHeating { baseload, .. }
            | ModelShape::ThreeParameterCooling { baseload, .. }
            | ModelShape::FiveParameter { baseload, .. } => baseload,
        }
    }

    /// Slope below the heating change point, when the shape has one.
    pub fn heating_slope(&self) -> Option<f64> {
        match *self {
            ModelShape::ThreeParameterHeating { heating_slope, .. }
            | ModelShape::FiveParameter { heating_slope, .. } => Some(heating_slope),
            _ => None,
        }
    }

    /// Temperature where the heating regime ends, when the shape has one.
    pub fn heating_change_point(&self) -> Option<f64> {
        match *self {
            ModelShape::ThreeParameterHeating {
                heating_change_point,
                ..
            }
            | ModelShape::FiveParameter {
                heating_change_point,
                ..
            } => Some(heating_change_point),
            _ => None,
        }
    }

    /// Temperature where the cooling regime begins, when the shape has one.
    pub fn cooling_change_point(&self) -> Option<f64> {
        match *self {
            ModelShape::ThreeParameterCooling {
                cooling_change_point,
                ..
            }
            | ModelShape::FiveParameter {
                cooling_change_point,
                ..
            } => Some(cooling_change_point),
            _ => None,
        }
    }

    /// Slope above the cooling change point, when the shape has one.
    pub fn cooling_slope(&self) -> Option<f64> {
        match *self {
            ModelShape::ThreeParameterCooling { cooling_slope, .. }
            | ModelShape::FiveParameter { cooling_slope, .. } => Some(cooling_slope),
            _ => None,
        }
    }

    /// The five-slot coefficient view used by the piecewise model function.
    pub fn coefficients(&self) -> Coefficients {
        Coefficients {
            heating_slope: self.heating_slope(),
            heating_change_point: self.heating_change_point(),
            baseload: Some(self.baseload()),
            cooling_change_point: self.cooling_change_point(),
            cooling_slope: self.cooling_slope(),
        }
    }
}

/// Five-slot coefficient vector with optional slots.
///
/// This is the working representation fed to the piecewise model function:
/// absent slots (or NaN values, which are treated as absent) degrade the
/// 5-parameter shape to a 3-parameter or 1-parameter one. Fitted results use
/// [`ModelShape`] instead, where absence is encoded structurally.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coefficients {
    pub heating_slope: Option<f64>,
    pub heating_change_point: Option<f64>,
    pub baseload: Option<f64>,
    pub cooling_change_point: Option<f64>,
    pub cooling_slope: Option<f64>,
}

impl Coefficients {
    /// All five coefficients from an optimizer parameter vector, in the
    /// order (heating slope, heating CP, baseload, cooling CP, cooling
    /// slope).
    pub fn full(values: &[f64; 5]) -> Self {
        Coefficients {
            heating_slope: Some(values[0]),
            heating_change_point: Some(values[1]),
            baseload: Some(values[2]),
            cooling_change_point: Some(values[3]),
            cooling_slope: Some(values[4]),
        }
    }

    /// Baseload-only (1P) coefficient set.
    pub fn constant(baseload: f64) -> Self {
        Coefficients {
            baseload: Some(baseload),
            ..Coefficients::default()
        }
    }

    /// Heating-only (3P-H) coefficient set; cooling slots absent.
    pub fn heating_only(heating_slope: f64, heating_change_point: f64, baseload: f64) -> Self {
        Coefficients {
            heating_slope: Some(heating_slope),
            heating_change_point: Some(heating_change_point),
            baseload: Some(baseload),
            ..Coefficients::default()
        }
    }

    /// Cooling-only (3P-C) coefficient set; heating slots absent.
    pub fn cooling_only(baseload: f64, cooling_change_point: f64, cooling_slope: f64) -> Self {
        Coefficients {
            baseload: Some(baseload),
            cooling_change_point: Some(cooling_change_point),
            cooling_slope: Some(cooling_slope),
            ..Coefficients::default()
        }
    }
}

/// Immutable result of a change-point model fit.
///
/// Invariants:
/// - the baseload is always defined, even for "No-fit" (it holds the data
///   mean there);
/// - heating fields are present only for 3P-H/5P shapes, cooling fields
///   only for 3P-C/5P, and `heating_slope <= 0`, `cooling_slope >= 0`
///   whenever present (enforced by the optimization bounds);
/// - p-values are reported verbatim from the winning candidate, including
///   the non-driving slope's p-value on a 3P shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangePointModelResult {
    /// Selected shape with its coefficients.
    pub shape: ModelShape,
    /// Goodness of fit of the chosen model on the full dataset.
    pub r_squared: f64,
    /// CV(RMSE) of the chosen model on the full dataset.
    pub cvrmse: f64,
    /// Two-tailed significance of the heating slope, when tested.
    pub heating_pvalue: Option<f64>,
    /// Two-tailed significance of the cooling slope, when tested.
    pub cooling_pvalue: Option<f64>,
}

impl ChangePointModelResult {
    /// The model type tag.
    pub fn model_type(&self) -> ModelType {
        self.shape.model_type()
    }

    /// Constant-regime value (data mean for "No-fit").
    pub fn baseload(&self) -> f64 {
        self.shape.baseload()
    }

    /// Heating slope, when the shape has one.
    pub fn heating_slope(&self) -> Option<f64> {
        self.shape.heating_slope()
    }

    /// Heating change point, when the shape has one.
    pub fn heating_change_point(&self) -> Option<f64> {
        self.shape.heating_change_point()
    }

    /// Cooling change point, when the shape has one.
    pub fn cooling_change_point(&self) -> Option<f64> {
        self.shape.cooling_change_point()
    }

    /// Cooling slope, when the shape has one.
    pub fn cooling_slope(&self) -> Option<f64> {
        self.shape.cooling_slope()
    }

    /// Number of free parameters in the selected shape.
    pub fn parameter_count(&self) -> usize {
        self.model_type().parameter_count()
    }

    /// Evaluate the fitted model at the given x values.
    ///
    /// Downstream consumers (e.g. savings estimation) use this to re-predict
    /// energy use at target conditions.
    pub fn predict(&self, x: &[f64]) -> Vec<f64> {
        piecewise_linear(x, &self.shape.coefficients())
    }

    /// Whether the fit meets both quality thresholds.
    pub fn is_valid(&self, min_r_squared: f64, max_cv_rmse: f64) -> bool {
        self.r_squared >= min_r_squared && self.cvrmse <= max_cv_rmse
    }

    /// Rough annual consumption estimate from heating and cooling
    /// degree-days: `baseload * 365 + heating_slope * hdd + cooling_slope *
    /// cdd` with absent slopes contributing nothing.
    pub fn estimate_annual_consumption(&self, annual_hdd: f64, annual_cdd: f64) -> f64 {
        let mut annual = self.baseload() * 365.0;
        if let Some(slope) = self.heating_slope() {
            annual += slope * annual_hdd;
        }
        if let Some(slope) = self.cooling_slope() {
            annual += slope * annual_cdd;
        }
        annual
    }
}
