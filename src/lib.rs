//! Change-point models for building energy analysis.
//!
//! Fits piecewise-linear models relating energy use intensity to outdoor
//! temperature. Depending on which regimes the data supports, the fitted
//! model is five-parameter (heating slope, heating change point, baseload,
//! cooling change point, cooling slope), a three-parameter heating-only or
//! cooling-only variant, a one-parameter constant, or an explicit "No-fit".
//!
//! # Quick start
//!
//! ```
//! use energy_changepoint::{fit_changepoint_model, FitOptions, ModelType};
//!
//! // Energy use against outdoor temperature: heating below 12, flat
//! // baseload, cooling above 20.
//! let temperature: Vec<f64> = (0..17).map(|i| i as f64 * 2.0).collect();
//! let energy = vec![
//!     9.8, 9.0, 8.2, 7.4, 6.6, 5.8, 5.0, 5.0, 5.0, 5.0, 5.0, 6.0, 7.0,
//!     8.0, 9.0, 10.0, 11.0,
//! ];
//!
//! let result = fit_changepoint_model(&temperature, &energy, &FitOptions::default()).unwrap();
//! assert_eq!(result.model_type(), ModelType::FiveParameter);
//!
//! let predicted = result.predict(&[2.0, 18.0, 28.0]);
//! assert_eq!(predicted.len(), 3);
//! ```
//!
//! # Module layout
//!
//! - [`fit`]: the fitting entry points and [`FitOptions`]
//! - [`types`]: [`ChangePointModelResult`], [`ModelShape`], [`ModelType`]
//! - [`piecewise`]: evaluation of the piecewise-linear model function
//! - [`bounds`]: coefficient bounds and the change-point search grid
//! - [`optimize`]: bounded least-squares solver for one grid cell
//! - [`significance`]: slope t-tests
//! - [`selection`]: the model-selection cascade
//! - [`metrics`]: R² and CV(RMSE)
//! - [`error`]: [`ChangePointError`]

pub mod bounds;
pub mod error;
pub mod fit;
pub mod metrics;
pub mod optimize;
pub mod piecewise;
pub mod selection;
pub mod significance;
pub mod types;

pub use bounds::{change_point_windows, ChangePointWindow, CoefficientBounds, DEFAULT_SEARCH_BINS};
pub use error::{ChangePointError, Result};
pub use fit::{
    fit_changepoint_model, fit_cooling_model, fit_five_parameter_model, fit_heating_model,
    FitOptions, DEFAULT_CVRMSE_THRESHOLD, DEFAULT_R2_THRESHOLD, DEFAULT_SIGNIFICANT_PVAL,
};
pub use metrics::{cvrmse, r_squared};
pub use piecewise::piecewise_linear;
pub use types::{ChangePointModelResult, Coefficients, ModelShape, ModelType};

/// Commonly used items in one import.
pub mod prelude {
    pub use crate::error::{ChangePointError, Result};
    pub use crate::fit::{
        fit_changepoint_model, fit_cooling_model, fit_five_parameter_model, fit_heating_model,
        FitOptions,
    };
    pub use crate::types::{ChangePointModelResult, ModelShape, ModelType};
}
