//! Coefficient bounds and the change-point search grid.
//!
//! Bounds are derived from the data's own extent: slope signs are fixed
//! (heating non-positive, cooling non-negative), change points live inside
//! the observed x range, and the baseload inside the observed y range. The
//! search grid enumerates sub-interval pairs whose ordering guarantees the
//! heating change point never crosses the cooling one.

/// Number of equal-width bins the x range is divided into for the
/// change-point search.
pub const DEFAULT_SEARCH_BINS: usize = 8;

/// Lower and upper bounds for the five model coefficients, in the order
/// (heating slope, heating CP, baseload, cooling CP, cooling slope).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoefficientBounds {
    pub lower: [f64; 5],
    pub upper: [f64; 5],
}

impl CoefficientBounds {
    /// Base bounds from raw data: heating slope in (-inf, 0], change points
    /// in [min x, max x], baseload in [min y, max y], cooling slope in
    /// [0, +inf). NaN values are ignored when taking extrema.
    pub fn from_data(x: &[f64], y: &[f64]) -> Self {
        let (x_min, x_max) = finite_extent(x);
        let (y_min, y_max) = finite_extent(y);
        CoefficientBounds {
            lower: [f64::NEG_INFINITY, x_min, y_min, x_min, 0.0],
            upper: [0.0, x_max, y_max, x_max, f64::INFINITY],
        }
    }

    /// The same bounds with the change-point dimensions narrowed to one grid
    /// cell's sub-intervals.
    pub fn with_change_point_window(&self, window: &ChangePointWindow) -> Self {
        let mut narrowed = *self;
        narrowed.lower[1] = window.heating.0;
        narrowed.upper[1] = window.heating.1;
        narrowed.lower[3] = window.cooling.0;
        narrowed.upper[3] = window.cooling.1;
        narrowed
    }

    /// Bounds as (lower, upper) pairs per dimension.
    pub fn as_pairs(&self) -> [(f64, f64); 5] {
        [
            (self.lower[0], self.upper[0]),
            (self.lower[1], self.upper[1]),
            (self.lower[2], self.upper[2]),
            (self.lower[3], self.upper[3]),
            (self.lower[4], self.upper[4]),
        ]
    }
}

/// One cell of the change-point search grid: a sub-interval for each change
/// point, with the heating sub-interval never after the cooling one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangePointWindow {
    /// (lower, upper) sub-interval for the heating change point.
    pub heating: (f64, f64),
    /// (lower, upper) sub-interval for the cooling change point.
    pub cooling: (f64, f64),
}

/// Enumerate the change-point search grid over the x range.
///
/// The range is divided into `n_bins` equal-width marks; every bin-index
/// pair `(i, j)` with `i < j` (both below `n_bins`) yields one window
/// pairing bin `i` for the heating change point with bin `j` for the
/// cooling one. Windows are emitted in increasing `(i, j)` order, which
/// fixes the first-encountered tie-break order used by model selection.
///
/// Total windows: C(n_bins, 2), i.e. 28 for the default 8 bins.
pub fn change_point_windows(x: &[f64], n_bins: usize) -> Vec<ChangePointWindow> {
    // Fewer than two bins cannot form a window pair.
    if n_bins < 2 {
        return Vec::new();
    }
    let (x_min, x_max) = finite_extent(x);
    let bin_width = (x_max - x_min) / n_bins as f64;
    let marks: Vec<f64> = (0..=n_bins).map(|i| x_min + i as f64 * bin_width).collect();

    let mut windows = Vec::with_capacity(n_bins * (n_bins - 1) / 2);
    for i in 0..n_bins {
        for j in (i + 1)..n_bins {
            windows.push(ChangePointWindow {
                heating: (marks[i], marks[i + 1]),
                cooling: (marks[j], marks[j + 1]),
            });
        }
    }
    windows
}

/// Minimum and maximum over the finite values of a slice. Returns (NaN, NaN)
/// when no finite value exists; callers validate against that upstream.
fn finite_extent(values: &[f64]) -> (f64, f64) {
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
        (f64::NAN, f64::NAN)
    } else {
        (min, max)
    }
}
