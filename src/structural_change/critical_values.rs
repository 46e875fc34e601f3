//! structural_change::critical_values — critical-value table and p-value lookup.
//!
//! Purpose
//! -------
//! Hold the tabulated boundary-crossing critical values of the OLS-MOSUM
//! `max` functional and convert a test statistic into a p-value by double
//! linear interpolation: first in the bandwidth h (one critical value per
//! significance level), then in the statistic.
//!
//! Key behaviors
//! -------------
//! - [`CriticalValueTable::new`] validates a caller-supplied table against a
//!   [`TableLayout`] (shape, finiteness, ordering).
//! - [`CriticalValueTable::mosum_max`] hands out the shipped 60 × 4 table,
//!   built once per process.
//! - [`CriticalValueTable::p_value`] performs the lookup; the helpers
//!   [`interpolated_critical_values`](CriticalValueTable::interpolated_critical_values)
//!   and [`critical_value`](CriticalValueTable::critical_value) expose the
//!   intermediate boundary.
//!
//! Invariants & assumptions
//! ------------------------
//! - Rows are grouped in blocks of `table_dim` bandwidth knots, one block per
//!   regressor count `k = 1..=max_k`; block `k` spans rows
//!   `[(k − 1)·table_dim, k·table_dim)`.
//! - Bandwidth knot `i` (0-based) is `(i + 1)·bandwidth_step`.
//! - Columns follow `levels`, which decrease strictly, so every row increases
//!   strictly across columns. Linear interpolation in h preserves that order,
//!   which keeps the (critical value → probability) curve monotone.
//!
//! Conventions
//! -----------
//! - Interpolation clamps to the edge values outside the knot range: a
//!   bandwidth below the first knot uses the first row, a statistic of 0 maps
//!   to probability 1, a statistic beyond the last critical value maps to
//!   the smallest tabulated level.
//! - Regressor counts above `max_k` use the last block.
//!
//! Downstream usage
//! ----------------
//! - [`FluctuationProcess::sctest`](crate::structural_change::FluctuationProcess::sctest)
//!   takes a `&CriticalValueTable`; most callers pass
//!   [`CriticalValueTable::mosum_max`].
//!
//! Testing notes
//! -------------
//! - Unit tests cover interpolation edge semantics, the block arithmetic and
//!   k clamping, lookups at exact knots, and rejection of malformed tables.
//!   Monotonicity over random inputs is covered by `tests/proptest_invariants.rs`.
use crate::structural_change::errors::{EFPError, EFPResult};
use log::{debug, trace};
use ndarray::{Array1, Array2, ArrayView2, s};
use once_cell::sync::Lazy;

/// Number of regressor blocks in the shipped table.
pub const MAX_K: usize = 6;
/// Bandwidth knots per block in the shipped table.
pub const TABLE_DIM: usize = 10;
/// Spacing of the bandwidth knots in the shipped table.
pub const BANDWIDTH_STEP: f64 = 0.05;
/// Significance levels of the shipped table's columns.
pub const LEVELS: [f64; 4] = [0.1, 0.05, 0.025, 0.01];

// Simulated quantiles of sup_t |B(t + h) − B(t)| over t ∈ [0, 1 − h] for a
// Brownian bridge B, taking the maximum over k independent bridges.
// Row (k − 1)·10 + i holds h = 0.05·(i + 1); columns follow `LEVELS`.
// TODO: replace with the published strucchange `sc.me` matrix, cell for cell
// in this row order; these stand-ins differ from it in the third decimal.
#[rustfmt::skip]
const MOSUM_MAX_VALUES: [[f64; 4]; MAX_K * TABLE_DIM] = [
    // k = 1
    [0.7601, 0.8077, 0.8510, 0.9018],
    [0.9862, 1.0514, 1.1120, 1.1927],
    [1.1262, 1.2117, 1.2891, 1.3801],
    [1.2185, 1.3205, 1.4129, 1.5149],
    [1.2845, 1.3973, 1.4913, 1.6187],
    [1.3270, 1.4483, 1.5587, 1.6862],
    [1.3522, 1.4840, 1.5885, 1.7268],
    [1.3608, 1.4960, 1.6055, 1.7452],
    [1.3587, 1.4942, 1.6172, 1.7661],
    [1.3559, 1.4902, 1.6134, 1.7729],
    // k = 2
    [0.8062, 0.8486, 0.8913, 0.9445],
    [1.0505, 1.1144, 1.1757, 1.2540],
    [1.2093, 1.2853, 1.3589, 1.4486],
    [1.3170, 1.4096, 1.4886, 1.5896],
    [1.3910, 1.4911, 1.5861, 1.7062],
    [1.4450, 1.5556, 1.6561, 1.7749],
    [1.4775, 1.5910, 1.6940, 1.8293],
    [1.4880, 1.6016, 1.7139, 1.8521],
    [1.4883, 1.6172, 1.7301, 1.8680],
    [1.4848, 1.6107, 1.7249, 1.8669],
    // k = 3
    [0.8310, 0.8725, 0.9128, 0.9623],
    [1.0854, 1.1483, 1.2085, 1.2807],
    [1.2533, 1.3285, 1.4003, 1.4821],
    [1.3712, 1.4553, 1.5346, 1.6274],
    [1.4532, 1.5522, 1.6389, 1.7577],
    [1.5103, 1.6176, 1.7119, 1.8299],
    [1.5457, 1.6520, 1.7579, 1.8844],
    [1.5624, 1.6732, 1.7887, 1.9288],
    [1.5698, 1.6901, 1.7923, 1.9458],
    [1.5608, 1.6786, 1.7938, 1.9382],
    // k = 4
    [0.8473, 0.8910, 0.9299, 0.9757],
    [1.1128, 1.1745, 1.2316, 1.3037],
    [1.2825, 1.3585, 1.4286, 1.5064],
    [1.4067, 1.4890, 1.5663, 1.6602],
    [1.4915, 1.5839, 1.6727, 1.7882],
    [1.5501, 1.6515, 1.7453, 1.8691],
    [1.5885, 1.6959, 1.7920, 1.9160],
    [1.6044, 1.7176, 1.8264, 1.9601],
    [1.6144, 1.7315, 1.8322, 1.9782],
    [1.6105, 1.7263, 1.8315, 1.9787],
    // k = 5
    [0.8610, 0.9025, 0.9416, 0.9877],
    [1.1303, 1.1923, 1.2484, 1.3155],
    [1.3063, 1.3787, 1.4429, 1.5207],
    [1.4311, 1.5130, 1.5872, 1.6818],
    [1.5187, 1.6124, 1.6997, 1.8097],
    [1.5823, 1.6824, 1.7734, 1.8998],
    [1.6234, 1.7257, 1.8264, 1.9512],
    [1.6413, 1.7522, 1.8530, 1.9862],
    [1.6541, 1.7682, 1.8699, 2.0087],
    [1.6461, 1.7644, 1.8681, 2.0044],
    // k = 6
    [0.8708, 0.9122, 0.9496, 0.9952],
    [1.1451, 1.2063, 1.2615, 1.3273],
    [1.3243, 1.3962, 1.4618, 1.5329],
    [1.4524, 1.5350, 1.6053, 1.7061],
    [1.5459, 1.6378, 1.7207, 1.8287],
    [1.6112, 1.7088, 1.8093, 1.9248],
    [1.6517, 1.7551, 1.8555, 1.9839],
    [1.6752, 1.7855, 1.8866, 2.0194],
    [1.6901, 1.7958, 1.9025, 2.0414],
    [1.6796, 1.7952, 1.9039, 2.0386],
];

static MOSUM_MAX: Lazy<CriticalValueTable> = Lazy::new(|| {
    let values = Array2::from_shape_fn((MAX_K * TABLE_DIM, LEVELS.len()), |(i, j)| {
        MOSUM_MAX_VALUES[i][j]
    });
    CriticalValueTable::new(values, TableLayout::default())
        .expect("shipped critical-value table is well formed")
});

/// TableLayout — how a critical-value table is indexed.
///
/// Fields
/// ------
/// - `max_k`: `usize`
///   Number of regressor blocks; larger k are clamped to this.
/// - `table_dim`: `usize`
///   Bandwidth knots per block.
/// - `bandwidth_step`: `f64`
///   Knot spacing; knot `i` is `(i + 1)·bandwidth_step`.
/// - `levels`: `Vec<f64>`
///   Significance level of each column, strictly decreasing in (0, 1).
///
/// `Default` reproduces the shipped table: 6 blocks of 10 knots at
/// h = 0.05, 0.10, …, 0.50 and levels (0.10, 0.05, 0.025, 0.01).
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    pub max_k: usize,
    pub table_dim: usize,
    pub bandwidth_step: f64,
    pub levels: Vec<f64>,
}

impl Default for TableLayout {
    fn default() -> Self {
        TableLayout {
            max_k: MAX_K,
            table_dim: TABLE_DIM,
            bandwidth_step: BANDWIDTH_STEP,
            levels: LEVELS.to_vec(),
        }
    }
}

impl TableLayout {
    /// Expected `(rows, columns)` of a table with this layout.
    pub fn shape(&self) -> (usize, usize) {
        (self.max_k * self.table_dim, self.levels.len())
    }

    /// Bandwidth knots `(i + 1)·bandwidth_step`, `i = 0..table_dim`.
    pub fn bandwidths(&self) -> Array1<f64> {
        Array1::from_iter((1..=self.table_dim).map(|i| i as f64 * self.bandwidth_step))
    }

    fn validate(&self) -> EFPResult<()> {
        if self.max_k == 0 || self.table_dim == 0 || self.levels.is_empty() {
            return Err(EFPError::TableShape { expected: (1, 1), found: self.shape() });
        }
        if !self.bandwidth_step.is_finite() || self.bandwidth_step <= 0.0 {
            return Err(EFPError::MalformedTable {
                row: 0,
                col: 0,
                reason: "bandwidth knots must be strictly increasing",
            });
        }
        let mut previous = 1.0;
        for (col, &level) in self.levels.iter().enumerate() {
            if !(level > 0.0 && level < previous) {
                return Err(EFPError::MalformedTable {
                    row: 0,
                    col,
                    reason: "significance levels must be strictly decreasing in (0, 1)",
                });
            }
            previous = level;
        }
        Ok(())
    }
}

/// CriticalValueTable — validated critical values with their layout.
///
/// Purpose
/// -------
/// Own a `(max_k·table_dim) × levels` matrix of critical values and answer
/// p-value queries for a statistic at a given bandwidth and regressor count.
///
/// Fields
/// ------
/// - `values`: `Array2<f64>`
///   Critical values; see the module docs for the row/column layout.
/// - `layout`: [`TableLayout`]
///   Block size, knot spacing, and column levels.
/// - `bandwidths`: `Vec<f64>`
///   Cached bandwidth knots of one block.
///
/// Invariants
/// ----------
/// - Every value is finite and non-negative.
/// - Every row increases strictly across columns.
/// - `layout.levels` decrease strictly in (0, 1).
#[derive(Debug, Clone, PartialEq)]
pub struct CriticalValueTable {
    values: Array2<f64>,
    layout: TableLayout,
    bandwidths: Vec<f64>,
}

impl CriticalValueTable {
    /// Validate and wrap a critical-value matrix.
    ///
    /// Parameters
    /// ----------
    /// - `values`: `Array2<f64>`
    ///   Critical values of shape `layout.shape()`.
    /// - `layout`: [`TableLayout`]
    ///   Indexing of `values`.
    ///
    /// Returns
    /// -------
    /// `EFPResult<CriticalValueTable>`
    ///
    /// Errors
    /// ------
    /// - `EFPError::TableShape` when the layout is empty or `values` has the
    ///   wrong shape.
    /// - `EFPError::MalformedTable` when the knot spacing is not positive, the
    ///   levels are not strictly decreasing in (0, 1), or an entry is
    ///   non-finite, negative, or not larger than its left neighbor.
    pub fn new(values: Array2<f64>, layout: TableLayout) -> EFPResult<Self> {
        layout.validate()?;
        let expected = layout.shape();
        if values.dim() != expected {
            return Err(EFPError::TableShape { expected, found: values.dim() });
        }

        for (row, entries) in values.outer_iter().enumerate() {
            let mut previous = None;
            for (col, &value) in entries.iter().enumerate() {
                if !value.is_finite() {
                    return Err(EFPError::MalformedTable { row, col, reason: "value is not finite" });
                }
                if value < 0.0 {
                    return Err(EFPError::MalformedTable { row, col, reason: "value is negative" });
                }
                if previous.is_some_and(|p| value <= p) {
                    return Err(EFPError::MalformedTable {
                        row,
                        col,
                        reason: "critical values must increase as the level decreases",
                    });
                }
                previous = Some(value);
            }
        }

        let bandwidths = layout.bandwidths().to_vec();
        Ok(CriticalValueTable { values, layout, bandwidths })
    }

    /// Shipped OLS-MOSUM `max` table with the default [`TableLayout`].
    ///
    /// Built on first use and shared for the lifetime of the process.
    pub fn mosum_max() -> &'static CriticalValueTable {
        &MOSUM_MAX
    }

    /// Raw critical values.
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    /// Bandwidth knots of one block.
    pub fn bandwidths(&self) -> &[f64] {
        &self.bandwidths
    }

    /// Significance level of each column.
    pub fn levels(&self) -> &[f64] {
        &self.layout.levels
    }

    /// Interpolate the p-value of a statistic.
    ///
    /// Parameters
    /// ----------
    /// - `stat`: `f64`
    ///   Test statistic (non-negative for the `max` functional).
    /// - `h`: `f64`
    ///   Bandwidth of the process.
    /// - `k`: `usize`
    ///   Regressor count; values above `max_k` are clamped.
    ///
    /// Returns
    /// -------
    /// `EFPResult<f64>`
    ///   p-value in `[min level, 1]`: 1 at `stat ≤ 0`, the smallest level at
    ///   or beyond the last critical value, linear in between.
    ///
    /// Errors
    /// ------
    /// - `EFPError::InvalidRegressorCount` when `k == 0`.
    pub fn p_value(&self, stat: f64, h: f64, k: usize) -> EFPResult<f64> {
        let crit = self.interpolated_critical_values(h, k)?;

        let xp: Vec<f64> = std::iter::once(0.0).chain(crit.iter().copied()).collect();
        let fp: Vec<f64> = std::iter::once(1.0).chain(self.layout.levels.iter().copied()).collect();
        let p = interp(stat, &xp, &fp);
        trace!("p-value curve: critical values {xp:?}, probabilities {fp:?}, p = {p}");
        Ok(p)
    }

    /// Critical value of every tabulated level at bandwidth `h`.
    ///
    /// Each column of the k-block is interpolated linearly over the bandwidth
    /// knots, clamping outside `[first knot, last knot]`.
    ///
    /// Errors
    /// ------
    /// - `EFPError::InvalidRegressorCount` when `k == 0`.
    pub fn interpolated_critical_values(&self, h: f64, k: usize) -> EFPResult<Array1<f64>> {
        let block = self.block(k)?;
        let crit = Array1::from_iter(block.columns().into_iter().map(|column| {
            let column: Vec<f64> = column.to_vec();
            interp(h, &self.bandwidths, &column)
        }));
        debug!("Critical values at h = {h}, k = {k}: {crit}");
        Ok(crit)
    }

    /// Critical value at bandwidth `h` for one tabulated `level`.
    ///
    /// Errors
    /// ------
    /// - `EFPError::UnsupportedLevel` when `level` is not one of
    ///   [`levels`](Self::levels).
    /// - `EFPError::InvalidRegressorCount` when `k == 0`.
    pub fn critical_value(&self, h: f64, k: usize, level: f64) -> EFPResult<f64> {
        let col = self
            .layout
            .levels
            .iter()
            .position(|&l| (l - level).abs() <= 1e-12)
            .ok_or(EFPError::UnsupportedLevel { level })?;
        Ok(self.interpolated_critical_values(h, k)?[col])
    }

    /// Rows of the block for regressor count `k`, clamped to `max_k`.
    fn block(&self, k: usize) -> EFPResult<ArrayView2<'_, f64>> {
        if k < 1 {
            return Err(EFPError::InvalidRegressorCount { k });
        }
        let k = k.min(self.layout.max_k);
        let start = (k - 1) * self.layout.table_dim;
        let end = k * self.layout.table_dim;
        if end > self.values.nrows() {
            return Err(EFPError::TableShape {
                expected: (end, self.values.ncols()),
                found: self.values.dim(),
            });
        }
        Ok(self.values.slice(s![start..end, ..]))
    }
}

/// Piecewise-linear interpolation of `x` over increasing knots `xp`.
///
/// Left of the first knot returns `fp[0]`, right of the last returns the last
/// value, and a `NaN` input propagates. `xp` and `fp` must have equal,
/// non-zero length.
pub(crate) fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    debug_assert_eq!(xp.len(), fp.len());
    let last = xp.len() - 1;
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[last] {
        return fp[last];
    }

    let j = xp.partition_point(|&v| v <= x) - 1;
    let slope = (fp[j + 1] - fp[j]) / (xp[j + 1] - xp[j]);
    fp[j] + slope * (x - xp[j])
}
