//! structural_change::efp — OLS-MOSUM empirical fluctuation process and test.
//!
//! Purpose
//! -------
//! Build the OLS-based moving-sum (OLS-MOSUM) empirical fluctuation process
//! from the residuals of a linear regression, and run the generalized
//! fluctuation test for parameter stability on it. This is the building
//! block a trend/season decomposition uses to decide whether a segment
//! contains a structural break.
//!
//! Key behaviors
//! -------------
//! - [`FluctuationProcess::new`] filters missing rows, fits OLS, and turns
//!   the residuals into the normalized MOSUM path
//!   `process_t = (S_{t+nh} − S_t) / (σ̂ √n)`, `t = 0,…,n − nh`,
//!   where `S` is the zero-prefixed cumulative sum of residuals,
//!   `nh = ⌊n·h⌋`, and `σ̂² = Σ e_i² / (n − k)`.
//! - [`FluctuationProcess::sctest`] applies a [`Functional`] to the path and
//!   converts the statistic into a p-value through a
//!   [`CriticalValueTable`].
//! - Process type and functional are closed enums ([`ProcessType`],
//!   [`Functional`]) parsed from their conventional names; unknown names
//!   fail before any numeric work.
//!
//! Invariants & assumptions
//! ------------------------
//! - After construction `process().len() == nobs() − window() + 1 ≥ 2`.
//! - A constructed process is immutable; `sctest` takes `&self` and is
//!   deterministic, so repeated calls return identical outcomes.
//! - The regressor count used for the table lookup is the dimensionality of
//!   the process path, which is 1 for OLS-MOSUM.
//!
//! Conventions
//! -----------
//! - Missing values are `NaN`; rows missing in either the design or the
//!   response are dropped jointly.
//! - No intercept is added to the design.
//! - Intermediate quantities are logged through the `log` facade at
//!   `debug`/`trace` level; nothing is logged at `warn` or above unless the
//!   design is rank deficient.
//!
//! Downstream usage
//! ----------------
//! - A breakpoint orchestrator builds one process per segment and compares
//!   [`SCTestOutcome::p_value`] with its significance level (or calls
//!   [`SCTestOutcome::rejects`]).
//! - For a pure level-shift check use [`FluctuationProcess::level`].
//!
//! Testing notes
//! -------------
//! - Unit tests check the process length and values against a hand-computed
//!   example, selector parsing, the k = 1 lookup convention, and
//!   idempotence of `sctest`. End-to-end detection scenarios live in
//!   `tests/integration_efp_pipeline.rs`.
use crate::structural_change::{
    critical_values::CriticalValueTable,
    errors::{EFPError, EFPResult},
    ols::FittedModel,
    validation::{omit_missing, validate_inputs, validate_window},
};
use log::{debug, info, trace};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use std::{fmt, str::FromStr};

/// σ̂ at or below this multiple of the range of `y` counts as a perfect fit.
const PERFECT_FIT_RTOL: f64 = 1e-12;

/// Empirical fluctuation process family.
///
/// Only the OLS-based moving-sum process is implemented. Parsing accepts
/// exactly `"OLS-MOSUM"`; anything else, including other spellings of the
/// same name, returns `EFPError::UnsupportedProcessType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessType {
    #[default]
    OlsMosum,
}

impl ProcessType {
    /// Conventional name of the process type.
    pub fn name(&self) -> &'static str {
        match self {
            ProcessType::OlsMosum => "OLS-MOSUM",
        }
    }
}

impl fmt::Display for ProcessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProcessType {
    type Err = EFPError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OLS-MOSUM" => Ok(ProcessType::OlsMosum),
            _ => Err(EFPError::UnsupportedProcessType { name: s.to_string() }),
        }
    }
}

/// Functional mapping a fluctuation path to a scalar test statistic.
///
/// Only the maximum absolute value is implemented. Parsing accepts exactly
/// `"max"`; anything else returns `EFPError::UnsupportedFunctional`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Functional {
    #[default]
    Max,
}

impl Functional {
    /// Conventional name of the functional.
    pub fn name(&self) -> &'static str {
        match self {
            Functional::Max => "max",
        }
    }

    /// Apply the functional to a fluctuation path.
    ///
    /// For `Max` this is `max_t |process_t|`; an empty path yields 0.
    pub fn apply(&self, process: ArrayView1<f64>) -> f64 {
        match self {
            Functional::Max => process.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())),
        }
    }
}

impl fmt::Display for Functional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Functional {
    type Err = EFPError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max" => Ok(Functional::Max),
            _ => Err(EFPError::UnsupportedFunctional { name: s.to_string() }),
        }
    }
}

/// SCTestOutcome — result of a generalized fluctuation test.
///
/// Purpose
/// -------
/// Carry the statistic and p-value of one structural-change test together
/// with the settings that produced them.
///
/// Fields
/// ------
/// - `stat`: `f64`
///   Functional applied to the fluctuation path.
/// - `p_value`: `f64`
///   Interpolated p-value in `[smallest tabulated level, 1]`.
/// - `functional`: [`Functional`]
///   Functional used for `stat`.
/// - `process_type`: [`ProcessType`]
///   Process family that was tested.
/// - `bandwidth`: `f64`
///   Bandwidth h of the process.
/// - `lookup_regressors`: `usize`
///   Regressor count used to select the table block.
///
/// Notes
/// -----
/// - Plain `Copy` value object; it does not borrow the process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SCTestOutcome {
    stat: f64,
    p_value: f64,
    functional: Functional,
    process_type: ProcessType,
    bandwidth: f64,
    lookup_regressors: usize,
}

impl SCTestOutcome {
    /// Test statistic.
    pub fn stat(&self) -> f64 {
        self.stat
    }

    /// Interpolated p-value of [`stat`](Self::stat).
    pub fn p_value(&self) -> f64 {
        self.p_value
    }

    pub fn functional(&self) -> Functional {
        self.functional
    }

    pub fn process_type(&self) -> ProcessType {
        self.process_type
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Regressor count used for the critical-value lookup.
    pub fn lookup_regressors(&self) -> usize {
        self.lookup_regressors
    }

    /// Whether the null of parameter stability is rejected at `level`,
    /// i.e. `p_value <= level` ("breakpoint detected").
    pub fn rejects(&self, level: f64) -> bool {
        self.p_value <= level
    }

    /// `(stat, p_value)` pair.
    pub fn as_tuple(&self) -> (f64, f64) {
        (self.stat, self.p_value)
    }
}

/// FluctuationProcess — OLS-MOSUM path of a fitted linear model.
///
/// Purpose
/// -------
/// Own the regression fit and the normalized moving-sum path derived from
/// its residuals, and run structural-change tests on that path.
///
/// Key behaviors
/// -------------
/// - All numeric work happens once in [`FluctuationProcess::new`]; the
///   result is immutable.
/// - [`FluctuationProcess::sctest`] is a pure function of the stored path,
///   the bandwidth, and the supplied table.
///
/// Fields
/// ------
/// - `process_type`: [`ProcessType`]
///   Always `OlsMosum`.
/// - `fitted`: [`FittedModel`]
///   OLS coefficients of y on X.
/// - `residuals`: `Array1<f64>`
///   `y − Xβ̂` over complete rows, in order.
/// - `sigma`: `f64`
///   Residual standard error with n − k degrees of freedom.
/// - `bandwidth`: `f64`
///   Bandwidth h ∈ (0, 1).
/// - `window`: `usize`
///   `nh = ⌊n·h⌋`.
/// - `nobs`: `usize`
///   Number of complete rows n.
/// - `n_regressors`: `usize`
///   Number of design columns k.
/// - `process`: `Array1<f64>`
///   The normalized MOSUM path, length n − nh + 1.
///
/// Invariants
/// ----------
/// - `n > k`, `1 ≤ nh < n`, `sigma` positive and finite.
/// - `process.len() == nobs − window + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct FluctuationProcess {
    process_type: ProcessType,
    fitted: FittedModel,
    residuals: Array1<f64>,
    sigma: f64,
    bandwidth: f64,
    window: usize,
    nobs: usize,
    n_regressors: usize,
    process: Array1<f64>,
}

impl FluctuationProcess {
    /// Fit the regression and compute the fluctuation process.
    ///
    /// Parameters
    /// ----------
    /// - `x`: `ArrayView2<f64>`
    ///   Observation matrix, n rows × k ≥ 1 columns; `NaN` marks missing.
    /// - `y`: `ArrayView1<f64>`
    ///   Response vector of length n; `NaN` marks missing.
    /// - `h`: `f64`
    ///   Bandwidth, the fraction of the sample in each moving window.
    /// - `process_type`: [`ProcessType`]
    ///   Process family; only `OlsMosum` exists.
    ///
    /// Returns
    /// -------
    /// `EFPResult<FluctuationProcess>`
    ///
    /// Errors
    /// ------
    /// - `EFPError::DimensionMismatch`, `EmptyDesign`, `NonFiniteData`,
    ///   `InvalidBandwidth` from input validation.
    /// - `EFPError::InsufficientObservations` when n ≤ k after removing
    ///   missing rows.
    /// - `EFPError::InvalidBandwidth` when `⌊n·h⌋` is 0 or n.
    /// - `EFPError::RegressionFailed` when the least-squares solve fails.
    /// - `EFPError::DegenerateResiduals` when the fit is perfect up to
    ///   rounding: σ̂ ≤ 1e-12 · (max y − min y), or σ̂ ≤ n · ε · max |y|
    ///   so that a constant series is caught as well.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// use ndarray::{Array1, Array2};
    /// use rust_bfast::structural_change::{FluctuationProcess, Functional, ProcessType};
    ///
    /// let y = Array1::from_iter(
    ///     (0..120).map(|t| if t < 60 { 0.0 } else { 2.0 } + 0.3 * (t as f64).sin()),
    /// );
    /// let x = Array2::<f64>::ones((120, 1));
    /// let efp = FluctuationProcess::new(x.view(), y.view(), 0.15, ProcessType::OlsMosum).unwrap();
    /// assert_eq!(efp.process().len(), 120 - 18 + 1);
    ///
    /// let outcome = efp.sctest_default(Functional::Max).unwrap();
    /// assert!(outcome.rejects(0.05));
    /// ```
    pub fn new(
        x: ArrayView2<f64>, y: ArrayView1<f64>, h: f64, process_type: ProcessType,
    ) -> EFPResult<Self> {
        validate_inputs(x, y, h)?;
        let (x, y) = omit_missing(x, y)?;
        let (n, k) = x.dim();
        let nh = validate_window(n, k, h)?;

        match process_type {
            ProcessType::OlsMosum => Self::ols_mosum(x.view(), y.view(), h, n, k, nh),
        }
    }

    /// Like [`new`](Self::new), with the process type given by name.
    ///
    /// The name is parsed before any data is touched, so an unsupported
    /// name fails with `EFPError::UnsupportedProcessType` even when the
    /// data would be invalid too.
    pub fn from_type_name(
        x: ArrayView2<f64>, y: ArrayView1<f64>, h: f64, process_type: &str,
    ) -> EFPResult<Self> {
        let process_type: ProcessType = process_type.parse()?;
        Self::new(x, y, h, process_type)
    }

    /// OLS-MOSUM process of `y` on a constant regressor.
    ///
    /// This is the level-shift check used when scanning a single series for
    /// a change in mean.
    pub fn level(y: ArrayView1<f64>, h: f64) -> EFPResult<Self> {
        let x = Array2::<f64>::ones((y.len(), 1));
        Self::new(x.view(), y, h, ProcessType::OlsMosum)
    }

    fn ols_mosum(
        x: ArrayView2<f64>, y: ArrayView1<f64>, h: f64, n: usize, k: usize, nh: usize,
    ) -> EFPResult<Self> {
        info!("Performing linear regression");
        let fitted = FittedModel::fit(x, y)?;
        let residuals = fitted.residuals(x, y);
        debug!("Residuals: {residuals}");

        let sigma = (residuals.dot(&residuals) / (n - k) as f64).sqrt();
        debug!("sigma: {sigma}");
        if !sigma.is_finite() || sigma <= perfect_fit_cutoff(y) {
            return Err(EFPError::DegenerateResiduals);
        }
        debug!("nh: {nh}");

        let cumsum = zero_prefixed_cumsum(residuals.view());
        trace!("Cumulative residual sums: {cumsum}");

        let scale = sigma * (n as f64).sqrt();
        let process = moving_sums(cumsum.view(), nh) / scale;
        trace!("Normalized process: {process}");

        Ok(FluctuationProcess {
            process_type: ProcessType::OlsMosum,
            fitted,
            residuals,
            sigma,
            bandwidth: h,
            window: nh,
            nobs: n,
            n_regressors: k,
            process,
        })
    }

    /// Run the generalized fluctuation test.
    ///
    /// Parameters
    /// ----------
    /// - `functional`: [`Functional`]
    ///   Functional turning the path into a statistic.
    /// - `table`: `&CriticalValueTable`
    ///   Critical values used for the p-value interpolation.
    ///
    /// Returns
    /// -------
    /// `EFPResult<SCTestOutcome>`
    ///   Statistic, p-value, and the settings used.
    ///
    /// Errors
    /// ------
    /// - Propagates lookup errors from
    ///   [`CriticalValueTable::p_value`]; with a validated table these
    ///   cannot occur for k = 1.
    ///
    /// Notes
    /// -----
    /// - The table block is chosen by the dimensionality of the path
    ///   (see [`lookup_regressors`](Self::lookup_regressors)), not by the
    ///   number of design columns.
    pub fn sctest(
        &self, functional: Functional, table: &CriticalValueTable,
    ) -> EFPResult<SCTestOutcome> {
        info!("Performing statistical test");
        let k = self.lookup_regressors();

        info!("Calculating statistic");
        let stat = functional.apply(self.process.view());
        debug!("stat: {stat}");

        let p_value = table.p_value(stat, self.bandwidth, k)?;
        debug!("p_value: {p_value}");

        Ok(SCTestOutcome {
            stat,
            p_value,
            functional,
            process_type: self.process_type,
            bandwidth: self.bandwidth,
            lookup_regressors: k,
        })
    }

    /// [`sctest`](Self::sctest) against the shipped OLS-MOSUM table.
    pub fn sctest_default(&self, functional: Functional) -> EFPResult<SCTestOutcome> {
        self.sctest(functional, CriticalValueTable::mosum_max())
    }

    /// Regressor count used to select the critical-value block.
    ///
    /// Equals the number of dimensions of the path. The OLS-MOSUM path is a
    /// single series, so this is 1 regardless of how many columns the design
    /// has; the moving-estimates table's k = 1 block is the limiting
    /// distribution of a univariate MOSUM path.
    pub fn lookup_regressors(&self) -> usize {
        self.process.ndim()
    }

    /// Normalized fluctuation path, length `nobs − window + 1`.
    pub fn process(&self) -> &Array1<f64> {
        &self.process
    }

    /// OLS residuals over the complete rows, in order.
    pub fn residuals(&self) -> &Array1<f64> {
        &self.residuals
    }

    pub fn fitted_model(&self) -> &FittedModel {
        &self.fitted
    }

    /// Shorthand for `fitted_model().coefficients()`.
    pub fn coefficients(&self) -> &Array1<f64> {
        self.fitted.coefficients()
    }

    /// Residual standard error σ̂ with n − k degrees of freedom.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// MOSUM window length `⌊n·h⌋`.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Number of complete observations used in the fit.
    pub fn nobs(&self) -> usize {
        self.nobs
    }

    /// Number of design columns.
    pub fn n_regressors(&self) -> usize {
        self.n_regressors
    }

    pub fn process_type(&self) -> ProcessType {
        self.process_type
    }
}

// ---- Private helpers ----

/// Largest σ̂ treated as a perfect fit of `y`.
///
/// Relative to the range of `y`, so a large constant offset does not mask
/// real variation. The `n · ε · max |y|` floor covers the rounding left by
/// fitting a constant series, whose range is zero.
fn perfect_fit_cutoff(y: ArrayView1<f64>) -> f64 {
    let (lo, hi, scale) = y.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0_f64),
        |(lo, hi, scale), &v| (lo.min(v), hi.max(v), scale.max(v.abs())),
    );
    let spread = if hi >= lo { hi - lo } else { 0.0 };
    let rounding = y.len() as f64 * f64::EPSILON * scale;
    (PERFECT_FIT_RTOL * spread).max(rounding)
}

/// `S_0 = 0, S_j = S_{j−1} + e_j`, length `e.len() + 1`.
fn zero_prefixed_cumsum(e: ArrayView1<f64>) -> Array1<f64> {
    let mut cumsum = Array1::<f64>::zeros(e.len() + 1);
    let mut running = 0.0;
    for (j, &e_j) in e.iter().enumerate() {
        running += e_j;
        cumsum[j + 1] = running;
    }
    cumsum
}

/// `raw_t = S_{t+nh} − S_t` for `t = 0,…,len(S) − 1 − nh`.
///
/// Requires `nh < cumsum.len()`.
fn moving_sums(cumsum: ArrayView1<f64>, nh: usize) -> Array1<f64> {
    let m = cumsum.len() - nh;
    Array1::from_iter((0..m).map(|t| cumsum[t + nh] - cumsum[t]))
}
