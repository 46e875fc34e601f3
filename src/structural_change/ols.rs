//! structural_change::ols — ordinary least squares for fluctuation processes.
//!
//! Purpose
//! -------
//! Fit the linear model `y = Xβ + e` whose residuals drive the OLS-MOSUM
//! fluctuation process. The solve goes through a singular value
//! decomposition so that rank-deficient designs yield the minimum-norm
//! (pseudoinverse) solution instead of failing.
//!
//! Key behaviors
//! -------------
//! - Copy the `ndarray` design into a `nalgebra::DMatrix` and solve the
//!   least-squares problem with `SVD::solve`.
//! - Expose the coefficient vector, the numerical rank, fitted values for
//!   any conformable design, and residuals.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are complete (no `NaN`) and finite; callers filter missing rows
//!   first.
//! - Singular values below [`RCOND`] times the largest singular value are
//!   treated as zero, matching the usual `pinv` cut-off.
//!
//! Conventions
//! -----------
//! - No intercept is added; the caller's design is used as given.
//!
//! Testing notes
//! -------------
//! - Unit tests check exact recovery on noiseless data, orthogonality of
//!   residuals to the regressors, and the minimum-norm solution for a
//!   rank-deficient design.
use crate::structural_change::errors::{EFPError, EFPResult};
use log::{debug, warn};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, ArrayView1, ArrayView2};

/// Relative cut-off for singular values in the pseudoinverse solve.
pub const RCOND: f64 = 1e-15;

/// FittedModel — least-squares coefficients of `y` on `X`.
///
/// Fields
/// ------
/// - `coefficients`: `Array1<f64>`
///   Estimated β, one entry per column of the design.
/// - `rank`: `usize`
///   Numerical rank of the design at the [`RCOND`] cut-off.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    coefficients: Array1<f64>,
    rank: usize,
}

impl FittedModel {
    /// Fit `y` on `x` by least squares.
    ///
    /// Parameters
    /// ----------
    /// - `x`: `ArrayView2<f64>`
    ///   Complete n×k design matrix.
    /// - `y`: `ArrayView1<f64>`
    ///   Complete response of length n.
    ///
    /// Returns
    /// -------
    /// `EFPResult<FittedModel>`
    ///   The fitted coefficients and design rank.
    ///
    /// Errors
    /// ------
    /// - `EFPError::DimensionMismatch`
    ///   When `x.nrows() != y.len()`.
    /// - `EFPError::EmptyDesign`
    ///   When `x` has no rows or no columns.
    /// - `EFPError::RegressionFailed`
    ///   When the SVD solve fails or produces non-finite coefficients.
    pub fn fit(x: ArrayView2<f64>, y: ArrayView1<f64>) -> EFPResult<Self> {
        let (n, k) = x.dim();
        if n != y.len() {
            return Err(EFPError::DimensionMismatch { x_rows: n, y_len: y.len() });
        }
        if n == 0 || k == 0 {
            return Err(EFPError::EmptyDesign);
        }

        let x_nalg = DMatrix::<f64>::from_fn(n, k, |i, j| x[[i, j]]);
        let y_nalg = DVector::<f64>::from_iterator(n, y.iter().copied());

        let svd = x_nalg.svd(true, true);
        let eps = RCOND * svd.singular_values.max();
        let rank = svd.rank(eps);
        if rank < k {
            warn!("Design matrix is rank deficient (rank {rank} < {k} columns); using the minimum-norm solution");
        }

        let beta = svd
            .solve(&y_nalg, eps)
            .map_err(|reason| EFPError::RegressionFailed { reason: reason.to_string() })?;
        if let Some(bad) = beta.iter().find(|b| !b.is_finite()) {
            return Err(EFPError::RegressionFailed {
                reason: format!("non-finite coefficient {bad}"),
            });
        }

        let coefficients = Array1::from_iter(beta.iter().copied());
        debug!("OLS fit: n = {n}, k = {k}, rank = {rank}, coefficients = {coefficients}");
        Ok(FittedModel { coefficients, rank })
    }

    /// Estimated coefficient vector β.
    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    /// Numerical rank of the design used in the fit.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Fitted values `Xβ` for a design with the same column layout.
    ///
    /// Panics if `x.ncols()` differs from the number of coefficients.
    pub fn predict(&self, x: ArrayView2<f64>) -> Array1<f64> {
        x.dot(&self.coefficients)
    }

    /// Residuals `y − Xβ`, in observation order.
    pub fn residuals(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Array1<f64> {
        &y - &self.predict(x)
    }
}
