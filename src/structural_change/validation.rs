//! structural_change::validation — input guards and paired missing-row removal.
//!
//! Purpose
//! -------
//! Centralize the checks a fluctuation process performs on its regression
//! inputs before any numeric work, and the joint removal of rows with
//! missing values from the observation matrix and response vector.
//!
//! Key behaviors
//! -------------
//! - [`validate_inputs`] checks shapes, the bandwidth range, and finiteness
//!   of every non-missing entry.
//! - [`omit_missing`] drops every row index at which either the matrix or the
//!   response holds a `NaN`, preserving the order of the surviving rows.
//! - [`validate_window`] checks the post-filter dimensions against the
//!   bandwidth and returns the MOSUM window length `floor(n·h)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `NaN` is the only missing-value marker; `±∞` is invalid data.
//! - After [`validate_window`] succeeds: `n > k`, `1 ≤ nh < n`, so the
//!   fluctuation process has `n − nh + 1 ≥ 2` points.
//!
//! Conventions
//! -----------
//! - Positions in `EFPError::NonFiniteData` are flat row-major indices into
//!   the matrix, followed by the response entries (offset by `x.len()`).
//!
//! Testing notes
//! -------------
//! - Unit tests cover each error branch, the paired removal, and the window
//!   arithmetic (truncation rather than rounding).
use crate::structural_change::errors::{EFPError, EFPResult};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Validate raw regression inputs before missing-row removal.
///
/// Parameters
/// ----------
/// - `x`: `ArrayView2<f64>`
///   Observation matrix, n rows × k columns. `NaN` marks a missing entry.
/// - `y`: `ArrayView1<f64>`
///   Response vector of length n. `NaN` marks a missing entry.
/// - `h`: `f64`
///   MOSUM bandwidth as a fraction of the sample; must lie in (0, 1).
///
/// Returns
/// -------
/// `EFPResult<()>`
///   `Ok(())` when the checks pass.
///
/// Errors
/// ------
/// - `EFPError::DimensionMismatch` when `x.nrows() != y.len()`.
/// - `EFPError::EmptyDesign` when `x` has no columns.
/// - `EFPError::InvalidBandwidth` when `h` is not finite or not in (0, 1).
/// - `EFPError::NonFiniteData` for the first `±∞` entry found.
pub fn validate_inputs(x: ArrayView2<f64>, y: ArrayView1<f64>, h: f64) -> EFPResult<()> {
    if x.nrows() != y.len() {
        return Err(EFPError::DimensionMismatch { x_rows: x.nrows(), y_len: y.len() });
    }
    if x.ncols() == 0 {
        return Err(EFPError::EmptyDesign);
    }
    if !h.is_finite() || h <= 0.0 || h >= 1.0 {
        return Err(EFPError::InvalidBandwidth { h, n: y.len() });
    }

    let offset = x.len();
    let x_entries = x.iter().enumerate();
    let y_entries = y.iter().enumerate().map(|(i, v)| (offset + i, v));
    for (index, &value) in x_entries.chain(y_entries) {
        if value.is_infinite() {
            return Err(EFPError::NonFiniteData { index, value });
        }
    }
    Ok(())
}

/// Drop every row with a missing value in either `x` or `y`.
///
/// Parameters
/// ----------
/// - `x`: `ArrayView2<f64>`
///   Observation matrix with `NaN` as the missing marker.
/// - `y`: `ArrayView1<f64>`
///   Response vector of the same length as `x.nrows()`.
///
/// Returns
/// -------
/// `EFPResult<(Array2<f64>, Array1<f64>)>`
///   Owned copies restricted to the rows where neither input is missing, in
///   their original relative order.
///
/// Errors
/// ------
/// - `EFPError::DimensionMismatch`
///   When `x.nrows() != y.len()`.
///
/// Notes
/// -----
/// - When nothing is missing the inputs are copied unchanged.
pub fn omit_missing(
    x: ArrayView2<f64>, y: ArrayView1<f64>,
) -> EFPResult<(Array2<f64>, Array1<f64>)> {
    if x.nrows() != y.len() {
        return Err(EFPError::DimensionMismatch { x_rows: x.nrows(), y_len: y.len() });
    }
    let keep: Vec<usize> = x
        .outer_iter()
        .zip(y.iter())
        .enumerate()
        .filter(|(_, (row, y_i))| !y_i.is_nan() && !row.iter().any(|v| v.is_nan()))
        .map(|(i, _)| i)
        .collect();

    Ok((x.select(Axis(0), &keep), y.select(Axis(0), &keep)))
}

/// Check post-filter dimensions and return the MOSUM window length.
///
/// Parameters
/// ----------
/// - `n`: `usize`
///   Number of complete observations.
/// - `k`: `usize`
///   Number of regressors.
/// - `h`: `f64`
///   Bandwidth in (0, 1), already range-checked.
///
/// Returns
/// -------
/// `EFPResult<usize>`
///   `nh = floor(n·h)` on success.
///
/// Errors
/// ------
/// - `EFPError::InsufficientObservations` when `n <= k`.
/// - `EFPError::InvalidBandwidth` when `nh == 0` or `nh >= n`.
pub fn validate_window(n: usize, k: usize, h: f64) -> EFPResult<usize> {
    if n <= k {
        return Err(EFPError::InsufficientObservations { n, k });
    }
    let nh = (n as f64 * h).floor() as usize;
    if nh == 0 || nh >= n {
        return Err(EFPError::InvalidBandwidth { h, n });
    }
    Ok(nh)
}
