//! structural_change::errors — error type for fluctuation processes and tests.
//!
//! Purpose
//! -------
//! Provide the error enum and result alias shared by the OLS-MOSUM
//! fluctuation process, its structural-change test, and the critical-value
//! table lookup, together with a conversion layer to Python exceptions for
//! PyO3-based bindings.
//!
//! Key behaviors
//! -------------
//! - Define [`EFPResult`] and [`EFPError`] as the canonical result and error
//!   types of the `structural_change` subtree.
//! - Classify every variant into one of three families via
//!   [`EFPError::kind`]: invalid configuration (unsupported selectors),
//!   invalid input (degenerate numeric data), and data integrity (a broken
//!   critical-value table).
//! - Attach a `Display` message naming the offending parameter and value.
//! - Implement `From<EFPError> for PyErr` behind the `python-bindings`
//!   feature.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every failure is deterministic in its inputs; nothing here is meant to
//!   be retried.
//! - Variants carry scalars or short strings only, so they stay cheap to
//!   clone and compare in tests.
//!
//! Conventions
//! -----------
//! - Messages are phrased in terms of domain constraints
//!   ("h must lie in (0, 1)", "n must exceed k") rather than internals.
//! - At the Python boundary every variant maps to `ValueError` with the
//!   `Display` message preserved.
//!
//! Testing notes
//! -------------
//! - Unit tests verify payload embedding in `Display` and the family
//!   classification returned by [`EFPError::kind`].

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

pub type EFPResult<T> = Result<T, EFPError>;

/// ErrorKind — coarse family of an [`EFPError`].
///
/// - `InvalidConfiguration`: an unsupported process type, functional, or
///   significance level was requested. Raised before any numeric work.
/// - `InvalidInput`: malformed or degenerate numeric input (shape mismatch,
///   out-of-range bandwidth, too few observations, ...).
/// - `DataIntegrity`: the critical-value table itself is malformed; this is a
///   packaging defect rather than a caller error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidConfiguration,
    InvalidInput,
    DataIntegrity,
}

/// EFPError — failures of fluctuation-process construction and testing.
///
/// Variants
/// --------
/// - `UnsupportedProcessType { name }`
///   Process type other than OLS-MOSUM.
/// - `UnsupportedFunctional { name }`
///   Functional other than `max`.
/// - `UnsupportedLevel { level }`
///   Significance level not tabulated in the critical-value table.
/// - `DimensionMismatch { x_rows, y_len }`
///   Observation matrix and response vector disagree in length.
/// - `EmptyDesign`
///   Observation matrix has no regressor columns.
/// - `NonFiniteData { index, value }`
///   A non-missing entry is ±∞; `index` is the flat row-major position
///   (response entries follow the matrix entries).
/// - `InvalidBandwidth { h, n }`
///   h is not in (0, 1), or `floor(n·h)` leaves an empty window or no
///   room to slide it.
/// - `InsufficientObservations { n, k }`
///   Fewer observations than needed to estimate σ with n − k degrees of
///   freedom.
/// - `DegenerateResiduals`
///   All residuals are zero, so σ = 0 and the process is undefined.
/// - `RegressionFailed { reason }`
///   The least-squares solve did not produce a finite coefficient vector.
/// - `InvalidRegressorCount { k }`
///   Regressor count below 1 in a table lookup.
/// - `TableShape { expected, found }`
///   Critical-value table has the wrong (rows, columns).
/// - `MalformedTable { row, col, reason }`
///   A table entry or knot breaks the table's ordering or finiteness rules.
#[derive(Debug, Clone, PartialEq)]
pub enum EFPError {
    // ---- Invalid configuration ----
    UnsupportedProcessType {
        name: String,
    },
    UnsupportedFunctional {
        name: String,
    },
    UnsupportedLevel {
        level: f64,
    },

    // ---- Invalid input ----
    DimensionMismatch {
        x_rows: usize,
        y_len: usize,
    },
    EmptyDesign,
    NonFiniteData {
        index: usize,
        value: f64,
    },
    InvalidBandwidth {
        h: f64,
        n: usize,
    },
    InsufficientObservations {
        n: usize,
        k: usize,
    },
    DegenerateResiduals,
    RegressionFailed {
        reason: String,
    },
    InvalidRegressorCount {
        k: usize,
    },

    // ---- Data integrity ----
    TableShape {
        expected: (usize, usize),
        found: (usize, usize),
    },
    MalformedTable {
        row: usize,
        col: usize,
        reason: &'static str,
    },
}

impl EFPError {
    /// Family of this error; see [`ErrorKind`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            EFPError::UnsupportedProcessType { .. }
            | EFPError::UnsupportedFunctional { .. }
            | EFPError::UnsupportedLevel { .. } => ErrorKind::InvalidConfiguration,
            EFPError::TableShape { .. } | EFPError::MalformedTable { .. } => {
                ErrorKind::DataIntegrity
            }
            _ => ErrorKind::InvalidInput,
        }
    }
}

impl std::error::Error for EFPError {}

impl std::fmt::Display for EFPError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Invalid configuration ----
            EFPError::UnsupportedProcessType { name } => {
                write!(f, "Process type {name:?} is not supported. Valid option is 'OLS-MOSUM'.")
            }
            EFPError::UnsupportedFunctional { name } => {
                write!(f, "Functional {name:?} is not supported. Valid option is 'max'.")
            }
            EFPError::UnsupportedLevel { level } => {
                write!(f, "Significance level {level} is not tabulated in the critical-value table.")
            }

            // ---- Invalid input ----
            EFPError::DimensionMismatch { x_rows, y_len } => write!(
                f,
                "Observation matrix has {x_rows} rows but response vector has {y_len} entries."
            ),
            EFPError::EmptyDesign => {
                write!(f, "Observation matrix must have at least one regressor column.")
            }
            EFPError::NonFiniteData { index, value } => {
                write!(f, "Invalid data value {value} at position {index}. Must be finite or NaN.")
            }
            EFPError::InvalidBandwidth { h, n } => write!(
                f,
                "Invalid bandwidth h = {h} for n = {n} observations. Must satisfy 0 < h < 1 and 1 ≤ floor(n·h) < n."
            ),
            EFPError::InsufficientObservations { n, k } => write!(
                f,
                "Insufficient observations: n = {n} must exceed the number of regressors k = {k}."
            ),
            EFPError::DegenerateResiduals => {
                write!(f, "Residual standard error is zero; the fluctuation process is undefined.")
            }
            EFPError::RegressionFailed { reason } => {
                write!(f, "Least-squares fit failed: {reason}")
            }
            EFPError::InvalidRegressorCount { k } => {
                write!(f, "Invalid regressor count k = {k}. Must be at least 1.")
            }

            // ---- Data integrity ----
            EFPError::TableShape { expected, found } => write!(
                f,
                "Critical-value table has shape {}x{}, expected {}x{}.",
                found.0, found.1, expected.0, expected.1
            ),
            EFPError::MalformedTable { row, col, reason } => {
                write!(f, "Malformed critical-value table at ({row}, {col}): {reason}")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<EFPError> for PyErr {
    fn from(err: EFPError) -> PyErr {
        PyValueError::new_err(format!("EFPError: {err}"))
    }
}
