//! rust_bfast — structural-change tests for time-series breakpoint analysis.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! the empirical fluctuation process (EFP) engine to Python via the
//! `_rust_bfast` extension module. The engine fits a linear model, builds the
//! OLS-MOSUM fluctuation process from its residuals, and tests it for
//! parameter stability against tabulated critical values.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust module (`structural_change`) as the public crate
//!   surface.
//! - Define the `FluctuationProcess` `#[pyclass]` wrapper and the `#[pymodule]`
//!   initializer for the `_rust_bfast` Python extension.
//! - Register the `structural_change` submodule under `rust_bfast` so that
//!   dot-notation imports work as expected.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work is implemented in `structural_change`; this file
//!   performs only FFI glue and error mapping.
//! - Python inputs are converted to owned `ndarray` containers with `NaN` as
//!   the missing-value marker, then validated by the core constructor.
//!
//! Conventions
//! -----------
//! - Python-exposed classes live under `_rust_bfast.<submodule>` and are
//!   wrapped by thin pure-Python facades in the top-level `rust_bfast`
//!   package.
//! - Errors from core Rust code are propagated as [`EFPError`] internally and
//!   converted to `ValueError` at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend directly on
//!   [`structural_change`] and can ignore the items guarded by the
//!   `python-bindings` feature.
//!
//! Testing notes
//! -------------
//! - Core numerical behavior is covered by unit tests in the inner modules and
//!   by the integration tests under `tests/`.
//!
//! [`EFPError`]: structural_change::EFPError

pub mod structural_change;
pub mod utils;

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    structural_change::efp::{FluctuationProcess, Functional, ProcessType},
    utils::{extract_f64_array, extract_f64_matrix},
};

/// FluctuationProcess — Python-facing wrapper for the OLS-MOSUM process.
///
/// Purpose
/// -------
/// Build an empirical fluctuation process from Python inputs and run the
/// structural-change test on it, forwarding all computation to
/// [`FluctuationProcess`].
///
/// Parameters
/// ----------
/// Constructed from Python via `FluctuationProcess(x, y, h, p_type="OLS-MOSUM")`:
/// - `x`: `&PyAny`
///   Design matrix (2-D array-like, or 1-D for a single regressor); `NaN`
///   marks missing values.
/// - `y`: `&PyAny`
///   Response (1-D array-like) of the same length; `NaN` marks missing.
/// - `h`: `f64`
///   Bandwidth in (0, 1).
/// - `p_type`: `&str`
///   Process type; only `"OLS-MOSUM"` is supported.
///
/// Fields
/// ------
/// - `inner`: [`FluctuationProcess`]
///   Rust-side process used by the accessors and `sctest`.
///
/// Notes
/// -----
/// - Native Rust code should use [`FluctuationProcess`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(name = "FluctuationProcess", module = "rust_bfast.structural_change")]
pub struct PyFluctuationProcess {
    inner: FluctuationProcess,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyFluctuationProcess {
    /// Empirical fluctuation process of the OLS residuals of y on x.
    #[new]
    #[pyo3(
        text_signature = "(x, y, h, /, p_type='OLS-MOSUM')",
        signature = (x, y, h, p_type = "OLS-MOSUM")
    )]
    pub fn new<'py>(
        py: Python<'py>, x: &Bound<'py, PyAny>, y: &Bound<'py, PyAny>, h: f64, p_type: &str,
    ) -> PyResult<PyFluctuationProcess> {
        let process_type: ProcessType = p_type.parse()?;
        let x = extract_f64_matrix(py, x)?;
        let y = extract_f64_array(py, y)?;

        let inner = FluctuationProcess::new(x.view(), y.as_array(), h, process_type)?;
        Ok(PyFluctuationProcess { inner })
    }

    /// Run the generalized fluctuation test; returns `(stat, p_value)`.
    #[pyo3(text_signature = "($self, functional='max')", signature = (functional = "max"))]
    pub fn sctest(&self, functional: &str) -> PyResult<(f64, f64)> {
        let functional: Functional = functional.parse()?;
        let outcome = self.inner.sctest_default(functional)?;
        Ok(outcome.as_tuple())
    }

    /// The normalized fluctuation process.
    #[getter]
    pub fn process(&self) -> Vec<f64> {
        self.inner.process().to_vec()
    }

    /// OLS residuals over the complete rows.
    #[getter]
    pub fn residuals(&self) -> Vec<f64> {
        self.inner.residuals().to_vec()
    }

    /// Fitted regression coefficients.
    #[getter]
    pub fn coefficients(&self) -> Vec<f64> {
        self.inner.coefficients().to_vec()
    }

    /// Residual standard error.
    #[getter]
    pub fn sigma(&self) -> f64 {
        self.inner.sigma()
    }

    /// Bandwidth h.
    #[getter]
    pub fn bandwidth(&self) -> f64 {
        self.inner.bandwidth()
    }

    /// Number of complete observations used in the fit.
    #[getter]
    pub fn nobs(&self) -> usize {
        self.inner.nobs()
    }
}

/// _rust_bfast — PyO3 module initializer for the Python extension.
///
/// Purpose
/// -------
/// Define the `_rust_bfast` Python module and register the
/// `structural_change` submodule used by the public `rust_bfast` package.
///
/// Errors
/// ------
/// - `PyErr`
///   If creating the submodule or manipulating `sys.modules` fails.
///
/// Notes
/// -----
/// - Invoked by Python when importing the compiled extension.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_bfast<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let structural_change_mod = PyModule::new(_py, "structural_change")?;
    structural_change(_py, m, &structural_change_mod)?;

    // Manually add submodules into sys.modules to allow for dot notation.
    _py.import("sys")?
        .getattr("modules")?
        .set_item("rust_bfast.structural_change", structural_change_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn structural_change<'py>(
    _py: Python, rust_bfast: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<PyFluctuationProcess>()?;
    rust_bfast.add_submodule(m)?;
    Ok(())
}
