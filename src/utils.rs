//! utils — Python-to-ndarray conversion helpers for the PyO3 bindings.
//!
//! Everything here is compiled only with the `python-bindings` feature.
//! Inputs may be NumPy arrays, pandas objects (via `to_numpy`), or plain
//! Python sequences; all are converted to `f64` arrays with `NaN` kept as the
//! missing-value marker.

#[cfg(feature = "python-bindings")]
use ndarray::{Array2, Axis};

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::PyAny,
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1, PyReadonlyArray2,
};

/// Borrow or copy a 1-D float64 input as a contiguous read-only NumPy array.
///
/// Accepts a contiguous `numpy.ndarray`, anything with `to_numpy()` (pandas
/// `Series`), or a sequence of floats. Fails with `TypeError` otherwise.
#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Copy a design-matrix input into an owned `Array2<f64>`.
///
/// Parameters
/// ----------
/// - `py`: [`Python`]
///   GIL token.
/// - `raw_x`: `&Bound<PyAny>`
///   A 2-D `numpy.ndarray` / `pandas.DataFrame`, a sequence of equal-length
///   row sequences, or any 1-D input accepted by [`extract_f64_array`]; a 1-D
///   input becomes a single regressor column.
///
/// Returns
/// -------
/// `PyResult<Array2<f64>>`
///   Owned n × k matrix in row order.
///
/// Errors
/// ------
/// - `ValueError` if row sequences have different lengths.
/// - `TypeError` if the input is neither 2-D nor 1-D numeric.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_matrix<'py>(py: Python<'py>, raw_x: &Bound<'py, PyAny>) -> PyResult<Array2<f64>> {
    if let Ok(arr_ro) = raw_x.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr_ro.as_array().to_owned());
    }

    if let Ok(obj) = raw_x.call_method("to_numpy", (false,), None) {
        if let Ok(frame_ro) = obj.extract::<PyReadonlyArray2<f64>>() {
            return Ok(frame_ro.as_array().to_owned());
        }
    }

    if let Ok(rows) = raw_x.extract::<Vec<Vec<f64>>>() {
        let n = rows.len();
        let k = rows.first().map_or(0, Vec::len);
        if let Some(i) = rows.iter().position(|r| r.len() != k) {
            return Err(PyValueError::new_err(format!(
                "row {i} has {} columns, expected {k}",
                rows[i].len()
            )));
        }
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        return Array2::from_shape_vec((n, k), flat)
            .map_err(|e| PyValueError::new_err(e.to_string()));
    }

    let column = extract_f64_array(py, raw_x).map_err(|_| {
        PyTypeError::new_err(
            "expected a 2-D numpy.ndarray, pandas.DataFrame, or sequence of float64 rows",
        )
    })?;
    Ok(column.as_array().to_owned().insert_axis(Axis(1)))
}
