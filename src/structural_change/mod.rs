//! structural_change — empirical fluctuation processes and their tests.
//!
//! Purpose
//! -------
//! Provide the OLS-MOSUM empirical fluctuation process and the generalized
//! fluctuation test for parameter stability, together with the tabulated
//! critical values needed to turn a test statistic into a p-value. This is
//! the breakpoint-detection primitive a seasonal/trend decomposition calls
//! once per segment.
//!
//! Key behaviors
//! -------------
//! - [`efp`]: build a [`FluctuationProcess`] from a design matrix, a response
//!   and a bandwidth, and run [`FluctuationProcess::sctest`] with a
//!   [`Functional`] to obtain an [`SCTestOutcome`].
//! - [`critical_values`]: hold the shipped OLS-MOSUM `max` table
//!   ([`CriticalValueTable::mosum_max`]) or a caller-supplied one, and
//!   perform the bandwidth-then-statistic double interpolation.
//! - [`ols`]: least-squares fit through an SVD solve.
//! - [`validation`]: input guards and paired missing-row removal.
//! - [`errors`]: the shared [`EFPError`] / [`EFPResult`] surface.
//!
//! Invariants & assumptions
//! ------------------------
//! - Missing values are `NaN`; infinite values are rejected.
//! - Every constructed process satisfies `1 ≤ ⌊n·h⌋ < n` and `n > k`.
//! - Only the OLS-MOSUM process and the `max` functional exist; other
//!   selector names are configuration errors.
//!
//! Conventions
//! -----------
//! - Inputs are `ndarray` views; outputs are owned arrays held by the
//!   process and handed out by reference.
//! - The subtree logs through the `log` facade and never installs a logger.
//!
//! Downstream usage
//! ----------------
//! - Typical callers write `use rust_bfast::structural_change::prelude::*;`,
//!   build a process with [`FluctuationProcess::new`] or
//!   [`FluctuationProcess::level`], and call
//!   [`FluctuationProcess::sctest_default`].
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests for its local contract. End-to-end
//!   detection scenarios and property tests live under `tests/`.

pub mod critical_values;
pub mod efp;
pub mod errors;
pub mod ols;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::critical_values::{CriticalValueTable, TableLayout};
pub use self::efp::{FluctuationProcess, Functional, ProcessType, SCTestOutcome};
pub use self::errors::{EFPError, EFPResult, ErrorKind};
pub use self::ols::FittedModel;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_bfast::structural_change::prelude::*;
//
// to import the main structural-change surface in a single line.

pub mod prelude {
    pub use super::critical_values::{CriticalValueTable, TableLayout};
    pub use super::efp::{FluctuationProcess, Functional, ProcessType, SCTestOutcome};
    pub use super::errors::{EFPError, EFPResult};
}
