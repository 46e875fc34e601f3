//! Integration tests for the OLS-MOSUM fluctuation process and its test.
//!
//! Purpose
//! -------
//! - Validate the end-to-end pipeline: raw design and response (with missing
//!   values), OLS fit, fluctuation process, `max` functional, and p-value
//!   lookup against the shipped critical-value table.
//! - Exercise realistic series (the Nile river flow record, seeded Gaussian
//!   noise with and without a level shift, a trend model with a jump)
//!   rather than toy inputs only.
//!
//! Coverage
//! --------
//! - `structural_change::efp`:
//!   - `FluctuationProcess::new`, `::level`, `::from_type_name`, `sctest`,
//!     `sctest_default`, and `SCTestOutcome::rejects`.
//! - `structural_change::critical_values`:
//!   - The shipped table and an injected custom table.
//! - Determinism of `sctest` across repeated calls and threads.
//!
//! Exclusions
//! ----------
//! - Error-message wording and individual validation branches; these are
//!   covered by unit tests.
//! - Python bindings.
use ndarray::{Array1, Array2};
use rand::{SeedableRng, distributions::Distribution, rngs::StdRng};
use rust_bfast::structural_change::{
    CriticalValueTable, EFPError, ErrorKind, FluctuationProcess, Functional, ProcessType,
    TableLayout,
};
use statrs::distribution::Normal;

/// Annual flow of the Nile at Aswan, 1871–1970 (10⁸ m³), a standard
/// example of a level shift (the Aswan dam, around 1898).
const NILE: [f64; 100] = [
    1120.0, 1160.0, 963.0, 1210.0, 1160.0, 1160.0, 813.0, 1230.0, 1370.0, 1140.0, 995.0, 935.0,
    1110.0, 994.0, 1020.0, 960.0, 1180.0, 799.0, 958.0, 1140.0, 1100.0, 1210.0, 1150.0, 1250.0,
    1260.0, 1220.0, 1030.0, 1100.0, 774.0, 840.0, 874.0, 694.0, 940.0, 833.0, 701.0, 916.0, 692.0,
    1020.0, 1050.0, 969.0, 831.0, 726.0, 456.0, 824.0, 702.0, 1120.0, 1100.0, 832.0, 764.0, 821.0,
    768.0, 845.0, 864.0, 862.0, 698.0, 845.0, 744.0, 796.0, 1040.0, 759.0, 781.0, 865.0, 845.0,
    944.0, 984.0, 897.0, 822.0, 1010.0, 771.0, 676.0, 649.0, 846.0, 812.0, 742.0, 801.0, 1040.0,
    860.0, 874.0, 848.0, 890.0, 744.0, 749.0, 838.0, 1050.0, 918.0, 986.0, 797.0, 923.0, 975.0,
    815.0, 1020.0, 906.0, 901.0, 1170.0, 912.0, 746.0, 919.0, 718.0, 714.0, 740.0,
];

/// Purpose
/// -------
/// Draw a Gaussian series with an optional level shift at the midpoint.
///
/// Parameters
/// ----------
/// - `n`: Series length.
/// - `shift`: Mean added to observations `n/2..n`.
/// - `seed`: Seed for `StdRng`, so every run sees the same draws.
///
/// Returns
/// -------
/// - `y_t = shift·1{t ≥ n/2} + ε_t` with `ε_t ~ N(0, 1)` i.i.d.
fn gaussian_series(n: usize, shift: f64, seed: u64) -> Array1<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).expect("unit normal is valid");
    Array1::from_iter(
        (0..n).map(|t| if t < n / 2 { 0.0 } else { shift } + noise.sample(&mut rng)),
    )
}

/// Intercept-and-trend design `[1, t/n]`.
fn trend_design(n: usize) -> Array2<f64> {
    Array2::from_shape_fn((n, 2), |(t, j)| if j == 0 { 1.0 } else { t as f64 / n as f64 })
}

#[test]
// Purpose
// -------
// Reproduce the classic Nile level-shift analysis.
//
// Given
// -----
// - The 100 annual Nile flows, constant design, h = 0.15.
//
// Expect
// ------
// - nh = 15, a process of 86 points, stat ≈ 1.5309 (beyond every tabulated
//   critical value), p = 0.01, and a detected breakpoint at level 0.15.
fn nile_level_shift_is_detected() {
    // Arrange
    let y = Array1::from(NILE.to_vec());

    // Act
    let efp = FluctuationProcess::level(y.view(), 0.15).expect("Nile process should build");
    let outcome = efp.sctest_default(Functional::Max).expect("sctest should succeed");

    // Assert
    assert_eq!(efp.window(), 15);
    assert_eq!(efp.process().len(), 86);
    assert!((efp.coefficients()[0] - 919.35).abs() < 1e-8);
    assert!((outcome.stat() - 1.530_927).abs() < 1e-4, "stat = {}", outcome.stat());
    assert_eq!(outcome.p_value(), 0.01);
    assert!(outcome.rejects(0.15));
}

#[test]
// Purpose
// -------
// Ensure missing observations do not change the outcome.
//
// Given
// -----
// - The Nile series with NaN rows inserted (missing in y and in x).
//
// Expect
// ------
// - Identical process and (stat, p) to the clean series.
fn missing_rows_leave_outcome_unchanged() {
    // Arrange
    let clean_y = Array1::from(NILE.to_vec());
    let mut y = Vec::with_capacity(NILE.len() + 3);
    let mut x = Vec::with_capacity(NILE.len() + 3);
    for (t, &v) in NILE.iter().enumerate() {
        if t == 10 || t == 55 {
            y.push(f64::NAN);
            x.push(1.0);
        }
        if t == 80 {
            y.push(500.0);
            x.push(f64::NAN);
        }
        y.push(v);
        x.push(1.0);
    }
    let x = Array2::from_shape_vec((x.len(), 1), x).expect("column shape is consistent");
    let y = Array1::from(y);

    // Act
    let clean = FluctuationProcess::level(clean_y.view(), 0.15).expect("clean process");
    let gappy = FluctuationProcess::new(x.view(), y.view(), 0.15, ProcessType::OlsMosum)
        .expect("process with gaps");

    // Assert
    assert_eq!(gappy.nobs(), 100);
    assert_eq!(gappy.process(), clean.process());
    assert_eq!(
        gappy.sctest_default(Functional::Max).map(|o| o.as_tuple()),
        clean.sctest_default(Functional::Max).map(|o| o.as_tuple())
    );
}

#[test]
// Purpose
// -------
// Check detection of a large mean shift in Gaussian noise.
//
// Given
// -----
// - n = 200, shift of 3 standard deviations at the midpoint, seeded noise.
//
// Expect
// ------
// - p ≤ 0.05, with the statistic at or beyond the 5 % boundary.
fn seeded_mean_shift_is_detected() {
    // Arrange
    let y = gaussian_series(200, 3.0, 42);

    // Act
    let efp = FluctuationProcess::level(y.view(), 0.15).expect("process should build");
    let outcome = efp.sctest_default(Functional::Max).expect("sctest should succeed");

    // Assert
    assert!(outcome.rejects(0.05), "p = {}", outcome.p_value());
    let boundary = CriticalValueTable::mosum_max()
        .critical_value(0.15, 1, 0.05)
        .expect("0.05 is tabulated");
    assert!(outcome.stat() >= boundary, "stat = {}, boundary = {boundary}", outcome.stat());
}

#[test]
// Purpose
// -------
// Check that the test holds its size on stable series.
//
// Given
// -----
// - 200 independent seeded Gaussian series of length 200 without a shift.
//
// Expect
// ------
// - The rejection rate at level 0.05 stays at or below 0.12, and every
//   p-value lies in [0.01, 1].
fn stable_noise_rejection_rate_is_controlled() {
    let reps = 200;
    let mut rejections = 0;
    for seed in 0..reps {
        let y = gaussian_series(200, 0.0, 1_000 + seed);
        let efp = FluctuationProcess::level(y.view(), 0.15).expect("process should build");
        let outcome = efp.sctest_default(Functional::Max).expect("sctest should succeed");

        assert!((0.01..=1.0).contains(&outcome.p_value()), "p = {}", outcome.p_value());
        if outcome.rejects(0.05) {
            rejections += 1;
        }
    }

    let rate = rejections as f64 / reps as f64;
    assert!(rate <= 0.12, "rejection rate {rate}");
}

#[test]
// Purpose
// -------
// Exercise a two-column design end to end.
//
// Given
// -----
// - Design [1, t/n] with n = 150 and a deterministic wiggle 0.2·sin(1.7t).
// - Response following the trend, with and without a jump of 1.5 at the
//   midpoint.
//
// Expect
// ------
// - Without the jump the test does not reject at 0.10; with the jump it
//   rejects at 0.01. Both use the k = 1 block.
fn trend_model_detects_jump_only_when_present() {
    // Arrange
    let n = 150;
    let x = trend_design(n);
    let trend = |t: usize| 1.0 + 2.0 * t as f64 / n as f64 + 0.2 * (1.7 * t as f64).sin();
    let stable = Array1::from_iter((0..n).map(trend));
    let broken = Array1::from_iter((0..n).map(|t| trend(t) + if t < n / 2 { 0.0 } else { 1.5 }));

    // Act
    let stable_outcome = FluctuationProcess::new(x.view(), stable.view(), 0.15, ProcessType::OlsMosum)
        .and_then(|efp| efp.sctest_default(Functional::Max))
        .expect("stable trend should test");
    let broken_outcome = FluctuationProcess::new(x.view(), broken.view(), 0.15, ProcessType::OlsMosum)
        .and_then(|efp| efp.sctest_default(Functional::Max))
        .expect("broken trend should test");

    // Assert
    assert!(!stable_outcome.rejects(0.10), "p = {}", stable_outcome.p_value());
    assert_eq!(broken_outcome.p_value(), 0.01);
    assert_eq!(stable_outcome.lookup_regressors(), 1);
    assert_eq!(broken_outcome.lookup_regressors(), 1);
}

#[test]
// Purpose
// -------
// Verify the process length n − ⌊n·h⌋ + 1 across sizes and bandwidths.
//
// Given
// -----
// - n ∈ {19, 50, 100, 200} and h ∈ {0.05, 0.15, 0.25, 0.5}, where the
//   window is non-empty.
//
// Expect
// ------
// - `process().len() == n − window() + 1` and `window() == ⌊n·h⌋`.
fn process_length_matches_window_arithmetic() {
    for n in [19_usize, 50, 100, 200] {
        for h in [0.05, 0.15, 0.25, 0.5] {
            let nh = (n as f64 * h).floor() as usize;
            let y = gaussian_series(n, 0.0, n as u64);
            let result = FluctuationProcess::level(y.view(), h);
            if nh == 0 {
                assert_eq!(result, Err(EFPError::InvalidBandwidth { h, n }));
                continue;
            }
            let efp = result.expect("process should build");
            assert_eq!(efp.window(), nh, "n = {n}, h = {h}");
            assert_eq!(efp.process().len(), n - nh + 1, "n = {n}, h = {h}");
        }
    }
}

#[test]
// Purpose
// -------
// Ensure repeated and concurrent tests agree exactly.
//
// Given
// -----
// - One Nile process tested twice on this thread and once on each of four
//   scoped threads sharing the static table.
//
// Expect
// ------
// - All outcomes are identical.
fn sctest_is_deterministic_across_calls_and_threads() {
    let y = Array1::from(NILE.to_vec());
    let efp = FluctuationProcess::level(y.view(), 0.15).expect("Nile process should build");
    let first = efp.sctest_default(Functional::Max).expect("sctest should succeed");
    let second = efp.sctest_default(Functional::Max).expect("sctest should succeed");
    assert_eq!(first, second);

    let outcomes: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> =
            (0..4).map(|_| scope.spawn(|| efp.sctest_default(Functional::Max))).collect();
        handles.into_iter().map(|h| h.join().expect("worker should not panic")).collect()
    });
    for outcome in outcomes {
        assert_eq!(outcome, Ok(first));
    }
}

#[test]
// Purpose
// -------
// Check that an injected table is honored.
//
// Given
// -----
// - A custom table equal to the shipped one with every value doubled.
//
// Expect
// ------
// - The Nile statistic now falls between the anchor and the first critical
//   value, so its p-value is above 0.10 and exceeds the shipped p-value.
fn injected_table_changes_p_value() {
    // Arrange
    let shipped = CriticalValueTable::mosum_max();
    let doubled = CriticalValueTable::new(shipped.values().mapv(|v| 2.0 * v), TableLayout::default())
        .expect("doubled table is still well formed");
    let y = Array1::from(NILE.to_vec());
    let efp = FluctuationProcess::level(y.view(), 0.15).expect("Nile process should build");

    // Act
    let with_shipped = efp.sctest(Functional::Max, shipped).expect("sctest should succeed");
    let with_doubled = efp.sctest(Functional::Max, &doubled).expect("sctest should succeed");

    // Assert
    assert_eq!(with_shipped.stat(), with_doubled.stat());
    assert!(with_doubled.p_value() > 0.10, "p = {}", with_doubled.p_value());
    assert!(with_doubled.p_value() > with_shipped.p_value());
}

#[test]
// Purpose
// -------
// Ensure unsupported selectors are configuration errors.
//
// Given
// -----
// - Process type "foo" and functional "min" on valid data.
// - The lowercase spelling "ols-mosum" next to the exact name "OLS-MOSUM".
//
// Expect
// ------
// - `UnsupportedProcessType` and `UnsupportedFunctional`, both of kind
//   `InvalidConfiguration`.
// - Only the exact name builds a process.
fn unsupported_selectors_are_rejected() {
    let y = Array1::from(NILE.to_vec());
    let x = Array2::<f64>::ones((NILE.len(), 1));

    let process_err = FluctuationProcess::from_type_name(x.view(), y.view(), 0.15, "foo")
        .expect_err("foo is not a process type");
    let functional_err = "min".parse::<Functional>().expect_err("min is not a functional");

    assert_eq!(process_err.kind(), ErrorKind::InvalidConfiguration);
    assert_eq!(functional_err.kind(), ErrorKind::InvalidConfiguration);
    assert!(matches!(process_err, EFPError::UnsupportedProcessType { .. }));
    assert!(matches!(functional_err, EFPError::UnsupportedFunctional { .. }));

    let ok = FluctuationProcess::from_type_name(x.view(), y.view(), 0.15, "OLS-MOSUM");
    assert!(ok.is_ok());
    let recased = FluctuationProcess::from_type_name(x.view(), y.view(), 0.15, "ols-mosum");
    assert_eq!(
        recased.map(|efp| efp.nobs()),
        Err(EFPError::UnsupportedProcessType { name: "ols-mosum".to_string() })
    );
}
