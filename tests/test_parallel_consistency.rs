#![cfg(feature = "parallel")]

use ndarray::Array2;
use tsa_snow::core::classify::{
    classify_auxiliary_scattering, classify_auxiliary_scattering_parallel,
    classify_auxiliary_spectral_gradient, classify_auxiliary_spectral_gradient_parallel,
    classify_primary, classify_primary_parallel,
};
use tsa_snow::core::composite::{composite_quality, composite_quality_parallel};
use tsa_snow::core::confidence::{score, score_parallel};
use tsa_snow::core::reconcile::{combine, combine_parallel};

/// Deterministic brightness temperature field sweeping 180..280 K
fn sweep(dim: (usize, usize), phase: f64) -> Array2<f64> {
    Array2::from_shape_fn(dim, |(i, j)| {
        let t = (i * dim.1 + j) as f64 * 0.37 + phase;
        180.0 + (t.sin() * 0.5 + 0.5) * 100.0
    })
}

/// Layer of {0, 1, NaN} following a fixed pattern
fn sparse_binary(dim: (usize, usize), offset: usize) -> Array2<f64> {
    Array2::from_shape_fn(dim, |(i, j)| match (i + j + offset) % 3 {
        0 => f64::NAN,
        1 => 1.0,
        _ => 0.0,
    })
}

fn same_with_nan(a: &Array2<f64>, b: &Array2<f64>) -> bool {
    a.dim() == b.dim()
        && a.iter()
            .zip(b.iter())
            .all(|(x, y)| (x.is_nan() && y.is_nan()) || x == y)
}

#[test]
fn test_parallel_classifiers_match_sequential() {
    let dim = (64, 37);
    let ku_h = sweep(dim, 0.0);
    let ku_v = sweep(dim, 0.4);
    let ka_h = sweep(dim, 1.3);
    let ka_v = sweep(dim, 1.7);
    let x_h = sweep(dim, 2.1);
    let x_v = sweep(dim, 2.9);

    let primary = classify_primary(&ku_h, &ka_h, &ka_v).unwrap();
    assert_eq!(primary, classify_primary_parallel(&ku_h, &ka_h, &ka_v).unwrap());

    let scatter = classify_auxiliary_scattering(&ku_h, &ku_v, &ka_v).unwrap();
    assert_eq!(scatter, classify_auxiliary_scattering_parallel(&ku_h, &ku_v, &ka_v).unwrap());

    let spectral = classify_auxiliary_spectral_gradient(&ka_h, &ka_v, &x_h, &x_v).unwrap();
    assert_eq!(
        spectral,
        classify_auxiliary_spectral_gradient_parallel(&ka_h, &ka_v, &x_h, &x_v).unwrap()
    );

    assert_eq!(
        score(&primary, &scatter, &spectral).unwrap(),
        score_parallel(&primary, &scatter, &spectral).unwrap()
    );

    // the sweep must exercise both outcomes of the primary rule
    assert!(primary.iter().any(|&v| v == 1));
    assert!(primary.iter().any(|&v| v == 0));
}

#[test]
fn test_parallel_combiners_match_sequential() {
    let dim = (41, 29);
    let fwd = sparse_binary(dim, 0);
    let bck = sparse_binary(dim, 1);

    let serial = combine(&fwd, &bck).unwrap();
    let parallel = combine_parallel(&fwd, &bck).unwrap();
    assert!(same_with_nan(&serial.combined, &parallel.combined));
    assert!(same_with_nan(&serial.combined_uncertain, &parallel.combined_uncertain));
    assert_eq!(serial.coverage, parallel.coverage);

    let qa_fwd = fwd.mapv(|v| v * 3.0);
    let qa_bck = bck.mapv(|v| v * 2.0);
    assert!(same_with_nan(
        &composite_quality(&qa_fwd, &qa_bck).unwrap(),
        &composite_quality_parallel(&qa_fwd, &qa_bck).unwrap()
    ));
}
