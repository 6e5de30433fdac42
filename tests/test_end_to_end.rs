use ndarray::Array2;
use std::collections::HashMap;
use tsa_snow::core::{
    classify_auxiliary_scattering, classify_auxiliary_spectral_gradient, classify_primary,
    combine, score, CompositeLabel, Neighbour, NeighbourLookupResampler,
    QualityLevel, TargetGrid, TsaProcessor,
};
use tsa_snow::io::ResolvedConfig;
use tsa_snow::types::{Band, BandObservation, Geolocation, ScanDirection, ScanObservation};

fn field(dim: (usize, usize), value: f64) -> Array2<f64> {
    Array2::from_elem(dim, value)
}

/// Cold dry snowpack: strong Ku/Ka depression, scattering signature, X > KA
fn snow_scan(direction: ScanDirection, dim: (usize, usize)) -> ScanObservation {
    let mut bands = HashMap::new();
    bands.insert(
        Band::X,
        BandObservation::new(field(dim, 250.0), field(dim, 255.0)).unwrap(),
    );
    bands.insert(
        Band::KU,
        BandObservation::new(field(dim, 260.0), field(dim, 265.0)).unwrap(),
    );
    bands.insert(
        Band::KA,
        BandObservation::new(field(dim, 200.0), field(dim, 200.0)).unwrap(),
    );
    let geo = Geolocation::new(field(dim, 68.0), field(dim, 27.0)).unwrap();
    ScanObservation::new(direction, bands, geo).unwrap()
}

fn unit_grid(dim: (usize, usize)) -> TargetGrid {
    TargetGrid {
        area_id: "unit".to_string(),
        description: "unit test grid".to_string(),
        projection: "EPSG:6931".to_string(),
        width: dim.1,
        height: dim.0,
        area_extent: (0.0, 0.0, dim.1 as f64 * 12_500.0, dim.0 as f64 * 12_500.0),
    }
}

#[test]
fn test_all_rules_agree_on_dry_snow() {
    let ku_h = field((1, 1), 260.0);
    let ku_v = field((1, 1), 265.0);
    let ka_h = field((1, 1), 200.0);
    let ka_v = field((1, 1), 200.0);
    let x_h = field((1, 1), 250.0);
    let x_v = field((1, 1), 255.0);

    let primary = classify_primary(&ku_h, &ka_h, &ka_v).unwrap();
    let scatter = classify_auxiliary_scattering(&ku_h, &ku_v, &ka_v).unwrap();
    let spectral = classify_auxiliary_spectral_gradient(&ka_h, &ka_v, &x_h, &x_v).unwrap();

    assert_eq!(primary[[0, 0]], 1);
    assert_eq!(scatter[[0, 0]], 1);
    assert_eq!(spectral[[0, 0]], 1);

    let quality = score(&primary, &scatter, &spectral).unwrap();
    assert_eq!(QualityLevel::from_code(quality[[0, 0]]), Some(QualityLevel::VeryGood));
}

#[test]
fn test_single_scan_coverage_is_half_weight() {
    let dim = (3, 4);
    let missing = field(dim, f64::NAN);
    let detected = field(dim, 1.0);

    let reconciled = combine(&missing, &detected).unwrap();
    assert!(reconciled.combined.iter().all(|&v| v == 1.0));
    assert!(reconciled.combined_uncertain.iter().all(|&v| v == 0.5));
}

#[test]
fn test_full_chain_with_partial_backward_coverage() {
    let _ = env_logger::builder().is_test(true).try_init();

    let swath_fwd = (2, 3);
    let swath_bck = (3, 2);
    let grid_dim = (2, 2);

    // FWD covers every cell, BCK only the first row
    let fwd_table = vec![
        Some(Neighbour { source: (0, 0), distance_m: 1_000.0 }),
        Some(Neighbour { source: (0, 2), distance_m: 2_000.0 }),
        Some(Neighbour { source: (1, 0), distance_m: 500.0 }),
        Some(Neighbour { source: (1, 2), distance_m: 0.0 }),
    ];
    let bck_table = vec![
        Some(Neighbour { source: (0, 0), distance_m: 3_000.0 }),
        Some(Neighbour { source: (2, 1), distance_m: 1_500.0 }),
        Some(Neighbour { source: (1, 1), distance_m: 50_000.0 }),
        None,
    ];

    let fwd_resampler = NeighbourLookupResampler::new(swath_fwd, grid_dim, fwd_table).unwrap();
    let bck_resampler = NeighbourLookupResampler::new(swath_bck, grid_dim, bck_table).unwrap();

    let processor = TsaProcessor::new(ResolvedConfig::default()).with_grid(unit_grid(grid_dim));
    let product = processor
        .process_pair(
            &snow_scan(ScanDirection::Forward, swath_fwd),
            &snow_scan(ScanDirection::Backward, swath_bck),
            &fwd_resampler,
            &bck_resampler,
        )
        .unwrap();
    assert!(product.forward.quality.iter().all(|&q| q == 3));
    assert!(product.backward.quality.iter().all(|&q| q == 3));

    assert_eq!(product.tsa.coverage, ndarray::array![[3u8, 3], [1, 1]]);
    assert_eq!(product.tsa.combined_uncertain, ndarray::array![[1.0, 1.0], [0.5, 0.5]]);

    let composite = &product.quality;
    assert_eq!(composite[[0, 0]], 6.0);
    assert_eq!(composite[[0, 1]], 6.0);
    // beyond the 20 km radius for BCK, FWD alone remains
    assert_eq!(composite[[1, 0]], 3.0);
    assert_eq!(composite[[1, 1]], 3.0);

    assert_eq!(CompositeLabel::from_code(composite[[0, 0]]), Some(CompositeLabel::VeryGood));
    assert_eq!(CompositeLabel::from_code(composite[[1, 0]]), None);
}

#[test]
fn test_process_pair_with_shared_geometry() {
    let dim = (2, 2);
    let table = (0..dim.0)
        .flat_map(|i| (0..dim.1).map(move |j| Some(Neighbour { source: (i, j), distance_m: 0.0 })))
        .collect();
    let resampler = NeighbourLookupResampler::new(dim, dim, table).unwrap();

    let processor = TsaProcessor::new(ResolvedConfig::default()).with_grid(unit_grid(dim));
    let product = processor
        .process_pair(
            &snow_scan(ScanDirection::Forward, dim),
            &snow_scan(ScanDirection::Backward, dim),
            &resampler,
            &resampler,
        )
        .unwrap();

    assert!(product.tsa.combined.iter().all(|&v| v == 1.0));
    assert!(product.tsa.combined_uncertain.iter().all(|&v| v == 1.0));
    assert!(product.quality.iter().all(|&v| v == 6.0));
    assert!(product.tsa.coverage.iter().all(|&c| c == 3));
}

#[test]
fn test_missing_observations_become_no_data() {
    let dim = (1, 2);
    let mut scan = snow_scan(ScanDirection::Forward, dim);
    let mut bands = HashMap::new();
    let mut ka_h = field(dim, 200.0);
    ka_h[[0, 1]] = f64::NAN;
    bands.insert(Band::KU, scan.band(Band::KU).unwrap().clone());
    bands.insert(Band::KA, BandObservation::new(ka_h, field(dim, 200.0)).unwrap());
    scan = ScanObservation::new(ScanDirection::Forward, bands, scan.geolocation.clone()).unwrap();

    let processor = TsaProcessor::new(ResolvedConfig::default());
    let product = processor.process_scan(&scan).unwrap();

    // silent snow-free in the binary grid, explicit no-data in the layer
    assert_eq!(product.classification.primary[[0, 1]], 0);
    assert!(!product.classification.valid[[0, 1]]);
    let layer = product.tsa_layer().unwrap();
    assert_eq!(layer[[0, 0]], 1.0);
    assert!(layer[[0, 1]].is_nan());
}
