//! Core TSA processing modules

pub mod classify;
pub mod confidence;
pub mod reconcile;
pub mod composite;
pub mod resample;
pub mod accuracy;
pub mod processor;

// Re-export main types
pub use classify::{
    classify_auxiliary_scattering, classify_auxiliary_spectral_gradient, classify_primary,
    dry_snow_detection, valid_observation_mask, DetectionAlgorithm, ScanClassification,
    SnowClassifier,
};
pub use confidence::{score, quality_histogram, CompositeLabel, QualityLevel};
pub use reconcile::{combine, to_layer, Reconciled};
pub use composite::composite_quality;
pub use resample::{
    reproject_to_grid, GridResolution, Neighbour, NeighbourLookupResampler, Resampler, TargetGrid,
};
pub use accuracy::{
    mean_accuracy, AccuracyAssessor, ConfusionMatrix, DepthBin, Matchup, PeriodAssessment,
};
pub use processor::{ScanProduct, TsaProcessor, TsaProduct};
