//! Forward/backward scan reconciliation of binary TSA layers.
//!
//! Both inputs must already live on the same comparison space (resampled to
//! one target grid, or paired swath arrays of equal shape). NaN marks cells
//! a scan did not observe.

use crate::types::{ensure_same_shape, Layer, TsaResult};
use ndarray::{Array2, Zip};

/// Coverage of a reconciled cell
pub mod coverage {
    pub const NONE: u8 = 0;
    pub const FORWARD_ONLY: u8 = 1;
    pub const BACKWARD_ONLY: u8 = 2;
    pub const BOTH: u8 = 3;
}

/// Weight given to each scan's value
pub const SCAN_WEIGHT: f64 = 0.5;

/// Output of [`combine`]
#[derive(Debug, Clone)]
pub struct Reconciled {
    /// Strict binary product: any detection in either scan is snow
    pub combined: Layer,
    /// Weighted evidence in {0, 0.5, 1} for binary inputs
    pub combined_uncertain: Layer,
    /// Which scans contributed to each cell (see [`coverage`])
    pub coverage: Array2<u8>,
}

impl Reconciled {
    pub fn dim(&self) -> (usize, usize) {
        self.combined.dim()
    }
}

#[inline]
fn weighted(fwd: f64, bck: f64) -> f64 {
    match (fwd.is_nan(), bck.is_nan()) {
        (false, false) => SCAN_WEIGHT * (fwd + bck),
        (false, true) => SCAN_WEIGHT * fwd,
        (true, false) => SCAN_WEIGHT * bck,
        (true, true) => f64::NAN,
    }
}

#[inline]
fn coverage_flag(fwd: f64, bck: f64) -> u8 {
    match (fwd.is_nan(), bck.is_nan()) {
        (false, false) => coverage::BOTH,
        (false, true) => coverage::FORWARD_ONLY,
        (true, false) => coverage::BACKWARD_ONLY,
        (true, true) => coverage::NONE,
    }
}

/// Reconcile forward and backward binary detections.
///
/// Where both scans are valid the values are averaged; where only one is
/// valid its value is halved, so single-view detections are reported at
/// half weight whichever scan saw them. `combined` is the ceiling of the
/// weighted value. Cells neither scan observed stay NaN in both outputs.
pub fn combine(value_fwd: &Layer, value_bck: &Layer) -> TsaResult<Reconciled> {
    ensure_same_shape("scan reconciliation (fwd vs bck)", value_fwd.dim(), value_bck.dim())?;

    let combined_uncertain = Zip::from(value_fwd)
        .and(value_bck)
        .map_collect(|&fwd, &bck| weighted(fwd, bck));
    let combined = combined_uncertain.mapv(f64::ceil);
    let coverage = Zip::from(value_fwd)
        .and(value_bck)
        .map_collect(|&fwd, &bck| coverage_flag(fwd, bck));

    log_coverage(&coverage);

    Ok(Reconciled {
        combined,
        combined_uncertain,
        coverage,
    })
}

/// Parallel variant of [`combine`]
#[cfg(feature = "parallel")]
pub fn combine_parallel(value_fwd: &Layer, value_bck: &Layer) -> TsaResult<Reconciled> {
    ensure_same_shape("scan reconciliation (fwd vs bck)", value_fwd.dim(), value_bck.dim())?;

    let combined_uncertain = Zip::from(value_fwd)
        .and(value_bck)
        .par_map_collect(|&fwd, &bck| weighted(fwd, bck));
    let combined = Zip::from(&combined_uncertain).par_map_collect(|v| v.ceil());
    let coverage = Zip::from(value_fwd)
        .and(value_bck)
        .par_map_collect(|&fwd, &bck| coverage_flag(fwd, bck));

    log_coverage(&coverage);

    Ok(Reconciled {
        combined,
        combined_uncertain,
        coverage,
    })
}

fn log_coverage(coverage: &Array2<u8>) {
    let mut counts = [0usize; 4];
    for &flag in coverage.iter() {
        counts[flag as usize] += 1;
    }
    log::debug!(
        "Scan coverage: both={} fwd-only={} bck-only={} none={}",
        counts[coverage::BOTH as usize],
        counts[coverage::FORWARD_ONLY as usize],
        counts[coverage::BACKWARD_ONLY as usize],
        counts[coverage::NONE as usize]
    );
}

/// Widen an integer grid into a NaN-capable layer.
///
/// Cells where `valid` is false become NaN, turning the implicit
/// snow-free default of no-data samples into explicit no-data.
pub fn to_layer(grid: &Array2<u8>, valid: Option<&Array2<bool>>) -> TsaResult<Layer> {
    match valid {
        None => Ok(grid.mapv(f64::from)),
        Some(mask) => {
            ensure_same_shape("layer validity mask", grid.dim(), mask.dim())?;
            Ok(Zip::from(grid)
                .and(mask)
                .map_collect(|&value, &ok| if ok { f64::from(value) } else { f64::NAN }))
        }
    }
}
