//! Composite of forward and backward quality grids on the target grid.
//!
//! Unlike [`combine`](crate::core::reconcile::combine) the inputs are
//! resolved confidence codes, so coincident cells are summed rather than
//! averaged and a single-scan cell keeps its raw code.

use crate::types::{ensure_same_shape, Layer, TsaResult};
use ndarray::Zip;

/// Largest code reachable when both scans contribute (3 + 3)
pub const MAX_COMPOSITE_CODE: f64 = 6.0;

#[inline]
fn composite_cell(fwd: f64, bck: f64) -> f64 {
    match (fwd.is_nan(), bck.is_nan()) {
        (false, false) => fwd + bck,
        (false, true) => fwd,
        (true, false) => bck,
        (true, true) => f64::NAN,
    }
}

/// Merge two gridded quality layers.
///
/// Both valid: sum (0..=6). One valid: that side's code. Neither: NaN.
pub fn composite_quality(grid_fwd: &Layer, grid_bck: &Layer) -> TsaResult<Layer> {
    ensure_same_shape("quality composite (fwd vs bck)", grid_fwd.dim(), grid_bck.dim())?;

    let composite = Zip::from(grid_fwd)
        .and(grid_bck)
        .map_collect(|&fwd, &bck| composite_cell(fwd, bck));

    log::debug!(
        "Quality composite: {} of {} cells covered",
        composite.iter().filter(|v| !v.is_nan()).count(),
        composite.len()
    );
    Ok(composite)
}

/// Parallel variant of [`composite_quality`]
#[cfg(feature = "parallel")]
pub fn composite_quality_parallel(grid_fwd: &Layer, grid_bck: &Layer) -> TsaResult<Layer> {
    ensure_same_shape("quality composite (fwd vs bck)", grid_fwd.dim(), grid_bck.dim())?;

    Ok(Zip::from(grid_fwd)
        .and(grid_bck)
        .par_map_collect(|&fwd, &bck| composite_cell(fwd, bck)))
}
