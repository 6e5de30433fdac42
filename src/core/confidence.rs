//! Per-pixel confidence of the dry snow decision.
//!
//! The primary classifier is the gate: auxiliary rule sets can only raise
//! the confidence of a primary detection, never create one.

use crate::types::{ensure_same_shape, BinaryGrid, QualityGrid, TsaResult};
use ndarray::Zip;
use serde::{Deserialize, Serialize};

/// Confidence of a single-scan classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum QualityLevel {
    SnowFree = 0,
    Fair = 1,
    Good = 2,
    VeryGood = 3,
}

impl QualityLevel {
    pub const ALL: [QualityLevel; 4] = [
        QualityLevel::SnowFree,
        QualityLevel::Fair,
        QualityLevel::Good,
        QualityLevel::VeryGood,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(QualityLevel::SnowFree),
            1 => Some(QualityLevel::Fair),
            2 => Some(QualityLevel::Good),
            3 => Some(QualityLevel::VeryGood),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            QualityLevel::SnowFree => "snow-free",
            QualityLevel::Fair => "snow (fair)",
            QualityLevel::Good => "snow (good)",
            QualityLevel::VeryGood => "snow (very good)",
        }
    }
}

/// Label of a composited (forward + backward) grid code in 0..=6.
///
/// Codes 3 and 5 only arise from mixed-confidence sums or a single
/// very-good scan and carry no label of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompositeLabel {
    SnowFree,
    Fair,
    Good,
    VeryGood,
}

impl CompositeLabel {
    pub fn from_code(code: f64) -> Option<Self> {
        if !code.is_finite() || code.fract() != 0.0 {
            return None;
        }
        match code as i64 {
            0 => Some(CompositeLabel::SnowFree),
            1 | 2 => Some(CompositeLabel::Fair),
            4 => Some(CompositeLabel::Good),
            6 => Some(CompositeLabel::VeryGood),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CompositeLabel::SnowFree => "snow-free",
            CompositeLabel::Fair => "snow (fair)",
            CompositeLabel::Good => "snow (good)",
            CompositeLabel::VeryGood => "snow (very good)",
        }
    }
}

#[inline]
fn score_cell(primary: u8, aux_scattering: u8, aux_spectral: u8) -> u8 {
    if primary != 1 {
        return QualityLevel::SnowFree.code();
    }
    1 + (aux_scattering == 1) as u8 + (aux_spectral == 1) as u8
}

/// Combine the primary decision with the two auxiliary decisions.
///
/// 0 when the primary says snow-free, otherwise 1 plus the number of
/// auxiliaries that agree.
pub fn score(
    primary: &BinaryGrid,
    aux_scatter: &BinaryGrid,
    aux_spectral: &BinaryGrid,
) -> TsaResult<QualityGrid> {
    ensure_same_shape("confidence inputs (scattering)", primary.dim(), aux_scatter.dim())?;
    ensure_same_shape("confidence inputs (spectral gradient)", primary.dim(), aux_spectral.dim())?;

    Ok(Zip::from(primary)
        .and(aux_scatter)
        .and(aux_spectral)
        .map_collect(|&p, &s, &g| score_cell(p, s, g)))
}

/// Parallel variant of [`score`]
#[cfg(feature = "parallel")]
pub fn score_parallel(
    primary: &BinaryGrid,
    aux_scatter: &BinaryGrid,
    aux_spectral: &BinaryGrid,
) -> TsaResult<QualityGrid> {
    ensure_same_shape("confidence inputs (scattering)", primary.dim(), aux_scatter.dim())?;
    ensure_same_shape("confidence inputs (spectral gradient)", primary.dim(), aux_spectral.dim())?;

    Ok(Zip::from(primary)
        .and(aux_scatter)
        .and(aux_spectral)
        .par_map_collect(|&p, &s, &g| score_cell(p, s, g)))
}

/// Number of cells at each quality level, indexed by code
pub fn quality_histogram(grid: &QualityGrid) -> [usize; 4] {
    let mut counts = [0usize; 4];
    for &code in grid.iter() {
        if let Some(level) = QualityLevel::from_code(code) {
            counts[level.code() as usize] += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_score_levels() {
        let primary = array![[0u8, 1, 1, 1, 1, 0]];
        let scatter = array![[1u8, 0, 1, 0, 1, 1]];
        let spectral = array![[1u8, 0, 0, 1, 1, 0]];

        let quality = score(&primary, &scatter, &spectral).unwrap();
        assert_eq!(quality, array![[0u8, 1, 2, 2, 3, 0]]);
    }

    #[test]
    fn test_score_is_monotonic_in_agreement() {
        for scatter in 0..=1u8 {
            for spectral in 0..=1u8 {
                let base = score_cell(1, scatter, spectral);
                if scatter == 0 {
                    assert!(score_cell(1, 1, spectral) >= base);
                }
                if spectral == 0 {
                    assert!(score_cell(1, scatter, 1) >= base);
                }
            }
        }
    }

    #[test]
    fn test_auxiliaries_alone_never_detect() {
        assert_eq!(score_cell(0, 1, 1), 0);
    }

    #[test]
    fn test_score_shape_mismatch() {
        let result = score(
            &BinaryGrid::zeros((2, 2)),
            &BinaryGrid::zeros((2, 2)),
            &BinaryGrid::zeros((2, 3)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_composite_labels() {
        assert_eq!(CompositeLabel::from_code(0.0), Some(CompositeLabel::SnowFree));
        assert_eq!(CompositeLabel::from_code(1.0), Some(CompositeLabel::Fair));
        assert_eq!(CompositeLabel::from_code(2.0), Some(CompositeLabel::Fair));
        assert_eq!(CompositeLabel::from_code(3.0), None);
        assert_eq!(CompositeLabel::from_code(4.0), Some(CompositeLabel::Good));
        assert_eq!(CompositeLabel::from_code(5.0), None);
        assert_eq!(CompositeLabel::from_code(6.0), Some(CompositeLabel::VeryGood));
        assert_eq!(CompositeLabel::from_code(f64::NAN), None);
        assert_eq!(CompositeLabel::from_code(1.5), None);
    }

    #[test]
    fn test_quality_histogram() {
        let grid = array![[0u8, 1, 1], [3, 3, 3]];
        assert_eq!(quality_histogram(&grid), [1, 2, 0, 3]);
        assert_eq!(QualityLevel::VeryGood.label(), "snow (very good)");
    }
}
