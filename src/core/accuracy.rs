/*!
 * Classification accuracy against in situ snow depth.
 *
 * Gridded TSA values are matched with station snow depth observations and
 * split into true/false positives/negatives. Daily accuracy is
 * (TP + TN) / (TP + FP + TN + FN); monthly and total figures are means of
 * daily accuracies. Binning the matchups by station snow depth shows how
 * detection skill varies with depth.
 */

use crate::io::config::ResolvedConfig;
use crate::types::{TsaError, TsaResult};
use serde::{Deserialize, Serialize};

/// Gridded TSA values at or above this count as a snow detection.
/// Half-weight single-scan detections (0.5) are included.
pub const DETECTION_THRESHOLD: f64 = 0.5;

/// One gridded TSA value paired with a station observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    /// TSA at the station's grid cell (NaN when not observed)
    pub tsa: f64,
    /// In situ snow depth (cm)
    pub snow_depth_cm: f64,
}

/// Outcome counts of a binary classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_: usize,
}

impl ConfusionMatrix {
    pub fn total(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }

    /// (TP + TN) / total, `None` for an empty matrix
    pub fn accuracy(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            n => Some((self.tp + self.tn) as f64 / n as f64),
        }
    }

    fn record(&mut self, detected: bool, reference_snow: bool) {
        match (detected, reference_snow) {
            (true, true) => self.tp += 1,
            (true, false) => self.fp += 1,
            (false, false) => self.tn += 1,
            (false, true) => self.fn_ += 1,
        }
    }

    pub fn merge(&mut self, other: &ConfusionMatrix) {
        self.tp += other.tp;
        self.fp += other.fp;
        self.tn += other.tn;
        self.fn_ += other.fn_;
    }
}

/// Confusion matrix for matchups whose depth falls in `[lower, upper)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthBin {
    pub lower_cm: f64,
    pub upper_cm: f64,
    pub matrix: ConfusionMatrix,
}

/// Daily matrices of a period together with their summaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodAssessment {
    pub daily: Vec<ConfusionMatrix>,
    /// All days pooled into one matrix
    pub pooled: ConfusionMatrix,
    /// Mean of the non-empty daily accuracies
    pub mean_daily_accuracy: Option<f64>,
}

/// Compares TSA against station data
#[derive(Debug, Clone)]
pub struct AccuracyAssessor {
    /// Station depth above which the ground counts as snow covered (cm)
    snow_depth_threshold_cm: f64,
}

impl Default for AccuracyAssessor {
    fn default() -> Self {
        Self {
            snow_depth_threshold_cm: 0.0,
        }
    }
}

impl AccuracyAssessor {
    pub fn new(snow_depth_threshold_cm: f64) -> TsaResult<Self> {
        if !snow_depth_threshold_cm.is_finite() || snow_depth_threshold_cm < 0.0 {
            return Err(TsaError::Configuration(format!(
                "snow depth threshold must be a non-negative depth, got {}",
                snow_depth_threshold_cm
            )));
        }
        Ok(Self {
            snow_depth_threshold_cm,
        })
    }

    /// Assessor with the station depth threshold of a validated config
    pub fn from_config(config: &ResolvedConfig) -> TsaResult<Self> {
        Self::new(config.snow_depth_threshold_cm)
    }

    pub fn snow_depth_threshold_cm(&self) -> f64 {
        self.snow_depth_threshold_cm
    }

    fn usable(m: &Matchup) -> bool {
        !m.tsa.is_nan() && !m.snow_depth_cm.is_nan()
    }

    fn classify(&self, m: &Matchup) -> (bool, bool) {
        (
            m.tsa >= DETECTION_THRESHOLD,
            m.snow_depth_cm > self.snow_depth_threshold_cm,
        )
    }

    /// Confusion matrix over all usable matchups (NaN entries skipped)
    pub fn assess(&self, matchups: &[Matchup]) -> ConfusionMatrix {
        let mut matrix = ConfusionMatrix::default();
        let mut skipped = 0usize;
        for m in matchups {
            if !Self::usable(m) {
                skipped += 1;
                continue;
            }
            let (detected, reference) = self.classify(m);
            matrix.record(detected, reference);
        }
        if skipped > 0 {
            log::debug!("Skipped {} matchups without TSA or station depth", skipped);
        }
        matrix
    }

    /// Confusion matrices per snow depth bin.
    ///
    /// `bin_edges` must be strictly increasing; matchups outside the outer
    /// edges are ignored.
    pub fn assess_by_depth(
        &self,
        matchups: &[Matchup],
        bin_edges: &[f64],
    ) -> TsaResult<Vec<DepthBin>> {
        if bin_edges.len() < 2 || bin_edges.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(TsaError::Configuration(format!(
                "snow depth bin edges must be at least two increasing values, got {:?}",
                bin_edges
            )));
        }

        let mut bins: Vec<DepthBin> = bin_edges
            .windows(2)
            .map(|w| DepthBin {
                lower_cm: w[0],
                upper_cm: w[1],
                matrix: ConfusionMatrix::default(),
            })
            .collect();

        for m in matchups.iter().filter(|m| Self::usable(m)) {
            if let Some(bin) = bins
                .iter_mut()
                .find(|b| m.snow_depth_cm >= b.lower_cm && m.snow_depth_cm < b.upper_cm)
            {
                let (detected, reference) = self.classify(m);
                bin.matrix.record(detected, reference);
            }
        }

        Ok(bins)
    }

    /// Assess each day of a period (e.g. a month) separately
    pub fn assess_period<D: AsRef<[Matchup]>>(&self, days: &[D]) -> PeriodAssessment {
        let daily: Vec<ConfusionMatrix> = days.iter().map(|d| self.assess(d.as_ref())).collect();

        let mut pooled = ConfusionMatrix::default();
        for day in &daily {
            pooled.merge(day);
        }

        let mean_daily_accuracy = mean_accuracy(&daily);
        log::info!(
            "📊 {} days, {} matchups, mean daily accuracy {:?}",
            daily.len(),
            pooled.total(),
            mean_daily_accuracy
        );

        PeriodAssessment {
            daily,
            pooled,
            mean_daily_accuracy,
        }
    }
}

/// Mean of the accuracies of non-empty matrices (e.g. daily -> monthly)
pub fn mean_accuracy<'a, I>(matrices: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a ConfusionMatrix>,
{
    let accuracies: Vec<f64> = matrices.into_iter().filter_map(|m| m.accuracy()).collect();
    if accuracies.is_empty() {
        None
    } else {
        Some(accuracies.iter().sum::<f64>() / accuracies.len() as f64)
    }
}
