//! Dry snow detection from passive microwave brightness temperatures.
//!
//! The primary rule is the H SAF H11 snow status test of Pulliainen et al. (2010):
//! a Ku/Ka band spectral difference scaled into a snow depth proxy, gated by
//! Ka band brightness temperature ceilings that exclude wet snow and warm
//! snow-free surfaces. Two auxiliary rule sets are carried for confidence
//! scoring only:
//!
//! - a scattering signature test with confounder elimination
//!   (precipitation, cold desert, frozen ground), evaluated on
//!   offset-corrected 19/36 GHz equivalent temperatures
//! - a spectral gradient test requiring brightness temperature to decrease
//!   from the X band towards Ka band
//!
//! NaN brightness temperatures compare false in every test, so no-data
//! samples come out snow-free. Use [`valid_observation_mask`] to tell those
//! apart from real snow-free retrievals.

use crate::types::{
    ensure_same_shape, Band, BinaryGrid, ScanObservation, TbField, TsaError, TsaResult,
};
use ndarray::{Array2, Zip};
use std::str::FromStr;

/// Primary (Pulliainen 2010, H SAF H11) constants
pub mod primary {
    /// Snow depth proxy scale applied to Tb(KU,h) - Tb(KA,h), mm/K
    pub const SNOW_DEPTH_COEFFICIENT_MM_PER_K: f64 = 15.9;
    /// Proxy must strictly exceed this depth (mm)
    pub const MIN_SNOW_DEPTH_MM: f64 = 30.0;
    /// Tb(KA,v) must stay strictly below this (K)
    pub const MAX_KA_V_K: f64 = 255.0;
    /// Tb(KA,h) must stay strictly below this (K)
    pub const MAX_KA_H_K: f64 = 250.0;
}

/// Scattering/confounder rule constants (19/36 GHz decision tree)
pub mod scattering {
    /// Offset converting Tb(KU) to a 19 GHz equivalent (K)
    pub const KU_TO_19GHZ_OFFSET_K: f64 = 7.0;
    /// Offset converting Tb(KA) to a 36 GHz equivalent (K)
    pub const KA_TO_36GHZ_OFFSET_K: f64 = 4.0;
    /// Scattering present when T19v - T36v exceeds this
    pub const SCATTERING_MIN_K: f64 = 0.0;
    /// Precipitation when T19v - T36v is at most this
    pub const PRECIPITATION_MAX_K: f64 = 2.0;
    /// Cold desert: polarization difference at least this...
    pub const COLD_DESERT_MIN_POL_DIFF_K: f64 = 18.0;
    /// ...and spectral difference at most this
    pub const COLD_DESERT_MAX_SPECTRAL_DIFF_K: f64 = 10.0;
    /// Frozen ground: polarization difference at least this...
    pub const FROZEN_GROUND_MIN_POL_DIFF_K: f64 = 8.0;
    /// ...and spectral difference at most this
    pub const FROZEN_GROUND_MAX_SPECTRAL_DIFF_K: f64 = 2.0;
}

/// Spectral gradient rule constants
pub mod spectral_gradient {
    /// Tb(KA,h) must stay strictly below this (K)
    pub const MAX_KA_H_K: f64 = 245.0;
    /// Tb(KA,v) must stay strictly below this (K)
    pub const MAX_KA_V_K: f64 = 255.0;
    /// Candidate vetoed when reference band minus KA is at most this (K)
    pub const MIN_GRADIENT_K: f64 = 0.0;
    /// Lower-frequency reference band for the gradient
    pub const REFERENCE_BAND: crate::types::Band = crate::types::Band::X;
}

/// Dry snow detection algorithm selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DetectionAlgorithm {
    /// Pulliainen et al. (2010), H SAF H11 snow status
    Pulliainen2010,
}

impl DetectionAlgorithm {
    pub const CHOICES: [&'static str; 1] = ["Pulliainen2010"];
}

impl Default for DetectionAlgorithm {
    fn default() -> Self {
        DetectionAlgorithm::Pulliainen2010
    }
}

impl std::fmt::Display for DetectionAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionAlgorithm::Pulliainen2010 => write!(f, "Pulliainen2010"),
        }
    }
}

impl FromStr for DetectionAlgorithm {
    type Err = TsaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pulliainen2010" => Ok(DetectionAlgorithm::Pulliainen2010),
            _ => Err(TsaError::Configuration(format!(
                "unsupported TSA algorithm '{}', expected one of {:?}",
                s,
                DetectionAlgorithm::CHOICES
            ))),
        }
    }
}

/// Snow depth proxy (mm) from the Ku/Ka horizontal difference
#[inline]
pub fn snow_depth_proxy(ku_h: f64, ka_h: f64) -> f64 {
    primary::SNOW_DEPTH_COEFFICIENT_MM_PER_K * (ku_h - ka_h)
}

#[inline]
fn primary_decision(snow_depth_mm: f64, ka_h: f64, ka_v: f64) -> u8 {
    use primary::*;
    (snow_depth_mm > MIN_SNOW_DEPTH_MM && ka_v < MAX_KA_V_K && ka_h < MAX_KA_H_K) as u8
}

#[inline]
fn primary_rule(ku_h: f64, ka_h: f64, ka_v: f64) -> u8 {
    primary_decision(snow_depth_proxy(ku_h, ka_h), ka_h, ka_v)
}

#[inline]
fn scattering_rule(ku_h: f64, ku_v: f64, ka_v: f64) -> u8 {
    use scattering::*;
    let t19h = ku_h - KU_TO_19GHZ_OFFSET_K;
    let t19v = ku_v - KU_TO_19GHZ_OFFSET_K;
    let t36v = ka_v - KA_TO_36GHZ_OFFSET_K;

    let spectral_diff = t19v - t36v;
    let pol_diff = t19v - t19h;

    let scattering = spectral_diff > SCATTERING_MIN_K;
    let precipitation = spectral_diff <= PRECIPITATION_MAX_K;
    let cold_desert = pol_diff >= COLD_DESERT_MIN_POL_DIFF_K
        && spectral_diff <= COLD_DESERT_MAX_SPECTRAL_DIFF_K;
    let frozen_ground = pol_diff >= FROZEN_GROUND_MIN_POL_DIFF_K
        && spectral_diff <= FROZEN_GROUND_MAX_SPECTRAL_DIFF_K;

    (scattering && !precipitation && !cold_desert && !frozen_ground) as u8
}

#[inline]
fn spectral_gradient_rule(ka_h: f64, ka_v: f64, ref_h: f64, ref_v: f64) -> u8 {
    use spectral_gradient::*;
    let candidate = ka_h < MAX_KA_H_K && ka_v < MAX_KA_V_K;
    let veto = ref_v - ka_v <= MIN_GRADIENT_K || ref_h - ka_h <= MIN_GRADIENT_K;
    (candidate && !veto) as u8
}

fn check_three(context: &str, a: &TbField, b: &TbField, c: &TbField) -> TsaResult<()> {
    ensure_same_shape(context, a.dim(), b.dim())?;
    ensure_same_shape(context, a.dim(), c.dim())
}

/// Primary snow/no-snow decision.
///
/// Snow iff `15.9 * (ku_h - ka_h) > 30`, `ka_v < 255` and `ka_h < 250`.
pub fn classify_primary(ku_h: &TbField, ka_h: &TbField, ka_v: &TbField) -> TsaResult<BinaryGrid> {
    check_three("primary classifier inputs", ku_h, ka_h, ka_v)?;
    Ok(Zip::from(ku_h)
        .and(ka_h)
        .and(ka_v)
        .map_collect(|&ku_h, &ka_h, &ka_v| primary_rule(ku_h, ka_h, ka_v)))
}

/// Auxiliary scattering classifier with confounder elimination
pub fn classify_auxiliary_scattering(
    ku_h: &TbField,
    ku_v: &TbField,
    ka_v: &TbField,
) -> TsaResult<BinaryGrid> {
    check_three("scattering classifier inputs", ku_h, ku_v, ka_v)?;
    Ok(Zip::from(ku_h)
        .and(ku_v)
        .and(ka_v)
        .map_collect(|&ku_h, &ku_v, &ka_v| scattering_rule(ku_h, ku_v, ka_v)))
}

/// Auxiliary spectral gradient classifier.
///
/// `band2_h`/`band2_v` are the lower-frequency reference band (X band in
/// practice). Candidates with a non-positive gradient towards KA are vetoed.
pub fn classify_auxiliary_spectral_gradient(
    ka_h: &TbField,
    ka_v: &TbField,
    band2_h: &TbField,
    band2_v: &TbField,
) -> TsaResult<BinaryGrid> {
    check_three("spectral gradient classifier inputs", ka_h, ka_v, band2_h)?;
    ensure_same_shape("spectral gradient classifier inputs", ka_h.dim(), band2_v.dim())?;
    Ok(Zip::from(ka_h)
        .and(ka_v)
        .and(band2_h)
        .and(band2_v)
        .map_collect(|&ka_h, &ka_v, &ref_h, &ref_v| {
            spectral_gradient_rule(ka_h, ka_v, ref_h, ref_v)
        }))
}

/// Parallel variant of [`classify_primary`]
#[cfg(feature = "parallel")]
pub fn classify_primary_parallel(
    ku_h: &TbField,
    ka_h: &TbField,
    ka_v: &TbField,
) -> TsaResult<BinaryGrid> {
    check_three("primary classifier inputs", ku_h, ka_h, ka_v)?;
    Ok(Zip::from(ku_h)
        .and(ka_h)
        .and(ka_v)
        .par_map_collect(|&ku_h, &ka_h, &ka_v| primary_rule(ku_h, ka_h, ka_v)))
}

/// Parallel variant of [`classify_auxiliary_scattering`]
#[cfg(feature = "parallel")]
pub fn classify_auxiliary_scattering_parallel(
    ku_h: &TbField,
    ku_v: &TbField,
    ka_v: &TbField,
) -> TsaResult<BinaryGrid> {
    check_three("scattering classifier inputs", ku_h, ku_v, ka_v)?;
    Ok(Zip::from(ku_h)
        .and(ku_v)
        .and(ka_v)
        .par_map_collect(|&ku_h, &ku_v, &ka_v| scattering_rule(ku_h, ku_v, ka_v)))
}

/// Parallel variant of [`classify_auxiliary_spectral_gradient`]
#[cfg(feature = "parallel")]
pub fn classify_auxiliary_spectral_gradient_parallel(
    ka_h: &TbField,
    ka_v: &TbField,
    band2_h: &TbField,
    band2_v: &TbField,
) -> TsaResult<BinaryGrid> {
    check_three("spectral gradient classifier inputs", ka_h, ka_v, band2_h)?;
    ensure_same_shape("spectral gradient classifier inputs", ka_h.dim(), band2_v.dim())?;
    Ok(Zip::from(ka_h)
        .and(ka_v)
        .and(band2_h)
        .and(band2_v)
        .par_map_collect(|&ka_h, &ka_v, &ref_h, &ref_v| {
            spectral_gradient_rule(ka_h, ka_v, ref_h, ref_v)
        }))
}

/// True where every given field holds a finite brightness temperature
pub fn valid_observation_mask(fields: &[&TbField]) -> TsaResult<Array2<bool>> {
    let first = fields.first().ok_or_else(|| {
        TsaError::Configuration("validity mask needs at least one field".to_string())
    })?;
    let mut mask = Array2::from_elem(first.dim(), true);
    for field in fields {
        ensure_same_shape("validity mask inputs", first.dim(), field.dim())?;
        Zip::from(&mut mask)
            .and(*field)
            .for_each(|valid, &tb| *valid &= tb.is_finite());
    }
    Ok(mask)
}

/// Dry snow detection for one scan with the selected algorithm
pub fn dry_snow_detection(
    scan: &ScanObservation,
    algorithm: DetectionAlgorithm,
) -> TsaResult<BinaryGrid> {
    match algorithm {
        DetectionAlgorithm::Pulliainen2010 => {
            let ku = scan.band(Band::KU)?;
            let ka = scan.band(Band::KA)?;
            classify_primary(&ku.h, &ka.h, &ka.v)
        }
    }
}

/// All classifier outputs for one scan direction
#[derive(Debug, Clone)]
pub struct ScanClassification {
    /// Primary decision (authoritative)
    pub primary: BinaryGrid,
    /// Scattering rule decision
    pub aux_scattering: BinaryGrid,
    /// Spectral gradient decision, `None` when the reference band is absent
    pub aux_spectral_gradient: Option<BinaryGrid>,
    /// True where the primary channels hold finite data
    pub valid: Array2<bool>,
}

/// Runs the primary and auxiliary classifiers over a scan
#[derive(Debug, Clone)]
pub struct SnowClassifier {
    algorithm: DetectionAlgorithm,
    parallel: bool,
}

impl Default for SnowClassifier {
    fn default() -> Self {
        Self::new(DetectionAlgorithm::default())
    }
}

impl SnowClassifier {
    pub fn new(algorithm: DetectionAlgorithm) -> Self {
        Self {
            algorithm,
            parallel: cfg!(feature = "parallel"),
        }
    }

    /// Toggle parallel evaluation (ignored without the `parallel` feature)
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel && cfg!(feature = "parallel");
        self
    }

    pub fn algorithm(&self) -> DetectionAlgorithm {
        self.algorithm
    }

    /// Classify every rule set for one scan direction
    pub fn classify_scan(&self, scan: &ScanObservation) -> TsaResult<ScanClassification> {
        let (rows, cols) = scan.dim();
        log::info!(
            "❄️  Classifying {} scan ({}x{}) with {}",
            scan.direction,
            rows,
            cols,
            self.algorithm
        );

        let ku = scan.band(Band::KU)?;
        let ka = scan.band(Band::KA)?;

        let primary = match self.algorithm {
            DetectionAlgorithm::Pulliainen2010 => self.primary(&ku.h, &ka.h, &ka.v)?,
        };
        let aux_scattering = self.scattering(&ku.h, &ku.v, &ka.v)?;

        let aux_spectral_gradient = if scan.has_band(spectral_gradient::REFERENCE_BAND) {
            let reference = scan.band(spectral_gradient::REFERENCE_BAND)?;
            Some(self.spectral_gradient(&ka.h, &ka.v, &reference.h, &reference.v)?)
        } else {
            log::warn!(
                "{} band missing in {} scan, spectral gradient test skipped",
                spectral_gradient::REFERENCE_BAND,
                scan.direction
            );
            None
        };

        let valid = valid_observation_mask(&[&ku.h, &ka.h, &ka.v])?;

        let invalid = valid.iter().filter(|v| !**v).count();
        if invalid > 0 {
            log::warn!(
                "{} scan: {} of {} samples carry no data and default to snow-free",
                scan.direction,
                invalid,
                rows * cols
            );
        }
        log::debug!(
            "{} scan: {} primary snow samples",
            scan.direction,
            primary.iter().filter(|v| **v == 1).count()
        );

        Ok(ScanClassification {
            primary,
            aux_scattering,
            aux_spectral_gradient,
            valid,
        })
    }

    fn primary(&self, ku_h: &TbField, ka_h: &TbField, ka_v: &TbField) -> TsaResult<BinaryGrid> {
        #[cfg(feature = "parallel")]
        if self.parallel {
            return classify_primary_parallel(ku_h, ka_h, ka_v);
        }
        classify_primary(ku_h, ka_h, ka_v)
    }

    fn scattering(&self, ku_h: &TbField, ku_v: &TbField, ka_v: &TbField) -> TsaResult<BinaryGrid> {
        #[cfg(feature = "parallel")]
        if self.parallel {
            return classify_auxiliary_scattering_parallel(ku_h, ku_v, ka_v);
        }
        classify_auxiliary_scattering(ku_h, ku_v, ka_v)
    }

    fn spectral_gradient(
        &self,
        ka_h: &TbField,
        ka_v: &TbField,
        ref_h: &TbField,
        ref_v: &TbField,
    ) -> TsaResult<BinaryGrid> {
        #[cfg(feature = "parallel")]
        if self.parallel {
            return classify_auxiliary_spectral_gradient_parallel(ka_h, ka_v, ref_h, ref_v);
        }
        classify_auxiliary_spectral_gradient(ka_h, ka_v, ref_h, ref_v)
    }
}
