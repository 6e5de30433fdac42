use crate::core::accuracy::AccuracyAssessor;
use crate::core::classify::{ScanClassification, SnowClassifier};
use crate::core::composite::composite_quality;
use crate::core::confidence::{quality_histogram, score};
use crate::core::reconcile::{combine, to_layer, Reconciled};
use crate::core::resample::{reproject_to_grid, Resampler, TargetGrid};
use crate::io::config::ResolvedConfig;
use crate::types::{
    BinaryGrid, Layer, QualityGrid, ScanDirection, ScanObservation, TsaResult,
};

/// Swath-space results for one scan direction
#[derive(Debug, Clone)]
pub struct ScanProduct {
    pub direction: ScanDirection,
    pub classification: ScanClassification,
    /// Confidence code per swath sample (0..=3)
    pub quality: QualityGrid,
}

impl ScanProduct {
    /// Binary TSA with no-data samples as NaN
    pub fn tsa_layer(&self) -> TsaResult<Layer> {
        to_layer(&self.classification.primary, Some(&self.classification.valid))
    }

    /// Quality codes with no-data samples as NaN
    pub fn quality_layer(&self) -> TsaResult<Layer> {
        to_layer(&self.quality, Some(&self.classification.valid))
    }
}

/// Gridded two-scan product
#[derive(Debug, Clone)]
pub struct TsaProduct {
    pub forward: ScanProduct,
    pub backward: ScanProduct,
    /// Reconciled binary TSA on the target grid
    pub tsa: Reconciled,
    /// Composited quality codes (0..=6) on the target grid
    pub quality: Layer,
    pub grid: TargetGrid,
}

/// Runs classification, scoring, resampling and scan combination
pub struct TsaProcessor {
    config: ResolvedConfig,
    classifier: SnowClassifier,
    grid: TargetGrid,
}

impl TsaProcessor {
    pub fn new(config: ResolvedConfig) -> Self {
        let classifier = SnowClassifier::new(config.algorithm).with_parallel(config.parallel);
        let grid = TargetGrid::ease2_north(config.grid_resolution);
        Self {
            config,
            classifier,
            grid,
        }
    }

    /// Replace the default EASE-Grid 2.0 target
    pub fn with_grid(mut self, grid: TargetGrid) -> Self {
        self.grid = grid;
        self
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn grid(&self) -> &TargetGrid {
        &self.grid
    }

    /// Classify and score one scan direction in swath space
    pub fn process_scan(&self, scan: &ScanObservation) -> TsaResult<ScanProduct> {
        let classification = self.classifier.classify_scan(scan)?;

        let no_gradient;
        let aux_spectral: &BinaryGrid = match &classification.aux_spectral_gradient {
            Some(grid) => grid,
            None => {
                no_gradient = BinaryGrid::zeros(classification.primary.dim());
                &no_gradient
            }
        };

        let quality = self.score(&classification, aux_spectral)?;

        let counts = quality_histogram(&quality);
        log::info!(
            "📊 {} quality: snow-free={} fair={} good={} very good={}",
            scan.direction,
            counts[0],
            counts[1],
            counts[2],
            counts[3]
        );

        Ok(ScanProduct {
            direction: scan.direction,
            classification,
            quality,
        })
    }

    fn score(
        &self,
        classification: &ScanClassification,
        aux_spectral: &BinaryGrid,
    ) -> TsaResult<QualityGrid> {
        #[cfg(feature = "parallel")]
        if self.config.parallel {
            return crate::core::confidence::score_parallel(
                &classification.primary,
                &classification.aux_scattering,
                aux_spectral,
            );
        }
        score(
            &classification.primary,
            &classification.aux_scattering,
            aux_spectral,
        )
    }

    /// Process both scan directions and merge them on the target grid.
    ///
    /// The two swaths may differ in shape; they meet only after resampling,
    /// so each direction brings its own resampler.
    pub fn process_pair<F, B>(
        &self,
        forward: &ScanObservation,
        backward: &ScanObservation,
        forward_resampler: &F,
        backward_resampler: &B,
    ) -> TsaResult<TsaProduct>
    where
        F: Resampler + ?Sized,
        B: Resampler + ?Sized,
    {
        log::info!(
            "🛰️  Processing FWD ({}x{}) and BCK ({}x{}) scans onto {}",
            forward.dim().0,
            forward.dim().1,
            backward.dim().0,
            backward.dim().1,
            self.grid.description
        );

        let (fwd, bck) = if self.config.parallel {
            let (fwd, bck) = rayon::join(
                || self.process_scan(forward),
                || self.process_scan(backward),
            );
            (fwd?, bck?)
        } else {
            (self.process_scan(forward)?, self.process_scan(backward)?)
        };

        let (grid_tsa_fwd, grid_qa_fwd) = self.reproject_scan(&fwd, forward, forward_resampler)?;
        let (grid_tsa_bck, grid_qa_bck) = self.reproject_scan(&bck, backward, backward_resampler)?;

        let tsa = self.combine(&grid_tsa_fwd, &grid_tsa_bck)?;
        let quality = self.composite(&grid_qa_fwd, &grid_qa_bck)?;

        log::info!("✅ TSA product complete on {}x{} grid", self.grid.height, self.grid.width);

        Ok(TsaProduct {
            forward: fwd,
            backward: bck,
            tsa,
            quality,
            grid: self.grid.clone(),
        })
    }

    /// TSA and quality layers of one scan on the target grid
    fn reproject_scan<R: Resampler + ?Sized>(
        &self,
        product: &ScanProduct,
        scan: &ScanObservation,
        resampler: &R,
    ) -> TsaResult<(Layer, Layer)> {
        let radius = self.config.radius_of_influence_m;
        let tsa = reproject_to_grid(resampler, &product.tsa_layer()?, &scan.geolocation, &self.grid, radius)?;
        let quality =
            reproject_to_grid(resampler, &product.quality_layer()?, &scan.geolocation, &self.grid, radius)?;
        Ok((tsa, quality))
    }

    /// Accuracy assessment using the configured station depth threshold
    pub fn accuracy_assessor(&self) -> TsaResult<AccuracyAssessor> {
        AccuracyAssessor::from_config(&self.config)
    }

    fn combine(&self, fwd: &Layer, bck: &Layer) -> TsaResult<Reconciled> {
        #[cfg(feature = "parallel")]
        if self.config.parallel {
            return crate::core::reconcile::combine_parallel(fwd, bck);
        }
        combine(fwd, bck)
    }

    fn composite(&self, fwd: &Layer, bck: &Layer) -> TsaResult<Layer> {
        #[cfg(feature = "parallel")]
        if self.config.parallel {
            return crate::core::composite::composite_quality_parallel(fwd, bck);
        }
        composite_quality(fwd, bck)
    }
}
