//! Swath-to-grid resampling seam.
//!
//! Nearest-neighbour search and map projection live outside this crate.
//! Callers supply a [`Resampler`]; [`NeighbourLookupResampler`] applies a
//! nearest-neighbour table that was computed elsewhere, which is enough for
//! repeated processing of a fixed swath geometry.

use crate::types::{ensure_same_shape, Geolocation, Layer, TsaError, TsaResult};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// EASE-Grid 2.0 Northern Hemisphere half extent (m)
pub const EASE2_NH_HALF_EXTENT_M: f64 = 9_000_000.0;
/// EASE-Grid 2.0 Northern Hemisphere cells per side at 12.5 km
pub const EASE2_NH_BASE_CELLS: usize = 1440;
/// Search radius at the 12.5 km base resolution (m)
pub const BASE_RADIUS_OF_INFLUENCE_M: f64 = 20_000.0;

/// Target grid cell size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridResolution {
    Km12_5,
    Km6_25,
    Km3_125,
}

impl GridResolution {
    pub const CHOICES: [&'static str; 3] = ["12.5", "6.25", "3.125"];

    /// Refinement factor relative to 12.5 km
    pub fn factor(self) -> usize {
        match self {
            GridResolution::Km12_5 => 1,
            GridResolution::Km6_25 => 2,
            GridResolution::Km3_125 => 4,
        }
    }

    pub fn cell_size_km(self) -> f64 {
        12.5 / self.factor() as f64
    }

    /// Default nearest-neighbour search radius (m)
    pub fn radius_of_influence(self) -> f64 {
        BASE_RADIUS_OF_INFLUENCE_M / self.factor() as f64
    }
}

impl Default for GridResolution {
    fn default() -> Self {
        GridResolution::Km12_5
    }
}

impl FromStr for GridResolution {
    type Err = TsaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_end_matches("km").trim() {
            "12.5" => Ok(GridResolution::Km12_5),
            "6.25" => Ok(GridResolution::Km6_25),
            "3.125" => Ok(GridResolution::Km3_125),
            _ => Err(TsaError::Configuration(format!(
                "unsupported grid resolution '{}', expected one of {:?} (km)",
                s,
                GridResolution::CHOICES
            ))),
        }
    }
}

/// Fixed Earth grid definition (area definition)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetGrid {
    pub area_id: String,
    pub description: String,
    /// Projection identifier, e.g. "EPSG:6931"
    pub projection: String,
    pub width: usize,
    pub height: usize,
    /// (x_min, y_min, x_max, y_max) in projection metres
    pub area_extent: (f64, f64, f64, f64),
}

impl TargetGrid {
    /// EASE-Grid 2.0 Northern Hemisphere at the requested resolution
    pub fn ease2_north(resolution: GridResolution) -> Self {
        let cells = EASE2_NH_BASE_CELLS * resolution.factor();
        Self {
            area_id: "ease2_nh".to_string(),
            description: format!(
                "EASE-Grid 2.0 Northern Hemisphere ({} km)",
                resolution.cell_size_km()
            ),
            projection: "EPSG:6931".to_string(),
            width: cells,
            height: cells,
            area_extent: (
                -EASE2_NH_HALF_EXTENT_M,
                -EASE2_NH_HALF_EXTENT_M,
                EASE2_NH_HALF_EXTENT_M,
                EASE2_NH_HALF_EXTENT_M,
            ),
        }
    }

    /// Layer shape as (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Numeric EPSG code, when the projection is given as "EPSG:<code>"
    pub fn epsg(&self) -> Option<u32> {
        self.projection
            .strip_prefix("EPSG:")
            .and_then(|code| code.parse().ok())
    }

    pub fn pixel_size(&self) -> (f64, f64) {
        let (x_min, y_min, x_max, y_max) = self.area_extent;
        (
            (x_max - x_min) / self.width as f64,
            (y_max - y_min) / self.height as f64,
        )
    }
}

/// Nearest-neighbour swath-to-grid resampling.
///
/// Target cells with no swath sample within `radius_m` must be NaN; resolved
/// cells carry the nearest sample's value unchanged.
pub trait Resampler: Send + Sync {
    fn resample_nearest(
        &self,
        swath: &Geolocation,
        values: &Layer,
        target: &TargetGrid,
        radius_m: f64,
    ) -> TsaResult<Layer>;
}

/// Resample a swath layer and check the contract on both sides
pub fn reproject_to_grid<R: Resampler + ?Sized>(
    resampler: &R,
    values: &Layer,
    swath: &Geolocation,
    target: &TargetGrid,
    radius_m: f64,
) -> TsaResult<Layer> {
    ensure_same_shape("swath values vs geolocation", swath.dim(), values.dim())?;
    if !(radius_m.is_finite() && radius_m > 0.0) {
        return Err(TsaError::Configuration(format!(
            "radius of influence must be positive, got {}",
            radius_m
        )));
    }

    log::debug!(
        "Resampling {}x{} swath onto {} ({}x{}, radius {} m)",
        values.nrows(),
        values.ncols(),
        target.area_id,
        target.height,
        target.width,
        radius_m
    );

    let gridded = resampler.resample_nearest(swath, values, target, radius_m)?;
    ensure_same_shape("resampled layer vs target grid", target.dim(), gridded.dim())?;
    Ok(gridded)
}

/// One entry of a nearest-neighbour table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbour {
    /// (scan line, sample) of the nearest swath sample
    pub source: (usize, usize),
    /// Distance from the target cell centre (m)
    pub distance_m: f64,
}

/// Applies a precomputed nearest-neighbour table.
///
/// `neighbours` is row-major over the target grid; `None` marks cells with
/// no swath sample in range of the search that built the table.
#[derive(Debug, Clone)]
pub struct NeighbourLookupResampler {
    swath_dim: (usize, usize),
    target_dim: (usize, usize),
    neighbours: Vec<Option<Neighbour>>,
}

impl NeighbourLookupResampler {
    pub fn new(
        swath_dim: (usize, usize),
        target_dim: (usize, usize),
        neighbours: Vec<Option<Neighbour>>,
    ) -> TsaResult<Self> {
        if neighbours.len() != target_dim.0 * target_dim.1 {
            return Err(TsaError::Resampling(format!(
                "neighbour table has {} entries for a {}x{} grid",
                neighbours.len(),
                target_dim.0,
                target_dim.1
            )));
        }
        if let Some(bad) = neighbours
            .iter()
            .flatten()
            .find(|n| n.source.0 >= swath_dim.0 || n.source.1 >= swath_dim.1)
        {
            return Err(TsaError::Resampling(format!(
                "neighbour source {:?} outside {}x{} swath",
                bad.source, swath_dim.0, swath_dim.1
            )));
        }

        let resampler = Self {
            swath_dim,
            target_dim,
            neighbours,
        };
        log::debug!(
            "Neighbour table resolves {} of {} target cells",
            resampler.resolved_cells(),
            resampler.neighbours.len()
        );
        Ok(resampler)
    }

    pub fn resolved_cells(&self) -> usize {
        self.neighbours.iter().filter(|n| n.is_some()).count()
    }
}

impl Resampler for NeighbourLookupResampler {
    fn resample_nearest(
        &self,
        swath: &Geolocation,
        values: &Layer,
        target: &TargetGrid,
        radius_m: f64,
    ) -> TsaResult<Layer> {
        ensure_same_shape("neighbour table swath", self.swath_dim, swath.dim())?;
        ensure_same_shape("neighbour table swath values", self.swath_dim, values.dim())?;
        ensure_same_shape("neighbour table target grid", self.target_dim, target.dim())?;

        let data: Vec<f64> = self
            .neighbours
            .iter()
            .map(|entry| match entry {
                Some(n) if n.distance_m <= radius_m => values[n.source],
                _ => f64::NAN,
            })
            .collect();

        Array2::from_shape_vec(self.target_dim, data)
            .map_err(|e| TsaError::Resampling(format!("Shape error: {}", e)))
    }
}
