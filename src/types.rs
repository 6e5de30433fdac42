use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Brightness temperature in Kelvin
pub type BrightnessTemperature = f64;

/// 2D brightness temperature field (scan line x sample)
pub type TbField = Array2<BrightnessTemperature>;

/// Binary snow classification (0 = snow-free, 1 = snow)
pub type BinaryGrid = Array2<u8>;

/// Per-pixel confidence code in {0, 1, 2, 3}
pub type QualityGrid = Array2<u8>;

/// Real-valued layer using NaN as the no-data sentinel.
/// Holds resampled grids and reconciled/composited outputs.
pub type Layer = Array2<f64>;

/// Microwave frequency bands carried by the radiometer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Band {
    L,
    C,
    X,
    KU,
    KA,
}

impl Band {
    pub const ALL: [Band; 5] = [Band::L, Band::C, Band::X, Band::KU, Band::KA];
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Band::L => write!(f, "L"),
            Band::C => write!(f, "C"),
            Band::X => write!(f, "X"),
            Band::KU => write!(f, "KU"),
            Band::KA => write!(f, "KA"),
        }
    }
}

impl FromStr for Band {
    type Err = TsaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "L" => Ok(Band::L),
            "C" => Ok(Band::C),
            "X" => Ok(Band::X),
            "KU" => Ok(Band::KU),
            "KA" => Ok(Band::KA),
            _ => Err(TsaError::Configuration(format!(
                "unknown band '{}', expected one of {:?}",
                s,
                Band::ALL.iter().map(|b| b.to_string()).collect::<Vec<_>>()
            ))),
        }
    }
}

/// Radiometer polarization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarization {
    H,
    V,
}

impl std::fmt::Display for Polarization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarization::H => write!(f, "h"),
            Polarization::V => write!(f, "v"),
        }
    }
}

/// One radiometric channel: band + polarization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Channel {
    pub band: Band,
    pub polarization: Polarization,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.band, self.polarization)
    }
}

/// Conical scan direction of the instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanDirection {
    Forward,
    Backward,
}

impl std::fmt::Display for ScanDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanDirection::Forward => write!(f, "FWD"),
            ScanDirection::Backward => write!(f, "BCK"),
        }
    }
}

/// Brightness temperatures of a single band, both polarizations
#[derive(Debug, Clone)]
pub struct BandObservation {
    pub h: TbField,
    pub v: TbField,
}

impl BandObservation {
    pub fn new(h: TbField, v: TbField) -> TsaResult<Self> {
        ensure_same_shape("band polarizations (h vs v)", h.dim(), v.dim())?;
        Ok(Self { h, v })
    }

    pub fn dim(&self) -> (usize, usize) {
        self.h.dim()
    }

    pub fn get(&self, polarization: Polarization) -> &TbField {
        match polarization {
            Polarization::H => &self.h,
            Polarization::V => &self.v,
        }
    }
}

/// Per-sample latitude/longitude of a swath (degrees)
#[derive(Debug, Clone)]
pub struct Geolocation {
    pub lat: Array2<f64>,
    pub lon: Array2<f64>,
}

impl Geolocation {
    pub fn new(lat: Array2<f64>, lon: Array2<f64>) -> TsaResult<Self> {
        ensure_same_shape("geolocation (lat vs lon)", lat.dim(), lon.dim())?;
        Ok(Self { lat, lon })
    }

    pub fn dim(&self) -> (usize, usize) {
        self.lat.dim()
    }
}

/// All bands of one scan direction sharing a single observation grid
#[derive(Debug, Clone)]
pub struct ScanObservation {
    pub direction: ScanDirection,
    bands: HashMap<Band, BandObservation>,
    pub geolocation: Geolocation,
}

impl ScanObservation {
    /// Build a scan, checking that every band and the geolocation share one shape
    pub fn new(
        direction: ScanDirection,
        bands: HashMap<Band, BandObservation>,
        geolocation: Geolocation,
    ) -> TsaResult<Self> {
        let shape = geolocation.dim();
        for (band, obs) in &bands {
            ensure_same_shape(
                &format!("{} {} band vs geolocation", direction, band),
                shape,
                obs.dim(),
            )?;
        }

        log::debug!(
            "{} scan: {} bands on a {}x{} grid",
            direction,
            bands.len(),
            shape.0,
            shape.1
        );

        Ok(Self {
            direction,
            bands,
            geolocation,
        })
    }

    pub fn dim(&self) -> (usize, usize) {
        self.geolocation.dim()
    }

    pub fn has_band(&self, band: Band) -> bool {
        self.bands.contains_key(&band)
    }

    pub fn band(&self, band: Band) -> TsaResult<&BandObservation> {
        self.bands.get(&band).ok_or(TsaError::MissingChannel {
            band,
            direction: self.direction,
        })
    }

    pub fn channel(&self, channel: Channel) -> TsaResult<&TbField> {
        Ok(self.band(channel.band)?.get(channel.polarization))
    }
}

/// Error types for TSA processing
#[derive(Debug, thiserror::Error)]
pub enum TsaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dimension mismatch in {context}: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        context: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing {band} band in {direction} scan")]
    MissingChannel {
        band: Band,
        direction: ScanDirection,
    },

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Resampling error: {0}")]
    Resampling(String),

    #[error("XML parsing error: {0}")]
    XmlParsing(String),
}

/// Result type for TSA operations
pub type TsaResult<T> = Result<T, TsaError>;

/// Fail fast when two co-registered fields disagree in shape
pub fn ensure_same_shape(
    context: &str,
    expected: (usize, usize),
    found: (usize, usize),
) -> TsaResult<()> {
    if expected != found {
        return Err(TsaError::DimensionMismatch {
            context: context.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}
