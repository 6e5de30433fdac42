use crate::core::classify::DetectionAlgorithm;
use crate::core::resample::GridResolution;
use crate::io::product::{ProductType, L2_FORMAT_VERSION, L2_TIME_UNIT};
use crate::types::{TsaError, TsaResult};
use quick_xml::de::from_str;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Processing configuration as written in an XML job file.
///
/// ```xml
/// <tsaConfig>
///   <algorithm>Pulliainen2010</algorithm>
///   <gridResolution>6.25</gridResolution>
///   <parallel>true</parallel>
/// </tsaConfig>
/// ```
///
/// Any element left out keeps its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TsaConfig {
    /// Dry snow detection algorithm name
    pub algorithm: String,
    /// Target grid resolution in km ("12.5", "6.25" or "3.125")
    pub grid_resolution: String,
    /// Explicit search radius (m); derived from the resolution when absent
    pub radius_of_influence_m: Option<f64>,
    /// L2 product type ("grid" or "swath")
    pub product_type: String,
    /// Station depth above which ground counts as snow covered (cm)
    pub snow_depth_threshold_cm: f64,
    /// Format version written into product metadata
    pub format_version: String,
    /// CF time unit written into product metadata
    pub time_unit: String,
    /// Evaluate per-pixel rules with rayon
    pub parallel: bool,
}

impl Default for TsaConfig {
    fn default() -> Self {
        Self {
            algorithm: DetectionAlgorithm::Pulliainen2010.to_string(),
            grid_resolution: "12.5".to_string(),
            radius_of_influence_m: None,
            product_type: "grid".to_string(),
            snow_depth_threshold_cm: 0.0,
            format_version: L2_FORMAT_VERSION.to_string(),
            time_unit: L2_TIME_UNIT.to_string(),
            parallel: true,
        }
    }
}

/// Configuration with every selector resolved to a typed value
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub algorithm: DetectionAlgorithm,
    pub grid_resolution: GridResolution,
    pub radius_of_influence_m: f64,
    pub product_type: ProductType,
    pub snow_depth_threshold_cm: f64,
    pub format_version: String,
    pub time_unit: String,
    pub parallel: bool,
}

impl TsaConfig {
    /// Parse a configuration document
    pub fn from_xml_str(xml_content: &str) -> TsaResult<Self> {
        log::debug!("Parsing TSA configuration (length: {})", xml_content.len());
        from_str::<TsaConfig>(xml_content)
            .map_err(|e| TsaError::XmlParsing(format!("Failed to parse TSA configuration: {}", e)))
    }

    /// Read and parse a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> TsaResult<Self> {
        let path = path.as_ref();
        log::info!("Loading TSA configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_xml_str(&content)
    }

    /// Resolve selectors, failing on unknown names or out-of-range values
    pub fn validate(&self) -> TsaResult<ResolvedConfig> {
        let algorithm: DetectionAlgorithm = self.algorithm.parse()?;
        let grid_resolution: GridResolution = self.grid_resolution.parse()?;
        let product_type: ProductType = self.product_type.parse()?;

        let radius_of_influence_m = match self.radius_of_influence_m {
            Some(r) if r.is_finite() && r > 0.0 => r,
            Some(r) => {
                return Err(TsaError::Configuration(format!(
                    "radius of influence must be positive, got {}",
                    r
                )))
            }
            None => grid_resolution.radius_of_influence(),
        };

        if !self.snow_depth_threshold_cm.is_finite() || self.snow_depth_threshold_cm < 0.0 {
            return Err(TsaError::Configuration(format!(
                "snow depth threshold must be a non-negative depth, got {}",
                self.snow_depth_threshold_cm
            )));
        }

        if self.format_version.trim().is_empty() || self.time_unit.trim().is_empty() {
            return Err(TsaError::Configuration(
                "format version and time unit must not be empty".to_string(),
            ));
        }

        Ok(ResolvedConfig {
            algorithm,
            grid_resolution,
            radius_of_influence_m,
            product_type,
            snow_depth_threshold_cm: self.snow_depth_threshold_cm,
            format_version: self.format_version.clone(),
            time_unit: self.time_unit.clone(),
            parallel: self.parallel,
        })
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        let grid_resolution = GridResolution::default();
        Self {
            algorithm: DetectionAlgorithm::default(),
            grid_resolution,
            radius_of_influence_m: grid_resolution.radius_of_influence(),
            product_type: ProductType::Grid,
            snow_depth_threshold_cm: 0.0,
            format_version: L2_FORMAT_VERSION.to_string(),
            time_unit: L2_TIME_UNIT.to_string(),
            parallel: cfg!(feature = "parallel"),
        }
    }
}
